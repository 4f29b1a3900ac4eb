//! Error taxonomy of the dispatch core
//!
//! The variants mirror the failure classes a caller can observe:
//! which one is raised, and in which order, is part of the contract
//! of every operation.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Algorithm name not registered for the operation, or a required
    /// capability is missing from the algorithm module
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Algorithm/key mismatch, missing usage, or non-extractable key
    #[error("invalid access: {0}")]
    InvalidAccess(String),

    /// Malformed descriptor, unknown usage token, or an empty usage
    /// set on a secret/private key
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Key material that cannot be parsed in the declared format
    #[error("data error: {0}")]
    Data(String),

    /// Format/material shape mismatch (buffer vs JWK)
    #[error("type error: {0}")]
    Type(String),

    /// Failure inside the algorithm implementation
    #[error("operation error: {0}")]
    Operation(String),
}

impl Error {
    pub(crate) fn unregistered(op: &str, name: &str) -> Self {
        Error::NotSupported(format!("algorithm {name:?} is not registered for {op}"))
    }

    pub(crate) fn missing_member(name: &str, member: &str) -> Self {
        Error::Syntax(format!("{name} descriptor is missing the {member:?} member"))
    }
}

impl From<subtilis_crypto::Error> for Error {
    fn from(e: subtilis_crypto::Error) -> Self {
        Error::Operation(e.to_string())
    }
}

/// Core result type
pub type Result<T> = std::result::Result<T, Error>;
