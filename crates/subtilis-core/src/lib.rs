//! Operation dispatch core of the subtilis service
//!
//! This crate is the façade in front of the primitive layer: it owns
//! the algorithm registry, turns loosely-typed algorithm descriptors
//! into validated per-operation parameter records, enforces the
//! key-usage / extractability / format rules, and only then hands the
//! work to the algorithm module that performs the cryptography.
//!
//! The public surface is [`SubtleCrypto`]; everything else exists in
//! service of its twelve operations.

pub mod algorithm;
pub mod error;
pub mod jwk;
pub mod key;
pub mod normalize;
pub mod params;
pub mod registry;
pub mod subtle;

mod modules;
mod validate;

// Re-export core functionality
pub use algorithm::Algorithm;
pub use error::{Error, Result};
pub use jwk::JsonWebKey;
pub use key::{
    CryptoKey, CryptoKeyPair, GeneratedKey, KeyAlgorithm, KeyData, KeyFormat, KeyMaterial,
    KeyType, KeyUsage,
};
pub use normalize::normalize;
pub use params::{HashAlg, NamedCurve, NormalizedAlgorithm, Params};
pub use registry::{AlgorithmModule, Entry, Operation, Registry, Schema};
pub use subtle::SubtleCrypto;
