//! Cryptographic hash functions
//!
//! SHA-2 digests used throughout the service, both as the `digest`
//! operation itself and as the hash parameter of HMAC, RSA, ECDSA
//! and the KDFs.

pub mod sha;

pub use sha::{digest, sha256, sha384, sha512, Sha};
