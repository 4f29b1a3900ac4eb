//! Cryptographic primitives for the subtilis service.
//!
//! Every function in this crate works on plain byte slices or DER
//! documents; key handles, usages and algorithm dispatch live one
//! level up in `subtilis-core`. The crate groups:
//!
//! - **Hash**: SHA-256 / SHA-384 / SHA-512
//! - **HMAC**: MAC computation and verification over the SHA-2 family
//! - **Symmetric**: AES-GCM, AES-CBC and AES Key Wrap (RFC 3394)
//! - **Asymmetric**: RSA (OAEP, PKCS#1 v1.5, PSS) and ECDSA (P-256, P-384)
//! - **KDF**: HKDF and PBKDF2
//! - **Random**: CSPRNG byte strings

pub mod error;

pub mod hash;
pub mod hmac;
pub mod rand;

// Symmetric encryption
pub mod symmetric;

// Asymmetric encryption and signatures
pub mod asymmetric;

// Key derivation
pub mod kdf;

pub use error::{Error, Result};
pub use hash::Sha;
