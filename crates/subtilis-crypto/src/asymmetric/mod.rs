//! Asymmetric cryptography
//!
//! RSA (OAEP encryption, PKCS#1 v1.5 and PSS signatures) and ECDSA
//! over the NIST curves P-256 and P-384. All keys cross this module
//! boundary as PKCS#8 (private) or SPKI (public) DER documents.

pub mod ecdsa;
pub mod rsa;

pub use ecdsa::Curve;
