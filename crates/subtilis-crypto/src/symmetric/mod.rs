//! Symmetric encryption algorithms
//!
//! AES in the three modes the service dispatches to: GCM (AEAD),
//! CBC with PKCS#7 padding, and Key Wrap (RFC 3394).

pub mod cbc;
pub mod gcm;
pub mod kw;
