//! SHA-2 hash functions (SHA-256, SHA-384 and SHA-512)

use sha2::{Digest, Sha256 as Sha256Hasher, Sha384 as Sha384Hasher, Sha512 as Sha512Hasher};

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sha {
    /// SHA-256 (32-byte output)
    Sha256,
    /// SHA-384 (48-byte output)
    Sha384,
    /// SHA-512 (64-byte output)
    Sha512,
}

impl Sha {
    /// Canonical algorithm name
    pub fn name(&self) -> &'static str {
        match self {
            Sha::Sha256 => "SHA-256",
            Sha::Sha384 => "SHA-384",
            Sha::Sha512 => "SHA-512",
        }
    }

    /// Digest size in bytes
    pub fn output_len(&self) -> usize {
        match self {
            Sha::Sha256 => 32,
            Sha::Sha384 => 48,
            Sha::Sha512 => 64,
        }
    }

    /// Internal block size in bytes
    pub fn block_len(&self) -> usize {
        match self {
            Sha::Sha256 => 64,
            Sha::Sha384 | Sha::Sha512 => 128,
        }
    }
}

impl std::fmt::Display for Sha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Compute the digest of `data` under the selected algorithm
pub fn digest(algorithm: Sha, data: &[u8]) -> Vec<u8> {
    match algorithm {
        Sha::Sha256 => sha256(data).to_vec(),
        Sha::Sha384 => sha384(data).to_vec(),
        Sha::Sha512 => sha512(data).to_vec(),
    }
}

/// Compute SHA-256 hash of data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256Hasher::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-384 hash of data
pub fn sha384(data: &[u8]) -> [u8; 48] {
    let mut hasher = Sha384Hasher::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-512 hash of data
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut hasher = Sha512Hasher::new();
    hasher.update(data);
    hasher.finalize().into()
}
