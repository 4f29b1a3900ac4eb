//! Caller-facing algorithm descriptors
//!
//! An [`Algorithm`] is the loosely-typed record a caller hands to an
//! operation: a name plus whatever members the algorithm understands.
//! The normalizer turns it into a validated, operation-specific
//! parameter record; members that a given operation does not declare
//! are ignored.

/// An algorithm descriptor
///
/// Only `name` is required. A bare string converts into a descriptor
/// with every other member unset:
///
/// ```
/// use subtilis_core::Algorithm;
///
/// let alg: Algorithm = "SHA-256".into();
/// assert_eq!(alg.name, "SHA-256");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Algorithm {
    pub name: String,

    /// Initialization vector (AES-GCM, AES-CBC)
    pub iv: Option<Vec<u8>>,
    /// Additional authenticated data (AES-GCM)
    pub additional_data: Option<Vec<u8>>,
    /// Authentication tag length in bits (AES-GCM)
    pub tag_length: Option<u32>,
    /// Key or derived-key length in bits (AES, HMAC)
    pub length: Option<u32>,
    /// Inner hash descriptor (HMAC, RSA, ECDSA, KDFs)
    pub hash: Option<Box<Algorithm>>,
    /// RSA modulus length in bits
    pub modulus_length: Option<u32>,
    /// RSA public exponent, big-endian
    pub public_exponent: Option<Vec<u8>>,
    /// Curve name (ECDSA)
    pub named_curve: Option<String>,
    /// Salt (HKDF, PBKDF2)
    pub salt: Option<Vec<u8>>,
    /// Context info (HKDF)
    pub info: Option<Vec<u8>>,
    /// Iteration count (PBKDF2)
    pub iterations: Option<u32>,
    /// Encryption label (RSA-OAEP)
    pub label: Option<Vec<u8>>,
    /// Salt length in bytes (RSA-PSS)
    pub salt_length: Option<u32>,
}

impl Algorithm {
    pub fn new(name: impl Into<String>) -> Self {
        Algorithm {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_iv(mut self, iv: impl Into<Vec<u8>>) -> Self {
        self.iv = Some(iv.into());
        self
    }

    pub fn with_additional_data(mut self, aad: impl Into<Vec<u8>>) -> Self {
        self.additional_data = Some(aad.into());
        self
    }

    pub fn with_tag_length(mut self, bits: u32) -> Self {
        self.tag_length = Some(bits);
        self
    }

    pub fn with_length(mut self, bits: u32) -> Self {
        self.length = Some(bits);
        self
    }

    pub fn with_hash(mut self, hash: impl Into<Algorithm>) -> Self {
        self.hash = Some(Box::new(hash.into()));
        self
    }

    pub fn with_modulus_length(mut self, bits: u32) -> Self {
        self.modulus_length = Some(bits);
        self
    }

    pub fn with_public_exponent(mut self, exponent: impl Into<Vec<u8>>) -> Self {
        self.public_exponent = Some(exponent.into());
        self
    }

    pub fn with_named_curve(mut self, curve: impl Into<String>) -> Self {
        self.named_curve = Some(curve.into());
        self
    }

    pub fn with_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<Vec<u8>>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    pub fn with_label(mut self, label: impl Into<Vec<u8>>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_salt_length(mut self, bytes: u32) -> Self {
        self.salt_length = Some(bytes);
        self
    }
}

impl From<&str> for Algorithm {
    fn from(name: &str) -> Self {
        Algorithm::new(name)
    }
}

impl From<String> for Algorithm {
    fn from(name: String) -> Self {
        Algorithm::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_rewrites_to_bare_descriptor() {
        let alg: Algorithm = "AES-GCM".into();
        assert_eq!(alg.name, "AES-GCM");
        assert!(alg.iv.is_none());
        assert!(alg.hash.is_none());
    }

    #[test]
    fn test_builders() {
        let alg = Algorithm::new("HMAC").with_hash("SHA-256").with_length(512);
        assert_eq!(alg.hash.as_deref().unwrap().name, "SHA-256");
        assert_eq!(alg.length, Some(512));
    }
}
