//! Key model: opaque handles binding material, algorithm, usages and
//! extractability

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    jwk::JsonWebKey,
    params::{HashAlg, NamedCurve},
};

/// Kind of key a handle refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyType {
    Secret,
    Private,
    Public,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Secret => "secret",
            KeyType::Private => "private",
            KeyType::Public => "public",
        }
    }
}

/// A token authorizing one operation on one key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyUsage {
    #[serde(rename = "encrypt")]
    Encrypt,
    #[serde(rename = "decrypt")]
    Decrypt,
    #[serde(rename = "sign")]
    Sign,
    #[serde(rename = "verify")]
    Verify,
    #[serde(rename = "deriveKey")]
    DeriveKey,
    #[serde(rename = "deriveBits")]
    DeriveBits,
    #[serde(rename = "wrapKey")]
    WrapKey,
    #[serde(rename = "unwrapKey")]
    UnwrapKey,
}

impl KeyUsage {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyUsage::Encrypt => "encrypt",
            KeyUsage::Decrypt => "decrypt",
            KeyUsage::Sign => "sign",
            KeyUsage::Verify => "verify",
            KeyUsage::DeriveKey => "deriveKey",
            KeyUsage::DeriveBits => "deriveBits",
            KeyUsage::WrapKey => "wrapKey",
            KeyUsage::UnwrapKey => "unwrapKey",
        }
    }
}

impl FromStr for KeyUsage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "encrypt" => Ok(KeyUsage::Encrypt),
            "decrypt" => Ok(KeyUsage::Decrypt),
            "sign" => Ok(KeyUsage::Sign),
            "verify" => Ok(KeyUsage::Verify),
            "deriveKey" => Ok(KeyUsage::DeriveKey),
            "deriveBits" => Ok(KeyUsage::DeriveBits),
            "wrapKey" => Ok(KeyUsage::WrapKey),
            "unwrapKey" => Ok(KeyUsage::UnwrapKey),
            other => Err(Error::Syntax(format!("unknown key usage {other:?}"))),
        }
    }
}

/// Key serialization formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyFormat {
    Raw,
    Pkcs8,
    Spki,
    Jwk,
}

impl KeyFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyFormat::Raw => "raw",
            KeyFormat::Pkcs8 => "pkcs8",
            KeyFormat::Spki => "spki",
            KeyFormat::Jwk => "jwk",
        }
    }

    /// Whether this format carries an octet buffer (as opposed to a JWK)
    pub fn is_binary(&self) -> bool {
        !matches!(self, KeyFormat::Jwk)
    }
}

impl FromStr for KeyFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw" => Ok(KeyFormat::Raw),
            "pkcs8" => Ok(KeyFormat::Pkcs8),
            "spki" => Ok(KeyFormat::Spki),
            "jwk" => Ok(KeyFormat::Jwk),
            other => Err(Error::Syntax(format!("unknown key format {other:?}"))),
        }
    }
}

/// Key material in transit: an octet buffer or a structured JWK
///
/// `raw`, `pkcs8` and `spki` material must be [`KeyData::Bytes`];
/// `jwk` material must be [`KeyData::Jwk`].
#[derive(Clone, Debug, PartialEq)]
pub enum KeyData {
    Bytes(Vec<u8>),
    Jwk(JsonWebKey),
}

impl KeyData {
    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            KeyData::Bytes(b) => Ok(b),
            KeyData::Jwk(_) => Err(Error::Type("expected an octet buffer, found a JWK".into())),
        }
    }

    pub fn as_jwk(&self) -> Result<&JsonWebKey> {
        match self {
            KeyData::Jwk(jwk) => Ok(jwk),
            KeyData::Bytes(_) => Err(Error::Type("expected a JWK, found an octet buffer".into())),
        }
    }
}

impl From<Vec<u8>> for KeyData {
    fn from(bytes: Vec<u8>) -> Self {
        KeyData::Bytes(bytes)
    }
}

impl From<&[u8]> for KeyData {
    fn from(bytes: &[u8]) -> Self {
        KeyData::Bytes(bytes.to_vec())
    }
}

impl From<JsonWebKey> for KeyData {
    fn from(jwk: JsonWebKey) -> Self {
        KeyData::Jwk(jwk)
    }
}

/// Material held behind a key handle, owned by one algorithm module
///
/// The core never interprets these bytes; modules re-parse them per
/// operation.
#[derive(Clone, Debug)]
pub enum KeyMaterial {
    /// Raw secret bytes (AES, HMAC, KDF inputs)
    Secret(Vec<u8>),
    /// PKCS#8 DER document of a private key
    Pkcs8(Vec<u8>),
    /// SPKI DER document of a public key
    Spki(Vec<u8>),
}

impl KeyMaterial {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            KeyMaterial::Secret(b) | KeyMaterial::Pkcs8(b) | KeyMaterial::Spki(b) => b,
        }
    }
}

/// The algorithm descriptor retained on a key
#[derive(Clone, Debug, PartialEq)]
pub enum KeyAlgorithm {
    Aes {
        name: &'static str,
        length: u32,
    },
    Hmac {
        hash: HashAlg,
        length: u32,
    },
    Rsa {
        name: &'static str,
        modulus_length: u32,
        public_exponent: Vec<u8>,
        hash: HashAlg,
    },
    Ec {
        name: &'static str,
        named_curve: NamedCurve,
    },
    Kdf {
        name: &'static str,
    },
}

impl KeyAlgorithm {
    /// Canonical name of the algorithm this key belongs to
    pub fn name(&self) -> &'static str {
        match self {
            KeyAlgorithm::Aes { name, .. } => name,
            KeyAlgorithm::Hmac { .. } => "HMAC",
            KeyAlgorithm::Rsa { name, .. } => name,
            KeyAlgorithm::Ec { name, .. } => name,
            KeyAlgorithm::Kdf { name } => name,
        }
    }
}

/// An opaque key handle
///
/// Handles are cheap to clone; the material is shared behind an `Arc`
/// and never exposed unless the key is extractable.
#[derive(Clone, Debug)]
pub struct CryptoKey {
    key_type: KeyType,
    extractable: bool,
    algorithm: KeyAlgorithm,
    usages: Vec<KeyUsage>,
    material: Arc<KeyMaterial>,
}

impl CryptoKey {
    pub(crate) fn new(
        key_type: KeyType,
        extractable: bool,
        algorithm: KeyAlgorithm,
        usages: Vec<KeyUsage>,
        material: KeyMaterial,
    ) -> Self {
        Self {
            key_type,
            extractable,
            algorithm,
            usages,
            material: Arc::new(material),
        }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn extractable(&self) -> bool {
        self.extractable
    }

    pub fn algorithm(&self) -> &KeyAlgorithm {
        &self.algorithm
    }

    pub fn usages(&self) -> &[KeyUsage] {
        &self.usages
    }

    pub(crate) fn material(&self) -> &KeyMaterial {
        &self.material
    }

    // The two assignments performed by the dispatcher at the end of
    // importKey / unwrapKey on a newly produced key.
    pub(crate) fn set_extractable(&mut self, extractable: bool) {
        self.extractable = extractable;
    }

    pub(crate) fn set_usages(&mut self, usages: Vec<KeyUsage>) {
        self.usages = usages;
    }
}

/// A public/private key pair sharing one algorithm
#[derive(Clone, Debug)]
pub struct CryptoKeyPair {
    pub public_key: CryptoKey,
    pub private_key: CryptoKey,
}

/// Result of `generateKey`: a single key or a pair
#[derive(Clone, Debug)]
pub enum GeneratedKey {
    Key(CryptoKey),
    Pair(CryptoKeyPair),
}

impl GeneratedKey {
    /// Unwrap a single secret key
    pub fn into_key(self) -> Result<CryptoKey> {
        match self {
            GeneratedKey::Key(key) => Ok(key),
            GeneratedKey::Pair(_) => {
                Err(Error::Operation("expected a single key, found a key pair".into()))
            }
        }
    }

    /// Unwrap a key pair
    pub fn into_pair(self) -> Result<CryptoKeyPair> {
        match self {
            GeneratedKey::Pair(pair) => Ok(pair),
            GeneratedKey::Key(_) => {
                Err(Error::Operation("expected a key pair, found a single key".into()))
            }
        }
    }
}
