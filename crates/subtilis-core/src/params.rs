//! Normalized parameter records
//!
//! One record per (operation, algorithm) schema. A record is pure
//! data: the implementation reference is resolved separately from the
//! registry, which keeps records trivially testable.

pub use subtilis_crypto::asymmetric::Curve as NamedCurve;
pub use subtilis_crypto::Sha as HashAlg;

/// AES-GCM encrypt/decrypt parameters
#[derive(Clone, Debug, PartialEq)]
pub struct AesGcmParams {
    pub iv: Vec<u8>,
    pub additional_data: Option<Vec<u8>>,
    /// Tag length in bits; defaults to 128
    pub tag_length: u32,
}

/// AES-CBC encrypt/decrypt parameters
#[derive(Clone, Debug, PartialEq)]
pub struct AesCbcParams {
    pub iv: Vec<u8>,
}

/// AES key generation parameters
#[derive(Clone, Debug, PartialEq)]
pub struct AesKeyGenParams {
    pub length: u32,
}

/// AES derived-key length parameters (`get key length`)
#[derive(Clone, Debug, PartialEq)]
pub struct AesDerivedKeyParams {
    pub length: u32,
}

/// HMAC import / `get key length` parameters
#[derive(Clone, Debug, PartialEq)]
pub struct HmacImportParams {
    pub hash: HashAlg,
    /// Key length in bits; defaults to the raw key length on import
    /// and to the hash block size for `get key length`
    pub length: Option<u32>,
}

/// HMAC key generation parameters
#[derive(Clone, Debug, PartialEq)]
pub struct HmacKeyGenParams {
    pub hash: HashAlg,
    pub length: Option<u32>,
}

/// RSA key generation parameters
#[derive(Clone, Debug, PartialEq)]
pub struct RsaHashedKeyGenParams {
    pub modulus_length: u32,
    pub public_exponent: Vec<u8>,
    pub hash: HashAlg,
}

/// RSA import parameters
#[derive(Clone, Debug, PartialEq)]
pub struct RsaHashedImportParams {
    pub hash: HashAlg,
}

/// RSA-OAEP encrypt/decrypt parameters
#[derive(Clone, Debug, PartialEq)]
pub struct RsaOaepParams {
    pub label: Option<Vec<u8>>,
}

/// RSA-PSS sign/verify parameters
#[derive(Clone, Debug, PartialEq)]
pub struct RsaPssParams {
    /// Salt length in bytes
    pub salt_length: u32,
}

/// EC key generation / import parameters
#[derive(Clone, Debug, PartialEq)]
pub struct EcKeyGenParams {
    pub named_curve: NamedCurve,
}

/// ECDSA sign/verify parameters
#[derive(Clone, Debug, PartialEq)]
pub struct EcdsaParams {
    pub hash: HashAlg,
}

/// HKDF derivation parameters
#[derive(Clone, Debug, PartialEq)]
pub struct HkdfParams {
    pub hash: HashAlg,
    pub salt: Vec<u8>,
    pub info: Vec<u8>,
}

/// PBKDF2 derivation parameters
#[derive(Clone, Debug, PartialEq)]
pub struct Pbkdf2Params {
    pub hash: HashAlg,
    pub salt: Vec<u8>,
    pub iterations: u32,
}

/// The parameter record of one normalized algorithm
#[derive(Clone, Debug, PartialEq)]
pub enum Params {
    /// Operations whose schema has no members (digests, AES-KW,
    /// HMAC sign/verify, raw KDF import, ...)
    None,
    AesGcm(AesGcmParams),
    AesCbc(AesCbcParams),
    AesKeyGen(AesKeyGenParams),
    AesDerivedKey(AesDerivedKeyParams),
    HmacImport(HmacImportParams),
    HmacKeyGen(HmacKeyGenParams),
    RsaHashedKeyGen(RsaHashedKeyGenParams),
    RsaHashedImport(RsaHashedImportParams),
    RsaOaep(RsaOaepParams),
    RsaPss(RsaPssParams),
    EcKeyGen(EcKeyGenParams),
    Ecdsa(EcdsaParams),
    Hkdf(HkdfParams),
    Pbkdf2(Pbkdf2Params),
}

/// A descriptor normalized against one specific operation
///
/// `name` is the canonical spelling from the registry, independent of
/// the case the caller used.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedAlgorithm {
    pub name: &'static str,
    pub params: Params,
}

impl NormalizedAlgorithm {
    pub(crate) fn new(name: &'static str, params: Params) -> Self {
        Self { name, params }
    }
}
