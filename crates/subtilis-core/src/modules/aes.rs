//! AES modules: GCM, CBC and Key Wrap
//!
//! The three suites share key handling (raw/jwk import, export,
//! generation, `get key length`) and differ in the cipher operations
//! they expose: GCM and CBC encrypt/decrypt, KW wraps natively.

use subtilis_crypto::{rand::random_bytes, symmetric};

use crate::{
    error::{Error, Result},
    key::{
        CryptoKey, GeneratedKey, KeyAlgorithm, KeyData, KeyFormat, KeyMaterial, KeyType, KeyUsage,
    },
    params::{NormalizedAlgorithm, Params},
    registry::{AlgorithmModule, Operation},
    validate,
};

use super::{check_jwk_header, export_oct_jwk, secret_bytes};

pub(super) static AES_GCM: AesGcmModule = AesGcmModule;
pub(super) static AES_CBC: AesCbcModule = AesCbcModule;
pub(super) static AES_KW: AesKwModule = AesKwModule;

const AES_KEY_SIZES: [u32; 3] = [128, 192, 256];
const CIPHER_USAGES: &[KeyUsage] = &[
    KeyUsage::Encrypt,
    KeyUsage::Decrypt,
    KeyUsage::WrapKey,
    KeyUsage::UnwrapKey,
];
const KW_USAGES: &[KeyUsage] = &[KeyUsage::WrapKey, KeyUsage::UnwrapKey];

pub(super) struct AesGcmModule;
pub(super) struct AesCbcModule;
pub(super) struct AesKwModule;

impl AlgorithmModule for AesGcmModule {
    fn supports(&self, op: Operation) -> bool {
        matches!(
            op,
            Operation::Encrypt
                | Operation::Decrypt
                | Operation::GenerateKey
                | Operation::ImportKey
                | Operation::ExportKey
                | Operation::GetKeyLength
        )
    }

    fn encrypt(&self, alg: &NormalizedAlgorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        let (iv, aad) = gcm_args(alg)?;
        let ct = symmetric::gcm::encrypt(secret_bytes(key)?, iv, aad, data)?;
        Ok(ct)
    }

    fn decrypt(&self, alg: &NormalizedAlgorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        let (iv, aad) = gcm_args(alg)?;
        let pt = symmetric::gcm::decrypt(secret_bytes(key)?, iv, aad, data)?;
        Ok(pt)
    }

    fn generate_key(
        &self,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<GeneratedKey> {
        generate_aes(alg, "AES-GCM", CIPHER_USAGES, extractable, usages)
    }

    fn import_key(
        &self,
        format: KeyFormat,
        data: &KeyData,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        import_aes(format, data, alg, "AES-GCM", "GCM", CIPHER_USAGES, extractable, usages)
    }

    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<KeyData> {
        export_aes(format, key, "GCM")
    }

    fn get_key_length(&self, alg: &NormalizedAlgorithm) -> Result<u32> {
        aes_key_length(alg)
    }
}

impl AlgorithmModule for AesCbcModule {
    fn supports(&self, op: Operation) -> bool {
        matches!(
            op,
            Operation::Encrypt
                | Operation::Decrypt
                | Operation::GenerateKey
                | Operation::ImportKey
                | Operation::ExportKey
                | Operation::GetKeyLength
        )
    }

    fn encrypt(&self, alg: &NormalizedAlgorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        let iv = cbc_iv(alg)?;
        let ct = symmetric::cbc::encrypt(secret_bytes(key)?, iv, data)?;
        Ok(ct)
    }

    fn decrypt(&self, alg: &NormalizedAlgorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        let iv = cbc_iv(alg)?;
        let pt = symmetric::cbc::decrypt(secret_bytes(key)?, iv, data)?;
        Ok(pt)
    }

    fn generate_key(
        &self,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<GeneratedKey> {
        generate_aes(alg, "AES-CBC", CIPHER_USAGES, extractable, usages)
    }

    fn import_key(
        &self,
        format: KeyFormat,
        data: &KeyData,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        import_aes(format, data, alg, "AES-CBC", "CBC", CIPHER_USAGES, extractable, usages)
    }

    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<KeyData> {
        export_aes(format, key, "CBC")
    }

    fn get_key_length(&self, alg: &NormalizedAlgorithm) -> Result<u32> {
        aes_key_length(alg)
    }
}

impl AlgorithmModule for AesKwModule {
    fn supports(&self, op: Operation) -> bool {
        matches!(
            op,
            Operation::WrapKey
                | Operation::UnwrapKey
                | Operation::GenerateKey
                | Operation::ImportKey
                | Operation::ExportKey
                | Operation::GetKeyLength
        )
    }

    fn wrap_key(
        &self,
        _alg: &NormalizedAlgorithm,
        wrapping_key: &CryptoKey,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        let wrapped = symmetric::kw::wrap(secret_bytes(wrapping_key)?, data)?;
        Ok(wrapped)
    }

    fn unwrap_key(
        &self,
        _alg: &NormalizedAlgorithm,
        unwrapping_key: &CryptoKey,
        wrapped: &[u8],
    ) -> Result<Vec<u8>> {
        let unwrapped = symmetric::kw::unwrap(secret_bytes(unwrapping_key)?, wrapped)?;
        Ok(unwrapped)
    }

    fn generate_key(
        &self,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<GeneratedKey> {
        generate_aes(alg, "AES-KW", KW_USAGES, extractable, usages)
    }

    fn import_key(
        &self,
        format: KeyFormat,
        data: &KeyData,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        import_aes(format, data, alg, "AES-KW", "KW", KW_USAGES, extractable, usages)
    }

    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<KeyData> {
        export_aes(format, key, "KW")
    }

    fn get_key_length(&self, alg: &NormalizedAlgorithm) -> Result<u32> {
        aes_key_length(alg)
    }
}

// ---------------------------------------------------------------------------
// Shared AES key handling
// ---------------------------------------------------------------------------

fn gcm_args(alg: &NormalizedAlgorithm) -> Result<(&[u8], &[u8])> {
    let Params::AesGcm(params) = &alg.params else {
        return Err(Error::Operation("unexpected parameter record".to_string()));
    };
    if params.tag_length != 128 {
        return Err(Error::NotSupported(format!(
            "AES-GCM tag length {} is not supported (only 128)",
            params.tag_length
        )));
    }
    if !symmetric::gcm::is_supported_iv_len(params.iv.len()) {
        return Err(Error::NotSupported(format!(
            "AES-GCM IV length {} is not supported (only 12, 16 or 32 bytes)",
            params.iv.len()
        )));
    }
    Ok((
        params.iv.as_slice(),
        params.additional_data.as_deref().unwrap_or(&[]),
    ))
}

fn cbc_iv(alg: &NormalizedAlgorithm) -> Result<&[u8]> {
    let Params::AesCbc(params) = &alg.params else {
        return Err(Error::Operation("unexpected parameter record".to_string()));
    };
    if params.iv.len() != 16 {
        return Err(Error::Operation(format!(
            "AES-CBC requires a 16-byte IV, got {}",
            params.iv.len()
        )));
    }
    Ok(params.iv.as_slice())
}

fn generate_aes(
    alg: &NormalizedAlgorithm,
    name: &'static str,
    allowed: &[KeyUsage],
    extractable: bool,
    usages: &[KeyUsage],
) -> Result<GeneratedKey> {
    let Params::AesKeyGen(params) = &alg.params else {
        return Err(Error::Operation("unexpected parameter record".to_string()));
    };
    validate::require_allowed_usages(name, usages, allowed)?;
    if !AES_KEY_SIZES.contains(&params.length) {
        return Err(Error::Operation(format!(
            "AES key length must be 128, 192 or 256 bits, got {}",
            params.length
        )));
    }
    let bytes = random_bytes(params.length as usize / 8)?;
    Ok(GeneratedKey::Key(CryptoKey::new(
        KeyType::Secret,
        extractable,
        KeyAlgorithm::Aes { name, length: params.length },
        usages.to_vec(),
        KeyMaterial::Secret(bytes),
    )))
}

#[allow(clippy::too_many_arguments)]
fn import_aes(
    format: KeyFormat,
    data: &KeyData,
    _alg: &NormalizedAlgorithm,
    name: &'static str,
    jwk_suffix: &str,
    allowed: &[KeyUsage],
    extractable: bool,
    usages: &[KeyUsage],
) -> Result<CryptoKey> {
    validate::require_allowed_usages(name, usages, allowed)?;
    let bytes = match format {
        KeyFormat::Raw => data.as_bytes()?.to_vec(),
        KeyFormat::Jwk => {
            let jwk = data.as_jwk()?;
            check_jwk_header(jwk, "oct", "enc", extractable, usages)?;
            let bytes = jwk.member("k")?;
            if let Some(alg) = &jwk.alg {
                let expected = oct_alg(bytes.len() as u32 * 8, jwk_suffix);
                if *alg != expected {
                    return Err(Error::Data(format!(
                        "JWK alg {alg:?} does not match expected {expected:?}"
                    )));
                }
            }
            bytes
        }
        other => {
            return Err(Error::NotSupported(format!(
                "{name} keys cannot be imported from {}",
                other.as_str()
            )));
        }
    };
    let length = match bytes.len() {
        16 => 128,
        24 => 192,
        32 => 256,
        n => {
            return Err(Error::Data(format!(
                "AES key material must be 16, 24 or 32 bytes, got {n}"
            )));
        }
    };
    Ok(CryptoKey::new(
        KeyType::Secret,
        extractable,
        KeyAlgorithm::Aes { name, length },
        usages.to_vec(),
        KeyMaterial::Secret(bytes),
    ))
}

fn export_aes(format: KeyFormat, key: &CryptoKey, jwk_suffix: &str) -> Result<KeyData> {
    match format {
        KeyFormat::Raw => Ok(KeyData::Bytes(secret_bytes(key)?.to_vec())),
        KeyFormat::Jwk => {
            let length = secret_bytes(key)?.len() as u32 * 8;
            let jwk = export_oct_jwk(key, oct_alg(length, jwk_suffix))?;
            Ok(KeyData::Jwk(jwk))
        }
        other => Err(Error::NotSupported(format!(
            "AES keys cannot be exported as {}",
            other.as_str()
        ))),
    }
}

fn aes_key_length(alg: &NormalizedAlgorithm) -> Result<u32> {
    let Params::AesDerivedKey(params) = &alg.params else {
        return Err(Error::Operation("unexpected parameter record".to_string()));
    };
    if !AES_KEY_SIZES.contains(&params.length) {
        return Err(Error::Operation(format!(
            "AES key length must be 128, 192 or 256 bits, got {}",
            params.length
        )));
    }
    Ok(params.length)
}

// "A128GCM", "A256KW", ...
fn oct_alg(length_bits: u32, suffix: &str) -> String {
    format!("A{length_bits}{suffix}")
}
