//! HMAC module

use subtilis_crypto::{hmac, rand::random_bytes};

use crate::{
    error::{Error, Result},
    key::{
        CryptoKey, GeneratedKey, KeyAlgorithm, KeyData, KeyFormat, KeyMaterial, KeyType, KeyUsage,
    },
    params::{HashAlg, NormalizedAlgorithm, Params},
    registry::{AlgorithmModule, Operation},
    validate,
};

use super::{check_jwk_header, export_oct_jwk, secret_bytes};

pub(super) static HMAC: HmacModule = HmacModule;

const HMAC_USAGES: &[KeyUsage] = &[KeyUsage::Sign, KeyUsage::Verify];

pub(super) struct HmacModule;

impl AlgorithmModule for HmacModule {
    fn supports(&self, op: Operation) -> bool {
        matches!(
            op,
            Operation::Sign
                | Operation::Verify
                | Operation::GenerateKey
                | Operation::ImportKey
                | Operation::ExportKey
                | Operation::GetKeyLength
        )
    }

    fn sign(&self, _alg: &NormalizedAlgorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        let tag = hmac::sign(key_hash(key)?, secret_bytes(key)?, data)?;
        Ok(tag)
    }

    fn verify(
        &self,
        _alg: &NormalizedAlgorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool> {
        let ok = hmac::verify(key_hash(key)?, secret_bytes(key)?, signature, data)?;
        Ok(ok)
    }

    fn generate_key(
        &self,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<GeneratedKey> {
        let Params::HmacKeyGen(params) = &alg.params else {
            return Err(Error::Operation("unexpected parameter record".to_string()));
        };
        validate::require_allowed_usages("HMAC", usages, HMAC_USAGES)?;
        let length = match params.length {
            None => params.hash.block_len() as u32 * 8,
            Some(0) => {
                return Err(Error::Operation(
                    "HMAC key length must be non-zero".to_string(),
                ));
            }
            Some(n) if n % 8 != 0 => {
                return Err(Error::Operation(
                    "HMAC key length must be a whole number of bytes".to_string(),
                ));
            }
            Some(n) => n,
        };
        let bytes = random_bytes(length as usize / 8)?;
        Ok(GeneratedKey::Key(CryptoKey::new(
            KeyType::Secret,
            extractable,
            KeyAlgorithm::Hmac { hash: params.hash, length },
            usages.to_vec(),
            KeyMaterial::Secret(bytes),
        )))
    }

    fn import_key(
        &self,
        format: KeyFormat,
        data: &KeyData,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let Params::HmacImport(params) = &alg.params else {
            return Err(Error::Operation("unexpected parameter record".to_string()));
        };
        validate::require_allowed_usages("HMAC", usages, HMAC_USAGES)?;
        let bytes = match format {
            KeyFormat::Raw => data.as_bytes()?.to_vec(),
            KeyFormat::Jwk => {
                let jwk = data.as_jwk()?;
                check_jwk_header(jwk, "oct", "sig", extractable, usages)?;
                if let Some(jwk_alg) = &jwk.alg {
                    let expected = hs_alg(params.hash);
                    if jwk_alg != expected {
                        return Err(Error::Data(format!(
                            "JWK alg {jwk_alg:?} does not match expected {expected:?}"
                        )));
                    }
                }
                jwk.member("k")?
            }
            other => {
                return Err(Error::NotSupported(format!(
                    "HMAC keys cannot be imported from {}",
                    other.as_str()
                )));
            }
        };
        if bytes.is_empty() {
            return Err(Error::Data("HMAC key material is empty".to_string()));
        }
        let bit_len = bytes.len() as u32 * 8;
        let length = match params.length {
            None => bit_len,
            // A declared length may only drop bits from the final byte
            Some(l) if l > bit_len || l <= bit_len.saturating_sub(8) => {
                return Err(Error::Data(format!(
                    "declared HMAC length {l} is inconsistent with {bit_len} bits of material"
                )));
            }
            Some(l) => l,
        };
        Ok(CryptoKey::new(
            KeyType::Secret,
            extractable,
            KeyAlgorithm::Hmac { hash: params.hash, length },
            usages.to_vec(),
            KeyMaterial::Secret(bytes),
        ))
    }

    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<KeyData> {
        match format {
            KeyFormat::Raw => Ok(KeyData::Bytes(secret_bytes(key)?.to_vec())),
            KeyFormat::Jwk => {
                let jwk = export_oct_jwk(key, hs_alg(key_hash(key)?).to_string())?;
                Ok(KeyData::Jwk(jwk))
            }
            other => Err(Error::NotSupported(format!(
                "HMAC keys cannot be exported as {}",
                other.as_str()
            ))),
        }
    }

    fn get_key_length(&self, alg: &NormalizedAlgorithm) -> Result<u32> {
        let Params::HmacImport(params) = &alg.params else {
            return Err(Error::Operation("unexpected parameter record".to_string()));
        };
        match params.length {
            None => Ok(params.hash.block_len() as u32 * 8),
            Some(0) => Err(Error::Type("HMAC length must be non-zero".to_string())),
            Some(n) => Ok(n),
        }
    }
}

// The hash is bound to the key at import/generation time
fn key_hash(key: &CryptoKey) -> Result<HashAlg> {
    match key.algorithm() {
        KeyAlgorithm::Hmac { hash, .. } => Ok(*hash),
        _ => Err(Error::Operation(
            "key was not created by the HMAC module".to_string(),
        )),
    }
}

fn hs_alg(hash: HashAlg) -> &'static str {
    match hash {
        HashAlg::Sha256 => "HS256",
        HashAlg::Sha384 => "HS384",
        HashAlg::Sha512 => "HS512",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{HmacImportParams, HmacKeyGenParams};

    fn keygen(hash: HashAlg, length: Option<u32>) -> NormalizedAlgorithm {
        NormalizedAlgorithm::new("HMAC", Params::HmacKeyGen(HmacKeyGenParams { hash, length }))
    }

    fn import_alg(hash: HashAlg, length: Option<u32>) -> NormalizedAlgorithm {
        NormalizedAlgorithm::new("HMAC", Params::HmacImport(HmacImportParams { hash, length }))
    }

    #[test]
    fn test_generate_sign_verify() {
        let key = HMAC
            .generate_key(&keygen(HashAlg::Sha256, None), true, HMAC_USAGES)
            .unwrap()
            .into_key()
            .unwrap();
        // Default length is the hash block size
        assert_eq!(secret_bytes(&key).unwrap().len(), 64);

        let alg = NormalizedAlgorithm::new("HMAC", Params::None);
        let tag = HMAC.sign(&alg, &key, b"message").unwrap();
        assert!(HMAC.verify(&alg, &key, &tag, b"message").unwrap());
        assert!(!HMAC.verify(&alg, &key, &tag, b"tampered").unwrap());
    }

    #[test]
    fn test_corrupted_tag_verifies_false() {
        let key = HMAC
            .generate_key(&keygen(HashAlg::Sha384, None), true, HMAC_USAGES)
            .unwrap()
            .into_key()
            .unwrap();
        let alg = NormalizedAlgorithm::new("HMAC", Params::None);
        let mut tag = HMAC.sign(&alg, &key, b"message").unwrap();
        tag[3] ^= 0x10;
        assert!(!HMAC.verify(&alg, &key, &tag, b"message").unwrap());
    }

    #[test]
    fn test_import_length_rule() {
        let data = KeyData::Bytes(vec![0u8; 32]);
        // 256 bits of material: lengths 249..=256 are representable
        assert!(HMAC
            .import_key(KeyFormat::Raw, &data, &import_alg(HashAlg::Sha256, Some(256)), true, &[KeyUsage::Sign])
            .is_ok());
        assert!(HMAC
            .import_key(KeyFormat::Raw, &data, &import_alg(HashAlg::Sha256, Some(250)), true, &[KeyUsage::Sign])
            .is_ok());
        assert!(matches!(
            HMAC.import_key(KeyFormat::Raw, &data, &import_alg(HashAlg::Sha256, Some(248)), true, &[KeyUsage::Sign]),
            Err(Error::Data(_))
        ));
        assert!(matches!(
            HMAC.import_key(KeyFormat::Raw, &data, &import_alg(HashAlg::Sha256, Some(257)), true, &[KeyUsage::Sign]),
            Err(Error::Data(_))
        ));
    }

    #[test]
    fn test_jwk_roundtrip() {
        let key = HMAC
            .generate_key(&keygen(HashAlg::Sha512, Some(512)), true, HMAC_USAGES)
            .unwrap()
            .into_key()
            .unwrap();
        let KeyData::Jwk(jwk) = HMAC.export_key(KeyFormat::Jwk, &key).unwrap() else {
            panic!("expected a JWK");
        };
        assert_eq!(jwk.alg.as_deref(), Some("HS512"));

        let imported = HMAC
            .import_key(
                KeyFormat::Jwk,
                &KeyData::Jwk(jwk),
                &import_alg(HashAlg::Sha512, None),
                true,
                HMAC_USAGES,
            )
            .unwrap();
        assert_eq!(
            secret_bytes(&imported).unwrap(),
            secret_bytes(&key).unwrap()
        );
    }

    #[test]
    fn test_get_key_length() {
        assert_eq!(
            HMAC.get_key_length(&import_alg(HashAlg::Sha256, None)).unwrap(),
            512
        );
        assert_eq!(
            HMAC.get_key_length(&import_alg(HashAlg::Sha512, None)).unwrap(),
            1024
        );
        assert_eq!(
            HMAC.get_key_length(&import_alg(HashAlg::Sha256, Some(128))).unwrap(),
            128
        );
        assert!(matches!(
            HMAC.get_key_length(&import_alg(HashAlg::Sha256, Some(0))),
            Err(Error::Type(_))
        ));
    }

    #[test]
    fn test_empty_material_rejected() {
        let err = HMAC
            .import_key(
                KeyFormat::Raw,
                &KeyData::Bytes(vec![]),
                &import_alg(HashAlg::Sha256, None),
                true,
                &[KeyUsage::Sign],
            )
            .unwrap_err();
        assert!(matches!(err, Error::Data(_)));
    }
}
