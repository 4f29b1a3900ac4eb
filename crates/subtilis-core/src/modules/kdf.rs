//! Key derivation modules: HKDF and PBKDF2
//!
//! KDF keys are import-only carriers of input material: they cannot
//! be generated, exported or used for anything but derivation, and
//! they must be imported non-extractable.

use subtilis_crypto::kdf;

use crate::{
    error::{Error, Result},
    key::{
        CryptoKey, GeneratedKey, KeyAlgorithm, KeyData, KeyFormat, KeyMaterial, KeyType, KeyUsage,
    },
    params::{NormalizedAlgorithm, Params},
    registry::{AlgorithmModule, Operation},
    validate,
};

use super::secret_bytes;

pub(super) static HKDF: KdfModule = KdfModule { name: "HKDF" };
pub(super) static PBKDF2: KdfModule = KdfModule { name: "PBKDF2" };

const KDF_USAGES: &[KeyUsage] = &[KeyUsage::DeriveKey, KeyUsage::DeriveBits];

pub(super) struct KdfModule {
    name: &'static str,
}

impl AlgorithmModule for KdfModule {
    fn supports(&self, op: Operation) -> bool {
        matches!(
            op,
            Operation::DeriveBits | Operation::DeriveKey | Operation::ImportKey
        )
    }

    fn import_key(
        &self,
        format: KeyFormat,
        data: &KeyData,
        _alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        if format != KeyFormat::Raw {
            return Err(Error::NotSupported(format!(
                "{} keys can only be imported from raw material",
                self.name
            )));
        }
        validate::require_allowed_usages(self.name, usages, KDF_USAGES)?;
        if extractable {
            return Err(Error::Syntax(format!(
                "{} keys must be imported with extractable = false",
                self.name
            )));
        }
        Ok(CryptoKey::new(
            KeyType::Secret,
            false,
            KeyAlgorithm::Kdf { name: self.name },
            usages.to_vec(),
            KeyMaterial::Secret(data.as_bytes()?.to_vec()),
        ))
    }

    fn derive_bits(
        &self,
        alg: &NormalizedAlgorithm,
        key: &CryptoKey,
        length: u32,
    ) -> Result<Vec<u8>> {
        if length == 0 || length % 8 != 0 {
            return Err(Error::Operation(format!(
                "derived length must be a non-zero multiple of 8 bits, got {length}"
            )));
        }
        let out_len = length as usize / 8;
        let ikm = secret_bytes(key)?;
        let bits = match &alg.params {
            Params::Hkdf(params) => {
                kdf::hkdf_derive(params.hash, ikm, &params.salt, &params.info, out_len)?
            }
            Params::Pbkdf2(params) => {
                if params.iterations == 0 {
                    return Err(Error::Operation(
                        "PBKDF2 requires a non-zero iteration count".to_string(),
                    ));
                }
                kdf::pbkdf2_derive(params.hash, ikm, &params.salt, params.iterations, out_len)?
            }
            _ => {
                return Err(Error::Operation("unexpected parameter record".to_string()));
            }
        };
        Ok(bits)
    }

    fn generate_key(
        &self,
        _alg: &NormalizedAlgorithm,
        _extractable: bool,
        _usages: &[KeyUsage],
    ) -> Result<GeneratedKey> {
        Err(Error::NotSupported(format!(
            "{} keys cannot be generated, only imported",
            self.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{HashAlg, HkdfParams, Pbkdf2Params};

    fn import(module: &KdfModule, ikm: &[u8]) -> CryptoKey {
        let alg = NormalizedAlgorithm::new(module.name, Params::None);
        module
            .import_key(
                KeyFormat::Raw,
                &KeyData::Bytes(ikm.to_vec()),
                &alg,
                false,
                KDF_USAGES,
            )
            .unwrap()
    }

    fn hkdf_alg() -> NormalizedAlgorithm {
        NormalizedAlgorithm::new(
            "HKDF",
            Params::Hkdf(HkdfParams {
                hash: HashAlg::Sha256,
                salt: b"salt".to_vec(),
                info: b"info".to_vec(),
            }),
        )
    }

    #[test]
    fn test_hkdf_derive() {
        let key = import(&HKDF, b"input keying material");
        let bits = HKDF.derive_bits(&hkdf_alg(), &key, 256).unwrap();
        assert_eq!(bits.len(), 32);
        // Deterministic
        assert_eq!(bits, HKDF.derive_bits(&hkdf_alg(), &key, 256).unwrap());
    }

    #[test]
    fn test_pbkdf2_derive() {
        let key = import(&PBKDF2, b"password");
        let alg = NormalizedAlgorithm::new(
            "PBKDF2",
            Params::Pbkdf2(Pbkdf2Params {
                hash: HashAlg::Sha256,
                salt: b"salt".to_vec(),
                iterations: 2,
            }),
        );
        let bits = PBKDF2.derive_bits(&alg, &key, 256).unwrap();
        // RFC 6070-style vector recomputed for HMAC-SHA256
        assert_eq!(
            hex::encode(bits),
            "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43"
        );
    }

    #[test]
    fn test_length_must_be_whole_bytes() {
        let key = import(&HKDF, b"ikm");
        assert!(matches!(
            HKDF.derive_bits(&hkdf_alg(), &key, 12),
            Err(Error::Operation(_))
        ));
        assert!(matches!(
            HKDF.derive_bits(&hkdf_alg(), &key, 0),
            Err(Error::Operation(_))
        ));
    }

    #[test]
    fn test_import_must_be_non_extractable() {
        let alg = NormalizedAlgorithm::new("HKDF", Params::None);
        assert!(matches!(
            HKDF.import_key(
                KeyFormat::Raw,
                &KeyData::Bytes(b"ikm".to_vec()),
                &alg,
                true,
                KDF_USAGES
            ),
            Err(Error::Syntax(_))
        ));
    }

    #[test]
    fn test_import_rejects_non_raw() {
        let alg = NormalizedAlgorithm::new("HKDF", Params::None);
        assert!(matches!(
            HKDF.import_key(
                KeyFormat::Pkcs8,
                &KeyData::Bytes(b"ikm".to_vec()),
                &alg,
                false,
                KDF_USAGES
            ),
            Err(Error::NotSupported(_))
        ));
    }

    #[test]
    fn test_generate_not_supported() {
        let alg = NormalizedAlgorithm::new("PBKDF2", Params::None);
        assert!(matches!(
            PBKDF2.generate_key(&alg, false, KDF_USAGES),
            Err(Error::NotSupported(_))
        ));
    }
}
