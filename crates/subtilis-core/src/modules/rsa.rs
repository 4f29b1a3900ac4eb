//! RSA modules: RSA-OAEP, RSASSA-PKCS1-v1_5 and RSA-PSS
//!
//! One module type serves the three suites; they share key handling
//! and differ in which cipher/signature capabilities they expose and
//! in their JWK `alg` spelling. The hash is bound to the key when it
//! is generated or imported, as are the modulus length and public
//! exponent.

use subtilis_crypto::asymmetric::rsa as rsa_ops;

use crate::{
    error::{Error, Result},
    jwk::{b64url_encode, JsonWebKey},
    key::{
        CryptoKey, CryptoKeyPair, GeneratedKey, KeyAlgorithm, KeyData, KeyFormat, KeyMaterial,
        KeyType, KeyUsage,
    },
    params::{HashAlg, NormalizedAlgorithm, Params},
    registry::{AlgorithmModule, Operation},
    validate,
};

use super::{check_jwk_header, fill_export_header, pkcs8_bytes, spki_bytes};

pub(super) static RSA_OAEP: RsaModule = RsaModule { suite: Suite::Oaep };
pub(super) static RSASSA_PKCS1: RsaModule = RsaModule { suite: Suite::Pkcs1 };
pub(super) static RSA_PSS: RsaModule = RsaModule { suite: Suite::Pss };

#[derive(Clone, Copy, PartialEq, Eq)]
pub(super) enum Suite {
    Oaep,
    Pkcs1,
    Pss,
}

impl Suite {
    fn name(&self) -> &'static str {
        match self {
            Suite::Oaep => "RSA-OAEP",
            Suite::Pkcs1 => "RSASSA-PKCS1-v1_5",
            Suite::Pss => "RSA-PSS",
        }
    }

    fn public_usages(&self) -> &'static [KeyUsage] {
        match self {
            Suite::Oaep => &[KeyUsage::Encrypt, KeyUsage::WrapKey],
            Suite::Pkcs1 | Suite::Pss => &[KeyUsage::Verify],
        }
    }

    fn private_usages(&self) -> &'static [KeyUsage] {
        match self {
            Suite::Oaep => &[KeyUsage::Decrypt, KeyUsage::UnwrapKey],
            Suite::Pkcs1 | Suite::Pss => &[KeyUsage::Sign],
        }
    }

    fn all_usages(&self) -> Vec<KeyUsage> {
        let mut all = self.public_usages().to_vec();
        all.extend_from_slice(self.private_usages());
        all
    }

    fn expected_use(&self) -> &'static str {
        match self {
            Suite::Oaep => "enc",
            Suite::Pkcs1 | Suite::Pss => "sig",
        }
    }

    fn jwk_alg(&self, hash: HashAlg) -> &'static str {
        match (self, hash) {
            (Suite::Oaep, HashAlg::Sha256) => "RSA-OAEP-256",
            (Suite::Oaep, HashAlg::Sha384) => "RSA-OAEP-384",
            (Suite::Oaep, HashAlg::Sha512) => "RSA-OAEP-512",
            (Suite::Pkcs1, HashAlg::Sha256) => "RS256",
            (Suite::Pkcs1, HashAlg::Sha384) => "RS384",
            (Suite::Pkcs1, HashAlg::Sha512) => "RS512",
            (Suite::Pss, HashAlg::Sha256) => "PS256",
            (Suite::Pss, HashAlg::Sha384) => "PS384",
            (Suite::Pss, HashAlg::Sha512) => "PS512",
        }
    }
}

pub(super) struct RsaModule {
    suite: Suite,
}

impl AlgorithmModule for RsaModule {
    fn supports(&self, op: Operation) -> bool {
        let shared = matches!(
            op,
            Operation::GenerateKey | Operation::ImportKey | Operation::ExportKey
        );
        shared
            || match self.suite {
                Suite::Oaep => matches!(op, Operation::Encrypt | Operation::Decrypt),
                Suite::Pkcs1 | Suite::Pss => matches!(op, Operation::Sign | Operation::Verify),
            }
    }

    fn encrypt(&self, alg: &NormalizedAlgorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        if self.suite != Suite::Oaep {
            return Err(Error::NotSupported(format!(
                "{} does not implement encrypt",
                self.suite.name()
            )));
        }
        if key.key_type() != KeyType::Public {
            return Err(Error::InvalidAccess(
                "RSA-OAEP encryption requires the public key".to_string(),
            ));
        }
        let Params::RsaOaep(params) = &alg.params else {
            return Err(Error::Operation("unexpected parameter record".to_string()));
        };
        let ct = rsa_ops::oaep_encrypt(
            spki_bytes(key)?,
            key_hash(key)?,
            params.label.as_deref(),
            data,
        )?;
        Ok(ct)
    }

    fn decrypt(&self, alg: &NormalizedAlgorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        if self.suite != Suite::Oaep {
            return Err(Error::NotSupported(format!(
                "{} does not implement decrypt",
                self.suite.name()
            )));
        }
        if key.key_type() != KeyType::Private {
            return Err(Error::InvalidAccess(
                "RSA-OAEP decryption requires the private key".to_string(),
            ));
        }
        let Params::RsaOaep(params) = &alg.params else {
            return Err(Error::Operation("unexpected parameter record".to_string()));
        };
        let pt = rsa_ops::oaep_decrypt(
            pkcs8_bytes(key)?,
            key_hash(key)?,
            params.label.as_deref(),
            data,
        )?;
        Ok(pt)
    }

    fn sign(&self, alg: &NormalizedAlgorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        if key.key_type() != KeyType::Private {
            return Err(Error::InvalidAccess(
                "signing requires the private key".to_string(),
            ));
        }
        let hash = key_hash(key)?;
        let sig = match (self.suite, &alg.params) {
            (Suite::Pkcs1, Params::None) => rsa_ops::pkcs1v15_sign(pkcs8_bytes(key)?, hash, data)?,
            (Suite::Pss, Params::RsaPss(params)) => rsa_ops::pss_sign(
                pkcs8_bytes(key)?,
                hash,
                params.salt_length as usize,
                data,
            )?,
            _ => {
                return Err(Error::NotSupported(format!(
                    "{} does not implement sign",
                    self.suite.name()
                )));
            }
        };
        Ok(sig)
    }

    fn verify(
        &self,
        alg: &NormalizedAlgorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool> {
        if key.key_type() != KeyType::Public {
            return Err(Error::InvalidAccess(
                "verification requires the public key".to_string(),
            ));
        }
        let hash = key_hash(key)?;
        let ok = match (self.suite, &alg.params) {
            (Suite::Pkcs1, Params::None) => {
                rsa_ops::pkcs1v15_verify(spki_bytes(key)?, hash, signature, data)?
            }
            (Suite::Pss, Params::RsaPss(params)) => rsa_ops::pss_verify(
                spki_bytes(key)?,
                hash,
                params.salt_length as usize,
                signature,
                data,
            )?,
            _ => {
                return Err(Error::NotSupported(format!(
                    "{} does not implement verify",
                    self.suite.name()
                )));
            }
        };
        Ok(ok)
    }

    fn generate_key(
        &self,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<GeneratedKey> {
        let Params::RsaHashedKeyGen(params) = &alg.params else {
            return Err(Error::Operation("unexpected parameter record".to_string()));
        };
        let name = self.suite.name();
        validate::require_allowed_usages(name, usages, &self.suite.all_usages())?;
        if params.modulus_length % 8 != 0 || params.modulus_length < 1024 {
            return Err(Error::Operation(format!(
                "RSA modulus length {} is not supported",
                params.modulus_length
            )));
        }
        // 3 and 65537 are the exponents every deployment agrees on
        if params.public_exponent != [3] && params.public_exponent != [1, 0, 1] {
            return Err(Error::Operation(
                "unsupported RSA public exponent".to_string(),
            ));
        }
        let (pkcs8, spki) =
            rsa_ops::generate_pkcs8(params.modulus_length as usize, &params.public_exponent)?;
        let key_alg = KeyAlgorithm::Rsa {
            name,
            modulus_length: params.modulus_length,
            public_exponent: params.public_exponent.clone(),
            hash: params.hash,
        };
        let public_key = CryptoKey::new(
            KeyType::Public,
            true,
            key_alg.clone(),
            intersect(usages, self.suite.public_usages()),
            KeyMaterial::Spki(spki),
        );
        let private_key = CryptoKey::new(
            KeyType::Private,
            extractable,
            key_alg,
            intersect(usages, self.suite.private_usages()),
            KeyMaterial::Pkcs8(pkcs8),
        );
        Ok(GeneratedKey::Pair(CryptoKeyPair { public_key, private_key }))
    }

    fn import_key(
        &self,
        format: KeyFormat,
        data: &KeyData,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let Params::RsaHashedImport(params) = &alg.params else {
            return Err(Error::Operation("unexpected parameter record".to_string()));
        };
        let name = self.suite.name();
        match format {
            KeyFormat::Pkcs8 => {
                validate::require_allowed_usages(name, usages, self.suite.private_usages())?;
                let der = data.as_bytes()?;
                let (modulus_length, public_exponent) =
                    rsa_ops::key_info_from_pkcs8(der).map_err(data_err)?;
                Ok(CryptoKey::new(
                    KeyType::Private,
                    extractable,
                    KeyAlgorithm::Rsa {
                        name,
                        modulus_length,
                        public_exponent,
                        hash: params.hash,
                    },
                    usages.to_vec(),
                    KeyMaterial::Pkcs8(der.to_vec()),
                ))
            }
            KeyFormat::Spki => {
                validate::require_allowed_usages(name, usages, self.suite.public_usages())?;
                let der = data.as_bytes()?;
                let (modulus_length, public_exponent) =
                    rsa_ops::key_info_from_spki(der).map_err(data_err)?;
                Ok(CryptoKey::new(
                    KeyType::Public,
                    extractable,
                    KeyAlgorithm::Rsa {
                        name,
                        modulus_length,
                        public_exponent,
                        hash: params.hash,
                    },
                    usages.to_vec(),
                    KeyMaterial::Spki(der.to_vec()),
                ))
            }
            KeyFormat::Jwk => {
                let jwk = data.as_jwk()?;
                check_jwk_header(jwk, "RSA", self.suite.expected_use(), extractable, usages)?;
                if let Some(jwk_alg) = &jwk.alg {
                    let expected = self.suite.jwk_alg(params.hash);
                    if jwk_alg != expected {
                        return Err(Error::Data(format!(
                            "JWK alg {jwk_alg:?} does not match expected {expected:?}"
                        )));
                    }
                }
                let n = jwk.member("n")?;
                let e = jwk.member("e")?;
                if jwk.d.is_some() {
                    validate::require_allowed_usages(name, usages, self.suite.private_usages())?;
                    let d = jwk.member("d")?;
                    let p = jwk.member("p")?;
                    let q = jwk.member("q")?;
                    let pkcs8 =
                        rsa_ops::pkcs8_from_components(&n, &e, &d, &p, &q).map_err(data_err)?;
                    let (modulus_length, public_exponent) =
                        rsa_ops::key_info_from_pkcs8(&pkcs8).map_err(data_err)?;
                    Ok(CryptoKey::new(
                        KeyType::Private,
                        extractable,
                        KeyAlgorithm::Rsa {
                            name,
                            modulus_length,
                            public_exponent,
                            hash: params.hash,
                        },
                        usages.to_vec(),
                        KeyMaterial::Pkcs8(pkcs8),
                    ))
                } else {
                    validate::require_allowed_usages(name, usages, self.suite.public_usages())?;
                    let spki = rsa_ops::spki_from_components(&n, &e).map_err(data_err)?;
                    let (modulus_length, public_exponent) =
                        rsa_ops::key_info_from_spki(&spki).map_err(data_err)?;
                    Ok(CryptoKey::new(
                        KeyType::Public,
                        extractable,
                        KeyAlgorithm::Rsa {
                            name,
                            modulus_length,
                            public_exponent,
                            hash: params.hash,
                        },
                        usages.to_vec(),
                        KeyMaterial::Spki(spki),
                    ))
                }
            }
            KeyFormat::Raw => Err(Error::NotSupported(
                "RSA keys cannot be imported from raw material".to_string(),
            )),
        }
    }

    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<KeyData> {
        match format {
            KeyFormat::Pkcs8 => {
                if key.key_type() != KeyType::Private {
                    return Err(Error::InvalidAccess(
                        "pkcs8 export requires a private key".to_string(),
                    ));
                }
                Ok(KeyData::Bytes(pkcs8_bytes(key)?.to_vec()))
            }
            KeyFormat::Spki => {
                if key.key_type() != KeyType::Public {
                    return Err(Error::InvalidAccess(
                        "spki export requires a public key".to_string(),
                    ));
                }
                Ok(KeyData::Bytes(spki_bytes(key)?.to_vec()))
            }
            KeyFormat::Jwk => {
                let mut jwk = JsonWebKey {
                    kty: "RSA".to_string(),
                    alg: Some(self.suite.jwk_alg(key_hash(key)?).to_string()),
                    ..Default::default()
                };
                match key.key_type() {
                    KeyType::Public => {
                        let c = rsa_ops::public_components(spki_bytes(key)?)?;
                        jwk.n = Some(b64url_encode(&c.n));
                        jwk.e = Some(b64url_encode(&c.e));
                    }
                    KeyType::Private => {
                        let c = rsa_ops::private_components(pkcs8_bytes(key)?)?;
                        jwk.n = Some(b64url_encode(&c.n));
                        jwk.e = Some(b64url_encode(&c.e));
                        jwk.d = Some(b64url_encode(&c.d));
                        jwk.p = Some(b64url_encode(&c.p));
                        jwk.q = Some(b64url_encode(&c.q));
                        jwk.dp = Some(b64url_encode(&c.dp));
                        jwk.dq = Some(b64url_encode(&c.dq));
                        jwk.qi = Some(b64url_encode(&c.qi));
                    }
                    KeyType::Secret => {
                        return Err(Error::Operation(
                            "key was not created by an RSA module".to_string(),
                        ));
                    }
                }
                fill_export_header(&mut jwk, key);
                Ok(KeyData::Jwk(jwk))
            }
            KeyFormat::Raw => Err(Error::NotSupported(
                "RSA keys cannot be exported as raw material".to_string(),
            )),
        }
    }
}

fn key_hash(key: &CryptoKey) -> Result<HashAlg> {
    match key.algorithm() {
        KeyAlgorithm::Rsa { hash, .. } => Ok(*hash),
        _ => Err(Error::Operation(
            "key was not created by an RSA module".to_string(),
        )),
    }
}

fn intersect(usages: &[KeyUsage], allowed: &[KeyUsage]) -> Vec<KeyUsage> {
    usages
        .iter()
        .copied()
        .filter(|u| allowed.contains(u))
        .collect()
}

fn data_err(e: subtilis_crypto::Error) -> Error {
    Error::Data(e.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;
    use crate::params::{RsaHashedImportParams, RsaHashedKeyGenParams, RsaOaepParams, RsaPssParams};

    const EXP: [u8; 3] = [1, 0, 1];

    // One 2048-bit pair per suite, generated with the full usage set
    fn pair(module: &RsaModule) -> &'static CryptoKeyPair {
        static OAEP: OnceLock<CryptoKeyPair> = OnceLock::new();
        static PKCS1: OnceLock<CryptoKeyPair> = OnceLock::new();
        static PSS: OnceLock<CryptoKeyPair> = OnceLock::new();
        let cell = match module.suite {
            Suite::Oaep => &OAEP,
            Suite::Pkcs1 => &PKCS1,
            Suite::Pss => &PSS,
        };
        cell.get_or_init(|| {
            let alg = NormalizedAlgorithm::new(
                module.suite.name(),
                Params::RsaHashedKeyGen(RsaHashedKeyGenParams {
                    modulus_length: 2048,
                    public_exponent: EXP.to_vec(),
                    hash: HashAlg::Sha256,
                }),
            );
            module
                .generate_key(&alg, true, &module.suite.all_usages())
                .unwrap()
                .into_pair()
                .unwrap()
        })
    }

    fn oaep_alg() -> NormalizedAlgorithm {
        NormalizedAlgorithm::new("RSA-OAEP", Params::RsaOaep(RsaOaepParams { label: None }))
    }

    #[test]
    fn test_oaep_roundtrip_and_usage_split() {
        let pair = pair(&RSA_OAEP);
        // Requested usages split by key half
        assert_eq!(pair.public_key.usages(), &[KeyUsage::Encrypt, KeyUsage::WrapKey]);
        assert_eq!(pair.private_key.usages(), &[KeyUsage::Decrypt, KeyUsage::UnwrapKey]);

        let ct = RSA_OAEP.encrypt(&oaep_alg(), &pair.public_key, b"secret").unwrap();
        assert_eq!(
            RSA_OAEP.decrypt(&oaep_alg(), &pair.private_key, &ct).unwrap(),
            b"secret"
        );
    }

    #[test]
    fn test_oaep_wrong_key_half() {
        let pair = pair(&RSA_OAEP);
        assert!(matches!(
            RSA_OAEP.encrypt(&oaep_alg(), &pair.private_key, b"x"),
            Err(Error::InvalidAccess(_))
        ));
        assert!(matches!(
            RSA_OAEP.decrypt(&oaep_alg(), &pair.public_key, b"x"),
            Err(Error::InvalidAccess(_))
        ));
    }

    #[test]
    fn test_pkcs1_sign_verify() {
        let pair = pair(&RSASSA_PKCS1);
        let alg = NormalizedAlgorithm::new("RSASSA-PKCS1-v1_5", Params::None);
        let sig = RSASSA_PKCS1.sign(&alg, &pair.private_key, b"message").unwrap();
        assert!(RSASSA_PKCS1.verify(&alg, &pair.public_key, &sig, b"message").unwrap());
        assert!(!RSASSA_PKCS1.verify(&alg, &pair.public_key, &sig, b"other").unwrap());
    }

    #[test]
    fn test_pss_sign_verify() {
        let pair = pair(&RSA_PSS);
        let alg = NormalizedAlgorithm::new(
            "RSA-PSS",
            Params::RsaPss(RsaPssParams { salt_length: 32 }),
        );
        let sig = RSA_PSS.sign(&alg, &pair.private_key, b"message").unwrap();
        assert!(RSA_PSS.verify(&alg, &pair.public_key, &sig, b"message").unwrap());
    }

    #[test]
    fn test_generate_rejects_exotic_exponent() {
        let alg = NormalizedAlgorithm::new(
            "RSA-OAEP",
            Params::RsaHashedKeyGen(RsaHashedKeyGenParams {
                modulus_length: 2048,
                public_exponent: vec![1, 0, 0, 1],
                hash: HashAlg::Sha256,
            }),
        );
        assert!(matches!(
            RSA_OAEP.generate_key(&alg, true, &[KeyUsage::Encrypt]),
            Err(Error::Operation(_))
        ));
    }

    #[test]
    fn test_import_export_pkcs8_spki() {
        let pair = pair(&RSASSA_PKCS1);
        let import_alg = NormalizedAlgorithm::new(
            "RSASSA-PKCS1-v1_5",
            Params::RsaHashedImport(RsaHashedImportParams { hash: HashAlg::Sha256 }),
        );

        let KeyData::Bytes(pkcs8) =
            RSASSA_PKCS1.export_key(KeyFormat::Pkcs8, &pair.private_key).unwrap()
        else {
            panic!("expected bytes");
        };
        let private = RSASSA_PKCS1
            .import_key(KeyFormat::Pkcs8, &KeyData::Bytes(pkcs8), &import_alg, true, &[KeyUsage::Sign])
            .unwrap();
        assert_eq!(private.key_type(), KeyType::Private);
        match private.algorithm() {
            KeyAlgorithm::Rsa { modulus_length, public_exponent, .. } => {
                assert_eq!(*modulus_length, 2048);
                assert_eq!(public_exponent, &EXP);
            }
            other => panic!("unexpected algorithm {other:?}"),
        }

        let KeyData::Bytes(spki) =
            RSASSA_PKCS1.export_key(KeyFormat::Spki, &pair.public_key).unwrap()
        else {
            panic!("expected bytes");
        };
        let public = RSASSA_PKCS1
            .import_key(KeyFormat::Spki, &KeyData::Bytes(spki), &import_alg, true, &[KeyUsage::Verify])
            .unwrap();
        assert_eq!(public.key_type(), KeyType::Public);
    }

    #[test]
    fn test_jwk_roundtrip_private() {
        let pair = pair(&RSA_OAEP);
        let KeyData::Jwk(jwk) = RSA_OAEP.export_key(KeyFormat::Jwk, &pair.private_key).unwrap()
        else {
            panic!("expected a JWK");
        };
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.alg.as_deref(), Some("RSA-OAEP-256"));
        assert!(jwk.d.is_some() && jwk.p.is_some() && jwk.qi.is_some());

        let import_alg = NormalizedAlgorithm::new(
            "RSA-OAEP",
            Params::RsaHashedImport(RsaHashedImportParams { hash: HashAlg::Sha256 }),
        );
        let imported = RSA_OAEP
            .import_key(KeyFormat::Jwk, &KeyData::Jwk(jwk), &import_alg, true, &[KeyUsage::Decrypt])
            .unwrap();

        // The reimported key must decrypt what the original public key encrypts
        let ct = RSA_OAEP.encrypt(&oaep_alg(), &pair.public_key, b"roundtrip").unwrap();
        assert_eq!(RSA_OAEP.decrypt(&oaep_alg(), &imported, &ct).unwrap(), b"roundtrip");
    }

    #[test]
    fn test_spki_export_of_private_key_denied() {
        let pair = pair(&RSA_OAEP);
        assert!(matches!(
            RSA_OAEP.export_key(KeyFormat::Spki, &pair.private_key),
            Err(Error::InvalidAccess(_))
        ));
        assert!(matches!(
            RSA_OAEP.export_key(KeyFormat::Pkcs8, &pair.public_key),
            Err(Error::InvalidAccess(_))
        ));
    }

    #[test]
    fn test_garbage_der_is_data_error() {
        let import_alg = NormalizedAlgorithm::new(
            "RSA-OAEP",
            Params::RsaHashedImport(RsaHashedImportParams { hash: HashAlg::Sha256 }),
        );
        assert!(matches!(
            RSA_OAEP.import_key(
                KeyFormat::Pkcs8,
                &KeyData::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
                &import_alg,
                true,
                &[KeyUsage::Decrypt]
            ),
            Err(Error::Data(_))
        ));
    }
}
