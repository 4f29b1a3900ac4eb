//! ECDSA module (P-256, P-384)

use subtilis_crypto::asymmetric::ecdsa as ec_ops;

use crate::{
    error::{Error, Result},
    jwk::{b64url_encode, JsonWebKey},
    key::{
        CryptoKey, CryptoKeyPair, GeneratedKey, KeyAlgorithm, KeyData, KeyFormat, KeyMaterial,
        KeyType, KeyUsage,
    },
    params::{NamedCurve, NormalizedAlgorithm, Params},
    registry::{AlgorithmModule, Operation},
    validate,
};

use super::{check_jwk_header, fill_export_header, pkcs8_bytes, spki_bytes};

pub(super) static ECDSA: EcdsaModule = EcdsaModule;

const PUBLIC_USAGES: &[KeyUsage] = &[KeyUsage::Verify];
const PRIVATE_USAGES: &[KeyUsage] = &[KeyUsage::Sign];
const ALL_USAGES: &[KeyUsage] = &[KeyUsage::Sign, KeyUsage::Verify];

pub(super) struct EcdsaModule;

impl AlgorithmModule for EcdsaModule {
    fn supports(&self, op: Operation) -> bool {
        matches!(
            op,
            Operation::Sign
                | Operation::Verify
                | Operation::GenerateKey
                | Operation::ImportKey
                | Operation::ExportKey
        )
    }

    fn sign(&self, alg: &NormalizedAlgorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        if key.key_type() != KeyType::Private {
            return Err(Error::InvalidAccess(
                "signing requires the private key".to_string(),
            ));
        }
        let Params::Ecdsa(params) = &alg.params else {
            return Err(Error::Operation("unexpected parameter record".to_string()));
        };
        let sig = ec_ops::sign(key_curve(key)?, pkcs8_bytes(key)?, params.hash, data)?;
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
        let Params::Ecdsa(params) = &alg.params else {
            return Err(Error::Operation("unexpected parameter record".to_string()));
        };
        let ok = ec_ops::verify(key_curve(key)?, spki_bytes(key)?, params.hash, signature, data)?;
        Ok(ok)
    }

    fn generate_key(
        &self,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<GeneratedKey> {
        let Params::EcKeyGen(params) = &alg.params else {
            return Err(Error::Operation("unexpected parameter record".to_string()));
        };
        validate::require_allowed_usages("ECDSA", usages, ALL_USAGES)?;
        let curve = params.named_curve;
        let (pkcs8, spki) = ec_ops::generate_pkcs8(curve)?;
        let key_alg = KeyAlgorithm::Ec { name: "ECDSA", named_curve: curve };
        let public_key = CryptoKey::new(
            KeyType::Public,
            true,
            key_alg.clone(),
            intersect(usages, PUBLIC_USAGES),
            KeyMaterial::Spki(spki),
        );
        let private_key = CryptoKey::new(
            KeyType::Private,
            extractable,
            key_alg,
            intersect(usages, PRIVATE_USAGES),
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
        let Params::EcKeyGen(params) = &alg.params else {
            return Err(Error::Operation("unexpected parameter record".to_string()));
        };
        let curve = params.named_curve;
        let key_alg = KeyAlgorithm::Ec { name: "ECDSA", named_curve: curve };
        match format {
            KeyFormat::Raw => {
                validate::require_allowed_usages("ECDSA", usages, PUBLIC_USAGES)?;
                let spki = ec_ops::spki_from_raw_point(curve, data.as_bytes()?)
                    .map_err(data_err)?;
                Ok(CryptoKey::new(
                    KeyType::Public,
                    extractable,
                    key_alg,
                    usages.to_vec(),
                    KeyMaterial::Spki(spki),
                ))
            }
            KeyFormat::Pkcs8 => {
                validate::require_allowed_usages("ECDSA", usages, PRIVATE_USAGES)?;
                let der = data.as_bytes()?;
                ec_ops::validate_pkcs8(curve, der).map_err(data_err)?;
                Ok(CryptoKey::new(
                    KeyType::Private,
                    extractable,
                    key_alg,
                    usages.to_vec(),
                    KeyMaterial::Pkcs8(der.to_vec()),
                ))
            }
            KeyFormat::Spki => {
                validate::require_allowed_usages("ECDSA", usages, PUBLIC_USAGES)?;
                let der = data.as_bytes()?;
                ec_ops::validate_spki(curve, der).map_err(data_err)?;
                Ok(CryptoKey::new(
                    KeyType::Public,
                    extractable,
                    key_alg,
                    usages.to_vec(),
                    KeyMaterial::Spki(der.to_vec()),
                ))
            }
            KeyFormat::Jwk => {
                let jwk = data.as_jwk()?;
                check_jwk_header(jwk, "EC", "sig", extractable, usages)?;
                match jwk.crv.as_deref() {
                    Some(crv) if crv == curve.name() => {}
                    Some(crv) => {
                        return Err(Error::Data(format!(
                            "JWK crv {crv:?} does not match expected {:?}",
                            curve.name()
                        )));
                    }
                    None => {
                        return Err(Error::Data("JWK is missing the \"crv\" member".to_string()));
                    }
                }
                if jwk.d.is_some() {
                    validate::require_allowed_usages("ECDSA", usages, PRIVATE_USAGES)?;
                    let d = jwk.member("d")?;
                    let pkcs8 = ec_ops::pkcs8_from_scalar(curve, &d).map_err(data_err)?;
                    Ok(CryptoKey::new(
                        KeyType::Private,
                        extractable,
                        key_alg,
                        usages.to_vec(),
                        KeyMaterial::Pkcs8(pkcs8),
                    ))
                } else {
                    validate::require_allowed_usages("ECDSA", usages, PUBLIC_USAGES)?;
                    let x = jwk.member("x")?;
                    let y = jwk.member("y")?;
                    let spki = ec_ops::spki_from_coords(curve, &x, &y).map_err(data_err)?;
                    Ok(CryptoKey::new(
                        KeyType::Public,
                        extractable,
                        key_alg,
                        usages.to_vec(),
                        KeyMaterial::Spki(spki),
                    ))
                }
            }
        }
    }

    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<KeyData> {
        let curve = key_curve(key)?;
        match format {
            KeyFormat::Raw => {
                if key.key_type() != KeyType::Public {
                    return Err(Error::InvalidAccess(
                        "raw export requires a public key".to_string(),
                    ));
                }
                Ok(KeyData::Bytes(ec_ops::raw_point_from_spki(curve, spki_bytes(key)?)?))
            }
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
                    kty: "EC".to_string(),
                    crv: Some(curve.name().to_string()),
                    ..Default::default()
                };
                let spki = match key.key_type() {
                    KeyType::Public => spki_bytes(key)?.to_vec(),
                    KeyType::Private => ec_ops::pkcs8_to_spki(curve, pkcs8_bytes(key)?)?,
                    KeyType::Secret => {
                        return Err(Error::Operation(
                            "key was not created by the ECDSA module".to_string(),
                        ));
                    }
                };
                let (x, y) = ec_ops::public_coords(curve, &spki)?;
                jwk.x = Some(b64url_encode(&x));
                jwk.y = Some(b64url_encode(&y));
                if key.key_type() == KeyType::Private {
                    let d = ec_ops::private_scalar(curve, pkcs8_bytes(key)?)?;
                    jwk.d = Some(b64url_encode(&d));
                }
                fill_export_header(&mut jwk, key);
                Ok(KeyData::Jwk(jwk))
            }
        }
    }
}

fn key_curve(key: &CryptoKey) -> Result<NamedCurve> {
    match key.algorithm() {
        KeyAlgorithm::Ec { named_curve, .. } => Ok(*named_curve),
        _ => Err(Error::Operation(
            "key was not created by the ECDSA module".to_string(),
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
