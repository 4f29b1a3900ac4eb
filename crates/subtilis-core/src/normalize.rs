//! Algorithm normalization
//!
//! `normalize` turns a caller descriptor into the parameter record of
//! one specific operation. The procedure is pure: it reads the
//! registry and the descriptor, touches no key material and performs
//! no I/O, so the same inputs always produce the same record.

use crate::{
    algorithm::Algorithm,
    error::{Error, Result},
    params::*,
    registry::{Operation, Registry, Schema},
};

/// Normalize `desc` against `op`
///
/// Fails with `NotSupported` when the name is missing or not
/// registered for the operation, `Syntax` when a required member is
/// absent, and `Data` when a member is present but does not parse.
pub fn normalize(registry: &Registry, op: Operation, desc: &Algorithm) -> Result<NormalizedAlgorithm> {
    if desc.name.is_empty() {
        return Err(Error::NotSupported(
            "algorithm descriptor has no name".to_string(),
        ));
    }
    let entry = registry
        .lookup(op, &desc.name)
        .ok_or_else(|| Error::unregistered(op.as_str(), &desc.name))?;
    let name = entry.name;

    let params = match entry.schema {
        Schema::None => Params::None,
        Schema::AesGcmParams => Params::AesGcm(AesGcmParams {
            iv: required(name, "iv", &desc.iv)?,
            additional_data: desc.additional_data.clone(),
            tag_length: desc.tag_length.unwrap_or(128),
        }),
        Schema::AesCbcParams => Params::AesCbc(AesCbcParams {
            iv: required(name, "iv", &desc.iv)?,
        }),
        Schema::AesKeyGenParams => Params::AesKeyGen(AesKeyGenParams {
            length: required(name, "length", &desc.length)?,
        }),
        Schema::AesDerivedKeyParams => Params::AesDerivedKey(AesDerivedKeyParams {
            length: required(name, "length", &desc.length)?,
        }),
        Schema::HmacImportParams => Params::HmacImport(HmacImportParams {
            hash: normalize_hash(registry, name, desc)?,
            length: desc.length,
        }),
        Schema::HmacKeyGenParams => Params::HmacKeyGen(HmacKeyGenParams {
            hash: normalize_hash(registry, name, desc)?,
            length: desc.length,
        }),
        Schema::RsaHashedKeyGenParams => Params::RsaHashedKeyGen(RsaHashedKeyGenParams {
            modulus_length: required(name, "modulusLength", &desc.modulus_length)?,
            public_exponent: required(name, "publicExponent", &desc.public_exponent)?,
            hash: normalize_hash(registry, name, desc)?,
        }),
        Schema::RsaHashedImportParams => Params::RsaHashedImport(RsaHashedImportParams {
            hash: normalize_hash(registry, name, desc)?,
        }),
        Schema::RsaOaepParams => Params::RsaOaep(RsaOaepParams {
            label: desc.label.clone(),
        }),
        Schema::RsaPssParams => Params::RsaPss(RsaPssParams {
            salt_length: required(name, "saltLength", &desc.salt_length)?,
        }),
        Schema::EcKeyGenParams => Params::EcKeyGen(EcKeyGenParams {
            named_curve: parse_curve(name, &desc.named_curve)?,
        }),
        Schema::EcdsaParams => Params::Ecdsa(EcdsaParams {
            hash: normalize_hash(registry, name, desc)?,
        }),
        Schema::HkdfParams => Params::Hkdf(HkdfParams {
            hash: normalize_hash(registry, name, desc)?,
            salt: required(name, "salt", &desc.salt)?,
            info: required(name, "info", &desc.info)?,
        }),
        Schema::Pbkdf2Params => Params::Pbkdf2(Pbkdf2Params {
            hash: normalize_hash(registry, name, desc)?,
            salt: required(name, "salt", &desc.salt)?,
            iterations: required(name, "iterations", &desc.iterations)?,
        }),
    };

    Ok(NormalizedAlgorithm::new(name, params))
}

fn required<T: Clone>(name: &str, member: &str, value: &Option<T>) -> Result<T> {
    value
        .clone()
        .ok_or_else(|| Error::missing_member(name, member))
}

// A nested hash member is itself a descriptor and normalizes under
// the digest operation.
fn normalize_hash(registry: &Registry, name: &str, desc: &Algorithm) -> Result<HashAlg> {
    let hash_desc = desc
        .hash
        .as_deref()
        .ok_or_else(|| Error::missing_member(name, "hash"))?;
    let normalized = normalize(registry, Operation::Digest, hash_desc)?;
    match normalized.name {
        "SHA-256" => Ok(HashAlg::Sha256),
        "SHA-384" => Ok(HashAlg::Sha384),
        "SHA-512" => Ok(HashAlg::Sha512),
        other => Err(Error::NotSupported(format!(
            "{other} cannot be used as the hash member of {name}"
        ))),
    }
}

fn parse_curve(name: &str, curve: &Option<String>) -> Result<NamedCurve> {
    let curve = curve
        .as_deref()
        .ok_or_else(|| Error::missing_member(name, "namedCurve"))?;
    match curve {
        "P-256" => Ok(NamedCurve::P256),
        "P-384" => Ok(NamedCurve::P384),
        other => Err(Error::NotSupported(format!(
            "named curve {other:?} is not supported"
        ))),
    }
}
