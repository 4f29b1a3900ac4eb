//! Built-in algorithm modules
//!
//! Each submodule implements [`AlgorithmModule`] for one algorithm
//! family and registers itself in [`install`]. The registration table
//! below is the single source of truth for which (operation,
//! algorithm) pairs exist.

use crate::{
    error::{Error, Result},
    jwk::{b64url_encode, JsonWebKey},
    key::{CryptoKey, KeyMaterial, KeyUsage},
    registry::{AlgorithmModule, Operation, Registry, Schema},
};

mod aes;
mod ecdsa;
mod hmac;
mod kdf;
mod rsa;
mod sha;

use aes::{AES_CBC, AES_GCM, AES_KW};
use ecdsa::ECDSA;
use hmac::HMAC;
use kdf::{HKDF, PBKDF2};
use rsa::{RSASSA_PKCS1, RSA_OAEP, RSA_PSS};
use sha::SHA;

/// Install the built-in algorithm suite into `registry`
pub(crate) fn install(registry: &mut Registry) {
    use Operation::*;
    use Schema::*;

    let r = registry;

    // Digests
    for name in ["SHA-256", "SHA-384", "SHA-512"] {
        r.register(Digest, name, None, &SHA);
    }

    // AES-GCM / AES-CBC: encryption suites
    for (name, schema, imp) in [
        ("AES-GCM", AesGcmParams, &AES_GCM as &'static dyn AlgorithmModule),
        ("AES-CBC", AesCbcParams, &AES_CBC),
    ] {
        r.register(Encrypt, name, schema, imp);
        r.register(Decrypt, name, schema, imp);
        r.register(GenerateKey, name, AesKeyGenParams, imp);
        r.register(ImportKey, name, None, imp);
        r.register(ExportKey, name, None, imp);
        r.register(GetKeyLength, name, AesDerivedKeyParams, imp);
    }

    // AES-KW: native key wrapping
    r.register(WrapKey, "AES-KW", None, &AES_KW);
    r.register(UnwrapKey, "AES-KW", None, &AES_KW);
    r.register(GenerateKey, "AES-KW", AesKeyGenParams, &AES_KW);
    r.register(ImportKey, "AES-KW", None, &AES_KW);
    r.register(ExportKey, "AES-KW", None, &AES_KW);
    r.register(GetKeyLength, "AES-KW", AesDerivedKeyParams, &AES_KW);

    // HMAC
    r.register(Sign, "HMAC", None, &HMAC);
    r.register(Verify, "HMAC", None, &HMAC);
    r.register(GenerateKey, "HMAC", HmacKeyGenParams, &HMAC);
    r.register(ImportKey, "HMAC", HmacImportParams, &HMAC);
    r.register(ExportKey, "HMAC", None, &HMAC);
    r.register(GetKeyLength, "HMAC", HmacImportParams, &HMAC);

    // RSA suites
    r.register(Encrypt, "RSA-OAEP", RsaOaepParams, &RSA_OAEP);
    r.register(Decrypt, "RSA-OAEP", RsaOaepParams, &RSA_OAEP);
    r.register(Sign, "RSASSA-PKCS1-v1_5", None, &RSASSA_PKCS1);
    r.register(Verify, "RSASSA-PKCS1-v1_5", None, &RSASSA_PKCS1);
    r.register(Sign, "RSA-PSS", RsaPssParams, &RSA_PSS);
    r.register(Verify, "RSA-PSS", RsaPssParams, &RSA_PSS);
    for (name, imp) in [
        ("RSA-OAEP", &RSA_OAEP as &'static dyn AlgorithmModule),
        ("RSASSA-PKCS1-v1_5", &RSASSA_PKCS1),
        ("RSA-PSS", &RSA_PSS),
    ] {
        r.register(GenerateKey, name, RsaHashedKeyGenParams, imp);
        r.register(ImportKey, name, RsaHashedImportParams, imp);
        r.register(ExportKey, name, None, imp);
    }

    // ECDSA
    r.register(Sign, "ECDSA", EcdsaParams, &ECDSA);
    r.register(Verify, "ECDSA", EcdsaParams, &ECDSA);
    r.register(GenerateKey, "ECDSA", EcKeyGenParams, &ECDSA);
    r.register(ImportKey, "ECDSA", EcKeyGenParams, &ECDSA);
    r.register(ExportKey, "ECDSA", None, &ECDSA);

    // KDFs: deriveKey normalizes under the deriveBits schema
    r.register(DeriveBits, "HKDF", HkdfParams, &HKDF);
    r.register(DeriveKey, "HKDF", HkdfParams, &HKDF);
    r.register(ImportKey, "HKDF", None, &HKDF);
    r.register(DeriveBits, "PBKDF2", Pbkdf2Params, &PBKDF2);
    r.register(DeriveKey, "PBKDF2", Pbkdf2Params, &PBKDF2);
    r.register(ImportKey, "PBKDF2", None, &PBKDF2);
}

// ---------------------------------------------------------------------------
// Helpers shared between modules
// ---------------------------------------------------------------------------

/// Raw secret bytes behind a key handle
fn secret_bytes(key: &CryptoKey) -> Result<&[u8]> {
    match key.material() {
        KeyMaterial::Secret(bytes) => Ok(bytes),
        _ => Err(Error::Operation(
            "key handle does not hold secret material".to_string(),
        )),
    }
}

/// PKCS#8 DER behind a private key handle
fn pkcs8_bytes(key: &CryptoKey) -> Result<&[u8]> {
    match key.material() {
        KeyMaterial::Pkcs8(der) => Ok(der),
        _ => Err(Error::Operation(
            "key handle does not hold a private key".to_string(),
        )),
    }
}

/// SPKI DER behind a public key handle
fn spki_bytes(key: &CryptoKey) -> Result<&[u8]> {
    match key.material() {
        KeyMaterial::Spki(der) => Ok(der),
        _ => Err(Error::Operation(
            "key handle does not hold a public key".to_string(),
        )),
    }
}

/// Shared structural checks for an imported JWK
///
/// - `kty` must match
/// - a `use` member must match the family's expected use
/// - a `key_ops` member must list every requested usage and only
///   recognized tokens
/// - `ext: false` forbids importing as extractable
fn check_jwk_header(
    jwk: &JsonWebKey,
    expected_kty: &str,
    expected_use: &str,
    extractable: bool,
    usages: &[KeyUsage],
) -> Result<()> {
    if jwk.kty != expected_kty {
        return Err(Error::Data(format!(
            "JWK kty {:?} does not match expected {expected_kty:?}",
            jwk.kty
        )));
    }
    if let Some(use_) = &jwk.use_ {
        if !usages.is_empty() && use_ != expected_use {
            return Err(Error::Data(format!(
                "JWK use {use_:?} does not match expected {expected_use:?}"
            )));
        }
    }
    if let Some(key_ops) = &jwk.key_ops {
        let mut parsed = Vec::with_capacity(key_ops.len());
        for op in key_ops {
            let usage: KeyUsage = op
                .parse()
                .map_err(|_| Error::Data(format!("JWK key_ops entry {op:?} is not a usage")))?;
            parsed.push(usage);
        }
        for usage in usages {
            if !parsed.contains(usage) {
                return Err(Error::Data(format!(
                    "JWK key_ops does not authorize {}",
                    usage.as_str()
                )));
            }
        }
    }
    if jwk.ext == Some(false) && extractable {
        return Err(Error::Data(
            "JWK is marked non-extractable".to_string(),
        ));
    }
    Ok(())
}

/// Assemble the export-side JWK of a symmetric key
fn export_oct_jwk(key: &CryptoKey, alg: String) -> Result<JsonWebKey> {
    let mut jwk = JsonWebKey {
        kty: "oct".to_string(),
        k: Some(b64url_encode(secret_bytes(key)?)),
        alg: Some(alg),
        ..Default::default()
    };
    fill_export_header(&mut jwk, key);
    Ok(jwk)
}

/// Set the `key_ops` and `ext` members every exported JWK carries
fn fill_export_header(jwk: &mut JsonWebKey, key: &CryptoKey) {
    jwk.key_ops = Some(key.usages().iter().map(|u| u.as_str().to_string()).collect());
    jwk.ext = Some(key.extractable());
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::key::{CryptoKey, KeyAlgorithm, KeyMaterial, KeyType, KeyUsage};

    /// A throwaway AES-GCM key for module-level tests
    pub(crate) fn aes_key() -> CryptoKey {
        CryptoKey::new(
            KeyType::Secret,
            true,
            KeyAlgorithm::Aes { name: "AES-GCM", length: 128 },
            vec![KeyUsage::Encrypt, KeyUsage::Decrypt],
            KeyMaterial::Secret(vec![0u8; 16]),
        )
    }
}
