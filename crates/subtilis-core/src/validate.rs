//! Usage, extractability and format gates
//!
//! Every check here runs before any algorithm code sees the key, and
//! the produced-key checks run before a new key reaches the caller.

use crate::{
    error::{Error, Result},
    key::{CryptoKey, CryptoKeyPair, KeyData, KeyFormat, KeyType, KeyUsage},
};

/// The normalized algorithm must be the one the key was created under
pub(crate) fn require_name_match(params_name: &str, key: &CryptoKey) -> Result<()> {
    if params_name != key.algorithm().name() {
        return Err(Error::InvalidAccess(format!(
            "algorithm {params_name} does not match the key's algorithm {}",
            key.algorithm().name()
        )));
    }
    Ok(())
}

/// The key must be authorized for `usage`
pub(crate) fn require_usage(key: &CryptoKey, usage: KeyUsage) -> Result<()> {
    if !key.usages().contains(&usage) {
        return Err(Error::InvalidAccess(format!(
            "key does not authorize {}",
            usage.as_str()
        )));
    }
    Ok(())
}

/// The key's bytes may leave the process only if it is extractable
pub(crate) fn require_extractable(key: &CryptoKey) -> Result<()> {
    if !key.extractable() {
        return Err(Error::InvalidAccess("key is not extractable".to_string()));
    }
    Ok(())
}

/// `raw`/`pkcs8`/`spki` material must be a buffer, `jwk` material a JWK
pub(crate) fn require_format_match(format: KeyFormat, data: &KeyData) -> Result<()> {
    match (format, data) {
        (KeyFormat::Jwk, KeyData::Jwk(_)) => Ok(()),
        (KeyFormat::Jwk, KeyData::Bytes(_)) => Err(Error::Type(
            "jwk format requires a structured JSON Web Key".to_string(),
        )),
        (_, KeyData::Bytes(_)) => Ok(()),
        (format, KeyData::Jwk(_)) => Err(Error::Type(format!(
            "{} format requires an octet buffer",
            format.as_str()
        ))),
    }
}

/// Deduplicate a usage list, preserving first-occurrence order
pub(crate) fn normalize_usages(usages: &[KeyUsage]) -> Vec<KeyUsage> {
    let mut out = Vec::with_capacity(usages.len());
    for &usage in usages {
        if !out.contains(&usage) {
            out.push(usage);
        }
    }
    out
}

/// Every requested usage must be in the set the key kind admits
pub(crate) fn require_allowed_usages(
    name: &str,
    usages: &[KeyUsage],
    allowed: &[KeyUsage],
) -> Result<()> {
    for usage in usages {
        if !allowed.contains(usage) {
            return Err(Error::Syntax(format!(
                "usage {} cannot be assigned to a {name} key",
                usage.as_str()
            )));
        }
    }
    Ok(())
}

/// A produced secret or private key must carry at least one usage
pub(crate) fn check_produced_key(key: &CryptoKey) -> Result<()> {
    match key.key_type() {
        KeyType::Secret | KeyType::Private if key.usages().is_empty() => Err(Error::Syntax(
            format!("{} key has an empty usage set", key.key_type().as_str()),
        )),
        _ => Ok(()),
    }
}

/// A produced pair must have a usable private half
pub(crate) fn check_produced_pair(pair: &CryptoKeyPair) -> Result<()> {
    if pair.private_key.usages().is_empty() {
        return Err(Error::Syntax(
            "private key of the generated pair has an empty usage set".to_string(),
        ));
    }
    Ok(())
}
