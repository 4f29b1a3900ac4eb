//! HMAC over the SHA-2 family

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};

use crate::{
    error::{Error, Result},
    hash::Sha,
};

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

/// Compute an HMAC tag over `data`
///
/// The tag length equals the digest length of the chosen hash.
pub fn sign(hash: Sha, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let tag = match hash {
        Sha::Sha256 => mac::<HmacSha256>(key, data)?,
        Sha::Sha384 => mac::<HmacSha384>(key, data)?,
        Sha::Sha512 => mac::<HmacSha512>(key, data)?,
    };
    Ok(tag)
}

/// Verify an HMAC tag in constant time
///
/// Returns `Ok(false)` for a well-formed but non-matching tag.
pub fn verify(hash: Sha, key: &[u8], tag: &[u8], data: &[u8]) -> Result<bool> {
    let ok = match hash {
        Sha::Sha256 => check::<HmacSha256>(key, tag, data)?,
        Sha::Sha384 => check::<HmacSha384>(key, tag, data)?,
        Sha::Sha512 => check::<HmacSha512>(key, tag, data)?,
    };
    Ok(ok)
}

fn mac<M: Mac + hmac::digest::KeyInit>(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac =
        <M as Mac>::new_from_slice(key).map_err(|_| Error::InvalidKeySize(key.len()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn check<M: Mac + hmac::digest::KeyInit>(key: &[u8], tag: &[u8], data: &[u8]) -> Result<bool> {
    let mut mac =
        <M as Mac>::new_from_slice(key).map_err(|_| Error::InvalidKeySize(key.len()))?;
    mac.update(data);
    Ok(mac.verify_slice(tag).is_ok())
}
