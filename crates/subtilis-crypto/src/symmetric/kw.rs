//! AES Key Wrap (RFC 3394)

use aes_kw::{KekAes128, KekAes192, KekAes256};

use crate::error::{Error, Result};

/// Wrap `key_data` under the key-encryption key `kek`
///
/// `key_data` must be a multiple of 8 bytes and at least 16 bytes long.
pub fn wrap(kek: &[u8], key_data: &[u8]) -> Result<Vec<u8>> {
    if key_data.len() % 8 != 0 || key_data.len() < 16 {
        return Err(Error::InvalidInputSize(key_data.len()));
    }
    let wrapped = match kek.len() {
        16 => KekAes128::new(kek.into()).wrap_vec(key_data),
        24 => KekAes192::new(kek.into()).wrap_vec(key_data),
        32 => KekAes256::new(kek.into()).wrap_vec(key_data),
        n => return Err(Error::InvalidKeySize(n)),
    }
    .map_err(|e| Error::KeyWrap(e.to_string()))?;
    Ok(wrapped)
}

/// Unwrap `wrapped` under the key-encryption key `kek`
///
/// Fails if the integrity check value does not match.
pub fn unwrap(kek: &[u8], wrapped: &[u8]) -> Result<Vec<u8>> {
    if wrapped.len() % 8 != 0 || wrapped.len() < 24 {
        return Err(Error::InvalidInputSize(wrapped.len()));
    }
    let unwrapped = match kek.len() {
        16 => KekAes128::new(kek.into()).unwrap_vec(wrapped),
        24 => KekAes192::new(kek.into()).unwrap_vec(wrapped),
        32 => KekAes256::new(kek.into()).unwrap_vec(wrapped),
        n => return Err(Error::InvalidKeySize(n)),
    }
    .map_err(|e| Error::KeyWrap(e.to_string()))?;
    Ok(unwrapped)
}
