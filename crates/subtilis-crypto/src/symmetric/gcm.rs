//! AES-GCM authenticated encryption
//!
//! Supports 128/192/256-bit keys and 12, 16 or 32-byte IVs. The
//! authentication tag (16 bytes) is appended to the ciphertext, which
//! is the layout the dispatch layer expects.

use aes::{Aes128, Aes192, Aes256};
use aes_gcm::{
    aead::{
        consts::{U12, U16, U32},
        Aead, Nonce, Payload,
    },
    AesGcm, KeyInit,
};

use crate::error::{Error, Result};

type Aes128Gcm96 = AesGcm<Aes128, U12>;
type Aes192Gcm96 = AesGcm<Aes192, U12>;
type Aes256Gcm96 = AesGcm<Aes256, U12>;
type Aes128Gcm128 = AesGcm<Aes128, U16>;
type Aes192Gcm128 = AesGcm<Aes192, U16>;
type Aes256Gcm128 = AesGcm<Aes256, U16>;
type Aes128Gcm256 = AesGcm<Aes128, U32>;
type Aes192Gcm256 = AesGcm<Aes192, U32>;
type Aes256Gcm256 = AesGcm<Aes256, U32>;

/// Encrypt `plaintext` under AES-GCM
///
/// Returns ciphertext with the 16-byte authentication tag appended.
pub fn encrypt(key: &[u8], iv: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    match (key.len(), iv.len()) {
        (16, 12) => seal::<Aes128Gcm96>(key, iv, aad, plaintext),
        (24, 12) => seal::<Aes192Gcm96>(key, iv, aad, plaintext),
        (32, 12) => seal::<Aes256Gcm96>(key, iv, aad, plaintext),
        (16, 16) => seal::<Aes128Gcm128>(key, iv, aad, plaintext),
        (24, 16) => seal::<Aes192Gcm128>(key, iv, aad, plaintext),
        (32, 16) => seal::<Aes256Gcm128>(key, iv, aad, plaintext),
        (16, 32) => seal::<Aes128Gcm256>(key, iv, aad, plaintext),
        (24, 32) => seal::<Aes192Gcm256>(key, iv, aad, plaintext),
        (32, 32) => seal::<Aes256Gcm256>(key, iv, aad, plaintext),
        (16 | 24 | 32, n) => Err(Error::InvalidIvSize(n)),
        (n, _) => Err(Error::InvalidKeySize(n)),
    }
}

/// Decrypt AES-GCM `ciphertext` (with trailing tag)
///
/// Fails with [`Error::Aead`] if the tag does not authenticate.
pub fn decrypt(key: &[u8], iv: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    match (key.len(), iv.len()) {
        (16, 12) => open::<Aes128Gcm96>(key, iv, aad, ciphertext),
        (24, 12) => open::<Aes192Gcm96>(key, iv, aad, ciphertext),
        (32, 12) => open::<Aes256Gcm96>(key, iv, aad, ciphertext),
        (16, 16) => open::<Aes128Gcm128>(key, iv, aad, ciphertext),
        (24, 16) => open::<Aes192Gcm128>(key, iv, aad, ciphertext),
        (32, 16) => open::<Aes256Gcm128>(key, iv, aad, ciphertext),
        (16, 32) => open::<Aes128Gcm256>(key, iv, aad, ciphertext),
        (24, 32) => open::<Aes192Gcm256>(key, iv, aad, ciphertext),
        (32, 32) => open::<Aes256Gcm256>(key, iv, aad, ciphertext),
        (16 | 24 | 32, n) => Err(Error::InvalidIvSize(n)),
        (n, _) => Err(Error::InvalidKeySize(n)),
    }
}

/// IV sizes accepted by [`encrypt`] / [`decrypt`]
pub fn is_supported_iv_len(len: usize) -> bool {
    matches!(len, 12 | 16 | 32)
}

fn seal<C: KeyInit + Aead>(key: &[u8], iv: &[u8], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>> {
    let cipher = C::new_from_slice(key).map_err(|_| Error::InvalidKeySize(key.len()))?;
    cipher
        .encrypt(Nonce::<C>::from_slice(iv), Payload { msg, aad })
        .map_err(|_| Error::Aead)
}

fn open<C: KeyInit + Aead>(key: &[u8], iv: &[u8], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>> {
    let cipher = C::new_from_slice(key).map_err(|_| Error::InvalidKeySize(key.len()))?;
    cipher
        .decrypt(Nonce::<C>::from_slice(iv), Payload { msg, aad })
        .map_err(|_| Error::Aead)
}
