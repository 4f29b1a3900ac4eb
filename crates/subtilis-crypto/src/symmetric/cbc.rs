//! AES-CBC with PKCS#7 padding

use aes::{
    cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit},
    Aes128, Aes192, Aes256,
};

use crate::error::{Error, Result};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes192CbcEnc = cbc::Encryptor<Aes192>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;
type Aes192CbcDec = cbc::Decryptor<Aes192>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypt `plaintext` under AES-CBC with a 16-byte IV
///
/// The output is padded to a whole number of blocks with PKCS#7.
pub fn encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    if iv.len() != 16 {
        return Err(Error::InvalidIvSize(iv.len()));
    }
    let ct = match key.len() {
        16 => Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(|_| Error::InvalidKeySize(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => Aes192CbcEnc::new_from_slices(key, iv)
            .map_err(|_| Error::InvalidKeySize(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(|_| Error::InvalidKeySize(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        n => return Err(Error::InvalidKeySize(n)),
    };
    Ok(ct)
}

/// Decrypt AES-CBC `ciphertext` and strip PKCS#7 padding
pub fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if iv.len() != 16 {
        return Err(Error::InvalidIvSize(iv.len()));
    }
    let pt = match key.len() {
        16 => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(|_| Error::InvalidKeySize(key.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| Error::Padding)?,
        24 => Aes192CbcDec::new_from_slices(key, iv)
            .map_err(|_| Error::InvalidKeySize(key.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| Error::Padding)?,
        32 => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(|_| Error::InvalidKeySize(key.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| Error::Padding)?,
        n => return Err(Error::InvalidKeySize(n)),
    };
    Ok(pt)
}
