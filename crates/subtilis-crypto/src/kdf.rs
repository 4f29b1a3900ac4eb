//! Key derivation functions
//!
//! HKDF (RFC 5869) and PBKDF2 (RFC 8018) over the SHA-2 family.

use hkdf::Hkdf;
use pbkdf2::pbkdf2_hmac;
use sha2::{Sha256, Sha384, Sha512};

use crate::{
    error::{Error, Result},
    hash::Sha,
};

/// Derive `out_len` bytes with HKDF
///
/// Fails with [`Error::DerivedLengthTooLong`] when `out_len` exceeds
/// 255 times the digest length.
pub fn hkdf_derive(
    hash: Sha,
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
    out_len: usize,
) -> Result<Vec<u8>> {
    let mut okm = vec![0u8; out_len];
    let expanded = match hash {
        Sha::Sha256 => Hkdf::<Sha256>::new(Some(salt), ikm).expand(info, &mut okm),
        Sha::Sha384 => Hkdf::<Sha384>::new(Some(salt), ikm).expand(info, &mut okm),
        Sha::Sha512 => Hkdf::<Sha512>::new(Some(salt), ikm).expand(info, &mut okm),
    };
    expanded.map_err(|_| Error::DerivedLengthTooLong)?;
    Ok(okm)
}

/// Derive `out_len` bytes with PBKDF2-HMAC
pub fn pbkdf2_derive(
    hash: Sha,
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    out_len: usize,
) -> Result<Vec<u8>> {
    if iterations == 0 {
        return Err(Error::Other("PBKDF2 requires at least one iteration".to_string()));
    }
    let mut okm = vec![0u8; out_len];
    match hash {
        Sha::Sha256 => pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut okm),
        Sha::Sha384 => pbkdf2_hmac::<Sha384>(password, salt, iterations, &mut okm),
        Sha::Sha512 => pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut okm),
    }
    Ok(okm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hkdf_rfc5869_case_1() {
        // RFC 5869 A.1
        let ikm = [0x0bu8; 22];
        let salt = hex::decode("000102030405060708090a0b0c").unwrap();
        let info = hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap();
        let okm = hkdf_derive(Sha::Sha256, &ikm, &salt, &info, 42).unwrap();
        assert_eq!(
            hex::encode(okm),
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865"
        );
    }

    #[test]
    fn test_hkdf_length_limit() {
        let too_long = 255 * 32 + 1;
        assert!(matches!(
            hkdf_derive(Sha::Sha256, b"ikm", b"", b"", too_long),
            Err(Error::DerivedLengthTooLong)
        ));
    }

    #[test]
    fn test_pbkdf2_rfc6070_case_2() {
        let okm = pbkdf2_derive(Sha::Sha256, b"password", b"salt", 2, 32).unwrap();
        assert_eq!(
            hex::encode(okm),
            "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43"
        );
    }

    #[test]
    fn test_pbkdf2_zero_iterations() {
        assert!(pbkdf2_derive(Sha::Sha256, b"p", b"s", 0, 16).is_err());
    }

    #[test]
    fn test_deterministic() {
        let a = pbkdf2_derive(Sha::Sha512, b"p", b"s", 10, 24).unwrap();
        let b = pbkdf2_derive(Sha::Sha512, b"p", b"s", 10, 24).unwrap();
        assert_eq!(a, b);
    }
}
