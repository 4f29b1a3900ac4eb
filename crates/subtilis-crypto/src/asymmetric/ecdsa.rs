//! ECDSA over the NIST curves P-256 and P-384
//!
//! Signatures use the fixed-size `r || s` encoding. Messages are
//! hashed with the caller-selected SHA-2 function and signed over the
//! prehash, which keeps the hash choice independent of the curve.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use signature::hazmat::{PrehashSigner, PrehashVerifier};

use crate::{
    error::{Error, Result},
    hash::{self, Sha},
};

/// Supported named curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    /// NIST P-256 (secp256r1)
    P256,
    /// NIST P-384 (secp384r1)
    P384,
}

impl Curve {
    /// Canonical curve name
    pub fn name(&self) -> &'static str {
        match self {
            Curve::P256 => "P-256",
            Curve::P384 => "P-384",
        }
    }

    /// Field element size in bytes
    pub fn field_len(&self) -> usize {
        match self {
            Curve::P256 => 32,
            Curve::P384 => 48,
        }
    }

    /// Fixed signature size in bytes (`r || s`)
    pub fn signature_len(&self) -> usize {
        self.field_len() * 2
    }
}

/// Generate a key pair, returning `(pkcs8_der, spki_der)`
pub fn generate_pkcs8(curve: Curve) -> Result<(Vec<u8>, Vec<u8>)> {
    use p256::elliptic_curve::rand_core::OsRng;
    match curve {
        Curve::P256 => {
            let secret = p256::SecretKey::random(&mut OsRng);
            Ok((
                secret.to_pkcs8_der()?.as_bytes().to_vec(),
                secret.public_key().to_public_key_der()?.as_bytes().to_vec(),
            ))
        }
        Curve::P384 => {
            let secret = p384::SecretKey::random(&mut OsRng);
            Ok((
                secret.to_pkcs8_der()?.as_bytes().to_vec(),
                secret.public_key().to_public_key_der()?.as_bytes().to_vec(),
            ))
        }
    }
}

/// Sign `data`, returning a fixed-size `r || s` signature
pub fn sign(curve: Curve, pkcs8_der: &[u8], hash: Sha, data: &[u8]) -> Result<Vec<u8>> {
    let digest = hash::digest(hash, data);
    match curve {
        Curve::P256 => {
            let secret = p256::SecretKey::from_pkcs8_der(pkcs8_der)?;
            let key = p256::ecdsa::SigningKey::from(&secret);
            let sig: p256::ecdsa::Signature = key.sign_prehash(&digest)?;
            Ok(sig.to_bytes().to_vec())
        }
        Curve::P384 => {
            let secret = p384::SecretKey::from_pkcs8_der(pkcs8_der)?;
            let key = p384::ecdsa::SigningKey::from(&secret);
            let sig: p384::ecdsa::Signature = key.sign_prehash(&digest)?;
            Ok(sig.to_bytes().to_vec())
        }
    }
}

/// Verify a fixed-size `r || s` signature; a mismatch is `Ok(false)`
pub fn verify(curve: Curve, spki_der: &[u8], hash: Sha, sig: &[u8], data: &[u8]) -> Result<bool> {
    if sig.len() != curve.signature_len() {
        return Ok(false);
    }
    let digest = hash::digest(hash, data);
    match curve {
        Curve::P256 => {
            let public = p256::PublicKey::from_public_key_der(spki_der)?;
            let key = p256::ecdsa::VerifyingKey::from(&public);
            let Ok(sig) = p256::ecdsa::Signature::from_slice(sig) else {
                return Ok(false);
            };
            Ok(key.verify_prehash(&digest, &sig).is_ok())
        }
        Curve::P384 => {
            let public = p384::PublicKey::from_public_key_der(spki_der)?;
            let key = p384::ecdsa::VerifyingKey::from(&public);
            let Ok(sig) = p384::ecdsa::Signature::from_slice(sig) else {
                return Ok(false);
            };
            Ok(key.verify_prehash(&digest, &sig).is_ok())
        }
    }
}

/// Check that a PKCS#8 document holds a private key on `curve`
pub fn validate_pkcs8(curve: Curve, der: &[u8]) -> Result<()> {
    match curve {
        Curve::P256 => p256::SecretKey::from_pkcs8_der(der).map(|_| ())?,
        Curve::P384 => p384::SecretKey::from_pkcs8_der(der).map(|_| ())?,
    }
    Ok(())
}

/// Check that an SPKI document holds a public key on `curve`
pub fn validate_spki(curve: Curve, der: &[u8]) -> Result<()> {
    match curve {
        Curve::P256 => p256::PublicKey::from_public_key_der(der).map(|_| ())?,
        Curve::P384 => p384::PublicKey::from_public_key_der(der).map(|_| ())?,
    }
    Ok(())
}

/// Derive the SPKI document of the public half of a private key
pub fn pkcs8_to_spki(curve: Curve, der: &[u8]) -> Result<Vec<u8>> {
    match curve {
        Curve::P256 => {
            let secret = p256::SecretKey::from_pkcs8_der(der)?;
            Ok(secret.public_key().to_public_key_der()?.as_bytes().to_vec())
        }
        Curve::P384 => {
            let secret = p384::SecretKey::from_pkcs8_der(der)?;
            Ok(secret.public_key().to_public_key_der()?.as_bytes().to_vec())
        }
    }
}

/// Build an SPKI document from an uncompressed SEC1 point
pub fn spki_from_raw_point(curve: Curve, point: &[u8]) -> Result<Vec<u8>> {
    match curve {
        Curve::P256 => {
            let public = p256::PublicKey::from_sec1_bytes(point)?;
            Ok(public.to_public_key_der()?.as_bytes().to_vec())
        }
        Curve::P384 => {
            let public = p384::PublicKey::from_sec1_bytes(point)?;
            Ok(public.to_public_key_der()?.as_bytes().to_vec())
        }
    }
}

/// Export the uncompressed SEC1 point of a public key
pub fn raw_point_from_spki(curve: Curve, der: &[u8]) -> Result<Vec<u8>> {
    match curve {
        Curve::P256 => {
            let public = p256::PublicKey::from_public_key_der(der)?;
            Ok(public.to_encoded_point(false).as_bytes().to_vec())
        }
        Curve::P384 => {
            let public = p384::PublicKey::from_public_key_der(der)?;
            Ok(public.to_encoded_point(false).as_bytes().to_vec())
        }
    }
}

/// Affine coordinates `(x, y)` of a public key, for JWK export
pub fn public_coords(curve: Curve, spki_der: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let point = raw_point_from_spki(curve, spki_der)?;
    // Uncompressed SEC1: 0x04 || x || y
    let n = curve.field_len();
    if point.len() != 1 + 2 * n {
        return Err(Error::Other("unexpected point encoding".to_string()));
    }
    Ok((point[1..1 + n].to_vec(), point[1 + n..].to_vec()))
}

/// Build an SPKI document from JWK affine coordinates
pub fn spki_from_coords(curve: Curve, x: &[u8], y: &[u8]) -> Result<Vec<u8>> {
    let n = curve.field_len();
    if x.len() != n || y.len() != n {
        return Err(Error::Other("coordinate length does not match curve".to_string()));
    }
    let mut point = Vec::with_capacity(1 + 2 * n);
    point.push(0x04);
    point.extend_from_slice(x);
    point.extend_from_slice(y);
    spki_from_raw_point(curve, &point)
}

/// Private scalar bytes of a PKCS#8 key, for JWK export
pub fn private_scalar(curve: Curve, pkcs8_der: &[u8]) -> Result<Vec<u8>> {
    match curve {
        Curve::P256 => {
            let secret = p256::SecretKey::from_pkcs8_der(pkcs8_der)?;
            Ok(secret.to_bytes().to_vec())
        }
        Curve::P384 => {
            let secret = p384::SecretKey::from_pkcs8_der(pkcs8_der)?;
            Ok(secret.to_bytes().to_vec())
        }
    }
}

/// Build a PKCS#8 document from a JWK private scalar
pub fn pkcs8_from_scalar(curve: Curve, d: &[u8]) -> Result<Vec<u8>> {
    match curve {
        Curve::P256 => {
            let secret = p256::SecretKey::from_slice(d)?;
            Ok(secret.to_pkcs8_der()?.as_bytes().to_vec())
        }
        Curve::P384 => {
            let secret = p384::SecretKey::from_slice(d)?;
            Ok(secret.to_pkcs8_der()?.as_bytes().to_vec())
        }
    }
}
