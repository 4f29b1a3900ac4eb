//! RSA operations on PKCS#8 / SPKI DER keys
//!
//! Covers the three paddings the service dispatches to: OAEP for
//! encryption, PKCS#1 v1.5 and PSS for signatures. Signing hashes the
//! message internally with the caller-selected SHA-2 function.

use num_bigint_dig::ModInverse;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{
    traits::{PrivateKeyParts, PublicKeyParts},
    BigUint, Oaep, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey,
};
use sha2::{Sha256, Sha384, Sha512};

use crate::{
    error::{Error, Result},
    hash::{self, Sha},
};

/// Generate a key pair, returning `(pkcs8_der, spki_der)`
pub fn generate_pkcs8(modulus_bits: usize, public_exponent: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let exp = BigUint::from_bytes_be(public_exponent);
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new_with_exp(&mut rng, modulus_bits, &exp)?;
    let pkcs8 = private_key.to_pkcs8_der()?.as_bytes().to_vec();
    let spki = private_key.to_public_key().to_public_key_der()?.as_bytes().to_vec();
    Ok((pkcs8, spki))
}

/// Modulus length in bits and public exponent bytes of a private key
pub fn key_info_from_pkcs8(der: &[u8]) -> Result<(u32, Vec<u8>)> {
    let key = RsaPrivateKey::from_pkcs8_der(der)?;
    Ok((key.n().bits() as u32, key.e().to_bytes_be()))
}

/// Modulus length in bits and public exponent bytes of a public key
pub fn key_info_from_spki(der: &[u8]) -> Result<(u32, Vec<u8>)> {
    let key = RsaPublicKey::from_public_key_der(der)?;
    Ok((key.n().bits() as u32, key.e().to_bytes_be()))
}

/// Derive the SPKI document of the public half of a private key
pub fn pkcs8_to_spki(der: &[u8]) -> Result<Vec<u8>> {
    let key = RsaPrivateKey::from_pkcs8_der(der)?;
    Ok(key.to_public_key().to_public_key_der()?.as_bytes().to_vec())
}

/// Encrypt with RSAES-OAEP under the given hash and optional label
pub fn oaep_encrypt(
    spki_der: &[u8],
    hash: Sha,
    label: Option<&[u8]>,
    msg: &[u8],
) -> Result<Vec<u8>> {
    let key = RsaPublicKey::from_public_key_der(spki_der)?;
    let mut rng = rand::thread_rng();
    let ct = key.encrypt(&mut rng, oaep_padding(hash, label)?, msg)?;
    Ok(ct)
}

/// Decrypt with RSAES-OAEP; padding failures surface as [`Error::Rsa`]
pub fn oaep_decrypt(
    pkcs8_der: &[u8],
    hash: Sha,
    label: Option<&[u8]>,
    ct: &[u8],
) -> Result<Vec<u8>> {
    let key = RsaPrivateKey::from_pkcs8_der(pkcs8_der)?;
    let pt = key.decrypt(oaep_padding(hash, label)?, ct)?;
    Ok(pt)
}

/// Sign with RSASSA-PKCS1-v1_5
pub fn pkcs1v15_sign(pkcs8_der: &[u8], hash: Sha, data: &[u8]) -> Result<Vec<u8>> {
    let key = RsaPrivateKey::from_pkcs8_der(pkcs8_der)?;
    let digest = hash::digest(hash, data);
    let sig = match hash {
        Sha::Sha256 => key.sign(Pkcs1v15Sign::new::<Sha256>(), &digest),
        Sha::Sha384 => key.sign(Pkcs1v15Sign::new::<Sha384>(), &digest),
        Sha::Sha512 => key.sign(Pkcs1v15Sign::new::<Sha512>(), &digest),
    }?;
    Ok(sig)
}

/// Verify an RSASSA-PKCS1-v1_5 signature; a mismatch is `Ok(false)`
pub fn pkcs1v15_verify(spki_der: &[u8], hash: Sha, sig: &[u8], data: &[u8]) -> Result<bool> {
    let key = RsaPublicKey::from_public_key_der(spki_der)?;
    let digest = hash::digest(hash, data);
    let outcome = match hash {
        Sha::Sha256 => key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, sig),
        Sha::Sha384 => key.verify(Pkcs1v15Sign::new::<Sha384>(), &digest, sig),
        Sha::Sha512 => key.verify(Pkcs1v15Sign::new::<Sha512>(), &digest, sig),
    };
    Ok(outcome.is_ok())
}

/// Sign with RSASSA-PSS using the given salt length in bytes
pub fn pss_sign(pkcs8_der: &[u8], hash: Sha, salt_len: usize, data: &[u8]) -> Result<Vec<u8>> {
    let key = RsaPrivateKey::from_pkcs8_der(pkcs8_der)?;
    let digest = hash::digest(hash, data);
    let mut rng = rand::thread_rng();
    let sig = match hash {
        Sha::Sha256 => key.sign_with_rng(&mut rng, Pss::new_with_salt::<Sha256>(salt_len), &digest),
        Sha::Sha384 => key.sign_with_rng(&mut rng, Pss::new_with_salt::<Sha384>(salt_len), &digest),
        Sha::Sha512 => key.sign_with_rng(&mut rng, Pss::new_with_salt::<Sha512>(salt_len), &digest),
    }?;
    Ok(sig)
}

/// Verify an RSASSA-PSS signature; a mismatch is `Ok(false)`
pub fn pss_verify(
    spki_der: &[u8],
    hash: Sha,
    salt_len: usize,
    sig: &[u8],
    data: &[u8],
) -> Result<bool> {
    let key = RsaPublicKey::from_public_key_der(spki_der)?;
    let digest = hash::digest(hash, data);
    let outcome = match hash {
        Sha::Sha256 => key.verify(Pss::new_with_salt::<Sha256>(salt_len), &digest, sig),
        Sha::Sha384 => key.verify(Pss::new_with_salt::<Sha384>(salt_len), &digest, sig),
        Sha::Sha512 => key.verify(Pss::new_with_salt::<Sha512>(salt_len), &digest, sig),
    };
    Ok(outcome.is_ok())
}

// The rsa crate models OAEP labels as strings, so a byte label must be
// valid UTF-8 to be representable here.
fn oaep_padding(hash: Sha, label: Option<&[u8]>) -> Result<Oaep> {
    let mut padding = match hash {
        Sha::Sha256 => Oaep::new::<Sha256>(),
        Sha::Sha384 => Oaep::new::<Sha384>(),
        Sha::Sha512 => Oaep::new::<Sha512>(),
    };
    if let Some(label) = label {
        if !label.is_empty() {
            let label = String::from_utf8(label.to_vec())
                .map_err(|_| Error::Other("OAEP label must be valid UTF-8".to_string()))?;
            padding.label = Some(label);
        }
    }
    Ok(padding)
}

/// Big-endian JWK members of a public key
pub struct PublicComponents {
    pub n: Vec<u8>,
    pub e: Vec<u8>,
}

/// Big-endian JWK members of a private key, CRT parameters included
pub struct PrivateComponents {
    pub n: Vec<u8>,
    pub e: Vec<u8>,
    pub d: Vec<u8>,
    pub p: Vec<u8>,
    pub q: Vec<u8>,
    pub dp: Vec<u8>,
    pub dq: Vec<u8>,
    pub qi: Vec<u8>,
}

/// Extract the public JWK members of an SPKI document
pub fn public_components(spki_der: &[u8]) -> Result<PublicComponents> {
    let key = RsaPublicKey::from_public_key_der(spki_der)?;
    Ok(PublicComponents {
        n: key.n().to_bytes_be(),
        e: key.e().to_bytes_be(),
    })
}

/// Extract the private JWK members of a PKCS#8 document
pub fn private_components(pkcs8_der: &[u8]) -> Result<PrivateComponents> {
    let key = RsaPrivateKey::from_pkcs8_der(pkcs8_der)?;
    let primes = key.primes();
    if primes.len() != 2 {
        return Err(Error::Other("multi-prime RSA keys are not representable as JWK".to_string()));
    }
    let (p, q) = (&primes[0], &primes[1]);
    let one = BigUint::from(1u32);
    let dp = key.d() % (p - &one);
    let dq = key.d() % (q - &one);
    let qi = q
        .mod_inverse(p)
        .and_then(|inv| inv.to_biguint())
        .ok_or_else(|| Error::Other("CRT coefficient does not exist".to_string()))?;
    Ok(PrivateComponents {
        n: key.n().to_bytes_be(),
        e: key.e().to_bytes_be(),
        d: key.d().to_bytes_be(),
        p: p.to_bytes_be(),
        q: q.to_bytes_be(),
        dp: dp.to_bytes_be(),
        dq: dq.to_bytes_be(),
        qi: qi.to_bytes_be(),
    })
}

/// Build an SPKI document from public JWK members
pub fn spki_from_components(n: &[u8], e: &[u8]) -> Result<Vec<u8>> {
    let key = RsaPublicKey::new(BigUint::from_bytes_be(n), BigUint::from_bytes_be(e))?;
    Ok(key.to_public_key_der()?.as_bytes().to_vec())
}

/// Build a PKCS#8 document from private JWK members
pub fn pkcs8_from_components(n: &[u8], e: &[u8], d: &[u8], p: &[u8], q: &[u8]) -> Result<Vec<u8>> {
    let key = RsaPrivateKey::from_components(
        BigUint::from_bytes_be(n),
        BigUint::from_bytes_be(e),
        BigUint::from_bytes_be(d),
        vec![BigUint::from_bytes_be(p), BigUint::from_bytes_be(q)],
    )?;
    key.validate()?;
    Ok(key.to_pkcs8_der()?.as_bytes().to_vec())
}
