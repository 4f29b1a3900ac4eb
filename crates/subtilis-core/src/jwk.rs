//! JSON Web Key representation (RFC 7517 / RFC 7518 subset)
//!
//! The core treats a JWK as a structured object; all binary members
//! are base64url without padding. When a JWK travels as octets (the
//! `wrapKey` / `unwrapKey` path) it is the compact UTF-8 JSON
//! serialization with no leading whitespace.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A JSON Web Key
///
/// Only `kty` is required; everything else is algorithm-dependent and
/// omitted from the serialization when absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonWebKey {
    pub kty: String,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<bool>,

    // Symmetric (oct) member
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,

    // RSA members
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,

    // EC members (`d` shared with RSA above)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl JsonWebKey {
    /// A bare symmetric key
    pub fn oct(key: &[u8]) -> Self {
        JsonWebKey {
            kty: "oct".to_string(),
            k: Some(b64url_encode(key)),
            ..Default::default()
        }
    }

    /// Compact UTF-8 JSON serialization (no leading whitespace)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Data(format!("JWK serialization: {e}")))
    }

    /// Parse a JWK from its UTF-8 JSON serialization
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Data(format!("JWK parse: {e}")))
    }

    /// Decode a required base64url member
    pub(crate) fn member(&self, member: &'static str) -> Result<Vec<u8>> {
        let value = self.opt_member(member)?;
        value.ok_or_else(|| Error::Data(format!("JWK is missing the {member:?} member")))
    }

    /// Decode an optional base64url member
    pub(crate) fn opt_member(&self, member: &'static str) -> Result<Option<Vec<u8>>> {
        let raw = match member {
            "k" => &self.k,
            "n" => &self.n,
            "e" => &self.e,
            "d" => &self.d,
            "p" => &self.p,
            "q" => &self.q,
            "dp" => &self.dp,
            "dq" => &self.dq,
            "qi" => &self.qi,
            "x" => &self.x,
            "y" => &self.y,
            _ => &None,
        };
        raw.as_deref().map(|v| b64url_decode(member, v)).transpose()
    }
}

/// Encode a JWK binary member
pub(crate) fn b64url_encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Decode a JWK binary member
pub(crate) fn b64url_decode(member: &str, value: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|_| Error::Data(format!("JWK member {member:?} is not valid base64url")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oct_roundtrip() {
        let jwk = JsonWebKey::oct(&[0x01, 0x02, 0x03, 0xff]);
        assert_eq!(jwk.kty, "oct");
        assert_eq!(jwk.member("k").unwrap(), vec![0x01, 0x02, 0x03, 0xff]);
    }

    #[test]
    fn test_compact_serialization() {
        let jwk = JsonWebKey::oct(b"0123456789abcdef");
        let bytes = jwk.to_bytes().unwrap();
        // Compact JSON: starts with '{', no whitespace after separators
        assert_eq!(bytes[0], b'{');
        assert!(!bytes.windows(2).any(|w| w == b": " || w == b", "));
        assert_eq!(JsonWebKey::from_bytes(&bytes).unwrap(), jwk);
    }

    #[test]
    fn test_absent_members_are_skipped() {
        let jwk = JsonWebKey::oct(&[0u8; 4]);
        let text = String::from_utf8(jwk.to_bytes().unwrap()).unwrap();
        assert!(!text.contains("key_ops"));
        assert!(!text.contains("crv"));
    }

    #[test]
    fn test_bad_base64_is_data_error() {
        let jwk = JsonWebKey {
            kty: "oct".to_string(),
            k: Some("not base64url!!".to_string()),
            ..Default::default()
        };
        assert!(matches!(jwk.member("k"), Err(Error::Data(_))));
    }

    #[test]
    fn test_missing_member_is_data_error() {
        let jwk = JsonWebKey {
            kty: "RSA".to_string(),
            ..Default::default()
        };
        assert!(matches!(jwk.member("n"), Err(Error::Data(_))));
    }

    #[test]
    fn test_use_member_renames() {
        let mut jwk = JsonWebKey::oct(&[0u8; 4]);
        jwk.use_ = Some("enc".to_string());
        let text = String::from_utf8(jwk.to_bytes().unwrap()).unwrap();
        assert!(text.contains("\"use\":\"enc\""));
    }
}
