use thiserror::Error;

/// Error type for the primitive layer
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid key size: {0} bytes")]
    InvalidKeySize(usize),

    #[error("invalid IV size: {0} bytes")]
    InvalidIvSize(usize),

    #[error("invalid input size: {0} bytes")]
    InvalidInputSize(usize),

    #[error("authenticated decryption failed")]
    Aead,

    #[error("invalid padding")]
    Padding,

    #[error("key wrap error: {0}")]
    KeyWrap(String),

    #[error("PKCS8 error: {0}")]
    Pkcs8(#[from] pkcs8::Error),

    #[error("SPKI error: {0}")]
    Spki(#[from] pkcs8::spki::Error),

    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("elliptic curve error: {0}")]
    EllipticCurve(#[from] p256::elliptic_curve::Error),

    #[error("signature error: {0}")]
    Signature(#[from] signature::Error),

    #[error("derived output length not representable")]
    DerivedLengthTooLong,

    #[error("random source failure: {0}")]
    Random(String),

    /// Anything without a more precise variant
    #[error("{0}")]
    Other(String),
}

/// Result alias for the primitive layer
pub type Result<T> = std::result::Result<T, Error>;
