//! Algorithm registry
//!
//! A two-level mapping `operation -> (algorithm name -> entry)`.
//! Names match case-insensitively; every entry carries the canonical
//! spelling, the parameter schema for that (operation, algorithm)
//! pair, and a reference to the module implementing it.

use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    key::{CryptoKey, GeneratedKey, KeyData, KeyFormat, KeyUsage},
    modules,
    params::NormalizedAlgorithm,
};

/// The operation vocabulary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Encrypt,
    Decrypt,
    Sign,
    Verify,
    Digest,
    GenerateKey,
    ImportKey,
    ExportKey,
    DeriveBits,
    DeriveKey,
    WrapKey,
    UnwrapKey,
    GetKeyLength,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Encrypt => "encrypt",
            Operation::Decrypt => "decrypt",
            Operation::Sign => "sign",
            Operation::Verify => "verify",
            Operation::Digest => "digest",
            Operation::GenerateKey => "generateKey",
            Operation::ImportKey => "importKey",
            Operation::ExportKey => "exportKey",
            Operation::DeriveBits => "deriveBits",
            Operation::DeriveKey => "deriveKey",
            Operation::WrapKey => "wrapKey",
            Operation::UnwrapKey => "unwrapKey",
            Operation::GetKeyLength => "get key length",
        }
    }
}

/// An algorithm implementation
///
/// Each module implements the subset of capabilities its algorithm
/// supports and reports that subset through [`supports`]; everything
/// else falls through to a `NotSupported` default. The dispatcher and
/// the wrap/unwrap fallback logic probe capabilities by operation.
///
/// [`supports`]: AlgorithmModule::supports
#[allow(unused_variables)]
pub trait AlgorithmModule: Send + Sync {
    /// Capability probe
    fn supports(&self, op: Operation) -> bool;

    fn encrypt(&self, alg: &NormalizedAlgorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        Err(unsupported(alg.name, Operation::Encrypt))
    }

    fn decrypt(&self, alg: &NormalizedAlgorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        Err(unsupported(alg.name, Operation::Decrypt))
    }

    fn sign(&self, alg: &NormalizedAlgorithm, key: &CryptoKey, data: &[u8]) -> Result<Vec<u8>> {
        Err(unsupported(alg.name, Operation::Sign))
    }

    fn verify(
        &self,
        alg: &NormalizedAlgorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool> {
        Err(unsupported(alg.name, Operation::Verify))
    }

    fn digest(&self, alg: &NormalizedAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        Err(unsupported(alg.name, Operation::Digest))
    }

    fn generate_key(
        &self,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<GeneratedKey> {
        Err(unsupported(alg.name, Operation::GenerateKey))
    }

    fn import_key(
        &self,
        format: KeyFormat,
        data: &KeyData,
        alg: &NormalizedAlgorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        Err(unsupported(alg.name, Operation::ImportKey))
    }

    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<KeyData> {
        Err(unsupported(key.algorithm().name(), Operation::ExportKey))
    }

    fn derive_bits(
        &self,
        alg: &NormalizedAlgorithm,
        key: &CryptoKey,
        length: u32,
    ) -> Result<Vec<u8>> {
        Err(unsupported(alg.name, Operation::DeriveBits))
    }

    fn wrap_key(
        &self,
        alg: &NormalizedAlgorithm,
        wrapping_key: &CryptoKey,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        Err(unsupported(alg.name, Operation::WrapKey))
    }

    fn unwrap_key(
        &self,
        alg: &NormalizedAlgorithm,
        unwrapping_key: &CryptoKey,
        wrapped: &[u8],
    ) -> Result<Vec<u8>> {
        Err(unsupported(alg.name, Operation::UnwrapKey))
    }

    fn get_key_length(&self, alg: &NormalizedAlgorithm) -> Result<u32> {
        Err(unsupported(alg.name, Operation::GetKeyLength))
    }
}

fn unsupported(name: &str, op: Operation) -> Error {
    Error::NotSupported(format!("{name} does not implement {}", op.as_str()))
}

/// Parameter schema tag for one (operation, algorithm) pair
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schema {
    None,
    AesGcmParams,
    AesCbcParams,
    AesKeyGenParams,
    AesDerivedKeyParams,
    HmacImportParams,
    HmacKeyGenParams,
    RsaHashedKeyGenParams,
    RsaHashedImportParams,
    RsaOaepParams,
    RsaPssParams,
    EcKeyGenParams,
    EcdsaParams,
    HkdfParams,
    Pbkdf2Params,
}

/// One registry entry
#[derive(Clone, Copy)]
pub struct Entry {
    /// Canonical spelling of the algorithm name
    pub name: &'static str,
    /// Schema the normalizer instantiates for this pair
    pub schema: Schema,
    /// The implementing module
    pub imp: &'static dyn AlgorithmModule,
}

/// The algorithm registry; read-only after construction
pub struct Registry {
    table: HashMap<Operation, HashMap<String, Entry>>,
}

impl Registry {
    /// An empty registry
    pub fn empty() -> Self {
        Registry { table: HashMap::new() }
    }

    /// The registry with the built-in algorithm suite installed
    pub fn builtin() -> Self {
        let mut r = Registry::empty();
        modules::install(&mut r);
        r
    }

    /// Register `imp` for `(op, name)` with the given schema
    pub fn register(
        &mut self,
        op: Operation,
        name: &'static str,
        schema: Schema,
        imp: &'static dyn AlgorithmModule,
    ) {
        self.table
            .entry(op)
            .or_default()
            .insert(name.to_ascii_lowercase(), Entry { name, schema, imp });
    }

    /// Case-insensitive lookup
    pub fn lookup(&self, op: Operation, name: &str) -> Option<&Entry> {
        self.table.get(&op)?.get(&name.to_ascii_lowercase())
    }

    /// Schema of `(op, name)`, if registered
    pub fn schema(&self, op: Operation, name: &str) -> Option<Schema> {
        self.lookup(op, name).map(|e| e.schema)
    }

    /// Implementation of `(op, name)`, if registered
    pub fn imp(&self, op: Operation, name: &str) -> Option<&'static dyn AlgorithmModule> {
        self.lookup(op, name).map(|e| e.imp)
    }

    /// Like [`imp`](Registry::imp), erroring the way the dispatcher
    /// reports a missing registration
    pub(crate) fn require_imp(
        &self,
        op: Operation,
        name: &str,
    ) -> Result<&'static dyn AlgorithmModule> {
        self.imp(op, name)
            .ok_or_else(|| Error::unregistered(op.as_str(), name))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::builtin()
    }
}
