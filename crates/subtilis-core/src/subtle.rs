//! The operation dispatcher
//!
//! Every public operation follows one skeleton: copy the caller's
//! octets, normalize the algorithm descriptor, validate the key
//! against the operation, invoke the resolved module capability, and
//! post-validate anything the operation produced. Errors surface
//! through the returned future in exactly that order, and algorithm
//! code never runs for a key that failed validation.
//!
//! The composite `wrap_key` / `unwrap_key` operations chain
//! export-then-encrypt and decrypt-then-import, preferring a module's native
//! `wrapKey`/`unwrapKey` capability and falling back to its
//! `encrypt`/`decrypt` otherwise.

use crate::{
    algorithm::Algorithm,
    error::{Error, Result},
    jwk::JsonWebKey,
    key::{CryptoKey, GeneratedKey, KeyData, KeyFormat, KeyUsage},
    normalize::normalize,
    params::NormalizedAlgorithm,
    registry::{Operation, Registry},
    validate,
};

/// The cryptographic service façade
///
/// Construction installs the built-in algorithm registry; the
/// registry is read-only from then on. All methods are `async`: the
/// returned future is the deferred result, and a rejected future is
/// the only way an error leaves the dispatcher.
pub struct SubtleCrypto {
    registry: Registry,
}

impl SubtleCrypto {
    /// A dispatcher over the built-in algorithm suite
    pub fn new() -> Self {
        SubtleCrypto { registry: Registry::builtin() }
    }

    /// A dispatcher over a caller-assembled registry
    pub fn with_registry(registry: Registry) -> Self {
        SubtleCrypto { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encrypt `data` under `key`
    pub async fn encrypt(
        &self,
        algorithm: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        let data = data.to_vec();
        let alg = normalize(&self.registry, Operation::Encrypt, algorithm)?;
        validate::require_name_match(alg.name, key)?;
        validate::require_usage(key, KeyUsage::Encrypt)?;
        let imp = self.registry.require_imp(Operation::Encrypt, alg.name)?;
        imp.encrypt(&alg, key, &data)
    }

    /// Decrypt `data` under `key`
    pub async fn decrypt(
        &self,
        algorithm: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        let data = data.to_vec();
        let alg = normalize(&self.registry, Operation::Decrypt, algorithm)?;
        validate::require_name_match(alg.name, key)?;
        validate::require_usage(key, KeyUsage::Decrypt)?;
        let imp = self.registry.require_imp(Operation::Decrypt, alg.name)?;
        imp.decrypt(&alg, key, &data)
    }

    /// Produce a signature over `data`
    pub async fn sign(
        &self,
        algorithm: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        let data = data.to_vec();
        let alg = normalize(&self.registry, Operation::Sign, algorithm)?;
        validate::require_name_match(alg.name, key)?;
        validate::require_usage(key, KeyUsage::Sign)?;
        let imp = self.registry.require_imp(Operation::Sign, alg.name)?;
        imp.sign(&alg, key, &data)
    }

    /// Check a signature over `data`
    ///
    /// An authentic-but-wrong signature resolves `false`; only
    /// operational failures reject.
    pub async fn verify(
        &self,
        algorithm: &Algorithm,
        key: &CryptoKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool> {
        let signature = signature.to_vec();
        let data = data.to_vec();
        let alg = normalize(&self.registry, Operation::Verify, algorithm)?;
        validate::require_name_match(alg.name, key)?;
        validate::require_usage(key, KeyUsage::Verify)?;
        let imp = self.registry.require_imp(Operation::Verify, alg.name)?;
        imp.verify(&alg, key, &signature, &data)
    }

    /// Compute a digest of `data`
    pub async fn digest(&self, algorithm: &Algorithm, data: &[u8]) -> Result<Vec<u8>> {
        let data = data.to_vec();
        let alg = normalize(&self.registry, Operation::Digest, algorithm)?;
        let imp = self.registry.require_imp(Operation::Digest, alg.name)?;
        imp.digest(&alg, &data)
    }

    /// Generate a key or key pair
    pub async fn generate_key(
        &self,
        algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<GeneratedKey> {
        let alg = normalize(&self.registry, Operation::GenerateKey, algorithm)?;
        let usages = validate::normalize_usages(usages);
        let imp = self.registry.require_imp(Operation::GenerateKey, alg.name)?;
        // Key generation can be minutes of CPU for large RSA moduli;
        // run it off the cooperative thread.
        let generated = run_blocking(move || imp.generate_key(&alg, extractable, &usages)).await?;
        match &generated {
            GeneratedKey::Key(key) => validate::check_produced_key(key)?,
            GeneratedKey::Pair(pair) => validate::check_produced_pair(pair)?,
        }
        Ok(generated)
    }

    /// Import a key from external material
    pub async fn import_key(
        &self,
        format: KeyFormat,
        key_data: &KeyData,
        algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let key_data = key_data.clone();
        let alg = normalize(&self.registry, Operation::ImportKey, algorithm)?;
        validate::require_format_match(format, &key_data)?;
        let usages = validate::normalize_usages(usages);
        let imp = self.registry.require_imp(Operation::ImportKey, alg.name)?;
        let mut key = imp.import_key(format, &key_data, &alg, extractable, &usages)?;
        key.set_extractable(extractable);
        key.set_usages(usages);
        validate::check_produced_key(&key)?;
        Ok(key)
    }

    /// Export a key in the requested format
    ///
    /// The module invoked is the one the key was created under; there
    /// is no algorithm descriptor to normalize.
    pub async fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<KeyData> {
        let imp = self
            .registry
            .require_imp(Operation::ExportKey, key.algorithm().name())?;
        validate::require_extractable(key)?;
        imp.export_key(format, key)
    }

    /// Derive `length` bits from `key`
    pub async fn derive_bits(
        &self,
        algorithm: &Algorithm,
        key: &CryptoKey,
        length: u32,
    ) -> Result<Vec<u8>> {
        let alg = normalize(&self.registry, Operation::DeriveBits, algorithm)?;
        validate::require_name_match(alg.name, key)?;
        validate::require_usage(key, KeyUsage::DeriveBits)?;
        let imp = self.registry.require_imp(Operation::DeriveBits, alg.name)?;
        let key = key.clone();
        run_blocking(move || imp.derive_bits(&alg, &key, length)).await
    }

    /// Derive a key: deriveBits fed through importKey under
    /// `derived_key_type`
    pub async fn derive_key(
        &self,
        algorithm: &Algorithm,
        base_key: &CryptoKey,
        derived_key_type: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let alg = normalize(&self.registry, Operation::DeriveBits, algorithm)?;
        let import_alg = normalize(&self.registry, Operation::ImportKey, derived_key_type)?;
        let length_alg = normalize(&self.registry, Operation::GetKeyLength, derived_key_type)?;
        validate::require_name_match(alg.name, base_key)?;
        validate::require_usage(base_key, KeyUsage::DeriveKey)?;
        let usages = validate::normalize_usages(usages);

        let length = self
            .registry
            .require_imp(Operation::GetKeyLength, length_alg.name)?
            .get_key_length(&length_alg)?;

        let derive_imp = self.registry.require_imp(Operation::DeriveBits, alg.name)?;
        let bits = {
            let base_key = base_key.clone();
            run_blocking(move || derive_imp.derive_bits(&alg, &base_key, length)).await?
        };

        let import_imp = self.registry.require_imp(Operation::ImportKey, import_alg.name)?;
        let mut key = import_imp.import_key(
            KeyFormat::Raw,
            &KeyData::Bytes(bits),
            &import_alg,
            extractable,
            &usages,
        )?;
        key.set_extractable(extractable);
        key.set_usages(usages);
        validate::check_produced_key(&key)?;
        Ok(key)
    }

    /// Export `key` and encrypt it under `wrapping_key`
    pub async fn wrap_key(
        &self,
        format: KeyFormat,
        key: &CryptoKey,
        wrapping_key: &CryptoKey,
        wrap_algorithm: &Algorithm,
    ) -> Result<Vec<u8>> {
        let (op, alg) = self.normalize_with_fallback(
            Operation::WrapKey,
            Operation::Encrypt,
            wrap_algorithm,
        )?;
        validate::require_name_match(alg.name, wrapping_key)?;
        validate::require_usage(wrapping_key, KeyUsage::WrapKey)?;
        if self
            .registry
            .lookup(Operation::ExportKey, key.algorithm().name())
            .is_none()
        {
            return Err(Error::unregistered("exportKey", key.algorithm().name()));
        }
        validate::require_extractable(key)?;

        let exported = self.export_key(format, key).await?;
        let octets = match exported {
            KeyData::Bytes(bytes) => bytes,
            KeyData::Jwk(jwk) => jwk.to_bytes()?,
        };

        let imp = self.registry.require_imp(op, alg.name)?;
        if imp.supports(Operation::WrapKey) {
            imp.wrap_key(&alg, wrapping_key, &octets)
        } else if imp.supports(Operation::Encrypt) {
            imp.encrypt(&alg, wrapping_key, &octets)
        } else {
            Err(Error::NotSupported(format!(
                "{} provides neither wrapKey nor encrypt",
                alg.name
            )))
        }
    }

    /// Decrypt `wrapped_key` under `unwrapping_key` and import the
    /// result as a key of `unwrapped_key_algorithm`
    #[allow(clippy::too_many_arguments)]
    pub async fn unwrap_key(
        &self,
        format: KeyFormat,
        wrapped_key: &[u8],
        unwrapping_key: &CryptoKey,
        unwrap_algorithm: &Algorithm,
        unwrapped_key_algorithm: &Algorithm,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<CryptoKey> {
        let wrapped = wrapped_key.to_vec();
        let (op, alg) = self.normalize_with_fallback(
            Operation::UnwrapKey,
            Operation::Decrypt,
            unwrap_algorithm,
        )?;
        // The imported key's parameters come from the caller's
        // unwrapped-key descriptor; a failure here has no fallback.
        let import_alg = normalize(&self.registry, Operation::ImportKey, unwrapped_key_algorithm)?;
        validate::require_name_match(alg.name, unwrapping_key)?;
        validate::require_usage(unwrapping_key, KeyUsage::UnwrapKey)?;

        let imp = self.registry.require_imp(op, alg.name)?;
        let octets = if imp.supports(Operation::UnwrapKey) {
            imp.unwrap_key(&alg, unwrapping_key, &wrapped)?
        } else if imp.supports(Operation::Decrypt) {
            imp.decrypt(&alg, unwrapping_key, &wrapped)?
        } else {
            return Err(Error::NotSupported(format!(
                "{} provides neither unwrapKey nor decrypt",
                alg.name
            )));
        };

        let key_data = match format {
            KeyFormat::Jwk => KeyData::Jwk(JsonWebKey::from_bytes(&octets)?),
            _ => KeyData::Bytes(octets),
        };
        let usages = validate::normalize_usages(usages);
        let import_imp = self.registry.require_imp(Operation::ImportKey, import_alg.name)?;
        let mut key = import_imp.import_key(format, &key_data, &import_alg, extractable, &usages)?;
        key.set_extractable(extractable);
        key.set_usages(usages);
        validate::check_produced_key(&key)?;
        Ok(key)
    }

    // The preferred operation is the one named after the composite;
    // the fallback is its cryptographically-equivalent symmetric
    // twin. When both normalizations fail, the caller sees the
    // original error, and when the primary succeeds the fallback is
    // never consulted.
    fn normalize_with_fallback(
        &self,
        primary: Operation,
        fallback: Operation,
        desc: &Algorithm,
    ) -> Result<(Operation, NormalizedAlgorithm)> {
        match normalize(&self.registry, primary, desc) {
            Ok(alg) => Ok((primary, alg)),
            Err(original) => match normalize(&self.registry, fallback, desc) {
                Ok(alg) => Ok((fallback, alg)),
                Err(_) => Err(original),
            },
        }
    }
}

impl Default for SubtleCrypto {
    fn default() -> Self {
        SubtleCrypto::new()
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Operation(format!("background task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyType;
    use crate::registry::{AlgorithmModule, Schema};

    // The JWK of a fixed AES-256 key, IV 0..=15
    const K256: &str = "Y0zt37HgOx-BY7SQjYVmrqhPkO44Ii2Jcb9yydUDPfE";

    fn aes_jwk() -> JsonWebKey {
        JsonWebKey {
            kty: "oct".to_string(),
            k: Some(K256.to_string()),
            alg: Some("A256GCM".to_string()),
            ext: Some(true),
            ..Default::default()
        }
    }

    fn gcm_alg() -> Algorithm {
        Algorithm::new("AES-GCM").with_iv((0u8..16).collect::<Vec<u8>>())
    }

    async fn import_aes(subtle: &SubtleCrypto, extractable: bool, usages: &[KeyUsage]) -> CryptoKey {
        subtle
            .import_key(
                KeyFormat::Jwk,
                &KeyData::Jwk(aes_jwk()),
                &"AES-GCM".into(),
                extractable,
                usages,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_aes_gcm_jwk_roundtrip() {
        let subtle = SubtleCrypto::new();
        let key = import_aes(&subtle, true, &[KeyUsage::Encrypt, KeyUsage::Decrypt]).await;
        assert_eq!(key.key_type(), KeyType::Secret);
        assert_eq!(key.algorithm().name(), "AES-GCM");

        let ct = subtle.encrypt(&gcm_alg(), &key, b"hello").await.unwrap();
        assert_eq!(ct.len(), 5 + 16);
        let pt = subtle.decrypt(&gcm_alg(), &key, &ct).await.unwrap();
        assert_eq!(pt, b"hello");
    }

    #[tokio::test]
    async fn test_usage_gate_blocks_decrypt() {
        let subtle = SubtleCrypto::new();
        let key = import_aes(&subtle, true, &[KeyUsage::Encrypt]).await;
        let ct = subtle.encrypt(&gcm_alg(), &key, b"hello").await.unwrap();
        let err = subtle.decrypt(&gcm_alg(), &key, &ct).await.unwrap_err();
        assert!(matches!(err, Error::InvalidAccess(_)));
    }

    #[tokio::test]
    async fn test_extractability_gate_blocks_export() {
        let subtle = SubtleCrypto::new();
        let key = import_aes(&subtle, false, &[KeyUsage::Encrypt, KeyUsage::Decrypt]).await;
        let err = subtle.export_key(KeyFormat::Jwk, &key).await.unwrap_err();
        assert!(matches!(err, Error::InvalidAccess(_)));
        // ... and the wrap of that key fails the same way
        let wrapper = import_aes(&subtle, true, &[KeyUsage::WrapKey]).await;
        let err = subtle
            .wrap_key(KeyFormat::Jwk, &key, &wrapper, &gcm_alg())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAccess(_)));
    }

    #[tokio::test]
    async fn test_wrap_unwrap_jwk_with_gcm_fallback() {
        let subtle = SubtleCrypto::new();
        let usages = [
            KeyUsage::Encrypt,
            KeyUsage::Decrypt,
            KeyUsage::WrapKey,
            KeyUsage::UnwrapKey,
        ];
        let key = import_aes(&subtle, true, &usages).await;

        // AES-GCM has no native wrapKey: the dispatcher must fall
        // back to normalizing under encrypt and calling encrypt.
        let wrapped = subtle
            .wrap_key(KeyFormat::Jwk, &key, &key, &gcm_alg())
            .await
            .unwrap();

        let unwrapped = subtle
            .unwrap_key(
                KeyFormat::Jwk,
                &wrapped,
                &key,
                &gcm_alg().with_tag_length(128),
                &Algorithm::new("AES-GCM").with_length(256),
                true,
                &[KeyUsage::Encrypt, KeyUsage::Decrypt, KeyUsage::UnwrapKey],
            )
            .await
            .unwrap();

        // The unwrapped key's JWK export carries the original material
        let KeyData::Jwk(jwk) = subtle.export_key(KeyFormat::Jwk, &unwrapped).await.unwrap()
        else {
            panic!("expected a JWK");
        };
        assert_eq!(jwk.k.as_deref(), Some(K256));
        assert_eq!(
            unwrapped.usages(),
            &[KeyUsage::Encrypt, KeyUsage::Decrypt, KeyUsage::UnwrapKey]
        );
    }

    #[tokio::test]
    async fn test_unknown_algorithm_rejects_before_validation() {
        let subtle = SubtleCrypto::new();
        // The key has no encrypt usage; the unregistered name must
        // win regardless, because normalization precedes validation.
        let key = import_aes(&subtle, true, &[KeyUsage::Decrypt]).await;
        let err = subtle.encrypt(&"ZZZ".into(), &key, b"x").await.unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
    }

    #[tokio::test]
    async fn test_sha256_digest_vector() {
        let subtle = SubtleCrypto::new();
        let out = subtle.digest(&"SHA-256".into(), b"abc").await.unwrap();
        assert_eq!(
            hex::encode(out),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_digest_is_deterministic_and_case_insensitive() {
        let subtle = SubtleCrypto::new();
        let a = subtle.digest(&"sha-256".into(), b"abc").await.unwrap();
        let b = subtle.digest(&"SHA-256".into(), b"abc").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_generate_key_empty_usages_is_syntax_error() {
        let subtle = SubtleCrypto::new();
        let err = subtle
            .generate_key(&Algorithm::new("AES-GCM").with_length(128), true, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[tokio::test]
    async fn test_generate_key_dedups_usages() {
        let subtle = SubtleCrypto::new();
        let key = subtle
            .generate_key(
                &Algorithm::new("AES-GCM").with_length(128),
                true,
                &[KeyUsage::Encrypt, KeyUsage::Encrypt, KeyUsage::Decrypt],
            )
            .await
            .unwrap()
            .into_key()
            .unwrap();
        assert_eq!(key.usages(), &[KeyUsage::Encrypt, KeyUsage::Decrypt]);
    }

    #[tokio::test]
    async fn test_aes_kw_native_wrap_path() {
        let subtle = SubtleCrypto::new();
        let kek = subtle
            .generate_key(
                &Algorithm::new("AES-KW").with_length(256),
                true,
                &[KeyUsage::WrapKey, KeyUsage::UnwrapKey],
            )
            .await
            .unwrap()
            .into_key()
            .unwrap();
        let key = import_aes(&subtle, true, &[KeyUsage::Encrypt, KeyUsage::Decrypt]).await;

        // Raw AES material is 32 bytes: AES-KW wraps it to 40
        let wrapped = subtle
            .wrap_key(KeyFormat::Raw, &key, &kek, &"AES-KW".into())
            .await
            .unwrap();
        assert_eq!(wrapped.len(), 40);

        let unwrapped = subtle
            .unwrap_key(
                KeyFormat::Raw,
                &wrapped,
                &kek,
                &"AES-KW".into(),
                &Algorithm::new("AES-GCM").with_length(256),
                true,
                &[KeyUsage::Encrypt, KeyUsage::Decrypt],
            )
            .await
            .unwrap();

        let ct = subtle.encrypt(&gcm_alg(), &key, b"kw").await.unwrap();
        assert_eq!(subtle.decrypt(&gcm_alg(), &unwrapped, &ct).await.unwrap(), b"kw");
    }

    #[tokio::test]
    async fn test_wrap_requires_wrap_usage_on_wrapping_key() {
        let subtle = SubtleCrypto::new();
        let key = import_aes(&subtle, true, &[KeyUsage::Encrypt, KeyUsage::Decrypt]).await;
        let err = subtle
            .wrap_key(KeyFormat::Raw, &key, &key, &gcm_alg())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAccess(_)));
    }

    #[tokio::test]
    async fn test_wrap_fallback_failure_surfaces_original_error() {
        let subtle = SubtleCrypto::new();
        let key = import_aes(&subtle, true, &[KeyUsage::WrapKey]).await;
        // HMAC is registered for neither wrapKey nor encrypt
        let err = subtle
            .wrap_key(KeyFormat::Raw, &key, &key, &Algorithm::new("HMAC").with_hash("SHA-256"))
            .await
            .unwrap_err();
        let Error::NotSupported(msg) = err else {
            panic!("expected NotSupported");
        };
        assert!(msg.contains("wrapKey"), "original error should name wrapKey: {msg}");
    }

    // A registered wrapping algorithm whose module answers the
    // capability probe with nothing: the probe, not the registry,
    // must reject it.
    struct InertModule;

    impl AlgorithmModule for InertModule {
        fn supports(&self, op: Operation) -> bool {
            matches!(op, Operation::ImportKey)
        }

        fn import_key(
            &self,
            _format: KeyFormat,
            data: &KeyData,
            _alg: &NormalizedAlgorithm,
            extractable: bool,
            usages: &[KeyUsage],
        ) -> Result<CryptoKey> {
            Ok(CryptoKey::new(
                KeyType::Secret,
                extractable,
                crate::key::KeyAlgorithm::Kdf { name: "INERT-WRAP" },
                usages.to_vec(),
                crate::key::KeyMaterial::Secret(data.as_bytes()?.to_vec()),
            ))
        }
    }

    static INERT: InertModule = InertModule;

    #[tokio::test]
    async fn test_wrap_module_without_wrap_or_encrypt_capability() {
        let mut registry = Registry::builtin();
        registry.register(Operation::WrapKey, "INERT-WRAP", Schema::None, &INERT);
        registry.register(Operation::ImportKey, "INERT-WRAP", Schema::None, &INERT);
        let subtle = SubtleCrypto::with_registry(registry);

        let wrapper = subtle
            .import_key(
                KeyFormat::Raw,
                &KeyData::Bytes(vec![0u8; 16]),
                &"INERT-WRAP".into(),
                true,
                &[KeyUsage::WrapKey],
            )
            .await
            .unwrap();
        let key = import_aes(&subtle, true, &[KeyUsage::Encrypt]).await;

        let err = subtle
            .wrap_key(KeyFormat::Raw, &key, &wrapper, &"INERT-WRAP".into())
            .await
            .unwrap_err();
        let Error::NotSupported(msg) = err else {
            panic!("expected NotSupported");
        };
        assert!(msg.contains("neither"), "{msg}");
    }

    #[tokio::test]
    async fn test_hmac_sign_verify_through_dispatcher() {
        let subtle = SubtleCrypto::new();
        let key = subtle
            .generate_key(
                &Algorithm::new("HMAC").with_hash("SHA-256"),
                false,
                &[KeyUsage::Sign, KeyUsage::Verify],
            )
            .await
            .unwrap()
            .into_key()
            .unwrap();

        let alg: Algorithm = "HMAC".into();
        let tag = subtle.sign(&alg, &key, b"message").await.unwrap();
        assert!(subtle.verify(&alg, &key, &tag, b"message").await.unwrap());

        // Same-length corruption resolves false, it does not reject
        let mut bad = tag.clone();
        bad[0] ^= 1;
        assert!(!subtle.verify(&alg, &key, &bad, b"message").await.unwrap());
    }

    #[tokio::test]
    async fn test_algorithm_name_mismatch_with_key() {
        let subtle = SubtleCrypto::new();
        let key = import_aes(&subtle, true, &[KeyUsage::Encrypt, KeyUsage::Decrypt]).await;
        let cbc = Algorithm::new("AES-CBC").with_iv(vec![0u8; 16]);
        let err = subtle.encrypt(&cbc, &key, b"x").await.unwrap_err();
        assert!(matches!(err, Error::InvalidAccess(_)));
    }

    #[tokio::test]
    async fn test_derive_key_pbkdf2_to_aes() {
        let subtle = SubtleCrypto::new();
        let base = subtle
            .import_key(
                KeyFormat::Raw,
                &KeyData::Bytes(b"correct horse battery staple".to_vec()),
                &"PBKDF2".into(),
                false,
                &[KeyUsage::DeriveKey, KeyUsage::DeriveBits],
            )
            .await
            .unwrap();

        let derive_alg = Algorithm::new("PBKDF2")
            .with_hash("SHA-256")
            .with_salt(b"pepper".to_vec())
            .with_iterations(100);
        let derived = subtle
            .derive_key(
                &derive_alg,
                &base,
                &Algorithm::new("AES-GCM").with_length(256),
                true,
                &[KeyUsage::Encrypt, KeyUsage::Decrypt],
            )
            .await
            .unwrap();
        assert_eq!(derived.algorithm().name(), "AES-GCM");

        let ct = subtle.encrypt(&gcm_alg(), &derived, b"derived").await.unwrap();
        assert_eq!(subtle.decrypt(&gcm_alg(), &derived, &ct).await.unwrap(), b"derived");

        // The same derivation must land on the same key material
        let bits = subtle.derive_bits(&derive_alg, &base, 256).await.unwrap();
        let KeyData::Bytes(raw) = subtle.export_key(KeyFormat::Raw, &derived).await.unwrap()
        else {
            panic!("expected bytes");
        };
        assert_eq!(bits, raw);
    }

    #[tokio::test]
    async fn test_derive_bits_requires_usage() {
        let subtle = SubtleCrypto::new();
        let base = subtle
            .import_key(
                KeyFormat::Raw,
                &KeyData::Bytes(b"ikm".to_vec()),
                &"HKDF".into(),
                false,
                &[KeyUsage::DeriveKey],
            )
            .await
            .unwrap();
        let alg = Algorithm::new("HKDF")
            .with_hash("SHA-256")
            .with_salt(Vec::new())
            .with_info(Vec::new());
        let err = subtle.derive_bits(&alg, &base, 128).await.unwrap_err();
        assert!(matches!(err, Error::InvalidAccess(_)));
    }

    #[tokio::test]
    async fn test_format_material_mismatch_is_type_error() {
        let subtle = SubtleCrypto::new();
        let err = subtle
            .import_key(
                KeyFormat::Jwk,
                &KeyData::Bytes(vec![0u8; 32]),
                &"AES-GCM".into(),
                true,
                &[KeyUsage::Encrypt],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[tokio::test]
    async fn test_input_copies_are_isolated() {
        let subtle = SubtleCrypto::new();
        let key = import_aes(&subtle, true, &[KeyUsage::Encrypt, KeyUsage::Decrypt]).await;
        let mut data = b"isolated".to_vec();
        let ct = subtle.encrypt(&gcm_alg(), &key, &data).await.unwrap();
        // The dispatcher copied the plaintext; clobbering the caller's
        // buffer afterwards must not affect what was encrypted.
        data.fill(0);
        assert_eq!(subtle.decrypt(&gcm_alg(), &key, &ct).await.unwrap(), b"isolated");
    }

    #[tokio::test]
    async fn test_rsa_oaep_wrap_fallback_roundtrip() {
        let subtle = SubtleCrypto::new();
        let pair = subtle
            .generate_key(
                &Algorithm::new("RSA-OAEP")
                    .with_modulus_length(2048)
                    .with_public_exponent(vec![1, 0, 1])
                    .with_hash("SHA-256"),
                true,
                &[
                    KeyUsage::Encrypt,
                    KeyUsage::Decrypt,
                    KeyUsage::WrapKey,
                    KeyUsage::UnwrapKey,
                ],
            )
            .await
            .unwrap()
            .into_pair()
            .unwrap();
        assert!(pair.public_key.usages().contains(&KeyUsage::WrapKey));

        let secret = import_aes(&subtle, true, &[KeyUsage::Encrypt, KeyUsage::Decrypt]).await;
        let wrapped = subtle
            .wrap_key(KeyFormat::Raw, &secret, &pair.public_key, &"RSA-OAEP".into())
            .await
            .unwrap();
        assert_eq!(wrapped.len(), 256);

        let unwrapped = subtle
            .unwrap_key(
                KeyFormat::Raw,
                &wrapped,
                &pair.private_key,
                &"RSA-OAEP".into(),
                &Algorithm::new("AES-GCM").with_length(256),
                true,
                &[KeyUsage::Decrypt],
            )
            .await
            .unwrap();
        let ct = subtle.encrypt(&gcm_alg(), &secret, b"rsa wrap").await.unwrap();
        assert_eq!(
            subtle.decrypt(&gcm_alg(), &unwrapped, &ct).await.unwrap(),
            b"rsa wrap"
        );
    }

    #[tokio::test]
    async fn test_export_unregistered_algorithm_is_not_supported() {
        let subtle = SubtleCrypto::new();
        let base = subtle
            .import_key(
                KeyFormat::Raw,
                &KeyData::Bytes(b"ikm".to_vec()),
                &"HKDF".into(),
                false,
                &[KeyUsage::DeriveBits],
            )
            .await
            .unwrap();
        // HKDF has no exportKey registration: that error must come
        // before the extractability gate.
        let err = subtle.export_key(KeyFormat::Raw, &base).await.unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
    }

    #[tokio::test]
    async fn test_ecdsa_end_to_end() {
        let subtle = SubtleCrypto::new();
        let pair = subtle
            .generate_key(
                &Algorithm::new("ECDSA").with_named_curve("P-256"),
                true,
                &[KeyUsage::Sign, KeyUsage::Verify],
            )
            .await
            .unwrap()
            .into_pair()
            .unwrap();

        let sign_alg = Algorithm::new("ECDSA").with_hash("SHA-256");
        let sig = subtle.sign(&sign_alg, &pair.private_key, b"payload").await.unwrap();
        assert_eq!(sig.len(), 64);
        assert!(subtle
            .verify(&sign_alg, &pair.public_key, &sig, b"payload")
            .await
            .unwrap());

        // Corrupt one byte: same length, resolves false
        let mut bad = sig.clone();
        bad[20] ^= 0x08;
        assert!(!subtle
            .verify(&sign_alg, &pair.public_key, &bad, b"payload")
            .await
            .unwrap());

        // Signing with the public key is an access violation
        let err = subtle.sign(&sign_alg, &pair.public_key, b"payload").await.unwrap_err();
        assert!(matches!(err, Error::InvalidAccess(_)));
    }
}
