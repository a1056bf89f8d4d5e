//! Keypair-backed assertion signer
//!
//! Unseals a model's Ed25519 key with the keystore secret and signs the
//! rendered headers. Unsealed keys are cached by fingerprint; a miss takes
//! the unseal lock so concurrent requests for the same key decrypt it once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::cache::{SigningKeyCache, SigningKeyCacheConfig};
use super::crypto::{key_fingerprint, unseal_signing_key};
use super::{render_content, AssertionSigner, SignedAssertion};
use crate::assertion::{header, AssertionType, HeaderMap, HeaderValue};
use crate::types::{Result, WardenError};

pub struct KeypairSigner {
    secret: Arc<Zeroizing<Vec<u8>>>,
    cache: SigningKeyCache,
    unseal_lock: Mutex<()>,
}

impl KeypairSigner {
    pub fn new(secret: &str, cache_config: SigningKeyCacheConfig) -> Self {
        Self {
            secret: Arc::new(Zeroizing::new(secret.as_bytes().to_vec())),
            cache: SigningKeyCache::new(cache_config),
            unseal_lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &SigningKeyCache {
        &self.cache
    }

    /// Resolve the signing key for `key_id`, unsealing it on a cache miss.
    async fn signing_key(&self, key_id: &str, sealed_key: &str) -> Result<SigningKey> {
        if let Some(key) = self.cache.get(key_id) {
            return Ok(key);
        }

        let _guard = self.unseal_lock.lock().await;
        if let Some(key) = self.cache.get(key_id) {
            return Ok(key);
        }

        if sealed_key.trim().is_empty() {
            return Err(WardenError::SigningAssertion(format!(
                "no sealed key stored for {key_id}"
            )));
        }

        let secret = Arc::clone(&self.secret);
        let sealed = sealed_key.to_string();
        let key = tokio::task::spawn_blocking(move || unseal_signing_key(&sealed, &secret))
            .await
            .map_err(|e| WardenError::Internal(format!("Unseal task failed: {e}")))??;

        let fingerprint = key_fingerprint(&key.verifying_key());
        if fingerprint != key_id {
            return Err(WardenError::SigningAssertion(format!(
                "sealed key does not match key id {key_id}"
            )));
        }

        info!(key_id, "Unsealed signing key");
        self.cache.insert(key_id, &key);
        Ok(key)
    }
}

/// Periodically drop expired unsealed keys from the signer's cache
pub fn spawn_cleanup_task(signer: Arc<KeypairSigner>, interval: Duration) -> JoinHandle<()> {
    let handle = tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let cache = signer.cache();
            let removed = cache.cleanup();
            if removed > 0 {
                debug!("Signing key cache cleanup: removed {} expired keys", removed);
            }
            let stats = cache.stats();
            debug!(
                "Signing key cache: {} cached, {} hits, {} misses, {} evictions",
                cache.len(),
                stats.hits,
                stats.misses,
                stats.evictions
            );
        }
    });
    info!("Signing key cache cleanup task started");
    handle
}

fn expect_text(headers: &HeaderMap, name: &str, expected: &str) -> Result<()> {
    match header(headers, name) {
        Some(HeaderValue::Text(value)) if value == expected => Ok(()),
        Some(_) => Err(WardenError::SigningAssertion(format!(
            "header {name:?} does not match {expected:?}"
        ))),
        None => Err(WardenError::SigningAssertion(format!("missing header {name:?}"))),
    }
}

#[async_trait]
impl AssertionSigner for KeypairSigner {
    async fn sign_assertion(
        &self,
        assertion_type: AssertionType,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        authority_id: &str,
        key_id: &str,
        sealed_key: &str,
    ) -> Result<SignedAssertion> {
        expect_text(headers, "type", assertion_type.name())?;
        expect_text(headers, "authority-id", authority_id)?;
        expect_text(headers, "sign-key-sha3-384", key_id)?;

        let content = render_content(headers, body)?;
        let key = self
            .signing_key(key_id, sealed_key)
            .await
            .map_err(|e| match e {
                WardenError::SigningAssertion(_) => e,
                other => WardenError::SigningAssertion(other.to_string()),
            })?;

        let signature = key.sign(content.as_bytes());
        debug!(
            assertion_type = assertion_type.name(),
            authority_id, key_id, "Signed assertion"
        );

        Ok(SignedAssertion::new(content, signature.to_bytes().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::crypto::{generate_keypair, seal_signing_key};
    use crate::signing::verify_encoded;

    const SECRET: &str = "keystore-test-secret";

    fn headers(key_id: &str) -> HeaderMap {
        vec![
            ("type".into(), "system-user".into()),
            ("authority-id".into(), "canonical".into()),
            ("username".into(), "ab".into()),
            ("models".into(), vec!["pi3".to_string()].into()),
            ("sign-key-sha3-384".into(), key_id.into()),
        ]
    }

    #[tokio::test]
    async fn test_sign_and_verify() {
        let (signing_key, verifying_key) = generate_keypair();
        let key_id = key_fingerprint(&verifying_key);
        let sealed = seal_signing_key(&signing_key, SECRET.as_bytes()).unwrap();
        let signer = KeypairSigner::new(SECRET, SigningKeyCacheConfig::default());

        let signed = signer
            .sign_assertion(
                AssertionType::SystemUser,
                &headers(&key_id),
                None,
                "canonical",
                &key_id,
                &sealed,
            )
            .await
            .unwrap();

        let encoded = signed.encode();
        assert!(encoded.starts_with("type: system-user\nauthority-id: canonical\n"));
        assert!(encoded.contains("models:\n  - pi3\n"));
        verify_encoded(&encoded, &verifying_key).unwrap();

        let (_, other_key) = generate_keypair();
        assert!(verify_encoded(&encoded, &other_key).is_err());
    }

    #[tokio::test]
    async fn test_unsealed_key_is_cached() {
        let (signing_key, verifying_key) = generate_keypair();
        let key_id = key_fingerprint(&verifying_key);
        let sealed = seal_signing_key(&signing_key, SECRET.as_bytes()).unwrap();
        let signer = KeypairSigner::new(SECRET, SigningKeyCacheConfig::default());

        for _ in 0..2 {
            signer
                .sign_assertion(
                    AssertionType::SystemUser,
                    &headers(&key_id),
                    None,
                    "canonical",
                    &key_id,
                    &sealed,
                )
                .await
                .unwrap();
        }

        assert_eq!(signer.cache().len(), 1);
        assert!(signer.cache().stats().hits >= 1);
    }

    #[tokio::test]
    async fn test_key_id_mismatch_is_rejected() {
        let (signing_key, _) = generate_keypair();
        let sealed = seal_signing_key(&signing_key, SECRET.as_bytes()).unwrap();
        let signer = KeypairSigner::new(SECRET, SigningKeyCacheConfig::default());

        let err = signer
            .sign_assertion(
                AssertionType::SystemUser,
                &headers("not-the-fingerprint"),
                None,
                "canonical",
                "not-the-fingerprint",
                &sealed,
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), "signing-assertion");
        assert!(signer.cache().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_secret_is_signing_error() {
        let (signing_key, verifying_key) = generate_keypair();
        let key_id = key_fingerprint(&verifying_key);
        let sealed = seal_signing_key(&signing_key, b"another-secret").unwrap();
        let signer = KeypairSigner::new(SECRET, SigningKeyCacheConfig::default());

        let err = signer
            .sign_assertion(
                AssertionType::SystemUser,
                &headers(&key_id),
                None,
                "canonical",
                &key_id,
                &sealed,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, WardenError::SigningAssertion(_)));
    }

    #[tokio::test]
    async fn test_header_authority_must_match() {
        let signer = KeypairSigner::new(SECRET, SigningKeyCacheConfig::default());

        let err = signer
            .sign_assertion(
                AssertionType::SystemUser,
                &headers("k"),
                None,
                "someone-else",
                "k",
                "sealed",
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("authority-id"));
    }

    #[tokio::test]
    async fn test_cleanup_task_drops_expired_keys() {
        let signer = Arc::new(KeypairSigner::new(
            SECRET,
            SigningKeyCacheConfig {
                default_ttl: Duration::from_millis(10),
                ..Default::default()
            },
        ));
        let (signing_key, verifying_key) = generate_keypair();
        signer
            .cache()
            .insert(&key_fingerprint(&verifying_key), &signing_key);
        assert_eq!(signer.cache().len(), 1);

        let handle = spawn_cleanup_task(Arc::clone(&signer), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(signer.cache().is_empty());
        assert_eq!(signer.cache().stats().evictions, 1);
    }
}
