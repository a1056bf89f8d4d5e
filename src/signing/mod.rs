//! Assertion signing
//!
//! The system-user pipeline talks to the signer through [`AssertionSigner`];
//! [`KeypairSigner`] is the implementation backed by sealed Ed25519 keys.
//!
//! # Encoded form
//!
//! ```text
//! type: system-user
//! authority-id: canonical
//! models:
//!   - pi3
//! sign-key-sha3-384: <fingerprint>
//!
//! <base64 signature>
//! ```
//!
//! Headers appear in the order given, list values as `  - item` lines.
//! A body, when present, is announced with `body-length` and follows the
//! headers after a blank line. The signature covers everything before the
//! final blank line.

pub mod cache;
pub mod crypto;
pub mod keypair;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::assertion::{AssertionType, HeaderMap, HeaderValue};
use crate::types::{Result, WardenError};

pub use cache::{SigningKeyCache, SigningKeyCacheConfig};
pub use keypair::{spawn_cleanup_task, KeypairSigner};

/// Signs assertion headers with a model's sealed key.
#[async_trait]
pub trait AssertionSigner: Send + Sync {
    /// Sign `headers` (and optional `body`) on behalf of `authority_id`.
    ///
    /// Any key-access or cryptographic failure is a `SigningAssertion` error.
    async fn sign_assertion(
        &self,
        assertion_type: AssertionType,
        headers: &HeaderMap,
        body: Option<&[u8]>,
        authority_id: &str,
        key_id: &str,
        sealed_key: &str,
    ) -> Result<SignedAssertion>;
}

/// A signed assertion ready to be encoded
#[derive(Debug, Clone)]
pub struct SignedAssertion {
    content: String,
    signature: Vec<u8>,
}

impl SignedAssertion {
    pub(crate) fn new(content: String, signature: Vec<u8>) -> Self {
        Self { content, signature }
    }

    /// Canonical text form
    pub fn encode(&self) -> String {
        format!("{}\n\n{}", self.content, BASE64.encode(&self.signature))
    }
}

/// Render headers and body into the signed content.
pub fn render_content(headers: &HeaderMap, body: Option<&[u8]>) -> Result<String> {
    let mut lines = Vec::with_capacity(headers.len() + 2);

    for (name, value) in headers {
        check_header_name(name)?;
        match value {
            HeaderValue::Text(text) => {
                check_single_line(name, text)?;
                lines.push(format!("{name}: {text}"));
            }
            HeaderValue::List(items) => {
                lines.push(format!("{name}:"));
                for item in items {
                    check_single_line(name, item)?;
                    lines.push(format!("  - {item}"));
                }
            }
        }
    }

    let mut content = match body {
        Some(body) => {
            lines.push(format!("body-length: {}", body.len()));
            let body = std::str::from_utf8(body).map_err(|_| {
                WardenError::SigningAssertion("assertion body must be UTF-8".into())
            })?;
            format!("{}\n\n{}", lines.join("\n"), body)
        }
        None => lines.join("\n"),
    };
    content.shrink_to_fit();

    Ok(content)
}

/// Check an encoded assertion against a public key.
pub fn verify_encoded(encoded: &str, verifying_key: &VerifyingKey) -> Result<()> {
    let (content, signature) = encoded
        .rsplit_once("\n\n")
        .ok_or_else(|| WardenError::SigningAssertion("missing signature block".into()))?;

    let raw = BASE64
        .decode(signature.trim())
        .map_err(|e| WardenError::SigningAssertion(format!("invalid signature encoding: {e}")))?;
    let signature = Signature::from_slice(&raw)
        .map_err(|e| WardenError::SigningAssertion(format!("invalid signature: {e}")))?;

    verifying_key
        .verify(content.as_bytes(), &signature)
        .map_err(|_| WardenError::SigningAssertion("signature does not verify".into()))
}

fn check_header_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if valid {
        Ok(())
    } else {
        Err(WardenError::SigningAssertion(format!("invalid header name {name:?}")))
    }
}

fn check_single_line(name: &str, value: &str) -> Result<()> {
    if value.contains('\n') {
        return Err(WardenError::SigningAssertion(format!(
            "header {name:?} must be a single line"
        )));
    }
    Ok(())
}
