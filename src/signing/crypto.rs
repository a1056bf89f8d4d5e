//! Cryptographic primitives for sealed assertion-signing keys.
//!
//! # Algorithms
//!
//! - **Signing keys**: Ed25519
//! - **Key fingerprint**: SHA3-384 over the public key, URL-safe base64
//! - **Key derivation**: Argon2id from the keystore secret and a per-key salt
//! - **Sealing**: ChaCha20-Poly1305 over the 32-byte private key seed
//!
//! # Sealed key layout
//!
//! `base64(salt[16] || nonce[12] || ciphertext[48])`

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD},
    Engine as _,
};
use chacha20poly1305::{aead::Aead, ChaCha20Poly1305, Key, KeyInit, Nonce};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha3::{Digest, Sha3_384};
use zeroize::Zeroizing;

use crate::types::{Result, WardenError};

/// Argon2id memory cost in KiB (64 MB)
pub const ARGON2_MEMORY_KB: u32 = 65536;

/// Argon2id iteration count
pub const ARGON2_ITERATIONS: u32 = 3;

/// Argon2id parallelism (threads)
pub const ARGON2_PARALLELISM: u32 = 4;

pub const SALT_LEN: usize = 16;

pub const NONCE_LEN: usize = 12;

/// Ed25519 private key seed length
pub const SEED_LEN: usize = 32;

/// ChaCha20-Poly1305 auth tag length
pub const AUTH_TAG_LEN: usize = 16;

const SEALED_LEN: usize = SALT_LEN + NONCE_LEN + SEED_LEN + AUTH_TAG_LEN;

/// Generate a new Ed25519 signing keypair from the OS CSPRNG.
pub fn generate_keypair() -> (SigningKey, VerifyingKey) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();
    (signing_key, verifying_key)
}

/// Fingerprint of a public key as used in `sign-key-sha3-384` headers.
pub fn key_fingerprint(verifying_key: &VerifyingKey) -> String {
    let digest = Sha3_384::digest(verifying_key.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Derive the 256-bit key encryption key for one sealed key.
pub fn derive_key_encryption_key(secret: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    let params = Params::new(
        ARGON2_MEMORY_KB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(32),
    )
    .map_err(|e| WardenError::Internal(format!("Invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(secret, salt, &mut key[..])
        .map_err(|e| WardenError::Internal(format!("Key derivation failed: {e}")))?;

    Ok(key)
}

/// Seal a signing key under the keystore secret.
pub fn seal_signing_key(signing_key: &SigningKey, secret: &[u8]) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let kek = derive_key_encryption_key(secret, &salt)?;
    let seed = Zeroizing::new(signing_key.to_bytes());

    let cipher = ChaCha20Poly1305::new(Key::from_slice(&kek[..]));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), seed.as_slice())
        .map_err(|e| WardenError::Internal(format!("Encryption failed: {e}")))?;

    let mut sealed = Vec::with_capacity(SEALED_LEN);
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(sealed))
}

/// Open a sealed signing key.
///
/// Fails if the encoding is invalid, the secret is wrong or the
/// ciphertext was tampered with.
pub fn unseal_signing_key(sealed: &str, secret: &[u8]) -> Result<SigningKey> {
    let raw = BASE64
        .decode(sealed.trim())
        .map_err(|e| WardenError::SigningAssertion(format!("Invalid sealed key encoding: {e}")))?;

    if raw.len() != SEALED_LEN {
        return Err(WardenError::SigningAssertion(format!(
            "Invalid sealed key length: expected {}, got {}",
            SEALED_LEN,
            raw.len()
        )));
    }

    let (salt, rest) = raw.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let kek = derive_key_encryption_key(secret, salt)?;
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&kek[..]));
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| WardenError::SigningAssertion("Failed to unseal signing key".into()))?,
    );

    let seed: [u8; SEED_LEN] = plaintext.as_slice().try_into().map_err(|_| {
        WardenError::SigningAssertion(format!(
            "Invalid unsealed key length: expected {}, got {}",
            SEED_LEN,
            plaintext.len()
        ))
    })?;
    let seed = Zeroizing::new(seed);

    Ok(SigningKey::from_bytes(&seed))
}
