//! Salt generation and SHA-512-crypt password hashing
//!
//! The system-user assertion carries the password as a crypt(3) style
//! `$6$<salt>$<hash>` string so that the device can install it directly.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use sha_crypt::{sha512_crypt_b64, Sha512Params};

use crate::types::{Result, WardenError};

/// Length of the random string the salt is filtered from
pub const SALT_SOURCE_LEN: usize = 32;

/// SHA-crypt only consumes the first 16 characters of the salt
pub const CRYPT_SALT_MAX_LEN: usize = 16;

/// Default SHA-512-crypt rounds (implicit when no `rounds=` is given)
pub const CRYPT_ROUNDS_DEFAULT: usize = 5_000;

const SHA512_CRYPT_PREFIX: &str = "$6$";

/// Source of random strings used as salt material.
pub trait RandomSource: Send + Sync {
    /// Generate a random string of exactly `len` characters.
    fn generate_random_string(&self, len: usize) -> Result<String>;
}

/// Random strings from the operating system CSPRNG, URL-safe base64 alphabet.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandomSource;

impl RandomSource for OsRandomSource {
    fn generate_random_string(&self, len: usize) -> Result<String> {
        let mut bytes = vec![0u8; (len * 3).div_ceil(4)];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| WardenError::GenerateAssertion(format!("random source failed: {e}")))?;

        let mut encoded = URL_SAFE_NO_PAD.encode(&bytes);
        encoded.truncate(len);
        Ok(encoded)
    }
}

/// Salt material for a SHA-512-crypt hash.
///
/// Holds the random string with every character outside `[A-Za-z0-9]`
/// removed, so it may be shorter than [`SALT_SOURCE_LEN`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptSalt {
    salt: String,
}

impl CryptSalt {
    /// Draw a fresh salt from `source`.
    ///
    /// Fails if the source fails or nothing survives filtering.
    pub fn generate(source: &dyn RandomSource) -> Result<Self> {
        let raw = source.generate_random_string(SALT_SOURCE_LEN)?;
        let salt = Self::from_raw(&raw);

        if salt.salt.is_empty() {
            return Err(WardenError::GenerateAssertion(
                "no salt material left after filtering".into(),
            ));
        }

        Ok(salt)
    }

    /// Build salt material from an arbitrary string, dropping non-alphanumerics.
    pub fn from_raw(raw: &str) -> Self {
        Self {
            salt: raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.salt
    }

    /// crypt(3) setting string: `$6$<salt>$`
    pub fn setting(&self) -> String {
        format!("{SHA512_CRYPT_PREFIX}{}$", self.salt)
    }

    /// The part of the salt SHA-crypt actually consumes (first 16 characters)
    pub fn effective(&self) -> Self {
        Self {
            salt: self.salt.chars().take(CRYPT_SALT_MAX_LEN).collect(),
        }
    }

    /// Hash `password` with SHA-512-crypt, returning `<setting><hash>` where
    /// the setting is that of the effective salt.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let effective = self.effective();

        let params = Sha512Params::new(CRYPT_ROUNDS_DEFAULT)
            .map_err(|e| WardenError::Internal(format!("Invalid SHA-512-crypt params: {e:?}")))?;
        let hash = sha512_crypt_b64(password.as_bytes(), effective.as_str().as_bytes(), &params)
            .map_err(|e| WardenError::Internal(format!("Password hashing failed: {e:?}")))?;

        Ok(format!("{}{hash}", effective.setting()))
    }
}
