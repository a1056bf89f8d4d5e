//! Credential secrets for system-user assertions
//!
//! Provides:
//! - A fallible cryptographically secure random string source
//! - Salt material filtering and SHA-512-crypt password hashing

pub mod password;

pub use password::{CryptSalt, OsRandomSource, RandomSource, SALT_SOURCE_LEN};
