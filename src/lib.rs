//! Warden - system-user assertion service
//!
//! Issues signed system-user assertions that let a device create a local
//! user account. A request names a device model; Warden checks that the
//! model's signing key is active, builds the assertion headers (salted
//! password hash, one-year validity window), has the model's sealed key
//! sign them and returns the signed assertion bundled with the account
//! and model assertions.
//!
//! ## Modules
//!
//! - **assertion**: header construction and bundle composition
//! - **auth**: salt generation and SHA-512-crypt password hashing
//! - **db**: model and account lookup (MongoDB or in-memory)
//! - **signing**: sealed Ed25519 keys and the assertion signer
//! - **services**: the issuance pipeline
//! - **routes** / **server**: the HTTP surface

pub mod assertion;
pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod routes;
pub mod server;
pub mod services;
pub mod signing;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, WardenError};
