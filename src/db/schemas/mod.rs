//! Database schemas for Warden
//!
//! Defines MongoDB document structures for device models and accounts.

mod account;
mod metadata;
mod model;

pub use account::{AccountDoc, ACCOUNT_COLLECTION};
pub use metadata::Metadata;
pub use model::{ModelDoc, MODEL_COLLECTION};
