//! Services layer for Warden
//!
//! Business logic that coordinates the datastore, the credential builder
//! and the signer.
//!
//! ## Services
//!
//! - **SystemUser**: resolves a model, builds and signs a system-user
//!   assertion and bundles it with the account and model assertions

pub mod system_user;

pub use system_user::{IssuedAssertion, SystemUserService};
