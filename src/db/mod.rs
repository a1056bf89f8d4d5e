//! Datastore access for device models and accounts
//!
//! The system-user pipeline only reads from the datastore. Two backends
//! implement [`Datastore`]: MongoDB for production and an in-memory store
//! for development mode and tests.

pub mod memory;
pub mod mongo;
pub mod schemas;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Result;

pub use memory::{Fixtures, MemoryStore};
pub use mongo::{MongoClient, MongoStore};

/// A registered device model, as far as system-user signing is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Numeric model identifier used by API callers
    pub id: i64,

    /// Brand the model belongs to
    #[serde(default)]
    pub brand_id: String,

    /// Model name, e.g. "pi3-core"
    pub name: String,

    /// Authority that signs system-user assertions for this model
    pub authority_id_user: String,

    /// Fingerprint of the system-user signing key
    pub key_id_user: String,

    /// Whether the system-user signing key may be used
    #[serde(default)]
    pub key_active_user: bool,

    /// Sealed private key for system-user signing
    pub sealed_key_user: String,

    /// Previously signed assertion for the system-user signing key
    #[serde(default)]
    pub assertion_user: String,
}

/// An account with its signed account assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub authority_id: String,
    pub assertion: String,
}

/// Who is asking for a model.
///
/// The default (empty) context is unrestricted: every model resolves.
/// A context carrying a username only sees models whose system-user
/// authority is one of its accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub username: Option<String>,
    pub accounts: Vec<String>,
}

impl AuthContext {
    /// Context used by operations that do not enforce entitlement
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn is_unrestricted(&self) -> bool {
        self.username.is_none()
    }

    /// Whether this context may see `model`
    pub fn allows(&self, model: &Model) -> bool {
        self.is_unrestricted()
            || self
                .accounts
                .iter()
                .any(|account| account == &model.authority_id_user)
    }
}

/// Read access to models and accounts.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Find a model the given context is entitled to.
    ///
    /// Returns `WardenError::NotFound` when no such model is visible.
    async fn get_allowed_model(&self, model_id: i64, auth: &AuthContext) -> Result<Model>;

    /// Find the account for an authority.
    async fn get_account(&self, authority_id: &str) -> Result<Account>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(authority: &str) -> Model {
        Model {
            id: 1,
            name: "pi3".into(),
            authority_id_user: authority.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_context_sees_everything() {
        let ctx = AuthContext::unrestricted();
        assert!(ctx.is_unrestricted());
        assert!(ctx.allows(&model("canonical")));
        assert!(ctx.allows(&model("someone-else")));
    }

    #[test]
    fn test_user_context_is_scoped_to_accounts() {
        let ctx = AuthContext {
            username: Some("sam".into()),
            accounts: vec!["canonical".into()],
        };
        assert!(!ctx.is_unrestricted());
        assert!(ctx.allows(&model("canonical")));
        assert!(!ctx.allows(&model("someone-else")));
    }
}
