//! In-memory datastore
//!
//! Used in development mode (optionally seeded from a JSON fixture file)
//! and as the datastore for tests.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use super::{Account, AuthContext, Datastore, Model};
use crate::types::{Result, WardenError};

/// Seed data for the in-memory store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub models: Vec<Model>,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl Fixtures {
    /// Load fixtures from a JSON file
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read(path).await?;
        let fixtures: Fixtures = serde_json::from_slice(&raw).map_err(|e| {
            WardenError::Config(format!("Invalid fixture file {}: {}", path.display(), e))
        })?;

        info!(
            "Loaded {} model(s) and {} account(s) from {}",
            fixtures.models.len(),
            fixtures.accounts.len(),
            path.display()
        );

        Ok(fixtures)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    models: RwLock<HashMap<i64, Model>>,
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        let models = fixtures.models.into_iter().map(|m| (m.id, m)).collect();
        let accounts = fixtures
            .accounts
            .into_iter()
            .map(|a| (a.authority_id.clone(), a))
            .collect();

        Self {
            models: RwLock::new(models),
            accounts: RwLock::new(accounts),
        }
    }

    pub async fn insert_model(&self, model: Model) {
        self.models.write().await.insert(model.id, model);
    }

    pub async fn insert_account(&self, account: Account) {
        self.accounts
            .write()
            .await
            .insert(account.authority_id.clone(), account);
    }

    pub async fn model_count(&self) -> usize {
        self.models.read().await.len()
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn get_allowed_model(&self, model_id: i64, auth: &AuthContext) -> Result<Model> {
        self.models
            .read()
            .await
            .get(&model_id)
            .filter(|model| auth.allows(model))
            .cloned()
            .ok_or_else(|| WardenError::NotFound(format!("model {model_id}")))
    }

    async fn get_account(&self, authority_id: &str) -> Result<Account> {
        self.accounts
            .read()
            .await
            .get(authority_id)
            .cloned()
            .ok_or_else(|| WardenError::NotFound(format!("account {authority_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> Fixtures {
        Fixtures {
            models: vec![Model {
                id: 5,
                brand_id: "canonical".into(),
                name: "pi3".into(),
                authority_id_user: "canonical".into(),
                key_id_user: "key".into(),
                key_active_user: true,
                sealed_key_user: "sealed".into(),
                assertion_user: "type: account-key".into(),
            }],
            accounts: vec![Account {
                authority_id: "canonical".into(),
                assertion: "type: account".into(),
            }],
        }
    }

    #[tokio::test]
    async fn test_lookup_model_and_account() {
        let store = MemoryStore::from_fixtures(fixtures());

        let model = store
            .get_allowed_model(5, &AuthContext::unrestricted())
            .await
            .unwrap();
        assert_eq!(model.name, "pi3");

        let account = store.get_account("canonical").await.unwrap();
        assert_eq!(account.assertion, "type: account");
    }

    #[tokio::test]
    async fn test_missing_records() {
        let store = MemoryStore::from_fixtures(fixtures());

        let err = store
            .get_allowed_model(6, &AuthContext::unrestricted())
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::NotFound(_)));

        let err = store.get_account("nobody").await.unwrap_err();
        assert!(matches!(err, WardenError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_restricted_context_hides_foreign_models() {
        let store = MemoryStore::from_fixtures(fixtures());
        let ctx = AuthContext {
            username: Some("sam".into()),
            accounts: vec!["other".into()],
        };

        assert!(store.get_allowed_model(5, &ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_fixture_json_shape() {
        let json = r#"{
            "models": [{
                "id": 7,
                "name": "gadget",
                "authority_id_user": "acme",
                "key_id_user": "k",
                "key_active_user": true,
                "sealed_key_user": "s"
            }],
            "accounts": [{"authority_id": "acme", "assertion": "a"}]
        }"#;
        let fixtures: Fixtures = serde_json::from_str(json).unwrap();
        let store = MemoryStore::from_fixtures(fixtures);

        assert_eq!(store.model_count().await, 1);
        let model = store
            .get_allowed_model(7, &AuthContext::unrestricted())
            .await
            .unwrap();
        assert!(model.assertion_user.is_empty());
        assert!(model.brand_id.is_empty());
    }

    #[tokio::test]
    async fn test_load_fixture_file() {
        let path = std::env::temp_dir().join(format!("warden-fixtures-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, serde_json::to_vec(&fixtures()).unwrap()).unwrap();

        let loaded = Fixtures::load(&path).await.unwrap();
        assert_eq!(loaded.models.len(), 1);
        assert_eq!(loaded.accounts[0].authority_id, "canonical");

        std::fs::write(&path, b"{\"models\": 3}").unwrap();
        let err = Fixtures::load(&path).await.unwrap_err();
        assert_eq!(err.code(), "configuration");

        let _ = std::fs::remove_file(path);
    }
}
