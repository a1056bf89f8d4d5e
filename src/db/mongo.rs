//! MongoDB client, collection wrapper and datastore backend
//!
//! Pattern adapted from holo-host/rust/util_libs/db/src/mongodb

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::{options::IndexOptions, Client, Collection, IndexModel};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::db::schemas::{
    AccountDoc, Metadata, ModelDoc, ACCOUNT_COLLECTION, MODEL_COLLECTION,
};
use crate::db::{Account, AuthContext, Datastore, Fixtures, Model};
use crate::types::{Result, WardenError};

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| WardenError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| WardenError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + Default + IntoIndexes + MutMetadata,
{
    /// Create a new collection and apply indexes
    pub async fn new(client: &Client, db_name: &str, collection_name: &str) -> Result<Self> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<()> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| WardenError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId> {
        let metadata = item.mut_metadata();
        metadata.is_deleted = false;
        metadata.created_at = Some(DateTime::now());
        metadata.updated_at = Some(DateTime::now());

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| WardenError::Database(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| WardenError::Database("Failed to get inserted ID".into()))
    }

    /// Find one live (not soft-deleted) document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        self.inner
            .find_one(full_filter)
            .await
            .map_err(|e| WardenError::Database(format!("Find failed: {}", e)))
    }
}

/// Datastore backed by the `models` and `accounts` collections
#[derive(Clone)]
pub struct MongoStore {
    models: MongoCollection<ModelDoc>,
    accounts: MongoCollection<AccountDoc>,
}

impl MongoStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            models: client.collection(MODEL_COLLECTION).await?,
            accounts: client.collection(ACCOUNT_COLLECTION).await?,
        })
    }

    /// Insert fixture records that are not stored yet
    pub async fn seed(&self, fixtures: Fixtures) -> Result<usize> {
        let mut inserted = 0;

        for model in fixtures.models {
            if self.models.find_one(doc! { "model_id": model.id }).await?.is_none() {
                self.models.insert_one(ModelDoc::from(model)).await?;
                inserted += 1;
            }
        }

        for account in fixtures.accounts {
            let filter = doc! { "authority_id": account.authority_id.as_str() };
            if self.accounts.find_one(filter).await?.is_none() {
                self.accounts.insert_one(AccountDoc::from(account)).await?;
                inserted += 1;
            }
        }

        Ok(inserted)
    }
}

#[async_trait]
impl Datastore for MongoStore {
    async fn get_allowed_model(&self, model_id: i64, auth: &AuthContext) -> Result<Model> {
        let mut filter = doc! { "model_id": model_id };
        if !auth.is_unrestricted() {
            filter.insert("authority_id_user", doc! { "$in": auth.accounts.clone() });
        }

        debug!(model_id, unrestricted = auth.is_unrestricted(), "Looking up model");

        self.models
            .find_one(filter)
            .await?
            .map(Model::from)
            .ok_or_else(|| WardenError::NotFound(format!("model {model_id}")))
    }

    async fn get_account(&self, authority_id: &str) -> Result<Account> {
        self.accounts
            .find_one(doc! { "authority_id": authority_id })
            .await?
            .map(Account::from)
            .ok_or_else(|| WardenError::NotFound(format!("account {authority_id}")))
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running MongoDB instance
}
