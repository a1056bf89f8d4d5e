//! Device model document schema
//!
//! Stores the model record together with its system-user signing key.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::db::Model;

/// Collection name for device models
pub const MODEL_COLLECTION: &str = "models";

/// Device model document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ModelDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Numeric model identifier exposed to API callers
    pub model_id: i64,

    #[serde(default)]
    pub brand_id: String,

    /// Model name
    pub name: String,

    /// Authority for system-user assertions
    pub authority_id_user: String,

    /// SHA3-384 fingerprint of the system-user key
    pub key_id_user: String,

    #[serde(default)]
    pub key_active_user: bool,

    /// Sealed system-user private key
    pub sealed_key_user: String,

    /// Signed assertion for the system-user key
    #[serde(default)]
    pub assertion_user: String,
}

impl From<ModelDoc> for Model {
    fn from(doc: ModelDoc) -> Self {
        Model {
            id: doc.model_id,
            brand_id: doc.brand_id,
            name: doc.name,
            authority_id_user: doc.authority_id_user,
            key_id_user: doc.key_id_user,
            key_active_user: doc.key_active_user,
            sealed_key_user: doc.sealed_key_user,
            assertion_user: doc.assertion_user,
        }
    }
}

impl From<Model> for ModelDoc {
    fn from(model: Model) -> Self {
        ModelDoc {
            _id: None,
            metadata: Metadata::new(),
            model_id: model.id,
            brand_id: model.brand_id,
            name: model.name,
            authority_id_user: model.authority_id_user,
            key_id_user: model.key_id_user,
            key_active_user: model.key_active_user,
            sealed_key_user: model.sealed_key_user,
            assertion_user: model.assertion_user,
        }
    }
}

impl IntoIndexes for ModelDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "model_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("model_id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "authority_id_user": 1 },
                Some(
                    IndexOptions::builder()
                        .name("authority_id_user_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ModelDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
