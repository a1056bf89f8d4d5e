//! Account document schema
//!
//! Stores the signed account assertion for each authority.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::db::Account;

/// Collection name for accounts
pub const ACCOUNT_COLLECTION: &str = "accounts";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AccountDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub authority_id: String,

    /// Signed account assertion text
    pub assertion: String,
}

impl From<AccountDoc> for Account {
    fn from(doc: AccountDoc) -> Self {
        Account {
            authority_id: doc.authority_id,
            assertion: doc.assertion,
        }
    }
}

impl From<Account> for AccountDoc {
    fn from(account: Account) -> Self {
        AccountDoc {
            _id: None,
            metadata: Metadata::new(),
            authority_id: account.authority_id,
            assertion: account.assertion,
        }
    }
}

impl IntoIndexes for AccountDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "authority_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("authority_id_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for AccountDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
