//! System-user assertion issuance
//!
//! ## Flow
//!
//! 1. Resolve the requested model (unrestricted lookup)
//! 2. Refuse models whose system-user signing key is inactive
//! 3. Load the account assertion for the model's user authority
//! 4. Build headers: salted password hash, validity window, key fingerprint
//! 5. Sign with the model's sealed key
//! 6. Bundle account, model and system-user assertions
//!
//! Each step short-circuits with its own error code. The signer is never
//! called for a model that fails steps 1 to 4.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::assertion::{compose, AssertionType, SystemUserHeaders, SystemUserRequest};
use crate::auth::RandomSource;
use crate::db::{AuthContext, Datastore, Model};
use crate::logging;
use crate::signing::AssertionSigner;
use crate::types::{Result, WardenError, USER_LOG_CATEGORY};

/// A successfully issued system-user bundle
#[derive(Debug, Clone)]
pub struct IssuedAssertion {
    /// Account, model and system-user assertions joined by newlines
    pub bundle: String,
    /// Headers that went into the signed system-user assertion
    pub headers: SystemUserHeaders,
}

pub struct SystemUserService {
    datastore: Arc<dyn Datastore>,
    signer: Arc<dyn AssertionSigner>,
    random: Arc<dyn RandomSource>,
    series: String,
}

impl SystemUserService {
    pub fn new(
        datastore: Arc<dyn Datastore>,
        signer: Arc<dyn AssertionSigner>,
        random: Arc<dyn RandomSource>,
        series: impl Into<String>,
    ) -> Self {
        Self {
            datastore,
            signer,
            random,
            series: series.into(),
        }
    }

    pub fn series(&self) -> &str {
        &self.series
    }

    /// Issue a system-user assertion for `request`.
    pub async fn issue(&self, request: &SystemUserRequest) -> Result<IssuedAssertion> {
        self.issue_at(request, Utc::now()).await
    }

    /// Issue with an explicit clock, used when `since` falls back to now.
    pub async fn issue_at(
        &self,
        request: &SystemUserRequest,
        now: DateTime<Utc>,
    ) -> Result<IssuedAssertion> {
        self.run(request, now).await.inspect_err(|e| {
            logging::message(USER_LOG_CATEGORY, e.code(), &e.to_string());
        })
    }

    async fn run(&self, request: &SystemUserRequest, now: DateTime<Utc>) -> Result<IssuedAssertion> {
        let model = self.resolve_model(request.model_id).await?;

        if !model.key_active_user {
            return Err(WardenError::InactiveSigningKey);
        }

        let account = self
            .datastore
            .get_account(&model.authority_id_user)
            .await
            .map_err(|e| WardenError::AccountAssertions(e.to_string()))?;

        let headers =
            SystemUserHeaders::build(request, &model, &self.series, self.random.as_ref(), now)?;

        let signed = self
            .signer
            .sign_assertion(
                AssertionType::SystemUser,
                &headers.to_header_map(),
                None,
                &model.authority_id_user,
                &model.key_id_user,
                &model.sealed_key_user,
            )
            .await
            .map_err(|e| match e {
                WardenError::SigningAssertion(_) => e,
                other => WardenError::SigningAssertion(other.to_string()),
            })?;

        info!(
            model_id = model.id,
            model = %model.name,
            username = %headers.username,
            since = %headers.validity.since_rfc3339(),
            "Issued system-user assertion"
        );

        Ok(IssuedAssertion {
            bundle: compose(&account.assertion, &model.assertion_user, &signed.encode()),
            headers,
        })
    }

    /// Look up the model without entitlement checks.
    ///
    /// The lookup deliberately passes an empty auth context, so any caller
    /// can request an assertion for any model by id. Every lookup failure,
    /// including datastore outages, surfaces as `invalid-model`.
    async fn resolve_model(&self, model_id: i64) -> Result<Model> {
        self.datastore
            .get_allowed_model(model_id, &AuthContext::unrestricted())
            .await
            .map_err(|e| {
                debug!(model_id, error = %e, "Model lookup failed");
                WardenError::InvalidModel
            })
    }
}
