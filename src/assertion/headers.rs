//! System-user assertion headers
//!
//! Builds the structured header record for a system-user assertion from a
//! request and its resolved model. The record is flattened into an ordered
//! [`HeaderMap`] only when it is handed to the signer.
//!
//! # Validity window
//!
//! `since` is taken from the request when it is a valid RFC 3339 timestamp.
//! The value is not trimmed. Anything else (including an empty string) is
//! silently replaced by the current UTC time; [`SinceSource`] records which
//! branch was taken.
//! `until` is always `since` plus 8760 hours, independent of leap years.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use super::{AssertionType, HeaderMap, SystemUserRequest, SYSTEM_USER_REVISION};
use crate::auth::{CryptSalt, RandomSource};
use crate::db::Model;
use crate::types::Result;

/// Validity of a system-user assertion (365 days of 24 hours)
pub const VALIDITY_PERIOD_HOURS: i64 = 24 * 365;

/// Where the `since` timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinceSource {
    /// Parsed from the request
    Parsed,
    /// Request value missing or unparseable, current time used instead
    Defaulted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub source: SinceSource,
}

impl ValidityWindow {
    /// Resolve the window from a caller-supplied `since` value.
    pub fn resolve(raw_since: &str, now: DateTime<Utc>) -> Self {
        let (since, source) = match DateTime::parse_from_rfc3339(raw_since) {
            Ok(parsed) => (parsed.with_timezone(&Utc), SinceSource::Parsed),
            Err(_) => (now, SinceSource::Defaulted),
        };

        Self {
            since,
            until: since + Duration::hours(VALIDITY_PERIOD_HOURS),
            source,
        }
    }

    pub fn since_rfc3339(&self) -> String {
        self.since.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn until_rfc3339(&self) -> String {
        self.until.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Header fields of a system-user assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemUserHeaders {
    pub revision: String,
    pub authority_id: String,
    pub brand_id: String,
    pub email: String,
    pub name: String,
    pub username: String,
    /// SHA-512-crypt hash of the requested password
    pub password: String,
    pub models: Vec<String>,
    pub series: Vec<String>,
    pub validity: ValidityWindow,
    pub sign_key_sha3_384: String,
}

impl SystemUserHeaders {
    /// Build the headers for `request` against `model`.
    ///
    /// Fails with `GenerateAssertion` when no salt can be drawn from `random`;
    /// nothing is signed in that case.
    pub fn build(
        request: &SystemUserRequest,
        model: &Model,
        series: &str,
        random: &dyn RandomSource,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let salt = CryptSalt::generate(random)?;
        let password = salt.hash_password(&request.password)?;

        Ok(Self {
            revision: SYSTEM_USER_REVISION.to_string(),
            authority_id: model.authority_id_user.clone(),
            brand_id: model.authority_id_user.clone(),
            email: request.email.clone(),
            name: request.name.clone(),
            username: request.username.clone(),
            password,
            models: vec![model.name.clone()],
            series: vec![series.to_string()],
            validity: ValidityWindow::resolve(&request.since, now),
            sign_key_sha3_384: model.key_id_user.clone(),
        })
    }

    /// Flatten into the ordered mapping the signer consumes
    pub fn to_header_map(&self) -> HeaderMap {
        vec![
            ("type".into(), AssertionType::SystemUser.name().into()),
            ("revision".into(), self.revision.clone().into()),
            ("authority-id".into(), self.authority_id.clone().into()),
            ("brand-id".into(), self.brand_id.clone().into()),
            ("email".into(), self.email.clone().into()),
            ("name".into(), self.name.clone().into()),
            ("username".into(), self.username.clone().into()),
            ("password".into(), self.password.clone().into()),
            ("models".into(), self.models.clone().into()),
            ("series".into(), self.series.clone().into()),
            ("since".into(), self.validity.since_rfc3339().into()),
            ("until".into(), self.validity.until_rfc3339().into()),
            ("sign-key-sha3-384".into(), self.sign_key_sha3_384.clone().into()),
        ]
    }
}
