//! System-user assertion construction
//!
//! - [`headers`]: builds the header record for a system-user assertion
//!   (identity, salted password, validity window, signing key)
//! - [`composite`]: joins the account, model and system-user assertions
//!   into the bundle returned to callers

pub mod composite;
pub mod headers;

use serde::{Deserialize, Serialize};

pub use composite::compose;
pub use headers::{SinceSource, SystemUserHeaders, ValidityWindow, VALIDITY_PERIOD_HOURS};

/// Protocol revision for newly issued system-user assertions
pub const SYSTEM_USER_REVISION: &str = "1";

/// Assertion types this service signs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionType {
    SystemUser,
}

impl AssertionType {
    pub fn name(&self) -> &'static str {
        match self {
            AssertionType::SystemUser => "system-user",
        }
    }
}

/// A header value as handed to the signer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Text(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Text(value)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        HeaderValue::List(values)
    }
}

/// Ordered header mapping at the signer boundary
pub type HeaderMap = Vec<(String, HeaderValue)>;

/// Look up a header by name
pub fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a HeaderValue> {
    headers
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

/// Request body for a system-user assertion.
///
/// Missing fields default to empty values, matching the permissive decoding
/// callers already rely on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemUserRequest {
    pub email: String,
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(rename = "model")]
    pub model_id: i64,
    pub since: String,
}
