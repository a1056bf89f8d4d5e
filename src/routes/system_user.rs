//! System-user assertion endpoint
//!
//! `POST /api/assertions` (alias `/v1/assertions`)
//!
//! Body: `{"email", "name", "username", "password", "model", "since"}`.
//! Always answers with a [`SystemUserResponse`]; 200 on success, 400 otherwise.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Incoming};
use hyper::{Request, Response};

use super::response::{json_response, SystemUserResponse};
use crate::assertion::SystemUserRequest;
use crate::server::AppState;
use crate::types::{Result, WardenError};

pub async fn handle_system_user_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>> {
    let body = read_limited(req.into_body(), state.args.max_body_bytes).await;
    let response = match body {
        Ok(bytes) => process_body(&state, &bytes).await,
        Err(e) => reject(&state, None, &e).await,
    };

    respond(&response)
}

/// Collect a request body, refusing anything over `limit` bytes.
///
/// Oversized and unreadable bodies are both `DecodeJson`.
pub async fn read_limited<B>(body: B, limit: usize) -> Result<Bytes>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(body, limit)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| WardenError::DecodeJson(format!("Failed to read request body: {e}")))
}

/// Serialize a response with its status: 200 on success, 400 otherwise
pub fn respond(response: &SystemUserResponse) -> Response<Full<Bytes>> {
    json_response(response.status(), response)
}

/// Decode a system-user request.
///
/// An empty or whitespace-only body is `NoUserData`; anything else that is
/// not a JSON object of the expected shape is `DecodeJson`.
pub fn decode_body(body: &[u8]) -> Result<SystemUserRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(WardenError::NoUserData);
    }

    serde_json::from_slice(body).map_err(|e| WardenError::DecodeJson(e.to_string()))
}

/// Run the issuance pipeline for a raw body and record the outcome.
pub async fn process_body(state: &AppState, body: &[u8]) -> SystemUserResponse {
    let request = match decode_body(body) {
        Ok(request) => request,
        Err(e) => return reject(state, None, &e).await,
    };

    match state.system_user.issue(&request).await {
        Ok(issued) => {
            state
                .audit
                .log_issued(request.model_id, &issued.headers)
                .await;
            SystemUserResponse::success(issued.bundle)
        }
        Err(e) => reject(state, Some(request.model_id), &e).await,
    }
}

async fn reject(state: &AppState, model_id: Option<i64>, error: &WardenError) -> SystemUserResponse {
    state.audit.log_rejected(model_id, error.code()).await;
    SystemUserResponse::error(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::OsRandomSource;
    use crate::config::Args;
    use crate::db::{Account, MemoryStore, Model};
    use crate::logging::AuditLogger;
    use crate::services::SystemUserService;
    use crate::signing::crypto::{generate_keypair, key_fingerprint, seal_signing_key};
    use crate::signing::{KeypairSigner, SigningKeyCacheConfig};
    use clap::Parser;
    use hyper::StatusCode;

    const SECRET: &str = "keystore-test-secret";

    async fn state(active: bool) -> AppState {
        let (signing_key, verifying_key) = generate_keypair();
        let sealed = seal_signing_key(&signing_key, SECRET.as_bytes()).unwrap();

        let store = Arc::new(MemoryStore::new());
        store
            .insert_model(Model {
                id: 5,
                brand_id: "canonical".into(),
                name: "pi3".into(),
                authority_id_user: "canonical".into(),
                key_id_user: key_fingerprint(&verifying_key),
                key_active_user: active,
                sealed_key_user: sealed,
                assertion_user: "MODEL".into(),
            })
            .await;
        store
            .insert_account(Account {
                authority_id: "canonical".into(),
                assertion: "ACCOUNT".into(),
            })
            .await;

        let service = SystemUserService::new(
            store,
            Arc::new(KeypairSigner::new(SECRET, SigningKeyCacheConfig::default())),
            Arc::new(OsRandomSource),
            "16",
        );

        AppState::new(
            Args::parse_from(["warden", "--dev-mode"]),
            service,
            AuditLogger::new("test-node".into()),
        )
    }

    #[test]
    fn test_decode_empty_body() {
        assert!(matches!(decode_body(b""), Err(WardenError::NoUserData)));
        assert!(matches!(decode_body(b"  \n\t"), Err(WardenError::NoUserData)));
    }

    #[test]
    fn test_decode_malformed_body() {
        let err = decode_body(b"{not json").unwrap_err();
        assert_eq!(err.code(), "error-decode-json");

        let err = decode_body(br#"{"model":"five"}"#).unwrap_err();
        assert_eq!(err.code(), "error-decode-json");
    }

    #[test]
    fn test_decode_null_and_trailing_data() {
        let err = decode_body(b"null").unwrap_err();
        assert_eq!(err.code(), "error-decode-json");

        let err = decode_body(br#"{"model":5} trailing"#).unwrap_err();
        assert_eq!(err.code(), "error-decode-json");
    }

    #[test]
    fn test_decode_missing_fields_default() {
        let request = decode_body(br#"{"model":5}"#).unwrap();
        assert_eq!(request.model_id, 5);
        assert!(request.username.is_empty());
    }

    #[tokio::test]
    async fn test_successful_issue() {
        let state = state(true).await;
        let body = br#"{"email":"a@b.com","name":"A B","username":"ab","password":"pw","model":5,"since":""}"#;

        let response = process_body(&state, body).await;

        assert!(response.success, "{}", response.message);
        let assertion = response.assertion.unwrap();
        assert!(assertion.starts_with("ACCOUNT\nMODEL\ntype: system-user\n"));
        assert!(assertion.contains("\nusername: ab\n"));
        assert!(assertion.contains("\nmodels:\n  - pi3\n"));
    }

    #[tokio::test]
    async fn test_inactive_key_response() {
        let state = state(false).await;
        let body = br#"{"email":"a@b.com","name":"A B","username":"ab","password":"pw","model":5,"since":""}"#;

        let response = process_body(&state, body).await;

        assert!(!response.success);
        assert_eq!(response.error_code, "invalid-model");
        assert_eq!(response.message, "The model is linked with an inactive signing-key");
        assert!(response.assertion.is_none());
    }

    #[tokio::test]
    async fn test_empty_body_response() {
        let state = state(true).await;

        let response = process_body(&state, b"").await;

        assert_eq!(response.error_code, "error-user-data");
        assert_eq!(response.message, "No system-user data supplied");
    }

    #[tokio::test]
    async fn test_read_limited_accepts_body_within_limit() {
        let body = Full::new(Bytes::from_static(br#"{"model":5}"#));

        let bytes = read_limited(body, 64).await.unwrap();

        assert_eq!(&bytes[..], br#"{"model":5}"#);
    }

    #[tokio::test]
    async fn test_oversized_body_is_decode_error() {
        let body = Full::new(Bytes::from(vec![b' '; 2048]));

        let err = read_limited(body, 1024).await.unwrap_err();

        assert!(matches!(err, WardenError::DecodeJson(_)));
        assert_eq!(err.code(), "error-decode-json");
    }

    #[tokio::test]
    async fn test_failure_responses_are_bad_request() {
        let state = state(true).await;

        let response = respond(&process_body(&state, b"{broken").await);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_code"], "error-decode-json");
        assert!(json.get("assertion").is_none());

        let response = respond(&SystemUserResponse::error(&WardenError::InvalidModel));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_success_response_is_ok() {
        let state = state(true).await;
        let body = br#"{"email":"a@b.com","name":"A B","username":"ab","password":"pw","model":5,"since":""}"#;

        let response = respond(&process_body(&state, body).await);

        assert_eq!(response.status(), StatusCode::OK);
    }
}
