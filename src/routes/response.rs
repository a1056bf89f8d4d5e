//! JSON response helpers shared by all routes

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::types::WardenError;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Body of every system-user response.
///
/// Failures carry an error code and message; `assertion` is present only on
/// success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemUserResponse {
    pub success: bool,
    pub error_code: String,
    pub error_subcode: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion: Option<String>,
}

impl SystemUserResponse {
    pub fn success(assertion: String) -> Self {
        Self {
            success: true,
            error_code: String::new(),
            error_subcode: String::new(),
            message: String::new(),
            assertion: Some(assertion),
        }
    }

    pub fn error(error: &WardenError) -> Self {
        Self {
            success: false,
            error_code: error.code().to_string(),
            error_subcode: error.subcode().to_string(),
            message: error.to_string(),
            assertion: None,
        }
    }

    /// 200 for success, 400 for every failure
    pub fn status(&self) -> StatusCode {
        if self.success {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

fn with_cors(response: &mut Response<Full<Bytes>>) {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|e| {
        error!("Failed to encode response body: {}", e);
        "{}".to_string()
    });

    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSON_CONTENT_TYPE),
    );
    with_cors(&mut response);
    response
}

/// CORS preflight response
pub fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    with_cors(&mut response);
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

pub fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
        "hint": "POST system-user requests to /api/assertions"
    });
    json_response(StatusCode::NOT_FOUND, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let response = SystemUserResponse::success("A\nB\nC".into());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["error_code"], "");
        assert_eq!(json["error_subcode"], "");
        assert_eq!(json["assertion"], "A\nB\nC");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_error_shape_omits_assertion() {
        let response = SystemUserResponse::error(&WardenError::InvalidModel);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error_code"], "invalid-model");
        assert_eq!(json["message"], "Cannot find model with the selected ID");
        assert!(json.get("assertion").is_none());
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_json_response_headers() {
        let response = json_response(StatusCode::OK, &serde_json::json!({"ok": true}));
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not encodable"))
        }
    }

    #[tokio::test]
    async fn test_encoding_failure_falls_back_to_empty_object() {
        use http_body_util::BodyExt;

        let response = json_response(StatusCode::BAD_REQUEST, &Unencodable);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"{}");
    }
}
