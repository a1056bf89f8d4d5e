//! Issuance audit log
//!
//! Records one JSONL event per system-user request. Writing is best effort:
//! serialization or I/O failures are logged and never reach the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::assertion::headers::SystemUserHeaders;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A signed system-user bundle was returned
    AssertionIssued,
    /// The request failed with an error code
    AssertionRejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    /// Instance that handled the request
    pub host_id: String,
    /// Requested model (absent when the body never decoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: EventType, host_id: String) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            host_id,
            model_id: None,
            username: None,
            authority_id: None,
            since: None,
            until: None,
            error_code: None,
        }
    }

    pub fn with_model(mut self, model_id: Option<i64>) -> Self {
        self.model_id = model_id;
        self
    }

    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    /// Copy the identifying fields of an issued assertion
    pub fn with_headers(mut self, headers: &SystemUserHeaders) -> Self {
        self.username = Some(headers.username.clone());
        self.authority_id = Some(headers.authority_id.clone());
        self.since = Some(headers.validity.since_rfc3339());
        self.until = Some(headers.validity.until_rfc3339());
        self
    }

    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Audit logger writing events to a JSONL file
///
/// Without a file configured every call is a no-op.
#[derive(Clone)]
pub struct AuditLogger {
    inner: Arc<Mutex<AuditLoggerInner>>,
    host_id: String,
}

struct AuditLoggerInner {
    writer: Option<BufWriter<File>>,
}

impl AuditLogger {
    pub fn new(host_id: String) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AuditLoggerInner { writer: None })),
            host_id,
        }
    }

    /// Start appending events to `path`
    pub async fn init_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut inner = self.inner.lock().await;
        inner.writer = Some(BufWriter::new(file));

        info!("Audit logging initialized to {}", path.display());
        Ok(())
    }

    pub async fn log(&self, event: AuditEvent) {
        let jsonl = match event.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize audit event: {}", e);
                return;
            }
        };

        let mut inner = self.inner.lock().await;
        if let Some(ref mut writer) = inner.writer {
            if let Err(e) = writeln!(writer, "{}", jsonl) {
                error!("Failed to write audit event: {}", e);
            }
            if let Err(e) = writer.flush() {
                error!("Failed to flush audit log: {}", e);
            }
        }
    }

    pub async fn log_issued(&self, model_id: i64, headers: &SystemUserHeaders) {
        let event = AuditEvent::new(EventType::AssertionIssued, self.host_id.clone())
            .with_model(Some(model_id))
            .with_headers(headers);
        self.log(event).await;
    }

    pub async fn log_rejected(&self, model_id: Option<i64>, code: &str) {
        let event = AuditEvent::new(EventType::AssertionRejected, self.host_id.clone())
            .with_model(model_id)
            .with_error_code(code);
        self.log(event).await;
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }
}
