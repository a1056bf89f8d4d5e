//! Configuration for Warden
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Secret used for sealing keys when running in dev mode without one
const DEV_KEYSTORE_SECRET: &str = "dev-only-insecure-keystore-secret";

/// Warden - system-user assertion service
#[derive(Parser, Debug, Clone)]
#[command(name = "warden")]
#[command(about = "Issues signed system-user assertions for device models")]
pub struct Args {
    /// Unique node identifier for this instance (recorded in the audit log)
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (in-memory datastore fallback, dev keystore secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "warden")]
    pub mongodb_db: String,

    /// Secret protecting sealed signing keys (required in production)
    #[arg(long, env = "KEYSTORE_SECRET", hide_env_values = true)]
    pub keystore_secret: Option<String>,

    /// Series placed in every system-user assertion
    #[arg(long, env = "SERIES", default_value = "16")]
    pub series: String,

    /// JSON file with models and accounts to load at startup
    #[arg(long, env = "FIXTURES")]
    pub fixtures: Option<PathBuf>,

    /// JSONL file receiving one audit event per issuance request
    #[arg(long, env = "AUDIT_LOG")]
    pub audit_log: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "10240")]
    pub max_body_bytes: usize,

    /// How long an unsealed signing key stays cached
    #[arg(long, env = "KEY_CACHE_TTL_SECONDS", default_value = "3600")]
    pub key_cache_ttl_seconds: u64,
}

impl Args {
    /// Effective keystore secret (falls back to a fixed value in dev mode)
    pub fn keystore_secret(&self) -> Option<String> {
        match &self.keystore_secret {
            Some(secret) => Some(secret.clone()),
            None if self.dev_mode => Some(DEV_KEYSTORE_SECRET.to_string()),
            None => None,
        }
    }

    pub fn key_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.key_cache_ttl_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.keystore_secret.is_none() {
            return Err("KEYSTORE_SECRET is required in production mode".to_string());
        }

        if matches!(&self.keystore_secret, Some(s) if s.trim().is_empty()) {
            return Err("KEYSTORE_SECRET must not be empty".to_string());
        }

        if self.series.trim().is_empty() {
            return Err("SERIES must not be empty".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be greater than zero".to_string());
        }

        if self.key_cache_ttl_seconds == 0 {
            return Err("KEY_CACHE_TTL_SECONDS must be greater than zero".to_string());
        }

        Ok(())
    }
}
