//! HTTP server for Warden

pub mod http;

pub use http::{run, AppState};
