//! HTTP routes for Warden

pub mod health;
pub mod response;
pub mod system_user;

pub use health::{health_check, version_info};
pub use response::{json_response, not_found_response, preflight_response, SystemUserResponse};
pub use system_user::handle_system_user_request;
