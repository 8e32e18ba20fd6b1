//! graph-shaper - minimal client for Microsoft Graph style REST APIs
//!
//! [`ApiService`] shapes URLs and headers, dispatches through a pluggable
//! transport and decodes bodies by declared response type. [`UserService`]
//! builds the signed-in user's profile and photo operations on top of it.

pub mod api;
pub mod config;
pub mod types;

pub use api::{ApiError, ApiService, ApiServiceOptions, UserService};
pub use config::Config;
