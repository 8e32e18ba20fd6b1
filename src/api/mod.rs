pub mod error;
pub mod headers;
pub mod response;
pub mod service;
pub mod transport;
pub mod user;

pub use error::*;
pub use headers::*;
pub use response::*;
pub use service::*;
pub use transport::*;
pub use user::*;

/// Graph host used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://graph.microsoft.com";
