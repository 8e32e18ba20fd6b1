use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::error::{ApiError, Result};
use super::response::{Blob, ResponseType};
use super::service::{ApiService, ApiServiceOptions};
use super::transport::Transport;

pub const USER_API_VERSION: &str = "1.0";
pub const USER_SCOPE: &str = "me";
pub const DEFAULT_PHOTO_NAME: &str = "me";
pub const AVATAR_URL: &str = "https://ui-avatars.com/api/?rounded=true&name=";

/// Where a profile photo can be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoReference {
    /// `data:` URL carrying the photo itself.
    Local(String),
    /// Generated avatar used when the photo could not be fetched.
    Avatar(String),
}

impl PhotoReference {
    /// Avatar URL for `name`, URL-escaped.
    pub fn avatar(name: &str) -> Self {
        PhotoReference::Avatar(format!("{}{}", AVATAR_URL, urlencoding::encode(name)))
    }

    pub fn as_str(&self) -> &str {
        match self {
            PhotoReference::Local(url) | PhotoReference::Avatar(url) => url,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, PhotoReference::Avatar(_))
    }
}

impl fmt::Display for PhotoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed-in user endpoints (`/v1.0/me`).
#[derive(Debug, Clone)]
pub struct UserService {
    api: ApiService,
}

impl UserService {
    fn options(token: &str) -> ApiServiceOptions {
        ApiServiceOptions::new()
            .token(token)
            .version(USER_API_VERSION)
            .scope(USER_SCOPE)
    }

    /// Service built from caller options, with the version and scope pinned
    /// to `/v1.0/me`. Base URL, headers and token are kept.
    pub fn from_options(options: ApiServiceOptions) -> Self {
        Self::with_service(ApiService::new(
            options.version(USER_API_VERSION).scope(USER_SCOPE),
        ))
    }

    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        Self::with_service(ApiService::new(Self::options(token).base_url(base_url)))
    }

    pub fn with_transport(token: &str, base_url: &str, transport: Arc<dyn Transport>) -> Self {
        Self::with_service(ApiService::with_transport(
            Self::options(token).base_url(base_url),
            transport,
        ))
    }

    /// Wrap an already configured service.
    pub fn with_service(api: ApiService) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiService {
        &self.api
    }

    /// Current user's profile record, exactly as the server returned it.
    pub async fn get_profile(&self) -> Result<Value> {
        let body = self.api.get("/", None, None).await?;
        Ok(body.into_json().unwrap_or_default())
    }

    /// Raw profile photo.
    pub async fn photo_blob(&self) -> Result<Blob> {
        let body = self
            .api
            .get("/photo/$value", None, Some(ResponseType::Blob.into()))
            .await?;
        body.into_blob()
            .ok_or_else(|| ApiError::Other("photo response is not a blob".to_string()))
    }

    /// Profile photo as a `data:` URL, or an avatar URL built from
    /// `fallback_name` if anything along the way fails.
    pub async fn get_photo(&self, fallback_name: Option<&str>) -> PhotoReference {
        let fallback_name = fallback_name.unwrap_or(DEFAULT_PHOTO_NAME);
        match self.photo_blob().await.and_then(photo_reference) {
            Ok(reference) => reference,
            Err(e) => {
                warn!(error = %e, "Error fetching user photo, using avatar");
                PhotoReference::avatar(fallback_name)
            }
        }
    }
}

fn photo_reference(blob: Blob) -> Result<PhotoReference> {
    if blob.is_empty() {
        return Err(ApiError::Other("photo is empty".to_string()));
    }
    Ok(PhotoReference::Local(blob.to_data_url()))
}
