use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::error::{ApiError, Result};
use super::headers::HeaderSet;
use super::response::{decode, RequestConfig, ResponseBody, ResponseType};
use super::transport::{ReqwestTransport, Transport, TransportRequest};
use super::DEFAULT_BASE_URL;

/// Construction options for [`ApiService`].
///
/// Nothing here is validated, but an empty string counts as not supplied.
#[derive(Debug, Clone, Default)]
pub struct ApiServiceOptions {
    /// Falls back to [`DEFAULT_BASE_URL`] when absent.
    pub base_url: Option<String>,
    /// Appended to the base URL as `/v{version}`.
    pub version: Option<String>,
    /// Prefixed to every request path as `/{scope}`.
    pub scope: Option<String>,
    /// Merged over the default `Content-Type` and `Authorization` headers.
    pub headers: HeaderSet,
    /// Sent verbatim as `Authorization: Bearer <token>`.
    pub token: Option<String>,
}

impl ApiServiceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Base REST client: shapes URLs and headers, dispatches through a
/// [`Transport`] and decodes bodies by [`ResponseType`].
///
/// Immutable after construction; clones share the transport.
#[derive(Clone)]
pub struct ApiService {
    base_url: String,
    scope: Option<String>,
    headers: HeaderSet,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ApiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiService")
            .field("base_url", &self.base_url)
            .field("scope", &self.scope)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl ApiService {
    /// Create a service talking HTTP through reqwest.
    pub fn new(options: ApiServiceOptions) -> Self {
        Self::with_transport(options, Arc::new(ReqwestTransport::new()))
    }

    /// Create a service over a caller-provided transport.
    pub fn with_transport(options: ApiServiceOptions, transport: Arc<dyn Transport>) -> Self {
        let ApiServiceOptions {
            base_url,
            version,
            scope,
            headers: extra_headers,
            token,
        } = options;
        // Empty strings count as not supplied.
        let present = |value: Option<String>| value.filter(|v| !v.is_empty());
        let (base_url, version, scope, token) =
            (present(base_url), present(version), present(scope), present(token));

        let mut headers = HeaderSet::new();
        headers.insert("Content-Type", "application/json");
        // A missing token is sent as the literal "null", which servers reject as unauthenticated.
        headers.insert(
            "Authorization",
            format!("Bearer {}", token.as_deref().unwrap_or("null")),
        );
        headers.merge(&extra_headers);

        let root = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = match version {
            Some(version) => format!("{}/v{}", root, version),
            None => root,
        };

        Self {
            base_url,
            scope,
            headers,
            transport,
        }
    }

    /// Base URL with the version segment applied.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Headers sent with every request before per-call overrides.
    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Full request URL for `path`. Slashes are not normalized.
    pub fn build_url(&self, path: &str) -> String {
        match &self.scope {
            Some(scope) => format!("{}/{}{}", self.base_url, scope, path),
            None => format!("{}{}", self.base_url, path),
        }
    }

    /// Send a request and decode the successful body as `config.response_type`.
    ///
    /// A non-2xx status fails with [`ApiError::Transport`]. A body that cannot
    /// be decoded is not an error: the empty value of the response type is
    /// returned instead (`{}` for JSON).
    pub async fn request<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        custom_headers: Option<&HeaderSet>,
        config: Option<RequestConfig>,
    ) -> Result<ResponseBody>
    where
        B: Serialize + ?Sized,
    {
        let response_type = config.unwrap_or_default().response_type;
        let request = TransportRequest {
            method,
            url: self.build_url(path),
            headers: self.headers.merged(custom_headers),
            body: body.map(serde_json::to_string).transpose()?,
        };

        debug!(method = %request.method, url = %request.url, %response_type, "sending request");
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(ApiError::Transport {
                status: response.status,
                body: response.text(),
            });
        }

        match decode(response_type, &response) {
            Ok(body) => Ok(body),
            Err(e) => {
                debug!(error = %e, %response_type, "response body not decodable, using empty value");
                Ok(response_type.empty())
            }
        }
    }

    /// Like [`request`](Self::request) with a JSON response deserialized into `T`.
    /// Bodies that do not fit `T` yield `T::default()`.
    pub async fn request_json<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        custom_headers: Option<&HeaderSet>,
    ) -> Result<T>
    where
        T: DeserializeOwned + Default,
        B: Serialize + ?Sized,
    {
        let value = self
            .request(
                method,
                path,
                body,
                custom_headers,
                Some(ResponseType::Json.into()),
            )
            .await?
            .into_json()
            .unwrap_or_default();

        Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            debug!(error = %e, "JSON body does not match target type, using default");
            T::default()
        }))
    }

    pub async fn get(
        &self,
        path: &str,
        headers: Option<&HeaderSet>,
        config: Option<RequestConfig>,
    ) -> Result<ResponseBody> {
        self.request::<()>(Method::GET, path, None, headers, config)
            .await
    }

    pub async fn post<B>(
        &self,
        path: &str,
        data: Option<&B>,
        headers: Option<&HeaderSet>,
        config: Option<RequestConfig>,
    ) -> Result<ResponseBody>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, data, headers, config).await
    }

    pub async fn put<B>(
        &self,
        path: &str,
        data: Option<&B>,
        headers: Option<&HeaderSet>,
        config: Option<RequestConfig>,
    ) -> Result<ResponseBody>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, data, headers, config).await
    }

    pub async fn patch<B>(
        &self,
        path: &str,
        data: Option<&B>,
        headers: Option<&HeaderSet>,
        config: Option<RequestConfig>,
    ) -> Result<ResponseBody>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, data, headers, config).await
    }

    pub async fn delete(
        &self,
        path: &str,
        headers: Option<&HeaderSet>,
        config: Option<RequestConfig>,
    ) -> Result<ResponseBody> {
        self.request::<()>(Method::DELETE, path, None, headers, config)
            .await
    }
}
