use anyhow::{anyhow, Context, Result};
use clap::Args;
use reqwest::Method;
use serde_json::Value;

use graph_shaper::api::{ApiService, HeaderSet, RequestConfig, ResponseType};

use super::output::print_body;
use super::AppContext;

#[derive(Args, Debug)]
pub struct RequestCommand {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE, ...)
    pub method: String,

    /// Path appended to the base URL and scope, e.g. "/users"
    pub path: String,

    /// API version segment (default from config)
    #[arg(long, conflicts_with = "no_version")]
    pub api_version: Option<String>,

    /// Do not add a version segment
    #[arg(long)]
    pub no_version: bool,

    /// Path scope, e.g. "me"
    #[arg(long)]
    pub scope: Option<String>,

    /// Extra header as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// JSON request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// How to decode the response: json, blob, text, arrayBuffer, formData, bytes
    #[arg(short, long, default_value = "json")]
    pub response_type: String,
}

pub async fn execute(cmd: RequestCommand, ctx: &AppContext) -> Result<()> {
    let method = parse_method(&cmd.method)?;
    let headers = parse_headers(&cmd.headers)?;
    let data = cmd
        .data
        .as_deref()
        .map(|raw| serde_json::from_str::<Value>(raw))
        .transpose()
        .context("Request body is not valid JSON")?;
    // Unknown names decode as JSON.
    let config = RequestConfig::new(cmd.response_type.parse::<ResponseType>().unwrap_or_default());

    let mut options = ctx.config.api.service_options(ctx.token.as_deref());
    if cmd.no_version {
        options.version = None;
    } else if let Some(version) = cmd.api_version {
        options.version = Some(version);
    }
    if let Some(scope) = cmd.scope {
        options.scope = Some(scope);
    }
    let service = ApiService::new(options);

    let custom = (!headers.is_empty()).then_some(&headers);
    let path = cmd.path.as_str();
    let body = match method {
        Method::GET => service.get(path, custom, Some(config)).await?,
        Method::DELETE => service.delete(path, custom, Some(config)).await?,
        Method::POST => service.post(path, data.as_ref(), custom, Some(config)).await?,
        Method::PUT => service.put(path, data.as_ref(), custom, Some(config)).await?,
        Method::PATCH => service.patch(path, data.as_ref(), custom, Some(config)).await?,
        other => {
            service
                .request(other, path, data.as_ref(), custom, Some(config))
                .await?
        }
    };

    print_body(&body, ctx.format)
}

fn parse_method(raw: &str) -> Result<Method> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow!("Invalid HTTP method: {}", raw))
}

fn parse_headers(raw: &[String]) -> Result<HeaderSet> {
    raw.iter()
        .map(|h| {
            let (name, value) = h
                .split_once(':')
                .ok_or_else(|| anyhow!("Invalid header {:?}, expected \"Name: value\"", h))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(anyhow!("Invalid header {:?}, empty name", h));
            }
            Ok((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("Patch").unwrap(), Method::PATCH);
        assert_eq!(parse_method("PROPFIND").unwrap().as_str(), "PROPFIND");
        assert!(parse_method("BAD METHOD").is_err());
    }

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(&[
            "Prefer: outlook.timezone=\"UTC\"".to_string(),
            "ConsistencyLevel:eventual".to_string(),
            "prefer: return=minimal".to_string(),
        ])
        .unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Prefer"), Some("return=minimal"));
        assert_eq!(headers.get("ConsistencyLevel"), Some("eventual"));

        assert!(parse_headers(&["no-colon".to_string()]).is_err());
        assert!(parse_headers(&[": value".to_string()]).is_err());
    }
}
