//! Blocking HTTP access to the workflow server.
//!
//! Callers run these on worker threads; nothing here retries, coalesces, or
//! imposes its own timeout policy.

use anyhow::{Context, Result};
use serde_json::Value;
use url::Url;

/// Failure of one request against the server.
#[derive(Debug)]
pub enum ApiError {
    /// Connection failure, or a body that could not be read or decoded.
    Transport(String),
    /// Non-success HTTP status, with whatever text the server attached.
    Status { status: u16, message: String },
    /// A success response whose body carried an `error` field.
    Server(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "request failed: {}", msg),
            ApiError::Status { status, message } => {
                if message.is_empty() {
                    write!(f, "server returned HTTP {}", status)
                } else {
                    write!(f, "server returned HTTP {}: {}", status, message)
                }
            }
            ApiError::Server(msg) => write!(f, "server error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Client for the server's extension endpoints.
#[derive(Debug, Clone)]
pub struct ServerApi {
    base: Url,
    client: reqwest::blocking::Client,
}

impl ServerApi {
    /// Build a client for the given base URL, e.g. `http://127.0.0.1:8188`.
    pub fn new(base_url: &str) -> Result<Self> {
        // A trailing slash keeps Url::join from clobbering the last path
        // segment when the server lives under a sub-path.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&normalized)
            .with_context(|| format!("invalid server URL: {}", base_url))?;
        Ok(Self {
            base,
            client: reqwest::blocking::Client::new(),
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ApiError::Transport(format!("bad endpoint {}: {}", path, e)))
    }

    /// GET a JSON body. The response must parse, and a 2xx body carrying an
    /// `error` field is treated as a failure.
    pub fn get_json(&self, path: &str) -> ApiResult<Value> {
        let response = self.client.get(self.endpoint(path)?).send()?;
        let value = read_body(response)?;
        value.ok_or_else(|| ApiError::Transport("response body is not JSON".to_string()))
    }

    /// POST a JSON body. Success responses without a JSON body yield `Null`.
    pub fn post_json(&self, path: &str, body: &Value) -> ApiResult<Value> {
        let response = self.client.post(self.endpoint(path)?).json(body).send()?;
        Ok(read_body(response)?.unwrap_or(Value::Null))
    }

    /// DELETE with a JSON body, as the wildcard store expects.
    pub fn delete_json(&self, path: &str, body: &Value) -> ApiResult<()> {
        let response = self.client.delete(self.endpoint(path)?).json(body).send()?;
        read_body(response)?;
        Ok(())
    }
}

/// Shared response handling: map non-2xx statuses (preferring a JSON `error`
/// field for the message), surface `error` fields inside 2xx bodies, and
/// hand back the parsed body when there is one.
fn read_body(response: reqwest::blocking::Response) -> ApiResult<Option<Value>> {
    let status = response.status();
    let text = response.text()?;
    let value: Option<Value> = serde_json::from_str(&text).ok();

    if !status.is_success() {
        let message = value
            .as_ref()
            .and_then(|v| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(text);
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: message.trim().to_string(),
        });
    }

    if let Some(err) = value
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
    {
        return Err(ApiError::Server(err.to_string()));
    }

    Ok(value)
}
