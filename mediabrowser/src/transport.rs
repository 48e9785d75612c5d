//! HTTP transport shared by every request the client makes
//!
//! Owns the reqwest client, the static header set and the failure hook. It
//! knows nothing about authentication beyond sending whatever authorization
//! value the session hands it.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_CHARSET, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, Proxy};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{MediaBrowserError, Result};

/// Maximum response body size accepted from the server (16 MB).
pub const MAX_RESPONSE_SIZE: usize = 16 * 1024 * 1024;

pub(crate) const X_EMBY_AUTHORIZATION: &str = "X-Emby-Authorization";

/// A request that died in the transport rather than returning a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    Timeout { url: String, message: String },
    Panic { url: String, message: String },
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { url, message } => write!(f, "timeout requesting {url}: {message}"),
            Self::Panic { url, message } => write!(f, "panic requesting {url}: {message}"),
        }
    }
}

/// Called whenever a request times out or panics.
pub type FailureHandler = Arc<dyn Fn(&TransportFailure) + Send + Sync>;

/// Handler that logs the failure and, unless `no_fail` is set, exits the process.
///
/// `name` is the server flavour for the log line (Jellyfin/Emby) and `addr`
/// the address being accessed.
pub fn named_failure_handler(
    name: impl Into<String>,
    addr: impl Into<String>,
    no_fail: bool,
) -> FailureHandler {
    let name = name.into();
    let addr = addr.into();
    Arc::new(move |failure: &TransportFailure| {
        tracing::error!(
            server = %name,
            addr = %addr,
            failure = %failure,
            "Failed to authenticate with {name} @ {addr}"
        );
        if !no_fail {
            std::process::exit(1);
        }
    })
}

/// Handler that only logs. Useful for embedding and tests.
#[must_use]
pub fn logging_failure_handler() -> FailureHandler {
    Arc::new(|failure: &TransportFailure| {
        tracing::warn!(failure = %failure, "Media server request failed");
    })
}

/// Status and decoded body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, 200 | 201 | 204)
    }

    /// Decode the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(Into::into)
    }
}

pub struct Transport {
    http: Client,
    base_url: String,
    headers: HeaderMap,
    failure_handler: FailureHandler,
}

impl Transport {
    pub fn new(config: &ClientConfig, failure_handler: FailureHandler) -> Result<Self> {
        config.validate()?;

        let user_agent = format!("{}/{}", config.client_name, config.client_version);
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );
        headers.insert(ACCEPT_CHARSET, HeaderValue::from_static("UTF-8,*"));
        headers.insert(USER_AGENT, HeaderValue::from_str(&user_agent)?);
        headers.insert(
            HeaderName::from_static("x-application"),
            HeaderValue::from_str(&user_agent)?,
        );

        // gzip(true) advertises Accept-Encoding and inflates compressed bodies.
        let mut builder = Client::builder()
            .timeout(config.request_timeout())
            .gzip(config.gzip);
        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = Proxy::all(proxy.trim())
                .map_err(|e| MediaBrowserError::InvalidConfig(format!("proxy {proxy}: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| MediaBrowserError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            headers,
            failure_handler,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/Users/New`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request and read the whole body.
    ///
    /// Non-2xx statuses are not errors here; callers classify them.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        authorization: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        tracing::debug!(%method, url, "Sending request");

        let outcome = AssertUnwindSafe(self.execute(method, url, authorization, body))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(MediaBrowserError::Timeout(message))) => {
                (self.failure_handler)(&TransportFailure::Timeout {
                    url: url.to_string(),
                    message: message.clone(),
                });
                Err(MediaBrowserError::Timeout(message))
            }
            Ok(Err(err)) => Err(err),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                (self.failure_handler)(&TransportFailure::Panic {
                    url: url.to_string(),
                    message: message.clone(),
                });
                Err(MediaBrowserError::TransportPanic(message))
            }
        }
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        authorization: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let mut request = self
            .http
            .request(method, url)
            .headers(self.headers.clone())
            .header(X_EMBY_AUTHORIZATION, HeaderValue::from_str(authorization)?);
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        if let Some(len) = response.content_length() {
            if len as usize > MAX_RESPONSE_SIZE {
                return Err(MediaBrowserError::Parse(format!(
                    "response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"
                )));
            }
        }
        let bytes = response.bytes().await?;
        if bytes.len() > MAX_RESPONSE_SIZE {
            return Err(MediaBrowserError::Parse(format!(
                "response too large ({} bytes, max {MAX_RESPONSE_SIZE})",
                bytes.len()
            )));
        }

        Ok(RawResponse {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
