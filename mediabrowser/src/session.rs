//! Credentials, bearer token and the authenticated request primitive

use std::time::Duration;

use parking_lot::RwLock;
use reqwest::Method;
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::error::{classify, MediaBrowserError, Result};
use crate::transport::{RawResponse, Transport};
use crate::types::{AuthenticationResult, User};

/// Who the client says it is in the `X-Emby-Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub client: String,
    pub version: String,
    pub device: String,
    pub device_id: String,
}

impl ClientIdentity {
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            client: config.client_name.clone(),
            version: config.client_version.clone(),
            device: config.device_name.clone(),
            device_id: config.device_id.clone(),
        }
    }

    /// Authorization header value, with the token once one is known.
    #[must_use]
    pub fn authorization(&self, token: Option<&str>) -> String {
        let mut value = format!(
            "MediaBrowser Client=\"{}\", Device=\"{}\", DeviceId=\"{}\", Version=\"{}\"",
            self.client, self.device, self.device_id, self.version
        );
        if let Some(token) = token {
            value.push_str(&format!(", Token=\"{token}\""));
        }
        value
    }
}

/// Retry policy for [`Session::must_authenticate`].
#[derive(Debug, Clone, Copy)]
pub struct MustAuthenticateOptions {
    pub retry_count: u32,
    pub retry_gap: Duration,
    pub log_failures: bool,
}

impl Default for MustAuthenticateOptions {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_gap: Duration::from_secs(5),
            log_failures: true,
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    username: String,
    password: String,
    token: Option<String>,
    user_id: Option<String>,
    authenticated: bool,
}

pub struct Session {
    transport: Transport,
    identity: ClientIdentity,
    verbose: bool,
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new(transport: Transport, identity: ClientIdentity, verbose: bool) -> Self {
        Self {
            transport,
            identity,
            verbose,
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().authenticated
    }

    /// ID of the user the session last authenticated as.
    pub fn authenticated_user_id(&self) -> Option<String> {
        self.state.read().user_id.clone()
    }

    /// The stored credentials as the servers expect them in a login body.
    pub fn login_params(&self) -> Value {
        let state = self.state.read();
        login_body(&state.username, &state.password)
    }

    fn authorization(&self) -> String {
        let state = self.state.read();
        self.identity.authorization(state.token.as_deref())
    }

    /// Send with the current authorization header and no re-auth handling.
    pub async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<RawResponse> {
        let authorization = self.authorization();
        self.transport.send(method, url, &authorization, body).await
    }

    /// Log in and replace the stored credentials and token.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let url = self.transport.url("/Users/authenticatebyname");
        let body = login_body(username, password);

        let response = self.send(Method::POST, &url, Some(&body)).await?;
        classify(response.status, &response.body, self.verbose)?;

        let auth: AuthenticationResult = response.json()?;
        if auth.access_token.is_empty() {
            return Err(MediaBrowserError::Parse(
                "authentication response carried no AccessToken".to_string(),
            ));
        }

        {
            let mut state = self.state.write();
            state.username = username.to_string();
            state.password = password.to_string();
            state.token = Some(auth.access_token);
            state.user_id = Some(auth.user.id.clone());
            state.authenticated = true;
        }

        tracing::info!(username, user_id = %auth.user.id, "Authenticated with media server");
        Ok(auth.user)
    }

    /// Authenticate with the stored credentials unless already logged in.
    pub async fn ensure_authenticated(&self) -> Result<()> {
        if self.is_authenticated() {
            return Ok(());
        }
        let (username, password) = {
            let state = self.state.read();
            (state.username.clone(), state.password.clone())
        };
        self.authenticate(&username, &password).await.map(|_| ())
    }

    /// Send a request, re-authenticating once if the token has expired.
    ///
    /// A 401 on a session that was authenticated triggers one login with the
    /// stored credentials and one retry. Whatever the retry returns, including
    /// a second 401, goes back to the caller unclassified.
    pub async fn authenticated_request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let was_authenticated = self.is_authenticated();
        let response = self.send(method.clone(), url, body).await?;
        if response.status != 401 || !was_authenticated {
            return Ok(response);
        }

        tracing::warn!(url, "Session expired, re-authenticating");
        let (username, password) = {
            let mut state = self.state.write();
            state.authenticated = false;
            (state.username.clone(), state.password.clone())
        };
        self.authenticate(&username, &password).await?;

        self.send(method, url, body).await
    }

    /// Authenticate, retrying with a fixed gap between attempts.
    pub async fn must_authenticate(
        &self,
        username: &str,
        password: &str,
        opts: MustAuthenticateOptions,
    ) -> Result<User> {
        if opts.retry_count == 0 {
            return Err(MediaBrowserError::InvalidConfig(
                "retry_count must be at least 1".to_string(),
            ));
        }

        let mut attempt = 1;
        loop {
            match self.authenticate(username, password).await {
                Ok(user) => return Ok(user),
                Err(err) if attempt >= opts.retry_count => return Err(err),
                Err(err) => {
                    if opts.log_failures {
                        tracing::warn!(
                            attempt,
                            retry_in = ?opts.retry_gap,
                            error = %err,
                            "Failed to authenticate, retrying"
                        );
                    }
                    tokio::time::sleep(opts.retry_gap).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn login_body(username: &str, password: &str) -> Value {
    json!({
        "Username": username,
        "Pw": password,
        "Password": password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> ClientIdentity {
        ClientIdentity {
            client: "jfa-go".to_string(),
            version: "0.5.1".to_string(),
            device: "server".to_string(),
            device_id: "abc-123".to_string(),
        }
    }

    #[test]
    fn test_authorization_without_token() {
        assert_eq!(
            identity().authorization(None),
            r#"MediaBrowser Client="jfa-go", Device="server", DeviceId="abc-123", Version="0.5.1""#
        );
    }

    #[test]
    fn test_authorization_with_token() {
        assert_eq!(
            identity().authorization(Some("tok")),
            r#"MediaBrowser Client="jfa-go", Device="server", DeviceId="abc-123", Version="0.5.1", Token="tok""#
        );
    }

    #[test]
    fn test_login_body_keys() {
        let body = login_body("alice", "hunter2");
        assert_eq!(body["Username"], "alice");
        assert_eq!(body["Pw"], "hunter2");
        assert_eq!(body["Password"], "hunter2");
    }

    #[tokio::test]
    async fn test_must_authenticate_rejects_zero_retries() {
        let config = ClientConfig::default();
        let transport =
            Transport::new(&config, crate::transport::logging_failure_handler()).unwrap();
        let session = Session::new(transport, ClientIdentity::from_config(&config), false);
        let opts = MustAuthenticateOptions {
            retry_count: 0,
            ..MustAuthenticateOptions::default()
        };

        let err = session.must_authenticate("a", "b", opts).await.unwrap_err();
        assert!(matches!(err, MediaBrowserError::InvalidConfig(_)));
        assert!(!session.is_authenticated());
    }
}
