use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;

use crate::backend::{backend_for, Backend};
use crate::cache::UserCache;
use crate::config::{ClientConfig, ServerType};
use crate::error::{classify, Result};
use crate::logging::init_logging;
use crate::session::{ClientIdentity, MustAuthenticateOptions, Session};
use crate::transport::{named_failure_handler, FailureHandler, RawResponse, Transport};
use crate::types::{PasswordResetResponse, ServerInfo, User, VirtualFolder};

pub(crate) const LIBRARIES_KEY: &str = "virtual-folders";

/// A client for one Jellyfin or Emby server.
///
/// Owns the session, the user snapshot and the library cache. All methods
/// take `&self`, so a `MediaBrowser` can be shared behind an `Arc`.
pub struct MediaBrowser {
    config: ClientConfig,
    session: Arc<Session>,
    users: UserCache,
    pub(crate) libraries: moka::future::Cache<&'static str, Arc<Vec<VirtualFolder>>>,
    backend: Box<dyn Backend>,
    server_info: ServerInfo,
}

impl MediaBrowser {
    /// Build a client and fetch the server's public info.
    ///
    /// A server that can't be reached yet still yields a client; its
    /// [`ServerInfo`] is left empty.
    pub async fn new(config: ClientConfig, failure_handler: FailureHandler) -> Result<Self> {
        let transport = Transport::new(&config, failure_handler)?;
        let session = Arc::new(Session::new(
            transport,
            ClientIdentity::from_config(&config),
            config.verbose,
        ));
        let ttl = config.cache_ttl();

        let server_info = fetch_server_info(&session).await;
        tracing::info!(
            server = config.server_type.name(),
            url = %config.base_url(),
            name = %server_info.name,
            version = %server_info.version,
            "Media server client ready"
        );

        Ok(Self {
            users: UserCache::new(session.clone(), ttl),
            libraries: moka::future::Cache::builder()
                .max_capacity(1)
                .time_to_live(ttl)
                .build(),
            backend: backend_for(config.server_type),
            server_info,
            session,
            config,
        })
    }

    /// Build a client with the stock failure handler for this server.
    ///
    /// Also installs the logging subscriber when `config.logging.install` is
    /// set. An already installed subscriber is left alone.
    pub async fn from_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        if config.logging.install {
            if let Err(e) = init_logging(&config.logging) {
                tracing::warn!(error = %e, "Logging subscriber not installed");
            }
        }
        let handler = named_failure_handler(
            config.server_type.name(),
            config.base_url(),
            config.no_fail,
        );
        Self::new(config, handler).await
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn server_type(&self) -> ServerType {
        self.backend.server_type()
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn authenticated_user_id(&self) -> Option<String> {
        self.session.authenticated_user_id()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Whether user IDs on this server contain hyphens.
    pub fn hyphens(&self) -> bool {
        self.users.hyphens()
    }

    /// Drop the user snapshot so the next lookup refetches it.
    pub fn invalidate_users(&self) {
        self.users.invalidate();
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        self.session.authenticate(username, password).await
    }

    pub async fn must_authenticate(
        &self,
        username: &str,
        password: &str,
        opts: MustAuthenticateOptions,
    ) -> Result<User> {
        self.session.must_authenticate(username, password, opts).await
    }

    /// Send an authenticated request to an API path without classifying the status.
    pub async fn authenticated_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let url = self.session.transport().url(path);
        self.session.authenticated_request(method, &url, body).await
    }

    /// Like [`Self::authenticated_request`], failing on any non-success status.
    pub(crate) async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let response = self.authenticated_request(method, path, body).await?;
        classify(response.status, &response.body, self.session.verbose())?;
        Ok(response)
    }

    pub async fn get_users(&self, public: bool) -> Result<Vec<User>> {
        self.users.get_users(public).await
    }

    pub async fn user_by_id(&self, user_id: &str, public: bool) -> Result<User> {
        self.users.user_by_id(user_id, public).await
    }

    pub async fn user_by_name(&self, username: &str, public: bool) -> Result<User> {
        self.users.user_by_name(username, public).await
    }

    pub async fn user_by_id_from_cache(&self, user_id: &str, public: bool) -> Result<User> {
        self.users.user_by_id_from_cache(user_id, public).await
    }

    pub async fn user_by_name_from_cache(&self, username: &str, public: bool) -> Result<User> {
        self.users.user_by_name_from_cache(username, public).await
    }

    /// Create a user. The user snapshot is invalidated on success.
    pub async fn new_user(&self, username: &str, password: &str) -> Result<User> {
        let user = self.backend.new_user(&self.session, username, password).await?;
        self.users.invalidate();
        Ok(user)
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.backend.delete_user(&self.session, user_id).await?;
        self.users.invalidate();
        Ok(())
    }

    /// Reset a password with the PIN from a forgot-password request.
    ///
    /// Jellyfin only. Emby returns an empty response without contacting the server.
    pub async fn reset_password(&self, pin: &str) -> Result<PasswordResetResponse> {
        self.backend.reset_password(&self.session, pin).await
    }
}

async fn fetch_server_info(session: &Session) -> ServerInfo {
    let url = session.transport().url("/System/Info/Public");
    match session.send(Method::GET, &url, None).await {
        Ok(response) if response.is_success() => response.json().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Unreadable public server info");
            ServerInfo::default()
        }),
        Ok(response) => {
            tracing::warn!(status = response.status, "Public server info unavailable");
            ServerInfo::default()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch public server info");
            ServerInfo::default()
        }
    }
}
