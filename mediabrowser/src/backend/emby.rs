use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::Backend;
use crate::config::ServerType;
use crate::error::{classify, MediaBrowserError, Result};
use crate::session::Session;
use crate::types::{PasswordResetResponse, User};
use crate::url_encode;

pub struct Emby;

impl Emby {
    async fn set_initial_password(&self, session: &Session, user_id: &str, password: &str) -> Result<()> {
        let url = session
            .transport()
            .url(&format!("/Users/{}/Password", url_encode(user_id)));
        let body = json!({ "Id": user_id, "CurrentPw": "", "NewPw": password });
        let response = session
            .authenticated_request(Method::POST, &url, Some(&body))
            .await?;
        classify(response.status, &response.body, session.verbose())
    }
}

#[async_trait]
impl Backend for Emby {
    fn server_type(&self) -> ServerType {
        ServerType::Emby
    }

    /// Emby ignores a password on `/Users/New`, so the account is created
    /// bare and the password set afterwards. An account whose password could
    /// not be set is deleted again.
    async fn new_user(&self, session: &Session, username: &str, password: &str) -> Result<User> {
        let url = session.transport().url("/Users/New");
        let body = json!({ "Name": username });
        let response = session
            .authenticated_request(Method::POST, &url, Some(&body))
            .await?;
        classify(response.status, &response.body, session.verbose())?;
        let user: User = response.json()?;

        if let Err(err) = self.set_initial_password(session, &user.id, password).await {
            tracing::warn!(user_id = %user.id, error = %err, "Setting password failed, removing new user");
            if let Err(cleanup) = self.delete_user(session, &user.id).await {
                tracing::warn!(user_id = %user.id, error = %cleanup, "Failed to remove user after password error");
            }
            return Err(err);
        }
        Ok(user)
    }

    async fn delete_user(&self, session: &Session, user_id: &str) -> Result<()> {
        let url = session
            .transport()
            .url(&format!("/Users/{}", url_encode(user_id)));
        let response = session.authenticated_request(Method::DELETE, &url, None).await?;

        if response.status == 404 {
            return Err(MediaBrowserError::user_not_found_by_id(user_id));
        }
        classify(response.status, &response.body, session.verbose())
    }

    /// Emby has no PIN reset endpoint.
    async fn reset_password(&self, _session: &Session, _pin: &str) -> Result<PasswordResetResponse> {
        Ok(PasswordResetResponse::default())
    }
}
