use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::Backend;
use crate::config::ServerType;
use crate::error::{classify, details_for, MediaBrowserError, Result};
use crate::session::Session;
use crate::types::{PasswordResetResponse, User};
use crate::url_encode;

pub struct Jellyfin;

#[async_trait]
impl Backend for Jellyfin {
    fn server_type(&self) -> ServerType {
        ServerType::Jellyfin
    }

    async fn new_user(&self, session: &Session, username: &str, password: &str) -> Result<User> {
        let url = session.transport().url("/Users/New");
        let body = json!({ "Name": username, "Password": password });
        let response = session
            .authenticated_request(Method::POST, &url, Some(&body))
            .await?;
        classify(response.status, &response.body, session.verbose())?;
        response.json()
    }

    async fn delete_user(&self, session: &Session, user_id: &str) -> Result<()> {
        let url = session
            .transport()
            .url(&format!("/Users/{}", url_encode(user_id)));
        let response = session.authenticated_request(Method::DELETE, &url, None).await?;

        // Jellyfin answers 500 for some unknown IDs.
        if matches!(response.status, 404 | 500) {
            return Err(MediaBrowserError::user_not_found_by_id(user_id)
                .with_details(details_for(&response.body, session.verbose())));
        }
        classify(response.status, &response.body, session.verbose())
    }

    async fn reset_password(&self, session: &Session, pin: &str) -> Result<PasswordResetResponse> {
        let url = session.transport().url("/Users/ForgotPassword/Pin");
        let body = json!({ "Pin": pin });
        let response = session
            .authenticated_request(Method::POST, &url, Some(&body))
            .await?;
        classify(response.status, &response.body, session.verbose())?;
        response.json()
    }
}
