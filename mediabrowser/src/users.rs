//! Per-user settings: passwords, policy, configuration, display preferences

use reqwest::Method;

use crate::client::MediaBrowser;
use crate::error::{classify, details_for, MediaBrowserError, Result};
use crate::types::{Configuration, DisplayPreferences, Policy, SetPasswordRequest};
use crate::url_encode;

impl MediaBrowser {
    /// Change a user's password. Needs admin rights or a session as that user.
    pub async fn set_password(&self, user_id: &str, current: &str, new: &str) -> Result<()> {
        let body = serde_json::to_value(SetPasswordRequest {
            current,
            current_pw: current,
            new,
            reset_password: false,
        })?;
        self.call(Method::POST, &password_path(user_id), Some(&body))
            .await
            .map(|_| ())
    }

    /// Clear a user's password as an administrator.
    pub async fn reset_password_admin(&self, user_id: &str) -> Result<()> {
        let body = serde_json::json!({ "ResetPassword": true });
        self.call(Method::POST, &password_path(user_id), Some(&body))
            .await
            .map(|_| ())
    }

    pub async fn set_policy(&self, user_id: &str, policy: &Policy) -> Result<()> {
        let path = format!("/Users/{}/Policy", url_encode(user_id));
        let body = serde_json::to_value(policy)?;
        let response = self
            .authenticated_request(Method::POST, &path, Some(&body))
            .await?;

        let verbose = self.session().verbose();
        if response.status == 400 {
            return Err(MediaBrowserError::NoPolicySupplied(details_for(
                &response.body,
                verbose,
            )));
        }
        classify(response.status, &response.body, verbose)
    }

    pub async fn set_configuration(&self, user_id: &str, configuration: &Configuration) -> Result<()> {
        let path = format!("/Users/{}/Configuration", url_encode(user_id));
        let body = serde_json::to_value(configuration)?;
        self.call(Method::POST, &path, Some(&body)).await.map(|_| ())
    }

    /// The user's home screen layout, as an opaque JSON object.
    pub async fn get_display_preferences(&self, user_id: &str) -> Result<DisplayPreferences> {
        let response = self
            .call(Method::GET, &display_preferences_path(user_id), None)
            .await?;
        response.json()
    }

    pub async fn set_display_preferences(
        &self,
        user_id: &str,
        preferences: &DisplayPreferences,
    ) -> Result<()> {
        let body = serde_json::Value::Object(preferences.clone());
        self.call(Method::POST, &display_preferences_path(user_id), Some(&body))
            .await
            .map(|_| ())
    }
}

fn password_path(user_id: &str) -> String {
    format!("/Users/{}/Password", url_encode(user_id))
}

fn display_preferences_path(user_id: &str) -> String {
    format!(
        "/DisplayPreferences/usersettings?userId={}&client=emby",
        url_encode(user_id)
    )
}
