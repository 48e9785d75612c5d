//! Shared fixtures for the mock-server tests
#![allow(dead_code)]

use mediabrowser::{logging_failure_handler, ClientConfig, MediaBrowser, ServerType};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT: &str = "jfa-go";
pub const VERSION: &str = "0.5.1";
pub const DEVICE: &str = "jfa-go-test";
pub const DEVICE_ID: &str = "jfa-go-test-1";

pub fn config(server: &MockServer, server_type: ServerType) -> ClientConfig {
    let mut config = ClientConfig::new(server.uri(), server_type);
    config.client_name = CLIENT.to_string();
    config.client_version = VERSION.to_string();
    config.device_name = DEVICE.to_string();
    config.device_id = DEVICE_ID.to_string();
    config
}

pub async fn client(server: &MockServer, server_type: ServerType) -> MediaBrowser {
    MediaBrowser::new(config(server, server_type), logging_failure_handler())
        .await
        .unwrap()
}

/// The `X-Emby-Authorization` value the test client sends.
pub fn auth_header(token: Option<&str>) -> String {
    let mut value = format!(
        "MediaBrowser Client=\"{CLIENT}\", Device=\"{DEVICE}\", DeviceId=\"{DEVICE_ID}\", Version=\"{VERSION}\""
    );
    if let Some(token) = token {
        value.push_str(&format!(", Token=\"{token}\""));
    }
    value
}

pub fn user_json(id: &str, name: &str) -> Value {
    json!({
        "Name": name,
        "Id": id,
        "ServerId": "srv",
        "HasPassword": true,
        "LastLoginDate": "2024-01-02T03:04:05.6789Z",
        "Policy": { "IsAdministrator": false, "EnabledFolders": null },
        "Configuration": null
    })
}

pub fn auth_response(token: &str, user_id: &str, name: &str) -> Value {
    json!({
        "User": user_json(user_id, name),
        "AccessToken": token,
        "ServerId": "srv",
        "SessionInfo": { "RemoteEndPoint": "127.0.0.1", "UserId": user_id }
    })
}

pub fn login_body(username: &str, password: &str) -> Value {
    json!({ "Username": username, "Pw": password, "Password": password })
}

/// Accept `username`/`password` and hand out `token`.
pub async fn mount_login(server: &MockServer, username: &str, password: &str, token: &str) {
    Mock::given(method("POST"))
        .and(path("/Users/authenticatebyname"))
        .and(body_json(login_body(username, password)))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_response(token, "admin-id", username)))
        .mount(server)
        .await;
}

/// Number of requests the server saw for `request_path`.
pub async fn hits(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}

/// Match the exact `X-Emby-Authorization` value for `token`.
pub fn authorized(token: Option<&str>) -> impl wiremock::Match + 'static {
    let expected = auth_header(token);
    move |request: &wiremock::Request| {
        request
            .headers
            .get("X-Emby-Authorization")
            .and_then(|v| v.to_str().ok())
            == Some(expected.as_str())
    }
}
