//! Error taxonomy shared by the session, user cache and backend adapters.
//!
//! Status codes from either server are folded into [`MediaBrowserError`] by
//! [`classify`]. Response bodies are only attached when the client runs in
//! verbose mode, since they can carry server internals.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = MediaBrowserError> = std::result::Result<T, E>;

/// Problem details sometimes returned by Jellyfin alongside an error status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorDetails {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub instance: String,
}

impl ErrorDetails {
    /// Decode a response body as problem details.
    ///
    /// Bodies that aren't a problem-details object (Emby usually answers in
    /// plain text) are kept verbatim in `detail`. Empty bodies yield `None`.
    #[must_use]
    pub fn from_body(body: &str) -> Option<Self> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str::<Self>(trimmed) {
            Ok(details) if details != Self::default() => Some(details),
            _ => Some(Self {
                detail: trimmed.to_string(),
                ..Self::default()
            }),
        }
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::with_capacity(4);
        if !self.kind.is_empty() {
            lines.push(format!("Type: {}", self.kind));
        }
        if !self.title.is_empty() {
            lines.push(format!("Title: {}", self.title));
        }
        if !self.detail.is_empty() {
            lines.push(format!("Detail: {}", self.detail));
        }
        if !self.instance.is_empty() {
            lines.push(format!("Instance: {}", self.instance));
        }
        write!(f, "{}", lines.join("\n"))
    }
}

fn suffix(details: &Option<ErrorDetails>) -> String {
    details
        .as_ref()
        .map(|d| format!("\n{d}"))
        .unwrap_or_default()
}

/// What a failed user lookup was keyed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    Name(String),
    Id(String),
}

impl fmt::Display for UserLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "User \"{name}\" not found."),
            Self::Id(id) => write!(f, "User with ID \"{id}\" not found."),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum MediaBrowserError {
    #[error("Unauthorized, check credentials.{}", suffix(.0))]
    Unauthorized(Option<ErrorDetails>),

    #[error("Forbidden, the user may not have the correct permissions.{}", suffix(.0))]
    Forbidden(Option<ErrorDetails>),

    /// Generic 404. Most 404s come from user lookups, which use `UserNotFound`.
    #[error("Resource not found.")]
    NotFound,

    #[error("{lookup}{}", suffix(.details))]
    UserNotFound {
        lookup: UserLookup,
        details: Option<ErrorDetails>,
    },

    #[error("No (valid) policy was given.{}", suffix(.0))]
    NoPolicySupplied(Option<ErrorDetails>),

    #[error("Request failed (code {code}).{}", suffix(.details))]
    Unknown {
        code: u16,
        details: Option<ErrorDetails>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Transport panicked: {0}")]
    TransportPanic(String),
}

impl MediaBrowserError {
    #[must_use]
    pub fn user_not_found_by_id(id: impl Into<String>) -> Self {
        Self::UserNotFound {
            lookup: UserLookup::Id(id.into()),
            details: None,
        }
    }

    #[must_use]
    pub fn user_not_found_by_name(name: impl Into<String>) -> Self {
        Self::UserNotFound {
            lookup: UserLookup::Name(name.into()),
            details: None,
        }
    }

    /// Attach details to a `UserNotFound`. Other variants pass through.
    #[must_use]
    pub fn with_details(self, details: Option<ErrorDetails>) -> Self {
        match self {
            Self::UserNotFound { lookup, .. } => Self::UserNotFound { lookup, details },
            other => other,
        }
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// True for both the generic and the user-specific not-found errors.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound | Self::UserNotFound { .. })
    }
}

/// Details for an error body, honouring the verbose switch.
pub(crate) fn details_for(body: &str, verbose: bool) -> Option<ErrorDetails> {
    if verbose {
        ErrorDetails::from_body(body)
    } else {
        None
    }
}

/// Map a response status (and body, in verbose mode) onto the error taxonomy.
///
/// 400 is folded into `Unauthorized` because Jellyfin answers 400 to a lot of
/// authentication failures its API docs don't mention.
pub fn classify(status: u16, body: &str, verbose: bool) -> Result<()> {
    match status {
        200 | 201 | 204 => Ok(()),
        400 | 401 => Err(MediaBrowserError::Unauthorized(details_for(body, verbose))),
        403 => Err(MediaBrowserError::Forbidden(details_for(body, verbose))),
        404 => Err(MediaBrowserError::NotFound),
        code => Err(MediaBrowserError::Unknown {
            code,
            details: details_for(body, verbose),
        }),
    }
}

impl From<reqwest::Error> for MediaBrowserError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MediaBrowserError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderValue> for MediaBrowserError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_success_codes() {
        for status in [200, 201, 204] {
            assert!(classify(status, "", false).is_ok(), "status {status}");
        }
    }

    #[test]
    fn test_classify_unauthorized() {
        for status in [400, 401] {
            let err = classify(status, "nope", false).unwrap_err();
            assert!(err.is_unauthorized(), "status {status}");
        }
    }

    #[test]
    fn test_classify_forbidden_and_not_found() {
        assert!(matches!(
            classify(403, "", false),
            Err(MediaBrowserError::Forbidden(None))
        ));
        assert!(matches!(
            classify(404, "missing", true),
            Err(MediaBrowserError::NotFound)
        ));
    }

    #[test]
    fn test_classify_unknown() {
        for status in [302, 409, 500, 503] {
            match classify(status, "", false) {
                Err(MediaBrowserError::Unknown { code, details }) => {
                    assert_eq!(code, status);
                    assert!(details.is_none());
                }
                other => panic!("expected Unknown for {status}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_details_only_when_verbose() {
        let body = r#"{"type":"https://tools.ietf.org/html/rfc7231","title":"Bad Request","detail":"Invalid username"}"#;

        let quiet = classify(401, body, false).unwrap_err();
        assert_eq!(quiet.to_string(), "Unauthorized, check credentials.");

        let loud = classify(401, body, true).unwrap_err();
        let msg = loud.to_string();
        assert!(msg.starts_with("Unauthorized, check credentials.\n"));
        assert!(msg.contains("Title: Bad Request"));
        assert!(msg.contains("Detail: Invalid username"));
    }

    #[test]
    fn test_plain_text_body_kept_verbatim() {
        let details = ErrorDetails::from_body("Access token is invalid or expired.").unwrap();
        assert_eq!(details.detail, "Access token is invalid or expired.");
        assert!(details.title.is_empty());
        assert!(ErrorDetails::from_body("   ").is_none());
    }

    #[test]
    fn test_user_not_found_display() {
        let by_name = MediaBrowserError::user_not_found_by_name("alice");
        assert_eq!(by_name.to_string(), "User \"alice\" not found.");

        let by_id = MediaBrowserError::user_not_found_by_id("abc123");
        assert_eq!(by_id.to_string(), "User with ID \"abc123\" not found.");
        assert!(by_id.is_not_found());
    }

    #[test]
    fn test_unknown_display() {
        let err = MediaBrowserError::Unknown {
            code: 500,
            details: None,
        };
        assert_eq!(err.to_string(), "Request failed (code 500).");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: MediaBrowserError = json_err.into();
        assert!(matches!(err, MediaBrowserError::Parse(_)));
    }
}
