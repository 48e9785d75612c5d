//! Client for the Jellyfin and Emby HTTP APIs
//!
//! Both servers descend from the same code base and expose nearly the same
//! user and library administration API. [`MediaBrowser`] hides the
//! differences behind one type:
//!
//! - a session that keeps a bearer token and re-authenticates once when it expires
//! - a TTL snapshot of the user directory, indexed by ID and by name, whose
//!   refreshes are coalesced so concurrent callers trigger a single fetch
//! - per-server adapters for user creation, deletion and PIN resets
//! - library, policy and display-preference calls on top of a raw
//!   authenticated request primitive
//!
//! # Example
//! ```no_run
//! use mediabrowser::{ClientConfig, MediaBrowser, ServerType};
//!
//! # async fn example() -> mediabrowser::Result<()> {
//! let config = ClientConfig::new("http://localhost:8096", ServerType::Jellyfin);
//! let jf = MediaBrowser::from_config(config).await?;
//! jf.authenticate("admin", "password").await?;
//! let alice = jf.user_by_name("alice", false).await?;
//! println!("{} has id {}", alice.name, alice.id);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
mod library;
pub mod logging;
pub mod session;
pub mod singleflight;
pub mod time;
pub mod transport;
pub mod types;
mod users;

pub use backend::Backend;
pub use client::MediaBrowser;
pub use config::{ClientConfig, LogFormat, LoggingConfig, ServerType};
pub use error::{classify, ErrorDetails, MediaBrowserError, Result, UserLookup};
pub use session::{MustAuthenticateOptions, Session};
pub use time::MediaTime;
pub use transport::{
    logging_failure_handler, named_failure_handler, FailureHandler, RawResponse, TransportFailure,
};
pub use types::*;

/// Percent-encode a path segment or query value.
pub(crate) fn url_encode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}
