//! Per-server request shaping
//!
//! Jellyfin and Emby share almost all of their user API. The handful of
//! calls where they differ go through [`Backend`]; everything else lives on
//! [`crate::MediaBrowser`] directly.

mod emby;
mod jellyfin;

pub use emby::Emby;
pub use jellyfin::Jellyfin;

use async_trait::async_trait;

use crate::config::ServerType;
use crate::error::Result;
use crate::session::Session;
use crate::types::{PasswordResetResponse, User};

#[async_trait]
pub trait Backend: Send + Sync {
    fn server_type(&self) -> ServerType;

    /// Create a user with an initial password.
    async fn new_user(&self, session: &Session, username: &str, password: &str) -> Result<User>;

    async fn delete_user(&self, session: &Session, user_id: &str) -> Result<()>;

    /// Complete a forgotten-password flow with the PIN the server issued.
    async fn reset_password(&self, session: &Session, pin: &str) -> Result<PasswordResetResponse>;
}

#[must_use]
pub fn backend_for(server_type: ServerType) -> Box<dyn Backend> {
    match server_type {
        ServerType::Jellyfin => Box::new(Jellyfin),
        ServerType::Emby => Box::new(Emby),
    }
}
