//! User directory snapshot with TTL, name/ID indexes and coalesced refreshes
//!
//! The snapshot is replaced wholesale on each populate, so readers always see
//! a list and indexes that belong together. Reads before expiry never touch
//! the network. When the snapshot is stale, concurrent callers share a single
//! fetch through [`SingleFlight`].
//!
//! There is one snapshot and one flight key, so at most one list fetch is in
//! flight at a time. A snapshot taken from `/users/public` only answers public
//! lookups; private lookups that find one go through a private populate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use reqwest::Method;

use crate::error::{classify, details_for, MediaBrowserError, Result};
use crate::session::Session;
use crate::singleflight::SingleFlight;
use crate::types::User;

const USERS_KEY: &str = "users";

/// One fetched user list and its indexes.
#[derive(Debug, Default)]
pub struct UserSnapshot {
    users: Vec<User>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    private: bool,
}

impl UserSnapshot {
    fn new(users: Vec<User>, private: bool) -> Self {
        let mut by_id = HashMap::with_capacity(users.len());
        let mut by_name = HashMap::with_capacity(users.len());
        for (index, user) in users.iter().enumerate() {
            by_id.insert(user.id.clone(), index);
            by_name.insert(user.name.to_lowercase(), index);
        }
        Self {
            users,
            by_id,
            by_name,
            private,
        }
    }

    /// Whether this list came from the authenticated `/users` endpoint.
    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn by_id(&self, id: &str) -> Option<&User> {
        self.by_id.get(id).and_then(|&i| self.users.get(i))
    }

    /// Case-insensitive name lookup.
    pub fn by_name(&self, name: &str) -> Option<&User> {
        self.by_name
            .get(&name.to_lowercase())
            .and_then(|&i| self.users.get(i))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

struct CacheState {
    snapshot: Arc<UserSnapshot>,
    expiry: Instant,
}

pub struct UserCache {
    session: Arc<Session>,
    ttl: Duration,
    state: RwLock<CacheState>,
    flight: SingleFlight<&'static str, Arc<UserSnapshot>, MediaBrowserError>,
    hyphens: AtomicBool,
}

impl UserCache {
    /// Create an empty, already expired cache.
    pub fn new(session: Arc<Session>, ttl: Duration) -> Self {
        Self {
            session,
            ttl,
            state: RwLock::new(CacheState {
                snapshot: Arc::new(UserSnapshot::default()),
                expiry: Instant::now(),
            }),
            flight: SingleFlight::new(),
            hyphens: AtomicBool::new(false),
        }
    }

    /// Whether user IDs on this server are hyphenated UUIDs.
    ///
    /// Detected from the first user of each non-empty populate.
    pub fn hyphens(&self) -> bool {
        self.hyphens.load(Ordering::Relaxed)
    }

    /// Mark the snapshot stale so the next read refetches.
    pub fn invalidate(&self) {
        self.state.write().expiry = Instant::now();
    }

    fn fresh(&self, public: bool) -> Option<Arc<UserSnapshot>> {
        let state = self.state.read();
        let usable = public || state.snapshot.is_private();
        (usable && Instant::now() < state.expiry).then(|| state.snapshot.clone())
    }

    /// The current snapshot, populating first if it has expired.
    pub async fn snapshot(&self, public: bool) -> Result<Arc<UserSnapshot>> {
        if let Some(snapshot) = self.fresh(public) {
            tracing::debug!(users = snapshot.len(), "User cache hit");
            return Ok(snapshot);
        }
        self.populate(public).await
    }

    async fn populate(&self, public: bool) -> Result<Arc<UserSnapshot>> {
        loop {
            let snapshot = self.flight.do_work(USERS_KEY, self.refresh(public)).await?;
            if public || snapshot.is_private() {
                return Ok(snapshot);
            }
            // Joined a public populate; the next flight fetches the full list.
            tracing::debug!("Private lookup joined a public populate, refetching");
        }
    }

    async fn refresh(&self, public: bool) -> Result<Arc<UserSnapshot>> {
        // A populate that finished while we queued is good enough.
        if let Some(snapshot) = self.fresh(public) {
            return Ok(snapshot);
        }
        let users = self.fetch_users(public).await?;
        Ok(self.publish(users, !public))
    }

    fn publish(&self, users: Vec<User>, private: bool) -> Arc<UserSnapshot> {
        if let Some(first) = users.first() {
            let hyphenated = first.id.as_bytes().get(8) == Some(&b'-');
            self.hyphens.store(hyphenated, Ordering::Relaxed);
        }

        let snapshot = Arc::new(UserSnapshot::new(users, private));
        let mut state = self.state.write();
        state.snapshot = snapshot.clone();
        state.expiry = Instant::now() + self.ttl;
        tracing::info!(users = snapshot.len(), private, ttl = ?self.ttl, "User cache populated");
        snapshot
    }

    async fn fetch_users(&self, public: bool) -> Result<Vec<User>> {
        let transport = self.session.transport();
        let response = if public {
            let url = transport.url("/users/public");
            self.session.send(Method::GET, &url, None).await?
        } else {
            self.session.ensure_authenticated().await?;
            let url = transport.url("/users");
            let params = self.session.login_params();
            self.session
                .authenticated_request(Method::GET, &url, Some(&params))
                .await?
        };
        classify(response.status, &response.body, self.session.verbose())?;
        response.json()
    }

    /// All users, from the snapshot while it is fresh.
    pub async fn get_users(&self, public: bool) -> Result<Vec<User>> {
        Ok(self.snapshot(public).await?.users().to_vec())
    }

    /// Look a user up by ID.
    ///
    /// A cache miss refreshes the list for public lookups. Private lookups go
    /// straight to `/users/{id}` instead.
    pub async fn user_by_id(&self, id: &str, public: bool) -> Result<User> {
        if id.is_empty() {
            return Err(MediaBrowserError::user_not_found_by_id(id));
        }
        let fresh = self.fresh(public);
        if let Some(user) = fresh.as_ref().and_then(|s| s.by_id(id)) {
            return Ok(user.clone());
        }
        if !public {
            return self.fetch_user(id).await;
        }

        if fresh.is_some() {
            tracing::debug!(user_id = id, "User cache miss, forcing refresh");
            self.invalidate();
        }
        self.populate(true)
            .await?
            .by_id(id)
            .cloned()
            .ok_or_else(|| MediaBrowserError::user_not_found_by_id(id))
    }

    async fn fetch_user(&self, id: &str) -> Result<User> {
        self.session.ensure_authenticated().await?;
        let url = self
            .session
            .transport()
            .url(&format!("/users/{}", crate::url_encode(id)));
        let params = self.session.login_params();
        let response = self
            .session
            .authenticated_request(Method::GET, &url, Some(&params))
            .await?;

        let verbose = self.session.verbose();
        if matches!(response.status, 400 | 404) {
            return Err(MediaBrowserError::user_not_found_by_id(id)
                .with_details(details_for(&response.body, verbose)));
        }
        classify(response.status, &response.body, verbose)?;
        response.json()
    }

    /// Case-insensitive lookup by name.
    ///
    /// A miss against a fresh snapshot forces one refresh before giving up,
    /// since the user may have been created after the snapshot was taken. When
    /// the snapshot had already expired, the populate is that refresh.
    pub async fn user_by_name(&self, name: &str, public: bool) -> Result<User> {
        if name.is_empty() {
            return Err(MediaBrowserError::user_not_found_by_name(name));
        }
        let (snapshot, was_fresh) = match self.fresh(public) {
            Some(snapshot) => (snapshot, true),
            None => (self.populate(public).await?, false),
        };
        if let Some(user) = snapshot.by_name(name) {
            return Ok(user.clone());
        }
        if !was_fresh {
            return Err(MediaBrowserError::user_not_found_by_name(name));
        }

        tracing::debug!(username = name, "User not in cache, forcing refresh");
        self.invalidate();
        self.populate(public)
            .await?
            .by_name(name)
            .cloned()
            .ok_or_else(|| MediaBrowserError::user_not_found_by_name(name))
    }

    /// Lookup by ID that never bypasses or force-refreshes the snapshot.
    pub async fn user_by_id_from_cache(&self, id: &str, public: bool) -> Result<User> {
        if id.is_empty() {
            return Err(MediaBrowserError::user_not_found_by_id(id));
        }
        self.snapshot(public)
            .await?
            .by_id(id)
            .cloned()
            .ok_or_else(|| MediaBrowserError::user_not_found_by_id(id))
    }

    /// Lookup by name that never force-refreshes the snapshot.
    pub async fn user_by_name_from_cache(&self, name: &str, public: bool) -> Result<User> {
        if name.is_empty() {
            return Err(MediaBrowserError::user_not_found_by_name(name));
        }
        self.snapshot(public)
            .await?
            .by_name(name)
            .cloned()
            .ok_or_else(|| MediaBrowserError::user_not_found_by_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            ..User::default()
        }
    }

    #[test]
    fn test_snapshot_indexes_every_user() {
        let snapshot = UserSnapshot::new(
            vec![user("a1", "Alice"), user("b2", "bob"), user("c3", "CAROL")],
            true,
        );

        assert_eq!(snapshot.len(), 3);
        for u in snapshot.users() {
            assert_eq!(snapshot.by_id(&u.id), Some(u));
            assert_eq!(snapshot.by_name(&u.name), Some(u));
        }
        assert_eq!(snapshot.by_name("alice").map(|u| u.id.as_str()), Some("a1"));
        assert_eq!(snapshot.by_name("Carol").map(|u| u.id.as_str()), Some("c3"));
        assert!(snapshot.by_id("A1").is_none());
        assert!(snapshot.by_name("dave").is_none());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = UserSnapshot::default();
        assert!(snapshot.is_empty());
        assert!(!snapshot.is_private());
        assert!(snapshot.by_id("").is_none());
    }
}
