//! Jellyfin/Emby API data structures
//!
//! Only the fields this client reads or writes are bound. Arrays whose
//! element type doesn't matter here are kept as opaque JSON values; a `null`
//! from the server decodes to an empty array so outgoing payloads never carry
//! `null`, which Jellyfin rejects.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::time::MediaTime;

/// Decode `null` as the type's default.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Public server information from `/System/Info/Public`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerInfo {
    #[serde(rename = "LocalAddress", deserialize_with = "nullable")]
    pub local_address: String,
    #[serde(rename = "ServerName", deserialize_with = "nullable")]
    pub name: String,
    #[serde(rename = "Version", deserialize_with = "nullable")]
    pub version: String,
    #[serde(rename = "OperatingSystem", deserialize_with = "nullable")]
    pub os: String,
    #[serde(rename = "Id", deserialize_with = "nullable")]
    pub id: String,
}

/// A user account as returned by `/users`, `/users/public` and `/users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct User {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub server_id: String,
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    pub has_password: bool,
    pub has_configured_password: bool,
    pub has_configured_easy_password: bool,
    pub enable_auto_login: bool,
    pub last_login_date: Option<MediaTime>,
    pub last_activity_date: Option<MediaTime>,
    #[serde(deserialize_with = "nullable")]
    pub configuration: Configuration,
    /// The user's permissions.
    #[serde(deserialize_with = "nullable")]
    pub policy: Policy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    #[serde(rename = "RemoteEndPoint", deserialize_with = "nullable")]
    pub remote_endpoint: String,
    #[serde(rename = "UserId", deserialize_with = "nullable")]
    pub user_id: String,
}

/// Body of a successful `/Users/authenticatebyname`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthenticationResult {
    #[serde(rename = "User")]
    pub user: User,
    #[serde(rename = "AccessToken", deserialize_with = "nullable")]
    pub access_token: String,
    #[serde(rename = "ServerId", deserialize_with = "nullable")]
    pub server_id: String,
    #[serde(rename = "SessionInfo", deserialize_with = "nullable")]
    pub session_info: SessionInfo,
}

/// Per-user display configuration (part of the home screen layout).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Configuration {
    #[serde(deserialize_with = "nullable")]
    pub audio_language_preference: String,
    pub play_default_audio_track: bool,
    #[serde(deserialize_with = "nullable")]
    pub subtitle_language_preference: String,
    pub display_missing_episodes: bool,
    #[serde(deserialize_with = "nullable")]
    pub grouped_folders: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub subtitle_mode: String,
    pub display_collections_view: bool,
    pub enable_local_password: bool,
    #[serde(deserialize_with = "nullable")]
    pub ordered_views: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub latest_items_excludes: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub my_media_excludes: Vec<Value>,
    pub hide_played_in_latest: bool,
    pub remember_audio_selections: bool,
    pub remember_subtitle_selections: bool,
    pub enable_next_episode_auto_play: bool,
    #[serde(deserialize_with = "nullable")]
    pub cast_receiver_id: String,
}

/// Access policy (permissions) of a user.
///
/// Fields marked Jellyfin-only or Emby-only are ignored by the other server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Policy {
    pub is_administrator: bool,
    pub is_hidden: bool,
    pub is_disabled: bool,
    #[serde(deserialize_with = "nullable")]
    pub blocked_tags: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub allowed_tags: Vec<Value>,
    pub enable_user_preference_access: bool,
    #[serde(deserialize_with = "nullable")]
    pub access_schedules: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub block_unrated_items: Vec<Value>,
    pub enable_remote_control_of_other_users: bool,
    pub enable_shared_device_control: bool,
    pub enable_remote_access: bool,
    pub enable_live_tv_management: bool,
    pub enable_live_tv_access: bool,
    pub enable_media_playback: bool,
    pub enable_audio_playback_transcoding: bool,
    pub enable_video_playback_transcoding: bool,
    pub enable_playback_remuxing: bool,
    pub enable_content_deletion: bool,
    #[serde(deserialize_with = "nullable")]
    pub enable_content_deletion_from_folders: Vec<Value>,
    pub enable_content_downloading: bool,
    pub enable_sync_transcoding: bool,
    pub enable_media_conversion: bool,
    #[serde(deserialize_with = "nullable")]
    pub enabled_devices: Vec<Value>,
    pub enable_all_devices: bool,
    #[serde(deserialize_with = "nullable")]
    pub enabled_channels: Vec<Value>,
    pub enable_all_channels: bool,
    #[serde(deserialize_with = "nullable")]
    pub enabled_folders: Vec<String>,
    pub enable_all_folders: bool,
    pub invalid_login_attempt_count: i32,
    pub enable_public_sharing: bool,
    pub remote_client_bitrate_limit: i64,
    #[serde(deserialize_with = "nullable")]
    pub authentication_provider_id: String,
    pub enable_collection_management: bool,
    pub enable_subtitle_management: bool,
    pub enable_lyric_management: bool,

    // Jellyfin only
    pub force_remote_source_transcoding: bool,
    pub login_attempts_before_lockout: i32,
    pub max_active_sessions: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_parental_rating: Option<i32>,
    #[serde(deserialize_with = "nullable")]
    pub blocked_media_folders: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub blocked_channels: Vec<Value>,
    #[serde(deserialize_with = "nullable")]
    pub password_reset_provider_id: String,
    #[serde(deserialize_with = "nullable")]
    pub sync_play_access: String,

    // Emby only
    pub is_hidden_remotely: bool,
    pub is_hidden_from_unused_devices: bool,
    pub is_tag_blocking_mode_inclusive: bool,
    pub enable_subtitle_downloading: bool,
    #[serde(deserialize_with = "nullable")]
    pub excluded_sub_folders: Vec<Value>,
    pub simultaneous_stream_limit: i32,
}

/// Result of a PIN based password reset (Jellyfin only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PasswordResetResponse {
    pub success: bool,
    #[serde(deserialize_with = "nullable")]
    pub users_reset: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SetPasswordRequest<'a> {
    #[serde(rename = "CurrentPassword")]
    pub current: &'a str,
    #[serde(rename = "CurrentPw")]
    pub current_pw: &'a str,
    #[serde(rename = "NewPw")]
    pub new: &'a str,
    #[serde(rename = "ResetPassword")]
    pub reset_password: bool,
}

/// A library, which the servers call a virtual folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VirtualFolder {
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub locations: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub collection_type: String,
    #[serde(deserialize_with = "nullable")]
    pub library_options: LibraryOptions,
    #[serde(deserialize_with = "nullable")]
    pub item_id: String,
    #[serde(deserialize_with = "nullable")]
    pub primary_image_item_id: String,
    pub refresh_progress: f64,
    #[serde(deserialize_with = "nullable")]
    pub refresh_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LibraryOptions {
    pub enable_photos: bool,
    pub enable_realtime_monitor: bool,
    pub enable_chapter_image_extraction: bool,
    pub extract_chapter_images_during_library_scan: bool,
    #[serde(deserialize_with = "nullable")]
    pub path_infos: Vec<PathInfo>,
    pub save_local_metadata: bool,
    pub enable_internet_providers: bool,
    pub enable_automatic_series_grouping: bool,
    pub enable_embedded_titles: bool,
    pub enable_embedded_episode_infos: bool,
    pub automatic_refresh_interval_days: i32,
    #[serde(deserialize_with = "nullable")]
    pub preferred_metadata_language: String,
    #[serde(deserialize_with = "nullable")]
    pub metadata_country_code: String,
    #[serde(deserialize_with = "nullable")]
    pub season_zero_display_name: String,
    #[serde(deserialize_with = "nullable")]
    pub metadata_savers: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub disabled_local_metadata_readers: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub local_metadata_reader_order: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub disabled_subtitle_fetchers: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub subtitle_fetcher_order: Vec<String>,
    pub skip_subtitles_if_embedded_subtitles_present: bool,
    pub skip_subtitles_if_audio_track_matches: bool,
    #[serde(deserialize_with = "nullable")]
    pub subtitle_download_languages: Vec<String>,
    pub require_perfect_subtitle_match: bool,
    pub save_subtitles_with_media: bool,
    #[serde(deserialize_with = "nullable")]
    pub type_options: Vec<TypeOptions>,
    pub collapse_single_item_folders: bool,
    pub min_resume_pct: i32,
    pub max_resume_pct: i32,
    pub min_resume_duration_seconds: i32,
    pub thumbnail_images_interval_seconds: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PathInfo {
    #[serde(deserialize_with = "nullable")]
    pub path: String,
    #[serde(deserialize_with = "nullable")]
    pub network_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TypeOptions {
    #[serde(deserialize_with = "nullable")]
    pub r#type: String,
    #[serde(deserialize_with = "nullable")]
    pub metadata_fetchers: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub metadata_fetcher_order: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub image_fetchers: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub image_fetcher_order: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub image_options: Vec<ImageOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ImageOptions {
    #[serde(deserialize_with = "nullable")]
    pub r#type: String,
    pub limit: i32,
    pub min_width: i32,
}

/// Payload for adding a path to an existing library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AddMedia {
    pub name: String,
    pub path: String,
    pub path_info: PathInfo,
}

/// Display preferences are passed through untouched.
pub type DisplayPreferences = serde_json::Map<String, Value>;
