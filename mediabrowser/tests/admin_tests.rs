//! Passwords, policy, configuration, display preferences and libraries

mod common;

use common::client;
use mediabrowser::{
    AddMedia, Configuration, LibraryOptions, MediaBrowserError, PathInfo, Policy, ServerType,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_set_password_and_admin_reset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Users/u1/Password"))
        .and(body_json(json!({
            "CurrentPassword": "old",
            "CurrentPw": "old",
            "NewPw": "new",
            "ResetPassword": false
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/Users/u1/Password"))
        .and(body_json(json!({ "ResetPassword": true })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let jf = client(&server, ServerType::Jellyfin).await;
    jf.set_password("u1", "old", "new").await.unwrap();
    jf.reset_password_admin("u1").await.unwrap();
}

#[tokio::test]
async fn test_set_policy_bad_request_means_no_policy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Users/u1/Policy"))
        .and(body_partial_json(json!({ "IsAdministrator": true, "BlockedTags": [] })))
        .respond_with(ResponseTemplate::new(400).set_body_string("Policy missing"))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = common::config(&server, ServerType::Jellyfin);
    cfg.verbose = true;
    let jf = mediabrowser::MediaBrowser::new(cfg, mediabrowser::logging_failure_handler())
        .await
        .unwrap();

    let policy = Policy {
        is_administrator: true,
        ..Policy::default()
    };
    let err = jf.set_policy("u1", &policy).await.unwrap_err();
    match err {
        MediaBrowserError::NoPolicySupplied(Some(details)) => {
            assert_eq!(details.detail, "Policy missing");
        }
        other => panic!("expected NoPolicySupplied, got {other:?}"),
    }
}

#[tokio::test]
async fn test_set_configuration() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Users/u1/Configuration"))
        .and(body_partial_json(json!({ "OrderedViews": [], "SubtitleMode": "Smart" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let emby = client(&server, ServerType::Emby).await;
    let configuration = Configuration {
        subtitle_mode: "Smart".to_string(),
        ..Configuration::default()
    };
    emby.set_configuration("u1", &configuration).await.unwrap();
}

#[tokio::test]
async fn test_display_preferences_pass_through() {
    let server = MockServer::start().await;
    let prefs = json!({ "Id": "usersettings", "CustomPrefs": { "homesection0": "smalllibrarytiles" } });
    Mock::given(method("GET"))
        .and(path("/DisplayPreferences/usersettings"))
        .and(query_param("userId", "u1"))
        .and(query_param("client", "emby"))
        .respond_with(ResponseTemplate::new(200).set_body_json(prefs.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/DisplayPreferences/usersettings"))
        .and(query_param("userId", "u2"))
        .and(body_json(prefs.clone()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let jf = client(&server, ServerType::Jellyfin).await;
    let fetched = jf.get_display_preferences("u1").await.unwrap();
    assert_eq!(fetched["CustomPrefs"]["homesection0"], "smalllibrarytiles");
    jf.set_display_preferences("u2", &fetched).await.unwrap();
}

#[tokio::test]
async fn test_libraries_cached_and_invalidated_by_mutations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Library/VirtualFolders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "Name": "Movies",
            "Locations": ["/media/movies"],
            "CollectionType": "movies",
            "LibraryOptions": null,
            "ItemId": "lib1"
        }])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/Library/VirtualFolders"))
        .and(query_param("name", "Shows"))
        .and(query_param("collectiontype", "tvshows"))
        .and(query_param("refreshLibrary", "true"))
        .and(query_param("paths[]", "/media/tv"))
        .and(body_partial_json(json!({ "EnableRealtimeMonitor": true })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let jf = client(&server, ServerType::Jellyfin).await;
    let libraries = jf.get_libraries().await.unwrap();
    assert_eq!(libraries.len(), 1);
    assert_eq!(libraries[0].locations, vec!["/media/movies".to_string()]);
    jf.get_libraries().await.unwrap();

    let options = LibraryOptions {
        enable_realtime_monitor: true,
        ..LibraryOptions::default()
    };
    jf.add_library("Shows", "tvshows", &["/media/tv".to_string()], true, &options)
        .await
        .unwrap();
    jf.get_libraries().await.unwrap();
}

#[tokio::test]
async fn test_library_and_folder_removal() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/Library/VirtualFolders"))
        .and(query_param("name", "Old Movies"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/Library/VirtualFolders/Paths"))
        .and(query_param("name", "Movies"))
        .and(query_param("path", "/mnt/old"))
        .and(query_param("refreshLibrary", "false"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let emby = client(&server, ServerType::Emby).await;
    emby.delete_library("Old Movies").await.unwrap();
    let err = emby.delete_folder("Movies", "/mnt/old", false).await.unwrap_err();
    assert!(matches!(err, MediaBrowserError::NotFound), "{err:?}");
}

#[tokio::test]
async fn test_add_folder_and_scan() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Library/VirtualFolders/Paths"))
        .and(query_param("client", "emby"))
        .and(query_param("refreshLibrary", "true"))
        .and(body_json(json!({
            "Name": "Movies",
            "Path": "/mnt/new",
            "PathInfo": { "Path": "/mnt/new", "NetworkPath": "" }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/Library/Refresh"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let jf = client(&server, ServerType::Jellyfin).await;
    let media = AddMedia {
        name: "Movies".to_string(),
        path: "/mnt/new".to_string(),
        path_info: PathInfo {
            path: "/mnt/new".to_string(),
            network_path: String::new(),
        },
    };
    jf.add_folder(true, &media).await.unwrap();
    jf.scan_libraries().await.unwrap();
}
