//! Libraries (virtual folders) and their paths

use std::sync::Arc;

use reqwest::Method;

use crate::client::{MediaBrowser, LIBRARIES_KEY};
use crate::error::Result;
use crate::types::{AddMedia, LibraryOptions, VirtualFolder};
use crate::url_encode;

impl MediaBrowser {
    /// All libraries on the server, cached for the configured TTL.
    pub async fn get_libraries(&self) -> Result<Vec<VirtualFolder>> {
        let folders = self
            .libraries
            .try_get_with(LIBRARIES_KEY, async {
                tracing::debug!("Library cache miss");
                let response = self.call(Method::GET, "/Library/VirtualFolders", None).await?;
                let folders: Vec<VirtualFolder> = response.json()?;
                Ok::<_, crate::MediaBrowserError>(Arc::new(folders))
            })
            .await
            .map_err(|e| (*e).clone())?;
        Ok(folders.as_ref().clone())
    }

    pub async fn add_library(
        &self,
        name: &str,
        collection_type: &str,
        paths: &[String],
        refresh_library: bool,
        options: &LibraryOptions,
    ) -> Result<()> {
        let body = serde_json::to_value(options)?;
        let path = add_library_path(name, collection_type, paths, refresh_library);
        self.call(Method::POST, &path, Some(&body)).await?;
        self.invalidate_libraries().await;
        Ok(())
    }

    pub async fn delete_library(&self, name: &str) -> Result<()> {
        let path = format!("/Library/VirtualFolders?name={}", url_encode(name));
        self.call(Method::DELETE, &path, None).await?;
        self.invalidate_libraries().await;
        Ok(())
    }

    /// Add a path to an existing library.
    pub async fn add_folder(&self, refresh_library: bool, media: &AddMedia) -> Result<()> {
        let body = serde_json::to_value(media)?;
        let path = format!("/Library/VirtualFolders/Paths?client=emby&refreshLibrary={refresh_library}");
        self.call(Method::POST, &path, Some(&body)).await?;
        self.invalidate_libraries().await;
        Ok(())
    }

    /// Remove a path from a library.
    pub async fn delete_folder(&self, name: &str, folder: &str, refresh_library: bool) -> Result<()> {
        let path = format!(
            "/Library/VirtualFolders/Paths?name={}&path={}&refreshLibrary={refresh_library}",
            url_encode(name),
            url_encode(folder)
        );
        self.call(Method::DELETE, &path, None).await?;
        self.invalidate_libraries().await;
        Ok(())
    }

    /// Start a scan of every library.
    pub async fn scan_libraries(&self) -> Result<()> {
        self.call(Method::POST, "/Library/Refresh?client=emby", None)
            .await
            .map(|_| ())
    }

    pub async fn invalidate_libraries(&self) {
        self.libraries.invalidate(LIBRARIES_KEY).await;
    }
}

fn add_library_path(name: &str, collection_type: &str, paths: &[String], refresh: bool) -> String {
    let mut path = format!(
        "/Library/VirtualFolders?client=emby&name={}&collectiontype={}&refreshLibrary={refresh}",
        url_encode(name),
        url_encode(collection_type)
    );
    for p in paths {
        path.push_str("&paths[]=");
        path.push_str(&url_encode(p));
    }
    path
}
