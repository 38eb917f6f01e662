//! Jewelry asset discovery from shared Drive folders.
//!
//! A folder's public listing page embeds every file as
//! `["https://drive.google.com/open?id=<id>"`. The IDs are scraped out of
//! that markup and turned into direct-view image URLs.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tryon_core::{AssetReference, Category};

const FOLDER_URL_PREFIX: &str = "https://drive.google.com/drive/folders/";
const FILE_ID_MARKER: &str = "[\"https://drive.google.com/open?id=";
const VIEW_URL_PREFIX: &str = "https://drive.google.com/uc?export=view&id=";

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("no folder configured for {0}")]
    NoFolder(Category),
    #[error("listing request failed: {0}")]
    Network(String),
    #[error("listing request returned HTTP {0}")]
    Status(u16),
    #[error("no assets found in {0} listing")]
    NoAssets(Category),
}

/// Listing page URL for a Drive folder.
pub fn folder_url(folder_id: &str) -> String {
    format!("{FOLDER_URL_PREFIX}{folder_id}")
}

/// Direct-view image URL for a Drive file.
pub fn view_url(file_id: &str) -> String {
    format!("{VIEW_URL_PREFIX}{file_id}")
}

/// Extract unique file IDs from listing markup, in order of first occurrence.
pub fn extract_asset_ids(markup: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for (start, _) in markup.match_indices(FILE_ID_MARKER) {
        let rest = &markup[start + FILE_ID_MARKER.len()..];
        let Some(end) = rest.find('"') else {
            break;
        };
        let id = &rest[..end];
        if !id.is_empty() && seen.insert(id) {
            ids.push(id.to_string());
        }
    }

    ids
}

/// Build references for every asset in `markup`.
pub fn parse_listing(category: Category, markup: &str) -> Result<Vec<AssetReference>, AssetError> {
    let refs: Vec<AssetReference> = extract_asset_ids(markup)
        .into_iter()
        .map(|id| AssetReference {
            url: view_url(&id),
            id,
        })
        .collect();
    if refs.is_empty() {
        return Err(AssetError::NoAssets(category));
    }
    Ok(refs)
}

/// Drive folder IDs per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderIds {
    pub earrings: String,
    pub necklaces: String,
}

impl FolderIds {
    pub fn get(&self, category: Category) -> Option<&str> {
        let id = match category {
            Category::Earrings => &self.earrings,
            Category::Necklaces => &self.necklaces,
        };
        (!id.is_empty()).then_some(id.as_str())
    }
}

/// Where folder listings come from.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the raw listing markup for `category`.
    async fn fetch_listing(&self, category: Category) -> Result<String, AssetError>;
}

/// Fetches public Drive folder pages over HTTPS.
pub struct DriveFolderSource {
    client: reqwest::Client,
    folders: FolderIds,
}

impl DriveFolderSource {
    pub fn new(client: reqwest::Client, folders: FolderIds) -> Self {
        Self { client, folders }
    }
}

#[async_trait]
impl AssetSource for DriveFolderSource {
    async fn fetch_listing(&self, category: Category) -> Result<String, AssetError> {
        let folder_id = self
            .folders
            .get(category)
            .ok_or(AssetError::NoFolder(category))?;
        let url = folder_url(folder_id);
        tracing::debug!(%category, %url, "fetching folder listing");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AssetError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status(status.as_u16()));
        }
        response
            .text()
            .await
            .map_err(|e| AssetError::Network(e.to_string()))
    }
}

/// Fetch and parse the listing for `category`. Does not touch any cache.
pub async fn fetch_assets(
    source: &dyn AssetSource,
    category: Category,
) -> Result<Vec<AssetReference>, AssetError> {
    let markup = source.fetch_listing(category).await?;
    let refs = parse_listing(category, &markup)?;
    tracing::info!(%category, count = refs.len(), "folder listing parsed");
    Ok(refs)
}

/// Per-category list of known assets.
#[derive(Debug, Clone, Default)]
pub struct AssetCache {
    entries: HashMap<Category, Vec<AssetReference>>,
}

impl AssetCache {
    pub fn get(&self, category: Category) -> &[AssetReference] {
        self.entries
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self, category: Category) -> bool {
        self.get(category).is_empty()
    }

    /// Replace the list for `category` wholesale.
    pub fn replace(&mut self, category: Category, assets: Vec<AssetReference>) {
        self.entries.insert(category, assets);
    }

    /// Apply a refresh outcome. On error the existing list is kept.
    pub fn apply(
        &mut self,
        category: Category,
        outcome: Result<Vec<AssetReference>, AssetError>,
    ) -> Result<&[AssetReference], AssetError> {
        let assets = outcome?;
        self.replace(category, assets);
        Ok(self.get(category))
    }
}
