//! Overlay image loading.

use async_trait::async_trait;
use thiserror::Error;
use tryon_core::{AssetReference, OverlayImage};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("download failed: {0}")]
    Network(String),
    #[error("download returned HTTP {0}")]
    Status(u16),
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Turns an asset reference into a drawable image.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, asset: &AssetReference) -> Result<OverlayImage, LoadError>;
}

/// Downloads over HTTP(S) and decodes off the event loop.
pub struct HttpImageLoader {
    client: reqwest::Client,
}

impl HttpImageLoader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, asset: &AssetReference) -> Result<OverlayImage, LoadError> {
        let response = self
            .client
            .get(&asset.url)
            .send()
            .await
            .map_err(|e| LoadError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadError::Network(e.to_string()))?;

        let id = asset.id.clone();
        tokio::task::spawn_blocking(move || OverlayImage::decode(id, &bytes))
            .await
            .map_err(|e| LoadError::Decode(e.to_string()))?
            .map_err(|e| LoadError::Decode(e.to_string()))
    }
}

/// Load an image, resolving any failure to `None`.
///
/// A broken asset simply does not render; the failure is only logged.
pub async fn load_or_none(
    loader: &dyn ImageLoader,
    asset: &AssetReference,
) -> Option<OverlayImage> {
    match loader.load(asset).await {
        Ok(image) => {
            tracing::debug!(
                asset = %asset.id,
                width = image.width(),
                height = image.height(),
                "overlay image loaded"
            );
            Some(image)
        }
        Err(e) => {
            tracing::error!(
                asset = %asset.id,
                url = %asset.url,
                error = %e,
                "failed to load image"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingLoader;

    #[async_trait]
    impl ImageLoader for FailingLoader {
        async fn load(&self, _asset: &AssetReference) -> Result<OverlayImage, LoadError> {
            Err(LoadError::Status(404))
        }
    }

    struct BytesLoader(Vec<u8>);

    #[async_trait]
    impl ImageLoader for BytesLoader {
        async fn load(&self, asset: &AssetReference) -> Result<OverlayImage, LoadError> {
            OverlayImage::decode(asset.id.clone(), &self.0)
                .map_err(|e| LoadError::Decode(e.to_string()))
        }
    }

    fn asset() -> AssetReference {
        AssetReference {
            id: "a1".into(),
            url: "https://example.invalid/a1".into(),
        }
    }

    #[tokio::test]
    async fn test_failed_load_is_none() {
        assert!(load_or_none(&FailingLoader, &asset()).await.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_is_none() {
        let loader = BytesLoader(b"<html>not a png</html>".to_vec());
        assert!(load_or_none(&loader, &asset()).await.is_none());
    }

    #[tokio::test]
    async fn test_png_loads() {
        let mut png = Vec::new();
        image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let img = load_or_none(&BytesLoader(png), &asset()).await.unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.asset_id, "a1");
    }
}
