//! Background task submission for listing refreshes and image loads.
//!
//! Tasks run on the tokio runtime and report back through an unbounded
//! channel. Whoever owns the [`SessionController`] drains that channel and
//! applies each [`Completion`], so state is only ever touched by one owner.

use crate::assets::{self, AssetError, AssetSource};
use crate::controller::{LoadRequest, RefreshRequest, SessionController};
use crate::loader::{self, ImageLoader};
use crate::ui::Ui;
use std::sync::Arc;
use tokio::sync::mpsc;
use tryon_core::{AssetReference, Category, OverlayImage};

/// Outcome of a background task.
#[derive(Debug)]
pub enum Completion {
    Refresh {
        category: Category,
        outcome: Result<Vec<AssetReference>, AssetError>,
    },
    Load {
        request: LoadRequest,
        image: Option<OverlayImage>,
    },
}

impl Completion {
    /// Feed this outcome into the controller.
    pub fn apply(self, controller: &mut SessionController, ui: &mut dyn Ui) {
        match self {
            Self::Refresh { category, outcome } => {
                controller.complete_refresh(category, outcome, ui);
            }
            Self::Load { request, image } => {
                controller.complete_load(&request, image);
            }
        }
    }
}

/// Spawns network work and funnels results into one channel.
#[derive(Clone)]
pub struct TaskRunner {
    source: Arc<dyn AssetSource>,
    loader: Arc<dyn ImageLoader>,
    tx: mpsc::UnboundedSender<Completion>,
}

impl TaskRunner {
    pub fn new(
        source: Arc<dyn AssetSource>,
        loader: Arc<dyn ImageLoader>,
    ) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { source, loader, tx }, rx)
    }

    pub fn submit_refresh(&self, request: RefreshRequest) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let category = request.category;
            let outcome = assets::fetch_assets(source.as_ref(), category).await;
            if tx.send(Completion::Refresh { category, outcome }).is_err() {
                tracing::debug!(%category, "session gone; dropping refresh result");
            }
        });
    }

    pub fn submit_load(&self, request: LoadRequest) {
        let loader = Arc::clone(&self.loader);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let image = loader::load_or_none(loader.as_ref(), &request.asset).await;
            if tx.send(Completion::Load { request, image }).is_err() {
                tracing::debug!("session gone; dropping image load");
            }
        });
    }

    /// Submit whatever a controller call asked for.
    pub fn submit_refresh_opt(&self, request: Option<RefreshRequest>) {
        if let Some(request) = request {
            self.submit_refresh(request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoadError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AssetSource for FakeSource {
        async fn fetch_listing(&self, category: Category) -> Result<String, AssetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!(
                "[\"https://drive.google.com/open?id={category}-1\"]\
                 [\"https://drive.google.com/open?id={category}-2\"]"
            ))
        }
    }

    struct FakeLoader;

    #[async_trait]
    impl ImageLoader for FakeLoader {
        async fn load(&self, asset: &AssetReference) -> Result<OverlayImage, LoadError> {
            Ok(OverlayImage::new(
                asset.id.clone(),
                image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 200, 200, 255])),
            ))
        }
    }

    #[derive(Default)]
    struct NullUi;

    impl Ui for NullUi {
        fn show_panel(&mut self, _category: Category) {}
        fn show_options(&mut self, _category: Category, _assets: &[AssetReference]) {}
        fn set_loading(&mut self, _loading: bool) {}
        fn notify(&mut self, _message: &str) {}
    }

    #[tokio::test]
    async fn test_refresh_then_pick_through_runner() {
        let source = Arc::new(FakeSource {
            calls: AtomicUsize::new(0),
        });
        let (runner, mut rx) = TaskRunner::new(source.clone(), Arc::new(FakeLoader));
        let mut ctl = SessionController::new();
        let mut ui = NullUi;

        runner.submit_refresh_opt(ctl.select_mode(Category::Earrings, &mut ui));
        rx.recv().await.unwrap().apply(&mut ctl, &mut ui);
        assert_eq!(ctl.cache().get(Category::Earrings).len(), 2);

        let load = ctl.pick(Category::Earrings, 1, &mut ui).unwrap();
        runner.submit_load(load);
        rx.recv().await.unwrap().apply(&mut ctl, &mut ui);
        assert_eq!(
            ctl.active_image().map(|i| i.asset_id.as_str()),
            Some("earrings-2")
        );

        // Cached: selecting again does not hit the source
        runner.submit_refresh_opt(ctl.select_mode(Category::Earrings, &mut ui));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
