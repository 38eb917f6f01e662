//! Session state machine: active category, selections, smoothed anchors.
//!
//! The controller never performs I/O. Operations that need the network
//! return a request describing the work; the caller runs it and feeds the
//! outcome back through the matching `complete_*` method.

use crate::assets::{AssetCache, AssetError};
use crate::ui::Ui;
use std::collections::HashSet;
use tryon_core::{
    AnchorSet, AnchorSmoother, AssetReference, Category, FaceLandmarks, LandmarkMapper,
    OverlayImage, OverlayRenderer, Surface,
};

/// Ask for the asset listing of `category` to be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequest {
    pub category: Category,
}

/// Ask for an asset image to be loaded.
///
/// Carries a copy of the reference taken at pick time, so a cache refresh
/// landing before the download finishes cannot change what gets loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub category: Category,
    pub asset: AssetReference,
    pub generation: u64,
}

#[derive(Debug, Default)]
struct Selection {
    image: Option<OverlayImage>,
    /// Bumped on every pick; only the newest pick's load is applied.
    generation: u64,
}

/// Owns all mutable session state.
#[derive(Debug, Default)]
pub struct SessionController {
    mode: Option<Category>,
    cache: AssetCache,
    earrings: Selection,
    necklaces: Selection,
    smoother: AnchorSmoother,
    anchors: AnchorSet,
    refreshing: HashSet<Category>,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller with a custom smoothing window.
    pub fn with_window(window: usize) -> Self {
        Self {
            smoother: AnchorSmoother::new(window),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> Option<Category> {
        self.mode
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Last smoothed anchors.
    pub fn anchors(&self) -> &AnchorSet {
        &self.anchors
    }

    pub fn current_image(&self, category: Category) -> Option<&OverlayImage> {
        self.selection(category).image.as_ref()
    }

    /// Image for the active category, if one is loaded.
    pub fn active_image(&self) -> Option<&OverlayImage> {
        self.mode.and_then(|c| self.current_image(c))
    }

    pub fn is_refreshing(&self, category: Category) -> bool {
        self.refreshing.contains(&category)
    }

    fn selection(&self, category: Category) -> &Selection {
        match category {
            Category::Earrings => &self.earrings,
            Category::Necklaces => &self.necklaces,
        }
    }

    fn selection_mut(&mut self, category: Category) -> &mut Selection {
        match category {
            Category::Earrings => &mut self.earrings,
            Category::Necklaces => &mut self.necklaces,
        }
    }

    /// Switch the active category.
    ///
    /// Fetches the listing only when nothing is cached for that category yet.
    pub fn select_mode(&mut self, category: Category, ui: &mut dyn Ui) -> Option<RefreshRequest> {
        tracing::info!(%category, previous = ?self.mode, "mode selected");
        self.mode = Some(category);
        ui.show_panel(category);

        if self.cache.is_empty(category) {
            self.request_refresh(category, ui)
        } else {
            ui.show_options(category, self.cache.get(category));
            None
        }
    }

    /// Start a listing refresh unless one is already running for `category`.
    pub fn request_refresh(
        &mut self,
        category: Category,
        ui: &mut dyn Ui,
    ) -> Option<RefreshRequest> {
        if !self.refreshing.insert(category) {
            tracing::debug!(%category, "refresh already in flight");
            return None;
        }
        ui.set_loading(true);
        Some(RefreshRequest { category })
    }

    /// Periodic refresh of the active category.
    pub fn tick(&mut self, ui: &mut dyn Ui) -> Option<RefreshRequest> {
        let category = self.mode?;
        self.request_refresh(category, ui)
    }

    /// Apply a finished listing refresh. Failures keep the previous list.
    pub fn complete_refresh(
        &mut self,
        category: Category,
        outcome: Result<Vec<AssetReference>, AssetError>,
        ui: &mut dyn Ui,
    ) {
        self.refreshing.remove(&category);
        ui.set_loading(!self.refreshing.is_empty());

        match self.cache.apply(category, outcome) {
            Ok(assets) => {
                tracing::info!(%category, count = assets.len(), "asset cache updated");
                ui.show_options(category, assets);
            }
            Err(e) => {
                tracing::warn!(%category, error = %e, "asset refresh failed; keeping cached list");
                ui.notify(&format!("Could not load {category}: {e}"));
            }
        }
    }

    /// Pick the asset at `index` (0-based) of the cached `category` list.
    pub fn pick(
        &mut self,
        category: Category,
        index: usize,
        ui: &mut dyn Ui,
    ) -> Option<LoadRequest> {
        let Some(asset) = self.cache.get(category).get(index).cloned() else {
            let available = self.cache.get(category).len();
            tracing::debug!(%category, index, available, "pick out of range");
            ui.notify(&format!(
                "No {category} option {} (have {available})",
                index + 1
            ));
            return None;
        };

        let selection = self.selection_mut(category);
        selection.generation += 1;
        tracing::info!(
            %category,
            asset = %asset.id,
            generation = selection.generation,
            "asset picked"
        );
        Some(LoadRequest {
            category,
            asset,
            generation: selection.generation,
        })
    }

    /// Apply a finished image load. Returns true if the selection changed.
    ///
    /// The image lands in its own category's slot even if the active mode
    /// has changed since the pick. A load superseded by a newer pick of the
    /// same category is dropped, and a failed load keeps the previous image.
    pub fn complete_load(&mut self, request: &LoadRequest, image: Option<OverlayImage>) -> bool {
        let selection = self.selection_mut(request.category);
        if request.generation != selection.generation {
            tracing::debug!(
                category = %request.category,
                asset = %request.asset.id,
                "discarding superseded image load"
            );
            return false;
        }
        match image {
            Some(image) => {
                selection.image = Some(image);
                true
            }
            None => false,
        }
    }

    /// Process one tracked frame and redraw the overlay.
    ///
    /// With no face this frame, the smoothing buffers are left alone and the
    /// last smoothed anchors are reused. Returns the number of images drawn.
    pub fn on_frame(
        &mut self,
        landmarks: Option<&FaceLandmarks>,
        surface: &mut dyn Surface,
    ) -> usize {
        if let Some(landmarks) = landmarks {
            let (width, height) = surface.size();
            let raw = LandmarkMapper::new(width, height).map(landmarks);
            self.anchors = self.smoother.update(&raw);
        }
        OverlayRenderer::render_frame(surface, self.mode, self.active_image(), &self.anchors)
    }

    /// Draw the active overlay on top of whatever `surface` holds.
    pub fn draw_overlay(&self, surface: &mut dyn Surface) -> usize {
        OverlayRenderer::draw(surface, self.mode, self.active_image(), &self.anchors)
    }
}
