//! tryon-core: Face-anchored jewelry overlay engine.
//!
//! Maps normalized face-mesh landmarks into canvas pixel anchors, smooths
//! them over a short window, and draws the selected jewelry image at the
//! smoothed anchors.

pub mod mapper;
pub mod render;
pub mod smoothing;
pub mod types;

pub use mapper::{AnchorSet, LandmarkMapper, Region};
pub use render::{OverlayRenderer, RgbaCanvas, Surface};
pub use smoothing::{AnchorSmoother, SmoothingBuffer, SMOOTHING_WINDOW};
pub use types::{AssetReference, Category, FaceLandmarks, OverlayImage, Point2D, Rect};
