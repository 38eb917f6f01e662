use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Destination rectangle on a drawing surface.
///
/// The origin may be negative: overlays near the frame edge are clipped,
/// not shifted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// Jewelry category. Each has its own asset cache and option panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Earrings,
    Necklaces,
}

impl Category {
    pub const ALL: [Category; 2] = [Self::Earrings, Self::Necklaces];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earrings => "earrings",
            Self::Necklaces => "necklaces",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0} (expected earrings or necklaces)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "earrings" | "earring" => Ok(Self::Earrings),
            "necklaces" | "necklace" => Ok(Self::Necklaces),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// A remotely hosted jewelry image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    pub id: String,
    pub url: String,
}

/// A decoded overlay image, ready to be drawn.
#[derive(Clone)]
pub struct OverlayImage {
    /// ID of the asset this image was loaded from.
    pub asset_id: String,
    pub pixels: image::RgbaImage,
}

impl OverlayImage {
    pub fn new(asset_id: impl Into<String>, pixels: image::RgbaImage) -> Self {
        Self {
            asset_id: asset_id.into(),
            pixels,
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...) into an overlay.
    pub fn decode(asset_id: impl Into<String>, bytes: &[u8]) -> image::ImageResult<Self> {
        let pixels = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::new(asset_id, pixels))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

impl fmt::Debug for OverlayImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayImage")
            .field("asset_id", &self.asset_id)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Normalized (0.0–1.0) face-mesh landmarks for a single detected face.
///
/// Indices follow the tracker's fixed mesh numbering (468 points, 478 with
/// refined iris landmarks).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    pub points: Vec<(f32, f32)>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<(f32, f32)>) -> Self {
        Self { points }
    }

    pub fn get(&self, index: usize) -> Option<(f32, f32)> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("earrings".parse::<Category>().unwrap(), Category::Earrings);
        assert_eq!(" Necklace ".parse::<Category>().unwrap(), Category::Necklaces);
        assert!("rings".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_display_roundtrip() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_overlay_decode_invalid_bytes() {
        assert!(OverlayImage::decode("x", b"not an image").is_err());
    }

    #[test]
    fn test_landmarks_out_of_range() {
        let lm = FaceLandmarks::new(vec![(0.1, 0.2)]);
        assert_eq!(lm.get(0), Some((0.1, 0.2)));
        assert_eq!(lm.get(1), None);
    }
}
