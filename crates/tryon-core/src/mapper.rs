//! Landmark-to-canvas anchor mapping.
//!
//! Picks three fixed face-mesh landmarks (left ear region, right ear region,
//! chin) and scales them from normalized coordinates into canvas pixels,
//! then applies a small per-region vertical bias.

use crate::types::{FaceLandmarks, Point2D};

/// Face-mesh index near the left earlobe.
pub const LEFT_EAR_LANDMARK: usize = 132;
/// Face-mesh index near the right earlobe.
pub const RIGHT_EAR_LANDMARK: usize = 361;
/// Face-mesh index at the chin tip.
pub const CHIN_LANDMARK: usize = 152;

/// Vertical bias (pixels) applied to ear anchors; raises them toward the lobe.
pub const EAR_OFFSET_Y: f32 = -20.0;
/// Vertical bias (pixels) applied to the chin anchor; drops it onto the neck.
pub const CHIN_OFFSET_Y: f32 = 10.0;

/// A tracked facial region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    LeftEar,
    RightEar,
    Chin,
}

impl Region {
    pub const ALL: [Region; 3] = [Self::LeftEar, Self::RightEar, Self::Chin];

    pub fn landmark_index(&self) -> usize {
        match self {
            Self::LeftEar => LEFT_EAR_LANDMARK,
            Self::RightEar => RIGHT_EAR_LANDMARK,
            Self::Chin => CHIN_LANDMARK,
        }
    }

    /// Pixel offset added after scaling.
    pub fn offset(&self) -> Point2D {
        match self {
            Self::LeftEar | Self::RightEar => Point2D::new(0.0, EAR_OFFSET_Y),
            Self::Chin => Point2D::new(0.0, CHIN_OFFSET_Y),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::Chin => "chin",
        }
    }
}

/// Anchor points for a single frame. Any region may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnchorSet {
    pub left_ear: Option<Point2D>,
    pub right_ear: Option<Point2D>,
    pub chin: Option<Point2D>,
}

impl AnchorSet {
    pub fn get(&self, region: Region) -> Option<Point2D> {
        match region {
            Region::LeftEar => self.left_ear,
            Region::RightEar => self.right_ear,
            Region::Chin => self.chin,
        }
    }

    fn set(&mut self, region: Region, point: Option<Point2D>) {
        match region {
            Region::LeftEar => self.left_ear = point,
            Region::RightEar => self.right_ear = point,
            Region::Chin => self.chin = point,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left_ear.is_none() && self.right_ear.is_none() && self.chin.is_none()
    }
}

/// Maps normalized landmarks into canvas pixel anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkMapper {
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl LandmarkMapper {
    pub fn new(canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            canvas_width,
            canvas_height,
        }
    }

    /// Map one region: `(nx * W, ny * H) + offset`.
    ///
    /// Returns `None` when the landmark set is too short for the region's index.
    pub fn map_region(&self, landmarks: &FaceLandmarks, region: Region) -> Option<Point2D> {
        let (nx, ny) = landmarks.get(region.landmark_index())?;
        let offset = region.offset();
        Some(Point2D::new(
            nx * self.canvas_width as f32 + offset.x,
            ny * self.canvas_height as f32 + offset.y,
        ))
    }

    /// Map all three regions for a detected face.
    pub fn map(&self, landmarks: &FaceLandmarks) -> AnchorSet {
        let mut anchors = AnchorSet::default();
        for region in Region::ALL {
            let point = self.map_region(landmarks, region);
            if point.is_none() {
                tracing::debug!(
                    region = region.as_str(),
                    index = region.landmark_index(),
                    landmarks = landmarks.len(),
                    "landmark index out of range"
                );
            }
            anchors.set(region, point);
        }
        anchors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 478-point mesh with every point at (0.5, 0.5) except the ones overridden.
    fn mesh(overrides: &[(usize, (f32, f32))]) -> FaceLandmarks {
        let mut points = vec![(0.5, 0.5); 478];
        for &(i, p) in overrides {
            points[i] = p;
        }
        FaceLandmarks::new(points)
    }

    #[test]
    fn test_exact_mapping_with_offsets() {
        let lm = mesh(&[
            (LEFT_EAR_LANDMARK, (0.25, 0.5)),
            (RIGHT_EAR_LANDMARK, (0.75, 0.5)),
            (CHIN_LANDMARK, (0.5, 0.75)),
        ]);
        let anchors = LandmarkMapper::new(1280, 720).map(&lm);

        assert_eq!(anchors.left_ear, Some(Point2D::new(320.0, 340.0)));
        assert_eq!(anchors.right_ear, Some(Point2D::new(960.0, 340.0)));
        assert_eq!(anchors.chin, Some(Point2D::new(640.0, 550.0)));
    }

    #[test]
    fn test_mapping_follows_canvas_size() {
        let lm = mesh(&[(CHIN_LANDMARK, (0.5, 0.5))]);
        let small = LandmarkMapper::new(640, 360).map_region(&lm, Region::Chin);
        let large = LandmarkMapper::new(1920, 1080).map_region(&lm, Region::Chin);
        assert_eq!(small, Some(Point2D::new(320.0, 190.0)));
        assert_eq!(large, Some(Point2D::new(960.0, 550.0)));
    }

    #[test]
    fn test_short_landmark_set() {
        // 200 points: chin (152) and left ear (132) exist, right ear (361) does not
        let lm = FaceLandmarks::new(vec![(0.5, 0.5); 200]);
        let anchors = LandmarkMapper::new(100, 100).map(&lm);
        assert!(anchors.left_ear.is_some());
        assert!(anchors.right_ear.is_none());
        assert!(anchors.chin.is_some());
    }

    #[test]
    fn test_empty_landmarks() {
        let anchors = LandmarkMapper::new(100, 100).map(&FaceLandmarks::default());
        assert!(anchors.is_empty());
    }
}
