//! Temporal smoothing of anchor positions.
//!
//! Each facial region keeps its own short FIFO of recent pixel positions;
//! the rendered position is the plain arithmetic mean of that window.

use crate::mapper::AnchorSet;
use crate::types::Point2D;
use std::collections::VecDeque;

/// Number of recent positions averaged per region.
pub const SMOOTHING_WINDOW: usize = 5;

/// Fixed-capacity FIFO of recent points with a running average.
#[derive(Debug, Clone)]
pub struct SmoothingBuffer {
    points: VecDeque<Point2D>,
    capacity: usize,
}

impl Default for SmoothingBuffer {
    fn default() -> Self {
        Self::new(SMOOTHING_WINDOW)
    }
}

impl SmoothingBuffer {
    /// Create an empty buffer. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a point, evicting the oldest once the window is full.
    pub fn push(&mut self, point: Point2D) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Mean of all buffered points, or `None` if nothing has been pushed.
    pub fn average(&self) -> Option<Point2D> {
        if self.points.is_empty() {
            return None;
        }
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
        let n = self.points.len() as f32;
        Some(Point2D::new(sx / n, sy / n))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Buffered points, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Point2D> {
        self.points.iter()
    }
}

/// One smoothing buffer per tracked region (left ear, right ear, chin).
#[derive(Debug, Clone, Default)]
pub struct AnchorSmoother {
    left_ear: SmoothingBuffer,
    right_ear: SmoothingBuffer,
    chin: SmoothingBuffer,
}

impl AnchorSmoother {
    pub fn new(window: usize) -> Self {
        Self {
            left_ear: SmoothingBuffer::new(window),
            right_ear: SmoothingBuffer::new(window),
            chin: SmoothingBuffer::new(window),
        }
    }

    /// Feed this frame's raw anchors and return the smoothed set.
    ///
    /// Regions missing from `raw` leave their buffer untouched, so the last
    /// smoothed value for that region is kept.
    pub fn update(&mut self, raw: &AnchorSet) -> AnchorSet {
        if let Some(p) = raw.left_ear {
            self.left_ear.push(p);
        }
        if let Some(p) = raw.right_ear {
            self.right_ear.push(p);
        }
        if let Some(p) = raw.chin {
            self.chin.push(p);
        }
        self.current()
    }

    /// Smoothed anchors without feeding a new frame.
    pub fn current(&self) -> AnchorSet {
        AnchorSet {
            left_ear: self.left_ear.average(),
            right_ear: self.right_ear.average(),
            chin: self.chin.average(),
        }
    }

    pub fn reset(&mut self) {
        self.left_ear.clear();
        self.right_ear.clear();
        self.chin.clear();
    }
}
