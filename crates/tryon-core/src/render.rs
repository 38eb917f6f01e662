//! Overlay rendering onto a drawing surface.
//!
//! Layout constants are in canvas pixels relative to the smoothed anchor.

use crate::mapper::AnchorSet;
use crate::types::{Category, OverlayImage, Point2D, Rect};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::Path;
use thiserror::Error;

const EARRING_SIZE: (f32, f32) = (100.0, 100.0);
const LEFT_EARRING_OFFSET_X: f32 = -60.0;
const RIGHT_EARRING_OFFSET_X: f32 = -20.0;
const NECKLACE_SIZE: (f32, f32) = (200.0, 100.0);
const NECKLACE_OFFSET_X: f32 = -100.0;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("image encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Anything overlays can be drawn onto.
pub trait Surface {
    /// Surface dimensions in pixels.
    fn size(&self) -> (u32, u32);
    /// Reset every pixel to fully transparent.
    fn clear(&mut self);
    /// Draw `image` scaled into `rect`, clipping at the surface edges.
    fn draw_image(&mut self, image: &OverlayImage, rect: Rect);
}

/// In-memory RGBA drawing surface.
#[derive(Clone)]
pub struct RgbaCanvas {
    pixels: RgbaImage,
}

impl RgbaCanvas {
    /// Transparent canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    /// Canvas initialised with an opaque RGB background (a video frame).
    pub fn from_rgb(width: u32, height: u32, rgb: &[u8]) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * 3;
        if rgb.len() < expected {
            return None;
        }
        let pixels = RgbaImage::from_fn(width, height, |x, y| {
            let i = (y as usize * width as usize + x as usize) * 3;
            Rgba([rgb[i], rgb[i + 1], rgb[i + 2], 255])
        });
        Some(Self { pixels })
    }

    /// Resize the canvas, discarding its contents. No-op if the size is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.pixels.dimensions() != (width, height) {
            self.pixels = RgbaImage::new(width, height);
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }

    /// Encode the canvas as PNG at `path`.
    pub fn save_png(&self, path: &Path) -> Result<(), RenderError> {
        self.pixels.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    /// Alpha-blend `top` over this canvas, aligned at the top-left corner.
    pub fn layer(&mut self, top: &RgbaCanvas) {
        imageops::overlay(&mut self.pixels, &top.pixels, 0, 0);
    }
}

impl Surface for RgbaCanvas {
    fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    fn draw_image(&mut self, image: &OverlayImage, rect: Rect) {
        let w = rect.width.round();
        let h = rect.height.round();
        if w < 1.0 || h < 1.0 || image.width() == 0 || image.height() == 0 {
            return;
        }
        let scaled = if (image.width(), image.height()) == (w as u32, h as u32) {
            image.pixels.clone()
        } else {
            imageops::resize(&image.pixels, w as u32, h as u32, FilterType::Triangle)
        };
        imageops::overlay(
            &mut self.pixels,
            &scaled,
            rect.x.round() as i64,
            rect.y.round() as i64,
        );
    }
}

/// Places the active jewelry image at smoothed anchors.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayRenderer;

impl OverlayRenderer {
    pub fn left_earring_rect(anchor: Point2D) -> Rect {
        Rect::new(
            anchor.x + LEFT_EARRING_OFFSET_X,
            anchor.y,
            EARRING_SIZE.0,
            EARRING_SIZE.1,
        )
    }

    pub fn right_earring_rect(anchor: Point2D) -> Rect {
        Rect::new(
            anchor.x + RIGHT_EARRING_OFFSET_X,
            anchor.y,
            EARRING_SIZE.0,
            EARRING_SIZE.1,
        )
    }

    pub fn necklace_rect(anchor: Point2D) -> Rect {
        Rect::new(
            anchor.x + NECKLACE_OFFSET_X,
            anchor.y,
            NECKLACE_SIZE.0,
            NECKLACE_SIZE.1,
        )
    }

    /// Destination rects for `category` given the available anchors.
    ///
    /// Earrings yield one rect per available ear; a missing ear does not
    /// suppress the other.
    pub fn placements(category: Category, anchors: &AnchorSet) -> Vec<Rect> {
        match category {
            Category::Earrings => [
                anchors.left_ear.map(Self::left_earring_rect),
                anchors.right_ear.map(Self::right_earring_rect),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Category::Necklaces => anchors.chin.map(Self::necklace_rect).into_iter().collect(),
        }
    }

    /// Draw the active overlay without clearing. Returns the number of images drawn.
    pub fn draw<S: Surface + ?Sized>(
        surface: &mut S,
        active: Option<Category>,
        image: Option<&OverlayImage>,
        anchors: &AnchorSet,
    ) -> usize {
        let (Some(category), Some(image)) = (active, image) else {
            return 0;
        };
        let rects = Self::placements(category, anchors);
        for rect in &rects {
            surface.draw_image(image, *rect);
        }
        rects.len()
    }

    /// Full clear-and-redraw for one frame.
    pub fn render_frame<S: Surface + ?Sized>(
        surface: &mut S,
        active: Option<Category>,
        image: Option<&OverlayImage>,
        anchors: &AnchorSet,
    ) -> usize {
        surface.clear();
        Self::draw(surface, active, image, anchors)
    }
}
