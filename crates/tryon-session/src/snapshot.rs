//! Still capture: current video frame plus the active overlay, as PNG.

use crate::controller::SessionController;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tryon_core::render::RenderError;
use tryon_core::RgbaCanvas;
use tryon_hw::Frame;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("camera not ready")]
    CameraNotReady,
    #[error("frame buffer does not match {width}x{height}")]
    BadFrame { width: u32, height: u32 },
    #[error("failed to create snapshot directory: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// `jewelry-tryon-<unix millis>.png`
pub fn snapshot_file_name(unix_millis: i64) -> String {
    format!("jewelry-tryon-{unix_millis}.png")
}

fn background(frame: Option<&Frame>) -> Result<RgbaCanvas, SnapshotError> {
    let frame = frame.ok_or(SnapshotError::CameraNotReady)?;
    if frame.width == 0 || frame.height == 0 {
        return Err(SnapshotError::CameraNotReady);
    }
    RgbaCanvas::from_rgb(frame.width, frame.height, &frame.data).ok_or(SnapshotError::BadFrame {
        width: frame.width,
        height: frame.height,
    })
}

/// Composite `frame` with the controller's active overlay at its smoothed anchors.
///
/// Does not feed the smoothing buffers.
pub fn compose(
    frame: Option<&Frame>,
    controller: &SessionController,
) -> Result<RgbaCanvas, SnapshotError> {
    let mut canvas = background(frame)?;
    let drawn = controller.draw_overlay(&mut canvas);
    tracing::debug!(drawn, "snapshot composed");
    Ok(canvas)
}

/// Layer an already rendered overlay canvas (the per-frame clear-and-redraw
/// output) over `frame`.
pub fn composite(
    frame: Option<&Frame>,
    overlay: &RgbaCanvas,
) -> Result<RgbaCanvas, SnapshotError> {
    let mut canvas = background(frame)?;
    canvas.layer(overlay);
    Ok(canvas)
}

/// Compose and write a snapshot into `dir`. Nothing is written on failure.
pub fn save_snapshot(
    frame: Option<&Frame>,
    controller: &SessionController,
    dir: &Path,
) -> Result<PathBuf, SnapshotError> {
    let canvas = compose(frame, controller)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(snapshot_file_name(chrono::Utc::now().timestamp_millis()));
    canvas.save_png(&path)?;
    tracing::info!(path = %path.display(), "snapshot saved");
    Ok(path)
}
