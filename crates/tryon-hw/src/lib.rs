//! tryon-hw: Hardware abstraction for webcam capture.
//!
//! Provides V4L2-based camera access and conversion of the negotiated
//! pixel format into RGB24 frames.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, DeviceInfo, FrameStream, PixelFormat};
pub use frame::{Frame, FrameError};
