//! tryon-session: Everything between the camera and the overlay renderer.
//!
//! Owns the per-category asset cache, the selection state machine, the
//! external landmark tracker adapter and snapshot composition. Network
//! work runs as spawned tasks that report back as [`tasks::Completion`]s,
//! so all session state is mutated from a single owner.

pub mod assets;
pub mod controller;
pub mod loader;
pub mod snapshot;
pub mod tasks;
pub mod tracker;
pub mod ui;

pub use assets::{AssetCache, AssetError, AssetSource, DriveFolderSource, FolderIds};
pub use controller::{LoadRequest, RefreshRequest, SessionController};
pub use loader::{HttpImageLoader, ImageLoader, LoadError};
pub use snapshot::{save_snapshot, SnapshotError};
pub use tasks::{Completion, TaskRunner};
pub use tracker::{LandmarkTracker, SubprocessTracker, TrackerError};
pub use ui::{Banner, Ui};
