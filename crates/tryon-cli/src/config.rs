use std::path::PathBuf;
use std::time::Duration;
use tryon_session::FolderIds;

const DEFAULT_EARRINGS_FOLDER: &str = "1yWsTeNK2dNQHDQW8kmVmQi9HYt2KS31R";
const DEFAULT_NECKLACES_FOLDER: &str = "18eo7br_goagjXem99wQ27EgpdlcQ9aG7";

/// Runtime configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Requested capture size; the driver may pick the nearest it supports.
    pub capture_width: u32,
    pub capture_height: u32,
    /// Frames discarded after the stream starts (auto-exposure settling).
    pub warmup_frames: usize,
    /// Drive folder IDs holding the earring and necklace images.
    pub folders: FolderIds,
    /// How often the active category's listing is re-fetched.
    pub refresh_interval: Duration,
    /// How long notifications stay visible.
    pub notify_duration: Duration,
    /// Face-mesh helper command line.
    pub tracker_command: String,
    /// Positions averaged per tracked region.
    pub smoothing_window: usize,
    /// Where snapshots are written.
    pub snapshot_dir: PathBuf,
    /// If set, the live composite is periodically written here as PNG.
    pub preview_path: Option<PathBuf>,
    pub preview_interval: Duration,
}

impl Config {
    /// Load configuration from `TRYON_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let refresh_secs = env_u64(&get, "TRYON_REFRESH_INTERVAL_SECS", 300).max(1);
        let preview_ms = env_u64(&get, "TRYON_PREVIEW_INTERVAL_MS", 500);

        Self {
            camera_device: get("TRYON_CAMERA_DEVICE").unwrap_or_else(|| "/dev/video0".to_string()),
            capture_width: env_u32(&get, "TRYON_CAPTURE_WIDTH", 1280),
            capture_height: env_u32(&get, "TRYON_CAPTURE_HEIGHT", 720),
            warmup_frames: env_usize(&get, "TRYON_WARMUP_FRAMES", 4),
            folders: FolderIds {
                earrings: get("TRYON_EARRINGS_FOLDER")
                    .unwrap_or_else(|| DEFAULT_EARRINGS_FOLDER.to_string()),
                necklaces: get("TRYON_NECKLACES_FOLDER")
                    .unwrap_or_else(|| DEFAULT_NECKLACES_FOLDER.to_string()),
            },
            refresh_interval: Duration::from_secs(refresh_secs),
            notify_duration: Duration::from_secs(env_u64(&get, "TRYON_NOTIFY_SECS", 5)),
            tracker_command: get("TRYON_TRACKER_CMD")
                .unwrap_or_else(|| "python3 scripts/face_mesh.py".to_string()),
            smoothing_window: env_usize(&get, "TRYON_SMOOTHING_WINDOW", 5),
            snapshot_dir: get("TRYON_SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            preview_path: get("TRYON_PREVIEW_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            preview_interval: Duration::from_millis(preview_ms),
        }
    }
}

fn env_u32(get: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> u32 {
    get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(get: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(get: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.camera_device, "/dev/video0");
        assert_eq!((cfg.capture_width, cfg.capture_height), (1280, 720));
        assert_eq!(cfg.refresh_interval, Duration::from_secs(300));
        assert_eq!(cfg.smoothing_window, 5);
        assert_eq!(cfg.folders.earrings, DEFAULT_EARRINGS_FOLDER);
        assert!(cfg.preview_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("TRYON_CAMERA_DEVICE", "/dev/video4"),
            ("TRYON_REFRESH_INTERVAL_SECS", "60"),
            ("TRYON_NECKLACES_FOLDER", "abc"),
            ("TRYON_PREVIEW_PATH", "/tmp/preview.png"),
        ]);
        assert_eq!(cfg.camera_device, "/dev/video4");
        assert_eq!(cfg.refresh_interval, Duration::from_secs(60));
        assert_eq!(cfg.folders.necklaces, "abc");
        assert_eq!(cfg.preview_path, Some(PathBuf::from("/tmp/preview.png")));
    }

    #[test]
    fn test_unparseable_falls_back() {
        let cfg = config(&[("TRYON_CAPTURE_WIDTH", "wide"), ("TRYON_REFRESH_INTERVAL_SECS", "0")]);
        assert_eq!(cfg.capture_width, 1280);
        assert_eq!(cfg.refresh_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_out_of_range_falls_back() {
        let cfg = config(&[
            ("TRYON_CAPTURE_WIDTH", "4294968576"),
            ("TRYON_CAPTURE_HEIGHT", "-720"),
        ]);
        assert_eq!((cfg.capture_width, cfg.capture_height), (1280, 720));
    }
}
