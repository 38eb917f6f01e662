//! User-facing surface the session talks to.

use std::time::{Duration, Instant};
use tryon_core::{AssetReference, Category};

/// How long a notification stays up by default.
pub const DEFAULT_BANNER_DURATION: Duration = Duration::from_secs(5);

/// Option panels, loading indicator and notifications.
pub trait Ui {
    /// Hide every option panel and show the one for `category`.
    fn show_panel(&mut self, category: Category);
    /// Rebuild the selectable options for `category`.
    fn show_options(&mut self, category: Category, assets: &[AssetReference]);
    fn set_loading(&mut self, loading: bool);
    /// Show a transient, auto-dismissing message.
    fn notify(&mut self, message: &str);
}

/// A single auto-dismissing message slot. Newer messages replace older ones.
#[derive(Debug, Clone)]
pub struct Banner {
    message: Option<(String, Instant)>,
    duration: Duration,
}

impl Default for Banner {
    fn default() -> Self {
        Self::new(DEFAULT_BANNER_DURATION)
    }
}

impl Banner {
    pub fn new(duration: Duration) -> Self {
        Self {
            message: None,
            duration,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.message = Some((message.into(), now + self.duration));
    }

    /// The visible message at `now`, if it has not expired.
    pub fn current(&self, now: Instant) -> Option<&str> {
        match &self.message {
            Some((msg, expires)) if now < *expires => Some(msg),
            _ => None,
        }
    }

    /// When the current message goes away.
    pub fn expires_at(&self) -> Option<Instant> {
        self.message.as_ref().map(|(_, e)| *e)
    }

    /// Drop an expired message. Returns true if something was dismissed.
    pub fn dismiss_expired(&mut self, now: Instant) -> bool {
        if matches!(&self.message, Some((_, expires)) if now >= *expires) {
            self.message = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_expires() {
        let t0 = Instant::now();
        let mut banner = Banner::new(Duration::from_secs(3));
        banner.show("fetch failed", t0);
        assert_eq!(banner.current(t0 + Duration::from_secs(1)), Some("fetch failed"));
        assert_eq!(banner.current(t0 + Duration::from_secs(3)), None);
        assert!(!banner.dismiss_expired(t0 + Duration::from_secs(2)));
        assert!(banner.dismiss_expired(t0 + Duration::from_secs(4)));
        assert!(banner.expires_at().is_none());
    }

    #[test]
    fn test_banner_replaced() {
        let t0 = Instant::now();
        let mut banner = Banner::default();
        banner.show("first", t0);
        banner.show("second", t0);
        assert_eq!(banner.current(t0), Some("second"));
    }
}
