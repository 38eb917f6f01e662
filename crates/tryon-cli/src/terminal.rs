//! Terminal rendition of the option panels and error banner.

use std::io::Write;
use std::time::{Duration, Instant};
use tryon_core::{AssetReference, Category};
use tryon_session::{Banner, Ui};

pub struct TerminalUi {
    banner: Banner,
    loading: bool,
    panel: Option<Category>,
}

impl TerminalUi {
    pub fn new(notify_duration: Duration) -> Self {
        Self {
            banner: Banner::new(notify_duration),
            loading: false,
            panel: None,
        }
    }

    pub fn banner_expires_at(&self) -> Option<Instant> {
        self.banner.expires_at()
    }

    /// Drop an expired notification and redraw the prompt without it.
    pub fn dismiss_expired(&mut self) {
        if self.banner.dismiss_expired(Instant::now()) {
            tracing::debug!("notification dismissed");
            self.print_prompt();
        }
    }

    /// Notification still visible at `now`.
    pub fn status_at(&self, now: Instant) -> Option<&str> {
        self.banner.current(now)
    }

    /// Input prompt, led by the live notification if there is one.
    pub fn prompt_at(&self, now: Instant) -> String {
        match self.status_at(now) {
            Some(message) => format!("[!] {message}\n> "),
            None => "> ".to_string(),
        }
    }

    pub fn print_prompt(&self) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "{}", self.prompt_at(Instant::now()));
        let _ = out.flush();
    }
}

impl Ui for TerminalUi {
    fn show_panel(&mut self, category: Category) {
        if self.panel != Some(category) {
            println!("== {category} ==");
        }
        self.panel = Some(category);
    }

    fn show_options(&mut self, category: Category, assets: &[AssetReference]) {
        // Only the visible panel is printed; others refresh silently.
        if self.panel != Some(category) {
            return;
        }
        if assets.is_empty() {
            println!("  (no {category} yet)");
            return;
        }
        for (i, asset) in assets.iter().enumerate() {
            println!("  {:>2}. {}", i + 1, asset.id);
        }
    }

    fn set_loading(&mut self, loading: bool) {
        if loading && !self.loading {
            println!("  loading...");
        }
        self.loading = loading;
    }

    fn notify(&mut self, message: &str) {
        self.banner.show(message, Instant::now());
        eprintln!("[!] {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_shows_notification_until_expiry() {
        let mut ui = TerminalUi::new(Duration::from_secs(5));
        let t0 = Instant::now();
        ui.notify("Could not load earrings");

        assert_eq!(ui.status_at(t0), Some("Could not load earrings"));
        assert_eq!(ui.prompt_at(t0), "[!] Could not load earrings\n> ");
        assert_eq!(ui.status_at(t0 + Duration::from_secs(6)), None);
        assert_eq!(ui.prompt_at(t0 + Duration::from_secs(6)), "> ");
    }

    #[test]
    fn test_prompt_without_notification() {
        let ui = TerminalUi::new(Duration::from_secs(5));
        assert_eq!(ui.prompt_at(Instant::now()), "> ");
    }
}
