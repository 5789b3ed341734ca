//! Progress indicators for paperup operations.
//!
//! Wraps `indicatif` with paperup's styling. Only two shapes are needed: a
//! byte-counting bar for jar downloads and a spinner for metadata lookups
//! whose duration is unknown.
//!
//! # Environment Variables
//!
//! - `PAPERUP_NO_PROGRESS`: Set to any value to disable all progress indicators
//!
//! Progress is also hidden when the caller passes `enabled = false`, which is
//! how the `--no-progress` flag reaches this module.
//!
//! # Examples
//!
//! ```rust
//! use paperup_cli::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::new_download(Some(1024), false);
//! progress.set_prefix("paper-1.21.4-100.jar");
//! progress.inc(512);
//! progress.inc(512);
//! progress.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::time::Duration;

use crate::constants::ENV_NO_PROGRESS;

/// Checks if progress bars are disabled through `PAPERUP_NO_PROGRESS`.
///
/// # Examples
///
/// ```bash
/// # Disable progress bars (e.g. under systemd or cron)
/// export PAPERUP_NO_PROGRESS=1
/// paperup --dir /srv/minecraft
/// ```
pub fn is_progress_disabled() -> bool {
    std::env::var_os(ENV_NO_PROGRESS).is_some()
}

/// A progress indicator with consistent styling.
///
/// Hidden bars silently ignore every call, so callers never branch on whether
/// progress is shown.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a byte-counting bar for a download.
    ///
    /// `total` is the expected size when the server reports one; without it
    /// the bar still counts bytes but cannot show an ETA.
    pub fn new_download(total: Option<u64>, enabled: bool) -> Self {
        if !enabled || is_progress_disabled() {
            return Self::hidden();
        }

        let bar = match total {
            Some(len) => IndicatifBar::new(len),
            None => IndicatifBar::no_length(),
        };
        bar.set_style(ProgressStyle::download());
        Self { inner: bar }
    }

    /// Creates a spinner for work of unknown duration.
    pub fn new_spinner(enabled: bool) -> Self {
        if !enabled || is_progress_disabled() {
            return Self::hidden();
        }

        let bar = IndicatifBar::new_spinner();
        bar.set_style(ProgressStyle::spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { inner: bar }
    }

    /// A bar that draws nothing.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    /// Whether this bar draws to the terminal.
    pub fn is_hidden(&self) -> bool {
        self.inner.is_hidden()
    }

    /// Sets the message displayed next to the indicator.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Sets the prefix, typically the artifact name.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Advances the bar by `delta` units (bytes for downloads).
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Finishes the indicator and replaces it with `msg`.
    pub fn finish_with_message(&self, msg: impl Into<String>) {
        self.inner.finish_with_message(msg.into());
    }

    /// Finishes the indicator and removes it from the terminal.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

/// Predefined progress styles.
pub struct ProgressStyle;

impl ProgressStyle {
    /// Style for downloads.
    ///
    /// ```text
    /// paper-1.21.4-100.jar [━━━━━━━━━━━━━━━━━━━━╸━━━━━━━━━━━━━━━━━━━] 24.1 MiB/48.3 MiB (00:05)
    /// ```
    pub fn download() -> IndicatifStyle {
        IndicatifStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| IndicatifStyle::default_bar())
            .progress_chars("━╸━")
    }

    /// Style for spinners.
    ///
    /// ```text
    /// ⠋ Checking for the latest paper build...
    /// ```
    pub fn spinner() -> IndicatifStyle {
        IndicatifStyle::default_spinner()
            .template("{prefix:.bold} {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| IndicatifStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_disabled_download_bar_is_hidden() {
        let pb = ProgressBar::new_download(Some(100), false);
        assert!(pb.is_hidden());

        pb.set_prefix("paper-1.20.1-124.jar");
        pb.inc(40);
        pb.inc(60);
        assert_eq!(pb.position(), 100);
        pb.finish_and_clear();
    }

    #[test]
    fn test_disabled_spinner_is_hidden() {
        let spinner = ProgressBar::new_spinner(false);
        assert!(spinner.is_hidden());
        spinner.set_message("Hidden spinner");
        spinner.finish_with_message("Done");
    }

    #[test]
    fn test_progress_styles() {
        let _download = ProgressStyle::download();
        let _spinner = ProgressStyle::spinner();
    }

    #[test]
    #[serial]
    fn test_is_progress_disabled() {
        // SAFETY: serialised with every other env-mutating test.
        unsafe { std::env::remove_var(ENV_NO_PROGRESS) };
        assert!(!is_progress_disabled());

        unsafe { std::env::set_var(ENV_NO_PROGRESS, "1") };
        assert!(is_progress_disabled());
        assert!(ProgressBar::new_download(None, true).is_hidden());

        unsafe { std::env::remove_var(ENV_NO_PROGRESS) };
        assert!(!is_progress_disabled());
    }
}
