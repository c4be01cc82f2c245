//! Terminal progress bar backed by indicatif

use super::color::{current_colors, ColorConfig, RESET};
use super::ProgressObserver;
use indicatif::{ProgressBar, ProgressStyle};

/// Coloured terminal progress bar.
///
/// `indicatif::ProgressBar` is internally synchronised, so concurrent part
/// workers can advance it directly.
#[derive(Debug, Clone)]
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    /// Bar using the process-wide default colours
    pub fn new(label: &str) -> Self {
        Self::with_colors(label, &current_colors())
    }

    /// Bar using explicit colours
    pub fn with_colors(label: &str, colors: &ColorConfig) -> Self {
        let bar = ProgressBar::new(0);
        let template = format!(
            "{desc}{{msg}}{reset} {bar}{{bar:20}}{reset} {text}{{bytes}}/{{total_bytes}} {{bytes_per_sec}} {{eta}}{reset}",
            desc = colors.desc,
            bar = colors.bar,
            text = colors.text,
            reset = RESET,
        );

        let style = ProgressStyle::with_template(&template)
            .map(|style| style.progress_chars("█ "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message(label.to_string());

        Self { bar }
    }

    /// Bytes drawn so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressObserver for TerminalProgress {
    fn start(&self, total_bytes: u64) {
        self.bar.set_length(total_bytes);
        self.bar.set_position(0);
    }

    fn advance(&self, bytes: u64) {
        self.bar.inc(bytes);
    }

    fn finish(&self) {
        self.bar.finish();
    }
}
