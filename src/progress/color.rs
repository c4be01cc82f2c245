//! Progress bar colours

use parking_lot::RwLock;
use thiserror::Error;

/// Rejected colour code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidColorError {
    #[error("Empty color code provided")]
    Empty,

    #[error("Invalid hex color length: {0}. Must be 6 characters.")]
    Length(String),

    #[error("Invalid hex color code: {0}")]
    Digits(String),
}

const DEFAULT_DESC: &str = "\x1b[1;32m";
const DEFAULT_BAR: &str = "\x1b[1;36m";
const DEFAULT_TEXT: &str = "\x1b[1;34m";

/// Reset sequence appended after every coloured span
pub const RESET: &str = "\x1b[0m";

lazy_static::lazy_static! {
    static ref CURRENT: RwLock<ColorConfig> = RwLock::new(ColorConfig::default());
}

/// Convert `#RRGGBB` (or `RRGGBB`) to a 256-colour foreground escape
pub fn hex_to_ansi(hex: &str) -> Result<String, InvalidColorError> {
    let hex = hex.trim_start_matches('#');

    if hex.is_empty() {
        return Err(InvalidColorError::Empty);
    }
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(InvalidColorError::Length(hex.to_string()));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| InvalidColorError::Digits(hex.to_string()))
    };
    let (r, g, b) = (channel(0..2)?, channel(2..4)?, channel(4..6)?);

    let code = if r == g && g == b {
        match r {
            0..=7 => 16,
            249..=255 => 231,
            _ => ((f64::from(r) - 8.0) / 247.0 * 24.0).round() as u32 + 232,
        }
    } else {
        let scale = |c: u8| (f64::from(c) / 255.0 * 5.0).round() as u32;
        16 + 36 * scale(r) + 6 * scale(g) + scale(b)
    };

    Ok(format!("\x1b[38;5;{}m", code))
}

fn resolve(code: &str) -> Result<String, InvalidColorError> {
    if code.starts_with('#') {
        hex_to_ansi(code)
    } else {
        Ok(code.to_string())
    }
}

/// ANSI prefixes for the three parts of a progress bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorConfig {
    /// "Uploading" / "Downloading" label
    pub desc: String,
    pub bar: String,
    /// Counters, rate and ETA
    pub text: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            desc: DEFAULT_DESC.to_string(),
            bar: DEFAULT_BAR.to_string(),
            text: DEFAULT_TEXT.to_string(),
        }
    }
}

impl ColorConfig {
    /// Copy with the given colours replaced. `#RRGGBB` values are
    /// converted, anything else is taken as a raw escape sequence.
    pub fn with_colors(
        &self,
        desc: Option<&str>,
        bar: Option<&str>,
        text: Option<&str>,
    ) -> Result<Self, InvalidColorError> {
        let mut next = self.clone();
        if let Some(desc) = desc {
            next.desc = resolve(desc)?;
        }
        if let Some(bar) = bar {
            next.bar = resolve(bar)?;
        }
        if let Some(text) = text {
            next.text = resolve(text)?;
        }
        Ok(next)
    }
}

/// Process-wide default used by [`super::TerminalProgress::new`]
pub fn current_colors() -> ColorConfig {
    CURRENT.read().clone()
}

/// Update the process-wide default colours.
///
/// Invalid input is not fatal: a warning is logged and the defaults are
/// restored.
pub fn set_progress_bar_colors(desc: Option<&str>, bar: Option<&str>, text: Option<&str>) {
    let mut current = CURRENT.write();
    match current.with_colors(desc, bar, text) {
        Ok(next) => *current = next,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid color configuration, using default colors");
            *current = ColorConfig::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_hex_to_ansi_cube() {
        assert_eq!(hex_to_ansi("#FF0000").unwrap(), "\x1b[38;5;196m");
        assert_eq!(hex_to_ansi("00ff00").unwrap(), "\x1b[38;5;46m");
        assert_eq!(hex_to_ansi("#0000FF").unwrap(), "\x1b[38;5;21m");
    }

    #[test]
    fn test_hex_to_ansi_greys() {
        assert_eq!(hex_to_ansi("#000000").unwrap(), "\x1b[38;5;16m");
        assert_eq!(hex_to_ansi("#FFFFFF").unwrap(), "\x1b[38;5;231m");
        assert_eq!(hex_to_ansi("#808080").unwrap(), "\x1b[38;5;244m");
    }

    #[test]
    fn test_hex_to_ansi_rejects_bad_input() {
        assert_eq!(hex_to_ansi("#"), Err(InvalidColorError::Empty));
        assert!(matches!(hex_to_ansi("#FFF"), Err(InvalidColorError::Length(_))));
        assert!(matches!(hex_to_ansi("#GG0000"), Err(InvalidColorError::Digits(_))));
    }

    #[test]
    fn test_with_colors_keeps_raw_escapes() {
        let colors = ColorConfig::default()
            .with_colors(Some("\x1b[1;31m"), Some("#FF0000"), None)
            .unwrap();
        assert_eq!(colors.desc, "\x1b[1;31m");
        assert_eq!(colors.bar, "\x1b[38;5;196m");
        assert_eq!(colors.text, DEFAULT_TEXT);
    }

    #[test]
    #[serial]
    fn test_set_colors_falls_back_on_error() {
        set_progress_bar_colors(None, Some("#00FF00"), None);
        assert_eq!(current_colors().bar, "\x1b[38;5;46m");

        set_progress_bar_colors(Some("#nothex"), None, None);
        assert_eq!(current_colors(), ColorConfig::default());
    }
}
