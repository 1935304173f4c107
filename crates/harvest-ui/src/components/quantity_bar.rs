use harvest_core::formatting::format_quantity;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::themes::Theme;

/// Configuration controlling the visual appearance of a quantity bar.
pub struct BarConfig {
    /// Width in terminal columns of the bar portion (excluding labels).
    pub width: u16,
    pub filled_char: char,
    pub empty_char: char,
    /// Width the leading label is padded to.
    pub label_width: usize,
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            width: 40,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
            label_width: 10,
        }
    }
}

/// Horizontal bar showing one series point relative to the series peak.
///
/// Renders as `label │████░░░░ 1,234`.
pub struct QuantityBar<'a> {
    pub label: String,
    pub quantity: f64,
    /// Largest quantity of the series; the bar fills completely at this value.
    pub peak: f64,
    pub theme: &'a Theme,
    pub config: BarConfig,
}

impl<'a> QuantityBar<'a> {
    pub fn new(label: impl Into<String>, quantity: f64, peak: f64, theme: &'a Theme) -> Self {
        Self {
            label: label.into(),
            quantity,
            peak,
            theme,
            config: BarConfig::default(),
        }
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.config.width = width;
        self
    }

    /// Number of filled columns.
    pub fn filled(&self) -> u16 {
        if self.peak <= 0.0 || self.quantity <= 0.0 {
            return 0;
        }
        let ratio = (self.quantity / self.peak).min(1.0);
        // Any non-zero quantity gets at least one column.
        ((ratio * self.config.width as f64).round() as u16).max(1)
    }

    pub fn to_line(&self) -> Line<'a> {
        let filled = self.filled();
        let empty = self.config.width.saturating_sub(filled);

        let filled_str: String =
            std::iter::repeat_n(self.config.filled_char, filled as usize).collect();
        let empty_str: String =
            std::iter::repeat_n(self.config.empty_char, empty as usize).collect();

        Line::from(vec![
            Span::styled(padded_label(&self.label, self.config.label_width), self.theme.bar_label),
            Span::styled(filled_str, self.theme.bar_style(self.quantity, self.peak)),
            Span::styled(empty_str, self.theme.bar_empty),
            Span::styled(format!(" {}", format_quantity(self.quantity)), self.theme.value),
        ])
    }
}

/// Pad `label` to `width` display columns and append the bar separator.
fn padded_label(label: &str, width: usize) -> String {
    let pad = width.saturating_sub(label.width());
    format!("{label}{} │", " ".repeat(pad))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
