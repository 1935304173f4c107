use chrono::{DateTime, Local};
use harvest_core::formatting::format_number;
use ratatui::text::{Line, Span};

use crate::themes::Theme;

// ── StatusIndicator ──────────────────────────────────────────────────────────

/// Footer line describing the last refresh.
///
/// | State              | Marker | Style   |
/// |--------------------|--------|---------|
/// | waiting for data   | ○      | dim     |
/// | fresh              | ●      | info    |
/// | serving stale rows | ▲      | warning |
/// | no usable rows     | ✖      | error   |
pub struct StatusIndicator<'a> {
    pub refreshed_at: Option<DateTime<Local>>,
    pub rows: usize,
    pub has_data: bool,
    pub error: Option<&'a str>,
    pub theme: &'a Theme,
}

impl<'a> StatusIndicator<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self {
            refreshed_at: None,
            rows: 0,
            has_data: false,
            error: None,
            theme,
        }
    }

    pub fn marker(&self) -> &'static str {
        match (self.refreshed_at, self.has_data, self.error) {
            (None, _, _) => "○",
            (_, true, None) => "●",
            (_, true, Some(_)) => "▲",
            (_, false, _) => "✖",
        }
    }

    pub fn to_line(&self) -> Line<'a> {
        let Some(at) = self.refreshed_at else {
            return Line::from(Span::styled("○ Loading sheet…", self.theme.dim));
        };

        let time = at.format("%H:%M:%S").to_string();
        let mut spans = vec![
            Span::raw(format!("{} ", self.marker())),
            Span::styled("Updated ", self.theme.label),
            Span::styled(time, self.theme.value),
            Span::styled(
                format!(" · {} rows", format_number(self.rows as f64, 0)),
                self.theme.label,
            ),
        ];

        if let Some(err) = self.error {
            let style = if self.has_data {
                self.theme.warning
            } else {
                self.theme.error
            };
            spans[0].style = style;
            spans.push(Span::styled(format!(" · {err}"), style));
        } else {
            spans[0].style = self.theme.info;
        }

        Line::from(spans)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_status_waiting() {
        let theme = Theme::dark();
        let status = StatusIndicator::new(&theme);
        assert_eq!(status.marker(), "○");
        assert!(text(&status.to_line()).contains("Loading"));
    }

    #[test]
    fn test_status_fresh() {
        let theme = Theme::dark();
        let status = StatusIndicator {
            refreshed_at: Some(Local::now()),
            rows: 1500,
            has_data: true,
            ..StatusIndicator::new(&theme)
        };
        assert_eq!(status.marker(), "●");
        let line = status.to_line();
        assert!(text(&line).contains("1,500 rows"));
        assert_eq!(line.spans[0].style, theme.info);
    }

    #[test]
    fn test_status_stale_and_failed() {
        let theme = Theme::dark();
        let stale = StatusIndicator {
            refreshed_at: Some(Local::now()),
            has_data: true,
            error: Some("timeout"),
            ..StatusIndicator::new(&theme)
        };
        assert_eq!(stale.marker(), "▲");
        assert!(text(&stale.to_line()).ends_with(" · timeout"));

        let failed = StatusIndicator {
            has_data: false,
            ..stale
        };
        assert_eq!(failed.marker(), "✖");
        assert_eq!(failed.to_line().spans[0].style, theme.error);
    }
}
