use chrono::NaiveDate;
use harvest_core::formatting::format_quantity;
use ratatui::text::{Line, Span};

use crate::themes::Theme;

/// Application title shown on the first header line.
pub const TITLE: &str = "HARVEST DASHBOARD";

/// Dashboard header rendering four lines:
///
/// 1. Application title.
/// 2. A 60-column `=` separator.
/// 3. View tabs with the active one highlighted.
/// 4. `[ date | total | section ]` summary of the current selection.
pub struct Header<'a> {
    /// Tab labels in cycle order.
    pub tabs: &'a [&'a str],
    /// Index of the active tab.
    pub active_tab: usize,
    pub selected_date: Option<NaiveDate>,
    /// Total for the selected date.
    pub total: f64,
    /// Section the chart views focus on.
    pub section: Option<&'a str>,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(tabs: &'a [&'a str], active_tab: usize, theme: &'a Theme) -> Self {
        Self {
            tabs,
            active_tab,
            selected_date: None,
            total: 0.0,
            section: None,
            theme,
        }
    }

    pub fn with_selection(mut self, date: Option<NaiveDate>, total: f64, section: Option<&'a str>) -> Self {
        self.selected_date = date;
        self.total = total;
        self.section = section;
        self
    }

    pub fn to_lines(&self) -> Vec<Line<'a>> {
        let mut tab_spans = Vec::with_capacity(self.tabs.len() * 2);
        for (i, tab) in self.tabs.iter().enumerate() {
            if i > 0 {
                tab_spans.push(Span::styled(" │ ", self.theme.separator));
            }
            let style = if i == self.active_tab {
                self.theme.focus
            } else {
                self.theme.label
            };
            tab_spans.push(Span::styled(format!(" {tab} "), style));
        }

        let date = self
            .selected_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        vec![
            Line::from(Span::styled(TITLE, self.theme.header)),
            Line::from(Span::styled("=".repeat(60), self.theme.separator)),
            Line::from(tab_spans),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(date, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(format!("{} janjang", format_quantity(self.total)), self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.section.unwrap_or("-").to_string(), self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TABS: [&str; 3] = ["Hari", "Bulan", "Tahun"];

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_to_lines_count() {
        let theme = Theme::dark();
        let lines = Header::new(&TABS, 0, &theme).to_lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(text(&lines[0]), TITLE);
    }

    #[test]
    fn test_header_separator_line() {
        let theme = Theme::dark();
        let lines = Header::new(&TABS, 0, &theme).to_lines();
        let sep = text(&lines[1]);
        assert_eq!(sep.chars().count(), 60);
        assert!(sep.chars().all(|c| c == '='));
    }

    #[test]
    fn test_header_active_tab_uses_focus_style() {
        let theme = Theme::dark();
        let lines = Header::new(&TABS, 1, &theme).to_lines();
        let focused: Vec<&str> = lines[2]
            .spans
            .iter()
            .filter(|s| s.style == theme.focus)
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(focused, vec![" Bulan "]);
    }

    #[test]
    fn test_header_selection_line() {
        let theme = Theme::dark();
        let date = NaiveDate::from_ymd_opt(2025, 10, 8).unwrap();
        let lines = Header::new(&TABS, 0, &theme)
            .with_selection(Some(date), 1234.0, Some("A III"))
            .to_lines();
        assert_eq!(text(&lines[3]), "[ 2025-10-08 | 1,234 janjang | A III ]");
    }

    #[test]
    fn test_header_without_selection() {
        let theme = Theme::dark();
        let lines = Header::new(&TABS, 0, &theme).to_lines();
        assert_eq!(text(&lines[3]), "[ - | 0 janjang | - ]");
    }
}
