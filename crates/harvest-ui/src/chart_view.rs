//! Month and year chart views.
//!
//! A [`ChartPayload`] is drawn as one horizontal bar per point, scaled to
//! the series peak, followed by the period total.

use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use harvest_core::formatting::{format_quantity, month_name};
use harvest_runtime::dashboard::{ChartPayload, ChartPoint};

use crate::components::quantity_bar::QuantityBar;
use crate::themes::Theme;

/// Columns reserved for the label, separator and value around each bar.
const BAR_CHROME: u16 = 24;

/// Title of the chart block, e.g. `Seksi A III · Oktober 2025`.
pub fn chart_title(chart: &ChartPayload) -> String {
    match chart.month {
        Some(month) => format!(
            " Seksi {} · {} {} ",
            chart.section,
            month_name(month),
            chart.year
        ),
        None => format!(" Seksi {} · {} ", chart.section, chart.year),
    }
}

/// Bar label for a point: the day for daily series, the month name for
/// monthly series.
pub fn point_label(chart: &ChartPayload, point: &ChartPoint) -> String {
    let tail = point.x.rsplit('-').next().unwrap_or(&point.x);
    match chart.month {
        Some(_) => tail.to_string(),
        None => tail
            .parse::<u32>()
            .map(|m| month_name(m).to_string())
            .unwrap_or_else(|_| point.x.clone()),
    }
}

/// Build the chart body as lines: one bar per point and a total line.
pub fn chart_lines<'a>(chart: &ChartPayload, bar_width: u16, theme: &'a Theme) -> Vec<Line<'a>> {
    let peak = chart.data.iter().map(|p| p.y).fold(0.0_f64, f64::max);
    let total: f64 = chart.data.iter().map(|p| p.y).sum();

    let mut lines: Vec<Line<'a>> = chart
        .data
        .iter()
        .map(|p| {
            QuantityBar::new(point_label(chart, p), p.y, peak, theme)
                .with_width(bar_width)
                .to_line()
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Total ", theme.label),
        Span::styled(format!("{} janjang", format_quantity(total)), theme.table_total),
        Span::styled("  ·  puncak ", theme.label),
        Span::styled(format_quantity(peak), theme.value),
    ]));
    lines
}

/// Render a chart payload into `area`.
pub fn render_chart_view(frame: &mut Frame, area: Rect, chart: &ChartPayload, theme: &Theme) {
    let bar_width = area.width.saturating_sub(BAR_CHROME).max(1);

    let body = if chart.data.is_empty() {
        vec![Line::from(Span::styled("Tidak ada data untuk periode ini", theme.dim))]
    } else {
        chart_lines(chart, bar_width, theme)
    };

    frame.render_widget(
        Paragraph::new(Text::from(body)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(chart_title(chart), theme.header)),
        ),
        area,
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn daily() -> ChartPayload {
        ChartPayload {
            ok: true,
            section: "A III".to_string(),
            year: 2025,
            month: Some(2),
            data: (1..=28)
                .map(|d| ChartPoint {
                    x: format!("2025-02-{d:02}"),
                    y: if d == 14 { 40.0 } else { 0.0 },
                })
                .collect(),
        }
    }

    fn monthly() -> ChartPayload {
        ChartPayload {
            ok: true,
            section: "C II".to_string(),
            year: 2025,
            month: None,
            data: (1..=12)
                .map(|m| ChartPoint {
                    x: format!("2025-{m:02}"),
                    y: m as f64 * 10.0,
                })
                .collect(),
        }
    }

    #[test]
    fn test_chart_title() {
        assert_eq!(chart_title(&daily()), " Seksi A III · Februari 2025 ");
        assert_eq!(chart_title(&monthly()), " Seksi C II · 2025 ");
    }

    #[test]
    fn test_point_labels() {
        let d = daily();
        assert_eq!(point_label(&d, &d.data[13]), "14");
        let m = monthly();
        assert_eq!(point_label(&m, &m.data[0]), "Januari");
        assert_eq!(point_label(&m, &m.data[11]), "Desember");
    }

    #[test]
    fn test_chart_lines_one_per_point_plus_total() {
        let theme = Theme::dark();
        let lines = chart_lines(&monthly(), 20, &theme);
        assert_eq!(lines.len(), 12 + 2);

        let total: String = lines[13].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(total, "Total 780 janjang  ·  puncak 120");
    }

    #[test]
    fn test_render_chart_view_does_not_panic() {
        let backend = TestBackend::new(100, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| render_chart_view(frame, frame.area(), &daily(), &theme))
            .unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Februari 2025"));
    }

    #[test]
    fn test_render_empty_chart_and_narrow_area() {
        let backend = TestBackend::new(10, 5);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::light();
        let empty = ChartPayload {
            data: Vec::new(),
            ..daily()
        };

        terminal
            .draw(|frame| {
                render_chart_view(frame, frame.area(), &empty, &theme);
            })
            .unwrap();
        terminal
            .draw(|frame| {
                render_chart_view(frame, frame.area(), &monthly(), &theme);
            })
            .unwrap();
    }
}
