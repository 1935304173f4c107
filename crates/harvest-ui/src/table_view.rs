//! Day view: one worker table per section.
//!
//! Each section gets a bordered [`ratatui::widgets::Table`] with one row per
//! worker plus a highlighted total row, laid out in a two-column grid.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use harvest_core::formatting::{format_quantity, share_percent};
use harvest_data::aggregator::SectionBreakdown;

use crate::themes::Theme;

/// Number of section tables per grid row.
const GRID_COLUMNS: usize = 2;

/// Render every section's worker table for the selected day into `area`.
///
/// `day_total` is used for each section's share of the day in its title.
pub fn render_day_view(
    frame: &mut Frame,
    area: Rect,
    tables: &[SectionBreakdown],
    day_total: f64,
    theme: &Theme,
) {
    if tables.is_empty() {
        return;
    }

    let grid_rows = tables.len().div_ceil(GRID_COLUMNS);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, grid_rows as u32); grid_rows])
        .split(area);

    for (chunk, row_area) in tables.chunks(GRID_COLUMNS).zip(row_areas.iter()) {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
            .split(*row_area);

        for (breakdown, cell_area) in chunk.iter().zip(cells.iter()) {
            render_section_table(frame, *cell_area, breakdown, day_total, theme);
        }
    }
}

/// Render one section's workers with a total row.
pub fn render_section_table(
    frame: &mut Frame,
    area: Rect,
    breakdown: &SectionBreakdown,
    day_total: f64,
    theme: &Theme,
) {
    let header_cells = ["No", "Nama Pemanen", "Janjang"]
        .iter()
        .map(|h| Cell::from(*h).style(theme.table_header));
    let header = Row::new(header_cells).height(1);

    let mut rows: Vec<Row> = breakdown
        .workers
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(vec![
                Cell::from(format!("{}", i + 1)),
                Cell::from(w.worker.clone()),
                Cell::from(format_quantity(w.quantity)),
            ])
            .style(style)
        })
        .collect();

    if rows.is_empty() {
        rows.push(
            Row::new(vec![
                Cell::from(""),
                Cell::from("Belum ada data"),
                Cell::from(""),
            ])
            .style(theme.dim),
        );
    }

    let total = breakdown.total();
    rows.push(
        Row::new(vec![
            Cell::from(""),
            Cell::from("TOTAL").style(theme.table_total),
            Cell::from(format_quantity(total)),
        ])
        .style(theme.table_total),
    );

    let widths = [
        Constraint::Length(4),
        Constraint::Min(16),
        Constraint::Length(10),
    ];

    let title = format!(
        " Seksi {} · {}% ",
        breakdown.section,
        share_percent(total, day_total)
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(title, theme.header)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Placeholder shown when the sheet has no usable rows.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No harvest data available", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            "Check the export path and the column bindings.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Harvest Dashboard "),
        ),
        area,
    );
}

/// Placeholder shown when the sheet could not be loaded or aggregated.
pub fn render_error(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("Could not load the harvest sheet", theme.error)),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme.text)),
        Line::from(""),
        Line::from(Span::styled("Press 'r' to retry, 'q' to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.error)
                .title(" Error "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_data::aggregator::WorkerQuantity;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn make_tables() -> Vec<SectionBreakdown> {
        let section = |name: &str, workers: &[(&str, f64)]| SectionBreakdown {
            section: name.to_string(),
            workers: workers
                .iter()
                .map(|(w, q)| WorkerQuantity {
                    worker: w.to_string(),
                    quantity: *q,
                })
                .collect(),
        };
        vec![
            section("A III", &[("Agus", 15.0), ("Budi", 10.0)]),
            section("B III", &[]),
            section("C II", &[("Sari", 1234.0)]),
            section("D I", &[("Udin", 4.0)]),
        ]
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_render_day_view_shows_sections_and_workers() {
        let backend = TestBackend::new(120, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let tables = make_tables();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_day_view(frame, area, &tables, 1263.0, &theme);
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Seksi A III"));
        assert!(text.contains("Seksi D I"));
        assert!(text.contains("Agus"));
        assert!(text.contains("1,234"));
        assert!(text.contains("Belum ada data"));
    }

    #[test]
    fn test_render_day_view_small_area_does_not_panic() {
        let backend = TestBackend::new(20, 5);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::classic();
        let tables = make_tables();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_day_view(frame, area, &tables, 0.0, &theme);
            })
            .unwrap();
    }

    #[test]
    fn test_render_day_view_odd_section_count() {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::light();
        let mut tables = make_tables();
        tables.truncate(3);

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_day_view(frame, area, &tables, 1259.0, &theme);
            })
            .unwrap();

        assert!(buffer_text(&terminal).contains("Seksi C II"));
    }

    #[test]
    fn test_render_no_data_does_not_panic() {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| render_no_data(frame, frame.area(), &theme))
            .unwrap();

        assert!(buffer_text(&terminal).contains("No harvest data available"));
    }

    #[test]
    fn test_render_error_shows_message() {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| {
                render_error(frame, frame.area(), "Export file not found", &theme)
            })
            .unwrap();

        assert!(buffer_text(&terminal).contains("Export file not found"));
    }
}
