//! Main application state and TUI event loop for the harvest dashboard.
//!
//! [`App`] owns the theme, the active view, the current selection (date,
//! section, chart period) and the last received [`DashboardUpdate`].

use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::sync::mpsc;

use harvest_runtime::dashboard::DashboardService;
use harvest_runtime::orchestrator::{DashboardHandle, DashboardUpdate};

use crate::chart_view;
use crate::components::header::Header;
use crate::components::indicators::StatusIndicator;
use crate::table_view;
use crate::themes::Theme;

/// Tab labels, in [`ViewMode`] order.
pub const VIEW_TABS: [&str; 3] = ["Hari", "Bulan", "Tahun"];

const HELP: &str = "←/→ tanggal  Tab tampilan  s seksi  [/] bulan  {/} tahun  r muat ulang  q keluar";

// ── ViewMode ──────────────────────────────────────────────────────────────────

/// Which view the TUI is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Per-section worker tables for one date.
    Day,
    /// Daily bars of one section for one month.
    Month,
    /// Monthly bars of one section for one year.
    Year,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            ViewMode::Day => ViewMode::Month,
            ViewMode::Month => ViewMode::Year,
            ViewMode::Year => ViewMode::Day,
        }
    }

    pub fn previous(self) -> Self {
        self.next().next()
    }

    pub fn index(self) -> usize {
        match self {
            ViewMode::Day => 0,
            ViewMode::Month => 1,
            ViewMode::Year => 2,
        }
    }
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    None,
    Refresh,
    Quit,
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the harvest dashboard TUI.
pub struct App {
    pub theme: Theme,
    pub view_mode: ViewMode,
    /// Latest aggregated sheet; `None` until usable data arrives.
    service: Option<Arc<DashboardService>>,
    last_error: Option<String>,
    rows: usize,
    refreshed_at: Option<DateTime<Local>>,
    /// Requested day; the newest date is shown when unset or unavailable.
    selected_date: Option<NaiveDate>,
    section_index: usize,
    year: i32,
    month: u32,
}

impl App {
    /// Construct an application whose chart views open on `today`'s month.
    pub fn new(theme_name: &str, view_mode: ViewMode, date: Option<NaiveDate>, today: NaiveDate) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            view_mode,
            service: None,
            last_error: None,
            rows: 0,
            refreshed_at: None,
            selected_date: date,
            section_index: 0,
            year: today.year(),
            month: today.month(),
        }
    }

    /// Focus the chart views on `section` when it is known once data arrives.
    pub fn with_section(mut self, section: Option<&str>, sections: &[String]) -> Self {
        if let Some(idx) = section.and_then(|s| sections.iter().position(|k| k == s)) {
            self.section_index = idx;
        }
        self
    }

    /// Open the chart views on `year`/`month` instead of today.
    pub fn with_period(mut self, year: Option<i32>, month: Option<u32>) -> Self {
        if let Some(y) = year {
            self.year = y;
        }
        if let Some(m) = month.filter(|m| (1..=12).contains(m)) {
            self.month = m;
        }
        self
    }

    // ── Public event loop ─────────────────────────────────────────────────────

    /// Run the dashboard, receiving refreshed data from `rx`.
    ///
    /// Uses `crossterm::event::poll` with a 250 ms timeout so the terminal
    /// event loop stays on the current thread while updates arrive on the
    /// channel via `try_recv`. Exits on `q`, `Q` or `Ctrl+C`.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<DashboardUpdate>,
        handle: DashboardHandle,
    ) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        match self.handle_key(key) {
                            AppAction::Quit => break Ok(()),
                            AppAction::Refresh => handle.request_refresh(),
                            AppAction::None => {}
                        }
                    }
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            // Drain pending updates without blocking.
            let mut disconnected = false;
            loop {
                match rx.try_recv() {
                    Ok(update) => self.apply_update(update),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
            if disconnected {
                tracing::debug!("update channel closed; leaving dashboard");
                break Ok(());
            }
        };

        handle.abort();

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    // ── State updates ─────────────────────────────────────────────────────────

    /// Store a refresh result from the orchestrator.
    pub fn apply_update(&mut self, update: DashboardUpdate) {
        self.service = update.service;
        self.last_error = update.error;
        self.rows = update.rows;
        self.refreshed_at = Some(update.refreshed_at);

        let section_count = self.sections().len();
        if section_count > 0 && self.section_index >= section_count {
            self.section_index = 0;
        }
    }

    /// Apply a key press and report what the event loop should do.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => AppAction::Quit,
            KeyCode::Char('q') | KeyCode::Char('Q') => AppAction::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => AppAction::Refresh,
            KeyCode::Tab => {
                self.view_mode = self.view_mode.next();
                AppAction::None
            }
            KeyCode::BackTab => {
                self.view_mode = self.view_mode.previous();
                AppAction::None
            }
            KeyCode::Left => {
                self.step_date(1);
                AppAction::None
            }
            KeyCode::Right => {
                self.step_date(-1);
                AppAction::None
            }
            KeyCode::Char('s') => {
                self.step_section(1);
                AppAction::None
            }
            KeyCode::Char('S') => {
                self.step_section(-1);
                AppAction::None
            }
            KeyCode::Char('[') => {
                self.step_month(-1);
                AppAction::None
            }
            KeyCode::Char(']') => {
                self.step_month(1);
                AppAction::None
            }
            KeyCode::Char('{') => {
                self.year -= 1;
                AppAction::None
            }
            KeyCode::Char('}') => {
                self.year += 1;
                AppAction::None
            }
            _ => AppAction::None,
        }
    }

    /// The date the day view shows: the requested one when it has data,
    /// otherwise the newest.
    pub fn current_date(&self) -> Option<NaiveDate> {
        let service = self.service.as_ref()?;
        let dates = service.available_dates();
        self.selected_date
            .filter(|d| dates.contains(d))
            .or_else(|| dates.first().copied())
    }

    pub fn current_section(&self) -> Option<&str> {
        self.sections().get(self.section_index).map(String::as_str)
    }

    pub fn period(&self) -> (i32, u32) {
        (self.year, self.month)
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn sections(&self) -> &[String] {
        self.service.as_ref().map(|s| s.sections()).unwrap_or(&[])
    }

    /// Move through the available dates; positive steps go back in time.
    fn step_date(&mut self, step: isize) {
        let Some(service) = self.service.as_ref() else {
            return;
        };
        let dates = service.available_dates();
        let Some(current) = self.current_date() else {
            return;
        };
        let idx = dates.iter().position(|d| *d == current).unwrap_or(0) as isize;
        let target = (idx + step).clamp(0, dates.len() as isize - 1) as usize;
        self.selected_date = dates.get(target).copied();
    }

    fn step_section(&mut self, step: isize) {
        let count = self.sections().len() as isize;
        if count == 0 {
            return;
        }
        self.section_index = (self.section_index as isize + step).rem_euclid(count) as usize;
    }

    fn step_month(&mut self, step: i32) {
        let zero_based = self.month as i32 - 1 + step;
        self.year += zero_based.div_euclid(12);
        self.month = zero_based.rem_euclid(12) as u32 + 1;
    }

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(3),
                Constraint::Length(2),
            ])
            .split(frame.area());

        let date = self.current_date();
        let day_total = match (&self.service, date) {
            (Some(service), Some(d)) => service.aggregator().totals_for_date(d).total,
            _ => 0.0,
        };

        let header = Header::new(&VIEW_TABS, self.view_mode.index(), &self.theme)
            .with_selection(date, day_total, self.current_section());
        frame.render_widget(Paragraph::new(header.to_lines()), chunks[0]);

        self.render_body(frame, chunks[1]);

        let status = StatusIndicator {
            refreshed_at: self.refreshed_at,
            rows: self.rows,
            has_data: self.service.is_some(),
            error: self.last_error.as_deref(),
            theme: &self.theme,
        };
        frame.render_widget(
            Paragraph::new(vec![
                status.to_line(),
                Line::from(Span::styled(HELP, self.theme.dim)),
            ]),
            chunks[2],
        );
    }

    fn render_body(&self, frame: &mut Frame, area: ratatui::layout::Rect) {
        let Some(service) = self.service.as_ref() else {
            match (&self.last_error, self.refreshed_at) {
                (Some(err), _) => table_view::render_error(frame, area, err, &self.theme),
                (None, Some(_)) => table_view::render_no_data(frame, area, &self.theme),
                (None, None) => frame.render_widget(
                    Paragraph::new(Span::styled("Memuat data…", self.theme.dim)),
                    area,
                ),
            }
            return;
        };

        match self.view_mode {
            ViewMode::Day => {
                let snapshot = service.snapshot(self.current_date());
                if snapshot.selected_date.is_none() {
                    table_view::render_no_data(frame, area, &self.theme);
                } else {
                    table_view::render_day_view(
                        frame,
                        area,
                        &snapshot.tables,
                        snapshot.total,
                        &self.theme,
                    );
                }
            }
            ViewMode::Month | ViewMode::Year => {
                let Some(section) = self.current_section() else {
                    table_view::render_no_data(frame, area, &self.theme);
                    return;
                };
                let chart = if self.view_mode == ViewMode::Month {
                    service.monthly_chart(section, self.year, self.month)
                } else {
                    service.yearly_chart(section, self.year)
                };
                chart_view::render_chart_view(frame, area, &chart, &self.theme);
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
