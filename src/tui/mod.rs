//! Ratatui-based terminal dashboard.
//!
//! Three tabs: Banxico and Fed show indicator cards next to a series chart
//! (picker plus start/end inputs); Markets shows one instrument group at a
//! time. A section that failed to load renders its error in place.

use std::io;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Tabs, Wrap},
};

use crate::app::pipeline::{self, Dashboard, HistoryRequest, MarketSection, Section};
use crate::config::Settings;
use crate::data::{MarketGroup, banxico, fred};
use crate::domain::{LatestRow, SeriesDescriptor, SeriesSource, TimeSeries};
use crate::error::{AppError, SourceError};
use crate::report::{NO_DATA, card_value, change_text, price_text};

mod plotters_chart;

use plotters_chart::SeriesChart;

/// Start the TUI.
pub fn run(settings: Settings) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(settings);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Banxico,
    Fed,
    Markets,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Banxico, Tab::Fed, Tab::Markets];

    fn title(self) -> &'static str {
        match self {
            Tab::Banxico => "Banxico",
            Tab::Fed => "Fed",
            Tab::Markets => "Markets",
        }
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateField {
    Start,
    End,
}

/// Series picker, date inputs and the last loaded series for one provider.
struct ChartPanel {
    source: SeriesSource,
    choices: Vec<(&'static str, &'static str)>,
    selected: usize,
    start_input: String,
    end_input: String,
    history: Option<Section<TimeSeries>>,
}

impl ChartPanel {
    fn new(source: SeriesSource) -> Self {
        Self {
            source,
            choices: pipeline::series_choices(source),
            selected: 0,
            start_input: String::new(),
            end_input: String::new(),
            history: None,
        }
    }

    fn input_mut(&mut self, field: DateField) -> &mut String {
        match field {
            DateField::Start => &mut self.start_input,
            DateField::End => &mut self.end_input,
        }
    }

    /// `Err` carries a message for the status line.
    fn request(&self) -> Result<HistoryRequest, String> {
        let key = self
            .choices
            .get(self.selected)
            .map(|(key, _)| key.to_string())
            .ok_or_else(|| "No series to chart.".to_string())?;
        Ok(HistoryRequest {
            source: self.source,
            key,
            start: parse_date_input(&self.start_input)?,
            end: parse_date_input(&self.end_input)?,
        })
    }
}

/// Empty input means "use the default".
fn parse_date_input(input: &str) -> Result<Option<NaiveDate>, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| format!("Invalid date '{trimmed}': {e}"))
}

struct App {
    settings: Settings,
    tab: Tab,
    dashboard: Option<Dashboard>,
    banxico_chart: ChartPanel,
    fred_chart: ChartPanel,
    market_group: usize,
    editing: Option<DateField>,
    needs_load: bool,
    status: String,
}

impl App {
    fn new(settings: Settings) -> Self {
        Self {
            settings,
            tab: Tab::Banxico,
            dashboard: None,
            banxico_chart: ChartPanel::new(SeriesSource::Banxico),
            fred_chart: ChartPanel::new(SeriesSource::Fred),
            market_group: 0,
            editing: None,
            needs_load: true,
            status: "Loading indicators...".to_string(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            // Loads block; the "Loading..." frame above is drawn first.
            if self.needs_load {
                self.reload();
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn reload(&mut self) {
        self.needs_load = false;
        let dashboard = pipeline::load_dashboard(&self.settings);
        let failed = [
            dashboard.banxico.is_err(),
            dashboard.fred.is_err(),
            dashboard.markets.is_err(),
        ]
        .iter()
        .filter(|f| **f)
        .count();
        self.dashboard = Some(dashboard);
        self.status = if failed == 0 {
            format!("Updated {}", self.settings.today())
        } else {
            format!("Updated {} ({failed} section(s) failed)", self.settings.today())
        };
    }

    fn chart_mut(&mut self) -> Option<&mut ChartPanel> {
        match self.tab {
            Tab::Banxico => Some(&mut self.banxico_chart),
            Tab::Fed => Some(&mut self.fred_chart),
            Tab::Markets => None,
        }
    }

    fn chart(&self) -> Option<&ChartPanel> {
        match self.tab {
            Tab::Banxico => Some(&self.banxico_chart),
            Tab::Fed => Some(&self.fred_chart),
            Tab::Markets => None,
        }
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if let Some(field) = self.editing {
            self.handle_date_edit(field, code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::Right => self.tab = self.tab.next(),
            KeyCode::BackTab | KeyCode::Left => self.tab = self.tab.prev(),
            KeyCode::Char('1') => self.tab = Tab::Banxico,
            KeyCode::Char('2') => self.tab = Tab::Fed,
            KeyCode::Char('3') => self.tab = Tab::Markets,
            KeyCode::Char('r') => {
                self.status = "Reloading...".to_string();
                self.needs_load = true;
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Char('s') => self.begin_edit(DateField::Start),
            KeyCode::Char('e') => self.begin_edit(DateField::End),
            KeyCode::Enter => self.load_chart(),
            _ => {}
        }
        false
    }

    fn move_selection(&mut self, delta: isize) {
        if self.tab == Tab::Markets {
            self.market_group = step(self.market_group, delta, MarketGroup::ALL.len());
            return;
        }
        if let Some(chart) = self.chart_mut() {
            chart.selected = step(chart.selected, delta, chart.choices.len());
        }
    }

    fn begin_edit(&mut self, field: DateField) {
        if self.chart().is_none() {
            return;
        }
        self.editing = Some(field);
        let which = match field {
            DateField::Start => "start",
            DateField::End => "end",
        };
        self.status = format!("Editing {which} date (YYYY-MM-DD, empty for default). Enter to apply, Esc to cancel.");
    }

    fn handle_date_edit(&mut self, field: DateField, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing = None;
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing = None;
                self.load_chart();
            }
            KeyCode::Backspace => {
                if let Some(chart) = self.chart_mut() {
                    chart.input_mut(field).pop();
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                if let Some(chart) = self.chart_mut() {
                    let input = chart.input_mut(field);
                    if input.len() < 10 {
                        input.push(c);
                    }
                }
            }
            _ => {}
        }
    }

    fn load_chart(&mut self) {
        let Some(chart) = self.chart() else {
            return;
        };
        let request = match chart.request() {
            Ok(r) => r,
            Err(msg) => {
                self.status = msg;
                return;
            }
        };

        let history = pipeline::load_history(&self.settings, &request);
        self.status = match &history {
            Ok(series) => format!("{}: {} observations", series.name, series.points.len()),
            Err(err) => format!("Chart failed: {err}"),
        };
        if let Some(chart) = self.chart_mut() {
            chart.history = Some(history);
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_tabs(frame, chunks[0]);
        match self.tab {
            Tab::Banxico => self.draw_indicator_tab(frame, chunks[1], "Banxico indicators", banxico::SERIES),
            Tab::Fed => self.draw_indicator_tab(frame, chunks[1], "Fed key indicators", fred::INDICATORS),
            Tab::Markets => self.draw_markets(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
            .select(self.tab.index())
            .block(Block::default().borders(Borders::ALL).title("econ"))
            .style(Style::default().fg(Color::Gray))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, area);
    }

    fn draw_indicator_tab(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        title: &str,
        catalogue: &[SeriesDescriptor],
    ) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        let rows = self.dashboard.as_ref().map(|d| match self.tab {
            Tab::Fed => &d.fred,
            _ => &d.banxico,
        });
        draw_cards(frame, columns[0], title, rows, catalogue);

        if let Some(chart) = self.chart() {
            self.draw_chart_panel(frame, columns[1], chart);
        }
    }

    fn draw_chart_panel(&self, frame: &mut ratatui::Frame<'_>, area: Rect, chart: &ChartPanel) {
        let picker_height = (chart.choices.len() as u16 + 2).min(area.height / 2);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(picker_height),
                Constraint::Length(3),
                Constraint::Min(0),
            ])
            .split(area);

        let items: Vec<ListItem> = chart
            .choices
            .iter()
            .map(|(key, name)| ListItem::new(format!("{name} ({key})")))
            .collect();
        let list = List::new(items)
            .block(Block::default().title("Series").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        state.select(Some(chart.selected));
        frame.render_stateful_widget(list, chunks[0], &mut state);

        let field_style = |field: DateField| {
            if self.editing == Some(field) {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            }
        };
        let shown = |input: &str| {
            if input.trim().is_empty() {
                "default".to_string()
            } else {
                input.to_string()
            }
        };
        let inputs = Line::from(vec![
            Span::raw("start: "),
            Span::styled(shown(&chart.start_input), field_style(DateField::Start)),
            Span::raw("   end: "),
            Span::styled(shown(&chart.end_input), field_style(DateField::End)),
        ]);
        frame.render_widget(
            Paragraph::new(inputs).block(Block::default().title("Range").borders(Borders::ALL)),
            chunks[1],
        );

        self.draw_chart(frame, chunks[2], chart);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, chart: &ChartPanel) {
        let title = match &chart.history {
            Some(Ok(series)) => format!("{} ({})", series.name, series.source.display_name()),
            _ => "Chart".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series = match &chart.history {
            None => {
                frame.render_widget(
                    Paragraph::new("Select a series and press Enter.").style(Style::default().fg(Color::Gray)),
                    inner,
                );
                return;
            }
            Some(Err(err)) => {
                frame.render_widget(error_paragraph(err), inner);
                return;
            }
            Some(Ok(series)) => series,
        };

        let Some(data) = chart_data(series) else {
            frame.render_widget(
                Paragraph::new("No observations in range.").style(Style::default().fg(Color::Yellow)),
                inner,
            );
            return;
        };

        let widget = SeriesChart {
            points: &data.points,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            y_label: &series.key,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_markets(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(36), Constraint::Min(0)])
            .split(area);

        let items: Vec<ListItem> = MarketGroup::ALL.iter().map(|g| ListItem::new(g.title())).collect();
        let list = List::new(items)
            .block(Block::default().title("Groups").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        state.select(Some(self.market_group));
        frame.render_stateful_widget(list, columns[0], &mut state);

        let group = MarketGroup::ALL[self.market_group.min(MarketGroup::ALL.len() - 1)];
        let block = Block::default().title(group.title()).borders(Borders::ALL);
        let inner = block.inner(columns[1]);
        frame.render_widget(block, columns[1]);

        let Some(dashboard) = &self.dashboard else {
            frame.render_widget(loading_paragraph(), inner);
            return;
        };
        let sections = match &dashboard.markets {
            Ok(sections) => sections,
            Err(err) => {
                frame.render_widget(error_paragraph(err), inner);
                return;
            }
        };
        let rows = match sections.iter().find(|s| s.group == group) {
            Some(MarketSection { rows: Ok(rows), .. }) => rows,
            Some(MarketSection { rows: Err(err), .. }) => {
                frame.render_widget(error_paragraph(err), inner);
                return;
            }
            None => {
                frame.render_widget(loading_paragraph(), inner);
                return;
            }
        };
        if rows.is_empty() {
            frame.render_widget(
                Paragraph::new("No prices available.").style(Style::default().fg(Color::Yellow)),
                inner,
            );
            return;
        }

        let header = Row::new(["Name", "Ticker", "Price", "Change", "Session"])
            .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
        let body: Vec<Row> = rows
            .iter()
            .map(|r| {
                let change_style = match r.change_pct {
                    Some(p) if p > 0.0 => Style::default().fg(Color::Green),
                    Some(p) if p < 0.0 => Style::default().fg(Color::Red),
                    _ => Style::default().fg(Color::Gray),
                };
                Row::new(vec![
                    Cell::from(r.name.clone()),
                    Cell::from(r.ticker.clone()),
                    Cell::from(price_text(r.price)),
                    Cell::from(change_text(r.change_pct)).style(change_style),
                    Cell::from(r.session.display_name()),
                ])
            })
            .collect();
        let table = Table::new(
            body,
            [
                Constraint::Min(20),
                Constraint::Length(10),
                Constraint::Length(14),
                Constraint::Length(10),
                Constraint::Length(12),
            ],
        )
        .header(header);
        frame.render_widget(table, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = match self.tab {
            Tab::Markets => "Tab/←/→ tabs  ↑/↓ group  r reload  q quit",
            _ => "Tab/←/→ tabs  ↑/↓ series  s start  e end  Enter chart  r reload  q quit",
        };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as isize + delta).clamp(0, len as isize - 1) as usize
}

fn draw_cards(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    title: &str,
    rows: Option<&Section<Vec<LatestRow>>>,
    catalogue: &[SeriesDescriptor],
) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = match rows {
        None => {
            frame.render_widget(loading_paragraph(), inner);
            return;
        }
        Some(Err(err)) => {
            frame.render_widget(error_paragraph(err), inner);
            return;
        }
        Some(Ok(rows)) => rows,
    };

    let mut lines: Vec<Line> = Vec::with_capacity(rows.len() * 3);
    for row in rows {
        let period = if row.observation.is_some() {
            row.period_label.clone()
        } else {
            NO_DATA.to_string()
        };
        lines.push(Line::from(Span::styled(
            row.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(vec![
            Span::styled(card_value(row, catalogue), Style::default().fg(Color::Cyan)),
            Span::raw("  "),
            Span::styled(period, Style::default().fg(Color::Gray)),
        ]));
        lines.push(Line::default());
    }
    frame.render_widget(Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true }), inner);
}

fn loading_paragraph() -> Paragraph<'static> {
    Paragraph::new("Loading...").style(Style::default().fg(Color::Yellow))
}

fn error_paragraph(err: &SourceError) -> Paragraph<'static> {
    Paragraph::new(format!("error: {err}"))
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
}

/// Plot-ready points and padded bounds.
#[derive(Debug, Clone, PartialEq)]
struct ChartData {
    points: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn chart_data(series: &TimeSeries) -> Option<ChartData> {
    let points: Vec<(f64, f64)> = series
        .points
        .iter()
        .map(|p| (p.date.num_days_from_ce() as f64, p.value))
        .collect();
    let (first, last) = (points.first()?, points.last()?);

    let mut x_bounds = [first.0, last.0];
    if x_bounds[1] <= x_bounds[0] {
        x_bounds = [x_bounds[0] - 1.0, x_bounds[0] + 1.0];
    }

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in &points {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        return None;
    }
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    Some(ChartData {
        points,
        x_bounds,
        y_bounds: [y_min - pad, y_max + pad],
    })
}
