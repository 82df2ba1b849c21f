use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ecoledger::{AggregateSummary, CompanyProfile, EnrichedRow, Pivot, Scope};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::collections::BTreeMap;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Activities,
    Summary,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Activities => Page::Summary,
            Page::Summary => Page::Activities,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Activities => "Activities",
            Page::Summary => "Summary",
        }
    }
}

pub struct App {
    pub profile: CompanyProfile,
    pub rows: Vec<EnrichedRow>,
    pub pivot: Pivot,
    pub by_scope: BTreeMap<u8, f64>,
    pub total: f64,
    pub state: TableState,
    pub current_page: Page,
}

impl App {
    pub fn new(
        profile: CompanyProfile,
        rows: Vec<EnrichedRow>,
        summary: &AggregateSummary,
        by_scope: BTreeMap<u8, f64>,
    ) -> Self {
        let mut state = TableState::default();
        if !rows.is_empty() {
            state.select(Some(0));
        }

        App {
            profile,
            pivot: summary.pivot(),
            total: summary.total(),
            rows,
            by_scope,
            state,
            current_page: Page::Activities,
        }
    }

    pub fn next(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.rows.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Tab => app.current_page = app.current_page.next(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Activities => render_rows(f, chunks[1], app),
        Page::Summary => render_summary(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2]);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];
    for (i, page) in [Page::Activities, Page::Summary].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(page.title().to_string(), style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("{} ({}, {})", app.profile.name, app.profile.industry, app.profile.reporting_year),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Total: {:.3} tCO2e", app.total),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn scope_color(scope: u8) -> Color {
    match scope {
        1 => Color::Red,
        2 => Color::Yellow,
        _ => Color::Cyan,
    }
}

fn render_rows(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Activity", "Quantity", "Unit", "Scope", "Quality", "EF", "kgCO2e", "tCO2e"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));

    let header = Row::new(header_cells).style(Style::default().bg(Color::DarkGray)).height(1);

    let rows = app.rows.iter().map(|r| {
        let color = scope_color(r.scope);
        Row::new(vec![
            Cell::from(r.activity_code.clone()),
            Cell::from(format!("{:.2}", r.quantity)),
            Cell::from(r.unit.clone()),
            Cell::from(r.scope.to_string()).style(Style::default().fg(color)),
            Cell::from(r.quality.clone()),
            Cell::from(format!("{}", r.ef)),
            Cell::from(format!("{:.2}", r.kg_co2e)),
            Cell::from(format!("{:.3}", r.t_co2e)).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(12),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(19),
            Constraint::Length(9),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Enriched activities "))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(area);

    // Per-scope totals
    let lines: Vec<Line> = Scope::ALL
        .iter()
        .map(|scope| {
            let total = app.by_scope.get(&scope.number()).copied().unwrap_or(0.0);
            Line::from(vec![
                Span::styled(format!("{:<10}", scope.to_string()), Style::default().fg(scope_color(scope.number()))),
                Span::raw(format!("{:>12.3} tCO2e", total)),
            ])
        })
        .collect();
    let totals = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" By scope "));
    f.render_widget(totals, chunks[0]);

    // Scope × quality pivot
    let mut header_cells = vec![Cell::from("Scope")];
    header_cells.extend(app.pivot.qualities.iter().map(|q| Cell::from(q.clone())));
    let header = Row::new(header_cells).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows = app.pivot.scopes.iter().zip(app.pivot.cells.iter()).map(|(scope, cells)| {
        let mut row = vec![Cell::from(scope.to_string()).style(Style::default().fg(scope_color(*scope)))];
        row.extend(cells.iter().map(|c| match c {
            Some(t) => Cell::from(format!("{:.3}", t)),
            None => Cell::from("-"),
        }));
        Row::new(row)
    });

    let mut widths = vec![Constraint::Length(8)];
    widths.extend(app.pivot.qualities.iter().map(|_| Constraint::Length(20)));

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(" tCO2e by scope and data quality "));
    f.render_widget(table, chunks[1]);
}

fn render_status_bar(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(Line::from(vec![
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" switch page  "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" move  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, area);
}
