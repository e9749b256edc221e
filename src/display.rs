//! Interactive terminal viewer using ratatui.
//!
//! Shown when no output file is given. The chart stays on screen until the
//! user quits with `q`, `Esc` or `Ctrl-C`.

use crate::figure::{Figure, Panel};
use anyhow::Result;
use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    prelude::CrosstermBackend,
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph},
    Frame, Terminal,
};
use std::io::{self, Write};

const BACKGROUND: Color = Color::Rgb(0x1e, 0x1e, 0x1e);
const SERIES: Color = Color::Rgb(0, 191, 255);
const PEAK: Color = Color::Rgb(255, 165, 0);
const THRESHOLD: Color = Color::Red;

/// Labels per axis; ratatui spreads them evenly along the bounds
const LABEL_COUNT: usize = 5;

/// Show the figure and block until the viewer is closed
pub fn show(figure: &Figure) -> Result<()> {
    let _screen = ScreenGuard::enter(io::stdout())?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    run_viewer(&mut terminal, figure)
}

/// Raw mode and the alternate screen, restored on drop whatever the exit path.
struct ScreenGuard<W: Write> {
    out: W,
}

impl<W: Write> ScreenGuard<W> {
    fn enter(out: W) -> Result<Self> {
        enable_raw_mode()?;
        let mut guard = Self { out };
        execute!(guard.out, EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl<W: Write> Drop for ScreenGuard<W> {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.out, LeaveAlternateScreen, Show);
    }
}

fn run_viewer<B: Backend>(terminal: &mut Terminal<B>, figure: &Figure) -> Result<()> {
    loop {
        terminal.draw(|f| render_figure(f, figure))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && is_quit(&key) {
                return Ok(());
            }
        }
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Draw the heading, one chart per panel and the help bar.
pub fn render_figure(f: &mut Frame, figure: &Figure) {
    let area = f.area();
    f.render_widget(Block::default().style(Style::default().bg(BACKGROUND)), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Heading
            Constraint::Min(8),    // Panels
            Constraint::Length(1), // Help bar
        ])
        .split(area);

    let heading = Paragraph::new(Line::from(Span::styled(
        figure.heading.as_str(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(heading, chunks[0]);

    let count = figure.panels.len().max(1) as u32;
    let panel_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, count); figure.panels.len()])
        .split(chunks[1]);

    for (panel, panel_area) in figure.panels.iter().zip(panel_areas.iter()) {
        render_panel(f, *panel_area, figure, panel);
    }

    let help = Paragraph::new(Line::from(vec![
        Span::styled(" q ", Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::styled(" quit ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!(
                " {} frames, {} - {} ",
                figure.times.len(),
                figure.format_time(figure.x_range.0),
                figure.format_time(figure.x_range.1)
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    f.render_widget(help, chunks[2]);
}

fn render_panel(f: &mut Frame, area: Rect, figure: &Figure, panel: &Panel) {
    let (x0, x1) = figure.x_range;
    let (y0, y1) = panel.y_range;

    let points: Vec<(f64, f64)> = figure.series(panel).collect();
    let threshold: Vec<(f64, f64)> = panel
        .threshold
        .map(|level| vec![(x0, level), (x1, level)])
        .unwrap_or_default();
    let peak: Vec<(f64, f64)> = panel
        .peak
        .map(|p| vec![(p.time, p.value)])
        .unwrap_or_default();

    let mut datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(SERIES))
        .data(&points)];

    if let Some(level) = panel.threshold {
        datasets.push(
            Dataset::default()
                .name(format!("{}s threshold", level))
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(THRESHOLD))
                .data(&threshold),
        );
    }
    if let Some(p) = panel.peak {
        datasets.push(
            Dataset::default()
                .name(p.label())
                .marker(symbols::Marker::Block)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(PEAK))
                .data(&peak),
        );
    }

    let axis_style = Style::default().fg(Color::White);
    let x_axis = Axis::default()
        .style(axis_style)
        .bounds([x0, x1])
        .labels(axis_labels(x0, x1, LABEL_COUNT, |t| figure.format_time(t)));
    let mut y_axis = Axis::default()
        .style(axis_style)
        .bounds([y0, y1])
        .labels(axis_labels(y0, y1, LABEL_COUNT, |v| panel.format_tick(v)));
    if let Some(desc) = panel.y_desc() {
        y_axis = y_axis.title(desc);
    }

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(format!(" {} ", panel.title()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .style(Style::default().bg(BACKGROUND).fg(Color::White)),
        )
        .x_axis(x_axis)
        .y_axis(y_axis)
        .legend_position(Some(LegendPosition::TopRight))
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)));

    f.render_widget(chart, area);
}

/// `count` labels for evenly spaced values across `[lo, hi]`.
fn axis_labels(lo: f64, hi: f64, count: usize, format: impl Fn(f64) -> String) -> Vec<String> {
    match count {
        0 => Vec::new(),
        1 => vec![format(lo)],
        _ => {
            let step = (hi - lo) / (count - 1) as f64;
            (0..count).map(|i| format(lo + step * i as f64)).collect()
        }
    }
}
