//! TUI rendering: one panel per chart.
//!
//! ┌──────────────────────────────────────────────┐
//! │  hostscope   tick #42   3ms   every 1.0s     │
//! ├──────────────────────┬───────────────────────┤
//! │  CPU Utilization     │  Temperature (°C)     │
//! ├──────────────────────┼───────────────────────┤
//! │  Disk I/O (KiB/s)    │  Network I/O (B/s)    │
//! ├──────────────────────┼───────────────────────┤
//! │  Fan Speed           │  Host / no-data list  │
//! ├──────────────────────┴───────────────────────┤
//! │  p: pause   +/-: refresh   s: export   q     │
//! └──────────────────────────────────────────────┘

use super::app::App;
use hostscope_core::ChartSnapshot;
use hostscope_core::platform::{
    CPU_CHART, DISK_CHART, FAN_CHART, NETWORK_CHART, TEMPERATURE_CHART,
};
use ratatui::{prelude::*, widgets::*};

const PALETTE: [Color; 8] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::LightBlue,
    Color::LightRed,
    Color::LightGreen,
    Color::White,
];

/// Panel order, left to right then top to bottom; the last cell is the status panel.
const LAYOUT: [&str; 5] = [CPU_CHART, TEMPERATURE_CHART, DISK_CHART, NETWORK_CHART, FAN_CHART];

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(12),   // charts
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    draw_grid(f, rows[1], app);
    draw_keys(f, rows[2]);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let tick = app
        .tick()
        .map_or_else(|| "—".to_string(), |t| format!("#{t}"));
    let spin = if app.is_sampling() { " ⟳" } else { "" };
    let state = if app.is_paused() { "  PAUSED" } else { "" };
    let mut spans = vec![
        Span::styled(" hostscope ", Style::default().bold().fg(Color::Cyan)),
        Span::styled(
            format!(
                "  tick {tick}  {}ms  every {:.1}s  skipped {}{spin}",
                app.last_ms(),
                app.refresh_rate().as_secs_f64(),
                app.skipped()
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(state, Style::default().bold().fg(Color::Yellow)),
    ];
    if let Some(path) = app.last_export() {
        spans.push(Span::styled(
            format!("  saved {path} "),
            Style::default().fg(Color::Green),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(spans));
    f.render_widget(block, area);
}

fn draw_grid(f: &mut Frame, area: Rect, app: &App) {
    let charts = app.charts();
    let bands = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);
    let mut cells = Vec::with_capacity(6);
    for band in bands.iter() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50); 2])
            .split(*band);
        cells.extend(cols.iter().copied());
    }

    for (title, cell) in LAYOUT.iter().zip(&cells) {
        match charts.iter().find(|c| c.title == *title) {
            Some(chart) => draw_chart(f, *cell, chart),
            None => f.render_widget(Block::default().borders(Borders::ALL).title(*title), *cell),
        }
    }
    if let Some(cell) = cells.get(LAYOUT.len()) {
        draw_status(f, *cell, app);
    }
}

fn x_bounds(chart: &ChartSnapshot) -> (f64, f64) {
    let first = chart
        .series
        .iter()
        .filter_map(|s| s.samples.first())
        .map(|s| s.tick)
        .min();
    match (first, chart.last_tick) {
        (Some(first), Some(last)) if last > first => (first as f64, last as f64),
        (_, Some(last)) => (last as f64, last as f64 + 1.0),
        _ => (0.0, 1.0),
    }
}

fn draw_chart(f: &mut Frame, area: Rect, chart: &ChartSnapshot) {
    // Gaps (no data) are dropped rather than drawn as zero.
    let points: Vec<Vec<(f64, f64)>> = chart
        .series
        .iter()
        .map(|s| {
            s.samples
                .iter()
                .filter_map(|p| p.value.map(|v| (p.tick as f64, v)))
                .collect()
        })
        .collect();

    let datasets: Vec<Dataset> = chart
        .series
        .iter()
        .zip(&points)
        .enumerate()
        .map(|(i, (series, data))| {
            let latest = series
                .latest()
                .map_or_else(|| "—".to_string(), |v| format!("{v:.1}"));
            Dataset::default()
                .name(format!("{} {latest}", series.name))
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(data)
        })
        .collect();

    let (x_min, x_max) = x_bounds(chart);
    let (y_min, y_max) = (chart.y_min, chart.y_max);
    let mid = (y_min + y_max) / 2.0;

    let widget = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", chart.display_title())),
        )
        .legend_position(Some(LegendPosition::TopLeft))
        .hidden_legend_constraints((Constraint::Percentage(60), Constraint::Percentage(60)))
        .x_axis(Axis::default().bounds([x_min, x_max]))
        .y_axis(
            Axis::default()
                .bounds([y_min, y_max])
                .style(Style::default().fg(Color::DarkGray))
                .labels(vec![
                    Line::from(format!("{y_min:.0}")),
                    Line::from(format!("{mid:.0}")),
                    Line::from(format!("{y_max:.0}")),
                ]),
        );

    f.render_widget(widget, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let inv = app.inventory();
    let mut lines = vec![
        Line::from(vec![
            Span::styled("cores ", Style::default().bold()),
            Span::raw(inv.cpu_cores.to_string()),
            Span::styled("  drives ", Style::default().bold()),
            Span::raw(inv.drives.len().to_string()),
            Span::styled("  ifaces ", Style::default().bold()),
            Span::raw(inv.interfaces.len().to_string()),
        ]),
        Line::from(""),
    ];

    let diagnostics = app.diagnostics();
    if diagnostics.is_empty() {
        lines.push(Line::from(Span::styled(
            "all series reporting",
            Style::default().fg(Color::Green),
        )));
    } else {
        for d in &diagnostics {
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", d.series), Style::default().fg(Color::Red)),
                Span::styled(d.error.to_string(), Style::default().fg(Color::DarkGray)),
            ]));
        }
    }

    let block = Block::default().borders(Borders::ALL).title(" Host ");
    let p = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    f.render_widget(p, area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(" p: pause   +/-: faster/slower   s: export JSON   q: quit")
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}
