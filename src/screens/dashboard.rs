/// Main dashboard screen

use chrono::{DateTime, Local};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::app::{DashboardData, ViewState};
use crate::utils::helpers::{display_or_unknown, format_percent, UsageLevel};

fn level_color(level: UsageLevel) -> Color {
    match level {
        UsageLevel::Normal => Color::Green,
        UsageLevel::Elevated => Color::Yellow,
        UsageLevel::Critical => Color::Red,
    }
}

pub struct Dashboard;

impl Dashboard {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        state: &ViewState,
        fetching: bool,
        last_updated: Option<DateTime<Local>>,
        show_help: bool,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(frame.size());

        self.render_header(frame, chunks[0], fetching);

        match state {
            ViewState::Loading => self.render_loading(frame, chunks[1]),
            ViewState::Failed(message) => self.render_failed(frame, chunks[1], message),
            ViewState::Ready(data) => self.render_ready(frame, chunks[1], data),
        }

        self.render_footer(frame, chunks[2], last_updated);

        if show_help {
            self.render_help(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, fetching: bool) {
        let mut spans = vec![
            Span::styled(
                " Pulse Dashboard ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
        ];
        if fetching {
            spans.push(Span::styled("(refreshing...)", Style::default().fg(Color::DarkGray)));
        }

        let header = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        frame.render_widget(header, area);
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect) {
        let body = Paragraph::new(vec![
            Line::from(""),
            Line::from("Contacting backend..."),
        ])
        .block(Block::default().borders(Borders::ALL).title(" Loading "))
        .alignment(Alignment::Center);
        frame.render_widget(body, area);
    }

    fn render_failed(&self, frame: &mut Frame, area: Rect, message: &str) {
        let body = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Request failed",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(message.to_string()),
            Line::from(""),
            Line::from(Span::styled(
                "press r to retry",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Error "),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        frame.render_widget(body, area);
    }

    fn render_ready(&self, frame: &mut Frame, area: Rect, data: &DashboardData) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        self.render_greeting_card(frame, columns[0], data);
        self.render_metrics_card(frame, columns[1], data);
    }

    fn render_greeting_card(&self, frame: &mut Frame, area: Rect, data: &DashboardData) {
        let greeting = &data.greeting;
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                display_or_unknown(greeting.message.as_deref()).to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!(
                "Backend version: {}",
                display_or_unknown(greeting.version.as_deref())
            )),
            Line::from(format!(
                "Server time: {}",
                display_or_unknown(greeting.timestamp.as_deref())
            )),
        ];

        let card = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Backend "))
            .wrap(Wrap { trim: true });
        frame.render_widget(card, area);
    }

    fn render_metrics_card(&self, frame: &mut Frame, area: Rect, data: &DashboardData) {
        let snapshot = &data.snapshot;

        let block = Block::default().borders(Borders::ALL).title(" System ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(inner);

        let identity = Line::from(vec![
            Span::raw("Host: "),
            Span::styled(
                display_or_unknown(snapshot.hostname.as_deref()).to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("   Environment: "),
            Span::styled(
                display_or_unknown(snapshot.environment.as_deref()).to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]);
        frame.render_widget(Paragraph::new(identity), rows[0]);

        self.render_metric_gauge(frame, rows[1], "CPU", snapshot.cpu_percent);
        self.render_metric_gauge(frame, rows[2], "Memory", snapshot.memory_percent);
        self.render_metric_gauge(frame, rows[3], "Disk", snapshot.disk_percent);
    }

    fn render_metric_gauge(&self, frame: &mut Frame, area: Rect, name: &str, value: Option<f64>) {
        let parts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(8), Constraint::Min(10)])
            .split(area);

        frame.render_widget(Paragraph::new(name.to_string()), parts[0]);

        let color = value
            .map(|v| level_color(UsageLevel::from_percent(v)))
            .unwrap_or(Color::DarkGray);
        let percent = value.map(|v| v.clamp(0.0, 100.0).round() as u16).unwrap_or(0);

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(color))
            .percent(percent)
            .label(format_percent(value));
        frame.render_widget(gauge, parts[1]);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, last_updated: Option<DateTime<Local>>) {
        let updated = match last_updated {
            Some(at) => format!("updated {}", at.format("%H:%M:%S")),
            None => "never updated".to_string(),
        };

        let footer = Paragraph::new(Line::from(vec![
            Span::styled("r", Style::default().fg(Color::Cyan)),
            Span::raw(" refresh  "),
            Span::styled("?", Style::default().fg(Color::Cyan)),
            Span::raw(" help  "),
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::raw(" quit    "),
            Span::styled(updated, Style::default().fg(Color::DarkGray)),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, area);
    }

    fn render_help(&self, frame: &mut Frame) {
        let area = centered_rect(50, 40, frame.size());

        let help = Paragraph::new(vec![
            Line::from(""),
            Line::from("r        refresh now (supersedes a running refresh)"),
            Line::from("?        toggle this help"),
            Line::from("q / Esc  quit"),
            Line::from(""),
            Line::from("The view refreshes automatically on the configured"),
            Line::from("interval; utilization turns yellow at 50% and red"),
            Line::from("at 80%."),
        ])
        .block(Block::default().borders(Borders::ALL).title(" Help "))
        .wrap(Wrap { trim: true });

        frame.render_widget(Clear, area);
        frame.render_widget(help, area);
    }
}

/// Centered overlay rectangle, percent-sized against the full frame
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
