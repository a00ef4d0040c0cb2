use crate::app::{self, AppState};
use crate::dagit::model::{RunRecord, RunStatus};
use crate::view::ViewStatus;
use chrono::{DateTime, Local, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    match state.view.status() {
        ViewStatus::Loading => render_message(f, area, "Loading runs…", None, Color::DarkGray),
        ViewStatus::QueryError(message) => {
            render_message(f, area, "Query Error", Some(message.as_str()), Color::Red);
        }
        ViewStatus::BackendError(message) => {
            render_message(f, area, "Server Error", Some(message.as_str()), Color::Red);
        }
        ViewStatus::NetworkError(message) => {
            render_message(f, area, "Connection Error", Some(message.as_str()), Color::Red);
        }
        ViewStatus::Loaded(runs) if runs.is_empty() => {
            let msg = if state.view.tokens().is_empty() {
                "No runs for this pipeline"
            } else {
                "No runs match these filters"
            };
            render_message(f, area, msg, None, Color::DarkGray);
        }
        ViewStatus::Loaded(runs) => render_runs(f, area, state, runs),
    }
}

/// Centered title with an optional description, used for empty and error
/// states.
fn render_message(f: &mut Frame, area: Rect, title: &str, body: Option<&str>, color: Color) {
    let mut lines = vec![
        Line::raw(""),
        Line::styled(
            format!("  {title}"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(body) = body {
        lines.push(Line::raw(""));
        lines.push(Line::styled(format!("  {body}"), Style::default().fg(color)));
    }
    let para = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::NONE));
    f.render_widget(para, area);
}

fn render_runs(f: &mut Frame, area: Rect, state: &AppState, runs: &[RunRecord]) {
    let narrow = area.width < app::NARROW_WIDTH_THRESHOLD;
    let inner_width = area.width as usize;
    let visible_height = area.height as usize;
    let scroll_offset = (state.selected + 1).saturating_sub(visible_height);
    let now = Utc::now();

    let lines: Vec<Line> = runs
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
        .map(|(i, run)| render_run_line(run, i == state.selected, narrow, inner_width, now))
        .collect();

    let table = Paragraph::new(lines).block(Block::default().borders(Borders::NONE));
    f.render_widget(table, area);
}

pub fn status_icon(status: RunStatus) -> (&'static str, Color) {
    match status {
        RunStatus::Success => ("✓", Color::Green),
        RunStatus::Failure => ("✗", Color::Red),
        RunStatus::Canceled | RunStatus::Canceling => ("⊘", Color::Yellow),
        RunStatus::Started | RunStatus::Starting => ("⟳", Color::Yellow),
        RunStatus::Queued | RunStatus::NotStarted | RunStatus::Managed | RunStatus::Unknown => {
            ("·", Color::DarkGray)
        }
    }
}

pub fn truncate(s: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in s.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw + 1 > max_width {
            break;
        }
        out.push(c);
        width += cw;
    }
    out.push('…');
    out
}

fn format_started(started: Option<DateTime<Utc>>) -> String {
    started.map_or_else(
        || "-".to_string(),
        |t| t.with_timezone(&Local).format("%b %d %H:%M").to_string(),
    )
}

fn render_run_line(
    run: &RunRecord,
    is_selected: bool,
    narrow: bool,
    max_width: usize,
    now: DateTime<Utc>,
) -> Line<'static> {
    let (icon, icon_color) = status_icon(run.status);
    let stats = run.stats.clone().unwrap_or_default();
    let duration = app::run_duration(stats.started_at(), stats.ended_at(), now)
        .unwrap_or_else(|| "-".to_string());

    let select_style = if is_selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };

    let mut spans = vec![
        Span::styled(format!(" {icon} "), Style::default().fg(icon_color)),
        Span::styled(run.short_id().to_string(), select_style),
        Span::styled(
            format!(" {:<11}", run.status.as_filter_value().unwrap_or("UNKNOWN")),
            Style::default().fg(icon_color),
        ),
    ];

    if narrow {
        spans.push(Span::styled(
            format!(" {duration}"),
            Style::default().fg(Color::DarkGray),
        ));
        return Line::from(spans);
    }

    let started = format_started(stats.started_at());
    spans.push(Span::styled(
        format!(" {started:<12} {duration:>8}"),
        Style::default().fg(Color::DarkGray),
    ));
    spans.push(Span::styled(
        format!(" {}", run.mode),
        Style::default().fg(Color::Blue),
    ));

    let used: usize = spans.iter().map(|s| UnicodeWidthStr::width(s.content.as_ref())).sum();
    let tags = run
        .user_tags()
        .map(|t| format!("{}={}", t.key, t.value))
        .collect::<Vec<_>>()
        .join(" ");
    if !tags.is_empty() {
        let room = max_width.saturating_sub(used + 1);
        spans.push(Span::styled(
            format!(" {}", truncate(&tags, room)),
            Style::default().fg(Color::Magenta),
        ));
    }

    Line::from(spans)
}
