use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, InputMode};

fn pagination_label(state: &AppState) -> Option<String> {
    if !state.view.show_pagination_controls() {
        return None;
    }
    let prev = if state.view.has_prev_page() { "‹ prev" } else { "      " };
    let next = if state.view.has_next_page() { "next ›" } else { "      " };
    Some(format!("{prev}  page {}  {next}", state.view.page_number()))
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let narrow = area.width < crate::app::NARROW_WIDTH_THRESHOLD;

    let line = if let InputMode::EditingFilters(text) = &state.input {
        Line::from(vec![
            Span::styled("filter> ", Style::default().fg(Color::Cyan)),
            Span::raw(text.clone()),
            Span::styled("█", Style::default().fg(Color::DarkGray)),
            Span::styled(
                "  token:value, … (id, snapshotId, status, tag)",
                Style::default().fg(Color::DarkGray),
            ),
        ])
    } else if let Some(notice) = &state.notice {
        let color = if notice.is_error { Color::Red } else { Color::Yellow };
        Line::from(vec![
            Span::styled("★ ", Style::default().fg(color)),
            Span::styled(notice.message.clone(), Style::default().fg(color)),
        ])
    } else {
        let hints: &[(&str, &str)] = if narrow {
            &[
                ("j/k", "nav"),
                ("n/p", "page"),
                ("/", "filter"),
                ("r", "refresh"),
                ("q", "quit"),
            ]
        } else {
            &[
                ("↑↓/jk", "navigate"),
                ("n/p", "page"),
                ("/", "filter"),
                ("s", "by status"),
                ("t", "by tag"),
                ("⌫", "drop filter"),
                ("x", "clear"),
                ("r", "refresh"),
                ("q", "quit"),
            ]
        };
        let mut spans: Vec<Span> = Vec::new();
        if let Some(label) = pagination_label(state) {
            spans.push(Span::styled(label, Style::default().fg(Color::White)));
            spans.push(Span::raw("  "));
        }
        for (i, (key, desc)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
            spans.push(Span::styled(
                format!(" {desc}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    };

    let footer = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}
