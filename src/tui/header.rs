use crate::app::AppState;
use crate::filter::RunFilterTokenType;
use crate::tui::spinner;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Countdown text: a spinner while refreshing, otherwise "refresh in Ns".
pub fn countdown_label(state: &AppState) -> (String, Color) {
    let countdown = state.view.countdown_state();
    if countdown.refreshing() {
        (
            format!("{} refreshing", spinner::frame(state.spinner_frame)),
            Color::Yellow,
        )
    } else {
        (format!("refresh in {}s", countdown.seconds()), Color::DarkGray)
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let title = Line::from(vec![
        Span::styled(
            format!(" prw v{}+{} ", env!("CARGO_PKG_VERSION"), env!("BUILD_NUMBER")),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
        Span::styled(
            state.view.title(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", state.endpoint),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let mut spans = vec![Span::raw(" ")];
    for token in state.view.display_tokens() {
        // Tokens pinned by the path are not editable
        let color = match token.token {
            RunFilterTokenType::Pipeline => Color::Blue,
            RunFilterTokenType::SnapshotId
                if state.view.snapshot_id() == Some(token.value.as_str()) =>
            {
                Color::Blue
            }
            _ => Color::Magenta,
        };
        spans.push(Span::styled(format!("[{token}]"), Style::default().fg(color)));
        spans.push(Span::raw(" "));
    }

    let (countdown, color) = countdown_label(state);
    spans.push(Span::styled(countdown, Style::default().fg(color)));

    if state.notice.as_ref().is_some_and(|n| n.is_error) {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            "!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(vec![title, Line::from(spans)]).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(header, area);
}
