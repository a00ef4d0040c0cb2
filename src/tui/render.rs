use crate::app::AppState;
use crate::tui::{footer, header, table};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

pub fn render(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header: title + filter tokens
            Constraint::Min(1),    // run table
            Constraint::Length(2), // footer
        ])
        .split(f.area());

    header::render(f, chunks[0], state);
    table::render(f, chunks[1], state);
    footer::render(f, chunks[2], state);
}
