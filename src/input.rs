use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissNotice,
    MoveUp,
    MoveDown,
    NextPage,
    PrevPage,
    Refresh,
    EditFilters,
    PopFilter,
    ClearFilters,
    FilterByStatus,
    FilterByTag,
    // Filter editor
    InputChar(char),
    InputBackspace,
    SubmitFilters,
    CancelEdit,
    None,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Default)]
pub struct InputContext {
    pub has_notice: bool,
    pub is_loading: bool,
    pub editing: bool,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    if ctx.editing {
        return match key.code {
            KeyCode::Enter => Action::SubmitFilters,
            KeyCode::Esc => Action::CancelEdit,
            KeyCode::Backspace => Action::InputBackspace,
            KeyCode::Char(c) => Action::InputChar(c),
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => {
            if ctx.has_notice {
                Action::DismissNotice
            } else {
                Action::Quit
            }
        }
        KeyCode::Up | KeyCode::Char('k') => Action::MoveUp,
        KeyCode::Down | KeyCode::Char('j') => Action::MoveDown,
        KeyCode::Right | KeyCode::Char('n' | 'l') | KeyCode::PageDown => Action::NextPage,
        KeyCode::Left | KeyCode::Char('p' | 'h') | KeyCode::PageUp => Action::PrevPage,
        KeyCode::Char('r') if !ctx.is_loading => Action::Refresh,
        KeyCode::Char('/') => Action::EditFilters,
        KeyCode::Backspace => Action::PopFilter,
        KeyCode::Char('x') => Action::ClearFilters,
        KeyCode::Char('s') => Action::FilterByStatus,
        KeyCode::Char('t') => Action::FilterByTag,
        _ => Action::None,
    }
}
