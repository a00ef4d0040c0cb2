use prw::app;
use prw::cli;
use prw::dagit;
use prw::events;
use prw::input;
use prw::logging;
use prw::pagination::{Direction, PAGE_SIZE};
use prw::persist::{FileFilterStore, FilterStore, MemoryFilterStore};
use prw::tui;
use prw::view::{RunListView, ViewConfig};

use app::AppState;
use clap::Parser;
use cli::Cli;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use dagit::client::{HttpExecutor, RunsExecutor};
use dagit::dispatch::FetchDispatcher;
use events::{AppEvent, EventHandler};
use input::{Action, InputContext};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    logging::init_logging(args.log_file.as_deref(), args.log_level)?;

    let store: Box<dyn FilterStore> = match &args.filters_file {
        Some(path) => Box::new(FileFilterStore::new(path)),
        None => Box::new(MemoryFilterStore::new()),
    };
    if !args.filters.is_empty() {
        store.save(&args.filters)?;
    }

    let config = ViewConfig {
        page_size: PAGE_SIZE,
        poll_interval: Duration::from_secs(args.interval),
    };
    let view = match RunListView::initialize(&args.pipeline_path, store, config) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    // Startup validation
    let executor = match HttpExecutor::new(args.endpoint.clone()) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = executor.check_available().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    tracing::info!(
        pipeline = view.pipeline_name(),
        endpoint = executor.endpoint(),
        "starting"
    );

    let mut state = AppState::new(view, args.endpoint);

    // Setup terminal with panic hook
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut events = EventHandler::new(Duration::from_millis(100));
    let mut dispatcher = FetchDispatcher::new(Arc::new(executor), events.sender());

    let result = run_app(&mut terminal, &mut state, &mut events, &mut dispatcher).await;

    state.view.teardown();
    dispatcher.shutdown();
    events.stop();

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    match state.fatal_error {
        Some(msg) => Err(eyre!(msg)),
        None => Ok(()),
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    events: &mut EventHandler,
    dispatcher: &mut FetchDispatcher,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        // Hand any queued request to the dispatcher before drawing
        if let Some(ticket) = state.view.take_pending_fetch() {
            tracing::debug!(ticket = ticket.id, cursor = ?ticket.request.cursor, "fetching runs");
            dispatcher.dispatch(ticket);
        }

        terminal.draw(|f| tui::render::render(f, state))?;

        let Some(event) = events.next().await else {
            break;
        };
        match event {
            AppEvent::Key(key) => {
                let ctx = InputContext {
                    has_notice: state.notice.is_some(),
                    is_loading: state.view.is_loading(),
                    editing: state.is_editing(),
                };
                handle_action(state, input::map_key(key, &ctx));
            }
            AppEvent::Tick => {
                let now = Instant::now();
                state.view.tick(now.duration_since(last_tick));
                last_tick = now;
                state.advance_spinner();
                state.prune_notice();
            }
            AppEvent::RunsResult { ticket, outcome } => {
                if let Err(e) = &outcome {
                    tracing::warn!(ticket, "runs fetch failed: {e}");
                }
                state.apply_fetch(ticket, outcome);
            }
            AppEvent::Error(msg) => {
                tracing::error!("{msg}");
                state.input_failed(msg);
            }
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_action(state: &mut AppState, action: Action) {
    match action {
        Action::Quit => state.should_quit = true,
        Action::DismissNotice => state.clear_notice(),
        Action::MoveUp => state.move_up(),
        Action::MoveDown => state.move_down(),
        Action::NextPage => state.change_page(Direction::Next),
        Action::PrevPage => state.change_page(Direction::Prev),
        Action::Refresh => {
            if !state.view.refetch() {
                tracing::debug!("refresh ignored while a fetch is in flight");
            }
        }
        Action::EditFilters => state.begin_filter_edit(),
        Action::PopFilter => state.pop_filter(),
        Action::ClearFilters => state.set_filters(Vec::new()),
        Action::FilterByStatus => state.filter_by_selected_status(),
        Action::FilterByTag => state.filter_by_selected_tag(),
        Action::InputChar(c) => state.edit_push(c),
        Action::InputBackspace => state.edit_backspace(),
        Action::SubmitFilters => state.submit_filter_edit(),
        Action::CancelEdit => state.cancel_filter_edit(),
        Action::None => {}
    }
}
