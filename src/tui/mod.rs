//! Terminal user interface for keepnote.
//!
//! The TUI is the view controller: it owns a [`Session`], feeds it user
//! actions and snapshot events, and paints whatever the pipeline returns.

use std::io;
use std::panic;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::config::Config;
use crate::models::OwnerId;
use crate::session::Session;
use crate::store::NoteStore;
use crate::view::ViewAction;

mod app;
pub mod event;
mod ui;

pub use app::{App, Focus, SidebarEntry};
use event::Command;

/// Quiet period after the last keystroke before the search is applied.
pub const SEARCH_DEBOUNCE_MS: u64 = 150;

/// Initializes the terminal for TUI rendering.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// Must run before exiting the TUI, even on error, to avoid leaving the
/// terminal in raw mode.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for the panic hook. Errors are ignored.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Installs a panic hook that restores the terminal before the original
/// hook runs.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Pushes the session's current state into the app.
pub fn sync<S: NoteStore>(app: &mut App, session: &Session<S>) {
    app.set_categories(session.categories());
    app.set_stale(
        session
            .is_stale()
            .then(|| session.last_error().unwrap_or("live updates failed").to_string()),
    );
    session.render(app);
}

/// Carries out a command from the key handler.
///
/// Returns `true` when the app should quit. Store failures are shown in
/// the status bar and never end the session.
pub fn apply_command<S: NoteStore>(
    app: &mut App,
    session: &mut Session<S>,
    command: Command,
) -> bool {
    let outcome = match command {
        Command::Quit => return true,
        Command::Dispatch(action) => {
            session.dispatch(action);
            sync(app, session);
            return false;
        }
        Command::TogglePin(id) => session.toggle_pin(&id).map(|()| "Pin toggled"),
        Command::SetArchived(id, true) => session.set_archived(&id, true).map(|()| "Note archived"),
        Command::SetArchived(id, false) => {
            session.set_archived(&id, false).map(|()| "Note restored")
        }
        Command::Delete(id) => session.delete(&id).map(|()| "Note deleted"),
    };

    match outcome {
        Ok(message) => app.set_status(message),
        Err(err) => {
            tracing::warn!(error = %err, "note action failed");
            app.set_status(format!("Error: {err}"));
        }
    }
    // The resulting snapshot arrives through the feed
    if session.poll() {
        sync(app, session);
    }
    false
}

/// Applies the search query once typing has paused.
pub fn apply_pending_search<S: NoteStore>(app: &mut App, session: &mut Session<S>) -> bool {
    if !app.should_search(SEARCH_DEBOUNCE_MS) {
        return false;
    }
    app.clear_search_pending();
    session.dispatch(ViewAction::Search(app.search_input().to_string()));
    sync(app, session);
    true
}

/// Runs the main event loop until the user quits.
///
/// Terminal state is always restored, even on error.
pub fn run_event_loop<S: NoteStore>(app: &mut App, session: &mut Session<S>) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, session, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

fn run_event_loop_internal<S: NoteStore>(
    app: &mut App,
    session: &mut Session<S>,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        if session.poll() {
            sync(app, session);
        }
        apply_pending_search(app, session);

        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = crossterm_event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(command) = event::handle_key_event(app, key)
            && apply_command(app, session, command)
        {
            break;
        }
    }

    Ok(())
}

/// Entry point for the TUI application.
///
/// Opens the configured store, subscribes to `owner`'s notes and starts
/// the event loop.
pub fn run(config: &Config, owner: OwnerId) -> Result<()> {
    init_panic_hook();

    let store = crate::utils::open_store(config)?;
    let mut session = Session::new(store, config.search);
    session
        .subscribe(owner)
        .context("Failed to subscribe to notes")?;

    let mut app = App::new();
    sync(&mut app, &session);

    let result = run_event_loop(&mut app, &mut session).context("TUI event loop failed");
    session.sign_out();
    result
}
