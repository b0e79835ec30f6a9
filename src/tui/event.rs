//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes. Anything
//! that needs the store or the view state comes back as a [`Command`] for
//! the event loop to carry out.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};
use crate::models::NoteId;
use crate::view::{ActiveView, ViewAction};

/// Work the event loop must do in response to a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Advance the view state.
    Dispatch(ViewAction),
    TogglePin(NoteId),
    SetArchived(NoteId, bool),
    Delete(NoteId),
}

/// Handles a keyboard event and updates the app state accordingly.
///
/// # Event Handling
///
/// - `Ctrl+C`: quit from anywhere; `q` quits outside the search bar
/// - `Tab` / `Shift+Tab`: cycle focus between panels
/// - `Esc`: return to the search bar
/// - Search bar: character input edits the query (debounced by the loop)
/// - Sidebar: j/k to move, Enter to pick a category or the archive
/// - Note list: j/k to move, `p` pin, `x` archive or restore, `d` delete
/// - `a` outside the search bar toggles between main view and archive
///
/// # Examples
///
/// ```
/// use keepnote::tui::{App, event::{Command, handle_key_event}};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new();
/// let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
/// assert_eq!(handle_key_event(&mut app, key), Some(Command::Quit));
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Command> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Command::Quit);
    }

    // A pending delete swallows the next key
    if app.has_pending_delete() {
        let pending = app.take_pending_delete();
        if key.code == KeyCode::Char('y') {
            return pending.map(Command::Delete);
        }
        app.set_status("Delete cancelled");
        return None;
    }

    match key.code {
        KeyCode::Tab => {
            app.next_focus();
            return None;
        }
        KeyCode::BackTab => {
            app.prev_focus();
            return None;
        }
        KeyCode::Esc => {
            app.reset_focus();
            app.clear_selection();
            return None;
        }
        _ => {}
    }

    if app.focus() != Focus::SearchInput && key.modifiers.is_empty() {
        match key.code {
            KeyCode::Char('q') => return Some(Command::Quit),
            KeyCode::Char('a') => {
                let action = match app.active_view() {
                    ActiveView::Main => ViewAction::ShowArchived,
                    ActiveView::Archived => ViewAction::ShowMain,
                };
                return Some(Command::Dispatch(action));
            }
            _ => {}
        }
    }

    match app.focus() {
        Focus::SearchInput => {
            handle_search_input(app, key);
            None
        }
        Focus::Sidebar => handle_sidebar(app, key),
        Focus::NoteList => handle_note_list(app, key),
        Focus::DetailView => {
            handle_detail_view(app, key);
            None
        }
    }
}

/// Edits the search buffer. The loop dispatches the query once typing
/// pauses.
fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_search_char(c);
        }
        KeyCode::Backspace => {
            app.pop_search_char();
        }
        _ => {}
    }
}

fn handle_sidebar(app: &mut App, key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.sidebar_next(),
        KeyCode::Char('k') | KeyCode::Up => app.sidebar_previous(),
        KeyCode::Enter => {
            return app
                .sidebar_selection()
                .map(|entry| Command::Dispatch(entry.action()));
        }
        _ => {}
    }
    None
}

fn handle_note_list(app: &mut App, key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('p') => {
            return app
                .selected_note()
                .map(|note| Command::TogglePin(note.id().clone()));
        }
        KeyCode::Char('x') => {
            return app
                .selected_note()
                .map(|note| Command::SetArchived(note.id().clone(), !note.is_archived()));
        }
        KeyCode::Char('d') => app.request_delete(),
        _ => {}
    }
    None
}

fn handle_detail_view(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_detail_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_detail_up(1),
        _ => {}
    }
}
