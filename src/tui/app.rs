use std::time::Instant;

use crate::models::{Note, NoteId};
use crate::pipeline::Renderer;
use crate::view::{ActiveView, CategoryFilter, ViewAction, ViewState};

/// Application state for the TUI.
///
/// Holds what is on screen: the visible notes handed over by the session,
/// the sidebar entries, selection, search input and panel focus. The
/// notes themselves are never filtered here.
#[derive(Debug, Clone)]
pub struct App {
    /// Notes to display, already filtered and sorted
    notes: Vec<Note>,
    /// Heading of the note list panel
    heading: String,
    active_view: ActiveView,
    /// Categories present in the snapshot
    categories: Vec<String>,
    sidebar_index: usize,
    selected_index: Option<usize>,
    search_input: String,
    focus: Focus,
    /// When the search input was last changed (for debouncing)
    search_changed_at: Option<Instant>,
    search_pending: bool,
    detail_scroll: u16,
    /// Set while the live feed is failing
    stale: Option<String>,
    /// One-line feedback for the last action
    status: Option<String>,
    /// Note awaiting delete confirmation
    pending_delete: Option<NoteId>,
}

/// Panel focus state for keyboard navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Search bar is focused (typing edits the query)
    SearchInput,
    /// Category sidebar is focused (j/k to move, Enter to pick)
    Sidebar,
    /// Note list panel is focused (j/k navigation, note actions)
    NoteList,
    /// Detail view panel is focused (j/k scrolling)
    DetailView,
}

/// An entry in the category sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarEntry {
    Category(CategoryFilter),
    Archive,
}

impl SidebarEntry {
    pub fn label(&self) -> String {
        match self {
            Self::Category(filter) => filter.to_string(),
            Self::Archive => "Archive".to_string(),
        }
    }

    /// The view change picking this entry triggers.
    pub fn action(&self) -> ViewAction {
        match self {
            Self::Category(filter) => ViewAction::SelectCategory(filter.clone()),
            Self::Archive => ViewAction::ShowArchived,
        }
    }
}

impl App {
    /// Creates a new App with default state.
    ///
    /// Default focus is `SearchInput`. Notes list is empty, selection is
    /// None, search input is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use keepnote::tui::App;
    ///
    /// let app = App::new();
    /// assert!(app.notes().is_empty());
    /// assert_eq!(app.selected_index(), None);
    /// assert_eq!(app.heading(), "All Notes");
    /// ```
    pub fn new() -> Self {
        Self {
            notes: Vec::new(),
            heading: ViewState::new().heading(),
            active_view: ActiveView::Main,
            categories: Vec::new(),
            sidebar_index: 0,
            selected_index: None,
            search_input: String::new(),
            focus: Focus::SearchInput,
            search_changed_at: None,
            search_pending: false,
            detail_scroll: 0,
            stale: None,
            status: None,
            pending_delete: None,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn active_view(&self) -> ActiveView {
        self.active_view
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Returns the currently selected note, if any.
    pub fn selected_note(&self) -> Option<&Note> {
        self.selected_index.and_then(|i| self.notes.get(i))
    }

    /// Replaces the sidebar categories, keeping the highlighted entry
    /// in range.
    pub fn set_categories(&mut self, categories: Vec<String>) {
        self.categories = categories;
        let last = self.sidebar_entries().len().saturating_sub(1);
        self.sidebar_index = self.sidebar_index.min(last);
    }

    /// `All`, one entry per category, then `Archive`.
    pub fn sidebar_entries(&self) -> Vec<SidebarEntry> {
        let mut entries = vec![SidebarEntry::Category(CategoryFilter::All)];
        entries.extend(
            self.categories
                .iter()
                .map(|c| SidebarEntry::Category(CategoryFilter::Named(c.clone()))),
        );
        entries.push(SidebarEntry::Archive);
        entries
    }

    pub fn sidebar_index(&self) -> usize {
        self.sidebar_index
    }

    /// The highlighted sidebar entry.
    pub fn sidebar_selection(&self) -> Option<SidebarEntry> {
        self.sidebar_entries().into_iter().nth(self.sidebar_index)
    }

    pub fn sidebar_next(&mut self) {
        let len = self.sidebar_entries().len();
        self.sidebar_index = (self.sidebar_index + 1) % len;
    }

    pub fn sidebar_previous(&mut self) {
        let len = self.sidebar_entries().len();
        self.sidebar_index = (self.sidebar_index + len - 1) % len;
    }

    /// Sets or clears the stale-data banner.
    pub fn set_stale(&mut self, reason: Option<String>) {
        self.stale = reason;
    }

    pub fn stale(&self) -> Option<&str> {
        self.stale.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Asks for confirmation before deleting the selected note.
    pub fn request_delete(&mut self) {
        if let Some(note) = self.selected_note() {
            let id = note.id().clone();
            self.status = Some(format!("Delete \"{}\"? (y/n)", note.title()));
            self.pending_delete = Some(id);
        }
    }

    /// Takes the note awaiting confirmation, if any.
    pub fn take_pending_delete(&mut self) -> Option<NoteId> {
        self.pending_delete.take()
    }

    pub fn has_pending_delete(&self) -> bool {
        self.pending_delete.is_some()
    }

    /// Cycles focus to the next panel in Tab order.
    ///
    /// Order: `SearchInput` -> `Sidebar` -> `NoteList` -> `DetailView` -> `SearchInput`
    ///
    /// # Examples
    ///
    /// ```
    /// use keepnote::tui::{App, Focus};
    ///
    /// let mut app = App::new();
    /// app.next_focus();
    /// assert_eq!(app.focus(), Focus::Sidebar);
    ///
    /// app.next_focus();
    /// assert_eq!(app.focus(), Focus::NoteList);
    /// ```
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::SearchInput => Focus::Sidebar,
            Focus::Sidebar => Focus::NoteList,
            Focus::NoteList => Focus::DetailView,
            Focus::DetailView => Focus::SearchInput,
        };
        self.auto_select_on_note_list_focus();
    }

    /// Cycles focus to the previous panel in reverse Tab order.
    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            Focus::SearchInput => Focus::DetailView,
            Focus::Sidebar => Focus::SearchInput,
            Focus::NoteList => Focus::Sidebar,
            Focus::DetailView => Focus::NoteList,
        };
        self.auto_select_on_note_list_focus();
    }

    /// Auto-selects first note when entering NoteList focus with no selection.
    fn auto_select_on_note_list_focus(&mut self) {
        if self.focus == Focus::NoteList && self.selected_index.is_none() && !self.notes.is_empty()
        {
            self.selected_index = Some(0);
        }
    }

    /// Moves selection down, wrapping to the top.
    ///
    /// # Examples
    ///
    /// ```
    /// use keepnote::tui::App;
    /// use keepnote::{NoteBuilder, NoteId, Renderer, ViewState};
    ///
    /// let mut app = App::new();
    /// let notes = vec![
    ///     NoteBuilder::new(NoteId::new("1")).title("Note 1").build(),
    ///     NoteBuilder::new(NoteId::new("2")).title("Note 2").build(),
    /// ];
    /// app.render(&notes, &ViewState::new());
    ///
    /// app.select_next();
    /// assert_eq!(app.selected_index(), Some(0));
    ///
    /// app.select_next();
    /// app.select_next(); // Wraps to beginning
    /// assert_eq!(app.selected_index(), Some(0));
    /// ```
    pub fn select_next(&mut self) {
        if self.notes.is_empty() {
            self.selected_index = None;
            return;
        }

        self.selected_index = Some(match self.selected_index {
            Some(i) if i + 1 < self.notes.len() => i + 1,
            _ => 0,
        });
        self.detail_scroll = 0;
    }

    /// Moves selection up, wrapping to the bottom.
    pub fn select_previous(&mut self) {
        if self.notes.is_empty() {
            self.selected_index = None;
            return;
        }

        self.selected_index = Some(match self.selected_index {
            None | Some(0) => self.notes.len() - 1,
            Some(i) => i - 1,
        });
        self.detail_scroll = 0;
    }

    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    pub fn scroll_detail_down(&mut self, amount: u16) {
        self.detail_scroll = self.detail_scroll.saturating_add(amount);
    }

    pub fn scroll_detail_up(&mut self, amount: u16) {
        self.detail_scroll = self.detail_scroll.saturating_sub(amount);
    }

    /// Adds a character to the search input and marks search as pending.
    pub fn push_search_char(&mut self, c: char) {
        self.search_input.push(c);
        self.mark_search_changed();
    }

    /// Removes the last character from the search input.
    pub fn pop_search_char(&mut self) {
        self.search_input.pop();
        self.mark_search_changed();
    }

    fn mark_search_changed(&mut self) {
        self.search_changed_at = Some(Instant::now());
        self.search_pending = true;
    }

    /// Returns whether a search is pending and at least `debounce_ms`
    /// milliseconds have passed since the last keystroke.
    pub fn should_search(&self, debounce_ms: u64) -> bool {
        if !self.search_pending {
            return false;
        }
        match self.search_changed_at {
            Some(changed_at) => changed_at.elapsed().as_millis() >= u128::from(debounce_ms),
            None => false,
        }
    }

    pub fn clear_search_pending(&mut self) {
        self.search_pending = false;
    }

    pub fn clear_selection(&mut self) {
        self.selected_index = None;
    }

    /// Returns focus to `SearchInput` (Esc key behavior).
    pub fn reset_focus(&mut self) {
        self.focus = Focus::SearchInput;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for App {
    /// Takes over a freshly computed list.
    ///
    /// The selection follows the selected note by ID; if it is no longer
    /// visible the selection is cleared.
    fn render(&mut self, notes: &[Note], view: &ViewState) {
        let selected_id = self.selected_note().map(|note| note.id().clone());

        self.notes = notes.to_vec();
        self.heading = view.heading();
        self.active_view = view.active_view;

        let position =
            selected_id.and_then(|id| self.notes.iter().position(|note| note.id() == &id));
        if position != self.selected_index {
            self.detail_scroll = 0;
        }
        self.selected_index = position;
        self.auto_select_on_note_list_focus();
    }
}
