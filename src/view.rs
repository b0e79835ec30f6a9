//! Immutable view state and the reducer that advances it.
//!
//! The current category, archive mode and search text live in one value
//! that is replaced wholesale on every user action. Handlers never poke
//! individual fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which collection of notes is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveView {
    /// Active notes: everything not archived.
    #[default]
    Main,
    /// Archived notes only.
    Archived,
}

/// Category restriction for the main view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Exact, case-sensitive category match.
    Named(String),
}

impl CategoryFilter {
    /// Parses a sidebar label; the literal `"All"` means no restriction.
    pub fn parse(label: &str) -> Self {
        if label == "All" {
            Self::All
        } else {
            Self::Named(label.to_string())
        }
    }

    /// Returns `true` if a note in `category` passes this filter.
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => name == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

/// User actions that change what is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    /// The search box text changed.
    Search(String),
    /// A category was picked from the sidebar. Returns to the main view.
    SelectCategory(CategoryFilter),
    /// The archive entry was picked. Resets the category to `All`.
    ShowArchived,
    /// Back to all active notes.
    ShowMain,
}

/// Snapshot of the UI filter state fed into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub active_view: ActiveView,
    pub category: CategoryFilter,
    pub search_query: String,
}

impl ViewState {
    /// Main view, all categories, no search.
    pub fn new() -> Self {
        Self::default()
    }

    /// Archived view with no search.
    pub fn archived() -> Self {
        Self {
            active_view: ActiveView::Archived,
            ..Self::default()
        }
    }

    /// Returns the state that follows `action`.
    ///
    /// # Examples
    ///
    /// ```
    /// use keepnote::{ActiveView, CategoryFilter, ViewAction, ViewState};
    ///
    /// let state = ViewState::new()
    ///     .reduce(ViewAction::SelectCategory(CategoryFilter::parse("Work")))
    ///     .reduce(ViewAction::ShowArchived);
    ///
    /// assert_eq!(state.active_view, ActiveView::Archived);
    /// assert_eq!(state.category, CategoryFilter::All);
    /// ```
    pub fn reduce(&self, action: ViewAction) -> Self {
        match action {
            ViewAction::Search(query) => Self {
                search_query: query,
                ..self.clone()
            },
            ViewAction::SelectCategory(category) => Self {
                active_view: ActiveView::Main,
                category,
                search_query: self.search_query.clone(),
            },
            ViewAction::ShowArchived => Self {
                active_view: ActiveView::Archived,
                category: CategoryFilter::All,
                search_query: self.search_query.clone(),
            },
            ViewAction::ShowMain => Self {
                active_view: ActiveView::Main,
                category: CategoryFilter::All,
                search_query: self.search_query.clone(),
            },
        }
    }

    /// Trimmed, lower-cased query, or `None` when there is nothing to match.
    pub fn normalized_query(&self) -> Option<String> {
        let query = self.search_query.trim().to_lowercase();
        (!query.is_empty()).then_some(query)
    }

    /// Heading for the note list.
    pub fn heading(&self) -> String {
        match (&self.active_view, &self.category) {
            (ActiveView::Archived, _) => "Archive".to_string(),
            (ActiveView::Main, CategoryFilter::All) => "All Notes".to_string(),
            (ActiveView::Main, CategoryFilter::Named(name)) => format!("Category: {name}"),
        }
    }
}
