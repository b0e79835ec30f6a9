//! The filter-sort pipeline that decides which notes are displayed.
//!
//! [`compute_visible_notes`] is a pure function of the note snapshot, the
//! view state and the search options. It is called again on every trigger
//! and keeps no state of its own.

use std::cmp::Ordering;

use crate::models::Note;
use crate::view::{ActiveView, ViewState};

/// Tunables for the search filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOptions {
    /// Also match the query against the note's category.
    pub match_category: bool,
}

/// Sink for the computed list, typically a UI.
pub trait Renderer {
    /// Paints `notes` in the given order. The return value is ignored.
    fn render(&mut self, notes: &[Note], view: &ViewState);
}

/// Computes the ordered list of notes to display.
///
/// 1. Scope: the archived view keeps archived notes; the main view keeps
///    the rest and applies the category filter.
/// 2. Search: when the trimmed query is non-empty, keep notes whose title,
///    plain text or space-joined tags contain it, case-insensitively.
/// 3. Sort: pinned first (main view only), then most recently updated
///    (falling back to creation time), then by ID.
///
/// # Examples
///
/// ```
/// use keepnote::{NoteBuilder, NoteId, SearchOptions, Timestamp, ViewState, compute_visible_notes};
///
/// let notes = vec![
///     NoteBuilder::new(NoteId::new("1"))
///         .title("Buy milk")
///         .updated_at(Timestamp::Millis(2_000))
///         .build(),
///     NoteBuilder::new(NoteId::new("2"))
///         .title("Project plan")
///         .pinned(true)
///         .updated_at(Timestamp::Millis(1_000))
///         .build(),
/// ];
///
/// let visible = compute_visible_notes(&notes, &ViewState::new(), &SearchOptions::default());
/// let ids: Vec<&str> = visible.iter().map(|n| n.id().as_str()).collect();
/// assert_eq!(ids, ["2", "1"]);
/// ```
pub fn compute_visible_notes(
    all_notes: &[Note],
    view: &ViewState,
    options: &SearchOptions,
) -> Vec<Note> {
    let query = view.normalized_query();

    let mut visible: Vec<Note> = all_notes
        .iter()
        .filter(|note| in_scope(note, view))
        .filter(|note| {
            query
                .as_deref()
                .is_none_or(|q| matches_query(note, q, options))
        })
        .cloned()
        .collect();

    let pin_matters = view.active_view == ActiveView::Main;
    visible.sort_by(|a, b| compare_for_display(a, b, pin_matters));
    visible
}

/// [`compute_visible_notes`] with default search options.
pub fn compute_visible_notes_default(all_notes: &[Note], view: &ViewState) -> Vec<Note> {
    compute_visible_notes(all_notes, view, &SearchOptions::default())
}

/// Computes the visible list and hands it to `renderer`.
pub fn render_visible_notes<R: Renderer + ?Sized>(
    renderer: &mut R,
    all_notes: &[Note],
    view: &ViewState,
    options: &SearchOptions,
) -> usize {
    let visible = compute_visible_notes(all_notes, view, options);
    renderer.render(&visible, view);
    visible.len()
}

fn in_scope(note: &Note, view: &ViewState) -> bool {
    match view.active_view {
        ActiveView::Archived => note.is_archived(),
        ActiveView::Main => !note.is_archived() && view.category.matches(note.category()),
    }
}

/// `query` must already be trimmed and lower-cased.
fn matches_query(note: &Note, query: &str, options: &SearchOptions) -> bool {
    if note.title().to_lowercase().contains(query) {
        return true;
    }
    if note
        .plain_text()
        .is_some_and(|text| text.to_lowercase().contains(query))
    {
        return true;
    }
    if note.tags().join(" ").to_lowercase().contains(query) {
        return true;
    }
    options.match_category && note.category().to_lowercase().contains(query)
}

fn compare_for_display(a: &Note, b: &Note, pin_matters: bool) -> Ordering {
    let by_pin = if pin_matters {
        b.is_pinned().cmp(&a.is_pinned())
    } else {
        Ordering::Equal
    };

    by_pin
        .then_with(|| b.effective_millis().cmp(&a.effective_millis()))
        .then_with(|| a.id().cmp(b.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteBuilder, NoteId, NoteRecord, Timestamp};
    use crate::view::{CategoryFilter, ViewAction};

    fn note(id: &str) -> NoteBuilder {
        NoteBuilder::new(NoteId::new(id))
    }

    fn ids(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.id().as_str()).collect()
    }

    fn search(query: &str) -> ViewState {
        ViewState::new().reduce(ViewAction::Search(query.to_string()))
    }

    fn scenario_notes() -> Vec<Note> {
        vec![
            note("1")
                .title("Buy milk")
                .pinned(false)
                .archived(false)
                .updated_at(Timestamp::Millis(2_000))
                .build(),
            note("2")
                .title("Project plan")
                .pinned(true)
                .archived(false)
                .updated_at(Timestamp::Millis(1_000))
                .build(),
        ]
    }

    #[test]
    fn pinned_note_sorts_first_despite_older_timestamp() {
        let visible = compute_visible_notes_default(&scenario_notes(), &ViewState::new());
        assert_eq!(ids(&visible), ["2", "1"]);
    }

    #[test]
    fn search_milk_returns_only_matching_note() {
        let visible = compute_visible_notes_default(&scenario_notes(), &search("milk"));
        assert_eq!(ids(&visible), ["1"]);
    }

    #[test]
    fn note_without_archive_flag_is_in_main_view_only() {
        let legacy = Note::from_record(
            NoteId::new("3"),
            NoteRecord {
                title: Some("Legacy".to_string()),
                ..Default::default()
            },
        );
        let notes = vec![legacy];

        let main = compute_visible_notes_default(&notes, &ViewState::new());
        assert_eq!(ids(&main), ["3"]);

        let archived = compute_visible_notes_default(&notes, &ViewState::archived());
        assert!(archived.is_empty());
    }

    #[test]
    fn main_and_archived_views_partition_the_notes() {
        let notes = vec![
            note("a").archived(true).build(),
            note("b").archived(false).build(),
            note("c").build(),
            note("d").archived(true).pinned(true).build(),
        ];

        let main = compute_visible_notes_default(&notes, &ViewState::new());
        let archived = compute_visible_notes_default(&notes, &ViewState::archived());

        assert!(main.iter().all(|n| !n.is_archived()));
        assert!(archived.iter().all(|n| n.is_archived()));
        assert_eq!(main.len() + archived.len(), notes.len());
    }

    #[test]
    fn archived_view_ignores_pin_for_ordering() {
        let notes = vec![
            note("old-pinned")
                .archived(true)
                .pinned(true)
                .updated_at(Timestamp::Millis(1))
                .build(),
            note("new").archived(true).updated_at(Timestamp::Millis(9)).build(),
        ];

        let visible = compute_visible_notes_default(&notes, &ViewState::archived());
        assert_eq!(ids(&visible), ["new", "old-pinned"]);
    }

    #[test]
    fn category_filter_applies_to_main_view_exactly() {
        let notes = vec![
            note("w").category("Work").build(),
            note("lw").category("work").build(),
            note("u").build(),
        ];
        let view = ViewState::new().reduce(ViewAction::SelectCategory(CategoryFilter::parse("Work")));

        let visible = compute_visible_notes_default(&notes, &view);
        assert_eq!(ids(&visible), ["w"]);

        let uncategorized = ViewState::new()
            .reduce(ViewAction::SelectCategory(CategoryFilter::parse("Uncategorized")));
        let visible = compute_visible_notes_default(&notes, &uncategorized);
        assert_eq!(ids(&visible), ["u"]);
    }

    #[test]
    fn category_filter_is_ignored_in_archived_view() {
        let notes = vec![note("x").category("Home").archived(true).build()];
        let view = ViewState {
            active_view: ActiveView::Archived,
            category: CategoryFilter::Named("Work".to_string()),
            search_query: String::new(),
        };

        assert_eq!(ids(&compute_visible_notes_default(&notes, &view)), ["x"]);
    }

    #[test]
    fn search_matches_plain_text_and_tags_case_insensitively() {
        let notes = vec![
            note("body").title("A").plain_text("Remember the MILKMAN").build(),
            note("tag")
                .title("B")
                .tags(vec!["Dairy".to_string(), "Milk-run".to_string()])
                .build(),
            note("none").title("C").content("<p>milk</p>").build(),
        ];

        let visible = compute_visible_notes_default(&notes, &search("MiLk"));
        let mut found = ids(&visible);
        found.sort();
        assert_eq!(found, ["body", "tag"]);
    }

    #[test]
    fn search_matches_across_joined_tags() {
        let notes = vec![
            note("t")
                .tags(vec!["red".to_string(), "apple".to_string()])
                .build(),
        ];
        let visible = compute_visible_notes_default(&notes, &search("red app"));
        assert_eq!(ids(&visible), ["t"]);
    }

    #[test]
    fn whitespace_query_returns_scope_filtered_set() {
        let notes = scenario_notes();
        let unfiltered = compute_visible_notes_default(&notes, &ViewState::new());
        let blank = compute_visible_notes_default(&notes, &search("   "));
        assert_eq!(unfiltered, blank);
    }

    #[test]
    fn query_is_trimmed_before_matching() {
        let visible = compute_visible_notes_default(&scenario_notes(), &search("  milk  "));
        assert_eq!(ids(&visible), ["1"]);
    }

    #[test]
    fn category_matching_is_opt_in() {
        let notes = vec![note("r").title("Pasta").category("Recipes").build()];

        let default = compute_visible_notes_default(&notes, &search("recipe"));
        assert!(default.is_empty());

        let options = SearchOptions {
            match_category: true,
        };
        let with_category = compute_visible_notes(&notes, &search("recipe"), &options);
        assert_eq!(ids(&with_category), ["r"]);
    }

    #[test]
    fn missing_title_does_not_break_search() {
        let notes = vec![note("untitled").plain_text("hello").build()];
        let visible = compute_visible_notes_default(&notes, &search("hello"));
        assert_eq!(ids(&visible), ["untitled"]);
    }

    #[test]
    fn mixed_timestamp_representations_sort_by_instant() {
        use time::macros::datetime;

        let notes = vec![
            note("server")
                .updated_at(Timestamp::from_server(datetime!(2024-05-01 12:00 UTC)))
                .build(),
            note("local")
                .updated_at(Timestamp::Local(datetime!(2024-05-02 08:00 UTC)))
                .build(),
            note("millis")
                .updated_at(Timestamp::Millis(
                    datetime!(2024-04-30 00:00 UTC).unix_timestamp() * 1000,
                ))
                .build(),
        ];

        let visible = compute_visible_notes_default(&notes, &ViewState::new());
        assert_eq!(ids(&visible), ["local", "server", "millis"]);
    }

    #[test]
    fn missing_updated_at_falls_back_to_created_at() {
        let notes = vec![
            note("edited")
                .created_at(Timestamp::Millis(1))
                .updated_at(Timestamp::Millis(50))
                .build(),
            note("fresh").created_at(Timestamp::Millis(100)).build(),
        ];
        let visible = compute_visible_notes_default(&notes, &ViewState::new());
        assert_eq!(ids(&visible), ["fresh", "edited"]);
    }

    #[test]
    fn equal_times_break_ties_by_id() {
        let notes = vec![
            note("b").updated_at(Timestamp::Millis(5)).build(),
            note("c").updated_at(Timestamp::Millis(5)).build(),
            note("a").updated_at(Timestamp::Millis(5)).build(),
        ];
        let visible = compute_visible_notes_default(&notes, &ViewState::new());
        assert_eq!(ids(&visible), ["a", "b", "c"]);
    }

    #[test]
    fn pinned_notes_precede_all_unpinned_regardless_of_time() {
        let notes = vec![
            note("u1").updated_at(Timestamp::Millis(900)).build(),
            note("p1").pinned(true).updated_at(Timestamp::Millis(1)).build(),
            note("u2").updated_at(Timestamp::Millis(800)).build(),
            note("p2").pinned(true).updated_at(Timestamp::Millis(2)).build(),
        ];
        let visible = compute_visible_notes_default(&notes, &ViewState::new());
        assert_eq!(ids(&visible), ["p2", "p1", "u1", "u2"]);
    }

    #[test]
    fn repeated_computation_is_identical() {
        let notes = scenario_notes();
        let view = search("p");
        let first = compute_visible_notes_default(&notes, &view);
        let second = compute_visible_notes_default(&notes, &view);
        assert_eq!(first, second);
    }

    #[test]
    fn input_order_does_not_affect_output() {
        let mut notes = vec![
            note("x").updated_at(Timestamp::Millis(3)).build(),
            note("y").pinned(true).build(),
            note("z").updated_at(Timestamp::Millis(3)).build(),
        ];
        let forward = compute_visible_notes_default(&notes, &ViewState::new());
        notes.reverse();
        let backward = compute_visible_notes_default(&notes, &ViewState::new());
        assert_eq!(forward, backward);
    }

    struct Recording {
        calls: Vec<(Vec<String>, ViewState)>,
    }

    impl Renderer for Recording {
        fn render(&mut self, notes: &[Note], view: &ViewState) {
            self.calls.push((
                notes.iter().map(|n| n.id().to_string()).collect(),
                view.clone(),
            ));
        }
    }

    #[test]
    fn render_visible_notes_hands_ordered_list_to_renderer() {
        let mut renderer = Recording { calls: Vec::new() };
        let count = render_visible_notes(
            &mut renderer,
            &scenario_notes(),
            &ViewState::new(),
            &SearchOptions::default(),
        );

        assert_eq!(count, 2);
        assert_eq!(renderer.calls.len(), 1);
        assert_eq!(renderer.calls[0].0, vec!["2", "1"]);
    }
}
