//! UI rendering functions for the TUI.
//!
//! Lays out the search bar, the category sidebar, the note list and the
//! detail view, plus a stale-data banner while the live feed is failing.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use super::app::{App, Focus};
use crate::models::{Note, Timestamp};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const PREVIEW_CHARS: usize = 40;

/// Main rendering function for the TUI.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();
    let banner_height = u16::from(app.stale().is_some());

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(banner_height), // Stale banner
            Constraint::Length(3),             // Search input
            Constraint::Min(0),                // Content area
            Constraint::Length(1),             // Status / shortcut bar
        ])
        .split(size);

    // sidebar (20%) | note list (30%) | detail view (50%)
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(30),
            Constraint::Percentage(50),
        ])
        .split(main_chunks[2]);

    if let Some(reason) = app.stale() {
        render_stale_banner(frame, reason, main_chunks[0]);
    }
    render_search_input(frame, app, main_chunks[1]);
    render_sidebar(frame, app, content_chunks[0]);
    render_note_list(frame, app, content_chunks[1]);
    render_detail_view(frame, app, content_chunks[2]);
    render_shortcut_bar(frame, app, main_chunks[3]);
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn render_stale_banner(frame: &mut Frame, reason: &str, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            " Data may be out of date ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(reason.to_string(), Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_search_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::SearchInput;

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Search")
        .border_style(border_style(is_focused));

    let mut content = app.search_input().to_string();
    if is_focused {
        content.push('█');
    }

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::Sidebar;

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Categories")
        .border_style(border_style(is_focused));

    let items: Vec<ListItem> = app
        .sidebar_entries()
        .iter()
        .map(|entry| ListItem::new(entry.label()))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut state = ListState::default();
    state.select(Some(app.sidebar_index()));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_note_list(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::NoteList;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{} ({})", app.heading(), app.notes().len()))
        .border_style(border_style(is_focused));

    let items: Vec<ListItem> = app.notes().iter().map(note_list_line).map(ListItem::new).collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::REVERSED),
    );

    let mut list_state = ListState::default();
    list_state.select(app.selected_index());
    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Pin marker, title preview and date.
fn note_list_line(note: &Note) -> Line<'static> {
    let marker = if note.is_pinned() { "* " } else { "  " };
    let title = if note.title().is_empty() {
        "(untitled)"
    } else {
        note.title()
    };

    Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Yellow)),
        Span::raw(preview(title, PREVIEW_CHARS)),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", format_timestamp(display_time(note), DATE_FORMAT)),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ),
    ])
}

/// Truncates to `max` characters, appending an ellipsis when cut.
fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn display_time(note: &Note) -> Option<Timestamp> {
    note.updated_at().or(note.created_at())
}

fn format_timestamp(at: Option<Timestamp>, format: &[BorrowedFormatItem<'_>]) -> String {
    at.and_then(|at| at.to_datetime())
        .and_then(|at| at.format(format).ok())
        .unwrap_or_else(|| "-".to_string())
}

fn render_detail_view(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::DetailView;

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Detail")
        .border_style(border_style(is_focused));

    let content = app
        .selected_note()
        .map(detail_text)
        .unwrap_or_else(|| Text::from("No note selected"));

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll(), 0));

    frame.render_widget(paragraph, area);
}

fn detail_text(note: &Note) -> Text<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(Color::DarkGray);
    let mut text = Text::default();

    text.lines.push(Line::from(Span::styled(note.title().to_string(), bold)));

    let mut flags = vec![Span::styled(
        note.category().to_string(),
        Style::default().fg(Color::Cyan),
    )];
    if note.is_pinned() {
        flags.push(Span::raw("  pinned"));
    }
    if note.is_archived() {
        flags.push(Span::raw("  archived"));
    }
    text.lines.push(Line::from(flags));

    if !note.tags().is_empty() {
        text.lines.push(Line::from(vec![
            Span::styled("Tags: ", bold),
            Span::raw(note.tags().join(", ")),
        ]));
    }
    if let Some(link) = note.product_link() {
        text.lines.push(Line::from(vec![
            Span::styled("Link: ", bold),
            Span::raw(link.to_string()),
        ]));
    }

    text.lines.push(Line::from(""));
    let body = note.plain_text().unwrap_or(note.content());
    for line in body.lines() {
        text.lines.push(Line::from(line.to_string()));
    }

    text.lines.push(Line::from(""));
    text.lines.push(Line::from(vec![
        Span::styled("Created: ", bold),
        Span::styled(format_timestamp(note.created_at(), DATETIME_FORMAT), dim),
    ]));
    text.lines.push(Line::from(vec![
        Span::styled("Updated: ", bold),
        Span::styled(format_timestamp(note.updated_at(), DATETIME_FORMAT), dim),
    ]));

    text
}

/// Shows the status message if there is one, otherwise the shortcuts for
/// the focused panel.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(status) = app.status() {
        let line = Line::from(Span::styled(
            status.to_string(),
            Style::default().fg(Color::Yellow),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let shortcuts: &[(&str, &str)] = match app.focus() {
        Focus::SearchInput => &[("Ctrl+C", "quit"), ("Tab", "next panel"), ("Esc", "reset")],
        Focus::Sidebar => &[
            ("q", "quit"),
            ("Tab", "next panel"),
            ("j/k", "move"),
            ("Enter", "open"),
            ("a", "archive view"),
        ],
        Focus::NoteList => &[
            ("q", "quit"),
            ("j/k", "move"),
            ("p", "pin"),
            ("x", "archive"),
            ("d", "delete"),
            ("a", "archive view"),
        ],
        Focus::DetailView => &[("q", "quit"), ("Tab", "next panel"), ("j/k", "scroll")],
    };

    let mut spans = Vec::new();
    for (i, (key, action)) in shortcuts.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", sep_style));
        }
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::raw(format!(": {action}")));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
