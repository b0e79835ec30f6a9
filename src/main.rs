use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keepnote::config::{Backend, Config};
use keepnote::utils::parse_tags;
use keepnote::{
    CategoryFilter, NewNote, Note, NoteId, NotePatch, NoteStore, OwnerId, Renderer, Session,
    StoreError, ViewAction, ViewState, logging, tui, utils,
};

/// keepnote - personal notes with pinning, categories and an archive
#[derive(Parser)]
#[command(name = "keepnote")]
#[command(about = "Personal notes with pinning, categories and an archive")]
#[command(version)]
struct Cli {
    /// Owner whose notes to work with (overrides KEEPNOTE_OWNER)
    #[arg(long, global = true, value_name = "OWNER")]
    owner: Option<String>,

    /// Storage backend (overrides KEEPNOTE_BACKEND)
    #[arg(long, global = true, value_enum)]
    backend: Option<Backend>,

    /// Store file location (overrides KEEPNOTE_STORE)
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Add a new note
    Add(AddCommand),
    /// Change fields of an existing note
    Edit(EditCommand),
    /// Pin or unpin a note
    Pin(IdArg),
    /// Move a note to the archive
    Archive(IdArg),
    /// Restore a note from the archive
    Unarchive(IdArg),
    /// Permanently delete a note
    Delete(IdArg),
    /// Show a single note
    Show(IdArg),
    /// List notes the way the main screen shows them
    List(ListCommand),
    /// Open the interactive terminal UI
    Tui,
}

#[derive(Parser)]
struct AddCommand {
    /// Note title
    #[arg(value_name = "TITLE")]
    title: String,

    /// Note body; HTML markup is allowed
    #[arg(value_name = "CONTENT")]
    content: String,

    /// Category (defaults to Uncategorized)
    #[arg(short, long)]
    category: Option<String>,

    /// Comma-separated tags
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,

    /// Related product link
    #[arg(short, long, value_name = "URL")]
    link: Option<String>,

    /// Pin the new note
    #[arg(long)]
    pinned: bool,

    /// Create the note directly in the archive
    #[arg(long)]
    archived: bool,
}

#[derive(Parser)]
struct EditCommand {
    #[arg(value_name = "ID")]
    id: String,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    content: Option<String>,

    #[arg(short, long)]
    category: Option<String>,

    /// Comma-separated tags, replacing the current ones
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,

    #[arg(short, long, value_name = "URL")]
    link: Option<String>,
}

#[derive(Parser)]
struct IdArg {
    /// Note ID as printed by `add` and `list`
    #[arg(value_name = "ID")]
    id: String,
}

#[derive(Parser, Default)]
struct ListCommand {
    /// Show the archive instead of active notes
    #[arg(long)]
    archived: bool,

    /// Only notes in this category ("All" for every category)
    #[arg(short, long)]
    category: Option<String>,

    /// Case-insensitive search over title, text and tags
    #[arg(short, long, value_name = "QUERY")]
    search: Option<String>,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::from_env().with_overrides(cli.backend, cli.store.clone(), cli.owner.clone());

    // The TUI owns the terminal, so it logs to a file
    if matches!(cli.command, Commands::Tui) {
        if let Err(e) = init_tui_logging(utils::get_log_path()) {
            eprintln!("Warning: logging disabled: {e:#}");
        }
    } else {
        logging::init_stderr();
    }

    if let Err(e) = run(cli.command, &config) {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Sends logs to `path` so they stay off the TUI's screen.
fn init_tui_logging(path: Result<PathBuf>) -> Result<()> {
    let path = path?;
    logging::init_file(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are store validation failures, unknown note IDs, pinning
/// an archived note and a missing owner. Everything else is internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<StoreError>()
            .is_some_and(StoreError::is_user_error)
    })
}

fn require_owner(config: &Config) -> Result<OwnerId> {
    config
        .owner
        .clone()
        .ok_or(StoreError::NotSignedIn)
        .context("Pass --owner or set KEEPNOTE_OWNER")
}

fn run(command: Commands, config: &Config) -> Result<()> {
    let owner = require_owner(config)?;

    if matches!(command, Commands::Tui) {
        return tui::run(config, owner);
    }

    let store = utils::open_store(config)?;
    let mut out = io::stdout().lock();

    match command {
        Commands::Add(cmd) => execute_add(&store, &owner, cmd, &mut out),
        Commands::Edit(cmd) => execute_edit(&store, &owner, cmd, &mut out),
        Commands::Pin(arg) => execute_pin(&store, &owner, &arg, &mut out),
        Commands::Archive(arg) => execute_set_archived(&store, &owner, &arg, true, &mut out),
        Commands::Unarchive(arg) => execute_set_archived(&store, &owner, &arg, false, &mut out),
        Commands::Delete(arg) => execute_delete(&store, &owner, &arg, &mut out),
        Commands::Show(arg) => execute_show(&store, &owner, &arg, &mut out),
        Commands::List(cmd) => execute_list(store, owner, &cmd, config, &mut out),
        Commands::Tui => Ok(()),
    }
}

/// Creates a note and prints its ID.
fn execute_add(
    store: &impl NoteStore,
    owner: &OwnerId,
    cmd: AddCommand,
    out: &mut impl Write,
) -> Result<()> {
    let mut draft = NewNote::new(cmd.title, cmd.content)
        .pinned(cmd.pinned)
        .archived(cmd.archived);
    if let Some(category) = cmd.category {
        draft = draft.category(category);
    }
    if let Some(tags) = cmd.tags {
        draft = draft.tags(parse_tags(&tags));
    }
    if let Some(link) = cmd.link {
        draft = draft.product_link(link);
    }

    let id = store.create(owner, draft).context("Failed to create note")?;
    writeln!(out, "Note created (id: {id})")?;
    Ok(())
}

fn execute_edit(
    store: &impl NoteStore,
    owner: &OwnerId,
    cmd: EditCommand,
    out: &mut impl Write,
) -> Result<()> {
    let id = NoteId::new(cmd.id);
    let patch = NotePatch {
        title: cmd.title,
        content: cmd.content,
        category: cmd.category,
        tags: cmd.tags.as_deref().map(parse_tags),
        product_link: cmd.link,
        ..Default::default()
    };

    store
        .update(owner, &id, patch)
        .context("Failed to update note")?;
    writeln!(out, "Note updated (id: {id})")?;
    Ok(())
}

fn execute_pin(
    store: &impl NoteStore,
    owner: &OwnerId,
    arg: &IdArg,
    out: &mut impl Write,
) -> Result<()> {
    let id = NoteId::new(arg.id.as_str());
    store
        .toggle_pin(owner, &id)
        .context("Failed to toggle pin")?;

    let pinned = store
        .get(owner, &id)?
        .is_some_and(|note| note.is_pinned());
    if pinned {
        writeln!(out, "Note pinned (id: {id})")?;
    } else {
        writeln!(out, "Note unpinned (id: {id})")?;
    }
    Ok(())
}

fn execute_set_archived(
    store: &impl NoteStore,
    owner: &OwnerId,
    arg: &IdArg,
    archived: bool,
    out: &mut impl Write,
) -> Result<()> {
    let id = NoteId::new(arg.id.as_str());
    store
        .set_archived(owner, &id, archived)
        .context("Failed to change archive state")?;

    let verb = if archived { "archived" } else { "restored" };
    writeln!(out, "Note {verb} (id: {id})")?;
    Ok(())
}

fn execute_delete(
    store: &impl NoteStore,
    owner: &OwnerId,
    arg: &IdArg,
    out: &mut impl Write,
) -> Result<()> {
    let id = NoteId::new(arg.id.as_str());
    store
        .delete(owner, &id)
        .context("Failed to delete note")?;
    writeln!(out, "Note deleted (id: {id})")?;
    Ok(())
}

fn execute_show(
    store: &impl NoteStore,
    owner: &OwnerId,
    arg: &IdArg,
    out: &mut impl Write,
) -> Result<()> {
    let id = NoteId::new(arg.id.as_str());
    let note = store
        .get(owner, &id)
        .context("Failed to load note")?
        .ok_or(StoreError::NotFound { id })?;

    writeln!(out, "{}", note.title())?;
    writeln!(out, "id:       {}", note.id())?;
    writeln!(out, "category: {}", note.category())?;
    if !note.tags().is_empty() {
        writeln!(out, "tags:     {}", note.tags().join(", "))?;
    }
    if let Some(link) = note.product_link() {
        writeln!(out, "link:     {link}")?;
    }
    writeln!(
        out,
        "state:    {}{}",
        if note.is_archived() { "archived" } else { "active" },
        if note.is_pinned() { ", pinned" } else { "" }
    )?;
    writeln!(out)?;
    writeln!(out, "{}", note.plain_text().unwrap_or(note.content()))?;
    Ok(())
}

/// Prints one line per note in display order.
struct LineRenderer<'a, W: Write> {
    out: &'a mut W,
    result: io::Result<()>,
}

impl<W: Write> LineRenderer<'_, W> {
    fn write_list(&mut self, notes: &[Note], view: &ViewState) -> io::Result<()> {
        writeln!(self.out, "{} ({})", view.heading(), notes.len())?;
        for note in notes {
            let marker = if note.is_pinned() { "*" } else { " " };
            writeln!(
                self.out,
                "{marker} {}  {}  [{}]",
                note.id(),
                note.title(),
                note.category()
            )?;
        }
        Ok(())
    }
}

impl<W: Write> Renderer for LineRenderer<'_, W> {
    fn render(&mut self, notes: &[Note], view: &ViewState) {
        self.result = self.write_list(notes, view);
    }
}

/// Lists notes through the same pipeline the TUI uses.
fn execute_list<S: NoteStore>(
    store: S,
    owner: OwnerId,
    cmd: &ListCommand,
    config: &Config,
    out: &mut impl Write,
) -> Result<()> {
    let mut session = Session::new(store, config.search);
    session
        .subscribe(owner)
        .context("Failed to load notes")?;

    if cmd.archived {
        session.dispatch(ViewAction::ShowArchived);
    } else if let Some(category) = &cmd.category {
        session.dispatch(ViewAction::SelectCategory(CategoryFilter::parse(category)));
    }
    if let Some(query) = &cmd.search {
        session.dispatch(ViewAction::Search(query.clone()));
    }

    if session.is_stale() {
        tracing::warn!(
            reason = session.last_error().unwrap_or_default(),
            "data may be out of date"
        );
    }

    let mut renderer = LineRenderer {
        out,
        result: Ok(()),
    };
    session.render(&mut renderer);
    renderer.result?;
    Ok(())
}
