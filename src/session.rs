//! Session state: the latest snapshot, the view state and the live feed.
//!
//! A [`Session`] is what a view controller drives. Every trigger (a new
//! snapshot, a search change, a category pick, an archive toggle) ends in
//! the same recompute through [`compute_visible_notes`].

use crate::error::StoreError;
use crate::models::{NewNote, Note, NoteId, NotePatch, OwnerId};
use crate::pipeline::{Renderer, SearchOptions, compute_visible_notes};
use crate::store::{NoteStore, SnapshotEvent, Subscription};
use crate::view::{ViewAction, ViewState};

/// Per-user session over a [`NoteStore`].
///
/// # Examples
///
/// ```
/// use keepnote::{LocalStore, NewNote, OwnerId, SearchOptions, Session, ViewAction};
///
/// # fn main() -> Result<(), keepnote::StoreError> {
/// let mut session = Session::new(LocalStore::in_memory(), SearchOptions::default());
/// session.subscribe(OwnerId::new("u1"))?;
///
/// session.create(NewNote::new("Buy milk", "2 litres"))?;
/// session.poll();
/// session.dispatch(ViewAction::Search("milk".to_string()));
///
/// assert_eq!(session.visible().len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct Session<S: NoteStore> {
    store: S,
    owner: Option<OwnerId>,
    subscription: Option<Subscription>,
    snapshot: Vec<Note>,
    view: ViewState,
    options: SearchOptions,
    stale: bool,
    last_error: Option<String>,
}

impl<S: NoteStore> Session<S> {
    /// Creates a signed-out session.
    pub fn new(store: S, options: SearchOptions) -> Self {
        Self {
            store,
            owner: None,
            subscription: None,
            snapshot: Vec::new(),
            view: ViewState::new(),
            options,
            stale: false,
            last_error: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The signed-in owner, if any.
    pub fn owner(&self) -> Option<&OwnerId> {
        self.owner.as_ref()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn search_options(&self) -> &SearchOptions {
        &self.options
    }

    /// Every note of the owner as last delivered, unfiltered.
    pub fn snapshot(&self) -> &[Note] {
        &self.snapshot
    }

    /// Whether the last event on the feed was an error.
    ///
    /// The snapshot is still the last good one, but may be out of date.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Signs `owner` in and opens their live feed.
    ///
    /// The previous feed is cancelled before the new one is opened, so a
    /// late snapshot for the old owner can never be applied. The initial
    /// snapshot is applied before returning when the store delivers it
    /// synchronously. If the store refuses the subscription the session is
    /// left signed out.
    pub fn subscribe(&mut self, owner: OwnerId) -> Result<(), StoreError> {
        self.unsubscribe();
        // Signed out until the new feed is open
        self.owner = None;
        self.snapshot.clear();
        self.stale = false;
        self.last_error = None;

        let subscription = self.store.subscribe(&owner)?;
        tracing::info!(owner = %owner, "session subscribed");
        self.owner = Some(owner);
        self.subscription = Some(subscription);
        self.poll();
        Ok(())
    }

    /// Cancels the feed and forgets the owner and their notes.
    pub fn sign_out(&mut self) {
        self.unsubscribe();
        if let Some(owner) = self.owner.take() {
            tracing::info!(owner = %owner, "session signed out");
        }
        self.snapshot.clear();
        self.view = ViewState::new();
        self.stale = false;
        self.last_error = None;
    }

    fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }

    /// Applies every pending feed event. Returns `true` if anything changed.
    ///
    /// A snapshot replaces the previous one wholesale and clears the stale
    /// flag. An error keeps the current snapshot and sets the stale flag.
    pub fn poll(&mut self) -> bool {
        let Some(subscription) = &self.subscription else {
            return false;
        };

        let events = subscription.drain();
        let changed = !events.is_empty();
        for event in events {
            match event {
                SnapshotEvent::Snapshot(notes) => {
                    tracing::trace!(count = notes.len(), "applied snapshot");
                    self.snapshot = notes;
                    self.stale = false;
                    self.last_error = None;
                }
                SnapshotEvent::Error(err) => {
                    tracing::warn!(error = %err, "live feed error, keeping last snapshot");
                    self.stale = true;
                    self.last_error = Some(err.to_string());
                }
            }
        }
        changed
    }

    /// Advances the view state. The next [`visible`](Self::visible) call
    /// reflects it.
    pub fn dispatch(&mut self, action: ViewAction) -> &ViewState {
        self.view = self.view.reduce(action);
        &self.view
    }

    /// Notes to display for the current snapshot and view.
    pub fn visible(&self) -> Vec<Note> {
        compute_visible_notes(&self.snapshot, &self.view, &self.options)
    }

    /// Recomputes and hands the result to `renderer`.
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R) -> usize {
        crate::pipeline::render_visible_notes(renderer, &self.snapshot, &self.view, &self.options)
    }

    /// Distinct categories present in the snapshot, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .snapshot
            .iter()
            .map(|note| note.category().to_string())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    fn signed_in(&self) -> Result<&OwnerId, StoreError> {
        self.owner.as_ref().ok_or(StoreError::NotSignedIn)
    }

    // Mutations go straight to the store. The snapshot only changes when
    // the resulting feed event is polled.

    pub fn create(&self, note: NewNote) -> Result<NoteId, StoreError> {
        self.store.create(self.signed_in()?, note)
    }

    pub fn update(&self, id: &NoteId, patch: NotePatch) -> Result<(), StoreError> {
        self.store.update(self.signed_in()?, id, patch)
    }

    pub fn toggle_pin(&self, id: &NoteId) -> Result<(), StoreError> {
        self.store.toggle_pin(self.signed_in()?, id)
    }

    pub fn set_archived(&self, id: &NoteId, archived: bool) -> Result<(), StoreError> {
        self.store.set_archived(self.signed_in()?, id, archived)
    }

    pub fn delete(&self, id: &NoteId) -> Result<(), StoreError> {
        self.store.delete(self.signed_in()?, id)
    }
}
