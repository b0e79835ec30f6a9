use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::models::{Note, OwnerId};

/// One delivery on a live subscription.
#[derive(Debug)]
pub enum SnapshotEvent {
    /// The complete current note set, superseding every earlier snapshot.
    Snapshot(Vec<Note>),
    /// The feed failed to produce a snapshot. Later snapshots may follow.
    Error(StoreError),
}

struct Registration {
    id: u64,
    sender: Sender<SnapshotEvent>,
}

type Registry = Mutex<HashMap<OwnerId, Registration>>;

/// Tracks the single live subscription of each owner.
pub(crate) struct SubscriptionHub {
    registry: Arc<Registry>,
    next_id: AtomicU64,
}

impl SubscriptionHub {
    pub(crate) fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a new subscription for `owner`.
    ///
    /// Any previous registration is dropped, which disconnects its channel.
    pub(crate) fn register(&self, owner: &OwnerId) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel();

        let replaced = self
            .registry
            .lock()
            .insert(owner.clone(), Registration { id, sender });
        if let Some(previous) = replaced {
            tracing::debug!(owner = %owner, previous = previous.id, "replaced live subscription");
        }

        Subscription {
            id,
            owner: owner.clone(),
            receiver,
            registry: Arc::downgrade(&self.registry),
            detached: false,
        }
    }

    pub(crate) fn is_subscribed(&self, owner: &OwnerId) -> bool {
        self.registry.lock().contains_key(owner)
    }

    /// Delivers an event to `owner`'s subscription, if any.
    ///
    /// `make_event` only runs when somebody is listening.
    pub(crate) fn publish(&self, owner: &OwnerId, make_event: impl FnOnce() -> SnapshotEvent) {
        if !self.is_subscribed(owner) {
            return;
        }
        let event = make_event();

        let mut registry = self.registry.lock();
        let Some(registration) = registry.get(owner) else {
            return;
        };
        if registration.sender.send(event).is_err() {
            tracing::debug!(owner = %owner, "dropping subscription with closed receiver");
            registry.remove(owner);
        }
    }

    /// Number of owners with a live subscription.
    #[cfg(test)]
    pub(crate) fn live_count(&self) -> usize {
        self.registry.lock().len()
    }
}

/// Handle to a live snapshot feed.
///
/// Dropping the handle or calling [`Subscription::cancel`] tears the feed
/// down. Opening a newer subscription for the same owner disconnects this
/// one; [`Subscription::is_connected`] then reports `false`.
pub struct Subscription {
    id: u64,
    owner: OwnerId,
    receiver: Receiver<SnapshotEvent>,
    registry: Weak<Registry>,
    detached: bool,
}

impl Subscription {
    /// Owner whose notes this feed delivers.
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Blocks until the next event. `None` once the feed is disconnected.
    pub fn recv(&self) -> Option<SnapshotEvent> {
        self.receiver.recv().ok()
    }

    /// Waits at most `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SnapshotEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Returns the next pending event without blocking.
    pub fn try_recv(&self) -> Option<SnapshotEvent> {
        self.receiver.try_recv().ok()
    }

    /// Takes every pending event without blocking, in arrival order.
    pub fn drain(&self) -> Vec<SnapshotEvent> {
        self.receiver.try_iter().collect()
    }

    /// Whether this handle is still the owner's live subscription.
    pub fn is_connected(&self) -> bool {
        if self.detached {
            return false;
        }
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        registry
            .lock()
            .get(&self.owner)
            .is_some_and(|registration| registration.id == self.id)
    }

    /// Tears the feed down.
    pub fn cancel(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;

        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock();
        // A newer subscription for the same owner must survive this one
        if registry
            .get(&self.owner)
            .is_some_and(|registration| registration.id == self.id)
        {
            registry.remove(&self.owner);
            tracing::debug!(owner = %self.owner, "cancelled live subscription");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("detached", &self.detached)
            .finish()
    }
}
