mod accounting;
mod error;
mod mutations;
mod policy;
mod queries;
mod store;
mod validate;

pub use accounting::{claimed_hours, claimed_hours_excluding};
pub use error::EngineError;
pub use policy::verify_password;
pub use store::{Collection, Store};

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::model::*;

/// The accounting engine. All validation and availability checks run
/// here; the embedding service owns authentication and routing and hands
/// each operation an acting user id plus a draft of the request body.
///
/// Per-item and per-activity locks serialize every read-check-write
/// sequence that touches one capacity pool, so an availability check and
/// the write it guards always see a single snapshot.
pub struct Engine {
    pub store: Store,
    item_locks: DashMap<Ulid, Arc<Mutex<()>>>,
    activity_locks: DashMap<Ulid, Arc<Mutex<()>>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            store: Store::new(),
            item_locks: DashMap::new(),
            activity_locks: DashMap::new(),
        }
    }

    // The DashMap entry guard must drop before the caller awaits the
    // mutex, hence clone-out rather than returning a guard.
    pub(super) fn item_lock(&self, id: Ulid) -> Arc<Mutex<()>> {
        self.item_locks.entry(id).or_default().clone()
    }

    pub(super) fn activity_lock(&self, id: Ulid) -> Arc<Mutex<()>> {
        self.activity_locks.entry(id).or_default().clone()
    }

    pub(super) fn drop_item_lock(&self, id: &Ulid) {
        self.item_locks.remove(id);
    }

    pub(super) fn drop_activity_lock(&self, id: &Ulid) {
        self.activity_locks.remove(id);
    }

    // ── Reference resolution ─────────────────────────────────
    //
    // Fetch-or-NotFound helpers; the tag names which reference was bad
    // so the caller's error message points at the right field.

    pub(super) fn require_item(&self, id: Ulid) -> Result<ItemDoc, EngineError> {
        self.store.items.get(&id).ok_or(EngineError::NotFound("item"))
    }

    pub(super) fn require_part(&self, id: Ulid) -> Result<ItemDoc, EngineError> {
        self.store.items.get(&id).ok_or(EngineError::NotFound("part"))
    }

    pub(super) fn require_user(&self, id: Ulid) -> Result<UserDoc, EngineError> {
        self.store.users.get(&id).ok_or(EngineError::NotFound("user"))
    }

    pub(super) fn require_acting_user(&self, id: Ulid) -> Result<UserDoc, EngineError> {
        self.store
            .users
            .get(&id)
            .ok_or(EngineError::NotFound("acting user"))
    }

    pub(super) fn require_reservation(&self, id: Ulid) -> Result<ReservationDoc, EngineError> {
        self.store
            .reservations
            .get(&id)
            .ok_or(EngineError::NotFound("reservation"))
    }

    pub(super) fn require_activity(&self, id: Ulid) -> Result<ActivityDoc, EngineError> {
        self.store
            .activities
            .get(&id)
            .ok_or(EngineError::NotFound("activity"))
    }
}
