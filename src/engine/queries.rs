use ulid::Ulid;

use crate::model::*;

use super::accounting::claimed_hours;
use super::{Engine, EngineError};

impl Engine {
    // ── Projection helpers ───────────────────────────────────
    //
    // Summaries are built from a just-fetched document; `available` and
    // `claimed_hours` are recomputed at this moment, never read back
    // from storage.

    pub(super) fn summarize_item(&self, doc: &ItemDoc) -> ItemSummary {
        let reserved = self.reserved(doc.id);
        ItemSummary {
            id: doc.id,
            name: doc.name.clone(),
            count: doc.count,
            reserved,
            available: doc.count - reserved,
            created: doc.created_at,
            updated: doc.updated_at,
        }
    }

    pub(super) fn summarize_reservation(&self, doc: &ReservationDoc) -> ReservationSummary {
        ReservationSummary {
            id: doc.id,
            part: doc.part,
            requester: doc.requester,
            count: doc.count,
            status: doc.status,
            eta: doc.eta,
            asm: doc.asm.clone(),
            created: doc.created_at,
            updated: doc.updated_at,
        }
    }

    pub(super) fn summarize_user(&self, doc: &UserDoc) -> UserSummary {
        UserSummary {
            id: doc.id,
            username: doc.username.clone(),
            realname: doc.realname.clone(),
            admin: doc.admin,
            activity_creator: doc.activity_creator,
            disabled: doc.disabled,
            created: doc.created_at,
            updated: doc.updated_at,
        }
    }

    pub(super) fn summarize_activity(&self, doc: &ActivityDoc) -> ActivitySummary {
        ActivitySummary {
            id: doc.id,
            title: doc.title.clone(),
            description: doc.description.clone(),
            start_time: doc.start_time,
            end_time: doc.end_time,
            max_hours: doc.max_hours,
            claimed_hours: claimed_hours(doc),
            user_hours: doc.user_hours.clone(),
            created: doc.created_at,
            updated: doc.updated_at,
        }
    }

    // ── Public queries ───────────────────────────────────────

    pub fn item_summary(&self, id: Ulid) -> Result<ItemSummary, EngineError> {
        let doc = self.require_item(id)?;
        Ok(self.summarize_item(&doc))
    }

    pub fn list_items(&self) -> Vec<ItemSummary> {
        self.store
            .items
            .find(|_| true)
            .iter()
            .map(|doc| self.summarize_item(doc))
            .collect()
    }

    pub fn reservation_summary(&self, id: Ulid) -> Result<ReservationSummary, EngineError> {
        let doc = self.require_reservation(id)?;
        Ok(self.summarize_reservation(&doc))
    }

    pub fn list_reservations(&self) -> Vec<ReservationSummary> {
        self.store
            .reservations
            .find(|_| true)
            .iter()
            .map(|doc| self.summarize_reservation(doc))
            .collect()
    }

    /// Reservations currently claiming units of one item.
    pub fn item_reservations(&self, item: Ulid) -> Result<Vec<ReservationSummary>, EngineError> {
        self.require_item(item)?;
        Ok(self
            .store
            .reservations
            .find(|r| r.part == item)
            .iter()
            .map(|doc| self.summarize_reservation(doc))
            .collect())
    }

    pub fn user_summary(&self, id: Ulid) -> Result<UserSummary, EngineError> {
        let doc = self.require_user(id)?;
        Ok(self.summarize_user(&doc))
    }

    pub fn list_users(&self) -> Vec<UserSummary> {
        self.store
            .users
            .find(|_| true)
            .iter()
            .map(|doc| self.summarize_user(doc))
            .collect()
    }

    /// Lookup for the session layer, which authenticates by username.
    pub fn user_by_username(&self, username: &str) -> Option<UserDoc> {
        self.store.users.find_one(|u| u.username == username)
    }

    pub fn activity_summary(&self, id: Ulid) -> Result<ActivitySummary, EngineError> {
        let doc = self.require_activity(id)?;
        Ok(self.summarize_activity(&doc))
    }

    pub fn list_activities(&self) -> Vec<ActivitySummary> {
        self.store
            .activities
            .find(|_| true)
            .iter()
            .map(|doc| self.summarize_activity(doc))
            .collect()
    }
}
