use ulid::Ulid;

use crate::model::*;
use crate::observability::{CAPACITY_REJECTIONS_TOTAL, CASCADE_REMOVALS_TOTAL, MUTATIONS_TOTAL};

use super::accounting::{claimed_hours, claimed_hours_excluding};
use super::policy::{hash_password, require_activity_creator, require_admin, require_owner_or_admin};
use super::validate::*;
use super::{Engine, EngineError};

impl Engine {
    // ── Items ────────────────────────────────────────────────

    pub fn create_item(&self, draft: &ItemDraft) -> Result<ItemSummary, EngineError> {
        validate_item_name(&draft.name)?;
        let count = parse_stock_count(&draft.count)?;

        let now = now_ms();
        let doc = ItemDoc {
            id: Ulid::new(),
            name: draft.name.clone(),
            count,
            created_at: now,
            updated_at: now,
        };
        self.store.items.insert(doc.id, doc.clone());
        metrics::counter!(MUTATIONS_TOTAL, "op" => "create_item").increment(1);
        Ok(self.summarize_item(&doc))
    }

    /// Field-level update. `count` is the operator-set total and is not
    /// checked against outstanding reservations; an operator shrinking
    /// stock below the reserved sum shows up as negative availability.
    pub fn update_item(&self, id: Ulid, patch: &ItemPatch) -> Result<ItemSummary, EngineError> {
        let mut doc = self.require_item(id)?;
        if let Some(name) = &patch.name {
            validate_item_name(name)?;
            doc.name = name.clone();
        }
        if let Some(count) = &patch.count {
            doc.count = parse_stock_count(count)?;
        }
        doc.updated_at = now_ms();
        self.store.items.update(id, doc.clone());
        metrics::counter!(MUTATIONS_TOTAL, "op" => "update_item").increment(1);
        Ok(self.summarize_item(&doc))
    }

    /// Remove dependent reservations, then the item. The cascade is
    /// two-step and not atomic; an interruption between the steps
    /// leaves an item with no reservations, which is self-consistent
    /// and safe to retry.
    pub async fn delete_item(&self, id: Ulid) -> Result<(), EngineError> {
        self.require_item(id)?;
        let lock = self.item_lock(id);
        let _guard = lock.lock_owned().await;
        self.require_item(id)?;

        let removed = self.store.reservations.remove_where(|r| r.part == id);
        if removed > 0 {
            metrics::counter!(CASCADE_REMOVALS_TOTAL).increment(removed as u64);
        }
        self.store.items.remove(&id);
        self.drop_item_lock(&id);
        tracing::info!(item = %id, reservations_removed = removed, "deleted item");
        metrics::counter!(MUTATIONS_TOTAL, "op" => "delete_item").increment(1);
        Ok(())
    }

    // ── Reservations ─────────────────────────────────────────

    /// Create a claim against an item's availability. Preconditions, in
    /// order: the part exists, the resolved requester exists, the count
    /// is a positive integer, and the count fits inside the part's
    /// current availability. Nothing persists unless all four hold.
    pub async fn create_reservation(
        &self,
        acting: Ulid,
        draft: &ReservationDraft,
    ) -> Result<ReservationSummary, EngineError> {
        let acting = self.require_acting_user(acting)?;
        self.require_part(draft.part)?;
        let requester = self.resolve_requester(&acting, &draft.requester)?;
        let count = parse_count(&draft.count)?;
        if let Some(asm) = &draft.asm {
            validate_asm(asm)?;
        }

        let lock = self.item_lock(draft.part);
        let _guard = lock.lock_owned().await;
        // Re-fetch under the lock: the item may have been deleted, and
        // availability must come from the same snapshot as the write.
        let item = self.require_part(draft.part)?;
        let available = self.available(&item);
        if count > available {
            metrics::counter!(CAPACITY_REJECTIONS_TOTAL, "op" => "create_reservation").increment(1);
            return Err(EngineError::Capacity { requested: count, available });
        }

        let now = now_ms();
        let doc = ReservationDoc {
            id: Ulid::new(),
            part: item.id,
            requester: requester.id,
            count,
            status: draft.status.unwrap_or_default(),
            eta: draft.eta,
            asm: draft.asm.clone(),
            created_at: now,
            updated_at: now,
        };
        self.store.reservations.insert(doc.id, doc.clone());
        tracing::debug!(reservation = %doc.id, part = %item.id, count, "created reservation");
        metrics::counter!(MUTATIONS_TOTAL, "op" => "create_reservation").increment(1);
        Ok(self.summarize_reservation(&doc))
    }

    /// Full replace of part/count/requester; status, eta and asm keep
    /// their current values when the draft leaves them out.
    ///
    /// The capacity ceiling depends on where the reservation is going:
    /// retargeting to a different item checks against that item's plain
    /// availability (the old hold is being released, it plays no part);
    /// staying on the same item adds the reservation's own current count
    /// back first, otherwise its prior hold would count against itself
    /// and an edit up to the ceiling could never succeed.
    pub async fn update_reservation(
        &self,
        acting: Ulid,
        id: Ulid,
        draft: &ReservationDraft,
    ) -> Result<ReservationSummary, EngineError> {
        let acting = self.require_acting_user(acting)?;
        let existing = self.require_reservation(id)?;
        require_owner_or_admin(&acting, &existing)?;
        self.require_part(draft.part)?;
        let requester = self.resolve_requester(&acting, &draft.requester)?;
        let count = parse_count(&draft.count)?;
        if let Some(asm) = &draft.asm {
            validate_asm(asm)?;
        }

        let lock = self.item_lock(draft.part);
        let _guard = lock.lock_owned().await;
        // One snapshot for both reads: the target's availability and the
        // reservation's own current count.
        let item = self.require_part(draft.part)?;
        let existing = self.require_reservation(id)?;
        require_owner_or_admin(&acting, &existing)?;

        let ceiling = if item.id == existing.part {
            self.available(&item) + existing.count
        } else {
            self.available(&item)
        };
        if count > ceiling {
            metrics::counter!(CAPACITY_REJECTIONS_TOTAL, "op" => "update_reservation").increment(1);
            return Err(EngineError::Capacity { requested: count, available: ceiling });
        }

        let doc = ReservationDoc {
            id,
            part: item.id,
            requester: requester.id,
            count,
            status: draft.status.unwrap_or(existing.status),
            eta: draft.eta.or(existing.eta),
            asm: draft.asm.clone().or(existing.asm),
            created_at: existing.created_at,
            updated_at: now_ms(),
        };
        self.store.reservations.update(id, doc.clone());
        metrics::counter!(MUTATIONS_TOTAL, "op" => "update_reservation").increment(1);
        Ok(self.summarize_reservation(&doc))
    }

    /// Removes the reservation; the held units reappear in the item's
    /// availability on the next read, since availability is never stored.
    pub async fn delete_reservation(&self, acting: Ulid, id: Ulid) -> Result<(), EngineError> {
        let acting = self.require_acting_user(acting)?;
        let existing = self.require_reservation(id)?;
        require_owner_or_admin(&acting, &existing)?;

        let lock = self.item_lock(existing.part);
        let _guard = lock.lock_owned().await;
        self.store.reservations.remove(&id);
        tracing::info!(reservation = %id, part = %existing.part, "deleted reservation");
        metrics::counter!(MUTATIONS_TOTAL, "op" => "delete_reservation").increment(1);
        Ok(())
    }

    // ── Users ────────────────────────────────────────────────

    pub fn create_user(&self, acting: Ulid, draft: &UserDraft) -> Result<UserSummary, EngineError> {
        let acting = self.require_acting_user(acting)?;
        require_admin(&acting)?;
        validate_username(&draft.username)?;
        validate_realname(&draft.realname)?;
        validate_password(&draft.password)?;
        if self
            .store
            .users
            .find_one(|u| u.username == draft.username)
            .is_some()
        {
            return Err(EngineError::Validation("username already taken".into()));
        }

        let now = now_ms();
        let doc = UserDoc {
            id: Ulid::new(),
            username: draft.username.clone(),
            realname: draft.realname.clone(),
            admin: draft.admin,
            activity_creator: draft.activity_creator,
            disabled: draft.disabled,
            password_hash: hash_password(&draft.password)?,
            created_at: now,
            updated_at: now,
        };
        self.store.users.insert(doc.id, doc.clone());
        tracing::info!(user = %doc.id, username = %doc.username, "created user");
        metrics::counter!(MUTATIONS_TOTAL, "op" => "create_user").increment(1);
        Ok(self.summarize_user(&doc))
    }

    pub fn update_user(
        &self,
        acting: Ulid,
        id: Ulid,
        patch: &UserPatch,
    ) -> Result<UserSummary, EngineError> {
        let acting = self.require_acting_user(acting)?;
        require_admin(&acting)?;
        let mut doc = self.require_user(id)?;
        validate_username(&patch.username)?;
        validate_realname(&patch.realname)?;
        if self
            .store
            .users
            .find_one(|u| u.username == patch.username && u.id != id)
            .is_some()
        {
            return Err(EngineError::Validation("username already taken".into()));
        }

        doc.username = patch.username.clone();
        doc.realname = patch.realname.clone();
        doc.admin = patch.admin;
        doc.activity_creator = patch.activity_creator;
        doc.disabled = patch.disabled;
        doc.updated_at = now_ms();
        self.store.users.update(id, doc.clone());
        metrics::counter!(MUTATIONS_TOTAL, "op" => "update_user").increment(1);
        Ok(self.summarize_user(&doc))
    }

    /// Reservations held by the user are left in place; they keep
    /// counting against their items until handled by an operator.
    pub fn delete_user(&self, acting: Ulid, id: Ulid) -> Result<(), EngineError> {
        let acting = self.require_acting_user(acting)?;
        require_admin(&acting)?;
        self.require_user(id)?;
        self.store.users.remove(&id);
        tracing::info!(user = %id, "deleted user");
        metrics::counter!(MUTATIONS_TOTAL, "op" => "delete_user").increment(1);
        Ok(())
    }

    /// Admins may set anyone's password; everyone may set their own.
    pub fn set_password(
        &self,
        acting: Ulid,
        target: Ulid,
        password: &str,
    ) -> Result<(), EngineError> {
        let acting = self.require_acting_user(acting)?;
        if !acting.admin && acting.id != target {
            return Err(EngineError::Forbidden("administrators only"));
        }
        let mut doc = self.require_user(target)?;
        validate_password(password)?;
        doc.password_hash = hash_password(password)?;
        doc.updated_at = now_ms();
        self.store.users.update(target, doc);
        tracing::info!(user = %target, "password changed");
        metrics::counter!(MUTATIONS_TOTAL, "op" => "set_password").increment(1);
        Ok(())
    }

    // ── Activities ───────────────────────────────────────────

    pub fn create_activity(
        &self,
        acting: Ulid,
        draft: &ActivityDraft,
    ) -> Result<ActivitySummary, EngineError> {
        let acting = self.require_acting_user(acting)?;
        require_activity_creator(&acting)?;
        validate_title(&draft.title)?;
        validate_description(&draft.description)?;
        validate_time_window(draft.start_time, draft.end_time)?;
        let max_hours = parse_max_hours(&draft.max_hours)?;

        let now = now_ms();
        let doc = ActivityDoc {
            id: Ulid::new(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            start_time: draft.start_time,
            end_time: draft.end_time,
            max_hours,
            user_hours: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.store.activities.insert(doc.id, doc.clone());
        metrics::counter!(MUTATIONS_TOTAL, "op" => "create_activity").increment(1);
        Ok(self.summarize_activity(&doc))
    }

    /// Replaces the schedule fields; sign-ups are untouched. Lowering
    /// `max_hours` below the hours already claimed is rejected, the hour
    /// analogue of availability never going negative.
    pub async fn update_activity(
        &self,
        acting: Ulid,
        id: Ulid,
        draft: &ActivityDraft,
    ) -> Result<ActivitySummary, EngineError> {
        let acting = self.require_acting_user(acting)?;
        require_activity_creator(&acting)?;
        self.require_activity(id)?;
        validate_title(&draft.title)?;
        validate_description(&draft.description)?;
        validate_time_window(draft.start_time, draft.end_time)?;
        let max_hours = parse_max_hours(&draft.max_hours)?;

        let lock = self.activity_lock(id);
        let _guard = lock.lock_owned().await;
        let mut doc = self.require_activity(id)?;
        let claimed = claimed_hours(&doc);
        if max_hours < claimed {
            metrics::counter!(CAPACITY_REJECTIONS_TOTAL, "op" => "update_activity").increment(1);
            return Err(EngineError::HoursExceeded { claimed, max_hours });
        }

        doc.title = draft.title.clone();
        doc.description = draft.description.clone();
        doc.start_time = draft.start_time;
        doc.end_time = draft.end_time;
        doc.max_hours = max_hours;
        doc.updated_at = now_ms();
        self.store.activities.update(id, doc.clone());
        metrics::counter!(MUTATIONS_TOTAL, "op" => "update_activity").increment(1);
        Ok(self.summarize_activity(&doc))
    }

    pub fn delete_activity(&self, acting: Ulid, id: Ulid) -> Result<(), EngineError> {
        let acting = self.require_acting_user(acting)?;
        require_activity_creator(&acting)?;
        self.require_activity(id)?;
        self.store.activities.remove(&id);
        self.drop_activity_lock(&id);
        tracing::info!(activity = %id, "deleted activity");
        metrics::counter!(MUTATIONS_TOTAL, "op" => "delete_activity").increment(1);
        Ok(())
    }

    /// Record (or restate) one user's hour claim on an activity. The
    /// ceiling excludes the user's own prior entry, mirroring the
    /// same-item reservation update rule. An existing entry is replaced
    /// in place so the sign-up order holds; a new one is appended.
    pub async fn set_user_hours(
        &self,
        acting: Ulid,
        activity_id: Ulid,
        draft: &HoursDraft,
    ) -> Result<ActivitySummary, EngineError> {
        let acting = self.require_acting_user(acting)?;
        self.require_activity(activity_id)?;
        let user = self.resolve_requester(&acting, &draft.requester)?;
        let hours = parse_hours(&draft.hours)?;

        let lock = self.activity_lock(activity_id);
        let _guard = lock.lock_owned().await;
        let mut doc = self.require_activity(activity_id)?;
        let others = claimed_hours_excluding(&doc, user.id);
        if others + hours > doc.max_hours {
            metrics::counter!(CAPACITY_REJECTIONS_TOTAL, "op" => "set_user_hours").increment(1);
            return Err(EngineError::HoursExceeded {
                claimed: others + hours,
                max_hours: doc.max_hours,
            });
        }

        match doc.user_hours.iter_mut().find(|e| e.user == user.id) {
            Some(entry) => entry.hours = hours,
            None => doc.user_hours.push(HourEntry { user: user.id, hours }),
        }
        doc.updated_at = now_ms();
        self.store.activities.update(activity_id, doc.clone());
        metrics::counter!(MUTATIONS_TOTAL, "op" => "set_user_hours").increment(1);
        Ok(self.summarize_activity(&doc))
    }

    /// Drop a user's hour claim. Absent entries are a no-op, so the
    /// operation is safe to retry.
    pub async fn clear_user_hours(
        &self,
        acting: Ulid,
        activity_id: Ulid,
        user: Ulid,
    ) -> Result<ActivitySummary, EngineError> {
        let acting = self.require_acting_user(acting)?;
        if !acting.admin && acting.id != user {
            return Err(EngineError::Forbidden("cannot clear another user's hours"));
        }
        self.require_activity(activity_id)?;

        let lock = self.activity_lock(activity_id);
        let _guard = lock.lock_owned().await;
        let mut doc = self.require_activity(activity_id)?;
        let before = doc.user_hours.len();
        doc.user_hours.retain(|e| e.user != user);
        if doc.user_hours.len() != before {
            doc.updated_at = now_ms();
            self.store.activities.update(activity_id, doc.clone());
            metrics::counter!(MUTATIONS_TOTAL, "op" => "clear_user_hours").increment(1);
        }
        Ok(self.summarize_activity(&doc))
    }
}
