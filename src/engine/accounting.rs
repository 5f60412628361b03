use ulid::Ulid;

use crate::model::*;

use super::{Engine, EngineError};

// ── Item accounting ──────────────────────────────────────────────
//
// reserved/available are pure functions of current store state —
// always recomputed, never cached — so they stay correct after writes
// made by other requests.

impl Engine {
    /// Units of `part` currently held by reservations. No reservations
    /// is a legitimate state and yields 0.
    pub fn reserved(&self, part: Ulid) -> i64 {
        self.store
            .reservations
            .aggregate_sum(|r| r.part == part, |r| r.count)
    }

    pub fn available(&self, item: &ItemDoc) -> i64 {
        item.count - self.reserved(item.id)
    }

    /// Availability by id, for callers that haven't fetched the item.
    pub fn item_available(&self, id: Ulid) -> Result<i64, EngineError> {
        let item = self.require_item(id)?;
        Ok(self.available(&item))
    }
}

// ── Activity hour accounting ─────────────────────────────────────

/// Total hours claimed across an activity's sign-ups.
pub fn claimed_hours(activity: &ActivityDoc) -> f64 {
    activity.user_hours.iter().map(|e| e.hours).sum()
}

/// Claimed hours with one user's own entry excluded. This is the
/// in-place-edit ceiling: a user re-stating their hours must not have
/// their prior claim counted against them.
pub fn claimed_hours_excluding(activity: &ActivityDoc, user: Ulid) -> f64 {
    activity
        .user_hours
        .iter()
        .filter(|e| e.user != user)
        .map(|e| e.hours)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(max_hours: f64, entries: Vec<HourEntry>) -> ActivityDoc {
        ActivityDoc {
            id: Ulid::new(),
            title: "Test".into(),
            description: String::new(),
            start_time: 0,
            end_time: 1000,
            max_hours,
            user_hours: entries,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn claimed_empty_is_zero() {
        let act = activity(10.0, vec![]);
        assert_eq!(claimed_hours(&act), 0.0);
    }

    #[test]
    fn claimed_sums_entries() {
        let act = activity(
            10.0,
            vec![
                HourEntry { user: Ulid::new(), hours: 2.0 },
                HourEntry { user: Ulid::new(), hours: 3.5 },
            ],
        );
        assert_eq!(claimed_hours(&act), 5.5);
    }

    #[test]
    fn excluding_skips_only_that_user() {
        let me = Ulid::new();
        let act = activity(
            10.0,
            vec![
                HourEntry { user: me, hours: 4.0 },
                HourEntry { user: Ulid::new(), hours: 3.0 },
            ],
        );
        assert_eq!(claimed_hours_excluding(&act, me), 3.0);
        assert_eq!(claimed_hours_excluding(&act, Ulid::new()), 7.0);
    }

    #[test]
    fn reserved_is_zero_without_reservations() {
        let engine = Engine::new();
        let item = ItemDoc {
            id: Ulid::new(),
            name: "churro".into(),
            count: 10,
            created_at: 0,
            updated_at: 0,
        };
        engine.store.items.insert(item.id, item.clone());
        assert_eq!(engine.reserved(item.id), 0);
        assert_eq!(engine.available(&item), 10);
        assert_eq!(engine.item_available(item.id).unwrap(), 10);
    }

    #[test]
    fn available_tracks_reservation_sum() {
        let engine = Engine::new();
        let item = ItemDoc {
            id: Ulid::new(),
            name: "bolt".into(),
            count: 10,
            created_at: 0,
            updated_at: 0,
        };
        engine.store.items.insert(item.id, item.clone());

        for count in [3, 4] {
            let r = ReservationDoc {
                id: Ulid::new(),
                part: item.id,
                requester: Ulid::new(),
                count,
                status: ReservationStatus::Pending,
                eta: None,
                asm: None,
                created_at: 0,
                updated_at: 0,
            };
            engine.store.reservations.insert(r.id, r);
        }

        assert_eq!(engine.reserved(item.id), 7);
        assert_eq!(engine.available(&item), 3);
    }

    #[test]
    fn item_available_missing_item() {
        let engine = Engine::new();
        assert!(matches!(
            engine.item_available(Ulid::new()),
            Err(EngineError::NotFound("item"))
        ));
    }
}
