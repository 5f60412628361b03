use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Fulfilment state of a reservation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[default]
    Pending,
    InProgress,
    Fulfilled,
}

// ── Stored documents ─────────────────────────────────────────────

/// A stock-tracked inventory unit. `count` is the operator-set total;
/// the reserved/available split is always derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDoc {
    pub id: Ulid,
    pub name: String,
    pub count: i64,
    pub created_at: Ms,
    pub updated_at: Ms,
}

/// A claim on `count` units of `part`, held by `requester`.
/// `asm` is an opaque grouping tag with no referential integrity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDoc {
    pub id: Ulid,
    pub part: Ulid,
    pub requester: Ulid,
    pub count: i64,
    pub status: ReservationStatus,
    pub eta: Option<Ms>,
    pub asm: Option<String>,
    pub created_at: Ms,
    pub updated_at: Ms,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    pub id: Ulid,
    pub username: String,
    pub realname: String,
    pub admin: bool,
    pub activity_creator: bool,
    pub disabled: bool,
    pub password_hash: String,
    pub created_at: Ms,
    pub updated_at: Ms,
}

/// One user's hour claim inside an activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourEntry {
    pub user: Ulid,
    pub hours: f64,
}

/// A scheduled event whose `user_hours` entries are claims against
/// the `max_hours` ceiling. The sequence keeps sign-up order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDoc {
    pub id: Ulid,
    pub title: String,
    pub description: String,
    pub start_time: Ms,
    pub end_time: Ms,
    pub max_hours: f64,
    pub user_hours: Vec<HourEntry>,
    pub created_at: Ms,
    pub updated_at: Ms,
}

// ── External JSON views ──────────────────────────────────────────

/// `available` is recomputed from the same fetch as `count` and
/// `reserved`; it is never read back from a stored field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSummary {
    pub id: Ulid,
    pub name: String,
    pub count: i64,
    pub reserved: i64,
    pub available: i64,
    pub created: Ms,
    pub updated: Ms,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationSummary {
    pub id: Ulid,
    pub part: Ulid,
    pub requester: Ulid,
    pub count: i64,
    pub status: ReservationStatus,
    pub eta: Option<Ms>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asm: Option<String>,
    pub created: Ms,
    pub updated: Ms,
}

/// Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Ulid,
    pub username: String,
    pub realname: String,
    pub admin: bool,
    pub activity_creator: bool,
    pub disabled: bool,
    pub created: Ms,
    pub updated: Ms,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub id: Ulid,
    pub title: String,
    pub description: String,
    pub start_time: Ms,
    pub end_time: Ms,
    pub max_hours: f64,
    pub claimed_hours: f64,
    pub user_hours: Vec<HourEntry>,
    pub created: Ms,
    pub updated: Ms,
}

// ── Request drafts ───────────────────────────────────────────────
//
// Drafts carry the already-parsed request body. Field *presence* is the
// routing layer's problem; value correctness (type, positivity, bounds,
// referential existence) is checked here before anything persists.
// Loosely-typed numeric fields stay `serde_json::Value` because the
// original API accepts both numbers and numeric strings for them.

/// Requester override fields on a reservation or hour write.
/// Ignored entirely unless the acting user is an admin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequesterOverride {
    pub requester: Option<Ulid>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationDraft {
    pub part: Ulid,
    pub count: serde_json::Value,
    #[serde(flatten)]
    pub requester: RequesterOverride,
    pub asm: Option<String>,
    pub status: Option<ReservationStatus>,
    pub eta: Option<Ms>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub count: serde_json::Value,
}

/// Partial item update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub count: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub username: String,
    pub password: String,
    pub realname: String,
    pub admin: bool,
    #[serde(default)]
    pub activity_creator: bool,
    pub disabled: bool,
}

/// Full replace of the mutable account fields; the password hash is
/// untouched (see `set_password`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub username: String,
    pub realname: String,
    pub admin: bool,
    #[serde(default)]
    pub activity_creator: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    pub title: String,
    pub description: String,
    pub start_time: Ms,
    pub end_time: Ms,
    pub max_hours: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HoursDraft {
    #[serde(flatten)]
    pub requester: RequesterOverride,
    pub hours: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_default_is_pending() {
        assert_eq!(ReservationStatus::default(), ReservationStatus::Pending);
    }

    #[test]
    fn status_serializes_snake_case() {
        let s = serde_json::to_string(&ReservationStatus::InProgress).unwrap();
        assert_eq!(s, "\"in_progress\"");
    }

    #[test]
    fn reservation_summary_omits_absent_asm() {
        let summ = ReservationSummary {
            id: Ulid::new(),
            part: Ulid::new(),
            requester: Ulid::new(),
            count: 3,
            status: ReservationStatus::Pending,
            eta: None,
            asm: None,
            created: 1,
            updated: 1,
        };
        let json = serde_json::to_value(&summ).unwrap();
        assert!(json.get("asm").is_none());
        assert!(json.get("eta").unwrap().is_null());
    }

    #[test]
    fn reservation_draft_accepts_override_fields_inline() {
        let draft: ReservationDraft = serde_json::from_value(serde_json::json!({
            "part": Ulid::new().to_string(),
            "count": "12",
            "username": "mreynolds",
        }))
        .unwrap();
        assert_eq!(draft.requester.username.as_deref(), Some("mreynolds"));
        assert!(draft.requester.requester.is_none());
        assert!(draft.asm.is_none());
    }

    #[test]
    fn user_summary_has_no_password_field() {
        let summ = UserSummary {
            id: Ulid::new(),
            username: "zoe".into(),
            realname: "Zoe Washburne".into(),
            admin: true,
            activity_creator: false,
            disabled: false,
            created: 1,
            updated: 2,
        };
        let json = serde_json::to_string(&summ).unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains("activityCreator"));
    }

    #[test]
    fn activity_doc_roundtrip() {
        let doc = ActivityDoc {
            id: Ulid::new(),
            title: "Build season kickoff".into(),
            description: String::new(),
            start_time: 1000,
            end_time: 5000,
            max_hours: 12.0,
            user_hours: vec![HourEntry { user: Ulid::new(), hours: 2.5 }],
            created_at: 1,
            updated_at: 1,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("maxHours").is_some());
        let back: ActivityDoc = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }
}
