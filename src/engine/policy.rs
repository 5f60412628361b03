use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::model::*;

use super::{Engine, EngineError};

impl Engine {
    /// Resolve the user a reservation or hour claim will be held under.
    ///
    /// Non-admins always act for themselves; any override fields in the
    /// request are ignored. Admins may name another user by id or by
    /// username, and fall back to themselves when they name nobody. The
    /// resolved user is confirmed to exist here, before any capacity
    /// math runs — an admin naming a missing user is a NotFound, never a
    /// capacity miscalculation.
    pub(super) fn resolve_requester(
        &self,
        acting: &UserDoc,
        overrides: &RequesterOverride,
    ) -> Result<UserDoc, EngineError> {
        if !acting.admin {
            return Ok(acting.clone());
        }
        if let Some(id) = overrides.requester {
            return self
                .store
                .users
                .get(&id)
                .ok_or(EngineError::NotFound("requester"));
        }
        if let Some(username) = &overrides.username {
            return self
                .store
                .users
                .find_one(|u| &u.username == username)
                .ok_or(EngineError::NotFound("requester"));
        }
        Ok(acting.clone())
    }
}

/// User management is restricted to administrators.
pub(super) fn require_admin(acting: &UserDoc) -> Result<(), EngineError> {
    if !acting.admin {
        return Err(EngineError::Forbidden("administrators only"));
    }
    Ok(())
}

/// Activity management needs the activity-creator flag (admins pass).
pub(super) fn require_activity_creator(acting: &UserDoc) -> Result<(), EngineError> {
    if !acting.admin && !acting.activity_creator {
        return Err(EngineError::Forbidden("activity creators only"));
    }
    Ok(())
}

/// Owner-or-admin check for writes against an existing reservation.
pub(super) fn require_owner_or_admin(
    acting: &UserDoc,
    reservation: &ReservationDoc,
) -> Result<(), EngineError> {
    if !acting.admin && reservation.requester != acting.id {
        return Err(EngineError::Forbidden(
            "reservation belongs to another user",
        ));
    }
    Ok(())
}

// ── Credentials ──────────────────────────────────────────────────

pub(super) fn hash_password(password: &str) -> Result<String, EngineError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            tracing::error!("password hashing failed: {e}");
            EngineError::Internal(format!("password hashing failed: {e}"))
        })
}

/// Check a plaintext password against a stored hash. For the session
/// layer; the engine itself never authenticates anyone.
pub fn verify_password(user: &UserDoc, password: &str) -> Result<bool, EngineError> {
    let parsed = PasswordHash::new(&user.password_hash).map_err(|e| {
        tracing::error!(user = %user.id, "stored password hash unparsable: {e}");
        EngineError::Internal(format!("bad stored password hash: {e}"))
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn user(admin: bool) -> UserDoc {
        UserDoc {
            id: Ulid::new(),
            username: format!("u{}", Ulid::new()),
            realname: String::new(),
            admin,
            activity_creator: false,
            disabled: false,
            password_hash: String::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn non_admin_override_ignored() {
        let engine = Engine::new();
        let acting = user(false);
        let other = user(false);
        engine.store.users.insert(acting.id, acting.clone());
        engine.store.users.insert(other.id, other.clone());

        let overrides = RequesterOverride {
            requester: Some(other.id),
            username: None,
        };
        let resolved = engine.resolve_requester(&acting, &overrides).unwrap();
        assert_eq!(resolved.id, acting.id);
    }

    #[test]
    fn admin_override_by_id_and_username() {
        let engine = Engine::new();
        let acting = user(true);
        let other = user(false);
        engine.store.users.insert(acting.id, acting.clone());
        engine.store.users.insert(other.id, other.clone());

        let by_id = engine
            .resolve_requester(
                &acting,
                &RequesterOverride { requester: Some(other.id), username: None },
            )
            .unwrap();
        assert_eq!(by_id.id, other.id);

        let by_name = engine
            .resolve_requester(
                &acting,
                &RequesterOverride {
                    requester: None,
                    username: Some(other.username.clone()),
                },
            )
            .unwrap();
        assert_eq!(by_name.id, other.id);
    }

    #[test]
    fn admin_without_override_is_self() {
        let engine = Engine::new();
        let acting = user(true);
        engine.store.users.insert(acting.id, acting.clone());
        let resolved = engine
            .resolve_requester(&acting, &RequesterOverride::default())
            .unwrap();
        assert_eq!(resolved.id, acting.id);
    }

    #[test]
    fn admin_override_missing_user_is_not_found() {
        let engine = Engine::new();
        let acting = user(true);
        engine.store.users.insert(acting.id, acting.clone());

        let by_id = engine.resolve_requester(
            &acting,
            &RequesterOverride { requester: Some(Ulid::new()), username: None },
        );
        assert!(matches!(by_id, Err(EngineError::NotFound("requester"))));

        let by_name = engine.resolve_requester(
            &acting,
            &RequesterOverride {
                requester: None,
                username: Some("nobody".into()),
            },
        );
        assert!(matches!(by_name, Err(EngineError::NotFound("requester"))));
    }

    #[test]
    fn password_hash_and_verify() {
        let hash = hash_password("leaf-on-the-wind").unwrap();
        let mut u = user(false);
        u.password_hash = hash;
        assert!(verify_password(&u, "leaf-on-the-wind").unwrap());
        assert!(!verify_password(&u, "wrong").unwrap());
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        let mut u = user(false);
        u.password_hash = "not-a-phc-string".into();
        assert!(matches!(
            verify_password(&u, "whatever"),
            Err(EngineError::Internal(_))
        ));
    }
}
