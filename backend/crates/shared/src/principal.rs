//! Authenticated Principal
//!
//! Minimal identity of an authenticated request, resolved by the auth
//! middleware and injected into request extensions for downstream domains.

use uuid::Uuid;

/// The authenticated user behind a request.
///
/// Carries only what downstream domains need: the internal user id for
/// persistence keys and the public id for responses/logging.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Internal UUID identifier
    pub user_id: Uuid,
    /// Public-facing nanoid identifier (URL-safe)
    pub public_id: String,
}

impl Principal {
    pub fn new(user_id: Uuid, public_id: impl Into<String>) -> Self {
        Self {
            user_id,
            public_id: public_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_new() {
        let uuid = Uuid::new_v4();
        let principal = Principal::new(uuid, "0123456789abcdefghi01");
        assert_eq!(principal.user_id, uuid);
        assert_eq!(principal.public_id, "0123456789abcdefghi01");
    }
}
