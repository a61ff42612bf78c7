/// Ownership checks for mutating endpoints
///
/// Projects may only be changed by their owner, attachments only by their
/// uploader. Admins pass every check.

use uuid::Uuid;

use super::middleware::AuthContext;

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("Only the owner or an administrator can modify this {0}")]
    NotOwner(&'static str),
}

/// Passes when the caller owns the resource or is an admin
///
/// `resource` names the resource kind in the error message.
pub fn require_owner_or_admin(
    auth: &AuthContext,
    owner_id: Uuid,
    resource: &'static str,
) -> Result<(), AuthzError> {
    if auth.can_modify(owner_id) {
        Ok(())
    } else {
        Err(AuthzError::NotOwner(resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn context(role: UserRole) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "carol".into(),
            email: "carol@example.com".into(),
            role,
        }
    }

    #[test]
    fn test_owner_passes() {
        let auth = context(UserRole::User);
        assert!(require_owner_or_admin(&auth, auth.user_id, "project").is_ok());
    }

    #[test]
    fn test_stranger_fails() {
        let auth = context(UserRole::User);
        let err = require_owner_or_admin(&auth, Uuid::new_v4(), "attachment").unwrap_err();
        assert!(err.to_string().contains("attachment"));
    }

    #[test]
    fn test_admin_passes() {
        let auth = context(UserRole::Admin);
        assert!(require_owner_or_admin(&auth, Uuid::new_v4(), "project").is_ok());
    }
}
