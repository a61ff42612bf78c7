/// User lookups

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::ServiceResult;
use crate::models::paging::{PageParams, PagedResult};
use crate::models::user::{User, UserRole};

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<Option<UserResponse>> {
        Ok(User::find_by_id(&self.pool, id).await?.map(Into::into))
    }

    pub async fn get_by_username(&self, username: &str) -> ServiceResult<Option<UserResponse>> {
        Ok(User::find_by_username(&self.pool, username)
            .await?
            .map(Into::into))
    }

    pub async fn get_all(&self, page: PageParams) -> ServiceResult<PagedResult<UserResponse>> {
        let users = User::list(&self.pool, page.limit(), page.offset()).await?;
        let total = User::count(&self.pool).await?;

        Ok(PagedResult::new(users, total, page).map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_hides_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            username: "dora".into(),
            email: "dora@example.com".into(),
            password_hash: "$argon2id$...".into(),
            role: UserRole::User,
            is_active: true,
            refresh_token: Some("abc".into()),
            refresh_token_expiry: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["username"], "dora");
        assert_eq!(json["role"], "user");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("refresh_token").is_none());
    }
}
