use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{CanonicalEmail, StoredUser};

use super::repo_error::RepositoryError;

/// Storage port for waitlist signups.
///
/// Email uniqueness is enforced here, not by [`CanonicalEmail`]: a second
/// `create_user` with an equal email fails with
/// [`RepositoryError::UniqueViolation`].
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, email: &CanonicalEmail) -> Result<StoredUser, RepositoryError>;
    async fn list_users(&self) -> Result<Vec<StoredUser>, RepositoryError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, email: &CanonicalEmail) -> Result<StoredUser, RepositoryError> {
        let user = sqlx::query_as::<_, StoredUser>(
            r#"
            INSERT INTO users (email)
            VALUES ($1)
            RETURNING id, email, created_at
            "#,
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<StoredUser>, RepositoryError> {
        let users = sqlx::query_as::<_, StoredUser>(
            r#"
            SELECT id, email, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
