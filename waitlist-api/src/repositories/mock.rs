//! In-memory user repository for testing.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;

use crate::domain::{CanonicalEmail, StoredUser};

use super::{RepositoryError, UserRepository};

/// Mock user repository backed by a `Vec`, mirroring the `UNIQUE(email)`
/// constraint of the real table.
#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<RwLock<Vec<StoredUser>>>,
    /// When set, every call fails with this database error message.
    failure: Arc<RwLock<Option<String>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a generic database error.
    pub fn failing(self, message: &str) -> Self {
        *self.failure.write().unwrap() = Some(message.to_string());
        self
    }

    /// Get all stored users (for test assertions).
    pub fn all_users(&self) -> Vec<StoredUser> {
        self.users.read().unwrap().clone()
    }

    pub fn contains(&self, email: &str) -> bool {
        self.users.read().unwrap().iter().any(|u| u.email == email)
    }

    fn check_failure(&self) -> Result<(), RepositoryError> {
        match self.failure.read().unwrap().as_ref() {
            Some(message) => Err(RepositoryError::DatabaseError(sqlx::Error::Protocol(
                message.clone(),
            ))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn create_user(&self, email: &CanonicalEmail) -> Result<StoredUser, RepositoryError> {
        self.check_failure()?;

        let mut users = self.users.write().unwrap();
        if users.iter().any(|u| u.email == email.as_str()) {
            return Err(RepositoryError::UniqueViolation(format!(
                "duplicate key value violates unique constraint \"users_email_key\": {email}"
            )));
        }

        let user = StoredUser {
            id: users.len() as i64 + 1,
            email: email.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<StoredUser>, RepositoryError> {
        self.check_failure()?;
        Ok(self.all_users())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(raw: &str) -> CanonicalEmail {
        CanonicalEmail::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn create_and_list() {
        let repo = MockUserRepository::new();

        let created = repo.create_user(&email("a@example.com")).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.email, "a@example.com");

        repo.create_user(&email("b@example.com")).await.unwrap();
        let users = repo.list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[1].email, "b@example.com");
    }

    #[tokio::test]
    async fn equivalent_inputs_conflict() {
        let repo = MockUserRepository::new();

        repo.create_user(&email("Dup@Example.com")).await.unwrap();
        let err = repo
            .create_user(&email("  dup@example.COM "))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::UniqueViolation(_)));
        assert!(err.to_string().contains("UNIQUE"));
        assert_eq!(repo.all_users().len(), 1);
    }

    #[tokio::test]
    async fn failing_repository_returns_database_error() {
        let repo = MockUserRepository::new().failing("connection reset");

        let err = repo.list_users().await.unwrap_err();
        assert!(matches!(err, RepositoryError::DatabaseError(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
