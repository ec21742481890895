#[cfg(test)]
mod mock;
mod repo_error;
mod user_repo;

#[cfg(test)]
pub use mock::MockUserRepository;
pub use repo_error::RepositoryError;
pub use user_repo::*;
