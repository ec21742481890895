use std::sync::Arc;

use crate::{auth::AdminToken, repositories::UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<dyn UserRepository>,
    pub admin_token: AdminToken,
}

impl AppState {
    pub fn new(user_repo: impl UserRepository + 'static, admin_token: AdminToken) -> Self {
        Self {
            user_repo: Arc::new(user_repo),
            admin_token,
        }
    }
}
