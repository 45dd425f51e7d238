use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{User, UserStats},
    store::QaStore,
};

pub const DEFAULT_TOP_USERS: u32 = 10;

pub async fn get_user_stats(store: &dyn QaStore, user_id: Uuid) -> Result<UserStats> {
    store
        .user_stats(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn top_by_reputation(store: &dyn QaStore, limit: Option<u32>) -> Result<Vec<User>> {
    store
        .top_users(limit.unwrap_or(DEFAULT_TOP_USERS).min(100))
        .await
}
