pub mod answers;
pub mod questions;
pub mod tags;
pub mod users;
pub mod votes;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, Result},
};

pub(crate) async fn enforce_vote_rate_limit(state: &AppState, auth_user: &AuthUser) -> Result<()> {
    let Some(redis) = state.redis.as_ref() else {
        return Ok(());
    };

    let rate_limit_key = format!("vote:{}", auth_user.user_id);
    if !redis
        .check_rate_limit(&rate_limit_key, state.config.vote_rate_limit_per_hour, 3600)
        .await?
    {
        tracing::warn!(
            "Vote rate limit reached for {} ({})",
            auth_user.username,
            auth_user.user_id
        );
        return Err(AppError::RateLimit);
    }

    Ok(())
}
