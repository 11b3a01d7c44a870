use axum::{Extension, Json};

use crate::database::manager::DatabaseManager;
use crate::database::models::UserProfile;
use crate::database::repository::AccountRepository;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// GET /account/me - profile of the authenticated user.
///
/// Requires the JWT middleware; the user is re-resolved against the store so
/// a deleted account stops working even with a live token.
pub async fn me(Extension(auth_user): Extension<AuthUser>) -> Result<Json<UserProfile>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let accounts = AccountRepository::new(pool);

    let user = accounts
        .find_user_by_id(auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    let profile = accounts.profile(user).await?;
    Ok(Json(profile))
}
