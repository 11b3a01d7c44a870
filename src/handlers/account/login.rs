use axum::{response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::auth;
use crate::database::manager::DatabaseManager;
use crate::database::repository::AccountRepository;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /account/login - authenticate with email + password.
///
/// Returns an access/refresh token pair plus the user profile. Unknown
/// emails, wrong passwords and inactive accounts all get the same 401.
pub async fn login(Json(payload): Json<LoginRequest>) -> Result<impl IntoResponse, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let accounts = AccountRepository::new(pool);

    let user = accounts
        .find_user_by_email(&payload.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !user.is_active || !auth::password::verify_password(&payload.password, &user.password_hash)
    {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    let pair = auth::issue_pair(user.id, &user.email)?;
    let profile = accounts.profile(user).await?;

    Ok(Json(json!({
        "token": {
            "refresh": pair.refresh,
            "access": pair.access,
        },
        "user": profile,
    })))
}
