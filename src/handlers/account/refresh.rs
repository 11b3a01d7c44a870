use axum::{response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, Claims, TokenType};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// POST /account/refresh - trade a valid refresh token for a new access token.
pub async fn refresh(Json(payload): Json<RefreshRequest>) -> Result<impl IntoResponse, ApiError> {
    let claims = auth::decode_token(&payload.refresh, TokenType::Refresh)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    let access = auth::generate_token(&Claims::new(claims.sub, claims.email, TokenType::Access))?;

    Ok(Json(json!({ "access": access })))
}
