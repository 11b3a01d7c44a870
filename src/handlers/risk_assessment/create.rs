use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;

use crate::database::manager::DatabaseManager;
use crate::database::repository::RiskAssessmentRepository;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateRiskAssessmentRequest {
    pub name: Option<String>,
}

/// POST /risk-assessment/create - create a risk assessment level.
pub async fn create(
    Json(payload): Json<CreateRiskAssessmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("The following fields are required: name"))?;

    let pool = DatabaseManager::pool().await?;
    let risks = RiskAssessmentRepository::new(pool);

    if risks.name_exists(name).await? {
        return Err(ApiError::bad_request("This name is already in use."));
    }

    let risk = risks.insert(name).await?;
    Ok((StatusCode::CREATED, Json(risk)))
}
