use axum::{extract::Query, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::SiteDetail;
use crate::database::repository::{SiteRepository, SiteSearch};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub vendor: Option<Uuid>,
    pub risk_assessment: Option<Uuid>,
    pub security_type: Option<String>,
    /// Case-insensitive substring match on name and site_id
    pub filter: Option<String>,
}

/// GET /sites/all - list sites, newest first, with optional filters.
pub async fn list(Query(query): Query<ListQuery>) -> Result<Json<Vec<SiteDetail>>, ApiError> {
    let search = SiteSearch {
        vendor: query.vendor,
        risk_assessment: query.risk_assessment,
        security_type: query
            .security_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        filter: query
            .filter
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    };

    let pool = DatabaseManager::pool().await?;
    let sites = SiteRepository::new(pool);

    let records = sites.search(&search).await?;
    let details = sites.details(records).await?;
    Ok(Json(details))
}
