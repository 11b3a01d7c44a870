use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{NewSite, SiteDetail};
use crate::database::repository::{
    AccountRepository, RiskAssessmentRepository, SiteRepository, VendorRepository,
};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateSiteRequest {
    pub name: Option<String>,
    pub site_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub security_type: Option<String>,
    pub vendor: Option<Uuid>,
    pub risk_assessment: Option<Uuid>,
    pub zm: Option<Uuid>,
}

/// POST /sites/create - create a site with optional references to a vendor,
/// a risk assessment and a responsible user (ZM).
///
/// Unlike the importer, unknown references here are a hard 404: the caller
/// sent an explicit id and should learn it is wrong.
pub async fn create(Json(payload): Json<CreateSiteRequest>) -> Result<impl IntoResponse, ApiError> {
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let site_id = payload
        .site_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut missing = Vec::new();
    if name.is_none() {
        missing.push("name");
    }
    if site_id.is_none() {
        missing.push("site_id");
    }
    if !missing.is_empty() {
        return Err(ApiError::bad_request(format!(
            "The following fields are required: {}",
            missing.join(", ")
        )));
    }
    let (name, site_id) = (name.unwrap(), site_id.unwrap());

    let pool = DatabaseManager::pool().await?;
    let sites = SiteRepository::new(pool.clone());
    let accounts = AccountRepository::new(pool.clone());

    // Resolve references eagerly before constructing the record
    let vendor = match payload.vendor {
        Some(id) => Some(
            VendorRepository::new(pool.clone())
                .find_by_id(id)
                .await?
                .ok_or_else(|| ApiError::not_found("Vendor not found."))?,
        ),
        None => None,
    };
    let risk_assessment = match payload.risk_assessment {
        Some(id) => Some(
            RiskAssessmentRepository::new(pool.clone())
                .find_by_id(id)
                .await?
                .ok_or_else(|| ApiError::not_found("Risk assessment not found."))?,
        ),
        None => None,
    };
    let zm = match payload.zm {
        Some(id) => {
            let user = accounts
                .find_user_by_id(id)
                .await?
                .ok_or_else(|| ApiError::not_found("User (ZM) not found."))?;
            Some(accounts.profile(user).await?)
        }
        None => None,
    };

    if sites.exists_by_site_id(site_id).await? {
        return Err(ApiError::conflict("This site_id is already in use."));
    }

    let site = sites
        .insert(NewSite {
            site_id: site_id.to_string(),
            name: name.to_string(),
            latitude: payload.latitude,
            longitude: payload.longitude,
            security_type: payload
                .security_type
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            vendor_id: vendor.as_ref().map(|v| v.id),
            risk_assessment_id: risk_assessment.as_ref().map(|r| r.id),
            zm_id: zm.as_ref().map(|z| z.id),
        })
        .await?;

    let detail = SiteDetail::assemble(site, vendor, risk_assessment, zm);
    Ok((StatusCode::CREATED, Json(detail)))
}
