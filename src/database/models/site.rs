use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::risk_assessment::RiskAssessment;
use super::user::UserProfile;
use super::vendor::Vendor;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Site {
    pub id: Uuid,
    /// Business identifier ("EI Site ID"), globally unique
    pub site_id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub security_type: Option<String>,
    pub vendor_id: Option<Uuid>,
    pub risk_assessment_id: Option<Uuid>,
    pub zm_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a site. Optional references may be None when the
/// corresponding lookup failed; the site is created anyway.
#[derive(Debug, Clone, Default)]
pub struct NewSite {
    pub site_id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub security_type: Option<String>,
    pub vendor_id: Option<Uuid>,
    pub risk_assessment_id: Option<Uuid>,
    pub zm_id: Option<Uuid>,
}

/// Public shape of a site with its references resolved eagerly.
#[derive(Debug, Clone, Serialize)]
pub struct SiteDetail {
    pub id: Uuid,
    pub name: String,
    pub site_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub zm: Option<UserProfile>,
    pub vendor: Option<Vendor>,
    pub security_type: Option<String>,
    pub risk_assessment: Option<RiskAssessment>,
    pub created_at: DateTime<Utc>,
}

impl SiteDetail {
    pub fn assemble(
        site: Site,
        vendor: Option<Vendor>,
        risk_assessment: Option<RiskAssessment>,
        zm: Option<UserProfile>,
    ) -> Self {
        Self {
            id: site.id,
            name: site.name,
            site_id: site.site_id,
            latitude: site.latitude,
            longitude: site.longitude,
            zm,
            vendor,
            security_type: site.security_type,
            risk_assessment,
            created_at: site.created_at,
        }
    }
}
