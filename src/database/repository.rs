use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Department, Function, NewSite, NewUser, NewVendor, RiskAssessment, Role, Site, SiteDetail,
    User, UserProfile, Vendor,
};
use crate::importer::site_import::SiteDirectory;

const USER_COLUMNS: &str = "id, email, name, password_hash, role_id, function_id, department_id, \
     firstname, lastname, middlename, address, telephone, \
     is_active, is_staff, is_superuser, date_joined, last_login";

const SITE_COLUMNS: &str = "id, site_id, name, latitude, longitude, security_type, \
     vendor_id, risk_assessment_id, zm_id, created_at";

pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, DatabaseError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0 > 0)
    }

    pub async fn telephone_exists(&self, telephone: &str) -> Result<bool, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE telephone = $1")
            .bind(telephone)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    pub async fn insert_user(&self, new: NewUser) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
                 (id, email, name, password_hash, role_id, function_id, department_id, \
                  firstname, lastname, middlename, address, telephone, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .bind(new.role_id)
        .bind(new.function_id)
        .bind(new.department_id)
        .bind(&new.firstname)
        .bind(&new.lastname)
        .bind(&new.middlename)
        .bind(&new.address)
        .bind(&new.telephone)
        .bind(new.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_role(&self, id: Uuid) -> Result<Option<Role>, DatabaseError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, slug FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    pub async fn find_function(&self, id: Uuid) -> Result<Option<Function>, DatabaseError> {
        let function = sqlx::query_as::<_, Function>(
            "SELECT id, name, description, slug FROM functions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(function)
    }

    pub async fn find_department(&self, id: Uuid) -> Result<Option<Department>, DatabaseError> {
        let department = sqlx::query_as::<_, Department>(
            "SELECT id, name, description, slug FROM departments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(department)
    }

    /// Resolve a user's role and function eagerly and assemble the public profile.
    pub async fn profile(&self, user: User) -> Result<UserProfile, DatabaseError> {
        let role = match user.role_id {
            Some(id) => self.find_role(id).await?,
            None => None,
        };
        let function = match user.function_id {
            Some(id) => self.find_function(id).await?,
            None => None,
        };
        Ok(UserProfile::assemble(user, role, function))
    }

    /// Batch variant of [`profile`] for list endpoints.
    pub async fn profiles_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserProfile>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let role_ids: Vec<Uuid> = users.iter().filter_map(|u| u.role_id).collect();
        let function_ids: Vec<Uuid> = users.iter().filter_map(|u| u.function_id).collect();

        let roles: HashMap<Uuid, Role> = if role_ids.is_empty() {
            HashMap::new()
        } else {
            sqlx::query_as::<_, Role>(
                "SELECT id, name, description, slug FROM roles WHERE id = ANY($1)",
            )
            .bind(&role_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect()
        };
        let functions: HashMap<Uuid, Function> = if function_ids.is_empty() {
            HashMap::new()
        } else {
            sqlx::query_as::<_, Function>(
                "SELECT id, name, description, slug FROM functions WHERE id = ANY($1)",
            )
            .bind(&function_ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect()
        };

        Ok(users
            .into_iter()
            .map(|user| {
                let role = user.role_id.and_then(|id| roles.get(&id).cloned());
                let function = user.function_id.and_then(|id| functions.get(&id).cloned());
                UserProfile::assemble(user, role, function)
            })
            .collect())
    }
}

pub struct VendorRepository {
    pool: PgPool,
}

impl VendorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Vendor>, DatabaseError> {
        let vendor = sqlx::query_as::<_, Vendor>(
            "SELECT id, vendor_id, name, created_at FROM vendors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vendor)
    }

    /// Case-insensitive exact match on the display name, used by the importer.
    pub async fn find_by_name_ci(&self, name: &str) -> Result<Option<Vendor>, DatabaseError> {
        let vendor = sqlx::query_as::<_, Vendor>(
            "SELECT id, vendor_id, name, created_at FROM vendors \
             WHERE LOWER(name) = LOWER($1) LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vendor)
    }

    pub async fn vendor_id_exists(&self, vendor_id: &str) -> Result<bool, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM vendors WHERE vendor_id = $1")
            .bind(vendor_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    pub async fn insert(&self, new: NewVendor) -> Result<Vendor, DatabaseError> {
        let vendor = sqlx::query_as::<_, Vendor>(
            "INSERT INTO vendors (id, vendor_id, name) VALUES ($1, $2, $3) \
             RETURNING id, vendor_id, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new.vendor_id)
        .bind(&new.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(vendor)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Vendor>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let vendors = sqlx::query_as::<_, Vendor>(
            "SELECT id, vendor_id, name, created_at FROM vendors WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(vendors)
    }
}

pub struct RiskAssessmentRepository {
    pool: PgPool,
}

impl RiskAssessmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RiskAssessment>, DatabaseError> {
        let risk = sqlx::query_as::<_, RiskAssessment>(
            "SELECT id, name, created_at FROM risk_assessments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(risk)
    }

    pub async fn find_by_name_ci(
        &self,
        name: &str,
    ) -> Result<Option<RiskAssessment>, DatabaseError> {
        let risk = sqlx::query_as::<_, RiskAssessment>(
            "SELECT id, name, created_at FROM risk_assessments \
             WHERE LOWER(name) = LOWER($1) LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(risk)
    }

    pub async fn name_exists(&self, name: &str) -> Result<bool, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM risk_assessments WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    pub async fn insert(&self, name: &str) -> Result<RiskAssessment, DatabaseError> {
        let risk = sqlx::query_as::<_, RiskAssessment>(
            "INSERT INTO risk_assessments (id, name) VALUES ($1, $2) \
             RETURNING id, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(risk)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<RiskAssessment>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let risks = sqlx::query_as::<_, RiskAssessment>(
            "SELECT id, name, created_at FROM risk_assessments WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(risks)
    }
}

/// Query filters for the site list endpoint.
#[derive(Debug, Default)]
pub struct SiteSearch {
    pub vendor: Option<Uuid>,
    pub risk_assessment: Option<Uuid>,
    pub security_type: Option<String>,
    /// Case-insensitive substring match over name and site_id
    pub filter: Option<String>,
}

pub struct SiteRepository {
    pool: PgPool,
}

impl SiteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn exists_by_site_id(&self, site_id: &str) -> Result<bool, DatabaseError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sites WHERE site_id = $1")
            .bind(site_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    pub async fn insert(&self, new: NewSite) -> Result<Site, DatabaseError> {
        let site = sqlx::query_as::<_, Site>(&format!(
            "INSERT INTO sites \
                 (id, site_id, name, latitude, longitude, security_type, \
                  vendor_id, risk_assessment_id, zm_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {SITE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.site_id)
        .bind(&new.name)
        .bind(new.latitude)
        .bind(new.longitude)
        .bind(&new.security_type)
        .bind(new.vendor_id)
        .bind(new.risk_assessment_id)
        .bind(new.zm_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(site)
    }

    pub async fn search(&self, search: &SiteSearch) -> Result<Vec<Site>, DatabaseError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {SITE_COLUMNS} FROM sites WHERE 1=1"));

        if let Some(vendor) = search.vendor {
            qb.push(" AND vendor_id = ").push_bind(vendor);
        }
        if let Some(risk) = search.risk_assessment {
            qb.push(" AND risk_assessment_id = ").push_bind(risk);
        }
        if let Some(security_type) = &search.security_type {
            qb.push(" AND security_type = ").push_bind(security_type.clone());
        }
        if let Some(filter) = &search.filter {
            let pattern = format!("%{}%", filter.trim());
            qb.push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR site_id ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY created_at DESC");

        let sites = qb.build_query_as::<Site>().fetch_all(&self.pool).await?;
        Ok(sites)
    }

    /// Resolve vendor/risk-assessment/zm references for a batch of sites.
    pub async fn details(&self, sites: Vec<Site>) -> Result<Vec<SiteDetail>, DatabaseError> {
        let vendor_ids: Vec<Uuid> = sites.iter().filter_map(|s| s.vendor_id).collect();
        let risk_ids: Vec<Uuid> = sites.iter().filter_map(|s| s.risk_assessment_id).collect();
        let zm_ids: Vec<Uuid> = sites.iter().filter_map(|s| s.zm_id).collect();

        let vendors: HashMap<Uuid, Vendor> = VendorRepository::new(self.pool.clone())
            .find_by_ids(&vendor_ids)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();
        let risks: HashMap<Uuid, RiskAssessment> =
            RiskAssessmentRepository::new(self.pool.clone())
                .find_by_ids(&risk_ids)
                .await?
                .into_iter()
                .map(|r| (r.id, r))
                .collect();
        let zms: HashMap<Uuid, UserProfile> = AccountRepository::new(self.pool.clone())
            .profiles_by_ids(&zm_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(sites
            .into_iter()
            .map(|site| {
                let vendor = site.vendor_id.and_then(|id| vendors.get(&id).cloned());
                let risk = site
                    .risk_assessment_id
                    .and_then(|id| risks.get(&id).cloned());
                let zm = site.zm_id.and_then(|id| zms.get(&id).cloned());
                SiteDetail::assemble(site, vendor, risk, zm)
            })
            .collect())
    }
}

/// Repository-backed implementation of the importer's lookup seam.
pub struct PgSiteDirectory {
    sites: SiteRepository,
    vendors: VendorRepository,
    risks: RiskAssessmentRepository,
    accounts: AccountRepository,
}

impl PgSiteDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            sites: SiteRepository::new(pool.clone()),
            vendors: VendorRepository::new(pool.clone()),
            risks: RiskAssessmentRepository::new(pool.clone()),
            accounts: AccountRepository::new(pool),
        }
    }
}

#[async_trait]
impl SiteDirectory for PgSiteDirectory {
    async fn site_id_exists(&self, site_id: &str) -> anyhow::Result<bool> {
        Ok(self.sites.exists_by_site_id(site_id).await?)
    }

    async fn vendor_by_name(&self, name: &str) -> anyhow::Result<Option<Uuid>> {
        Ok(self.vendors.find_by_name_ci(name).await?.map(|v| v.id))
    }

    async fn risk_assessment_by_name(&self, name: &str) -> anyhow::Result<Option<Uuid>> {
        Ok(self.risks.find_by_name_ci(name).await?.map(|r| r.id))
    }

    async fn user_exists(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.accounts.find_user_by_id(id).await?.is_some())
    }

    async fn insert_site(&self, site: NewSite) -> anyhow::Result<()> {
        self.sites.insert(site).await?;
        Ok(())
    }
}
