use axum::{response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::database::manager::DatabaseManager;
use crate::database::models::NewUser;
use crate::database::repository::AccountRepository;
use crate::error::ApiError;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password1: Option<String>,
    pub password2: Option<String>,
    pub name: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub middlename: Option<String>,
    pub address: Option<String>,
    pub telephone: Option<String>,
    pub role_id: Option<Uuid>,
    pub function_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
}

/// POST /account/signup - create an inactive user pending activation.
///
/// Validation failures are collected and joined into a single message
/// returned with 400.
pub async fn signup(Json(payload): Json<SignupRequest>) -> Result<impl IntoResponse, ApiError> {
    let mut errors = validate_fields(&payload);

    let pool = DatabaseManager::pool().await?;
    let accounts = AccountRepository::new(pool);

    if let Some(email) = normalized(&payload.email) {
        if accounts.email_exists(&email).await? {
            errors.push("This email address is already in use.".to_string());
        }
    }
    if let Some(telephone) = normalized(&payload.telephone) {
        if accounts.telephone_exists(&telephone).await? {
            errors.push("This telephone number is already in use.".to_string());
        }
    }
    if let Some(role_id) = payload.role_id {
        if accounts.find_role(role_id).await?.is_none() {
            errors.push("Role not found.".to_string());
        }
    }
    if let Some(function_id) = payload.function_id {
        if accounts.find_function(function_id).await?.is_none() {
            errors.push("Function not found.".to_string());
        }
    }
    if let Some(department_id) = payload.department_id {
        if accounts.find_department(department_id).await?.is_none() {
            errors.push("Department not found.".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::bad_request(errors.join(" ")));
    }

    let email = normalized(&payload.email).unwrap_or_default();
    let password = payload.password1.unwrap_or_default();
    let password_hash = hash_password(&password)
        .map_err(|e| ApiError::internal_server_error(format!("Password hashing failed: {e}")))?;

    accounts
        .insert_user(NewUser {
            email,
            name: normalized(&payload.name).unwrap_or_default(),
            password_hash,
            role_id: payload.role_id,
            function_id: payload.function_id,
            department_id: payload.department_id,
            firstname: normalized(&payload.firstname),
            lastname: normalized(&payload.lastname),
            middlename: normalized(&payload.middlename),
            address: normalized(&payload.address),
            telephone: normalized(&payload.telephone),
            // Accounts start deactivated until approved
            is_active: false,
        })
        .await?;

    Ok(Json(json!({ "message": "success" })))
}

/// Field-level checks that need no store access.
fn validate_fields(payload: &SignupRequest) -> Vec<String> {
    let mut errors = Vec::new();

    match normalized(&payload.email) {
        None => errors.push("A valid e-mail address is required.".to_string()),
        Some(email) => {
            if !is_plausible_email(&email) {
                errors.push("Invalid email address.".to_string());
            }
        }
    }

    match (&payload.password1, &payload.password2) {
        (Some(p1), Some(p2)) => {
            if p1 != p2 {
                errors.push("The passwords do not match.".to_string());
            } else if p1.len() < MIN_PASSWORD_LEN {
                errors.push(format!(
                    "The password must be at least {MIN_PASSWORD_LEN} characters long."
                ));
            }
        }
        _ => errors.push("Both password fields are required.".to_string()),
    }

    errors
}

/// Minimal sanity check: one '@' with something on both sides and a dot in
/// the domain part.
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

fn normalized(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> SignupRequest {
        SignupRequest {
            email: Some("alice@example.com".to_string()),
            password1: Some("MonP@ssw0rd!".to_string()),
            password2: Some("MonP@ssw0rd!".to_string()),
            name: None,
            firstname: None,
            lastname: None,
            middlename: None,
            address: None,
            telephone: None,
            role_id: None,
            function_id: None,
            department_id: None,
        }
    }

    #[test]
    fn valid_request_has_no_field_errors() {
        assert!(validate_fields(&base_request()).is_empty());
    }

    #[test]
    fn password_mismatch_is_reported() {
        let mut req = base_request();
        req.password2 = Some("different".to_string());
        let errors = validate_fields(&req);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("do not match"));
    }

    #[test]
    fn short_password_is_reported() {
        let mut req = base_request();
        req.password1 = Some("short".to_string());
        req.password2 = Some("short".to_string());
        assert!(validate_fields(&req)[0].contains("at least"));
    }

    #[test]
    fn bad_email_and_missing_passwords_accumulate() {
        let req = SignupRequest {
            email: Some("not-an-email".to_string()),
            password1: None,
            ..base_request()
        };
        let errors = validate_fields(&req);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn email_plausibility() {
        assert!(is_plausible_email("alice@example.com"));
        assert!(!is_plausible_email("alice"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("alice@nodot"));
    }
}
