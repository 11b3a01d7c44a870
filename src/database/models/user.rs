use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: Option<Uuid>,
    pub function_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub middlename: Option<String>,
    pub address: Option<String>,
    pub telephone: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Function {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
}

/// Fields required to insert a user; everything else is defaulted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role_id: Option<Uuid>,
    pub function_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub middlename: Option<String>,
    pub address: Option<String>,
    pub telephone: Option<String>,
    pub is_active: bool,
}

/// Public shape of a user, with role/function resolved eagerly.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Option<Role>,
    pub function: Option<Function>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub middlename: Option<String>,
    pub address: Option<String>,
    pub telephone: Option<String>,
    pub is_active: bool,
}

impl UserProfile {
    pub fn assemble(user: User, role: Option<Role>, function: Option<Function>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role,
            function,
            firstname: user.firstname,
            lastname: user.lastname,
            middlename: user.middlename,
            address: user.address,
            telephone: user.telephone,
            is_active: user.is_active,
        }
    }
}
