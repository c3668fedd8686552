use chrono::{DateTime, Utc};
use regex::Regex;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Alphanumeric, or an email-like string
static STAFF_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9@._-]+$").unwrap());

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StaffRole {
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "cashier")]
    Cashier,
    #[default]
    #[sea_orm(string_value = "staff")]
    Staff,
    #[sea_orm(string_value = "driver")]
    Driver,
}

/// A store-scoped worker identity
#[derive(Debug, Clone, PartialEq)]
pub struct Staff {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    /// Login identifier, unique within the store only
    pub staff_id: String,
    pub password_hash: String,
    pub role: StaffRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    pub fn new(
        store_id: Uuid,
        name: String,
        staff_id: String,
        password_hash: String,
        role: StaffRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            store_id,
            name,
            staff_id,
            password_hash,
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public view of a staff member; never carries the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffResponse {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub staff_id: String,
    pub role: StaffRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Staff> for StaffResponse {
    fn from(staff: Staff) -> Self {
        Self {
            id: staff.id,
            store_id: staff.store_id,
            name: staff.name,
            staff_id: staff.staff_id,
            role: staff.role,
            is_active: staff.is_active,
            created_at: staff.created_at,
            updated_at: staff.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaff {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(length(min = 3, max = 100), regex(path = *STAFF_ID_PATTERN))]
    pub staff_id: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[serde(default)]
    pub role: StaffRole,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaff {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    pub role: Option<StaffRole>,
    pub is_active: Option<bool>,
    #[validate(length(min = 6, max = 128))]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffLoginRequest {
    /// Store id or slug
    #[validate(length(min = 1))]
    pub store_id: String,
    #[validate(length(min = 1))]
    pub staff_id: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffLoginResponse {
    pub access_token: String,
    pub staff: StaffResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StaffEnvelope {
    pub staff: StaffResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StaffList {
    pub staff: Vec<StaffResponse>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}
