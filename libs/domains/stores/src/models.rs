use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Lowercase letters, digits and hyphens
static SLUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

/// ISO 4217 style currency code
static CURRENCY_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoreSettings {
    pub currency: String,
    pub timezone: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

/// A store, exclusively owned by one owner-user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    /// Globally unique, human-readable reference used by staff login
    pub slug: String,
    pub settings: StoreSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    pub fn new(owner_id: Uuid, name: String, slug: String, settings: StoreSettings) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            owner_id,
            name,
            slug,
            settings,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct StoreSettingsInput {
    #[validate(regex(path = *CURRENCY_PATTERN))]
    pub currency: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub timezone: Option<String>,
}

/// DTO for creating a store. The slug is generated when absent.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStore {
    #[validate(length(min = 3, max = 50))]
    pub name: String,
    #[validate(length(min = 6, max = 20), regex(path = *SLUG_PATTERN))]
    pub slug: Option<String>,
    #[validate(nested)]
    pub settings: Option<StoreSettingsInput>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateStore {
    #[validate(length(min = 3, max = 50))]
    pub name: Option<String>,
    #[validate(nested)]
    pub settings: Option<StoreSettingsInput>,
}

impl StoreSettings {
    /// Overwrite the fields present in `input`
    pub fn apply(&mut self, input: StoreSettingsInput) {
        if let Some(currency) = input.currency {
            self.currency = currency;
        }
        if let Some(timezone) = input.timezone {
            self.timezone = timezone;
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoreList {
    pub stores: Vec<Store>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}
