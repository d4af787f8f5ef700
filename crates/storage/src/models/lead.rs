use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A lead row. `email` is the natural key and is always stored lower-cased
/// and trimmed; every attribute column defaults to an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Lead {
    pub lead_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub studio_name: String,
    pub lead_source: String,
    pub current_platform: String,
    pub city: String,
    pub state: String,
    pub country_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The attribute columns a caller may set on a lead.
///
/// Every piece of code that copies or compares attributes goes through
/// [`LeadField::ALL`] and the typed accessors below, so adding a column means
/// adding a variant here and the compiler points at every match to update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    FirstName,
    LastName,
    StudioName,
    LeadSource,
    CurrentPlatform,
    City,
    State,
    CountryCode,
}

impl LeadField {
    pub const ALL: [LeadField; 8] = [
        LeadField::FirstName,
        LeadField::LastName,
        LeadField::StudioName,
        LeadField::LeadSource,
        LeadField::CurrentPlatform,
        LeadField::City,
        LeadField::State,
        LeadField::CountryCode,
    ];

    /// Column / JSON key for this field
    pub fn name(self) -> &'static str {
        match self {
            LeadField::FirstName => "first_name",
            LeadField::LastName => "last_name",
            LeadField::StudioName => "studio_name",
            LeadField::LeadSource => "lead_source",
            LeadField::CurrentPlatform => "current_platform",
            LeadField::City => "city",
            LeadField::State => "state",
            LeadField::CountryCode => "country_code",
        }
    }

    pub fn get(self, lead: &Lead) -> &str {
        match self {
            LeadField::FirstName => &lead.first_name,
            LeadField::LastName => &lead.last_name,
            LeadField::StudioName => &lead.studio_name,
            LeadField::LeadSource => &lead.lead_source,
            LeadField::CurrentPlatform => &lead.current_platform,
            LeadField::City => &lead.city,
            LeadField::State => &lead.state,
            LeadField::CountryCode => &lead.country_code,
        }
    }

    pub fn get_mut(self, lead: &mut Lead) -> &mut String {
        match self {
            LeadField::FirstName => &mut lead.first_name,
            LeadField::LastName => &mut lead.last_name,
            LeadField::StudioName => &mut lead.studio_name,
            LeadField::LeadSource => &mut lead.lead_source,
            LeadField::CurrentPlatform => &mut lead.current_platform,
            LeadField::City => &mut lead.city,
            LeadField::State => &mut lead.state,
            LeadField::CountryCode => &mut lead.country_code,
        }
    }
}

impl std::fmt::Display for LeadField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Insert payload. The store assigns `lead_id` and both timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewLead {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub studio_name: String,
    pub lead_source: String,
    pub current_platform: String,
    pub city: String,
    pub state: String,
    pub country_code: String,
}

/// Update payload. Carries no `lead_id` or `email`: neither can change once
/// a lead exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeadPatch {
    pub first_name: String,
    pub last_name: String,
    pub studio_name: String,
    pub lead_source: String,
    pub current_platform: String,
    pub city: String,
    pub state: String,
    pub country_code: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&Lead> for LeadPatch {
    fn from(lead: &Lead) -> Self {
        Self {
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            studio_name: lead.studio_name.clone(),
            lead_source: lead.lead_source.clone(),
            current_platform: lead.current_platform.clone(),
            city: lead.city.clone(),
            state: lead.state.clone(),
            country_code: lead.country_code.clone(),
            updated_at: lead.updated_at,
        }
    }
}
