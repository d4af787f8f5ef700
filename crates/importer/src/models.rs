use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use storage::models::{Lead, LeadField, NewLead};
use utoipa::ToSchema;
use validator::Validate;

/// How a conflicting record is applied to the lead that already owns its email.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStrategy {
    /// Leave the existing lead untouched
    #[default]
    Skip,
    /// Take every attribute from the incoming record
    Replace,
    /// Incoming attributes win wherever they are present
    Update,
    /// Only fill attributes that are blank on the existing lead
    Merge,
}

impl ConflictStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictStrategy::Skip => "skip",
            ConflictStrategy::Replace => "replace",
            ConflictStrategy::Update => "update",
            ConflictStrategy::Merge => "merge",
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(ConflictStrategy::Skip),
            "replace" => Ok(ConflictStrategy::Replace),
            "update" => Ok(ConflictStrategy::Update),
            "merge" => Ok(ConflictStrategy::Merge),
            other => Err(format!(
                "Unknown conflict strategy '{}'. Expected one of: skip, replace, update, merge",
                other
            )),
        }
    }
}

/// A field-level reason a record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// One input record before validation. Every business field is an optional
/// string; type problems found while reading it are kept in `type_errors`
/// so the validator can report them with everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawLeadRecord {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub studio_name: Option<String>,
    pub lead_source: Option<String>,
    pub current_platform: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country_code: Option<String>,
    #[serde(skip)]
    pub type_errors: Vec<FieldError>,
}

impl RawLeadRecord {
    /// Read a record out of arbitrary JSON.
    ///
    /// Strings are taken as-is, numbers and booleans are turned into their
    /// text form, `null` counts as absent. Arrays and objects are reported as
    /// type errors on that field. Unknown keys are ignored.
    pub fn from_json(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self {
                type_errors: vec![FieldError::new("$", "record must be a JSON object")],
                ..Self::default()
            };
        };

        let mut record = Self::default();
        let mut errors = Vec::new();

        record.email = read_text(object, "email", &mut errors);
        for field in LeadField::ALL {
            *record.slot_mut(field) = read_text(object, field.name(), &mut errors);
        }

        record.type_errors = errors;
        record
    }

    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, field: LeadField, value: impl Into<String>) -> Self {
        *self.slot_mut(field) = Some(value.into());
        self
    }

    pub fn field(&self, field: LeadField) -> Option<&str> {
        match field {
            LeadField::FirstName => self.first_name.as_deref(),
            LeadField::LastName => self.last_name.as_deref(),
            LeadField::StudioName => self.studio_name.as_deref(),
            LeadField::LeadSource => self.lead_source.as_deref(),
            LeadField::CurrentPlatform => self.current_platform.as_deref(),
            LeadField::City => self.city.as_deref(),
            LeadField::State => self.state.as_deref(),
            LeadField::CountryCode => self.country_code.as_deref(),
        }
    }

    fn slot_mut(&mut self, field: LeadField) -> &mut Option<String> {
        match field {
            LeadField::FirstName => &mut self.first_name,
            LeadField::LastName => &mut self.last_name,
            LeadField::StudioName => &mut self.studio_name,
            LeadField::LeadSource => &mut self.lead_source,
            LeadField::CurrentPlatform => &mut self.current_platform,
            LeadField::City => &mut self.city,
            LeadField::State => &mut self.state,
            LeadField::CountryCode => &mut self.country_code,
        }
    }
}

fn read_text(object: &Map<String, Value>, key: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(FieldError::new(key, "must be a string"));
            None
        }
    }
}

/// Attribute values supplied by an incoming record. `None` means the record
/// did not supply the field (or supplied only whitespace).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingFields {
    values: [Option<String>; LeadField::ALL.len()],
}

impl IncomingFields {
    pub fn get(&self, field: LeadField) -> Option<&str> {
        self.values[Self::index(field)].as_deref()
    }

    pub fn set(&mut self, field: LeadField, value: Option<String>) {
        self.values[Self::index(field)] = value.filter(|v| !v.is_empty());
    }

    pub fn with(mut self, field: LeadField, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    fn index(field: LeadField) -> usize {
        match field {
            LeadField::FirstName => 0,
            LeadField::LastName => 1,
            LeadField::StudioName => 2,
            LeadField::LeadSource => 3,
            LeadField::CurrentPlatform => 4,
            LeadField::City => 5,
            LeadField::State => 6,
            LeadField::CountryCode => 7,
        }
    }
}

/// A record that passed sanitization and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRecord {
    /// 1-based position in the request
    pub position: usize,
    pub email: String,
    pub fields: IncomingFields,
}

impl ValidRecord {
    /// Insert payload; absent attributes default to empty strings.
    pub fn to_new_lead(&self) -> NewLead {
        let value = |field| self.fields.get(field).unwrap_or_default().to_string();
        NewLead {
            email: self.email.clone(),
            first_name: value(LeadField::FirstName),
            last_name: value(LeadField::LastName),
            studio_name: value(LeadField::StudioName),
            lead_source: value(LeadField::LeadSource),
            current_platform: value(LeadField::CurrentPlatform),
            city: value(LeadField::City),
            state: value(LeadField::State),
            country_code: value(LeadField::CountryCode),
        }
    }
}

/// An incoming record paired with the lead that already holds its email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    pub incoming: ValidRecord,
    pub existing: Lead,
}

/// Input to [`crate::pipeline::LeadImporter::import_leads`].
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    pub records: Vec<RawLeadRecord>,
    pub default_strategy: ConflictStrategy,
    /// Per-email strategy, taking precedence over `default_strategy`
    pub strategy_overrides: HashMap<String, ConflictStrategy>,
}

impl ImportRequest {
    pub fn new(records: Vec<RawLeadRecord>, default_strategy: ConflictStrategy) -> Self {
        Self {
            records,
            default_strategy,
            strategy_overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, email: impl Into<String>, strategy: ConflictStrategy) -> Self {
        self.strategy_overrides.insert(email.into(), strategy);
        self
    }
}

/// Wire form of an import request, as accepted over HTTP and by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImportLeadsRequest {
    /// Lead-like JSON objects; malformed entries are reported, not rejected
    #[validate(length(max = 10000, message = "at most 10000 records per request"))]
    #[schema(value_type = Vec<Object>)]
    pub records: Vec<Value>,
    #[serde(default)]
    pub default_strategy: ConflictStrategy,
    #[serde(default)]
    pub strategy_overrides: HashMap<String, ConflictStrategy>,
}

impl From<ImportLeadsRequest> for ImportRequest {
    fn from(request: ImportLeadsRequest) -> Self {
        Self {
            records: request.records.iter().map(RawLeadRecord::from_json).collect(),
            default_strategy: request.default_strategy,
            strategy_overrides: request.strategy_overrides,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SkippedRecord {
    /// 1-based position in the request
    pub position: usize,
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecordError {
    pub email: String,
    pub error: String,
}

/// What happened to every record of one import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    pub total_records: usize,
    pub inserted_count: usize,
    pub updated_count: usize,
    /// `skipped_invalid_count + skipped_policy_count`
    pub skipped_count: usize,
    pub skipped_invalid_count: usize,
    pub skipped_policy_count: usize,
    pub failed_count: usize,
    pub conflicts_detected_count: usize,
    pub sample_skipped: Vec<SkippedRecord>,
    pub sample_errors: Vec<RecordError>,
}

impl ImportSummary {
    pub fn new(total_records: usize) -> Self {
        Self {
            total_records,
            ..Self::default()
        }
    }

    /// Every record has exactly one disposition.
    pub fn is_reconciled(&self) -> bool {
        self.skipped_count == self.skipped_invalid_count + self.skipped_policy_count
            && self.inserted_count + self.updated_count + self.skipped_count + self.failed_count
                == self.total_records
    }
}
