use crate::models::{FieldError, IncomingFields, RawLeadRecord, ValidRecord};
use crate::sanitize::sanitize_email;
use storage::models::LeadField;
use validator::Validate;

/// Schema checks run after sanitization. Absent optional fields are `None`
/// and skipped by every rule.
#[derive(Debug, Validate)]
struct LeadDraft {
    #[validate(email(message = "is not a valid email address"))]
    #[validate(length(max = 320, message = "must be at most 320 characters"))]
    email: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    first_name: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    last_name: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    studio_name: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    lead_source: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    current_platform: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    city: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    state: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    country_code: Option<String>,
}

pub struct RecordValidator;

impl RecordValidator {
    /// Validate one raw record. All problems are collected; nothing fails
    /// fast, so the caller can report exactly why a record was dropped.
    pub fn validate(position: usize, raw: &RawLeadRecord) -> Result<ValidRecord, Vec<FieldError>> {
        let mut errors = raw.type_errors.clone();

        let email = match raw.email.as_deref() {
            Some(candidate) => {
                let sanitized = sanitize_email(candidate);
                if sanitized.is_none() {
                    errors.push(FieldError::new("email", "is not a valid email address"));
                }
                sanitized
            }
            None => {
                if !errors.iter().any(|e| e.field == "email") {
                    errors.push(FieldError::new("email", "is required"));
                }
                None
            }
        };

        let mut fields = IncomingFields::default();
        for field in LeadField::ALL {
            fields.set(field, raw.field(field).map(|v| v.trim().to_string()));
        }

        let draft = LeadDraft {
            email: email.clone(),
            first_name: fields.get(LeadField::FirstName).map(str::to_string),
            last_name: fields.get(LeadField::LastName).map(str::to_string),
            studio_name: fields.get(LeadField::StudioName).map(str::to_string),
            lead_source: fields.get(LeadField::LeadSource).map(str::to_string),
            current_platform: fields.get(LeadField::CurrentPlatform).map(str::to_string),
            city: fields.get(LeadField::City).map(str::to_string),
            state: fields.get(LeadField::State).map(str::to_string),
            country_code: fields.get(LeadField::CountryCode).map(str::to_string),
        };

        if let Err(validation_errors) = draft.validate() {
            let mut schema_errors: Vec<FieldError> = validation_errors
                .field_errors()
                .iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |e| {
                        FieldError::new(
                            field.to_string(),
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string()),
                        )
                    })
                })
                .collect();
            schema_errors.sort_by_key(|e| field_rank(&e.field));
            errors.extend(schema_errors);
        }

        match email {
            Some(email) if errors.is_empty() => Ok(ValidRecord {
                position,
                email,
                fields,
            }),
            _ => Err(errors),
        }
    }

    /// One-line reason used in import summaries
    pub fn describe(errors: &[FieldError]) -> String {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn field_rank(name: &str) -> usize {
    if name == "email" {
        return 0;
    }
    LeadField::ALL
        .iter()
        .position(|f| f.name() == name)
        .map_or(usize::MAX, |i| i + 1)
}
