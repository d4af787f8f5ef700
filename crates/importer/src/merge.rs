use crate::models::{ConflictStrategy, ValidRecord};
use crate::sanitize::sanitize_email;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use storage::models::{Lead, LeadField};

/// Outcome of applying a strategy to one conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The lead to write back
    Write(Lead),
    NoOp(NoOpReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// The strategy was `skip`
    SkipStrategy,
    /// `merge` found no blank field to fill
    NothingToMerge,
}

impl NoOpReason {
    pub fn describe(self) -> &'static str {
        match self {
            NoOpReason::SkipStrategy => "email already exists (strategy: skip)",
            NoOpReason::NothingToMerge => "email already exists and merge changed no field",
        }
    }
}

/// A value is blank when nothing but whitespace remains. Every lead attribute
/// is text, so no other notion of "empty" applies.
fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Apply `strategy` to an existing lead and the incoming record sharing its
/// email. `lead_id`, `email` and `created_at` always come from `existing`.
pub fn resolve(
    existing: &Lead,
    incoming: &ValidRecord,
    strategy: ConflictStrategy,
    now: DateTime<Utc>,
) -> Resolution {
    match strategy {
        ConflictStrategy::Skip => Resolution::NoOp(NoOpReason::SkipStrategy),
        ConflictStrategy::Replace => {
            let mut lead = existing.clone();
            for field in LeadField::ALL {
                *field.get_mut(&mut lead) = incoming.fields.get(field).unwrap_or_default().to_string();
            }
            lead.updated_at = now;
            Resolution::Write(lead)
        }
        ConflictStrategy::Update => {
            let mut lead = existing.clone();
            for field in LeadField::ALL {
                if let Some(value) = incoming.fields.get(field) {
                    *field.get_mut(&mut lead) = value.to_string();
                }
            }
            lead.updated_at = now;
            Resolution::Write(lead)
        }
        ConflictStrategy::Merge => {
            let mut lead = existing.clone();
            let mut changed = false;
            for field in LeadField::ALL {
                let Some(value) = incoming.fields.get(field) else {
                    continue;
                };
                if is_blank(field.get(&lead)) && !is_blank(value) {
                    *field.get_mut(&mut lead) = value.to_string();
                    changed = true;
                }
            }

            if changed {
                lead.updated_at = now;
                Resolution::Write(lead)
            } else {
                Resolution::NoOp(NoOpReason::NothingToMerge)
            }
        }
    }
}

/// Picks the strategy for a record: a per-email override if one exists,
/// the request default otherwise. Override keys are normalized the same way
/// record emails are, so `" Jo@X.com"` matches `jo@x.com`.
pub struct StrategySelector {
    default: ConflictStrategy,
    overrides: HashMap<String, ConflictStrategy>,
}

impl StrategySelector {
    pub fn new(default: ConflictStrategy, overrides: &HashMap<String, ConflictStrategy>) -> Self {
        let overrides = overrides
            .iter()
            .map(|(email, strategy)| {
                let key = sanitize_email(email).unwrap_or_else(|| email.trim().to_lowercase());
                (key, *strategy)
            })
            .collect();

        Self { default, overrides }
    }

    pub fn strategy_for(&self, email: &str) -> ConflictStrategy {
        self.overrides.get(email).copied().unwrap_or(self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncomingFields;
    use crate::test_support::lead;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn existing() -> Lead {
        let mut lead = lead("a@x.com");
        lead.first_name = "Jo".to_string();
        lead.studio_name = "Pilates Loft".to_string();
        lead
    }

    fn incoming() -> ValidRecord {
        ValidRecord {
            position: 1,
            email: "a@x.com".to_string(),
            fields: IncomingFields::default()
                .with(LeadField::FirstName, "Joanna")
                .with(LeadField::City, "Berlin"),
        }
    }

    fn written(resolution: Resolution) -> Lead {
        match resolution {
            Resolution::Write(lead) => lead,
            Resolution::NoOp(reason) => panic!("expected a write, got {:?}", reason),
        }
    }

    #[test]
    fn test_skip_never_writes() {
        assert_eq!(
            resolve(&existing(), &incoming(), ConflictStrategy::Skip, now()),
            Resolution::NoOp(NoOpReason::SkipStrategy)
        );
    }

    #[test]
    fn test_replace_takes_every_field_from_incoming() {
        let before = existing();
        let lead = written(resolve(&before, &incoming(), ConflictStrategy::Replace, now()));

        assert_eq!(lead.first_name, "Joanna");
        assert_eq!(lead.city, "Berlin");
        assert_eq!(lead.studio_name, "");
        assert_eq!(lead.lead_id, before.lead_id);
        assert_eq!(lead.email, before.email);
        assert_eq!(lead.created_at, before.created_at);
        assert_eq!(lead.updated_at, now());
    }

    #[test]
    fn test_update_lets_present_incoming_values_win() {
        let before = existing();
        let lead = written(resolve(&before, &incoming(), ConflictStrategy::Update, now()));

        assert_eq!(lead.first_name, "Joanna");
        assert_eq!(lead.city, "Berlin");
        assert_eq!(lead.studio_name, "Pilates Loft");
        assert_eq!(lead.lead_id, before.lead_id);
        assert_eq!(lead.email, before.email);
        assert_eq!(lead.updated_at, now());
    }

    #[test]
    fn test_merge_only_fills_blank_fields() {
        let before = existing();
        let lead = written(resolve(&before, &incoming(), ConflictStrategy::Merge, now()));

        assert_eq!(lead.first_name, "Jo");
        assert_eq!(lead.city, "Berlin");
        assert_eq!(lead.studio_name, "Pilates Loft");
        assert_eq!(lead.email, before.email);
        assert_eq!(lead.updated_at, now());
    }

    #[test]
    fn test_merge_treats_whitespace_as_blank() {
        let mut before = existing();
        before.city = "   ".to_string();

        let lead = written(resolve(&before, &incoming(), ConflictStrategy::Merge, now()));
        assert_eq!(lead.city, "Berlin");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let first = written(resolve(&existing(), &incoming(), ConflictStrategy::Merge, now()));

        assert_eq!(
            resolve(&first, &incoming(), ConflictStrategy::Merge, now()),
            Resolution::NoOp(NoOpReason::NothingToMerge)
        );
    }

    #[test]
    fn test_selector_prefers_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert(" A@X.com ".to_string(), ConflictStrategy::Replace);
        overrides.insert("b@x.com".to_string(), ConflictStrategy::Skip);

        let selector = StrategySelector::new(ConflictStrategy::Merge, &overrides);
        assert_eq!(selector.strategy_for("a@x.com"), ConflictStrategy::Replace);
        assert_eq!(selector.strategy_for("b@x.com"), ConflictStrategy::Skip);
        assert_eq!(selector.strategy_for("c@x.com"), ConflictStrategy::Merge);
    }
}
