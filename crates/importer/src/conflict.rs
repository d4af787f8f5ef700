use crate::error::{ImporterError, Result};
use crate::models::{ConflictRecord, ValidRecord};
use crate::traits::LeadStore;
use std::collections::{HashMap, HashSet};
use storage::models::Lead;
use tracing::{debug, info};

/// Finds incoming records whose email already belongs to a stored lead.
pub struct ConflictDetector<'a> {
    store: &'a dyn LeadStore,
    batch_size: usize,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(store: &'a dyn LeadStore, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Returns the conflicting records in input order.
    ///
    /// Lookups run one batch at a time. Any failed batch aborts detection and
    /// nothing found so far is returned.
    pub async fn detect(&self, records: &[ValidRecord]) -> Result<Vec<ConflictRecord>> {
        let existing = self.existing_by_email(records).await?;

        let conflicts: Vec<ConflictRecord> = records
            .iter()
            .filter_map(|record| {
                existing.get(&record.email).map(|lead| ConflictRecord {
                    incoming: record.clone(),
                    existing: lead.clone(),
                })
            })
            .collect();

        info!(
            "Detected {} conflict(s) among {} record(s)",
            conflicts.len(),
            records.len()
        );

        Ok(conflicts)
    }

    async fn existing_by_email(&self, records: &[ValidRecord]) -> Result<HashMap<String, Lead>> {
        let mut seen = HashSet::new();
        let emails: Vec<String> = records
            .iter()
            .map(|r| r.email.trim().to_string())
            .filter(|email| seen.insert(email.clone()))
            .collect();

        let mut existing = HashMap::new();
        for (index, batch) in emails.chunks(self.batch_size).enumerate() {
            debug!("Looking up batch {} ({} emails)", index + 1, batch.len());

            let leads = self
                .store
                .find_by_emails(batch)
                .await
                .map_err(ImporterError::DetectionFailed)?;

            existing.extend(leads.into_iter().map(|lead| (lead.email.clone(), lead)));
        }

        Ok(existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IncomingFields;
    use crate::test_support::{MemoryStore, lead};

    fn record(position: usize, email: &str) -> ValidRecord {
        ValidRecord {
            position,
            email: email.to_string(),
            fields: IncomingFields::default(),
        }
    }

    #[tokio::test]
    async fn test_lookups_are_batched() {
        let store = MemoryStore::with_leads(vec![
            lead("user5@x.com"),
            lead("user150@x.com"),
            lead("user240@x.com"),
        ]);
        let records: Vec<ValidRecord> = (0..250)
            .map(|i| record(i + 1, &format!("user{}@x.com", i)))
            .collect();

        let conflicts = ConflictDetector::new(&store, 100)
            .detect(&records)
            .await
            .unwrap();

        assert_eq!(store.lookup_batches(), vec![100, 100, 50]);
        let emails: Vec<&str> = conflicts.iter().map(|c| c.incoming.email.as_str()).collect();
        assert_eq!(emails, vec!["user5@x.com", "user150@x.com", "user240@x.com"]);
    }

    #[tokio::test]
    async fn test_conflicts_keep_input_order_and_pair_existing() {
        let existing_b = lead("b@x.com");
        let store = MemoryStore::with_leads(vec![existing_b.clone(), lead("a@x.com")]);
        let records = vec![record(1, "b@x.com"), record(2, "new@x.com"), record(3, "a@x.com")];

        let conflicts = ConflictDetector::new(&store, 100)
            .detect(&records)
            .await
            .unwrap();

        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].incoming.position, 1);
        assert_eq!(conflicts[0].existing, existing_b);
        assert_eq!(conflicts[1].incoming.position, 3);
    }

    #[tokio::test]
    async fn test_duplicate_emails_are_looked_up_once() {
        let store = MemoryStore::with_leads(vec![lead("a@x.com")]);
        let records = vec![record(1, "a@x.com"), record(2, "a@x.com")];

        let conflicts = ConflictDetector::new(&store, 100)
            .detect(&records)
            .await
            .unwrap();

        assert_eq!(store.lookup_batches(), vec![1]);
        assert_eq!(conflicts.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_batch_aborts_detection() {
        let store = MemoryStore::with_leads(vec![lead("user1@x.com")]).fail_lookups_after(1);
        let records: Vec<ValidRecord> = (0..150)
            .map(|i| record(i + 1, &format!("user{}@x.com", i)))
            .collect();

        let result = ConflictDetector::new(&store, 100).detect(&records).await;

        assert!(matches!(result, Err(ImporterError::DetectionFailed(_))));
        assert_eq!(store.lookup_batches(), vec![100, 50]);
    }

    #[tokio::test]
    async fn test_empty_input_issues_no_lookup() {
        let store = MemoryStore::default();
        let conflicts = ConflictDetector::new(&store, 100).detect(&[]).await.unwrap();

        assert!(conflicts.is_empty());
        assert!(store.lookup_batches().is_empty());
    }
}
