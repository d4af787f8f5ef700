use crate::config::ImportConfig;
use crate::models::{RecordError, ValidRecord};
use crate::traits::LeadStore;
use storage::models::{Lead, LeadPatch, NewLead};
use tracing::{debug, info, warn};

/// Counts and a bounded error sample for one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitResult {
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
    pub errors: Vec<RecordError>,
}

impl CommitResult {
    fn record_failure(&mut self, email: &str, error: impl ToString, max_samples: usize) {
        self.failed += 1;
        if self.errors.len() < max_samples {
            self.errors.push(RecordError {
                email: email.to_string(),
                error: error.to_string(),
            });
        }
    }
}

/// Writes resolved updates and new leads, best effort: a failed write is
/// recorded and the commit moves on.
pub struct BatchCommitter<'a> {
    store: &'a dyn LeadStore,
    update_batch_size: usize,
    insert_batch_size: usize,
    max_error_samples: usize,
}

impl<'a> BatchCommitter<'a> {
    pub fn new(store: &'a dyn LeadStore, config: &ImportConfig) -> Self {
        Self {
            store,
            update_batch_size: config.update_batch_size.max(1),
            insert_batch_size: config.insert_batch_size.max(1),
            max_error_samples: config.max_error_samples,
        }
    }

    pub async fn commit(&self, updates: &[Lead], inserts: &[ValidRecord]) -> CommitResult {
        let mut result = CommitResult::default();

        self.apply_updates(updates, &mut result).await;
        self.apply_inserts(inserts, &mut result).await;

        info!(
            "Commit finished: {} inserted, {} updated, {} failed",
            result.inserted, result.updated, result.failed
        );

        result
    }

    async fn apply_updates(&self, updates: &[Lead], result: &mut CommitResult) {
        for (index, batch) in updates.chunks(self.update_batch_size).enumerate() {
            debug!("Writing update batch {} ({} leads)", index + 1, batch.len());

            for lead in batch {
                match self.store.update_one(lead.lead_id, &LeadPatch::from(lead)).await {
                    Ok(_) => result.updated += 1,
                    Err(e) => {
                        warn!("Failed to update lead {}: {}", lead.email, e);
                        result.record_failure(&lead.email, e, self.max_error_samples);
                    }
                }
            }
        }
    }

    async fn apply_inserts(&self, inserts: &[ValidRecord], result: &mut CommitResult) {
        for (index, batch) in inserts.chunks(self.insert_batch_size).enumerate() {
            let leads: Vec<NewLead> = batch.iter().map(ValidRecord::to_new_lead).collect();

            match self.store.insert_many(&leads).await {
                Ok(_) => {
                    debug!("Inserted batch {} ({} leads)", index + 1, leads.len());
                    result.inserted += leads.len();
                }
                Err(e) => {
                    warn!(
                        "Bulk insert of batch {} failed ({}), retrying {} leads one by one",
                        index + 1,
                        e,
                        leads.len()
                    );
                    self.insert_individually(&leads, result).await;
                }
            }
        }
    }

    async fn insert_individually(&self, leads: &[NewLead], result: &mut CommitResult) {
        for lead in leads {
            match self.store.insert_one(lead).await {
                Ok(_) => result.inserted += 1,
                Err(e) => {
                    warn!("Failed to insert lead {}: {}", lead.email, e);
                    result.record_failure(&lead.email, e, self.max_error_samples);
                }
            }
        }
    }
}
