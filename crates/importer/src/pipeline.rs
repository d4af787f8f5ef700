use crate::committer::BatchCommitter;
use crate::config::ImportConfig;
use crate::conflict::ConflictDetector;
use crate::error::{ImporterError, Result};
use crate::merge::{Resolution, StrategySelector, resolve};
use crate::models::{ImportRequest, ImportSummary, SkippedRecord, ValidRecord};
use crate::traits::{AdminAuthorizer, LeadStore, Principal};
use crate::validator::RecordValidator;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Stages of one import, always visited in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Received,
    Validated,
    ConflictsDetected,
    MergesResolved,
    Committed,
    Summarized,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportStage::Received => "received",
            ImportStage::Validated => "sanitized+validated",
            ImportStage::ConflictsDetected => "conflicts-detected",
            ImportStage::MergesResolved => "merges-resolved",
            ImportStage::Committed => "committed",
            ImportStage::Summarized => "summarized",
        };
        f.write_str(name)
    }
}

/// Runs bulk lead imports against a store.
pub struct LeadImporter<'a> {
    store: &'a dyn LeadStore,
    authorizer: &'a dyn AdminAuthorizer,
    config: ImportConfig,
    clock: fn() -> DateTime<Utc>,
}

impl<'a> LeadImporter<'a> {
    pub fn new(
        store: &'a dyn LeadStore,
        authorizer: &'a dyn AdminAuthorizer,
        config: ImportConfig,
    ) -> Self {
        Self {
            store,
            authorizer,
            config,
            clock: Utc::now,
        }
    }

    /// Source of `updated_at` for merged leads
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Import `request` on behalf of `principal`.
    ///
    /// Returns a summary covering every record, or a single error when the
    /// caller is not an admin, the request is empty, or existing leads could
    /// not be looked up. Nothing has been written in any of those cases.
    pub async fn import_leads(
        &self,
        principal: &Principal,
        request: ImportRequest,
    ) -> Result<ImportSummary> {
        if !self.authorizer.is_authorized_admin(principal) {
            warn!("Rejected lead import from non-admin '{}'", principal.subject);
            return Err(ImporterError::Unauthorized);
        }

        if request.records.is_empty() {
            return Err(ImporterError::InvalidInput(
                "records must contain at least one lead".to_string(),
            ));
        }

        let mut summary = ImportSummary::new(request.records.len());
        self.enter(ImportStage::Received);
        info!(
            "Importing {} record(s) for '{}' (default strategy: {}, {} override(s))",
            request.records.len(),
            principal.subject,
            request.default_strategy,
            request.strategy_overrides.len()
        );

        let valid = self.validate_records(&request, &mut summary);
        self.enter(ImportStage::Validated);

        let conflicts = ConflictDetector::new(self.store, self.config.lookup_batch_size)
            .detect(&valid)
            .await?;
        summary.conflicts_detected_count = conflicts.len();
        self.enter(ImportStage::ConflictsDetected);

        let conflicting: HashSet<usize> = conflicts.iter().map(|c| c.incoming.position).collect();
        let inserts: Vec<ValidRecord> = valid
            .into_iter()
            .filter(|record| !conflicting.contains(&record.position))
            .collect();

        let selector = StrategySelector::new(request.default_strategy, &request.strategy_overrides);
        let now = (self.clock)();
        let mut updates = Vec::new();
        for conflict in &conflicts {
            let strategy = selector.strategy_for(&conflict.incoming.email);
            match resolve(&conflict.existing, &conflict.incoming, strategy, now) {
                Resolution::Write(lead) => updates.push(lead),
                Resolution::NoOp(reason) => {
                    debug!(
                        "Record {} ({}) skipped: {}",
                        conflict.incoming.position,
                        conflict.incoming.email,
                        reason.describe()
                    );
                    summary.skipped_policy_count += 1;
                    self.push_skipped(
                        &mut summary,
                        SkippedRecord {
                            position: conflict.incoming.position,
                            email: conflict.incoming.email.clone(),
                            reason: reason.describe().to_string(),
                        },
                    );
                }
            }
        }
        self.enter(ImportStage::MergesResolved);

        let commit = BatchCommitter::new(self.store, &self.config)
            .commit(&updates, &inserts)
            .await;
        self.enter(ImportStage::Committed);

        summary.inserted_count = commit.inserted;
        summary.updated_count = commit.updated;
        summary.failed_count = commit.failed;
        summary.sample_errors = commit.errors;
        summary.skipped_count = summary.skipped_invalid_count + summary.skipped_policy_count;

        if !summary.is_reconciled() {
            error!(
                "Import summary does not reconcile: {} total vs {} inserted + {} updated + {} skipped + {} failed",
                summary.total_records,
                summary.inserted_count,
                summary.updated_count,
                summary.skipped_count,
                summary.failed_count
            );
        }

        self.enter(ImportStage::Summarized);
        info!(
            "Import finished: {} inserted, {} updated, {} skipped ({} invalid, {} by policy), {} failed, {} conflict(s)",
            summary.inserted_count,
            summary.updated_count,
            summary.skipped_count,
            summary.skipped_invalid_count,
            summary.skipped_policy_count,
            summary.failed_count,
            summary.conflicts_detected_count
        );

        Ok(summary)
    }

    fn validate_records(&self, request: &ImportRequest, summary: &mut ImportSummary) -> Vec<ValidRecord> {
        let mut valid = Vec::with_capacity(request.records.len());

        for (index, raw) in request.records.iter().enumerate() {
            let position = index + 1;
            match RecordValidator::validate(position, raw) {
                Ok(record) => valid.push(record),
                Err(errors) => {
                    let reason = RecordValidator::describe(&errors);
                    debug!("Record {} is invalid: {}", position, reason);
                    summary.skipped_invalid_count += 1;
                    self.push_skipped(
                        summary,
                        SkippedRecord {
                            position,
                            email: raw.email.as_deref().unwrap_or_default().trim().to_string(),
                            reason: format!("invalid: {}", reason),
                        },
                    );
                }
            }
        }

        valid
    }

    fn push_skipped(&self, summary: &mut ImportSummary, skipped: SkippedRecord) {
        if summary.sample_skipped.len() < self.config.max_skipped_samples {
            summary.sample_skipped.push(skipped);
        }
    }

    fn enter(&self, stage: ImportStage) {
        debug!("Import stage: {}", stage);
    }
}
