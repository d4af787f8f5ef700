/// Tunables for one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Emails per existing-lead lookup
    pub lookup_batch_size: usize,
    /// Leads per update batch; each lead is still written on its own
    pub update_batch_size: usize,
    /// Leads per bulk insert
    pub insert_batch_size: usize,
    pub max_skipped_samples: usize,
    pub max_error_samples: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            lookup_batch_size: 100,
            update_batch_size: 50,
            insert_batch_size: 100,
            max_skipped_samples: 50,
            max_error_samples: 10,
        }
    }
}
