pub mod committer;
pub mod config;
pub mod conflict;
pub mod error;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod sanitize;
pub mod traits;
pub mod validator;

#[cfg(test)]
mod test_support;

pub use config::ImportConfig;
pub use error::{ImporterError, Result};
pub use models::{
    ConflictStrategy, ImportLeadsRequest, ImportRequest, ImportSummary, RawLeadRecord,
    RecordError, SkippedRecord,
};
pub use pipeline::LeadImporter;
pub use traits::{AdminAuthorizer, LeadStore, LocalOperator, Principal};
