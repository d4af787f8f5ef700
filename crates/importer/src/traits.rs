use storage::models::{Lead, LeadPatch, NewLead};
use storage::repository::LeadRepository;
use uuid::Uuid;

/// The identity an import runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

/// Decides whether a principal may run bulk imports.
pub trait AdminAuthorizer: Send + Sync {
    fn is_authorized_admin(&self, principal: &Principal) -> bool;
}

/// Grants every principal. Used by the operator CLI, which already has direct
/// database credentials.
pub struct LocalOperator;

impl AdminAuthorizer for LocalOperator {
    fn is_authorized_admin(&self, _principal: &Principal) -> bool {
        true
    }
}

/// Row-store operations the pipeline needs. Errors are the store's typed
/// errors; the pipeline decides which ones are fatal.
#[async_trait::async_trait]
pub trait LeadStore: Send + Sync {
    async fn find_by_emails(&self, emails: &[String]) -> storage::Result<Vec<Lead>>;

    async fn insert_many(&self, leads: &[NewLead]) -> storage::Result<u64>;

    async fn insert_one(&self, lead: &NewLead) -> storage::Result<Lead>;

    async fn update_one(&self, id: Uuid, patch: &LeadPatch) -> storage::Result<Lead>;
}

#[async_trait::async_trait]
impl<'a> LeadStore for LeadRepository<'a> {
    async fn find_by_emails(&self, emails: &[String]) -> storage::Result<Vec<Lead>> {
        LeadRepository::find_by_emails(self, emails).await
    }

    async fn insert_many(&self, leads: &[NewLead]) -> storage::Result<u64> {
        LeadRepository::insert_many(self, leads).await
    }

    async fn insert_one(&self, lead: &NewLead) -> storage::Result<Lead> {
        LeadRepository::insert_one(self, lead).await
    }

    async fn update_one(&self, id: Uuid, patch: &LeadPatch) -> storage::Result<Lead> {
        self.update(id, patch).await
    }
}
