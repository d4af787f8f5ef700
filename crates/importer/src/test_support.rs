//! In-memory `LeadStore` for unit tests.

use crate::traits::{AdminAuthorizer, LeadStore, Principal};
use chrono::{TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Mutex;
use storage::StorageError;
use storage::models::{Lead, LeadPatch, NewLead};
use uuid::Uuid;

#[derive(Default)]
struct State {
    leads: Vec<Lead>,
    lookup_batches: Vec<usize>,
    insert_many_batches: Vec<usize>,
    insert_one_calls: usize,
    update_calls: usize,
    fail_lookups_after: Option<usize>,
    fail_insert_many: bool,
    failing_emails: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

pub fn lead(email: &str) -> Lead {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Lead {
        lead_id: Uuid::new_v4(),
        email: email.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        studio_name: String::new(),
        lead_source: String::new(),
        current_platform: String::new(),
        city: String::new(),
        state: String::new(),
        country_code: String::new(),
        created_at: created,
        updated_at: created,
    }
}

fn injected(message: &str) -> StorageError {
    StorageError::Database(sqlx::Error::Protocol(message.to_string()))
}

impl MemoryStore {
    pub fn with_leads(leads: Vec<Lead>) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().leads = leads;
        store
    }

    /// Lookups succeed `n` times, then every later lookup errors.
    pub fn fail_lookups_after(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_lookups_after = Some(n);
        self
    }

    pub fn fail_insert_many(self) -> Self {
        self.state.lock().unwrap().fail_insert_many = true;
        self
    }

    /// Every write touching `email` is rejected.
    pub fn fail_writes_for(self, email: &str) -> Self {
        self.state.lock().unwrap().failing_emails.insert(email.to_string());
        self
    }

    pub fn leads(&self) -> Vec<Lead> {
        self.state.lock().unwrap().leads.clone()
    }

    pub fn get(&self, email: &str) -> Option<Lead> {
        self.leads().into_iter().find(|l| l.email == email)
    }

    pub fn lookup_batches(&self) -> Vec<usize> {
        self.state.lock().unwrap().lookup_batches.clone()
    }

    pub fn insert_many_batches(&self) -> Vec<usize> {
        self.state.lock().unwrap().insert_many_batches.clone()
    }

    pub fn insert_one_calls(&self) -> usize {
        self.state.lock().unwrap().insert_one_calls
    }

    pub fn update_calls(&self) -> usize {
        self.state.lock().unwrap().update_calls
    }

    pub fn total_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.lookup_batches.len()
            + state.insert_many_batches.len()
            + state.insert_one_calls
            + state.update_calls
    }
}

fn materialize(new: &NewLead) -> Lead {
    let now = Utc::now();
    Lead {
        lead_id: Uuid::new_v4(),
        email: new.email.clone(),
        first_name: new.first_name.clone(),
        last_name: new.last_name.clone(),
        studio_name: new.studio_name.clone(),
        lead_source: new.lead_source.clone(),
        current_platform: new.current_platform.clone(),
        city: new.city.clone(),
        state: new.state.clone(),
        country_code: new.country_code.clone(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait::async_trait]
impl LeadStore for MemoryStore {
    async fn find_by_emails(&self, emails: &[String]) -> storage::Result<Vec<Lead>> {
        let mut state = self.state.lock().unwrap();
        if let Some(limit) = state.fail_lookups_after {
            if state.lookup_batches.len() >= limit {
                state.lookup_batches.push(emails.len());
                return Err(injected("lookup unavailable"));
            }
        }
        state.lookup_batches.push(emails.len());
        Ok(state
            .leads
            .iter()
            .filter(|l| emails.contains(&l.email))
            .cloned()
            .collect())
    }

    async fn insert_many(&self, leads: &[NewLead]) -> storage::Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.insert_many_batches.push(leads.len());
        if state.fail_insert_many {
            return Err(injected("bulk insert rejected"));
        }

        let mut seen: HashSet<&str> = state.leads.iter().map(|l| l.email.as_str()).collect();
        for lead in leads {
            if state.failing_emails.contains(&lead.email) {
                return Err(injected("write rejected"));
            }
            if !seen.insert(lead.email.as_str()) {
                return Err(StorageError::ConstraintViolation(format!(
                    "lead with email '{}' already exists",
                    lead.email
                )));
            }
        }

        state.leads.extend(leads.iter().map(materialize));
        Ok(leads.len() as u64)
    }

    async fn insert_one(&self, lead: &NewLead) -> storage::Result<Lead> {
        let mut state = self.state.lock().unwrap();
        state.insert_one_calls += 1;
        if state.failing_emails.contains(&lead.email) {
            return Err(injected("write rejected"));
        }
        if state.leads.iter().any(|l| l.email == lead.email) {
            return Err(StorageError::ConstraintViolation(format!(
                "lead with email '{}' already exists",
                lead.email
            )));
        }

        let created = materialize(lead);
        state.leads.push(created.clone());
        Ok(created)
    }

    async fn update_one(&self, id: Uuid, patch: &LeadPatch) -> storage::Result<Lead> {
        let mut state = self.state.lock().unwrap();
        state.update_calls += 1;
        let failing = state.failing_emails.clone();

        let existing = state
            .leads
            .iter_mut()
            .find(|l| l.lead_id == id)
            .ok_or(StorageError::NotFound)?;
        if failing.contains(&existing.email) {
            return Err(injected("write rejected"));
        }

        existing.first_name = patch.first_name.clone();
        existing.last_name = patch.last_name.clone();
        existing.studio_name = patch.studio_name.clone();
        existing.lead_source = patch.lead_source.clone();
        existing.current_platform = patch.current_platform.clone();
        existing.city = patch.city.clone();
        existing.state = patch.state.clone();
        existing.country_code = patch.country_code.clone();
        existing.updated_at = patch.updated_at;
        Ok(existing.clone())
    }
}

pub struct AllowList(pub Vec<String>);

impl AdminAuthorizer for AllowList {
    fn is_authorized_admin(&self, principal: &Principal) -> bool {
        self.0.contains(&principal.subject)
    }
}
