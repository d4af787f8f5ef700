use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Lead, LeadPatch, NewLead};

const LEAD_COLUMNS: &str = "lead_id, email, first_name, last_name, studio_name, lead_source, \
     current_platform, city, state, country_code, created_at, updated_at";

pub struct LeadRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LeadRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch every lead whose email is in `emails`. Callers bound the slice
    /// size; this issues a single `= ANY($1)` query.
    pub async fn find_by_emails(&self, emails: &[String]) -> Result<Vec<Lead>> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let leads = sqlx::query_as::<_, Lead>(&format!(
            "SELECT {} FROM leads WHERE email = ANY($1)",
            LEAD_COLUMNS
        ))
        .bind(emails)
        .fetch_all(self.pool)
        .await?;

        Ok(leads)
    }

    /// Insert a batch of leads in one statement using UNNEST.
    ///
    /// The statement is atomic: a single unique-key collision rejects the
    /// whole batch.
    pub async fn insert_many(&self, leads: &[NewLead]) -> Result<u64> {
        if leads.is_empty() {
            return Ok(0);
        }

        let mut emails = Vec::with_capacity(leads.len());
        let mut first_names = Vec::with_capacity(leads.len());
        let mut last_names = Vec::with_capacity(leads.len());
        let mut studio_names = Vec::with_capacity(leads.len());
        let mut lead_sources = Vec::with_capacity(leads.len());
        let mut current_platforms = Vec::with_capacity(leads.len());
        let mut cities = Vec::with_capacity(leads.len());
        let mut states = Vec::with_capacity(leads.len());
        let mut country_codes = Vec::with_capacity(leads.len());

        for lead in leads {
            emails.push(lead.email.as_str());
            first_names.push(lead.first_name.as_str());
            last_names.push(lead.last_name.as_str());
            studio_names.push(lead.studio_name.as_str());
            lead_sources.push(lead.lead_source.as_str());
            current_platforms.push(lead.current_platform.as_str());
            cities.push(lead.city.as_str());
            states.push(lead.state.as_str());
            country_codes.push(lead.country_code.as_str());
        }

        let result = sqlx::query(
            r#"
            INSERT INTO leads (email, first_name, last_name, studio_name, lead_source,
                               current_platform, city, state, country_code)
            SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], $5::text[],
                                 $6::text[], $7::text[], $8::text[], $9::text[])
            "#,
        )
        .bind(&emails)
        .bind(&first_names)
        .bind(&last_names)
        .bind(&studio_names)
        .bind(&lead_sources)
        .bind(&current_platforms)
        .bind(&cities)
        .bind(&states)
        .bind(&country_codes)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Insert a single lead
    pub async fn insert_one(&self, lead: &NewLead) -> Result<Lead> {
        sqlx::query_as::<_, Lead>(&format!(
            r#"
            INSERT INTO leads (email, first_name, last_name, studio_name, lead_source,
                               current_platform, city, state, country_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            LEAD_COLUMNS
        ))
        .bind(&lead.email)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.studio_name)
        .bind(&lead.lead_source)
        .bind(&lead.current_platform)
        .bind(&lead.city)
        .bind(&lead.state)
        .bind(&lead.country_code)
        .fetch_one(self.pool)
        .await
        .map_err(|e| StorageError::from_lead_write(e, &lead.email))
    }

    /// Overwrite the attribute columns of an existing lead
    pub async fn update(&self, id: Uuid, patch: &LeadPatch) -> Result<Lead> {
        sqlx::query_as::<_, Lead>(&format!(
            r#"
            UPDATE leads
            SET first_name = $2,
                last_name = $3,
                studio_name = $4,
                lead_source = $5,
                current_platform = $6,
                city = $7,
                state = $8,
                country_code = $9,
                updated_at = $10
            WHERE lead_id = $1
            RETURNING {}
            "#,
            LEAD_COLUMNS
        ))
        .bind(id)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.studio_name)
        .bind(&patch.lead_source)
        .bind(&patch.current_platform)
        .bind(&patch.city)
        .bind(&patch.state)
        .bind(&patch.country_code)
        .bind(patch.updated_at)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)
    }
}
