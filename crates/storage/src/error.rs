use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StorageError::Database(sqlx::Error::Database(e)) => e.code().as_deref() == Some("23505"),
            StorageError::ConstraintViolation(_) => true,
            _ => false,
        }
    }

    /// Maps a unique-key rejection on `leads.email` to a readable
    /// `ConstraintViolation`, leaving every other error untouched.
    pub fn from_lead_write(error: sqlx::Error, email: &str) -> Self {
        let error = StorageError::Database(error);
        if error.is_unique_violation() {
            StorageError::ConstraintViolation(format!("lead with email '{}' already exists", email))
        } else {
            error
        }
    }
}
