use anyhow::{Context, Result};
use lead_importer::ImportConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub api_keys: String,
    pub admin_api_keys: String,
    pub import: ImportConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = ImportConfig::default();

        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            api_keys: std::env::var("API_KEYS").unwrap_or_default(),
            admin_api_keys: std::env::var("ADMIN_API_KEYS").unwrap_or_default(),
            import: ImportConfig {
                lookup_batch_size: batch_size_from_env(
                    "IMPORT_LOOKUP_BATCH_SIZE",
                    defaults.lookup_batch_size,
                )?,
                update_batch_size: batch_size_from_env(
                    "IMPORT_UPDATE_BATCH_SIZE",
                    defaults.update_batch_size,
                )?,
                insert_batch_size: batch_size_from_env(
                    "IMPORT_INSERT_BATCH_SIZE",
                    defaults.insert_batch_size,
                )?,
                ..defaults
            },
        })
    }
}

fn batch_size_from_env(name: &str, default: usize) -> Result<usize> {
    match std::env::var(name) {
        Ok(value) => {
            let size: usize = value
                .parse()
                .with_context(|| format!("{} must be a positive number", name))?;
            anyhow::ensure!(size > 0, "{} must be greater than zero", name);
            Ok(size)
        }
        Err(_) => Ok(default),
    }
}
