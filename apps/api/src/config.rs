use anyhow::{bail, Context, Result};

/// Which remote backend holds the training-plan rows.
///
/// Selected at startup via `STORAGE_BACKEND`; both implementations speak
/// the same `PlanStore` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    Rest,
    Sheets,
}

impl std::str::FromStr for StorageBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rest" => Ok(StorageBackendKind::Rest),
            "sheets" => Ok(StorageBackendKind::Sheets),
            other => bail!("STORAGE_BACKEND must be 'rest' or 'sheets', got '{other}'"),
        }
    }
}

/// Backend-specific connection settings. Only the selected variant's
/// environment variables are required.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    Rest {
        base_url: String,
        token: String,
    },
    Sheets {
        base_url: String,
        api_key: String,
        spreadsheet_id: String,
        sheet_name: String,
        sheet_gid: i64,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub auth_base_url: String,
    pub auth_api_key: String,
    pub anthropic_api_key: String,
    /// Optional target for contact-form notifications. When unset the
    /// contact endpoint rejects submissions.
    pub webhook_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let backend: StorageBackendKind = std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "rest".to_string())
            .parse()?;

        let storage = match backend {
            StorageBackendKind::Rest => StorageConfig::Rest {
                base_url: require_env("REST_BASE_URL")?,
                token: require_env("REST_API_TOKEN")?,
            },
            StorageBackendKind::Sheets => StorageConfig::Sheets {
                base_url: std::env::var("SHEETS_BASE_URL")
                    .unwrap_or_else(|_| "https://sheets.googleapis.com/v4".to_string()),
                api_key: require_env("SHEETS_API_KEY")?,
                spreadsheet_id: require_env("SPREADSHEET_ID")?,
                sheet_name: std::env::var("SHEET_NAME")
                    .unwrap_or_else(|_| "Trainingsplan".to_string()),
                sheet_gid: std::env::var("SHEET_GID")
                    .unwrap_or_else(|_| "0".to_string())
                    .parse::<i64>()
                    .context("SHEET_GID must be a numeric sheet id")?,
            },
        };

        Ok(Config {
            storage,
            auth_base_url: require_env("AUTH_BASE_URL")?,
            auth_api_key: require_env("AUTH_API_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            webhook_url: std::env::var("WEBHOOK_URL").ok(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parses_rest() {
        assert_eq!(
            "rest".parse::<StorageBackendKind>().unwrap(),
            StorageBackendKind::Rest
        );
    }

    #[test]
    fn test_backend_kind_parses_sheets_case_insensitive() {
        assert_eq!(
            "Sheets".parse::<StorageBackendKind>().unwrap(),
            StorageBackendKind::Sheets
        );
    }

    #[test]
    fn test_backend_kind_rejects_unknown() {
        assert!("postgres".parse::<StorageBackendKind>().is_err());
    }
}
