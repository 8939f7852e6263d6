use std::path::PathBuf;
use std::str::FromStr;

use webrobot_core::error::CoreError;
use webrobot_core::paths::StorageRoots;
use webrobot_core::scheduling::{validate_priority, QUEUE_PRIORITY_DEFAULT};

/// Dispatch configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Priority for submissions that do not name one.
    pub default_priority: i32,
    pub users_root: PathBuf,
    pub upload_root: PathBuf,
    pub store_root: PathBuf,
    /// Public origin serving test result logs, used in report emails.
    pub result_base_url: String,
}

impl DispatchConfig {
    /// Load configuration from the environment, reading `.env` first if present.
    ///
    /// | Env Var                    | Default                  |
    /// |----------------------------|--------------------------|
    /// | `DATABASE_URL`             | required                 |
    /// | `DATABASE_MAX_CONNECTIONS` | `20`                     |
    /// | `TASK_PRIORITY_DEFAULT`    | `5`                      |
    /// | `USERS_ROOT`               | `users`                  |
    /// | `UPLOAD_ROOT`              | `uploads`                |
    /// | `STORE_ROOT`               | `store`                  |
    /// | `RESULT_BASE_URL`          | `http://localhost:5000`  |
    pub fn from_env() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| CoreError::InvalidArgument("DATABASE_URL must be set".into()))?;

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 20u32)?;
        let default_priority = parse_or(&lookup, "TASK_PRIORITY_DEFAULT", QUEUE_PRIORITY_DEFAULT)?;
        validate_priority(default_priority)
            .map_err(|e| CoreError::InvalidArgument(format!("TASK_PRIORITY_DEFAULT: {e}")))?;

        let path_or = |key: &str, default: &str| {
            PathBuf::from(lookup(key).unwrap_or_else(|| default.to_string()))
        };

        Ok(Self {
            database_url,
            max_connections,
            default_priority,
            users_root: path_or("USERS_ROOT", "users"),
            upload_root: path_or("UPLOAD_ROOT", "uploads"),
            store_root: path_or("STORE_ROOT", "store"),
            result_base_url: lookup("RESULT_BASE_URL")
                .unwrap_or_else(|| "http://localhost:5000".to_string()),
        })
    }

    pub fn storage_roots(&self) -> StorageRoots {
        StorageRoots {
            users_root: self.users_root.clone(),
            upload_root: self.upload_root.clone(),
            store_root: self.store_root.clone(),
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::InvalidArgument(format!("{key} has invalid value {raw:?}"))),
    }
}
