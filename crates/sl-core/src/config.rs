//! Configuration types and parsing for sledger.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Connection string used when nothing else is configured
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost";

/// Migration directory used when nothing else is configured
pub const DEFAULT_LEDGER_ROOT: &str = "migrations";

/// Optional settings file (`sledger.yml`).
///
/// Every field can be overridden from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory containing migration files
    #[serde(default)]
    pub ledger: Option<String>,

    /// Database connection string
    #[serde(default)]
    pub database: Option<String>,

    /// Expand `${NAME}` in statements from the environment
    #[serde(default)]
    pub expand_env: bool,
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load `sledger.yml` or `sledger.yaml` from `dir`, or the defaults when
    /// neither exists
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("sledger.yml");
        let yaml_path = dir.join("sledger.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Compose a PostgreSQL connection string from the `DATABASE_*` variables.
///
/// Returns `None` unless at least one of `DATABASE_HOST`, `DATABASE_NAME` or
/// `DATABASE_MIGRATION_USERNAME` is set. Host and port default to
/// `localhost:5432`. Credentials are percent-encoded into the URL.
pub fn database_url_from_env<F>(lookup: F) -> CoreResult<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    let host = get("DATABASE_HOST");
    let name = get("DATABASE_NAME");
    let user = get("DATABASE_MIGRATION_USERNAME");
    if host.is_none() && name.is_none() && user.is_none() {
        return Ok(None);
    }

    let host = host.unwrap_or_else(|| {
        log::info!("Host not specified. Default to localhost.");
        "localhost".to_string()
    });
    let port = match get("DATABASE_PORT") {
        Some(port) => port.parse::<u16>().map_err(|e| CoreError::InvalidDatabaseEnv {
            key: "DATABASE_PORT",
            message: format!("{port:?}: {e}"),
        })?,
        None => {
            log::info!("Port not specified. Default to 5432.");
            5432
        }
    };
    let user = user.unwrap_or_else(|| {
        log::warn!("User not specified. Please provide DATABASE_MIGRATION_USERNAME.");
        String::new()
    });
    let password = get("DATABASE_MIGRATION_PASSWORD");
    let name = name.unwrap_or_default();

    let invalid = |key: &'static str| {
        move |_: ()| CoreError::InvalidDatabaseEnv {
            key,
            message: "cannot be used in a connection string".to_string(),
        }
    };

    let mut url = Url::parse("postgresql://localhost").expect("valid url");
    url.set_host(Some(&host)).map_err(|e| CoreError::InvalidDatabaseEnv {
        key: "DATABASE_HOST",
        message: format!("{host:?}: {e}"),
    })?;
    url.set_port(Some(port)).map_err(invalid("DATABASE_PORT"))?;
    url.set_username(&user)
        .map_err(invalid("DATABASE_MIGRATION_USERNAME"))?;
    url.set_password(password.as_deref())
        .map_err(invalid("DATABASE_MIGRATION_PASSWORD"))?;
    url.set_path(&format!("/{name}"));
    url.set_query(Some("sslmode=disable"));

    Ok(Some(url.into()))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
