//! Run configuration.
//!
//! Built once at startup from key/value pairs (the process environment in
//! production) and handed to each component constructor. Every key is
//! validated up front so a misconfigured run fails before the first request.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{ConfigError, ConfigResult};

pub const API_BASE_URL: &str = "SYNC_API_BASE_URL";
pub const API_ACRONYM: &str = "SYNC_API_ACRONYM";
pub const API_PERSON: &str = "SYNC_API_PERSON";
pub const API_PASSWORD: &str = "SYNC_API_PASSWORD";
pub const API_KEY: &str = "SYNC_API_KEY";
pub const SUPPLIER: &str = "SYNC_SUPPLIER";

pub const DB_HOST: &str = "SYNC_DB_HOST";
pub const DB_PORT: &str = "SYNC_DB_PORT";
pub const DB_NAME: &str = "SYNC_DB_NAME";
pub const DB_USER: &str = "SYNC_DB_USER";
pub const DB_PASSWORD: &str = "SYNC_DB_PASSWORD";

pub const TABLE_PRODUCTS: &str = "SYNC_TABLE_PRODUCTS";
pub const TABLE_APPLICATIONS: &str = "SYNC_TABLE_APPLICATIONS";
pub const TABLE_CROSS_NUMBERS: &str = "SYNC_TABLE_CROSS_NUMBERS";
pub const TABLE_PACKAGES: &str = "SYNC_TABLE_PACKAGES";
pub const TABLE_PARAMETERS: &str = "SYNC_TABLE_PARAMETERS";
pub const TABLE_IMAGES: &str = "SYNC_TABLE_IMAGES";
pub const TABLE_FILES: &str = "SYNC_TABLE_FILES";

pub const FETCH_INTERVAL_SECONDS: &str = "SYNC_FETCH_INTERVAL_SECONDS";

pub const INPUT_DIR: &str = "SYNC_INPUT_DIR";
pub const RESULT_DIR: &str = "SYNC_RESULT_DIR";
pub const ARCHIVE_DIR: &str = "SYNC_ARCHIVE_DIR";
pub const LOG_DIR: &str = "SYNC_LOG_DIR";

const DEFAULT_DB_PORT: u16 = 5432;

/// Catalog API access.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub acronym: String,
    pub person: String,
    pub password: String,
    pub key: String,
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("acronym", &self.acronym)
            .field("person", &self.person)
            .field("password", &"***")
            .field("key", &"***")
            .finish()
    }
}

/// Relational store connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl core::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Table name per entity kind.
///
/// Names are interpolated into SQL text, so they are restricted to plain or
/// schema-qualified identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub products: String,
    pub applications: String,
    pub cross_numbers: String,
    pub packages: String,
    pub parameters: String,
    pub images: String,
    pub files: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            products: "products".to_string(),
            applications: "product_applications".to_string(),
            cross_numbers: "product_cross_numbers".to_string(),
            packages: "product_packages".to_string(),
            parameters: "product_parameters".to_string(),
            images: "product_images".to_string(),
            files: "product_files".to_string(),
        }
    }
}

/// Filesystem locations used by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    pub input_dir: PathBuf,
    pub result_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            result_dir: PathBuf::from("result"),
            archive_dir: PathBuf::from("archive"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Complete configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub api: ApiConfig,
    /// Supplier name stamped onto every fetched product.
    pub supplier: String,
    pub database: DatabaseConfig,
    pub tables: TableNames,
    /// Pause between two consecutive codes of one input file.
    pub fetch_interval: Duration,
    pub paths: PathsConfig,
}

impl SyncConfig {
    /// Build from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { lookup: &lookup };

        let base_url = source.required(API_BASE_URL)?;
        let base_url = parse_base_url(&base_url)?;

        let api = ApiConfig {
            base_url,
            acronym: source.required(API_ACRONYM)?,
            person: source.required(API_PERSON)?,
            password: source.required(API_PASSWORD)?,
            key: source.required(API_KEY)?,
        };

        let database = DatabaseConfig {
            host: source.required(DB_HOST)?,
            port: match source.optional(DB_PORT) {
                Some(raw) => raw
                    .parse::<u16>()
                    .map_err(|e| ConfigError::invalid(DB_PORT, e.to_string()))?,
                None => DEFAULT_DB_PORT,
            },
            database: source.required(DB_NAME)?,
            user: source.required(DB_USER)?,
            password: source.present(DB_PASSWORD)?,
        };

        let tables = TableNames {
            products: source.table(TABLE_PRODUCTS)?,
            applications: source.table(TABLE_APPLICATIONS)?,
            cross_numbers: source.table(TABLE_CROSS_NUMBERS)?,
            packages: source.table(TABLE_PACKAGES)?,
            parameters: source.table(TABLE_PARAMETERS)?,
            images: source.table(TABLE_IMAGES)?,
            files: source.table(TABLE_FILES)?,
        };

        let interval = source.required(FETCH_INTERVAL_SECONDS)?;
        let interval = interval.parse::<u64>().map_err(|e| {
            ConfigError::invalid(FETCH_INTERVAL_SECONDS, format!("expected whole seconds: {e}"))
        })?;

        let defaults = PathsConfig::default();
        let paths = PathsConfig {
            input_dir: source.optional(INPUT_DIR).map(PathBuf::from).unwrap_or(defaults.input_dir),
            result_dir: source
                .optional(RESULT_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.result_dir),
            archive_dir: source
                .optional(ARCHIVE_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.archive_dir),
            log_dir: source.optional(LOG_DIR).map(PathBuf::from).unwrap_or(defaults.log_dir),
        };

        Ok(Self {
            api,
            supplier: source.required(SUPPLIER)?,
            database,
            tables,
            fetch_interval: Duration::from_secs(interval),
            paths,
        })
    }

}

struct Source<'a, F> {
    lookup: &'a F,
}

impl<F> Source<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Set, possibly empty.
    fn present(&self, key: &str) -> ConfigResult<String> {
        (self.lookup)(key).ok_or_else(|| ConfigError::missing(key))
    }

    /// Set and non-blank, trimmed.
    fn required(&self, key: &str) -> ConfigResult<String> {
        let value = self.present(key)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::blank(key));
        }
        Ok(trimmed.to_string())
    }

    /// Unset and blank both mean "use the default".
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn table(&self, key: &str) -> ConfigResult<String> {
        let name = self.required(key)?;
        if !is_sql_identifier(&name) {
            return Err(ConfigError::invalid(
                key,
                format!("'{name}' is not a plain or schema-qualified identifier"),
            ));
        }
        Ok(name)
    }
}

fn parse_base_url(raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw).map_err(|e| ConfigError::invalid(API_BASE_URL, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::invalid(
            API_BASE_URL,
            format!("unsupported scheme '{other}'"),
        )),
    }
}

/// `name` or `schema.name`, each part `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_sql_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return false;
    }
    parts.iter().all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<String, String> {
        [
            (API_BASE_URL, "https://catalog.example.com/api/"),
            (API_ACRONYM, "ACME"),
            (API_PERSON, "jan"),
            (API_PASSWORD, "secret"),
            (API_KEY, "k3y"),
            (SUPPLIER, "Gaska"),
            (DB_HOST, "localhost"),
            (DB_NAME, "shop"),
            (DB_USER, "sync"),
            (DB_PASSWORD, ""),
            (TABLE_PRODUCTS, "products"),
            (TABLE_APPLICATIONS, "product_applications"),
            (TABLE_CROSS_NUMBERS, "product_cross_numbers"),
            (TABLE_PACKAGES, "product_packages"),
            (TABLE_PARAMETERS, "product_parameters"),
            (TABLE_IMAGES, "product_images"),
            (TABLE_FILES, "catalog.product_files"),
            (FETCH_INTERVAL_SECONDS, "3"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn build(env: &HashMap<String, String>) -> ConfigResult<SyncConfig> {
        SyncConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn builds_from_complete_environment() {
        let cfg = build(&full_env()).unwrap();
        assert_eq!(cfg.api.acronym, "ACME");
        assert_eq!(cfg.api.base_url.as_str(), "https://catalog.example.com/api/");
        assert_eq!(cfg.supplier, "Gaska");
        assert_eq!(cfg.database.port, 5432);
        assert_eq!(cfg.database.password, "");
        assert_eq!(cfg.tables.files, "catalog.product_files");
        assert_eq!(cfg.fetch_interval, Duration::from_secs(3));
        assert_eq!(cfg.paths, PathsConfig::default());
    }

    #[test]
    fn missing_credential_fails_fast() {
        let mut env = full_env();
        env.remove(API_KEY);
        assert_eq!(build(&env).unwrap_err(), ConfigError::missing(API_KEY));
    }

    #[test]
    fn blank_credential_is_rejected() {
        let mut env = full_env();
        env.insert(API_PERSON.to_string(), "   ".to_string());
        assert_eq!(build(&env).unwrap_err(), ConfigError::blank(API_PERSON));
    }

    #[test]
    fn db_password_must_be_present_even_if_empty() {
        let mut env = full_env();
        env.remove(DB_PASSWORD);
        assert_eq!(build(&env).unwrap_err(), ConfigError::missing(DB_PASSWORD));
    }

    #[test]
    fn rejects_unsafe_table_names() {
        let mut env = full_env();
        env.insert(TABLE_IMAGES.to_string(), "images; DROP TABLE x".to_string());
        match build(&env).unwrap_err() {
            ConfigError::Invalid { key, .. } => assert_eq!(key, TABLE_IMAGES),
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_http_base_url_and_fractional_interval() {
        let mut env = full_env();
        env.insert(API_BASE_URL.to_string(), "ftp://catalog".to_string());
        assert!(matches!(build(&env), Err(ConfigError::Invalid { .. })));

        let mut env = full_env();
        env.insert(FETCH_INTERVAL_SECONDS.to_string(), "1.5".to_string());
        assert!(matches!(build(&env), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn optional_paths_override_defaults() {
        let mut env = full_env();
        env.insert(RESULT_DIR.to_string(), "/tmp/out".to_string());
        env.insert(DB_PORT.to_string(), "6543".to_string());
        let cfg = build(&env).unwrap();
        assert_eq!(cfg.paths.result_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cfg.paths.input_dir, PathBuf::from("input"));
        assert_eq!(cfg.database.port, 6543);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = build(&full_env()).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("k3y"));
    }

    #[test]
    fn identifier_rules() {
        assert!(is_sql_identifier("products"));
        assert!(is_sql_identifier("shop._items2"));
        assert!(!is_sql_identifier("2items"));
        assert!(!is_sql_identifier("a.b.c"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("items-x"));
    }
}
