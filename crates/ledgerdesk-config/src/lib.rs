//! Configuration management for ledgerdesk
//!
//! Loads the YAML configuration and validates the per-table options.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Data backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DataConfig {
    /// JSON fixtures used to seed the in-memory backend (built-in demo set when absent)
    #[serde(default)]
    pub fixtures: Option<PathBuf>,
    /// Simulated round-trip latency of the in-memory backend, in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "asc"),
            SortDirection::Descending => write!(f, "desc"),
        }
    }
}

/// Sort on a single named field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

impl std::fmt::Display for SortSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.direction)
    }
}

/// Where search text is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchPolicy {
    /// Search text is sent with the page request; the page resets to 1
    Server,
    /// The last fetched page is filtered in memory; page and total are kept
    Client,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        SearchPolicy::Server
    }
}

/// What happens to a page or page-size change while a fetch is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingPolicy {
    /// The new request supersedes the outstanding one
    LatestWins,
    /// The new request is dropped
    DropWhileBusy,
}

impl Default for PagingPolicy {
    fn default() -> Self {
        PagingPolicy::LatestWins
    }
}

/// Options for one paged table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Page size used on first load
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Page sizes a user may pick
    #[serde(default = "default_page_size_options")]
    pub page_size_options: Vec<usize>,
    /// Order applied when the user has not picked a sort column
    #[serde(default)]
    pub default_sort: Option<SortSpec>,
    /// Fields matched by search text
    #[serde(default)]
    pub searchable_fields: Vec<String>,
    #[serde(default)]
    pub search_policy: SearchPolicy,
    #[serde(default)]
    pub paging_policy: PagingPolicy,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            page_size_options: default_page_size_options(),
            default_sort: None,
            searchable_fields: Vec::new(),
            search_policy: SearchPolicy::Server,
            paging_policy: PagingPolicy::LatestWins,
        }
    }
}

fn default_page_size() -> usize {
    10
}

fn default_page_size_options() -> Vec<usize> {
    vec![10, 20, 50, 100]
}

impl TableConfig {
    /// Set the searchable fields
    pub fn with_search(mut self, fields: &[&str], policy: SearchPolicy) -> Self {
        self.searchable_fields = fields.iter().map(|f| f.to_string()).collect();
        self.search_policy = policy;
        self
    }

    /// Set the default sort
    pub fn with_default_sort(mut self, sort: SortSpec) -> Self {
        self.default_sort = Some(sort);
        self
    }

    /// Check whether a page size may be selected
    pub fn allows_page_size(&self, size: usize) -> bool {
        self.page_size_options.contains(&size)
    }

    fn validate(&self, table: &str) -> Result<(), ConfigError> {
        if self.page_size_options.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: format!("tables.{}.page_size_options", table),
                reason: "At least one page size is required".to_string(),
            });
        }
        if self.page_size_options.contains(&0) {
            return Err(ConfigError::InvalidValue {
                field: format!("tables.{}.page_size_options", table),
                reason: "Page sizes must be greater than 0".to_string(),
            });
        }
        if !self.allows_page_size(self.default_page_size) {
            return Err(ConfigError::InvalidValue {
                field: format!("tables.{}.default_page_size", table),
                reason: format!(
                    "Default page size {} is not one of {:?}",
                    self.default_page_size, self.page_size_options
                ),
            });
        }
        if self.searchable_fields.is_empty() {
            return Err(ConfigError::MissingField {
                field: format!("tables.{}.searchable_fields", table),
            });
        }
        Ok(())
    }
}

/// Per-entity table options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesConfig {
    #[serde(default = "default_categories_table")]
    pub categories: TableConfig,
    #[serde(default = "default_payment_modes_table")]
    pub payment_modes: TableConfig,
    #[serde(default = "default_bank_accounts_table")]
    pub bank_accounts: TableConfig,
    #[serde(default = "default_transactions_table")]
    pub transactions: TableConfig,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            categories: default_categories_table(),
            payment_modes: default_payment_modes_table(),
            bank_accounts: default_bank_accounts_table(),
            transactions: default_transactions_table(),
        }
    }
}

fn default_categories_table() -> TableConfig {
    TableConfig::default()
        .with_default_sort(SortSpec::descending("created_on"))
        .with_search(&["name", "kind", "status"], SearchPolicy::Server)
}

fn default_payment_modes_table() -> TableConfig {
    TableConfig::default()
        .with_default_sort(SortSpec::descending("created_on"))
        .with_search(&["mode"], SearchPolicy::Server)
}

fn default_bank_accounts_table() -> TableConfig {
    TableConfig::default()
        .with_default_sort(SortSpec::descending("created_on"))
        .with_search(
            &["bank_name", "holder_name", "account_number", "status"],
            SearchPolicy::Client,
        )
}

fn default_transactions_table() -> TableConfig {
    TableConfig::default()
        .with_default_sort(SortSpec::descending("transaction_date"))
        .with_search(&["description", "category", "bank_account"], SearchPolicy::Server)
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Data backend settings
    #[serde(default)]
    pub data: DataConfig,
    /// Table settings
    #[serde(default)]
    pub tables: TablesConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            },
            _ => ConfigError::IoError,
        })?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tables.categories.validate("categories")?;
        self.tables.payment_modes.validate("payment_modes")?;
        self.tables.bank_accounts.validate("bank_accounts")?;
        self.tables.transactions.validate("transactions")?;

        if self.data.latency_ms > 60_000 {
            return Err(ConfigError::InvalidValue {
                field: "data.latency_ms".to_string(),
                reason: "Latency must not exceed 60000 ms".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tables.transactions.default_page_size, 10);
        assert_eq!(config.tables.bank_accounts.search_policy, SearchPolicy::Client);
        assert_eq!(config.tables.categories.paging_policy, PagingPolicy::LatestWins);
    }

    #[test]
    fn test_bundled_template_parses() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.tables.transactions.page_size_options, vec![10, 20, 50, 100]);
        assert_eq!(
            config.tables.transactions.default_sort,
            Some(SortSpec::descending("transaction_date"))
        );
    }

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let yaml = r#"
tables:
  payment_modes:
    default_page_size: 20
    searchable_fields: [mode]
    paging_policy: drop_while_busy
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.tables.payment_modes.default_page_size, 20);
        assert_eq!(config.tables.payment_modes.paging_policy, PagingPolicy::DropWhileBusy);
        assert_eq!(config.tables.payment_modes.default_sort, None);
        assert_eq!(config.tables.categories.default_sort, Some(SortSpec::descending("created_on")));
        assert_eq!(config.data.latency_ms, 0);
    }

    #[test]
    fn test_default_page_size_must_be_an_option() {
        let yaml = r#"
tables:
  categories:
    default_page_size: 15
    searchable_fields: [name]
"#;
        match Config::from_yaml(yaml) {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "tables.categories.default_page_size")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut config = Config::default();
        config.tables.transactions.page_size_options = vec![0, 10];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_searchable_fields_required() {
        let mut config = Config::default();
        config.tables.bank_accounts.searchable_fields.clear();
        match config.validate() {
            Err(ConfigError::MissingField { field }) => {
                assert_eq!(field, "tables.bank_accounts.searchable_fields")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(Config::from_yaml("tables: [1, 2"), Err(ConfigError::InvalidYaml { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(PathBuf::from("/nonexistent/ledgerdesk.yaml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }
}
