use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CleanerError, Result};

/// Top-level TOML configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Hard operation ceilings
///
/// These bound every scan and delete run; hitting a ceiling is always preferred
/// over being killed mid-page by an execution-time budget, so defaults are
/// deliberately conservative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum preview items returned to the user
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
    /// Maximum conversation groups inspected while sampling a mailbox preview
    #[serde(default = "default_preview_thread_limit")]
    pub preview_thread_limit: usize,
    /// Conversation groups fetched per thread-search call
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,
    /// Exact counting stops here and reports the count as truncated
    #[serde(default = "default_count_hard_limit")]
    pub count_hard_limit: u64,
    /// Candidates processed per delete run before stopping with `truncated`
    #[serde(default = "default_delete_operation_limit")]
    pub delete_operation_limit: u64,
    /// Fixed page size for paginated listing (counting and deletion)
    #[serde(default = "default_delete_page_size")]
    pub delete_page_size: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            preview_limit: default_preview_limit(),
            preview_thread_limit: default_preview_thread_limit(),
            search_page_size: default_search_page_size(),
            count_hard_limit: default_count_hard_limit(),
            delete_operation_limit: default_delete_operation_limit(),
            delete_page_size: default_delete_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    #[serde(default = "default_token_cache_path")]
    pub token_cache_path: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            token_cache_path: default_token_cache_path(),
        }
    }
}

fn default_preview_limit() -> usize {
    10
}

fn default_preview_thread_limit() -> usize {
    100
}

fn default_search_page_size() -> usize {
    25
}

fn default_count_hard_limit() -> u64 {
    5_000
}

fn default_delete_operation_limit() -> u64 {
    5_000
}

fn default_delete_page_size() -> u32 {
    500
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_cache_path() -> PathBuf {
    PathBuf::from(".gmail-cleaner/token.json")
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CleanerError::ConfigError(format!("Invalid config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, falling back to defaults when the file is absent
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let config: Config = toml::from_str(&content)
                    .map_err(|e| CleanerError::ConfigError(format!("Invalid config file: {}", e)))?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.limits.delete_page_size == 0 {
            return Err(CleanerError::ConfigError(
                "limits.delete_page_size must be at least 1".to_string(),
            ));
        }
        if self.limits.search_page_size == 0 {
            return Err(CleanerError::ConfigError(
                "limits.search_page_size must be at least 1".to_string(),
            ));
        }
        if self.limits.preview_limit == 0 {
            return Err(CleanerError::ConfigError(
                "limits.preview_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
