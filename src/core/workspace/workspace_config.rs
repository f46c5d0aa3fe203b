use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Where the briefs live and how hard we lean on the Drive API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// The "Developer Briefs" folder every search starts from by default.
    pub root_folder_id: String,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub sheet_range: String,
    pub default_template_id: Option<String>,
    pub search_result_limit: usize,
    /// How many folder ids go into one `in parents` disjunction.
    pub parent_batch_size: usize,
    pub subtree_cache_ttl: Option<Duration>,
    pub subtree_cache_max_entries: usize,
}

impl WorkspaceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let number = |key: &'static str, default: usize, min: usize| match get(key) {
            None => Ok(default),
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n >= min => Ok(n),
                _ => Err(ConfigError::Invalid { key, value: raw }),
            },
        };

        let ttl_secs = number("SUBTREE_CACHE_TTL_SECS", 0, 0)?;

        Ok(Self {
            root_folder_id: require("BRIEFS_ROOT_FOLDER_ID")?,
            spreadsheet_id: require("CLIENT_SPREADSHEET_ID")?,
            sheet_name: get("CLIENT_SHEET_NAME").unwrap_or_else(|| "Accounts".to_string()),
            sheet_range: get("CLIENT_SHEET_RANGE").unwrap_or_else(|| "A4:R".to_string()),
            default_template_id: get("BRIEF_TEMPLATE_ID"),
            search_result_limit: number("SEARCH_RESULT_LIMIT", 100, 1)?,
            parent_batch_size: number("SEARCH_PARENT_BATCH", 40, 1)?,
            subtree_cache_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs as u64)),
            subtree_cache_max_entries: number("SUBTREE_CACHE_MAX_ENTRIES", 64, 1)?,
        })
    }

    /// The A1 range of the accounts sheet, e.g. `Accounts!A4:R`.
    pub fn client_range(&self) -> String {
        format!("{}!{}", self.sheet_name, self.sheet_range)
    }
}
