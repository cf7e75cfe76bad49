use std::path::PathBuf;

/// Table or record file opened at startup.
pub const OPEN_ENV: &str = "POLICYSHEET_OPEN";
/// Where the editor leaves a table for the preview page.
pub const PREVIEW_BUFFER_ENV: &str = "POLICYSHEET_PREVIEW_BUFFER";
/// `tracing` filter directives.
pub const LOG_ENV: &str = "POLICYSHEET_LOG";

const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_PREVIEW_BUFFER: &str = "policysheet-preview.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub open_path: Option<PathBuf>,
    pub preview_buffer: PathBuf,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        Self {
            open_path: non_empty(OPEN_ENV).map(PathBuf::from),
            preview_buffer: non_empty(PREVIEW_BUFFER_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_PREVIEW_BUFFER)),
            log_filter: non_empty(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
