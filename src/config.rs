use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::ci::CiContext;
use crate::report::DEFAULT_REPORTS_DIR;

/// Storage endpoint that accepts report envelopes.
pub const DEFAULT_ENDPOINT: &str = "https://amp-test-cases.appspot.com/report";

/// Optional overrides read from `config/report-upload.toml`.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub reports_dir: Option<PathBuf>,
}

/// Everything the uploader needs, resolved up front.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub endpoint: String,
    pub reports_dir: PathBuf,
    pub ci: CiContext,
}

/// Load the TOML config file.
///
/// When `required` is false a missing file yields the defaults; a file that
/// exists but cannot be read or parsed is always an error.
pub fn load_config(path: &Path, required: bool) -> anyhow::Result<FileConfig> {
    if !required && !path.exists() {
        return Ok(FileConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: FileConfig =
        toml::from_str(&content).with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}

/// Returns the default path to `config/report-upload.toml` relative to the current directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config/report-upload.toml")
}

/// Merge CLI flags over the file config over built-in defaults.
pub fn resolve(
    file: FileConfig,
    endpoint: Option<String>,
    reports_dir: Option<PathBuf>,
    ci: CiContext,
) -> UploaderConfig {
    UploaderConfig {
        endpoint: endpoint
            .or(file.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        reports_dir: reports_dir
            .or(file.reports_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORTS_DIR)),
        ci,
    }
}
