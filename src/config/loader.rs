//! Options loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::Options;

/// Error type for options loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load options from a TOML file.
///
/// Empty values are filled in later by `HttpLog::configure`, so the result is
/// returned exactly as written.
pub fn load_options(path: &Path) -> Result<Options, ConfigError> {
    let content = fs::read_to_string(path)?;
    let options: Options = toml::from_str(&content)?;
    Ok(options)
}
