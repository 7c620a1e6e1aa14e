// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

/// The name of the application.
pub const APP_NAME: &str = "almanac";

/// Number of occurrences listed when no limit is given.
pub const DEFAULT_OCCURRENCE_LIMIT: usize = 20;

/// Configuration of the calendar engine.
///
/// Every field has a default, so an empty TOML table is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Calendar file used when a command names none.
    pub calendar_path: Option<PathBuf>,

    /// Number of occurrences listed when no limit is given.
    pub occurrence_limit: usize,

    /// Default output format of listings.
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calendar_path: None,
            occurrence_limit: DEFAULT_OCCURRENCE_LIMIT,
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Normalize the configuration.
    ///
    /// # Errors
    ///
    /// Fails when a path names a home or config directory that cannot be
    /// found.
    #[tracing::instrument(skip(self))]
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        if let Some(path) = &self.calendar_path {
            self.calendar_path = Some(expand_path(path)?);
        }
        if self.occurrence_limit == 0 {
            tracing::warn!("occurrence_limit of 0 lists nothing, using the default");
            self.occurrence_limit = DEFAULT_OCCURRENCE_LIMIT;
        }
        Ok(())
    }
}

/// Output format of listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, strum::EnumString)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Human readable table
    #[default]
    Table,

    /// JSON document
    Json,
}

/// Error for a configuration that cannot be used.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `~` or `$HOME` used without a home directory
    #[error("User-specific home directory not found")]
    HomeDirNotFound,

    /// `$XDG_CONFIG_HOME` used without a config directory
    #[error("User-specific config directory not found")]
    ConfigDirNotFound,

    /// Path that is not valid UTF-8
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
}

/// Handle tilde (~) and environment variables in the path
fn expand_path(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let Some(text) = path.to_str() else {
        return Err(ConfigError::InvalidPath(path.to_owned()));
    };

    // Handle tilde and home directory
    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = text.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    // Handle config directories
    let config_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_CONFIG_HOME/", "${XDG_CONFIG_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in config_prefixes {
        if let Some(stripped) = text.strip_prefix(prefix) {
            return Ok(get_config_dir()?.join(stripped));
        }
    }

    Ok(path.to_owned())
}

fn get_home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)
}

/// Directory holding the configuration of every application of the user.
///
/// # Errors
///
/// Fails when the platform reports no such directory.
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(not(unix))]
    let config_dir = dirs::config_dir();
    config_dir.ok_or(ConfigError::ConfigDirNotFound)
}
