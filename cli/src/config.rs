// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf, str::FromStr};

use tokio::fs;

use almanac_core::{APP_NAME, Config, get_config_dir};

const ALMANAC_CONFIG_ENV: &str = "ALMANAC_CONFIG";

/// Find and read the configuration.
///
/// The file is taken from `path`, then from `$ALMANAC_CONFIG`, then from
/// `$XDG_CONFIG_HOME/almanac/config.toml`. A missing default file means
/// the default configuration, a missing file named explicitly is an error.
#[tracing::instrument]
pub async fn parse_config(path: Option<PathBuf>) -> Result<Config, Box<dyn Error>> {
    let path = if let Some(path) = path {
        path
    } else if let Ok(env_path) = std::env::var(ALMANAC_CONFIG_ENV) {
        PathBuf::from(env_path)
    } else {
        let config = get_config_dir()?.join(format!("{APP_NAME}/config.toml"));
        if !config.exists() {
            tracing::debug!(path = %config.display(), "no config file, using defaults");
            let mut config = Config::default();
            config.normalize()?;
            return Ok(config);
        }
        config
    };

    let mut config = fs::read_to_string(&path)
        .await
        .map_err(|e| format!("Failed to read config file at {}: {}", path.display(), e))?
        .parse::<ConfigRaw>()?
        .core;
    config.normalize()?;
    Ok(config)
}

#[derive(Debug, Default, serde::Deserialize)]
struct ConfigRaw {
    #[serde(default)]
    core: Config,
}

impl FromStr for ConfigRaw {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::OnceLock;

    use almanac_core::{DEFAULT_OCCURRENCE_LIMIT, OutputFormat};
    use tempfile::TempDir;
    use tokio::sync::Mutex;

    use super::*;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn write_config(path: &Path, calendar: &Path) {
        let toml_content = format!(
            r#"
[core]
calendar_path = "{}"
"#,
            calendar.to_str().unwrap().replace('\\', "/")
        );
        fs::write(path, toml_content).unwrap();
    }

    #[tokio::test]
    async fn cli_flag_overrides_env_var() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let calendar = temp_dir.path().join("flag.ics");
        write_config(&config_path, &calendar);

        let env_path = temp_dir.path().join("env_config.toml");
        write_config(&env_path, &temp_dir.path().join("env.ics"));

        {
            let _guard = env_lock().lock().await;
            unsafe {
                std::env::set_var(ALMANAC_CONFIG_ENV, env_path.to_str().unwrap());
            }

            let config = parse_config(Some(config_path)).await.unwrap();
            assert_eq!(config.calendar_path, Some(calendar));

            unsafe {
                std::env::remove_var(ALMANAC_CONFIG_ENV);
            }
        }
    }

    #[tokio::test]
    async fn env_var_overrides_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let env_path = temp_dir.path().join("env_config.toml");
        let calendar = temp_dir.path().join("env.ics");
        write_config(&env_path, &calendar);

        {
            let _guard = env_lock().lock().await;
            unsafe {
                std::env::set_var(ALMANAC_CONFIG_ENV, env_path.to_str().unwrap());
            }

            let config = parse_config(None).await.unwrap();
            assert_eq!(config.calendar_path, Some(calendar));

            unsafe {
                std::env::remove_var(ALMANAC_CONFIG_ENV);
            }
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn uses_default_location() {
        let temp_dir = TempDir::new().unwrap();
        let default_dir = temp_dir.path().join(APP_NAME);
        fs::create_dir_all(&default_dir).unwrap();
        let calendar = temp_dir.path().join("default.ics");
        write_config(&default_dir.join("config.toml"), &calendar);

        {
            let _guard = env_lock().lock().await;
            unsafe {
                std::env::remove_var(ALMANAC_CONFIG_ENV);
                std::env::set_var("XDG_CONFIG_HOME", temp_dir.path().to_str().unwrap());
            }

            let config = parse_config(None).await.unwrap();
            assert_eq!(config.calendar_path, Some(calendar));

            unsafe {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn falls_back_to_defaults_without_a_file() {
        let temp_dir = TempDir::new().unwrap();

        {
            let _guard = env_lock().lock().await;
            unsafe {
                std::env::remove_var(ALMANAC_CONFIG_ENV);
                std::env::set_var("XDG_CONFIG_HOME", temp_dir.path().to_str().unwrap());
            }

            let config = parse_config(None).await.unwrap();
            assert_eq!(config, Config::default());

            unsafe {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }

    #[tokio::test]
    async fn missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = parse_config(Some(temp_dir.path().join("missing.toml"))).await;
        let error = result.unwrap_err().to_string();
        assert!(error.starts_with("Failed to read config file at"));
    }

    #[tokio::test]
    async fn reads_every_field() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[core]
occurrence_limit = 0
output_format = "json"
"#,
        )
        .unwrap();

        let config = parse_config(Some(config_path)).await.unwrap();
        assert_eq!(config.calendar_path, None);
        assert_eq!(config.occurrence_limit, DEFAULT_OCCURRENCE_LIMIT);
        assert_eq!(config.output_format, OutputFormat::Json);
    }
}
