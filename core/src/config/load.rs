use std::path::Path;

use crate::error::ConfigError;

use super::types::AppConfig;

pub const DEFAULT_CONFIG_FILE: &str = "dbbackup.toml";

/// Loads `dbbackup.toml` from the working directory when present, defaults
/// otherwise, then applies `DBBACKUP_*` environment overrides.
pub fn load_default() -> Result<AppConfig, ConfigError> {
    let cfg = if Path::new(DEFAULT_CONFIG_FILE).exists() {
        parse_file(Path::new(DEFAULT_CONFIG_FILE))?
    } else {
        AppConfig::default()
    };
    apply_env_overrides(cfg, |key| std::env::var(key).ok())
}

pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let cfg = parse_file(path)?;
    apply_env_overrides(cfg, |key| std::env::var(key).ok())
}

fn parse_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str::<AppConfig>(&s).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn apply_env_overrides(
    mut cfg: AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_blank("DBBACKUP_MYSQLDUMP_BIN") {
        cfg.mysql.bin = v;
    }
    if let Some(v) = non_blank("DBBACKUP_TEMP_DIR") {
        cfg.backup.temp_dir = Some(v.into());
    }
    if let Some(v) = non_blank("DBBACKUP_TIMEOUT_MS") {
        let ms = v.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
            key: "DBBACKUP_TIMEOUT_MS",
            value: v.clone(),
        })?;
        cfg.dump.timeout_ms = Some(ms);
    }
    if let Some(v) = non_blank("DBBACKUP_LOG_LEVEL") {
        cfg.logging.level = v;
    }

    Ok(cfg)
}
