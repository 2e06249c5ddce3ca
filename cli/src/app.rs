use std::path::{Path, PathBuf};

use dbbackup_core::api::{AppConfig, BackupReport, CancellationToken};
use dbbackup_core::config;
use dbbackup_plugins::factory::build_backup;

use crate::commands::cli::Args;
use crate::error::CliError;
use crate::logging;

pub async fn run_app(args: Args) -> Result<(), CliError> {
    let cfg = load_config(&args)?;
    let _log_guard = logging::init(&cfg.logging)?;

    let backup = build_backup(&cfg)?;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling backup");
            trigger.cancel();
        }
    });

    let report = backup
        .backup(&args.source, &args.destinations, cancel)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "backup failed"))?;
    print_report(&report, args.json)
}

fn load_config(args: &Args) -> Result<AppConfig, CliError> {
    let mut cfg = match &args.config {
        Some(path) => config::load_from(path)?,
        None => match user_config_path().filter(|p| p.is_file()) {
            Some(path) if !Path::new(config::DEFAULT_CONFIG_FILE).exists() => config::load_from(&path)?,
            _ => config::load_default()?,
        },
    };

    if let Some(bin) = &args.mysqldump_bin {
        cfg.mysql.bin = bin.clone();
    }
    if let Some(ms) = args.timeout_ms {
        cfg.dump.timeout_ms = Some(ms);
    }
    if let Some(dir) = &args.temp_dir {
        cfg.backup.temp_dir = Some(dir.clone());
    }
    Ok(cfg)
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dbbackup").join(config::DEFAULT_CONFIG_FILE))
}

fn print_report(report: &BackupReport, json: bool) -> Result<(), CliError> {
    if json {
        let value = serde_json::json!({
            "status": "success",
            "bytes_read": report.stats.bytes_read,
            "diagnostic_lines": report.stats.diagnostic_lines,
            "elapsed_ms": report.stats.elapsed.as_millis() as u64,
            "deliveries": report.deliveries,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for line in &report.deliveries {
            println!("{line}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn command_line_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[mysql]\nbin = \"from-file\"\n[dump]\ntimeout_ms = 10\n").unwrap();

        let args = Args::try_parse_from([
            "dbbackup",
            "--config",
            path.to_str().unwrap(),
            "--timeout-ms",
            "99",
            "mysql://u:p@h/db",
            "file:///tmp/x",
        ])
        .unwrap();
        let cfg = load_config(&args).unwrap();
        assert_eq!(cfg.dump.timeout_ms, Some(99));
        if std::env::var("DBBACKUP_MYSQLDUMP_BIN").is_err() {
            assert_eq!(cfg.mysql.bin, "from-file");
        }
    }

    #[test]
    fn missing_explicit_config_is_an_input_error() {
        let args = Args::try_parse_from([
            "dbbackup",
            "--config",
            "/no/such/dbbackup.toml",
            "mysql://u:p@h/db",
            "file:///tmp/x",
        ])
        .unwrap();
        let err = load_config(&args).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
