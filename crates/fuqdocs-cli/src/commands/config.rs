//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use fuqdocs_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "log_file": config.log_file,
                    "log_level": config.log_level,
                    "autosave_interval_ms": config.autosave_interval_ms,
                    "poll_interval_ms": config.poll_interval_ms,
                    "change_retention": config.change_retention
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:             {}", config.data_dir.display());
            println!(
                "  log_file:             {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("  log_level:            {}", config.log_level);
            println!("  autosave_interval_ms: {}", config.autosave_interval_ms);
            println!("  poll_interval_ms:     {}", config.poll_interval_ms);
            println!("  change_retention:     {}", config.change_retention);
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        "log_level" => {
            config.log_level = value.to_string();
        }
        "autosave_interval_ms" => {
            config.autosave_interval_ms = parse_millis(key, value)?;
        }
        "poll_interval_ms" => {
            config.poll_interval_ms = parse_millis(key, value)?;
        }
        "change_retention" => {
            config.change_retention = value
                .parse()
                .context("Invalid value for change_retention. Use a whole number.")?;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, log_file, log_level, autosave_interval_ms, \
                 poll_interval_ms, change_retention",
                key
            );
        }
    }
    Ok(())
}

fn parse_millis(key: &str, value: &str) -> Result<u64> {
    let millis: u64 = value
        .parse()
        .with_context(|| format!("Invalid value for {}. Use milliseconds.", key))?;
    if millis == 0 {
        bail!("{} must be greater than zero", key);
    }
    Ok(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "poll_interval_ms", "250").unwrap();
        apply(&mut config, "log_file", "/tmp/fuqdocs.log").unwrap();
        apply(&mut config, "log_level", "debug").unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/fuqdocs.log")));
        assert_eq!(config.log_level, "debug");

        apply(&mut config, "log_file", "none").unwrap();
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply(&mut config, "autosave_interval_ms", "soon").is_err());
        assert!(apply(&mut config, "autosave_interval_ms", "0").is_err());
        assert!(apply(&mut config, "sync_url", "ws://x").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_set_writes_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            format!("data_dir = {:?}\n", temp_dir.path().join("data")),
        )
        .unwrap();

        set(
            "change_retention".to_string(),
            "42".to_string(),
            Some(&path),
            &Output::new(OutputFormat::Quiet),
        )
        .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("change_retention = 42"));
    }
}
