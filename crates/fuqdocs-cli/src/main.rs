//! fuqdocs CLI
//!
//! Command-line interface for fuqdocs - local markdown notes.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fuqdocs_core::{Config, Session};

mod commands;
mod editor;
mod output;

use commands::theme::ThemeChoice;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "fuqdocs")]
#[command(about = "fuqdocs - Local markdown notes")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List documents, most recently saved first
    #[command(alias = "ls")]
    List {
        /// Only titles containing this text (at least 2 characters)
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Show a document (default: the last saved one)
    Show {
        /// Document ID (full UUID or prefix)
        id: Option<String>,
    },
    /// Create a new document
    #[command(alias = "add")]
    New {
        /// Document title
        #[arg(short = 'T', long)]
        title: String,
        /// Document content (opens editor if neither this nor --file is given)
        #[arg(short, long, conflicts_with = "file")]
        content: Option<String>,
        /// Read content from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Edit a document (default: the last saved one)
    Edit {
        /// Document ID (full UUID or prefix)
        id: Option<String>,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// New content (opens editor if neither this nor --title is given)
        #[arg(short, long)]
        content: Option<String>,
    },
    /// Delete a document
    #[command(alias = "rm")]
    Delete {
        /// Document ID (full UUID or prefix)
        id: String,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or change the theme
    Theme {
        #[arg(value_enum)]
        choice: Option<ThemeChoice>,
    },
    /// Show status (storage, documents, migrations)
    Status,
    /// Follow changes from other instances and autosave
    Watch,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, log_file, log_level, autosave_interval_ms,
        /// poll_interval_ms, change_retention)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let mut session = Session::open_storage(&config).with_context(|| {
        format!(
            "Failed to open document storage at {:?}",
            config.storage_path()
        )
    })?;

    if let Some((name, e)) = &session.migrations().failed {
        output.warning(&format!("Migration '{}' failed: {:#}", name, e));
    }

    match cli.command.unwrap_or(Commands::Show { id: None }) {
        Commands::List { filter } => commands::document::list(&session, filter, &output),
        Commands::Show { id } => commands::document::show(&mut session, id, &output),
        Commands::New {
            title,
            content,
            file,
        } => commands::document::create(&mut session, title, content, file, &output),
        Commands::Edit { id, title, content } => {
            commands::document::edit(&mut session, id, title, content, &output)
        }
        Commands::Delete { id, yes } => commands::document::delete(&mut session, id, yes, &output),
        Commands::Theme { choice } => commands::theme::run(&mut session, choice, &output),
        Commands::Status => commands::status::show(&session, &config, &output),
        Commands::Watch => commands::watch::run(&mut session, &config, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging
///
/// RUST_LOG wins over the configured level. Logs go to `config.log_file`
/// when set, otherwise to stderr.
fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "fuqdocs_core={level},fuqdocs_cli={level}",
            level = config.log_level
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    let Some(log_path) = &config.log_file else {
        let _ = builder.with_writer(std::io::stderr).try_init();
        return;
    };

    let log_file = match File::options().create(true).append(true).open(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            let _ = builder.with_writer(std::io::stderr).try_init();
            return;
        }
    };

    let _ = builder.with_ansi(false).with_writer(log_file).try_init();
}
