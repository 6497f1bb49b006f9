//! Theme command handler

use anyhow::{Context, Result};
use clap::ValueEnum;

use fuqdocs_core::{Session, Theme};

use crate::output::{Output, OutputFormat};

/// Requested theme change
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeChoice {
    Dark,
    Light,
    Toggle,
}

/// Show the theme, or change it
pub fn run(session: &mut Session, choice: Option<ThemeChoice>, output: &Output) -> Result<()> {
    let Some(choice) = choice else {
        print_theme(session.theme(), output);
        return Ok(());
    };

    let theme = match choice {
        ThemeChoice::Dark => set(session, Theme::Dark)?,
        ThemeChoice::Light => set(session, Theme::Light)?,
        ThemeChoice::Toggle => session.toggle_theme().context("Failed to save theme")?,
    };

    match output.format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "theme": theme })),
        _ => output.success(&format!("Theme set to {}", theme)),
    }
    Ok(())
}

fn set(session: &mut Session, theme: Theme) -> Result<Theme> {
    session.set_theme(theme).context("Failed to save theme")?;
    Ok(theme)
}

fn print_theme(theme: Theme, output: &Output) {
    match output.format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "theme": theme })),
        _ => println!("{}", theme),
    }
}
