//! CLI subcommands for inspecting the program settings.
use crate::settings::{Settings, get_settings_file_path};
use anyhow::Result;
use clap::Subcommand;

/// The available subcommands for managing settings.
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Print an annotated `settings.toml` with every option at its default.
    DumpDefault,
    /// Print the path the settings file is loaded from.
    Path,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::DumpDefault => print!("{}", Settings::default_file_contents()),
            Self::Path => println!("{}", get_settings_file_path().display()),
        }

        Ok(())
    }
}
