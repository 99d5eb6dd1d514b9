//! The command line interface for the simulator.
use crate::input::load_scenario;
use crate::log;
use crate::output::metadata::write_metadata;
use crate::output::{create_output_directory, get_output_dir};
use crate::settings::Settings;
use ::log::info;
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
pub mod settings;

use example::ExampleSubcommands;
use settings::SettingsSubcommands;

/// The command line interface for the simulator.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run a simulation scenario.
    Run {
        /// Path to the scenario XML file.
        scenario_path: PathBuf,
        /// Directory for output files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Whether to overwrite an existing output directory
        #[arg(long)]
        overwrite: bool,
    },
    /// Manage example scenarios.
    Example {
        /// The available subcommands for managing example scenarios.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Manage program settings.
    Settings {
        /// The available subcommands for managing settings.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

/// Options for the `run` command which can also be set via the settings file
#[derive(Debug, Default)]
pub struct RunOpts {
    /// Directory for output files
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite an existing output directory
    pub overwrite: bool,
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ cyclus --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    execute_cli_command(cli.command)
}

fn execute_cli_command(command: Option<Commands>) -> Result<()> {
    let Some(command) = command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    match command {
        Commands::Run {
            scenario_path,
            output_dir,
            overwrite,
        } => {
            let opts = RunOpts {
                output_dir,
                overwrite,
            };
            handle_run_command(&scenario_path, &opts, None)?;
        }
        Commands::Example { subcommand } => subcommand.execute()?,
        Commands::Settings { subcommand } => subcommand.execute()?,
    }

    Ok(())
}

/// Handle the `run` command.
///
/// Program settings are loaded from the user's config dir unless supplied by the caller.
pub fn handle_run_command(
    scenario_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = match settings {
        Some(settings) => settings,
        None => Settings::load().context("Failed to load settings.")?,
    };

    // Create output folder
    let output_path = match &opts.output_dir {
        Some(p) => p.clone(),
        None => get_output_dir(scenario_path)?,
    };
    create_output_directory(&output_path, opts.overwrite || settings.overwrite)
        .context("Failed to create output directory.")?;

    // Initialise program logger
    log::init(Some(settings.log_level.as_str()), Some(output_path.as_path()))
        .context("Failed to initialise logging.")?;

    // Load the scenario to run
    let scenario = load_scenario(scenario_path).context("Failed to load scenario.")?;
    info!("Loaded scenario from {}", scenario_path.display());
    info!("Output data will be written to {}", output_path.display());

    // Run the simulation and record what happened
    let summary = crate::simulation::run(&scenario, &output_path)?;
    write_metadata(&output_path, scenario_path, &scenario, &summary)
        .context("Failed to write metadata.")?;

    Ok(())
}
