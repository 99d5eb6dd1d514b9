//! A per-run record written next to the other output files.
//!
//! `metadata.toml` captures what was run (scenario, handle, agent count), what came out of
//! it (trade totals from the run summary) and which build of the simulator produced it, so
//! a results directory stays interpretable after the scenario file has moved on.
use crate::input::Scenario;
use crate::simulation::RunSummary;
use anyhow::Result;
use chrono::Local;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Information about the program build via `built` crate
mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunMetadata<'a>,
    build: BuildMetadata,
    host: HostMetadata,
}

/// What was run and what came out of it
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the scenario which was run
    scenario_path: &'a Path,
    /// The scenario's `simhandle`, if one was declared
    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<&'a str>,
    /// When the run finished
    finished: String,
    /// Number of timesteps simulated
    timesteps: u32,
    /// Number of agents instantiated
    agents: usize,
    /// Number of trades committed over the whole run
    trades_matched: usize,
    /// Total quantity moved over the whole run
    quantity_traded: f64,
}

impl<'a> RunMetadata<'a> {
    fn collect(scenario_path: &'a Path, scenario: &'a Scenario, summary: &RunSummary) -> Self {
        Self {
            scenario_path,
            handle: scenario.info.handle.as_deref(),
            finished: Local::now().to_rfc2822(),
            timesteps: scenario.info.duration,
            agents: scenario.agents.len(),
            trades_matched: summary.trades_matched,
            quantity_traded: summary.quantity_traded,
        }
    }
}

/// Which build of the simulator produced the results
#[derive(Serialize)]
struct BuildMetadata {
    /// The program version as specified in Cargo.toml
    version: &'static str,
    /// The target architecture for the build (e.g. x86_64-unknown-linux-gnu)
    target: &'static str,
    /// The version of rustc used for compilation
    rustc: &'static str,
    /// When the binary was built
    built_at: &'static str,
    /// The git commit the binary was built from, if known
    commit: String,
}

impl BuildMetadata {
    fn collect() -> Self {
        let commit = match (built_info::GIT_COMMIT_HASH_SHORT, built_info::GIT_DIRTY) {
            (Some(hash), Some(true)) => format!("{hash}-dirty"),
            (Some(hash), _) => hash.into(),
            (None, _) => "unknown".into(),
        };

        Self {
            version: built_info::PKG_VERSION,
            target: built_info::TARGET,
            rustc: built_info::RUSTC_VERSION,
            built_at: built_info::BUILT_TIME_UTC,
            commit,
        }
    }
}

/// The machine the run happened on
#[derive(Serialize)]
struct HostMetadata {
    system: String,
    release: String,
    machine: String,
}

impl HostMetadata {
    fn collect() -> Self {
        let info = PlatformInfo::new().expect("Unable to determine platform info");
        Self {
            system: info.sysname().to_string_lossy().into(),
            release: info.release().to_string_lossy().into(),
            machine: info.machine().to_string_lossy().into(),
        }
    }
}

/// Write the run record for a finished simulation to `output_path`
pub fn write_metadata(
    output_path: &Path,
    scenario_path: &Path,
    scenario: &Scenario,
    summary: &RunSummary,
) -> Result<()> {
    let metadata = Metadata {
        run: RunMetadata::collect(scenario_path, scenario, summary),
        build: BuildMetadata::collect(),
        host: HostMetadata::collect(),
    };
    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)?;

    Ok(())
}
