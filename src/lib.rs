//! Common functionality for the cyclus fuel-cycle simulator.
#![warn(missing_docs)]

use dirs::config_dir;
use std::path::PathBuf;

pub mod agent;
pub mod cli;
pub mod commodity;
pub mod exchange;
pub mod id;
pub mod input;
pub mod log;
pub mod output;
pub mod resource;
pub mod settings;
pub mod simulation;

#[cfg(test)]
mod fixture;

/// Get config dir for program.
///
/// In the unlikely event this path cannot be retrieved, the CWD will be returned.
pub fn get_cyclus_config_dir() -> PathBuf {
    let Some(mut config_dir) = config_dir() else {
        return PathBuf::default();
    };

    config_dir.push("cyclus");
    config_dir
}
