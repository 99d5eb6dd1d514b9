//! The module responsible for writing output data to disk.
use crate::agent::AgentID;
use crate::commodity::CommodityID;
use crate::exchange::Trade;
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which scenario-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "cyclus_results";

/// The output file name for the trade log
const TRADES_FILE_NAME: &str = "trades.csv";

/// The default output directory for the scenario at `scenario_path`
pub fn get_output_dir(scenario_path: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified something like "."
    let scenario_path = scenario_path
        .canonicalize()
        .context("Could not resolve path to scenario")?;
    let name = scenario_path
        .file_stem()
        .context("Scenario cannot be a root folder")?
        .to_str()
        .context("Invalid chars in scenario file name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, name].iter().collect())
}

/// Create a new output directory at `output_path`.
///
/// An existing directory is only reused when `overwrite` is set.
pub fn create_output_directory(output_path: &Path, overwrite: bool) -> Result<()> {
    ensure!(
        overwrite || !output_path.is_dir(),
        "Output directory {} already exists (pass --overwrite to reuse it)",
        output_path.display()
    );

    fs::create_dir_all(output_path)?;
    Ok(())
}

/// One row of the trade log
#[derive(Serialize)]
struct TradeRow<'a> {
    time: u32,
    requester: &'a AgentID,
    bidder: &'a AgentID,
    commodity: &'a CommodityID,
    qty: f64,
}

/// Writes simulation results to the output directory as they are produced
pub struct DataWriter {
    trades: csv::Writer<fs::File>,
}

impl DataWriter {
    /// Open the output files under `output_path`
    pub fn create(output_path: &Path) -> Result<Self> {
        let file_path = output_path.join(TRADES_FILE_NAME);
        let trades = csv::Writer::from_path(&file_path)
            .with_context(|| format!("Could not create {}", file_path.display()))?;
        Ok(Self { trades })
    }

    /// Append the trades committed at timestep `time` to the trade log
    pub fn write_trades(&mut self, time: u32, trades: &[Trade]) -> Result<()> {
        for trade in trades {
            self.trades.serialize(TradeRow {
                time,
                requester: &trade.requester,
                bidder: &trade.bidder,
                commodity: &trade.commodity,
                qty: trade.qty,
            })?;
        }

        Ok(())
    }

    /// Flush the output files
    pub fn flush(&mut self) -> Result<()> {
        self.trades.flush()?;
        Ok(())
    }
}
