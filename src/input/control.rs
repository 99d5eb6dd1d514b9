//! Code for reading the `control` block.
use anyhow::{Result, ensure};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;

/// When isotopic decay would be applied to stored materials.
///
/// The mode is carried through from the input; composition decay itself is not simulated.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, DeserializeLabeledStringEnum)]
pub enum DecayMode {
    /// Compositions are never decayed
    #[default]
    #[string = "never"]
    Never,
    /// Decay is applied only on explicit request
    #[string = "manual"]
    Manual,
    /// Decay is applied when a composition is next observed
    #[string = "lazy"]
    Lazy,
}

/// The raw contents of the `control` block
#[derive(Debug, Deserialize, PartialEq)]
pub struct ControlDoc {
    duration: u32,
    startmonth: u32,
    startyear: i32,
    #[serde(default)]
    simhandle: Option<String>,
    #[serde(default)]
    decay: Option<DecayMode>,
}

/// Timing and bookkeeping parameters for a simulation
#[derive(Debug, PartialEq)]
pub struct SimInfo {
    /// Number of timesteps to run
    pub duration: u32,
    /// Calendar month of the first timestep (1-12)
    pub start_month: u32,
    /// Calendar year of the first timestep
    pub start_year: i32,
    /// Caller-supplied label for the run
    pub handle: Option<String>,
    /// When decay would be applied to stored materials
    pub decay: DecayMode,
}

impl SimInfo {
    /// The calendar position of timestep `time`, e.g. "2030-04"
    pub fn calendar(&self, time: u32) -> String {
        let months = self.start_month - 1 + time;
        let year = self.start_year + i32::try_from(months / 12).expect("timestep out of range");
        let month = months % 12 + 1;
        format!("{year}-{month:02}")
    }
}

/// Validate the `control` block
pub fn convert_control(doc: ControlDoc) -> Result<SimInfo> {
    ensure!(doc.duration >= 1, "`duration` must be at least one timestep");
    ensure!(
        (1..=12).contains(&doc.startmonth),
        "`startmonth` must be between 1 and 12"
    );

    Ok(SimInfo {
        duration: doc.duration,
        start_month: doc.startmonth,
        start_year: doc.startyear,
        handle: doc.simhandle,
        decay: doc.decay.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(duration: u32, startmonth: u32) -> ControlDoc {
        ControlDoc {
            duration,
            startmonth,
            startyear: 2030,
            simhandle: None,
            decay: None,
        }
    }

    #[test]
    fn test_convert_control() {
        let info = convert_control(control(12, 4)).unwrap();
        assert_eq!(info.duration, 12);
        assert_eq!(info.decay, DecayMode::Never);

        assert!(convert_control(control(0, 4)).is_err());
        assert!(convert_control(control(12, 0)).is_err());
        assert!(convert_control(control(12, 13)).is_err());
    }

    #[test]
    fn test_parse_control_block() {
        let info = convert_control(
            quick_xml::de::from_str(
                "<control>
                    <duration>24</duration>
                    <startmonth>11</startmonth>
                    <startyear>2030</startyear>
                    <simhandle>demo</simhandle>
                    <decay>lazy</decay>
                </control>",
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(info.duration, 24);
        assert_eq!(info.handle.as_deref(), Some("demo"));
        assert_eq!(info.decay, DecayMode::Lazy);
    }

    #[test]
    fn test_calendar() {
        let info = convert_control(control(36, 11)).unwrap();
        assert_eq!(info.calendar(0), "2030-11");
        assert_eq!(info.calendar(1), "2030-12");
        assert_eq!(info.calendar(2), "2031-01");
        assert_eq!(info.calendar(14), "2032-01");
    }
}
