/*
Copyright 2021 Jakub Lewandowski

This file is part of SWAT-MODFLOW PEST Utilities (smpst).

SWAT-MODFLOW PEST Utilities (smpst) is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

SWAT-MODFLOW PEST Utilities (smpst) is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with SWAT-MODFLOW PEST Utilities (smpst). If not, see https://www.gnu.org/licenses/.
*/

//! Module responsible for parsing and checking the configuration file.
//!
//! To provide meaningful error messages. The configuration file uses
//! [YAML](https://en.wikipedia.org/wiki/YAML) and `serde` to enforce
//! strong typing and automatic type checking.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml` so you can check this documentation
//! for more details how to set the config file. Each entry of `tasks`
//! selects its kind with the `task` field, for example:
//!
//! ```yaml
//! output_dir: ./pest
//! tasks:
//!   - task: extract_month_baseflow
//!     file: ./TxtInOut/output.sub
//!     channels: [66, 68, 92, 147]
//!     start_day: 1/1/2003
//!     cali_start_day: 1/1/2003
//!     cali_end_day: 12/31/2007
//! ```
//!
//! Dates are given as `M/D/YYYY` or `YYYY-MM-DD`.

use super::calendar::{deserialize_date, deserialize_opt_date};
use crate::{
    constants::{DEFAULT_PORT, ENGINE_BINARY, MASTER_STARTUP_DELAY},
    errors::ConfigError,
    Float,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Extraction of monthly values for a list of reaches or subbasins
/// (`extract_month_str`, `extract_month_baseflow`).
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct ChannelExtraction {
    /// SWAT output file (`output.rch` or `output.sub`).
    pub file: PathBuf,

    /// Reach or subbasin numbers. Cannot be empty.
    pub channels: Vec<u32>,

    /// Simulation start day after the warm-up period,
    /// the date of the first row in the output file.
    #[serde(deserialize_with = "deserialize_date")]
    pub start_day: NaiveDate,

    /// First day of the calibration window.
    #[serde(deserialize_with = "deserialize_date")]
    pub cali_start_day: NaiveDate,

    /// Last day of the calibration window.
    #[serde(deserialize_with = "deserialize_date")]
    pub cali_end_day: NaiveDate,
}

impl ChannelExtraction {
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.channels.is_empty() {
            return Err(ConfigError::OutOfBounds("List of channels cannot be empty"));
        }

        if self.cali_end_day < self.cali_start_day {
            return Err(ConfigError::OutOfBounds(
                "Calibration end day cannot be before its start day",
            ));
        }

        Ok(())
    }
}

/// Extraction of simulated water table for MODFLOW observation cells
/// (`extract_watertable_sim`).
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct WatertableExtraction {
    /// _(Optional)_ Observation cells with land surface elevation.
    ///
    /// Defaults to `modflow.obs`.
    #[serde(default = "WatertableExtraction::default_obs_file")]
    pub obs_file: PathBuf,

    /// _(Optional)_ Simulated heads at observation cells.
    ///
    /// Defaults to `swatmf_out_MF_obs`.
    #[serde(default = "WatertableExtraction::default_sim_file")]
    pub sim_file: PathBuf,

    /// MODFLOW grid ids of observation cells. Cannot be empty.
    pub grid_ids: Vec<u32>,

    #[serde(deserialize_with = "deserialize_date")]
    pub start_day: NaiveDate,

    #[serde(deserialize_with = "deserialize_date")]
    pub end_day: NaiveDate,
}

impl WatertableExtraction {
    fn default_obs_file() -> PathBuf {
        PathBuf::from("modflow.obs")
    }

    fn default_sim_file() -> PathBuf {
        PathBuf::from("swatmf_out_MF_obs")
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.grid_ids.is_empty() {
            return Err(ConfigError::OutOfBounds("List of grid ids cannot be empty"));
        }

        if self.end_day < self.start_day {
            return Err(ConfigError::OutOfBounds("End day cannot be before start day"));
        }

        Ok(())
    }
}

/// Monthly averages of daily channel flow (`extract_month_avg`).
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct MonthAverageExtraction {
    /// SWAT+ `channel_day.txt` file.
    pub file: PathBuf,

    /// Channel numbers. Cannot be empty.
    pub channels: Vec<u32>,

    #[serde(deserialize_with = "deserialize_date")]
    pub start_day: NaiveDate,

    /// _(Optional)_ First day of the written window, defaults to `start_day`.
    #[serde(default, deserialize_with = "deserialize_opt_date")]
    pub cal_day: Option<NaiveDate>,

    /// _(Optional)_ Last day of the written window, defaults to the end of output.
    #[serde(default, deserialize_with = "deserialize_opt_date")]
    pub end_day: Option<NaiveDate>,
}

impl MonthAverageExtraction {
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.channels.is_empty() {
            return Err(ConfigError::OutOfBounds("List of channels cannot be empty"));
        }

        if let (Some(start), Some(end)) = (self.cal_day, self.end_day) {
            if end < start {
                return Err(ConfigError::OutOfBounds(
                    "End day cannot be before calibration day",
                ));
            }
        }

        Ok(())
    }
}

/// Instruction file for a simulated series (`str_obd_to_ins`, `mf_obd_to_ins`).
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct InstructionTask {
    /// Simulated series written by one of the extraction tasks.
    pub sim_file: PathBuf,

    /// Tab separated observation file (`streamflow.obd`, `modflow.obd`).
    pub obd_file: PathBuf,

    /// Observed column, also the observation name prefix.
    pub col_name: String,

    #[serde(deserialize_with = "deserialize_date")]
    pub start_day: NaiveDate,

    #[serde(deserialize_with = "deserialize_date")]
    pub end_day: NaiveDate,
}

impl InstructionTask {
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.col_name.trim().is_empty() {
            return Err(ConfigError::OutOfBounds("Column name cannot be empty"));
        }

        if self.end_day < self.start_day {
            return Err(ConfigError::OutOfBounds("End day cannot be before start day"));
        }

        Ok(())
    }
}

/// Template file for a parameter file
/// (`model_in_to_template_file`, `riv_par_to_template_file`).
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct TemplateTask {
    pub file: PathBuf,

    /// _(Optional)_ Written template, defaults to `<file>.tpl`.
    #[serde(default)]
    pub tpl_file: Option<PathBuf>,
}

/// BeoPEST master with local workers (`execute_beopest`).
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct BeopestMaster {
    /// Directory with the PEST control file and model files.
    pub master_dir: PathBuf,

    /// PEST control file name, relative to `master_dir`.
    pub pst: PathBuf,

    /// _(Optional)_ Number of workers. Defaults to the number of logical CPUs.
    #[serde(default)]
    pub num_workers: Option<usize>,

    /// _(Optional)_ Directory where `worker_<n>` directories are created.
    /// Relative paths are resolved against `master_dir`.
    ///
    /// Defaults to `..`, next to the master directory.
    #[serde(default = "default_worker_root")]
    pub worker_root: PathBuf,

    /// _(Optional)_ Master port. Defaults to `4005`.
    #[serde(default = "default_port")]
    pub port: u16,

    /// _(Optional)_ When `false` workers connect using `host`
    /// instead of `localhost`. Defaults to `true`.
    #[serde(default = "default_true")]
    pub local: bool,

    /// _(Optional)_ Host name announced to workers when `local` is `false`.
    #[serde(default)]
    pub host: Option<String>,

    /// _(Optional)_ Keep existing worker directories and only refresh
    /// the control file in them. Defaults to `false`.
    #[serde(default)]
    pub reuse_workers: bool,

    /// _(Optional)_ BeoPEST executable. Defaults to `beopest64`.
    #[serde(default = "default_engine")]
    pub engine: String,

    /// _(Optional)_ Seconds to wait for the master before starting workers.
    #[serde(default = "default_startup_delay")]
    pub startup_delay: Float,
}

impl BeopestMaster {
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.num_workers == Some(0) {
            return Err(ConfigError::OutOfBounds("Number of workers cannot be 0"));
        }

        if self.port == 0 {
            return Err(ConfigError::OutOfBounds("Port cannot be 0"));
        }

        if !self.local && self.host.is_none() {
            return Err(ConfigError::OutOfBounds(
                "Host name is required when workers are not local",
            ));
        }

        if !self.startup_delay.is_finite() || self.startup_delay < 0.0 {
            return Err(ConfigError::OutOfBounds(
                "Startup delay cannot be negative",
            ));
        }

        Ok(())
    }
}

/// BeoPEST workers connecting to a remote master (`execute_workers`).
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct BeopestWorkers {
    /// Template directory copied into each worker directory.
    pub worker_rep: PathBuf,

    /// PEST control file name, relative to `worker_rep`.
    pub pst: PathBuf,

    /// Host name of the master.
    pub host: String,

    /// _(Optional)_ Number of workers. Defaults to the number of logical CPUs.
    #[serde(default)]
    pub num_workers: Option<usize>,

    /// _(Optional)_ Index of the first worker directory. Defaults to `0`.
    #[serde(default)]
    pub start_id: usize,

    /// _(Optional)_ Directory where `worker_<n>` directories are created.
    /// Relative paths are resolved against `worker_rep`.
    #[serde(default = "default_worker_root")]
    pub worker_root: PathBuf,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub reuse_workers: bool,

    #[serde(default = "default_engine")]
    pub engine: String,
}

impl BeopestWorkers {
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.num_workers == Some(0) {
            return Err(ConfigError::OutOfBounds("Number of workers cannot be 0"));
        }

        if self.port == 0 {
            return Err(ConfigError::OutOfBounds("Port cannot be 0"));
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::OutOfBounds("Master host name cannot be empty"));
        }

        Ok(())
    }
}

fn default_worker_root() -> PathBuf {
    PathBuf::from("..")
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true() -> bool {
    true
}

fn default_engine() -> String {
    ENGINE_BINARY.to_string()
}

fn default_startup_delay() -> Float {
    MASTER_STARTUP_DELAY
}

/// Single unit of work, selected with the `task` field.
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Task {
    ExtractMonthStr(ChannelExtraction),
    ExtractMonthBaseflow(ChannelExtraction),
    ExtractWatertableSim(WatertableExtraction),
    ExtractMonthAvg(MonthAverageExtraction),
    StrObdToIns(InstructionTask),
    MfObdToIns(InstructionTask),
    ModelInToTemplateFile(TemplateTask),
    RivParToTemplateFile(TemplateTask),
    ExecuteBeopest(BeopestMaster),
    ExecuteWorkers(BeopestWorkers),
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::ExtractMonthStr(_) => "extract_month_str",
            Task::ExtractMonthBaseflow(_) => "extract_month_baseflow",
            Task::ExtractWatertableSim(_) => "extract_watertable_sim",
            Task::ExtractMonthAvg(_) => "extract_month_avg",
            Task::StrObdToIns(_) => "str_obd_to_ins",
            Task::MfObdToIns(_) => "mf_obd_to_ins",
            Task::ModelInToTemplateFile(_) => "model_in_to_template_file",
            Task::RivParToTemplateFile(_) => "riv_par_to_template_file",
            Task::ExecuteBeopest(_) => "execute_beopest",
            Task::ExecuteWorkers(_) => "execute_workers",
        }
    }

    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        match self {
            Task::ExtractMonthStr(t) | Task::ExtractMonthBaseflow(t) => t.check_bounds(),
            Task::ExtractWatertableSim(t) => t.check_bounds(),
            Task::ExtractMonthAvg(t) => t.check_bounds(),
            Task::StrObdToIns(t) | Task::MfObdToIns(t) => t.check_bounds(),
            Task::ModelInToTemplateFile(_) | Task::RivParToTemplateFile(_) => Ok(()),
            Task::ExecuteBeopest(t) => t.check_bounds(),
            Task::ExecuteWorkers(t) => t.check_bounds(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Config {
    /// _(Optional)_ Directory for extracted series and statistics.
    /// Created when missing. Defaults to the current directory.
    #[serde(default = "Config::default_output_dir")]
    pub output_dir: PathBuf,

    /// Tasks executed in the listed order.
    pub tasks: Vec<Task>,
}

impl Config {
    fn default_output_dir() -> PathBuf {
        PathBuf::from(".")
    }

    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        Config::new_from_slice(data.as_slice())
    }

    pub fn new_from_slice(data: &[u8]) -> Result<Config, ConfigError> {
        let config: Config = serde_yaml::from_slice(data)?;

        if config.tasks.is_empty() {
            return Err(ConfigError::OutOfBounds("At least one task is required"));
        }

        for task in &config.tasks {
            task.check_bounds()?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, Task};
    use crate::errors::ConfigError;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    const CONFIG: &str = r#"
output_dir: ./pest
tasks:
  - task: extract_month_baseflow
    file: ./TxtInOut/output.sub
    channels: [66, 68]
    start_day: 1/1/2003
    cali_start_day: 1/1/2003
    cali_end_day: 12/31/2007
  - task: extract_month_avg
    file: channel_day.txt
    channels: [1]
    start_day: 2003-01-01
  - task: riv_par_to_template_file
    file: mf_riv.par
  - task: execute_beopest
    master_dir: ./master
    pst: swat.pst
    num_workers: 4
"#;

    #[test]
    fn full_config() {
        let config = Config::new_from_slice(CONFIG.as_bytes()).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("./pest"));
        assert_eq!(config.tasks.len(), 4);

        match &config.tasks[0] {
            Task::ExtractMonthBaseflow(t) => {
                assert_eq!(t.channels, vec![66, 68]);
                assert_eq!(t.cali_end_day, NaiveDate::from_ymd_opt(2007, 12, 31).unwrap());
            }
            other => panic!("unexpected task {:?}", other),
        }

        match &config.tasks[1] {
            Task::ExtractMonthAvg(t) => {
                assert_eq!(t.cal_day, None);
                assert_eq!(t.end_day, None);
            }
            other => panic!("unexpected task {:?}", other),
        }

        match &config.tasks[3] {
            Task::ExecuteBeopest(t) => {
                assert_eq!(t.port, 4005);
                assert!(t.local);
                assert!(!t.reuse_workers);
                assert_eq!(t.engine, "beopest64");
                assert_eq!(t.worker_root, PathBuf::from(".."));
            }
            other => panic!("unexpected task {:?}", other),
        }
    }

    #[test]
    fn empty_channels_are_rejected() {
        let yaml = r#"
tasks:
  - task: extract_month_str
    file: output.rch
    channels: []
    start_day: 1/1/2003
    cali_start_day: 1/1/2003
    cali_end_day: 12/31/2007
"#;

        assert!(matches!(
            Config::new_from_slice(yaml.as_bytes()),
            Err(ConfigError::OutOfBounds(_))
        ));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let yaml = r#"
tasks:
  - task: str_obd_to_ins
    sim_file: cha_066.txt
    obd_file: streamflow.obd
    col_name: sub_66
    start_day: 1/1/2008
    end_day: 12/31/2007
"#;

        assert!(matches!(
            Config::new_from_slice(yaml.as_bytes()),
            Err(ConfigError::OutOfBounds(_))
        ));
    }

    #[test]
    fn bad_date_is_a_deserialization_error() {
        let yaml = r#"
tasks:
  - task: mf_obd_to_ins
    sim_file: wt_5699.txt
    obd_file: modflow.obd
    col_name: g5699
    start_day: 2003.01.01
    end_day: 12/31/2007
"#;

        assert!(matches!(
            Config::new_from_slice(yaml.as_bytes()),
            Err(ConfigError::CantDeserialize(_))
        ));
    }
}
