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

//! Extraction of simulated values from SWAT and SWAT-MODFLOW outputs.
//!
//! Each function loads the output once and then, for every requested
//! reach, subbasin, channel or grid cell, filters its rows, dates
//! them, cuts the calibration window and writes the result into
//! `output_dir`. The first failing id stops the whole batch.

use super::{
    baseflow::{self, mean_baseflow_ratio},
    calendar::Frequency,
    emitter::{write_series, write_series_with_header, write_summary},
    observed::read_grid_reference,
    series::{align, Column, RowValidity, Selection, TimeSeries},
    table::{load_columns, Delimiter},
};
use crate::{
    constants::{
        CHANNEL_DAY_COLUMNS, CHANNEL_DAY_SKIP_ROWS, MF_SIM_SKIP_ROWS, RCH_COLUMNS, RCH_SKIP_ROWS,
        SUB_COLUMNS, SUB_SKIP_ROWS,
    },
    errors::ExtractError,
    Float,
};
use chrono::NaiveDate;
use log::{debug, info};
use std::path::{Path, PathBuf};

const FILTER_COLUMN: &str = "filter";
const STREAMFLOW_COLUMN: &str = "str_sim";
const CHANNEL_FLOW_COLUMN: &str = "flo_out";

pub const BASEFLOW_RATIO_FILE: &str = "baseflow_ratio.out";

/// Simulated monthly streamflow of each reach in `output.rch`,
/// written to `cha_<NNN>.txt`.
pub fn extract_month_str(
    rch_file: &Path,
    channels: &[u32],
    start_day: NaiveDate,
    cali_start_day: NaiveDate,
    cali_end_day: NaiveDate,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, ExtractError> {
    debug!("Reading reach output from {}", rch_file.display());

    let table = load_columns(
        rch_file,
        &RCH_COLUMNS,
        RCH_SKIP_ROWS,
        &["reach", FILTER_COLUMN, STREAMFLOW_COLUMN],
        Delimiter::Whitespace,
    )?;

    let mut written = Vec::with_capacity(channels.len());

    for &channel in channels {
        let key = channel.to_string();
        let series = align(
            &table,
            &Selection {
                key: Some(&key),
                filter: Some((FILTER_COLUMN, RowValidity::MonthIndex)),
                value_columns: &[STREAMFLOW_COLUMN],
                start: start_day,
                frequency: Frequency::MonthEnd,
            },
        )?
        .slice(cali_start_day, Some(cali_end_day));

        let out_path = output_dir.join(format!("cha_{:03}.txt", channel));
        write_series(&out_path, &series, STREAMFLOW_COLUMN)?;

        info!("cha_{:03}.txt file has been created...", channel);
        written.push(out_path);
    }

    info!("Finished ...");

    Ok(written)
}

/// Average monthly baseflow ratio of each subbasin in `output.sub`,
/// written together to `baseflow_ratio.out` as `bfr_<NNN>` rows.
pub fn extract_month_baseflow(
    sub_file: &Path,
    channels: &[u32],
    start_day: NaiveDate,
    cali_start_day: NaiveDate,
    cali_end_day: NaiveDate,
    output_dir: &Path,
) -> Result<Vec<(String, Float)>, ExtractError> {
    debug!("Reading subbasin output from {}", sub_file.display());

    let table = load_columns(
        sub_file,
        &SUB_COLUMNS,
        SUB_SKIP_ROWS,
        &[
            "subbasin",
            FILTER_COLUMN,
            baseflow::SURFACE_RUNOFF,
            baseflow::GROUNDWATER_FLOW,
            baseflow::LATERAL_FLOW,
        ],
        Delimiter::Whitespace,
    )?;

    let mut ratios = Vec::with_capacity(channels.len());

    for &channel in channels {
        let key = channel.to_string();
        let series = align(
            &table,
            &Selection {
                key: Some(&key),
                filter: Some((FILTER_COLUMN, RowValidity::TextWidth)),
                value_columns: &[
                    baseflow::SURFACE_RUNOFF,
                    baseflow::GROUNDWATER_FLOW,
                    baseflow::LATERAL_FLOW,
                ],
                start: start_day,
                frequency: Frequency::MonthEnd,
            },
        )?
        .slice(cali_start_day, Some(cali_end_day));

        let ratio = mean_baseflow_ratio(&series)?;
        ratios.push((format!("bfr_{:03}", channel), ratio));

        info!("Average baseflow rate for {:03} has been calculated ...", channel);
    }

    write_summary(&output_dir.join(BASEFLOW_RATIO_FILE), &ratios)?;

    info!("Finished ...");

    Ok(ratios)
}

/// Simulated water table of observation cells, relative to land surface,
/// written to `wt_<grid id>.txt`.
///
/// Cell elevations come from `mf_obs_file` (`modflow.obs`), simulated
/// heads from `mf_sim_file` (`swatmf_out_MF_obs`) which has one column per
/// cell in the `modflow.obs` order.
pub fn extract_watertable_sim(
    mf_obs_file: &Path,
    mf_sim_file: &Path,
    grid_ids: &[u32],
    start_day: NaiveDate,
    end_day: NaiveDate,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, ExtractError> {
    for required in [mf_sim_file, mf_obs_file] {
        if !required.is_file() {
            return Err(ExtractError::Precondition(required.to_path_buf()));
        }
    }

    let grid = read_grid_reference(mf_obs_file)?;

    let keys: Vec<String> = grid_ids.iter().map(u32::to_string).collect();
    let mut positions = Vec::with_capacity(keys.len());

    for key in &keys {
        let position = grid.position(key).ok_or_else(|| ExtractError::Alignment {
            key: key.clone(),
            path: mf_obs_file.to_path_buf(),
        })?;
        positions.push(position);
    }

    let names: Vec<&str> = keys.iter().map(String::as_str).collect();
    let table = load_columns(
        mf_sim_file,
        &positions,
        MF_SIM_SKIP_ROWS,
        &names,
        Delimiter::Whitespace,
    )?;

    let heads = align(
        &table,
        &Selection {
            key: None,
            filter: None,
            value_columns: &names,
            start: start_day,
            frequency: Frequency::Daily,
        },
    )?
    .slice(start_day, Some(end_day));

    let mut written = Vec::with_capacity(keys.len());

    for key in &keys {
        let elevation = grid
            .elevations
            .get(key.as_str())
            .copied()
            .ok_or_else(|| ExtractError::Alignment {
                key: key.clone(),
                path: mf_obs_file.to_path_buf(),
            })?;

        let depth = TimeSeries::new(
            heads.dates().to_vec(),
            vec![Column {
                name: key.clone(),
                values: heads
                    .column(key)
                    .unwrap_or_default()
                    .iter()
                    .map(|v| v.map(|head| head - elevation))
                    .collect(),
            }],
        );

        let out_path = output_dir.join(format!("wt_{}.txt", key));
        write_series(&out_path, &depth, key)?;

        info!("wt_{}.txt file has been created...", key);
        written.push(out_path);
    }

    info!("Finished ...");

    Ok(written)
}

/// Monthly average of the simulated daily flow of each channel in
/// `channel_day.txt`, written with a header to `cha_mon_avg_<NNN>.txt`.
///
/// The window starts at `cal_day` (or `start_day`) and is open
/// at the end unless `end_day` is given.
pub fn extract_month_avg(
    cha_file: &Path,
    channels: &[u32],
    start_day: NaiveDate,
    cal_day: Option<NaiveDate>,
    end_day: Option<NaiveDate>,
    output_dir: &Path,
) -> Result<Vec<TimeSeries>, ExtractError> {
    debug!("Reading channel output from {}", cha_file.display());

    let table = load_columns(
        cha_file,
        &CHANNEL_DAY_COLUMNS,
        CHANNEL_DAY_SKIP_ROWS,
        &["name", CHANNEL_FLOW_COLUMN],
        Delimiter::Whitespace,
    )?;

    let mut averages = Vec::with_capacity(channels.len());

    for &channel in channels {
        let key = format!("cha{:02}", channel);
        let monthly = align(
            &table,
            &Selection {
                key: Some(&key),
                filter: None,
                value_columns: &[CHANNEL_FLOW_COLUMN],
                start: start_day,
                frequency: Frequency::Daily,
            },
        )?
        .monthly_mean()
        .slice(cal_day.unwrap_or(start_day), end_day);

        let file_name = format!("cha_mon_avg_{:03}.txt", channel);
        write_series_with_header(&output_dir.join(&file_name), &monthly, CHANNEL_FLOW_COLUMN)?;

        info!("{} file has been created...", file_name);
        averages.push(monthly);
    }

    info!("Finished ...");

    Ok(averages)
}

#[cfg(test)]
mod tests {
    use super::{extract_month_avg, extract_month_str, extract_watertable_sim};
    use crate::errors::ExtractError;
    use chrono::NaiveDate;
    use float_cmp::approx_eq;
    use std::{fs, path::Path};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// `output.rch` with 9 preamble lines and three months plus an
    /// annual summary row for reaches 1 and 2.
    fn write_rch(dir: &Path) -> std::path::PathBuf {
        let mut content = String::new();
        for i in 0..9 {
            content.push_str(&format!("preamble line {}\n", i));
        }
        for (mon, flow) in [("1", 10.0), ("2", 20.0), ("3", 30.0), ("2003", 99.0)] {
            for reach in [1, 2] {
                content.push_str(&format!(
                    "REACH {} 0 {} 1.0 2.0 {:.3}\n",
                    reach,
                    mon,
                    flow + f64::from(reach)
                ));
            }
        }
        let path = dir.join("output.rch");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn monthly_streamflow() {
        let dir = tempfile::tempdir().unwrap();
        let rch = write_rch(dir.path());

        let written = extract_month_str(
            &rch,
            &[2],
            ymd(2003, 1, 1),
            ymd(2003, 2, 1),
            ymd(2003, 12, 31),
            dir.path(),
        )
        .unwrap();

        assert_eq!(written, vec![dir.path().join("cha_002.txt")]);
        assert_eq!(
            fs::read_to_string(&written[0]).unwrap(),
            "2003-02-28\t2.2000000e+01\n2003-03-31\t3.2000000e+01\n"
        );
    }

    #[test]
    fn unknown_reach_stops_batch() {
        let dir = tempfile::tempdir().unwrap();
        let rch = write_rch(dir.path());

        let result = extract_month_str(
            &rch,
            &[1, 7, 2],
            ymd(2003, 1, 1),
            ymd(2003, 1, 1),
            ymd(2003, 12, 31),
            dir.path(),
        );

        assert!(matches!(result, Err(ExtractError::Alignment { .. })));
        assert!(dir.path().join("cha_001.txt").exists());
        assert!(!dir.path().join("cha_002.txt").exists());
    }

    #[test]
    fn water_table_depth() {
        let dir = tempfile::tempdir().unwrap();
        let obs = dir.path().join("modflow.obs");
        let sim = dir.path().join("swatmf_out_MF_obs");
        fs::write(&obs, "# cells\n2\n1 5 5 5699 300.0\n1 6 7 5832 250.0\n").unwrap();
        fs::write(&sim, "5699 5832\n298.0 249.5\n297.5 249.0\n297.0 248.5\n").unwrap();

        let written = extract_watertable_sim(
            &obs,
            &sim,
            &[5832],
            ymd(2003, 1, 1),
            ymd(2003, 1, 2),
            dir.path(),
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(&written[0]).unwrap(),
            "2003-01-01\t-5.0000000e-01\n2003-01-02\t-1.0000000e+00\n"
        );
    }

    #[test]
    fn water_table_requires_inputs() {
        let dir = tempfile::tempdir().unwrap();

        let result = extract_watertable_sim(
            &dir.path().join("modflow.obs"),
            &dir.path().join("swatmf_out_MF_obs"),
            &[5832],
            ymd(2003, 1, 1),
            ymd(2003, 1, 2),
            dir.path(),
        );

        assert!(matches!(result, Err(ExtractError::Precondition(_))));
    }

    #[test]
    fn monthly_average_of_channel() {
        let dir = tempfile::tempdir().unwrap();
        let cha = dir.path().join("channel_day.txt");
        let mut content = String::from("channel_day\nheader\nunits\n");
        // 31 days of January and 3 days of February
        for day in 0..34 {
            for (name, flow) in [("cha01", 1.0), ("cha02", f64::from(day))] {
                content.push_str(&format!("1 1 2003 {} 1 {} {} x {}\n", day, day, name, flow));
            }
        }
        fs::write(&cha, content).unwrap();

        let averages = extract_month_avg(
            &cha,
            &[2],
            ymd(2003, 1, 1),
            None,
            None,
            dir.path(),
        )
        .unwrap();

        let values = averages[0].column("flo_out").unwrap();
        assert_eq!(averages[0].len(), 2);
        assert!(approx_eq!(f64, values[0].unwrap(), 15.0));
        assert!(approx_eq!(f64, values[1].unwrap(), 32.0));

        let content = fs::read_to_string(dir.path().join("cha_mon_avg_002.txt")).unwrap();
        assert!(content.starts_with("date\tflo_out\n2003-01-31\t1.5000000e+01\n"));
    }
}
