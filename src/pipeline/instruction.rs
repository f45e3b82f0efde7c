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

//! PEST instruction files for simulated series written by the extraction tasks.
//!
//! Each line of a simulated series file gets one instruction. Lines with
//! an observation read the value into an observation named after the
//! observed column and the date, lines without one are just skipped.

use super::{
    calendar::Frequency,
    emitter::append_extension,
    observed::{read_observations, read_simulated_series},
    series::TimeSeries,
};
use crate::{
    constants::{INSTRUCTION_HEADER, LINE_ADVANCE},
    errors::ExtractError,
    Float,
};
use chrono::{Datelike, NaiveDate};
use log::info;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

const SIMULATED_COLUMN: &str = "sim";

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum InstructionLine {
    /// No observation at this date, advance one line.
    Skip,
    /// Advance one line and read the second field into the named observation.
    Match(String),
}

impl fmt::Display for InstructionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstructionLine::Skip => write!(f, "{}", LINE_ADVANCE),
            InstructionLine::Match(marker) => write!(f, "{} w !{}!", LINE_ADVANCE, marker),
        }
    }
}

/// Observation name, `<name>_YYYYMM` or `<name>_YYYYMMDD` for daily series.
pub fn marker(name: &str, date: NaiveDate, frequency: Frequency) -> String {
    match frequency {
        Frequency::MonthEnd => format!("{}_{}{:02}", name, date.year(), date.month()),
        Frequency::Daily => format!(
            "{}_{}{:02}{:02}",
            name,
            date.year(),
            date.month(),
            date.day()
        ),
    }
}

/// One instruction per date bucket.
///
/// Buckets are every simulated date together with the observed dates
/// in `[start, end]`, in chronological order, so each line of the
/// simulated file gets its own instruction. Observations outside the
/// window are skipped. The observed series must have a `name` column.
pub fn build_instructions(
    simulated: &TimeSeries,
    observed: &TimeSeries,
    name: &str,
    start: NaiveDate,
    end: NaiveDate,
    frequency: Frequency,
) -> Vec<InstructionLine> {
    let observations: BTreeMap<NaiveDate, Option<Float>> = match observed.column(name) {
        Some(values) => observed
            .dates()
            .iter()
            .copied()
            .zip(values.iter().copied())
            .filter(|(d, _)| *d >= start && *d <= end)
            .collect(),
        None => BTreeMap::new(),
    };

    let buckets: BTreeSet<NaiveDate> = simulated
        .dates()
        .iter()
        .chain(observations.keys())
        .copied()
        .collect();

    buckets
        .into_iter()
        .map(|date| match observations.get(&date) {
            Some(Some(_)) => InstructionLine::Match(marker(name, date, frequency)),
            _ => InstructionLine::Skip,
        })
        .collect()
}

/// Writes the `pif ~` header followed by the instruction lines.
pub fn write_instruction_file(path: &Path, lines: &[InstructionLine]) -> Result<(), ExtractError> {
    let mut out_file = BufWriter::new(File::create(path)?);

    writeln!(out_file, "{}", INSTRUCTION_HEADER)?;

    for line in lines {
        writeln!(out_file, "{}", line)?;
    }

    out_file.flush()?;

    Ok(())
}

fn check_unique_dates(path: &Path, series: &TimeSeries) -> Result<(), ExtractError> {
    let mut seen = BTreeSet::new();

    for (idx, date) in series.dates().iter().enumerate() {
        if !seen.insert(*date) {
            return Err(ExtractError::FileFormat {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: format!("date {} repeats, observation names would collide", date),
            });
        }
    }

    Ok(())
}

/// Writes `<sim_file>.ins` for the simulated series `sim_file`
/// observed in column `col_name` of `obd_file`.
pub fn obd_to_ins(
    sim_file: &Path,
    obd_file: &Path,
    col_name: &str,
    start: NaiveDate,
    end: NaiveDate,
    frequency: Frequency,
) -> Result<(PathBuf, Vec<InstructionLine>), ExtractError> {
    let observed = read_observations(obd_file, col_name)?.slice(start, Some(end));
    let simulated = read_simulated_series(sim_file, SIMULATED_COLUMN)?;

    check_unique_dates(sim_file, &simulated)?;

    let lines = build_instructions(&simulated, &observed, col_name, start, end, frequency);

    let ins_file = append_extension(sim_file, "ins");
    write_instruction_file(&ins_file, &lines)?;

    info!("{} file has been created...", ins_file.display());

    Ok((ins_file, lines))
}

/// Instruction file for a monthly streamflow series.
pub fn str_obd_to_ins(
    sim_file: &Path,
    obd_file: &Path,
    col_name: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(PathBuf, Vec<InstructionLine>), ExtractError> {
    obd_to_ins(sim_file, obd_file, col_name, start, end, Frequency::MonthEnd)
}

/// Instruction file for a daily water table series.
pub fn mf_obd_to_ins(
    sim_file: &Path,
    obd_file: &Path,
    col_name: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(PathBuf, Vec<InstructionLine>), ExtractError> {
    obd_to_ins(sim_file, obd_file, col_name, start, end, Frequency::Daily)
}

#[cfg(test)]
mod tests {
    use super::{build_instructions, marker, mf_obd_to_ins, str_obd_to_ins, InstructionLine};
    use crate::{
        errors::ExtractError,
        pipeline::{
            calendar::{date_index, Frequency},
            series::{Column, TimeSeries},
        },
    };
    use chrono::NaiveDate;
    use std::fs;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(name: &str, dates: Vec<NaiveDate>, values: Vec<Option<f64>>) -> TimeSeries {
        TimeSeries::new(
            dates,
            vec![Column {
                name: name.to_string(),
                values,
            }],
        )
    }

    #[test]
    fn markers() {
        assert_eq!(marker("sub_66", ymd(2003, 2, 28), Frequency::MonthEnd), "sub_66_200302");
        assert_eq!(marker("g5699", ymd(2003, 2, 8), Frequency::Daily), "g5699_20030208");
    }

    #[test]
    fn line_rendering() {
        assert_eq!(InstructionLine::Skip.to_string(), "l1");
        assert_eq!(
            InstructionLine::Match("sub_66_200301".to_string()).to_string(),
            "l1 w !sub_66_200301!"
        );
    }

    #[test]
    fn one_line_per_bucket() {
        let dates = date_index(ymd(2003, 1, 1), 6, Frequency::MonthEnd);
        let simulated = series("sim", dates.clone(), vec![Some(1.0); 6]);
        let observed = series(
            "sub_66",
            dates[..4].to_vec(),
            vec![Some(1.0), None, Some(2.0), Some(3.0)],
        );

        let lines = build_instructions(
            &simulated,
            &observed,
            "sub_66",
            ymd(2003, 1, 1),
            ymd(2003, 5, 31),
            Frequency::MonthEnd,
        );

        // June is past the window but still a line of the simulated file
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], InstructionLine::Skip);
        assert_eq!(lines[4], InstructionLine::Skip);
        assert_eq!(lines[5], InstructionLine::Skip);
        assert_eq!(lines[3], InstructionLine::Match("sub_66_200304".to_string()));
    }

    #[test]
    fn simulated_lines_before_window_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let sim_file = dir.path().join("cha_066.txt");
        let obd_file = dir.path().join("streamflow.obd");
        fs::write(
            &sim_file,
            "2002-12-31\t1.0000000e+00\n2003-01-31\t2.0000000e+00\n2003-02-28\t3.0000000e+00\n",
        )
        .unwrap();
        fs::write(
            &obd_file,
            "date\tsub_66\n12/31/2002\t0.9\n1/31/2003\t2.1\n2/28/2003\t2.9\n",
        )
        .unwrap();

        let (ins_file, lines) =
            str_obd_to_ins(&sim_file, &obd_file, "sub_66", ymd(2003, 1, 1), ymd(2003, 12, 31))
                .unwrap();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            fs::read_to_string(ins_file).unwrap(),
            "pif ~\nl1\nl1 w !sub_66_200301!\nl1 w !sub_66_200302!\n"
        );
    }

    #[test]
    fn daily_instruction_file() {
        let dir = tempfile::tempdir().unwrap();
        let sim_file = dir.path().join("wt_5699.txt");
        let obd_file = dir.path().join("modflow.obd");
        fs::write(
            &sim_file,
            "2003-01-01\t-1.0000000e+00\n2003-01-02\t-2.0000000e+00\n2003-01-03\t-3.0000000e+00\n",
        )
        .unwrap();
        fs::write(&obd_file, "date\tg5699\n1/1/2003\t-1.1\n1/2/2003\t\n1/3/2003\t-2.9\n").unwrap();

        let (ins_file, lines) =
            mf_obd_to_ins(&sim_file, &obd_file, "g5699", ymd(2003, 1, 1), ymd(2003, 1, 3))
                .unwrap();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            fs::read_to_string(ins_file).unwrap(),
            "pif ~\nl1 w !g5699_20030101!\nl1\nl1 w !g5699_20030103!\n"
        );
    }

    #[test]
    fn repeated_simulated_dates_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sim_file = dir.path().join("wt_5699.txt");
        let obd_file = dir.path().join("modflow.obd");
        fs::write(&sim_file, "2003-01-01\t1.0\n2003-01-01\t2.0\n").unwrap();
        fs::write(&obd_file, "date\tg5699\n1/1/2003\t1.0\n").unwrap();

        let result = mf_obd_to_ins(&sim_file, &obd_file, "g5699", ymd(2003, 1, 1), ymd(2003, 1, 3));

        assert!(matches!(result, Err(ExtractError::FileFormat { line: 2, .. })));
    }
}
