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

//! Writers of tab separated outputs read by PEST instruction files.

use super::{calendar::format_date, series::TimeSeries};
use crate::{errors::ExtractError, Float};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

/// Formats the value like C `%.7e`, e.g. `1.2345670e+01`.
pub fn format_scientific(value: Float) -> String {
    let formatted = format!("{:.7e}", value);

    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        // NaN and infinities
        None => formatted,
    }
}

/// `path` with `extension` appended to the full file name,
/// so `cha_066.txt` becomes `cha_066.txt.ins`.
pub fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn series_records(series: &TimeSeries, column: &str) -> Result<Vec<[String; 2]>, ExtractError> {
    let values = series
        .column(column)
        .ok_or_else(|| ExtractError::InsufficientData(format!("output of column {}", column)))?;

    Ok(series
        .dates()
        .iter()
        .zip(values)
        .map(|(date, value)| {
            [
                format_date(*date),
                value.map(format_scientific).unwrap_or_default(),
            ]
        })
        .collect())
}

/// Writes `<date>\t<value>` lines of one column, without header.
pub fn write_series(path: &Path, series: &TimeSeries, column: &str) -> Result<(), ExtractError> {
    let records = series_records(series, column)?;

    let mut out_file = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)?;

    for record in records {
        out_file.write_record(&record)?;
    }

    out_file.flush()?;

    Ok(())
}

/// Same as [`write_series`] but with a `date\t<column>` header line.
pub fn write_series_with_header(
    path: &Path,
    series: &TimeSeries,
    column: &str,
) -> Result<(), ExtractError> {
    let records = series_records(series, column)?;

    let mut out_file = csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?;

    out_file.write_record(&["date", column])?;

    for record in records {
        out_file.write_record(&record)?;
    }

    out_file.flush()?;

    Ok(())
}

/// Writes `<name>\t<value>` lines with values rounded to 4 decimals.
pub fn write_summary(path: &Path, rows: &[(String, Float)]) -> Result<(), ExtractError> {
    let mut out_file = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)?;

    for (name, value) in rows {
        out_file.write_record(&[name.clone(), format!("{:.4}", value)])?;
    }

    out_file.flush()?;

    Ok(())
}
