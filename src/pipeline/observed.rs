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

//! Readers for files which are not raw model output: observation
//! files, series previously written by this crate and the MODFLOW
//! observation grid reference.

use super::{
    calendar,
    series::{Column, TimeSeries},
    table::{load_columns, Delimiter},
};
use crate::{
    constants::{MF_OBS_COLUMNS, MF_OBS_SKIP_ROWS, MISSING_VALUE},
    errors::ExtractError,
    Float,
};
use float_cmp::approx_eq;
use log::debug;
use rustc_hash::FxHashMap;
use std::path::Path;

const DATE_COLUMN: &str = "date";

/// Reads the `date` column and the `column` of a tab separated
/// observation file with a header row.
///
/// Blank fields and `-999` are read as missing values.
pub fn read_observations(path: &Path, column: &str) -> Result<TimeSeries, ExtractError> {
    debug!("Reading observations {} from {}", column, path.display());

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ExtractError::Alignment {
                key: name.to_string(),
                path: path.to_path_buf(),
            })
    };

    let date_idx = position(DATE_COLUMN)?;
    let value_idx = position(column)?;

    let mut dates = vec![];
    let mut values = vec![];

    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        // header is the first line
        let line = idx + 2;

        let date = record.get(date_idx).unwrap_or("");
        if date.is_empty() {
            continue;
        }

        dates.push(calendar::parse_date(date)?);
        values.push(parse_observed(record.get(value_idx).unwrap_or("")).map_err(|reason| {
            ExtractError::FileFormat {
                path: path.to_path_buf(),
                line,
                reason,
            }
        })?);
    }

    Ok(TimeSeries::new(
        dates,
        vec![Column {
            name: column.to_string(),
            values,
        }],
    ))
}

fn parse_observed(field: &str) -> Result<Option<Float>, String> {
    if field.is_empty() || field == MISSING_VALUE {
        return Ok(None);
    }

    let value = field
        .parse::<Float>()
        .map_err(|_| format!("{:?} is not a number", field))?;

    if approx_eq!(Float, value, -999.0) || value.is_nan() {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

/// Reads a two column `<date> <value>` series, as written
/// by [`super::emitter::write_series`].
pub fn read_simulated_series(path: &Path, name: &str) -> Result<TimeSeries, ExtractError> {
    debug!("Reading simulated series from {}", path.display());

    let table = load_columns(path, &[0, 1], 0, &[DATE_COLUMN, name], Delimiter::Whitespace)?;

    let mut dates = Vec::with_capacity(table.len());
    let mut values = Vec::with_capacity(table.len());

    for row in table.rows() {
        dates.push(calendar::parse_date(&row.fields[0])?);
        values.push(Some(row.fields[1].parse::<Float>().map_err(|_| {
            ExtractError::FileFormat {
                path: path.to_path_buf(),
                line: row.line,
                reason: format!("{:?} is not a number", row.fields[1]),
            }
        })?));
    }

    Ok(TimeSeries::new(
        dates,
        vec![Column {
            name: name.to_string(),
            values,
        }],
    ))
}

/// Observation grid cells listed in `modflow.obs`.
///
/// `ids` keeps the file order, which is also the column
/// order of `swatmf_out_MF_obs`.
#[derive(Clone, PartialEq, Debug)]
pub struct GridReference {
    pub ids: Vec<String>,
    pub elevations: FxHashMap<String, Float>,
}

impl GridReference {
    /// Position of the grid id among the simulated columns.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|i| i == id)
    }
}

pub fn read_grid_reference(path: &Path) -> Result<GridReference, ExtractError> {
    debug!("Reading observation grid from {}", path.display());

    let table = load_columns(
        path,
        &MF_OBS_COLUMNS,
        MF_OBS_SKIP_ROWS,
        &["grid_id", "elevation"],
        Delimiter::Whitespace,
    )?;

    let mut ids = Vec::with_capacity(table.len());
    let mut elevations = FxHashMap::default();

    for row in table.rows() {
        let elevation = row.fields[1].parse::<Float>().map_err(|_| ExtractError::FileFormat {
            path: path.to_path_buf(),
            line: row.line,
            reason: format!("{:?} is not an elevation", row.fields[1]),
        })?;

        ids.push(row.key().to_string());
        elevations.insert(row.key().to_string(), elevation);
    }

    Ok(GridReference { ids, elevations })
}
