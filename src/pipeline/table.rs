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

//! Module responsible for reading delimited model output files
//! into a simple table of named text columns.
//!
//! SWAT writes its outputs with a fixed preamble followed by
//! whitespace separated fields. Only the fields needed by a task are
//! kept, and the first of them becomes the row key (reach id,
//! subbasin id, channel name, ...). Fields stay as text until the
//! aligner decides how to interpret them.

use crate::errors::ExtractError;
use float_cmp::approx_eq;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

/// How fields in a line are separated.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Delimiter {
    /// Any run of spaces or tabs.
    Whitespace,
    /// A single character, every occurrence splits a field.
    Char(char),
}

impl Delimiter {
    fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Delimiter::Whitespace => line.split_whitespace().collect(),
            Delimiter::Char(c) => line.split(*c).map(str::trim).collect(),
        }
    }
}

/// A single data row with its 1-based line number in the source file.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Row {
    pub line: usize,
    pub fields: Vec<String>,
}

impl Row {
    /// Value of the first selected column.
    pub fn key(&self) -> &str {
        &self.fields[0]
    }
}

/// Selected columns of a delimited file.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Table {
    path: PathBuf,
    names: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the named column inside each [`Row`].
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Returns all rows with the requested key, in file order.
    ///
    /// Keys which look like numbers are compared by value, so that
    /// channel `66` matches the `66` as well as `66.0` in the file.
    pub fn rows_with_key(&self, key: &str) -> Result<Vec<&Row>, ExtractError> {
        let selected: Vec<&Row> = self
            .rows
            .iter()
            .filter(|row| keys_match(row.key(), key))
            .collect();

        if selected.is_empty() {
            return Err(ExtractError::Alignment {
                key: key.to_string(),
                path: self.path.clone(),
            });
        }

        Ok(selected)
    }
}

fn keys_match(field: &str, key: &str) -> bool {
    if field == key {
        return true;
    }

    match (field.parse::<f64>(), key.parse::<f64>()) {
        (Ok(a), Ok(b)) => approx_eq!(f64, a, b),
        _ => false,
    }
}

/// Reads the columns at `columns` (zero-based) from `path`, skipping
/// `skip_rows` preamble lines, and names them with `names`.
///
/// Blank lines after the preamble are ignored. A file shorter than its
/// preamble or a row without enough fields is a [`ExtractError::FileFormat`].
pub fn load_columns(
    path: &Path,
    columns: &[usize],
    skip_rows: usize,
    names: &[&str],
    delimiter: Delimiter,
) -> Result<Table, ExtractError> {
    debug_assert_eq!(columns.len(), names.len());

    let reader = BufReader::new(File::open(path)?);
    let required_fields = columns.iter().max().map_or(0, |c| c + 1);

    let mut rows = vec![];
    let mut lines_read = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        lines_read += 1;

        if idx < skip_rows || line.trim().is_empty() {
            continue;
        }

        let fields = delimiter.split(&line);

        if fields.len() < required_fields {
            return Err(ExtractError::FileFormat {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: format!(
                    "expected at least {} fields, found {}",
                    required_fields,
                    fields.len()
                ),
            });
        }

        rows.push(Row {
            line: idx + 1,
            fields: columns.iter().map(|&c| fields[c].to_string()).collect(),
        });
    }

    if lines_read < skip_rows {
        return Err(ExtractError::FileFormat {
            path: path.to_path_buf(),
            line: lines_read,
            reason: format!(
                "file has {} lines but {} header lines are expected",
                lines_read, skip_rows
            ),
        });
    }

    Ok(Table {
        path: path.to_path_buf(),
        names: names.iter().map(|n| n.to_string()).collect(),
        rows,
    })
}
