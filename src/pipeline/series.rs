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

//! Module containing the date indexed series used by all extraction
//! tasks and the steps turning a loaded [`Table`] into one.
//!
//! The row filter selects rows of one reach/subbasin/channel, drops
//! summary rows and assigns generated dates. The slicer then cuts the
//! warm-up period off and the optional monthly resampling averages
//! daily outputs.

use super::{
    calendar::{self, Frequency},
    table::{Row, Table},
};
use crate::{constants::FILTER_LIMIT, errors::ExtractError, Float};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Named column of values, `None` marks a missing value.
#[derive(Clone, PartialEq, Debug)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<Float>>,
}

/// Ordered dates with one or more value columns of the same length.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl TimeSeries {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<Column>) -> Self {
        debug_assert!(columns.iter().all(|c| c.values.len() == dates.len()));

        TimeSeries { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[Option<Float>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Returns rows with dates inside the inclusive `[start, end]` window.
    ///
    /// Without `end` the window is open to the end of the series.
    /// A window not overlapping the series gives an empty series.
    pub fn slice(&self, start: NaiveDate, end: Option<NaiveDate>) -> TimeSeries {
        let in_window = |d: &NaiveDate| *d >= start && end.map_or(true, |e| *d <= e);

        let keep: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| in_window(*d))
            .map(|(i, _)| i)
            .collect();

        self.select(&keep)
    }

    /// Averages values within each calendar month, dated at the month end.
    ///
    /// Missing values are skipped, a month with no values stays missing.
    pub fn monthly_mean(&self) -> TimeSeries {
        let mut buckets: BTreeMap<(i32, u32), Vec<usize>> = BTreeMap::new();

        for (i, date) in self.dates.iter().enumerate() {
            buckets
                .entry((date.year(), date.month()))
                .or_default()
                .push(i);
        }

        let dates = buckets
            .values()
            .filter_map(|rows| calendar::month_end(self.dates[rows[0]]))
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                name: column.name.clone(),
                values: buckets
                    .values()
                    .map(|rows| mean(rows.iter().filter_map(|&r| column.values[r])))
                    .collect(),
            })
            .collect();

        TimeSeries::new(dates, columns)
    }

    fn select(&self, rows: &[usize]) -> TimeSeries {
        TimeSeries {
            dates: rows.iter().map(|&r| self.dates[r]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: rows.iter().map(|&r| c.values[r]).collect(),
                })
                .collect(),
        }
    }
}

fn mean(values: impl Iterator<Item = Float>) -> Option<Float> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as Float)
    }
}

/// Rule deciding whether a row holds regular data
/// judging by its filter field.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RowValidity {
    /// Field text is shorter than [`FILTER_LIMIT`] characters.
    TextWidth,
    /// Field is a number smaller than [`FILTER_LIMIT`], i.e. a month.
    MonthIndex,
}

impl RowValidity {
    pub fn accepts(&self, field: &str) -> bool {
        match self {
            RowValidity::TextWidth => field.chars().count() < FILTER_LIMIT,
            RowValidity::MonthIndex => field
                .parse::<Float>()
                .map_or(false, |v| v < FILTER_LIMIT as Float),
        }
    }
}

/// Which rows and columns of a [`Table`] form the series
/// and how to date them.
#[derive(Clone, PartialEq, Debug)]
pub struct Selection<'a> {
    /// Keep only rows with this key. `None` keeps all rows.
    pub key: Option<&'a str>,
    /// Column checked with the validity rule, dropped from the result.
    pub filter: Option<(&'a str, RowValidity)>,
    pub value_columns: &'a [&'a str],
    pub start: NaiveDate,
    pub frequency: Frequency,
}

/// Builds a date indexed series from table rows.
///
/// Dates are generated from `selection.start`, one per surviving row,
/// so the index length always equals the row count. No surviving rows
/// give an empty series.
pub fn align(table: &Table, selection: &Selection) -> Result<TimeSeries, ExtractError> {
    let rows = match selection.key {
        Some(key) => table.rows_with_key(key)?,
        None => table.rows().iter().collect(),
    };

    let column_index = |name: &str| {
        table
            .column_index(name)
            .ok_or_else(|| ExtractError::Alignment {
                key: name.to_string(),
                path: table.path().to_path_buf(),
            })
    };

    let rows: Vec<&Row> = match selection.filter {
        Some((name, validity)) => {
            let idx = column_index(name)?;
            rows.into_iter()
                .filter(|row| validity.accepts(&row.fields[idx]))
                .collect()
        }
        None => rows,
    };

    let mut columns = Vec::with_capacity(selection.value_columns.len());

    for &name in selection.value_columns {
        let idx = column_index(name)?;
        let mut values = Vec::with_capacity(rows.len());

        for row in &rows {
            let value = row.fields[idx]
                .parse::<Float>()
                .map_err(|_| ExtractError::FileFormat {
                    path: table.path().to_path_buf(),
                    line: row.line,
                    reason: format!("{:?} in column {} is not a number", row.fields[idx], name),
                })?;
            values.push(Some(value));
        }

        columns.push(Column {
            name: name.to_string(),
            values,
        });
    }

    let dates = calendar::date_index(selection.start, rows.len(), selection.frequency);

    if dates.len() != rows.len() {
        return Err(ExtractError::FileFormat {
            path: table.path().to_path_buf(),
            line: 0,
            reason: "date index does not cover all rows".to_string(),
        });
    }

    Ok(TimeSeries::new(dates, columns))
}
