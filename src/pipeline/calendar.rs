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

//! Module with date parsing and generation of date indices.
//!
//! SWAT output files do not carry dates for each row, so the dates
//! are generated from the simulation start day and the output frequency.

use crate::errors::ExtractError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer};
use std::iter;

/// Accepted textual date layouts, `M/D/YYYY` is the one
/// used across SWAT projects.
const DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d"];

/// Step between consecutive rows of a model output.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Frequency {
    Daily,
    MonthEnd,
}

/// Parses a date in one of the [`DATE_FORMATS`].
///
/// Anything after the first whitespace (e.g. a `00:00:00` time part)
/// is ignored.
pub fn parse_date(text: &str) -> Result<NaiveDate, ExtractError> {
    let date_part = text.split_whitespace().next().unwrap_or("");

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
        .ok_or_else(|| ExtractError::DateParse(text.to_string()))
}

/// Date as written to output files.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Last day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

fn next_date(date: NaiveDate, frequency: Frequency) -> Option<NaiveDate> {
    match frequency {
        Frequency::Daily => date.succ_opt(),
        Frequency::MonthEnd => month_end(date.succ_opt()?),
    }
}

/// Generates `count` dates starting at `start`.
///
/// With [`Frequency::MonthEnd`] the first date is the end of the
/// month containing `start`, so `1/1/2003` gives `2003-01-31`.
pub fn date_index(start: NaiveDate, count: usize, frequency: Frequency) -> Vec<NaiveDate> {
    let first = match frequency {
        Frequency::Daily => Some(start),
        Frequency::MonthEnd => month_end(start),
    };

    iter::successors(first, |d| next_date(*d, frequency))
        .take(count)
        .collect()
}

pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_date(&text).map_err(serde::de::Error::custom)
}

pub fn deserialize_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?;

    match text {
        Some(text) => parse_date(&text)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::{date_index, month_end, parse_date, Frequency};
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_us_and_iso_dates() {
        assert_eq!(parse_date("1/1/2003").unwrap(), ymd(2003, 1, 1));
        assert_eq!(parse_date("12/31/2007").unwrap(), ymd(2007, 12, 31));
        assert_eq!(parse_date("2003-01-31").unwrap(), ymd(2003, 1, 31));
        assert_eq!(parse_date("2003-01-31 00:00:00").unwrap(), ymd(2003, 1, 31));
        assert!(parse_date("31.01.2003").is_err());
    }

    #[test]
    fn month_ends() {
        assert_eq!(month_end(ymd(2003, 1, 1)), Some(ymd(2003, 1, 31)));
        assert_eq!(month_end(ymd(2004, 2, 10)), Some(ymd(2004, 2, 29)));
        assert_eq!(month_end(ymd(2003, 12, 5)), Some(ymd(2003, 12, 31)));
    }

    #[test]
    fn month_end_index_crosses_years() {
        let dates = date_index(ymd(2003, 11, 1), 4, Frequency::MonthEnd);

        assert_eq!(
            dates,
            vec![
                ymd(2003, 11, 30),
                ymd(2003, 12, 31),
                ymd(2004, 1, 31),
                ymd(2004, 2, 29)
            ]
        );
    }

    #[test]
    fn daily_index_starts_at_start() {
        let dates = date_index(ymd(2000, 2, 28), 3, Frequency::Daily);

        assert_eq!(dates, vec![ymd(2000, 2, 28), ymd(2000, 2, 29), ymd(2000, 3, 1)]);
    }

    #[test]
    fn empty_index() {
        assert!(date_index(ymd(2000, 1, 1), 0, Frequency::Daily).is_empty());
    }
}
