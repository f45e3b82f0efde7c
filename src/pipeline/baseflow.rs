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

//! Baseflow ratio of a subbasin computed from SWAT water yield components.
//!
//! The ratio of a month is `gwq / (surq + latq + gwq)`. SWAT writes
//! negative groundwater flow when there is none, such months count as
//! ratio `0`. Months without any flow have no ratio and are left out of
//! the average.

use super::series::TimeSeries;
use crate::{errors::ExtractError, Float};

pub const SURFACE_RUNOFF: &str = "surq";
pub const GROUNDWATER_FLOW: &str = "gwq";
pub const LATERAL_FLOW: &str = "latq";

/// Baseflow ratio of a single month, `None` when it is undefined.
pub fn baseflow_ratio(surq: Float, gwq: Float, latq: Float) -> Option<Float> {
    if gwq < 0.0 {
        return Some(0.0);
    }

    let total = surq + latq + gwq;

    if total == 0.0 {
        return None;
    }

    let ratio = gwq / total;

    if ratio.is_finite() {
        Some(ratio)
    } else {
        None
    }
}

/// Mean baseflow ratio over all months of the series which have one.
///
/// Returns [`ExtractError::InsufficientData`] when no month has a ratio,
/// which includes an empty series.
pub fn mean_baseflow_ratio(series: &TimeSeries) -> Result<Float, ExtractError> {
    let column = |name: &str| {
        series
            .column(name)
            .ok_or_else(|| ExtractError::InsufficientData(format!("baseflow ratio without {}", name)))
    };

    let surq = column(SURFACE_RUNOFF)?;
    let gwq = column(GROUNDWATER_FLOW)?;
    let latq = column(LATERAL_FLOW)?;

    let ratios: Vec<Float> = surq
        .iter()
        .zip(gwq)
        .zip(latq)
        .filter_map(|((s, g), l)| baseflow_ratio((*s)?, (*g)?, (*l)?))
        .collect();

    if ratios.is_empty() {
        return Err(ExtractError::InsufficientData(
            "baseflow ratio, no month in the window has flow".to_string(),
        ));
    }

    Ok(ratios.iter().sum::<Float>() / ratios.len() as Float)
}

#[cfg(test)]
mod tests {
    use super::{baseflow_ratio, mean_baseflow_ratio};
    use crate::{
        errors::ExtractError,
        pipeline::series::{Column, TimeSeries},
    };
    use chrono::NaiveDate;
    use float_cmp::approx_eq;

    fn components(rows: &[(f64, f64, f64)]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2003, 1, 31).unwrap();
        let dates = (0..rows.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        let column = |name: &str, pick: fn(&(f64, f64, f64)) -> f64| Column {
            name: name.to_string(),
            values: rows.iter().map(|r| Some(pick(r))).collect(),
        };

        TimeSeries::new(
            dates,
            vec![
                column("surq", |r| r.0),
                column("gwq", |r| r.1),
                column("latq", |r| r.2),
            ],
        )
    }

    #[test]
    fn negative_groundwater_is_zero() {
        assert_eq!(baseflow_ratio(10.0, -0.1, 5.0), Some(0.0));
        assert_eq!(baseflow_ratio(0.0, -5.0, 0.0), Some(0.0));
    }

    #[test]
    fn zero_flow_is_undefined() {
        assert_eq!(baseflow_ratio(0.0, 0.0, 0.0), None);
    }

    #[test]
    fn tiny_flow_still_has_ratio() {
        assert_eq!(baseflow_ratio(0.0, 1e-17, 0.0), Some(1.0));
        assert!(approx_eq!(f64, baseflow_ratio(1e-17, 1e-17, 0.0).unwrap(), 0.5));
    }

    #[test]
    fn regular_ratio() {
        assert!(approx_eq!(f64, baseflow_ratio(1.0, 2.0, 1.0).unwrap(), 0.5));
    }

    #[test]
    fn undefined_months_are_skipped() {
        let series = components(&[(0.0, 0.5, 0.5), (0.0, 0.0, 0.0), (1.0, -1.0, 1.0)]);
        let mean = mean_baseflow_ratio(&series).unwrap();

        assert!(approx_eq!(f64, mean, 0.25));
    }

    #[test]
    fn empty_window_is_an_error() {
        let series = components(&[]);

        assert!(matches!(
            mean_baseflow_ratio(&series),
            Err(ExtractError::InsufficientData(_))
        ));
    }

    #[test]
    fn only_dry_months_is_an_error() {
        let series = components(&[(0.0, 0.0, 0.0), (0.0, 0.0, 0.0)]);

        assert!(matches!(
            mean_baseflow_ratio(&series),
            Err(ExtractError::InsufficientData(_))
        ));
    }
}
