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

//! PEST template files for SWAT (`model.in`) and SWAT-MODFLOW
//! river (`mf_riv.par`) parameter files.
//!
//! Every parameter line is rewritten so that its value is replaced by
//! a `~ name ~` slot PEST fills in before each model run.

use super::{
    emitter::append_extension,
    table::{load_columns, Delimiter},
};
use crate::{constants::TEMPLATE_HEADER, errors::ExtractError};
use log::info;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Width of the right aligned value fields.
const FIELD_WIDTH: usize = 20;

const RIVER_SKIP_ROWS: usize = 2;
const RIVER_COMMENT: &str = "# modflow_par template file.";
const RIVER_HEADER: &str = "NAME   CHG_TYPE    VAL";

/// A single parameter line of a parameter file.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ParameterEntry {
    pub name: String,
    pub change_type: Option<String>,
    /// Name placed inside the template slot.
    pub marker_name: String,
}

impl ParameterEntry {
    /// Template slot, ` ~   <marker name>   ~`.
    pub fn slot(&self) -> String {
        format!(" ~   {:<15}   ~", self.marker_name)
    }

    fn template_line(&self) -> String {
        match &self.change_type {
            Some(change_type) => format!(
                "{:>w$} {:>w$}{}",
                self.name,
                change_type,
                self.slot(),
                w = FIELD_WIDTH
            ),
            None => format!("{:>w$}{}", self.name, self.slot(), w = FIELD_WIDTH),
        }
    }
}

/// SWAT parameter names carry a 3 character change prefix (`v__`, `r__`)
/// and the extension of the file they live in (`.mgt`, `.gw`),
/// PEST sees the name in between.
pub fn swat_marker_name(name: &str) -> String {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);

    stem.chars().skip(3).collect()
}

fn write_template(
    path: &Path,
    preamble: &[&str],
    entries: &[ParameterEntry],
) -> Result<(), ExtractError> {
    let mut out_file = BufWriter::new(File::create(path)?);

    writeln!(out_file, "{}", TEMPLATE_HEADER)?;

    for line in preamble {
        writeln!(out_file, "{}", line)?;
    }

    for entry in entries {
        writeln!(out_file, "{}", entry.template_line())?;
    }

    out_file.flush()?;

    Ok(())
}

/// Writes a template of the SWAT `model.in` parameter file.
///
/// `tpl_file` defaults to `<model_in_file>.tpl`.
pub fn model_in_to_template_file(
    model_in_file: &Path,
    tpl_file: Option<&Path>,
) -> Result<(PathBuf, Vec<ParameterEntry>), ExtractError> {
    let table = load_columns(
        model_in_file,
        &[0, 1],
        0,
        &["parnme", "parval1"],
        Delimiter::Whitespace,
    )?;

    let entries: Vec<ParameterEntry> = table
        .rows()
        .iter()
        .map(|row| ParameterEntry {
            name: row.key().to_string(),
            change_type: None,
            marker_name: swat_marker_name(row.key()),
        })
        .collect();

    let tpl_file = tpl_file.map_or_else(|| append_extension(model_in_file, "tpl"), Path::to_path_buf);
    write_template(&tpl_file, &[], &entries)?;

    info!("{} file has been created...", tpl_file.display());

    Ok((tpl_file, entries))
}

/// Writes a template of the SWAT-MODFLOW river parameter file.
///
/// `tpl_file` defaults to `<riv_par_file>.tpl`.
pub fn riv_par_to_template_file(
    riv_par_file: &Path,
    tpl_file: Option<&Path>,
) -> Result<(PathBuf, Vec<ParameterEntry>), ExtractError> {
    let table = load_columns(
        riv_par_file,
        &[0, 1, 2],
        RIVER_SKIP_ROWS,
        &["parnme", "chg_type", "parval1"],
        Delimiter::Whitespace,
    )?;

    let entries: Vec<ParameterEntry> = table
        .rows()
        .iter()
        .map(|row| ParameterEntry {
            name: row.key().to_string(),
            change_type: Some(row.fields[1].clone()),
            marker_name: row.key().to_string(),
        })
        .collect();

    let tpl_file = tpl_file.map_or_else(|| append_extension(riv_par_file, "tpl"), Path::to_path_buf);
    write_template(&tpl_file, &[RIVER_COMMENT, RIVER_HEADER], &entries)?;

    info!("{} file has been created...", tpl_file.display());

    Ok((tpl_file, entries))
}
