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

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Error while reading config.yaml: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while extracting data: {0}")]
    Extract(#[from] ExtractError),

    #[error("Error while launching PEST: {0}")]
    Launch(#[from] LaunchError),

    #[error("Cannot prepare output directory: {0}")]
    FaultyOutput(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open config.yaml: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize config.yaml: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds {0}")]
    OutOfBounds(&'static str),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Malformed file {} at line {line}: {reason}", path.display())]
    FileFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Key {key} not found in {}", path.display())]
    Alignment { key: String, path: PathBuf },

    #[error("Not enough data to compute {0}")]
    InsufficientData(String),

    #[error("Required file or directory {} not found", .0.display())]
    Precondition(PathBuf),

    #[error("Cannot parse date {0:?}, expected M/D/YYYY or YYYY-MM-DD")]
    DateParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delimited file error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Required directory {} not found", .0.display())]
    Precondition(PathBuf),

    #[error("Unable to provision worker dir {}: {source}", dir.display())]
    WorkerProvision {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}
