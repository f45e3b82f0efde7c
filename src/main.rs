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

//! SWAT-MODFLOW PEST Utilities (smpst) is a set of helpers
//! sitting between the SWAT / SWAT-MODFLOW hydrological model
//! and the PEST parameter estimation suite.
//!
//! It extracts simulated streamflow, baseflow ratios and water table
//! depths from model output files, writes PEST instruction and template
//! files, and prepares and launches BeoPEST master and worker processes.
//!
//! All work is described in `config.yaml` as a list of tasks
//! which are executed in order.

mod constants;
mod errors;
mod launcher;
mod pipeline;


use env_logger::Env;
use log::{error, info};

type Float = f64;

/// The main program function.
/// Prepares the runtime environment and calls the [`pipeline::main`].
///
/// To provide meaningful and high-quality error messages the `env_logger`
/// needs to be initiated before any log messages are possible to occur.
fn main() {
    #[cfg(not(feature = "debug"))]
    let logger_env = Env::new().filter_or("SMPST_LOG_LEVEL", "info");

    #[cfg(feature = "debug")]
    let logger_env = Env::new().filter_or("SMPST_LOG_LEVEL", "debug");

    env_logger::Builder::from_env(logger_env)
        .format_timestamp_millis()
        .init();

    match pipeline::main() {
        Ok(_) => info!("All tasks finished. Check the output directory and log."),
        Err(err) => {
            error!("Task execution failed with error: {}", err);
            std::process::exit(1);
        }
    }
}
