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

//! Module responsible for executing the configured tasks.
//!
//! Model output is read into [`table::Table`]s, aligned with calendar
//! dates into [`series::TimeSeries`] and written back as plain text files
//! for PEST. Tasks run one after another and the first failing task
//! stops the whole batch.

pub mod baseflow;
pub mod calendar;
pub mod configuration;
pub mod emitter;
pub mod extract;
pub mod instruction;
pub mod observed;
pub mod series;
pub mod table;
pub mod template;

use self::configuration::{Config, Task};
use crate::{errors::RunError, launcher};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use std::{fs, path::Path};

const CONFIG_FILE: &str = "config.yaml";

/// Main pipeline function, reads the configuration from
/// `config.yaml` in the working directory and runs all of its tasks.
pub fn main() -> Result<(), RunError> {
    info!("Reading configuration from {}", CONFIG_FILE);

    let config = Config::new_from_file(Path::new(CONFIG_FILE))?;

    run(&config)
}

/// Runs the tasks of `config` in order.
pub fn run(config: &Config) -> Result<(), RunError> {
    prepare_output_dir(&config.output_dir)?;

    let tasks_bar = ProgressBar::new(config.tasks.len() as u64);
    tasks_bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .progress_chars("#>-"),
    );
    tasks_bar.set_prefix("Tasks");

    for task in &config.tasks {
        tasks_bar.set_message(task.name());
        info!("Running task {}", task.name());

        run_task(task, &config.output_dir)?;

        tasks_bar.inc(1);
    }

    tasks_bar.finish_with_message("All tasks finished");

    Ok(())
}

/// Dispatches a single task to its implementation.
///
/// Engine processes started by the launcher tasks are not awaited.
pub fn run_task(task: &Task, output_dir: &Path) -> Result<(), RunError> {
    match task {
        Task::ExtractMonthStr(t) => {
            extract::extract_month_str(
                &t.file,
                &t.channels,
                t.start_day,
                t.cali_start_day,
                t.cali_end_day,
                output_dir,
            )?;
        }
        Task::ExtractMonthBaseflow(t) => {
            let ratios = extract::extract_month_baseflow(
                &t.file,
                &t.channels,
                t.start_day,
                t.cali_start_day,
                t.cali_end_day,
                output_dir,
            )?;
            debug!("Baseflow ratios: {:?}", ratios);
        }
        Task::ExtractWatertableSim(t) => {
            extract::extract_watertable_sim(
                &t.obs_file,
                &t.sim_file,
                &t.grid_ids,
                t.start_day,
                t.end_day,
                output_dir,
            )?;
        }
        Task::ExtractMonthAvg(t) => {
            extract::extract_month_avg(
                &t.file,
                &t.channels,
                t.start_day,
                t.cal_day,
                t.end_day,
                output_dir,
            )?;
        }
        Task::StrObdToIns(t) => {
            instruction::str_obd_to_ins(
                &t.sim_file,
                &t.obd_file,
                &t.col_name,
                t.start_day,
                t.end_day,
            )?;
        }
        Task::MfObdToIns(t) => {
            instruction::mf_obd_to_ins(
                &t.sim_file,
                &t.obd_file,
                &t.col_name,
                t.start_day,
                t.end_day,
            )?;
        }
        Task::ModelInToTemplateFile(t) => {
            template::model_in_to_template_file(&t.file, t.tpl_file.as_deref())?;
        }
        Task::RivParToTemplateFile(t) => {
            template::riv_par_to_template_file(&t.file, t.tpl_file.as_deref())?;
        }
        Task::ExecuteBeopest(t) => {
            let handles = launcher::execute_beopest(t)?;
            info!("Started {} BeoPEST processes", handles.len());
        }
        Task::ExecuteWorkers(t) => {
            let handles = launcher::execute_workers(t)?;
            info!("Started {} BeoPEST workers", handles.len());
        }
    }

    Ok(())
}

fn prepare_output_dir(output_dir: &Path) -> Result<(), RunError> {
    if !output_dir.is_dir() {
        debug!("Creating output directory {}", output_dir.display());
        fs::create_dir_all(output_dir)?;
    }

    Ok(())
}
