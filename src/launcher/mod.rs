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

//! Launching of parallel PEST runs with BeoPEST.
//!
//! Workers are provisioned one after another, each in its own
//! `worker_<n>` directory, and their processes are left running
//! independently of this program.

pub mod engine;
pub mod worker;

use self::{
    engine::{EngineCommand, EngineHandle, EngineRole},
    worker::{provision_worker, worker_dir},
};
use crate::{
    errors::LaunchError,
    pipeline::configuration::{BeopestMaster, BeopestWorkers},
};
use log::info;
use std::{
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

const LOCAL_HOST: &str = "localhost";

/// Number of logical CPUs, used when the worker count is not configured.
pub fn default_worker_count() -> usize {
    num_cpus::get()
}

/// Absolute, normalized path of an existing directory.
fn existing_dir(path: &Path) -> Result<PathBuf, LaunchError> {
    path.canonicalize()
        .ok()
        .filter(|p| p.is_dir())
        .ok_or_else(|| LaunchError::Precondition(path.to_path_buf()))
}

/// The control file has to be in the directory copied to workers.
fn require_control_file(dir: &Path, pst: &Path) -> Result<(), LaunchError> {
    let control_file = dir.join(pst);

    if control_file.is_file() {
        Ok(())
    } else {
        Err(LaunchError::Precondition(control_file))
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Provisions workers with the `ids` from `template`
/// and starts an engine in each of them.
fn start_workers(
    template: &Path,
    worker_root: &Path,
    pst: &Path,
    ids: std::ops::Range<usize>,
    reuse: bool,
    engine: &str,
    role: &EngineRole,
) -> Result<Vec<EngineHandle>, LaunchError> {
    let mut handles = Vec::with_capacity(ids.len());

    for id in ids {
        let dir = worker_dir(worker_root, id);
        let state = provision_worker(template, &dir, pst, reuse)?;

        let handle = EngineCommand::new(engine, pst, role.clone(), &dir).spawn()?;
        info!(
            "Worker {} started in {} ({:?}, pid {})",
            id,
            dir.display(),
            state,
            handle.id()
        );
        handles.push(handle);
    }

    Ok(handles)
}

/// Starts the BeoPEST master in `master_dir` and local workers
/// connecting to it.
///
/// The master handle is the first one returned.
pub fn execute_beopest(task: &BeopestMaster) -> Result<Vec<EngineHandle>, LaunchError> {
    let master_dir = existing_dir(&task.master_dir)?;
    let worker_root = existing_dir(&resolve(&master_dir, &task.worker_root))?;
    require_control_file(&master_dir, &task.pst)?;

    let num_workers = task.num_workers.unwrap_or_else(default_worker_count);
    let host = if task.local {
        LOCAL_HOST.to_string()
    } else {
        task.host.clone().unwrap_or_else(|| LOCAL_HOST.to_string())
    };

    let master = EngineCommand::new(
        &task.engine,
        &task.pst,
        EngineRole::Master { port: task.port },
        &master_dir,
    )
    .spawn()?;
    info!(
        "BeoPEST master started in {} on port {}",
        master_dir.display(),
        task.port
    );

    // let the master open its port before workers connect
    thread::sleep(Duration::from_secs_f64(task.startup_delay));

    let mut handles = vec![master];
    handles.extend(start_workers(
        &master_dir,
        &worker_root,
        &task.pst,
        0..num_workers,
        task.reuse_workers,
        &task.engine,
        &EngineRole::Worker {
            host,
            port: task.port,
        },
    )?);

    Ok(handles)
}

/// Starts workers from `worker_rep` connecting to a master on another host.
pub fn execute_workers(task: &BeopestWorkers) -> Result<Vec<EngineHandle>, LaunchError> {
    let worker_rep = existing_dir(&task.worker_rep)?;
    let worker_root = existing_dir(&resolve(&worker_rep, &task.worker_root))?;
    require_control_file(&worker_rep, &task.pst)?;

    let num_workers = task.num_workers.unwrap_or_else(default_worker_count);

    start_workers(
        &worker_rep,
        &worker_root,
        &task.pst,
        task.start_id..task.start_id + num_workers,
        task.reuse_workers,
        &task.engine,
        &EngineRole::Worker {
            host: task.host.clone(),
            port: task.port,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::{default_worker_count, execute_beopest, execute_workers};
    use crate::{
        errors::LaunchError,
        pipeline::configuration::{BeopestMaster, BeopestWorkers},
    };
    use std::{fs, path::PathBuf};

    fn workers(worker_rep: PathBuf, engine: &str) -> BeopestWorkers {
        BeopestWorkers {
            worker_rep,
            pst: PathBuf::from("swat.pst"),
            host: "master-node".to_string(),
            num_workers: Some(2),
            start_id: 3,
            worker_root: PathBuf::from(".."),
            port: 4005,
            reuse_workers: false,
            engine: engine.to_string(),
        }
    }

    #[test]
    fn worker_count_is_positive() {
        assert!(default_worker_count() >= 1);
    }

    #[test]
    fn missing_master_dir() {
        let root = tempfile::tempdir().unwrap();
        let task = BeopestMaster {
            master_dir: root.path().join("missing"),
            pst: PathBuf::from("swat.pst"),
            num_workers: Some(1),
            worker_root: PathBuf::from(".."),
            port: 4005,
            local: true,
            host: None,
            reuse_workers: false,
            engine: "beopest64".to_string(),
            startup_delay: 0.0,
        };

        assert!(matches!(
            execute_beopest(&task),
            Err(LaunchError::Precondition(_))
        ));
    }

    #[test]
    fn missing_worker_root() {
        let root = tempfile::tempdir().unwrap();
        let rep = root.path().join("rep");
        fs::create_dir(&rep).unwrap();
        let mut task = workers(rep, "beopest64");
        task.worker_root = root.path().join("nowhere");

        assert!(matches!(
            execute_workers(&task),
            Err(LaunchError::Precondition(_))
        ));
    }

    #[test]
    fn missing_control_file() {
        let root = tempfile::tempdir().unwrap();
        let master_dir = root.path().join("master");
        fs::create_dir(&master_dir).unwrap();
        fs::write(master_dir.join("model.in"), "v__CN2.mgt -0.1\n").unwrap();
        let task = BeopestMaster {
            master_dir: master_dir.clone(),
            pst: PathBuf::from("swat.pst"),
            num_workers: Some(1),
            worker_root: PathBuf::from(".."),
            port: 4005,
            local: true,
            host: None,
            reuse_workers: false,
            engine: "smpst-no-such-engine".to_string(),
            startup_delay: 0.0,
        };

        match execute_beopest(&task) {
            Err(LaunchError::Precondition(path)) => assert!(path.ends_with("swat.pst")),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(!root.path().join("worker_0").exists());

        let result = execute_workers(&workers(master_dir, "smpst-no-such-engine"));
        assert!(matches!(result, Err(LaunchError::Precondition(_))));
        assert!(!root.path().join("worker_3").exists());
    }

    #[cfg(unix)]
    #[test]
    fn workers_are_numbered_from_start_id() {
        let root = tempfile::tempdir().unwrap();
        let rep = root.path().join("rep");
        fs::create_dir(&rep).unwrap();
        fs::write(rep.join("swat.pst"), "pcf\n").unwrap();

        let mut handles = execute_workers(&workers(rep, "true")).unwrap();

        assert_eq!(handles.len(), 2);
        assert!(root.path().join("worker_3").join("swat.pst").is_file());
        assert!(root.path().join("worker_4").join("swat.pst").is_file());
        assert!(!root.path().join("worker_5").exists());

        for handle in &mut handles {
            assert!(handle.wait().unwrap().success());
        }
    }
}
