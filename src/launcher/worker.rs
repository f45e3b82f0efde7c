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

//! Worker directories, copies of the master (template) directory
//! in which BeoPEST workers run the model.

use crate::errors::LaunchError;
use log::debug;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// How a worker directory was prepared.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum WorkerState {
    /// Full copy of the template directory.
    FreshCopy,
    /// Existing directory, only the control file refreshed.
    Reused,
}

pub fn worker_dir(worker_root: &Path, index: usize) -> PathBuf {
    worker_root.join(format!("worker_{}", index))
}

/// Prepares `worker` from `template`.
///
/// An existing directory is wiped and copied again, unless `reuse` is set,
/// in which case only `control_file` (relative to `template`) is copied.
/// A missing directory is always copied in full.
pub fn provision_worker(
    template: &Path,
    worker: &Path,
    control_file: &Path,
    reuse: bool,
) -> Result<WorkerState, LaunchError> {
    let provision_error = |source: io::Error| LaunchError::WorkerProvision {
        dir: worker.to_path_buf(),
        source,
    };

    if worker.exists() && reuse {
        debug!("Reusing worker dir {}", worker.display());
        fs::copy(template.join(control_file), worker.join(control_file))
            .map_err(provision_error)?;
        return Ok(WorkerState::Reused);
    }

    if worker.exists() {
        debug!("Removing existing worker dir {}", worker.display());
        remove_tree(worker).map_err(provision_error)?;
    }

    debug!(
        "Copying {} into worker dir {}",
        template.display(),
        worker.display()
    );
    copy_tree(template, worker).map_err(provision_error)?;

    Ok(WorkerState::FreshCopy)
}

/// Recursive copy of `src` into a new or existing `dst`.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    if dst.starts_with(src) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "destination lies inside the copied directory",
        ));
    }

    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Removes the directory tree, clearing read-only flags
/// and retrying once if the first attempt fails.
pub fn remove_tree(path: &Path) -> io::Result<()> {
    if fs::remove_dir_all(path).is_ok() {
        return Ok(());
    }

    debug!("Clearing read-only flags in {}", path.display());
    make_writable(path)?;
    fs::remove_dir_all(path)
}

fn make_writable(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;

    if metadata.file_type().is_symlink() {
        return Ok(());
    }

    let mut permissions = metadata.permissions();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o700);
    }
    #[cfg(not(unix))]
    {
        permissions.set_readonly(false);
    }

    fs::set_permissions(path, permissions)?;

    if metadata.is_dir() {
        for entry in fs::read_dir(path)? {
            make_writable(&entry?.path())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{copy_tree, provision_worker, remove_tree, worker_dir, WorkerState};
    use std::{
        collections::BTreeSet,
        fs,
        path::{Path, PathBuf},
    };

    fn file_set(root: &Path) -> BTreeSet<PathBuf> {
        let mut files = BTreeSet::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    files.insert(path.strip_prefix(root).unwrap().to_path_buf());
                }
            }
        }
        files
    }

    fn master(root: &Path) -> PathBuf {
        let master = root.join("master");
        fs::create_dir_all(master.join("TxtInOut")).unwrap();
        fs::write(master.join("swat.pst"), "pcf\n").unwrap();
        fs::write(master.join("model.in"), "v__CN2.mgt -0.1\n").unwrap();
        fs::write(master.join("TxtInOut").join("file.cio"), "cio\n").unwrap();
        master
    }

    #[test]
    fn absent_worker_is_copied() {
        let root = tempfile::tempdir().unwrap();
        let master = master(root.path());
        let worker = worker_dir(root.path(), 0);

        let state = provision_worker(&master, &worker, Path::new("swat.pst"), true).unwrap();

        assert_eq!(state, WorkerState::FreshCopy);
        assert_eq!(file_set(&worker), file_set(&master));
    }

    #[test]
    fn existing_worker_is_replaced() {
        let root = tempfile::tempdir().unwrap();
        let master = master(root.path());
        let worker = worker_dir(root.path(), 1);
        fs::create_dir_all(worker.join("old")).unwrap();
        fs::write(worker.join("old").join("stale.txt"), "stale").unwrap();
        fs::write(worker.join("model.in"), "outdated").unwrap();

        let state = provision_worker(&master, &worker, Path::new("swat.pst"), false).unwrap();

        assert_eq!(state, WorkerState::FreshCopy);
        assert_eq!(file_set(&worker), file_set(&master));
        assert_eq!(
            fs::read_to_string(worker.join("model.in")).unwrap(),
            "v__CN2.mgt -0.1\n"
        );
    }

    #[test]
    fn reused_worker_gets_control_file_only() {
        let root = tempfile::tempdir().unwrap();
        let master = master(root.path());
        let worker = worker_dir(root.path(), 2);
        fs::create_dir_all(&worker).unwrap();
        fs::write(worker.join("swat.pst"), "old pcf\n").unwrap();
        fs::write(worker.join("stale.txt"), "stale").unwrap();

        let state = provision_worker(&master, &worker, Path::new("swat.pst"), true).unwrap();

        assert_eq!(state, WorkerState::Reused);
        assert_eq!(fs::read_to_string(worker.join("swat.pst")).unwrap(), "pcf\n");
        assert!(worker.join("stale.txt").exists());
        assert!(!worker.join("model.in").exists());
    }

    #[test]
    fn copy_into_itself_is_refused() {
        let root = tempfile::tempdir().unwrap();
        let master = master(root.path());

        assert!(copy_tree(&master, &master.join("worker_0")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn read_only_tree_is_removed() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let master = master(root.path());
        let locked = master.join("TxtInOut");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o500)).unwrap();

        remove_tree(&master).unwrap();

        assert!(!master.exists());
    }
}
