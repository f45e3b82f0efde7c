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

//! Starting BeoPEST processes.
//!
//! The master listens on a port (`/h :4005`), workers connect to it
//! (`/h host:4005`). The processes are not supervised, but the returned
//! [`EngineHandle`] allows to wait for or stop them.

use crate::errors::LaunchError;
use log::debug;
use std::{
    io,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum EngineRole {
    Master { port: u16 },
    Worker { host: String, port: u16 },
}

impl EngineRole {
    /// Value of the `/h` argument.
    pub fn host_arg(&self) -> String {
        match self {
            EngineRole::Master { port } => format!(":{}", port),
            EngineRole::Worker { host, port } => format!("{}:{}", host, port),
        }
    }
}

/// A BeoPEST invocation in a given directory.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EngineCommand {
    pub program: String,
    pub control_file: PathBuf,
    pub role: EngineRole,
    pub working_dir: PathBuf,
}

impl EngineCommand {
    pub fn new(program: &str, control_file: &Path, role: EngineRole, working_dir: &Path) -> Self {
        EngineCommand {
            program: program.to_string(),
            control_file: control_file.to_path_buf(),
            role,
            working_dir: working_dir.to_path_buf(),
        }
    }

    pub fn args(&self) -> Vec<String> {
        vec![
            self.control_file.display().to_string(),
            "/h".to_string(),
            self.role.host_arg(),
        ]
    }

    /// Starts the process without waiting for it.
    pub fn spawn(&self) -> Result<EngineHandle, LaunchError> {
        debug!(
            "Starting {} {:?} in {}",
            self.program,
            self.args(),
            self.working_dir.display()
        );

        let mut command = Command::new(&self.program);
        command
            .args(self.args())
            .current_dir(&self.working_dir)
            .stdin(Stdio::null());

        // each engine gets its own console window, as with `start cmd /k`
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
            command.creation_flags(CREATE_NEW_CONSOLE);
        }

        let child = command.spawn().map_err(|source| LaunchError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        Ok(EngineHandle {
            child,
            working_dir: self.working_dir.clone(),
        })
    }
}

/// Running engine process. Dropping the handle leaves the process running.
#[derive(Debug)]
pub struct EngineHandle {
    child: Child,
    working_dir: PathBuf,
}

impl EngineHandle {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait()
    }

    pub fn kill(&mut self) -> io::Result<()> {
        self.child.kill()
    }
}
