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

//! Module containing the fixed layouts of SWAT and SWAT-MODFLOW
//! files and other constants used by the utilities.
//!
//! All column positions are zero-based and count whitespace
//! separated fields.

///`output.rch` preamble length
pub const RCH_SKIP_ROWS: usize = 9;
///`output.rch` columns: reach id, MON, FLOW_OUT
pub const RCH_COLUMNS: [usize; 3] = [1, 3, 6];

///`output.sub` preamble length
pub const SUB_SKIP_ROWS: usize = 9;
///`output.sub` columns: subbasin id, MON, SURQ, GW_Q, LATQ
pub const SUB_COLUMNS: [usize; 5] = [1, 3, 10, 11, 19];

///`channel_day.txt` preamble length
pub const CHANNEL_DAY_SKIP_ROWS: usize = 3;
///`channel_day.txt` columns: channel name, flo_out
pub const CHANNEL_DAY_COLUMNS: [usize; 2] = [6, 8];

///`modflow.obs` preamble length
pub const MF_OBS_SKIP_ROWS: usize = 2;
///`modflow.obs` columns: grid id, land surface elevation
pub const MF_OBS_COLUMNS: [usize; 2] = [3, 4];

///`swatmf_out_MF_obs` preamble length
pub const MF_SIM_SKIP_ROWS: usize = 1;

///Rows whose filter field is at least this long (or this large)
///are annual summaries or continuation rows, not monthly data.
pub const FILTER_LIMIT: usize = 13;

///Missing value marker used in observation files
pub const MISSING_VALUE: &str = "-999";

///Instruction file line advance
pub const LINE_ADVANCE: &str = "l1";
///Instruction file header
pub const INSTRUCTION_HEADER: &str = "pif ~";
///Template file header
pub const TEMPLATE_HEADER: &str = "ptf ~";

///Default BeoPEST executable
pub const ENGINE_BINARY: &str = "beopest64";
///Default BeoPEST master port
pub const DEFAULT_PORT: u16 = 4005;
///Seconds given to the master before workers connect
pub const MASTER_STARTUP_DELAY: f64 = 1.5;
