// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod frame_driver;
pub mod recorder;
pub mod trace_log;
