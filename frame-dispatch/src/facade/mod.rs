// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod async_facade;
pub mod async_task;
pub mod closure_task;
