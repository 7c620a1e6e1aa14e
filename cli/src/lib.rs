// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line interface of almanac: expand recurring components, look up
//! the closest occurrence, apply iTIP messages and validate calendars.

mod arg;
mod cli;
mod cmd_apply;
mod cmd_closest;
mod cmd_expand;
mod cmd_fmt;
mod cmd_validate;
mod config;
mod io;
mod occurrence_formatter;
mod table;

pub use crate::cli::{Cli, Commands, run};
