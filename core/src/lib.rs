// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Calendar engine of almanac: recurrence queries over an in-memory
//! calendar and the iTIP methods that keep it up to date.

#![warn(
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]

mod almanac;
mod config;
mod itip;

pub use crate::almanac::{Almanac, AlmanacError, Occurrence, OccurrenceStream};
pub use crate::config::{
    APP_NAME, Config, ConfigError, DEFAULT_OCCURRENCE_LIMIT, OutputFormat, get_config_dir,
};
pub use crate::itip::{ItipError, ItipLog, Method, process_itip};
