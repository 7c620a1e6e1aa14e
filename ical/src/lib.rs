// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Read, write and expand iCalendar (RFC 5545) data.
//!
//! Text is parsed into a [`Calendar`] of [`Component`]s with raw
//! [`Property`] values, written back with [`formatter`], and recurring
//! components are expanded lazily into their [`Occurrences`].

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(
    clippy::option_option,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::match_bool
)]

pub mod calendar;
pub mod component;
pub mod formatter;
pub mod keyword;
pub mod parameter;
mod parser;
pub mod property;
pub mod recurrence;
pub mod syntax;
pub mod value;

pub use crate::calendar::Calendar;
pub use crate::component::{Component, ComponentKind};
pub use crate::parameter::{Parameter, ParameterKind, ParameterValue, RecurrenceIdRange, ValueType};
pub use crate::parser::{Diagnostic, ParseError, Parsed, parse};
pub use crate::property::{Property, PropertyKind};
pub use crate::recurrence::{Occurrences, RecurrenceCache, RecurrenceError, RecurrenceSet};
pub use crate::value::{
    DateOrDateTime, DateTimeKind, Frequency, RecurrenceRule, ValueError, WeekDay, WeekDayNum,
};
