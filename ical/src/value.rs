// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Property values as defined in RFC 5545 Section 3.3.

mod datetime;
mod rrule;
mod text;

pub use datetime::{DateOrDateTime, DateTimeKind};
pub use rrule::{Frequency, RecurrenceRule, WeekDay, WeekDayNum};
pub use text::{escape_text, split_text_list, unescape_text};

/// Error for a property value that cannot be read.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// Not a DATE value
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Not a DATE or DATE-TIME value
    #[error("invalid date-time: {0}")]
    InvalidDateTime(String),

    /// Not an INTEGER value
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Not a RECUR value
    #[error("invalid recurrence rule: {0}")]
    InvalidRecurrenceRule(String),

    /// A rule part given twice
    #[error("{0} must not occur more than once")]
    DuplicatePart(&'static str),

    /// A rule part value outside its legal domain
    #[error("{part} value {value} is out of range, expected {range}")]
    OutOfRange {
        /// Rule part keyword
        part: &'static str,
        /// Offending value
        value: i64,
        /// Human-readable legal domain
        range: &'static str,
    },
}
