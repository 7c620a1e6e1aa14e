// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Scheduling messages of RFC 5546 (iTIP) applied to a stored calendar.
//!
//! Only the methods a calendar without attendees needs are supported:
//! `PUBLISH`, `REQUEST` updating existing components, and `CANCEL`.

mod cancel;
mod publish;
mod request;

use std::fmt::{self, Display};

use almanac_ical::keyword::{KW_METHOD_CANCEL, KW_METHOD_PUBLISH, KW_METHOD_REQUEST};
use almanac_ical::{Calendar, Component, DateOrDateTime, RecurrenceError, ValueError};

/// iTIP methods understood by [`process_itip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(ascii_case_insensitive)]
pub enum Method {
    /// Publish components to a calendar
    #[strum(serialize = "PUBLISH")]
    Publish,

    /// Update existing components
    #[strum(serialize = "REQUEST")]
    Request,

    /// Cancel components or some of their occurrences
    #[strum(serialize = "CANCEL")]
    Cancel,
}

impl Method {
    /// Returns the `METHOD` keyword
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Publish => KW_METHOD_PUBLISH,
            Self::Request => KW_METHOD_REQUEST,
            Self::Cancel => KW_METHOD_CANCEL,
        }
    }
}

/// One non-fatal outcome of processing a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItipLog {
    /// A change applied to the calendar
    Success(String),

    /// Something unexpected that did not stop processing
    Warning(String),
}

impl Display for ItipLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(message) => write!(f, "SUCCESS: {message}"),
            Self::Warning(message) => write!(f, "WARNING: {message}"),
        }
    }
}

/// A message that cannot be applied. The calendar is left untouched.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItipError {
    /// The message has no `METHOD`
    #[error("message has no METHOD")]
    MissingMethod,

    /// The message uses a method that is not supported
    #[error("unsupported METHOD {0}")]
    UnsupportedMethod(String),

    /// A scheduling component without `UID`
    #[error("{0} without UID")]
    MissingUid(String),

    /// A `REQUEST` for a component that is not in the calendar
    #[error("{0}: REQUEST can only update existing components")]
    UnknownUid(String),

    /// A `REQUEST` with attendees
    #[error("{0}: REQUEST with ATTENDEE is not supported")]
    AttendeesUnsupported(String),

    /// An update that is not newer than the stored component
    #[error("{target}: SEQUENCE {incoming} is not newer than the stored SEQUENCE {stored}")]
    StaleSequence {
        /// Component the update targets
        target: String,
        /// SEQUENCE of the message
        incoming: u32,
        /// SEQUENCE of the calendar
        stored: u32,
    },

    /// A `CANCEL` naming an occurrence the component does not have
    #[error("{0} is not an occurrence")]
    NotAnOccurrence(String),

    /// A `RANGE` that cannot be applied
    #[error("{0}: RANGE=THISANDPRIOR is not supported")]
    UnsupportedRange(String),

    /// SEQUENCE cannot be incremented any further
    #[error("{0}: SEQUENCE cannot be incremented past {max}", max = u32::MAX)]
    SequenceOverflow(String),

    /// A value the processor depends on cannot be read
    #[error("{target}: {source}")]
    InvalidValue {
        /// Component holding the value
        target: String,
        /// Why the value was rejected
        source: ValueError,
    },

    /// The occurrences of a stored component cannot be computed
    #[error("{target}: {source}")]
    Recurrence {
        /// Component whose occurrences were needed
        target: String,
        /// Why they cannot be computed
        source: RecurrenceError,
    },
}

/// Applies an iTIP message to `calendar` and returns what was done.
///
/// Processing is all or nothing: the message is applied to a copy, and the
/// copy replaces `calendar` only when no component of the message failed.
///
/// # Errors
///
/// Returns the first fatal error, such as an update that is not newer than
/// the stored component.
#[tracing::instrument(skip_all, fields(method = message.method()))]
pub fn process_itip(calendar: &mut Calendar, message: &Calendar) -> Result<Vec<ItipLog>, ItipError> {
    let method: Method = match message.method() {
        Some(method) => method
            .trim()
            .parse()
            .map_err(|_| ItipError::UnsupportedMethod(method.to_string()))?,
        None => return Err(ItipError::MissingMethod),
    };

    let mut working = calendar.clone();
    let mut log = Log::default();
    let result = match method {
        Method::Publish => publish::publish(&mut working, message, &mut log),
        Method::Request => request::request(&mut working, message, &mut log),
        Method::Cancel => cancel::cancel(&mut working, message, &mut log),
    };

    if let Err(e) = result {
        tracing::warn!(error = %e, "message rejected, calendar left unchanged");
        return Err(e);
    }
    *calendar = working;
    Ok(log.0)
}

/// Collects the outcomes of a message and traces them as they happen.
#[derive(Debug, Default)]
struct Log(Vec<ItipLog>);

impl Log {
    fn success(&mut self, message: String) {
        tracing::info!("{message}");
        self.0.push(ItipLog::Success(message));
    }

    fn warning(&mut self, message: String) {
        tracing::warn!("{message}");
        self.0.push(ItipLog::Warning(message));
    }
}

/// Names a component in messages, e.g. `VEVENT abc@example.com` or
/// `VEVENT abc@example.com RECURRENCE-ID 20240105T100000`.
fn describe(component: &Component) -> String {
    let uid = component.uid().unwrap_or("(no UID)");
    match component.recurrence_id() {
        Ok(Some(recurrence_id)) => format!("{} {uid} RECURRENCE-ID {recurrence_id}", component.name),
        _ => format!("{} {uid}", component.name),
    }
}

fn describe_occurrence(uid: &str, value: &DateOrDateTime) -> String {
    format!("{uid} at {value}")
}

fn invalid(component: &Component) -> impl Fn(ValueError) -> ItipError {
    let target = describe(component);
    move |source| ItipError::InvalidValue {
        target: target.clone(),
        source,
    }
}

fn unreadable(component: &Component) -> impl Fn(RecurrenceError) -> ItipError {
    let target = describe(component);
    move |source| ItipError::Recurrence {
        target: target.clone(),
        source,
    }
}
