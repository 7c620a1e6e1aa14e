// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::VecDeque;
use std::io;
use std::iter::Peekable;

use almanac_ical::formatter::format;
use almanac_ical::{
    Calendar, Component, DateOrDateTime, Diagnostic, Occurrences, ParseError, RecurrenceError,
    parse,
};

use crate::itip::{ItipError, ItipLog, process_itip};

/// Error raised by [`Almanac`].
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum AlmanacError {
    /// The text holds no calendar
    #[error("failed to parse calendar: {0}")]
    Parse(#[from] ParseError),

    /// The occurrences of a component cannot be computed
    #[error("failed to expand occurrences: {0}")]
    Recurrence(#[from] RecurrenceError),

    /// An iTIP message was rejected
    #[error("message rejected: {0}")]
    Itip(#[from] ItipError),

    /// No component has this UID
    #[error("no component with UID {0}")]
    UnknownUid(String),

    /// The calendar cannot be written
    #[error("failed to write calendar: {0}")]
    Io(#[from] io::Error),
}

/// One occurrence of a component, as a calendar shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// When the occurrence starts
    pub start: DateOrDateTime,

    /// The occurrence of the series this stands for
    pub recurrence_id: DateOrDateTime,

    /// Whether an override replaces the generated occurrence
    pub is_override: bool,
}

/// An in-memory calendar and the operations a calendar view needs from it.
#[derive(Debug, Clone)]
pub struct Almanac {
    calendar: Calendar,
    diagnostics: Vec<Diagnostic>,
}

impl Almanac {
    /// Parses calendar text, keeping the problems the parser recovered from.
    ///
    /// # Errors
    ///
    /// Fails when the text holds no `VCALENDAR`.
    #[tracing::instrument(skip_all)]
    pub fn parse(text: &str) -> Result<Self, AlmanacError> {
        let parsed = parse(text)?;
        tracing::debug!(
            components = parsed.calendar.components().len(),
            diagnostics = parsed.diagnostics.len(),
            "calendar parsed"
        );
        Ok(Self {
            calendar: parsed.calendar,
            diagnostics: parsed.diagnostics,
        })
    }

    /// Wraps a calendar built in memory.
    #[must_use]
    pub fn from_calendar(calendar: Calendar) -> Self {
        Self {
            calendar,
            diagnostics: Vec::new(),
        }
    }

    /// The calendar
    #[must_use]
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Problems found while parsing
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Writes the calendar back as folded, CRLF terminated text.
    ///
    /// # Errors
    ///
    /// Fails when the formatter cannot write.
    pub fn serialize(&self) -> Result<String, AlmanacError> {
        Ok(format(&self.calendar)?)
    }

    /// Returns human-readable violations of RFC 5545.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        self.calendar.errors()
    }

    /// Streams the occurrences of the component with this UID, starting at
    /// `from` inclusive, in ascending order of start.
    ///
    /// Overrides take the place of the occurrence they replace, at their own
    /// start.
    ///
    /// # Errors
    ///
    /// Fails when no component has this UID, or when the occurrences of the
    /// series cannot be computed.
    pub fn stream_occurrences(
        &self,
        uid: &str,
        from: Option<&DateOrDateTime>,
    ) -> Result<OccurrenceStream<'_>, AlmanacError> {
        if !self.calendar.contains_uid(uid) {
            return Err(AlmanacError::UnknownUid(uid.to_string()));
        }

        let series = match self.calendar.parent(uid) {
            Some(parent) => Some(self.calendar.occurrences(parent, from)?.peekable()),
            None => None,
        };
        let mut overrides: Vec<Occurrence> = self
            .calendar
            .overrides(uid)
            .filter_map(override_occurrence)
            .filter(|o| from.is_none_or(|from| o.start.instant() >= from.instant()))
            .collect();
        overrides.sort_by(|a, b| a.start.cmp(&b.start));

        Ok(OccurrenceStream {
            series,
            overrides: overrides.into(),
        })
    }

    /// The latest occurrence of the component with this UID starting at or
    /// before `target`, `None` when every occurrence starts later.
    ///
    /// # Errors
    ///
    /// Fails when no component has this UID, or when the occurrences of the
    /// series cannot be computed.
    pub fn closest_occurrence_on_or_before(
        &self,
        uid: &str,
        target: &DateOrDateTime,
    ) -> Result<Option<Occurrence>, AlmanacError> {
        if !self.calendar.contains_uid(uid) {
            return Err(AlmanacError::UnknownUid(uid.to_string()));
        }

        let overrides: Vec<Occurrence> = self
            .calendar
            .overrides(uid)
            .filter_map(override_occurrence)
            .collect();
        let is_replaced = |value: &DateOrDateTime| {
            overrides
                .iter()
                .any(|o| o.recurrence_id.instant() == value.instant())
        };

        let mut generated = None;
        if let Some(parent) = self.calendar.parent(uid) {
            let mut candidate = self.calendar.closest_occurrence_on_or_before(parent, target)?;
            // walk back past occurrences that moved elsewhere
            while let Some(value) = candidate.as_ref().filter(|v| is_replaced(v)) {
                candidate = parent.occurrence_before(value)?;
            }
            generated = candidate.map(|start| Occurrence {
                recurrence_id: start.clone(),
                start,
                is_override: false,
            });
        }

        let moved = overrides
            .into_iter()
            .filter(|o| o.start.instant() <= target.instant())
            .max_by(|a, b| a.start.cmp(&b.start));
        Ok(match (generated, moved) {
            (Some(g), Some(m)) => Some(if m.start.instant() >= g.start.instant() { m } else { g }),
            (g, m) => g.or(m),
        })
    }

    /// Applies an iTIP message given as text.
    ///
    /// The calendar is left unchanged when the message is rejected.
    ///
    /// # Errors
    ///
    /// Fails when the message holds no calendar or cannot be applied.
    pub fn process_itip(&mut self, message: &str) -> Result<Vec<ItipLog>, AlmanacError> {
        let parsed = parse(message)?;
        for diagnostic in &parsed.diagnostics {
            tracing::warn!(%diagnostic, "problem in iTIP message");
        }
        Ok(process_itip(&mut self.calendar, &parsed.calendar)?)
    }
}

fn override_occurrence(component: &Component) -> Option<Occurrence> {
    let recurrence_id = component.recurrence_id().ok().flatten()?;
    let start = component
        .dtstart()
        .ok()
        .flatten()
        .unwrap_or_else(|| recurrence_id.clone());
    Some(Occurrence {
        start,
        recurrence_id,
        is_override: true,
    })
}

/// Occurrences of a series merged with its overrides, see
/// [`Almanac::stream_occurrences`].
#[derive(Debug)]
pub struct OccurrenceStream<'a> {
    series: Option<Peekable<Occurrences<'a>>>,
    overrides: VecDeque<Occurrence>,
}

impl Iterator for OccurrenceStream<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Self::Item> {
        let next_generated = self.series.as_mut().and_then(Peekable::peek);
        let take_override = match (next_generated, self.overrides.front()) {
            (Some(generated), Some(moved)) => moved.start.instant() <= generated.instant(),
            (None, Some(_)) => true,
            (_, None) => false,
        };
        if take_override {
            return self.overrides.pop_front();
        }

        let start = self.series.as_mut()?.next()?;
        Some(Occurrence {
            recurrence_id: start.clone(),
            start,
            is_override: false,
        })
    }
}
