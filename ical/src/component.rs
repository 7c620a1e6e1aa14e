// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Calendar components as defined in RFC 5545 Section 3.6.
//!
//! A [`Component`] is a named bag of properties with nested sub-components.
//! The properties the recurrence engine and the scheduling processors rely
//! on have typed accessors; everything else stays raw.

use std::cell::RefCell;
use std::fmt::{self, Display};

use crate::keyword::{
    KW_ATTENDEE, KW_DAYLIGHT, KW_DTEND, KW_DTSTAMP, KW_DTSTART, KW_DURATION, KW_EXDATE,
    KW_ORGANIZER, KW_RDATE, KW_RECURRENCE_ID, KW_RRULE, KW_SEQUENCE, KW_STANDARD, KW_TZID,
    KW_UID, KW_VALARM, KW_VEVENT, KW_VFREEBUSY, KW_VJOURNAL, KW_VTIMEZONE, KW_VTODO,
};
use crate::parameter::{ParameterKind, RecurrenceIdRange};
use crate::property::Property;
use crate::recurrence::{CacheKey, Occurrences, RecurrenceCache, RecurrenceError, RecurrenceSet};
use crate::value::{DateOrDateTime, DateTimeKind, RecurrenceRule, ValueError};

/// Kind of calendar component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ComponentKind {
    /// `VEVENT`
    #[strum(serialize = "VEVENT")]
    Event,
    /// `VTODO`
    #[strum(serialize = "VTODO")]
    Todo,
    /// `VJOURNAL`
    #[strum(serialize = "VJOURNAL")]
    Journal,
    /// `VFREEBUSY`
    #[strum(serialize = "VFREEBUSY")]
    FreeBusy,
    /// `VTIMEZONE`
    #[strum(serialize = "VTIMEZONE")]
    TimeZone,
    /// `STANDARD` observance inside a `VTIMEZONE`
    #[strum(serialize = "STANDARD")]
    Standard,
    /// `DAYLIGHT` observance inside a `VTIMEZONE`
    #[strum(serialize = "DAYLIGHT")]
    Daylight,
    /// `VALARM`
    #[strum(serialize = "VALARM")]
    Alarm,
}

impl ComponentKind {
    /// Returns the name keyword for the component kind
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Event => KW_VEVENT,
            Self::Todo => KW_VTODO,
            Self::Journal => KW_VJOURNAL,
            Self::FreeBusy => KW_VFREEBUSY,
            Self::TimeZone => KW_VTIMEZONE,
            Self::Standard => KW_STANDARD,
            Self::Daylight => KW_DAYLIGHT,
            Self::Alarm => KW_VALARM,
        }
    }

    /// Whether components of this kind show up on a calendar and can be
    /// scheduled: events, to-dos and journal entries.
    #[must_use]
    pub const fn is_displayable(self) -> bool {
        matches!(self, Self::Event | Self::Todo | Self::Journal)
    }
}

impl Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

/// A `BEGIN:<NAME>` ... `END:<NAME>` block.
#[derive(Debug, Default)]
pub struct Component {
    /// Component name, in the case it was written.
    pub name: String,

    /// Properties, in the order they were written.
    pub properties: Vec<Property>,

    /// Nested components such as alarms or time zone observances.
    pub children: Vec<Component>,

    cache: RefCell<RecurrenceCache>,
}

impl Clone for Component {
    /// Clones the content; the copy starts with an empty lookup cache.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            properties: self.properties.clone(),
            children: self.children.clone(),
            cache: RefCell::default(),
        }
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.properties == other.properties
            && self.children == other.children
    }
}

impl Eq for Component {}

impl Component {
    /// Creates an empty component of the given kind.
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self::with_name(kind.name())
    }

    /// Creates an empty component with any name, e.g. an `X-` component.
    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a property, builder style.
    #[must_use]
    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Returns the kind, `None` for unknown or `X-` components.
    #[must_use]
    pub fn kind(&self) -> Option<ComponentKind> {
        self.name.parse().ok()
    }

    /// Whether this is an event, to-do or journal entry.
    #[must_use]
    pub fn is_displayable(&self) -> bool {
        self.kind().is_some_and(ComponentKind::is_displayable)
    }

    /// Returns the first property with the given name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.is(name))
    }

    /// Returns every property with the given name.
    pub fn properties_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> {
        self.properties.iter().filter(move |p| p.is(name))
    }

    /// Replaces every property sharing the name of `property`. The new one
    /// takes the place of the first replaced property, or is appended.
    pub fn set_property(&mut self, property: Property) {
        match self.properties.iter().position(|p| p.is(&property.name)) {
            Some(index) => {
                let name = property.name.clone();
                if let Some(slot) = self.properties.get_mut(index) {
                    *slot = property;
                }
                let mut position = 0;
                self.properties.retain(|p| {
                    let keep = position <= index || !p.is(&name);
                    position += 1;
                    keep
                });
            }
            None => self.properties.push(property),
        }
    }

    /// Removes every property with the given name.
    pub fn remove_properties(&mut self, name: &str) {
        self.properties.retain(|p| !p.is(name));
    }

    /// UID, raw
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.property(KW_UID).map(|p| p.value.as_str())
    }

    /// SEQUENCE, 0 when absent or unreadable
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.property(KW_SEQUENCE)
            .and_then(|p| lexical::parse::<u32, _>(p.value.trim()).ok())
            .unwrap_or(0)
    }

    /// Set SEQUENCE.
    pub fn set_sequence(&mut self, sequence: u32) {
        self.set_property(Property::new(KW_SEQUENCE, sequence.to_string()));
    }

    /// DTSTART
    ///
    /// # Errors
    ///
    /// Returns an error when the value is not a DATE or DATE-TIME.
    pub fn dtstart(&self) -> Result<Option<DateOrDateTime>, ValueError> {
        self.property(KW_DTSTART)
            .map(DateOrDateTime::from_property)
            .transpose()
    }

    /// RRULE
    ///
    /// # Errors
    ///
    /// Returns an error when the rule cannot be parsed.
    pub fn rrule(&self) -> Result<Option<RecurrenceRule>, ValueError> {
        self.property(KW_RRULE)
            .map(|p| RecurrenceRule::parse(&p.value))
            .transpose()
    }

    /// Set or remove RRULE. Any lookup cache is invalidated by the change.
    pub fn set_rrule(&mut self, rule: Option<&RecurrenceRule>) {
        match rule {
            Some(rule) => self.set_property(Property::new(KW_RRULE, rule.to_string())),
            None => self.remove_properties(KW_RRULE),
        }
    }

    /// Values of every RDATE
    ///
    /// # Errors
    ///
    /// Returns the first value that cannot be read.
    pub fn rdates(&self) -> Result<Vec<DateOrDateTime>, ValueError> {
        self.date_list(KW_RDATE)
    }

    /// Values of every EXDATE
    ///
    /// # Errors
    ///
    /// Returns the first value that cannot be read.
    pub fn exdates(&self) -> Result<Vec<DateOrDateTime>, ValueError> {
        self.date_list(KW_EXDATE)
    }

    /// Adds one EXDATE property for `value`.
    pub fn add_exdate(&mut self, value: &DateOrDateTime) {
        self.properties.push(value.to_property(KW_EXDATE));
    }

    /// RECURRENCE-ID, present on overrides of a single occurrence
    ///
    /// # Errors
    ///
    /// Returns an error when the value is not a DATE or DATE-TIME.
    pub fn recurrence_id(&self) -> Result<Option<DateOrDateTime>, ValueError> {
        self.property(KW_RECURRENCE_ID)
            .map(DateOrDateTime::from_property)
            .transpose()
    }

    /// Whether this component carries a RECURRENCE-ID.
    #[must_use]
    pub fn is_override(&self) -> bool {
        self.property(KW_RECURRENCE_ID).is_some()
    }

    /// RANGE parameter of RECURRENCE-ID
    #[must_use]
    pub fn recurrence_range(&self) -> Option<RecurrenceIdRange> {
        self.property(KW_RECURRENCE_ID)?
            .parameter_value(ParameterKind::Range.name())?
            .parse()
            .ok()
    }

    /// Whether an ORGANIZER is present.
    #[must_use]
    pub fn has_organizer(&self) -> bool {
        self.property(KW_ORGANIZER).is_some()
    }

    /// Whether any ATTENDEE is present.
    #[must_use]
    pub fn has_attendees(&self) -> bool {
        self.property(KW_ATTENDEE).is_some()
    }

    /// TZID of a `VTIMEZONE`
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.property(KW_TZID).map(|p| p.value.as_str())
    }

    /// Collects DTSTART, RRULE, RDATE and EXDATE.
    ///
    /// # Errors
    ///
    /// Fails without DTSTART or when one of the values cannot be read.
    pub fn recurrence_set(&self) -> Result<RecurrenceSet, RecurrenceError> {
        let start = self
            .dtstart()
            .map_err(invalid(KW_DTSTART))?
            .ok_or(RecurrenceError::MissingStart)?;
        Ok(RecurrenceSet {
            start,
            rule: self.rrule().map_err(invalid(KW_RRULE))?,
            rdates: self.rdates().map_err(invalid(KW_RDATE))?,
            exdates: self.exdates().map_err(invalid(KW_EXDATE))?,
        })
    }

    /// Streams the occurrences of this component at or after `from`, in
    /// ascending order. Overrides are not taken into account, see
    /// [`crate::Calendar::occurrences`] for that.
    ///
    /// # Errors
    ///
    /// Fails when the recurrence set cannot be read.
    pub fn occurrences(
        &self,
        from: Option<&DateOrDateTime>,
    ) -> Result<Occurrences<'_>, RecurrenceError> {
        let set = self.recurrence_set()?;
        Ok(set.occurrences_from(from, self.cache()))
    }

    /// The latest occurrence at or before `target`, `None` when DTSTART is
    /// later than `target`.
    ///
    /// # Errors
    ///
    /// Fails when the recurrence set cannot be read.
    pub fn closest_start_on_or_before(
        &self,
        target: &DateOrDateTime,
    ) -> Result<Option<DateOrDateTime>, RecurrenceError> {
        let set = self.recurrence_set()?;
        Ok(set.latest_before(target, true, self.cache()))
    }

    /// The latest occurrence strictly before `target`.
    ///
    /// # Errors
    ///
    /// Fails when the recurrence set cannot be read.
    pub fn occurrence_before(
        &self,
        target: &DateOrDateTime,
    ) -> Result<Option<DateOrDateTime>, RecurrenceError> {
        let set = self.recurrence_set()?;
        Ok(set.latest_before(target, false, self.cache()))
    }

    /// Whether `value` is one of the occurrences of this component.
    ///
    /// # Errors
    ///
    /// Fails when the recurrence set cannot be read.
    pub fn is_occurrence(&self, value: &DateOrDateTime) -> Result<bool, RecurrenceError> {
        Ok(self
            .closest_start_on_or_before(value)?
            .is_some_and(|found| found.instant() == value.instant()))
    }

    /// Number of samples in the lookup cache.
    #[must_use]
    pub fn cached_samples(&self) -> usize {
        self.cache.try_borrow().map_or(0, |cache| cache.len())
    }

    /// Returns human-readable violations of RFC 5545, for this component
    /// only.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let kind = self.kind();

        if self.is_displayable() {
            for required in [KW_UID, KW_DTSTAMP] {
                if self.property(required).is_none() {
                    errors.push(format!("{required} is required"));
                }
            }
        }
        if kind == Some(ComponentKind::TimeZone) && self.tzid().is_none() {
            errors.push(format!("{KW_TZID} is required"));
        }
        for single in [KW_UID, KW_DTSTART, KW_RRULE, KW_RECURRENCE_ID, KW_SEQUENCE] {
            if self.properties_named(single).count() > 1 {
                errors.push(format!("{single} must not occur more than once"));
            }
        }
        if self.property(KW_DTEND).is_some() && self.property(KW_DURATION).is_some() {
            errors.push(format!("{KW_DTEND} and {KW_DURATION} must not both be set"));
        }
        if let Some(p) = self.property(KW_SEQUENCE)
            && lexical::parse::<u32, _>(p.value.trim()).is_err()
        {
            errors.push(format!("{KW_SEQUENCE}: invalid integer {}", p.value));
        }

        let start = match self.dtstart() {
            Ok(start) => start,
            Err(e) => {
                errors.push(format!("{KW_DTSTART}: {e}"));
                None
            }
        };
        if start.is_none() && kind == Some(ComponentKind::Event) {
            errors.push(format!("{KW_DTSTART} is required"));
        }
        if let (Some(start), Some(end)) = (&start, self.property(KW_DTEND)) {
            match DateOrDateTime::from_property(end) {
                Ok(end) if end.is_date() != start.is_date() => errors.push(format!(
                    "{KW_DTEND} must have the same value type as {KW_DTSTART}"
                )),
                Ok(end) if end < *start => {
                    errors.push(format!("{KW_DTEND} must not be before {KW_DTSTART}"));
                }
                Ok(_) => {}
                Err(e) => errors.push(format!("{KW_DTEND}: {e}")),
            }
        }

        match self.rrule() {
            Ok(Some(rule)) => {
                if start.is_none() {
                    errors.push(format!("{KW_RRULE} requires {KW_DTSTART}"));
                }
                errors.extend(rule.errors().into_iter().map(|e| format!("{KW_RRULE}: {e}")));
                if let (Some(start), Some(until)) = (&start, rule.until()) {
                    errors.extend(until_errors(start, until));
                }
            }
            Ok(None) => {}
            Err(e) => errors.push(format!("{KW_RRULE}: {e}")),
        }

        for name in [KW_RDATE, KW_EXDATE] {
            match self.date_list(name) {
                Ok(values) => errors.extend(date_list_errors(name, start.as_ref(), &values)),
                Err(e) => errors.push(format!("{name}: {e}")),
            }
        }

        if let Err(e) = self.recurrence_id() {
            errors.push(format!("{KW_RECURRENCE_ID}: {e}"));
        }
        errors
    }

    fn date_list(&self, name: &str) -> Result<Vec<DateOrDateTime>, ValueError> {
        let mut values = Vec::new();
        for property in self.properties_named(name) {
            values.extend(DateOrDateTime::list_from_property(property)?);
        }
        Ok(values)
    }

    /// The lookup cache, checked against the current DTSTART and RRULE.
    fn cache(&self) -> Option<&RefCell<RecurrenceCache>> {
        let key = CacheKey {
            start: self
                .property(KW_DTSTART)
                .map(ToString::to_string)
                .unwrap_or_default(),
            rule: self
                .property(KW_RRULE)
                .map(|p| p.value.clone())
                .unwrap_or_default(),
        };
        self.cache.try_borrow_mut().ok()?.sync(key);
        Some(&self.cache)
    }
}

fn invalid(property: &'static str) -> impl Fn(ValueError) -> RecurrenceError {
    move |source| RecurrenceError::InvalidValue {
        property: property.to_string(),
        source,
    }
}

fn until_errors(start: &DateOrDateTime, until: &DateOrDateTime) -> Option<String> {
    match (start.kind(), until.kind()) {
        (DateTimeKind::Date, DateTimeKind::Date)
        | (DateTimeKind::Floating, DateTimeKind::Floating)
        | (DateTimeKind::Utc | DateTimeKind::Zoned, DateTimeKind::Utc) => None,
        (DateTimeKind::Date, _) => Some(format!(
            "{KW_RRULE}: UNTIL must be a DATE when {KW_DTSTART} is a DATE"
        )),
        (DateTimeKind::Floating, _) => Some(format!(
            "{KW_RRULE}: UNTIL must be a floating DATE-TIME when {KW_DTSTART} is floating"
        )),
        (DateTimeKind::Utc | DateTimeKind::Zoned, _) => Some(format!(
            "{KW_RRULE}: UNTIL must be a UTC DATE-TIME when {KW_DTSTART} has a time zone"
        )),
    }
}

fn date_list_errors(
    name: &str,
    start: Option<&DateOrDateTime>,
    values: &[DateOrDateTime],
) -> Vec<String> {
    let mut errors = Vec::new();
    if let Some(start) = start
        && values.iter().any(|v| v.is_date() != start.is_date())
    {
        errors.push(format!("{name} values must have the same value type as {KW_DTSTART}"));
    }
    if let Some(first) = values.first()
        && values.iter().any(|v| v.tzid() != first.tzid())
    {
        errors.push(format!("{name} values disagree on their time zone"));
    }
    errors
}
