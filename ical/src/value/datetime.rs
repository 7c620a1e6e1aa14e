// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! DATE and DATE-TIME values as defined in RFC 5545 Sections 3.3.4 and 3.3.5.
//!
//! ```txt
//! date          = date-value
//! date-value    = date-fullyear date-month date-mday
//! date-time     = date "T" time
//! time          = time-hour time-minute time-second [time-utc]
//! time-utc      = "Z"
//! ```
//!
//! A DATE-TIME comes in three forms: floating (no zone), UTC (trailing `Z`)
//! and local time with a `TZID` parameter. All of them are kept as civil
//! values so that they serialize back exactly as they were read.

use std::cmp::Ordering;
use std::fmt::{self, Display};

use jiff::Timestamp;
use jiff::civil::{Date, DateTime, Time};
use jiff::tz::TimeZone;

use crate::keyword::{KW_DATE, KW_PERIOD};
use crate::parameter::{Parameter, ParameterKind, ValueType};
use crate::property::Property;
use crate::value::ValueError;

/// A DATE or DATE-TIME value, the unit of every recurrence computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateOrDateTime {
    /// An all-day value, `VALUE=DATE`
    Date(Date),

    /// A date-time without zone, interpreted in the observer's local time
    Floating(DateTime),

    /// A date-time in UTC, written with a trailing `Z`
    Utc(DateTime),

    /// A date-time in a named time zone, written with a `TZID` parameter
    Zoned {
        /// Wall-clock time in the zone
        datetime: DateTime,
        /// Time zone identifier as written
        tzid: String,
    },
}

/// The four shapes a [`DateOrDateTime`] can take, without the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeKind {
    /// All-day value
    Date,
    /// Floating date-time
    Floating,
    /// UTC date-time
    Utc,
    /// Date-time with a `TZID`
    Zoned,
}

impl DateOrDateTime {
    /// Parses a single value, using `tzid` for local date-times.
    ///
    /// Eight digits are read as a DATE, everything else as a DATE-TIME.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::InvalidDateTime`] when the text is not a valid
    /// DATE or DATE-TIME.
    pub fn parse(text: &str, tzid: Option<&str>) -> Result<Self, ValueError> {
        let invalid = || ValueError::InvalidDateTime(text.to_string());
        let bytes = text.as_bytes();
        let date = parse_date(bytes.get(..8).ok_or_else(invalid)?).ok_or_else(invalid)?;
        let Some(rest) = bytes.get(8..).filter(|rest| !rest.is_empty()) else {
            return Ok(Self::Date(date));
        };

        let (time, utc) = match rest {
            [b'T', time @ .., b'Z'] if time.len() == 6 => (time, true),
            [b'T', time @ ..] if time.len() == 6 => (time, false),
            _ => return Err(invalid()),
        };
        let time = parse_time(time).ok_or_else(invalid)?;
        let datetime = DateTime::from_parts(date, time);
        Ok(match (utc, tzid) {
            (true, _) => Self::Utc(datetime),
            (false, Some(tzid)) => Self::Zoned {
                datetime,
                tzid: tzid.to_string(),
            },
            (false, None) => Self::Floating(datetime),
        })
    }

    /// Parses the value of a single-valued property such as `DTSTART`.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is not a DATE or DATE-TIME, or when it
    /// contradicts its `VALUE` parameter.
    pub fn from_property(property: &Property) -> Result<Self, ValueError> {
        let tzid = property.tzid();
        if let Some(tzid) = tzid {
            warn_unknown_zone(tzid);
        }

        let value = Self::parse(&property.value, tzid)?;
        match property.value_type() {
            Some(ValueType::Date) if !value.is_date() => {
                Err(ValueError::InvalidDate(property.value.clone()))
            }
            Some(ValueType::DateTime) if value.is_date() && has_value_param(property) => {
                Err(ValueError::InvalidDateTime(property.value.clone()))
            }
            _ => Ok(value),
        }
    }

    /// Parses every value of a multi-valued property such as `EXDATE` or
    /// `RDATE`. `VALUE=PERIOD` entries contribute their start.
    ///
    /// # Errors
    ///
    /// Returns the first value that fails to parse.
    pub fn list_from_property(property: &Property) -> Result<Vec<Self>, ValueError> {
        let tzid = property.tzid();
        if let Some(tzid) = tzid {
            warn_unknown_zone(tzid);
        }

        let is_period = property
            .parameter_value(ParameterKind::ValueType.name())
            .is_some_and(|v| v.eq_ignore_ascii_case(KW_PERIOD));
        property
            .value
            .split(',')
            .filter(|v| !v.is_empty())
            .map(|v| {
                let v = if is_period {
                    v.split_once('/').map_or(v, |(start, _)| start)
                } else {
                    v
                };
                Self::parse(v, tzid)
            })
            .collect()
    }

    /// Builds a property carrying this value, with `VALUE=DATE` or `TZID` as
    /// needed.
    #[must_use]
    pub fn to_property(&self, name: &str) -> Property {
        let property = Property::new(name, self.to_string());
        match self {
            Self::Date(_) => property.with_parameter(Parameter::new(
                ParameterKind::ValueType.name(),
                KW_DATE,
            )),
            Self::Zoned { tzid, .. } => property.with_parameter(Parameter::new(
                ParameterKind::TimeZoneIdentifier.name(),
                tzid.as_str(),
            )),
            Self::Floating(_) | Self::Utc(_) => property,
        }
    }

    /// Returns the shape of this value.
    #[must_use]
    pub const fn kind(&self) -> DateTimeKind {
        match self {
            Self::Date(_) => DateTimeKind::Date,
            Self::Floating(_) => DateTimeKind::Floating,
            Self::Utc(_) => DateTimeKind::Utc,
            Self::Zoned { .. } => DateTimeKind::Zoned,
        }
    }

    /// Whether this is an all-day value.
    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns the time zone identifier of a local date-time.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::Zoned { tzid, .. } => Some(tzid),
            _ => None,
        }
    }

    /// Returns the date part.
    #[must_use]
    pub fn date(&self) -> Date {
        self.civil().date()
    }

    /// Returns the wall-clock value; dates are at midnight.
    #[must_use]
    pub fn civil(&self) -> DateTime {
        match self {
            Self::Date(date) => date.to_datetime(Time::midnight()),
            Self::Floating(dt) | Self::Utc(dt) | Self::Zoned { datetime: dt, .. } => *dt,
        }
    }

    /// Returns a value of the same shape and zone carrying another wall-clock
    /// value. Dates drop the time part.
    #[must_use]
    pub fn with_civil(&self, civil: DateTime) -> Self {
        match self {
            Self::Date(_) => Self::Date(civil.date()),
            Self::Floating(_) => Self::Floating(civil),
            Self::Utc(_) => Self::Utc(civil),
            Self::Zoned { tzid, .. } => Self::Zoned {
                datetime: civil,
                tzid: tzid.clone(),
            },
        }
    }

    /// Returns the instant this value denotes.
    ///
    /// Floating values, dates and zones unknown to the time zone database are
    /// read as if they were UTC. Wall-clock times inside a DST gap resolve
    /// with the compatible strategy.
    #[must_use]
    pub fn instant(&self) -> Timestamp {
        let zone = match self {
            Self::Zoned { tzid, .. } => TimeZone::get(tzid).unwrap_or(TimeZone::UTC),
            _ => TimeZone::UTC,
        };
        zone.to_timestamp(self.civil()).unwrap_or(Timestamp::MIN)
    }

    /// Converts to UTC; dates and floating values are returned unchanged.
    #[must_use]
    pub fn to_utc(&self) -> Self {
        match self {
            Self::Zoned { .. } => Self::Utc(self.instant().to_zoned(TimeZone::UTC).datetime()),
            other => other.clone(),
        }
    }

    /// Re-expresses this value in the frame of `reference`: same shape and
    /// same zone, so that wall-clock values can be compared directly.
    ///
    /// Values without an instant (dates and floating values), or a pair with
    /// one of them, keep their wall-clock value.
    #[must_use]
    pub fn in_frame_of(&self, reference: &Self) -> Self {
        match (self, reference) {
            (Self::Utc(_) | Self::Zoned { .. }, Self::Utc(_)) => self.to_utc(),
            (Self::Utc(_) | Self::Zoned { .. }, Self::Zoned { tzid, .. }) => {
                match TimeZone::get(tzid) {
                    Ok(zone) => reference.with_civil(self.instant().to_zoned(zone).datetime()),
                    Err(_) => reference.with_civil(self.civil()),
                }
            }
            _ => reference.with_civil(self.civil()),
        }
    }

    fn rank(&self) -> u8 {
        match self.kind() {
            DateTimeKind::Date => 0,
            DateTimeKind::Floating => 1,
            DateTimeKind::Utc => 2,
            DateTimeKind::Zoned => 3,
        }
    }
}

impl Ord for DateOrDateTime {
    /// Compares by instant first. Equal instants are ordered by shape, then
    /// by zone identifier, then by wall-clock value, so that only identical
    /// values compare equal.
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant()
            .cmp(&other.instant())
            .then_with(|| self.rank().cmp(&other.rank()))
            .then_with(|| self.tzid().cmp(&other.tzid()))
            .then_with(|| self.civil().cmp(&other.civil()))
    }
}

impl PartialOrd for DateOrDateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for DateOrDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self.date();
        write!(f, "{:04}{:02}{:02}", date.year(), date.month(), date.day())?;
        if self.is_date() {
            return Ok(());
        }

        let time = self.civil().time();
        write!(f, "T{:02}{:02}{:02}", time.hour(), time.minute(), time.second())?;
        if matches!(self, Self::Utc(_)) {
            f.write_str("Z")?;
        }
        Ok(())
    }
}

fn has_value_param(property: &Property) -> bool {
    property
        .parameter(ParameterKind::ValueType.name())
        .is_some()
}

fn warn_unknown_zone(tzid: &str) {
    if TimeZone::get(tzid).is_err() {
        tracing::warn!(tzid, "unknown time zone, treating value as floating time");
    }
}

fn parse_digits<T: lexical::FromLexical>(bytes: &[u8]) -> Option<T> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    lexical::parse(bytes).ok()
}

fn parse_date(bytes: &[u8]) -> Option<Date> {
    let year = parse_digits(bytes.get(0..4)?)?;
    let month = parse_digits(bytes.get(4..6)?)?;
    let day = parse_digits(bytes.get(6..8)?)?;
    Date::new(year, month, day).ok()
}

fn parse_time(bytes: &[u8]) -> Option<Time> {
    let hour = parse_digits(bytes.get(0..2)?)?;
    let minute = parse_digits(bytes.get(2..4)?)?;
    let second: i8 = parse_digits(bytes.get(4..6)?)?;
    // a leap second is folded into the preceding second
    Time::new(hour, minute, second.min(59), 0).ok()
}

#[cfg(test)]
mod tests {
    use jiff::civil::{date, datetime};

    use super::*;

    fn zoned(tzid: &str, dt: DateTime) -> DateOrDateTime {
        DateOrDateTime::Zoned {
            datetime: dt,
            tzid: tzid.to_string(),
        }
    }

    #[test]
    fn parses_all_shapes() {
        assert_eq!(
            DateOrDateTime::parse("20240229", None),
            Ok(DateOrDateTime::Date(date(2024, 2, 29)))
        );
        assert_eq!(
            DateOrDateTime::parse("20240101T093000", None),
            Ok(DateOrDateTime::Floating(datetime(2024, 1, 1, 9, 30, 0, 0)))
        );
        assert_eq!(
            DateOrDateTime::parse("20240101T093000Z", Some("Europe/Paris")),
            Ok(DateOrDateTime::Utc(datetime(2024, 1, 1, 9, 30, 0, 0)))
        );
        assert_eq!(
            DateOrDateTime::parse("20240101T093000", Some("Europe/Paris")),
            Ok(zoned("Europe/Paris", datetime(2024, 1, 1, 9, 30, 0, 0)))
        );
    }

    #[test]
    fn rejects_invalid_values() {
        for text in [
            "2024010",
            "20230229",
            "20240101T",
            "20240101T2500",
            "20240101T250000",
            "20240101X093000",
            "2024-1-01",
            "+0240101",
        ] {
            assert!(DateOrDateTime::parse(text, None).is_err(), "{text}");
        }
    }

    #[test]
    fn displays_as_written() {
        for text in ["20240101", "20240101T093000", "20240101T093000Z"] {
            assert_eq!(DateOrDateTime::parse(text, None).unwrap().to_string(), text);
        }
    }

    #[test]
    fn reads_property_parameters() {
        let prop = crate::syntax::parse_line("DTSTART;TZID=America/New_York:20240310T023000").unwrap();
        let value = DateOrDateTime::from_property(&prop).unwrap();
        assert_eq!(value.tzid(), Some("America/New_York"));

        let bad = crate::syntax::parse_line("DTSTART;VALUE=DATE:20240310T023000").unwrap();
        assert!(DateOrDateTime::from_property(&bad).is_err());
    }

    #[test]
    fn reads_value_lists_and_periods() {
        let prop = crate::syntax::parse_line(
            "RDATE;VALUE=PERIOD:19960403T020000Z/19960403T040000Z,19960404T010000Z/PT3H",
        )
        .unwrap();
        let values = DateOrDateTime::list_from_property(&prop).unwrap();
        assert_eq!(
            values,
            [
                DateOrDateTime::Utc(datetime(1996, 4, 3, 2, 0, 0, 0)),
                DateOrDateTime::Utc(datetime(1996, 4, 4, 1, 0, 0, 0)),
            ]
        );
    }

    #[test]
    fn to_property_round_trips() {
        let value = zoned("Asia/Tokyo", datetime(2024, 5, 1, 8, 0, 0, 0));
        let prop = value.to_property("EXDATE");
        assert_eq!(prop.to_string(), "EXDATE;TZID=Asia/Tokyo:20240501T080000");
        assert_eq!(DateOrDateTime::from_property(&prop), Ok(value));

        let date = DateOrDateTime::Date(date(2024, 5, 1));
        assert_eq!(date.to_property("EXDATE").to_string(), "EXDATE;VALUE=DATE:20240501");
    }

    #[test]
    fn compares_by_instant() {
        let paris = zoned("Europe/Paris", datetime(2024, 1, 1, 10, 0, 0, 0));
        let utc_before = DateOrDateTime::Utc(datetime(2024, 1, 1, 8, 30, 0, 0));
        let utc_same = DateOrDateTime::Utc(datetime(2024, 1, 1, 9, 0, 0, 0));
        assert!(utc_before < paris);
        assert_eq!(paris.instant(), utc_same.instant());
        assert_ne!(paris, utc_same);
        assert_ne!(paris.cmp(&utc_same), Ordering::Equal);
    }

    #[test]
    fn resolves_dst_gap_compatibly() {
        // 02:30 does not exist on this day in New York; compatible picks 03:30 EDT
        let gap = zoned("America/New_York", datetime(2024, 3, 10, 2, 30, 0, 0));
        let expected = DateOrDateTime::Utc(datetime(2024, 3, 10, 7, 30, 0, 0));
        assert_eq!(gap.instant(), expected.instant());
    }

    #[test]
    fn unknown_zone_reads_as_floating() {
        let unknown = zoned("Mars/Olympus", datetime(2024, 1, 1, 10, 0, 0, 0));
        let floating = DateOrDateTime::Floating(datetime(2024, 1, 1, 10, 0, 0, 0));
        assert_eq!(unknown.instant(), floating.instant());
    }

    #[test]
    fn converts_between_frames() {
        let paris = zoned("Europe/Paris", datetime(2024, 7, 1, 10, 0, 0, 0));
        assert_eq!(
            paris.to_utc(),
            DateOrDateTime::Utc(datetime(2024, 7, 1, 8, 0, 0, 0))
        );

        let tokyo_ref = zoned("Asia/Tokyo", datetime(2024, 1, 1, 0, 0, 0, 0));
        assert_eq!(
            paris.in_frame_of(&tokyo_ref),
            zoned("Asia/Tokyo", datetime(2024, 7, 1, 17, 0, 0, 0))
        );

        let date_ref = DateOrDateTime::Date(date(2024, 1, 1));
        assert_eq!(
            paris.in_frame_of(&date_ref),
            DateOrDateTime::Date(date(2024, 7, 1))
        );
    }
}
