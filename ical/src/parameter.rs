// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Property parameters as defined in RFC 5545 Section 3.2.
//!
//! Parameters are kept as an ordered bag of `NAME=value[,value]` entries, so
//! that unknown and experimental parameters survive a round trip untouched.
//! The few parameters the engine interprets have typed views below.

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::keyword::{KW_RANGE, KW_TZID, KW_VALUE};

/// A single property parameter, e.g. `TZID=Europe/Paris` or `MEMBER="a","b"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name, in the case it was written.
    pub name: String,

    /// One or more values, in order.
    pub values: Vec<ParameterValue>,
}

/// One value of a parameter together with its quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterValue {
    /// The value without surrounding quotes.
    pub value: String,

    /// Whether the value was (or must be) written in double quotes.
    pub quoted: bool,
}

impl ParameterValue {
    /// Creates a value, quoting it when it contains characters that are not
    /// allowed in an unquoted `paramtext`.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let quoted = value.contains([',', ';', ':']);
        Self { value, quoted }
    }
}

impl Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quoted {
            write!(f, "\"{}\"", self.value)
        } else {
            f.write_str(&self.value)
        }
    }
}

impl Parameter {
    /// Creates a parameter with a single value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![ParameterValue::new(value)],
        }
    }

    /// Returns the typed kind of this parameter, if it is one the engine knows.
    #[must_use]
    pub fn kind(&self) -> Option<ParameterKind> {
        self.name.parse().ok()
    }

    /// Returns the first value, which is the only one for most parameters.
    #[must_use]
    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(|v| v.value.as_str())
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=", self.name)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

/// Parameters interpreted by the engine. Everything else is carried opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// `RANGE`, see [`RecurrenceIdRange`]
    Range,
    /// `TZID`
    TimeZoneIdentifier,
    /// `VALUE`, see [`ValueType`]
    ValueType,
}

impl ParameterKind {
    /// Returns the name keyword for the parameter kind
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Range => KW_RANGE,
            Self::TimeZoneIdentifier => KW_TZID,
            Self::ValueType => KW_VALUE,
        }
    }
}

impl FromStr for ParameterKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Range, Self::TimeZoneIdentifier, Self::ValueType]
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

/// Recurrence Identifier Range (RFC 5545 Section 3.2.13)
///
/// ```txt
/// rangeparam = "RANGE" "=" "THISANDFUTURE"
/// ; To specify the instance specified by the recurrence identifier
/// ; and all subsequent recurrence instances.
/// ```
///
/// `THISANDPRIOR` was dropped by RFC 5545 but is still accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(ascii_case_insensitive)]
pub enum RecurrenceIdRange {
    /// This and future instances
    #[strum(serialize = "THISANDFUTURE")]
    ThisAndFuture,

    /// This and prior instances (deprecated)
    #[strum(serialize = "THISANDPRIOR")]
    ThisAndPrior,
}

/// Value data types (RFC 5545 Section 3.2.20)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(ascii_case_insensitive, serialize_all = "SCREAMING-KEBAB-CASE")]
#[expect(missing_docs)]
pub enum ValueType {
    Binary,
    Boolean,
    CalAddress,
    Date,
    DateTime,
    Duration,
    Float,
    Integer,
    Period,
    Recur,
    Text,
    Time,
    Uri,
    UtcOffset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_values_with_separators() {
        assert!(ParameterValue::new("Doe, Jane").quoted);
        assert!(ParameterValue::new("mailto:a@b.c").quoted);
        assert!(!ParameterValue::new("Europe/Paris").quoted);
    }

    #[test]
    fn displays_multi_valued_parameter() {
        let param = Parameter {
            name: "MEMBER".to_string(),
            values: vec![
                ParameterValue::new("mailto:a@example.com"),
                ParameterValue {
                    value: "plain".to_string(),
                    quoted: false,
                },
            ],
        };
        assert_eq!(param.to_string(), r#"MEMBER="mailto:a@example.com",plain"#);
    }

    #[test]
    fn parses_known_kinds_case_insensitively() {
        assert_eq!(
            Parameter::new("tzid", "UTC").kind(),
            Some(ParameterKind::TimeZoneIdentifier)
        );
        assert_eq!(Parameter::new("X-FOO", "1").kind(), None);
    }

    #[test]
    fn parses_value_types() {
        assert_eq!("DATE-TIME".parse(), Ok(ValueType::DateTime));
        assert_eq!("cal-address".parse(), Ok(ValueType::CalAddress));
        assert_eq!(ValueType::UtcOffset.to_string(), "UTC-OFFSET");
        assert_eq!("thisandfuture".parse(), Ok(RecurrenceIdRange::ThisAndFuture));
    }
}
