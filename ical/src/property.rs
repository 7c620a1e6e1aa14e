// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Generic iCalendar properties.
//!
//! A [`Property`] is the `(name, parameters, value)` triple of one content
//! line. Values stay in their raw textual form; typed views are parsed on
//! demand by the components that need them.

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::keyword::{
    KW_ACTION, KW_ATTACH, KW_ATTENDEE, KW_CALSCALE, KW_CATEGORIES, KW_CLASS, KW_COMMENT,
    KW_COMPLETED, KW_CONTACT, KW_CREATED, KW_DESCRIPTION, KW_DTEND, KW_DTSTAMP, KW_DTSTART, KW_DUE,
    KW_DURATION, KW_EXDATE, KW_FREEBUSY, KW_GEO, KW_LAST_MODIFIED, KW_LOCATION, KW_METHOD,
    KW_ORGANIZER, KW_PERCENT_COMPLETE, KW_PRIORITY, KW_PRODID, KW_RDATE, KW_RECURRENCE_ID,
    KW_RELATED_TO, KW_REPEAT, KW_REQUEST_STATUS, KW_RESOURCES, KW_RRULE, KW_SEQUENCE, KW_STATUS,
    KW_SUMMARY, KW_TRANSP, KW_TRIGGER, KW_TZID, KW_TZNAME, KW_TZOFFSETFROM, KW_TZOFFSETTO,
    KW_TZURL, KW_UID, KW_URL, KW_VERSION,
};
use crate::parameter::{Parameter, ParameterKind, ValueType};
use crate::value::unescape_text;

/// Macro to define `PropertyKind` with the default value type of each kind.
///
/// Usage: `property_kind!(Variant => KW => ValueType, ...)`
macro_rules! property_kind {
    (
        $(
            $(#[$attr:meta])*
            $variant:ident => $kw:ident => $value_type:expr $(,)?
        )*
    ) => {
        /// Kind of iCalendar property.
        ///
        /// Only standard RFC 5545 names have a kind; experimental and unknown
        /// names are carried as opaque properties.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[expect(missing_docs)]
        pub enum PropertyKind {
            $(
                $(#[$attr])*
                $variant,
            )*
        }

        impl PropertyKind {
            /// Returns the name keyword for the property kind
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(PropertyKind::$variant => $kw,)*
                }
            }

            /// Returns the value type assumed when no `VALUE` parameter is present.
            #[must_use]
            pub const fn default_value_type(self) -> ValueType {
                match self {
                    $(PropertyKind::$variant => $value_type,)*
                }
            }
        }

        impl FromStr for PropertyKind {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Property names are case-insensitive per RFC 5545
                match s.to_ascii_uppercase().as_str() {
                    $($kw => Ok(PropertyKind::$variant),)*
                    _ => Err(()),
                }
            }
        }

        #[cfg(test)]
        const KINDS: &[PropertyKind] = &[
            $(PropertyKind::$variant,)*
        ];
    };
}

property_kind! {
    // 3.7.1.  Calendar Scale
    CalScale    => KW_CALSCALE  => ValueType::Text,
    // 3.7.2.  Method
    Method      => KW_METHOD    => ValueType::Text,
    // 3.7.3.  Product Identifier
    ProdId      => KW_PRODID    => ValueType::Text,
    // 3.7.4.  Version
    Version     => KW_VERSION   => ValueType::Text,
    // 3.8.1.1.  Attachment
    Attach      => KW_ATTACH    => ValueType::Uri,
    // 3.8.1.2.  Categories
    Categories  => KW_CATEGORIES => ValueType::Text,
    // 3.8.1.3.  Classification
    Class       => KW_CLASS     => ValueType::Text,
    // 3.8.1.4.  Comment
    Comment     => KW_COMMENT   => ValueType::Text,
    // 3.8.1.5.  Description
    Description => KW_DESCRIPTION => ValueType::Text,
    // 3.8.1.6.  Geographic Position
    Geo         => KW_GEO       => ValueType::Float,
    // 3.8.1.7.  Location
    Location    => KW_LOCATION  => ValueType::Text,
    // 3.8.1.8.  Percent Complete
    PercentComplete => KW_PERCENT_COMPLETE => ValueType::Integer,
    // 3.8.1.9.  Priority
    Priority    => KW_PRIORITY  => ValueType::Integer,
    // 3.8.1.10.  Resources
    Resources   => KW_RESOURCES => ValueType::Text,
    // 3.8.1.11.  Status
    Status      => KW_STATUS    => ValueType::Text,
    // 3.8.1.12.  Summary
    Summary     => KW_SUMMARY   => ValueType::Text,
    // 3.8.2.1.  Date-Time Completed
    Completed   => KW_COMPLETED => ValueType::DateTime,
    // 3.8.2.2.  Date-Time End
    DtEnd       => KW_DTEND     => ValueType::DateTime,
    // 3.8.2.3.  Date-Time Due
    Due         => KW_DUE       => ValueType::DateTime,
    // 3.8.2.4.  Date-Time Start
    DtStart     => KW_DTSTART   => ValueType::DateTime,
    // 3.8.2.5.  Duration
    Duration    => KW_DURATION  => ValueType::Duration,
    // 3.8.2.6.  Free/Busy Time
    FreeBusy    => KW_FREEBUSY  => ValueType::Period,
    // 3.8.2.7.  Time Transparency
    Transp      => KW_TRANSP    => ValueType::Text,
    // 3.8.3.1.  Time Zone Identifier
    TzId        => KW_TZID      => ValueType::Text,
    // 3.8.3.2.  Time Zone Name
    TzName      => KW_TZNAME    => ValueType::Text,
    // 3.8.3.3.  Time Zone Offset From
    TzOffsetFrom => KW_TZOFFSETFROM => ValueType::UtcOffset,
    // 3.8.3.4.  Time Zone Offset To
    TzOffsetTo  => KW_TZOFFSETTO => ValueType::UtcOffset,
    // 3.8.3.5.  Time Zone URL
    TzUrl       => KW_TZURL     => ValueType::Uri,
    // 3.8.4.1.  Attendee
    Attendee    => KW_ATTENDEE  => ValueType::CalAddress,
    // 3.8.4.2.  Contact
    Contact     => KW_CONTACT   => ValueType::Text,
    // 3.8.4.3.  Organizer
    Organizer   => KW_ORGANIZER => ValueType::CalAddress,
    // 3.8.4.4.  Recurrence ID
    RecurrenceId => KW_RECURRENCE_ID => ValueType::DateTime,
    // 3.8.4.5.  Related To
    RelatedTo   => KW_RELATED_TO => ValueType::Text,
    // 3.8.4.6.  Uniform Resource Locator
    Url         => KW_URL       => ValueType::Uri,
    // 3.8.4.7.  Unique Identifier
    Uid         => KW_UID       => ValueType::Text,
    // 3.8.5.1.  Exception Date-Times
    ExDate      => KW_EXDATE    => ValueType::DateTime,
    // 3.8.5.2.  Recurrence Date-Times
    RDate       => KW_RDATE     => ValueType::DateTime,
    // 3.8.5.3.  Recurrence Rule
    RRule       => KW_RRULE     => ValueType::Recur,
    // 3.8.6.1.  Action
    Action      => KW_ACTION    => ValueType::Text,
    // 3.8.6.2.  Repeat Count
    Repeat      => KW_REPEAT    => ValueType::Integer,
    // 3.8.6.3.  Trigger
    Trigger     => KW_TRIGGER   => ValueType::Duration,
    // 3.8.7.1.  Date-Time Created
    Created     => KW_CREATED   => ValueType::DateTime,
    // 3.8.7.2.  Date-Time Stamp
    DtStamp     => KW_DTSTAMP   => ValueType::DateTime,
    // 3.8.7.3.  Last Modified
    LastModified => KW_LAST_MODIFIED => ValueType::DateTime,
    // 3.8.7.4.  Sequence Number
    Sequence    => KW_SEQUENCE  => ValueType::Integer,
    // 3.8.8.3.  Request Status
    RequestStatus => KW_REQUEST_STATUS => ValueType::Text,
}

impl Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

/// One content line: `NAME[;PARAM=VALUE[,VALUE]...]*:VALUE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property name, in the case it was written.
    pub name: String,

    /// Parameters, in the order they were written.
    pub parameters: Vec<Parameter>,

    /// Raw value text, still escaped for TEXT values.
    pub value: String,
}

impl Property {
    /// Creates a property without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            value: value.into(),
        }
    }

    /// Adds a parameter, builder style.
    #[must_use]
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.set_parameter(parameter);
        self
    }

    /// Returns the kind of this property, `None` for unknown or `X-` names.
    #[must_use]
    pub fn kind(&self) -> Option<PropertyKind> {
        self.name.parse().ok()
    }

    /// Whether this is an experimental `X-` property.
    #[must_use]
    pub fn is_x_name(&self) -> bool {
        self.name.len() > 2
            && self
                .name
                .get(..2)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("X-"))
    }

    /// Whether the property has the given name, ignoring case.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Finds a parameter by name, ignoring case.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns the first value of the named parameter.
    #[must_use]
    pub fn parameter_value(&self, name: &str) -> Option<&str> {
        self.parameter(name).and_then(Parameter::first_value)
    }

    /// Inserts a parameter, replacing any existing one with the same name
    /// in place.
    pub fn set_parameter(&mut self, parameter: Parameter) {
        match self
            .parameters
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(&parameter.name))
        {
            Some(existing) => *existing = parameter,
            None => self.parameters.push(parameter),
        }
    }

    /// Removes every parameter with the given name.
    pub fn remove_parameter(&mut self, name: &str) {
        self.parameters.retain(|p| !p.name.eq_ignore_ascii_case(name));
    }

    /// Returns the value type from the `VALUE` parameter, falling back to the
    /// default type of the property kind.
    #[must_use]
    pub fn value_type(&self) -> Option<ValueType> {
        match self.parameter_value(ParameterKind::ValueType.name()) {
            Some(v) => v.parse().ok(),
            None => self.kind().map(PropertyKind::default_value_type),
        }
    }

    /// Returns the `TZID` parameter, if any.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.parameter_value(ParameterKind::TimeZoneIdentifier.name())
    }

    /// Returns the value with TEXT escapes resolved.
    #[must_use]
    pub fn text(&self) -> String {
        unescape_text(&self.value)
    }
}

impl Display for Property {
    /// Writes the unfolded content line, without the line terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for param in &self.parameters {
            write!(f, ";{param}")?;
        }
        write!(f, ":{}", self.value)
    }
}
