// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Recurrence rule values as defined in RFC 5545 Section 3.3.10.

use std::fmt::{self, Display};

use chumsky::prelude::*;

use crate::keyword::{
    KW_RRULE_BYDAY, KW_RRULE_BYHOUR, KW_RRULE_BYMINUTE, KW_RRULE_BYMONTH, KW_RRULE_BYMONTHDAY,
    KW_RRULE_BYSECOND, KW_RRULE_BYSETPOS, KW_RRULE_BYWEEKNO, KW_RRULE_BYYEARDAY, KW_RRULE_COUNT,
    KW_RRULE_FREQ, KW_RRULE_INTERVAL, KW_RRULE_UNTIL, KW_RRULE_WKST,
};
use crate::value::{DateOrDateTime, ValueError};

/// Recurrence rule
///
/// Numeric filter values are range checked on construction, everything else
/// is reported by [`RecurrenceRule::errors`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecurrenceRule {
    freq: Option<Frequency>,
    until: Option<DateOrDateTime>,
    count: Option<u32>,
    interval: Option<u32>,
    by_second: Vec<u8>,
    by_minute: Vec<u8>,
    by_hour: Vec<u8>,
    by_day: Vec<WeekDayNum>,
    by_month_day: Vec<i8>,
    by_year_day: Vec<i16>,
    by_week_no: Vec<i8>,
    by_month: Vec<u8>,
    by_set_pos: Vec<i16>,
    wkst: Option<WeekDay>,
}

/// Recurrence frequency
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::EnumString, strum::Display,
)]
#[strum(serialize_all = "UPPERCASE")]
#[expect(missing_docs)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Day of the week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[expect(missing_docs)]
pub enum WeekDay {
    #[strum(serialize = "SU")]
    Sunday,
    #[strum(serialize = "MO")]
    Monday,
    #[strum(serialize = "TU")]
    Tuesday,
    #[strum(serialize = "WE")]
    Wednesday,
    #[strum(serialize = "TH")]
    Thursday,
    #[strum(serialize = "FR")]
    Friday,
    #[strum(serialize = "SA")]
    Saturday,
}

impl From<WeekDay> for jiff::civil::Weekday {
    fn from(value: WeekDay) -> Self {
        match value {
            WeekDay::Sunday => Self::Sunday,
            WeekDay::Monday => Self::Monday,
            WeekDay::Tuesday => Self::Tuesday,
            WeekDay::Wednesday => Self::Wednesday,
            WeekDay::Thursday => Self::Thursday,
            WeekDay::Friday => Self::Friday,
            WeekDay::Saturday => Self::Saturday,
        }
    }
}

impl From<jiff::civil::Weekday> for WeekDay {
    fn from(value: jiff::civil::Weekday) -> Self {
        match value {
            jiff::civil::Weekday::Sunday => Self::Sunday,
            jiff::civil::Weekday::Monday => Self::Monday,
            jiff::civil::Weekday::Tuesday => Self::Tuesday,
            jiff::civil::Weekday::Wednesday => Self::Wednesday,
            jiff::civil::Weekday::Thursday => Self::Thursday,
            jiff::civil::Weekday::Friday => Self::Friday,
            jiff::civil::Weekday::Saturday => Self::Saturday,
        }
    }
}

/// Day of week with optional ordinal, e.g. `MO`, `1MO`, `-1FR`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekDayNum {
    /// Occurrence within the month or year, counted from the end if negative
    pub ordinal: Option<i8>,
    /// Day of the week
    pub weekday: WeekDay,
}

impl Display for WeekDayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ordinal) = self.ordinal {
            write!(f, "{ordinal}")?;
        }
        write!(f, "{}", self.weekday)
    }
}

/// Legal domain of a numeric rule part.
struct Domain {
    part: &'static str,
    min: i64,
    max: i64,
    /// Negative values count from the end and zero is excluded
    signed: bool,
    range: &'static str,
}

impl Domain {
    const fn new(part: &'static str, min: i64, max: i64, range: &'static str) -> Self {
        Self {
            part,
            min,
            max,
            signed: false,
            range,
        }
    }

    const fn signed(part: &'static str, max: i64, range: &'static str) -> Self {
        Self {
            part,
            min: 1,
            max,
            signed: true,
            range,
        }
    }

    fn check(&self, value: i64) -> Result<(), ValueError> {
        let magnitude = if self.signed { value.abs() } else { value };
        if (self.min..=self.max).contains(&magnitude) {
            Ok(())
        } else {
            Err(ValueError::OutOfRange {
                part: self.part,
                value,
                range: self.range,
            })
        }
    }

    fn narrow<T: TryFrom<i64>>(&self, values: Vec<i64>) -> Result<Vec<T>, ValueError> {
        values
            .into_iter()
            .map(|v| {
                self.check(v)?;
                T::try_from(v).map_err(|_| ValueError::OutOfRange {
                    part: self.part,
                    value: v,
                    range: self.range,
                })
            })
            .collect()
    }

    fn check_all<T: Copy + Into<i64>>(&self, values: &[T]) -> Result<(), ValueError> {
        values.iter().try_for_each(|v| self.check((*v).into()))
    }
}

const BY_SECOND: Domain = Domain::new(KW_RRULE_BYSECOND, 0, 60, "0 to 60");
const BY_MINUTE: Domain = Domain::new(KW_RRULE_BYMINUTE, 0, 59, "0 to 59");
const BY_HOUR: Domain = Domain::new(KW_RRULE_BYHOUR, 0, 23, "0 to 23");
const BY_DAY: Domain = Domain::signed(KW_RRULE_BYDAY, 53, "+/-1 to 53");
const BY_MONTH_DAY: Domain = Domain::signed(KW_RRULE_BYMONTHDAY, 31, "+/-1 to 31");
const BY_YEAR_DAY: Domain = Domain::signed(KW_RRULE_BYYEARDAY, 366, "+/-1 to 366");
const BY_WEEK_NO: Domain = Domain::signed(KW_RRULE_BYWEEKNO, 53, "+/-1 to 53");
const BY_MONTH: Domain = Domain::new(KW_RRULE_BYMONTH, 1, 12, "1 to 12");
const BY_SET_POS: Domain = Domain::signed(KW_RRULE_BYSETPOS, 366, "+/-1 to 366");
const COUNT: Domain = Domain::new(KW_RRULE_COUNT, 0, 4_294_967_295, "0 to 4294967295");
const INTERVAL: Domain = Domain::new(KW_RRULE_INTERVAL, 0, 4_294_967_295, "0 to 4294967295");

impl RecurrenceRule {
    /// Creates a rule with only a frequency.
    #[must_use]
    pub fn new(freq: Frequency) -> Self {
        Self {
            freq: Some(freq),
            ..Self::default()
        }
    }

    /// Parses a RECUR value. Rule part names are case-insensitive.
    ///
    /// ```txt
    /// recur           = recur-rule-part *( ";" recur-rule-part )
    ///                 ;
    ///                 ; The rule parts are not ordered in any
    ///                 ; particular sequence.
    ///                 ;
    ///                 ; The FREQ rule part is REQUIRED,
    ///                 ; but MUST NOT occur more than once.
    ///                 ;
    ///                 ; The UNTIL or COUNT rule parts are OPTIONAL,
    ///                 ; but they MUST NOT occur in the same 'recur'.
    ///                 ;
    ///                 ; The other rule parts are OPTIONAL,
    ///                 ; but MUST NOT occur more than once.
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error for malformed text, repeated parts and numeric
    /// values outside their legal range. A missing FREQ or a COUNT together
    /// with UNTIL parse fine and show up in [`RecurrenceRule::errors`].
    pub fn parse(text: &str) -> Result<Self, ValueError> {
        let upper = text.to_ascii_uppercase();
        let parts = rule_parts()
            .parse(upper.as_str())
            .into_result()
            .map_err(|errs| {
                let message = errs
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                ValueError::InvalidRecurrenceRule(format!("{text}: {message}"))
            })?;
        Self::from_parts(parts)
    }

    fn from_parts(parts: Vec<Part<'_>>) -> Result<Self, ValueError> {
        fn once<T>(slot: &mut Option<T>, part: &'static str, value: T) -> Result<(), ValueError> {
            match slot {
                Some(_) => Err(ValueError::DuplicatePart(part)),
                None => {
                    *slot = Some(value);
                    Ok(())
                }
            }
        }

        let mut freq = None;
        let mut until = None;
        let mut count = None;
        let mut interval = None;
        let mut by_second = None;
        let mut by_minute = None;
        let mut by_hour = None;
        let mut by_day = None;
        let mut by_month_day = None;
        let mut by_year_day = None;
        let mut by_week_no = None;
        let mut by_month = None;
        let mut by_set_pos = None;
        let mut wkst = None;

        for part in parts {
            match part {
                Part::Freq(f) => once(&mut freq, KW_RRULE_FREQ, f)?,
                Part::Until(u) => once(&mut until, KW_RRULE_UNTIL, DateOrDateTime::parse(u, None)?)?,
                Part::Count(c) => {
                    COUNT.check(c)?;
                    once(&mut count, KW_RRULE_COUNT, u32::try_from(c).unwrap_or(u32::MAX))?;
                }
                Part::Interval(i) => {
                    INTERVAL.check(i)?;
                    once(&mut interval, KW_RRULE_INTERVAL, u32::try_from(i).unwrap_or(u32::MAX))?;
                }
                Part::BySecond(v) => once(&mut by_second, BY_SECOND.part, BY_SECOND.narrow(v)?)?,
                Part::ByMinute(v) => once(&mut by_minute, BY_MINUTE.part, BY_MINUTE.narrow(v)?)?,
                Part::ByHour(v) => once(&mut by_hour, BY_HOUR.part, BY_HOUR.narrow(v)?)?,
                Part::ByDay(v) => {
                    let days = v
                        .into_iter()
                        .map(|(ordinal, weekday)| {
                            let ordinal = ordinal.map(|o| BY_DAY.narrow(vec![o])).transpose()?;
                            Ok(WeekDayNum {
                                ordinal: ordinal.and_then(|o| o.first().copied()),
                                weekday,
                            })
                        })
                        .collect::<Result<Vec<_>, ValueError>>()?;
                    once(&mut by_day, BY_DAY.part, days)?;
                }
                Part::ByMonthDay(v) => {
                    once(&mut by_month_day, BY_MONTH_DAY.part, BY_MONTH_DAY.narrow(v)?)?;
                }
                Part::ByYearDay(v) => {
                    once(&mut by_year_day, BY_YEAR_DAY.part, BY_YEAR_DAY.narrow(v)?)?;
                }
                Part::ByWeekNo(v) => once(&mut by_week_no, BY_WEEK_NO.part, BY_WEEK_NO.narrow(v)?)?,
                Part::ByMonth(v) => once(&mut by_month, BY_MONTH.part, BY_MONTH.narrow(v)?)?,
                Part::BySetPos(v) => once(&mut by_set_pos, BY_SET_POS.part, BY_SET_POS.narrow(v)?)?,
                Part::Wkst(w) => once(&mut wkst, KW_RRULE_WKST, w)?,
            }
        }

        Ok(Self {
            freq,
            until,
            count,
            interval,
            by_second: by_second.unwrap_or_default(),
            by_minute: by_minute.unwrap_or_default(),
            by_hour: by_hour.unwrap_or_default(),
            by_day: by_day.unwrap_or_default(),
            by_month_day: by_month_day.unwrap_or_default(),
            by_year_day: by_year_day.unwrap_or_default(),
            by_week_no: by_week_no.unwrap_or_default(),
            by_month: by_month.unwrap_or_default(),
            by_set_pos: by_set_pos.unwrap_or_default(),
            wkst,
        })
    }

    /// Returns human-readable violations of the RFC 5545 constraints.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        match self.freq {
            None => errors.push("FREQ is required".to_string()),
            Some(freq) => {
                if !self.by_week_no.is_empty() && freq != Frequency::Yearly {
                    errors.push("BYWEEKNO is only valid with FREQ=YEARLY".to_string());
                }
                if !self.by_year_day.is_empty()
                    && matches!(freq, Frequency::Daily | Frequency::Weekly | Frequency::Monthly)
                {
                    errors.push(format!("BYYEARDAY is not valid with FREQ={freq}"));
                }
                if !self.by_month_day.is_empty() && freq == Frequency::Weekly {
                    errors.push("BYMONTHDAY is not valid with FREQ=WEEKLY".to_string());
                }
                if self.by_day.iter().any(|d| d.ordinal.is_some()) {
                    if !matches!(freq, Frequency::Monthly | Frequency::Yearly) {
                        errors.push(format!(
                            "BYDAY ordinals are only valid with FREQ=MONTHLY or FREQ=YEARLY, not {freq}"
                        ));
                    } else if freq == Frequency::Yearly && !self.by_week_no.is_empty() {
                        errors.push("BYDAY ordinals are not valid together with BYWEEKNO".to_string());
                    }
                }
            }
        }
        if self.count.is_some() && self.until.is_some() {
            errors.push("COUNT and UNTIL must not both be set".to_string());
        }
        if self.count == Some(0) {
            errors.push("COUNT must be positive".to_string());
        }
        if self.interval == Some(0) {
            errors.push("INTERVAL must be positive".to_string());
        }
        if !self.by_set_pos.is_empty() && !self.has_by_rules() {
            errors.push("BYSETPOS requires another BYxxx rule part".to_string());
        }
        errors
    }

    fn has_by_rules(&self) -> bool {
        !(self.by_second.is_empty()
            && self.by_minute.is_empty()
            && self.by_hour.is_empty()
            && self.by_day.is_empty()
            && self.by_month_day.is_empty()
            && self.by_year_day.is_empty()
            && self.by_week_no.is_empty()
            && self.by_month.is_empty())
    }

    /// Frequency, `None` only for an invalid rule
    #[must_use]
    pub fn freq(&self) -> Option<Frequency> {
        self.freq
    }

    /// Set the frequency.
    pub fn set_freq(&mut self, freq: Frequency) {
        self.freq = Some(freq);
    }

    /// Interval between periods, defaulting to 1
    #[must_use]
    pub fn interval(&self) -> u32 {
        self.interval.unwrap_or(1)
    }

    /// Set the interval. Zero is accepted and reported by `errors()`.
    pub fn set_interval(&mut self, interval: Option<u32>) {
        self.interval = interval;
    }

    /// Number of occurrences
    #[must_use]
    pub fn count(&self) -> Option<u32> {
        self.count
    }

    /// Set the number of occurrences.
    pub fn set_count(&mut self, count: Option<u32>) {
        self.count = count;
    }

    /// Inclusive upper bound
    #[must_use]
    pub fn until(&self) -> Option<&DateOrDateTime> {
        self.until.as_ref()
    }

    /// Set the inclusive upper bound.
    ///
    /// # Errors
    ///
    /// UNTIL is a DATE, a floating DATE-TIME or a UTC DATE-TIME; local times
    /// with a zone must be converted to UTC first.
    pub fn set_until(&mut self, until: Option<DateOrDateTime>) -> Result<(), ValueError> {
        if let Some(value @ DateOrDateTime::Zoned { .. }) = &until {
            return Err(ValueError::InvalidDateTime(format!(
                "UNTIL must be a DATE or a UTC DATE-TIME, got {value} in {}",
                value.tzid().unwrap_or_default()
            )));
        }
        self.until = until;
        Ok(())
    }

    /// Week start, defaulting to Monday
    #[must_use]
    pub fn wkst(&self) -> WeekDay {
        self.wkst.unwrap_or(WeekDay::Monday)
    }

    /// Set the week start.
    pub fn set_wkst(&mut self, wkst: Option<WeekDay>) {
        self.wkst = wkst;
    }

    /// BYSECOND values
    #[must_use]
    pub fn by_second(&self) -> &[u8] {
        &self.by_second
    }

    /// BYMINUTE values
    #[must_use]
    pub fn by_minute(&self) -> &[u8] {
        &self.by_minute
    }

    /// BYHOUR values
    #[must_use]
    pub fn by_hour(&self) -> &[u8] {
        &self.by_hour
    }

    /// BYDAY values
    #[must_use]
    pub fn by_day(&self) -> &[WeekDayNum] {
        &self.by_day
    }

    /// BYMONTHDAY values
    #[must_use]
    pub fn by_month_day(&self) -> &[i8] {
        &self.by_month_day
    }

    /// BYYEARDAY values
    #[must_use]
    pub fn by_year_day(&self) -> &[i16] {
        &self.by_year_day
    }

    /// BYWEEKNO values
    #[must_use]
    pub fn by_week_no(&self) -> &[i8] {
        &self.by_week_no
    }

    /// BYMONTH values
    #[must_use]
    pub fn by_month(&self) -> &[u8] {
        &self.by_month
    }

    /// BYSETPOS values
    #[must_use]
    pub fn by_set_pos(&self) -> &[i16] {
        &self.by_set_pos
    }

    /// Set BYSECOND, 0 to 60.
    ///
    /// # Errors
    /// Returns [`ValueError::OutOfRange`] and leaves the rule unchanged.
    pub fn set_by_second(&mut self, values: Vec<u8>) -> Result<(), ValueError> {
        BY_SECOND.check_all(&values)?;
        self.by_second = values;
        Ok(())
    }

    /// Set BYMINUTE, 0 to 59.
    ///
    /// # Errors
    /// Returns [`ValueError::OutOfRange`] and leaves the rule unchanged.
    pub fn set_by_minute(&mut self, values: Vec<u8>) -> Result<(), ValueError> {
        BY_MINUTE.check_all(&values)?;
        self.by_minute = values;
        Ok(())
    }

    /// Set BYHOUR, 0 to 23.
    ///
    /// # Errors
    /// Returns [`ValueError::OutOfRange`] and leaves the rule unchanged.
    pub fn set_by_hour(&mut self, values: Vec<u8>) -> Result<(), ValueError> {
        BY_HOUR.check_all(&values)?;
        self.by_hour = values;
        Ok(())
    }

    /// Set BYDAY, ordinals +/-1 to 53.
    ///
    /// # Errors
    /// Returns [`ValueError::OutOfRange`] and leaves the rule unchanged.
    pub fn set_by_day(&mut self, values: Vec<WeekDayNum>) -> Result<(), ValueError> {
        let ordinals: Vec<i8> = values.iter().filter_map(|d| d.ordinal).collect();
        BY_DAY.check_all(&ordinals)?;
        self.by_day = values;
        Ok(())
    }

    /// Set BYMONTHDAY, +/-1 to 31.
    ///
    /// # Errors
    /// Returns [`ValueError::OutOfRange`] and leaves the rule unchanged.
    pub fn set_by_month_day(&mut self, values: Vec<i8>) -> Result<(), ValueError> {
        BY_MONTH_DAY.check_all(&values)?;
        self.by_month_day = values;
        Ok(())
    }

    /// Set BYYEARDAY, +/-1 to 366.
    ///
    /// # Errors
    /// Returns [`ValueError::OutOfRange`] and leaves the rule unchanged.
    pub fn set_by_year_day(&mut self, values: Vec<i16>) -> Result<(), ValueError> {
        BY_YEAR_DAY.check_all(&values)?;
        self.by_year_day = values;
        Ok(())
    }

    /// Set BYWEEKNO, +/-1 to 53.
    ///
    /// # Errors
    /// Returns [`ValueError::OutOfRange`] and leaves the rule unchanged.
    pub fn set_by_week_no(&mut self, values: Vec<i8>) -> Result<(), ValueError> {
        BY_WEEK_NO.check_all(&values)?;
        self.by_week_no = values;
        Ok(())
    }

    /// Set BYMONTH, 1 to 12.
    ///
    /// # Errors
    /// Returns [`ValueError::OutOfRange`] and leaves the rule unchanged.
    pub fn set_by_month(&mut self, values: Vec<u8>) -> Result<(), ValueError> {
        BY_MONTH.check_all(&values)?;
        self.by_month = values;
        Ok(())
    }

    /// Set BYSETPOS, +/-1 to 366.
    ///
    /// # Errors
    /// Returns [`ValueError::OutOfRange`] and leaves the rule unchanged.
    pub fn set_by_set_pos(&mut self, values: Vec<i16>) -> Result<(), ValueError> {
        BY_SET_POS.check_all(&values)?;
        self.by_set_pos = values;
        Ok(())
    }
}

impl Display for RecurrenceRule {
    /// Writes the rule parts in a fixed order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: Display>(
            f: &mut fmt::Formatter<'_>,
            sep: &mut &'static str,
            name: &str,
            values: &[T],
        ) -> fmt::Result {
            if values.is_empty() {
                return Ok(());
            }
            write!(f, "{sep}{name}=")?;
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{v}")?;
            }
            *sep = ";";
            Ok(())
        }

        let mut sep = "";
        if let Some(freq) = self.freq {
            write!(f, "{KW_RRULE_FREQ}={freq}")?;
            sep = ";";
        }
        list(f, &mut sep, KW_RRULE_UNTIL, self.until.as_slice())?;
        list(f, &mut sep, KW_RRULE_COUNT, self.count.as_slice())?;
        list(f, &mut sep, KW_RRULE_INTERVAL, self.interval.as_slice())?;
        list(f, &mut sep, KW_RRULE_BYSECOND, &self.by_second)?;
        list(f, &mut sep, KW_RRULE_BYMINUTE, &self.by_minute)?;
        list(f, &mut sep, KW_RRULE_BYHOUR, &self.by_hour)?;
        list(f, &mut sep, KW_RRULE_BYDAY, &self.by_day)?;
        list(f, &mut sep, KW_RRULE_BYMONTHDAY, &self.by_month_day)?;
        list(f, &mut sep, KW_RRULE_BYYEARDAY, &self.by_year_day)?;
        list(f, &mut sep, KW_RRULE_BYWEEKNO, &self.by_week_no)?;
        list(f, &mut sep, KW_RRULE_BYMONTH, &self.by_month)?;
        list(f, &mut sep, KW_RRULE_BYSETPOS, &self.by_set_pos)?;
        list(f, &mut sep, KW_RRULE_WKST, self.wkst.as_slice())
    }
}

#[derive(Debug, Clone)]
enum Part<'src> {
    Freq(Frequency),
    Until(&'src str),
    Count(i64),
    Interval(i64),
    BySecond(Vec<i64>),
    ByMinute(Vec<i64>),
    ByHour(Vec<i64>),
    ByDay(Vec<(Option<i64>, WeekDay)>),
    ByMonthDay(Vec<i64>),
    ByYearDay(Vec<i64>),
    ByWeekNo(Vec<i64>),
    ByMonth(Vec<i64>),
    BySetPos(Vec<i64>),
    Wkst(WeekDay),
}

type Extra<'src> = extra::Err<Rich<'src, char>>;

/// ```txt
/// recur-rule-part = ( "FREQ" "=" freq )
///                 / ( "UNTIL" "=" enddate )
///                 / ( "COUNT" "=" 1*DIGIT )
///                 / ( "INTERVAL" "=" 1*DIGIT )
///                 / ( "BYSECOND" "=" byseclist )
///                 / ( "BYMINUTE" "=" byminlist )
///                 / ( "BYHOUR" "=" byhrlist )
///                 / ( "BYDAY" "=" bywdaylist )
///                 / ( "BYMONTHDAY" "=" bymodaylist )
///                 / ( "BYYEARDAY" "=" byyrdaylist )
///                 / ( "BYWEEKNO" "=" bywknolist )
///                 / ( "BYMONTH" "=" bymolist )
///                 / ( "BYSETPOS" "=" bysplist )
///                 / ( "WKST" "=" weekday )
/// ```
fn rule_parts<'src>() -> impl Parser<'src, &'src str, Vec<Part<'src>>, Extra<'src>> {
    let kw = |kw| just(kw).ignore_then(just('='));
    let list = || integer().separated_by(just(',')).at_least(1).collect::<Vec<_>>();

    let freq = select! { c @ 'A'..='Z' => c }
        .repeated()
        .at_least(1)
        .to_slice()
        .try_map(|s: &str, span| {
            s.parse::<Frequency>()
                .map_err(|_| Rich::custom(span, format!("unknown frequency {s}")))
        });

    let until = none_of(";").repeated().at_least(1).to_slice();

    let weekdaynum = integer()
        .or_not()
        .then(weekday())
        .separated_by(just(','))
        .at_least(1)
        .collect::<Vec<_>>();

    let part = choice((
        kw(KW_RRULE_FREQ).ignore_then(freq).map(Part::Freq),
        kw(KW_RRULE_UNTIL).ignore_then(until).map(Part::Until),
        kw(KW_RRULE_COUNT).ignore_then(integer()).map(Part::Count),
        kw(KW_RRULE_INTERVAL).ignore_then(integer()).map(Part::Interval),
        kw(KW_RRULE_BYSECOND).ignore_then(list()).map(Part::BySecond),
        kw(KW_RRULE_BYMINUTE).ignore_then(list()).map(Part::ByMinute),
        kw(KW_RRULE_BYHOUR).ignore_then(list()).map(Part::ByHour),
        kw(KW_RRULE_BYDAY).ignore_then(weekdaynum).map(Part::ByDay),
        kw(KW_RRULE_BYMONTHDAY).ignore_then(list()).map(Part::ByMonthDay),
        kw(KW_RRULE_BYMONTH).ignore_then(list()).map(Part::ByMonth),
        kw(KW_RRULE_BYYEARDAY).ignore_then(list()).map(Part::ByYearDay),
        kw(KW_RRULE_BYWEEKNO).ignore_then(list()).map(Part::ByWeekNo),
        kw(KW_RRULE_BYSETPOS).ignore_then(list()).map(Part::BySetPos),
        kw(KW_RRULE_WKST).ignore_then(weekday()).map(Part::Wkst),
    ));

    part.separated_by(just(';'))
        .at_least(1)
        .allow_trailing()
        .collect()
        .then_ignore(end())
}

/// ```txt
/// weekday     = "SU" / "MO" / "TU" / "WE" / "TH" / "FR" / "SA"
/// ```
fn weekday<'src>() -> impl Parser<'src, &'src str, WeekDay, Extra<'src>> + Clone {
    select! { c @ 'A'..='Z' => c }
        .repeated()
        .exactly(2)
        .to_slice()
        .try_map(|s: &str, span| {
            s.parse::<WeekDay>()
                .map_err(|_| Rich::custom(span, format!("unknown weekday {s}")))
        })
}

/// Signed integer, range checked later against the rule part's domain.
fn integer<'src>() -> impl Parser<'src, &'src str, i64, Extra<'src>> + Clone {
    select! { c @ ('+' | '-') => c }
        .or_not()
        .then(
            select! { c @ '0'..='9' => c }
                .repeated()
                .at_least(1)
                .at_most(10)
                .to_slice(),
        )
        .try_map(|(sign, digits): (Option<char>, &str), span| {
            let n = lexical::parse::<i64, _>(digits)
                .map_err(|_| Rich::custom(span, format!("invalid number {digits}")))?;
            Ok(if sign == Some('-') { -n } else { n })
        })
}
