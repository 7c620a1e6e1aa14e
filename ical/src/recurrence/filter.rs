// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! By-rule filters applied to one period of a recurrence rule.
//!
//! A period is one unit of the rule frequency, `interval` units apart. Every
//! day of the period is checked against the day-level parts (BYMONTH,
//! BYWEEKNO, BYYEARDAY, BYMONTHDAY, BYDAY), each surviving day is combined
//! with the time-level parts (BYHOUR, BYMINUTE, BYSECOND) and BYSETPOS picks
//! from the sorted result. Whether a part expands or limits follows from the
//! size of the period: a yearly period holds every day of the year, a daily
//! one only its own day.

use jiff::civil::{Date, DateTime, Time, Weekday};
use jiff::{Span, ToSpan};

use crate::value::{Frequency, RecurrenceRule, WeekDayNum};

const SECONDS_PER_DAY: i64 = 86_400;

/// The candidates of one period.
#[derive(Debug)]
pub(crate) struct Period {
    /// First instant of the period
    pub anchor: DateTime,
    /// Sorted, deduplicated occurrences of the period
    pub candidates: Vec<DateTime>,
    /// Index of the next period worth visiting
    pub next: i64,
}

/// A rule with its defaults resolved against a start value.
#[derive(Debug, Clone)]
pub(crate) struct Expander {
    freq: Frequency,
    interval: i64,
    wkst: Weekday,
    origin: DateTime,
    by_month: Vec<i8>,
    by_week_no: Vec<i8>,
    by_year_day: Vec<i16>,
    by_month_day: Vec<i8>,
    by_day: Vec<WeekDayNum>,
    by_hour: Vec<i8>,
    by_minute: Vec<i8>,
    by_second: Vec<i8>,
    by_set_pos: Vec<i16>,
}

impl Expander {
    /// Resolves `rule` against `start`. Returns `None` for rules that cannot
    /// produce an occurrence after the start: without frequency, with a zero
    /// interval or with no representable time of day (`BYSECOND=60` alone).
    pub fn new(rule: &RecurrenceRule, start: DateTime) -> Option<Self> {
        let freq = rule.freq()?;
        let interval = i64::from(rule.interval());
        if interval == 0 {
            return None;
        }

        let wkst = Weekday::from(rule.wkst());
        let mut by_month = to_i8(rule.by_month());
        let mut by_month_day = rule.by_month_day().to_vec();
        let mut by_day = rule.by_day().to_vec();
        if rule.by_week_no().is_empty()
            && rule.by_year_day().is_empty()
            && by_month_day.is_empty()
            && by_day.is_empty()
        {
            match freq {
                Frequency::Yearly => {
                    if by_month.is_empty() {
                        by_month.push(start.month());
                    }
                    by_month_day.push(start.day());
                }
                Frequency::Monthly => by_month_day.push(start.day()),
                Frequency::Weekly => by_day.push(WeekDayNum {
                    ordinal: None,
                    weekday: start.weekday().into(),
                }),
                _ => {}
            }
        }

        let mut by_hour = to_i8(rule.by_hour());
        if by_hour.is_empty() && freq > Frequency::Hourly {
            by_hour.push(start.hour());
        }
        let mut by_minute = to_i8(rule.by_minute());
        if by_minute.is_empty() && freq > Frequency::Minutely {
            by_minute.push(start.minute());
        }
        let mut by_second = to_i8(rule.by_second());
        if by_second.is_empty() && freq > Frequency::Secondly {
            by_second.push(start.second());
        }

        if !representable(&by_hour, 23)
            || !representable(&by_minute, 59)
            || !representable(&by_second, 59)
        {
            return None;
        }

        let date = start.date();
        let (origin_date, origin_time) = match freq {
            Frequency::Yearly => (date.first_of_year(), Time::midnight()),
            Frequency::Monthly => (date.first_of_month(), Time::midnight()),
            Frequency::Weekly => (week_start(date, wkst)?, Time::midnight()),
            Frequency::Daily => (date, Time::midnight()),
            Frequency::Hourly => (date, Time::new(start.hour(), 0, 0, 0).ok()?),
            Frequency::Minutely => (date, Time::new(start.hour(), start.minute(), 0, 0).ok()?),
            Frequency::Secondly => (
                date,
                Time::new(start.hour(), start.minute(), start.second(), 0).ok()?,
            ),
        };

        Some(Self {
            freq,
            interval,
            wkst,
            origin: DateTime::from_parts(origin_date, origin_time),
            by_month,
            by_week_no: rule.by_week_no().to_vec(),
            by_year_day: rule.by_year_day().to_vec(),
            by_month_day,
            by_day,
            by_hour,
            by_minute,
            by_second,
            by_set_pos: rule.by_set_pos().to_vec(),
        })
    }

    /// Expands period number `index`, counted from the period holding the
    /// start value. Returns `None` once the period leaves the supported
    /// calendar range.
    pub fn period(&self, index: i64) -> Option<Period> {
        let anchor = self.anchor(index)?;
        let days: Vec<Date> = self
            .days(anchor.date())
            .into_iter()
            .filter(|day| self.day_matches(*day))
            .collect();

        if days.is_empty() && self.freq < Frequency::Daily {
            return Some(Period {
                anchor,
                candidates: Vec::new(),
                next: self.first_period_after_day(index, anchor),
            });
        }

        let times = self.times(anchor.time());
        let candidates = days
            .iter()
            .flat_map(|day| times.iter().map(move |time| DateTime::from_parts(*day, *time)))
            .collect();
        Some(Period {
            anchor,
            candidates: self.select_positions(candidates),
            next: index + 1,
        })
    }

    fn anchor(&self, index: i64) -> Option<DateTime> {
        let steps = index.checked_mul(self.interval)?;
        let span = match self.freq {
            Frequency::Yearly => Span::new().try_years(steps),
            Frequency::Monthly => Span::new().try_months(steps),
            Frequency::Weekly => Span::new().try_weeks(steps),
            Frequency::Daily => Span::new().try_days(steps),
            Frequency::Hourly => Span::new().try_hours(steps),
            Frequency::Minutely => Span::new().try_minutes(steps),
            Frequency::Secondly => Span::new().try_seconds(steps),
        }
        .ok()?;
        self.origin.checked_add(span).ok()
    }

    /// Every day covered by the period starting on `first`.
    fn days(&self, first: Date) -> Vec<Date> {
        match self.freq {
            Frequency::Yearly => (1..=12)
                .filter(|month| self.by_month.is_empty() || self.by_month.contains(month))
                .filter_map(|month| Date::new(first.year(), month, 1).ok())
                .flat_map(days_of_month)
                .collect(),
            Frequency::Monthly => days_of_month(first).collect(),
            Frequency::Weekly => first.series(1.day()).take(7).collect(),
            _ => vec![first],
        }
    }

    fn day_matches(&self, day: Date) -> bool {
        if !self.by_month.is_empty() && !self.by_month.contains(&day.month()) {
            return false;
        }

        if self.freq == Frequency::Yearly
            && !self.by_week_no.is_empty()
            && !self.week_no_matches(day)
        {
            return false;
        }

        if !self.by_year_day.is_empty() {
            let n = day.day_of_year();
            let from_end = n - day.days_in_year() - 1;
            if !self.by_year_day.iter().any(|v| *v == n || *v == from_end) {
                return false;
            }
        }

        if !self.by_month_day.is_empty() {
            let n = day.day();
            let from_end = n - day.days_in_month() - 1;
            if !self.by_month_day.iter().any(|v| *v == n || *v == from_end) {
                return false;
            }
        }

        self.by_day.is_empty() || self.by_day.iter().any(|wd| self.weekday_matches(day, *wd))
    }

    fn week_no_matches(&self, day: Date) -> bool {
        let Some((year, week)) = week_number(day, self.wkst) else {
            return false;
        };
        let weeks = Date::new(year, 12, 28)
            .ok()
            .and_then(|d| week_number(d, self.wkst))
            .map_or(52, |(_, n)| n);
        self.by_week_no
            .iter()
            .any(|v| *v == week || *v == week - weeks - 1)
    }

    fn weekday_matches(&self, day: Date, wd: WeekDayNum) -> bool {
        if day.weekday() != Weekday::from(wd.weekday) {
            return false;
        }
        let Some(ordinal) = wd.ordinal else {
            return true;
        };

        // the ordinal counts within the month or the year
        let (first, last) = match self.freq {
            Frequency::Monthly => (day.first_of_month(), day.last_of_month()),
            Frequency::Yearly if !self.by_week_no.is_empty() => return true,
            Frequency::Yearly if !self.by_month.is_empty() => {
                (day.first_of_month(), day.last_of_month())
            }
            Frequency::Yearly => (day.first_of_year(), day.last_of_year()),
            _ => return true,
        };
        let ordinal = i16::from(ordinal);
        let from_start = (day.day_of_year() - first.day_of_year()) / 7 + 1;
        let from_end = -((last.day_of_year() - day.day_of_year()) / 7 + 1);
        ordinal == from_start || ordinal == from_end
    }

    /// Times of day for a period whose anchor is at `anchor`.
    fn times(&self, anchor: Time) -> Vec<Time> {
        let limit = |values: &[i8], v: i8| values.is_empty() || values.contains(&v);
        let (hours, minutes, seconds) = match self.freq {
            Frequency::Hourly => {
                if !limit(&self.by_hour, anchor.hour()) {
                    return Vec::new();
                }
                (vec![anchor.hour()], self.by_minute.clone(), self.by_second.clone())
            }
            Frequency::Minutely => {
                if !limit(&self.by_hour, anchor.hour()) || !limit(&self.by_minute, anchor.minute())
                {
                    return Vec::new();
                }
                (vec![anchor.hour()], vec![anchor.minute()], self.by_second.clone())
            }
            Frequency::Secondly => {
                if !limit(&self.by_hour, anchor.hour())
                    || !limit(&self.by_minute, anchor.minute())
                    || !limit(&self.by_second, anchor.second())
                {
                    return Vec::new();
                }
                return vec![anchor];
            }
            _ => (
                self.by_hour.clone(),
                self.by_minute.clone(),
                self.by_second.clone(),
            ),
        };

        let mut times: Vec<Time> = hours
            .iter()
            .flat_map(|h| minutes.iter().map(move |m| (*h, *m)))
            .flat_map(|(h, m)| seconds.iter().map(move |s| (h, m, *s)))
            // a leap second cannot be represented and is skipped
            .filter_map(|(h, m, s)| Time::new(h, m, s, 0).ok())
            .collect();
        times.sort_unstable();
        times.dedup();
        times
    }

    fn select_positions(&self, candidates: Vec<DateTime>) -> Vec<DateTime> {
        if self.by_set_pos.is_empty() {
            return candidates;
        }

        let len = i64::try_from(candidates.len()).unwrap_or(i64::MAX);
        let mut selected: Vec<DateTime> = self
            .by_set_pos
            .iter()
            .filter_map(|pos| {
                let pos = i64::from(*pos);
                let index = if pos > 0 { pos - 1 } else { len + pos };
                usize::try_from(index).ok().and_then(|i| candidates.get(i))
            })
            .copied()
            .collect();
        selected.sort_unstable();
        selected.dedup();
        selected
    }

    /// For sub-daily rules: the first period that starts on a later day.
    fn first_period_after_day(&self, index: i64, anchor: DateTime) -> i64 {
        let unit = match self.freq {
            Frequency::Hourly => 3_600,
            Frequency::Minutely => 60,
            _ => 1,
        };
        let time = anchor.time();
        let elapsed = i64::from(time.hour()) * 3_600
            + i64::from(time.minute()) * 60
            + i64::from(time.second());
        let units_left = (SECONDS_PER_DAY - elapsed + unit - 1) / unit;
        let steps = (units_left + self.interval - 1) / self.interval;
        index.saturating_add(steps.max(1))
    }
}

/// Whether a time part allows at least one value up to `max`.
fn representable(values: &[i8], max: i8) -> bool {
    values.is_empty() || values.iter().any(|v| (0..=max).contains(v))
}

fn to_i8(values: &[u8]) -> Vec<i8> {
    values.iter().filter_map(|v| i8::try_from(*v).ok()).collect()
}

fn days_of_month(first: Date) -> impl Iterator<Item = Date> {
    let len = usize::try_from(first.days_in_month()).unwrap_or(0);
    first.first_of_month().series(1.day()).take(len)
}

/// The first day of the week holding `day`.
pub(crate) fn week_start(day: Date, wkst: Weekday) -> Option<Date> {
    let offset = i64::from(day.weekday().since(wkst));
    day.checked_sub(Span::new().try_days(offset).ok()?).ok()
}

/// Week-numbering year and week number of `day`, RFC 5545 style: week 1 is
/// the first week, starting on `wkst`, that has at least four days in the
/// calendar year.
pub(crate) fn week_number(day: Date, wkst: Weekday) -> Option<(i16, i8)> {
    // the fourth day of a week decides which year the week belongs to
    let fourth = week_start(day, wkst)?.checked_add(3.days()).ok()?;
    let week = (fourth.day_of_year() - 1) / 7 + 1;
    Some((fourth.year(), i8::try_from(week).ok()?))
}
