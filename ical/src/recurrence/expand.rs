// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! The rule-only occurrence stream, in wall-clock time of the start value.

use std::collections::VecDeque;

use jiff::civil::{Date, DateTime, Time};

use crate::recurrence::filter::Expander;
use crate::value::{DateOrDateTime, RecurrenceRule};

/// A rule that has not matched for this many years is considered exhausted.
const MAX_BARREN_YEARS: i16 = 400;

/// A rule that has not matched for this many periods in a row is considered
/// exhausted. A sub-daily rule visits at most 86400 periods a day and skips
/// days that cannot match in one period.
const MAX_BARREN_PERIODS: u32 = 200_000;

/// State of a [`RuleIter`] right after it produced `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Checkpoint {
    /// The value produced last
    pub value: DateTime,
    /// Period the value belongs to, `-1` for the start value
    pub period: i64,
    /// Values produced so far, the start value included
    pub emitted: u32,
}

/// Iterator over the values of a rule, starting with the start value itself.
///
/// COUNT is counted here, before RDATE and EXDATE are applied.
#[derive(Debug, Clone)]
pub(crate) struct RuleIter {
    start: DateTime,
    expander: Option<Expander>,
    count: Option<u32>,
    until: Option<DateTime>,
    period: i64,
    next_period: i64,
    pending: VecDeque<DateTime>,
    last: Option<DateTime>,
    last_hit: Date,
    barren: u32,
    emitted: u32,
    done: bool,
}

impl RuleIter {
    /// Creates the stream of `rule` for `start`; without a rule the stream is
    /// the start value alone.
    pub fn new(rule: Option<&RecurrenceRule>, start: &DateOrDateTime) -> Self {
        let civil = start.civil();
        Self {
            start: civil,
            expander: rule.and_then(|rule| Expander::new(rule, civil)),
            count: rule.and_then(RecurrenceRule::count),
            until: rule.and_then(RecurrenceRule::until).map(|until| until_bound(until, start)),
            period: -1,
            next_period: 0,
            pending: VecDeque::new(),
            last: None,
            last_hit: civil.date(),
            barren: 0,
            emitted: 0,
            done: false,
        }
    }

    /// Creates a stream that continues right after `checkpoint`.
    pub fn resume(
        rule: Option<&RecurrenceRule>,
        start: &DateOrDateTime,
        checkpoint: Checkpoint,
    ) -> Self {
        let mut iter = Self::new(rule, start);
        iter.last = Some(checkpoint.value);
        iter.last_hit = checkpoint.value.date();
        iter.emitted = checkpoint.emitted;
        iter.period = checkpoint.period;
        if checkpoint.period >= 0
            && let Some(period) = iter
                .expander
                .as_ref()
                .and_then(|e| e.period(checkpoint.period))
        {
            iter.next_period = period.next;
            iter.pending = period
                .candidates
                .into_iter()
                .filter(|c| *c > checkpoint.value)
                .collect();
        }
        iter
    }

    /// The state after the value produced last.
    pub fn checkpoint(&self) -> Option<Checkpoint> {
        Some(Checkpoint {
            value: self.last?,
            period: self.period,
            emitted: self.emitted,
        })
    }
}

impl Iterator for RuleIter {
    type Item = DateTime;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.count.is_some_and(|count| self.emitted >= count) {
            self.done = true;
            return None;
        }

        let Some(last) = self.last else {
            // the start value is always the first occurrence
            self.last = Some(self.start);
            self.emitted = 1;
            return Some(self.start);
        };

        let Some(expander) = &self.expander else {
            self.done = true;
            return None;
        };

        loop {
            while let Some(candidate) = self.pending.pop_front() {
                if candidate <= last {
                    continue;
                }
                if self.until.is_some_and(|until| candidate > until) {
                    self.done = true;
                    return None;
                }
                self.last = Some(candidate);
                self.last_hit = candidate.date();
                self.barren = 0;
                self.emitted += 1;
                return Some(candidate);
            }

            let index = self.next_period;
            let Some(period) = expander.period(index) else {
                self.done = true;
                return None;
            };
            let past_until = self.until.is_some_and(|until| period.anchor > until);
            self.barren += 1;
            if past_until
                || self.barren > MAX_BARREN_PERIODS
                || period.anchor.year() - self.last_hit.year() > MAX_BARREN_YEARS
            {
                tracing::debug!(index, "recurrence rule exhausted");
                self.done = true;
                return None;
            }
            self.period = index;
            self.next_period = period.next;
            self.pending = period.candidates.into();
        }
    }
}

/// UNTIL as a wall-clock bound comparable with values of `start`.
///
/// A DATE bound on date-time values covers the whole day.
fn until_bound(until: &DateOrDateTime, start: &DateOrDateTime) -> DateTime {
    if until.is_date() && !start.is_date() {
        DateTime::from_parts(until.date(), Time::MAX)
    } else {
        until.in_frame_of(start).civil()
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::datetime;

    use super::*;

    fn rule_iter(rule: &str, start: &str) -> RuleIter {
        let rule = RecurrenceRule::parse(rule).unwrap();
        let start = DateOrDateTime::parse(start, None).unwrap();
        RuleIter::new(Some(&rule), &start)
    }

    #[test]
    fn start_is_the_first_value() {
        // 1997-09-02 is a Tuesday, not a Thursday
        let values: Vec<_> = rule_iter("FREQ=WEEKLY;COUNT=3;BYDAY=TH", "19970902T090000").collect();
        assert_eq!(
            values,
            [
                datetime(1997, 9, 2, 9, 0, 0, 0),
                datetime(1997, 9, 4, 9, 0, 0, 0),
                datetime(1997, 9, 11, 9, 0, 0, 0),
            ]
        );
    }

    #[test]
    fn until_is_inclusive() {
        let values: Vec<_> =
            rule_iter("FREQ=DAILY;UNTIL=20240103T090000", "20240101T090000").collect();
        assert_eq!(values.len(), 3);

        let values: Vec<_> = rule_iter("FREQ=DAILY;UNTIL=20240103", "20240101T090000").collect();
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn utc_until_applies_in_start_zone() {
        let rule = RecurrenceRule::parse("FREQ=DAILY;UNTIL=20240103T140000Z").unwrap();
        let start = DateOrDateTime::parse("20240101T090000", Some("America/New_York")).unwrap();
        // 14:00 UTC is 09:00 in New York
        assert_eq!(RuleIter::new(Some(&rule), &start).count(), 3);
    }

    #[test]
    fn never_matching_rule_terminates() {
        let values: Vec<_> =
            rule_iter("FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=30", "20240101T000000").collect();
        assert_eq!(values, [datetime(2024, 1, 1, 0, 0, 0, 0)]);
    }

    #[test]
    fn leap_second_only_rules_terminate() {
        for rule in ["FREQ=MINUTELY;BYSECOND=60", "FREQ=SECONDLY;BYSECOND=60"] {
            let values: Vec<_> = rule_iter(rule, "20240101T000000").collect();
            assert_eq!(values, [datetime(2024, 1, 1, 0, 0, 0, 0)], "{rule}");
        }
    }

    #[test]
    fn unreachable_time_of_day_terminates() {
        // every period starts on an even hour
        let values: Vec<_> =
            rule_iter("FREQ=HOURLY;INTERVAL=2;BYHOUR=1", "20240101T000000").collect();
        assert_eq!(values, [datetime(2024, 1, 1, 0, 0, 0, 0)]);
    }

    #[test]
    fn long_gaps_within_a_day_are_not_barren() {
        let rule = "FREQ=SECONDLY;BYHOUR=9;BYMINUTE=0;BYSECOND=0";
        let values: Vec<_> = rule_iter(rule, "20240101T100000").take(3).collect();
        assert_eq!(
            values,
            [
                datetime(2024, 1, 1, 10, 0, 0, 0),
                datetime(2024, 1, 2, 9, 0, 0, 0),
                datetime(2024, 1, 3, 9, 0, 0, 0),
            ]
        );
    }

    #[test]
    fn without_rule_only_start() {
        let start = DateOrDateTime::parse("20240101", None).unwrap();
        let values: Vec<_> = RuleIter::new(None, &start).collect();
        assert_eq!(values, [datetime(2024, 1, 1, 0, 0, 0, 0)]);
    }

    #[test]
    fn resume_continues_after_checkpoint() {
        let mut iter = rule_iter("FREQ=MONTHLY;BYMONTHDAY=1,15", "20240101T080000");
        let mut checkpoint = None;
        let mut head = Vec::new();
        for _ in 0..7 {
            head.push(iter.next().unwrap());
            if head.len() == 4 {
                checkpoint = iter.checkpoint();
            }
        }

        let rule = RecurrenceRule::parse("FREQ=MONTHLY;BYMONTHDAY=1,15").unwrap();
        let start = DateOrDateTime::parse("20240101T080000", None).unwrap();
        let resumed: Vec<_> = RuleIter::resume(Some(&rule), &start, checkpoint.unwrap())
            .take(3)
            .collect();
        assert_eq!(resumed, head[4..]);
    }

    #[test]
    fn count_survives_resume() {
        let rule = RecurrenceRule::parse("FREQ=DAILY;COUNT=5").unwrap();
        let start = DateOrDateTime::parse("20240101T080000", None).unwrap();
        let mut iter = RuleIter::new(Some(&rule), &start);
        iter.nth(2);
        let checkpoint = iter.checkpoint().unwrap();
        assert_eq!(checkpoint.emitted, 3);
        assert_eq!(RuleIter::resume(Some(&rule), &start, checkpoint).count(), 2);
    }
}
