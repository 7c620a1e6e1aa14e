// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Occurrence streams of recurring components, RFC 5545 Section 3.8.5.
//!
//! The recurrence set of a component is DTSTART and the values of its RRULE,
//! together with RDATE, minus EXDATE. It is produced lazily in ascending
//! order, so an unbounded rule yields an unbounded stream that the consumer
//! cuts off.

mod cache;
mod expand;
mod filter;

use std::cell::RefCell;
use std::collections::HashSet;

use jiff::Timestamp;
use jiff::civil::Date;

pub use crate::recurrence::cache::RecurrenceCache;
pub(crate) use crate::recurrence::cache::CacheKey;
use crate::recurrence::cache::SAMPLE_INTERVAL;
use crate::recurrence::expand::{Checkpoint, RuleIter};
use crate::value::{DateOrDateTime, RecurrenceRule, ValueError};

/// Error for a component whose recurrence set cannot be computed.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecurrenceError {
    /// The component has no DTSTART
    #[error("component has no DTSTART")]
    MissingStart,

    /// A recurrence property holds a value that cannot be read
    #[error("invalid {property}: {source}")]
    InvalidValue {
        /// Name of the offending property
        property: String,
        /// Why the value was rejected
        source: ValueError,
    },
}

/// Everything needed to expand one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceSet {
    /// DTSTART, always the first occurrence
    pub start: DateOrDateTime,
    /// RRULE, if any
    pub rule: Option<RecurrenceRule>,
    /// Values of every RDATE
    pub rdates: Vec<DateOrDateTime>,
    /// Values of every EXDATE
    pub exdates: Vec<DateOrDateTime>,
}

impl RecurrenceSet {
    /// A set with a single occurrence.
    #[must_use]
    pub fn new(start: DateOrDateTime) -> Self {
        Self {
            start,
            rule: None,
            rdates: Vec::new(),
            exdates: Vec::new(),
        }
    }

    /// Set the recurrence rule.
    #[must_use]
    pub fn with_rule(mut self, rule: RecurrenceRule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Streams every occurrence, without a cache.
    #[must_use]
    pub fn occurrences(&self) -> Occurrences<'static> {
        Occurrences::new(self, RuleIter::new(self.rule.as_ref(), &self.start), None, None)
    }

    /// Streams the occurrences at or after `from`, resuming from the closest
    /// cached sample when there is one.
    pub(crate) fn occurrences_from<'a>(
        &self,
        from: Option<&DateOrDateTime>,
        cache: Option<&'a RefCell<RecurrenceCache>>,
    ) -> Occurrences<'a> {
        let Some(from) = from else {
            return Occurrences::new(self, self.rule_iter(None), None, cache);
        };

        let bound = from.instant();
        let checkpoint = cache
            .and_then(|cache| cache.try_borrow().ok())
            .and_then(|cache| {
                cache
                    .latest_first(|value| self.start.with_civil(value).instant() <= bound)
                    .into_iter()
                    .next()
            });
        Occurrences::new(self, self.rule_iter(checkpoint), Some(bound), cache)
    }

    /// The latest occurrence at or before `target`, or strictly before it
    /// when `inclusive` is false.
    ///
    /// Starts from the closest sample that admits `target` and falls back to
    /// earlier samples, and finally to DTSTART, when everything between a
    /// sample and `target` is excluded.
    pub(crate) fn latest_before(
        &self,
        target: &DateOrDateTime,
        inclusive: bool,
        cache: Option<&RefCell<RecurrenceCache>>,
    ) -> Option<DateOrDateTime> {
        let bound = target.instant();
        let admits = |instant: Timestamp| {
            if inclusive {
                instant <= bound
            } else {
                instant < bound
            }
        };
        if !admits(self.start.instant()) {
            return None;
        }

        let samples = cache
            .and_then(|cache| cache.try_borrow().ok())
            .map(|cache| cache.latest_first(|value| admits(self.start.with_civil(value).instant())))
            .unwrap_or_default();
        let starts = samples.into_iter().map(Some).chain([None]);
        for checkpoint in starts {
            let from = checkpoint.map(|c| self.start.with_civil(c.value).instant());
            let found = Occurrences::new(self, self.rule_iter(checkpoint), from, cache)
                .take_while(|occurrence| admits(occurrence.instant()))
                .last();
            if found.is_some() {
                return found;
            }
        }
        None
    }

    /// Rule stream positioned so that its next value is the checkpoint value
    /// itself, or DTSTART without a checkpoint.
    fn rule_iter(&self, checkpoint: Option<Checkpoint>) -> RuleIter {
        let rule = self.rule.as_ref();
        match checkpoint {
            Some(checkpoint) => RuleIter::resume(rule, &self.start, checkpoint),
            None => RuleIter::new(rule, &self.start),
        }
    }
}

/// Lazy, strictly ascending occurrence stream of one component.
///
/// Created by [`crate::Component::occurrences`] and
/// [`crate::Calendar::occurrences`].
#[derive(Debug)]
pub struct Occurrences<'a> {
    start: DateOrDateTime,
    rule: RuleIter,
    head: Option<DateOrDateTime>,
    rdates: Vec<DateOrDateTime>,
    next_rdate: usize,
    excluded: Exclusions,
    from: Option<Timestamp>,
    last: Option<Timestamp>,
    cache: Option<&'a RefCell<RecurrenceCache>>,
}

impl<'a> Occurrences<'a> {
    fn new(
        set: &RecurrenceSet,
        rule: RuleIter,
        from: Option<Timestamp>,
        cache: Option<&'a RefCell<RecurrenceCache>>,
    ) -> Self {
        // a resumed rule stream starts with the sampled value itself
        let head = rule
            .checkpoint()
            .map(|checkpoint| set.start.with_civil(checkpoint.value));

        let mut rdates = set.rdates.clone();
        rdates.sort();
        rdates.dedup();
        if let Some(from) = from {
            rdates.retain(|rdate| rdate.instant() >= from);
        }

        let mut excluded = Exclusions::default();
        excluded.extend(set.exdates.iter());

        Self {
            start: set.start.clone(),
            rule,
            head,
            rdates,
            next_rdate: 0,
            excluded,
            from,
            last: None,
            cache,
        }
    }

    /// Also leaves out `values`, e.g. the RECURRENCE-ID of overrides.
    #[must_use]
    pub fn excluding<'v>(mut self, values: impl IntoIterator<Item = &'v DateOrDateTime>) -> Self {
        self.excluded.extend(values);
        self
    }

    fn pull_rule(&mut self) -> Option<DateOrDateTime> {
        let value = self.rule.next()?;
        if let Some(cache) = self.cache
            && let Some(checkpoint) = self.rule.checkpoint()
            && checkpoint.emitted % SAMPLE_INTERVAL == 0
            && let Ok(mut cache) = cache.try_borrow_mut()
        {
            cache.record(checkpoint);
        }
        Some(self.start.with_civil(value))
    }
}

impl Iterator for Occurrences<'_> {
    type Item = DateOrDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.head.is_none() {
                self.head = self.pull_rule();
            }

            let rdate = self.rdates.get(self.next_rdate);
            let value = match (self.head.take(), rdate) {
                (Some(head), Some(rdate)) if rdate < &head => {
                    self.head = Some(head);
                    self.next_rdate += 1;
                    rdate.clone()
                }
                (Some(head), _) => head,
                (None, Some(rdate)) => {
                    self.next_rdate += 1;
                    rdate.clone()
                }
                (None, None) => return None,
            };

            let instant = value.instant();
            if self.last.is_some_and(|last| instant <= last) {
                continue;
            }
            self.last = Some(instant);

            if self.excluded.contains(&value) || self.from.is_some_and(|from| instant < from) {
                continue;
            }
            return Some(value);
        }
    }
}

/// Values removed from a recurrence set.
///
/// Matching is by instant; an all-day value also removes date-time
/// occurrences on that day.
#[derive(Debug, Clone, Default)]
struct Exclusions {
    instants: HashSet<Timestamp>,
    dates: HashSet<Date>,
}

impl Exclusions {
    fn extend<'v>(&mut self, values: impl IntoIterator<Item = &'v DateOrDateTime>) {
        for value in values {
            if value.is_date() {
                self.dates.insert(value.date());
            }
            self.instants.insert(value.instant());
        }
    }

    fn contains(&self, value: &DateOrDateTime) -> bool {
        self.instants.contains(&value.instant()) || self.dates.contains(&value.date())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(text: &str) -> DateOrDateTime {
        DateOrDateTime::parse(text, None).unwrap()
    }

    fn set(start: &str, rule: &str) -> RecurrenceSet {
        RecurrenceSet::new(dt(start)).with_rule(RecurrenceRule::parse(rule).unwrap())
    }

    fn texts(values: impl Iterator<Item = DateOrDateTime>) -> Vec<String> {
        values.map(|v| v.to_string()).collect()
    }

    #[test]
    fn daily_count() {
        let set = set("20160101T100000", "FREQ=DAILY;COUNT=3");
        assert_eq!(
            texts(set.occurrences()),
            ["20160101T100000", "20160102T100000", "20160103T100000"]
        );
    }

    #[test]
    fn yearly_by_month_by_day_with_interval() {
        let set = set("19970101T000000", "FREQ=YEARLY;INTERVAL=2;BYMONTH=1;BYDAY=SU");
        let values = texts(set.occurrences().take(7));
        assert_eq!(
            values,
            [
                "19970101T000000",
                "19970105T000000",
                "19970112T000000",
                "19970119T000000",
                "19970126T000000",
                "19990103T000000",
                "19990110T000000",
            ]
        );
    }

    #[test]
    fn rdates_merge_and_exdates_subtract() {
        let mut set = set("20240101T090000", "FREQ=DAILY;COUNT=4");
        set.rdates = vec![dt("20240110T090000"), dt("20240102T090000"), dt("20240101T120000")];
        set.exdates = vec![dt("20240103T090000")];
        assert_eq!(
            texts(set.occurrences()),
            [
                "20240101T090000",
                "20240101T120000",
                "20240102T090000",
                "20240104T090000",
                "20240110T090000",
            ]
        );
    }

    #[test]
    fn date_exdate_removes_the_whole_day() {
        let mut set = set("20240101T090000", "FREQ=DAILY;COUNT=3");
        set.exdates = vec![dt("20240102")];
        assert_eq!(
            texts(set.occurrences()),
            ["20240101T090000", "20240103T090000"]
        );
    }

    #[test]
    fn start_bound_is_inclusive() {
        let set = set("20240101T090000", "FREQ=DAILY");
        let from = dt("20240105T090000");
        let values = texts(set.occurrences_from(Some(&from), None).take(2));
        assert_eq!(values, ["20240105T090000", "20240106T090000"]);
    }

    #[test]
    fn single_occurrence_without_rule() {
        let set = RecurrenceSet::new(dt("20240101"));
        assert_eq!(texts(set.occurrences()), ["20240101"]);
        let later = dt("20240102");
        assert_eq!(set.occurrences_from(Some(&later), None).count(), 0);
    }

    #[test]
    fn latest_before_skips_exclusions() {
        let mut set = set("20240101T090000", "FREQ=DAILY");
        set.exdates = vec![dt("20240105T090000")];
        let target = dt("20240105T120000");
        assert_eq!(
            set.latest_before(&target, true, None),
            Some(dt("20240104T090000"))
        );
        let target = dt("20240106T090000");
        assert_eq!(
            set.latest_before(&target, true, None),
            Some(dt("20240106T090000"))
        );
        assert_eq!(
            set.latest_before(&target, false, None),
            Some(dt("20240104T090000"))
        );
        assert_eq!(set.latest_before(&dt("20231231T000000"), true, None), None);
    }

    #[test]
    fn cache_is_transparent() {
        let mut set = set("20240101T090000", "FREQ=DAILY;BYHOUR=9,18");
        set.exdates = vec![dt("20240301T090000"), dt("20240301T180000")];
        let cache = RefCell::new(RecurrenceCache::default());
        cache.borrow_mut().sync(CacheKey {
            start: set.start.to_string(),
            rule: "FREQ=DAILY;BYHOUR=9,18".to_string(),
        });

        let targets = ["20241231T235959", "20240301T120000", "20240615T090000", "20240101T000000"];
        for target in targets {
            let target = dt(target);
            let cold = set.latest_before(&target, true, None);
            let warm = set.latest_before(&target, true, Some(&cache));
            assert_eq!(cold, warm, "target {target}");
        }
        assert!(!cache.borrow().is_empty());
    }
}
