// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Sparse samples of a rule stream, used to resume expansion close to a
//! target instead of replaying it from the start.

use jiff::civil::DateTime;

use crate::recurrence::expand::Checkpoint;

/// Maximum number of samples kept.
pub(crate) const CAPACITY: usize = 51;

/// Every this many values of a rule stream one is sampled.
pub(crate) const SAMPLE_INTERVAL: u32 = 21;

/// Lookup cache of a single component.
///
/// Samples are only valid for the start value and rule they were taken from,
/// so the cache remembers both and starts over as soon as either changes.
/// The cache never affects which occurrences are found, only how fast.
#[derive(Debug, Clone, Default)]
pub struct RecurrenceCache {
    key: Option<CacheKey>,
    /// Sorted by position in the stream, which is also chronological
    checkpoints: Vec<Checkpoint>,
}

/// The start value and rule, as written, that samples were taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CacheKey {
    pub start: String,
    pub rule: String,
}

impl RecurrenceCache {
    /// Number of samples held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Whether no sample is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Drops every sample.
    pub fn clear(&mut self) {
        self.key = None;
        self.checkpoints.clear();
    }

    /// Makes sure the samples belong to `key`, resetting the cache otherwise.
    pub(crate) fn sync(&mut self, key: CacheKey) {
        if self.key.as_ref() != Some(&key) {
            if !self.checkpoints.is_empty() {
                tracing::debug!(samples = self.checkpoints.len(), "recurrence cache reset");
            }
            self.checkpoints.clear();
            self.key = Some(key);
        }
    }

    /// Records `checkpoint` if it falls on the sampling interval.
    ///
    /// When full, every second sample is dropped. The first and the last
    /// sample always stay, so the covered range only grows.
    pub(crate) fn record(&mut self, checkpoint: Checkpoint) {
        if checkpoint.emitted % SAMPLE_INTERVAL != 0 {
            return;
        }

        let position = self
            .checkpoints
            .binary_search_by_key(&checkpoint.emitted, |c| c.emitted);
        if let Err(index) = position {
            self.checkpoints.insert(index, checkpoint);
            if self.checkpoints.len() > CAPACITY {
                let last = self.checkpoints.len() - 1;
                let mut index = 0;
                self.checkpoints.retain(|_| {
                    let keep = index % 2 == 0 || index == last;
                    index += 1;
                    keep
                });
            }
        }
    }

    /// Samples whose value satisfies `admit`, latest first.
    pub(crate) fn latest_first(&self, admit: impl Fn(DateTime) -> bool) -> Vec<Checkpoint> {
        self.checkpoints
            .iter()
            .rev()
            .filter(|c| admit(c.value))
            .copied()
            .collect()
    }
}
