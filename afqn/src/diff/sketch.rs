// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Bucketed multiset of the window's pairwise absolute differences.

use std::collections::BTreeMap;

use crate::diff::Resolution;
use crate::diff::SINK_KEY;
use crate::error::Error;

/// Outcome of removing one count from a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrement {
    /// One count was removed; empty buckets are erased.
    Removed,
    /// The bucket did not exist.
    ///
    /// Under the full update protocol this is a synopsis bug; under sampled
    /// updates it is an expected consequence of lossy bookkeeping.
    Missing,
}

/// Map from bucket keys to positive occupancy counts.
///
/// Logically the sketch holds one count per unordered pair of window
/// values, keyed by the bucket of their absolute difference under the
/// current [`Resolution`]. No entry ever has count zero, and iteration is
/// always in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSketch {
    bins: BTreeMap<i64, u64>,
    population: u64,
}

impl DiffSketch {
    /// Creates an empty sketch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one count to the bucket at `key`, creating it if absent.
    pub fn increment(&mut self, key: i64) {
        *self.bins.entry(key).or_insert(0) += 1;
        self.population += 1;
    }

    /// Removes one count from the bucket at `key`.
    ///
    /// A bucket reaching zero is erased so the key set stays tight.
    pub fn decrement(&mut self, key: i64) -> Decrement {
        let Some(count) = self.bins.get_mut(&key) else {
            return Decrement::Missing;
        };
        *count -= 1;
        if *count == 0 {
            self.bins.remove(&key);
        }
        self.population -= 1;
        Decrement::Removed
    }

    /// Merges each bucket `k` into `⌈k/2⌉`, halving resolution.
    ///
    /// The sink bucket is not a log-scale bucket and merges only with
    /// itself. Total count is preserved exactly.
    pub fn collapse(&mut self) {
        let mut merged = BTreeMap::new();
        for (&key, &count) in &self.bins {
            let target = if key == SINK_KEY {
                SINK_KEY
            } else {
                // integer ceil(key / 2), negatives included
                (key + 1).div_euclid(2)
            };
            *merged.entry(target).or_insert(0) += count;
        }
        self.bins = merged;
    }

    /// Estimates the `q`-quantile of the bucketed differences.
    ///
    /// Walks the buckets in ascending key order and answers with the
    /// midpoint estimator of the first bucket whose cumulative count
    /// exceeds `q * (population - 1)`.
    pub fn estimate(&self, q: f64, resolution: &Resolution) -> Result<f64, Error> {
        if self.bins.is_empty() {
            return Err(Error::corrupted("quantile query on an empty sketch"));
        }
        let fraction = q * (self.population.saturating_sub(1)) as f64;
        let mut cumulative = 0u64;
        let mut hit = SINK_KEY;
        for (&key, &count) in &self.bins {
            cumulative += count;
            hit = key;
            if cumulative as f64 > fraction {
                break;
            }
        }
        Ok(resolution.value_for(hit))
    }

    /// Returns the number of live buckets.
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Returns true if the sketch holds no counts.
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Returns the total count across all buckets.
    pub fn population(&self) -> u64 {
        self.population
    }

    /// Returns the count at `key`, zero if the bucket is absent.
    pub fn count(&self, key: i64) -> u64 {
        self.bins.get(&key).copied().unwrap_or(0)
    }

    /// Iterates `(key, count)` pairs in ascending key order.
    pub fn bins(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        self.bins.iter().map(|(&k, &c)| (k, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_decrement_round() {
        let mut sketch = DiffSketch::new();
        sketch.increment(4);
        sketch.increment(4);
        sketch.increment(-7);
        assert_eq!(sketch.len(), 2);
        assert_eq!(sketch.population(), 3);

        assert_eq!(sketch.decrement(4), Decrement::Removed);
        assert_eq!(sketch.count(4), 1);
        assert_eq!(sketch.decrement(4), Decrement::Removed);
        // empty bucket is gone, not zeroed
        assert_eq!(sketch.len(), 1);
        assert_eq!(sketch.decrement(4), Decrement::Missing);
        assert_eq!(sketch.population(), 1);
    }

    #[test]
    fn test_collapse_key_mapping() {
        let mut sketch = DiffSketch::new();
        for key in [-4, -3, 1, 2, 3, 4] {
            sketch.increment(key);
        }
        sketch.increment(SINK_KEY);
        sketch.collapse();

        // -4 -> -2, -3 -> -1, 1 -> 1, 2 -> 1, 3 -> 2, 4 -> 2
        assert_eq!(sketch.count(-2), 1);
        assert_eq!(sketch.count(-1), 1);
        assert_eq!(sketch.count(1), 2);
        assert_eq!(sketch.count(2), 2);
        assert_eq!(sketch.count(SINK_KEY), 1);
        assert_eq!(sketch.population(), 7);
    }

    #[test]
    fn test_collapse_keeps_sink_apart() {
        let mut sketch = DiffSketch::new();
        sketch.increment(SINK_KEY);
        sketch.increment(SINK_KEY + 1);
        sketch.collapse();
        assert_eq!(sketch.count(SINK_KEY), 1);
        assert_eq!(sketch.count((SINK_KEY + 2).div_euclid(2)), 1);
    }

    #[test]
    fn test_estimate_on_empty_sketch_is_an_error() {
        let sketch = DiffSketch::new();
        let resolution = Resolution::new(0.01).unwrap();
        assert!(sketch.estimate(0.5, &resolution).is_err());
    }
}
