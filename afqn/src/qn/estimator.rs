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

use crate::diff::Decrement;
use crate::diff::DiffSketch;
use crate::diff::Resolution;
use crate::error::Error;
use crate::qn::QnConfig;
use crate::qn::UpdatePolicy;
use crate::qn::scale::qn_scale;
use crate::window::SortedWindow;
use crate::window::WindowRing;

/// Outcome of one online admission: the middle element of the window
/// judged against the robust dispersion of its neighbourhood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepVerdict {
    /// Sequence number of the middle element.
    pub seqno: u64,
    /// The middle element under test.
    pub item: f64,
    /// Current window median.
    pub median: f64,
    /// Bias-corrected Qn estimate of the window.
    pub qn: f64,
    /// `|item − median| − 3·Qn`; positive means outlier.
    pub z_score: f64,
    /// True if the middle element was flagged.
    pub outlier: bool,
    /// Collapse rounds executed since startup.
    pub collapses: u64,
    /// Live sketch buckets after this admission.
    pub buckets: usize,
    /// Relative-error target after this admission.
    pub alpha: f64,
}

/// Online estimator of the Qn scale statistic over a sliding window.
///
/// Each admission evicts the oldest of the last `s` values, reconciles the
/// sorted window and the difference sketch in one synchronised walk,
/// collapses the sketch back under its bucket bound if needed, and reads
/// the `k`-th order statistic of the `s(s−1)/2` pairwise differences off
/// the sketch, with `k = h(h−1)/2` and `h = ⌊s/2⌋ + 1`.
///
/// # Examples
///
/// ```rust
/// # use afqn::qn::{QnConfig, QnEstimator};
/// let mut estimator = QnEstimator::new(QnConfig::new(5)).unwrap();
/// for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
///     assert!(estimator.update(v).unwrap().is_none()); // warm-up
/// }
/// let verdict = estimator.update(6.0).unwrap().unwrap();
/// assert!(!verdict.outlier);
/// ```
#[derive(Debug, Clone)]
pub struct QnEstimator {
    config: QnConfig,
    ring: WindowRing,
    sorted: SortedWindow,
    sketch: DiffSketch,
    resolution: Resolution,
    collapses: u64,
    missing: u64,
    budget: usize,
    kth: u64,
    inset: u64,
    quantile: f64,
    scale: f64,
}

impl QnEstimator {
    /// Creates an estimator for the given configuration.
    pub fn new(config: QnConfig) -> Result<Self, Error> {
        config.validate()?;
        let resolution = Resolution::new(config.alpha)?;

        let s = config.window as u64;
        let h = s / 2 + 1;
        let kth = h * (h - 1) / 2;
        let inset = s * (s - 1) / 2;
        let quantile = if inset > 1 {
            (kth - 1) as f64 / (inset - 1) as f64
        } else {
            0.0
        };

        Ok(Self {
            config,
            ring: WindowRing::new(config.window),
            sorted: SortedWindow::new(config.window),
            sketch: DiffSketch::new(),
            resolution,
            collapses: 0,
            missing: 0,
            budget: config.policy.diffs_per_step(config.window),
            kth,
            inset,
            quantile,
            scale: qn_scale(config.window),
        })
    }

    /// Admits one stream value.
    ///
    /// Returns `None` during warm-up (the first `s` admissions) and the
    /// verdict on the window's middle element afterwards. NaN values are
    /// ignored.
    pub fn update(&mut self, item: f64) -> Result<Option<StepVerdict>, Error> {
        if item.is_nan() {
            return Ok(None);
        }
        if !self.ring.is_full() {
            self.warm_admit(item);
            return Ok(None);
        }

        let evicted = match self.ring.admit(item) {
            Some(evicted) => evicted,
            None => return Err(Error::corrupted("full window produced no eviction")),
        };

        // identical admit/evict: the synopsis is already exact
        if evicted != item {
            match self.config.policy {
                UpdatePolicy::Full => self.synchronised_replace(evicted, item)?,
                UpdatePolicy::Uniform { .. } | UpdatePolicy::Nearest { .. } => {
                    self.sampled_replace(evicted, item)?;
                }
            }
            self.collapse_to_bound();
        }

        self.ring.advance_middle();
        let (middle, seqno) = self.ring.middle();
        let median = self.sorted.median();
        let qn = self.scale * self.sketch.estimate(self.quantile, &self.resolution)?;
        let z_score = (middle - median).abs() - 3.0 * qn;

        Ok(Some(StepVerdict {
            seqno,
            item: middle,
            median,
            qn,
            z_score,
            outlier: z_score > 0.0,
            collapses: self.collapses,
            buckets: self.sketch.len(),
            alpha: self.resolution.alpha(),
        }))
    }

    /// Grows the window and adds the new value's differences to the sketch.
    fn warm_admit(&mut self, item: f64) {
        let prior = self.ring.len();
        self.ring.admit(item);
        self.sorted.insert(item);
        for j in 0..prior {
            let key = self
                .resolution
                .bucket_key((item - self.ring.filled()[j]).abs());
            self.sketch.increment(key);
        }
        self.collapse_to_bound();
    }

    /// Replaces `old` with `new` in the sorted window, retiring and
    /// admitting each neighbour's difference in the same walk.
    fn synchronised_replace(&mut self, old: f64, new: f64) -> Result<(), Error> {
        let resolution = self.resolution;
        let sketch = &mut self.sketch;
        let mut lost_bucket = None;
        self.sorted.replace(old, new, |neighbour| {
            let retired = resolution.bucket_key((neighbour - old).abs());
            let admitted = resolution.bucket_key((neighbour - new).abs());
            if retired != admitted {
                sketch.increment(admitted);
                if sketch.decrement(retired) == Decrement::Missing && lost_bucket.is_none() {
                    lost_bucket = Some(retired);
                }
            }
        })?;
        if let Some(key) = lost_bucket {
            return Err(
                Error::corrupted("difference missing from sketch during synchronised replace")
                    .with_context("bucket", key),
            );
        }
        Ok(())
    }

    /// Replaces `old` with `new` touching only a sampled subset of the
    /// differences around the two positions.
    fn sampled_replace(&mut self, old: f64, new: f64) -> Result<(), Error> {
        let pos = self.sorted.find(old)?;
        let removed = match self.config.policy {
            UpdatePolicy::Nearest { .. } => self.nearest_remove(pos, old),
            _ => self.uniform_remove(pos, old),
        };
        let planted = self.sorted.shift_into_place(pos, new);
        match self.config.policy {
            UpdatePolicy::Nearest { .. } => self.nearest_add(planted, removed, new),
            _ => self.uniform_add(planted, removed, new),
        }
        Ok(())
    }

    /// Retires up to `budget` differences of `old`, striding outward from
    /// `pos` and widening the start offset until the window is exhausted.
    fn uniform_remove(&mut self, pos: usize, old: f64) -> usize {
        let size = self.sorted.len();
        let stride = ((size - 1) / self.budget).max(1);
        let mut removed = 0usize;
        let mut round = 0usize;
        while removed < self.budget {
            let mut r = pos + 1 + round;
            let mut l = pos as isize - 1 - round as isize;
            if r >= size && l < 0 {
                break;
            }
            while r < size && removed < self.budget {
                let key = self
                    .resolution
                    .bucket_key((self.sorted.as_slice()[r] - old).abs());
                match self.sketch.decrement(key) {
                    Decrement::Removed => removed += 1,
                    Decrement::Missing => self.missing += 1,
                }
                r += stride;
            }
            while l >= 0 && removed < self.budget {
                let key = self
                    .resolution
                    .bucket_key((self.sorted.as_slice()[l as usize] - old).abs());
                match self.sketch.decrement(key) {
                    Decrement::Removed => removed += 1,
                    Decrement::Missing => self.missing += 1,
                }
                l -= stride as isize;
            }
            round += 1;
        }
        removed
    }

    /// Admits `budget` differences of `new`, striding outward from `pos`.
    fn uniform_add(&mut self, pos: usize, budget: usize, new: f64) {
        if budget == 0 {
            return;
        }
        let size = self.sorted.len();
        let stride = ((size - 1) / budget).max(1);
        let mut added = 0usize;
        let mut r = pos + 1;
        while r < size && added < budget {
            let key = self
                .resolution
                .bucket_key((self.sorted.as_slice()[r] - new).abs());
            self.sketch.increment(key);
            added += 1;
            r += stride;
        }
        let mut l = pos as isize - 1;
        while l >= 0 && added < budget {
            let key = self
                .resolution
                .bucket_key((self.sorted.as_slice()[l as usize] - new).abs());
            self.sketch.increment(key);
            added += 1;
            l -= stride as isize;
        }
    }

    /// Retires up to `budget` differences of `old`, consuming neighbours in
    /// order of increasing distance.
    fn nearest_remove(&mut self, pos: usize, old: f64) -> usize {
        let size = self.sorted.len();
        let mut removed = 0usize;
        let mut r = pos + 1;
        let mut l = pos as isize - 1;
        while removed < self.budget {
            if r < size && l >= 0 {
                let d_left = (self.sorted.as_slice()[l as usize] - old).abs();
                let d_right = (old - self.sorted.as_slice()[r]).abs();
                let key = self.resolution.bucket_key(d_left.min(d_right));
                match self.sketch.decrement(key) {
                    Decrement::Removed => removed += 1,
                    Decrement::Missing => self.missing += 1,
                }
                if d_left <= d_right {
                    l -= 1;
                } else {
                    r += 1;
                }
            } else {
                while r < size && removed < self.budget {
                    let key = self
                        .resolution
                        .bucket_key((self.sorted.as_slice()[r] - old).abs());
                    match self.sketch.decrement(key) {
                        Decrement::Removed => removed += 1,
                        Decrement::Missing => self.missing += 1,
                    }
                    r += 1;
                }
                while l >= 0 && removed < self.budget {
                    let key = self
                        .resolution
                        .bucket_key((self.sorted.as_slice()[l as usize] - old).abs());
                    match self.sketch.decrement(key) {
                        Decrement::Removed => removed += 1,
                        Decrement::Missing => self.missing += 1,
                    }
                    l -= 1;
                }
                break;
            }
        }
        removed
    }

    /// Admits `budget` differences of `new`, consuming neighbours in order
    /// of increasing distance.
    fn nearest_add(&mut self, pos: usize, budget: usize, new: f64) {
        let size = self.sorted.len();
        let mut added = 0usize;
        let mut r = pos + 1;
        let mut l = pos as isize - 1;
        while added < budget {
            if r < size && l >= 0 {
                let d_left = (self.sorted.as_slice()[l as usize] - new).abs();
                let d_right = (new - self.sorted.as_slice()[r]).abs();
                self.sketch
                    .increment(self.resolution.bucket_key(d_left.min(d_right)));
                added += 1;
                if d_left <= d_right {
                    l -= 1;
                } else {
                    r += 1;
                }
            } else {
                while r < size && added < budget {
                    let key = self
                        .resolution
                        .bucket_key((self.sorted.as_slice()[r] - new).abs());
                    self.sketch.increment(key);
                    added += 1;
                    r += 1;
                }
                while l >= 0 && added < budget {
                    let key = self
                        .resolution
                        .bucket_key((self.sorted.as_slice()[l as usize] - new).abs());
                    self.sketch.increment(key);
                    added += 1;
                    l -= 1;
                }
                break;
            }
        }
    }

    /// Collapses the sketch until its bucket count is back under the bound,
    /// advancing the resolution context once per round.
    fn collapse_to_bound(&mut self) {
        while self.sketch.len() > self.config.bound {
            self.resolution = self.resolution.collapsed();
            self.sketch.collapse();
            self.collapses += 1;
        }
    }

    /// Rebuilds the sketch from the live sorted window under the current
    /// resolution.
    ///
    /// Sampled update policies let the sketch drift from the true pairwise
    /// multiset over time; a periodic rebuild resets the drift.
    pub fn rebuild_sketch(&mut self) {
        let mut fresh = DiffSketch::new();
        let items = self.sorted.as_slice();
        for i in 0..items.len() {
            for j in 0..i {
                fresh.increment(self.resolution.bucket_key((items[i] - items[j]).abs()));
            }
        }
        self.sketch = fresh;
        self.collapse_to_bound();
    }

    /// Returns the raw (unscaled) estimate of the k-th smallest difference.
    pub fn estimate(&self) -> Result<f64, Error> {
        self.sketch.estimate(self.quantile, &self.resolution)
    }

    /// Returns the bias-corrected Qn estimate.
    pub fn qn(&self) -> Result<f64, Error> {
        Ok(self.scale * self.estimate()?)
    }

    /// Returns true once the window holds `s` values.
    pub fn is_warm(&self) -> bool {
        self.ring.is_full()
    }

    /// Returns the current relative-error target α.
    pub fn alpha(&self) -> f64 {
        self.resolution.alpha()
    }

    /// Returns the current bucket base γ.
    pub fn gamma(&self) -> f64 {
        self.resolution.gamma()
    }

    /// Returns the collapse rounds executed since startup.
    pub fn collapses(&self) -> u64 {
        self.collapses
    }

    /// Returns the number of live sketch buckets.
    pub fn buckets(&self) -> usize {
        self.sketch.len()
    }

    /// Returns the total count held by the sketch.
    pub fn population(&self) -> u64 {
        self.sketch.population()
    }

    /// Returns the number of sampled decrements that missed their bucket.
    pub fn missing_decrements(&self) -> u64 {
        self.missing
    }

    /// Returns the rank `k` of the order statistic Qn reads.
    pub fn kth(&self) -> u64 {
        self.kth
    }

    /// Returns `I = s(s−1)/2`, the pairwise-difference population.
    pub fn inset(&self) -> u64 {
        self.inset
    }

    /// Returns the quantile fraction `(k−1)/(I−1)` fed to the sketch.
    pub fn quantile(&self) -> f64 {
        self.quantile
    }

    /// Returns the bias-correction multiplier `d_n · 2.2219`.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the configuration the estimator was built with.
    pub fn config(&self) -> &QnConfig {
        &self.config
    }

    /// Returns the window values in admission order.
    pub fn window_values(&self) -> &[f64] {
        self.ring.filled()
    }

    /// Returns the window values in ascending order.
    pub fn sorted_values(&self) -> &[f64] {
        self.sorted.as_slice()
    }

    /// Iterates the sketch's `(key, count)` pairs in ascending key order.
    pub fn sketch_bins(&self) -> impl Iterator<Item = (i64, u64)> + '_ {
        self.sketch.bins()
    }
}
