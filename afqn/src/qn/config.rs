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

//! Estimator configuration and update-policy selection.

use crate::error::Error;
use crate::qn::DEFAULT_ALPHA;
use crate::qn::DEFAULT_WINDOW_SIZE;

/// How the sketch is reconciled when an admission replaces an eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Synchronised replace: retouch the difference of every surviving
    /// neighbour against the evicted and admitted values. Exact; the
    /// sketch population never drifts.
    Full,
    /// Touch only `⌈(s−1)/fraction⌉` differences per step, chosen by
    /// uniform striding away from the replaced position.
    Uniform {
        /// Sampling divisor `t`; `1` touches every difference.
        fraction: u32,
    },
    /// Touch only `⌈(s−1)/fraction⌉` differences per step, consuming
    /// neighbours in order of increasing distance from the replaced value.
    Nearest {
        /// Sampling divisor `t`; `1` touches every difference.
        fraction: u32,
    },
}

impl UpdatePolicy {
    /// Returns the number of differences sampled per step for a window of
    /// `size` values, `s − 1` under the full policy.
    pub fn diffs_per_step(&self, size: usize) -> usize {
        let pairs = size - 1;
        match *self {
            UpdatePolicy::Full => pairs,
            UpdatePolicy::Uniform { fraction } | UpdatePolicy::Nearest { fraction } => {
                pairs.div_ceil(fraction as usize)
            }
        }
    }

    fn fraction(&self) -> u32 {
        match *self {
            UpdatePolicy::Full => 1,
            UpdatePolicy::Uniform { fraction } | UpdatePolicy::Nearest { fraction } => fraction,
        }
    }
}

/// Configuration of a [`QnEstimator`](crate::qn::QnEstimator).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QnConfig {
    /// Sliding-window size `s`.
    pub window: usize,
    /// Maximum number of sketch buckets before collapse fires.
    pub bound: usize,
    /// Initial relative-error target α.
    pub alpha: f64,
    /// Sketch reconciliation policy for online admissions.
    pub policy: UpdatePolicy,
}

impl QnConfig {
    /// Creates a configuration with the default bound `2s`, default α and
    /// the full update policy.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            bound: 2 * window,
            alpha: DEFAULT_ALPHA,
            policy: UpdatePolicy::Full,
        }
    }

    /// Sets the sketch bucket bound.
    pub fn with_bound(mut self, bound: usize) -> Self {
        self.bound = bound;
        self
    }

    /// Sets the initial relative-error target.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the update policy.
    pub fn with_policy(mut self, policy: UpdatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Checks the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), Error> {
        if self.window < 2 {
            return Err(Error::config("window must hold at least two values")
                .with_context("window", self.window));
        }
        if self.bound == 0 {
            return Err(Error::config("sketch bucket bound must be positive"));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::config("relative-error target must lie in (0, 1)")
                .with_context("alpha", self.alpha));
        }
        if self.policy.fraction() == 0 {
            return Err(Error::config("sampling fraction must be positive"));
        }
        Ok(())
    }
}

impl Default for QnConfig {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QnConfig::default();
        assert_eq!(config.window, DEFAULT_WINDOW_SIZE);
        assert_eq!(config.bound, 2 * DEFAULT_WINDOW_SIZE);
        assert_eq!(config.policy, UpdatePolicy::Full);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_settings() {
        assert!(QnConfig::new(1).validate().is_err());
        assert!(QnConfig::new(10).with_bound(0).validate().is_err());
        assert!(QnConfig::new(10).with_alpha(1.0).validate().is_err());
        let zero_fraction = QnConfig::new(10).with_policy(UpdatePolicy::Uniform { fraction: 0 });
        assert!(zero_fraction.validate().is_err());
    }

    #[test]
    fn test_diffs_per_step() {
        assert_eq!(UpdatePolicy::Full.diffs_per_step(9), 8);
        assert_eq!(UpdatePolicy::Uniform { fraction: 2 }.diffs_per_step(9), 4);
        assert_eq!(UpdatePolicy::Nearest { fraction: 3 }.diffs_per_step(9), 3);
        assert_eq!(UpdatePolicy::Uniform { fraction: 3 }.diffs_per_step(11), 4);
    }
}
