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

//! Relative-error parametrisation of the logarithmic bucket grid.

use crate::diff::SINK_KEY;
use crate::error::Error;

/// Bucket resolution state: α, γ, log γ and the near-zero bound, owned
/// together so they can only change as one.
///
/// γ = (1+α)/(1−α). A difference `v` above the near-zero bound sits in
/// bucket `⌈log v / log γ⌉`, whose boundaries are `(γ^(k−1), γ^k]`; the
/// midpoint estimator `2·γ^k/(γ+1)` reproduces `v` within relative error α.
/// Differences at or below the bound fall into the sink bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    alpha: f64,
    gamma: f64,
    log_gamma: f64,
    null_bound: f64,
}

impl Resolution {
    /// Creates the resolution context for the given relative-error target.
    pub fn new(alpha: f64) -> Result<Self, Error> {
        if !(alpha > 0.0 && alpha < 1.0) || !alpha.is_finite() {
            return Err(
                Error::config("relative-error target must lie in (0, 1)")
                    .with_context("alpha", alpha),
            );
        }
        Ok(Self::from_alpha(alpha))
    }

    fn from_alpha(alpha: f64) -> Self {
        let gamma = (1.0 + alpha) / (1.0 - alpha);
        Self {
            alpha,
            gamma,
            log_gamma: gamma.log10(),
            null_bound: gamma.powi(-(SINK_KEY.unsigned_abs() as i32)),
        }
    }

    /// Returns the resolution after one collapse round.
    ///
    /// α ← 2α/(1+α²) doubles the relative error, which is exactly the
    /// composition matching a halving of bucket resolution: the new γ is
    /// the square of the old one. All four scalars are recomputed here, in
    /// one step.
    pub fn collapsed(&self) -> Self {
        Self::from_alpha(2.0 * self.alpha / (1.0 + self.alpha * self.alpha))
    }

    /// Returns the bucket key of the difference `value`.
    ///
    /// Values at or below the near-zero bound, identical pairs included,
    /// map to the sink key.
    pub fn bucket_key(&self, value: f64) -> i64 {
        if value <= self.null_bound {
            return SINK_KEY;
        }
        (value.log10() / self.log_gamma).ceil() as i64
    }

    /// Returns the midpoint estimator `2·γ^k/(γ+1)` for bucket `key`.
    ///
    /// The sink bucket estimates zero.
    pub fn value_for(&self, key: i64) -> f64 {
        if key == SINK_KEY {
            return 0.0;
        }
        2.0 * self.gamma.powf(key as f64) / (self.gamma + 1.0)
    }

    /// Returns the current relative-error target α.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Returns the current bucket base γ.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Returns the threshold below which differences are treated as zero.
    pub fn null_bound(&self) -> f64 {
        self.null_bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gamma_matches_alpha() {
        let res = Resolution::new(0.001).unwrap();
        assert!((res.gamma() - 1.002_002_002_002_002).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_out_of_range_alpha() {
        assert!(Resolution::new(0.0).is_err());
        assert!(Resolution::new(1.0).is_err());
        assert!(Resolution::new(-0.5).is_err());
        assert!(Resolution::new(f64::NAN).is_err());
    }

    #[test]
    fn test_collapse_squares_gamma() {
        let res = Resolution::new(0.25).unwrap();
        let next = res.collapsed();
        assert!((next.gamma() - res.gamma() * res.gamma()).abs() < 1e-12);
        // the alpha/gamma coupling survives the update
        let expected = (1.0 + next.alpha()) / (1.0 - next.alpha());
        assert!((next.gamma() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_bucket_key_boundaries() {
        let res = Resolution::new(0.5).unwrap();
        // gamma = 3: (1/3, 1] -> key 0, (1, 3] -> key 1, (3, 9] -> key 2
        assert_eq!(res.bucket_key(1.0), 0);
        assert_eq!(res.bucket_key(1.5), 1);
        assert_eq!(res.bucket_key(3.0), 1);
        assert_eq!(res.bucket_key(3.1), 2);
        assert_eq!(res.bucket_key(8.9), 2);
    }

    #[test]
    fn test_zero_difference_goes_to_sink() {
        let res = Resolution::new(0.001).unwrap();
        assert_eq!(res.bucket_key(0.0), SINK_KEY);
        assert_eq!(res.value_for(SINK_KEY), 0.0);
    }

    #[test]
    fn test_midpoint_estimator_within_alpha() {
        let res = Resolution::new(0.01).unwrap();
        for &v in &[0.002, 0.9, 1.0, 17.5, 4096.0] {
            let estimate = res.value_for(res.bucket_key(v));
            assert!(
                ((estimate - v) / v).abs() <= res.alpha() + 1e-12,
                "value {v} estimated as {estimate}"
            );
        }
    }
}
