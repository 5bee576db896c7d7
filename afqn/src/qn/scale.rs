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

//! Finite-sample bias correction for the Qn scale statistic.

/// Consistency factor making Qn estimate the standard deviation at the
/// Gaussian, per Rousseeuw and Croux (1992).
pub const QN_CONSISTENCY_FACTOR: f64 = 2.2219;

/// Returns the small-sample correction `d_n` for a window of `n` values.
///
/// Values for n ≤ 9 are the tabulated constants; larger windows use the
/// odd/even closed forms.
pub fn bias_correction(n: usize) -> f64 {
    match n {
        2 => 0.399,
        3 => 0.994,
        4 => 0.512,
        5 => 0.844,
        6 => 0.611,
        7 => 0.857,
        8 => 0.669,
        _ if n <= 9 => 0.872,
        _ if n % 2 == 1 => n as f64 / (n as f64 + 1.4),
        _ => n as f64 / (n as f64 + 3.8),
    }
}

/// Returns the full multiplier applied to the raw k-th order statistic:
/// `d_n * 2.2219`.
pub fn qn_scale(n: usize) -> f64 {
    bias_correction(n) * QN_CONSISTENCY_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabulated_small_n() {
        assert_eq!(bias_correction(2), 0.399);
        assert_eq!(bias_correction(5), 0.844);
        assert_eq!(bias_correction(9), 0.872);
    }

    #[test]
    fn test_closed_forms() {
        assert!((bias_correction(11) - 11.0 / 12.4).abs() < 1e-12);
        assert!((bias_correction(10) - 10.0 / 13.8).abs() < 1e-12);
        assert!((qn_scale(1001) - 1001.0 / 1002.4 * QN_CONSISTENCY_FACTOR).abs() < 1e-12);
    }

    #[test]
    fn test_correction_approaches_one() {
        assert!(bias_correction(100_001) > 0.99);
        assert!(bias_correction(100_001) < 1.0);
    }
}
