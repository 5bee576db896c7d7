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

use afqn::diff::DiffSketch;
use afqn::diff::Resolution;
use afqn::diff::SINK_KEY;
use googletest::assert_that;
use googletest::prelude::near;

#[test]
fn test_bins_iterate_in_ascending_key_order() {
    let mut sketch = DiffSketch::new();
    for key in [13, -2, SINK_KEY, 101, 0] {
        sketch.increment(key);
    }
    let keys: Vec<i64> = sketch.bins().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![SINK_KEY, -2, 0, 13, 101]);
}

#[test]
fn test_estimate_walks_cumulative_counts() {
    // gamma = 3: value 1 -> key 0, 2 -> key 1, 10 -> key 3
    let resolution = Resolution::new(0.5).unwrap();
    let mut sketch = DiffSketch::new();
    for _ in 0..4 {
        sketch.increment(resolution.bucket_key(1.0));
    }
    for _ in 0..3 {
        sketch.increment(resolution.bucket_key(2.0));
    }
    for _ in 0..3 {
        sketch.increment(resolution.bucket_key(10.0));
    }
    assert_eq!(sketch.population(), 10);

    // midpoints: 2*3^0/4 = 0.5, 2*3^1/4 = 1.5, 2*3^3/4 = 13.5
    assert_that!(sketch.estimate(0.0, &resolution).unwrap(), near(0.5, 1e-9));
    assert_that!(sketch.estimate(0.5, &resolution).unwrap(), near(1.5, 1e-9));
    assert_that!(sketch.estimate(1.0, &resolution).unwrap(), near(13.5, 1e-9));
}

#[test]
fn test_estimate_is_monotone_in_q() {
    let resolution = Resolution::new(0.25).unwrap();
    let mut sketch = DiffSketch::new();
    for i in 1..=40u32 {
        sketch.increment(resolution.bucket_key(f64::from(i) * 0.37));
    }
    let mut previous = f64::NEG_INFINITY;
    for step in 0..=20u32 {
        let q = f64::from(step) / 20.0;
        let estimate = sketch.estimate(q, &resolution).unwrap();
        assert!(
            estimate >= previous,
            "estimate({q}) = {estimate} dropped below {previous}"
        );
        previous = estimate;
    }
}

#[test]
fn test_collapse_preserves_population_and_halves_bins() {
    let mut sketch = DiffSketch::new();
    sketch.increment(SINK_KEY);
    for key in -6..=9i64 {
        sketch.increment(key);
        sketch.increment(key);
    }
    let population = sketch.population();
    let bins = sketch.len();

    sketch.collapse();

    assert_eq!(sketch.population(), population);
    assert!(sketch.len() <= bins.div_ceil(2) + 1);
    assert_eq!(sketch.count(SINK_KEY), 1);
}

#[test]
fn test_repeated_collapse_converges_to_bound() {
    let mut sketch = DiffSketch::new();
    let mut resolution = Resolution::new(0.001).unwrap();
    for i in 0..512i64 {
        sketch.increment(i * 2 + 1);
    }
    let population = sketch.population();

    let mut rounds = 0;
    while sketch.len() > 4 {
        resolution = resolution.collapsed();
        sketch.collapse();
        rounds += 1;
        assert!(rounds <= 16, "collapse failed to make progress");
    }

    assert_eq!(sketch.population(), population);
    assert!(sketch.len() <= 4);
    // gamma tracks alpha through every round
    let expected = (1.0 + resolution.alpha()) / (1.0 - resolution.alpha());
    assert_that!(resolution.gamma(), near(expected, 1e-9));
}

#[test]
fn test_rebucketing_after_collapse_matches_merged_keys() {
    // ceil(ceil(x)/2) == ceil(x/2): the merged bucket of a value equals
    // its fresh bucket under the squared gamma
    let resolution = Resolution::new(0.3).unwrap();
    let next = resolution.collapsed();
    for &v in &[0.04, 0.9, 1.0, 2.5, 33.0, 1.2e6] {
        let merged = {
            let key = resolution.bucket_key(v);
            (key + 1).div_euclid(2)
        };
        assert_eq!(next.bucket_key(v), merged, "value {v}");
    }
}
