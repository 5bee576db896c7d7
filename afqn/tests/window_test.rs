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

use afqn::window::SortedWindow;
use afqn::window::WindowRing;

/// Deterministic pseudo-stream used across the window tests.
fn stream_value(i: u64) -> f64 {
    ((i * 31 + 7) % 97) as f64 * 0.5
}

#[test]
fn test_ring_holds_last_s_values() {
    const S: usize = 7;
    let mut ring = WindowRing::new(S);
    let mut history = Vec::new();
    for i in 0..40u64 {
        let value = stream_value(i);
        history.push(value);
        let evicted = ring.admit(value);
        if history.len() <= S {
            assert_eq!(evicted, None);
        } else {
            assert_eq!(evicted, Some(history[history.len() - 1 - S]));
        }
    }

    let mut window: Vec<f64> = ring.filled().to_vec();
    let mut expected: Vec<f64> = history[history.len() - S..].to_vec();
    window.sort_by(f64::total_cmp);
    expected.sort_by(f64::total_cmp);
    assert_eq!(window, expected);
}

#[test]
fn test_middle_seqno_trails_by_half_a_window() {
    const S: usize = 9;
    let mut ring = WindowRing::new(S);
    for i in 0..S as u64 {
        ring.admit(stream_value(i));
    }
    for step in 1..=30u64 {
        ring.admit(stream_value(S as u64 + step - 1));
        ring.advance_middle();
        let (value, seqno) = ring.middle();
        // the middle of a window ending at seqno s + step
        assert_eq!(seqno, S as u64 / 2 + 1 + step);
        assert_eq!(value, stream_value(seqno - 1));
    }
}

#[test]
fn test_replace_preserves_sortedness_and_visit_count() {
    const S: usize = 11;
    let mut ring = WindowRing::new(S);
    let mut sorted = SortedWindow::new(S);
    for i in 0..S as u64 {
        ring.admit(stream_value(i));
        sorted.insert(stream_value(i));
    }

    for i in S as u64..120 {
        let item = stream_value(i);
        let evicted = ring.admit(item).unwrap();
        if evicted == item {
            continue;
        }
        let mut visits = 0usize;
        sorted.replace(evicted, item, |_| visits += 1).unwrap();
        assert_eq!(visits, S - 1);

        let window = sorted.as_slice();
        assert!(window.windows(2).all(|pair| pair[0] <= pair[1]));

        let mut lhs: Vec<f64> = ring.filled().to_vec();
        let mut rhs: Vec<f64> = window.to_vec();
        lhs.sort_by(f64::total_cmp);
        rhs.sort_by(f64::total_cmp);
        assert_eq!(lhs, rhs, "ring and sorted window diverged at step {i}");
    }
}

#[test]
fn test_replace_visit_order_matches_shift_direction() {
    let mut sorted = SortedWindow::new(4);
    for v in [1.0, 3.0, 5.0, 7.0] {
        sorted.insert(v);
    }
    let mut visited = Vec::new();
    sorted.replace(1.0, 4.0, |p| visited.push(p)).unwrap();
    assert_eq!(sorted.as_slice(), &[3.0, 4.0, 5.0, 7.0]);
    // upward shift: the displaced neighbour first, then the untouched tail
    assert_eq!(visited, vec![3.0, 5.0, 7.0]);
}

#[test]
fn test_find_miss_reports_corruption() {
    let mut sorted = SortedWindow::new(3);
    for v in [1.0, 2.0, 3.0] {
        sorted.insert(v);
    }
    let err = sorted.find(2.5).unwrap_err();
    assert_eq!(err.kind(), afqn::error::ErrorKind::SynopsisCorrupted);
    assert!(err.message().contains("sorted window"));
    // the offending value travels in the rendered context
    assert!(err.to_string().contains("value = 2.5"));
}
