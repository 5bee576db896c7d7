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

//! Ascending-order view of the window, maintained by directional shifts.

use crate::error::Error;

/// The window values in non-decreasing order.
///
/// Holds the same multiset as the admission-order ring. Replacement of an
/// evicted value is a single directional shift that keeps the array sorted
/// throughout; the shift walk yields every surviving neighbour exactly once
/// so the difference sketch can be kept in sync with the move.
#[derive(Debug, Clone)]
pub struct SortedWindow {
    items: Vec<f64>,
    size: usize,
}

impl SortedWindow {
    /// Creates an empty sorted window with capacity for `size` values.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "window size must be positive");
        Self {
            items: Vec::with_capacity(size),
            size,
        }
    }

    /// Inserts `value` during warm-up, keeping ascending order.
    ///
    /// Insertion is stable: an incoming duplicate lands before its equals.
    /// Returns the insertion index.
    pub fn insert(&mut self, value: f64) -> usize {
        debug_assert!(self.items.len() < self.size, "window already full");
        let idx = self.items.partition_point(|&p| p < value);
        self.items.insert(idx, value);
        idx
    }

    /// Locates one occurrence of `value` by binary search.
    ///
    /// A miss means the caller's bookkeeping has diverged from the window
    /// and is reported as a corrupted synopsis.
    pub fn find(&self, value: f64) -> Result<usize, Error> {
        let (mut l, mut r) = (0usize, self.items.len());
        while l < r {
            let m = l + (r - l) / 2;
            if self.items[m] == value {
                return Ok(m);
            }
            if self.items[m] < value {
                l = m + 1;
            } else {
                r = m;
            }
        }
        Err(Error::corrupted("evicted value not present in sorted window")
            .with_context("value", value))
    }

    /// Removes one occurrence of `old` and plants `new`, yielding to `visit`
    /// the pre-move occupant of every cell the walk touches.
    ///
    /// The walk runs the full shift direction, so each of the `s - 1`
    /// surviving neighbours is visited exactly once: the caller can retire
    /// the neighbour's difference against `old` and admit its difference
    /// against `new` without the sketch ever drifting from the window.
    /// Returns the index where `new` was planted.
    pub fn replace<F>(&mut self, old: f64, new: f64, mut visit: F) -> Result<usize, Error>
    where
        F: FnMut(f64),
    {
        let pos = self.find(old)?;
        let len = self.items.len();

        if new > old {
            for q in 0..pos {
                visit(self.items[q]);
            }
            let mut p = pos;
            while p + 1 < len && self.items[p + 1] < new {
                self.items[p] = self.items[p + 1];
                visit(self.items[p]);
                p += 1;
            }
            self.items[p] = new;
            for q in p + 1..len {
                visit(self.items[q]);
            }
            Ok(p)
        } else {
            for q in (pos + 1..len).rev() {
                visit(self.items[q]);
            }
            let mut p = pos;
            while p > 0 && self.items[p - 1] > new {
                self.items[p] = self.items[p - 1];
                visit(self.items[p]);
                p -= 1;
            }
            self.items[p] = new;
            for q in (0..p).rev() {
                visit(self.items[q]);
            }
            Ok(p)
        }
    }

    /// Moves `new` into place of the occupant at `pos` by a plain shift.
    ///
    /// Used by the sampled update paths, which account for the sketch
    /// around the old and new positions themselves. Returns the index
    /// where `new` landed.
    pub fn shift_into_place(&mut self, pos: usize, new: f64) -> usize {
        let len = self.items.len();
        if new > self.items[pos] {
            let mut p = pos;
            while p + 1 < len && self.items[p + 1] < new {
                self.items[p] = self.items[p + 1];
                p += 1;
            }
            self.items[p] = new;
            p
        } else {
            let mut p = pos;
            while p > 0 && self.items[p - 1] > new {
                self.items[p] = self.items[p - 1];
                p -= 1;
            }
            self.items[p] = new;
            p
        }
    }

    /// Returns the window median, the cell at index `len / 2`.
    pub fn median(&self) -> f64 {
        self.items[self.items.len() / 2]
    }

    /// Returns the values in ascending order.
    pub fn as_slice(&self) -> &[f64] {
        &self.items
    }

    /// Returns the number of values currently held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the window holds no values.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
