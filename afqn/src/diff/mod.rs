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

//! Logarithmically bucketed sketch of pairwise absolute differences.
//!
//! A difference `v` is routed to bucket `⌈log v / log γ⌉`, where
//! γ = (1+α)/(1−α) encodes the relative-error target α; the bucket
//! midpoint `2·γ^k/(γ+1)` reproduces any member within factor 1±α.
//! Identical pairs and sub-threshold differences share a reserved sink
//! bucket that never merges with the log-scale grid. When the bucket count
//! outgrows its bound the sketch collapses: adjacent buckets merge
//! pairwise and α advances by α ← 2α/(1+α²), squaring γ.

mod resolution;
mod sketch;

pub use self::resolution::Resolution;
pub use self::sketch::Decrement;
pub use self::sketch::DiffSketch;

/// Key of the sink bucket absorbing near-zero differences.
pub const SINK_KEY: i64 = -(1 << 30);
