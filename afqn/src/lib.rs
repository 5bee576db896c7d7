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

//! Approximate Qn estimation and outlier detection over sliding windows.
//!
//! This crate keeps, in bounded memory, an approximation of the Qn scale
//! statistic of the last `s` values of a real-valued stream. The synopsis
//! couples three structures that evolve together on every admission: a
//! circular window over the stream, the same values in ascending order,
//! and a logarithmically bucketed sketch of the `s(s−1)/2` pairwise
//! absolute differences. A chosen quantile of the sketch yields Qn within
//! a controlled relative error, and the window's middle element is flagged
//! as an outlier when it falls more than `3·Qn` from the window median.
//!
//! The entry point is [`qn::QnEstimator`]; the window and sketch layers
//! are exposed for reuse and testing.

#![deny(missing_docs)]

pub mod diff;
pub mod error;
pub mod qn;
pub mod window;

/// Version string reported by the stream runner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
