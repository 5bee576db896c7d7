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

//! Sliding-window storage: the admission-order ring and its sorted twin.
//!
//! Both structures hold the same multiset of the last `s` stream values.
//! The ring answers "what was evicted" and "what sits in the middle"; the
//! sorted window answers order queries and drives the synchronised
//! replacement walk that keeps the difference sketch consistent.

mod ring;
mod sorted;

pub use self::ring::WindowRing;
pub use self::sorted::SortedWindow;
