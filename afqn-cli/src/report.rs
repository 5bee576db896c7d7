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

//! CSV result files for outlier and inlier verdicts.

use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Write;

use afqn::qn::QnEstimator;
use afqn::qn::StepVerdict;

/// Derives the file-name tag from a source label: its first four
/// characters, the way result files have historically been keyed.
pub fn file_tag(label: &str) -> String {
    label.chars().take(4).collect()
}

/// Writers for the outlier and inlier verdict files.
pub struct VerdictLog {
    outliers: BufWriter<File>,
    inliers: BufWriter<File>,
    outlier_count: u64,
    inlier_count: u64,
}

impl VerdictLog {
    const HEADER: &'static str = "seqNo,item,Median,Qn,z-score,collapses,bins,alpha";

    /// Creates `{tag}-Outlier-{s}-{b}.csv` and `{tag}-Inlier-{s}-{b}.csv`
    /// in the working directory and writes their headers.
    pub fn create(label: &str, window: usize, bound: usize) -> io::Result<Self> {
        let tag = file_tag(label);
        let mut outliers =
            BufWriter::new(File::create(format!("{tag}-Outlier-{window}-{bound}.csv"))?);
        let mut inliers =
            BufWriter::new(File::create(format!("{tag}-Inlier-{window}-{bound}.csv"))?);
        writeln!(outliers, "{}", Self::HEADER)?;
        writeln!(inliers, "{}", Self::HEADER)?;
        Ok(Self {
            outliers,
            inliers,
            outlier_count: 0,
            inlier_count: 0,
        })
    }

    /// Appends one verdict row to the matching file.
    pub fn record(&mut self, verdict: &StepVerdict) -> io::Result<()> {
        let file = if verdict.outlier {
            self.outlier_count += 1;
            &mut self.outliers
        } else {
            self.inlier_count += 1;
            &mut self.inliers
        };
        writeln!(
            file,
            "{},{:.6},{:.6},{:.6},{:.6},{},{},{:.6}",
            verdict.seqno,
            verdict.item,
            verdict.median,
            verdict.qn,
            verdict.z_score,
            verdict.collapses,
            verdict.buckets,
            verdict.alpha,
        )
    }

    /// Returns how many middle elements were flagged.
    pub fn outlier_count(&self) -> u64 {
        self.outlier_count
    }

    /// Returns how many middle elements passed.
    pub fn inlier_count(&self) -> u64 {
        self.inlier_count
    }

    /// Flushes both files.
    pub fn finish(mut self) -> io::Result<()> {
        self.outliers.flush()?;
        self.inliers.flush()
    }
}

/// Optional per-step synopsis diagnostics.
pub struct QuantileLog {
    file: BufWriter<File>,
}

impl QuantileLog {
    /// Creates `Quantiles-{tag}-{s}-{t}.csv` and writes its header.
    pub fn create(label: &str, window: usize, fraction: u32) -> io::Result<Self> {
        let tag = file_tag(label);
        let mut file = BufWriter::new(File::create(format!(
            "Quantiles-{tag}-{window}-{fraction}.csv"
        ))?);
        writeln!(file, "Population,Bins,Collapses,Alpha,Gamma,Estimate")?;
        Ok(Self { file })
    }

    /// Appends one row describing the sketch after an admission.
    pub fn record(&mut self, estimator: &QnEstimator, estimate: f64) -> io::Result<()> {
        writeln!(
            self.file,
            "{},{},{},{:.9},{:.9},{:.6}",
            estimator.population(),
            estimator.buckets(),
            estimator.collapses(),
            estimator.alpha(),
            estimator.gamma(),
            estimate,
        )
    }

    /// Flushes the file.
    pub fn finish(mut self) -> io::Result<()> {
        self.file.flush()
    }
}
