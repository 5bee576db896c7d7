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

//! Stream runner: feeds a file or synthetic stream through the Qn
//! estimator and logs outlier/inlier verdicts to CSV.

use std::path::PathBuf;
use std::time::Instant;

use afqn::qn::DEFAULT_ALPHA;
use afqn::qn::DEFAULT_WINDOW_SIZE;
use afqn::qn::QnConfig;
use afqn::qn::QnEstimator;
use afqn::qn::UpdatePolicy;
use anyhow::bail;
use clap::Parser;
use tracing::info;

use crate::report::QuantileLog;
use crate::report::VerdictLog;
use crate::source::StreamSource;

mod report;
mod source;

#[derive(Parser, Debug)]
#[command(name = "afqn", version, about = "Approximate online Qn estimation over a sliding window")]
struct Args {
    /// Read the stream from a newline-separated file of decimal values.
    #[arg(short = 'f', value_name = "PATH")]
    file: Option<PathBuf>,

    /// Synthetic distribution: 1 uniform [x,y), 2 exponential(x), 3 normal(x,y).
    #[arg(short = 'd', value_name = "TYPE")]
    distribution: Option<u8>,

    /// First distribution parameter (a, rate, or mean).
    #[arg(short = 'x', value_name = "VAL", default_value_t = 0.0)]
    xparam: f64,

    /// Second distribution parameter (b or standard deviation).
    #[arg(short = 'y', value_name = "VAL", default_value_t = 0.0)]
    yparam: f64,

    /// Sliding-window size s.
    #[arg(short = 's', value_name = "INT", default_value_t = DEFAULT_WINDOW_SIZE)]
    window: usize,

    /// Number of online items after warm-up; the total stream length is s + n.
    #[arg(short = 'n', value_name = "LONG")]
    count: Option<u64>,

    /// Initial relative-error target alpha.
    #[arg(short = 'a', value_name = "FLOAT", default_value_t = DEFAULT_ALPHA)]
    alpha: f64,

    /// Sketch bucket bound (defaults to 2s).
    #[arg(short = 'b', value_name = "INT")]
    bound: Option<usize>,

    /// Sampling divisor t: touch only ceil((s-1)/t) differences per step.
    #[arg(short = 't', value_name = "INT", default_value_t = 1)]
    fraction: u32,

    /// With t > 1, sample nearest neighbours instead of uniform strides.
    #[arg(long)]
    nearest: bool,

    /// Seed for synthetic streams; defaults to entropy.
    #[arg(long, value_name = "LONG")]
    seed: Option<u64>,

    /// Also write per-step synopsis diagnostics.
    #[arg(long)]
    quantile_log: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let Some(count) = args.count else {
        bail!("the online stream length is required: pass -n (total items processed is s + n)");
    };
    if args.alpha <= 0.0 {
        bail!("the initial alpha must be positive");
    }
    if args.fraction == 0 {
        bail!("the sampling divisor -t must be positive");
    }

    let mut source = match (&args.file, args.distribution) {
        (Some(path), None) => StreamSource::from_file(path)?,
        (None, Some(dtype)) => StreamSource::synthetic(dtype, args.xparam, args.yparam, args.seed)?,
        (Some(_), Some(_)) => {
            bail!("provide either an input file (-f) or a distribution type (-d), not both")
        }
        (None, None) => bail!("an input file (-f) or a distribution type (-d) must be provided"),
    };

    let bound = args.bound.unwrap_or(2 * args.window);
    let policy = if args.fraction <= 1 {
        UpdatePolicy::Full
    } else if args.nearest {
        UpdatePolicy::Nearest {
            fraction: args.fraction,
        }
    } else {
        UpdatePolicy::Uniform {
            fraction: args.fraction,
        }
    };
    let config = QnConfig::new(args.window)
        .with_bound(bound)
        .with_alpha(args.alpha)
        .with_policy(policy);
    let mut estimator = QnEstimator::new(config)?;

    info!(
        version = afqn::VERSION,
        source = source.label(),
        window = args.window,
        online = count,
        total = args.window as u64 + count,
        "starting Qn estimation"
    );
    info!(
        inset = estimator.inset(),
        kth = estimator.kth(),
        quantile = estimator.quantile(),
        bound,
        alpha = estimator.alpha(),
        gamma = estimator.gamma(),
        scale = estimator.scale(),
        policy = ?policy,
        "synopsis parameters"
    );

    let mut verdicts = VerdictLog::create(source.label(), args.window, bound)?;
    let mut quantiles = if args.quantile_log {
        Some(QuantileLog::create(source.label(), args.window, args.fraction)?)
    } else {
        None
    };

    for _ in 0..args.window {
        estimator.update(source.next_value()?)?;
    }
    info!(
        buckets = estimator.buckets(),
        population = estimator.population(),
        collapses = estimator.collapses(),
        "warm-up complete"
    );

    let started = Instant::now();
    let mut checked = 0u64;
    for _ in 0..count {
        let item = source.next_value()?;
        if let Some(verdict) = estimator.update(item)? {
            verdicts.record(&verdict)?;
            if let Some(log) = &mut quantiles {
                log.record(&estimator, verdict.qn)?;
            }
            checked += 1;
        }
    }
    let elapsed = started.elapsed();

    let throughput = if elapsed.as_secs_f64() > 0.0 {
        checked as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    info!(
        outliers = verdicts.outlier_count(),
        inliers = verdicts.inlier_count(),
        collapses = estimator.collapses(),
        alpha = estimator.alpha(),
        buckets = estimator.buckets(),
        missing_decrements = estimator.missing_decrements(),
        "stream processed"
    );
    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        updates_per_sec = throughput,
        "online phase timing"
    );

    if let Some(log) = quantiles {
        log.finish()?;
    }
    verdicts.finish()?;
    Ok(())
}
