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

//! Stream sources: file-backed replay and synthetic distributions.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use anyhow::bail;
use rand::Rng;
use rand::SeedableRng;
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand_distr::Exp;
use rand_distr::Normal;

enum Sampler {
    Uniform(Uniform<f64>),
    Exponential(Exp<f64>),
    Normal(Normal<f64>),
}

/// Produces the stream values consumed by the estimator, either by
/// replaying a newline-separated file of decimal values in order or by
/// drawing from a synthetic distribution.
pub struct StreamSource {
    label: String,
    kind: SourceKind,
}

enum SourceKind {
    File {
        reader: BufReader<File>,
        line: String,
        lineno: u64,
    },
    Synthetic {
        sampler: Sampler,
        rng: StdRng,
    },
}

impl StreamSource {
    /// Opens a file source. The label is the file's base name.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file =
            File::open(path).with_context(|| format!("cannot open input {}", path.display()))?;
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            label,
            kind: SourceKind::File {
                reader: BufReader::new(file),
                line: String::new(),
                lineno: 0,
            },
        })
    }

    /// Builds a synthetic source for distribution type 1 (uniform on
    /// `[x, y)`), 2 (exponential with rate `x`) or 3 (normal with mean `x`
    /// and standard deviation `y`).
    pub fn synthetic(dtype: u8, x: f64, y: f64, seed: Option<u64>) -> anyhow::Result<Self> {
        let (label, sampler) = match dtype {
            1 => {
                if (x == 0.0 && y == 0.0) || x >= y {
                    bail!("incorrect range [a, b) for the uniform distribution");
                }
                ("Uniform", Sampler::Uniform(Uniform::new(x, y)))
            }
            2 => {
                if x == 0.0 {
                    bail!("incorrect rate for the exponential distribution");
                }
                ("Exponential", Sampler::Exponential(Exp::new(x)?))
            }
            3 => {
                if x == 0.0 && y == 0.0 {
                    bail!("incorrect mean and stddev for the normal distribution");
                }
                ("Normal", Sampler::Normal(Normal::new(x, y)?))
            }
            other => bail!("unrecognized distribution type {other} (can be 1, 2 or 3)"),
        };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            label: label.to_string(),
            kind: SourceKind::Synthetic { sampler, rng },
        })
    }

    /// Identifies the source in log lines and result file names.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the next stream value.
    ///
    /// Running out of file input before the requested stream length is an
    /// error; synthetic sources never run out.
    pub fn next_value(&mut self) -> anyhow::Result<f64> {
        match &mut self.kind {
            SourceKind::File {
                reader,
                line,
                lineno,
            } => loop {
                line.clear();
                let read = reader.read_line(line).context("reading input stream")?;
                if read == 0 {
                    bail!("input stream exhausted after {lineno} values");
                }
                *lineno += 1;
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                return text
                    .parse::<f64>()
                    .with_context(|| format!("malformed value on line {lineno}"));
            },
            SourceKind::Synthetic { sampler, rng } => Ok(match sampler {
                Sampler::Uniform(dist) => rng.sample(*dist),
                Sampler::Exponential(dist) => rng.sample(*dist),
                Sampler::Normal(dist) => rng.sample(*dist),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_samples_stay_in_range() {
        let mut source = StreamSource::synthetic(1, 2.0, 5.0, Some(7)).unwrap();
        assert_eq!(source.label(), "Uniform");
        for _ in 0..100 {
            let value = source.next_value().unwrap();
            assert!((2.0..5.0).contains(&value), "sample {value} out of range");
        }
    }

    #[test]
    fn test_exponential_samples_are_non_negative() {
        let mut source = StreamSource::synthetic(2, 1.5, 0.0, Some(7)).unwrap();
        assert_eq!(source.label(), "Exponential");
        for _ in 0..100 {
            assert!(source.next_value().unwrap() >= 0.0);
        }
    }

    #[test]
    fn test_normal_source_is_seed_deterministic() {
        let mut a = StreamSource::synthetic(3, 10.0, 2.0, Some(42)).unwrap();
        let mut b = StreamSource::synthetic(3, 10.0, 2.0, Some(42)).unwrap();
        assert_eq!(a.label(), "Normal");
        for _ in 0..10 {
            assert_eq!(a.next_value().unwrap(), b.next_value().unwrap());
        }
    }

    #[test]
    fn test_invalid_distribution_parameters_are_rejected() {
        // empty or inverted uniform range
        assert!(StreamSource::synthetic(1, 0.0, 0.0, None).is_err());
        assert!(StreamSource::synthetic(1, 5.0, 2.0, None).is_err());
        // zero exponential rate
        assert!(StreamSource::synthetic(2, 0.0, 0.0, None).is_err());
        // degenerate normal
        assert!(StreamSource::synthetic(3, 0.0, 0.0, None).is_err());
        // unknown type
        assert!(StreamSource::synthetic(4, 1.0, 2.0, None).is_err());
    }
}
