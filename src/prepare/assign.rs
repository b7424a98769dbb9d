//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Tutoria.
//! The Tutoria project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! Distribution of a merged corpus over teachers.
//!
//! Samples are shuffled, then each one goes to the `redundancy` teachers with
//! the fewest samples so far (ties broken by teacher order), so loads never
//! differ by more than one.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, TuError};
use crate::ingest::reader::write_json_array;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TuAssignConfig {
    pub teachers: usize,
    /// Number of teachers annotating each sample.
    pub redundancy: usize,
    pub seed: Option<u64>,
}

impl Default for TuAssignConfig {
    fn default() -> Self {
        Self {
            teachers: 6,
            redundancy: 3,
            seed: None,
        }
    }
}

/// Samples assigned to one teacher.
#[derive(Clone, Debug, PartialEq)]
pub struct TuAssignment {
    pub teacher_id: String,
    pub samples: Vec<Value>,
}

/// `T001`, `T002`, ...
pub fn teacher_id(index: usize) -> String {
    format!("T{:03}", index + 1)
}

#[derive(Debug)]
pub struct TuAssigner {
    config: TuAssignConfig,
}

impl TuAssigner {
    pub fn new(config: TuAssignConfig) -> Result<Self> {
        if config.teachers == 0 {
            return Err(TuError::validation("at least one teacher is required"));
        }
        if config.redundancy == 0 || config.redundancy > config.teachers {
            return Err(TuError::validation(format!(
                "redundancy {} must be in 1..={}",
                config.redundancy, config.teachers
            )));
        }
        Ok(Self { config })
    }

    pub fn assign(&self, mut samples: Vec<Value>) -> Vec<TuAssignment> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        samples.shuffle(&mut rng);

        let mut assignments: Vec<TuAssignment> = (0..self.config.teachers)
            .map(|i| TuAssignment {
                teacher_id: teacher_id(i),
                samples: Vec::new(),
            })
            .collect();

        let mut order: Vec<usize> = (0..self.config.teachers).collect();
        for sample in samples {
            order.sort_by_key(|&t| (assignments[t].samples.len(), t));
            for &t in &order[..self.config.redundancy] {
                assignments[t].samples.push(sample.clone());
            }
        }

        for assignment in &assignments {
            log::info!(
                "teacher {} gets {} samples",
                assignment.teacher_id,
                assignment.samples.len()
            );
        }
        assignments
    }
}

/// Writes `data_<teacher>.json` for every assignment into `dir`.
pub fn write_assignments(dir: &Path, assignments: &[TuAssignment]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    assignments
        .iter()
        .map(|a| {
            let path = dir.join(format!("data_{}.json", a.teacher_id));
            write_json_array(&path, &a.samples)?;
            Ok(path)
        })
        .collect()
}
