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

//! # Scoring Store
//!
//! Per-teacher scores addressed by structured keys. Every key maps to the
//! scores given to each canonical model. Writes are idempotent upserts and a
//! key may hold fewer than three models; completeness is only judged at
//! export time.
//!
//! The Part1 preference ranking is written as a whole from a slot ordering
//! (see [`TuScoreStore::set_ranking`]) and never model by model.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dimensions::{self, TuControl, TuPart1Dimension};
use crate::errors::{Result, TuError};
use crate::model::{TuBlockType, TuModelId, TuSlot};
use crate::session::blind::TuBijection;

/// Annotation part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TuPart {
    Part1,
    Part2,
    Part3,
}

impl TuPart {
    pub fn as_str(self) -> &'static str {
        match self {
            TuPart::Part1 => "part1",
            TuPart::Part2 => "part2",
            TuPart::Part3 => "part3",
        }
    }
}

impl fmt::Display for TuPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one scoring entry within a teacher's store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TuScoreKey {
    Part1 {
        poid: String,
        dimension: TuPart1Dimension,
    },
    Part2 {
        poid: String,
        block_index: usize,
        block_type: TuBlockType,
    },
    Part3 {
        poid: String,
        question_id: String,
        score_index: usize,
    },
}

impl TuScoreKey {
    pub fn part1(poid: impl Into<String>, dimension: TuPart1Dimension) -> Self {
        TuScoreKey::Part1 {
            poid: poid.into(),
            dimension,
        }
    }

    pub fn part2(poid: impl Into<String>, block_index: usize, block_type: TuBlockType) -> Self {
        TuScoreKey::Part2 {
            poid: poid.into(),
            block_index,
            block_type,
        }
    }

    pub fn part3(poid: impl Into<String>, question_id: impl Into<String>, score_index: usize) -> Self {
        TuScoreKey::Part3 {
            poid: poid.into(),
            question_id: question_id.into(),
            score_index,
        }
    }

    pub fn poid(&self) -> &str {
        match self {
            TuScoreKey::Part1 { poid, .. }
            | TuScoreKey::Part2 { poid, .. }
            | TuScoreKey::Part3 { poid, .. } => poid,
        }
    }

    pub fn part(&self) -> TuPart {
        match self {
            TuScoreKey::Part1 { .. } => TuPart::Part1,
            TuScoreKey::Part2 { .. } => TuPart::Part2,
            TuScoreKey::Part3 { .. } => TuPart::Part3,
        }
    }

    /// Value domain of the addressed dimension.
    pub fn control(&self) -> TuControl {
        match self {
            TuScoreKey::Part1 { dimension, .. } => dimension.control(),
            TuScoreKey::Part2 { block_type, .. } => dimensions::part2_control(*block_type),
            TuScoreKey::Part3 { .. } => dimensions::part3_control(),
        }
    }
}

impl fmt::Display for TuScoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuScoreKey::Part1 { poid, dimension } => {
                write!(f, "part1_{}/{}", poid, dimension.label())
            }
            TuScoreKey::Part2 {
                poid,
                block_index,
                block_type,
            } => write!(f, "part2_{}_t{}_{}", poid, block_type.code(), block_index),
            TuScoreKey::Part3 {
                poid,
                question_id,
                score_index,
            } => write!(f, "part3_{}_{}_score{}", poid, question_id, score_index),
        }
    }
}

/// Scores of one key, by canonical model.
pub type TuScoreEntry = BTreeMap<TuModelId, f64>;

/// Result of writing a preference ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TuRankOutcome {
    /// All three slots ordered; ranks 3, 2, 1 recorded.
    Complete,
    /// Fewer than three slots; all models reset to 0.
    Incomplete,
}

/// Scores of one teacher session.
#[derive(Clone, Debug, Default)]
pub struct TuScoreStore {
    entries: BTreeMap<TuScoreKey, TuScoreEntry>,
    ranked: BTreeSet<String>,
}

impl TuScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts one model's score after checking it against the key's domain.
    pub fn set(&mut self, key: TuScoreKey, model: TuModelId, value: f64) -> Result<()> {
        let control = key.control();
        if control == TuControl::Rank {
            return Err(TuError::validation(
                "the preference ranking is written from a slot ordering, not per model",
            ));
        }
        let value = control.validate(value)?;
        self.entries.entry(key).or_default().insert(model, value);
        Ok(())
    }

    pub fn get(&self, key: &TuScoreKey, model: TuModelId, default: f64) -> f64 {
        self.entries
            .get(key)
            .and_then(|entry| entry.get(&model))
            .copied()
            .unwrap_or(default)
    }

    pub fn entry(&self, key: &TuScoreKey) -> Option<&TuScoreEntry> {
        self.entries.get(key)
    }

    /// Gives every model without a score the control's minimum.
    pub fn fill_defaults(&mut self, key: TuScoreKey) {
        let minimum = key.control().minimum();
        let entry = self.entries.entry(key).or_default();
        for model in TuModelId::ALL {
            entry.entry(model).or_insert(minimum);
        }
    }

    /// Records the Part1 preference ranking of `poid` from a slot ordering.
    ///
    /// A complete ordering gives the first slot's model 3 points, the second 2
    /// and the last 1, and marks the sample as ranked. Anything shorter resets
    /// all three models to 0 and clears the mark.
    pub fn set_ranking(
        &mut self,
        poid: &str,
        selection: &[TuSlot],
        bijection: &TuBijection,
    ) -> Result<TuRankOutcome> {
        let unique: BTreeSet<TuSlot> = selection.iter().copied().collect();
        if unique.len() != selection.len() {
            return Err(TuError::validation(format!(
                "ranking selection repeats a model slot: {:?}",
                selection
            )));
        }

        let key = TuScoreKey::part1(poid, TuPart1Dimension::PreferenceRank);
        let entry = self.entries.entry(key).or_default();

        if selection.len() < TuSlot::ALL.len() {
            for model in TuModelId::ALL {
                entry.insert(model, 0.0);
            }
            self.ranked.remove(poid);
            return Ok(TuRankOutcome::Incomplete);
        }

        for (position, slot) in selection.iter().enumerate() {
            let rank = (TuSlot::ALL.len() - position) as f64;
            entry.insert(bijection.model_for(*slot), rank);
        }
        self.ranked.insert(poid.to_string());
        Ok(TuRankOutcome::Complete)
    }

    pub fn is_ranked(&self, poid: &str) -> bool {
        self.ranked.contains(poid)
    }

    pub fn ranked_poids(&self) -> impl Iterator<Item = &str> {
        self.ranked.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TuScoreKey, &TuScoreEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an already validated entry, replacing any previous one.
    pub(crate) fn restore(&mut self, key: TuScoreKey, entry: TuScoreEntry) {
        self.entries.insert(key, entry);
    }

    pub(crate) fn mark_ranked(&mut self, poid: &str) {
        self.ranked.insert(poid.to_string());
    }
}
