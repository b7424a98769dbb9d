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

//! # Export Reconciler
//!
//! Flattens a teacher's [`TuScoreStore`] into one row per scored
//! `(sample, dimension)`. Scores are always reported under the canonical model
//! columns; presentation slots never reach the export.
//!
//! Labels are derived from the structured key, except for Part3 where the
//! item's feedback type is looked up in the corpus.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::TuExportPolicy;
use crate::dimensions;
use crate::ingest::corpus::TuCorpus;
use crate::model::{TuFeedbackType, TuModelId, TuModelRoster, TuPerModel};
use crate::session::store::{TuPart, TuScoreEntry, TuScoreKey, TuScoreStore};

/// One row of the export table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuExportRow {
    pub poid: String,
    /// `index / total` when the poid is part of the corpus.
    pub sample_position: Option<String>,
    pub part: TuPart,
    pub row_type: String,
    pub dimension: String,
    /// Formatted scores by canonical model; empty when not scored.
    pub scores: TuPerModel<String>,
}

impl TuExportRow {
    pub fn score(&self, model: TuModelId) -> &str {
        self.scores.get(model)
    }

    /// Cells in header order.
    pub fn to_record(&self, policy: &TuExportPolicy) -> Vec<String> {
        let mut record = Vec::with_capacity(8);
        record.push(self.poid.clone());
        if policy.annotate_sample_position {
            record.push(self.sample_position.clone().unwrap_or_default());
        }
        record.push(self.part.to_string());
        record.push(self.row_type.clone());
        record.push(self.dimension.clone());
        record.extend(self.scores.0.iter().cloned());
        record
    }
}

/// Header row: `poid, [sample,] part, type, dimension, score_<name> x3`.
pub fn export_headers(roster: &TuModelRoster, policy: &TuExportPolicy) -> Vec<String> {
    let mut headers = vec!["poid".to_string()];
    if policy.annotate_sample_position {
        headers.push("sample".to_string());
    }
    headers.extend(["part", "type", "dimension"].map(str::to_string));
    headers.extend(
        TuModelId::ALL
            .iter()
            .map(|m| format!("score_{}", roster.name(*m))),
    );
    headers
}

pub struct TuReconciler<'a> {
    corpus: &'a TuCorpus,
    policy: &'a TuExportPolicy,
}

impl<'a> TuReconciler<'a> {
    pub fn new(corpus: &'a TuCorpus, policy: &'a TuExportPolicy) -> Self {
        Self { corpus, policy }
    }

    /// Rows ordered by corpus position, then part, then key.
    ///
    /// Entries without any score are skipped. With
    /// `require_ranking_before_export`, samples without a completed ranking
    /// keep only their Part1 rows, minus the ranking itself.
    pub fn reconcile(&self, store: &TuScoreStore) -> Vec<TuExportRow> {
        let feedback_types = self.corpus.feedback_types();
        let mut rows = Vec::with_capacity(store.len());
        let mut filtered = 0usize;

        for (key, entry) in store.iter() {
            if entry.is_empty() {
                continue;
            }
            if self.policy.require_ranking_before_export && !store.is_ranked(key.poid()) {
                let is_plain_part1 = matches!(
                    key,
                    TuScoreKey::Part1 { dimension, .. }
                        if *dimension != dimensions::TuPart1Dimension::PreferenceRank
                );
                if !is_plain_part1 {
                    filtered += 1;
                    continue;
                }
            }
            rows.push(self.row(key, entry, &feedback_types));
        }

        if filtered > 0 {
            log::info!("{} entries of unranked samples left out of the export", filtered);
        }

        let order = |row: &TuExportRow| {
            (
                self.corpus.index_of(&row.poid).unwrap_or(usize::MAX),
                row.part,
            )
        };
        rows.sort_by_key(order);
        rows
    }

    fn row(
        &self,
        key: &TuScoreKey,
        entry: &TuScoreEntry,
        feedback_types: &HashMap<(String, String), TuFeedbackType>,
    ) -> TuExportRow {
        let control = key.control();
        let scores = TuPerModel::new(
            cell(entry, TuModelId::A, |v| control.format(v)),
            cell(entry, TuModelId::B, |v| control.format(v)),
            cell(entry, TuModelId::C, |v| control.format(v)),
        );

        let (row_type, dimension) = match key {
            TuScoreKey::Part1 { dimension, .. } => {
                (dimension.label().to_string(), dimension.label().to_string())
            }
            TuScoreKey::Part2 {
                block_index,
                block_type,
                ..
            } => {
                let label = dimensions::part2_label(*block_type);
                (format!("{}_block{}", label, block_index), label.to_string())
            }
            TuScoreKey::Part3 {
                poid,
                question_id,
                score_index,
            } => {
                let feedback = feedback_types
                    .get(&(poid.clone(), question_id.clone()))
                    .copied()
                    .unwrap_or(TuFeedbackType::Correct);
                (
                    feedback.as_str().to_string(),
                    dimensions::part3_label(feedback, *score_index),
                )
            }
        };

        TuExportRow {
            poid: key.poid().to_string(),
            sample_position: self.corpus.position_label(key.poid()),
            part: key.part(),
            row_type,
            dimension,
            scores,
        }
    }
}

fn cell(entry: &TuScoreEntry, model: TuModelId, format: impl Fn(f64) -> String) -> String {
    entry.get(&model).map(|v| format(*v)).unwrap_or_default()
}
