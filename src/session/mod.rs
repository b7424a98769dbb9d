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

//! # Annotation Session Module
//!
//! Everything a teacher accumulates while annotating lives in one
//! [`TuSession`]: the corpus, the blind assignment map, the scoring store and
//! the navigation position. Sessions are isolated per teacher and owned by the
//! [`TuWorkbench`], which also maps the ids teachers type in to internal ids.
//!
//! ## Module Components
//!
//! - **Blind** ([blind.rs](blind/index.html)): slot <-> model bijections per sample
//! - **Store** ([store.rs](store/index.html)): structured score keys and values
//! - **Navigator** ([navigator.rs](navigator/index.html)): bounded paging
//! - **Workbench** ([workbench.rs](workbench/index.html)): sessions and teacher identity
//!
//! Nothing is persisted until the teacher exports; an abandoned session loses
//! its scores.

pub mod blind;
pub mod navigator;
pub mod store;
pub mod workbench;

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::config::TuExportPolicy;
use crate::dimensions::{TuPart1Dimension, PART3_SCORES_PER_ITEM};
use crate::errors::{Result, TuError};
use crate::export::reconcile::{TuExportRow, TuReconciler};
use crate::export::writer::{export_file_name, TuCsvWriter, TuWriteStats};
use crate::ingest::corpus::TuCorpus;
use crate::model::{TuSample, TuSlot};

pub use blind::{teacher_seed, TuBijection, TuBlindMap};
pub use navigator::TuNavigator;
pub use store::{TuPart, TuRankOutcome, TuScoreEntry, TuScoreKey, TuScoreStore};
pub use workbench::{TuTeacherId, TuWorkbench};

/// One teacher's annotation state.
#[derive(Debug)]
pub struct TuSession {
    teacher: TuTeacherId,
    corpus: TuCorpus,
    blind: TuBlindMap,
    store: TuScoreStore,
    navigator: TuNavigator,
    policy: TuExportPolicy,
}

impl TuSession {
    pub fn new(
        teacher: TuTeacherId,
        corpus: TuCorpus,
        blind_seed: Option<u64>,
        policy: TuExportPolicy,
    ) -> Self {
        let navigator = TuNavigator::new(corpus.len());
        Self {
            teacher,
            corpus,
            blind: TuBlindMap::new(blind_seed),
            store: TuScoreStore::new(),
            navigator,
            policy,
        }
    }

    pub fn teacher(&self) -> &TuTeacherId {
        &self.teacher
    }

    pub fn corpus(&self) -> &TuCorpus {
        &self.corpus
    }

    pub fn store(&self) -> &TuScoreStore {
        &self.store
    }

    /// Replaces the scores, e.g. with an imported dump.
    pub fn replace_store(&mut self, store: TuScoreStore) {
        self.store = store;
    }

    pub fn navigator(&self) -> &TuNavigator {
        &self.navigator
    }

    pub fn navigator_mut(&mut self) -> &mut TuNavigator {
        &mut self.navigator
    }

    pub fn policy(&self) -> &TuExportPolicy {
        &self.policy
    }

    /// The sample's bijection, drawn on first use.
    pub fn bijection(&mut self, index: usize) -> TuBijection {
        self.blind.get_or_create(index)
    }

    /// Visits a sample: fixes its bijection and default-fills every dimension.
    pub fn open(&mut self, index: usize) -> Result<(TuSample, TuBijection)> {
        let sample = self.corpus.sample(index)?;
        let bijection = self.blind.get_or_create(index);

        for dimension in TuPart1Dimension::ALL {
            self.store
                .fill_defaults(TuScoreKey::part1(&sample.poid, dimension));
        }
        for (block_index, block) in sample.part2.iter().enumerate() {
            self.store.fill_defaults(TuScoreKey::part2(
                &sample.poid,
                block_index,
                block.block_type,
            ));
        }
        for item in &sample.part3 {
            for score_index in 0..PART3_SCORES_PER_ITEM {
                self.store.fill_defaults(TuScoreKey::part3(
                    &sample.poid,
                    &item.question_id,
                    score_index,
                ));
            }
        }

        Ok((sample.clone(), bijection))
    }

    pub fn open_current(&mut self) -> Result<(TuSample, TuBijection)> {
        self.open(self.navigator.current())
    }

    pub fn score_part1(
        &mut self,
        index: usize,
        dimension: TuPart1Dimension,
        slot: TuSlot,
        value: f64,
    ) -> Result<()> {
        let poid = self.poid(index)?;
        let model = self.blind.get_or_create(index).model_for(slot);
        self.store
            .set(TuScoreKey::part1(poid, dimension), model, value)
    }

    /// Records a preference ordering of presentation slots for a sample.
    pub fn rank(&mut self, index: usize, selection: &[TuSlot]) -> Result<TuRankOutcome> {
        let poid = self.poid(index)?;
        let bijection = self.blind.get_or_create(index);
        let outcome = self.store.set_ranking(&poid, selection, &bijection)?;
        if outcome == TuRankOutcome::Incomplete {
            log::warn!(
                "sample {} ({}): ranking needs all three models, recorded as 0",
                index + 1,
                poid
            );
        }
        Ok(outcome)
    }

    /// `block_index` is 0-based within the sample's Part2 list.
    pub fn score_part2(&mut self, index: usize, block_index: usize, slot: TuSlot, value: f64) -> Result<()> {
        let sample = self.corpus.sample(index)?;
        let block = sample.part2.get(block_index).ok_or_else(|| {
            TuError::validation(format!(
                "sample {} has {} part2 blocks, no block {}",
                index + 1,
                sample.part2.len(),
                block_index + 1
            ))
        })?;
        let model = self.blind.get_or_create(index).model_for(slot);
        self.store.set(
            TuScoreKey::part2(sample.poid.clone(), block_index, block.block_type),
            model,
            value,
        )
    }

    /// `item_index` and `score_index` are 0-based.
    pub fn score_part3(
        &mut self,
        index: usize,
        item_index: usize,
        score_index: usize,
        slot: TuSlot,
        value: f64,
    ) -> Result<()> {
        if score_index >= PART3_SCORES_PER_ITEM {
            return Err(TuError::validation(format!(
                "part3 score {} is out of range 1..={}",
                score_index + 1,
                PART3_SCORES_PER_ITEM
            )));
        }
        let sample = self.corpus.sample(index)?;
        let item = sample.part3.get(item_index).ok_or_else(|| {
            TuError::validation(format!(
                "sample {} has {} part3 items, no item {}",
                index + 1,
                sample.part3.len(),
                item_index + 1
            ))
        })?;
        let model = self.blind.get_or_create(index).model_for(slot);
        self.store.set(
            TuScoreKey::part3(sample.poid.clone(), item.question_id.clone(), score_index),
            model,
            value,
        )
    }

    pub fn export_rows(&self) -> Vec<TuExportRow> {
        TuReconciler::new(&self.corpus, &self.policy).reconcile(&self.store)
    }

    /// Writes the export table into `dir` under a timestamped file name.
    pub fn export_to(&self, dir: &Path) -> Result<(PathBuf, TuWriteStats)> {
        let rows = self.export_rows();
        let path = dir.join(export_file_name(&self.teacher.internal, Local::now()));
        let stats = TuCsvWriter::new(self.policy.clone())?.write(
            &rows,
            self.corpus.roster(),
            &path,
        )?;
        log::info!(
            "exported {} rows for teacher {} to {}",
            stats.rows_written,
            self.teacher.internal,
            path.display()
        );
        Ok((path, stats))
    }

    fn poid(&self, index: usize) -> Result<String> {
        self.corpus
            .poid(index)
            .map(str::to_string)
            .ok_or(TuError::Navigation {
                requested: index + 1,
                total: self.corpus.len(),
            })
    }
}
