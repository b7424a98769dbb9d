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

//! # Blind Assignment Map
//!
//! Each sample index gets a random bijection between presentation slots
//! (模型1/2/3) and canonical models (A/B/C). The bijection is drawn on first
//! visit and then fixed for the lifetime of the session, so every part and
//! every block of a sample shows the same model under the same slot.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::model::{TuModelId, TuSlot};

/// Slot -> canonical model for one sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuBijection {
    slots: [TuModelId; 3],
}

impl TuBijection {
    /// Slot `i` shows `order[i]`. Returns `None` unless `order` is a permutation.
    pub fn from_order(order: [TuModelId; 3]) -> Option<Self> {
        let distinct = order[0] != order[1] && order[1] != order[2] && order[0] != order[2];
        distinct.then_some(Self { slots: order })
    }

    pub fn identity() -> Self {
        Self {
            slots: TuModelId::ALL,
        }
    }

    pub fn model_for(&self, slot: TuSlot) -> TuModelId {
        self.slots[slot.index()]
    }

    pub fn slot_for(&self, model: TuModelId) -> TuSlot {
        let idx = self
            .slots
            .iter()
            .position(|m| *m == model)
            .unwrap_or(model.index());
        TuSlot::ALL[idx]
    }

    /// Canonical models in presentation order.
    pub fn models(&self) -> [TuModelId; 3] {
        self.slots
    }
}

/// Mixes the configured seed with a teacher's internal id, so teachers who
/// share samples still see independent blindings while each stays reproducible.
pub fn teacher_seed(seed: u64, teacher: &str) -> u64 {
    let digest = blake3::hash(teacher.as_bytes());
    let bytes = digest.as_bytes();
    seed ^ u64::from_le_bytes(std::array::from_fn(|i| bytes[i]))
}

/// Lazily drawn, session-stable bijections keyed by sample index.
#[derive(Debug)]
pub struct TuBlindMap {
    rng: StdRng,
    assignments: BTreeMap<usize, TuBijection>,
}

impl TuBlindMap {
    /// Seeded maps produce reproducible assignments; `None` draws from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            assignments: BTreeMap::new(),
        }
    }

    pub fn get_or_create(&mut self, sample_index: usize) -> TuBijection {
        if let Some(existing) = self.assignments.get(&sample_index) {
            return *existing;
        }
        let mut order = TuModelId::ALL;
        order.shuffle(&mut self.rng);
        let bijection = TuBijection { slots: order };
        log::debug!(
            "sample {} blinded as {}/{}/{}",
            sample_index + 1,
            order[0],
            order[1],
            order[2]
        );
        self.assignments.insert(sample_index, bijection);
        bijection
    }

    pub fn get(&self, sample_index: usize) -> Option<TuBijection> {
        self.assignments.get(&sample_index).copied()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}
