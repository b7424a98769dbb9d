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

#![allow(non_snake_case)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use tutoria::session::{teacher_seed, TuBijection, TuBlindMap};
use tutoria::{TuModelId, TuSlot};

#[test]
fn TuFTBlindMapIsStableAcrossRevisits() {
    let mut map = TuBlindMap::new(None);
    let first = map.get_or_create(4);
    for _ in 0..10 {
        map.get_or_create(7);
        assert_eq!(map.get_or_create(4), first);
    }
    assert_eq!(map.get(4), Some(first));
    assert_eq!(map.len(), 2);
}

#[test]
fn TuFTBlindMapDrawsLazily() {
    let mut map = TuBlindMap::new(Some(3));
    assert!(map.is_empty());
    assert_eq!(map.get(0), None);
    map.get_or_create(0);
    assert_eq!(map.len(), 1);
}

#[test]
fn TuFTBlindMapVariesAcrossSamples() {
    let mut map = TuBlindMap::new(Some(11));
    let distinct: BTreeSet<[TuModelId; 3]> = (0..60).map(|i| map.get_or_create(i).models()).collect();
    assert!(distinct.len() > 1);
}

#[test]
fn TuFTTeacherSeedSeparatesTeachersReproducibly() {
    assert_eq!(teacher_seed(7, "T001"), teacher_seed(7, "T001"));
    assert_ne!(teacher_seed(7, "T001"), teacher_seed(7, "T002"));
    assert_ne!(teacher_seed(7, "T001"), teacher_seed(8, "T001"));

    let sequence = |seed: u64| -> Vec<[TuModelId; 3]> {
        let mut map = TuBlindMap::new(Some(seed));
        (0..40).map(|i| map.get_or_create(i).models()).collect()
    };
    assert_eq!(sequence(teacher_seed(7, "T001")), sequence(teacher_seed(7, "T001")));
    assert_ne!(sequence(teacher_seed(7, "T001")), sequence(teacher_seed(7, "T002")));
}

#[test]
fn TuFTBijectionSlotAndModelAreInverse() {
    let bijection = TuBijection::from_order([TuModelId::C, TuModelId::A, TuModelId::B]).expect("bijection");
    assert_eq!(bijection.model_for(TuSlot::One), TuModelId::C);
    assert_eq!(bijection.slot_for(TuModelId::A), TuSlot::Two);
    assert_eq!(bijection.slot_for(TuModelId::B), TuSlot::Three);
}

#[test]
fn TuFTBijectionRejectsRepeatedModels() {
    assert!(TuBijection::from_order([TuModelId::A, TuModelId::A, TuModelId::B]).is_none());
    assert_eq!(TuBijection::identity().models(), TuModelId::ALL);
}

proptest! {
    #[test]
    fn TuFTBlindMapAlwaysDrawsPermutations(seed in any::<u64>(), indices in proptest::collection::vec(0usize..50, 1..20)) {
        let mut map = TuBlindMap::new(Some(seed));
        for idx in indices {
            let bijection = map.get_or_create(idx);
            let models: BTreeSet<TuModelId> = bijection.models().into_iter().collect();
            prop_assert_eq!(models.len(), 3);
            for slot in TuSlot::ALL {
                prop_assert_eq!(bijection.slot_for(bijection.model_for(slot)), slot);
            }
        }
    }

    #[test]
    fn TuFTBlindMapSeedReproducesAssignments(seed in any::<u64>()) {
        let mut first = TuBlindMap::new(Some(seed));
        let mut second = TuBlindMap::new(Some(seed));
        for idx in 0..10 {
            prop_assert_eq!(first.get_or_create(idx), second.get_or_create(idx));
        }
    }
}
