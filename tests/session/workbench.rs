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

#[path = "../common/mod.rs"]
mod common;

use tutoria::session::{TuNavigator, TuScoreKey};
use tutoria::{
    present, TuBlockType, TuConfigBuilder, TuError, TuModelId, TuPart1Dimension, TuSlot,
    TuWorkbench,
};

fn workbench(dir: &std::path::Path) -> TuWorkbench {
    TuWorkbench::new(common::config(dir)).expect("workbench")
}

#[test]
fn TuFTWorkbenchNormalizesTypedTeacherId() {
    let dir = tempfile::tempdir().expect("tmp dir");
    common::write_corpus(dir.path(), "T001");
    let mut bench = workbench(dir.path());

    let session = bench.sign_in("  t001 ").expect("sign in");
    assert_eq!(session.teacher().display, "T001");
    assert_eq!(session.teacher().internal, "T001");
    assert_eq!(session.corpus().len(), 2);
    assert!(bench.active().is_some());
}

#[test]
fn TuFTWorkbenchMapsDisplayIdThroughTeacherTable() {
    let dir = tempfile::tempdir().expect("tmp dir");
    common::write_corpus(dir.path(), "T007");
    let config = TuConfigBuilder::new()
        .teacher("alice", "T007")
        .apply(common::config(dir.path()));
    let mut bench = TuWorkbench::new(config).expect("workbench");

    let session = bench.sign_in("Alice").expect("sign in");
    assert_eq!(session.teacher().display, "ALICE");
    assert_eq!(session.teacher().internal, "T007");
}

#[test]
fn TuFTWorkbenchUnknownTeacherLeavesNoState() {
    let dir = tempfile::tempdir().expect("tmp dir");
    common::write_corpus(dir.path(), "T007");
    let config = TuConfigBuilder::new()
        .teacher("alice", "T007")
        .apply(common::config(dir.path()));
    let mut bench = TuWorkbench::new(config).expect("workbench");

    let err = bench.sign_in("bob").unwrap_err();
    assert!(matches!(err, TuError::UnknownTeacher { ref display_id } if display_id == "BOB"));
    assert!(err.is_fatal_for_session());
    assert_eq!(bench.session_count(), 0);
    assert!(bench.active().is_none());
}

#[test]
fn TuFTWorkbenchMissingCorpusIsReported() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let mut bench = workbench(dir.path());

    let err = bench.sign_in("T404").unwrap_err();
    match &err {
        TuError::CorpusNotFound { teacher_id, path } => {
            assert_eq!(teacher_id, "T404");
            assert!(path.ends_with("data_T404.json"), "{path}");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.is_fatal_for_session());
    assert_eq!(bench.session_count(), 0);
}

#[test]
fn TuFTWorkbenchRejectsBlankId() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let mut bench = workbench(dir.path());
    assert!(matches!(bench.sign_in("   ").unwrap_err(), TuError::Validation { .. }));
}

#[test]
fn TuFTWorkbenchResumesScoresAfterSignOut() {
    let dir = tempfile::tempdir().expect("tmp dir");
    common::write_corpus(dir.path(), "T001");
    let mut bench = workbench(dir.path());

    let session = bench.sign_in("T001").expect("sign in");
    session.navigator_mut().next();
    session
        .score_part1(1, TuPart1Dimension::Fluency, TuSlot::Two, 6.0)
        .expect("score");
    let bijection = session.bijection(1);
    bench.sign_out();
    assert!(bench.active().is_none());

    let session = bench.sign_in("t001").expect("resume");
    assert_eq!(session.navigator().current(), 1);
    assert_eq!(session.bijection(1), bijection);
    let key = TuScoreKey::part1("002", TuPart1Dimension::Fluency);
    assert_eq!(session.store().get(&key, bijection.model_for(TuSlot::Two), 0.0), 6.0);
    assert_eq!(bench.session_count(), 1);
}

#[test]
fn TuFTWorkbenchKeepsTeachersApart() {
    let dir = tempfile::tempdir().expect("tmp dir");
    common::write_corpus(dir.path(), "T001");
    common::write_corpus(dir.path(), "T002");
    let mut bench = workbench(dir.path());

    bench
        .sign_in("T001")
        .expect("first")
        .score_part3(0, 0, 0, TuSlot::One, 1.0)
        .expect("score");
    let second = bench.sign_in("T002").expect("second");
    assert!(second.store().is_empty());
    assert_eq!(bench.session_count(), 2);
    assert_eq!(bench.session("T001").map(|s| s.store().len()), Some(1));
}

#[test]
fn TuFTSessionOpenDefaultFillsEveryDimension() {
    let dir = tempfile::tempdir().expect("tmp dir");
    common::write_corpus(dir.path(), "T001");
    let mut bench = workbench(dir.path());
    let session = bench.sign_in("T001").expect("sign in");

    let (sample, _) = session.open(0).expect("open");
    assert_eq!(sample.poid, "001");
    assert_eq!(session.store().len(), 8 + 3 + 2);
    let block = TuScoreKey::part2("001", 2, TuBlockType::OffTopic);
    for model in TuModelId::ALL {
        assert_eq!(session.store().get(&block, model, -1.0), 0.0);
    }
    assert!(!session.store().is_ranked("001"));

    session.open(0).expect("reopen");
    assert_eq!(session.store().len(), 13);
}

#[test]
fn TuFTSessionUsesOneBijectionForAllParts() {
    let dir = tempfile::tempdir().expect("tmp dir");
    common::write_corpus(dir.path(), "T001");
    let mut bench = workbench(dir.path());
    let session = bench.sign_in("T001").expect("sign in");

    let (_, bijection) = session.open(0).expect("open");
    session
        .score_part1(0, TuPart1Dimension::StepByStep, TuSlot::Three, 1.0)
        .expect("part1");
    session.score_part2(0, 1, TuSlot::Three, 1.0).expect("part2");
    session.score_part3(0, 0, 1, TuSlot::Three, 1.0).expect("part3");

    let model = bijection.model_for(TuSlot::Three);
    let store = session.store();
    assert_eq!(store.get(&TuScoreKey::part1("001", TuPart1Dimension::StepByStep), model, 0.0), 1.0);
    assert_eq!(store.get(&TuScoreKey::part2("001", 1, TuBlockType::NonComprehension), model, 0.0), 1.0);
    assert_eq!(store.get(&TuScoreKey::part3("001", "s1", 1), model, 0.0), 1.0);
}

#[test]
fn TuFTSessionRejectsScoresOutsideTheSample() {
    let dir = tempfile::tempdir().expect("tmp dir");
    common::write_corpus(dir.path(), "T001");
    let mut bench = workbench(dir.path());
    let session = bench.sign_in("T001").expect("sign in");

    assert!(session.score_part2(1, 1, TuSlot::One, 1.0).is_err());
    assert!(session.score_part3(0, 3, 0, TuSlot::One, 1.0).is_err());
    assert!(session.score_part3(0, 0, 2, TuSlot::One, 1.0).is_err());
    assert!(matches!(
        session.score_part1(9, TuPart1Dimension::Fluency, TuSlot::One, 1.0).unwrap_err(),
        TuError::Navigation { requested: 10, total: 2 }
    ));
    assert!(session.store().is_empty());
}

#[test]
fn TuFTSessionPresentsColumnsInSlotOrder() {
    let dir = tempfile::tempdir().expect("tmp dir");
    common::write_corpus(dir.path(), "T001");
    let mut bench = workbench(dir.path());
    let session = bench.sign_in("T001").expect("sign in");

    let (sample, bijection) = session.open(0).expect("open");
    let view = present(&sample, &bijection, session.store(), session.navigator().label());

    assert_eq!(view.position, "1 / 2");
    for slot in TuSlot::ALL {
        let model = bijection.model_for(slot);
        let column = view.part1.dialogues.get(slot);
        assert_eq!(column.len(), 2);
        let original = sample.part1.dialogues.get(model);
        assert_eq!(&column[..original.len()], &original[..]);
        assert_eq!(view.part3[0].responses.get(slot), sample.part3[0].responses.get(model));
    }
    assert_eq!(view.part1.scores.len(), 8);
    assert_eq!(view.part3[0].scores[0].label, "指出学生回答错误");
}

#[test]
fn TuFTNavigatorStaysWithinBounds() {
    let mut nav = TuNavigator::new(3);
    assert!(!nav.prev());
    assert!(nav.next());
    assert!(nav.next());
    assert!(!nav.next());
    assert_eq!(nav.current(), 2);
    assert_eq!(nav.label(), "3 / 3");

    nav.jump(1).expect("jump");
    assert_eq!(nav.current(), 0);
    assert!(matches!(nav.jump(0).unwrap_err(), TuError::Navigation { requested: 0, total: 3 }));
    assert!(matches!(nav.jump(4).unwrap_err(), TuError::Navigation { requested: 4, total: 3 }));
    assert_eq!(nav.current(), 0);
}

#[test]
fn TuFTSeededSessionsBlindIdentically() {
    let dir = tempfile::tempdir().expect("tmp dir");
    common::write_corpus(dir.path(), "T001");

    let mut first = workbench(dir.path());
    let mut second = workbench(dir.path());
    let a = first.sign_in("T001").expect("first").bijection(1);
    let b = second.sign_in("T001").expect("second").bijection(1);
    assert_eq!(a, b);
}
