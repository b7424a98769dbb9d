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

use std::io::Write;

use serde_json::json;
use tempfile::NamedTempFile;
use tutoria::session::TuScoreKey;
use tutoria::{
    TuBlockType, TuExportPolicy, TuLegacyImporter, TuModelId, TuModelRoster, TuPart1Dimension,
    TuReconciler,
};

fn importer() -> TuLegacyImporter {
    TuLegacyImporter::new(TuModelRoster::default()).expect("importer")
}

#[test]
fn TuFTLegacyImportParsesAllThreeSections() {
    let dump = json!({
        "part1_scores": {
            "part1_001": {
                "整体偏好排序（主观倾向）": {"A": 1, "B": 3, "C": 2},
                "语言流畅度": {"A": 8, "B": "9", "C": ""}
            }
        },
        "part2_scores": {
            "part2_001_t1_0": {"A": 1, "B": 0, "C": 1},
            "part2_001_idx2_t3_0": {"DeepSeek-V3": 0.5, "o4-mini": 1, "Spark_X1": 0}
        },
        "part3_scores": {
            "part3_001_s1_score1": {"A": true, "B": false, "C": 1}
        }
    });

    let (store, stats) = importer().import_value(&dump).expect("import");
    assert_eq!(stats.entries, 5);
    assert_eq!(stats.ranked, 1);
    assert!(store.is_ranked("001"));

    let fluency = TuScoreKey::part1("001", TuPart1Dimension::Fluency);
    assert_eq!(store.get(&fluency, TuModelId::B, -1.0), 9.0);
    assert_eq!(store.entry(&fluency).map(|e| e.len()), Some(2));

    let off_topic = TuScoreKey::part2("001", 2, TuBlockType::OffTopic);
    assert_eq!(store.get(&off_topic, TuModelId::A, -1.0), 0.5);
    assert_eq!(store.get(&off_topic, TuModelId::B, -1.0), 1.0);
    assert!(store.entry(&TuScoreKey::part2("001", 0, TuBlockType::Comprehension)).is_some());

    let part3 = TuScoreKey::part3("001", "s1", 1);
    assert_eq!(store.get(&part3, TuModelId::A, -1.0), 1.0);
    assert_eq!(store.get(&part3, TuModelId::B, -1.0), 0.0);
}

#[test]
fn TuFTLegacyImportSkipsWhatNoLongerFits() {
    let dump = json!({
        "part1_scores": {
            "part1_001": {
                "已删除的维度": {"A": 1},
                "是否分步讲解": {"A": 0.5, "B": 1, "gpt-4": 1}
            },
            "p1_001": {}
        },
        "part2_scores": {
            "part2_001_t7_0": {"A": 1},
            "part2_001_t2_1": {"A": "", "B": "", "C": ""}
        },
        "part3_scores": {
            "part3_001_s1": {"A": 1}
        }
    });

    let (store, stats) = importer().import_value(&dump).expect("import");
    assert_eq!(store.len(), 1);
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.skipped_keys, 4);
    assert_eq!(stats.skipped_values, 2);
    let step = TuScoreKey::part1("001", TuPart1Dimension::StepByStep);
    assert_eq!(store.entry(&step).map(|e| e.len()), Some(1));
    assert!(!store.is_ranked("001"));
}

#[test]
fn TuFTLegacyImportPartialRankingIsNotMarked() {
    let dump = json!({
        "part1_scores": {
            "part1_002": {"整体偏好排序（主观倾向）": {"A": 0, "B": 0, "C": 0}}
        }
    });

    let (store, stats) = importer().import_value(&dump).expect("import");
    assert_eq!(stats.ranked, 0);
    assert!(!store.is_ranked("002"));
    assert_eq!(store.len(), 1);
}

#[test]
fn TuFTLegacyImportRejectsNonObjectDump() {
    assert!(importer().import_value(&json!([1, 2])).is_err());
}

#[test]
fn TuFTLegacyImportFeedsTheReconciler() {
    let mut file = NamedTempFile::new().expect("tmp");
    let dump = json!({
        "part3_scores": {"part3_001_s1_score0": {"A": 1, "B": 0, "C": 1}},
        "part2_scores": {"part2_002_t1_0": {"A": 1, "B": 1, "C": 0}}
    });
    write!(file, "{}", dump).expect("write");

    let (store, _) = importer().import_path(file.path()).expect("import");
    let corpus = common::corpus();
    let policy = TuExportPolicy::default();
    let rows = TuReconciler::new(&corpus, &policy).reconcile(&store);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].poid, "001");
    assert_eq!(rows[0].row_type, "error");
    assert_eq!(rows[0].dimension, "指出学生回答错误");
    assert_eq!(rows[0].scores.0, ["1", "0", "1"].map(str::to_string));
    assert_eq!(rows[1].row_type, "引导质量（理解）_block0");
}
