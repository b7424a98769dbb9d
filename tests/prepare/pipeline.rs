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

use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Value};
use tutoria::prepare::{
    replace_part2, teacher_id, write_assignments, TuAssignConfig, TuAssigner, TuCorpusMerger,
    TuPart1Collator, TuPart2Builder, TuPart3Collator,
};
use tutoria::{TuCorpus, TuModelId, TuModelRoster, TuPerModel, TuStreamReader};

fn dialogue(id: &str, dialogue_type: i64, reply: &str) -> Value {
    json!({
        "id": id,
        "question": format!("题目{id}"),
        "answer": format!("答案{id}"),
        "dialogue_type": dialogue_type,
        "messages": [{"user": "你好", "model_respond": reply}]
    })
}

fn block(qid: &str, kind: u64) -> Value {
    json!({
        "type": kind,
        "question_id": qid,
        "content": {
            "DeepSeek-V3": [{"user": "嗯", "model_respond": "a"}],
            "o4-mini": [{"user": "嗯", "model_respond": "b"}],
            "Spark_X1": [{"user": "嗯", "model_respond": "c"}]
        }
    })
}

/// Opening turn plus one tagged student turn per `(prefix, tag)`.
fn tagged(id: &str, model: &str, turns: &[(&str, Option<i64>)]) -> Value {
    let mut messages = vec![json!({"user": "开始", "model_respond": format!("{model}:0")})];
    let mut tags = Vec::new();
    for (i, (prefix, tag)) in turns.iter().enumerate() {
        messages.push(json!({
            "user": format!("{prefix}学生{}", i + 1),
            "model_respond": format!("{prefix}{model}:{}", i + 1)
        }));
        tags.push(*tag);
    }
    json!({"id": id, "question": format!("题目{id}"), "template_index": tags, "messages": messages})
}

fn every_type(prefix: &str) -> Vec<(&str, Option<i64>)> {
    vec![(prefix, Some(1)), (prefix, Some(2)), (prefix, Some(3))]
}

/// q1 is complete, q2 lacks a type-3 turn from model B, q3 repeats q1 word for
/// word and q4 repeats q1 before three fresh turns.
fn tagged_dumps() -> TuPerModel<Vec<Value>> {
    let dump = |model: &str| {
        let mut q4 = every_type("a");
        q4.extend(every_type("d"));
        let q2 = if model == "B" {
            vec![("b", Some(1)), ("b", Some(2)), ("b", None)]
        } else {
            every_type("b")
        };
        vec![
            tagged("q1", model, &every_type("a")),
            tagged("q2", model, &q2),
            tagged("q3", model, &every_type("a")),
            tagged("q4", model, &q4),
            tagged("q9", model, &every_type("z")),
        ]
    };
    TuPerModel::new(dump("A"), dump("B"), dump("C"))
}

fn candidates(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

fn part3_item(qid: &str) -> Value {
    json!({
        "question_id": qid,
        "type": "correct",
        "question": "stem",
        "last_model_reply": "",
        "single_dialog": {"user": "u", "gt": "g", "DeepSeek-V3": "x", "o4-mini": "y", "Spark_X1": "z"}
    })
}

fn part1_candidate(qid: &str) -> Value {
    json!({
        "question_id": qid,
        "question": format!("题目{qid}"),
        "answer": "1",
        "DeepSeek-V3": [{"user": "u", "model_respond": "a"}],
        "o4-mini": [{"user": "u", "model_respond": "b"}],
        "Spark_X1": [{"user": "u", "model_respond": "c"}]
    })
}

fn full_blocks(qid: &str) -> Vec<Value> {
    vec![block(qid, 1), block(qid, 2), block(qid, 3)]
}

#[test]
fn TuFTCollatePart1KeepsTutoringDialoguesOfAllModels() {
    let per_model = TuPerModel::new(
        vec![dialogue("q1", 1, "a1"), dialogue("q2", 1, "a2"), dialogue("q3", 2, "a3")],
        vec![dialogue("q2", 1, "b2"), dialogue("q1", 1, "b1"), dialogue("q3", 2, "b3")],
        vec![dialogue("q1", 1, "c1"), json!({"broken": true}), dialogue("q3", 2, "c3")],
    );

    let records = TuPart1Collator::new(TuModelRoster::default()).collate(per_model, None);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record["question_id"], "q1");
    assert_eq!(record["question"], "题目q1");
    assert_eq!(record["answer"], "答案q1");
    assert_eq!(record["o4-mini"][0]["model_respond"], "b1");
    assert_eq!(record["Spark_X1"][0]["model_respond"], "c1");
}

#[test]
fn TuFTCollatePart1RespectsKeepList() {
    let all = |prefix: &str| {
        vec![
            dialogue("q1", 1, &format!("{prefix}1")),
            dialogue("q2", 1, &format!("{prefix}2")),
        ]
    };
    let per_model = TuPerModel::new(all("a"), all("b"), all("c"));
    let keep: HashSet<String> = ["q2".to_string()].into_iter().collect();

    let records = TuPart1Collator::new(TuModelRoster::default()).collate(per_model, Some(&keep));
    let ids: Vec<&str> = records.iter().filter_map(|r| r["question_id"].as_str()).collect();
    assert_eq!(ids, vec!["q2"]);
}

#[test]
fn TuFTCollatePart3JoinsRepliesWithSourceQuestion() {
    let questions = vec![json!({
        "dialog_id": 5,
        "messages": [
            {"role": "user", "content": "3+4=?"},
            {"role": "assistant", "content": "你先数一数"},
            {"role": "user", "content": "8"}
        ],
        "GT": "再数一次，是7"
    })];
    let reply = |text: &str| {
        vec![
            json!({"dialog_id": 5, "type": "error", "single_dialog": {"user": "8", "model_response": text}}),
            json!({"dialog_id": 6, "single_dialog": {"user": "?", "model_response": text}}),
        ]
    };
    let per_model = TuPerModel::new(reply("ra"), reply("rb"), vec![reply("rc").remove(0)]);

    let items = TuPart3Collator::new(TuModelRoster::default()).collate(questions, per_model);
    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item["question_id"], "5");
    assert_eq!(item["type"], "error");
    assert_eq!(item["question"], "3+4=?");
    assert_eq!(item["last_model_reply"], "你先数一数");
    assert_eq!(item["single_dialog"]["user"], "8");
    assert_eq!(item["single_dialog"]["gt"], "再数一次，是7");
    assert_eq!(item["single_dialog"]["o4-mini"], "rb");
}

#[test]
fn TuFTCollatePart3MarksMissingQuestion() {
    let reply = |text: &str| vec![json!({"dialog_id": "x9", "single_dialog": {"user": "u", "model_response": text}})];
    let per_model = TuPerModel::new(reply("a"), reply("b"), reply("c"));

    let items = TuPart3Collator::new(TuModelRoster::default()).collate(Vec::new(), per_model);
    assert_eq!(items[0]["question"], "（未找到题干）");
    assert_eq!(items[0]["type"], "correct");
    assert_eq!(items[0]["single_dialog"]["gt"], "");
}

#[test]
fn TuFTPart2BuilderCutsTaggedSlicesFromOwnQuestion() {
    let blocks = TuPart2Builder::new(TuModelRoster::default())
        .build(&candidates(&["q1", "q2", "q3", "q4"]), tagged_dumps());

    let ids: Vec<&str> = blocks.iter().map(|b| b["question_id"].as_str().expect("id")).collect();
    assert_eq!(ids, ["q1", "q1", "q1", "q4", "q4", "q4"]);
    let types: Vec<u64> = blocks.iter().map(|b| b["type"].as_u64().expect("type")).collect();
    assert_eq!(types, [1, 2, 3, 1, 2, 3]);

    assert_eq!(
        blocks[0]["content"]["DeepSeek-V3"],
        json!({
            "question": "题目q1",
            "dialogue": [{"model_respond": "A:0"}, {"user": "a学生1"}, {"model_respond": "aA:1"}]
        })
    );
    assert_eq!(
        blocks[2]["content"]["Spark_X1"]["dialogue"],
        json!([{"model_respond": "aC:2"}, {"user": "a学生3"}, {"model_respond": "aC:3"}])
    );
}

#[test]
fn TuFTPart2BuilderNeverReusesASlice() {
    let blocks = TuPart2Builder::new(TuModelRoster::default())
        .build(&candidates(&["q1", "q4"]), tagged_dumps());
    assert_eq!(blocks.len(), 6);

    let q4_first = &blocks[3]["content"]["o4-mini"]["dialogue"];
    assert_eq!(
        *q4_first,
        json!([{"model_respond": "aB:3"}, {"user": "d学生4"}, {"model_respond": "dB:4"}])
    );

    let alone = TuPart2Builder::new(TuModelRoster::default())
        .build(&candidates(&["q3"]), tagged_dumps());
    assert_eq!(alone.len(), 3);
    let repeated = TuPart2Builder::new(TuModelRoster::default())
        .build(&candidates(&["q1", "q3"]), tagged_dumps());
    assert_eq!(repeated.len(), 3);
}

#[test]
fn TuFTPart2BuilderSkipsQuestionsMissingABlockType() {
    let builder = TuPart2Builder::new(TuModelRoster::default());
    assert!(builder.build(&candidates(&["q2"]), tagged_dumps()).is_empty());
    assert!(builder.build(&candidates(&["missing"]), tagged_dumps()).is_empty());

    let blocks = builder.build(&candidates(&["q2", "q9"]), tagged_dumps());
    assert_eq!(blocks.len(), 3);
    assert!(blocks.iter().all(|b| b["question_id"] == "q9"));
}

#[test]
fn TuFTPart2BlocksMergeIntoLoadableSamples() {
    let roster = TuModelRoster::default();
    let blocks = TuPart2Builder::new(roster.clone()).build(&candidates(&["q1", "q4"]), tagged_dumps());
    let (samples, report) = TuCorpusMerger::new(roster.clone()).merge(
        vec![part1_candidate("q1"), part1_candidate("q4")],
        blocks,
        vec![part3_item("s1"), part3_item("s2")],
    );
    assert_eq!(report.samples, 2);

    let corpus = TuCorpus::from_values(samples, roster);
    let sample = corpus.sample(1).expect("sample");
    assert_eq!(sample.part2.len(), 3);
    let dialogue = sample.part2[0].content.get(TuModelId::C);
    assert_eq!(dialogue.question.as_deref(), Some("题目q4"));
    assert_eq!(dialogue.dialogue[1].user.as_deref(), Some("d学生4"));
}

#[test]
fn TuFTMergeRequiresExactlyThreePart2Blocks() {
    let part1 = vec![part1_candidate("q1"), part1_candidate("q2"), part1_candidate("q3")];
    let mut blocks = full_blocks("q1");
    blocks.extend(vec![block("q2", 1), block("q2", 2)]);
    blocks.extend(full_blocks("q3"));
    let part3 = vec![part3_item("s1"), part3_item("s2"), part3_item("s3")];

    let (samples, report) = TuCorpusMerger::new(TuModelRoster::default()).merge(part1, blocks, part3);
    assert_eq!(report.samples, 2);
    assert_eq!(report.skipped_incomplete_part2, 1);
    assert_eq!(report.part3_used, 2);
    assert!(!report.part3_exhausted);

    assert_eq!(samples[0]["poid"], "001");
    assert_eq!(samples[1]["poid"], "002");
    assert_eq!(samples[1]["content"]["part1"]["question_id"], "q3");
    assert_eq!(samples[1]["content"]["part3"][0]["question_id"], "s2");
    assert_eq!(samples[0]["content"]["part2"].as_array().map(Vec::len), Some(3));
}

#[test]
fn TuFTMergeStopsWhenPart3RunsOut() {
    let part1 = vec![part1_candidate("q1"), part1_candidate("q2")];
    let mut blocks = full_blocks("q1");
    blocks.extend(full_blocks("q2"));

    let (samples, report) =
        TuCorpusMerger::new(TuModelRoster::default()).merge(part1, blocks, vec![part3_item("s1")]);
    assert_eq!(samples.len(), 1);
    assert!(report.part3_exhausted);
    assert_eq!(report.part3_used, 1);
}

#[test]
fn TuFTMergedSamplesLoadAsCorpus() {
    let mut blocks = full_blocks("q1");
    blocks.extend(full_blocks("q2"));
    let (samples, _) = TuCorpusMerger::new(TuModelRoster::default()).merge(
        vec![part1_candidate("q1"), part1_candidate("q2")],
        blocks,
        vec![part3_item("s1"), part3_item("s2")],
    );

    let corpus = TuCorpus::from_values(samples, TuModelRoster::default());
    let sample = corpus.sample(1).expect("sample");
    assert_eq!(sample.poid, "002");
    assert_eq!(sample.part2.len(), 3);
    assert_eq!(
        sample.part1.dialogues.get(TuModelId::C)[0].model_respond.as_deref(),
        Some("c")
    );
    assert_eq!(sample.part3[0].responses.get(TuModelId::B), "y");
}

#[test]
fn TuFTReplacePart2SwapsMatchingSamplesOnly() {
    let mut corpus = vec![
        json!({"poid": "001", "content": {"part1": {"question_id": "q1"}, "part2": [], "part3": []}}),
        json!({"poid": "002", "content": {"part1": {"question_id": 2}, "part2": ["old"], "part3": []}}),
    ];
    let blocks = vec![block("2", 1), block("2", 3), block("q9", 1)];

    let updated = replace_part2(&mut corpus, blocks);
    assert_eq!(updated, 1);
    assert_eq!(corpus[0]["content"]["part2"], json!([]));
    let replaced = corpus[1]["content"]["part2"].as_array().expect("array");
    assert_eq!(replaced.len(), 2);
    assert_eq!(replaced[1]["type"], 3);
}

#[test]
fn TuFTAssignBalancesLoadsWithRedundancy() {
    let samples: Vec<Value> = (0..10).map(|i| json!({"poid": format!("{:03}", i + 1)})).collect();
    let assigner = TuAssigner::new(TuAssignConfig {
        seed: Some(5),
        ..TuAssignConfig::default()
    })
    .expect("assigner");

    let assignments = assigner.assign(samples);
    assert_eq!(assignments.len(), 6);
    assert_eq!(assignments[0].teacher_id, "T001");
    assert!(assignments.iter().all(|a| a.samples.len() == 5));

    let mut holders: BTreeMap<String, HashSet<String>> = BTreeMap::new();
    for assignment in &assignments {
        for sample in &assignment.samples {
            let poid = sample["poid"].as_str().expect("poid").to_string();
            holders.entry(poid).or_default().insert(assignment.teacher_id.clone());
        }
    }
    assert_eq!(holders.len(), 10);
    assert!(holders.values().all(|teachers| teachers.len() == 3));
}

#[test]
fn TuFTAssignIsReproducibleWithSeed() {
    let samples: Vec<Value> = (0..7).map(|i| json!({"poid": i})).collect();
    let config = TuAssignConfig {
        teachers: 4,
        redundancy: 2,
        seed: Some(99),
    };
    let first = TuAssigner::new(config.clone()).expect("assigner").assign(samples.clone());
    let second = TuAssigner::new(config).expect("assigner").assign(samples);
    assert_eq!(first, second);

    let loads: Vec<usize> = first.iter().map(|a| a.samples.len()).collect();
    let spread = loads.iter().max().unwrap() - loads.iter().min().unwrap();
    assert!(spread <= 1, "{loads:?}");
}

#[test]
fn TuFTAssignRejectsImpossibleRedundancy() {
    let too_many = TuAssignConfig {
        teachers: 2,
        redundancy: 3,
        seed: None,
    };
    assert!(TuAssigner::new(too_many).is_err());
    let nobody = TuAssignConfig {
        teachers: 0,
        redundancy: 0,
        seed: None,
    };
    assert!(TuAssigner::new(nobody).is_err());
}

#[test]
fn TuFTWriteAssignmentsNamesFilesByTeacher() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let samples: Vec<Value> = (0..3).map(|i| json!({"poid": i})).collect();
    let assignments = TuAssigner::new(TuAssignConfig {
        teachers: 3,
        redundancy: 1,
        seed: Some(1),
    })
    .expect("assigner")
    .assign(samples);

    let paths = write_assignments(&dir.path().join("out"), &assignments).expect("write");
    assert_eq!(paths.len(), 3);
    assert_eq!(paths[2].file_name().and_then(|n| n.to_str()), Some("data_T003.json"));
    let reloaded = TuStreamReader::new().read_json_array(&paths[0]).expect("read");
    assert_eq!(reloaded.len(), 1);
    assert_eq!(teacher_id(11), "T012");
}
