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

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::ingest::corpus::id_string;
use crate::model::TuModelRoster;

/// Part2 blocks a question needs before it becomes a sample.
pub const PART2_BLOCKS_PER_SAMPLE: usize = 3;

/// Outcome of one merge run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TuMergeReport {
    pub samples: usize,
    pub skipped_incomplete_part2: usize,
    pub part3_used: usize,
    /// Set when the run stopped because Part3 items ran out.
    pub part3_exhausted: bool,
}

/// Groups Part2 blocks by `question_id`, keeping file order within a group.
pub fn group_by_question_id(blocks: Vec<Value>) -> HashMap<String, Vec<Value>> {
    let mut grouped: HashMap<String, Vec<Value>> = HashMap::new();
    for block in blocks {
        match block.get("question_id").and_then(id_string) {
            Some(qid) => grouped.entry(qid).or_default().push(block),
            None => log::warn!("part2 block without question_id skipped"),
        }
    }
    grouped
}

/// Assembles corpus samples from Part1 candidates, Part2 blocks and Part3 items.
pub struct TuCorpusMerger {
    roster: TuModelRoster,
}

impl TuCorpusMerger {
    pub fn new(roster: TuModelRoster) -> Self {
        Self { roster }
    }

    /// Every Part1 question with exactly three Part2 blocks takes the next unused
    /// Part3 item. Samples get zero-padded sequential poids (`001`, `002`, ...).
    pub fn merge(
        &self,
        part1: Vec<Value>,
        part2_blocks: Vec<Value>,
        part3: Vec<Value>,
    ) -> (Vec<Value>, TuMergeReport) {
        let mut part2 = group_by_question_id(part2_blocks);
        let mut part3 = part3.into_iter();
        let mut report = TuMergeReport::default();
        let mut samples = Vec::new();

        for entry in part1 {
            let Some(qid) = entry.get("question_id").and_then(id_string) else {
                log::warn!("part1 record without question_id skipped");
                continue;
            };
            let blocks = match part2.remove(&qid) {
                Some(blocks) if blocks.len() == PART2_BLOCKS_PER_SAMPLE => blocks,
                other => {
                    log::debug!(
                        "question {} has {} part2 blocks, skipped",
                        qid,
                        other.map(|b| b.len()).unwrap_or(0)
                    );
                    report.skipped_incomplete_part2 += 1;
                    continue;
                }
            };
            let Some(item) = part3.next() else {
                log::warn!(
                    "part3 items exhausted after {} samples, stopping",
                    report.part3_used
                );
                report.part3_exhausted = true;
                break;
            };
            report.part3_used += 1;

            let poid = format!("{:03}", samples.len() + 1);
            samples.push(json!({
                "poid": poid,
                "content": {
                    "part1": self.part1_record(&qid, &entry),
                    "part2": blocks,
                    "part3": [item],
                },
            }));
        }

        report.samples = samples.len();
        log::info!(
            "merged {} samples ({} questions lacked three part2 blocks)",
            report.samples,
            report.skipped_incomplete_part2
        );
        (samples, report)
    }

    fn part1_record(&self, qid: &str, entry: &Value) -> Value {
        let text = |key: &str| {
            entry
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let mut record = Map::new();
        record.insert("question".to_string(), Value::String(text("question")));
        record.insert("question_id".to_string(), Value::String(qid.to_string()));
        record.insert("answer".to_string(), Value::String(text("answer")));
        for name in self.roster.names() {
            let turns = entry
                .get(name.as_str())
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new()));
            record.insert(name.clone(), turns);
        }
        Value::Object(record)
    }
}

/// Swaps `content.part2` of every sample whose Part1 `question_id` has new
/// blocks. Returns the number of samples updated.
pub fn replace_part2(corpus: &mut [Value], part2_blocks: Vec<Value>) -> usize {
    let grouped = group_by_question_id(part2_blocks);
    let mut updated = 0;

    for sample in corpus.iter_mut() {
        let qid = sample
            .pointer("/content/part1/question_id")
            .and_then(id_string);
        let Some(qid) = qid else { continue };
        let Some(blocks) = grouped.get(&qid).cloned() else {
            continue;
        };
        if let Some(content) = sample.get_mut("content").and_then(Value::as_object_mut) {
            content.insert("part2".to_string(), Value::Array(blocks));
            updated += 1;
        }
    }

    log::info!("replaced part2 of {} samples", updated);
    updated
}
