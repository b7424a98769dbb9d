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

//! Collation of per-model generation dumps into Part1, Part2 and Part3 material.
//!
//! The collators keep only questions answered by all three models and
//! preserve the order in which question ids (or candidates) appear.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::ingest::corpus::id_string;
use crate::model::{TuBlockType, TuDialogue, TuModelId, TuModelRoster, TuPerModel, TuTurn};

/// Multi-turn dialogue produced by one model for one question.
#[derive(Clone, Debug, Deserialize)]
struct DialogueRecord {
    id: Value,
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    messages: Vec<TuTurn>,
    #[serde(default)]
    dialogue_type: Option<i64>,
}

/// Multi-turn dialogue whose student turns carry a scenario tag.
#[derive(Clone, Debug, Deserialize)]
struct TaggedDialogueRecord {
    id: Value,
    #[serde(default)]
    question: String,
    messages: Vec<TuTurn>,
    /// `template_index[i]` tags the student turn in `messages[i + 1]`.
    template_index: Vec<Option<i64>>,
}

#[derive(Clone, Debug, Deserialize)]
struct SingleReply {
    #[serde(default)]
    user: String,
    #[serde(default)]
    model_response: String,
}

/// Single-turn feedback produced by one model.
#[derive(Clone, Debug, Deserialize)]
struct SingleDialogRecord {
    dialog_id: Value,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    single_dialog: SingleReply,
}

#[derive(Clone, Debug, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

/// Source question of a single-turn item: the full chat and its reference reply.
#[derive(Clone, Debug, Deserialize)]
struct QuestionRecord {
    dialog_id: Value,
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(rename = "GT", default)]
    gt: String,
}

const MISSING_QUESTION: &str = "（未找到题干）";

/// Only multi-turn tutoring dialogues are Part1 material.
const TUTORING_DIALOGUE: i64 = 1;

fn parse_all<T: for<'de> Deserialize<'de>>(records: Vec<Value>, what: &str) -> Vec<T> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value::<T>(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("skipping {} record {}: {}", what, idx + 1, e);
                None
            }
        })
        .collect()
}

pub struct TuPart1Collator {
    roster: TuModelRoster,
}

impl TuPart1Collator {
    pub fn new(roster: TuModelRoster) -> Self {
        Self { roster }
    }

    /// Joins the three models' dialogues by question id.
    ///
    /// `keep` restricts the output to selected question ids; `None` keeps every
    /// complete question. Output records carry `question_id`, `question`,
    /// `answer` and one turn list per real model name.
    pub fn collate(&self, per_model: TuPerModel<Vec<Value>>, keep: Option<&HashSet<String>>) -> Vec<Value> {
        let mut order: Vec<String> = Vec::new();
        let mut joined: HashMap<String, [Option<DialogueRecord>; 3]> = HashMap::new();

        for (model, records) in TuModelId::ALL.into_iter().zip(per_model.0) {
            for record in parse_all::<DialogueRecord>(records, "dialogue") {
                if record.dialogue_type != Some(TUTORING_DIALOGUE) {
                    continue;
                }
                let Some(qid) = id_string(&record.id) else {
                    continue;
                };
                let slot = joined.entry(qid.clone()).or_insert_with(|| {
                    order.push(qid.clone());
                    [None, None, None]
                });
                slot[model.index()] = Some(record);
            }
        }

        let mut output = Vec::new();
        for qid in order {
            if keep.is_some_and(|k| !k.contains(&qid)) {
                continue;
            }
            let Some([Some(a), Some(b), Some(c)]) = joined.remove(&qid) else {
                log::debug!("question {} lacks a dialogue from some model", qid);
                continue;
            };
            let mut record = Map::new();
            record.insert("question_id".to_string(), Value::String(qid));
            record.insert("question".to_string(), Value::String(a.question.clone()));
            record.insert(
                "answer".to_string(),
                Value::String(a.answer.clone().unwrap_or_default()),
            );
            for (model, dialogue) in TuModelId::ALL.into_iter().zip([a, b, c]) {
                record.insert(
                    self.roster.name(model).to_string(),
                    serde_json::to_value(dialogue.messages).unwrap_or(Value::Array(Vec::new())),
                );
            }
            output.push(Value::Object(record));
        }

        log::info!("collated {} part1 questions", output.len());
        output
    }
}

/// Cuts the tagged three-turn slice `[model, student, model]` around the first
/// student turn of type `code` whose slice has not been taken before.
fn take_slice(record: &TaggedDialogueRecord, code: i64, taken: &mut HashSet<blake3::Hash>) -> Option<TuDialogue> {
    for (idx, tag) in record.template_index.iter().enumerate() {
        if *tag != Some(code) {
            continue;
        }
        let (Some(before), Some(turn)) = (record.messages.get(idx), record.messages.get(idx + 1)) else {
            continue;
        };
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let (lead, student, reply) = (text(&before.model_respond), text(&turn.user), text(&turn.model_respond));

        let signature = format!("model_respond:{}\nuser:{}\nmodel_respond:{}", lead, student, reply);
        if taken.insert(blake3::hash(signature.as_bytes())) {
            return Some(TuDialogue {
                question: Some(record.question.clone()),
                dialogue: vec![TuTurn::model(lead), TuTurn::student(student), TuTurn::model(reply)],
            });
        }
    }
    None
}

/// Builds Part2 blocks from each candidate question's own tagged dialogues.
///
/// Slices are never borrowed from other questions: a question that lacks an
/// unused slice of some block type for some model yields no blocks at all.
pub struct TuPart2Builder {
    roster: TuModelRoster,
}

impl TuPart2Builder {
    pub fn new(roster: TuModelRoster) -> Self {
        Self { roster }
    }

    /// One block per type (1, 2, 3) for every candidate question, in candidate
    /// order. Each block carries `question_id`, `type` and per real model name
    /// a `{question, dialogue}` record. A slice already used by any earlier
    /// block, of any model, is not used again.
    pub fn build(&self, candidates: &[String], per_model: TuPerModel<Vec<Value>>) -> Vec<Value> {
        let mut by_question: [HashMap<String, Vec<TaggedDialogueRecord>>; 3] = Default::default();
        for (model, records) in TuModelId::ALL.into_iter().zip(per_model.0) {
            for record in parse_all::<TaggedDialogueRecord>(records, "tagged dialogue") {
                if let Some(qid) = id_string(&record.id) {
                    by_question[model.index()].entry(qid).or_default().push(record);
                }
            }
        }

        let mut taken = HashSet::new();
        let mut output = Vec::new();
        let mut skipped = 0;

        'questions: for qid in candidates {
            let mut blocks = Vec::with_capacity(TuBlockType::ALL.len());
            for block_type in TuBlockType::ALL {
                let code = i64::from(block_type.code());
                let mut content = Map::new();
                for model in TuModelId::ALL {
                    let records = by_question[model.index()]
                        .get(qid)
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    let slice = records
                        .iter()
                        .find_map(|record| take_slice(record, code, &mut taken));
                    let Some(slice) = slice else {
                        log::debug!(
                            "question {} has no unused type {} slice from {}",
                            qid,
                            code,
                            self.roster.name(model)
                        );
                        skipped += 1;
                        continue 'questions;
                    };
                    content.insert(
                        self.roster.name(model).to_string(),
                        serde_json::to_value(slice).unwrap_or(Value::Null),
                    );
                }
                blocks.push(json!({
                    "question_id": qid,
                    "type": code,
                    "content": content,
                }));
            }
            output.extend(blocks);
        }

        log::info!(
            "built {} part2 blocks ({} questions lacked some block type)",
            output.len(),
            skipped
        );
        output
    }
}

pub struct TuPart3Collator {
    roster: TuModelRoster,
}

impl TuPart3Collator {
    pub fn new(roster: TuModelRoster) -> Self {
        Self { roster }
    }

    /// Joins single-turn replies of the three models with their source question.
    ///
    /// Each item carries the question stem, the last assistant reply before the
    /// student's turn and the reference reply (`gt`).
    pub fn collate(&self, questions: Vec<Value>, per_model: TuPerModel<Vec<Value>>) -> Vec<Value> {
        let mut sources: HashMap<String, (String, String, String)> = HashMap::new();
        for question in parse_all::<QuestionRecord>(questions, "question") {
            let Some(qid) = id_string(&question.dialog_id) else {
                continue;
            };
            let stem = question
                .messages
                .first()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            let history = question
                .messages
                .len()
                .saturating_sub(1);
            let last_reply = question.messages[..history]
                .iter()
                .rev()
                .find(|m| m.role == "assistant")
                .map(|m| m.content.clone())
                .unwrap_or_default();
            sources.insert(qid, (stem, last_reply, question.gt));
        }

        let mut order: Vec<String> = Vec::new();
        let mut items: HashMap<String, Value> = HashMap::new();

        for (model, records) in TuModelId::ALL.into_iter().zip(per_model.0) {
            for record in parse_all::<SingleDialogRecord>(records, "single dialog") {
                let Some(qid) = id_string(&record.dialog_id) else {
                    continue;
                };
                let item = items.entry(qid.clone()).or_insert_with(|| {
                    order.push(qid.clone());
                    let (stem, last_reply, gt) = sources.get(&qid).cloned().unwrap_or_else(|| {
                        (MISSING_QUESTION.to_string(), String::new(), String::new())
                    });
                    json!({
                        "question_id": qid,
                        "type": record.kind.clone().unwrap_or_else(|| "correct".to_string()),
                        "question": stem,
                        "last_model_reply": last_reply,
                        "single_dialog": {
                            "user": record.single_dialog.user,
                            "gt": gt,
                        },
                    })
                });
                if let Some(single) = item.get_mut("single_dialog").and_then(Value::as_object_mut) {
                    single.insert(
                        self.roster.name(model).to_string(),
                        Value::String(record.single_dialog.model_response.clone()),
                    );
                }
            }
        }

        let names = self.roster.names().clone();
        let output: Vec<Value> = order
            .into_iter()
            .filter_map(|qid| items.remove(&qid))
            .filter(|item| {
                names
                    .iter()
                    .all(|name| item["single_dialog"].get(name.as_str()).is_some())
            })
            .collect();

        log::info!("collated {} part3 items", output.len());
        output
    }
}
