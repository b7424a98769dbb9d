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

//! # Corpus Loader
//!
//! A per-teacher corpus is a JSON array of samples. Loading only checks the
//! top-level shape and indexes sample ids; each sample is validated and
//! normalized when it is first accessed, so one malformed record does not
//! block annotation of the others. A normalized sample is kept and reused;
//! a sample that fails validation is re-checked on every access.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::{Result, TuError};
use crate::ingest::reader::TuStreamReader;
use crate::model::{
    TuBlockType, TuDialogue, TuFeedbackType, TuModelId, TuModelRoster, TuPart1, TuPart2Block,
    TuPart3Item, TuPerModel, TuSample, TuTurn,
};

/// Part2 per-model content as found in corpora of different vintages.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDialogue {
    Nested {
        #[serde(default)]
        question: Option<String>,
        #[serde(default)]
        dialogue: Vec<TuTurn>,
    },
    Flat(Vec<TuTurn>),
}

impl From<RawDialogue> for TuDialogue {
    fn from(raw: RawDialogue) -> Self {
        match raw {
            RawDialogue::Nested { question, dialogue } => TuDialogue { question, dialogue },
            RawDialogue::Flat(dialogue) => TuDialogue {
                question: None,
                dialogue,
            },
        }
    }
}

/// Ordered annotation samples of one teacher.
#[derive(Clone, Debug)]
pub struct TuCorpus {
    roster: TuModelRoster,
    records: Vec<Value>,
    parsed: Vec<OnceCell<TuSample>>,
    poids: Vec<String>,
    poid_index: HashMap<String, usize>,
}

impl TuCorpus {
    /// Reads a corpus file. Only the top-level array is checked here.
    pub fn load(path: &Path, roster: TuModelRoster) -> Result<Self> {
        let records = TuStreamReader::new().read_json_array(path)?;
        let corpus = Self::from_values(records, roster);
        log::info!("loaded {} samples from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    pub fn from_values(records: Vec<Value>, roster: TuModelRoster) -> Self {
        let poids: Vec<String> = records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                record
                    .get("poid")
                    .and_then(id_string)
                    .unwrap_or_else(|| format!("id_{}", idx))
            })
            .collect();

        let mut poid_index = HashMap::with_capacity(poids.len());
        for (idx, poid) in poids.iter().enumerate() {
            if poid_index.contains_key(poid) {
                log::warn!("duplicate poid '{}' at sample {}, keeping the first", poid, idx + 1);
                continue;
            }
            poid_index.insert(poid.clone(), idx);
        }

        Self {
            roster,
            parsed: records.iter().map(|_| OnceCell::new()).collect(),
            records,
            poids,
            poid_index,
        }
    }

    pub fn roster(&self) -> &TuModelRoster {
        &self.roster
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn poid(&self, index: usize) -> Option<&str> {
        self.poids.get(index).map(String::as_str)
    }

    pub fn index_of(&self, poid: &str) -> Option<usize> {
        self.poid_index.get(poid).copied()
    }

    /// `index / total` display string, 1-based.
    pub fn position_label(&self, poid: &str) -> Option<String> {
        self.index_of(poid)
            .map(|idx| format!("{} / {}", idx + 1, self.len()))
    }

    /// Validated, normalized sample. Normalization runs on the first
    /// successful access only.
    pub fn sample(&self, index: usize) -> Result<&TuSample> {
        let cell = self.parsed.get(index).ok_or(TuError::Navigation {
            requested: index + 1,
            total: self.len(),
        })?;
        if let Some(sample) = cell.get() {
            return Ok(sample);
        }
        let sample = self.parse_sample(index)?;
        Ok(cell.get_or_init(|| sample))
    }

    fn parse_sample(&self, index: usize) -> Result<TuSample> {
        let record = self.records.get(index).ok_or(TuError::Navigation {
            requested: index + 1,
            total: self.len(),
        })?;
        let poid = self.poids[index].clone();
        let context = |message: String| TuError::schema(format!("sample {} ({}): {}", index + 1, poid, message));

        let content = record
            .get("content")
            .and_then(Value::as_object)
            .ok_or_else(|| context("missing object 'content'".to_string()))?;

        let part1 = content
            .get("part1")
            .and_then(Value::as_object)
            .ok_or_else(|| context("missing object 'content.part1'".to_string()))
            .and_then(|p| self.parse_part1(p).map_err(|e| context(e.to_string())))?;

        let part2 = content
            .get("part2")
            .and_then(Value::as_array)
            .ok_or_else(|| context("missing array 'content.part2'".to_string()))?
            .iter()
            .enumerate()
            .map(|(i, block)| {
                self.parse_part2_block(block)
                    .map_err(|e| context(format!("part2 block {}: {}", i + 1, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let part3 = content
            .get("part3")
            .and_then(Value::as_array)
            .ok_or_else(|| context("missing array 'content.part3'".to_string()))?
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.parse_part3_item(item)
                    .map_err(|e| context(format!("part3 item {}: {}", i + 1, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TuSample {
            poid,
            part1,
            part2,
            part3,
        })
    }

    /// Feedback type of every Part3 item, keyed by `(poid, question_id)`.
    ///
    /// Scans the raw records leniently so that one malformed sample does not
    /// hide the types of the others.
    pub fn feedback_types(&self) -> HashMap<(String, String), TuFeedbackType> {
        let mut types = HashMap::new();
        for (idx, record) in self.records.iter().enumerate() {
            let items = record
                .get("content")
                .and_then(|c| c.get("part3"))
                .and_then(Value::as_array);
            let Some(items) = items else { continue };
            for item in items {
                let Some(qid) = item.get("question_id").and_then(id_string) else {
                    continue;
                };
                let feedback = item
                    .get("type")
                    .and_then(Value::as_str)
                    .map(TuFeedbackType::from_tag)
                    .unwrap_or(TuFeedbackType::Correct);
                types
                    .entry((self.poids[idx].clone(), qid))
                    .or_insert(feedback);
            }
        }
        types
    }

    fn parse_part1(&self, part1: &Map<String, Value>) -> Result<TuPart1> {
        let question = part1
            .get("question")
            .and_then(Value::as_str)
            .ok_or_else(|| TuError::schema("part1 has no 'question'"))?
            .to_string();

        let dialogues = TuPerModel::try_from_fn(|model| {
            match self.model_entry(part1, model) {
                Some(turns) => Ok(serde_json::from_value::<Vec<TuTurn>>(turns.clone())?),
                None => Ok(Vec::new()),
            }
        })?;

        Ok(TuPart1 {
            question,
            answer: part1
                .get("answer")
                .and_then(Value::as_str)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
            question_id: part1.get("question_id").and_then(id_string),
            dialogues,
        })
    }

    fn parse_part2_block(&self, block: &Value) -> Result<TuPart2Block> {
        let code = block
            .get("type")
            .and_then(Value::as_u64)
            .ok_or_else(|| TuError::schema("block has no integer 'type'"))?;
        let block_type = TuBlockType::from_code(code)?;

        let content = block
            .get("content")
            .and_then(Value::as_object)
            .ok_or_else(|| TuError::schema("block has no object 'content'"))?;

        let content = TuPerModel::try_from_fn(|model| {
            let raw = self.model_entry(content, model).ok_or_else(|| {
                TuError::schema(format!("block content has no entry for model {}", model))
            })?;
            let raw: RawDialogue = serde_json::from_value(raw.clone())?;
            Ok(TuDialogue::from(raw))
        })?;

        Ok(TuPart2Block {
            block_type,
            question_id: block.get("question_id").and_then(id_string),
            content,
        })
    }

    fn parse_part3_item(&self, item: &Value) -> Result<TuPart3Item> {
        let question_id = item
            .get("question_id")
            .and_then(id_string)
            .ok_or_else(|| TuError::schema("item has no 'question_id'"))?;
        let single = item
            .get("single_dialog")
            .and_then(Value::as_object)
            .ok_or_else(|| TuError::schema("item has no object 'single_dialog'"))?;

        let text = |map: &Map<String, Value>, key: &str| -> Option<String> {
            map.get(key).and_then(Value::as_str).map(str::to_string)
        };

        let responses = TuPerModel::try_from_fn(|model| {
            let name = self.roster.name(model);
            text(single, &format!("model_response_{}", model.as_str()))
                .or_else(|| text(single, &format!("model_response_{}", name)))
                .or_else(|| text(single, name))
                .ok_or_else(|| TuError::schema(format!("single_dialog has no response for model {}", model)))
        })?;

        Ok(TuPart3Item {
            question_id,
            feedback_type: item
                .get("type")
                .and_then(Value::as_str)
                .map(TuFeedbackType::from_tag)
                .unwrap_or(TuFeedbackType::Correct),
            question: item
                .get("question")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            last_model_reply: item
                .get("last_model_reply")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            student: text(single, "user").unwrap_or_default(),
            responses,
            reference: text(single, "gt").unwrap_or_default(),
        })
    }

    /// Per-model entry keyed by canonical id or by real model name.
    fn model_entry<'a>(&self, map: &'a Map<String, Value>, model: TuModelId) -> Option<&'a Value> {
        map.get(model.as_str())
            .or_else(|| map.get(self.roster.name(model)))
    }
}

/// Ids in the corpora are strings or plain numbers.
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
