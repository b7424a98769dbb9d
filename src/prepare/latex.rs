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

//! # LaTeX Normalization
//!
//! Generated dialogues mix math delimiters (`\(x\)`, `\[..\]`, `(\boxed{0})`).
//! This pass rewrites selected text fields of a corpus into `$$...$$` form
//! through a [`TuTextRepairer`]. A failed field keeps its original text; the
//! pass never aborts on a single field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::TuLatexConfig;
use crate::errors::{Result, TuError};
use crate::ingest::reader::{sibling_with_suffix, write_json_array, TuStreamReader};
use crate::model::{TuModelId, TuModelRoster};

/// Rewrites one text field.
pub trait TuTextRepairer {
    fn repair(&self, text: &str) -> Result<String>;
}

/// Which fields a pass touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TuRepairScope {
    /// `model_respond` turns of Part1 and Part2, and Part3 model responses.
    ModelResponses,
    /// Part3 student turn (`user`) and reference reply (`gt`).
    StudentAndReference,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuRepairStats {
    pub fields_seen: usize,
    pub fields_skipped: usize,
    pub fields_repaired: usize,
    pub fields_failed: usize,
}

const REPAIR_PROMPT: &str = "你是一个文本修复工具，只允许修改数学公式的表示形式，其它任何字符、标点、换行都不允许修改。\n\
请将以下文本中所有非标准 LaTeX 数学表达式（如 \\(x\\)、(\\boxed{0})）转换为标准的 $$...$$ 形式。\n\
只输出转换后的文本，不要输出任何解释。\n\n\
示例：\n原始：本题答案为 (\\boxed{0})。\n转换：本题答案为 $$\\boxed{0}$$。\n\n\
原始内容如下：\n";

/// Repairer backed by an OpenAI-style chat-completions endpoint.
#[derive(Debug)]
pub struct TuLlmLatexRepairer {
    config: TuLatexConfig,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl TuLlmLatexRepairer {
    /// Reads the API key from the environment variable named in `config`.
    pub fn from_config(config: TuLatexConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            log::warn!(
                "{} is not set, requests to {} go out unauthenticated",
                config.api_key_env,
                config.endpoint
            );
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn parse_response(json: &Value) -> Result<String> {
        json.get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.pointer("/message/content"))
            .and_then(Value::as_str)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| TuError::Http("completion response has no message content".to_string()))
    }
}

impl TuTextRepairer for TuLlmLatexRepairer {
    fn repair(&self, text: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": format!("{}{}", REPAIR_PROMPT, text)}],
            "temperature": 0,
        });

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send()?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(TuError::Http(format!("completion endpoint returned {}: {}", status, body)));
        }
        let json: Value = response.json()?;
        Self::parse_response(&json)
    }
}

/// Applies a repairer over the text fields of corpus samples.
pub struct TuLatexRepairPass<'r> {
    repairer: &'r dyn TuTextRepairer,
    roster: TuModelRoster,
    scopes: Vec<TuRepairScope>,
    only_when_needed: bool,
    needs_repair: Regex,
}

impl<'r> TuLatexRepairPass<'r> {
    pub fn new(repairer: &'r dyn TuTextRepairer, roster: TuModelRoster, scopes: Vec<TuRepairScope>) -> Result<Self> {
        let needs_repair = Regex::new(r"\\\(|\\\[|\(\\boxed")
            .map_err(|e| TuError::internal(format!("bad delimiter pattern: {}", e)))?;
        Ok(Self {
            repairer,
            roster,
            scopes,
            only_when_needed: true,
            needs_repair,
        })
    }

    /// With `false`, every field goes to the repairer, suspicious or not.
    pub fn with_only_when_needed(mut self, enabled: bool) -> Self {
        self.only_when_needed = enabled;
        self
    }

    /// Repairs the fields of `samples` in place.
    pub fn run(&self, samples: &mut [Value]) -> TuRepairStats {
        let mut stats = TuRepairStats::default();
        for (idx, sample) in samples.iter_mut().enumerate() {
            let Some(content) = sample.get_mut("content").and_then(Value::as_object_mut) else {
                log::warn!("sample {} has no content, skipped", idx + 1);
                continue;
            };
            if self.scopes.contains(&TuRepairScope::ModelResponses) {
                self.repair_model_responses(content, &mut stats);
            }
            if self.scopes.contains(&TuRepairScope::StudentAndReference) {
                self.repair_student_and_reference(content, &mut stats);
            }
        }
        log::info!(
            "latex repair: {} fields seen, {} repaired, {} skipped, {} failed",
            stats.fields_seen,
            stats.fields_repaired,
            stats.fields_skipped,
            stats.fields_failed
        );
        stats
    }

    /// Reads a corpus file, repairs it and writes `<name>_fixed.json` next to it.
    pub fn repair_file(&self, path: &Path) -> Result<(PathBuf, TuRepairStats)> {
        let mut samples = TuStreamReader::new().read_json_array(path)?;
        let stats = self.run(&mut samples);
        let output = sibling_with_suffix(path, "_fixed");
        write_json_array(&output, &samples)?;
        log::info!("repaired corpus written to {}", output.display());
        Ok((output, stats))
    }

    fn repair_model_responses(&self, content: &mut Map<String, Value>, stats: &mut TuRepairStats) {
        if let Some(part1) = content.get_mut("part1").and_then(Value::as_object_mut) {
            for (key, turns) in part1.iter_mut() {
                if self.roster.resolve(key).is_some() {
                    self.repair_turns(turns, stats);
                }
            }
        }

        if let Some(blocks) = content.get_mut("part2").and_then(Value::as_array_mut) {
            for block in blocks {
                let Some(per_model) = block.get_mut("content").and_then(Value::as_object_mut) else {
                    continue;
                };
                for (key, dialogue) in per_model.iter_mut() {
                    if self.roster.resolve(key).is_none() {
                        continue;
                    }
                    match dialogue {
                        Value::Array(_) => self.repair_turns(dialogue, stats),
                        Value::Object(nested) => {
                            if let Some(turns) = nested.get_mut("dialogue") {
                                self.repair_turns(turns, stats);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        if let Some(items) = content.get_mut("part3").and_then(Value::as_array_mut) {
            for item in items {
                let Some(single) = item.get_mut("single_dialog").and_then(Value::as_object_mut) else {
                    continue;
                };
                for model in TuModelId::ALL {
                    let keys = [
                        format!("model_response_{}", model.as_str()),
                        format!("model_response_{}", self.roster.name(model)),
                        self.roster.name(model).to_string(),
                    ];
                    for key in keys {
                        if let Some(field) = single.get_mut(&key) {
                            self.repair_field(field, stats);
                        }
                    }
                }
            }
        }
    }

    fn repair_student_and_reference(&self, content: &mut Map<String, Value>, stats: &mut TuRepairStats) {
        let Some(items) = content.get_mut("part3").and_then(Value::as_array_mut) else {
            return;
        };
        for item in items {
            let Some(single) = item.get_mut("single_dialog").and_then(Value::as_object_mut) else {
                continue;
            };
            for key in ["user", "gt"] {
                if let Some(field) = single.get_mut(key) {
                    self.repair_field(field, stats);
                }
            }
        }
    }

    fn repair_turns(&self, turns: &mut Value, stats: &mut TuRepairStats) {
        let Some(turns) = turns.as_array_mut() else { return };
        for turn in turns {
            if let Some(field) = turn.get_mut("model_respond") {
                self.repair_field(field, stats);
            }
        }
    }

    fn repair_field(&self, field: &mut Value, stats: &mut TuRepairStats) {
        let Some(text) = field.as_str() else { return };
        stats.fields_seen += 1;
        if self.only_when_needed && !self.needs_repair.is_match(text) {
            stats.fields_skipped += 1;
            return;
        }
        match self.repairer.repair(text) {
            Ok(fixed) => {
                *field = Value::String(fixed);
                stats.fields_repaired += 1;
            }
            Err(e) => {
                log::warn!("latex repair failed, keeping original text: {}", e);
                stats.fields_failed += 1;
            }
        }
    }
}
