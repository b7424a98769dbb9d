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

//! # Legacy Score Import
//!
//! Older annotation rounds dumped each teacher's scores as three maps keyed by
//! composite strings:
//!
//! ```text
//! part1_scores: { "part1_<poid>": { "<dimension label>": { "A": 3, ... } } }
//! part2_scores: { "part2_<poid>_idx<n>_t<type>_<k>": { "A": 1, ... } }
//! part3_scores: { "part3_<poid>_<qid>_score<i>": { "A": 0, ... } }
//! ```
//!
//! [`TuLegacyImporter`] turns such a dump into a [`TuScoreStore`] so it can be
//! exported without an interactive session. Keys and values that no longer
//! fit the dimension catalogue are skipped with a warning.

use std::collections::BTreeSet;
use std::path::Path;

use regex::Regex;
use serde_json::{Map, Value};

use crate::dimensions::{self, TuControl, TuPart1Dimension};
use crate::errors::{Result, TuError};
use crate::model::{TuBlockType, TuModelId, TuModelRoster};
use crate::session::store::{TuScoreEntry, TuScoreKey, TuScoreStore};

/// Counters of one import.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TuLegacyStats {
    pub entries: usize,
    pub skipped_keys: usize,
    pub skipped_values: usize,
    pub ranked: usize,
}

/// Converts composite-string score dumps into structured keys.
#[derive(Debug)]
pub struct TuLegacyImporter {
    roster: TuModelRoster,
    part1_key: Regex,
    part2_key: Regex,
    part2_block: Regex,
    part3_key: Regex,
}

impl TuLegacyImporter {
    pub fn new(roster: TuModelRoster) -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| TuError::internal(format!("bad key pattern {}: {}", pattern, e)))
        };
        Ok(Self {
            roster,
            part1_key: compile(r"^part1_(.+)$")?,
            part2_key: compile(r"^part2_(.+)_t(\d+)_(\d+)$")?,
            part2_block: compile(r"^(.+)_idx(\d+)$")?,
            part3_key: compile(r"^part3_(.+?)_(.+)_score(\d+)$")?,
        })
    }

    pub fn import_path(&self, path: &Path) -> Result<(TuScoreStore, TuLegacyStats)> {
        let content = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)?;
        log::info!("importing legacy scores from {}", path.display());
        self.import_value(&value)
    }

    pub fn import_value(&self, dump: &Value) -> Result<(TuScoreStore, TuLegacyStats)> {
        let dump = dump
            .as_object()
            .ok_or_else(|| TuError::schema("legacy score dump must be a JSON object"))?;

        let mut store = TuScoreStore::new();
        let mut stats = TuLegacyStats::default();

        for (key, dims) in section(dump, "part1_scores") {
            let Some(caps) = self.part1_key.captures(key) else {
                self.skip_key(&mut stats, key);
                continue;
            };
            let poid = &caps[1];
            let Some(dims) = dims.as_object() else {
                self.skip_key(&mut stats, key);
                continue;
            };
            for (label, models) in dims {
                let Some(dimension) = TuPart1Dimension::from_label(label) else {
                    log::warn!("{}: dropping unknown dimension '{}'", key, label);
                    stats.skipped_keys += 1;
                    continue;
                };
                let entry = self.entry(models, dimension.control(), &mut stats);
                if entry.is_empty() {
                    continue;
                }
                if dimension == TuPart1Dimension::PreferenceRank && is_full_ranking(&entry) {
                    store.mark_ranked(poid);
                    stats.ranked += 1;
                }
                store.restore(TuScoreKey::part1(poid, dimension), entry);
                stats.entries += 1;
            }
        }

        for (key, models) in section(dump, "part2_scores") {
            let Some(caps) = self.part2_key.captures(key) else {
                self.skip_key(&mut stats, key);
                continue;
            };
            let code: u64 = caps[2].parse().unwrap_or(0);
            let Ok(block_type) = TuBlockType::from_code(code) else {
                self.skip_key(&mut stats, key);
                continue;
            };
            let trailing: usize = caps[3].parse().unwrap_or(0);
            let (poid, block_index) = match self.part2_block.captures(&caps[1]) {
                Some(block) => (block[1].to_string(), block[2].parse().unwrap_or(trailing)),
                None => (caps[1].to_string(), trailing),
            };
            let entry = self.entry(models, dimensions::part2_control(block_type), &mut stats);
            if entry.is_empty() {
                continue;
            }
            store.restore(TuScoreKey::part2(poid, block_index, block_type), entry);
            stats.entries += 1;
        }

        for (key, models) in section(dump, "part3_scores") {
            let Some(caps) = self.part3_key.captures(key) else {
                self.skip_key(&mut stats, key);
                continue;
            };
            let score_index: usize = caps[3].parse().unwrap_or(0);
            let entry = self.entry(models, dimensions::part3_control(), &mut stats);
            if entry.is_empty() {
                continue;
            }
            store.restore(TuScoreKey::part3(&caps[1], &caps[2], score_index), entry);
            stats.entries += 1;
        }

        log::info!(
            "legacy import: {} entries, {} ranked samples, {} keys and {} values skipped",
            stats.entries,
            stats.ranked,
            stats.skipped_keys,
            stats.skipped_values
        );
        Ok((store, stats))
    }

    /// Parses `{ "A": v, ... }`. Empty strings mean "not scored" and are left out.
    fn entry(&self, models: &Value, control: TuControl, stats: &mut TuLegacyStats) -> TuScoreEntry {
        let mut entry = TuScoreEntry::new();
        let Some(models) = models.as_object() else {
            stats.skipped_values += 1;
            return entry;
        };
        for (name, raw) in models {
            let Some(model) = self.roster.resolve(name) else {
                stats.skipped_values += 1;
                continue;
            };
            let value = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) if s.trim().is_empty() => continue,
                Value::String(s) => s.trim().parse::<f64>().ok(),
                Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
                _ => None,
            };
            match value.map(|v| control.validate(v)) {
                Some(Ok(v)) => {
                    entry.insert(model, v);
                }
                _ => {
                    log::warn!("skipping out-of-domain legacy score {} for model {}", raw, model);
                    stats.skipped_values += 1;
                }
            }
        }
        entry
    }

    fn skip_key(&self, stats: &mut TuLegacyStats, key: &str) {
        log::warn!("skipping unrecognized legacy key '{}'", key);
        stats.skipped_keys += 1;
    }
}

fn section<'a>(dump: &'a Map<String, Value>, name: &str) -> impl Iterator<Item = (&'a String, &'a Value)> {
    dump.get(name)
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|m| m.iter())
}

fn is_full_ranking(entry: &TuScoreEntry) -> bool {
    let ranks: BTreeSet<i64> = TuModelId::ALL
        .iter()
        .filter_map(|m| entry.get(m))
        .map(|v| *v as i64)
        .collect();
    entry.len() == 3 && ranks == BTreeSet::from([1, 2, 3])
}
