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

//! # Tutoria Model Module
//!
//! Core data structures for annotation samples. A [`TuSample`] is the unit of
//! annotation work: one tutoring question with three model dialogues (Part1),
//! a list of scenario blocks (Part2) and single-turn feedback items (Part3).
//!
//! ## Identities
//!
//! - [`TuModelId`]: canonical model identity (A/B/C). Never shown to the
//!   annotator, always used for storage and export.
//! - [`TuSlot`]: presentation slot ("模型1/2/3") the annotator sees. Slots are
//!   bound to canonical identities per sample by the blind map.
//!
//! Samples are immutable once loaded; every downstream component reads them
//! through the normalized shapes defined here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TuError};

/// Canonical model identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TuModelId {
    A,
    B,
    C,
}

impl TuModelId {
    pub const ALL: [TuModelId; 3] = [TuModelId::A, TuModelId::B, TuModelId::C];

    pub fn index(self) -> usize {
        match self {
            TuModelId::A => 0,
            TuModelId::B => 1,
            TuModelId::C => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TuModelId::A => "A",
            TuModelId::B => "B",
            TuModelId::C => "C",
        }
    }
}

impl fmt::Display for TuModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TuModelId {
    type Err = TuError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "A" | "a" => Ok(TuModelId::A),
            "B" | "b" => Ok(TuModelId::B),
            "C" | "c" => Ok(TuModelId::C),
            other => Err(TuError::validation(format!("unknown model id '{}'", other))),
        }
    }
}

/// Presentation slot shown to the annotator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TuSlot {
    One,
    Two,
    Three,
}

impl TuSlot {
    pub const ALL: [TuSlot; 3] = [TuSlot::One, TuSlot::Two, TuSlot::Three];

    pub fn index(self) -> usize {
        match self {
            TuSlot::One => 0,
            TuSlot::Two => 1,
            TuSlot::Three => 2,
        }
    }

    pub fn number(self) -> usize {
        self.index() + 1
    }
}

impl fmt::Display for TuSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "模型{}", self.number())
    }
}

impl FromStr for TuSlot {
    type Err = TuError;

    /// Accepts `1`, `模型1` and `m1` style spellings.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("模型")
            .or_else(|| trimmed.strip_prefix('m'))
            .unwrap_or(trimmed);
        match digits {
            "1" => Ok(TuSlot::One),
            "2" => Ok(TuSlot::Two),
            "3" => Ok(TuSlot::Three),
            _ => Err(TuError::validation(format!("unknown model slot '{}'", s))),
        }
    }
}

/// One value per canonical model, indexed by [`TuModelId`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TuPerModel<T>(pub [T; 3]);

impl<T> TuPerModel<T> {
    pub fn new(a: T, b: T, c: T) -> Self {
        TuPerModel([a, b, c])
    }

    pub fn get(&self, model: TuModelId) -> &T {
        &self.0[model.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TuModelId, &T)> {
        TuModelId::ALL.into_iter().zip(self.0.iter())
    }

    /// Builds the set by resolving each model in turn, stopping at the first error.
    pub fn try_from_fn<F>(mut f: F) -> Result<Self>
    where
        F: FnMut(TuModelId) -> Result<T>,
    {
        Ok(TuPerModel([f(TuModelId::A)?, f(TuModelId::B)?, f(TuModelId::C)?]))
    }
}

/// Real model names behind the canonical identities.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuModelRoster {
    names: [String; 3],
}

impl Default for TuModelRoster {
    fn default() -> Self {
        Self {
            names: [
                "DeepSeek-V3".to_string(),
                "o4-mini".to_string(),
                "Spark_X1".to_string(),
            ],
        }
    }
}

impl TuModelRoster {
    pub fn new(a: impl Into<String>, b: impl Into<String>, c: impl Into<String>) -> Result<Self> {
        let names = [a.into(), b.into(), c.into()];
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(TuError::validation(format!(
                    "model name for {} is empty",
                    TuModelId::ALL[i]
                )));
            }
        }
        if names[0] == names[1] || names[1] == names[2] || names[0] == names[2] {
            return Err(TuError::validation("model names must be distinct"));
        }
        Ok(Self { names })
    }

    pub fn name(&self, model: TuModelId) -> &str {
        &self.names[model.index()]
    }

    pub fn names(&self) -> &[String; 3] {
        &self.names
    }

    /// Resolves either a canonical id (`A`) or a real name (`o4-mini`).
    pub fn resolve(&self, key: &str) -> Option<TuModelId> {
        if let Ok(id) = key.parse::<TuModelId>() {
            return Some(id);
        }
        self.names
            .iter()
            .position(|n| n == key)
            .map(|i| TuModelId::ALL[i])
    }
}

/// One dialogue turn. Absence of a side means that side did not speak.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuTurn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_respond: Option<String>,
}

impl TuTurn {
    pub fn student(text: impl Into<String>) -> Self {
        Self {
            user: Some(text.into()),
            model_respond: None,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            user: None,
            model_respond: Some(text.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.model_respond.is_none()
    }
}

/// Pads every column with empty turns up to the longest one.
///
/// Existing turns are never touched; empty records are appended at the tail.
pub fn pad_turns(columns: &mut [Vec<TuTurn>]) {
    let max_len = columns.iter().map(Vec::len).max().unwrap_or(0);
    for column in columns.iter_mut() {
        column.resize_with(max_len, TuTurn::default);
    }
}

/// Normalized per-model dialogue of a Part2 block.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TuDialogue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default)]
    pub dialogue: Vec<TuTurn>,
}

/// Part1: the overall Q&A evaluation unit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuPart1 {
    pub question: String,
    pub answer: Option<String>,
    pub question_id: Option<String>,
    pub dialogues: TuPerModel<Vec<TuTurn>>,
}

/// Scenario tag of a Part2 block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TuBlockType {
    Comprehension,
    NonComprehension,
    OffTopic,
}

impl TuBlockType {
    pub const ALL: [TuBlockType; 3] = [
        TuBlockType::Comprehension,
        TuBlockType::NonComprehension,
        TuBlockType::OffTopic,
    ];

    pub fn code(self) -> u8 {
        match self {
            TuBlockType::Comprehension => 1,
            TuBlockType::NonComprehension => 2,
            TuBlockType::OffTopic => 3,
        }
    }

    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            1 => Ok(TuBlockType::Comprehension),
            2 => Ok(TuBlockType::NonComprehension),
            3 => Ok(TuBlockType::OffTopic),
            other => Err(TuError::schema(format!("unknown part2 block type {}", other))),
        }
    }

    /// Scenario tag shown above the block.
    pub fn display_tag(self) -> &'static str {
        match self {
            TuBlockType::Comprehension => "理解（do）",
            TuBlockType::NonComprehension => "不理解（don't）",
            TuBlockType::OffTopic => "无关回答（noise）",
        }
    }
}

/// Part2: one scenario block, normalized to a single shape per model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuPart2Block {
    pub block_type: TuBlockType,
    pub question_id: Option<String>,
    pub content: TuPerModel<TuDialogue>,
}

/// Kind of student utterance a Part3 item reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TuFeedbackType {
    Correct,
    Error,
    Question,
}

impl TuFeedbackType {
    pub fn as_str(self) -> &'static str {
        match self {
            TuFeedbackType::Correct => "correct",
            TuFeedbackType::Error => "error",
            TuFeedbackType::Question => "question",
        }
    }

    /// Parses the corpus tag. Unknown tags are treated as `correct`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "error" => TuFeedbackType::Error,
            "question" => TuFeedbackType::Question,
            "correct" => TuFeedbackType::Correct,
            other => {
                log::debug!("unknown part3 type '{}', treating as correct", other);
                TuFeedbackType::Correct
            }
        }
    }
}

/// Part3: a single-turn feedback item.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuPart3Item {
    pub question_id: String,
    pub feedback_type: TuFeedbackType,
    pub question: String,
    pub last_model_reply: Option<String>,
    pub student: String,
    pub responses: TuPerModel<String>,
    pub reference: String,
}

/// One unit of annotation work.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuSample {
    pub poid: String,
    pub part1: TuPart1,
    pub part2: Vec<TuPart2Block>,
    pub part3: Vec<TuPart3Item>,
}
