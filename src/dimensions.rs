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

//! # Evaluation Dimensions
//!
//! The fixed catalogue of evaluation criteria and the value domain of each.
//! Part1 has eight named dimensions, Part2 has one dimension per block type and
//! Part3 has two dimensions whose labels depend on the item's feedback type.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TuError};
use crate::model::{TuBlockType, TuFeedbackType};

const EPSILON: f64 = 1e-9;

/// Control type of a dimension, which fixes its value domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TuControl {
    /// Integer 0..=10.
    IntSlider,
    /// 0.0..=1.0 in steps of 0.1.
    FloatSlider,
    /// {0, 1}.
    Binary,
    /// {0, 0.5, 1}.
    Ternary,
    /// Ordinal rank 0..=3 from a full-order preference selection.
    Rank,
}

impl TuControl {
    pub fn minimum(self) -> f64 {
        0.0
    }

    /// Discrete options for radio-style controls.
    pub fn options(self) -> Option<&'static [f64]> {
        match self {
            TuControl::Binary => Some(&[0.0, 1.0]),
            TuControl::Ternary => Some(&[0.0, 0.5, 1.0]),
            _ => None,
        }
    }

    /// Checks a value against the domain and returns its canonical form.
    pub fn validate(self, value: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(TuError::validation(format!("score {} is not finite", value)));
        }
        match self {
            TuControl::IntSlider => {
                if value.fract().abs() > EPSILON || !(0.0..=10.0).contains(&value) {
                    return Err(TuError::validation(format!(
                        "score {} must be an integer in 0..=10",
                        value
                    )));
                }
                Ok(value.round())
            }
            TuControl::FloatSlider => {
                let tenths = (value * 10.0).round();
                if (value * 10.0 - tenths).abs() > 1e-6 || !(0.0..=10.0).contains(&tenths) {
                    return Err(TuError::validation(format!(
                        "score {} must be a multiple of 0.1 in 0.0..=1.0",
                        value
                    )));
                }
                Ok(tenths / 10.0)
            }
            TuControl::Binary | TuControl::Ternary => {
                let options = self.options().unwrap_or(&[]);
                options
                    .iter()
                    .copied()
                    .find(|o| (o - value).abs() < EPSILON)
                    .ok_or_else(|| {
                        TuError::validation(format!(
                            "score {} must be one of {:?}",
                            value, options
                        ))
                    })
            }
            TuControl::Rank => {
                if value.fract().abs() > EPSILON || !(0.0..=3.0).contains(&value) {
                    return Err(TuError::validation(format!(
                        "rank {} must be an integer in 0..=3",
                        value
                    )));
                }
                Ok(value.round())
            }
        }
    }

    /// Formats a stored value for the export table.
    pub fn format(self, value: f64) -> String {
        match self {
            TuControl::FloatSlider => format!("{:.1}", value),
            _ if value.fract().abs() < EPSILON => format!("{}", value as i64),
            _ => format!("{}", value),
        }
    }
}

/// The eight Part1 dimensions, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TuPart1Dimension {
    PreferenceRank,
    Fluency,
    PointsOutKnowledge,
    KnowledgeCorrect,
    FinalAnswerCorrect,
    ProcessCorrect,
    StepByStep,
    QuestioningQuality,
}

impl TuPart1Dimension {
    pub const ALL: [TuPart1Dimension; 8] = [
        TuPart1Dimension::PreferenceRank,
        TuPart1Dimension::Fluency,
        TuPart1Dimension::PointsOutKnowledge,
        TuPart1Dimension::KnowledgeCorrect,
        TuPart1Dimension::FinalAnswerCorrect,
        TuPart1Dimension::ProcessCorrect,
        TuPart1Dimension::StepByStep,
        TuPart1Dimension::QuestioningQuality,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TuPart1Dimension::PreferenceRank => "整体偏好排序（主观倾向）",
            TuPart1Dimension::Fluency => "语言流畅度",
            TuPart1Dimension::PointsOutKnowledge => "是否指出知识点",
            TuPart1Dimension::KnowledgeCorrect => "知识点内容是否正确",
            TuPart1Dimension::FinalAnswerCorrect => "最终答案正确",
            TuPart1Dimension::ProcessCorrect => "过程正确",
            TuPart1Dimension::StepByStep => "是否分步讲解",
            TuPart1Dimension::QuestioningQuality => "提问质量",
        }
    }

    pub fn control(self) -> TuControl {
        match self {
            TuPart1Dimension::PreferenceRank => TuControl::Rank,
            TuPart1Dimension::Fluency => TuControl::IntSlider,
            TuPart1Dimension::ProcessCorrect | TuPart1Dimension::QuestioningQuality => {
                TuControl::FloatSlider
            }
            _ => TuControl::Binary,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TuPart1Dimension::PreferenceRank => {
                "阅读三个模型的答疑对话后，按你最倾向用于实际学生答疑的顺序对三个模型排序。"
            }
            TuPart1Dimension::Fluency => "语言符合语法、表达简洁准确、清晰易懂为满分（10）。",
            TuPart1Dimension::PointsOutKnowledge => "模型是否明确告知学生题目涉及的知识点，有则1，无则0。",
            TuPart1Dimension::KnowledgeCorrect => "对话中提及的知识点、概念描述是否都正确，是则1，否则0。",
            TuPart1Dimension::FinalAnswerCorrect => "模型给出的最终答案是否正确，未给出视为0。",
            TuPart1Dimension::ProcessCorrect => "逐步讲解中正确部分的大致占比（0.0 至 1.0）。",
            TuPart1Dimension::StepByStep => "是否每轮只引导下一步、逐步讲解，是则1，直接给出结果则0。",
            TuPart1Dimension::QuestioningQuality => "讲解中高质量提问（具体引导下一步）的大致比例。",
        }
    }

    /// 1-based display number.
    pub fn number(self) -> usize {
        Self::ALL.iter().position(|d| *d == self).unwrap_or(0) + 1
    }

    pub fn from_number(number: usize) -> Result<Self> {
        number
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| TuError::validation(format!("part1 dimension {} is out of range 1..=8", number)))
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.label() == label)
    }
}

/// Dimension label scored for a Part2 block of the given type.
pub fn part2_label(block_type: TuBlockType) -> &'static str {
    match block_type {
        TuBlockType::Comprehension => "引导质量（理解）",
        TuBlockType::NonComprehension => "引导质量（不理解）",
        TuBlockType::OffTopic => "导正话题",
    }
}

pub fn part2_control(block_type: TuBlockType) -> TuControl {
    match block_type {
        TuBlockType::OffTopic => TuControl::Ternary,
        _ => TuControl::Binary,
    }
}

pub fn part2_description(block_type: TuBlockType) -> &'static str {
    match block_type {
        TuBlockType::Comprehension => "学生表示理解时，当前轮是否在逻辑上推进到下一步；有推进为1，否则为0。",
        TuBlockType::NonComprehension => "学生表示不理解时，当前轮是否补充了新的解释、示例或提示；有为1，否则为0。",
        TuBlockType::OffTopic => "学生答非所问时：顺着无关话题为0，无视并继续讲解为0.5，引导回到题目并继续讲解为1。",
    }
}

/// Number of scored dimensions per Part3 item.
pub const PART3_SCORES_PER_ITEM: usize = 2;

pub fn part3_control() -> TuControl {
    TuControl::Binary
}

/// Human-readable label of a Part3 score, by the item's feedback type.
pub fn part3_label(feedback_type: TuFeedbackType, score_index: usize) -> String {
    let pair = match feedback_type {
        TuFeedbackType::Correct => ["肯定学生回答正确", "引导下一步或总结答案"],
        TuFeedbackType::Error => ["指出学生回答错误", "纠正或引导纠正学生错误"],
        TuFeedbackType::Question => ["回应学生提问", "正确解答学生提问"],
    };
    pair.get(score_index)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("评分项{}", score_index))
}
