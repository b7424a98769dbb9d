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

//! # Blinded Presentation
//!
//! What a teacher gets to see of a sample: every per-model column reordered
//! into presentation slots by the sample's bijection, dialogue columns padded
//! to equal length, and the current scores of each dimension by slot. Nothing
//! here carries a canonical model id or a real model name.

use serde::Serialize;

use crate::dimensions::{self, TuControl, TuPart1Dimension, PART3_SCORES_PER_ITEM};
use crate::model::{pad_turns, TuFeedbackType, TuPerModel, TuSample, TuSlot, TuTurn};
use crate::session::blind::TuBijection;
use crate::session::store::{TuScoreKey, TuScoreStore};

/// Three values in presentation order (模型1, 模型2, 模型3).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuSlotted<T>(pub [T; 3]);

impl<T: Clone> TuSlotted<T> {
    pub fn from_models(values: &TuPerModel<T>, bijection: &TuBijection) -> Self {
        let [a, b, c] = TuSlot::ALL.map(|slot| values.get(bijection.model_for(slot)).clone());
        TuSlotted([a, b, c])
    }
}

impl<T> TuSlotted<T> {
    pub fn get(&self, slot: TuSlot) -> &T {
        &self.0[slot.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TuSlot, &T)> {
        TuSlot::ALL.into_iter().zip(self.0.iter())
    }
}

/// Scores of one dimension as the teacher sees them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuScoreLine {
    /// 1-based number used to address the dimension.
    pub number: usize,
    pub label: String,
    pub description: String,
    #[serde(skip)]
    pub control: TuControl,
    pub values: TuSlotted<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuPart1View {
    pub question: String,
    pub answer: Option<String>,
    pub dialogues: TuSlotted<Vec<TuTurn>>,
    pub scores: Vec<TuScoreLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuPart2View {
    pub tag: &'static str,
    pub questions: TuSlotted<Option<String>>,
    pub dialogues: TuSlotted<Vec<TuTurn>>,
    pub score: TuScoreLine,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuPart3View {
    pub feedback_type: TuFeedbackType,
    pub question: String,
    pub last_model_reply: Option<String>,
    pub student: String,
    pub responses: TuSlotted<String>,
    pub reference: String,
    pub scores: Vec<TuScoreLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TuSampleView {
    pub poid: String,
    pub position: String,
    pub part1: TuPart1View,
    pub part2: Vec<TuPart2View>,
    pub part3: Vec<TuPart3View>,
}

/// Builds the blinded view of `sample`.
pub fn present(
    sample: &TuSample,
    bijection: &TuBijection,
    store: &TuScoreStore,
    position: String,
) -> TuSampleView {
    let slot_scores = |key: &TuScoreKey| {
        let [a, b, c] = TuSlot::ALL.map(|slot| store.get(key, bijection.model_for(slot), key.control().minimum()));
        TuSlotted([a, b, c])
    };

    let part1_scores = TuPart1Dimension::ALL
        .iter()
        .map(|dimension| {
            let key = TuScoreKey::part1(&sample.poid, *dimension);
            TuScoreLine {
                number: dimension.number(),
                label: dimension.label().to_string(),
                description: dimension.description().to_string(),
                control: dimension.control(),
                values: slot_scores(&key),
            }
        })
        .collect();

    let part1 = TuPart1View {
        question: sample.part1.question.clone(),
        answer: sample.part1.answer.clone(),
        dialogues: padded(TuSlotted::from_models(&sample.part1.dialogues, bijection)),
        scores: part1_scores,
    };

    let part2 = sample
        .part2
        .iter()
        .enumerate()
        .map(|(block_index, block)| {
            let key = TuScoreKey::part2(&sample.poid, block_index, block.block_type);
            let ordered = TuSlotted::from_models(&block.content, bijection);
            TuPart2View {
                tag: block.block_type.display_tag(),
                questions: TuSlotted(ordered.0.clone().map(|d| d.question)),
                dialogues: padded(TuSlotted(ordered.0.map(|d| d.dialogue))),
                score: TuScoreLine {
                    number: block_index + 1,
                    label: dimensions::part2_label(block.block_type).to_string(),
                    description: dimensions::part2_description(block.block_type).to_string(),
                    control: key.control(),
                    values: slot_scores(&key),
                },
            }
        })
        .collect();

    let part3 = sample
        .part3
        .iter()
        .map(|item| {
            let scores = (0..PART3_SCORES_PER_ITEM)
                .map(|score_index| {
                    let key = TuScoreKey::part3(&sample.poid, &item.question_id, score_index);
                    TuScoreLine {
                        number: score_index + 1,
                        label: dimensions::part3_label(item.feedback_type, score_index),
                        description: String::new(),
                        control: key.control(),
                        values: slot_scores(&key),
                    }
                })
                .collect();
            TuPart3View {
                feedback_type: item.feedback_type,
                question: item.question.clone(),
                last_model_reply: item.last_model_reply.clone(),
                student: item.student.clone(),
                responses: TuSlotted::from_models(&item.responses, bijection),
                reference: item.reference.clone(),
                scores,
            }
        })
        .collect();

    TuSampleView {
        poid: sample.poid.clone(),
        position,
        part1,
        part2,
        part3,
    }
}

fn padded(mut columns: TuSlotted<Vec<TuTurn>>) -> TuSlotted<Vec<TuTurn>> {
    pad_turns(&mut columns.0);
    columns
}
