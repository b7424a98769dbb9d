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

//! # Corpus Preparation Module
//!
//! Offline steps that turn raw model generations into per-teacher corpora.
//! Every step reads and writes plain JSON/JSONL files, so steps can be rerun
//! or replaced independently.
//!
//! ## Module Components
//!
//! - **Collate** ([collate.rs](collate/index.html)): Part1 candidates, Part2 blocks and Part3 items from per-model dumps
//! - **Merge** ([merge.rs](merge/index.html)): sample assembly and Part2 replacement
//! - **Assign** ([assign.rs](assign/index.html)): redundant least-loaded teacher assignment
//! - **LaTeX** ([latex.rs](latex/index.html)): math delimiter normalization through a text repairer
//!
//! ## Pipeline
//!
//! ```text
//! per-model dialogues ─► collate-part1 ─┬──────────────────┐
//!                                       └─► collate-part2 ─┼─► merge ─► repair-latex ─► assign ─► data_T001.json ...
//! per-model single dialogs ─► collate-part3 ───────────────┘
//! ```

pub mod assign;
pub mod collate;
pub mod latex;
pub mod merge;

pub use assign::{teacher_id, write_assignments, TuAssignConfig, TuAssigner, TuAssignment};
pub use collate::{TuPart1Collator, TuPart2Builder, TuPart3Collator};
pub use latex::{TuLatexRepairPass, TuLlmLatexRepairer, TuRepairScope, TuRepairStats, TuTextRepairer};
pub use merge::{group_by_question_id, replace_part2, TuCorpusMerger, TuMergeReport, PART2_BLOCKS_PER_SAMPLE};
