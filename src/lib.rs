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

//! # Tutoria Core Library
//!
//! Blind three-model comparison of tutoring dialogues. Teachers score the
//! dialogues of three anonymized models ("模型1/2/3") on a fixed catalogue of
//! dimensions; scores are stored and exported under the canonical model
//! identities (A/B/C and their real names), never under the shuffled slots.
//!
//! ## Module Overview
//!
//! - **model**: samples, canonical model ids, presentation slots, roster
//! - **dimensions**: the evaluation catalogue and value domains
//! - **ingest**: corpus loading, JSON/JSONL reading, legacy score import
//! - **session**: blind map, scoring store, navigation, per-teacher sessions
//! - **present**: slot-ordered view of a sample
//! - **export**: reconciliation into rows and delimited output
//! - **prepare**: offline corpus preparation (collate, merge, assign, LaTeX repair)
//! - **console**: line-oriented annotation front end
//! - **config**: YAML/JSON configuration and overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use tutoria::{TuConfigBuilder, TuWorkbench, TuSlot};
//! use tutoria::dimensions::TuPart1Dimension;
//!
//! let config = TuConfigBuilder::new().data_dir("data").build();
//! let mut workbench = TuWorkbench::new(config)?;
//! let session = workbench.sign_in("t001")?;
//! session.open(0)?;
//! session.rank(0, &[TuSlot::Two, TuSlot::One, TuSlot::Three])?;
//! session.score_part1(0, TuPart1Dimension::Fluency, TuSlot::One, 8.0)?;
//! let rows = session.export_rows();
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, TuError>`. Score values outside a
//! dimension's domain are rejected with a validation error and leave the store
//! untouched.

pub mod config;
pub mod console;
pub mod dimensions;
pub mod errors;
pub mod export;
pub mod ingest;
pub mod model;
pub mod prepare;
pub mod present;
pub mod session;

pub use config::{TuConfig, TuConfigBuilder, TuExportPolicy, TuLatexConfig};
pub use console::{TuCommand, TuConsole};
pub use dimensions::{TuControl, TuPart1Dimension};
pub use errors::{Result, TuError};
pub use export::{TuCsvWriter, TuExportRow, TuReconciler, TuWriteStats};
pub use ingest::{TuCorpus, TuLegacyImporter, TuStreamReader};
pub use model::{
    TuBlockType, TuFeedbackType, TuModelId, TuModelRoster, TuPerModel, TuSample, TuSlot, TuTurn,
};
pub use present::{present, TuSampleView};
pub use session::{
    TuBijection, TuBlindMap, TuNavigator, TuPart, TuRankOutcome, TuScoreKey, TuScoreStore,
    TuSession, TuTeacherId, TuWorkbench,
};
