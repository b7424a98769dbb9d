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

//! # Data Ingestion Module
//!
//! Reading of the files Tutoria works on: per-teacher corpora, the JSON and
//! JSONL intermediates of corpus preparation, and legacy score dumps.
//!
//! ## Module Components
//!
//! - **Corpus** ([corpus.rs](corpus/index.html)): ordered samples with lazy per-sample validation
//! - **Reader** ([reader.rs](reader/index.html)): JSON array and JSONL reading and writing
//! - **Legacy** ([legacy.rs](legacy/index.html)): import of composite-string score dumps
//!
//! ## Usage
//!
//! ```rust
//! use tutoria::ingest::TuCorpus;
//! use tutoria::model::TuModelRoster;
//!
//! let corpus = TuCorpus::load(&path, TuModelRoster::default())?;
//! let first = corpus.sample(0)?;
//! ```

pub mod corpus;
pub mod legacy;
pub mod reader;

pub use corpus::TuCorpus;
pub use legacy::{TuLegacyImporter, TuLegacyStats};
pub use reader::{TuReaderConfig, TuStreamReader};
