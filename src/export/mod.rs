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

//! # Score Export Module
//!
//! Turns a teacher's scoring store into the tabular result file.
//!
//! ## Module Components
//!
//! - **Reconcile** ([reconcile.rs](reconcile/index.html)): store -> labelled rows under canonical model columns
//! - **Writer** ([writer.rs](writer/index.html)): delimited output with BOM and atomic rename
//!
//! ## Usage
//!
//! ```rust
//! use tutoria::export::{TuCsvWriter, TuReconciler};
//!
//! let rows = TuReconciler::new(&corpus, &policy).reconcile(&store);
//! let stats = TuCsvWriter::new(policy.clone())?.write(&rows, corpus.roster(), &path)?;
//! ```

pub mod reconcile;
pub mod writer;

pub use reconcile::{export_headers, TuExportRow, TuReconciler};
pub use writer::{export_file_name, TuCsvWriter, TuWriteStats};
