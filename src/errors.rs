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

//! # Tutoria Error Module
//!
//! This module defines the error types used throughout Tutoria for consistent
//! error handling and reporting.
//!
//! ## Error Categories
//!
//! - **Io**: Filesystem errors
//! - **Schema**: Corpus records that do not have the expected structure
//! - **Validation**: Invalid parameters, score values or commands
//! - **UnknownTeacher**: A display id that is not in the teacher table
//! - **CorpusNotFound**: The per-teacher corpus file does not exist
//! - **Navigation**: Jumps outside `[1, total]`
//! - **Serde**: Serialization/deserialization errors
//! - **Http**: Transport failures of the LaTeX repair service
//! - **Internal**: Unexpected internal failures
//!
//! Structural irregularities that have a defined normalization (legacy Part2
//! block shapes, unbalanced turn counts, incomplete rankings) are never
//! reported through this type.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Tutoria.
pub type Result<T> = std::result::Result<T, TuError>;

/// Canonical error enumeration for Tutoria.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum TuError {
    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Errors caused by malformed corpus or record layout.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// Validation errors triggered by invalid parameters or inputs.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The entered teacher id is not known.
    #[error("unknown teacher id '{display_id}'")]
    UnknownTeacher { display_id: String },

    /// No corpus file exists for the teacher.
    #[error("no corpus file for teacher '{teacher_id}' at '{path}'")]
    CorpusNotFound { teacher_id: String, path: String },

    /// Navigation target outside the corpus.
    #[error("sample {requested} is out of range 1..={total}")]
    Navigation { requested: usize, total: usize },

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Transport or protocol failures talking to the repair service.
    #[error("http error: {0}")]
    Http(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for TuError {
    fn from(err: io::Error) -> Self {
        TuError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TuError {
    fn from(err: serde_json::Error) -> Self {
        TuError::Serde(err.to_string())
    }
}

impl From<serde_yaml::Error> for TuError {
    fn from(err: serde_yaml::Error) -> Self {
        TuError::Serde(err.to_string())
    }
}

impl From<csv::Error> for TuError {
    fn from(err: csv::Error) -> Self {
        TuError::Io(format!("csv: {}", err))
    }
}

impl From<reqwest::Error> for TuError {
    fn from(err: reqwest::Error) -> Self {
        TuError::Http(err.to_string())
    }
}

impl TuError {
    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        TuError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct schema errors.
    pub fn schema<T: Into<String>>(message: T) -> Self {
        TuError::Schema {
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        TuError::Internal(message.into())
    }

    /// Whether the error ends the current teacher sign-in.
    ///
    /// A missing corpus or an unknown id sends the user back to id entry;
    /// everything else is reported and the session continues.
    pub fn is_fatal_for_session(&self) -> bool {
        matches!(
            self,
            TuError::CorpusNotFound { .. } | TuError::UnknownTeacher { .. }
        )
    }
}
