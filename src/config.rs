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

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, TuError};
use crate::model::TuModelRoster;

/// Export behaviour switches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuExportPolicy {
    /// Only export Part2/Part3 of samples whose Part1 ranking was completed.
    pub require_ranking_before_export: bool,
    /// Add a `sample` column with an `index / total` position string.
    pub annotate_sample_position: bool,
    /// Prefix the file with a UTF-8 byte-order mark.
    pub bom: bool,
    pub delimiter: char,
    /// Write to a temporary file and rename into place.
    pub atomic_write: bool,
}

impl Default for TuExportPolicy {
    fn default() -> Self {
        Self {
            require_ranking_before_export: false,
            annotate_sample_position: false,
            bom: true,
            delimiter: ',',
            atomic_write: true,
        }
    }
}

/// Settings for the offline LaTeX repair pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuLatexConfig {
    /// Chat-completions endpoint.
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Skip texts without non-standard math delimiters.
    pub only_when_needed: bool,
}

impl Default for TuLatexConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://aihubmix.com/v1/chat/completions".to_string(),
            model: "deepseek-ai/DeepSeek-V3-0324".to_string(),
            api_key_env: "TUTORIA_LATEX_API_KEY".to_string(),
            timeout_secs: 60,
            only_when_needed: true,
        }
    }
}

/// Top-level Tutoria configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuConfig {
    pub data_dir: PathBuf,
    /// File name of a teacher corpus; `{teacher}` is replaced by the internal id.
    pub corpus_file_pattern: String,
    pub output_dir: PathBuf,
    /// Real model names behind A, B and C.
    pub models: [String; 3],
    /// Display id -> internal id. Empty accepts any id as-is.
    pub teachers: BTreeMap<String, String>,
    /// Seed for blind assignment; entropy when absent.
    pub blind_seed: Option<u64>,
    pub export: TuExportPolicy,
    pub latex: TuLatexConfig,
}

impl Default for TuConfig {
    fn default() -> Self {
        let roster = TuModelRoster::default();
        Self {
            data_dir: PathBuf::from("."),
            corpus_file_pattern: "data_{teacher}.json".to_string(),
            output_dir: PathBuf::from("."),
            models: roster.names().clone(),
            teachers: BTreeMap::new(),
            blind_seed: None,
            export: TuExportPolicy::default(),
            latex: TuLatexConfig::default(),
        }
    }
}

impl TuConfig {
    /// Loads a configuration file, YAML or JSON by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        let config: TuConfig = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            other => {
                return Err(TuError::validation(format!(
                    "unsupported config format '{}': {}",
                    other,
                    path.display()
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.corpus_file_pattern.contains("{teacher}") {
            return Err(TuError::validation(
                "corpus_file_pattern must contain '{teacher}'",
            ));
        }
        self.roster()?;
        Ok(())
    }

    pub fn roster(&self) -> Result<TuModelRoster> {
        let [a, b, c] = self.models.clone();
        TuModelRoster::new(a, b, c)
    }

    /// Location of the corpus file for an internal teacher id.
    pub fn corpus_path(&self, internal_id: &str) -> PathBuf {
        self.data_dir
            .join(self.corpus_file_pattern.replace("{teacher}", internal_id))
    }
}

/// Partial configuration used to override a base config field by field.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TuConfigBuilder {
    pub data_dir: Option<PathBuf>,
    pub corpus_file_pattern: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub models: Option<[String; 3]>,
    pub teachers: Option<BTreeMap<String, String>>,
    pub blind_seed: Option<u64>,
    pub require_ranking_before_export: Option<bool>,
    pub annotate_sample_position: Option<bool>,
}

impl TuConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn blind_seed(mut self, seed: u64) -> Self {
        self.blind_seed = Some(seed);
        self
    }

    pub fn teacher(mut self, display_id: &str, internal_id: &str) -> Self {
        self.teachers
            .get_or_insert_with(BTreeMap::new)
            .insert(display_id.to_string(), internal_id.to_string());
        self
    }

    pub fn require_ranking_before_export(mut self, enabled: bool) -> Self {
        self.require_ranking_before_export = Some(enabled);
        self
    }

    pub fn annotate_sample_position(mut self, enabled: bool) -> Self {
        self.annotate_sample_position = Some(enabled);
        self
    }

    /// Applies the overrides on top of `base`.
    pub fn apply(self, base: TuConfig) -> TuConfig {
        let mut export = base.export;
        if let Some(v) = self.require_ranking_before_export {
            export.require_ranking_before_export = v;
        }
        if let Some(v) = self.annotate_sample_position {
            export.annotate_sample_position = v;
        }
        TuConfig {
            data_dir: self.data_dir.unwrap_or(base.data_dir),
            corpus_file_pattern: self
                .corpus_file_pattern
                .unwrap_or(base.corpus_file_pattern),
            output_dir: self.output_dir.unwrap_or(base.output_dir),
            models: self.models.unwrap_or(base.models),
            teachers: self.teachers.unwrap_or(base.teachers),
            blind_seed: self.blind_seed.or(base.blind_seed),
            export,
            latex: base.latex,
        }
    }

    pub fn build(self) -> TuConfig {
        self.apply(TuConfig::default())
    }

    /// Lenient JSON form: unknown or malformed input yields the defaults.
    pub fn from_json(value: &Value) -> TuConfig {
        let builder: TuConfigBuilder = serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            log::warn!("ignoring malformed config overrides: {}", e);
            TuConfigBuilder::default()
        });
        builder.build()
    }
}
