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

#![allow(non_snake_case)]

use std::io::Write;
use std::path::PathBuf;

use serde_json::json;
use tempfile::{Builder, NamedTempFile};
use tutoria::{TuConfig, TuConfigBuilder, TuError, TuModelId};

fn config_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().expect("tmp");
    file.write_all(content.as_bytes()).expect("write");
    file
}

#[test]
fn TuFTConfigDefaultsMatchDeployment() {
    let config = TuConfig::default();
    assert_eq!(config.corpus_file_pattern, "data_{teacher}.json");
    assert!(config.teachers.is_empty());
    assert!(!config.export.require_ranking_before_export);
    assert!(config.export.bom);
    assert_eq!(config.export.delimiter, ',');
    let roster = config.roster().expect("roster");
    assert_eq!(roster.name(TuModelId::A), "DeepSeek-V3");
    assert_eq!(roster.name(TuModelId::C), "Spark_X1");
}

#[test]
fn TuFTConfigFromYamlKeepsDefaultsForMissingFields() {
    let file = config_file(
        ".yaml",
        "data_dir: /srv/corpora\n\
         models: [m-a, m-b, m-c]\n\
         teachers:\n  t001: T001\n  Alice: T002\n\
         blind_seed: 42\n\
         export:\n  require_ranking_before_export: true\n",
    );

    let config = TuConfig::from_path(file.path()).expect("load yaml");
    assert_eq!(config.data_dir, PathBuf::from("/srv/corpora"));
    assert_eq!(config.output_dir, PathBuf::from("."));
    assert_eq!(config.blind_seed, Some(42));
    assert_eq!(config.teachers.get("Alice").map(String::as_str), Some("T002"));
    assert!(config.export.require_ranking_before_export);
    assert!(config.export.atomic_write);
    assert_eq!(config.roster().expect("roster").name(TuModelId::B), "m-b");
    assert_eq!(config.corpus_path("T001"), PathBuf::from("/srv/corpora/data_T001.json"));
}

#[test]
fn TuFTConfigFromJsonReadsLatexSection() {
    let file = config_file(
        ".json",
        r#"{"output_dir": "out", "latex": {"model": "fixer", "timeout_secs": 5}}"#,
    );

    let config = TuConfig::from_path(file.path()).expect("load json");
    assert_eq!(config.output_dir, PathBuf::from("out"));
    assert_eq!(config.latex.model, "fixer");
    assert_eq!(config.latex.timeout_secs, 5);
    assert!(config.latex.only_when_needed);
}

#[test]
fn TuFTConfigRejectsUnknownExtension() {
    let file = config_file(".toml", "data_dir = 'x'");
    let err = TuConfig::from_path(file.path()).unwrap_err();
    assert!(matches!(err, TuError::Validation { .. }), "{err:?}");
}

#[test]
fn TuFTConfigRejectsPatternWithoutTeacherPlaceholder() {
    let file = config_file(".yaml", "corpus_file_pattern: corpus.json\n");
    let err = TuConfig::from_path(file.path()).unwrap_err();
    assert!(err.to_string().contains("{teacher}"), "{err}");
}

#[test]
fn TuFTConfigRejectsDuplicateModelNames() {
    let file = config_file(".yaml", "models: [same, same, other]\n");
    assert!(TuConfig::from_path(file.path()).is_err());
}

#[test]
fn TuFTConfigBuilderOverridesOnlyWhatIsSet() {
    let base = TuConfig {
        blind_seed: Some(1),
        ..TuConfig::default()
    };
    let config = TuConfigBuilder::new()
        .data_dir("/data")
        .teacher("t001", "T001")
        .annotate_sample_position(true)
        .apply(base);

    assert_eq!(config.data_dir, PathBuf::from("/data"));
    assert_eq!(config.blind_seed, Some(1));
    assert_eq!(config.teachers.len(), 1);
    assert!(config.export.annotate_sample_position);
    assert!(!config.export.require_ranking_before_export);
}

#[test]
fn TuFTConfigBuilderFromJsonIsLenient() {
    let config = TuConfigBuilder::from_json(&json!({"blind_seed": 9, "output_dir": "exports"}));
    assert_eq!(config.blind_seed, Some(9));
    assert_eq!(config.output_dir, PathBuf::from("exports"));

    let fallback = TuConfigBuilder::from_json(&json!({"blind_seed": "not a number"}));
    assert_eq!(fallback, TuConfig::default());
}
