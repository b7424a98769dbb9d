//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Tutoria.
//! The Tutoria project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! you may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::errors::{Result, TuError};

#[derive(Clone, Debug)]
pub struct TuReaderConfig {
    /// Skip malformed JSONL lines instead of failing.
    pub skip_errors: bool,
    pub max_errors: usize,
}

impl Default for TuReaderConfig {
    fn default() -> Self {
        Self {
            skip_errors: true,
            max_errors: 100,
        }
    }
}

/// Reader for the JSON and JSONL files exchanged by the preparation steps.
#[derive(Clone, Debug, Default)]
pub struct TuStreamReader {
    config: TuReaderConfig,
}

impl TuStreamReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: TuReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Reads one JSON value per non-empty line.
    pub fn read_jsonl(&self, path: &Path) -> Result<Vec<Value>> {
        let file = File::open(path)?;
        self.read_jsonl_from(BufReader::new(file), path)
    }

    pub fn read_jsonl_from<R: BufRead>(&self, reader: R, origin: &Path) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        let mut error_count = 0;

        for (idx, line) in reader.lines().enumerate() {
            let text = line?;
            if text.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&text) {
                Ok(value) => values.push(value),
                Err(e) => {
                    error_count += 1;
                    if !self.config.skip_errors || error_count > self.config.max_errors {
                        return Err(TuError::validation(format!(
                            "too many errors ({}) in {}: last at line {}: {}",
                            error_count,
                            origin.display(),
                            idx + 1,
                            e
                        )));
                    }
                    log::warn!("skipping invalid JSON line {} of {}: {}", idx + 1, origin.display(), e);
                }
            }
        }

        Ok(values)
    }

    /// Reads a file holding a JSON array.
    pub fn read_json_array(&self, path: &Path) -> Result<Vec<Value>> {
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Array(items) => Ok(items),
            _ => Err(TuError::schema(format!(
                "{} must contain a JSON array",
                path.display()
            ))),
        }
    }
}

/// Writes `items` as a pretty JSON array, keeping non-ASCII text as-is.
pub fn write_json_array<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, items)?;
    writer.flush()?;
    Ok(())
}

/// Writes one compact JSON document per line.
pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// `dir/name.json` -> `dir/name_fixed.json`.
pub fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}{}.{}", stem, suffix, ext))
}
