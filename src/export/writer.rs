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

//! # Score Table Writer
//!
//! Serializes reconciled rows as a delimited table that opens cleanly in
//! spreadsheet software (UTF-8 with byte-order mark by default).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::config::TuExportPolicy;
use crate::errors::{Result, TuError};
use crate::export::reconcile::{export_headers, TuExportRow};
use crate::model::TuModelRoster;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Statistics about one export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TuWriteStats {
    pub rows_written: usize,
    pub bytes_written: usize,
}

/// `评分结果_<teacher>_<YYYYmmdd_HHMMSS>.csv`
pub fn export_file_name<Tz: TimeZone>(teacher_id: &str, at: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("评分结果_{}_{}.csv", teacher_id, at.format("%Y%m%d_%H%M%S"))
}

#[derive(Debug)]
pub struct TuCsvWriter {
    policy: TuExportPolicy,
    delimiter: u8,
}

impl TuCsvWriter {
    pub fn new(policy: TuExportPolicy) -> Result<Self> {
        if !policy.delimiter.is_ascii() {
            return Err(TuError::validation(format!(
                "export delimiter '{}' must be a single ASCII character",
                policy.delimiter
            )));
        }
        let delimiter = policy.delimiter as u8;
        Ok(Self { policy, delimiter })
    }

    /// Writes the header and all rows to `path`.
    pub fn write(&self, rows: &[TuExportRow], roster: &TuModelRoster, path: &Path) -> Result<TuWriteStats> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        if self.policy.atomic_write {
            let temp_path = self.temp_path(path);
            if let Err(e) = self.write_to_path(rows, roster, &temp_path) {
                let _ = std::fs::remove_file(&temp_path);
                return Err(e);
            }
            std::fs::rename(&temp_path, path)?;
        } else {
            self.write_to_path(rows, roster, path)?;
        }

        let bytes_written = std::fs::metadata(path)
            .map(|m| m.len() as usize)
            .unwrap_or(0);
        Ok(TuWriteStats {
            rows_written: rows.len(),
            bytes_written,
        })
    }

    /// Renders the table in memory, e.g. for a download response.
    pub fn to_bytes(&self, rows: &[TuExportRow], roster: &TuModelRoster) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_table(rows, roster, &mut buffer)?;
        Ok(buffer)
    }

    fn write_to_path(&self, rows: &[TuExportRow], roster: &TuModelRoster, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_table(rows, roster, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn write_table<W: Write>(&self, rows: &[TuExportRow], roster: &TuModelRoster, mut out: W) -> Result<()> {
        if self.policy.bom {
            out.write_all(UTF8_BOM)?;
        }
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(out);

        csv_writer.write_record(export_headers(roster, &self.policy))?;
        for row in rows {
            csv_writer.write_record(row.to_record(&self.policy))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Generates temporary path for atomic writes.
    fn temp_path(&self, path: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("export");
        let parent = path.parent().unwrap_or(Path::new("."));
        parent.join(format!(".{}.tmp", stem))
    }
}
