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

use crate::errors::{Result, TuError};

/// Current position within a corpus. Moves stop at the edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TuNavigator {
    page: usize,
    total: usize,
}

impl TuNavigator {
    pub fn new(total: usize) -> Self {
        Self { page: 0, total }
    }

    /// 0-based index of the current sample.
    pub fn current(&self) -> usize {
        self.page
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Returns whether the position changed.
    pub fn next(&mut self) -> bool {
        if self.page + 1 < self.total {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.page > 0 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Jumps to a 1-based sample number in `[1, total]`.
    pub fn jump(&mut self, number: usize) -> Result<()> {
        if number == 0 || number > self.total {
            return Err(TuError::Navigation {
                requested: number,
                total: self.total,
            });
        }
        self.page = number - 1;
        Ok(())
    }

    /// `第 i / n 条` style position, 1-based.
    pub fn label(&self) -> String {
        format!("{} / {}", self.page + 1, self.total)
    }
}
