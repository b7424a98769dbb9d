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

use serde::{Deserialize, Serialize};

use crate::config::TuConfig;
use crate::errors::{Result, TuError};
use crate::ingest::corpus::TuCorpus;
use crate::model::TuModelRoster;
use crate::session::blind::teacher_seed;
use crate::session::TuSession;

/// Teacher identity: what they typed and what the data files are named by.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuTeacherId {
    pub display: String,
    pub internal: String,
}

/// Holds every signed-in teacher's session; at most one is active.
#[derive(Debug)]
pub struct TuWorkbench {
    config: TuConfig,
    roster: TuModelRoster,
    sessions: BTreeMap<String, TuSession>,
    active: Option<String>,
}

impl TuWorkbench {
    pub fn new(config: TuConfig) -> Result<Self> {
        let roster = config.roster()?;
        Ok(Self {
            config,
            roster,
            sessions: BTreeMap::new(),
            active: None,
        })
    }

    pub fn config(&self) -> &TuConfig {
        &self.config
    }

    /// Maps a typed id to the teacher identity. Input is trimmed and upper-cased.
    pub fn resolve_teacher(&self, input: &str) -> Result<TuTeacherId> {
        let display = input.trim().to_uppercase();
        if display.is_empty() {
            return Err(TuError::validation("teacher id is empty"));
        }
        if self.config.teachers.is_empty() {
            return Ok(TuTeacherId {
                internal: display.clone(),
                display,
            });
        }
        self.config
            .teachers
            .iter()
            .find(|(key, _)| key.trim().to_uppercase() == display)
            .map(|(_, internal)| TuTeacherId {
                display: display.clone(),
                internal: internal.clone(),
            })
            .ok_or_else(|| {
                log::warn!("sign-in rejected: unknown teacher id '{}'", display);
                TuError::UnknownTeacher {
                    display_id: display.clone(),
                }
            })
    }

    /// Signs a teacher in, resuming their session if one exists.
    ///
    /// Fails without touching any state when the id is unknown or the
    /// teacher's corpus file is missing.
    pub fn sign_in(&mut self, input: &str) -> Result<&mut TuSession> {
        let teacher = self.resolve_teacher(input)?;
        let internal = teacher.internal.clone();

        if !self.sessions.contains_key(&internal) {
            let path = self.config.corpus_path(&internal);
            if !path.is_file() {
                log::error!(
                    "no corpus for teacher {} at {}",
                    teacher.display,
                    path.display()
                );
                return Err(TuError::CorpusNotFound {
                    teacher_id: internal,
                    path: path.display().to_string(),
                });
            }
            let corpus = TuCorpus::load(&path, self.roster.clone())?;
            let seed = self
                .config
                .blind_seed
                .map(|seed| teacher_seed(seed, &internal));
            let session = TuSession::new(
                teacher,
                corpus,
                seed,
                self.config.export.clone(),
            );
            log::info!("teacher {} signed in with {} samples", internal, session.corpus().len());
            self.sessions.insert(internal.clone(), session);
        } else {
            log::info!("teacher {} resumed", internal);
        }

        self.active = Some(internal.clone());
        self.sessions
            .get_mut(&internal)
            .ok_or_else(|| TuError::internal("session vanished after sign-in"))
    }

    /// Deactivates the current teacher. Their session stays resumable.
    pub fn sign_out(&mut self) {
        if let Some(internal) = self.active.take() {
            log::info!("teacher {} signed out", internal);
        }
    }

    pub fn active(&self) -> Option<&TuSession> {
        self.active.as_ref().and_then(|id| self.sessions.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut TuSession> {
        match &self.active {
            Some(id) => self.sessions.get_mut(id),
            None => None,
        }
    }

    pub fn session(&self, internal_id: &str) -> Option<&TuSession> {
        self.sessions.get(internal_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}
