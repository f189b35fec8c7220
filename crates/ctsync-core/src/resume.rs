// Dweve CT Sync - Controlled Terminology Synchronization
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Checkpoint-driven resume filter.
//!
//! A checkpoint is a position in emission order, not a content filter: every
//! term up to and including the checkpointed one is skipped exactly once, and
//! the first term after it is the first admitted. If the checkpointed term is
//! never seen (the publisher reordered or removed it) nothing is admitted for
//! the rest of the invocation. That outcome is reported, not repaired.

use crate::model::Checkpoint;

/// Verdict for one candidate term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit,
    Skip,
}

#[derive(Debug, Clone)]
pub struct ResumeFilter {
    target: Option<(String, Option<String>)>,
    started: bool,
    passed_checkpoint: bool,
    skipped: u64,
}

impl ResumeFilter {
    /// Build a filter; `None` or a checkpoint without a codelist key admits everything.
    pub fn new(checkpoint: Option<&Checkpoint>) -> Self {
        let target = checkpoint.and_then(|cp| {
            cp.last_group_key
                .clone()
                .map(|group| (group, cp.last_leaf_key.clone()))
        });
        Self {
            started: target.is_none(),
            target,
            passed_checkpoint: false,
            skipped: 0,
        }
    }

    /// Decide whether the term `(group_key, coded_value)` should be written.
    pub fn decide(&mut self, group_key: &str, coded_value: &str) -> Decision {
        if self.started {
            return Decision::Admit;
        }
        let is_checkpoint = self.target.as_ref().map_or(false, |(group, leaf)| {
            group == group_key && leaf.as_deref() == Some(coded_value)
        });
        if is_checkpoint {
            self.passed_checkpoint = true;
            self.skipped += 1;
            return Decision::Skip;
        }
        if self.passed_checkpoint {
            self.started = true;
            return Decision::Admit;
        }
        self.skipped += 1;
        Decision::Skip
    }

    /// True once terms are being admitted.
    #[inline]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// True once the checkpointed term has been seen.
    #[inline]
    pub fn has_passed_checkpoint(&self) -> bool {
        self.passed_checkpoint
    }

    /// Terms suppressed so far.
    #[inline]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
