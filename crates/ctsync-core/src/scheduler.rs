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

//! Budgeted, batch-bounded write scheduling.
//!
//! Every admitted term becomes two merge-upserts: one for its codelist and one
//! for the term itself. Both count toward the invocation's write budget and the
//! pending batch. The pending batch is committed whenever it reaches the
//! store's atomic ceiling minus a safety margin, and once more, unconditionally,
//! when the invocation ends.
//!
//! When the budget is spent the scheduler refuses further terms and cancels the
//! shared [`CancellationToken`] so that the byte source stops reading.
//!
//! ```text
//! offer(term) ──▶ budget left? ──no──▶ cancel source, BudgetExhausted
//!                     │yes
//!                     ▼
//!          pending += [codelist op, term op]
//!                     │
//!          pending >= ceiling - margin ──yes──▶ commit
//! ```

use crate::error::SyncResult;
use crate::model::{Checkpoint, GroupRecord, LeafRecord, SourceInfo};
use crate::store::{Collection, DocumentStore, UpsertOp};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Headroom kept below the store's batch ceiling.
pub const DEFAULT_SAFETY_MARGIN: usize = 10;

/// Upserts produced per admitted term.
pub const OPS_PER_TERM: u64 = 2;

/// Bounds applied to a requested write budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetLimits {
    pub min: u64,
    pub max: u64,
    /// Budget used when the request names none.
    pub default: u64,
}

impl Default for BudgetLimits {
    fn default() -> Self {
        Self {
            min: 100,
            max: 20_000,
            default: 4_000,
        }
    }
}

impl BudgetLimits {
    /// Clamp a caller-supplied budget into `[min, max]`.
    pub fn clamp(&self, requested: Option<i64>) -> u64 {
        let requested = requested.unwrap_or(self.default as i64);
        let requested = u64::try_from(requested).unwrap_or(0);
        requested.max(self.min).min(self.max)
    }

    /// True when the bounds describe a usable range.
    pub fn is_valid(&self) -> bool {
        self.min >= OPS_PER_TERM && self.min <= self.max
    }
}

/// Result of offering a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Both upserts were queued.
    Accepted,
    /// The budget was already spent; nothing was queued and the source was cancelled.
    BudgetExhausted,
}

/// Totals reported when scheduling ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSummary {
    /// Upserts performed (codelist and term operations combined).
    pub writes: u64,
    pub leaves_written: u64,
    pub commits: u64,
    /// The most recently accepted term.
    pub last_written: Option<Checkpoint>,
    pub budget_exhausted: bool,
}

/// Owned write scheduler for one invocation.
pub struct WriteScheduler<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    source: SourceInfo,
    max_writes: u64,
    ceiling: usize,
    flush_threshold: usize,
    pending: Vec<UpsertOp>,
    total_writes: u64,
    leaves_written: u64,
    commits: u64,
    last_written: Option<Checkpoint>,
    exhausted: bool,
    cancel: CancellationToken,
}

impl<'a, S: DocumentStore + ?Sized> WriteScheduler<'a, S> {
    /// Create a scheduler writing to `store` with an already clamped budget.
    pub fn new(
        store: &'a S,
        source: SourceInfo,
        max_writes: u64,
        safety_margin: usize,
        cancel: CancellationToken,
    ) -> Self {
        let ceiling = store.max_batch_size().max(OPS_PER_TERM as usize);
        let flush_threshold = ceiling
            .checked_sub(safety_margin)
            .filter(|t| *t >= OPS_PER_TERM as usize)
            .unwrap_or(ceiling);
        Self {
            store,
            source,
            max_writes,
            ceiling,
            flush_threshold,
            pending: Vec::with_capacity(flush_threshold),
            total_writes: 0,
            leaves_written: 0,
            commits: 0,
            last_written: None,
            exhausted: false,
            cancel,
        }
    }

    #[inline]
    pub fn total_writes(&self) -> u64 {
        self.total_writes
    }

    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    #[inline]
    pub fn last_written(&self) -> Option<&Checkpoint> {
        self.last_written.as_ref()
    }

    /// Queue the upserts for one admitted term.
    pub async fn offer(&mut self, group: &GroupRecord, leaf: &LeafRecord) -> SyncResult<Offer> {
        if self.exhausted || self.total_writes >= self.max_writes {
            if !self.exhausted {
                debug!(
                    writes = self.total_writes,
                    max_writes = self.max_writes,
                    "write budget reached, cancelling source"
                );
            }
            self.exhausted = true;
            self.cancel.cancel();
            return Ok(Offer::BudgetExhausted);
        }

        if self.pending.len() + OPS_PER_TERM as usize > self.ceiling {
            self.flush().await?;
        }

        let updated_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.pending.push(self.group_op(group, leaf, &updated_at));
        self.pending.push(self.leaf_op(leaf, &updated_at));
        self.total_writes += OPS_PER_TERM;
        self.leaves_written += 1;
        self.last_written = Some(leaf.checkpoint());

        if self.pending.len() >= self.flush_threshold {
            self.flush().await?;
        }
        Ok(Offer::Accepted)
    }

    /// Commit everything pending. A no-op when nothing is pending.
    pub async fn flush(&mut self) -> SyncResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending);
        let size = batch.len();
        self.store.commit(batch).await?;
        self.commits += 1;
        debug!(
            batch = size,
            commits = self.commits,
            writes = self.total_writes,
            "committed batch"
        );
        Ok(())
    }

    /// Final flush, then the totals. Runs on every exit path that reaches it,
    /// including budget-triggered cancellation.
    pub async fn finish(mut self) -> SyncResult<ScheduleSummary> {
        self.flush().await?;
        Ok(ScheduleSummary {
            writes: self.total_writes,
            leaves_written: self.leaves_written,
            commits: self.commits,
            last_written: self.last_written,
            budget_exhausted: self.exhausted,
        })
    }

    fn provenance(&self, fields: &mut Map<String, Value>, updated_at: &str) {
        fields.insert(
            "terminologyType".into(),
            Value::from(self.source.terminology_type.as_str()),
        );
        fields.insert("sourceUrl".into(), Value::from(self.source.source_url.as_str()));
        fields.insert(
            "version".into(),
            self.source
                .version
                .as_deref()
                .map_or(Value::Null, Value::from),
        );
        fields.insert("updatedAt".into(), Value::from(updated_at));
    }

    fn group_op(&self, group: &GroupRecord, leaf: &LeafRecord, updated_at: &str) -> UpsertOp {
        let mut fields = Map::new();
        fields.insert("groupKey".into(), Value::from(leaf.group_key.as_str()));
        insert_opt(&mut fields, "displayName", group.display_name.as_deref());
        insert_opt(&mut fields, "dataType", group.data_type.as_deref());
        insert_opt(&mut fields, "oid", group.oid.as_deref());
        self.provenance(&mut fields, updated_at);
        UpsertOp {
            collection: Collection::Codelists,
            key: group_doc_key(&self.source, &leaf.group_key),
            fields,
        }
    }

    fn leaf_op(&self, leaf: &LeafRecord, updated_at: &str) -> UpsertOp {
        let mut fields = Map::new();
        fields.insert("groupKey".into(), Value::from(leaf.group_key.as_str()));
        fields.insert("codedValue".into(), Value::from(leaf.coded_value.as_str()));
        insert_opt(&mut fields, "decodeText", leaf.decode_text.as_deref());
        insert_opt(
            &mut fields,
            "preferredTermText",
            leaf.preferred_term_text.as_deref(),
        );
        insert_opt(&mut fields, "definitionText", leaf.definition_text.as_deref());
        insert_opt(
            &mut fields,
            "externalConceptCode",
            leaf.external_concept_code.as_deref(),
        );
        if !leaf.synonyms.is_empty() {
            fields.insert("synonyms".into(), Value::from(leaf.synonyms.clone()));
        }
        self.provenance(&mut fields, updated_at);
        UpsertOp {
            collection: Collection::Terms,
            key: leaf_doc_key(&self.source, &leaf.group_key, &leaf.coded_value),
            fields,
        }
    }
}

fn insert_opt(fields: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        fields.insert(key.to_string(), Value::from(v));
    }
}

/// Store key of a codelist document: `<type>__<groupKey>`.
pub fn group_doc_key(source: &SourceInfo, group_key: &str) -> String {
    format!("{}__{}", source.terminology_type, group_key)
}

/// Store key of a term document: `<type>__<groupKey>__<codedValue>`.
pub fn leaf_doc_key(source: &SourceInfo, group_key: &str, coded_value: &str) -> String {
    format!(
        "{}__{}__{}",
        source.terminology_type, group_key, coded_value
    )
}
