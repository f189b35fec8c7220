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

//! Invocation driver.
//!
//! One invocation runs the pipeline end to end on a single task:
//!
//! ```text
//! source -> version sniff -> tag parser -> record extractor -> resume filter -> write scheduler
//! ```
//!
//! Events are processed strictly in document order. The only suspension points
//! are source reads and batch commits.

use crate::api::SyncRequest;
use crate::config::SyncConfig;
use crate::source::{chunk_reader, ByteSource, CancellableSource, DefaultOpener, SourceOpener};
use ctsync_core::{
    CancellationToken, Checkpoint, Decision, DocumentStore, Offer, RecordExtractor, ResumeFilter,
    SourceInfo, SyncResult, TerminologyType, WriteScheduler,
};
use ctsync_xml::{sniff_version, ParserConfig, TagParser};
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};

/// How the event stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The document was read to the end.
    Exhausted,
    /// Reading stopped because the invocation's token was cancelled.
    Cancelled,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub terminology_type: TerminologyType,
    pub source_url: String,
    /// Clamped write budget.
    pub max_writes: u64,
    pub checkpoint: Option<Checkpoint>,
}

/// Outcome of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub source: SourceInfo,
    pub max_writes: u64,
    /// Upserts performed, codelist and term operations combined.
    pub writes: u64,
    pub leaves_written: u64,
    pub commits: u64,
    pub groups_seen: u64,
    pub malformed_dropped: u64,
    /// Terms suppressed by the resume filter.
    pub skipped: u64,
    /// Last written term, or the incoming checkpoint when nothing was written.
    pub resume_token: Option<Checkpoint>,
    /// `writes < max_writes`. A weak completion signal: a document whose
    /// remaining content exactly fills the budget reports `false`.
    pub done: bool,
    /// True when the document was read to its end.
    pub end_of_document: bool,
    pub stream_end: StreamEnd,
}

/// Runs synchronization invocations against one document store.
pub struct Synchronizer {
    config: SyncConfig,
    store: Arc<dyn DocumentStore>,
    opener: Arc<dyn SourceOpener>,
}

impl Synchronizer {
    pub fn new(
        config: SyncConfig,
        store: Arc<dyn DocumentStore>,
        opener: Arc<dyn SourceOpener>,
    ) -> Self {
        Self {
            config,
            store,
            opener,
        }
    }

    /// Synchronizer that reads over HTTP or from local files.
    pub fn with_default_opener(
        config: SyncConfig,
        store: Arc<dyn DocumentStore>,
    ) -> SyncResult<Self> {
        let opener = DefaultOpener::new(&config.http)?;
        Ok(Self::new(config, store, Arc::new(opener)))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Check a request without touching the network or the store.
    pub fn validate(&self, request: &SyncRequest) -> SyncResult<Invocation> {
        let terminology_type: TerminologyType = request.terminology_type.trim().parse()?;

        // Without a codelist key the sync starts from the beginning. A key
        // without a coded value is passed through and never matches.
        let checkpoint = request
            .resume_token
            .as_ref()
            .filter(|token| token.is_set())
            .cloned();

        let source_url = match &request.source_url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => self.config.source_url(terminology_type),
        };

        Ok(Invocation {
            terminology_type,
            source_url,
            max_writes: self.config.budget.clamp(request.max_writes),
            checkpoint,
        })
    }

    /// Run one invocation.
    pub async fn run(&self, request: &SyncRequest) -> SyncResult<SyncReport> {
        self.run_with_token(request, CancellationToken::new()).await
    }

    /// Run one invocation with a caller-owned cancellation token.
    ///
    /// Cancelling the token from outside ends the invocation like an
    /// exhausted budget: pending writes are flushed and a resume token is
    /// returned. Budget exhaustion cancels a child of `cancel`, never
    /// `cancel` itself, so one token can be shared across invocations.
    pub async fn run_with_token(
        &self,
        request: &SyncRequest,
        cancel: CancellationToken,
    ) -> SyncResult<SyncReport> {
        let invocation = self.validate(request)?;
        let span = info_span!(
            "sync",
            terminology_type = %invocation.terminology_type,
            max_writes = invocation.max_writes
        );
        self.execute(invocation, cancel).instrument(span).await
    }

    async fn execute(
        &self,
        invocation: Invocation,
        cancel: CancellationToken,
    ) -> SyncResult<SyncReport> {
        let cancel = cancel.child_token();
        info!(
            source_url = %invocation.source_url,
            resume = ?invocation.checkpoint,
            "starting synchronization"
        );

        let raw = self.opener.open(&invocation.source_url).await?;
        let mut source = CancellableSource::new(raw, cancel.clone());
        let head = source.next_chunk().await?;
        let version = head.as_deref().and_then(sniff_version);
        debug!(version = ?version, "sniffed source version");

        let source_info = SourceInfo {
            terminology_type: invocation.terminology_type,
            source_url: invocation.source_url.clone(),
            version,
        };

        let reader = chunk_reader(head, Box::new(source));
        let parser_config = ParserConfig::from(&self.config.parser);
        let mut parser = TagParser::with_config(reader, parser_config);
        let mut extractor = RecordExtractor::new();
        let mut filter = ResumeFilter::new(invocation.checkpoint.as_ref());
        let mut scheduler = WriteScheduler::new(
            &*self.store,
            source_info.clone(),
            invocation.max_writes,
            self.config.safety_margin,
            cancel.clone(),
        );

        let stream_end = loop {
            let event = match parser.next_event().await {
                Ok(Some(event)) => event,
                Ok(None) if cancel.is_cancelled() => break StreamEnd::Cancelled,
                Ok(None) => break StreamEnd::Exhausted,
                // A cancelled source ends mid-document; the resulting truncation is ours.
                Err(err) if cancel.is_cancelled() => {
                    debug!(error = %err, "stream ended after cancellation");
                    break StreamEnd::Cancelled;
                }
                Err(err) => return Err(err.into()),
            };

            let Some(leaf) = extractor.on_event(event) else {
                continue;
            };
            if filter.decide(&leaf.group_key, &leaf.coded_value) == Decision::Skip {
                continue;
            }
            if scheduler.offer(extractor.group(), &leaf).await? == Offer::BudgetExhausted {
                break StreamEnd::Cancelled;
            }
        };

        let summary = scheduler.finish().await?;
        let stats = extractor.stats();

        if invocation.checkpoint.is_some() && !filter.has_passed_checkpoint() {
            info!("resume checkpoint was not found in the document, nothing written");
        }

        let report = SyncReport {
            source: source_info,
            max_writes: invocation.max_writes,
            writes: summary.writes,
            leaves_written: summary.leaves_written,
            commits: summary.commits,
            groups_seen: stats.groups_seen,
            malformed_dropped: stats.malformed_dropped,
            skipped: filter.skipped(),
            resume_token: summary.last_written.or(invocation.checkpoint),
            done: summary.writes < invocation.max_writes,
            end_of_document: stream_end == StreamEnd::Exhausted,
            stream_end,
        };

        info!(
            writes = report.writes,
            leaves = report.leaves_written,
            commits = report.commits,
            skipped = report.skipped,
            malformed = report.malformed_dropped,
            done = report.done,
            end_of_document = report.end_of_document,
            "synchronization finished"
        );
        Ok(report)
    }
}
