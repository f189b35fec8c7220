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

//! Core types and engine for controlled terminology synchronization.
//!
//! This crate holds everything that sits between a stream of structural
//! markup events and a document store:
//!
//! - [`model`]: terminology types, codelist/term records and checkpoints
//! - [`extract`]: the record extraction state machine
//! - [`resume`]: the checkpoint-driven resume filter
//! - [`scheduler`]: the budgeted, batch-bounded write scheduler
//! - [`store`]: the document store seam and an in-memory merge store
//!
//! Parsing bytes into [`TagEvent`]s lives in `ctsync-xml`; fetching bytes and
//! orchestrating an invocation lives in `ctsync`.
//!
//! # Example
//!
//! ```rust
//! use ctsync_core::{RecordExtractor, TagEvent};
//!
//! let mut extractor = RecordExtractor::new();
//! let events = vec![
//!     TagEvent::open("CodeList", &[("OID", "C66731")]),
//!     TagEvent::open("EnumeratedItem", &[("CodedValue", "M")]),
//!     TagEvent::close("EnumeratedItem"),
//!     TagEvent::close("CodeList"),
//! ];
//!
//! let leaves: Vec<_> = events
//!     .into_iter()
//!     .filter_map(|event| extractor.on_event(event))
//!     .collect();
//! assert_eq!(leaves.len(), 1);
//! assert_eq!(leaves[0].coded_value, "M");
//! ```

mod error;
mod event;
pub mod extract;
pub mod model;
pub mod resume;
pub mod scheduler;
pub mod store;

pub use error::{StoreError, SyncError, SyncResult};
pub use event::TagEvent;
pub use extract::{ExtractStats, RecordExtractor};
pub use model::{Checkpoint, GroupRecord, LeafRecord, SourceInfo, TerminologyType};
pub use resume::{Decision, ResumeFilter};
pub use scheduler::{BudgetLimits, Offer, ScheduleSummary, WriteScheduler};
pub use store::{Collection, DocumentStore, MemoryStore, UpsertOp};

/// Re-export of the cancellation token shared between the scheduler and byte sources.
pub use tokio_util::sync::CancellationToken;
