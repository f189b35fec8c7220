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

//! Resumable, write-budgeted synchronization of CDISC controlled terminology.
//!
//! Streams a terminology ODM file, extracts every codelist term, and upserts
//! codelist and term documents into a [`DocumentStore`] in bounded atomic
//! batches. Each invocation performs at most `maxWrites` upserts and returns a
//! resume token; calling again with that token continues after the last
//! written term.
//!
//! # Features
//!
//! - HTTP (reqwest) and local file sources, read as a forward-only chunk stream
//! - Incremental parsing: memory use does not grow with document size
//! - Cooperative cancellation once the write budget is spent
//! - Version sniffing from the document header
//! - JSON request/response types for hosting behind an HTTP endpoint
//!
//! # Example
//!
//! ```rust,no_run
//! use ctsync::{SyncConfig, SyncRequest, Synchronizer};
//! use ctsync_core::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn demo() -> ctsync_core::SyncResult<()> {
//! let store = Arc::new(MemoryStore::new());
//! let sync = Synchronizer::with_default_opener(SyncConfig::default(), store)?;
//!
//! let mut request = SyncRequest::new("sdtm").with_max_writes(4000);
//! loop {
//!     let report = sync.run(&request).await?;
//!     if report.done {
//!         break;
//!     }
//!     if let Some(token) = report.resume_token {
//!         request = request.with_resume_token(token);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`DocumentStore`]: ctsync_core::DocumentStore

pub mod api;
pub mod config;
pub mod driver;
pub mod source;

pub use api::{handle_request, ErrorResponse, SyncRequest, SyncResponse};
pub use config::{HttpConfig, ParserSettings, SyncConfig};
pub use driver::{Invocation, StreamEnd, SyncReport, Synchronizer};
pub use source::{
    chunk_reader, ByteSource, CancellableSource, DefaultOpener, FileSource, HttpSource,
    MemorySource, SourceOpener,
};
