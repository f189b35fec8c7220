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

//! Incremental markup parsing for CDISC ODM terminology files
//!
//! Turns a byte stream into the flat [`TagEvent`](ctsync_core::TagEvent)
//! sequence consumed by the record extractor, without holding the document in
//! memory.
//!
//! # Features
//!
//! - Async, pull-based parsing over any `tokio::io::AsyncBufRead`
//! - Synchronous helper for in-memory documents
//! - Best-effort version sniffing from the document header
//! - Nesting depth guard against pathological input
//!
//! # Examples
//!
//! ```rust
//! use ctsync_core::TagEvent;
//! use ctsync_xml::parse_events;
//!
//! let xml = br#"<CodeList OID="CL.1"><EnumeratedItem CodedValue="Y"/></CodeList>"#;
//! let events = parse_events(xml).unwrap();
//! assert_eq!(events[0], TagEvent::open("CodeList", &[("OID", "CL.1")]));
//! assert_eq!(events.len(), 4);
//! ```
//!
//! ```rust
//! use ctsync_xml::sniff_version;
//!
//! let head = br#"<ODM FileOID="CDISC_CT_SDTM_2025-09-26_odm" ODMVersion="1.3.2">"#;
//! assert_eq!(sniff_version(head).as_deref(), Some("2025-09-26"));
//! ```

mod error;
pub mod parser;
pub mod sniff;

pub use error::XmlError;
pub use parser::{parse_events, parse_events_with_config, ParserConfig, TagParser};
pub use sniff::sniff_version;
