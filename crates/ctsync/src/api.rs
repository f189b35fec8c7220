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

//! Wire types for embedding the synchronizer behind an HTTP endpoint.
//!
//! Request:
//!
//! ```json
//! {
//!   "terminologyType": "sdtm",
//!   "maxWrites": 4000,
//!   "resumeToken": { "lastGroupKey": "C66731", "lastLeafKey": "M" }
//! }
//! ```
//!
//! Success and failure responses carry `ok` plus either the invocation result
//! or an `error` message with its status code.

use crate::driver::{SyncReport, Synchronizer};
use ctsync_core::{Checkpoint, SyncError, TerminologyType};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Invocation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub terminology_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_writes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_token: Option<Checkpoint>,
    /// Source location override. Not accepted over the wire.
    #[serde(skip)]
    pub source_url: Option<String>,
}

impl SyncRequest {
    pub fn new(terminology_type: impl Into<String>) -> Self {
        Self {
            terminology_type: terminology_type.into(),
            ..Self::default()
        }
    }

    pub fn with_max_writes(mut self, max_writes: i64) -> Self {
        self.max_writes = Some(max_writes);
        self
    }

    pub fn with_resume_token(mut self, token: Checkpoint) -> Self {
        self.resume_token = Some(token);
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Parse a JSON request body.
    pub fn from_json(body: &str) -> Result<Self, SyncError> {
        serde_json::from_str(body).map_err(|e| SyncError::InvalidRequest(e.to_string()))
    }
}

/// Successful invocation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub ok: bool,
    pub terminology_type: TerminologyType,
    pub source_url: String,
    pub version: Option<String>,
    pub writes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_token: Option<Checkpoint>,
    pub done: bool,
    pub end_of_document: bool,
    pub max_writes: u64,
    pub leaves_written: u64,
    pub commits: u64,
    pub skipped: u64,
    pub malformed_dropped: u64,
}

impl From<&SyncReport> for SyncResponse {
    fn from(report: &SyncReport) -> Self {
        Self {
            ok: true,
            terminology_type: report.source.terminology_type,
            source_url: report.source.source_url.clone(),
            version: report.source.version.clone(),
            writes: report.writes,
            resume_token: report.resume_token.clone(),
            done: report.done,
            end_of_document: report.end_of_document,
            max_writes: report.max_writes,
            leaves_written: report.leaves_written,
            commits: report.commits,
            skipped: report.skipped,
            malformed_dropped: report.malformed_dropped,
        }
    }
}

/// Failed invocation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub status: u16,
}

impl From<&SyncError> for ErrorResponse {
    fn from(err: &SyncError) -> Self {
        Self {
            ok: false,
            error: err.to_string(),
            status: err.status_code(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        format!(r#"{{"ok":false,"error":"response serialization failed: {}","status":500}}"#, e)
    })
}

/// Handle a JSON request body, returning a status code and a JSON body.
pub async fn handle_request(sync: &Synchronizer, body: &str) -> (u16, String) {
    let result = match SyncRequest::from_json(body) {
        Ok(request) => sync.run(&request).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(report) => (200, to_json(&SyncResponse::from(&report))),
        Err(err) => {
            warn!(error = %err, status = err.status_code(), "synchronization failed");
            let response = ErrorResponse::from(&err);
            (response.status, to_json(&response))
        }
    }
}
