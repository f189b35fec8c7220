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

//! Error types for terminology synchronization.
//!
//! Errors fall into four groups that the invocation driver treats differently:
//!
//! - **Validation** (`InvalidRequest`, `UnknownTerminologyType`): rejected before any I/O
//! - **Source** (`Fetch`, `Transport`): the remote file could not be read
//! - **Parse** (`Parse`): malformed markup mid-stream; committed batches stay committed
//! - **Internal** (`Store`, `Io`, `Config`): store commits and local resources
//!
//! Budget-triggered early termination is not an error and has no variant here.

use thiserror::Error;

/// Errors raised by a document store commit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The batch exceeds the store's atomic commit ceiling.
    #[error("batch of {size} operations exceeds the atomic commit limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    /// The backend rejected the commit.
    #[error("commit rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during a synchronization invocation.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Malformed or inconsistent request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Terminology type outside the supported set.
    #[error("Unknown terminology type: {0}")]
    UnknownTerminologyType(String),

    /// The source answered with a non-success status.
    #[error("Failed to fetch {url}: HTTP {status}")]
    Fetch { url: String, status: u16 },

    /// The source could not be reached or the connection dropped mid-stream.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed markup in the terminology document.
    #[error("Parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    /// A batch commit failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Local I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for synchronization operations.
pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// Create a parse error at a byte offset.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// HTTP-style status code reported to callers.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) | Self::UnknownTerminologyType(_) => 400,
            Self::Fetch { .. } | Self::Transport(_) => 502,
            Self::Parse { .. } | Self::Store(_) | Self::Io(_) | Self::Config(_) => 500,
        }
    }

    /// True for errors raised before any network or store I/O.
    #[inline]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::UnknownTerminologyType(_)
        )
    }
}
