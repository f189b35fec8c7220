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

//! Error types for markup parsing

use ctsync_core::SyncError;
use std::fmt;

/// Errors that can occur while parsing a terminology document.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlError {
    /// Malformed markup.
    ///
    /// # Example
    ///
    /// ```text
    /// XML parse error at position 42: expecting </Decode> found </EnumeratedItem>
    /// ```
    ParseError {
        /// Byte offset in the document where the error occurred
        pos: usize,
        /// Description of the parsing error
        message: String,
    },

    /// The document ended while elements were still open.
    ///
    /// # Example
    ///
    /// ```text
    /// Unexpected end of document at position 1024: 3 element(s) still open
    /// ```
    UnexpectedEof {
        /// Byte offset of the end of input
        pos: usize,
        /// Number of unclosed elements
        open: usize,
    },

    /// Nesting depth limit exceeded.
    ///
    /// ODM terminology files nest about six levels deep; anything far beyond
    /// the configured [`ParserConfig::max_depth`](crate::ParserConfig::max_depth)
    /// is rejected.
    RecursionLimitExceeded {
        /// Maximum allowed depth
        max: usize,
        /// Depth encountered
        current: usize,
    },

    /// Reading the underlying byte stream failed.
    IoError {
        /// Description of the read failure
        message: String,
    },
}

impl fmt::Display for XmlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlError::ParseError { pos, message } => {
                write!(f, "XML parse error at position {}: {}", pos, message)
            }
            XmlError::UnexpectedEof { pos, open } => {
                write!(
                    f,
                    "Unexpected end of document at position {}: {} element(s) still open",
                    pos, open
                )
            }
            XmlError::RecursionLimitExceeded { max, current } => {
                write!(
                    f,
                    "XML nesting depth exceeded (max: {}, found: {})",
                    max, current
                )
            }
            XmlError::IoError { message } => write!(f, "Read error: {}", message),
        }
    }
}

impl std::error::Error for XmlError {}

impl XmlError {
    pub(crate) fn from_quick_xml(pos: usize, err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => XmlError::IoError {
                message: io.to_string(),
            },
            other => XmlError::ParseError {
                pos,
                message: other.to_string(),
            },
        }
    }

    /// Byte offset associated with the error, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            XmlError::ParseError { pos, .. } | XmlError::UnexpectedEof { pos, .. } => Some(*pos),
            _ => None,
        }
    }
}

impl From<XmlError> for SyncError {
    fn from(err: XmlError) -> Self {
        match err {
            XmlError::IoError { message } => SyncError::Transport(message),
            other => SyncError::parse(other.position().unwrap_or(0), other.to_string()),
        }
    }
}
