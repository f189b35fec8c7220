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

//! Structural events produced by the incremental tag parser.
//!
//! A document is seen as a flat, strictly ordered sequence of element opens,
//! text runs and element closes. Names are local names: any namespace prefix
//! (`nciodm:`, `xml:`) has already been stripped by the parser.
//!
//! For this fragment:
//!
//! ```text
//! <CodeList OID="CL.C66731"><EnumeratedItem CodedValue="F"/></CodeList>
//! ```
//!
//! the parser yields:
//!
//! ```text
//! Open { name: "CodeList", attributes: [("OID", "CL.C66731")] }
//! Open { name: "EnumeratedItem", attributes: [("CodedValue", "F")] }
//! Close { name: "EnumeratedItem" }
//! Close { name: "CodeList" }
//! ```

/// One structural event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEvent {
    /// An element was opened. Self-closing elements produce an `Open`
    /// immediately followed by a `Close`.
    Open {
        /// Local element name.
        name: String,
        /// Attributes in document order, keyed by local name, values unescaped.
        attributes: Vec<(String, String)>,
    },
    /// Unescaped character data (including CDATA sections).
    Text(String),
    /// An element was closed.
    Close {
        /// Local element name.
        name: String,
    },
}

impl TagEvent {
    /// Build an `Open` event from borrowed parts.
    pub fn open(name: &str, attributes: &[(&str, &str)]) -> Self {
        Self::Open {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Build a `Text` event.
    pub fn text(content: &str) -> Self {
        Self::Text(content.to_string())
    }

    /// Build a `Close` event.
    pub fn close(name: &str) -> Self {
        Self::Close {
            name: name.to_string(),
        }
    }

    /// Look up an attribute of an `Open` event.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        match self {
            Self::Open { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Element name for `Open`/`Close`, `None` for text.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Open { name, .. } | Self::Close { name } => Some(name),
            Self::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup() {
        let event = TagEvent::open("CodeList", &[("OID", "CL.1"), ("Name", "Sex")]);
        assert_eq!(event.attribute("OID"), Some("CL.1"));
        assert_eq!(event.attribute("Name"), Some("Sex"));
        assert_eq!(event.attribute("DataType"), None);
        assert_eq!(TagEvent::close("CodeList").attribute("OID"), None);
    }

    #[test]
    fn test_name() {
        assert_eq!(TagEvent::close("Decode").name(), Some("Decode"));
        assert_eq!(TagEvent::text("x").name(), None);
    }
}
