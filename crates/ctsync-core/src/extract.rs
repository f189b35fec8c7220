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

//! Record extraction state machine.
//!
//! Interprets the ordered [`TagEvent`] sequence of a CDISC ODM terminology
//! file and assembles one codelist and one term at a time. A term is emitted
//! exactly once, on its closing tag, if it carries both a codelist key and a
//! coded value; otherwise it is dropped.
//!
//! # States
//!
//! ```text
//!            open(CodeList)                open(EnumeratedItem|CodeListItem)
//!   Idle ───────────────────▶ InGroup ───────────────────────────────────▶ InLeaf
//!    ▲                          ▲  │                                      │   ▲
//!    └──── close(CodeList) ─────┘  └───────── close(leaf): emit ◀─────────┘   │
//!                                                              open(field)│   │close(field)
//!                                                                         ▼   │
//!                                                                      Capturing(field)
//! ```
//!
//! Unrecognized elements are ignored in every state, so the surrounding
//! `ODM`/`Study`/`MetaDataVersion` scaffolding needs no special handling.

use crate::event::TagEvent;
use crate::model::{GroupRecord, LeafRecord};
use tracing::warn;

const GROUP_TAG: &str = "CodeList";
const LEAF_TAGS: [&str; 2] = ["EnumeratedItem", "CodeListItem"];

const ATTR_GROUP_CODE: &str = "ExtCodeID";
const ATTR_OID: &str = "OID";
const ATTR_NAME: &str = "Name";
const ATTR_DATA_TYPE: &str = "DataType";
const ATTR_CODED_VALUE: &str = "CodedValue";

/// Term sub-elements whose text is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Decode,
    PreferredTerm,
    Definition,
    ExternalCode,
    Synonym,
}

impl Field {
    fn from_tag(name: &str) -> Option<Self> {
        match name {
            "Decode" => Some(Self::Decode),
            "PreferredTerm" => Some(Self::PreferredTerm),
            "CDISCDefinition" => Some(Self::Definition),
            "ExtCodeID" => Some(Self::ExternalCode),
            "CDISCSynonym" => Some(Self::Synonym),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InGroup,
    /// `in_group` records whether a codelist was open when the term began.
    InLeaf { in_group: bool },
    Capturing { field: Field, in_group: bool },
}

/// Term under construction. Text is accumulated raw and trimmed on finish.
#[derive(Debug, Default)]
struct LeafDraft {
    group_key: Option<String>,
    coded_value: Option<String>,
    decode: String,
    preferred_term: String,
    definition: String,
    external_code: String,
    external_code_attr: Option<String>,
    synonym: String,
    synonyms: Vec<String>,
}

impl LeafDraft {
    fn append(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Decode => &mut self.decode,
            Field::PreferredTerm => &mut self.preferred_term,
            Field::Definition => &mut self.definition,
            Field::ExternalCode => &mut self.external_code,
            Field::Synonym => &mut self.synonym,
        };
        target.push_str(text);
    }

    fn end_capture(&mut self, field: Field) {
        if field == Field::Synonym {
            let synonym = std::mem::take(&mut self.synonym);
            if let Some(s) = non_empty(&synonym) {
                self.synonyms.push(s);
            }
        }
    }

    fn finish(self) -> Option<LeafRecord> {
        let group_key = self.group_key.as_deref().and_then(non_empty)?;
        let coded_value = self.coded_value.as_deref().and_then(non_empty)?;
        Some(LeafRecord {
            group_key,
            coded_value,
            decode_text: non_empty(&self.decode),
            preferred_term_text: non_empty(&self.preferred_term),
            definition_text: non_empty(&self.definition),
            external_concept_code: non_empty(&self.external_code)
                .or_else(|| self.external_code_attr.as_deref().and_then(non_empty)),
            synonyms: self.synonyms,
        })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn attribute<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[inline]
fn is_leaf_tag(name: &str) -> bool {
    LEAF_TAGS.contains(&name)
}

/// Counters collected while extracting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Codelist open tags observed.
    pub groups_seen: u64,
    /// Terms emitted.
    pub leaves_emitted: u64,
    /// Terms dropped for a missing codelist key or coded value.
    pub malformed_dropped: u64,
}

/// Finite state machine turning tag events into finished terms.
///
/// Feed events in document order with [`on_event`](Self::on_event). The
/// codelist that owns the most recently emitted term is available from
/// [`group`](Self::group) until the next event is fed.
#[derive(Debug)]
pub struct RecordExtractor {
    state: State,
    group: GroupRecord,
    leaf: LeafDraft,
    stats: ExtractStats,
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordExtractor {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            group: GroupRecord::default(),
            leaf: LeafDraft::default(),
            stats: ExtractStats::default(),
        }
    }

    /// Current codelist.
    #[inline]
    pub fn group(&self) -> &GroupRecord {
        &self.group
    }

    #[inline]
    pub fn stats(&self) -> ExtractStats {
        self.stats
    }

    /// Feed one event; returns a term when this event completed one.
    pub fn on_event(&mut self, event: TagEvent) -> Option<LeafRecord> {
        let (next, emitted) = self.transition(self.state, event);
        self.state = next;
        emitted
    }

    fn transition(&mut self, state: State, event: TagEvent) -> (State, Option<LeafRecord>) {
        match (state, event) {
            (_, TagEvent::Open { name, attributes }) if name == GROUP_TAG => {
                self.open_group(&attributes);
                (State::InGroup, None)
            }
            (State::Idle, TagEvent::Open { name, attributes }) if is_leaf_tag(&name) => {
                self.open_leaf(&attributes);
                (State::InLeaf { in_group: false }, None)
            }
            (State::InGroup, TagEvent::Open { name, attributes }) if is_leaf_tag(&name) => {
                self.open_leaf(&attributes);
                (State::InLeaf { in_group: true }, None)
            }
            (State::InLeaf { in_group }, TagEvent::Open { name, .. }) => {
                match Field::from_tag(&name) {
                    Some(field) => (State::Capturing { field, in_group }, None),
                    None => (State::InLeaf { in_group }, None),
                }
            }
            (State::Capturing { field, in_group }, TagEvent::Text(text)) => {
                self.leaf.append(field, &text);
                (State::Capturing { field, in_group }, None)
            }
            (State::Capturing { field, in_group }, TagEvent::Close { name })
                if Field::from_tag(&name) == Some(field) =>
            {
                self.leaf.end_capture(field);
                (State::InLeaf { in_group }, None)
            }
            (
                State::InLeaf { in_group } | State::Capturing { in_group, .. },
                TagEvent::Close { name },
            ) if is_leaf_tag(&name) => {
                let emitted = self.close_leaf();
                let next = if in_group { State::InGroup } else { State::Idle };
                (next, emitted)
            }
            (_, TagEvent::Close { name }) if name == GROUP_TAG => {
                self.group = GroupRecord::default();
                self.leaf = LeafDraft::default();
                (State::Idle, None)
            }
            (state, _) => (state, None),
        }
    }

    fn open_group(&mut self, attributes: &[(String, String)]) {
        let oid = attribute(attributes, ATTR_OID).and_then(non_empty);
        let group_key = attribute(attributes, ATTR_GROUP_CODE)
            .and_then(non_empty)
            .or_else(|| oid.clone());
        self.group = GroupRecord {
            group_key,
            display_name: attribute(attributes, ATTR_NAME).and_then(non_empty),
            data_type: attribute(attributes, ATTR_DATA_TYPE).and_then(non_empty),
            oid,
        };
        self.leaf = LeafDraft::default();
        self.stats.groups_seen += 1;
    }

    fn open_leaf(&mut self, attributes: &[(String, String)]) {
        self.leaf = LeafDraft {
            group_key: self.group.group_key.clone(),
            coded_value: attribute(attributes, ATTR_CODED_VALUE).map(str::to_string),
            external_code_attr: attribute(attributes, ATTR_GROUP_CODE).map(str::to_string),
            ..LeafDraft::default()
        };
    }

    fn close_leaf(&mut self) -> Option<LeafRecord> {
        let draft = std::mem::take(&mut self.leaf);
        let group_key = draft.group_key.clone();
        let coded_value = draft.coded_value.clone();
        match draft.finish() {
            Some(leaf) => {
                self.stats.leaves_emitted += 1;
                Some(leaf)
            }
            None => {
                self.stats.malformed_dropped += 1;
                warn!(
                    group_key = group_key.as_deref().unwrap_or("<none>"),
                    coded_value = coded_value.as_deref().unwrap_or("<none>"),
                    "dropping term without codelist key or coded value"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(events: Vec<TagEvent>) -> (Vec<LeafRecord>, RecordExtractor) {
        let mut extractor = RecordExtractor::new();
        let leaves = events
            .into_iter()
            .filter_map(|e| extractor.on_event(e))
            .collect();
        (leaves, extractor)
    }

    #[test]
    fn test_single_term_with_fields() {
        let (leaves, extractor) = run(vec![
            TagEvent::open(
                "CodeList",
                &[
                    ("OID", "CL.C66731.SEX"),
                    ("Name", "Sex"),
                    ("DataType", "text"),
                    ("ExtCodeID", "C66731"),
                ],
            ),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "F"), ("ExtCodeID", "C16576")]),
            TagEvent::open("Decode", &[]),
            TagEvent::open("TranslatedText", &[("lang", "en")]),
            TagEvent::text("  Female "),
            TagEvent::close("TranslatedText"),
            TagEvent::close("Decode"),
            TagEvent::open("CDISCDefinition", &[]),
            TagEvent::text("A person who belongs to the sex that normally produces ova."),
            TagEvent::close("CDISCDefinition"),
            TagEvent::open("PreferredTerm", &[]),
            TagEvent::text("Female"),
            TagEvent::close("PreferredTerm"),
            TagEvent::close("EnumeratedItem"),
        ]);

        assert_eq!(leaves.len(), 1);
        let leaf = &leaves[0];
        assert_eq!(leaf.group_key, "C66731");
        assert_eq!(leaf.coded_value, "F");
        assert_eq!(leaf.decode_text.as_deref(), Some("Female"));
        assert_eq!(leaf.preferred_term_text.as_deref(), Some("Female"));
        assert!(leaf.definition_text.as_deref().unwrap().starts_with("A person"));
        assert_eq!(leaf.external_concept_code.as_deref(), Some("C16576"));

        assert_eq!(extractor.group().display_name.as_deref(), Some("Sex"));
        assert_eq!(extractor.group().data_type.as_deref(), Some("text"));
        assert_eq!(extractor.group().oid.as_deref(), Some("CL.C66731.SEX"));
    }

    #[test]
    fn test_group_key_falls_back_to_oid() {
        let (leaves, _) = run(vec![
            TagEvent::open("CodeList", &[("OID", "CL.1")]),
            TagEvent::open("CodeListItem", &[("CodedValue", "Y")]),
            TagEvent::close("CodeListItem"),
        ]);
        assert_eq!(leaves[0].group_key, "CL.1");
    }

    #[test]
    fn test_text_accumulates_across_inline_markup() {
        let (leaves, _) = run(vec![
            TagEvent::open("CodeList", &[("OID", "CL.1")]),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "X")]),
            TagEvent::open("CDISCDefinition", &[]),
            TagEvent::text("first "),
            TagEvent::open("b", &[]),
            TagEvent::text("bold"),
            TagEvent::close("b"),
            TagEvent::text(" last"),
            TagEvent::close("CDISCDefinition"),
            TagEvent::close("EnumeratedItem"),
        ]);
        assert_eq!(leaves[0].definition_text.as_deref(), Some("first bold last"));
    }

    #[test]
    fn test_text_outside_capture_is_ignored() {
        let (leaves, _) = run(vec![
            TagEvent::open("CodeList", &[("OID", "CL.1")]),
            TagEvent::text("noise"),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "X")]),
            TagEvent::text("more noise"),
            TagEvent::close("EnumeratedItem"),
        ]);
        assert_eq!(leaves[0].decode_text, None);
        assert_eq!(leaves[0].definition_text, None);
    }

    #[test]
    fn test_synonyms_collected_separately() {
        let (leaves, _) = run(vec![
            TagEvent::open("CodeList", &[("OID", "CL.1")]),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "U")]),
            TagEvent::open("CDISCSynonym", &[]),
            TagEvent::text("Unknown"),
            TagEvent::close("CDISCSynonym"),
            TagEvent::open("CDISCSynonym", &[]),
            TagEvent::text(" U "),
            TagEvent::close("CDISCSynonym"),
            TagEvent::open("CDISCSynonym", &[]),
            TagEvent::close("CDISCSynonym"),
            TagEvent::close("EnumeratedItem"),
        ]);
        assert_eq!(leaves[0].synonyms, vec!["Unknown".to_string(), "U".to_string()]);
    }

    #[test]
    fn test_ext_code_element_overrides_attribute() {
        let (leaves, _) = run(vec![
            TagEvent::open("CodeList", &[("OID", "CL.1")]),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "A"), ("ExtCodeID", "C1")]),
            TagEvent::open("ExtCodeID", &[]),
            TagEvent::text("C2"),
            TagEvent::close("ExtCodeID"),
            TagEvent::close("EnumeratedItem"),
        ]);
        assert_eq!(leaves[0].external_concept_code.as_deref(), Some("C2"));
    }

    #[test]
    fn test_missing_coded_value_is_dropped() {
        let (leaves, extractor) = run(vec![
            TagEvent::open("CodeList", &[("OID", "CL.1")]),
            TagEvent::open("EnumeratedItem", &[]),
            TagEvent::close("EnumeratedItem"),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "   ")]),
            TagEvent::close("EnumeratedItem"),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "OK")]),
            TagEvent::close("EnumeratedItem"),
        ]);
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].coded_value, "OK");
        assert_eq!(extractor.stats().malformed_dropped, 2);
        assert_eq!(extractor.stats().leaves_emitted, 1);
    }

    #[test]
    fn test_term_without_codelist_is_dropped() {
        let (leaves, extractor) = run(vec![
            TagEvent::open("EnumeratedItem", &[("CodedValue", "ORPHAN")]),
            TagEvent::close("EnumeratedItem"),
            TagEvent::open("CodeList", &[("OID", "CL.1")]),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "A")]),
            TagEvent::close("EnumeratedItem"),
        ]);
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].coded_value, "A");
        assert_eq!(extractor.stats().malformed_dropped, 1);
    }

    #[test]
    fn test_group_close_resets_state() {
        let (leaves, extractor) = run(vec![
            TagEvent::open("CodeList", &[("OID", "CL.1"), ("Name", "One")]),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "A")]),
            TagEvent::close("EnumeratedItem"),
            TagEvent::close("CodeList"),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "B")]),
            TagEvent::close("EnumeratedItem"),
        ]);
        assert_eq!(leaves.len(), 1);
        assert!(extractor.group().is_empty());
    }

    #[test]
    fn test_fields_do_not_leak_between_terms() {
        let (leaves, _) = run(vec![
            TagEvent::open("CodeList", &[("OID", "CL.1")]),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "A")]),
            TagEvent::open("PreferredTerm", &[]),
            TagEvent::text("Alpha"),
            TagEvent::close("PreferredTerm"),
            TagEvent::close("EnumeratedItem"),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "B")]),
            TagEvent::close("EnumeratedItem"),
        ]);
        assert_eq!(leaves[0].preferred_term_text.as_deref(), Some("Alpha"));
        assert_eq!(leaves[1].preferred_term_text, None);
    }

    #[test]
    fn test_unrecognized_scaffolding_ignored() {
        let (leaves, extractor) = run(vec![
            TagEvent::open("ODM", &[("FileOID", "CDISC_CT.SDTM_2025-09-26")]),
            TagEvent::open("Study", &[]),
            TagEvent::open("MetaDataVersion", &[]),
            TagEvent::open("CodeList", &[("OID", "CL.1")]),
            TagEvent::open("Description", &[]),
            TagEvent::text("codelist description"),
            TagEvent::close("Description"),
            TagEvent::open("EnumeratedItem", &[("CodedValue", "A")]),
            TagEvent::close("EnumeratedItem"),
            TagEvent::close("CodeList"),
            TagEvent::close("MetaDataVersion"),
            TagEvent::close("Study"),
            TagEvent::close("ODM"),
        ]);
        assert_eq!(leaves.len(), 1);
        assert_eq!(extractor.stats().groups_seen, 1);
    }
}
