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

//! Data model for terminology synchronization.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The distribution kinds published as separate terminology files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminologyType {
    Sdtm,
    Cdash,
    Adam,
    Send,
    DefineXml,
    Protocol,
    Glossary,
}

impl TerminologyType {
    /// Every supported type, in listing order.
    pub const ALL: [TerminologyType; 7] = [
        TerminologyType::Sdtm,
        TerminologyType::Cdash,
        TerminologyType::Adam,
        TerminologyType::Send,
        TerminologyType::DefineXml,
        TerminologyType::Protocol,
        TerminologyType::Glossary,
    ];

    /// Wire name, also used as the store key prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sdtm => "sdtm",
            Self::Cdash => "cdash",
            Self::Adam => "adam",
            Self::Send => "send",
            Self::DefineXml => "define-xml",
            Self::Protocol => "protocol",
            Self::Glossary => "glossary",
        }
    }

    /// Publisher location of the current ODM distribution file.
    pub fn default_source_url(self) -> &'static str {
        match self {
            Self::Sdtm => "https://evs.nci.nih.gov/ftp1/CDISC/SDTM/SDTM%20Terminology.odm.xml",
            Self::Cdash => "https://evs.nci.nih.gov/ftp1/CDISC/SDTM/CDASH%20Terminology.odm.xml",
            Self::Adam => "https://evs.nci.nih.gov/ftp1/CDISC/ADaM/ADaM%20Terminology.odm.xml",
            Self::Send => "https://evs.nci.nih.gov/ftp1/CDISC/SEND/SEND%20Terminology.odm.xml",
            Self::DefineXml => {
                "https://evs.nci.nih.gov/ftp1/CDISC/Define-XML/Define-XML%20Terminology.odm.xml"
            }
            Self::Protocol => {
                "https://evs.nci.nih.gov/ftp1/CDISC/Protocol/Protocol%20Terminology.odm.xml"
            }
            Self::Glossary => {
                "https://evs.nci.nih.gov/ftp1/CDISC/Glossary/CDISC%20Glossary.odm.xml"
            }
        }
    }
}

impl fmt::Display for TerminologyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TerminologyType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SyncError::UnknownTerminologyType(s.to_string()))
    }
}

/// A codelist: one named enumeration within a terminology file.
///
/// Only the codelist currently being read is held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRecord {
    pub group_key: Option<String>,
    pub display_name: Option<String>,
    pub data_type: Option<String>,
    /// Document-local OID, kept for provenance.
    pub oid: Option<String>,
}

impl GroupRecord {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.group_key.is_none()
            && self.display_name.is_none()
            && self.data_type.is_none()
            && self.oid.is_none()
    }
}

/// A term: one coded value within a codelist, finalized on its closing tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafRecord {
    pub group_key: String,
    pub coded_value: String,
    pub decode_text: Option<String>,
    pub preferred_term_text: Option<String>,
    pub definition_text: Option<String>,
    pub external_concept_code: Option<String>,
    pub synonyms: Vec<String>,
}

impl LeafRecord {
    /// Checkpoint pointing at this record.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            last_group_key: Some(self.group_key.clone()),
            last_leaf_key: Some(self.coded_value.clone()),
        }
    }
}

/// Resume position in document emission order.
///
/// An absent `last_group_key` means "start from the beginning".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_group_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_leaf_key: Option<String>,
}

impl Checkpoint {
    pub fn new(group_key: impl Into<String>, leaf_key: impl Into<String>) -> Self {
        Self {
            last_group_key: Some(group_key.into()),
            last_leaf_key: Some(leaf_key.into()),
        }
    }

    /// True when this checkpoint asks to skip ahead.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.last_group_key.is_some()
    }
}

/// Provenance carried onto every written document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub terminology_type: TerminologyType,
    pub source_url: String,
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminology_type_parsing() {
        assert_eq!("sdtm".parse::<TerminologyType>().unwrap(), TerminologyType::Sdtm);
        assert_eq!("SDTM".parse::<TerminologyType>().unwrap(), TerminologyType::Sdtm);
        assert_eq!(
            " define-xml ".parse::<TerminologyType>().unwrap(),
            TerminologyType::DefineXml
        );
        assert!(matches!(
            "meddra".parse::<TerminologyType>(),
            Err(SyncError::UnknownTerminologyType(name)) if name == "meddra"
        ));
    }

    #[test]
    fn test_terminology_type_serialization() {
        let json = serde_json::to_string(&TerminologyType::DefineXml).unwrap();
        assert_eq!(json, "\"define-xml\"");
        for t in TerminologyType::ALL {
            assert_eq!(serde_json::to_value(t).unwrap(), t.as_str());
            assert!(t.default_source_url().starts_with("https://"));
        }
    }

    #[test]
    fn test_checkpoint_wire_format() {
        let cp = Checkpoint::new("CL.C66731", "F");
        let json = serde_json::to_value(&cp).unwrap();
        assert_eq!(json["lastGroupKey"], "CL.C66731");
        assert_eq!(json["lastLeafKey"], "F");

        let empty: Checkpoint = serde_json::from_str("{}").unwrap();
        assert!(!empty.is_set());
        assert_eq!(serde_json::to_string(&empty).unwrap(), "{}");
    }

    #[test]
    fn test_leaf_checkpoint() {
        let leaf = LeafRecord {
            group_key: "CL.1".into(),
            coded_value: "Y".into(),
            ..Default::default()
        };
        assert_eq!(leaf.checkpoint(), Checkpoint::new("CL.1", "Y"));
    }
}
