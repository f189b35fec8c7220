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

//! Version sniffing
//!
//! Publishers stamp the release date into the `FileOID` attribute of the
//! document root, e.g. `FileOID="CDISC_CT.SDTM_2025-09-26_odm"`. The sniffer
//! looks at the first chunk of raw bytes only, before parsing starts, and
//! treats a miss as "version unknown" rather than an error.

use once_cell::sync::Lazy;
use regex::Regex;

static FILE_OID_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"FileOID\s*=\s*["'][^"']*?(\d{4}-\d{2}-\d{2})"#).expect("valid version pattern")
});

/// Extract the date-shaped version from the header in `chunk`.
pub fn sniff_version(chunk: &[u8]) -> Option<String> {
    let head = String::from_utf8_lossy(chunk);
    FILE_OID_DATE
        .captures(&head)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_inside_file_oid() {
        let head = br#"<?xml version="1.0" encoding="UTF-8"?>
<ODM xmlns="http://www.cdisc.org/ns/odm/v1.3" FileType="Snapshot"
     FileOID="CDISC_CT_SDTM_2025-09-26_odm" CreationDateTime="2025-09-27T10:00:00">"#;
        assert_eq!(sniff_version(head).as_deref(), Some("2025-09-26"));
    }

    #[test]
    fn test_single_quotes_and_spacing() {
        let head = br#"<ODM FileOID = 'CDISC_CT.ADaM.2024-03-29'>"#;
        assert_eq!(sniff_version(head).as_deref(), Some("2024-03-29"));
    }

    #[test]
    fn test_dates_outside_file_oid_ignored() {
        let head = br#"<ODM FileOID="CDISC_CT" CreationDateTime="2025-09-27T10:00:00">"#;
        assert_eq!(sniff_version(head), None);
    }

    #[test]
    fn test_no_header() {
        assert_eq!(sniff_version(b""), None);
        assert_eq!(sniff_version(b"<CodeList OID=\"CL.1\">"), None);
    }

    #[test]
    fn test_invalid_utf8_does_not_fail() {
        let mut head = b"<ODM FileOID=\"X_2023-06-30\" ".to_vec();
        head.extend_from_slice(&[0xff, 0xfe, 0xfd]);
        assert_eq!(sniff_version(&head).as_deref(), Some("2023-06-30"));
    }
}
