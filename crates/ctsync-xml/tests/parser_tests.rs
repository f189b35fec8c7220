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

//! Parser behaviour over a realistic terminology document.

use ctsync_core::{RecordExtractor, TagEvent};
use ctsync_xml::{parse_events, sniff_version, TagParser, XmlError};
use proptest::prelude::*;
use tokio::io::BufReader;

const FIXTURE: &str = include_str!("../../ctsync/tests/fixtures/sdtm_two_codelists.odm.xml");

async fn collect_async(input: &[u8], capacity: usize) -> Result<Vec<TagEvent>, XmlError> {
    let mut parser = TagParser::new(BufReader::with_capacity(capacity, input));
    let mut events = Vec::new();
    while let Some(event) = parser.next_event().await? {
        events.push(event);
    }
    Ok(events)
}

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

#[test]
fn test_fixture_structure() {
    let events = parse_events(FIXTURE.as_bytes()).unwrap();
    let opens = |tag: &str| {
        events
            .iter()
            .filter(|e| matches!(e, TagEvent::Open { name, .. } if name == tag))
            .count()
    };
    assert_eq!(opens("CodeList"), 2);
    assert_eq!(opens("EnumeratedItem"), 3);
    assert_eq!(opens("CodeListItem"), 3);
    assert_eq!(opens("CDISCSynonym"), 4);

    let first_codelist = events
        .iter()
        .find(|e| e.name() == Some("CodeList"))
        .unwrap();
    assert_eq!(first_codelist.attribute("ExtCodeID"), Some("C66731"));
    assert_eq!(first_codelist.attribute("OID"), Some("CL.C66731.SEX"));
}

#[test]
fn test_fixture_extracts_all_terms() {
    let mut extractor = RecordExtractor::new();
    let leaves: Vec<_> = parse_events(FIXTURE.as_bytes())
        .unwrap()
        .into_iter()
        .filter_map(|e| extractor.on_event(e))
        .collect();

    let codes: Vec<_> = leaves
        .iter()
        .map(|l| (l.group_key.as_str(), l.coded_value.as_str()))
        .collect();
    assert_eq!(
        codes,
        vec![
            ("C66731", "F"),
            ("C66731", "M"),
            ("C66731", "U"),
            ("C66742", "N"),
            ("C66742", "NA"),
            ("C66742", "Y"),
        ]
    );
    assert_eq!(leaves[2].synonyms, vec!["U".to_string(), "UNK".to_string()]);
    assert_eq!(leaves[4].decode_text.as_deref(), Some("Not Applicable"));
    assert_eq!(extractor.stats().malformed_dropped, 0);
}

#[test]
fn test_fixture_version() {
    assert_eq!(
        sniff_version(&FIXTURE.as_bytes()[..512]).as_deref(),
        Some("2025-09-26")
    );
}

#[tokio::test]
async fn test_async_matches_sync() {
    let expected = parse_events(FIXTURE.as_bytes()).unwrap();
    let actual = collect_async(FIXTURE.as_bytes(), 8192).await.unwrap();
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_mismatched_close_is_error() {
    let err = collect_async(b"<CodeList><EnumeratedItem></CodeList>", 64)
        .await
        .unwrap_err();
    assert!(matches!(err, XmlError::ParseError { .. }), "{:?}", err);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_buffer_size_does_not_change_events(capacity in 1usize..128) {
        let expected = parse_events(FIXTURE.as_bytes()).unwrap();
        let actual = run(collect_async(FIXTURE.as_bytes(), capacity)).unwrap();
        prop_assert_eq!(actual, expected);
    }
}
