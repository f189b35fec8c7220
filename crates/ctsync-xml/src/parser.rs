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

//! Incremental tag parser
//!
//! A pull parser over an async byte stream: each call to
//! [`TagParser::next_event`] reads only as much input as the next structural
//! event needs. Memory use is bounded by the largest single tag or text run,
//! not by the document.
//!
//! Self-closing elements are expanded into an open/close pair, CDATA is
//! delivered as text, and declarations, comments, processing instructions and
//! doctypes are skipped. Names are reported without namespace prefixes.
//!
//! # Examples
//!
//! ```rust
//! use ctsync_core::TagEvent;
//! use ctsync_xml::TagParser;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let xml: &[u8] = br#"<Decode><TranslatedText>Female</TranslatedText></Decode>"#;
//! let mut parser = TagParser::new(xml);
//!
//! let mut texts = Vec::new();
//! while let Some(event) = parser.next_event().await? {
//!     if let TagEvent::Text(t) = event {
//!         texts.push(t);
//!     }
//! }
//! assert_eq!(texts, vec!["Female".to_string()]);
//! # Ok(())
//! # }
//! ```

use crate::error::XmlError;
use ctsync_core::TagEvent;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tokio::io::AsyncBufRead;

/// Configuration for the tag parser
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Maximum element nesting depth (default: 256)
    pub max_depth: usize,
    /// Initial capacity of the event buffer (default: 8KB)
    pub buffer_capacity: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            buffer_capacity: 8192,
        }
    }
}

/// Outcome of translating one low-level event.
enum Step {
    Emit(TagEvent),
    Skip,
    End,
}

/// Tracks nesting so that truncated input can be told apart from a complete document.
#[derive(Debug, Default)]
struct Nesting {
    depth: usize,
}

impl Nesting {
    fn translate(
        &mut self,
        event: Event<'_>,
        pos: usize,
        max_depth: usize,
    ) -> Result<Step, XmlError> {
        match event {
            Event::Start(e) => {
                self.depth += 1;
                if self.depth > max_depth {
                    return Err(XmlError::RecursionLimitExceeded {
                        max: max_depth,
                        current: self.depth,
                    });
                }
                open_event(&e, pos).map(Step::Emit)
            }
            Event::End(e) => {
                self.depth = self.depth.saturating_sub(1);
                Ok(Step::Emit(TagEvent::Close {
                    name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                }))
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| XmlError::from_quick_xml(pos, err))?;
                if text.is_empty() {
                    Ok(Step::Skip)
                } else {
                    Ok(Step::Emit(TagEvent::Text(text.into_owned())))
                }
            }
            Event::CData(e) => Ok(Step::Emit(TagEvent::Text(
                String::from_utf8_lossy(&e.into_inner()).into_owned(),
            ))),
            Event::Eof => {
                if self.depth > 0 {
                    Err(XmlError::UnexpectedEof {
                        pos,
                        open: self.depth,
                    })
                } else {
                    Ok(Step::End)
                }
            }
            _ => Ok(Step::Skip),
        }
    }
}

fn open_event(elem: &BytesStart<'_>, pos: usize) -> Result<TagEvent, XmlError> {
    let name = String::from_utf8_lossy(elem.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in elem.attributes() {
        let attr = attr.map_err(|e| XmlError::ParseError {
            pos,
            message: format!("malformed attribute in <{}>: {}", name, e),
        })?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::from_quick_xml(pos, e))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(TagEvent::Open { name, attributes })
}

fn configure<R>(reader: &mut Reader<R>) {
    reader.expand_empty_elements(true);
    reader.check_end_names(true);
}

/// Async pull parser yielding [`TagEvent`]s.
pub struct TagParser<R: AsyncBufRead + Unpin> {
    reader: Reader<R>,
    config: ParserConfig,
    nesting: Nesting,
    buf: Vec<u8>,
    exhausted: bool,
}

impl<R: AsyncBufRead + Unpin> TagParser<R> {
    /// Create a parser with default configuration
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, ParserConfig::default())
    }

    pub fn with_config(reader: R, config: ParserConfig) -> Self {
        let mut xml_reader = Reader::from_reader(reader);
        configure(&mut xml_reader);
        Self {
            reader: xml_reader,
            buf: Vec::with_capacity(config.buffer_capacity),
            config,
            nesting: Nesting::default(),
            exhausted: false,
        }
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.reader.buffer_position()
    }

    /// Current element nesting depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.nesting.depth
    }

    /// Next structural event, or `None` once the document is complete.
    ///
    /// After an error or the end of input, every further call returns `Ok(None)`.
    pub async fn next_event(&mut self) -> Result<Option<TagEvent>, XmlError> {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into_async(&mut self.buf).await {
                Ok(event) => event,
                Err(e) => {
                    self.exhausted = true;
                    return Err(XmlError::from_quick_xml(self.reader.buffer_position(), e));
                }
            };
            let pos = self.reader.buffer_position();
            match self.nesting.translate(event, pos, self.config.max_depth) {
                Ok(Step::Emit(tag)) => return Ok(Some(tag)),
                Ok(Step::Skip) => continue,
                Ok(Step::End) => {
                    self.exhausted = true;
                    return Ok(None);
                }
                Err(e) => {
                    self.exhausted = true;
                    return Err(e);
                }
            }
        }
    }
}

/// Parse a complete in-memory document into its event sequence.
pub fn parse_events(input: &[u8]) -> Result<Vec<TagEvent>, XmlError> {
    parse_events_with_config(input, &ParserConfig::default())
}

pub fn parse_events_with_config(
    input: &[u8],
    config: &ParserConfig,
) -> Result<Vec<TagEvent>, XmlError> {
    let mut reader = Reader::from_reader(input);
    configure(&mut reader);
    let mut nesting = Nesting::default();
    let mut buf = Vec::with_capacity(config.buffer_capacity);
    let mut events = Vec::new();
    loop {
        buf.clear();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| XmlError::from_quick_xml(reader.buffer_position(), e))?;
        let pos = reader.buffer_position();
        match nesting.translate(event, pos, config.max_depth)? {
            Step::Emit(tag) => events.push(tag),
            Step::Skip => {}
            Step::End => return Ok(events),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(xml: &str) -> Result<Vec<TagEvent>, XmlError> {
        let mut parser = TagParser::new(xml.as_bytes());
        let mut events = Vec::new();
        while let Some(event) = parser.next_event().await? {
            events.push(event);
        }
        Ok(events)
    }

    #[tokio::test]
    async fn test_event_order() {
        let events = collect(r#"<?xml version="1.0"?><a x="1"><b>hi</b></a>"#)
            .await
            .unwrap();
        assert_eq!(
            events,
            vec![
                TagEvent::open("a", &[("x", "1")]),
                TagEvent::open("b", &[]),
                TagEvent::text("hi"),
                TagEvent::close("b"),
                TagEvent::close("a"),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_element_expanded() {
        let events = collect(r#"<a><b y="2"/></a>"#).await.unwrap();
        assert_eq!(events[1], TagEvent::open("b", &[("y", "2")]));
        assert_eq!(events[2], TagEvent::close("b"));
    }

    #[tokio::test]
    async fn test_namespace_prefixes_stripped() {
        let events = collect(concat!(
            r#"<ODM xmlns:nciodm="http://ncicb.nci.nih.gov/xml/odm/EVS/CDISC">"#,
            r#"<nciodm:PreferredTerm nciodm:ExtCodeID="C1">x</nciodm:PreferredTerm></ODM>"#,
        ))
        .await
        .unwrap();
        assert_eq!(
            events[1],
            TagEvent::open("PreferredTerm", &[("ExtCodeID", "C1")])
        );
        assert_eq!(events[3], TagEvent::close("PreferredTerm"));
        assert_eq!(
            events[0].attribute("nciodm"),
            Some("http://ncicb.nci.nih.gov/xml/odm/EVS/CDISC")
        );
    }

    #[tokio::test]
    async fn test_entities_and_cdata() {
        let events = collect(r#"<a v="&lt;5">x &amp; y<![CDATA[<raw>]]></a>"#)
            .await
            .unwrap();
        assert_eq!(events[0].attribute("v"), Some("<5"));
        assert_eq!(events[1], TagEvent::text("x & y"));
        assert_eq!(events[2], TagEvent::text("<raw>"));
    }

    #[tokio::test]
    async fn test_comments_skipped() {
        let events = collect("<a><!-- note --><b/></a>").await.unwrap();
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn test_mismatched_end_tag_is_error() {
        let err = collect("<a><b></a>").await.unwrap_err();
        assert!(matches!(err, XmlError::ParseError { .. }));
    }

    #[tokio::test]
    async fn test_truncated_document_is_error() {
        let err = collect("<a><b>text").await.unwrap_err();
        assert!(matches!(
            err,
            XmlError::UnexpectedEof { .. } | XmlError::ParseError { .. }
        ));
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let config = ParserConfig {
            max_depth: 2,
            ..Default::default()
        };
        let mut parser = TagParser::with_config("<a><b><c/></b></a>".as_bytes(), config);
        assert!(parser.next_event().await.unwrap().is_some());
        assert!(parser.next_event().await.unwrap().is_some());
        let err = parser.next_event().await.unwrap_err();
        assert_eq!(err, XmlError::RecursionLimitExceeded { max: 2, current: 3 });
        assert_eq!(parser.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_exhausted_parser_stays_exhausted() {
        let mut parser = TagParser::new("<a/>".as_bytes());
        while parser.next_event().await.unwrap().is_some() {}
        assert_eq!(parser.next_event().await.unwrap(), None);
        assert_eq!(parser.depth(), 0);
    }

    #[test]
    fn test_sync_helper_matches_async() {
        let xml = r#"<a><b k="v">t</b><c/></a>"#;
        let sync_events = parse_events(xml.as_bytes()).unwrap();
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let async_events = rt.block_on(collect(xml)).unwrap();
        assert_eq!(sync_events, async_events);
    }
}
