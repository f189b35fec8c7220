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

//! Source adapters.
//!
//! A terminology file is read as a forward-only sequence of byte chunks: no
//! seeking, no re-reading. Sources are wrapped in a [`CancellableSource`] that
//! checks the invocation's cancellation token before every read, which is how
//! the write scheduler stops a download early.

use async_trait::async_trait;
use bytes::Bytes;
use ctsync_core::{CancellationToken, SyncError, SyncResult};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::config::HttpConfig;

/// Forward-only cursor over raw bytes.
#[async_trait]
pub trait ByteSource: Send {
    /// Next chunk, or `None` at end of input.
    async fn next_chunk(&mut self) -> SyncResult<Option<Bytes>>;
}

/// Opens a [`ByteSource`] for a location.
#[async_trait]
pub trait SourceOpener: Send + Sync {
    async fn open(&self, location: &str) -> SyncResult<Box<dyn ByteSource>>;
}

fn transport(err: impl std::fmt::Display) -> SyncError {
    SyncError::Transport(err.to_string())
}

/// Streaming HTTP download.
pub struct HttpSource {
    response: reqwest::Response,
}

impl HttpSource {
    /// Issue the request; a non-success status fails before any byte is read.
    pub async fn open(client: &reqwest::Client, url: &str) -> SyncResult<Self> {
        let response = client.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        debug!(url, status = status.as_u16(), "source opened");
        Ok(Self { response })
    }
}

#[async_trait]
impl ByteSource for HttpSource {
    async fn next_chunk(&mut self) -> SyncResult<Option<Bytes>> {
        self.response.chunk().await.map_err(transport)
    }
}

/// Local file read in fixed-size chunks.
pub struct FileSource {
    file: tokio::fs::File,
    chunk_size: usize,
}

impl FileSource {
    pub async fn open(path: impl Into<PathBuf>, chunk_size: usize) -> SyncResult<Self> {
        let path = path.into();
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| SyncError::Transport(format!("cannot open {}: {}", path.display(), e)))?;
        Ok(Self {
            file,
            chunk_size: chunk_size.max(1),
        })
    }
}

#[async_trait]
impl ByteSource for FileSource {
    async fn next_chunk(&mut self) -> SyncResult<Option<Bytes>> {
        let mut buf = vec![0u8; self.chunk_size];
        let n = self.file.read(&mut buf).await.map_err(transport)?;
        buf.truncate(n);
        Ok((n > 0).then(|| Bytes::from(buf)))
    }
}

/// Pre-split in-memory chunks, optionally failing after a number of reads.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    chunks: VecDeque<Bytes>,
    fail_after: Option<(usize, String)>,
    reads: usize,
}

impl MemorySource {
    pub fn new(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Split `data` into chunks of `chunk_size` bytes.
    pub fn split(data: impl AsRef<[u8]>, chunk_size: usize) -> Self {
        let chunks = data
            .as_ref()
            .chunks(chunk_size.max(1))
            .map(Bytes::copy_from_slice)
            .collect::<Vec<_>>();
        Self::new(chunks)
    }

    /// Return a transport error on read number `reads + 1` and beyond.
    pub fn fail_after(mut self, reads: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((reads, message.into()));
        self
    }

    /// Reads served so far.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn next_chunk(&mut self) -> SyncResult<Option<Bytes>> {
        if let Some((limit, message)) = &self.fail_after {
            if self.reads >= *limit {
                return Err(SyncError::Transport(message.clone()));
            }
        }
        self.reads += 1;
        Ok(self.chunks.pop_front())
    }
}

/// Stops reading once the token is cancelled.
pub struct CancellableSource {
    inner: Box<dyn ByteSource>,
    cancel: CancellationToken,
}

impl CancellableSource {
    pub fn new(inner: Box<dyn ByteSource>, cancel: CancellationToken) -> Self {
        Self { inner, cancel }
    }
}

#[async_trait]
impl ByteSource for CancellableSource {
    async fn next_chunk(&mut self) -> SyncResult<Option<Bytes>> {
        if self.cancel.is_cancelled() {
            debug!("source cancelled, closing stream");
            return Ok(None);
        }
        self.inner.next_chunk().await
    }
}

/// Async buffered reader over chunks, consumed by the tag parser.
pub type ChunkReader = StreamReader<BoxStream<'static, io::Result<Bytes>>, Bytes>;

fn into_io(err: SyncError) -> io::Error {
    match err {
        SyncError::Io(io) => io,
        SyncError::Transport(message) => io::Error::new(io::ErrorKind::Other, message),
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    }
}

/// Chain an already-read `head` chunk in front of the rest of `source`.
pub fn chunk_reader(head: Option<Bytes>, source: Box<dyn ByteSource>) -> ChunkReader {
    let rest = stream::unfold(Some(source), |state| async move {
        let mut source = state?;
        match source.next_chunk().await {
            Ok(Some(chunk)) => Some((Ok(chunk), Some(source))),
            Ok(None) => None,
            Err(e) => Some((Err(into_io(e)), None)),
        }
    });
    let head = stream::iter(head.map(Ok));
    StreamReader::new(head.chain(rest).boxed())
}

/// Opens `http(s)://` locations over HTTP and everything else as a local path.
pub struct DefaultOpener {
    client: reqwest::Client,
    chunk_size: usize,
}

impl DefaultOpener {
    pub fn new(config: &HttpConfig) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .build()
            .map_err(|e| SyncError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            chunk_size: config.file_chunk_size,
        })
    }
}

#[async_trait]
impl SourceOpener for DefaultOpener {
    async fn open(&self, location: &str) -> SyncResult<Box<dyn ByteSource>> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Ok(Box::new(HttpSource::open(&self.client, location).await?));
        }
        let path = location.strip_prefix("file://").unwrap_or(location);
        Ok(Box::new(FileSource::open(path, self.chunk_size).await?))
    }
}
