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

//! Document store seam.
//!
//! The pipeline needs exactly two things from a backend: an atomic multi-record
//! batch commit with a size ceiling, and per-key merge-upsert semantics
//! (fields absent from an operation are left untouched).
//!
//! [`MemoryStore`] implements both in memory and can persist itself as a JSON
//! snapshot, which is what the command-line tool and the tests use.

use crate::error::StoreError;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Practical per-batch ceiling of common document databases.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 500;

/// Target collection of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Codelists,
    Terms,
}

/// One merge-upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOp {
    pub collection: Collection,
    pub key: String,
    pub fields: Map<String, Value>,
}

/// Backend able to commit batches of merge-upserts atomically.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Largest batch accepted by [`commit`](Self::commit).
    fn max_batch_size(&self) -> usize {
        DEFAULT_MAX_BATCH_SIZE
    }

    /// Apply every operation or none of them.
    async fn commit(&self, batch: Vec<UpsertOp>) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    fn max_batch_size(&self) -> usize {
        (**self).max_batch_size()
    }

    async fn commit(&self, batch: Vec<UpsertOp>) -> Result<(), StoreError> {
        (**self).commit(batch).await
    }
}

/// On-disk form of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub codelists: BTreeMap<String, Map<String, Value>>,
    #[serde(default)]
    pub terms: BTreeMap<String, Map<String, Value>>,
}

impl Snapshot {
    fn collection_mut(
        &mut self,
        collection: Collection,
    ) -> &mut BTreeMap<String, Map<String, Value>> {
        match collection {
            Collection::Codelists => &mut self.codelists,
            Collection::Terms => &mut self.terms,
        }
    }

    fn collection(&self, collection: Collection) -> &BTreeMap<String, Map<String, Value>> {
        match collection {
            Collection::Codelists => &self.codelists,
            Collection::Terms => &self.terms,
        }
    }
}

/// In-memory merge store.
///
/// Commits are atomic: an oversized batch, or a commit selected for failure
/// with [`fail_at_commit`](Self::fail_at_commit), leaves the contents untouched.
#[derive(Debug)]
pub struct MemoryStore {
    documents: RwLock<Snapshot>,
    max_batch_size: usize,
    log: Mutex<CommitLog>,
    fail_at_commit: Option<usize>,
}

#[derive(Debug, Default)]
struct CommitLog {
    attempts: usize,
    sizes: Vec<usize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_snapshot(Snapshot::default())
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            documents: RwLock::new(snapshot),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            log: Mutex::new(CommitLog::default()),
            fail_at_commit: None,
        }
    }

    /// Override the atomic commit ceiling.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }

    /// Make the `n`th commit attempt (1-based) fail without applying anything.
    pub fn fail_at_commit(mut self, n: usize) -> Self {
        self.fail_at_commit = Some(n);
        self
    }

    /// Load a snapshot file; a missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::new());
        }
        let bytes = std::fs::read(path)?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the current contents as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(&*self.documents.read())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    pub fn get(&self, collection: Collection, key: &str) -> Option<Map<String, Value>> {
        self.documents.read().collection(collection).get(key).cloned()
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.documents.read().collection(collection).len()
    }

    pub fn is_empty(&self) -> bool {
        let docs = self.documents.read();
        docs.codelists.is_empty() && docs.terms.is_empty()
    }

    /// Keys of a collection in sorted order.
    pub fn keys(&self, collection: Collection) -> Vec<String> {
        self.documents
            .read()
            .collection(collection)
            .keys()
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.documents.read().clone()
    }

    /// Sizes of successfully committed batches, in commit order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.log.lock().sizes.clone()
    }

    pub fn commit_count(&self) -> usize {
        self.log.lock().sizes.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn commit(&self, batch: Vec<UpsertOp>) -> Result<(), StoreError> {
        if batch.len() > self.max_batch_size {
            return Err(StoreError::BatchTooLarge {
                size: batch.len(),
                limit: self.max_batch_size,
            });
        }

        let mut log = self.log.lock();
        log.attempts += 1;
        let attempt = log.attempts;
        if self.fail_at_commit == Some(attempt) {
            return Err(StoreError::Unavailable(format!(
                "injected failure on commit {attempt}"
            )));
        }

        let mut docs = self.documents.write();
        let size = batch.len();
        for op in batch {
            let doc = docs.collection_mut(op.collection).entry(op.key).or_default();
            for (field, value) in op.fields {
                doc.insert(field, value);
            }
        }
        log.sizes.push(size);
        Ok(())
    }
}
