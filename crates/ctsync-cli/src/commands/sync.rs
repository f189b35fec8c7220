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

//! Sync command - run invocations against a JSON snapshot store

use super::{load_config, runtime};
use crate::error::CliError;
use ctsync::{SyncRequest, SyncResponse, Synchronizer};
use ctsync_core::{Checkpoint, MemoryStore};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Arguments of the `sync` command.
#[derive(Debug, Clone, Default)]
pub struct SyncArgs {
    pub terminology_type: String,
    pub max_writes: Option<i64>,
    pub resume_group: Option<String>,
    pub resume_leaf: Option<String>,
    pub source: Option<String>,
    pub store: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub until_done: bool,
}

impl SyncArgs {
    fn request(&self) -> SyncRequest {
        SyncRequest {
            terminology_type: self.terminology_type.clone(),
            max_writes: self.max_writes,
            resume_token: match (&self.resume_group, &self.resume_leaf) {
                (None, None) => None,
                (group, leaf) => Some(Checkpoint {
                    last_group_key: group.clone(),
                    last_leaf_key: leaf.clone(),
                }),
            },
            source_url: self.source.clone(),
        }
    }
}

fn open_store(path: Option<&Path>) -> Result<MemoryStore, CliError> {
    match path {
        Some(path) => MemoryStore::load(path).map_err(|e| CliError::io(path, e)),
        None => Ok(MemoryStore::new()),
    }
}

fn save_store(store: &MemoryStore, path: Option<&Path>) -> Result<(), CliError> {
    match path {
        Some(path) => store.save(path).map_err(|e| CliError::io(path, e)),
        None => Ok(()),
    }
}

/// Run one invocation, or repeat until done, printing each response as a JSON line.
///
/// The snapshot file is rewritten after every invocation, failed ones included,
/// so everything the store committed is kept.
pub fn sync(args: SyncArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let store = Arc::new(open_store(args.store.as_deref())?);
    let synchronizer = Synchronizer::with_default_opener(config, store.clone())?;
    let runtime = runtime()?;

    let mut request = args.request();
    let mut invocations = 0u32;
    let mut total_writes = 0u64;
    let stdout = io::stdout();

    loop {
        let result = runtime.block_on(synchronizer.run(&request));
        // Batches committed before a failure stay committed.
        save_store(&store, args.store.as_deref())?;
        let report = result?;
        invocations += 1;
        total_writes += report.writes;

        let line = serde_json::to_string(&SyncResponse::from(&report))?;
        writeln!(stdout.lock(), "{}", line).map_err(|e| CliError::io("<stdout>", e))?;

        if !args.until_done || report.done {
            break;
        }
        match report.resume_token {
            Some(token) => request.resume_token = Some(token),
            None => break,
        }
    }

    if args.until_done {
        info!(invocations, writes = total_writes, "sync complete");
    }
    Ok(())
}
