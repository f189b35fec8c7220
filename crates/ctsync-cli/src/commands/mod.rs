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

//! CLI command implementations.

mod sniff;
mod sync;
mod types;

pub use sniff::sniff;
pub use sync::{sync, SyncArgs};
pub use types::types;

use crate::error::CliError;
use ctsync::SyncConfig;
use std::path::Path;
use tokio::runtime::Runtime;

/// Configuration from `path`, or the defaults when none is given.
pub(crate) fn load_config(path: Option<&Path>) -> Result<SyncConfig, CliError> {
    match path {
        Some(path) => Ok(SyncConfig::load(path)?),
        None => Ok(SyncConfig::default()),
    }
}

pub(crate) fn runtime() -> Result<Runtime, CliError> {
    Runtime::new().map_err(CliError::Runtime)
}
