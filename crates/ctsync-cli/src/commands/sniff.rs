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

//! Sniff command - report the version date of a terminology file

use super::{load_config, runtime};
use crate::error::CliError;
use ctsync::{ByteSource, DefaultOpener, SourceOpener};
use ctsync_xml::sniff_version;
use std::path::Path;

/// Read the first chunk of `location` and print the version date, or `unknown`.
pub fn sniff(location: &str, config: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config)?;
    let opener = DefaultOpener::new(&config.http)?;

    let head = runtime()?.block_on(async {
        let mut source = opener.open(location).await?;
        source.next_chunk().await
    })?;

    match head.as_deref().and_then(sniff_version) {
        Some(version) => println!("{}", version),
        None => println!("unknown"),
    }
    Ok(())
}
