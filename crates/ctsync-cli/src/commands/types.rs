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

//! Types command - list terminology types

use super::load_config;
use crate::error::CliError;
use ctsync_core::TerminologyType;
use std::path::Path;

/// Print each terminology type with the location it syncs from.
pub fn types(config: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config)?;
    for terminology_type in TerminologyType::ALL {
        println!("{:<12} {}", terminology_type.as_str(), config.source_url(terminology_type));
    }
    Ok(())
}
