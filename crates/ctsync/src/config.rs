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

//! Configuration.
//!
//! Every field has a default, so an empty TOML file is a valid configuration:
//!
//! ```toml
//! safety_margin = 10
//!
//! [budget]
//! min = 100
//! max = 20000
//! default = 4000
//!
//! [sources]
//! sdtm = "https://mirror.example.org/SDTM%20Terminology.odm.xml"
//!
//! [http]
//! timeout_secs = 120
//!
//! [parser]
//! max_depth = 256
//! ```

use ctsync_core::scheduler::DEFAULT_SAFETY_MARGIN;
use ctsync_core::{BudgetLimits, SyncError, SyncResult, TerminologyType};
use ctsync_xml::ParserConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level synchronization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Bounds for the per-invocation write budget.
    pub budget: BudgetLimits,
    /// Headroom kept below the store's atomic batch ceiling.
    pub safety_margin: usize,
    /// Source location overrides keyed by terminology type wire name.
    pub sources: BTreeMap<String, String>,
    pub http: HttpConfig,
    pub parser: ParserSettings,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            budget: BudgetLimits::default(),
            safety_margin: DEFAULT_SAFETY_MARGIN,
            sources: BTreeMap::new(),
            http: HttpConfig::default(),
            parser: ParserSettings::default(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    /// Read size for local files.
    pub file_chunk_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            connect_timeout_secs: 10,
            user_agent: format!("ctsync/{}", env!("CARGO_PKG_VERSION")),
            file_chunk_size: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserSettings {
    pub max_depth: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            max_depth: ParserConfig::default().max_depth,
        }
    }
}

impl From<&ParserSettings> for ParserConfig {
    fn from(settings: &ParserSettings) -> Self {
        ParserConfig {
            max_depth: settings.max_depth,
            ..ParserConfig::default()
        }
    }
}

impl SyncConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> SyncResult<Self> {
        let config: SyncConfig = toml::from_str(s).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SyncError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if !self.budget.is_valid() {
            return Err(SyncError::Config(format!(
                "invalid budget bounds: min {} max {}",
                self.budget.min, self.budget.max
            )));
        }
        for name in self.sources.keys() {
            name.parse::<TerminologyType>().map_err(|_| {
                SyncError::Config(format!("unknown terminology type in [sources]: {}", name))
            })?;
        }
        if self.parser.max_depth == 0 {
            return Err(SyncError::Config("parser.max_depth must be positive".into()));
        }
        Ok(())
    }

    /// Location to download `terminology_type` from.
    pub fn source_url(&self, terminology_type: TerminologyType) -> String {
        self.sources
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(terminology_type.as_str()))
            .map(|(_, url)| url.clone())
            .unwrap_or_else(|| terminology_type.default_source_url().to_string())
    }
}
