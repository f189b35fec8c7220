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

//! CLI command definitions and argument parsing.

use crate::commands::{self, SyncArgs};
use crate::error::CliError;
use clap::Subcommand;
use std::path::PathBuf;

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronize one terminology type into a document store
    ///
    /// Prints one JSON response per invocation. With `--until-done` the
    /// returned resume token is fed back until the document is finished.
    Sync {
        /// Terminology type (sdtm, cdash, adam, send, define-xml, protocol, glossary)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        terminology_type: String,

        /// Upsert budget per invocation (clamped to the configured bounds)
        #[arg(short, long, allow_negative_numbers = true)]
        max_writes: Option<i64>,

        /// Codelist key of the last written term
        #[arg(long, requires = "resume_leaf")]
        resume_group: Option<String>,

        /// Coded value of the last written term
        #[arg(long, requires = "resume_group")]
        resume_leaf: Option<String>,

        /// Source URL or path, overriding the configured location
        #[arg(short, long, value_name = "URL|PATH")]
        source: Option<String>,

        /// JSON snapshot file used as the document store
        #[arg(long, value_name = "FILE", env = "CTSYNC_STORE")]
        store: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long, value_name = "FILE", env = "CTSYNC_CONFIG")]
        config: Option<PathBuf>,

        /// Keep invoking until the document is finished
        #[arg(long)]
        until_done: bool,
    },

    /// Print the version date found in a terminology file header
    Sniff {
        /// Source URL or path
        #[arg(value_name = "URL|PATH")]
        location: String,

        /// TOML configuration file
        #[arg(short, long, value_name = "FILE", env = "CTSYNC_CONFIG")]
        config: Option<PathBuf>,
    },

    /// List terminology types and their source locations
    Types {
        /// TOML configuration file
        #[arg(short, long, value_name = "FILE", env = "CTSYNC_CONFIG")]
        config: Option<PathBuf>,
    },
}

impl Commands {
    /// Execute the command.
    pub fn execute(self) -> Result<(), CliError> {
        match self {
            Commands::Sync {
                terminology_type,
                max_writes,
                resume_group,
                resume_leaf,
                source,
                store,
                config,
                until_done,
            } => commands::sync(SyncArgs {
                terminology_type,
                max_writes,
                resume_group,
                resume_leaf,
                source,
                store,
                config,
                until_done,
            }),
            Commands::Sniff { location, config } => commands::sniff(&location, config.as_deref()),
            Commands::Types { config } => commands::types(config.as_deref()),
        }
    }
}
