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

//! ctsync command line interface.
//!
//! # Usage
//!
//! ```bash
//! # One budgeted invocation into a snapshot file
//! ctsync sync --type sdtm --max-writes 4000 --store sdtm.json
//!
//! # Resume after the last written term
//! ctsync sync --type sdtm --resume-group C66731 --resume-leaf M --store sdtm.json
//!
//! # Whole document, re-invoking with each resume token
//! ctsync sync --type adam --until-done --store adam.json
//!
//! # Debug logging
//! RUST_LOG=ctsync=debug ctsync sync --type sdtm --source ./SDTM_Terminology.odm.xml
//! ```

use clap::Parser;
use ctsync_cli::cli::Commands;
use ctsync_cli::logging::log_filter;
use std::process::ExitCode;

/// ctsync - CDISC controlled terminology synchronization
#[derive(Parser)]
#[command(name = "ctsync")]
#[command(author, version, long_about = None)]
#[command(about = "ctsync - CDISC controlled terminology synchronization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
