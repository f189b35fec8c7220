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

//! ctsync command-line library.
//!
//! # Commands
//!
//! - **sync**: stream a terminology file into a JSON snapshot store, one
//!   budgeted invocation at a time or `--until-done`
//! - **sniff**: print the version date from a terminology file header
//! - **types**: list terminology types and their source locations

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

pub use error::CliError;
