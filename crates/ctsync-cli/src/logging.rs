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

//! Log filter selection.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset, empty or unparsable.
pub const DEFAULT_LOG_FILTER: &str = "ctsync=info";

/// Filter from a `RUST_LOG` value, falling back to [`DEFAULT_LOG_FILTER`].
pub fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|spec| !spec.trim().is_empty())
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_value_wins() {
        let filter = log_filter(Some("ctsync=debug")).to_string();
        assert!(filter.contains("ctsync=debug"), "{}", filter);
        assert!(!filter.contains("info"), "{}", filter);
    }

    #[test]
    fn test_default_when_unset_or_invalid() {
        assert_eq!(log_filter(None).to_string(), DEFAULT_LOG_FILTER);
        assert_eq!(log_filter(Some("  ")).to_string(), DEFAULT_LOG_FILTER);
        assert_eq!(log_filter(Some("ctsync=loud")).to_string(), DEFAULT_LOG_FILTER);
    }
}
