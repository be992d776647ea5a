// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::review_mode::ReviewMode;

pub const CONFIG_FILE_NAME: &str = "listencards.toml";

const DEFAULT_USER: &str = "local";

const DEFAULT_PORT: u16 = 8000;

/// Per-collection settings, read from `listencards.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Whose progress to load and save.
    pub user: String,
    /// How the browsing list is ordered.
    pub review_mode: ReviewMode,
    /// Default content feed for `sync`: a path relative to the collection,
    /// or an http(s) URL.
    pub feed: Option<String>,
    /// Port of the study server.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            review_mode: ReviewMode::default(),
            feed: None,
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Load the configuration in `directory`, or the defaults if there is
    /// no configuration file.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE_NAME);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE_NAME}, using defaults.");
            return Ok(Self::default());
        }
        let content = read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(content)?;
        if config.user.trim().is_empty() {
            return fail("user must not be empty.");
        }
        Ok(config)
    }
}
