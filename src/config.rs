// Copyright 2022 jmjoy
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

//! Runtime configuration.
//!
//! Every field has a default, so a probe without a config file behaves
//! exactly as documented. A file, when present, is TOML and may set any
//! subset of fields:
//!
//! ```toml
//! max_body_bytes = 1048576
//!
//! [preview]
//! body_bytes = 500
//!
//! [session]
//! max_age_secs = 600
//! ```

use crate::{ProbeError, ProbeResult, Params};
use serde::Deserialize;
use std::{fs, path::Path};

/// Names the config file to load.
pub const CONFIG_ENV: &str = "CGI_PROBE_CONFIG";

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound on the body bytes read from the input channel.
    pub max_body_bytes: usize,
    pub preview: PreviewConfig,
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_body_bytes: 16 * 1024 * 1024,
            preview: PreviewConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// How much of the raw data the report shows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Leading body bytes shown in the escaped body preview.
    pub body_bytes: usize,
    /// Leading body bytes shown in the hex dump of non UTF-8 bodies.
    pub hex_bytes: usize,
    /// Leading characters shown for each uploaded file.
    pub file_chars: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            body_bytes: 500,
            hex_bytes: 100,
            file_chars: 200,
        }
    }
}

/// Session cookie attributes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub path: String,
    pub max_age_secs: u64,
    pub http_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "SESSIONID".to_string(),
            path: "/".to_string(),
            max_age_secs: 3600,
            http_only: true,
        }
    }
}

impl Config {
    /// Parses a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ProbeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ProbeError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the file named by `CGI_PROBE_CONFIG`, defaults when unset.
    pub fn from_params(params: &Params<'_>) -> ProbeResult<Self> {
        match params.var(CONFIG_ENV).filter(|path| !path.is_empty()) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
