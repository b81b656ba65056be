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

//! Error types for the probe.
//!
//! Only failures that stop a response from being written are reported as
//! [`ProbeError`]. Everything that goes wrong while reading or decoding the
//! request is turned into a status value instead, see
//! [`ReadStatus`](crate::body::ReadStatus) and
//! [`DecodeStatus`](crate::decode::DecodeStatus).

use std::{io, path::PathBuf};

/// Result type alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Error types that can occur while running the probe.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Wapper of `std::io::Error`.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The configuration file could not be read.
    #[error("failed to read config file `{path}`")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for [`Config`](crate::Config).
    #[error("failed to parse config file `{path}`")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A response header would break the CGI header block.
    #[error("header `{name}` contains a line break")]
    HeaderValue { name: String },
}

/// Reasons a request body could not be decoded at all.
///
/// A decode error never aborts the process; it is carried in
/// [`DecodeStatus::Failed`](crate::decode::DecodeStatus::Failed) so the
/// page can tell a broken submission apart from an empty one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// `multipart/form-data` without a `boundary` parameter.
    #[error("multipart content type has no boundary parameter")]
    MissingBoundary,

    /// The boundary parameter is empty or longer than 70 characters.
    #[error("invalid multipart boundary `{boundary}`")]
    InvalidBoundary { boundary: String },

    /// The body never contains the boundary delimiter.
    #[error("multipart body contains no boundary delimiter")]
    Unframed,
}
