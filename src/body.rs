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

//! The raw request body and how reading it went.

use bytes::Bytes;
use std::{fmt, ops::Deref};

/// Outcome of reading the input channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStatus {
    /// Every expected byte was read.
    Complete,
    /// The body is longer than the configured limit; only `limit` bytes were read.
    ///
    /// `declared` is `None` when no `CONTENT_LENGTH` was sent.
    Truncated { declared: Option<u64>, limit: usize },
    /// The channel errored or ended before `expected` bytes arrived.
    Failed {
        expected: Option<u64>,
        received: usize,
        reason: String,
    },
}

impl ReadStatus {
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, ReadStatus::Complete)
    }
}

/// The complete raw request body, read once before decoding starts.
///
/// Backed by [`Bytes`], so file payloads handed out by the decoder are
/// slices of the same buffer rather than copies.
#[derive(Clone, PartialEq, Eq)]
pub struct BodyBytes {
    bytes: Bytes,
    status: ReadStatus,
}

impl BodyBytes {
    pub fn new(bytes: impl Into<Bytes>, status: ReadStatus) -> Self {
        Self {
            bytes: bytes.into(),
            status,
        }
    }

    /// A fully read body with the given content.
    pub fn complete(bytes: impl Into<Bytes>) -> Self {
        Self::new(bytes, ReadStatus::Complete)
    }

    /// The body of a request that carries none.
    pub fn empty() -> Self {
        Self::complete(Bytes::new())
    }

    #[inline]
    pub fn status(&self) -> &ReadStatus {
        &self.status
    }

    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl Deref for BodyBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.bytes
    }
}

impl fmt::Debug for BodyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyBytes")
            .field("len", &self.bytes.len())
            .field("status", &self.status)
            .finish()
    }
}
