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

//! Inbound CGI request: metadata plus the input channel.
//!
//! The body is read exactly once, in full, by [`Request::read_body`] (or
//! [`Request::read_body_async`] with the `runtime-tokio` feature). Both
//! consume the request so the channel cannot be read a second time.
//! Read errors never escape: they end up in
//! [`ReadStatus::Failed`](crate::body::ReadStatus::Failed) together with
//! whatever was received before the error.

use crate::{
    body::{BodyBytes, ReadStatus},
    meta::RequestMetadata,
};
use std::io::{self, Read};
use tracing::{debug, warn};

/// CGI request.
pub struct Request<'a, I> {
    meta: &'a RequestMetadata,
    stdin: I,
}

impl<'a, I> Request<'a, I> {
    pub fn new(meta: &'a RequestMetadata, stdin: I) -> Self {
        Self { meta, stdin }
    }

    /// How many bytes to ask the channel for: the declared length capped at
    /// `limit`, or one byte past `limit` when no length was declared so an
    /// oversized body can be told apart from one of exactly `limit` bytes.
    fn read_cap(&self, limit: usize) -> u64 {
        let limit = limit as u64;
        match self.meta.content_length() {
            Some(declared) => declared.min(limit),
            None => limit.saturating_add(1),
        }
    }

    fn finish(&self, mut buf: Vec<u8>, result: io::Result<usize>, limit: usize) -> BodyBytes {
        let declared = self.meta.content_length();

        let status = match result {
            Err(err) => {
                warn!(
                    expected = declared,
                    received = buf.len(),
                    error = %err,
                    "Request body read failed."
                );
                ReadStatus::Failed {
                    expected: declared,
                    received: buf.len(),
                    reason: err.to_string(),
                }
            }
            Ok(_) => match declared {
                Some(declared) if (buf.len() as u64) < declared.min(limit as u64) => {
                    warn!(
                        expected = declared,
                        received = buf.len(),
                        "Input channel ended before CONTENT_LENGTH bytes."
                    );
                    ReadStatus::Failed {
                        expected: Some(declared),
                        received: buf.len(),
                        reason: "unexpected end of input".to_string(),
                    }
                }
                Some(declared) if declared > limit as u64 => {
                    warn!(declared, limit, "Request body exceeds limit, truncated.");
                    ReadStatus::Truncated {
                        declared: Some(declared),
                        limit,
                    }
                }
                None if buf.len() > limit => {
                    buf.truncate(limit);
                    warn!(limit, "Request body without length exceeds limit, truncated.");
                    ReadStatus::Truncated {
                        declared: None,
                        limit,
                    }
                }
                _ => ReadStatus::Complete,
            },
        };

        debug!(received = buf.len(), ?status, "Read request body.");
        BodyBytes::new(buf, status)
    }
}

impl<I: Read> Request<'_, I> {
    /// Reads the body from the input channel.
    ///
    /// With a declared `CONTENT_LENGTH` never reads past it; without one,
    /// reads until the channel yields no more bytes. Never reads more than
    /// `limit` bytes of payload.
    pub fn read_body(mut self, limit: usize) -> BodyBytes {
        let cap = self.read_cap(limit);
        let mut buf = Vec::new();
        let result = (&mut self.stdin).take(cap).read_to_end(&mut buf);
        self.finish(buf, result, limit)
    }
}

#[cfg(feature = "runtime-tokio")]
impl<I: tokio::io::AsyncRead + Unpin> Request<'_, I> {
    /// Async variant of [`Request::read_body`], same semantics.
    pub async fn read_body_async(mut self, limit: usize) -> BodyBytes {
        use tokio::io::AsyncReadExt;

        let cap = self.read_cap(limit);
        let mut buf = Vec::new();
        let result = (&mut self.stdin).take(cap).read_to_end(&mut buf).await;
        self.finish(buf, result, limit)
    }
}
