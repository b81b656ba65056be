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

//! CGI response written to the output channel.
//!
//! A CGI response is a block of `Name: value` lines, a blank line, then the
//! body. Header values are checked for line breaks when inserted, so the
//! block can never be split by a value.

use crate::{ProbeError, ProbeResult};
use std::{
    fmt::{self, Debug},
    io::Write,
};

/// Output of the script: headers and body.
#[derive(Default, Clone)]
pub struct Response {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    /// New response with a `Content-Type` header.
    pub fn new(content_type: &str) -> ProbeResult<Self> {
        let mut response = Self::default();
        response.insert_header("Content-Type", content_type)?;
        Ok(response)
    }

    /// Appends a header line.
    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) -> ProbeResult<()> {
        let value = value.into();
        if [name, value.as_str()]
            .iter()
            .any(|s| s.contains(['\r', '\n']))
        {
            return Err(ProbeError::HeaderValue {
                name: name.to_string(),
            });
        }
        self.headers.push((name.to_string(), value));
        Ok(())
    }

    pub fn append_body(&mut self, body: impl AsRef<[u8]>) {
        self.body.extend_from_slice(body.as_ref());
    }

    /// First value of a header, names compare case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header_name, _)| header_name.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Writes the header block, the blank line and the body.
    pub fn write_to<W: Write>(&self, mut writer: W) -> ProbeResult<()> {
        for (name, value) in &self.headers {
            write!(writer, "{name}: {value}\r\n")?;
        }
        writer.write_all(b"\r\n")?;
        writer.write_all(&self.body)?;
        writer.flush()?;
        Ok(())
    }
}

impl Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("Response")
            .field("headers", &self.headers)
            .field("body", &format_args!("{} bytes", self.body.len()))
            .finish()
    }
}

#[cfg(feature = "http")]
impl TryFrom<Response> for http::Response<Vec<u8>> {
    type Error = http::Error;

    fn try_from(response: Response) -> Result<Self, Self::Error> {
        let mut builder = http::Response::builder();
        for (name, value) in &response.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(response.body)
    }
}
