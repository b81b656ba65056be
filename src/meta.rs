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

//! Request metadata derived from the CGI params.
//!
//! [`RequestMetadata`] is created once per invocation and handed by
//! reference to the body reader, the decoder and the session manager.

use crate::Params;
use tracing::warn;

pub(crate) const URL_ENCODED: &str = "application/x-www-form-urlencoded";
pub(crate) const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Methods whose requests carry a body worth decoding.
const BODY_METHODS: [&str; 3] = ["POST", "PUT", "PATCH"];

/// How the request body is encoded, judged from `CONTENT_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEncoding {
    /// `application/x-www-form-urlencoded`, also assumed when no content type is sent.
    UrlEncoded,
    /// `multipart/form-data`.
    Multipart,
    /// Anything else, the body is not decoded.
    Unsupported,
}

/// Read-only snapshot of the request metadata for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    method: String,
    content_type: Option<String>,
    content_length: Option<u64>,
    cookie_header: Option<String>,
    query_string: String,
}

impl RequestMetadata {
    /// Builds the metadata from `REQUEST_METHOD`, `CONTENT_TYPE`,
    /// `CONTENT_LENGTH`, `HTTP_COOKIE` and `QUERY_STRING`.
    ///
    /// A missing method defaults to `GET`. A `CONTENT_LENGTH` that is not a
    /// non-negative integer is treated as absent.
    pub fn from_params(params: &Params<'_>) -> Self {
        let method = params
            .var("REQUEST_METHOD")
            .map(str::trim)
            .filter(|method| !method.is_empty())
            .unwrap_or("GET")
            .to_string();

        let content_length = params
            .var("CONTENT_LENGTH")
            .map(str::trim)
            .filter(|length| !length.is_empty())
            .and_then(|length| match length.parse::<u64>() {
                Ok(length) => Some(length),
                Err(_) => {
                    warn!(content_length = length, "Ignoring malformed CONTENT_LENGTH.");
                    None
                }
            });

        Self {
            method,
            content_type: params
                .var("CONTENT_TYPE")
                .filter(|content_type| !content_type.trim().is_empty())
                .map(ToString::to_string),
            content_length,
            cookie_header: params.var("HTTP_COOKIE").map(ToString::to_string),
            query_string: params.var("QUERY_STRING").unwrap_or_default().to_string(),
        }
    }

    /// The request method as sent by the server.
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Whether the method carries a body (`POST`, `PUT` or `PATCH`).
    pub fn has_body(&self) -> bool {
        BODY_METHODS
            .iter()
            .any(|method| self.method.eq_ignore_ascii_case(method))
    }

    #[inline]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    #[inline]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    #[inline]
    pub fn cookie_header(&self) -> Option<&str> {
        self.cookie_header.as_deref()
    }

    #[inline]
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Classifies the body encoding by content type prefix.
    pub fn form_encoding(&self) -> FormEncoding {
        match self.content_type() {
            None => FormEncoding::UrlEncoded,
            Some(content_type) => {
                let content_type = content_type.trim_start();
                if starts_with_ignore_case(content_type, URL_ENCODED) {
                    FormEncoding::UrlEncoded
                } else if starts_with_ignore_case(content_type, MULTIPART_FORM_DATA) {
                    FormEncoding::Multipart
                } else {
                    FormEncoding::Unsupported
                }
            }
        }
    }

    /// Looks up a parameter of the content type, e.g. `boundary`.
    pub fn content_type_param(&self, name: &str) -> Option<String> {
        self.content_type()
            .and_then(|content_type| header_param(content_type, name))
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Finds `name=value` among the `;` separated parameters of a header value.
///
/// Parameter names compare case-insensitively. Quoted values are unquoted,
/// honouring backslash escapes. The leading token (`form-data`,
/// `multipart/form-data`, ...) is never treated as a parameter.
pub(crate) fn header_param(value: &str, name: &str) -> Option<String> {
    split_params(value)
        .into_iter()
        .skip(1)
        .find_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| unquote(value.trim()))
        })
}

/// Splits on `;` outside of quoted strings.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (index, ch) in value.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&value[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .and_then(|value| value.strip_suffix('"'))
    else {
        return value.to_string();
    };

    let mut unquoted = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => unquoted.extend(chars.next()),
            ch => unquoted.push(ch),
        }
    }
    unquoted
}
