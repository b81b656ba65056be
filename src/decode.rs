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

//! Request body decoding.
//!
//! [`decode`] never fails. Whatever goes wrong is reported through
//! [`FormData::status`] and [`FormData::notes`], so a caller can always
//! render what was recovered and say why the rest is missing.

use crate::{
    body::BodyBytes,
    error::DecodeError,
    form::{FieldCollection, FieldValue},
    meta::{FormEncoding, RequestMetadata},
    multipart,
};
use std::fmt;
use tracing::debug;
use url::form_urlencoded;

/// Overall result of decoding a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStatus {
    /// The body was decoded. The collection may still be empty.
    Decoded,
    /// The request method carries no body.
    NoBody,
    /// The body was empty.
    Empty,
    /// The content type is neither urlencoded nor multipart.
    Unsupported { content_type: String },
    /// The body is malformed, nothing was decoded.
    Failed(DecodeError),
}

impl DecodeStatus {
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, DecodeStatus::Failed(_))
    }
}

/// Why a multipart part was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No blank line separates headers from payload.
    NoHeaderBlock,
    /// The part has no `Content-Disposition` header.
    MissingDisposition,
    /// The disposition has no `name` attribute.
    MissingName,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::NoHeaderBlock => "no blank line after part headers",
            SkipReason::MissingDisposition => "missing Content-Disposition header",
            SkipReason::MissingName => "Content-Disposition has no name",
        })
    }
}

/// Non-fatal findings made while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeNote {
    /// Part number `index` (counting from zero) was dropped.
    SkippedPart { index: usize, reason: SkipReason },
    /// The text field `name` was not valid UTF-8 and was decoded lossily.
    LossyText { name: String },
    /// The body ended without the closing `--boundary--` line.
    MissingCloseDelimiter,
}

impl fmt::Display for DecodeNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeNote::SkippedPart { index, reason } => {
                write!(f, "part #{index} skipped: {reason}")
            }
            DecodeNote::LossyText { name } => {
                write!(f, "field `{name}` is not valid UTF-8, invalid bytes replaced")
            }
            DecodeNote::MissingCloseDelimiter => f.write_str("multipart body is not terminated"),
        }
    }
}

/// Fields decoded from a request body, with status and notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormData {
    pub fields: FieldCollection,
    pub status: DecodeStatus,
    pub notes: Vec<DecodeNote>,
}

impl FormData {
    fn with_status(status: DecodeStatus) -> Self {
        Self {
            fields: FieldCollection::new(),
            status,
            notes: Vec::new(),
        }
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }
}

/// Decodes the request body into form fields.
///
/// Bodies of methods other than `POST`, `PUT` and `PATCH` are not looked at.
pub fn decode(meta: &RequestMetadata, body: &BodyBytes) -> FormData {
    if !meta.has_body() {
        return FormData::with_status(DecodeStatus::NoBody);
    }
    if body.is_empty() {
        return FormData::with_status(DecodeStatus::Empty);
    }

    let encoding = meta.form_encoding();
    debug!(?encoding, len = body.len(), "Decoding request body.");

    match encoding {
        FormEncoding::UrlEncoded => {
            let mut form = FormData::with_status(DecodeStatus::Decoded);
            decode_urlencoded(body, &mut form.fields);
            form
        }
        FormEncoding::Multipart => {
            let boundary = match multipart::validate_boundary(meta.content_type_param("boundary"))
            {
                Ok(boundary) => boundary,
                Err(err) => return FormData::with_status(DecodeStatus::Failed(err)),
            };

            let mut form = FormData::with_status(DecodeStatus::Decoded);
            if let Err(err) =
                multipart::decode_multipart(body.bytes(), &boundary, &mut form.fields, &mut form.notes)
            {
                form.fields = FieldCollection::new();
                form.status = DecodeStatus::Failed(err);
            }
            form
        }
        FormEncoding::Unsupported => FormData::with_status(DecodeStatus::Unsupported {
            content_type: meta.content_type().unwrap_or_default().to_string(),
        }),
    }
}

/// Decodes a query string with the same rules as urlencoded bodies.
pub fn decode_query(query: &str) -> FieldCollection {
    let mut fields = FieldCollection::new();
    decode_urlencoded(query.as_bytes(), &mut fields);
    fields
}

/// `&` separated `key=value` pairs, percent-decoded, later keys win.
fn decode_urlencoded(input: &[u8], fields: &mut FieldCollection) {
    for (key, value) in form_urlencoded::parse(input) {
        fields.insert(key.into_owned(), FieldValue::Text(value.into_owned()));
    }
}
