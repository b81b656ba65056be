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

//! `multipart/form-data` framing.
//!
//! The body is treated as opaque bytes. Only the header block of each part
//! is interpreted as text; payloads are sliced out of the body buffer
//! untouched, so binary uploads survive byte for byte. Both CRLF and bare
//! LF line endings are accepted around delimiters and header blocks.

use crate::{
    decode::{DecodeNote, SkipReason},
    error::DecodeError,
    form::{FieldCollection, FieldValue, FileField},
    meta::header_param,
};
use bytes::Bytes;
use tracing::debug;

/// Longest boundary accepted, in bytes.
pub(crate) const MAX_BOUNDARY_LEN: usize = 201;

const DEFAULT_MEDIA_TYPE: &str = "text/plain";

/// Checks a `boundary` content type parameter.
///
/// Accepts 1 to [`MAX_BOUNDARY_LEN`] printable ASCII characters, the last
/// one not a space.
pub(crate) fn validate_boundary(boundary: Option<String>) -> Result<String, DecodeError> {
    let Some(boundary) = boundary else {
        return Err(DecodeError::MissingBoundary);
    };

    let valid = match boundary.as_bytes() {
        [] => false,
        [.., last] => {
            boundary.len() <= MAX_BOUNDARY_LEN
                && boundary.bytes().all(|b| (b' '..=b'~').contains(&b))
                && *last != b' '
        }
    };

    if valid {
        Ok(boundary)
    } else {
        Err(DecodeError::InvalidBoundary { boundary })
    }
}

/// Splits `body` into parts and inserts every decodable part into `fields`.
///
/// Fails only when the body contains no delimiter at all. Parts without a
/// usable `Content-Disposition` are skipped and reported in `notes`.
pub(crate) fn decode_multipart(
    body: &Bytes, boundary: &str, fields: &mut FieldCollection, notes: &mut Vec<DecodeNote>,
) -> Result<(), DecodeError> {
    let delimiter = format!("--{boundary}").into_bytes();

    let mut pos = find_delimiter(body, &delimiter, 0).ok_or(DecodeError::Unframed)?;
    let crlf = trim_blanks(&body[pos + delimiter.len()..]).starts_with(b"\r\n");
    let mut index = 0;

    loop {
        let after = pos + delimiter.len();
        if body[after..].starts_with(b"--") {
            debug!(parts = index, "Reached close delimiter.");
            return Ok(());
        }

        let Some(part_start) = skip_line(body, after) else {
            notes.push(DecodeNote::MissingCloseDelimiter);
            return Ok(());
        };

        let next = find_delimiter(body, &delimiter, part_start);
        let part_end = strip_line_break(body, part_start, next.unwrap_or(body.len()), crlf);
        let part = body.slice(part_start..part_end);

        match decode_part(&part, index, notes) {
            Ok((name, value)) => {
                debug!(index, name = %name, file = value.is_file(), "Decoded part.");
                fields.insert(name, value);
            }
            Err(reason) => {
                debug!(index, %reason, "Skipped part.");
                notes.push(DecodeNote::SkippedPart { index, reason });
            }
        }
        index += 1;

        match next {
            Some(next) => pos = next,
            None => {
                notes.push(DecodeNote::MissingCloseDelimiter);
                return Ok(());
            }
        }
    }
}

/// Finds the next delimiter at or after `from`.
///
/// A delimiter only counts at the start of the body or of a line, and when
/// followed by `--`, a line break, optional whitespace before a line
/// break, or the end of the body.
fn find_delimiter(body: &[u8], delimiter: &[u8], from: usize) -> Option<usize> {
    if body.len() < delimiter.len() {
        return None;
    }

    (from..=body.len() - delimiter.len()).find(|&i| {
        (i == 0 || body[i - 1] == b'\n')
            && body[i..].starts_with(delimiter)
            && is_delimiter_end(&body[i + delimiter.len()..])
    })
}

fn is_delimiter_end(rest: &[u8]) -> bool {
    if rest.starts_with(b"--") {
        return true;
    }
    let rest = trim_blanks(rest);
    rest.is_empty() || rest.starts_with(b"\r\n") || rest.starts_with(b"\n")
}

fn trim_blanks(bytes: &[u8]) -> &[u8] {
    let blanks = bytes
        .iter()
        .take_while(|b| **b == b' ' || **b == b'\t')
        .count();
    &bytes[blanks..]
}

/// Returns the index just past the line break ending the delimiter line.
fn skip_line(body: &[u8], from: usize) -> Option<usize> {
    let rest = trim_blanks(&body[from..]);
    let start = body.len() - rest.len();
    if rest.starts_with(b"\r\n") {
        Some(start + 2)
    } else if rest.starts_with(b"\n") {
        Some(start + 1)
    } else {
        None
    }
}

/// Drops the single line break in front of `end`, it belongs to the framing.
///
/// With LF framing a trailing CR is payload, not part of the line break.
fn strip_line_break(body: &[u8], start: usize, end: usize, crlf: bool) -> usize {
    let part = &body[start..end];
    if crlf && part.ends_with(b"\r\n") {
        end - 2
    } else if part.ends_with(b"\n") {
        end - 1
    } else {
        end
    }
}

/// Splits a part at the first blank line into header text and payload offset.
fn split_part(part: &[u8]) -> Option<(&[u8], usize)> {
    if part.starts_with(b"\r\n") {
        return Some((&part[..0], 2));
    }
    if part.starts_with(b"\n") {
        return Some((&part[..0], 1));
    }

    let crlf = find(part, b"\r\n\r\n").map(|i| (i, i + 4));
    let lf = find(part, b"\n\n").map(|i| (i, i + 2));
    let (headers_end, payload_start) = match (crlf, lf) {
        (Some(crlf), Some(lf)) => {
            if crlf.0 <= lf.0 {
                crlf
            } else {
                lf
            }
        }
        (crlf, lf) => crlf.or(lf)?,
    };
    Some((&part[..headers_end], payload_start))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Header lines of a part as `(name, value)`, names as sent.
fn parse_headers(block: &[u8]) -> Vec<(String, String)> {
    String::from_utf8_lossy(block)
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn header<'h>(headers: &'h [(String, String)], name: &str) -> Option<&'h str> {
    headers
        .iter()
        .find(|(header_name, _)| header_name.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn decode_part(
    part: &Bytes, index: usize, notes: &mut Vec<DecodeNote>,
) -> Result<(String, FieldValue), SkipReason> {
    let (block, payload_start) = split_part(part).ok_or(SkipReason::NoHeaderBlock)?;
    let headers = parse_headers(block);

    let disposition =
        header(&headers, "Content-Disposition").ok_or(SkipReason::MissingDisposition)?;
    let name = header_param(disposition, "name").ok_or(SkipReason::MissingName)?;
    let payload = part.slice(payload_start..);

    let value = match header_param(disposition, "filename") {
        Some(filename) => FieldValue::File(FileField {
            filename,
            media_type: header(&headers, "Content-Type")
                .unwrap_or(DEFAULT_MEDIA_TYPE)
                .to_string(),
            content: payload,
        }),
        None => match std::str::from_utf8(&payload) {
            Ok(text) => FieldValue::Text(text.to_string()),
            Err(_) => {
                debug!(index, name = %name, "Text part is not valid UTF-8, decoding lossily.");
                notes.push(DecodeNote::LossyText { name: name.clone() });
                FieldValue::Text(String::from_utf8_lossy(&payload).into_owned())
            }
        },
    };

    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_part_prefers_first_blank_line() {
        let part = b"Content-Disposition: form-data; name=\"a\"\r\n\r\nx\n\ny";
        let (headers, start) = split_part(part).unwrap();
        assert_eq!(headers, b"Content-Disposition: form-data; name=\"a\"");
        assert_eq!(&part[start..], b"x\n\ny");

        let part = b"Content-Disposition: form-data; name=\"a\"\n\nx\r\n\r\ny";
        let (_, start) = split_part(part).unwrap();
        assert_eq!(&part[start..], b"x\r\n\r\ny");

        assert!(split_part(b"Content-Disposition: form-data").is_none());
    }

    #[test]
    fn test_delimiter_must_start_a_line() {
        let body = b"x--abc\r\n--abc\r\n";
        assert_eq!(find_delimiter(body, b"--abc", 0), Some(8));
        assert_eq!(find_delimiter(b"--abcdef\r\n", b"--abc", 0), None);
        assert_eq!(find_delimiter(b"--abc--", b"--abc", 0), Some(0));
        assert_eq!(find_delimiter(b"--abc  \n", b"--abc", 0), Some(0));
    }

    #[test]
    fn test_strip_line_break_follows_framing() {
        let body = b"ab\r\n";
        assert_eq!(strip_line_break(body, 0, body.len(), true), 2);
        assert_eq!(strip_line_break(body, 0, body.len(), false), 3);
        assert_eq!(strip_line_break(b"ab\n", 0, 3, true), 2);
        assert_eq!(strip_line_break(b"ab", 0, 2, false), 2);
    }

    #[test]
    fn test_validate_boundary() {
        assert_eq!(validate_boundary(None), Err(DecodeError::MissingBoundary));
        assert!(matches!(
            validate_boundary(Some(String::new())),
            Err(DecodeError::InvalidBoundary { .. })
        ));
        assert!(matches!(
            validate_boundary(Some("x".repeat(MAX_BOUNDARY_LEN + 1))),
            Err(DecodeError::InvalidBoundary { .. })
        ));
        assert!(matches!(
            validate_boundary(Some("abc ".into())),
            Err(DecodeError::InvalidBoundary { .. })
        ));
        assert!(matches!(
            validate_boundary(Some("a\u{e9}b".into())),
            Err(DecodeError::InvalidBoundary { .. })
        ));
        assert_eq!(validate_boundary(Some("abc".into())), Ok("abc".into()));
        assert_eq!(
            validate_boundary(Some("x".repeat(100))),
            Ok("x".repeat(100))
        );
        assert_eq!(
            validate_boundary(Some("a b".into())),
            Ok("a b".into())
        );
    }

    #[test]
    fn test_part_without_disposition_is_skipped() {
        let body = Bytes::from_static(
            b"--b\r\nContent-Type: text/plain\r\n\r\nlost\r\n--b\r\nContent-Disposition: form-data; name=\"kept\"\r\n\r\nyes\r\n--b--\r\n",
        );
        let mut fields = FieldCollection::new();
        let mut notes = Vec::new();
        decode_multipart(&body, "b", &mut fields, &mut notes).unwrap();

        assert_eq!(fields.len(), 1);
        assert_eq!(fields.text("kept"), Some("yes"));
        assert_eq!(
            notes,
            vec![DecodeNote::SkippedPart {
                index: 0,
                reason: SkipReason::MissingDisposition
            }]
        );
    }

    #[test]
    fn test_unterminated_body_keeps_parts() {
        let body = Bytes::from_static(
            b"--b\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n",
        );
        let mut fields = FieldCollection::new();
        let mut notes = Vec::new();
        decode_multipart(&body, "b", &mut fields, &mut notes).unwrap();

        assert_eq!(fields.text("a"), Some("1"));
        assert_eq!(notes, vec![DecodeNote::MissingCloseDelimiter]);
    }

    #[test]
    fn test_body_without_delimiter_is_unframed() {
        let body = Bytes::from_static(b"just some bytes");
        let mut fields = FieldCollection::new();
        let mut notes = Vec::new();
        assert_eq!(
            decode_multipart(&body, "b", &mut fields, &mut notes),
            Err(DecodeError::Unframed)
        );
        assert!(fields.is_empty());
    }
}
