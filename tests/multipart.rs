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

use cgi_probe::{DecodeError, DecodeNote, DecodeStatus, FieldValue, decode::SkipReason};

mod common;

const BOUNDARY: &str = "----WebKitFormBoundary7MA4YWxkTrZu0gW";

fn content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Builds a multipart body from `(headers, payload)` parts with the given line ending.
fn body(parts: &[(&str, &[u8])], eol: &str) -> Vec<u8> {
    let mut body = Vec::new();
    for (headers, payload) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}{eol}").as_bytes());
        for line in headers.lines() {
            body.extend_from_slice(format!("{line}{eol}").as_bytes());
        }
        body.extend_from_slice(eol.as_bytes());
        body.extend_from_slice(payload);
        body.extend_from_slice(eol.as_bytes());
    }
    body.extend_from_slice(format!("--{BOUNDARY}--{eol}").as_bytes());
    body
}

#[test]
fn unique_names_give_one_field_each() {
    common::setup();

    let body = body(
        &[
            (r#"Content-Disposition: form-data; name="test_data""#, b"Sample session data"),
            (r#"Content-Disposition: form-data; name="notes""#, b"line one\r\nline two"),
            (r#"Content-Disposition: form-data; name="action""#, b"set_data"),
        ],
        "\r\n",
    );
    let form = common::post(&content_type(), &body);

    assert_eq!(form.status, DecodeStatus::Decoded);
    assert!(form.notes.is_empty());
    assert_eq!(form.fields.len(), 3);
    assert_eq!(form.fields.text("test_data"), Some("Sample session data"));
    assert_eq!(form.fields.text("notes"), Some("line one\r\nline two"));
    assert_eq!(form.fields.text("action"), Some("set_data"));
}

#[test]
fn duplicate_names_keep_last_value() {
    common::setup();

    let body = body(
        &[
            (r#"Content-Disposition: form-data; name="tag""#, b"first"),
            (r#"Content-Disposition: form-data; name="other""#, b"x"),
            (r#"Content-Disposition: form-data; name="tag""#, b"last"),
        ],
        "\r\n",
    );
    let form = common::post(&content_type(), &body);

    assert_eq!(form.fields.len(), 2);
    assert_eq!(form.fields.text("tag"), Some("last"));
}

#[test]
fn empty_filename_is_still_a_file() {
    common::setup();

    let body = body(
        &[(
            "Content-Disposition: form-data; name=\"upload\"; filename=\"\"\nContent-Type: application/octet-stream",
            b"",
        )],
        "\r\n",
    );
    let form = common::post(&content_type(), &body);

    let file = form.fields.get("upload").and_then(FieldValue::as_file).unwrap();
    assert_eq!(file.filename, "");
    assert_eq!(file.media_type, "application/octet-stream");
    assert!(file.content.is_empty());
}

#[test]
fn binary_payload_is_byte_exact() {
    common::setup();

    let mut payload = (0u8..=255).collect::<Vec<u8>>();
    payload.extend_from_slice(b"\r\n\r\n--not-the-boundary\r\n\x00\x00");
    payload.extend_from_slice(b"\r\n");

    let body = body(
        &[
            (r#"Content-Disposition: form-data; name="caption""#, b"a picture"),
            (
                "Content-Disposition: form-data; name=\"image\"; filename=\"pic.png\"\nContent-Type: image/png",
                &payload,
            ),
        ],
        "\r\n",
    );
    let form = common::post(&content_type(), &body);

    let file = form.fields.get("image").and_then(FieldValue::as_file).unwrap();
    assert_eq!(file.filename, "pic.png");
    assert_eq!(file.media_type, "image/png");
    assert_eq!(&file.content[..], &payload[..]);
    assert_eq!(form.fields.text("caption"), Some("a picture"));
}

#[test]
fn bare_lf_line_endings_are_accepted() {
    common::setup();

    let body = body(
        &[
            (r#"Content-Disposition: form-data; name="a""#, b"1"),
            ("Content-Disposition: form-data; name=\"f\"; filename=\"f.txt\"", b"text\nfile"),
        ],
        "\n",
    );
    let form = common::post(&content_type(), &body);

    assert_eq!(form.fields.text("a"), Some("1"));
    let file = form.fields.get("f").and_then(FieldValue::as_file).unwrap();
    assert_eq!(&file.content[..], b"text\nfile");
    assert_eq!(file.media_type, "text/plain");
}

#[test]
fn preamble_and_epilogue_are_ignored() {
    common::setup();

    let mut framed = b"This is the preamble.\r\n".to_vec();
    framed.extend(body(&[(r#"Content-Disposition: form-data; name="a""#, b"1")], "\r\n"));
    framed.extend_from_slice(b"This is the epilogue.\r\n");

    let form = common::post(&content_type(), &framed);
    assert_eq!(form.fields.len(), 1);
    assert_eq!(form.fields.text("a"), Some("1"));
}

#[test]
fn quoted_boundary() {
    common::setup();

    let body = body(&[(r#"Content-Disposition: form-data; name="a""#, b"1")], "\r\n");
    let form = common::post(&format!("multipart/form-data; boundary=\"{BOUNDARY}\""), &body);
    assert_eq!(form.fields.text("a"), Some("1"));
}

#[test]
fn invalid_utf8_text_is_decoded_lossily() {
    common::setup();

    let body = body(&[(r#"Content-Disposition: form-data; name="t""#, b"caf\xe9")], "\r\n");
    let form = common::post(&content_type(), &body);

    assert_eq!(form.fields.text("t"), Some("caf\u{fffd}"));
    assert_eq!(
        form.notes,
        vec![DecodeNote::LossyText {
            name: "t".to_string()
        }]
    );
    assert!(!form.is_failure());
}

#[test]
fn missing_boundary_is_a_failure() {
    common::setup();

    let body = body(&[(r#"Content-Disposition: form-data; name="a""#, b"1")], "\r\n");
    let form = common::post("multipart/form-data", &body);

    assert!(form.fields.is_empty());
    assert!(form.is_failure());
    assert_eq!(form.status, DecodeStatus::Failed(DecodeError::MissingBoundary));
}

#[test]
fn wrong_boundary_is_a_failure() {
    common::setup();

    let body = body(&[(r#"Content-Disposition: form-data; name="a""#, b"1")], "\r\n");
    let form = common::post("multipart/form-data; boundary=something-else", &body);

    assert!(form.fields.is_empty());
    assert_eq!(form.status, DecodeStatus::Failed(DecodeError::Unframed));
}

#[test]
fn long_boundary_is_accepted() {
    common::setup();

    let boundary = "x".repeat(100);
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\n1\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"b\"\r\n\r\n2\r\n--{boundary}--\r\n"
    );
    let form = common::post(
        &format!("multipart/form-data; boundary={boundary}"),
        body.as_bytes(),
    );

    assert_eq!(form.status, DecodeStatus::Decoded);
    assert_eq!(form.fields.text("a"), Some("1"));
    assert_eq!(form.fields.text("b"), Some("2"));
}

#[test]
fn part_without_name_is_skipped() {
    common::setup();

    let body = body(
        &[
            (r#"Content-Disposition: form-data; name="before""#, b"1"),
            (r#"Content-Disposition: form-data; filename="orphan.txt""#, b"lost"),
            (r#"Content-Disposition: form-data; name="after""#, b"2"),
        ],
        "\r\n",
    );
    let form = common::post(&content_type(), &body);

    assert_eq!(form.status, DecodeStatus::Decoded);
    assert_eq!(form.fields.len(), 2);
    assert_eq!(form.fields.text("before"), Some("1"));
    assert_eq!(form.fields.text("after"), Some("2"));
    assert_eq!(
        form.notes,
        vec![DecodeNote::SkippedPart {
            index: 1,
            reason: SkipReason::MissingName
        }]
    );
}

#[test]
fn part_without_header_block_is_skipped() {
    common::setup();

    let body = format!(
        "--{BOUNDARY}\r\nno blank line in this part\r\n\
         --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"kept\"\r\n\r\nyes\r\n--{BOUNDARY}--\r\n"
    );
    let form = common::post(&content_type(), body.as_bytes());

    assert_eq!(form.status, DecodeStatus::Decoded);
    assert_eq!(form.fields.len(), 1);
    assert_eq!(form.fields.text("kept"), Some("yes"));
    assert_eq!(
        form.notes,
        vec![DecodeNote::SkippedPart {
            index: 0,
            reason: SkipReason::NoHeaderBlock
        }]
    );
}

#[test]
fn lf_framed_payload_keeps_trailing_carriage_return() {
    common::setup();

    let body = body(
        &[(
            "Content-Disposition: form-data; name=\"f\"; filename=\"cr.bin\"",
            b"data\r",
        )],
        "\n",
    );
    let form = common::post(&content_type(), &body);

    let file = form.fields.get("f").and_then(FieldValue::as_file).unwrap();
    assert_eq!(&file.content[..], b"data\r");
}
