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

//! Binary-safe previews of raw bytes.

use std::fmt::Write as _;

/// A preview and whether the source was longer than what is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub text: String,
    pub truncated: bool,
}

/// Shows the first `max` bytes, printable ASCII as is and every other byte as `\xNN`.
pub fn escaped(bytes: &[u8], max: usize) -> Preview {
    let shown = &bytes[..bytes.len().min(max)];
    let mut text = String::with_capacity(shown.len());
    for &byte in shown {
        if (0x20..0x7f).contains(&byte) {
            text.push(byte as char);
        } else {
            let _ = write!(text, "\\x{byte:02x}");
        }
    }
    Preview {
        text,
        truncated: bytes.len() > max,
    }
}

/// Space separated lowercase hex of the first `max` bytes.
pub fn hex_dump(bytes: &[u8], max: usize) -> String {
    bytes
        .iter()
        .take(max)
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The first `max_chars` characters of the lossy UTF-8 decoding of `bytes`.
pub fn text(bytes: &[u8], max_chars: usize) -> Preview {
    let decoded = String::from_utf8_lossy(bytes);
    let mut chars = decoded.chars();
    let text = chars.by_ref().take(max_chars).collect::<String>();
    Preview {
        text,
        truncated: chars.next().is_some(),
    }
}
