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

#![allow(dead_code)]

use cgi_probe::{BodyBytes, FormData, Params, RequestMetadata, decode::decode};
use std::sync::Once;

static START: Once = Once::new();

/// Setup function that is only run once, even if called multiple times.
pub fn setup() {
    START.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    });
}

/// Decodes `body` as a `POST` with the given content type.
pub fn post(content_type: &str, body: &[u8]) -> FormData {
    let params = Params::default()
        .request_method("POST")
        .content_type(content_type)
        .content_length(body.len());
    let meta = RequestMetadata::from_params(&params);
    decode(&meta, &BodyBytes::complete(body.to_vec()))
}
