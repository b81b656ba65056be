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

#![warn(rust_2018_idioms)]
#![warn(clippy::dbg_macro, clippy::print_stdout)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Request introspection for CGI scripts.
//!
//! A front-end server runs the script once per request, passing metadata in
//! environment variables and the body on stdin. This crate decodes the body
//! into form fields (urlencoded or multipart, binary uploads included) and
//! keeps an opaque session id in a cookie.
//!
//! ```no_run
//! use cgi_probe::{Config, Params, RequestMetadata, SessionManager, decode, request::Request};
//! use std::io;
//!
//! let params = Params::from_env();
//! let meta = RequestMetadata::from_params(&params);
//!
//! let mut sessions = SessionManager::new(Default::default());
//! let session = sessions.resolve(meta.cookie_header());
//!
//! let body = Request::new(&meta, io::stdin().lock()).read_body(Config::default().max_body_bytes);
//! let form = decode::decode(&meta, &body);
//!
//! for (name, value) in &form.fields {
//!     eprintln!("{name}: {value:?}");
//! }
//! # let _ = session;
//! ```
//!
//! ## Features
//!
//! - `runtime-tokio`: `Request::read_body_async` over `tokio::io::AsyncRead`.
//! - `http`: convert a [`Response`] into `http::Response<Vec<u8>>`.

pub mod body;
pub mod config;
pub mod decode;
mod error;
pub mod form;
pub mod id;
pub mod meta;
mod multipart;
pub mod params;
pub mod preview;
pub mod report;
pub mod request;
pub mod response;
pub mod session;

pub use crate::{
    body::{BodyBytes, ReadStatus},
    config::Config,
    decode::{DecodeNote, DecodeStatus, FormData},
    error::*,
    form::{FieldCollection, FieldValue, FileField},
    meta::RequestMetadata,
    params::Params,
    response::Response,
    session::{Session, SessionManager},
};
