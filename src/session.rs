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

//! Session identifier issuance through a cookie.
//!
//! There is no session store. A session is only an id: either the one the
//! client sent back in its cookie, or a freshly generated one that must be
//! handed to the client with a `Set-Cookie` header. Clearing a session
//! mints a new id; the old one is not invalidated anywhere because nothing
//! ever looks it up.

use crate::{
    config::SessionConfig,
    id::{GenerateSessionId, RandomSessionId},
};
use std::fmt;
use tracing::debug;

/// The session of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub is_new: bool,
}

/// A `Set-Cookie` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub max_age: Option<u64>,
    pub http_only: bool,
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={max_age}")?;
        }
        Ok(())
    }
}

/// Resolves and issues session ids.
#[derive(Debug, Clone)]
pub struct SessionManager<G = RandomSessionId> {
    generator: G,
    config: SessionConfig,
}

impl SessionManager {
    /// Manager with random ids.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_generator(config, RandomSessionId)
    }
}

impl<G: GenerateSessionId> SessionManager<G> {
    pub fn with_generator(config: SessionConfig, generator: G) -> Self {
        Self { generator, config }
    }

    /// Picks up the session from the `Cookie` header, or starts a new one.
    ///
    /// Only the first cookie with the session name counts. If its value is
    /// empty a new session is started.
    pub fn resolve(&mut self, cookie_header: Option<&str>) -> Session {
        let existing = cookie_header
            .and_then(|header| find_cookie(header, &self.config.cookie_name))
            .filter(|id| !id.is_empty());

        match existing {
            Some(id) => {
                debug!(id, "Continuing session.");
                Session {
                    id: id.to_string(),
                    is_new: false,
                }
            }
            None => self.issue(),
        }
    }

    /// Replaces the current session with a brand new one.
    pub fn clear(&mut self, session: &Session) -> Session {
        debug!(old = %session.id, "Clearing session.");
        self.issue()
    }

    /// The cookie to send for `session`, `None` unless it is new.
    pub fn set_cookie(&self, session: &Session) -> Option<SetCookie> {
        session.is_new.then(|| SetCookie {
            name: self.config.cookie_name.clone(),
            value: session.id.clone(),
            path: Some(self.config.path.clone()).filter(|path| !path.is_empty()),
            max_age: Some(self.config.max_age_secs),
            http_only: self.config.http_only,
        })
    }

    fn issue(&mut self) -> Session {
        let id = self.generator.generate();
        debug!(id = %id, "Issued new session.");
        Session { id, is_new: true }
    }
}

/// Value of the first `name=value` segment whose name is exactly `name`.
fn find_cookie<'h>(header: &'h str, name: &str) -> Option<&'h str> {
    header
        .split(';')
        .map(str::trim)
        .filter_map(|segment| segment.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
