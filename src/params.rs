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

//! CGI parameters snapshot and builder.
//!
//! A front-end server hands request metadata to a CGI script through the
//! process environment. `Params` captures that environment exactly once
//! with [`Params::from_env`]; nothing else in the crate reads environment
//! variables. Tests build the same value with the builder methods.

use std::{
    borrow::Cow,
    collections::HashMap,
    env,
    ops::{Deref, DerefMut},
};

/// CGI params, as passed by the front-end server (RFC 3875 meta-variables).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params<'a>(HashMap<Cow<'a, str>, Cow<'a, str>>);

impl Params<'static> {
    /// Snapshots the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are converted
    /// lossily rather than dropped.
    pub fn from_env() -> Self {
        let map = env::vars_os()
            .map(|(key, value)| {
                (
                    Cow::Owned(key.to_string_lossy().into_owned()),
                    Cow::Owned(value.to_string_lossy().into_owned()),
                )
            })
            .collect();
        Params(map)
    }
}

impl<'a> Params<'a> {
    /// Sets a custom parameter with the given key and value.
    ///
    /// # Arguments
    ///
    /// * `key` - The parameter name
    /// * `value` - The parameter value
    #[inline]
    pub fn custom<K: Into<Cow<'a, str>>, S: Into<Cow<'a, str>>>(
        mut self, key: K, value: S,
    ) -> Self {
        self.insert(key.into(), value.into());
        self
    }

    /// Sets the GATEWAY_INTERFACE parameter.
    ///
    /// # Arguments
    ///
    /// * `gateway_interface` - The gateway interface version (e.g., "CGI/1.1")
    #[inline]
    pub fn gateway_interface<S: Into<Cow<'a, str>>>(mut self, gateway_interface: S) -> Self {
        self.insert("GATEWAY_INTERFACE".into(), gateway_interface.into());
        self
    }

    /// Sets the SERVER_SOFTWARE parameter.
    ///
    /// # Arguments
    ///
    /// * `server_software` - The server software name and version
    #[inline]
    pub fn server_software<S: Into<Cow<'a, str>>>(mut self, server_software: S) -> Self {
        self.insert("SERVER_SOFTWARE".into(), server_software.into());
        self
    }

    /// Sets the REQUEST_METHOD parameter.
    ///
    /// # Arguments
    ///
    /// * `request_method` - The HTTP request method (e.g., "GET", "POST")
    #[inline]
    pub fn request_method<S: Into<Cow<'a, str>>>(mut self, request_method: S) -> Self {
        self.insert("REQUEST_METHOD".into(), request_method.into());
        self
    }

    /// Sets the QUERY_STRING parameter.
    ///
    /// # Arguments
    ///
    /// * `query_string` - The query string part of the URL
    #[inline]
    pub fn query_string<S: Into<Cow<'a, str>>>(mut self, query_string: S) -> Self {
        self.insert("QUERY_STRING".into(), query_string.into());
        self
    }

    /// Sets the CONTENT_TYPE parameter.
    ///
    /// # Arguments
    ///
    /// * `content_type` - The content type of the request body
    #[inline]
    pub fn content_type<S: Into<Cow<'a, str>>>(mut self, content_type: S) -> Self {
        self.insert("CONTENT_TYPE".into(), content_type.into());
        self
    }

    /// Sets the CONTENT_LENGTH parameter.
    ///
    /// # Arguments
    ///
    /// * `content_length` - The length of the request body in bytes
    #[inline]
    pub fn content_length(mut self, content_length: usize) -> Self {
        self.insert("CONTENT_LENGTH".into(), content_length.to_string().into());
        self
    }

    /// Sets the HTTP_COOKIE parameter.
    ///
    /// # Arguments
    ///
    /// * `http_cookie` - The raw `Cookie` request header
    #[inline]
    pub fn http_cookie<S: Into<Cow<'a, str>>>(mut self, http_cookie: S) -> Self {
        self.insert("HTTP_COOKIE".into(), http_cookie.into());
        self
    }

    /// Sets the HTTP_USER_AGENT parameter.
    ///
    /// # Arguments
    ///
    /// * `http_user_agent` - The raw `User-Agent` request header
    #[inline]
    pub fn http_user_agent<S: Into<Cow<'a, str>>>(mut self, http_user_agent: S) -> Self {
        self.insert("HTTP_USER_AGENT".into(), http_user_agent.into());
        self
    }

    /// Looks up a parameter by name.
    #[inline]
    pub fn var(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|value| value.as_ref())
    }

    /// All parameters ordered by name.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs = self
            .0
            .iter()
            .map(|(key, value)| (key.as_ref(), value.as_ref()))
            .collect::<Vec<_>>();
        pairs.sort_unstable_by(|a, b| a.0.cmp(b.0));
        pairs
    }
}

impl<'a> Deref for Params<'a> {
    type Target = HashMap<Cow<'a, str>, Cow<'a, str>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> DerefMut for Params<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<'a> From<Params<'a>> for HashMap<Cow<'a, str>, Cow<'a, str>> {
    fn from(params: Params<'a>) -> Self {
        params.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_cgi_names() {
        let params = Params::default()
            .request_method("POST")
            .content_type("application/x-www-form-urlencoded")
            .content_length(9)
            .http_cookie("SESSIONID=abc");

        assert_eq!(params.var("REQUEST_METHOD"), Some("POST"));
        assert_eq!(params.var("CONTENT_LENGTH"), Some("9"));
        assert_eq!(params.var("HTTP_COOKIE"), Some("SESSIONID=abc"));
        assert_eq!(params.var("QUERY_STRING"), None);
    }

    #[test]
    fn test_sorted_orders_by_name() {
        let params = Params::default()
            .custom("B", "2")
            .custom("A", "1")
            .custom("C", "3");

        assert_eq!(params.sorted(), vec![("A", "1"), ("B", "2"), ("C", "3")]);
    }
}
