//! HTTP transport types passed between the pipeline and the transport.
//!
//! # Design
//! Requests and responses are plain data. The pipeline builds `Request`
//! values and reads `Response` values; the injected `Transport` performs the
//! actual I/O. Headers are kept as ordered `(name, value)` pairs so repeated
//! headers such as `set-cookie` survive intact. Lookups are
//! case-insensitive.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelHandle;
use crate::error::FetchError;

/// Header names the pipeline reads or writes.
pub mod headers {
    pub const CONTENT_TYPE: &str = "content-type";
    pub const COOKIE: &str = "cookie";
    pub const SET_COOKIE: &str = "set-cookie";
    pub const LOCATION: &str = "location";
}

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Methods whose payload travels in the query string when data is processed.
    pub fn encodes_data_in_query(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the transport should follow 3xx responses itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectMode {
    #[default]
    Follow,
    /// Return 3xx responses unchanged so the pipeline can inspect them.
    Manual,
}

/// A transport-ready request descriptor.
///
/// Built fresh for every hop by the request builder, or supplied pre-built
/// by the caller. The transport should observe `cancel` and abort the
/// underlying network operation once it flips.
#[derive(Clone, Default)]
pub struct Request {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub redirect: RedirectMode,
    pub cancel: Option<Arc<dyn CancelHandle>>,
}

impl Request {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|b| b.len()))
            .field("redirect", &self.redirect)
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

/// A completed response from the transport.
///
/// The body can be consumed once: every consuming accessor takes `self`.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Every value of `name`, in the order the transport reported them.
    pub fn header_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn bytes(self) -> Bytes {
        self.body
    }

    pub fn text(self) -> Result<String, FetchError> {
        String::from_utf8(self.body.to_vec()).map_err(|e| FetchError::Decode(e.to_string()))
    }

    pub fn json<T: DeserializeOwned>(self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Insert or replace a header, matching the name case-insensitively.
pub(crate) fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let resp = Response::new(302).with_header("Location", "/next");
        assert_eq!(resp.header("location"), Some("/next"));
        assert_eq!(resp.header("LOCATION"), Some("/next"));
        assert!(resp.header("set-cookie").is_none());
    }

    #[test]
    fn header_all_keeps_repeated_values() {
        let resp = Response::new(302)
            .with_header("Set-Cookie", "a=1")
            .with_header("set-cookie", "b=2");
        let values: Vec<&str> = resp.header_all(headers::SET_COOKIE).collect();
        assert_eq!(values, vec!["a=1", "b=2"]);
    }

    #[test]
    fn set_header_replaces_existing() {
        let mut h = vec![("Cookie".to_string(), "a=1".to_string())];
        set_header(&mut h, headers::COOKIE, "b=2".to_string());
        assert_eq!(h, vec![("cookie".to_string(), "b=2".to_string())]);
    }

    #[test]
    fn text_rejects_invalid_utf8() {
        let resp = Response::new(200).with_body(vec![0xff, 0xfe]);
        assert!(matches!(resp.text(), Err(FetchError::Decode(_))));
    }

    #[test]
    fn method_serializes_uppercase() {
        let json = serde_json::to_string(&HttpMethod::Delete).unwrap();
        assert_eq!(json, r#""DELETE""#);
        let back: HttpMethod = serde_json::from_str(r#""PATCH""#).unwrap();
        assert_eq!(back, HttpMethod::Patch);
    }
}
