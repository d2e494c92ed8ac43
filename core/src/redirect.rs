//! Manual redirect interception with cookie carry-over.
//!
//! # Design
//! Only active when the call keeps redirect cookies; otherwise the transport
//! follows redirects itself and every response is terminal here. For a 3xx
//! in [301, 308] the `set-cookie` values are merged into the call's cookie
//! map (new values win, nothing is dropped) and the next hop is derived.
//! Cookies are the only part of the call's arguments this stage touches;
//! `data` is re-encoded by the builder on every hop.
//! The orchestrator drives the loop and enforces the hop ceiling.

use std::collections::BTreeMap;

use url::Url;

use crate::config::{RequestArgs, RequestInit};
use crate::error::{FetchError, Result};
use crate::http::{headers, HttpMethod, Response};

/// Where to go next and with which options.
#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    pub location: String,
    pub init: RequestInit,
}

pub fn is_redirect(status: u16) -> bool {
    (301..=308).contains(&status)
}

/// Inspect `response` and, if it is an intercepted redirect, merge its
/// cookies into `args` and return the next hop.
pub fn next_hop(
    response: &Response,
    current_url: &str,
    args: &mut RequestArgs,
    init: &RequestInit,
) -> Result<Option<Hop>> {
    if !args.keep_redirect_cookies || !is_redirect(response.status) {
        return Ok(None);
    }

    let location = match response.header(headers::LOCATION).map(str::trim) {
        Some(location) if !location.is_empty() => location,
        _ => {
            return Err(FetchError::RedirectLocationMissing {
                status: response.status,
            })
        }
    };

    let cookies = parse_set_cookie(response.header_all(headers::SET_COOKIE));
    let received = cookies.len();
    args.cookies.extend(cookies);

    let mut next = init.clone();
    if response.status == 303 {
        next.method = HttpMethod::Get;
        next.body = None;
        next.headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case(headers::CONTENT_TYPE));
    }

    let location = resolve_location(current_url, location);
    tracing::debug!(
        status = response.status,
        location = %location,
        cookies_received = received,
        cookies_total = args.cookies.len(),
        method = %next.method,
        "following redirect"
    );

    Ok(Some(Hop {
        location,
        init: next,
    }))
}

/// Collect `name=value` pairs from `set-cookie` header values.
///
/// Attributes are ignored. Values joined with commas by the transport are
/// split apart again; a comma inside an `Expires` date does not start a new
/// cookie. Anything unparseable contributes nothing.
pub fn parse_set_cookie<'a>(values: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for value in values {
        for entry in split_cookie_list(value) {
            let pair = entry.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                continue;
            }
            let value = value.trim().trim_matches('"');
            cookies.insert(name.to_string(), value.to_string());
        }
    }
    cookies
}

fn split_cookie_list(value: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for piece in value.split(',') {
        let head = piece.split(';').next().unwrap_or_default();
        match entries.last_mut() {
            Some(current) if !head.contains('=') => {
                current.push(',');
                current.push_str(piece);
            }
            _ => entries.push(piece.trim_start().to_string()),
        }
    }
    entries
}

fn resolve_location(current_url: &str, location: &str) -> String {
    match Url::parse(current_url) {
        Ok(base) => base
            .join(location)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| location.to_string()),
        Err(_) => location.to_string(),
    }
}
