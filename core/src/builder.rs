//! Request construction from a target and structured arguments.
//!
//! # Design
//! Pure: no I/O, no mutation of the arguments. A pre-built `Request` target
//! is assumed fully formed and passes through untouched. URL targets get
//! `data` encoded into the query string (GET/DELETE), into a form body
//! (other methods), or attached verbatim when `process_data` is off.
//!
//! Form encoding follows the qs bracket conventions:
//! nested objects become `a[b]=c`, arrays become `a[0]=x`, `null` becomes an
//! empty value. Spaces are written as `+` (WHATWG form encoding) where qs
//! writes `%20`; servers decode both the same way.

use bytes::Bytes;
use serde_json::Value;
use url::form_urlencoded;

use crate::config::{RequestArgs, RequestInit};
use crate::error::{FetchError, Result};
use crate::http::{headers, set_header, Request, FORM_URLENCODED};

/// What a call is aimed at.
#[derive(Debug, Clone)]
pub enum Target {
    Url(String),
    /// A fully formed descriptor; `data`, cookies and query handling are skipped.
    ///
    /// Only the first hop uses it as-is. A redirect target is a plain URL,
    /// so later hops are built from the call's options (method, headers,
    /// body), not from this request's.
    Request(Request),
}

impl Target {
    pub fn url(&self) -> &str {
        match self {
            Target::Url(url) => url,
            Target::Request(req) => &req.url,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.url().trim().is_empty() {
            return Err(FetchError::InvalidInput("value of input invalid".to_string()));
        }
        Ok(())
    }
}

impl From<&str> for Target {
    fn from(url: &str) -> Self {
        Target::Url(url.to_string())
    }
}

impl From<String> for Target {
    fn from(url: String) -> Self {
        Target::Url(url)
    }
}

impl From<&String> for Target {
    fn from(url: &String) -> Self {
        Target::Url(url.clone())
    }
}

impl From<Request> for Target {
    fn from(request: Request) -> Self {
        Target::Request(request)
    }
}

/// Build the descriptor for one hop.
pub fn build_request(target: &Target, args: &RequestArgs, init: &RequestInit) -> Result<Request> {
    target.validate()?;
    let url = match target {
        Target::Request(request) => return Ok(request.clone()),
        Target::Url(url) => url,
    };

    let mut request = Request {
        method: init.method,
        url: url.clone(),
        headers: init.headers.clone(),
        body: init.body.clone(),
        redirect: init.redirect,
        cancel: args.cancel.clone(),
    };

    if let Some(data) = &args.data {
        if !args.process_data {
            request.body = Some(verbatim_body(data));
        } else if init.method.encodes_data_in_query() {
            request.url = append_query(url, data);
        } else {
            request.body = Some(Bytes::from(encode_form(data)));
            if request.header(headers::CONTENT_TYPE).is_none() {
                request
                    .headers
                    .push((headers::CONTENT_TYPE.to_string(), FORM_URLENCODED.to_string()));
            }
        }
    }

    if !args.cookies.is_empty() {
        let mut pairs: Vec<String> = request
            .header(headers::COOKIE)
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|pair| !pair.is_empty())
            .filter(|pair| {
                let name = pair.split_once('=').map_or(*pair, |(name, _)| name).trim();
                !args.cookies.contains_key(name)
            })
            .map(str::to_string)
            .collect();
        pairs.push(cookie_header(args.cookies.iter()));
        set_header(&mut request.headers, headers::COOKIE, pairs.join("; "));
    }

    Ok(request)
}

/// Serialize `data` as `application/x-www-form-urlencoded`.
pub fn encode_form(data: &Value) -> String {
    match data {
        Value::String(encoded) => encoded.clone(),
        Value::Object(_) | Value::Array(_) => {
            let mut pairs = Vec::new();
            flatten(None, data, &mut pairs);
            form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish()
        }
        Value::Null => String::new(),
        scalar => scalar.to_string(),
    }
}

/// Append `data` to the query of `url`, replacing same-named parameters.
pub fn append_query(url: &str, data: &Value) -> String {
    let (rest, fragment) = match url.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (url, None),
    };
    let (path, existing) = rest.split_once('?').unwrap_or((rest, ""));

    let mut incoming = Vec::new();
    if matches!(data, Value::Object(_) | Value::Array(_)) {
        flatten(None, data, &mut incoming);
    }

    let mut segments: Vec<String> = existing
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| {
            let key = form_urlencoded::parse(segment.as_bytes())
                .next()
                .map(|(k, _)| k.into_owned())
                .unwrap_or_default();
            !incoming.iter().any(|(k, _)| *k == key)
        })
        .map(str::to_string)
        .collect();

    let added = encode_form(data);
    if !added.is_empty() {
        segments.push(added);
    }

    let mut out = path.to_string();
    if !segments.is_empty() {
        out.push('?');
        out.push_str(&segments.join("&"));
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

fn flatten(prefix: Option<&str>, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let key = match prefix {
                    Some(prefix) => format!("{prefix}[{key}]"),
                    None => key.clone(),
                };
                flatten(Some(&key), nested, out);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                let key = match prefix {
                    Some(prefix) => format!("{prefix}[{index}]"),
                    None => index.to_string(),
                };
                flatten(Some(&key), nested, out);
            }
        }
        leaf => {
            if let Some(key) = prefix {
                let value = match leaf {
                    Value::Null => String::new(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out.push((key.to_string(), value));
            }
        }
    }
}

fn verbatim_body(data: &Value) -> Bytes {
    match data {
        Value::String(s) => Bytes::from(s.clone()),
        other => Bytes::from(other.to_string()),
    }
}

pub(crate) fn cookie_header<'a>(cookies: impl Iterator<Item = (&'a String, &'a String)>) -> String {
    cookies
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetchConfig, RequestOptions};
    use crate::http::{HttpMethod, RedirectMode};
    use serde_json::json;

    fn split(options: RequestOptions) -> (RequestArgs, RequestInit) {
        FetchConfig::default().split(options)
    }

    #[test]
    fn empty_target_is_invalid() {
        let (args, init) = split(RequestOptions::new());
        let err = build_request(&Target::from(""), &args, &init).unwrap_err();
        assert!(matches!(err, FetchError::InvalidInput(_)));
        let err = build_request(&Target::from("   "), &args, &init).unwrap_err();
        assert!(matches!(err, FetchError::InvalidInput(_)));
    }

    #[test]
    fn get_data_goes_to_query() {
        let (args, init) = split(RequestOptions::new().data(json!({"a": 1})));
        let req = build_request(&"http://host/p?x=y".into(), &args, &init).unwrap();
        assert_eq!(req.url, "http://host/p?x=y&a=1");
        assert!(req.body.is_none());
    }

    #[test]
    fn query_keys_from_data_replace_existing() {
        let url = append_query("/p?a=old&b=2#frag", &json!({"a": "new"}));
        assert_eq!(url, "/p?b=2&a=new#frag");
    }

    #[test]
    fn delete_data_goes_to_query() {
        let (args, init) = split(
            RequestOptions::new()
                .method(HttpMethod::Delete)
                .data(json!({"id": 7})),
        );
        let req = build_request(&"http://host/items".into(), &args, &init).unwrap();
        assert_eq!(req.url, "http://host/items?id=7");
    }

    #[test]
    fn post_data_is_form_encoded() {
        let (args, init) = split(
            RequestOptions::new()
                .method(HttpMethod::Post)
                .data(json!({"name": "a b", "tags": ["x", "y"]})),
        );
        let req = build_request(&"http://host/form".into(), &args, &init).unwrap();
        assert_eq!(req.url, "http://host/form");
        assert_eq!(
            req.body.as_deref(),
            Some(&b"name=a+b&tags%5B0%5D=x&tags%5B1%5D=y"[..])
        );
        assert_eq!(req.header("content-type"), Some(FORM_URLENCODED));
    }

    #[test]
    fn caller_content_type_is_kept() {
        let (args, init) = split(
            RequestOptions::new()
                .method(HttpMethod::Put)
                .header("Content-Type", "text/plain")
                .data(json!({"a": 1})),
        );
        let req = build_request(&"http://host".into(), &args, &init).unwrap();
        assert_eq!(req.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn unprocessed_data_is_verbatim() {
        let (args, init) = split(
            RequestOptions::new()
                .method(HttpMethod::Post)
                .process_data(false)
                .data(json!("raw payload")),
        );
        let req = build_request(&"http://host".into(), &args, &init).unwrap();
        assert_eq!(req.body.as_deref(), Some(&b"raw payload"[..]));

        let (args, init) = split(
            RequestOptions::new()
                .method(HttpMethod::Get)
                .process_data(false)
                .data(json!({"a": 1})),
        );
        let req = build_request(&"http://host".into(), &args, &init).unwrap();
        assert_eq!(req.url, "http://host");
        assert_eq!(req.body.as_deref(), Some(&br#"{"a":1}"#[..]));
    }

    #[test]
    fn nested_objects_use_brackets() {
        let encoded = encode_form(&json!({"user": {"name": "x", "nick": null}}));
        assert_eq!(encoded, "user%5Bname%5D=x&user%5Bnick%5D=");
    }

    #[test]
    fn prebuilt_request_passes_through() {
        let (args, init) = split(
            RequestOptions::new()
                .data(json!({"ignored": true}))
                .cookie("sid", "1"),
        );
        let prebuilt = Request::new(HttpMethod::Post, "http://host/raw");
        let req = build_request(&prebuilt.into(), &args, &init).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://host/raw");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn cookies_become_one_header() {
        let (args, init) = split(
            RequestOptions::new()
                .header("cookie", "pre=0")
                .cookie("b", "2")
                .cookie("a", "1"),
        );
        let req = build_request(&"http://host".into(), &args, &init).unwrap();
        assert_eq!(req.header("cookie"), Some("pre=0; a=1; b=2"));
    }

    #[test]
    fn cookie_map_replaces_same_named_header_pairs() {
        let (args, init) = split(
            RequestOptions::new()
                .header("Cookie", "pre=old; other=1")
                .cookie("pre", "new"),
        );
        let req = build_request(&"http://host".into(), &args, &init).unwrap();
        assert_eq!(req.header("cookie"), Some("other=1; pre=new"));
    }

    #[test]
    fn manual_redirect_and_handle_are_carried() {
        let (args, init) = split(
            RequestOptions::new()
                .keep_redirect_cookies(true)
                .timeout_ms(10),
        );
        let req = build_request(&"http://host".into(), &args, &init).unwrap();
        assert_eq!(req.redirect, RedirectMode::Manual);
        assert!(req.cancel.is_some());
    }
}
