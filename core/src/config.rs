//! Defaults, per-call options and the argument split.
//!
//! # Design
//! `FetchConfig` holds the defaults a `Client` is constructed with and can be
//! loaded from JSON. Each call supplies a `RequestOptions` of overrides; the
//! two are merged once into a `RequestArgs` (pipeline-only state) and a
//! `RequestInit` (what ends up on the wire). Headers and cookies merge key by
//! key, scalars replace.
//!
//! The process-wide store at the bottom of this file is for the outermost
//! composition boundary only. Nothing inside the pipeline reads it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::cancel::CancelHandle;
use crate::error::FetchError;
use crate::http::{set_header, HttpMethod, RedirectMode};
use crate::transport::Transport;
use crate::types::DataType;

pub const DEFAULT_MAX_REDIRECTS: usize = 20;

/// Defaults applied to every call made through a `Client`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    /// Encode `data` into the query string or form body.
    pub process_data: bool,
    /// Per-hop deadline in milliseconds. Negative or absent disables it.
    pub timeout_ms: Option<i64>,
    /// Intercept 3xx responses and carry `set-cookie` values to the next hop.
    pub keep_redirect_cookies: bool,
    pub cookies: BTreeMap<String, String>,
    pub data_type: DataType,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            process_data: true,
            timeout_ms: None,
            keep_redirect_cookies: false,
            cookies: BTreeMap::new(),
            data_type: DataType::Json,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl FetchConfig {
    pub fn from_json(raw: &str) -> Result<Self, FetchError> {
        serde_json::from_str(raw).map_err(|e| FetchError::Config(e.to_string()))
    }

    /// Merge per-call overrides over these defaults.
    pub fn split(&self, options: RequestOptions) -> (RequestArgs, RequestInit) {
        let timeout = options
            .timeout_ms
            .or(self.timeout_ms)
            .and_then(|ms| u64::try_from(ms).ok())
            .map(Duration::from_millis);

        // Give the transport something to observe when a deadline can fire.
        let cancel = options.cancel.or_else(|| {
            timeout.map(|_| Arc::new(CancellationToken::new()) as Arc<dyn CancelHandle>)
        });

        let keep_redirect_cookies = options
            .keep_redirect_cookies
            .unwrap_or(self.keep_redirect_cookies);

        let mut cookies = self.cookies.clone();
        cookies.extend(options.cookies);

        let mut headers: Vec<(String, String)> = Vec::new();
        for (name, value) in self.headers.iter() {
            set_header(&mut headers, name, value.clone());
        }
        for (name, value) in options.headers {
            set_header(&mut headers, &name, value);
        }

        let args = RequestArgs {
            data: options.data,
            process_data: options.process_data.unwrap_or(self.process_data),
            timeout,
            cancel,
            keep_redirect_cookies,
            cookies,
            fetch_module: options.fetch_module,
            data_type: options.data_type.unwrap_or(self.data_type),
            max_redirects: options.max_redirects.unwrap_or(self.max_redirects),
        };
        let init = RequestInit {
            method: options.method.unwrap_or(self.method),
            headers,
            body: options.body,
            redirect: if keep_redirect_cookies {
                RedirectMode::Manual
            } else {
                RedirectMode::Follow
            },
        };
        (args, init)
    }
}

/// Per-call overrides. Unset fields fall back to the client's `FetchConfig`.
#[derive(Clone, Default)]
pub struct RequestOptions {
    pub method: Option<HttpMethod>,
    pub headers: Vec<(String, String)>,
    pub data: Option<serde_json::Value>,
    pub body: Option<Bytes>,
    pub process_data: Option<bool>,
    pub timeout_ms: Option<i64>,
    pub keep_redirect_cookies: Option<bool>,
    pub cookies: BTreeMap<String, String>,
    pub data_type: Option<DataType>,
    pub max_redirects: Option<usize>,
    pub cancel: Option<Arc<dyn CancelHandle>>,
    pub fetch_module: Option<Arc<dyn Transport>>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn process_data(mut self, process_data: bool) -> Self {
        self.process_data = Some(process_data);
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn keep_redirect_cookies(mut self, keep: bool) -> Self {
        self.keep_redirect_cookies = Some(keep);
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    pub fn cancel(mut self, handle: Arc<dyn CancelHandle>) -> Self {
        self.cancel = Some(handle);
        self
    }

    pub fn fetch_module(mut self, transport: Arc<dyn Transport>) -> Self {
        self.fetch_module = Some(transport);
        self
    }
}

/// Pipeline state for one top-level call, threaded through every hop.
///
/// Only the redirect stage mutates it (cookie merge, payload drop on 303).
#[derive(Clone)]
pub struct RequestArgs {
    pub data: Option<serde_json::Value>,
    pub process_data: bool,
    pub timeout: Option<Duration>,
    pub cancel: Option<Arc<dyn CancelHandle>>,
    pub keep_redirect_cookies: bool,
    pub cookies: BTreeMap<String, String>,
    pub fetch_module: Option<Arc<dyn Transport>>,
    pub data_type: DataType,
    pub max_redirects: usize,
}

impl fmt::Debug for RequestArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestArgs")
            .field("data", &self.data)
            .field("process_data", &self.process_data)
            .field("timeout", &self.timeout)
            .field("cancel", &self.cancel)
            .field("keep_redirect_cookies", &self.keep_redirect_cookies)
            .field("cookies", &self.cookies)
            .field("fetch_module", &self.fetch_module.is_some())
            .field("data_type", &self.data_type)
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}

/// Base request options: the parts of a call that land on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInit {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub redirect: RedirectMode,
}

static GLOBAL_CONFIG: OnceLock<RwLock<FetchConfig>> = OnceLock::new();

fn global() -> &'static RwLock<FetchConfig> {
    GLOBAL_CONFIG.get_or_init(|| RwLock::new(FetchConfig::default()))
}

/// Replace the process-wide defaults used by `Client::from_global`.
pub fn set_global_config(config: FetchConfig) {
    *global().write().unwrap_or_else(PoisonError::into_inner) = config;
}

pub fn update_global_config(update: impl FnOnce(&mut FetchConfig)) {
    let mut guard = global().write().unwrap_or_else(PoisonError::into_inner);
    update(&mut *guard);
}

/// Copy of the current process-wide defaults.
pub fn global_config() -> FetchConfig {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
