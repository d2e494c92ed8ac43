//! Request pipeline over an injected fetch-style transport.
//!
//! # Overview
//! Wraps a `Transport` (`Request -> eventual Response`) with request
//! construction from structured arguments, a per-hop timeout tied to a
//! cancellation handle, manual redirect interception that carries cookies
//! across hops, and classification/decoding of the final response.
//!
//! # Design
//! - `Client` is stateless between calls; every call owns its `RequestArgs`.
//! - Each stage is a plain function (`build_request`, `guard`, `next_hop`,
//!   `classify`) so it can be tested without a transport.
//! - Redirects are followed by an explicit loop with a hop ceiling, not by
//!   recursion.
//! - Process-wide defaults exist only for the outermost boundary
//!   (`Client::from_global`); the pipeline itself never reads them.

pub mod builder;
pub mod cancel;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod redirect;
pub mod timeout;
pub mod transport;
pub mod types;

pub use builder::Target;
pub use cancel::CancelHandle;
pub use client::Client;
pub use config::{
    global_config, set_global_config, update_global_config, FetchConfig, RequestArgs, RequestInit,
    RequestOptions,
};
pub use error::{FetchError, Result, TransportError};
pub use http::{HttpMethod, RedirectMode, Request, Response};
pub use transport::Transport;
pub use types::{DataType, Payload};
