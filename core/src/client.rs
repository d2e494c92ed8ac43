//! The request pipeline exposed to callers.
//!
//! # Design
//! `Client` holds the injected transport and the defaults it was built with,
//! and carries no state between calls. Each call merges its options into a
//! fresh `RequestArgs`, then runs
//! build → send → deadline → redirect check, looping while the redirect
//! stage yields another hop, and finally classifies the terminal response.
//! Hops are strictly sequential and each gets its own deadline window.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::Instrument;
use uuid::Uuid;

use crate::builder::{build_request, Target};
use crate::classify::classify;
use crate::config::{global_config, FetchConfig, RequestArgs, RequestInit, RequestOptions};
use crate::error::{FetchError, Result};
use crate::http::{HttpMethod, Response};
use crate::redirect::next_hop;
use crate::timeout::guard;
use crate::transport::Transport;
use crate::types::{DataType, Payload};

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: FetchConfig,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, FetchConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: FetchConfig) -> Self {
        Self { transport, config }
    }

    /// Build a client from a snapshot of the process-wide defaults.
    ///
    /// Later changes to the global store do not affect this client.
    pub fn from_global(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, global_config())
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Run one logical request, following intercepted redirects.
    pub async fn request(
        &self,
        target: impl Into<Target>,
        options: RequestOptions,
    ) -> Result<Payload> {
        let target = target.into();
        target.validate()?;

        let (mut args, init) = self.config.split(options);
        let span = tracing::debug_span!(
            "fetch",
            request_id = %Uuid::new_v4(),
            method = %init.method,
            url = %target.url(),
        );

        async move {
            let response = self.resolve(target, &mut args, init).await?;
            classify(response, args.data_type)
        }
        .instrument(span)
        .await
    }

    /// `request` with a JSON payload deserialized into `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        target: impl Into<Target>,
        options: RequestOptions,
    ) -> Result<T> {
        self.request(target, options.data_type(DataType::Json))
            .await?
            .into_json()
    }

    pub async fn get(&self, target: impl Into<Target>, options: RequestOptions) -> Result<Payload> {
        self.request(target, options.method(HttpMethod::Get)).await
    }

    pub async fn post(
        &self,
        target: impl Into<Target>,
        options: RequestOptions,
    ) -> Result<Payload> {
        self.request(target, options.method(HttpMethod::Post)).await
    }

    pub async fn put(&self, target: impl Into<Target>, options: RequestOptions) -> Result<Payload> {
        self.request(target, options.method(HttpMethod::Put)).await
    }

    pub async fn delete(
        &self,
        target: impl Into<Target>,
        options: RequestOptions,
    ) -> Result<Payload> {
        self.request(target, options.method(HttpMethod::Delete)).await
    }

    /// Send hops until a response is terminal for the redirect stage.
    async fn resolve(
        &self,
        mut target: Target,
        args: &mut RequestArgs,
        mut init: RequestInit,
    ) -> Result<Response> {
        let transport = args
            .fetch_module
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.transport));
        let mut redirects = 0usize;

        loop {
            let request = build_request(&target, args, &init)?;
            let url = request.url.clone();
            tracing::debug!(
                hop = redirects,
                method = %request.method,
                url = %url,
                "sending request"
            );

            let response =
                guard(transport.send(request), args.timeout, args.cancel.as_ref()).await?;
            tracing::debug!(hop = redirects, status = response.status, "response received");

            let Some(hop) = next_hop(&response, &url, args, &init)? else {
                return Ok(response);
            };
            if redirects >= args.max_redirects {
                return Err(FetchError::TooManyRedirects {
                    max: args.max_redirects,
                });
            }
            redirects += 1;
            target = Target::Url(hop.location);
            init = hop.init;
        }
    }
}
