//! HTTP gateway used for both discovery and endpoint calls.
//!
//! ### Contract
//! - GET and DELETE append parameters to the URL, joining with `&` when the
//!   URL already carries a query and `?` otherwise.
//! - POST sends parameters as an `application/x-www-form-urlencoded` body.
//! - Any HTTP status comes back as a [`RawResponse`]; only failures below the
//!   HTTP layer (DNS, connect, TLS, timeout) are errors.
//!
//! ### Transport options
//! Each [`GatewayOptions`] field maps to its own reqwest setting: user agent,
//! connect timeout, total timeout, certificate verification and redirect limit.

pub mod query;
pub mod response;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use oembed_core::{Error, GatewayOptions, Params};
use reqwest::{Client, Url, header, redirect};
use serde_json::Value;

pub use query::{add_params_to_url, merge_params, parse_query, to_query_string};
pub use response::{RawResponse, TransportInfo};

/// HTTP methods the gateway supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for one call: nothing, an already encoded query, or a mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestParams {
    #[default]
    None,
    Query(String),
    Map(Params),
}

impl RequestParams {
    /// Encoded form of the parameters; empty for [`RequestParams::None`].
    pub fn to_query_string(&self) -> String {
        match self {
            RequestParams::None => String::new(),
            RequestParams::Query(query) => query.strip_prefix('?').unwrap_or(query).to_string(),
            RequestParams::Map(params) => to_query_string(params),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RequestParams::None => true,
            RequestParams::Query(query) => query.trim_start_matches('?').is_empty(),
            RequestParams::Map(params) => params.is_empty(),
        }
    }
}

impl From<Params> for RequestParams {
    fn from(params: Params) -> Self {
        if params.is_empty() { RequestParams::None } else { RequestParams::Map(params) }
    }
}

impl From<&Params> for RequestParams {
    fn from(params: &Params) -> Self {
        params.clone().into()
    }
}

impl From<String> for RequestParams {
    fn from(query: String) -> Self {
        RequestParams::Query(query)
    }
}

impl From<&str> for RequestParams {
    fn from(query: &str) -> Self {
        RequestParams::Query(query.to_string())
    }
}

/// Performs HTTP exchanges for the client.
///
/// Implementations must return non-2xx responses as [`RawResponse`] values and
/// reserve `Err` for transport failures.
#[async_trait]
pub trait HttpGateway: Send + Sync {
    async fn call(&self, url: &str, method: Method, params: RequestParams) -> Result<RawResponse, Error>;

    async fn get(&self, url: &str, params: RequestParams) -> Result<RawResponse, Error> {
        self.call(url, Method::Get, params).await
    }

    async fn post(&self, url: &str, params: RequestParams) -> Result<RawResponse, Error> {
        self.call(url, Method::Post, params).await
    }

    async fn delete(&self, url: &str, params: RequestParams) -> Result<RawResponse, Error> {
        self.call(url, Method::Delete, params).await
    }
}

#[async_trait]
impl<G: HttpGateway + ?Sized> HttpGateway for Arc<G> {
    async fn call(&self, url: &str, method: Method, params: RequestParams) -> Result<RawResponse, Error> {
        (**self).call(url, method, params).await
    }
}

/// [`HttpGateway`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestGateway {
    http: Client,
    options: GatewayOptions,
}

impl ReqwestGateway {
    /// Build the underlying client from the given options.
    pub fn new(options: GatewayOptions) -> Result<Self, Error> {
        let mut builder = Client::builder().use_rustls_tls().gzip(true).brotli(true).deflate(true);

        if let Some(user_agent) = &options.user_agent {
            builder = builder.user_agent(user_agent);
        }
        if let Some(connect_timeout) = options.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(verify) = options.verify_tls_peer {
            builder = builder.danger_accept_invalid_certs(!verify);
        }
        if let Some(max_redirects) = options.max_redirects {
            let policy = if max_redirects == 0 { redirect::Policy::none() } else { redirect::Policy::limited(max_redirects) };
            builder = builder.redirect(policy);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Transport { message: format!("failed to build HTTP client: {e}"), timeout: false })?;

        Ok(Self { http, options })
    }

    /// Get reference to the options the client was built with.
    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }
}

fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))
}

fn transport_error(err: reqwest::Error) -> Error {
    Error::Transport { message: err.to_string(), timeout: err.is_timeout() }
}

#[async_trait]
impl HttpGateway for ReqwestGateway {
    async fn call(&self, url: &str, method: Method, params: RequestParams) -> Result<RawResponse, Error> {
        let start = Instant::now();
        let query = params.to_query_string();

        let request = match method {
            Method::Get | Method::Delete => {
                let target = parse_url(&add_params_to_url(url, &query))?;
                self.http.request(method.to_reqwest(), target)
            }
            Method::Post => {
                let request = self.http.post(parse_url(url)?);
                if query.is_empty() {
                    request
                } else {
                    request
                        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                        .body(query)
                }
            }
        };

        let http_response = request.send().await.map_err(transport_error)?;

        let status = http_response.status();
        let final_url = http_response.url().to_string();
        let content_type = http_response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_length = http_response.content_length();

        let body = http_response.text().await.map_err(transport_error)?;
        let total_time_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "{} {} -> {} in {}ms ({} bytes)",
            method,
            final_url,
            status.as_u16(),
            total_time_ms,
            body.len()
        );

        let mut info = TransportInfo::new();
        info.insert(response::HTTP_CODE.into(), Value::from(status.as_u16()));
        info.insert(response::FINAL_URL.into(), Value::from(final_url));
        if let Some(content_type) = content_type {
            info.insert(response::CONTENT_TYPE.into(), Value::from(content_type));
        }
        if let Some(content_length) = content_length {
            info.insert(response::CONTENT_LENGTH.into(), Value::from(content_length));
        }
        info.insert(response::SIZE_DOWNLOAD.into(), Value::from(body.len()));
        info.insert(response::TOTAL_TIME_MS.into(), Value::from(total_time_ms));

        Ok(RawResponse::new(body, info))
    }
}
