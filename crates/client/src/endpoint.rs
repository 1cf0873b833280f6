//! A single oEmbed provider endpoint.
//!
//! Only JSON answers are understood. 401, 404 and 501 map to their own
//! errors. Any other status falls through to decoding, which rejects bodies
//! that are not a JSON object.

use oembed_core::{Error, OEmbed, Params};

use crate::gateway::{HttpGateway, RawResponse, RequestParams, merge_params};

/// Parameter carrying the resource URL.
pub const URL_PARAM: &str = "url";

/// An oEmbed endpoint URL plus the parameters sent with every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    oembed_url: String,
    params: Params,
}

impl Endpoint {
    pub fn new(oembed_url: impl Into<String>, params: Params) -> Self {
        Self { oembed_url: oembed_url.into(), params }
    }

    pub fn oembed_url(&self) -> &str {
        &self.oembed_url
    }

    /// Default parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Defaults, then caller parameters, then `url` set to `resource_url`.
    ///
    /// A caller-supplied `url` is always replaced.
    pub fn merge_params(&self, resource_url: &str, params: &Params) -> Params {
        let mut merged = merge_params(&self.params, params);
        merged.insert(URL_PARAM.to_string(), resource_url.to_string());
        merged
    }

    /// Look up `resource_url` at this endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`], [`Error::NotFound`], [`Error::NotImplemented`] for 401/404/501
    /// - [`Error::InvalidResponse`] when the body is not a non-empty JSON object
    /// - [`Error::Transport`] when the request never completed
    pub async fn get<G>(&self, gateway: &G, resource_url: &str, params: &Params) -> Result<OEmbed, Error>
    where
        G: HttpGateway + ?Sized,
    {
        let merged = self.merge_params(resource_url, params);
        fetch(gateway, &self.oembed_url, merged.into()).await
    }
}

/// Call an oEmbed URL as-is and decode the answer.
///
/// Used for discovered URLs, which already carry `url` and `format` in their query.
pub async fn fetch<G>(gateway: &G, url: &str, params: RequestParams) -> Result<OEmbed, Error>
where
    G: HttpGateway + ?Sized,
{
    let response = gateway.get(url, params).await?;
    analyse_response(&response).inspect_err(|e| tracing::debug!("oEmbed call to {} failed: {}", url, e))
}

/// Map the status code, then decode the body.
pub fn analyse_response(response: &RawResponse) -> Result<OEmbed, Error> {
    let source = response.final_url().unwrap_or("oEmbed endpoint");
    check_http_status(response.http_code(), source)?;
    OEmbed::from_json(response.content())
}

fn check_http_status(code: Option<u16>, source: &str) -> Result<(), Error> {
    match code {
        Some(401) => Err(Error::Unauthorized(source.to_string())),
        Some(404) => Err(Error::NotFound(source.to_string())),
        Some(501) => Err(Error::NotImplemented(source.to_string())),
        _ => Ok(()),
    }
}
