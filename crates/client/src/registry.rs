//! Ordered endpoint registry with allow-list and discovery fallback.
//!
//! ### Lookup
//! 1. If an allow-list is configured, the resource URL must match one of its patterns.
//! 2. Entries are scanned in registration order; the first matching pattern wins.
//! 3. Without a match, discovery (if enabled) fetches the resource page and calls
//!    the advertised oEmbed URL directly.
//!
//! At most two requests are made per lookup, one after the other. The registry
//! is never mutated after construction and can be shared across tasks.

use oembed_core::{AppConfig, EndpointConfig, Error, OEmbed, Params, RegistryConfig};
use regex::Regex;

use crate::discovery;
use crate::endpoint::{self, Endpoint};
use crate::gateway::{HttpGateway, ReqwestGateway, RequestParams};

/// One registry entry: a compiled pattern and the endpoint it routes to.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    key: String,
    pattern: Regex,
    endpoint: Endpoint,
}

impl RegistryEntry {
    pub fn new(key: impl Into<String>, pattern: &str, endpoint: Endpoint) -> Result<Self, Error> {
        Ok(Self { key: key.into(), pattern: compile_pattern(pattern)?, endpoint })
    }

    fn from_config(index: usize, config: EndpointConfig) -> Result<Self, Error> {
        let key = config.name.unwrap_or_else(|| index.to_string());
        Self::new(key, &config.pattern, Endpoint::new(config.url, config.params))
    }

    /// Configured name, or the entry's position when unnamed.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn matches(&self, resource_url: &str) -> bool {
        self.pattern.is_match(resource_url)
    }
}

/// Delimiters accepted around a `/body/flags` style pattern.
const PATTERN_DELIMITERS: [char; 4] = ['/', '#', '~', '!'];

/// Compile a registry pattern.
///
/// A pattern written with delimiters (`/http:\/\/www\.youtube\.com/i`) has
/// them stripped, escaped delimiters unescaped, and trailing flags turned into
/// an inline group. Anything else is compiled as a bare regex.
fn compile_pattern(pattern: &str) -> Result<Regex, Error> {
    let source = delimited_pattern(pattern).unwrap_or_else(|| pattern.to_string());
    Regex::new(&source).map_err(|e| Error::InvalidPattern { pattern: pattern.to_string(), reason: e.to_string() })
}

fn delimited_pattern(pattern: &str) -> Option<String> {
    let delimiter = pattern.chars().next().filter(|c| PATTERN_DELIMITERS.contains(c))?;
    let close = pattern.rfind(delimiter).filter(|&i| i > 0)?;
    let body = &pattern[1..close];
    let flags = &pattern[close + 1..];

    if !flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'x' | 'u' | 'U')) {
        return None;
    }

    let mut source = String::with_capacity(pattern.len() + 6);
    // `u` is the regex crate's default.
    let inline: String = flags.chars().filter(|&c| c != 'u').collect();
    if !inline.is_empty() {
        source.push_str("(?");
        source.push_str(&inline);
        source.push(')');
    }

    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) if next == delimiter => source.push(next),
                Some(next) => {
                    source.push('\\');
                    source.push(next);
                }
                None => source.push('\\'),
            },
            _ => source.push(c),
        }
    }

    Some(source)
}

/// Resolves resource URLs to oEmbed documents.
#[derive(Debug)]
pub struct Registry<G = ReqwestGateway> {
    gateway: G,
    entries: Vec<RegistryEntry>,
    allowed_url_patterns: Vec<Regex>,
    discovery: bool,
}

impl Registry<ReqwestGateway> {
    /// Build a registry and its reqwest gateway from application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let gateway = ReqwestGateway::new(config.gateway_options())?;
        Self::new(config.registry_config(), gateway)
    }
}

impl<G: HttpGateway> Registry<G> {
    /// Compile every pattern of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for the first pattern that does not compile.
    pub fn new(config: RegistryConfig, gateway: G) -> Result<Self, Error> {
        let entries = config
            .endpoints
            .into_iter()
            .enumerate()
            .map(|(index, endpoint)| RegistryEntry::from_config(index, endpoint))
            .collect::<Result<Vec<_>, _>>()?;

        let allowed_url_patterns = config
            .allowed_url_patterns
            .iter()
            .map(|pattern| compile_pattern(pattern))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            "registry ready: {} endpoints, {} allow-list patterns, discovery {}",
            entries.len(),
            allowed_url_patterns.len(),
            if config.discovery { "on" } else { "off" }
        );

        Ok(Self { gateway, entries, allowed_url_patterns, discovery: config.discovery })
    }

    /// Whether `resource_url` passes the allow-list. An empty allow-list allows everything.
    pub fn is_allowed(&self, resource_url: &str) -> bool {
        self.allowed_url_patterns.is_empty() || self.allowed_url_patterns.iter().any(|p| p.is_match(resource_url))
    }

    /// First entry whose pattern matches `resource_url`.
    pub fn find_entry(&self, resource_url: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|entry| entry.matches(resource_url))
    }

    /// Endpoint of the first entry whose pattern matches `resource_url`.
    pub fn find_endpoint(&self, resource_url: &str) -> Option<&Endpoint> {
        self.find_entry(resource_url).map(RegistryEntry::endpoint)
    }

    /// Endpoint registered under `key`, without pattern matching.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoEndpointFound`] if no entry has that key.
    pub fn get_endpoint(&self, key: &str) -> Result<&Endpoint, Error> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(RegistryEntry::endpoint)
            .ok_or_else(|| Error::NoEndpointFound(format!("no endpoint registered as {key:?}")))
    }

    /// Look up the oEmbed document for `resource_url`.
    ///
    /// `params` are merged over the endpoint's defaults; `url` is always the
    /// resource URL. For discovered endpoints, `params` are added to the
    /// discovered URL's own query.
    ///
    /// # Errors
    ///
    /// - [`Error::NotAllowedUrl`] if the allow-list rejects the URL (no request made)
    /// - [`Error::NoEndpointFound`] if nothing matches and discovery is off (no request made)
    /// - [`Error::ResourceNotFound`] if discovery finds the page missing
    /// - [`Error::NoOEmbedLinkFound`] if discovery finds no link
    /// - any error of [`Endpoint::get`]
    pub async fn get(&self, resource_url: &str, params: &Params) -> Result<OEmbed, Error> {
        if !self.is_allowed(resource_url) {
            return Err(Error::NotAllowedUrl(resource_url.to_string()));
        }

        if let Some(entry) = self.find_entry(resource_url) {
            tracing::debug!("{} matched endpoint {:?} ({})", resource_url, entry.key, entry.endpoint.oembed_url());
            return entry.endpoint.get(&self.gateway, resource_url, params).await;
        }

        if !self.discovery {
            return Err(Error::NoEndpointFound(resource_url.to_string()));
        }

        tracing::debug!("no endpoint matched {}, trying discovery", resource_url);

        let oembed_url = self
            .find_oembed_url(resource_url)
            .await?
            .ok_or_else(|| Error::NoOEmbedLinkFound(resource_url.to_string()))?;

        endpoint::fetch(&self.gateway, &oembed_url, RequestParams::from(params)).await
    }

    /// Run discovery for `resource_url` with this registry's gateway.
    pub async fn find_oembed_url(&self, resource_url: &str) -> Result<Option<String>, Error> {
        discovery::find_oembed_url(&self.gateway, resource_url).await
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn discovery_enabled(&self) -> bool {
        self.discovery
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Method;
    use crate::gateway::fake::FakeGateway;
    use httpmock::prelude::*;
    use oembed_core::GatewayOptions;
    use std::sync::Arc;

    const VIDEO_JSON: &str = r#"{"version":"1.0","type":"video","title":"Clip"}"#;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn registry(config: RegistryConfig, gateway: &Arc<FakeGateway>) -> Registry<Arc<FakeGateway>> {
        Registry::new(config, Arc::clone(gateway)).unwrap()
    }

    #[test]
    fn test_is_allowed_empty_allows_all() {
        let gateway = Arc::new(FakeGateway::new());
        let registry = registry(RegistryConfig::default(), &gateway);

        for url in ["https://example.com/", "http://anything.test/x?y=1", "", "not a url"] {
            assert!(registry.is_allowed(url), "{url} rejected");
        }
    }

    #[test]
    fn test_is_allowed_any_pattern_suffices() {
        let gateway = Arc::new(FakeGateway::new());
        let config = RegistryConfig {
            allowed_url_patterns: vec![r"^https://a\.test/".into(), r"^https://b\.test/".into()],
            ..Default::default()
        };
        let registry = registry(config, &gateway);

        assert!(registry.is_allowed("https://a.test/1"));
        assert!(registry.is_allowed("https://b.test/2"));
        assert!(!registry.is_allowed("https://c.test/3"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let config = RegistryConfig {
            endpoints: vec![EndpointConfig::new("(unclosed", "https://provider.test/oembed")],
            ..Default::default()
        };
        let err = Registry::new(config, FakeGateway::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { pattern, .. } if pattern == "(unclosed"));

        let config = RegistryConfig { allowed_url_patterns: vec!["[".into()], ..Default::default() };
        assert!(matches!(Registry::new(config, FakeGateway::new()), Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_find_endpoint_first_match_wins() {
        let gateway = Arc::new(FakeGateway::new());
        let config = RegistryConfig {
            endpoints: vec![
                EndpointConfig::new(r"example\.com/videos", "https://videos.test/oembed"),
                EndpointConfig::new(r"example\.com", "https://generic.test/oembed"),
            ],
            ..Default::default()
        };
        let registry = registry(config, &gateway);

        let endpoint = registry.find_endpoint("https://example.com/videos/1").unwrap();
        assert_eq!(endpoint.oembed_url(), "https://videos.test/oembed");

        let endpoint = registry.find_endpoint("https://example.com/photos/1").unwrap();
        assert_eq!(endpoint.oembed_url(), "https://generic.test/oembed");

        assert!(registry.find_endpoint("https://other.test/").is_none());
    }

    #[test]
    fn test_delimited_patterns() {
        let gateway = Arc::new(FakeGateway::new());
        let youtube = r"/http:\/\/www\.youtube\.com/";
        let config = RegistryConfig {
            endpoints: vec![EndpointConfig::new(youtube, "https://www.youtube.com/oembed")],
            allowed_url_patterns: vec![youtube.into()],
            ..Default::default()
        };
        let registry = registry(config, &gateway);

        assert!(registry.is_allowed("http://www.youtube.com/watch?v=abc"));
        assert!(!registry.is_allowed("http://vimeo.com/1"));
        let endpoint = registry.find_endpoint("http://www.youtube.com/watch?v=abc").unwrap();
        assert_eq!(endpoint.oembed_url(), "https://www.youtube.com/oembed");
        assert_eq!(registry.entries()[0].pattern().as_str(), r"http://www\.youtube\.com");
    }

    #[test]
    fn test_delimited_pattern_flags() {
        let gateway = Arc::new(FakeGateway::new());
        let config = RegistryConfig {
            endpoints: vec![EndpointConfig::new(r"/EXAMPLE\.com/i", "https://provider.test/oembed")],
            allowed_url_patterns: vec![r"#^HTTPS://#iu".into()],
            ..Default::default()
        };
        let registry = registry(config, &gateway);

        assert!(registry.is_allowed("https://example.com/item/1"));
        assert!(!registry.is_allowed("http://example.com/item/1"));
        assert!(registry.find_endpoint("https://example.com/item/1").is_some());
        assert_eq!(registry.entries()[0].pattern().as_str(), r"(?i)EXAMPLE\.com");
    }

    #[test]
    fn test_bare_patterns_untouched() {
        for (pattern, source) in [
            (r"example\.com", r"example\.com"),
            (r"/videos/\d+", r"/videos/\d+"),
            (r"^https://a\.test/", r"^https://a\.test/"),
        ] {
            assert_eq!(compile_pattern(pattern).unwrap().as_str(), source);
        }
        assert!(compile_pattern(r"/videos/\d+").unwrap().is_match("https://v.test/videos/12"));
    }

    #[test]
    fn test_get_endpoint_by_key() {
        let gateway = Arc::new(FakeGateway::new());
        let config = RegistryConfig {
            endpoints: vec![
                EndpointConfig::new(r"a\.test", "https://a.test/oembed"),
                EndpointConfig::new(r"b\.test", "https://b.test/oembed").with_name("bee"),
            ],
            ..Default::default()
        };
        let registry = registry(config, &gateway);

        assert_eq!(registry.get_endpoint("0").unwrap().oembed_url(), "https://a.test/oembed");
        assert_eq!(registry.get_endpoint("bee").unwrap().oembed_url(), "https://b.test/oembed");
        assert!(matches!(registry.get_endpoint("1"), Err(Error::NoEndpointFound(_))));
        assert!(matches!(registry.get_endpoint("missing"), Err(Error::NoEndpointFound(_))));
        assert_eq!(registry.entries()[1].key(), "bee");
    }

    #[tokio::test]
    async fn test_get_two_matching_entries_uses_first() {
        let gateway = Arc::new(FakeGateway::new().respond(200, VIDEO_JSON));
        let config = RegistryConfig {
            endpoints: vec![
                EndpointConfig::new(r"example\.com", "https://first.test/oembed"),
                EndpointConfig::new(r"example", "https://second.test/oembed"),
            ],
            ..Default::default()
        };

        registry(config, &gateway).get("https://example.com/x", &Params::new()).await.unwrap();

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "https://first.test/oembed");
    }

    #[tokio::test]
    async fn test_get_not_allowed_makes_no_request() {
        let gateway = Arc::new(FakeGateway::new().respond(200, VIDEO_JSON));
        let config = RegistryConfig {
            endpoints: vec![EndpointConfig::new(".*", "https://provider.test/oembed")],
            discovery: true,
            allowed_url_patterns: vec![r"^https://allowed\.test/".into()],
        };

        let err = registry(config, &gateway).get("https://blocked.test/x", &Params::new()).await.unwrap_err();

        assert!(matches!(err, Error::NotAllowedUrl(_)));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_no_entries_no_discovery_makes_no_request() {
        let gateway = Arc::new(FakeGateway::new());
        let registry = registry(RegistryConfig::default(), &gateway);

        for url in ["https://example.com/a", "https://other.test/b"] {
            let err = registry.get(url, &Params::new()).await.unwrap_err();
            assert!(matches!(err, Error::NoEndpointFound(_)));
        }
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_propagates_endpoint_errors() {
        let gateway = Arc::new(FakeGateway::new().respond(501, "").respond(200, "not json"));
        let config = RegistryConfig {
            endpoints: vec![EndpointConfig::new(r"example\.com", "https://provider.test/oembed")],
            ..Default::default()
        };
        let registry = registry(config, &gateway);

        let err = registry.get("https://example.com/1", &Params::new()).await.unwrap_err();
        assert!(matches!(err, Error::NotImplemented(_)));

        let err = registry.get("https://example.com/2", &Params::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_get_discovery_no_link() {
        let gateway = Arc::new(FakeGateway::new().respond(200, "<html><head></head></html>"));
        let config = RegistryConfig { discovery: true, ..Default::default() };

        let err = registry(config, &gateway).get("https://blog.test/post", &Params::new()).await.unwrap_err();

        assert!(matches!(err, Error::NoOEmbedLinkFound(url) if url == "https://blog.test/post"));
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_get_discovery_resource_missing() {
        let gateway = Arc::new(FakeGateway::new().respond(404, "<html></html>"));
        let config = RegistryConfig { discovery: true, ..Default::default() };

        let err = registry(config, &gateway).get("https://blog.test/gone", &Params::new()).await.unwrap_err();

        assert!(matches!(err, Error::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn test_get_discovery_calls_discovered_url() {
        let page = r#"<link rel="alternate" type="application/json+oembed" href="https://provider.test/oembed?url=x&format=json">"#;
        let gateway = Arc::new(FakeGateway::new().respond(200, page).respond(200, VIDEO_JSON));
        let config = RegistryConfig {
            endpoints: vec![EndpointConfig::new(r"video\.test", "https://video.test/oembed")],
            discovery: true,
            ..Default::default()
        };

        let oembed = registry(config, &gateway)
            .get("https://blog.test/post", &params(&[("maxwidth", "300")]))
            .await
            .unwrap();

        assert_eq!(oembed.title(), Some("Clip"));

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].url, "https://blog.test/post");
        assert_eq!(calls[0].method, Method::Get);
        assert_eq!(calls[0].params, RequestParams::None);
        assert_eq!(calls[1].url, "https://provider.test/oembed?url=x&format=json");
        assert_eq!(calls[1].params, RequestParams::Map(params(&[("maxwidth", "300")])));
    }

    #[tokio::test]
    async fn test_get_transport_error_propagates() {
        let gateway = Arc::new(FakeGateway::new().fail(Error::Transport { message: "timed out".into(), timeout: true }));
        let config = RegistryConfig {
            endpoints: vec![EndpointConfig::new(r"example\.com", "https://provider.test/oembed")],
            ..Default::default()
        };

        let err = registry(config, &gateway).get("https://example.com/1", &Params::new()).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_get_round_trip_over_http() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/oembed")
                .query_param("width", "200")
                .query_param("url", "https://example.com/item/1");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"version":"1.0","type":"video"}"#);
        });

        let config = RegistryConfig {
            endpoints: vec![EndpointConfig::new(r"/example\.com/", server.url("/oembed")).with_param("width", "200")],
            ..Default::default()
        };
        let gateway = ReqwestGateway::new(GatewayOptions::default()).unwrap();
        let registry = Registry::new(config, gateway).unwrap();

        let oembed = registry.get("https://example.com/item/1", &Params::new()).await.unwrap();

        mock.assert();
        assert_eq!(oembed.version(), Some("1.0"));
    }

    #[tokio::test]
    async fn test_get_discovery_over_http() {
        let server = MockServer::start();
        let oembed_url = server.url("/oembed?url=post&format=json");
        let page = format!(r#"<html><head><link type="application/json+oembed" href="{oembed_url}"></head></html>"#);

        let page_mock = server.mock(|when, then| {
            when.method(GET).path("/post");
            then.status(200).body(&page);
        });
        let oembed_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/oembed")
                .query_param("url", "post")
                .query_param("format", "json")
                .query_param("maxwidth", "300");
            then.status(200).body(r#"{"version":"1.0","type":"rich","html":"<div></div>"}"#);
        });

        let config = RegistryConfig { discovery: true, ..Default::default() };
        let registry = Registry::new(config, ReqwestGateway::new(GatewayOptions::default()).unwrap()).unwrap();

        let oembed = registry
            .get(&server.url("/post"), &params(&[("maxwidth", "300")]))
            .await
            .unwrap();

        page_mock.assert();
        oembed_mock.assert();
        assert_eq!(oembed.html(), Some("<div></div>"));
    }

    #[test]
    fn test_from_app_config() {
        let config = AppConfig {
            endpoints: vec![EndpointConfig::new(r"example\.com", "https://provider.test/oembed").with_name("ex")],
            discovery: true,
            ..Default::default()
        };
        let registry = Registry::from_app_config(&config).unwrap();

        assert!(registry.discovery_enabled());
        assert_eq!(registry.entries().len(), 1);
        assert_eq!(registry.gateway().options().user_agent.as_deref(), Some("oembed-rs/0.1"));
        assert_eq!(registry.get_endpoint("ex").unwrap().oembed_url(), "https://provider.test/oembed");
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
