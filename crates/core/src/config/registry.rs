//! Registry and transport configuration handed to the client.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Query parameters sent to an oEmbed endpoint.
pub type Params = BTreeMap<String, String>;

/// One registry entry: resource URLs matching `pattern` are served by `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Key for direct lookup. Defaults to the entry's position in the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Regular expression tested against the resource URL.
    pub pattern: String,

    /// oEmbed endpoint URL.
    pub url: String,

    /// Default parameters sent with every call (e.g. `maxwidth`, API tokens).
    ///
    /// Scalars are accepted so that `{ width = 200 }` works in TOML.
    #[serde(default, deserialize_with = "scalar_params", skip_serializing_if = "BTreeMap::is_empty")]
    pub params: Params,
}

impl EndpointConfig {
    pub fn new(pattern: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: None, pattern: pattern.into(), url: url.into(), params: Params::new() }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Everything a registry needs, fixed at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Ordered entries; the first matching pattern wins.
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    /// Fetch the resource page and look for a `<link>` tag when nothing matches.
    #[serde(default)]
    pub discovery: bool,

    /// Resource URL patterns that may be looked up. Empty allows everything.
    #[serde(default)]
    pub allowed_url_patterns: Vec<String>,
}

/// Transport options for the HTTP gateway.
///
/// `None` leaves the HTTP client's own default in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayOptions {
    /// Sent as the `User-Agent` header.
    pub user_agent: Option<String>,
    /// Caps the connection phase only.
    pub connect_timeout: Option<Duration>,
    /// Caps the whole exchange, body included.
    pub timeout: Option<Duration>,
    /// `false` accepts invalid TLS certificates.
    pub verify_tls_peer: Option<bool>,
    /// `0` disables redirects.
    pub max_redirects: Option<usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParamValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl ParamValue {
    fn into_string(self) -> String {
        match self {
            ParamValue::Text(s) => s,
            ParamValue::Integer(i) => i.to_string(),
            ParamValue::Float(f) => f.to_string(),
            ParamValue::Flag(b) => if b { "1" } else { "0" }.to_string(),
        }
    }
}

fn scalar_params<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Params, D::Error> {
    let raw = BTreeMap::<String, ParamValue>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into_string())).collect())
}
