//! The decoded oEmbed document.
//!
//! Providers disagree on the exact schema, so the document is kept as the raw
//! JSON object. Accessors cover the fields defined at <https://oembed.com/>;
//! callers needing more can [`OEmbed::get`] any key or deserialize into their
//! own type.

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::Error;

/// The `type` field of an oEmbed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OEmbedType {
    Photo,
    Video,
    Link,
    Rich,

    #[serde(other)]
    Unknown,
}

impl OEmbedType {
    fn parse(kind: &str) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "photo" => OEmbedType::Photo,
            "video" => OEmbedType::Video,
            "link" => OEmbedType::Link,
            "rich" => OEmbedType::Rich,
            _ => OEmbedType::Unknown,
        }
    }
}

/// A decoded oEmbed response: always a non-empty JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OEmbed(Map<String, Value>);

impl OEmbed {
    /// Decode a response body.
    ///
    /// Fails with [`Error::InvalidResponse`] when the body is not JSON, or
    /// decodes to anything other than a non-empty object (`""`, `null`, `[]`,
    /// `{}`, scalars).
    pub fn from_json(body: &str) -> Result<Self, Error> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| Error::InvalidResponse(format!("body is not valid JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Wrap an already decoded value, applying the same checks as [`OEmbed::from_json`].
    pub fn from_value(value: Value) -> Result<Self, Error> {
        match value {
            Value::Object(map) if !map.is_empty() => Ok(Self(map)),
            Value::Object(_) => Err(Error::InvalidResponse("empty JSON object".into())),
            other => Err(Error::InvalidResponse(format!("expected a JSON object, got {}", json_kind(&other)))),
        }
    }

    /// Raw lookup of any field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Dimensions arrive as numbers or numeric strings depending on the provider.
    fn dimension(&self, key: &str) -> Option<u32> {
        match self.0.get(key)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The `version` field. Numeric versions are not coerced.
    pub fn version(&self) -> Option<&str> {
        self.str_field("version")
    }

    /// The `type` field, [`OEmbedType::Unknown`] when missing or unrecognized.
    pub fn kind(&self) -> OEmbedType {
        self.str_field("type").map(OEmbedType::parse).unwrap_or(OEmbedType::Unknown)
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn html(&self) -> Option<&str> {
        self.str_field("html")
    }

    pub fn url(&self) -> Option<&str> {
        self.str_field("url")
    }

    pub fn author_name(&self) -> Option<&str> {
        self.str_field("author_name")
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.str_field("provider_name")
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.str_field("thumbnail_url")
    }

    pub fn width(&self) -> Option<u32> {
        self.dimension("width")
    }

    pub fn height(&self) -> Option<u32> {
        self.dimension("height")
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Deserialize the document into a caller-defined schema.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

impl TryFrom<Value> for OEmbed {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl<'de> Deserialize<'de> for OEmbed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::deserialize(deserializer)?;
        if map.is_empty() {
            return Err(de::Error::custom("empty oEmbed object"));
        }
        Ok(Self(map))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
