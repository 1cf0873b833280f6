//! Raw HTTP response paired with transport metadata.

use std::collections::HashMap;

use serde_json::Value;

/// Transport metadata recorded for one exchange.
pub type TransportInfo = HashMap<String, Value>;

/// Status code of the final response.
pub const HTTP_CODE: &str = "http_code";
/// URL of the final response, after redirects.
pub const FINAL_URL: &str = "url";
/// `Content-Type` header, when present.
pub const CONTENT_TYPE: &str = "content_type";
/// `Content-Length` header, when present.
pub const CONTENT_LENGTH: &str = "content_length";
/// Bytes of body actually read.
pub const SIZE_DOWNLOAD: &str = "size_download";
/// Wall time of the exchange in milliseconds.
pub const TOTAL_TIME_MS: &str = "total_time_ms";

/// Body of a response plus whatever the transport reported about it.
///
/// Lookups of metadata the transport did not record yield `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    body: String,
    info: TransportInfo,
}

impl RawResponse {
    pub fn new(body: impl Into<String>, info: TransportInfo) -> Self {
        Self { body: body.into(), info }
    }

    /// Response with only a status code recorded.
    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        let mut info = TransportInfo::new();
        info.insert(HTTP_CODE.to_string(), Value::from(status));
        Self::new(body, info)
    }

    /// The HTTP status code, `None` if the transport did not record one.
    pub fn http_code(&self) -> Option<u16> {
        self.info
            .get(HTTP_CODE)
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
    }

    pub fn content(&self) -> &str {
        &self.body
    }

    pub fn into_content(self) -> String {
        self.body
    }

    /// Named lookup into the transport metadata.
    pub fn info_value(&self, name: &str) -> Option<&Value> {
        self.info.get(name)
    }

    /// All transport metadata.
    pub fn info(&self) -> &TransportInfo {
        &self.info
    }

    /// URL of the final response, if recorded.
    pub fn final_url(&self) -> Option<&str> {
        self.info_value(FINAL_URL).and_then(Value::as_str)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.http_code(), Some(200..=299))
    }
}
