//! Unified error types for the oEmbed client.
//!
//! Every failure of a lookup surfaces as exactly one of these variants. The
//! rendered message starts with a stable code so it can be logged or mapped
//! without matching on the variant.

/// Unified error type for oEmbed lookups.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The resource URL is not covered by the allow-list.
    #[error("NOT_ALLOWED_URL: {0}")]
    NotAllowedUrl(String),

    /// No registry entry matches and discovery is disabled, or a keyed lookup missed.
    #[error("NO_ENDPOINT_FOUND: {0}")]
    NoEndpointFound(String),

    /// Discovery ran but the page advertises no JSON oEmbed link.
    #[error("NO_OEMBED_LINK_FOUND: {0}")]
    NoOEmbedLinkFound(String),

    /// The resource page itself answered 404 during discovery.
    #[error("RESOURCE_NOT_FOUND: {0}")]
    ResourceNotFound(String),

    /// The oEmbed endpoint answered 401.
    #[error("UNAUTHORIZED: {0}")]
    Unauthorized(String),

    /// The oEmbed endpoint answered 404.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// The oEmbed endpoint answered 501.
    #[error("NOT_IMPLEMENTED: {0}")]
    NotImplemented(String),

    /// The endpoint body is not a non-empty JSON object.
    #[error("INVALID_RESPONSE: {0}")]
    InvalidResponse(String),

    /// DNS, connect, TLS or timeout failure below the HTTP layer.
    #[error("TRANSPORT_ERROR: {message}")]
    Transport { message: String, timeout: bool },

    /// A registry or allow-list pattern failed to compile.
    #[error("INVALID_PATTERN: {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A URL handed to the gateway could not be parsed.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotAllowedUrl(_) => "NOT_ALLOWED_URL",
            Error::NoEndpointFound(_) => "NO_ENDPOINT_FOUND",
            Error::NoOEmbedLinkFound(_) => "NO_OEMBED_LINK_FOUND",
            Error::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::NotFound(_) => "NOT_FOUND",
            Error::NotImplemented(_) => "NOT_IMPLEMENTED",
            Error::InvalidResponse(_) => "INVALID_RESPONSE",
            Error::Transport { .. } => "TRANSPORT_ERROR",
            Error::InvalidPattern { .. } => "INVALID_PATTERN",
            Error::InvalidUrl(_) => "INVALID_URL",
        }
    }

    /// Whether this is a transport failure caused by a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Transport { timeout: true, .. })
    }

    /// Whether the error came from the HTTP status of an oEmbed endpoint.
    pub fn is_endpoint_status(&self) -> bool {
        matches!(self, Error::Unauthorized(_) | Error::NotFound(_) | Error::NotImplemented(_))
    }
}
