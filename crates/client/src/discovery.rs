//! oEmbed discovery through `<link>` tags.
//!
//! Every `<link ...>` tag is matched with a regular expression, and a tag
//! qualifies when its raw text contains `application/json+oembed`. No HTML
//! parsing happens. The `href` value is returned exactly as written
//! (entities included).
//!
//! See <https://oembed.com/#section4>.

use std::sync::LazyLock;

use oembed_core::Error;
use regex::Regex;

use crate::gateway::{HttpGateway, RequestParams};

/// `type` value of a JSON oEmbed discovery link.
pub const OEMBED_JSON_TYPE: &str = "application/json+oembed";

static LINK_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<link[^>]+>").expect("invalid link regex"));

/// First JSON oEmbed link advertised in `html`, or `None`.
///
/// This is not strictly the first qualifying tag: a tag that mentions
/// `application/json+oembed` but has no usable `href` is skipped, and the
/// scan moves on to the next one.
pub fn find_oembed_link(html: &str) -> Option<String> {
    LINK_TAG
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|tag| tag.contains(OEMBED_JSON_TYPE))
        .find_map(href_value)
        .map(str::to_string)
}

/// Value of the first `href=` attribute of a tag, quoted or not.
fn href_value(tag: &str) -> Option<&str> {
    // Plain substring search, as lenient as the scan itself: `data-href=` can
    // shadow a later `href=`, and `href = "..."` is not recognized.
    // ASCII lowercasing keeps byte offsets intact.
    let start = tag.to_ascii_lowercase().find("href=")? + "href=".len();
    let rest = &tag[start..];

    let value = match rest.chars().next()? {
        quote @ ('"' | '\'') => {
            let rest = &rest[1..];
            &rest[..rest.find(quote)?]
        }
        _ => {
            let end = rest
                .find(|c: char| c.is_ascii_whitespace() || c == '>')
                .unwrap_or(rest.len());
            let value = &rest[..end];
            // Only the `/` of a self-closing `/>` belongs to the tag.
            if rest[end..].starts_with('>') { value.strip_suffix('/').unwrap_or(value) } else { value }
        }
    };

    let value = value.trim();
    if value.is_empty() { None } else { Some(value) }
}

/// Fetch `resource_url` and return the oEmbed URL it advertises.
///
/// # Errors
///
/// - [`Error::ResourceNotFound`] if the page itself answers 404
/// - [`Error::Transport`] if the page could not be fetched
pub async fn find_oembed_url<G>(gateway: &G, resource_url: &str) -> Result<Option<String>, Error>
where
    G: HttpGateway + ?Sized,
{
    let response = gateway.get(resource_url, RequestParams::None).await?;

    if response.http_code() == Some(404) {
        return Err(Error::ResourceNotFound(resource_url.to_string()));
    }

    let link = find_oembed_link(response.content());
    match &link {
        Some(url) => tracing::debug!("discovered oEmbed link for {}: {}", resource_url, url),
        None => tracing::debug!("no oEmbed link advertised by {}", resource_url),
    }

    Ok(link)
}
