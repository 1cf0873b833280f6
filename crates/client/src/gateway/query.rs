//! Query string building and merging.

use oembed_core::Params;
use url::form_urlencoded;

/// Form-encode parameters (`a=1&b=x%2Fy`).
pub fn to_query_string(params: &Params) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Append an encoded query to a URL, joining with `&` if it already has a query.
///
/// An empty query leaves the URL untouched.
pub fn add_params_to_url(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// Decode a query string into parameters. A leading `?` is ignored.
pub fn parse_query(query: &str) -> Params {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

/// Merge two parameter sets; `extra` wins on conflicting keys.
pub fn merge_params(base: &Params, extra: &Params) -> Params {
    let mut merged = base.clone();
    merged.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}
