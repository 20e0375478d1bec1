use crate::UrlError;
use url::Url;

/// Normalizes a URL into the form used for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require the `http` or `https` scheme
/// 3. Require a host (the parser lowercases it and drops default ports)
/// 4. Remove fragment (everything after #)
///
/// Scheme, host, path and query are otherwise kept as-is, so `/a#x` and
/// `/a#y` collapse to the same key while `/a?x` and `/a?y` do not.
///
/// # Examples
///
/// ```
/// use sitecrawl::url::normalize_url;
///
/// let url = normalize_url("http://EX.TEST/page#section").unwrap();
/// assert_eq!(url.as_str(), "http://ex.test/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Returns the visited-set key for a URL string
///
/// Falls back to the raw string when the URL cannot be normalized, so a
/// malformed entry still deduplicates against itself.
pub fn visit_key(url_str: &str) -> String {
    match normalize_url(url_str) {
        Ok(url) => url.into(),
        Err(_) => url_str.to_string(),
    }
}
