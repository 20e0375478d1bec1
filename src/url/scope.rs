use url::Url;

/// Resolves a link href against the page it was found on
///
/// Returns None if the link should be excluded:
/// - empty hrefs
/// - fragment-only links (same page anchors)
/// - javascript:, mailto:, tel: and data: schemes
/// - hrefs that fail to resolve
///
/// The fragment of the resolved URL is stripped.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    absolute.set_fragment(None);
    Some(absolute)
}

/// Returns true iff `candidate` is on the seed's host over http or https
///
/// Hosts are compared exactly, including any explicit port.
///
/// # Examples
///
/// ```
/// use sitecrawl::url::in_scope;
/// use url::Url;
///
/// let seed = Url::parse("http://ex.test/").unwrap();
/// assert!(in_scope(&Url::parse("https://ex.test/a").unwrap(), &seed));
/// assert!(!in_scope(&Url::parse("http://other.test/x").unwrap(), &seed));
/// ```
pub fn in_scope(candidate: &Url, seed: &Url) -> bool {
    if candidate.scheme() != "http" && candidate.scheme() != "https" {
        return false;
    }

    match (candidate.host_str(), seed.host_str()) {
        (Some(candidate_host), Some(seed_host)) => {
            candidate_host == seed_host && candidate.port() == seed.port()
        }
        _ => false,
    }
}
