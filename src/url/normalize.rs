use url::Url;

/// Normalizes a URL into the canonical form used for crawl deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; return `None` if malformed or host-less
/// 2. Keep scheme, host (lowercased by the parser) and explicit port
/// 3. Drop the query string and fragment
/// 4. Strip a single trailing slash
///
/// Malformed input yields `None` rather than an error so callers can skip
/// the link silently.
///
/// # Examples
///
/// ```
/// use faq_forge::url::normalize_url;
///
/// assert_eq!(
///     normalize_url("https://Example.com/docs/?page=2#top").as_deref(),
///     Some("https://example.com/docs")
/// );
/// assert_eq!(normalize_url("not a url"), None);
/// ```
pub fn normalize_url(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str.trim()).ok()?;
    let host = url.host_str()?;

    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let canonical = format!("{}://{}{}", url.scheme(), authority, url.path());

    Some(match canonical.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => canonical,
    })
}

/// Returns true if the string is an absolute HTTP(S) URL with a host
///
/// Used to validate seed URLs before a crawl is accepted.
pub fn is_crawlable_seed(url_str: &str) -> bool {
    match Url::parse(url_str.trim()) {
        Ok(url) => {
            (url.scheme() == "http" || url.scheme() == "https") && url.host_str().is_some()
        }
        Err(_) => false,
    }
}
