use url::Url;

/// Extracts the domain from a URL string
///
/// Returns the lowercase host portion, or `None` when the string does not
/// parse or has no host.
///
/// # Examples
///
/// ```
/// use faq_forge::url::extract_domain;
///
/// assert_eq!(extract_domain("https://EXAMPLE.COM/path"), Some("example.com".to_string()));
/// assert_eq!(extract_domain("https://sub.example.com:8080/"), Some("sub.example.com".to_string()));
/// assert_eq!(extract_domain("garbage"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.to_lowercase())
}

/// Returns true if `url` parses and its hostname equals `domain`
///
/// Parse failures compare as different domains.
pub fn same_domain(url: &str, domain: &str) -> bool {
    extract_domain(url)
        .map(|host| host.eq_ignore_ascii_case(domain))
        .unwrap_or(false)
}
