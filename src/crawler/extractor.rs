//! HTML content extraction
//!
//! This module turns a fetched HTML document into:
//! - A title, heading outline and paragraph list
//! - FAQ-like blocks (elements marked as FAQs, definition terms, questions)
//! - A labeled plain-text rendering used as generation input
//! - The set of same-domain links to follow

use crate::url::{normalize_url, same_domain};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// Elements stripped before any text is read
const NON_CONTENT_SELECTOR: &str = "script, style, nav, header, footer, aside, iframe, noscript, \
                                    svg, .advertisement, .ads, #cookie-banner, .modal";

const FAQ_BLOCK_SELECTOR: &str = r#"[class*="faq"], [id*="faq"], dt, .question"#;

/// Paragraphs at or below this many characters are dropped as noise
const MIN_PARAGRAPH_CHARS: usize = 30;

const UNTITLED: &str = "Untitled Page";

const BINARY_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "gif", "zip", "exe", "dmg"];

/// A level 1-3 heading in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// Readable content extracted from one page
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub title: String,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub faq_sections: Vec<String>,
    /// Labeled concatenation of the blocks above, or collapsed body text
    pub text: String,
    pub word_count: u32,
}

/// Extracts readable content from an HTML document
///
/// # Extraction Rules
///
/// - Non-content elements (scripts, navigation, ads, banners) are removed first
/// - Title falls back from `<title>` to the first `<h1>` to "Untitled Page"
/// - Headings are `h1`-`h3` with non-empty text
/// - Paragraphs are `<p>` elements longer than 30 characters once trimmed
/// - When no block yields anything, the text is the whole body with whitespace collapsed
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `page_url` - The URL the document was fetched from
pub fn extract_content(html: &str, page_url: &str) -> ExtractedContent {
    let mut document = Html::parse_document(html);
    strip_non_content(&mut document);

    let title = extract_title(&document);
    let headings = extract_headings(&document);
    let paragraphs = select_texts(&document, "p")
        .into_iter()
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect::<Vec<_>>();
    let faq_sections = select_texts(&document, FAQ_BLOCK_SELECTOR);

    let mut text = render_text(&headings, &paragraphs, &faq_sections);
    if text.is_empty() {
        text = body_text(&document);
    }

    let word_count = text.split_whitespace().count() as u32;

    tracing::debug!(
        url = page_url,
        headings = headings.len(),
        paragraphs = paragraphs.len(),
        word_count,
        "Extracted page content"
    );

    ExtractedContent {
        title,
        headings,
        paragraphs,
        faq_sections,
        text,
        word_count,
    }
}

/// Extracts the normalized same-domain links of a page
///
/// Relative hrefs are resolved against `base_url`. Results are normalized,
/// restricted to `domain`, stripped of binary file targets and anything already
/// in `visited`, and deduplicated in document order.
pub fn extract_links(
    html: &str,
    base_url: &str,
    domain: &str,
    visited: &HashSet<String>,
) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_link(href, &base) else {
            continue;
        };
        let Some(normalized) = normalize_url(&absolute) else {
            continue;
        };

        if !same_domain(&normalized, domain)
            || is_binary_target(&normalized)
            || visited.contains(&normalized)
        {
            continue;
        }

        if seen.insert(normalized.clone()) {
            links.push(normalized);
        }
    }

    links
}

fn strip_non_content(document: &mut Html) {
    let Ok(selector) = Selector::parse(NON_CONTENT_SELECTOR) else {
        return;
    };

    let ids: Vec<_> = document.select(&selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn select_texts(document: &Html, css: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
        .collect()
}

fn extract_title(document: &Html) -> String {
    ["title", "h1"]
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .next()
                .map(|el| element_text(&el))
                .filter(|text| !text.is_empty())
        })
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn extract_headings(document: &Html) -> Vec<Heading> {
    let Ok(selector) = Selector::parse("h1, h2, h3") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|el| {
            let level = el.value().name().get(1..)?.parse::<u8>().ok()?;
            let text = element_text(&el);
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .collect()
}

fn render_text(headings: &[Heading], paragraphs: &[String], faq_sections: &[String]) -> String {
    let mut blocks = Vec::new();

    if !headings.is_empty() {
        let outline = headings
            .iter()
            .map(|h| format!("{} {}", "#".repeat(h.level as usize), h.text))
            .collect::<Vec<_>>()
            .join("\n");
        blocks.push(format!("HEADINGS:\n{}", outline));
    }

    if !paragraphs.is_empty() {
        blocks.push(format!("CONTENT:\n{}", paragraphs.join("\n\n")));
    }

    if !faq_sections.is_empty() {
        blocks.push(format!("FAQ SECTIONS:\n{}", faq_sections.join("\n")));
    }

    blocks.join("\n\n").trim().to_string()
}

fn body_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|body| {
            body.text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Checks the extension of the last path segment, ignoring host and query
fn is_binary_target(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let last_segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let Some((_, ext)) = last_segment.rsplit_once('.') else {
        return false;
    };
    BINARY_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then(|| absolute.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://example.com/help";

    fn links(html: &str) -> Vec<String> {
        extract_links(html, PAGE_URL, "example.com", &HashSet::new())
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let html = r#"
            <html>
            <head><title>Help Center</title></head>
            <body>
                <h2>Getting started</h2>
                <p>Create an account from the sign up page in under a minute.</p>
                <p>Too short.</p>
                <h2>Billing</h2>
                <p>Invoices are emailed on the first business day of each month.</p>
                <p>Tiny text</p>
                <h2>Support</h2>
                <p>Our support team answers tickets within one business day.</p>
            </body>
            </html>
        "#;

        let content = extract_content(html, PAGE_URL);

        assert_eq!(content.title, "Help Center");
        assert_eq!(content.headings.len(), 3);
        assert!(content.headings.iter().all(|h| h.level == 2));
        assert_eq!(content.headings[1].text, "Billing");
        assert_eq!(content.paragraphs.len(), 3);
        assert!(!content.paragraphs.iter().any(|p| p == "Too short."));
        assert_eq!(
            content.word_count as usize,
            content.text.split_whitespace().count()
        );
    }

    #[test]
    fn test_text_layout() {
        let html = r#"
            <html><body>
                <h1>Plans</h1>
                <h3>Annual</h3>
                <p>Annual plans are billed once per year at a discounted rate.</p>
                <p>Monthly plans can be cancelled at any time without a fee.</p>
            </body></html>
        "#;

        let content = extract_content(html, PAGE_URL);
        assert_eq!(
            content.text,
            "HEADINGS:\n# Plans\n### Annual\n\nCONTENT:\n\
             Annual plans are billed once per year at a discounted rate.\n\n\
             Monthly plans can be cancelled at any time without a fee."
        );
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let html = r#"<html><head><title>   </title></head><body><h1>Welcome</h1></body></html>"#;
        assert_eq!(extract_content(html, PAGE_URL).title, "Welcome");
    }

    #[test]
    fn test_untitled_page() {
        let html = r#"<html><body><p>Nothing here.</p></body></html>"#;
        assert_eq!(extract_content(html, PAGE_URL).title, "Untitled Page");
    }

    #[test]
    fn test_non_content_removed() {
        let html = r#"
            <html><body>
                <nav><h2>Menu</h2></nav>
                <header><h1>Site header</h1></header>
                <script>var x = "a paragraph-length string inside a script tag";</script>
                <div class="ads"><p>Buy now and save a lot of money on everything today.</p></div>
                <div id="cookie-banner"><p>We use cookies to improve your experience on this site.</p></div>
                <main>
                    <h2>Returns</h2>
                    <p>Items can be returned within thirty days of delivery.</p>
                </main>
                <footer><p>Copyright notice that is long enough to count as a paragraph.</p></footer>
            </body></html>
        "#;

        let content = extract_content(html, PAGE_URL);
        assert_eq!(content.headings.len(), 1);
        assert_eq!(content.headings[0].text, "Returns");
        assert_eq!(content.paragraphs.len(), 1);
        assert!(!content.text.contains("cookies"));
        assert!(!content.text.contains("Copyright"));
    }

    #[test]
    fn test_faq_sections() {
        let html = r#"
            <html><body>
                <dl>
                    <dt>Do you ship abroad?</dt>
                    <dd>Yes.</dd>
                </dl>
                <div class="question">Can I change my order?</div>
            </body></html>
        "#;

        let content = extract_content(html, PAGE_URL);
        assert_eq!(
            content.faq_sections,
            vec!["Do you ship abroad?", "Can I change my order?"]
        );
        assert!(content.text.starts_with("FAQ SECTIONS:\n"));
    }

    #[test]
    fn test_body_fallback() {
        let html = "<html><body><div>Short\n\n   bits</div><span>of   text</span></body></html>";
        let content = extract_content(html, PAGE_URL);
        assert_eq!(content.text, "Short bits of text");
        assert_eq!(content.word_count, 4);
    }

    #[test]
    fn test_links_same_domain_only() {
        let html = r#"
            <a href="/pricing">Pricing</a>
            <a href="https://other.com/page">Other</a>
            <a href="https://sub.example.com/x">Subdomain</a>
        "#;
        assert_eq!(links(html), vec!["https://example.com/pricing"]);
    }

    #[test]
    fn test_links_are_normalized_and_deduplicated() {
        let html = r#"
            <a href="/pricing/">Pricing</a>
            <a href="/pricing?ref=nav">Pricing</a>
            <a href="/pricing#plans">Pricing</a>
            <a href="pricing">Pricing</a>
        "#;
        assert_eq!(links(html), vec!["https://example.com/pricing"]);
    }

    #[test]
    fn test_links_skip_binary_files() {
        let html = r#"
            <a href="/guide.PDF">Guide</a>
            <a href="/logo.png">Logo</a>
            <a href="/setup.dmg">Installer</a>
            <a href="/docs">Docs</a>
        "#;
        assert_eq!(links(html), vec!["https://example.com/docs"]);
    }

    #[test]
    fn test_binary_check_uses_path_only() {
        assert!(is_binary_target("https://a.test/doc.PDF"));
        assert!(is_binary_target("https://a.test/files/report.pdf?download=1"));
        assert!(!is_binary_target("https://example.pdf"));
        assert!(!is_binary_target("https://example.pdf/pricing"));
        assert!(!is_binary_target("https://a.test/files.zip/readme"));
        assert!(!is_binary_target("https://a.test/search?format=pdf"));
    }

    #[test]
    fn test_links_skip_visited() {
        let html = r#"<a href="/a">A</a><a href="/b">B</a>"#;
        let visited: HashSet<String> = ["https://example.com/a".to_string()].into();
        assert_eq!(
            extract_links(html, PAGE_URL, "example.com", &visited),
            vec!["https://example.com/b"]
        );
    }

    #[test]
    fn test_links_skip_special_schemes() {
        let html = r##"
            <a href="javascript:void(0)">JS</a>
            <a href="mailto:help@example.com">Mail</a>
            <a href="tel:+15555550100">Call</a>
            <a href="#top">Top</a>
            <a href="ftp://example.com/file">FTP</a>
        "##;
        assert!(links(html).is_empty());
    }

    #[test]
    fn test_links_with_bad_base() {
        assert!(extract_links("<a href=\"/x\">x</a>", "not a url", "example.com", &HashSet::new())
            .is_empty());
    }
}
