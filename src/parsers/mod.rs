pub mod html;

/// Content types a browser renders as an HTML document
const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Returns whether a `Content-Type` value (parameters allowed) denotes HTML
pub fn is_html_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    HTML_CONTENT_TYPES.contains(&essence.as_str())
}

/// Title and anchors extracted from a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    /// Text of the first `<title>` element, trimmed
    pub title: String,
    /// `href` of every anchor, in document order
    pub links: Vec<String>,
}

impl ParseResult {
    /// Creates a new parse result with the given title and links
    pub fn new(title: String, links: Vec<String>) -> Self {
        Self { title, links }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_content_types() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("Application/XHTML+XML"));
        assert!(!is_html_content_type("application/pdf"));
        assert!(!is_html_content_type("text/plain"));
        assert!(!is_html_content_type(""));
    }
}
