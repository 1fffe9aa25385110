use crate::parsers::ParseResult;
use scraper::{Html, Selector};

/// Parses HTML content to extract the title and raw anchor hrefs
pub fn parse(html: &str) -> ParseResult {
    let doc = Html::parse_document(html);
    let title = extract_title(&doc);
    let links = extract_links(&doc);

    ::log::debug!("HTML parser found {} links", links.len());
    if !links.is_empty() {
        ::log::trace!(
            "First few links: {:?}",
            links.iter().take(5).collect::<Vec<_>>()
        );
    }

    ParseResult::new(title, links)
}

/// Parses HTML content and only extracts links (no title)
pub fn parse_links_only(html: &str) -> Vec<String> {
    extract_links(&Html::parse_document(html))
}

fn extract_title(doc: &Html) -> String {
    let Some(selector) = selector("title") else {
        return String::new();
    };
    doc.select(&selector)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn extract_links(doc: &Html) -> Vec<String> {
    let Some(selector) = selector("a[href]") else {
        return Vec::new();
    };
    doc.select(&selector)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.to_string())
        .collect()
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            ::log::error!("Invalid selector {:?}: {}", css, e);
            None
        }
    }
}
