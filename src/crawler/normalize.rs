use std::collections::HashSet;
use url::Url;

/// Canonical form of one href, or `None` if it cannot become a crawl target
///
/// Resolves against `base`, drops the fragment and rejects anything that is
/// not http(s) or fails to parse.
pub fn normalize_link(href: &str, base: &Url) -> Option<Url> {
    let mut resolved = match base.join(href.trim()) {
        Ok(url) => url,
        Err(e) => {
            ::log::trace!("Dropping malformed href {:?}: {}", href, e);
            return None;
        }
    };
    resolved.set_fragment(None);

    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        scheme => {
            ::log::trace!("Dropping {} link: {}", scheme, resolved);
            None
        }
    }
}

/// Normalizes raw hrefs found on the page at `base`
///
/// The output is deduplicated and keeps the order in which links first
/// appeared on the page.
pub fn normalize<S: AsRef<str>>(raw_links: &[S], base: &Url) -> Vec<Url> {
    let mut seen = HashSet::new();
    raw_links
        .iter()
        .filter_map(|href| normalize_link(href.as_ref(), base))
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}
