//! Link normalization and collection

use anyhow::Result;
use std::collections::BTreeSet;
use url::Url;

/// Anchors found on a rendered page
#[derive(Debug, Default)]
pub struct PageAnchors {
    /// `href` of every `<a>` element, in document order
    pub hrefs: Vec<Option<String>>,
    /// Final page URL after redirects, used to resolve hrefs the DOM left relative
    pub base: Option<Url>,
}

/// Something that can render a page and list its anchors
#[allow(async_fn_in_trait)]
pub trait AnchorSource {
    async fn anchor_hrefs(&self, url: &str) -> Result<PageAnchors>;
}

/// Strip the fragment and query string from a link.
///
/// Operates on any string, not only well-formed URLs.
///
/// ```
/// use link_scan::normalize;
///
/// assert_eq!(normalize("https://x/y#frag"), "https://x/y");
/// assert_eq!(normalize("https://x/y#f?q=1"), "https://x/y");
/// ```
pub fn normalize(link: &str) -> &str {
    let link = link.split('#').next().unwrap_or_default();
    link.split('?').next().unwrap_or_default()
}

/// Normalize and dedupe anchor hrefs.
///
/// Empty hrefs and links that are empty after normalization are dropped.
/// Hrefs normally arrive already resolved by the browser; any that are
/// still relative are resolved against `base` when one is given.
pub fn collect_links<I>(hrefs: I, base: Option<&Url>) -> Vec<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut links = BTreeSet::new();

    for href in hrefs.into_iter().flatten() {
        if href.is_empty() {
            continue;
        }

        let resolved = match base {
            Some(base) => resolve(base, &href),
            None => href.to_string(),
        };

        let link = normalize(&resolved);
        if !link.is_empty() {
            links.insert(link.to_string());
        }
    }

    links.into_iter().collect()
}

/// Render `url` and return its unique normalized links
pub async fn collect_page_links<S: AnchorSource>(source: &S, url: &str) -> Result<Vec<String>> {
    let anchors = source.anchor_hrefs(url).await?;
    tracing::debug!("{} anchors on {}", anchors.hrefs.len(), url);
    Ok(collect_links(anchors.hrefs, anchors.base.as_ref()))
}

// Absolute hrefs pass through untouched so non-http schemes keep their form.
fn resolve(base: &Url, href: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    base.join(href)
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}
