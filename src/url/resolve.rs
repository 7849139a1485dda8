use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves a company link href to an absolute URL
///
/// Empty or whitespace-only hrefs are rejected; everything else is joined
/// against `base_url` the way a browser would.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use doualazoom_crawler::url::resolve_link;
///
/// let base = Url::parse("https://www.doualazoom.com").unwrap();
/// let url = resolve_link("/fr/entreprise/1/acme", &base).unwrap();
/// assert_eq!(url.as_str(), "https://www.doualazoom.com/fr/entreprise/1/acme");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> UrlResult<Url> {
    let href = href.trim();

    if href.is_empty() {
        return Err(UrlError::Unresolvable {
            href: href.to_string(),
            base: base_url.to_string(),
        });
    }

    base_url.join(href).map_err(|_| UrlError::Unresolvable {
        href: href.to_string(),
        base: base_url.to_string(),
    })
}
