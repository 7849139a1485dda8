//! Listing pagination through the `page` query parameter.
//!
//! Listing URLs look like `/fr/activite/alpha/B?page=3`. The first page
//! carries no parameter at all.

use url::Url;

/// Name of the query parameter carrying the listing page number
pub const PAGE_PARAM: &str = "page";

/// Returns the listing page number encoded in `url`
///
/// Defaults to 1 when the parameter is absent, empty or not a positive
/// integer.
pub fn page_number(url: &Url) -> u32 {
    url.query_pairs()
        .find(|(key, _)| key == PAGE_PARAM)
        .and_then(|(_, value)| value.trim().parse::<u32>().ok())
        .filter(|&page| page >= 1)
        .unwrap_or(1)
}

/// Builds the URL of the listing page following `url`
///
/// The path is kept; the query is replaced by `page=<current + 1>` and any
/// fragment is dropped.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use doualazoom_crawler::url::next_page_url;
///
/// let first = Url::parse("https://www.doualazoom.com/fr/activite/alpha/B").unwrap();
/// let second = next_page_url(&first);
/// assert_eq!(second.as_str(), "https://www.doualazoom.com/fr/activite/alpha/B?page=2");
/// assert_eq!(next_page_url(&second).query(), Some("page=3"));
/// ```
pub fn next_page_url(url: &Url) -> Url {
    let next = page_number(url).saturating_add(1);
    let mut next_url = url.clone();
    next_url.set_fragment(None);
    next_url.set_query(None);
    next_url
        .query_pairs_mut()
        .append_pair(PAGE_PARAM, &next.to_string());
    next_url
}
