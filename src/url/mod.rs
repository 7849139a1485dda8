//! URL handling module
//!
//! This module turns what a listing page says into the URLs the crawl
//! visits next: absolute company detail links and the following listing page.

mod pagination;
mod resolve;

use crate::UrlResult;
use ::url::Url;

// Re-export main functions
pub use pagination::{next_page_url, page_number, PAGE_PARAM};
pub use resolve::resolve_link;

/// Path of the alphabetical company index, relative to the site base URL
pub const LISTING_PATH: &str = "/fr/activite/alpha/";

/// Builds the first listing page URL for `letter`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use doualazoom_crawler::url::listing_url;
///
/// let base = Url::parse("https://www.doualazoom.com").unwrap();
/// let url = listing_url(&base, 'C').unwrap();
/// assert_eq!(url.as_str(), "https://www.doualazoom.com/fr/activite/alpha/C");
/// ```
pub fn listing_url(base_url: &Url, letter: char) -> UrlResult<Url> {
    resolve_link(&format!("{}{}", LISTING_PATH, letter), base_url)
}
