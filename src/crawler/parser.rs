//! HTML extraction rules for listing and detail pages
//!
//! Both page roles are parsed by pure functions: the same HTML always
//! yields the same fields, and a missing element never fails the parse.
//! Each field falls back to an empty string or an empty list instead.
//!
//! # Listing pages
//!
//! - company links: `div.div_list_nomentreprise > a` hrefs, resolved against
//!   the site base URL, in document order, duplicates kept
//! - has companies: true iff at least one company link was found
//!
//! # Detail pages
//!
//! | Field        | Rule                                                           |
//! |--------------|----------------------------------------------------------------|
//! | name         | first `h2`, else first `h1`, else trimmed `<title>`             |
//! | phones       | `tel:` anchors whose parent text does not mention WhatsApp     |
//! | whatsapp     | `tel:` anchors whose parent text mentions WhatsApp             |
//! | emails       | `mailto:` anchor text                                          |
//! | website      | raw `http*` hrefs not containing the site's own domain         |
//! | localisation | text of the element holding the first location phrase          |
//! | sectors      | text of anchors linking to a sector category                    |

use crate::config::SiteConfig;
use crate::url::{page_number, resolve_link};
use crate::CrawlerError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Anchors wrapping each company name on a listing page
const COMPANY_LINK_SELECTOR: &str = "div.div_list_nomentreprise > a";

/// Path fragment shared by every business-sector category link
const SECTOR_PATH_FRAGMENT: &str = "/fr/activite/rubrique/";

/// Marker that turns a telephone anchor into a WhatsApp number
const WHATSAPP_MARKER: &str = "whatsapp";

/// Phrases introducing a company's address block (matched case-insensitively)
const LOCALISATION_PHRASES: [&str; 2] = ["Localisation de l'entreprise", "Situé à"];

/// Which kind of page an HTML document is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRole {
    /// An alphabetical listing page
    Listing,
    /// A single company's page
    Detail,
}

/// The parts of the target site the extraction rules depend on
#[derive(Debug, Clone)]
pub struct SiteProfile {
    /// Base URL relative company links resolve against
    pub base_url: Url,

    /// Substring marking links that point back into the directory itself
    pub own_domain: String,
}

impl SiteProfile {
    /// Builds a profile from the `[site]` configuration section
    pub fn from_config(config: &SiteConfig) -> Result<Self, CrawlerError> {
        Ok(Self {
            base_url: Url::parse(&config.base_url)?,
            own_domain: config.own_domain.clone(),
        })
    }
}

/// Fields extracted from a listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    /// URL the page was fetched from
    pub url: Url,

    /// Page number taken from the `page` query parameter (1 when absent)
    pub page: u32,

    /// Absolute company detail URLs, in document order
    pub company_links: Vec<Url>,
}

impl ListingPage {
    /// True iff the page listed at least one company
    ///
    /// This is the pagination signal: a page without companies ends the
    /// letter.
    pub fn has_companies(&self) -> bool {
        !self.company_links.is_empty()
    }
}

/// Fields extracted from a company detail page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailPage {
    /// URL the page was fetched from
    pub url: String,
    pub name: String,
    pub phones: Vec<String>,
    pub whatsapp: Vec<String>,
    pub emails: Vec<String>,
    pub website: Vec<String>,
    pub localisation: String,
    pub sectors: Vec<String>,
}

/// Result of parsing a page in a given role
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPage {
    Listing(ListingPage),
    Detail(DetailPage),
}

/// Parses `html` according to `role`
///
/// # Example
///
/// ```
/// use doualazoom_crawler::crawler::{parse_page, PageRole, ParsedPage, SiteProfile};
/// use url::Url;
///
/// let site = SiteProfile {
///     base_url: Url::parse("https://www.doualazoom.com").unwrap(),
///     own_domain: "doualazoom.com".to_string(),
/// };
/// let url = Url::parse("https://www.doualazoom.com/fr/entreprise/1").unwrap();
/// let html = "<html><head><title> Acme </title></head><body></body></html>";
///
/// match parse_page(html, PageRole::Detail, &url, &site) {
///     ParsedPage::Detail(detail) => assert_eq!(detail.name, "Acme"),
///     ParsedPage::Listing(_) => unreachable!(),
/// }
/// ```
pub fn parse_page(html: &str, role: PageRole, url: &Url, site: &SiteProfile) -> ParsedPage {
    match role {
        PageRole::Listing => ParsedPage::Listing(parse_listing(html, url, &site.base_url)),
        PageRole::Detail => ParsedPage::Detail(parse_detail(html, url.as_str(), &site.own_domain)),
    }
}

/// Parses a listing page
pub fn parse_listing(html: &str, url: &Url, base_url: &Url) -> ListingPage {
    let document = Html::parse_document(html);

    ListingPage {
        url: url.clone(),
        page: page_number(url),
        company_links: extract_company_links(&document, base_url),
    }
}

/// Parses a company detail page
pub fn parse_detail(html: &str, url: &str, own_domain: &str) -> DetailPage {
    let document = Html::parse_document(html);
    let (phones, whatsapp) = extract_phone_numbers(&document);

    DetailPage {
        url: url.to_string(),
        name: extract_name(&document),
        phones,
        whatsapp,
        emails: extract_emails(&document),
        website: extract_websites(&document, own_domain),
        localisation: extract_localisation(&document),
        sectors: extract_sectors(&document),
    }
}

/// Joins the trimmed, non-empty descendant text nodes of `element` with single spaces
pub fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Selects every element matching `css`
///
/// All selectors used here are constants, so a parse failure is a bug;
/// it is logged and treated as "nothing matched".
fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(e) => {
            tracing::error!("Invalid selector {:?}: {:?}", css, e);
            Vec::new()
        }
    }
}

fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    select_all(document, css).into_iter().next()
}

fn extract_company_links(document: &Html, base_url: &Url) -> Vec<Url> {
    select_all(document, COMPANY_LINK_SELECTOR)
        .into_iter()
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| !href.is_empty())
        .filter_map(|href| match resolve_link(href, base_url) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!("Skipping company link: {}", e);
                None
            }
        })
        .collect()
}

/// Name with its three-tier fallback: `h2`, then `h1`, then `<title>`
///
/// A heading that exists but is empty still wins its tier.
fn extract_name(document: &Html) -> String {
    if let Some(heading) = select_first(document, "h2").or_else(|| select_first(document, "h1")) {
        return visible_text(heading);
    }

    select_first(document, "title")
        .map(|title| title.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Splits `tel:` anchors into (phones, whatsapp) by inspecting the parent's text
fn extract_phone_numbers(document: &Html) -> (Vec<String>, Vec<String>) {
    let mut phones = Vec::new();
    let mut whatsapp = Vec::new();

    for anchor in select_all(document, r#"a[href^="tel:"]"#) {
        let number = visible_text(anchor);
        if is_whatsapp_anchor(anchor) {
            whatsapp.push(number);
        } else {
            phones.push(number);
        }
    }

    (phones, whatsapp)
}

/// True if the anchor's parent element mentions WhatsApp in any case
///
/// The site puts the WhatsApp label next to the number, inside the same
/// parent, never inside the anchor itself.
pub fn is_whatsapp_anchor(anchor: ElementRef<'_>) -> bool {
    anchor
        .parent()
        .and_then(ElementRef::wrap)
        .map(|parent| visible_text(parent).to_lowercase().contains(WHATSAPP_MARKER))
        .unwrap_or(false)
}

fn extract_emails(document: &Html) -> Vec<String> {
    select_all(document, r#"a[href^="mailto:"]"#)
        .into_iter()
        .map(visible_text)
        .collect()
}

fn extract_websites(document: &Html, own_domain: &str) -> Vec<String> {
    select_all(document, r#"a[href^="http"]"#)
        .into_iter()
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| !href.contains(own_domain))
        .map(str::to_string)
        .collect()
}

/// Text of the element containing the first location phrase, or ""
fn extract_localisation(document: &Html) -> String {
    let phrases: Vec<String> = LOCALISATION_PHRASES
        .iter()
        .map(|phrase| phrase.to_lowercase())
        .collect();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let lowered = text.to_lowercase();
        if !phrases.iter().any(|phrase| lowered.contains(phrase.as_str())) {
            continue;
        }

        let Some(container) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };

        if matches!(container.value().name(), "script" | "style") {
            continue;
        }

        return visible_text(container);
    }

    String::new()
}

fn extract_sectors(document: &Html) -> Vec<String> {
    select_all(document, &format!(r#"a[href*="{}"]"#, SECTOR_PATH_FRAGMENT))
        .into_iter()
        .map(visible_text)
        .collect()
}
