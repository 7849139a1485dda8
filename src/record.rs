//! Output record for one company

use crate::crawler::DetailPage;
use serde::{Deserialize, Serialize};

/// A company as written to the output stream
///
/// Every field is always serialized; missing data shows up as an empty
/// string or an empty list, never as `null` or an absent key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub phones: Vec<String>,
    pub whatsapp: Vec<String>,
    pub emails: Vec<String>,
    pub website: Vec<String>,
    pub localisation: String,
    pub sectors: Vec<String>,
    /// URL of the detail page the record was extracted from
    pub detail_url: String,
}

impl Company {
    /// Assembles the record for a parsed detail page
    pub fn from_detail(page: DetailPage) -> Self {
        Self {
            name: page.name,
            phones: page.phones,
            whatsapp: page.whatsapp,
            emails: page.emails,
            website: page.website,
            localisation: page.localisation,
            sectors: page.sectors,
            detail_url: page.url,
        }
    }

    /// Natural key used to suppress duplicate records
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.detail_url, &self.name)
    }
}

impl From<DetailPage> for Company {
    fn from(page: DetailPage) -> Self {
        Self::from_detail(page)
    }
}
