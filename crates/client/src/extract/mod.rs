//! Address extraction from listing pages.
//!
//! ### Page templates
//! - `SingleItemPage`: one address per page, under `/realestate/item`.
//! - `ListingPage`: one address per feed item, under `/realestate/rent`.
//!
//! ### Stable Abstraction
//! - Uses the `PageAddressSource` trait so each template is matched and
//!   tested on its own against synthetic DOM fixtures.
//!
//! ### Misses are not errors
//! - Unsupported URLs and templates that have not rendered yet both yield
//!   `None`; the driver simply tries again on the next scan.

pub mod listing;
pub mod single_item;
mod split;

pub use listing::ListingPage;
pub use single_item::SingleItemPage;

use dom_query::{Document, NodeId};
use url::Url;
use yadz_core::{Address, ScanLog};

use crate::page::Page;

/// An address together with the DOM node it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedAddress {
    pub address: Address,
    /// Insertion point for the annotation.
    pub anchor: NodeId,
}

/// A page template that knows where its addresses live.
pub trait PageAddressSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this template handles `url`.
    fn matches(&self, url: &Url) -> bool;

    /// Read every address on the page, or `None` if the template's elements
    /// are not (yet) present.
    fn extract(&self, document: &Document) -> Option<Vec<LocatedAddress>>;
}

static SOURCES: [&dyn PageAddressSource; 2] = [&SingleItemPage, &ListingPage];

/// Pick the template for `url`.
pub fn source_for_url(url: &Url) -> Option<&'static dyn PageAddressSource> {
    SOURCES.iter().copied().find(|source| source.matches(url))
}

/// Extract the addresses on `page` using the template its URL selects.
pub fn extract_addresses(page: &Page, log: &dyn ScanLog) -> Option<Vec<LocatedAddress>> {
    log.verbose("Extracting address(es)");

    let Some(source) = source_for_url(page.url()) else {
        log.verbose("Not a supported page for extracting addresses");
        return None;
    };

    log.verbose(&format!("Extracting addresses from {} page", source.name()));
    let found = source.extract(page.document());
    if found.is_none() {
        log.verbose("No addresses found on the page at this time.");
    }
    found
}
