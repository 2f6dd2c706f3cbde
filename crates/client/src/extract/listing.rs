//! Search results / feed page (`/realestate/rent...`).

use dom_query::{Document, Selection};
use url::Url;
use yadz_core::Address;

use super::split::{city_from_line, split_street_line};
use super::{LocatedAddress, PageAddressSource};

const URL_PREFIX: &str = "https://www.yad2.co.il/realestate/rent";
const HEADING: &str = "span[class^='item-data-content_heading__']";
const INFO_LINE: &str = "span[class^='item-data-content_itemInfoLine__']";

/// Many feed items per page. Each item heading carries street and number;
/// the city comes from the first info line inside the heading's grandparent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingPage;

impl PageAddressSource for ListingPage {
    fn name(&self) -> &'static str {
        "listing"
    }

    fn matches(&self, url: &Url) -> bool {
        url.as_str().starts_with(URL_PREFIX)
    }

    fn extract(&self, document: &Document) -> Option<Vec<LocatedAddress>> {
        let headings = document.select(HEADING);
        let mut found = Vec::new();

        for heading in headings.nodes() {
            let (street, house_num) = split_street_line(&heading.text());

            let Some(container) = heading.parent().and_then(|p| p.parent()) else {
                continue;
            };
            let info_lines = Selection::from(container).select(INFO_LINE);
            let Some(info_line) = info_lines.nodes().first() else {
                continue;
            };
            let city = city_from_line(&info_line.text());

            found.push(LocatedAddress { address: Address::new(city, street, house_num), anchor: heading.id });
        }

        if found.is_empty() { None } else { Some(found) }
    }
}
