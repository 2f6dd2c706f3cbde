//! Single listing page (`/realestate/item/...`).

use dom_query::Document;
use url::Url;
use yadz_core::Address;

use super::split::{city_from_line, split_street_line};
use super::{LocatedAddress, PageAddressSource};

const URL_PREFIX: &str = "https://www.yad2.co.il/realestate/item";
const HEADING: &str = "h1[class^='heading_heading_']";
const SUB_HEADING: &str = "h2[class^='address_address']";

/// One address per page: street and number in the `h1`, city at the end of
/// the `h2` beneath it. The `h1` is the anchor.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleItemPage;

impl PageAddressSource for SingleItemPage {
    fn name(&self) -> &'static str {
        "single-item"
    }

    fn matches(&self, url: &Url) -> bool {
        url.as_str().starts_with(URL_PREFIX)
    }

    fn extract(&self, document: &Document) -> Option<Vec<LocatedAddress>> {
        let headings = document.select(HEADING);
        let sub_headings = document.select(SUB_HEADING);
        let heading = headings.nodes().first()?;
        let sub_heading = sub_headings.nodes().first()?;

        let (street, house_num) = split_street_line(&heading.text());
        let city = city_from_line(&sub_heading.text());

        Some(vec![LocatedAddress { address: Address::new(city, street, house_num), anchor: heading.id }])
    }
}
