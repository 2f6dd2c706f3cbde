//! Page-side pipeline for yadz.
//!
//! This crate provides the page model, address extraction, the lookup client,
//! annotation rendering, and the scanner and driver that tie them together.

pub mod annotate;
pub mod driver;
pub mod extract;
pub mod fetch;
pub mod lookup;
pub mod page;
pub mod scan;

pub use driver::{Driver, DriverConfig, DriverUpdate};
pub use extract::{LocatedAddress, PageAddressSource, extract_addresses, source_for_url};
pub use fetch::{FetchConfig, FetchedPage, PageFetcher};
pub use lookup::{LookupClient, LookupConfig};
pub use page::{Page, PageEvent};
pub use scan::{LookupOutcome, ScanReport, Scanner};
