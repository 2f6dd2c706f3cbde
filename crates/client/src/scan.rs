//! One pass of the annotation pipeline over a page.
//!
//! A scan has two halves. [`Scanner::prepare`] runs against the document
//! without awaiting the network: extract, loading state, cache check. Each
//! cache miss is then looked up on its own task via [`Scanner::spawn_lookup`]
//! and rendered with [`Scanner::render`] as it completes, so a slow lookup
//! never holds up the page.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::{AbortHandle, JoinSet};
use yadz_core::{LookupResult, ResultCache, ScanLog, address_hash};

use crate::annotate;
use crate::extract::{LocatedAddress, extract_addresses};
use crate::lookup::LookupClient;
use crate::page::Page;

/// Counters for a single scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Addresses extracted from the page.
    pub found: usize,
    /// Addresses skipped for missing fields.
    pub skipped: usize,
    /// Addresses answered from the cache.
    pub cached: usize,
    /// Lookups not yet answered.
    pub pending: usize,
    /// Addresses answered by the lookup service.
    pub fetched: usize,
    /// Lookups that produced nothing; these keep their loading state.
    pub failed: usize,
}

impl std::fmt::Display for ScanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "found={} skipped={} cached={} pending={} fetched={} failed={}",
            self.found, self.skipped, self.cached, self.pending, self.fetched, self.failed
        )
    }
}

/// A finished lookup, handed back to whoever owns the page.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub located: LocatedAddress,
    pub result: Option<LookupResult>,
}

/// Runs scans against pages of a single origin.
#[derive(Clone)]
pub struct Scanner {
    cache: ResultCache,
    client: LookupClient,
    log: Arc<dyn ScanLog>,
}

impl Scanner {
    pub fn new(cache: ResultCache, client: LookupClient, log: Arc<dyn ScanLog>) -> Self {
        Self { cache, client, log }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Scan `page` once and wait for every lookup it starts.
    ///
    /// Never fails: cache errors count as misses and lookup errors leave the
    /// loading placeholder for the next scan to retry.
    pub async fn scan(&self, page: &Page) -> ScanReport {
        let (mut report, misses) = self.prepare(page).await;

        let mut lookups = JoinSet::new();
        for located in misses {
            self.spawn_lookup(&mut lookups, located);
        }

        while let Some(joined) = lookups.join_next().await {
            report.pending -= 1;
            match joined {
                Ok(outcome) => {
                    self.render(page, &outcome);
                    if outcome.result.is_some() {
                        report.fetched += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                Err(e) => {
                    self.log.error(&format!("Lookup task failed: {e}"));
                    report.failed += 1;
                }
            }
        }

        self.log.verbose(&format!("Scan of {} complete: {report}", page.url()));
        report
    }

    /// Annotate everything the cache can answer and return the misses.
    ///
    /// Every complete address gets its loading node here. Misses are unique
    /// by address hash; `report.pending` counts them.
    pub async fn prepare(&self, page: &Page) -> (ScanReport, Vec<LocatedAddress>) {
        let mut report = ScanReport::default();
        let Some(found) = extract_addresses(page, self.log.as_ref()) else {
            return (report, Vec::new());
        };
        report.found = found.len();

        let document = page.document();
        let mut misses: Vec<LocatedAddress> = Vec::new();
        let mut missed: HashSet<String> = HashSet::new();

        for located in found {
            let address = &located.address;
            if !address.is_complete() {
                self.log.verbose(&format!("Incomplete address data: {address:?}"));
                report.skipped += 1;
                continue;
            }

            annotate::show_loading(document, located.anchor, address);

            let hash = address_hash(address);
            if missed.contains(&hash) {
                continue;
            }
            match self.cache.get(&hash).await {
                Ok(Some(entry)) => {
                    self.log.verbose(&format!("Using cached data for {address}"));
                    annotate::show_result(document, located.anchor, address, &entry.payload);
                    report.cached += 1;
                }
                Ok(None) => {
                    missed.insert(hash);
                    misses.push(located);
                }
                Err(e) => {
                    self.log.error(&format!("Cache read failed for {address}: {e}"));
                    missed.insert(hash);
                    misses.push(located);
                }
            }
        }

        report.pending = misses.len();
        (report, misses)
    }

    /// Start the lookup for `located` on `tasks`.
    pub fn spawn_lookup(&self, tasks: &mut JoinSet<LookupOutcome>, located: LocatedAddress) -> AbortHandle {
        let client = self.client.clone();
        let log = self.log.clone();
        tasks.spawn(async move {
            log.verbose(&format!("Sending address to server: {}", located.address));
            let result = client.lookup(&located.address).await;
            LookupOutcome { located, result }
        })
    }

    /// Show a finished lookup on `page`. Returns whether a result was drawn.
    ///
    /// Only an existing annotation node is rewritten. If the document changed
    /// underneath the lookup, the result is already cached and the next scan
    /// renders it.
    pub fn render(&self, page: &Page, outcome: &LookupOutcome) -> bool {
        let Some(result) = &outcome.result else {
            return false;
        };
        let address = &outcome.located.address;
        if annotate::update_annotation(page.document(), address, result) {
            return true;
        }
        self.log.verbose(&format!("No annotation left for {address}; next scan renders it"));
        false
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner").field("cache", &self.cache).field("client", &self.client).finish_non_exhaustive()
    }
}
