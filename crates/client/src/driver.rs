//! Rescan scheduling for a live page.
//!
//! Three independent triggers feed the same idempotent scan:
//!
//! - a one-off scan after the initial delay
//! - a debounced scan after page events that added nodes; every further
//!   mutation pushes the deadline back
//! - an unconditional scan on every poll tick
//!
//! A scan only touches the document and the cache. Its lookups run as tasks
//! on a [`JoinSet`] and each result is rendered when it arrives, so events,
//! timers and shutdown are never stuck behind a slow lookup. The driver owns
//! the page for its lifetime and hands it back once the event source closes.
//! Lookups still in flight at that point are detached: they finish in the
//! background and fill the cache, but nothing renders them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{self, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use yadz_core::{Address, AppConfig, ScanLog, address_hash};

use crate::page::{Page, PageEvent};
use crate::scan::{LookupOutcome, ScanReport, Scanner};

/// Timer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    pub initial_delay: Duration,
    pub debounce: Duration,
    pub poll_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            debounce: Duration::from_millis(500),
            poll_interval: Duration::from_millis(5000),
        }
    }
}

impl From<&AppConfig> for DriverConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            initial_delay: config.initial_delay(),
            debounce: config.mutation_debounce(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Something that changed the page, reported to the caller of [`Driver::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum DriverUpdate {
    /// A scan annotated cache hits and started lookups for the rest.
    Scanned(ScanReport),
    /// A lookup finished. `found` is false when it produced nothing and the
    /// loading state stays until a later scan retries.
    Resolved { address: Address, found: bool },
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Initial,
    Mutation,
    Poll,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Trigger::Initial => "initial",
            Trigger::Mutation => "mutation",
            Trigger::Poll => "poll",
        }
    }
}

/// Drives scans of one page until its event source closes.
#[derive(Clone)]
pub struct Driver {
    scanner: Scanner,
    config: DriverConfig,
    log: Arc<dyn ScanLog>,
}

impl Driver {
    pub fn new(scanner: Scanner, config: DriverConfig, log: Arc<dyn ScanLog>) -> Self {
        Self { scanner, config, log }
    }

    /// Run until `events` closes, calling `on_update` after every scan and
    /// every finished lookup.
    ///
    /// An address whose lookup is still in flight is not looked up again by
    /// later scans; it keeps its loading state until the answer arrives.
    pub async fn run<F>(&self, mut page: Page, mut events: mpsc::Receiver<PageEvent>, mut on_update: F) -> Page
    where
        F: FnMut(&Page, &DriverUpdate),
    {
        self.log.info(&format!("Watching {}", page.url()));

        let initial = sleep(self.config.initial_delay);
        tokio::pin!(initial);
        let mut initial_done = false;

        let debounce = sleep(self.config.debounce);
        tokio::pin!(debounce);
        let mut debounce_armed = false;

        let mut poll = interval_at(Instant::now() + self.config.poll_interval, self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut lookups: JoinSet<LookupOutcome> = JoinSet::new();
        // task id -> address hash
        let mut in_flight: HashMap<task::Id, String> = HashMap::new();

        loop {
            let trigger = tokio::select! {
                () = &mut initial, if !initial_done => {
                    initial_done = true;
                    Trigger::Initial
                }
                () = &mut debounce, if debounce_armed => {
                    debounce_armed = false;
                    Trigger::Mutation
                }
                _ = poll.tick() => Trigger::Poll,
                Some(joined) = lookups.join_next_with_id(), if !lookups.is_empty() => {
                    match joined {
                        Ok((id, outcome)) => {
                            in_flight.remove(&id);
                            self.scanner.render(&page, &outcome);
                            let found = outcome.result.is_some();
                            on_update(&page, &DriverUpdate::Resolved { address: outcome.located.address, found });
                        }
                        Err(e) => {
                            in_flight.remove(&e.id());
                            self.log.error(&format!("Lookup task failed: {e}"));
                        }
                    }
                    continue;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    if page.apply(event) {
                        debounce.as_mut().reset(Instant::now() + self.config.debounce);
                        debounce_armed = true;
                    }
                    continue;
                }
            };

            self.log.verbose(&format!("Running {} scan", trigger.as_str()));
            let (report, misses) = self.scanner.prepare(&page).await;
            for located in misses {
                let hash = address_hash(&located.address);
                if in_flight.values().any(|pending| *pending == hash) {
                    continue;
                }
                let handle = self.scanner.spawn_lookup(&mut lookups, located);
                in_flight.insert(handle.id(), hash);
            }
            on_update(&page, &DriverUpdate::Scanned(report));
        }

        if !lookups.is_empty() {
            self.log.verbose(&format!("Leaving {} lookups to finish in the background", lookups.len()));
            lookups.detach_all();
        }
        self.log.info(&format!("Stopped watching {}", page.url()));
        page
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver").field("scanner", &self.scanner).field("config", &self.config).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use yadz_core::cache::DEFAULT_TTL;
    use yadz_core::{CacheDb, LookupResult, MemoryLog, ResultCache};

    use crate::annotate::LOADING_TEXT;
    use crate::lookup::{LookupClient, LookupConfig};

    const RENT_URL: &str = "https://www.yad2.co.il/realestate/rent";
    const UNREACHABLE: &str = "http://127.0.0.1:9/process_address";

    fn feed_item(heading: &str, city_line: &str) -> String {
        format!(
            r#"<div class="feed-item"><div><span class="item-data-content_heading__a">{heading}</span></div>
               <div><span class="item-data-content_itemInfoLine__b">{city_line}</span></div></div>"#
        )
    }

    fn full_body() -> serde_json::Value {
        json!({
            "travel_times": {"walking": {"duration": "25 mins"}},
            "ftth": {"IsSuccessful": true, "Status": "available"}
        })
    }

    /// Scanner posting to `endpoint` whose cache already answers for `cached`.
    async fn scanner_with(endpoint: &str, cached: &[(&str, &str)]) -> Scanner {
        let db = CacheDb::open_in_memory().await.unwrap();
        let log: Arc<dyn ScanLog> = Arc::new(MemoryLog::new());
        let cache = ResultCache::new(db.origin_store("https://www.yad2.co.il").unwrap(), DEFAULT_TTL, log.clone());
        let result = LookupResult::new(full_body());
        for (street, num) in cached {
            let hash = address_hash(&Address::new("Tel Aviv", *street, *num));
            cache.set(&hash, &result).await.unwrap();
        }
        let config = LookupConfig { endpoint: endpoint.to_string(), ..Default::default() };
        let client = LookupClient::new(config, cache.clone(), log.clone()).unwrap();
        Scanner::new(cache, client, log)
    }

    /// Every address used below is cached, so no request leaves the process.
    async fn cached_scanner() -> Scanner {
        scanner_with(UNREACHABLE, &[("Herzl", "12"), ("Dizengoff", "50")]).await
    }

    fn driver(scanner: Scanner, config: DriverConfig) -> Driver {
        Driver::new(scanner, config, Arc::new(MemoryLog::new()))
    }

    fn page() -> Page {
        let html = format!(r#"<main id="feed">{}</main>"#, feed_item("Herzl 12", "Apartment, Tel Aviv"));
        Page::parse(RENT_URL, &html).unwrap()
    }

    fn scans(updates: &[DriverUpdate]) -> Vec<ScanReport> {
        updates
            .iter()
            .filter_map(|update| match update {
                DriverUpdate::Scanned(report) => Some(*report),
                DriverUpdate::Resolved { .. } => None,
            })
            .collect()
    }

    fn resolved(updates: &[DriverUpdate]) -> Vec<bool> {
        updates
            .iter()
            .filter_map(|update| match update {
                DriverUpdate::Resolved { found, .. } => Some(*found),
                DriverUpdate::Scanned(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_config_from_app_config() {
        let app =
            AppConfig { initial_delay_ms: 10, mutation_debounce_ms: 20, poll_interval_ms: 30, ..Default::default() };
        let config = DriverConfig::from(&app);
        assert_eq!(config.initial_delay, Duration::from_millis(10));
        assert_eq!(config.debounce, Duration::from_millis(20));
        assert_eq!(config.poll_interval, Duration::from_millis(30));
        assert_eq!(DriverConfig::default().initial_delay, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_initial_scan_then_close() {
        let config = DriverConfig {
            initial_delay: Duration::from_millis(10),
            debounce: Duration::from_millis(50),
            poll_interval: Duration::from_secs(60),
        };
        let driver = driver(cached_scanner().await, config);
        let (tx, rx) = mpsc::channel(8);
        let mut updates = Vec::new();

        let (page, ()) = tokio::join!(driver.run(page(), rx, |_, update| updates.push(update.clone())), async {
            sleep(Duration::from_millis(150)).await;
            drop(tx);
        });

        let reports = scans(&updates);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].cached, 1);
        assert!(resolved(&updates).is_empty());
        assert!(page.document().select("#addr_info_ehng0j").text().contains("25 mins"));
    }

    #[tokio::test]
    async fn test_mutation_burst_is_debounced() {
        let config = DriverConfig {
            initial_delay: Duration::from_millis(10),
            debounce: Duration::from_millis(80),
            poll_interval: Duration::from_secs(60),
        };
        let driver = driver(cached_scanner().await, config);
        let (tx, rx) = mpsc::channel(8);
        let mut updates = Vec::new();

        let (page, ()) = tokio::join!(driver.run(page(), rx, |_, update| updates.push(update.clone())), async {
            sleep(Duration::from_millis(100)).await;
            for _ in 0..3 {
                let html = feed_item("Dizengoff 50", "Apartment, Tel Aviv");
                tx.send(PageEvent::Append { parent: "#feed".into(), html }).await.unwrap();
                sleep(Duration::from_millis(10)).await;
            }
            sleep(Duration::from_millis(300)).await;
            drop(tx);
        });

        let reports = scans(&updates);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].found, 4);
        assert_eq!(page.document().select("#addr_info_4xvthu").length(), 1);
    }

    #[tokio::test]
    async fn test_attribute_change_does_not_rescan() {
        let config = DriverConfig {
            initial_delay: Duration::from_millis(10),
            debounce: Duration::from_millis(20),
            poll_interval: Duration::from_secs(60),
        };
        let driver = driver(cached_scanner().await, config);
        let (tx, rx) = mpsc::channel(8);
        let mut scans = 0;

        tokio::join!(driver.run(page(), rx, |_, _| scans += 1), async {
            sleep(Duration::from_millis(60)).await;
            let event = PageEvent::SetAttr { selector: "#feed".into(), name: "class".into(), value: "loaded".into() };
            tx.send(event).await.unwrap();
            sleep(Duration::from_millis(150)).await;
            drop(tx);
        });

        assert_eq!(scans, 1);
    }

    #[tokio::test]
    async fn test_poll_rescans() {
        let config = DriverConfig {
            initial_delay: Duration::from_secs(60),
            debounce: Duration::from_secs(60),
            poll_interval: Duration::from_millis(30),
        };
        let driver = driver(cached_scanner().await, config);
        let (tx, rx) = mpsc::channel(8);
        let mut scans = 0;

        tokio::join!(driver.run(page(), rx, |_, _| scans += 1), async {
            sleep(Duration::from_millis(200)).await;
            drop(tx);
        });

        assert!(scans >= 2, "expected repeated poll scans, got {scans}");
    }

    #[tokio::test]
    async fn test_close_before_first_scan() {
        let driver = driver(cached_scanner().await, DriverConfig::default());
        let (tx, rx) = mpsc::channel(8);
        drop(tx);

        let mut scans = 0;
        let page = driver.run(page(), rx, |_, _| scans += 1).await;

        assert_eq!(scans, 0);
        assert_eq!(page.document().select("div[id^='addr_info_']").length(), 0);
    }

    #[tokio::test]
    async fn test_slow_lookup_does_not_block_polling_or_shutdown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({"city": "Tel Aviv", "street": "Dizengoff", "houseNum": "50"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_body()).set_delay(Duration::from_secs(3)))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = format!("{}/process_address", server.uri());
        let config = DriverConfig {
            initial_delay: Duration::from_millis(10),
            debounce: Duration::from_secs(60),
            poll_interval: Duration::from_millis(50),
        };
        let driver = driver(scanner_with(&endpoint, &[("Herzl", "12")]).await, config);
        let html = format!(
            r#"<main id="feed">{}{}</main>"#,
            feed_item("Herzl 12", "Apartment, Tel Aviv"),
            feed_item("Dizengoff 50", "Apartment, Tel Aviv")
        );
        let page = Page::parse(RENT_URL, &html).unwrap();
        let (tx, rx) = mpsc::channel(8);
        let mut updates = Vec::new();

        let started = Instant::now();
        let (page, ()) = tokio::join!(driver.run(page, rx, |_, update| updates.push(update.clone())), async {
            sleep(Duration::from_millis(600)).await;
            drop(tx);
        });
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_millis(1500), "shutdown waited on the lookup: {elapsed:?}");
        let reports = scans(&updates);
        assert!(reports.len() >= 5, "expected polling to continue, got {} scans", reports.len());
        assert!(reports.iter().all(|report| report.cached == 1 && report.pending == 1));
        assert!(resolved(&updates).is_empty());

        let doc = page.document();
        assert!(doc.select("#addr_info_ehng0j").text().contains("25 mins"));
        assert_eq!(doc.select("#addr_info_4xvthu").text().trim(), LOADING_TEXT);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_retried_by_poll() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(full_body()))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = format!("{}/process_address", server.uri());
        let config = DriverConfig {
            initial_delay: Duration::from_millis(10),
            debounce: Duration::from_secs(60),
            poll_interval: Duration::from_millis(100),
        };
        let driver = driver(scanner_with(&endpoint, &[]).await, config);
        let (tx, rx) = mpsc::channel(8);
        let mut updates = Vec::new();
        let mut loading_after_failure = None;

        let (page, ()) = tokio::join!(
            driver.run(page(), rx, |page, update| {
                if let DriverUpdate::Resolved { found: false, .. } = update {
                    loading_after_failure = Some(page.document().select("#addr_info_ehng0j").text().to_string());
                }
                updates.push(update.clone());
            }),
            async {
                sleep(Duration::from_millis(450)).await;
                drop(tx);
            }
        );

        assert_eq!(resolved(&updates), vec![false, true]);
        assert_eq!(loading_after_failure.as_deref().map(str::trim), Some(LOADING_TEXT));
        let text = page.document().select("#addr_info_ehng0j").text();
        assert!(text.contains("25 mins"));
        assert!(!text.contains(LOADING_TEXT));
    }
}
