use log::{error, info, warn};
use std::time::Duration;
use tokio::{select, time::sleep};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::detect::{self, Detection};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::notify::{self, Notifier};
use crate::state::{StateRecord, StateStore};

/// Only the sold out to available edge is worth a message. An unknown
/// previous state (first run) never notifies.
#[must_use]
pub fn should_notify(previous: Option<bool>, sold_out: bool) -> bool {
    previous == Some(true) && !sold_out
}

/// Result of a single completed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOutcome {
    pub previous: Option<bool>,
    pub sold_out: bool,
    pub notified: bool,
}

/// Watches one product page and remembers the last status it saw.
pub struct Watcher {
    fetcher: Fetcher,
    notifier: Notifier,
    store: StateStore,
    check_interval: Duration,
    last: Option<bool>,
}

impl Watcher {
    /// Builds the HTTP clients and loads the previous status from disk.
    ///
    /// # Errors
    ///
    /// Fails if a client cannot be built or the state file exists but
    /// cannot be read or parsed.
    pub fn new(config: &Config) -> Result<Watcher> {
        let store = StateStore::new(config.state_file.clone());
        let last = store.load()?.sold_out;

        Ok(Watcher {
            fetcher: Fetcher::new(config)?,
            notifier: Notifier::new(config)?,
            store,
            check_interval: Duration::from_secs(config.check_interval_secs),
            last,
        })
    }

    #[must_use]
    pub fn last_status(&self) -> Option<bool> {
        self.last
    }

    /// Fetches the page, notifies on a restock and records the new status.
    ///
    /// The status is only advanced once the notification has gone out, so a
    /// failed broadcast leaves the previous status in place and the next
    /// check sends it again.
    ///
    /// # Errors
    ///
    /// Fetch and broadcast failures, and a state file that cannot be written.
    /// Nothing is persisted when the fetch or the broadcast fails.
    pub async fn check_once(&mut self) -> Result<CheckOutcome> {
        let html = self.fetcher.fetch_html().await?;
        let detection = detect::detect(&html);
        let sold_out = detection.is_sold_out();
        if detection == Detection::Page {
            warn!("SOLD OUT found outside the status banner, treating page as sold out");
        }

        let previous = self.last;
        let notified = should_notify(previous, sold_out);
        if notified {
            let message = notify::restock_message(self.fetcher.url());
            self.notifier.broadcast(&message).await?;
            info!("Notified: {message:?}");
        }

        self.last = Some(sold_out);
        self.store.save(&StateRecord {
            sold_out: Some(sold_out),
        })?;
        info!("checked. sold_out={sold_out}");

        Ok(CheckOutcome {
            previous,
            sold_out,
            notified,
        })
    }

    /// Checks the page every interval until `token` is cancelled.
    ///
    /// # Behavior
    ///
    /// - Runs the first check immediately
    /// - Logs a failed check and carries on after the usual sleep
    /// - Stops before the next check, or mid-sleep, once `token` is cancelled
    pub async fn run(&mut self, token: CancellationToken) {
        loop {
            if token.is_cancelled() {
                info!("Shutdown requested, stopping watcher");
                break;
            }

            if let Err(e) = self.check_once().await {
                error!("check error: {e}");
            }

            select! {
                () = sleep(self.check_interval) => {},
                () = token.cancelled() => {
                    info!("Shutdown requested during sleep");
                    break;
                }
            }
        }

        info!("Watcher stopped gracefully");
    }
}

/// Logs the effective configuration, then runs one check or the loop
/// depending on `config.run_once`.
///
/// # Behavior
///
/// - Loads the previous status from the state file
/// - One-shot mode runs a single check and returns its error, if any
/// - Loop mode returns once `token` is cancelled
///
/// # Errors
///
/// Startup failures in both modes; in one-shot mode also any error of the
/// single check.
pub async fn watch(config: &Config, token: CancellationToken) -> Result<()> {
    info!("Watching {}", config.target_url);
    info!("State file: {}", config.state_file.display());
    info!("Timeout: {} seconds", config.timeout_secs);

    let mut watcher = Watcher::new(config)?;
    match watcher.last_status() {
        Some(sold_out) => info!("Previous status: sold_out={sold_out}"),
        None => info!("No previous status recorded, first check will not notify"),
    }

    if config.run_once {
        watcher.check_once().await?;
    } else {
        info!("Check interval: {} seconds", config.check_interval_secs);
        watcher.run(token).await;
    }
    Ok(())
}
