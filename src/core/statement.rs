//! Windowed statement pagination.
//!
//! Providers cap both the time range of a single statement request and the
//! number of transactions per response. [`TransactionFetcher`] walks the
//! lookback period in forward windows no wider than the range cap, and inside
//! each window walks a backward cursor until a short page proves the window is
//! drained.

use crate::core::bank::Transaction;
use crate::core::cache::{Cache, CacheLookup, keys};
use crate::core::error::{Error, Result};
use crate::core::period::Period;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// 31 days and one hour; the provider treats both range ends as inclusive.
pub const MAX_RANGE_SECS: i64 = 2_682_000;
pub const MAX_PAGE_SIZE: usize = 500;

const SECS_PER_DAY: i64 = 24 * 60 * 60;

/// One provider request for transactions of an account in `[from, to]`.
///
/// Implementations return transactions newest first and report a malformed
/// response as [`Error::TransactionsNotFound`].
#[async_trait]
pub trait StatementSource: Send + Sync {
    async fn fetch_statement(&self, account_id: &str, from: i64, to: i64)
    -> Result<Vec<Transaction>>;
}

/// Pacing applied between consecutive provider calls.
#[async_trait]
pub trait Throttle: Send + Sync {
    async fn wait(&self);
}

pub struct FixedDelay(pub Duration);

#[async_trait]
impl Throttle for FixedDelay {
    async fn wait(&self) {
        if self.0.is_zero() {
            return;
        }
        info!(
            "Waiting {}s to respect provider rate limit...",
            self.0.as_secs_f64()
        );
        tokio::time::sleep(self.0).await;
    }
}

/// Floors an epoch timestamp to the start of its UTC day.
pub fn start_of_day(ts: i64) -> i64 {
    ts - ts.rem_euclid(SECS_PER_DAY)
}

pub struct TransactionFetcher {
    source: Arc<dyn StatementSource>,
    cache: Cache,
    throttle: Arc<dyn Throttle>,
    /// Set once a page came from the network; later network fetches wait first.
    requested: AtomicBool,
    max_range: i64,
    page_size: usize,
}

impl TransactionFetcher {
    pub fn new(source: Arc<dyn StatementSource>, cache: Cache, throttle: Arc<dyn Throttle>) -> Self {
        Self {
            source,
            cache,
            throttle,
            requested: AtomicBool::new(false),
            max_range: MAX_RANGE_SECS,
            page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_limits(mut self, max_range: i64, page_size: usize) -> Self {
        self.max_range = max_range.max(1);
        self.page_size = page_size.max(1);
        self
    }

    /// All transactions of `account_id` from `period` ago until the start of today.
    pub async fn fetch_period(&self, account_id: &str, period: &Period) -> Result<Vec<Transaction>> {
        // Day-aligned bounds keep page keys stable across runs on the same day.
        let now = start_of_day(Utc::now().timestamp());
        let from = now - period.to_duration().num_seconds();
        self.fetch_range(account_id, from, now).await
    }

    #[instrument(name = "StatementFetch", skip(self))]
    pub async fn fetch_range(&self, account_id: &str, from: i64, to: i64) -> Result<Vec<Transaction>> {
        let mut transactions = Vec::new();
        let mut seen = HashSet::new();
        let mut window_start = from;

        while window_start < to {
            let block_end = (window_start + self.max_range).min(to);
            let mut cursor = block_end;

            loop {
                let page = self.fetch_page(account_id, window_start, cursor).await?;
                let full = page.len() == self.page_size;
                let oldest = page.last().map(|tx| tx.time);

                // Window edges are inclusive on both sides, so a transaction
                // stamped exactly on `block_end` is returned twice.
                transactions.extend(page.into_iter().filter(|tx| seen.insert(tx.id.clone())));

                match oldest {
                    Some(time) if full && time - 1 >= window_start => cursor = time - 1,
                    _ => break,
                }
            }

            window_start = block_end;
        }

        debug!(
            "Fetched {} transactions for {}..{}",
            transactions.len(),
            from,
            to
        );
        Ok(transactions)
    }

    async fn fetch_page(&self, account_id: &str, from: i64, to: i64) -> Result<Vec<Transaction>> {
        let key = keys::transactions(account_id, from, to);
        match self.cache.get::<Vec<Transaction>>(&key).await? {
            CacheLookup::Hit(cached) => return Ok(cached),
            CacheLookup::Raw(_) => warn!("Refetching page with unreadable cache entry: {}", key),
            CacheLookup::Miss => {}
        }

        if self.requested.swap(true, Ordering::SeqCst) {
            self.throttle.wait().await;
        }

        let page = match self.source.fetch_statement(account_id, from, to).await {
            Ok(page) => page,
            Err(e @ Error::TransactionsNotFound { .. }) => {
                // Remember the bad window so it is not requested again until expiry.
                self.cache.set(&key, &Vec::<Transaction>::new()).await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        info!(
            "Fetched {} transactions for {} - {}",
            page.len(),
            format_ts(from),
            format_ts(to)
        );
        self.cache.set(&key, &page).await?;
        Ok(page)
    }
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}
