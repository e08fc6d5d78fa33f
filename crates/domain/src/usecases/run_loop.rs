//! Run loop use case - orchestrates fetching, diffing, notifying and recording

use std::collections::HashSet;
use std::sync::Arc;

use tokio::time::{Duration, sleep};

use crate::{
    model::{CycleReport, Listing},
    ports::{DeliveryError, FetchError, ListingSource, Messenger, SeenStore, StoreError},
    seen::SeenSet,
    usecases::{
        render::{RenderConfig, Renderer},
        validate::{ValidationError, decode_listings, validate_response},
    },
};

/// Wait after each successful send, for the messenger's outbound rate limit
pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(5);

/// Wait between cycles, whatever the previous cycle's outcome
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(600);

/// Configuration for the poll loop
#[derive(Debug, Clone)]
pub struct PollLoopConfig {
    pub send_interval: Duration,
    pub retry_interval: Duration,
    pub render_config: RenderConfig,
}

impl Default for PollLoopConfig {
    fn default() -> Self {
        Self {
            send_interval: DEFAULT_SEND_INTERVAL,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            render_config: RenderConfig::default(),
        }
    }
}

/// Errors that end a single poll cycle
///
/// Every variant is handled the same way by [`PollLoop::run_once`]: log it and
/// wait for the next cycle.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to deliver listing {listing_id}: {source}")]
    Delivery {
        listing_id: String,
        #[source]
        source: DeliveryError,
    },
    #[error("Failed to record listing {listing_id}: {source}")]
    Store {
        listing_id: String,
        #[source]
        source: StoreError,
    },
}

impl CycleError {
    /// Short tag used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(FetchError::Transport(_)) => "transport",
            Self::Fetch(FetchError::Status(_)) => "status",
            Self::Fetch(FetchError::Decode(_)) => "decode",
            Self::Validation(ValidationError::EmptyResult) => "empty_result",
            Self::Validation(ValidationError::Shape(_)) => "shape",
            Self::Delivery { .. } => "failed_delivery",
            Self::Store { .. } => "store",
        }
    }
}

/// Validated listings split by seen-set membership
#[derive(Debug, Default)]
pub struct Diff {
    pub seen: Vec<Listing>,
    pub new: Vec<Listing>,
}

/// Split listings into already-seen and new, keeping upstream order
///
/// An identifier repeated within the payload is only counted once.
pub fn partition_new<St: SeenStore + ?Sized>(listings: Vec<Listing>, seen: &SeenSet<St>) -> Diff {
    let mut diff = Diff::default();
    let mut in_payload = HashSet::new();

    for listing in listings {
        if !in_payload.insert(listing.id.clone()) {
            continue;
        }
        if seen.contains(&listing.id) {
            diff.seen.push(listing);
        } else {
            diff.new.push(listing);
        }
    }

    diff
}

/// Poll loop orchestrator
pub struct PollLoop<S, M, St>
where
    S: ListingSource + ?Sized,
    M: Messenger + ?Sized,
    St: SeenStore + ?Sized,
{
    source: Arc<S>,
    messenger: Arc<M>,
    seen: SeenSet<St>,
    renderer: Renderer,
    config: PollLoopConfig,
}

impl<S, M, St> PollLoop<S, M, St>
where
    S: ListingSource + ?Sized,
    M: Messenger + ?Sized,
    St: SeenStore + ?Sized,
{
    pub fn new(source: Arc<S>, messenger: Arc<M>, seen: SeenSet<St>, config: PollLoopConfig) -> Self {
        let renderer = Renderer::new(config.render_config.clone());
        Self {
            source,
            messenger,
            seen,
            renderer,
            config,
        }
    }

    pub fn seen(&self) -> &SeenSet<St> {
        &self.seen
    }

    /// Run one fetch → validate → diff → notify → record pass
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let raw = self.source.fetch().await?;
        let records = validate_response(raw)?;
        let fetched = records.len();
        let (listings, malformed) = decode_listings(records);

        let diff = partition_new(listings, &self.seen);
        let mut report = CycleReport {
            fetched,
            already_seen: diff.seen.len(),
            malformed,
            notified: Vec::with_capacity(diff.new.len()),
        };

        if diff.new.is_empty() {
            tracing::debug!(fetched, "No new listings");
            return Ok(report);
        }

        tracing::info!(fetched, new = diff.new.len(), "Found new listings");

        for listing in &diff.new {
            let notification = self.renderer.render(listing);

            self.messenger
                .send(&notification)
                .await
                .map_err(|source| CycleError::Delivery {
                    listing_id: listing.id.clone(),
                    source,
                })?;

            // Record only after the send succeeded: a crash in between costs
            // at most one duplicate notification.
            self.seen
                .record(&listing.id)
                .await
                .map_err(|source| CycleError::Store {
                    listing_id: listing.id.clone(),
                    source,
                })?;

            tracing::info!(listing_id = %listing.id, "Notified listing");
            report.notified.push(listing.id.clone());

            sleep(self.config.send_interval).await;
        }

        Ok(report)
    }

    /// Run one cycle behind the catch-all error boundary
    pub async fn run_once(&mut self) -> Option<CycleReport> {
        match self.run_cycle().await {
            Ok(report) => {
                tracing::info!(
                    fetched = report.fetched,
                    already_seen = report.already_seen,
                    malformed = report.malformed,
                    notified = report.notified.len(),
                    "Poll cycle complete"
                );
                Some(report)
            }
            Err(e) => {
                tracing::error!(kind = e.kind(), error = %e, "Poll cycle failed");
                None
            }
        }
    }

    /// Poll forever, sleeping the retry interval after every cycle
    pub async fn run(&mut self) {
        loop {
            self.run_once().await;
            sleep(self.config.retry_interval).await;
        }
    }
}
