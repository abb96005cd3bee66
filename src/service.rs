//! Decides whether a request is served from the last stored snapshot or
//! triggers a new extraction, and shapes the snapshot that goes out.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::db::{RequestInfo, SnapshotStore};
use crate::error::PipelineError;
use crate::fallback;
use crate::fetch::Fetcher;
use crate::model::{Locations, Provenance, ResortSnapshot};
use crate::parser;

/// Stored snapshots younger than this are served without fetching.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(30 * 60);

pub struct StatusService<F, S> {
    fetcher: F,
    store: S,
    // Cache misses queue here so concurrent misses share one extraction.
    refresh_lock: Mutex<()>,
}

impl<F: Fetcher, S: SnapshotStore> StatusService<F, S> {
    pub fn new(fetcher: F, store: S) -> Self {
        Self {
            fetcher,
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    pub async fn obtain(&self, force: bool, request: &RequestInfo) -> ResortSnapshot {
        self.obtain_at(force, request, Utc::now()).await
    }

    /// Same as [`obtain`](Self::obtain) with an explicit clock reading.
    pub async fn obtain_at(&self, force: bool, request: &RequestInfo, now: DateTime<Utc>) -> ResortSnapshot {
        if !force {
            if let Some(snapshot) = self.cached(now) {
                return snapshot;
            }
        }

        let _guard = self.refresh_lock.lock().await;
        if !force {
            // another request may have refreshed while we waited
            if let Some(snapshot) = self.cached(now) {
                return snapshot;
            }
        }
        self.refresh(request, now).await
    }

    fn cached(&self, now: DateTime<Utc>) -> Option<ResortSnapshot> {
        let stored = match self.store.latest() {
            Ok(stored) => stored?,
            Err(err) => {
                warn!(error = %err, "store lookup failed, treating as cache miss");
                return None;
            }
        };
        let age_ms = (now - stored.created_at).num_milliseconds().max(0);
        if age_ms >= FRESHNESS_WINDOW.as_millis() as i64 {
            debug!(age_ms, "stored snapshot is stale");
            return None;
        }
        let age_secs = rounded_secs(age_ms);
        debug!(age_secs, id = stored.id, "serving stored snapshot");
        Some(ResortSnapshot {
            timestamp: stored.timestamp,
            locations: stored.locations,
            provenance: Provenance::Cache { age_secs },
        })
    }

    async fn refresh(&self, request: &RequestInfo, now: DateTime<Utc>) -> ResortSnapshot {
        match self.extract(now).await {
            Ok(locations) => {
                let snapshot = ResortSnapshot {
                    timestamp: now,
                    locations,
                    provenance: Provenance::Fresh,
                };
                match self.store.append(&snapshot, now, request) {
                    Ok(id) => info!(id, "stored fresh snapshot"),
                    Err(err) => warn!(error = %err, "failed to store snapshot"),
                }
                snapshot
            }
            Err(err) => {
                let message = err.to_string();
                warn!(stage = err.stage(), error = %message, "extraction failed, serving fallback");
                if let Err(store_err) = self.store.record_error(now, err.stage(), &message) {
                    warn!(error = %store_err, "failed to record extraction failure");
                }
                ResortSnapshot {
                    timestamp: now,
                    locations: fallback::locations(),
                    provenance: Provenance::Fallback { error: message },
                }
            }
        }
    }

    async fn extract(&self, now: DateTime<Utc>) -> Result<Locations, PipelineError> {
        let content = self.fetcher.fetch().await?;
        if let Err(err) = self.store.record_response(now, content.status, &content.preview()) {
            warn!(error = %err, "failed to record source response");
        }
        parser::extract_locations(content.content_type.as_deref(), &content.body)
    }
}

/// Whole seconds, half rounding up.
pub fn rounded_secs(ms: i64) -> i64 {
    (ms + 500) / 1000
}
