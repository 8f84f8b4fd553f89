//! Dashboard controller caching one view per day range

use crate::snapshot::StatusSnapshot;
use crate::source::StatusSource;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{debug, error, info, instrument};

/// What the dashboard shows for one range.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Nothing fetched yet
    Loading,
    Loaded {
        snapshot: StatusSnapshot,
        fetched_at: DateTime<Utc>,
    },
    /// The last fetch failed; no cards are shown
    Failed { message: String },
}

/// Result of a single refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    Failed,
    /// A newer refresh of the same range started while this one was in
    /// flight; its response was dropped.
    Stale,
}

#[derive(Debug)]
struct RangeEntry {
    view: ViewState,
    generation: u64,
}

impl RangeEntry {
    fn loading() -> Self {
        Self {
            view: ViewState::Loading,
            generation: 0,
        }
    }
}

/// Owns the fetched views. Each range is fetched and replaced on its own, so
/// a viewer's range never changes what another viewer sees.
pub struct DashboardController {
    source: Arc<dyn StatusSource>,
    default_days: u32,
    ranges: RwLock<HashMap<u32, RangeEntry>>,
    generation: AtomicU64,
    refresh_interval: Duration,
}

impl DashboardController {
    pub fn new(source: Arc<dyn StatusSource>, default_days: u32, refresh_interval: Duration) -> Self {
        Self {
            source,
            default_days,
            ranges: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            refresh_interval,
        }
    }

    /// Current view of `days`; `Loading` until its first fetch completes.
    pub async fn view(&self, days: u32) -> ViewState {
        self.ranges
            .read()
            .await
            .get(&days)
            .map(|entry| entry.view.clone())
            .unwrap_or(ViewState::Loading)
    }

    /// Ranges that have been requested so far, ascending. The default range
    /// is always included.
    pub async fn tracked_ranges(&self) -> Vec<u32> {
        let ranges = self.ranges.read().await;
        let mut days: Vec<u32> = ranges.keys().copied().collect();
        if !ranges.contains_key(&self.default_days) {
            days.push(self.default_days);
        }
        days.sort_unstable();
        days
    }

    /// Fetch `days` and replace its view with the result.
    #[instrument(skip(self))]
    pub async fn refresh(&self, days: u32) -> RefreshOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.ranges
            .write()
            .await
            .entry(days)
            .or_insert_with(RangeEntry::loading)
            .generation = generation;

        let result = self.source.fetch(days).await;

        let mut ranges = self.ranges.write().await;
        let entry = ranges.entry(days).or_insert_with(RangeEntry::loading);
        if entry.generation != generation {
            debug!("Discarding stale status response for {} days (request {})", days, generation);
            return RefreshOutcome::Stale;
        }

        match result {
            Ok(snapshot) => {
                info!(
                    "Loaded status for {} days: {} services, overall '{}'",
                    days,
                    snapshot.services.len(),
                    snapshot.overall_text()
                );
                entry.view = ViewState::Loaded {
                    snapshot,
                    fetched_at: Utc::now(),
                };
                RefreshOutcome::Applied
            }
            Err(e) => {
                error!("Failed to load status for {} days: {}", days, e);
                entry.view = ViewState::Failed {
                    message: e.to_string(),
                };
                RefreshOutcome::Failed
            }
        }
    }

    /// View of `days`, fetching it first when the range has never been
    /// requested. Later requests are answered from the cached view.
    pub async fn ensure_loaded(&self, days: u32) -> ViewState {
        let first_request = {
            let mut ranges = self.ranges.write().await;
            if ranges.contains_key(&days) {
                false
            } else {
                ranges.insert(days, RangeEntry::loading());
                true
            }
        };

        if first_request {
            info!("First request for {} days, fetching", days);
            self.refresh(days).await;
        }
        self.view(days).await
    }

    /// Refresh every tracked range.
    pub async fn refresh_all(&self) -> Vec<(u32, RefreshOutcome)> {
        let mut outcomes = Vec::new();
        for days in self.tracked_ranges().await {
            outcomes.push((days, self.refresh(days).await));
        }
        outcomes
    }

    /// Refresh on a fixed interval. The first tick fires immediately and
    /// serves as the initial load of the default range.
    pub async fn run_periodic(self: Arc<Self>) {
        let mut refresh_interval = interval(self.refresh_interval);

        loop {
            refresh_interval.tick().await;
            self.refresh_all().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Result, StatusPageError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    /// Answers with `days=N call=M` as the overall status. The first request
    /// for `slow_days` takes 100ms.
    struct ScriptedSource {
        calls: AtomicUsize,
        fail: bool,
        slow_days: u32,
        slowed: AtomicBool,
    }

    impl ScriptedSource {
        fn new(fail: bool, slow_days: u32) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
                slow_days,
                slowed: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch(&self, days: u32) -> Result<StatusSnapshot> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if days == self.slow_days && !self.slowed.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            if self.fail {
                return Err(StatusPageError::Fetch("HTTP 500".to_string()));
            }
            Ok(StatusSnapshot {
                overall_status: format!("days={} call={}", days, call),
                ..Default::default()
            })
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn overall(view: &ViewState) -> Option<&str> {
        match view {
            ViewState::Loaded { snapshot, .. } => Some(snapshot.overall_status.as_str()),
            _ => None,
        }
    }

    fn controller(source: Arc<ScriptedSource>) -> DashboardController {
        DashboardController::new(source, 7, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let controller = controller(ScriptedSource::new(false, 0));
        assert_eq!(controller.view(7).await, ViewState::Loading);
        assert_eq!(controller.tracked_ranges().await, vec![7]);
    }

    #[tokio::test]
    async fn test_refresh_replaces_view() {
        let controller = controller(ScriptedSource::new(false, 0));

        assert_eq!(controller.refresh(7).await, RefreshOutcome::Applied);
        assert_eq!(overall(&controller.view(7).await), Some("days=7 call=1"));

        assert_eq!(controller.refresh(7).await, RefreshOutcome::Applied);
        assert_eq!(overall(&controller.view(7).await), Some("days=7 call=2"));
    }

    #[tokio::test]
    async fn test_failure_replaces_cards_with_error() {
        let controller = controller(ScriptedSource::new(true, 0));

        assert_eq!(controller.refresh(7).await, RefreshOutcome::Failed);
        assert_eq!(
            controller.view(7).await,
            ViewState::Failed {
                message: "Fetch error: HTTP 500".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let controller = controller(ScriptedSource::new(false, 1));

        let slow = controller.refresh(1);
        let fast = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            controller.refresh(1).await
        };
        let (slow, fast) = tokio::join!(slow, fast);

        assert_eq!(slow, RefreshOutcome::Stale);
        assert_eq!(fast, RefreshOutcome::Applied);
        assert_eq!(overall(&controller.view(1).await), Some("days=1 call=2"));
    }

    #[tokio::test]
    async fn test_ranges_do_not_share_views() {
        let controller = controller(ScriptedSource::new(false, 1));
        controller.refresh(90).await;

        // while the one-day fetch is in flight, the 90-day view is untouched
        let pending = controller.refresh(1);
        let observed = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            (controller.view(90).await, controller.view(1).await)
        };
        let (outcome, (ninety, one)) = tokio::join!(pending, observed);

        assert_eq!(outcome, RefreshOutcome::Applied);
        assert_eq!(overall(&ninety), Some("days=90 call=1"));
        assert_eq!(one, ViewState::Loading);
        assert_eq!(overall(&controller.view(1).await), Some("days=1 call=2"));
        assert_eq!(overall(&controller.view(90).await), Some("days=90 call=1"));
    }

    #[tokio::test]
    async fn test_ensure_loaded_fetches_once() {
        let source = ScriptedSource::new(false, 0);
        let controller = controller(source.clone());

        assert_eq!(overall(&controller.ensure_loaded(30).await), Some("days=30 call=1"));
        assert_eq!(overall(&controller.ensure_loaded(30).await), Some("days=30 call=1"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.tracked_ranges().await, vec![7, 30]);
    }

    #[tokio::test]
    async fn test_periodic_refresh_loads_default_immediately() {
        let source = ScriptedSource::new(false, 0);
        let controller = Arc::new(DashboardController::new(source.clone(), 7, Duration::from_secs(3600)));

        let task = tokio::spawn(controller.clone().run_periodic());
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(overall(&controller.view(7).await), Some("days=7 call=1"));
    }
}
