//! Event history panel: loading, display caps, and the live feed.

use crate::client::{ContractClient, RawEventStream};
use crate::config::{DashboardConfig, DisplayCaps};
use counterdash_core::{
    present, present_ownership, ClientError, CounterEvent, DashboardError, EventQuery,
    OwnershipTransferredEvent, PresentedCounterChange, PresentedOwnershipTransfer, RawEvent,
    COUNTER_CHANGED, OWNERSHIP_TRANSFERRED,
};
use counterdash_observability::DashboardMetrics;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shown when neither history has any entries.
pub const EMPTY_HISTORY: &str = "No events found";

// ─── HistoryView ──────────────────────────────────────────────────────────────

/// What the history panel renders: the first `cap` entries of each history
/// plus the full counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryView {
    pub total_counter_changes: usize,
    pub total_ownership_transfers: usize,
    pub counter_changes: Vec<PresentedCounterChange>,
    pub ownership_transfers: Vec<PresentedOwnershipTransfer>,
}

impl HistoryView {
    pub fn build(
        counter: &[CounterEvent],
        ownership: &[OwnershipTransferredEvent],
        caps: DisplayCaps,
    ) -> Self {
        Self {
            total_counter_changes: counter.len(),
            total_ownership_transfers: ownership.len(),
            counter_changes: present(counter.iter().take(caps.counter_changes)).collect(),
            ownership_transfers: present_ownership(ownership.iter().take(caps.ownership_transfers))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_counter_changes == 0 && self.total_ownership_transfers == 0
    }

    /// One-line count of both histories.
    pub fn summary(&self) -> String {
        format!(
            "{} CounterChanged events, {} Ownable events",
            self.total_counter_changes, self.total_ownership_transfers
        )
    }

    /// Shown values that fell back to a placeholder.
    pub fn decode_fallbacks(&self) -> usize {
        self.counter_changes.iter().map(|c| c.decode_fallbacks).sum()
    }

    fn record(&self, metrics: &DashboardMetrics) {
        metrics.record_presented(
            COUNTER_CHANGED,
            self.counter_changes.len() as u64,
            self.decode_fallbacks() as u64,
        );
        metrics.record_presented(OWNERSHIP_TRANSFERRED, self.ownership_transfers.len() as u64, 0);
    }
}

// ─── EventHistory ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct Store {
    counter: Vec<CounterEvent>,
    ownership: Vec<OwnershipTransferredEvent>,
}

#[derive(Debug, Clone, Copy)]
enum Feed {
    Counter,
    Ownership,
}

/// Both event histories of the counter contract, newest first.
#[derive(Clone)]
pub struct EventHistory {
    client: Arc<dyn ContractClient>,
    counter_query: EventQuery,
    ownership_query: EventQuery,
    caps: DisplayCaps,
    metrics: DashboardMetrics,
    store: Arc<RwLock<Store>>,
    version: Arc<watch::Sender<u64>>,
}

impl EventHistory {
    pub fn new(client: Arc<dyn ContractClient>, config: &DashboardConfig) -> Self {
        let query = |event: &str| {
            EventQuery::new(&config.contract, event)
                .from_block(config.from_block)
                .watch(config.watch)
        };
        let (version, _) = watch::channel(0);
        Self {
            client,
            counter_query: query(&config.events.counter_changed),
            ownership_query: query(&config.events.ownership_transferred),
            caps: config.display,
            metrics: DashboardMetrics::global(),
            store: Arc::new(RwLock::new(Store::default())),
            version: Arc::new(version),
        }
    }

    pub fn with_metrics(mut self, metrics: DashboardMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Fetch both histories. A failed counter history is an error; a failed
    /// ownership history only leaves that list empty.
    pub async fn load(&self) -> Result<HistoryView, DashboardError> {
        let counter = self
            .client
            .event_history(&self.counter_query)
            .await
            .map_err(|source| DashboardError::History {
                event: self.counter_query.event.clone(),
                source,
            })?;
        let ownership = match self.client.event_history(&self.ownership_query).await {
            Ok(events) => events,
            Err(e) => {
                warn!(event = %self.ownership_query.event, error = %e, "event history failed");
                Vec::new()
            }
        };

        {
            let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
            store.counter = counter.iter().map(CounterEvent::from).collect();
            store.ownership = ownership.iter().map(OwnershipTransferredEvent::from).collect();
        }
        self.version.send_modify(|v| *v += 1);

        let view = self.view();
        debug!(summary = %view.summary(), "event history loaded");
        view.record(&self.metrics);
        Ok(view)
    }

    /// Current view from what has been loaded and received so far.
    pub fn view(&self) -> HistoryView {
        let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
        HistoryView::build(&store.counter, &store.ownership, self.caps)
    }

    /// Receiver that changes whenever the stored history does.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Subscribe to new events, backfill the history, and follow the feed
    /// until `cancel` fires. Subscribing first means nothing emitted around
    /// the backfill is lost; events seen by both are kept once. Returns
    /// `None` when watching is disabled.
    pub async fn follow(
        &self,
        cancel: CancellationToken,
    ) -> Result<Option<JoinHandle<()>>, DashboardError> {
        if !self.counter_query.watch {
            return Ok(None);
        }
        let counter = self
            .subscribe_feed(&self.counter_query)
            .await
            .map(|item| (Feed::Counter, item));
        let ownership = self
            .subscribe_feed(&self.ownership_query)
            .await
            .map(|item| (Feed::Ownership, item));
        let feed = futures::stream::select(counter, ownership);
        self.load().await?;
        info!(contract = %self.counter_query.contract, "following live events");

        let history = self.clone();
        Ok(Some(tokio::spawn(async move { history.run_feed(feed, cancel).await })))
    }

    async fn subscribe_feed(&self, query: &EventQuery) -> RawEventStream {
        match self.client.watch_events(query).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(event = %query.event, error = %e, "cannot watch events");
                Box::pin(futures::stream::empty())
            }
        }
    }

    async fn run_feed<S>(self, mut feed: S, cancel: CancellationToken)
    where
        S: Stream<Item = (Feed, Result<RawEvent, ClientError>)> + Unpin,
    {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                item = feed.next() => match item {
                    Some((kind, Ok(raw))) => self.insert(kind, &raw),
                    Some((kind, Err(e))) => warn!(?kind, error = %e, "event stream error"),
                    None => break,
                },
            }
        }
        debug!("history watcher stopped");
    }

    fn insert(&self, kind: Feed, raw: &RawEvent) {
        let added = {
            let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
            match kind {
                Feed::Counter => prepend_new(&mut store.counter, CounterEvent::from(raw)),
                Feed::Ownership => {
                    prepend_new(&mut store.ownership, OwnershipTransferredEvent::from(raw))
                }
            }
        };
        if added {
            self.version.send_modify(|v| *v += 1);
        } else {
            debug!(?kind, block = ?raw.block_number, "live event already in history");
        }
    }
}

/// Insert at the front unless the backfill already delivered this event.
fn prepend_new<T: PartialEq>(events: &mut Vec<T>, event: T) -> bool {
    if events.contains(&event) {
        return false;
    }
    events.insert(0, event);
    true
}

impl std::fmt::Debug for EventHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHistory")
            .field("counter_query", &self.counter_query)
            .field("ownership_query", &self.ownership_query)
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counterdash_core::RawValue;

    fn counter_event(n: u64) -> CounterEvent {
        CounterEvent {
            reason: RawValue::from("Increased"),
            old_value: RawValue::from(n - 1),
            new_value: RawValue::from(n),
            caller: RawValue::from("0x0abc"),
            block_number: Some(n),
            transaction_hash: RawValue::Undefined,
        }
    }

    #[test]
    fn caps_limit_shown_entries_not_totals() {
        let counter: Vec<_> = (1..=30).map(counter_event).collect();
        let view = HistoryView::build(&counter, &[], DisplayCaps::default());
        assert_eq!(view.counter_changes.len(), 25);
        assert_eq!(view.total_counter_changes, 30);
        assert_eq!(view.counter_changes[0].new_value, "1");
        assert_eq!(view.summary(), "30 CounterChanged events, 0 Ownable events");
        assert!(!view.is_empty());
    }

    #[test]
    fn duplicate_live_event_is_skipped() {
        let mut events = vec![counter_event(2), counter_event(1)];
        assert!(!prepend_new(&mut events, counter_event(1)));
        assert!(prepend_new(&mut events, counter_event(3)));
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], counter_event(3));
    }

    #[test]
    fn empty_history() {
        let view = HistoryView::build(&[], &[], DisplayCaps::default());
        assert!(view.is_empty());
        assert_eq!(view.summary(), "0 CounterChanged events, 0 Ownable events");
    }

    #[test]
    fn ownership_cap() {
        let ownership: Vec<_> = (0..12)
            .map(|i| OwnershipTransferredEvent {
                new_owner: RawValue::from(i as u64 + 1),
                ..Default::default()
            })
            .collect();
        let caps = DisplayCaps {
            counter_changes: 25,
            ownership_transfers: 10,
        };
        let view = HistoryView::build(&[], &ownership, caps);
        assert_eq!(view.ownership_transfers.len(), 10);
        assert_eq!(view.total_ownership_transfers, 12);
    }
}
