//! Event Stream Reconciler
//!
//! Keeps the live event buffer in step with the backend. A push channel feeds
//! incremental merges; when the channel fails or closes the reconciler falls
//! back to polling the search endpoint and replacing the buffer. Reconnection
//! is manual.
//!
//! Status moves `Idle -> Connecting -> Open -> (Closed | Error)`. Buffered
//! events survive channel failures.
//!
//! Both the push path and the pull path go through the same buffer mutex, so
//! every mutation is applied in arrival order.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use anpr_console_core::constants::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_SEARCH_LIMIT, EVENT_BUFFER_CAPACITY,
};
use anpr_console_core::{
    event_bus, ApiError, AppEvent, ConnectionError, ConnectionStatus, EventBus, StreamEvent,
};

use crate::buffer::{EventBuffer, MergeOutcome};
use crate::channel::{EventSearch, PushChannel, PushConnector};
use crate::event::{normalize_message, PlateEvent};
use crate::query::{SearchQuery, StreamFilter};

/// Reconciler tuning.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Period of the polling fallback. Raised to 1 ms if smaller.
    pub poll_interval: Duration,
    /// Page size requested while polling.
    pub search_limit: u32,
    /// Maximum number of buffered events.
    pub buffer_capacity: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            search_limit: DEFAULT_SEARCH_LIMIT,
            buffer_capacity: EVENT_BUFFER_CAPACITY,
        }
    }
}

/// Floor for the polling period; a zero interval cannot be scheduled.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

struct ChannelTask {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

struct PollTask {
    generation: u64,
    handle: JoinHandle<()>,
}

/// State shared with the channel and polling tasks.
struct Shared {
    buffer: Mutex<EventBuffer>,
    status: watch::Sender<ConnectionStatus>,
    revision: watch::Sender<u64>,
    torn_down: AtomicBool,
    /// Bumped on every connect, channel stop and teardown. Tasks holding an
    /// older value must not touch state.
    generation: AtomicU64,
    poll_task: Mutex<Option<PollTask>>,
    poll_query: Mutex<SearchQuery>,
    poll_interval: Duration,
    search_limit: u32,
    search: Arc<dyn EventSearch>,
    bus: Arc<EventBus>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        !self.torn_down.load(Ordering::SeqCst)
            && self.generation.load(Ordering::SeqCst) == generation
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn set_status(&self, status: ConnectionStatus) {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status.clone();
                true
            }
        });
        if changed {
            tracing::info!("Push channel {}", status);
            self.bus.publish(AppEvent::Stream(StreamEvent::StatusChanged { status }));
        }
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|r| *r = r.wrapping_add(1));
    }

    fn merge(&self, event: PlateEvent) -> MergeOutcome {
        let outcome = self.buffer.lock().merge(event);
        self.bump_revision();
        outcome
    }

    fn replace(&self, events: Vec<PlateEvent>) -> usize {
        let count = {
            let mut buffer = self.buffer.lock();
            buffer.replace(events);
            buffer.len()
        };
        self.bump_revision();
        self.bus.publish(AppEvent::Stream(StreamEvent::EventsReplaced { count }));
        count
    }

    fn start_polling(self: &Arc<Self>, generation: u64) {
        if !self.is_current(generation) {
            return;
        }
        let mut slot = self.poll_task.lock();
        if let Some(task) = slot.as_ref() {
            if task.generation == generation && !task.handle.is_finished() {
                return;
            }
            task.handle.abort();
        }

        let shared = Arc::clone(self);
        *slot = Some(PollTask {
            generation,
            handle: tokio::spawn(shared.poll_loop(generation)),
        });
        drop(slot);

        let interval_ms = self.poll_interval.as_millis() as u64;
        tracing::info!("Falling back to polling every {}ms", interval_ms);
        self.bus.publish(AppEvent::Stream(StreamEvent::PollingStarted { interval_ms }));
    }

    fn stop_polling(&self) {
        if let Some(task) = self.poll_task.lock().take() {
            task.handle.abort();
            tracing::debug!("Polling stopped");
        }
    }

    fn is_polling(&self) -> bool {
        self.poll_task
            .lock()
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    async fn poll_loop(self: Arc<Self>, generation: u64) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if !self.is_current(generation) {
                break;
            }
            let query = self.poll_query.lock().clone();
            match self.search.search(&query).await {
                Ok(events) if self.is_current(generation) => {
                    tracing::debug!("Poll returned {} events", events.len());
                    self.replace(events);
                }
                Ok(_) => break,
                Err(e) => tracing::warn!("Polling search failed: {}", e),
            }
        }
    }
}

async fn run_channel(
    shared: Arc<Shared>,
    mut channel: Box<dyn PushChannel>,
    mut shutdown: watch::Receiver<bool>,
    generation: u64,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                channel.close().await;
                tracing::debug!("Push channel closed by client");
                return;
            }
            message = channel.next_message() => {
                if !shared.is_current(generation) {
                    channel.close().await;
                    return;
                }
                match message {
                    Some(Ok(text)) => {
                        if let Some(event) = normalize_message(&text) {
                            shared.merge(event);
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Push channel failed: {}", e);
                        shared.set_status(ConnectionStatus::Error(e.to_string()));
                        shared.start_polling(generation);
                        return;
                    }
                    None => {
                        shared.set_status(ConnectionStatus::Closed);
                        shared.start_polling(generation);
                        return;
                    }
                }
            }
        }
    }
}

/// Owns the live event buffer for one dashboard view.
///
/// Dropping the reconciler tears it down.
pub struct EventStreamReconciler {
    shared: Arc<Shared>,
    connector: Arc<dyn PushConnector>,
    channel: Option<ChannelTask>,
}

impl EventStreamReconciler {
    /// Creates a reconciler publishing to the global event bus.
    pub fn new(
        connector: Arc<dyn PushConnector>,
        search: Arc<dyn EventSearch>,
        config: ReconcilerConfig,
    ) -> Self {
        Self::with_event_bus(connector, search, config, event_bus())
    }

    pub fn with_event_bus(
        connector: Arc<dyn PushConnector>,
        search: Arc<dyn EventSearch>,
        config: ReconcilerConfig,
        bus: Arc<EventBus>,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Idle);
        let (revision, _) = watch::channel(0u64);
        let shared = Shared {
            buffer: Mutex::new(EventBuffer::with_capacity(config.buffer_capacity)),
            status,
            revision,
            torn_down: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            poll_task: Mutex::new(None),
            poll_query: Mutex::new(SearchQuery::default().with_limit(config.search_limit)),
            poll_interval: config.poll_interval.max(MIN_POLL_INTERVAL),
            search_limit: config.search_limit,
            search,
            bus,
        };
        Self {
            shared: Arc::new(shared),
            connector,
            channel: None,
        }
    }

    /// Opens the push channel for `filter`.
    ///
    /// A failed connect is not fatal: the status becomes `Error` and polling
    /// starts, but the error is still returned so the caller can report it.
    pub async fn connect(&mut self, filter: StreamFilter) -> Result<(), ConnectionError> {
        if self.is_torn_down() {
            return Err(ConnectionError::TornDown);
        }
        if self
            .channel
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
        {
            return Err(ConnectionError::AlreadyConnected);
        }

        let generation = self.shared.next_generation();
        let query = SearchQuery::from_filter(filter.clone()).with_limit(self.shared.search_limit);
        *self.shared.poll_query.lock() = query;
        self.shared.set_status(ConnectionStatus::Connecting);

        match self.connector.connect(&filter).await {
            Ok(channel) => {
                self.shared.stop_polling();
                self.shared.set_status(ConnectionStatus::Open);
                let (shutdown, shutdown_rx) = watch::channel(false);
                let handle = tokio::spawn(run_channel(
                    Arc::clone(&self.shared),
                    channel,
                    shutdown_rx,
                    generation,
                ));
                self.channel = Some(ChannelTask { handle, shutdown });
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Push channel unavailable: {}", e);
                self.shared.set_status(ConnectionStatus::Error(e.to_string()));
                self.shared.start_polling(generation);
                Err(e)
            }
        }
    }

    /// Drops the current channel and polling, then connects again.
    pub async fn reconnect(&mut self, filter: StreamFilter) -> Result<(), ConnectionError> {
        if self.is_torn_down() {
            return Err(ConnectionError::TornDown);
        }
        self.stop_channel();
        self.shared.stop_polling();
        self.connect(filter).await
    }

    fn stop_channel(&mut self) {
        if let Some(task) = self.channel.take() {
            self.shared.next_generation();
            // the task closes the channel when it sees the signal
            let _ = task.shutdown.send(true);
        }
    }

    /// Full refetch through the search endpoint; replaces the buffer.
    ///
    /// Returns the number of events installed. After teardown nothing is installed.
    pub async fn refresh(&self, query: &SearchQuery) -> Result<usize, ApiError> {
        let events = self.shared.search.search(query).await?;
        if self.is_torn_down() {
            return Ok(0);
        }
        Ok(self.shared.replace(events))
    }

    /// Merges one event as if it arrived on the push channel.
    pub fn merge(&self, event: PlateEvent) -> MergeOutcome {
        self.shared.merge(event)
    }

    /// Installs a full result list verbatim.
    pub fn replace(&self, events: Vec<PlateEvent>) -> usize {
        self.shared.replace(events)
    }

    pub fn clear(&self) {
        self.shared.buffer.lock().clear();
        self.shared.bump_revision();
    }

    /// Buffered events, newest first.
    pub fn events(&self) -> Vec<PlateEvent> {
        self.shared.buffer.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.shared.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.buffer.lock().is_empty()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.borrow().clone()
    }

    /// Error text of the last channel failure, while the status is `Error`.
    pub fn connection_error(&self) -> Option<String> {
        match &*self.shared.status.borrow() {
            ConnectionStatus::Error(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Receiver that changes whenever the buffer changes.
    pub fn subscribe_revision(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.shared.revision.borrow()
    }

    pub fn is_polling(&self) -> bool {
        self.shared.is_polling()
    }

    pub fn is_connected(&self) -> bool {
        self.channel
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.torn_down.load(Ordering::SeqCst)
    }

    /// Closes the channel and stops polling. Safe to call repeatedly.
    ///
    /// Buffered events stay readable afterwards.
    pub fn teardown(&mut self) {
        if self.shared.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop_channel();
        self.shared.stop_polling();
        self.shared.set_status(ConnectionStatus::Closed);
        tracing::debug!("Event stream reconciler torn down");
    }
}

impl Drop for EventStreamReconciler {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for EventStreamReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStreamReconciler")
            .field("status", &self.status())
            .field("events", &self.len())
            .field("polling", &self.is_polling())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anpr_console_core::EventFilter;
    use async_trait::async_trait;
    use std::sync::Weak;

    struct NoChannel;

    #[async_trait]
    impl PushConnector for NoChannel {
        async fn connect(
            &self,
            _filter: &StreamFilter,
        ) -> Result<Box<dyn PushChannel>, ConnectionError> {
            Err(ConnectionError::Connect {
                url: "ws://localhost/events/stream".to_string(),
                reason: "refused".to_string(),
            })
        }
    }

    struct EmptySearch;

    #[async_trait]
    impl EventSearch for EmptySearch {
        async fn search(&self, _query: &SearchQuery) -> Result<Vec<PlateEvent>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn reconciler(config: ReconcilerConfig, bus: Arc<EventBus>) -> EventStreamReconciler {
        EventStreamReconciler::with_event_bus(Arc::new(NoChannel), Arc::new(EmptySearch), config, bus)
    }

    #[test]
    fn test_poll_interval_has_a_floor() {
        let zero = ReconcilerConfig {
            poll_interval: Duration::ZERO,
            ..ReconcilerConfig::default()
        };
        let r = reconciler(zero, Arc::new(EventBus::new()));
        assert_eq!(r.shared.poll_interval, MIN_POLL_INTERVAL);

        let r = reconciler(ReconcilerConfig::default(), Arc::new(EventBus::new()));
        assert_eq!(
            r.shared.poll_interval,
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        );
    }

    #[tokio::test]
    async fn test_polling_handler_can_query_reconciler() {
        let bus = Arc::new(EventBus::new());
        let mut r = reconciler(ReconcilerConfig::default(), bus.clone());

        let seen = Arc::new(AtomicBool::new(false));
        let shared: Weak<Shared> = Arc::downgrade(&r.shared);
        let flag = seen.clone();
        bus.subscribe(EventFilter::All, move |event| {
            if let AppEvent::Stream(StreamEvent::PollingStarted { .. }) = event {
                if let Some(shared) = shared.upgrade() {
                    flag.store(shared.is_polling(), Ordering::SeqCst);
                }
            }
        });

        assert!(r.connect(StreamFilter::new()).await.is_err());
        assert!(seen.load(Ordering::SeqCst));
        r.teardown();
    }
}
