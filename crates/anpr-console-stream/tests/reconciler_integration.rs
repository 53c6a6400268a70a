//! Event stream reconciler integration tests
//!
//! The push channel and search endpoint are replaced by in-memory mocks.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use anpr_console_core::{
    ApiError, AppEvent, ConnectionError, ConnectionStatus, EventBus, EventBusConfig, StreamEvent,
};
use anpr_console_stream::{
    EventSearch, EventStreamReconciler, PlateEvent, PushChannel, PushConnector, ReconcilerConfig,
    SearchQuery, StreamFilter,
};

type Outbox = mpsc::UnboundedSender<Result<String, ConnectionError>>;

struct MockChannel {
    rx: mpsc::UnboundedReceiver<Result<String, ConnectionError>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl PushChannel for MockChannel {
    async fn next_message(&mut self) -> Option<Result<String, ConnectionError>> {
        self.rx.recv().await
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct MockConnector {
    pending: Mutex<VecDeque<Result<MockChannel, ConnectionError>>>,
    filters: Mutex<Vec<StreamFilter>>,
}

impl MockConnector {
    /// Queues a channel and returns its sender plus a "closed by client" flag.
    fn queue_channel(&self) -> (Outbox, Arc<AtomicBool>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        self.pending.lock().unwrap().push_back(Ok(MockChannel {
            rx,
            closed: closed.clone(),
        }));
        (tx, closed)
    }

    fn queue_failure(&self, reason: &str) {
        self.pending
            .lock()
            .unwrap()
            .push_back(Err(ConnectionError::Connect {
                url: "ws://mock/events/stream".to_string(),
                reason: reason.to_string(),
            }));
    }
}

#[async_trait]
impl PushConnector for MockConnector {
    async fn connect(
        &self,
        filter: &StreamFilter,
    ) -> Result<Box<dyn PushChannel>, ConnectionError> {
        self.filters.lock().unwrap().push(filter.clone());
        match self.pending.lock().unwrap().pop_front() {
            Some(Ok(channel)) => Ok(Box::new(channel)),
            Some(Err(e)) => Err(e),
            None => Err(ConnectionError::Connect {
                url: "ws://mock/events/stream".to_string(),
                reason: "no channel queued".to_string(),
            }),
        }
    }
}

#[derive(Default)]
struct MockSearch {
    results: Mutex<Vec<PlateEvent>>,
    queries: Mutex<Vec<SearchQuery>>,
    calls: AtomicUsize,
}

#[async_trait]
impl EventSearch for MockSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<PlateEvent>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.results.lock().unwrap().clone())
    }
}

struct Harness {
    reconciler: EventStreamReconciler,
    connector: Arc<MockConnector>,
    search: Arc<MockSearch>,
    bus: Arc<EventBus>,
}

fn harness() -> Harness {
    let connector = Arc::new(MockConnector::default());
    let search = Arc::new(MockSearch::default());
    let bus = Arc::new(EventBus::with_config(EventBusConfig {
        enable_history: true,
        ..Default::default()
    }));
    let reconciler = EventStreamReconciler::with_event_bus(
        connector.clone(),
        search.clone(),
        ReconcilerConfig::default(),
        bus.clone(),
    );
    Harness {
        reconciler,
        connector,
        search,
        bus,
    }
}

fn ev(id: i64, plate: &str) -> PlateEvent {
    PlateEvent::new(plate).with_id(id)
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

async fn wait_revision(reconciler: &EventStreamReconciler, at_least: u64) {
    let mut rx = reconciler.subscribe_revision();
    rx.wait_for(|r| *r >= at_least).await.unwrap();
}

#[tokio::test]
async fn test_push_messages_merge_by_id() {
    let mut h = harness();
    let (tx, _closed) = h.connector.queue_channel();
    h.reconciler.connect(StreamFilter::new()).await.unwrap();
    assert_eq!(h.reconciler.status(), ConnectionStatus::Open);

    tx.send(Ok(r#"{"id":1,"plate":"AAA111","camera_id":1}"#.into())).unwrap();
    tx.send(Ok(r#"{"id":2,"plate":"BBB222","confidence":0.4}"#.into())).unwrap();
    tx.send(Ok(r#"{"id":3,"plate_text":"CCC333"}"#.into())).unwrap();
    tx.send(Ok(r#"{"id":2,"plate":"BBB223","confidence":0.95}"#.into())).unwrap();
    wait_revision(&h.reconciler, 4).await;

    let events = h.reconciler.events();
    let ids: Vec<_> = events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![Some(3), Some(2), Some(1)]);
    assert_eq!(events[1].plate, "BBB223");
    assert_eq!(events[1].confidence, Some(0.95));
    assert_eq!(events[2].camera_id, Some(1));
}

#[tokio::test]
async fn test_non_plate_messages_are_ignored() {
    let mut h = harness();
    let (tx, _closed) = h.connector.queue_channel();
    h.reconciler.connect(StreamFilter::new()).await.unwrap();

    tx.send(Ok(r#"{"message":"event streaming coming soon"}"#.into())).unwrap();
    tx.send(Ok("garbage".into())).unwrap();
    tx.send(Ok(r#"{"plate":"DDD444"}"#.into())).unwrap();
    wait_revision(&h.reconciler, 1).await;

    assert_eq!(h.reconciler.len(), 1);
    assert_eq!(h.reconciler.revision(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_server_close_falls_back_to_polling() {
    let mut h = harness();
    *h.search.results.lock().unwrap() = vec![ev(10, "POLL1"), ev(9, "POLL2")];
    let (tx, _closed) = h.connector.queue_channel();
    h.reconciler
        .connect(StreamFilter::new().with_camera(4))
        .await
        .unwrap();

    tx.send(Ok(r#"{"id":1,"plate":"LIVE1"}"#.into())).unwrap();
    wait_revision(&h.reconciler, 1).await;
    drop(tx);

    let mut status = h.reconciler.subscribe_status();
    status
        .wait_for(|s| *s == ConnectionStatus::Closed)
        .await
        .unwrap();
    assert!(h.reconciler.is_polling());
    // a closed channel keeps what was already buffered
    assert_eq!(h.reconciler.len(), 1);
    assert_eq!(h.search.calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(11)).await;
    settle().await;

    assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);
    let query = h.search.queries.lock().unwrap()[0].clone();
    assert_eq!(query.filter.camera_id, Some(4));
    assert_eq!(query.limit, 50);

    let plates: Vec<_> = h.reconciler.events().into_iter().map(|e| e.plate).collect();
    assert_eq!(plates, vec!["POLL1", "POLL2"]);

    assert!(h.bus.history().contains(&AppEvent::Stream(StreamEvent::PollingStarted {
        interval_ms: 10_000
    })));
}

#[tokio::test]
async fn test_connect_failure_reports_error_and_polls() {
    let mut h = harness();
    h.connector.queue_failure("connection refused");

    let result = h.reconciler.connect(StreamFilter::new()).await;
    assert!(matches!(result, Err(ConnectionError::Connect { .. })));
    assert!(h.reconciler.status().is_degraded());
    assert!(h
        .reconciler
        .connection_error()
        .unwrap()
        .contains("connection refused"));
    assert!(h.reconciler.is_polling());

    let statuses: Vec<_> = h
        .bus
        .history()
        .into_iter()
        .filter_map(|e| match e {
            AppEvent::Stream(StreamEvent::StatusChanged { status }) => Some(status),
            _ => None,
        })
        .collect();
    assert_eq!(statuses[0], ConnectionStatus::Connecting);
    assert!(matches!(statuses[1], ConnectionStatus::Error(_)));
}

#[tokio::test(start_paused = true)]
async fn test_zero_poll_interval_still_polls() {
    let connector = Arc::new(MockConnector::default());
    let search = Arc::new(MockSearch::default());
    *search.results.lock().unwrap() = vec![ev(7, "ZERO1")];
    let config = ReconcilerConfig {
        poll_interval: Duration::ZERO,
        ..ReconcilerConfig::default()
    };
    let mut reconciler = EventStreamReconciler::with_event_bus(
        connector,
        search.clone(),
        config,
        Arc::new(EventBus::new()),
    );

    assert!(reconciler.connect(StreamFilter::new()).await.is_err());
    wait_revision(&reconciler, 1).await;

    assert!(reconciler.is_polling());
    assert_eq!(reconciler.len(), 1);
    assert_eq!(reconciler.events()[0].plate, "ZERO1");
    assert!(reconciler.status().is_degraded());
    assert!(search.calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn test_channel_error_keeps_buffer() {
    let mut h = harness();
    let (tx, _closed) = h.connector.queue_channel();
    h.reconciler.connect(StreamFilter::new()).await.unwrap();

    tx.send(Ok(r#"{"id":5,"plate":"EEE555"}"#.into())).unwrap();
    tx.send(Err(ConnectionError::Channel {
        reason: "reset by peer".to_string(),
    }))
    .unwrap();

    let mut status = h.reconciler.subscribe_status();
    status.wait_for(|s| s.is_degraded()).await.unwrap();
    assert_eq!(
        h.reconciler.status(),
        ConnectionStatus::Error("Channel error: reset by peer".to_string())
    );
    assert_eq!(h.reconciler.len(), 1);
    assert!(h.reconciler.is_polling());
}

#[tokio::test]
async fn test_only_one_channel_per_reconciler() {
    let mut h = harness();
    let (_tx, _closed) = h.connector.queue_channel();
    h.reconciler.connect(StreamFilter::new()).await.unwrap();
    assert_eq!(
        h.reconciler.connect(StreamFilter::new()).await,
        Err(ConnectionError::AlreadyConnected)
    );
    assert_eq!(h.connector.filters.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reconnect_replaces_channel() {
    let mut h = harness();
    let (_tx1, closed1) = h.connector.queue_channel();
    let (tx2, _closed2) = h.connector.queue_channel();

    h.reconciler.connect(StreamFilter::new()).await.unwrap();
    h.reconciler
        .reconnect(StreamFilter::new().with_plate("AB"))
        .await
        .unwrap();
    settle().await;

    assert!(closed1.load(Ordering::SeqCst));
    assert_eq!(h.reconciler.status(), ConnectionStatus::Open);
    assert_eq!(
        h.connector.filters.lock().unwrap()[1].plate.as_deref(),
        Some("AB")
    );

    tx2.send(Ok(r#"{"plate":"AB123"}"#.into())).unwrap();
    wait_revision(&h.reconciler, 1).await;
    assert_eq!(h.reconciler.len(), 1);
}

#[tokio::test]
async fn test_teardown_is_idempotent() {
    let mut h = harness();
    let (tx, closed) = h.connector.queue_channel();
    h.reconciler.connect(StreamFilter::new()).await.unwrap();

    h.reconciler.teardown();
    h.reconciler.teardown();
    settle().await;

    assert!(h.reconciler.is_torn_down());
    assert!(closed.load(Ordering::SeqCst));
    assert!(!h.reconciler.is_polling());
    assert_eq!(h.reconciler.status(), ConnectionStatus::Closed);

    // late messages are not applied
    let _ = tx.send(Ok(r#"{"plate":"LATE"}"#.into()));
    settle().await;
    assert!(h.reconciler.is_empty());

    assert_eq!(
        h.reconciler.connect(StreamFilter::new()).await,
        Err(ConnectionError::TornDown)
    );
}

#[tokio::test]
async fn test_refresh_replaces_in_server_order() {
    let h = harness();
    h.reconciler.merge(ev(1, "OLD"));
    *h.search.results.lock().unwrap() = (0..250).rev().map(|id| ev(id, "S")).collect();

    let installed = h.reconciler.refresh(&SearchQuery::default()).await.unwrap();
    assert_eq!(installed, 200);

    let events = h.reconciler.events();
    assert_eq!(events.first().unwrap().id, Some(249));
    assert_eq!(events.last().unwrap().id, Some(50));

    h.reconciler.clear();
    assert!(h.reconciler.is_empty());
}

#[tokio::test]
async fn test_merge_cap_keeps_most_recent_ids() {
    let h = harness();
    for id in 0..250 {
        h.reconciler.merge(ev(id, "CAP"));
    }
    let events = h.reconciler.events();
    assert_eq!(events.len(), 200);
    let ids: Vec<i64> = events.iter().filter_map(|e| e.id).collect();
    assert!(ids.iter().all(|id| *id >= 50));
    assert_eq!(ids[0], 249);
}
