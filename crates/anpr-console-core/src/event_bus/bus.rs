//! Notification bus shared by the designer, the live feed and their host.

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};

use super::events::{AppEvent, EventCategory};

/// Which notifications a handler wants
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    #[default]
    All,
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

type EventHandler = Box<dyn Fn(&AppEvent) + Send + Sync>;

/// Configuration for the event bus
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Whether to keep recent notifications.
    pub enable_history: bool,
    /// Maximum number of notifications to retain.
    pub max_history_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            enable_history: false,
            max_history_size: 100,
        }
    }
}

/// Fans notifications out to synchronous handlers and an optional history.
pub struct EventBus {
    handlers: RwLock<Vec<(EventFilter, EventHandler)>>,
    history: RwLock<VecDeque<AppEvent>>,
    config: EventBusConfig,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            history: RwLock::new(VecDeque::new()),
            config,
        }
    }

    /// Delivers `event` to every matching handler and returns how many ran.
    ///
    /// Handlers run on the publishing thread while the handler list is
    /// read-locked, so they must not subscribe.
    pub fn publish(&self, event: AppEvent) -> usize {
        tracing::trace!("publish: {}", event.description());

        if self.config.enable_history {
            let mut history = self.history.write();
            history.push_back(event.clone());
            while history.len() > self.config.max_history_size {
                history.pop_front();
            }
        }

        let handlers = self.handlers.read();
        handlers
            .iter()
            .filter(|(filter, _)| filter.matches(&event))
            .map(|(_, handler)| handler(&event))
            .count()
    }

    /// Registers a handler for the lifetime of the bus.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F)
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        self.handlers.write().push((filter, Box::new(handler)));
    }

    /// Recent notifications, oldest first (empty unless history is enabled)
    pub fn history(&self) -> Vec<AppEvent> {
        self.history.read().iter().cloned().collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.read().len())
            .field("config", &self.config)
            .finish()
    }
}

static EVENT_BUS: OnceLock<Arc<EventBus>> = OnceLock::new();

/// The process-wide bus used when a component is not handed its own.
pub fn event_bus() -> Arc<EventBus> {
    EVENT_BUS.get_or_init(|| Arc::new(EventBus::new())).clone()
}

/// Publish to the global event bus
#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::event_bus::event_bus().publish($event)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::events::{ConnectionStatus, DesignerEvent, StreamEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn status_event(status: ConnectionStatus) -> AppEvent {
        AppEvent::Stream(StreamEvent::StatusChanged { status })
    }

    #[test]
    fn test_publish_without_handlers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(status_event(ConnectionStatus::Open)), 0);
        assert!(bus.history().is_empty());
    }

    #[test]
    fn test_event_filtering() {
        let bus = EventBus::new();
        let stream_count = Arc::new(AtomicUsize::new(0));
        let designer_count = Arc::new(AtomicUsize::new(0));

        let sc = stream_count.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Stream]),
            move |_| {
                sc.fetch_add(1, Ordering::SeqCst);
            },
        );
        let dc = designer_count.clone();
        bus.subscribe(
            EventFilter::Categories(vec![EventCategory::Designer]),
            move |_| {
                dc.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert_eq!(bus.publish(status_event(ConnectionStatus::Connecting)), 1);
        bus.publish(status_event(ConnectionStatus::Open));
        bus.publish(AppEvent::Designer(DesignerEvent::Closed));

        assert_eq!(stream_count.load(Ordering::SeqCst), 2);
        assert_eq!(designer_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let bus = EventBus::with_config(EventBusConfig {
            enable_history: true,
            max_history_size: 3,
        });

        for count in 0..5 {
            bus.publish(AppEvent::Stream(StreamEvent::EventsReplaced { count }));
        }

        let history = bus.history();
        assert_eq!(history.len(), 3);
        assert_eq!(
            history[0],
            AppEvent::Stream(StreamEvent::EventsReplaced { count: 2 })
        );
    }
}
