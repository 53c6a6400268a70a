//! Designer session: the host-facing wrapper around one open designer.
//!
//! The host drives the canvas through [`DesignerSession::handle`], triggers
//! `save()` from its own controls and performs the network call itself. Once
//! closed, the session ignores input and late save completions.

use std::sync::Arc;

use anpr_console_core::{
    event_bus, ApiError, AppEvent, DesignerEvent, EventBus, PolygonError, ZoneEvent,
};

use crate::designer_state::{InitialGeometry, ZoneDesigner};
use crate::input::{CanvasInput, InputOutcome, PointerEvent};
use crate::model::{SavePayload, Zone, ZoneType};

/// Why a save was not handed to the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    #[error("Polygon invalid: {0}")]
    Invalid(#[from] PolygonError),

    #[error("Designer session is closed")]
    Closed,
}

/// Identifies one save request so stale completions can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveTicket(u64);

/// Result of feeding a save response back into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveCompletion {
    /// The response belonged to the latest save and was recorded.
    Applied,
    /// The session was closed or a newer save superseded this one.
    Ignored,
}

type SaveCallback = Box<dyn FnMut(SavePayload) + Send>;

pub struct DesignerSession {
    designer: ZoneDesigner,
    input: CanvasInput,
    zone_id: Option<i64>,
    on_save: Option<SaveCallback>,
    bus: Arc<EventBus>,
    generation: u64,
    closed: bool,
}

impl DesignerSession {
    /// Opens a session for a new zone.
    pub fn open_new<F>(on_save: F) -> Self
    where
        F: FnMut(SavePayload) + Send + 'static,
    {
        Self::with_designer(ZoneDesigner::new(), None, on_save)
    }

    /// Opens a session editing a stored zone.
    pub fn open_for_edit<F>(zone: &Zone, on_save: F) -> Self
    where
        F: FnMut(SavePayload) + Send + 'static,
    {
        Self::with_designer(ZoneDesigner::from_zone(zone), zone.id, on_save)
    }

    /// Opens a session from metadata and a possibly corrupt stored geometry string.
    pub fn open_seeded<F>(
        name: impl Into<String>,
        zone_type: ZoneType,
        initial: InitialGeometry,
        on_save: F,
    ) -> Self
    where
        F: FnMut(SavePayload) + Send + 'static,
    {
        Self::with_designer(ZoneDesigner::seeded(name, zone_type, initial), None, on_save)
    }

    fn with_designer<F>(designer: ZoneDesigner, zone_id: Option<i64>, on_save: F) -> Self
    where
        F: FnMut(SavePayload) + Send + 'static,
    {
        Self {
            designer,
            input: CanvasInput::new(),
            zone_id,
            on_save: Some(Box::new(on_save)),
            bus: event_bus(),
            generation: 0,
            closed: false,
        }
    }

    /// Routes notifications to `bus` instead of the global bus.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = bus;
        self
    }

    pub fn designer(&self) -> &ZoneDesigner {
        &self.designer
    }

    /// Mutable access for toolbar actions (name, type, undo, clear).
    ///
    /// Returns `None` once the session is closed.
    pub fn designer_mut(&mut self) -> Option<&mut ZoneDesigner> {
        if self.closed {
            None
        } else {
            Some(&mut self.designer)
        }
    }

    /// Backend id of the zone being edited, once known.
    pub fn zone_id(&self) -> Option<i64> {
        self.zone_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn notify(&self, event: AppEvent) {
        // nobody listening is fine
        self.bus.publish(event);
    }

    /// Applies a canvas event. A double-click also runs [`finish`](Self::finish).
    pub fn handle(&mut self, event: PointerEvent) -> InputOutcome {
        if self.closed {
            return InputOutcome::default();
        }
        let outcome = self.input.handle(&mut self.designer, event);
        if outcome.finish_requested {
            let _ = self.finish();
        }
        outcome
    }

    /// Validates the draft and reports the result. Never mutates points.
    ///
    /// After [`close`](Self::close) the result is returned without a notification.
    pub fn finish(&mut self) -> Result<(), PolygonError> {
        if self.closed {
            return self.designer.validation();
        }
        match self.designer.validation() {
            Ok(()) => {
                tracing::debug!("Polygon closed with {} points", self.designer.points().len());
                self.notify(AppEvent::Designer(DesignerEvent::PolygonClosed {
                    points: self.designer.points().len(),
                }));
                Ok(())
            }
            Err(reason) => {
                tracing::info!("Finish rejected: {}", reason);
                self.notify(AppEvent::Designer(DesignerEvent::ValidationFailed {
                    reason: reason.to_string(),
                }));
                Err(reason)
            }
        }
    }

    /// Validates and hands `{name, type, geometry}` to the host's save callback.
    pub fn save(&mut self) -> Result<SaveTicket, SaveError> {
        if self.closed {
            return Err(SaveError::Closed);
        }
        let payload = match self.designer.save_payload() {
            Ok(payload) => payload,
            Err(reason) => {
                tracing::info!("Save blocked: {}", reason);
                self.notify(AppEvent::Designer(DesignerEvent::ValidationFailed {
                    reason: reason.to_string(),
                }));
                return Err(reason.into());
            }
        };

        let Some(on_save) = self.on_save.as_mut() else {
            return Err(SaveError::Closed);
        };
        self.generation += 1;
        let name = payload.name.clone();
        on_save(payload);
        self.notify(AppEvent::Designer(DesignerEvent::SaveRequested { name }));
        Ok(SaveTicket(self.generation))
    }

    /// Records the host's save response. The draft is never touched, so a
    /// failed save leaves it intact for another attempt.
    pub fn complete_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<i64, ApiError>,
    ) -> SaveCompletion {
        if self.closed || ticket.0 != self.generation {
            tracing::debug!("Dropping stale save completion");
            return SaveCompletion::Ignored;
        }
        match result {
            Ok(id) => {
                self.zone_id = Some(id);
                self.notify(AppEvent::Zone(ZoneEvent::Saved {
                    id,
                    name: self.designer.name().to_string(),
                }));
            }
            Err(e) => {
                tracing::warn!("Zone save failed: {}", e);
                self.notify(AppEvent::Zone(ZoneEvent::RequestFailed {
                    error: e.to_string(),
                }));
            }
        }
        SaveCompletion::Applied
    }

    /// Releases the save callback and stops accepting input. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.on_save = None;
        self.notify(AppEvent::Designer(DesignerEvent::Closed));
        tracing::debug!("Designer session closed");
    }
}

impl Drop for DesignerSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for DesignerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignerSession")
            .field("designer", &self.designer)
            .field("zone_id", &self.zone_id)
            .field("closed", &self.closed)
            .finish()
    }
}
