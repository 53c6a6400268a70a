//! Pointer and wheel input mapping for the designer canvas.
//!
//! Positions are canvas-relative screen pixels. Point placement goes through
//! the designer's inverse transform, panning stays in screen space.

use crate::designer_state::ZoneDesigner;
use crate::model::Point;

/// Mouse button that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
}

/// Raw canvas input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button press and release without a drag.
    Click { position: Point, button: MouseButton },
    /// Button pressed.
    Press { position: Point, button: MouseButton },
    /// Any button released.
    Release,
    /// Pointer moved.
    Move { position: Point },
    /// Pointer left the canvas.
    Leave,
    /// Wheel scrolled; positive `delta_y` scrolls down.
    Wheel { position: Point, delta_y: f64 },
    DoubleClick,
    ContextMenu,
}

/// What the host should do after an event was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputOutcome {
    /// Designer state changed and the canvas needs a new frame.
    pub redraw: bool,
    /// The platform's default handling (scroll, context menu) must be suppressed.
    pub suppress_default: bool,
    /// The user asked to close the polygon.
    pub finish_requested: bool,
}

impl InputOutcome {
    fn redraw() -> Self {
        Self {
            redraw: true,
            ..Default::default()
        }
    }

    fn suppressed(redraw: bool) -> Self {
        Self {
            redraw,
            suppress_default: true,
            ..Default::default()
        }
    }
}

/// Transient pan-gesture bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct CanvasInput {
    is_panning: bool,
    last_position: Option<Point>,
}

impl CanvasInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_panning(&self) -> bool {
        self.is_panning
    }

    /// Applies one input event to the designer.
    pub fn handle(&mut self, designer: &mut ZoneDesigner, event: PointerEvent) -> InputOutcome {
        match event {
            PointerEvent::Click {
                position,
                button: MouseButton::Primary,
            } => {
                designer.add_point(designer.screen_to_world(position));
                InputOutcome::redraw()
            }
            PointerEvent::Click { .. } => InputOutcome::default(),
            PointerEvent::Press {
                position,
                button: MouseButton::Secondary,
            } => {
                self.is_panning = true;
                self.last_position = Some(position);
                InputOutcome::suppressed(false)
            }
            PointerEvent::Press { .. } => InputOutcome::default(),
            PointerEvent::Release | PointerEvent::Leave => {
                self.is_panning = false;
                self.last_position = None;
                InputOutcome::default()
            }
            PointerEvent::Move { position } => {
                if let (true, Some(last)) = (self.is_panning, self.last_position) {
                    designer.pan_by(position - last);
                    self.last_position = Some(position);
                } else {
                    designer.set_hover_point(Some(designer.screen_to_world(position)));
                }
                InputOutcome::redraw()
            }
            PointerEvent::Wheel { position, delta_y } => {
                designer.zoom_at_point(delta_y, position);
                InputOutcome::suppressed(true)
            }
            PointerEvent::DoubleClick => InputOutcome {
                finish_requested: true,
                ..Default::default()
            },
            PointerEvent::ContextMenu => InputOutcome::suppressed(false),
        }
    }
}
