//! # ANPR Console Designer
//!
//! Interactive zone/polygon designer for camera frames. Operators draw
//! Entry, Exit and Control polygons over a frame, pan and zoom the canvas,
//! validate the shape and hand it to the host for persistence.
//!
//! ## Layers
//!
//! ```text
//! DesignerSession (save / finish / close, notifications)
//!   ├── CanvasInput (pointer + wheel -> designer operations)
//!   ├── ZoneDesigner (draft points, hover, name, type)
//!   │     └── ViewportTransform (scale + translation)
//!   └── CanvasRenderer (tiny-skia frame)
//!
//! geometry (pure kernel: area, self-intersection, validation, text format)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use anpr_console_designer::{DesignerSession, MouseButton, Point, PointerEvent};
//!
//! let mut session = DesignerSession::open_new(|payload| println!("{:?}", payload));
//! for (x, y) in [(10.0, 10.0), (200.0, 10.0), (200.0, 120.0)] {
//!     session.handle(PointerEvent::Click {
//!         position: Point::new(x, y),
//!         button: MouseButton::Primary,
//!     });
//! }
//! session.save()?;
//! ```

pub mod designer_state;
pub mod geometry;
pub mod input;
pub mod model;
pub mod renderer;
pub mod session;
pub mod viewport;

pub use designer_state::{InitialGeometry, ZoneDesigner, ZoneSummary};
pub use geometry::{
    contains_point, deserialize, is_self_intersecting, point_count, polygon_area, serialize,
    validate_polygon,
};
pub use input::{CanvasInput, InputOutcome, MouseButton, PointerEvent};
pub use model::{
    Geometry, GeometryKind, ParseZoneTypeError, Point, SavePayload, Zone, ZoneType,
};
pub use renderer::{zone_hex, zone_rgb, Background, CanvasRenderer, RenderError};
pub use session::{DesignerSession, SaveCompletion, SaveError, SaveTicket};
pub use viewport::ViewportTransform;
