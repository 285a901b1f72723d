//! Turtle graphics engine, headless first
//!
//! A turtle is a cursor with a pose and a pen. It walks around a shared
//! screen, leaving polylines, fills, dots and stamps behind, and every step
//! can be undone. The screen is whatever implements [`screen::Renderer`] and
//! [`screen::Clock`]; a recording backend that draws into a journal ships
//! with the crate, for tests and for exporting drawings.
//!
//! Geometry interops with [`geo_types`], colors are [`csscolorparser`] colors,
//! and shape transforms are [`nalgebra`] matrices.
//!
//! ```rust
//! use aoer_turtle_rs::prelude::*;
//!
//! let (screen, journal) = TurtleScreen::headless();
//! screen.borrow_mut().tracer(false);
//! let mut t = Turtle::new(&screen);
//! t.begin_fill();
//! for _ in 0..4 {
//!     t.forward(50.0);
//!     t.left(90.0);
//! }
//! t.end_fill();
//! assert_eq!(journal.borrow().fill_calls().len(), 1);
//! ```

/// Error type shared by the whole crate.
pub mod errors;

/// Plain 2D vectors, with geo_types conversions.
pub mod vec2d;

/// Pose, heading and angle units, plus arc planning.
pub mod navigator;

/// Pen attributes and transactional pen updates.
pub mod pen;

/// Cursor shapes, the shape registry and shape transforms.
pub mod shapes;

/// Fixed-size undo log.
pub mod undo;

/// Renderer and clock traits, and the shared screen.
pub mod screen;

/// RON startup configuration.
pub mod config;

/// The turtle itself.
pub mod turtle;

/// Make your life easy! Just import prelude::* for the usual suspects.
pub mod prelude {
    pub use crate::config::TurtleConfig;
    pub use crate::errors::TurtleError;
    pub use crate::navigator::Mode;
    pub use crate::pen::{CssColor, PenUpdate, ResizeMode};
    pub use crate::screen::recording::{Journal, RecordingClock, RecordingRenderer};
    pub use crate::screen::{Clock, Renderer, SharedScreen, TurtleScreen};
    pub use crate::shapes::Shape;
    pub use crate::turtle::{StampId, Turtle};
    pub use crate::vec2d::Vec2D;
}
