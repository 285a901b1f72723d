//! The engine's view of the outside world: something that draws items and
//! something that paces frames. Turtles share one [`TurtleScreen`].
use std::cell::RefCell;
use std::rc::Rc;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::config::TurtleConfig;
use crate::errors::TurtleError;
use crate::pen::CssColor;
use crate::shapes::{ImageHandle, Shape, ShapeRegistry};
use crate::vec2d::Vec2D;

/// Headless renderer and clock that write into a shared [`recording::Journal`].
pub mod recording;

/// Handle to something the renderer drew.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Line,
    Polygon,
    Image,
}

/// Drawing surface. Items are created empty and redrawn in place; an empty
/// point list means "show nothing" for that item.
pub trait Renderer {
    fn create_line_item(&mut self) -> ItemId;
    fn create_polygon_item(&mut self) -> ItemId;
    fn create_image_item(&mut self) -> ItemId;
    fn draw_line(&mut self, item: ItemId, points: &[Vec2D], color: &CssColor, width: f64);
    fn draw_polygon(
        &mut self,
        item: ItemId,
        points: &[Vec2D],
        fill: Option<&CssColor>,
        outline: Option<&CssColor>,
        width: f64,
    );
    fn draw_image(&mut self, item: ItemId, position: Vec2D, image: &ImageHandle);
    fn delete_item(&mut self, item: ItemId);
    fn read_item_geometry(&self, item: ItemId) -> Vec<Vec2D>;

    fn create_item(&mut self, kind: ItemKind) -> ItemId {
        match kind {
            ItemKind::Line => self.create_line_item(),
            ItemKind::Polygon => self.create_polygon_item(),
            ItemKind::Image => self.create_image_item(),
        }
    }
}

/// Frame pacing. `request_frame` is where a host lets its event loop run
/// between animation frames.
pub trait Clock {
    fn delay(&mut self, milliseconds: u64);
    fn request_frame(&mut self);
    fn is_animation_enabled(&self) -> bool;
    fn set_animation_enabled(&mut self, enabled: bool);
}

pub type SharedScreen = Rc<RefCell<TurtleScreen>>;

pub const DEFAULT_DELAY_MS: u64 = 10;

/// # TurtleScreen
///
/// Owns the renderer, the clock, the shape registry and the screen-wide
/// settings (color mode, frame delay).
///
/// ```rust
/// use aoer_turtle_rs::screen::TurtleScreen;
/// use aoer_turtle_rs::turtle::Turtle;
///
/// let (screen, journal) = TurtleScreen::headless();
/// screen.borrow_mut().tracer(false);
/// let mut t = Turtle::new(&screen);
/// t.forward(10.0);
/// assert_eq!(journal.borrow().frames(), 0);
/// ```
pub struct TurtleScreen {
    renderer: Box<dyn Renderer>,
    clock: Box<dyn Clock>,
    shapes: ShapeRegistry,
    colormode: f64,
    delay: u64,
}

impl TurtleScreen {
    pub fn new<R, C>(renderer: R, clock: C) -> TurtleScreen
    where
        R: Renderer + 'static,
        C: Clock + 'static,
    {
        TurtleScreen {
            renderer: Box::new(renderer),
            clock: Box::new(clock),
            shapes: ShapeRegistry::with_defaults(),
            colormode: 1.0,
            delay: DEFAULT_DELAY_MS,
        }
    }

    /// A screen that draws into a journal instead of a window.
    pub fn headless() -> (SharedScreen, recording::SharedJournal) {
        let journal = recording::Journal::shared();
        let screen = TurtleScreen::new(
            recording::RecordingRenderer::new(&journal),
            recording::RecordingClock::new(&journal),
        );
        (screen.shared(), journal)
    }

    pub fn shared(self) -> SharedScreen {
        Rc::new(RefCell::new(self))
    }

    /// Screen-wide parts of a config: color mode and delay.
    pub fn configure(&mut self, config: &TurtleConfig) -> Result<(), TurtleError> {
        self.set_colormode(config.colormode)?;
        self.set_delay(config.delay);
        Ok(())
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> &mut dyn Renderer {
        self.renderer.as_mut()
    }

    pub fn clock_mut(&mut self) -> &mut dyn Clock {
        self.clock.as_mut()
    }

    pub fn shapes(&self) -> &ShapeRegistry {
        &self.shapes
    }

    pub fn register_shape(&mut self, name: &str, shape: Shape) {
        self.shapes.register(name, shape);
    }

    pub fn shape_names(&self) -> Vec<String> {
        self.shapes.names()
    }

    pub fn colormode(&self) -> f64 {
        self.colormode
    }

    /// Only 1.0 and 255.0 make sense.
    pub fn set_colormode(&mut self, colormode: f64) -> Result<(), TurtleError> {
        if colormode == 1.0 || colormode == 255.0 {
            self.colormode = colormode;
            Ok(())
        } else {
            Err(TurtleError::InvalidArgument(format!(
                "colormode must be 1.0 or 255, got {}",
                colormode
            )))
        }
    }

    pub fn delay(&self) -> u64 {
        self.delay
    }

    pub fn set_delay(&mut self, milliseconds: u64) {
        self.delay = milliseconds;
    }

    /// Turn animation on or off. Off makes every move atomic.
    pub fn tracer(&mut self, on: bool) {
        self.clock.set_animation_enabled(on);
    }

    pub fn is_tracing(&self) -> bool {
        self.clock.is_animation_enabled()
    }

    /// Force a frame, animated or not.
    pub fn update(&mut self) {
        self.clock.request_frame();
    }

    /// One animation tick: hand control to the host, then wait out the delay.
    pub fn frame(&mut self) {
        if self.clock.is_animation_enabled() {
            trace!("frame, delay {}ms", self.delay);
            self.clock.request_frame();
            self.clock.delay(self.delay);
        }
    }
}
