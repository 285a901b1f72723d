use std::sync::Arc;

use geo_types::{LineString, Polygon};
use log::{debug, trace, warn};
use nalgebra::Matrix2;
use num_traits::FromPrimitive;

use crate::config::TurtleConfig;
use crate::errors::TurtleError;
use crate::navigator::{ArcStep, Mode, Navigator};
use crate::pen::{
    color_from_rgb, color_to_rgb, normalize_speed, parse_css_color, speed_from_name, CssColor,
    PenAttributes, PenState, PenUpdate, ResizeMode,
};
use crate::screen::{ItemId, ItemKind, Renderer, SharedScreen};
use crate::shapes::transform::{place_polygon, transform_polygon, ShapeTransform};
use crate::shapes::{ImageHandle, Shape};
use crate::undo::{GoModes, LineSnapshot, UndoRecord, UndoRingBuffer};
use crate::vec2d::Vec2D;

/// A polyline is split into a fresh line item once it has this many points.
const MAX_LINE_POINTS: usize = 42;

/// Identifies one stamp left by one turtle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StampId(pub(crate) u64);

#[derive(Debug, Clone)]
struct StampEntry {
    id: StampId,
    items: Vec<ItemId>,
}

/// The active shape, bent and placed at the current pose, ready to draw.
#[derive(Debug, Clone, PartialEq)]
enum PlacedShape {
    Polygon {
        points: Vec<Vec2D>,
        fill: CssColor,
        outline: CssColor,
        width: f64,
    },
    Image {
        position: Vec2D,
        image: ImageHandle,
    },
}

impl PlacedShape {
    fn kind(&self) -> ItemKind {
        match self {
            PlacedShape::Polygon { .. } => ItemKind::Polygon,
            PlacedShape::Image { .. } => ItemKind::Image,
        }
    }

    fn draw(&self, renderer: &mut dyn Renderer, item: ItemId) {
        match self {
            PlacedShape::Polygon {
                points,
                fill,
                outline,
                width,
            } => renderer.draw_polygon(item, points, Some(fill), Some(outline), *width),
            PlacedShape::Image { position, image } => renderer.draw_image(item, *position, image),
        }
    }
}

/// # Turtle
///
/// The drawing cursor. Each public motion pushes its inverse onto the undo
/// log before touching any state, animates against the screen's clock when
/// the pen has a speed and the tracer is on, and leaves a polyline behind
/// while the pen is down.
///
/// # Example
///
/// ```rust
/// use aoer_turtle_rs::screen::TurtleScreen;
/// use aoer_turtle_rs::turtle::Turtle;
/// use aoer_turtle_rs::vec2d::Vec2D;
///
/// let (screen, _journal) = TurtleScreen::headless();
/// let mut t = Turtle::new(&screen);
/// t.forward(100.0);
/// t.left(90.0);
/// t.forward(100.0);
/// assert!((t.position() - Vec2D::new(100.0, 100.0)).magnitude() < 1e-9);
/// t.undo();
/// t.undo();
/// t.undo();
/// assert!(t.position().magnitude() < 1e-9);
/// ```
pub struct Turtle {
    screen: SharedScreen,
    nav: Navigator,
    pen: PenState,
    defaults: PenAttributes,
    shape_name: String,
    shape: Arc<Shape>,
    undo: UndoRingBuffer,
    line_item: ItemId,
    current_line: Vec<Vec2D>,
    drawing_item: ItemId,
    items: Vec<ItemId>,
    other_items: Vec<ItemId>,
    fill_item: Option<ItemId>,
    fill_path: Option<Vec<Vec2D>>,
    poly: Option<Vec<Vec2D>>,
    last_poly: Option<Vec<Vec2D>>,
    stamps: Vec<StampEntry>,
    next_stamp: u64,
    cursor_items: Vec<(ItemKind, ItemId)>,
}

impl Turtle {
    pub fn new(screen: &SharedScreen) -> Turtle {
        let shape = screen
            .borrow()
            .shapes()
            .lookup("classic")
            .unwrap_or_else(|_| Arc::new(Shape::Polygon(vec![])));
        Turtle::build(
            screen,
            Navigator::new(),
            PenAttributes::default(),
            "classic".to_string(),
            shape,
            UndoRingBuffer::default(),
        )
    }

    /// A turtle set up from `config`. Screen-wide settings are left alone;
    /// see [`crate::screen::TurtleScreen::configure`].
    pub fn with_config(screen: &SharedScreen, config: &TurtleConfig) -> Result<Turtle, TurtleError> {
        let shape = screen.borrow().shapes().lookup(&config.shape)?;
        Ok(Turtle::build(
            screen,
            Navigator::with_mode(config.mode),
            config.pen_attributes()?,
            config.shape.clone(),
            shape,
            UndoRingBuffer::new(config.undo_buffer_size),
        ))
    }

    fn build(
        screen: &SharedScreen,
        nav: Navigator,
        pen: PenAttributes,
        shape_name: String,
        shape: Arc<Shape>,
        undo: UndoRingBuffer,
    ) -> Turtle {
        let (line_item, drawing_item) = {
            let mut screen = screen.borrow_mut();
            let renderer = screen.renderer_mut();
            (renderer.create_line_item(), renderer.create_line_item())
        };
        let mut turtle = Turtle {
            screen: screen.clone(),
            current_line: vec![nav.position()],
            nav,
            pen: PenState::from_attributes(pen.clone()),
            defaults: pen,
            shape_name,
            shape,
            undo,
            line_item,
            drawing_item,
            items: vec![line_item],
            other_items: vec![],
            fill_item: None,
            fill_path: None,
            poly: None,
            last_poly: None,
            stamps: vec![],
            next_stamp: 0,
            cursor_items: vec![],
        };
        turtle.update();
        turtle
    }

    pub fn screen(&self) -> &SharedScreen {
        &self.screen
    }

    fn with_renderer<R>(&self, f: impl FnOnce(&mut dyn Renderer) -> R) -> R {
        let mut screen = self.screen.borrow_mut();
        f(screen.renderer_mut())
    }

    fn animating(&self) -> bool {
        self.pen.attributes().speed > 0 && self.screen.borrow().is_tracing()
    }

    // ------------------------------------------------------------------
    // Pose queries

    pub fn position(&self) -> Vec2D {
        self.nav.position()
    }

    pub fn xcor(&self) -> f64 {
        self.nav.xcor()
    }

    pub fn ycor(&self) -> f64 {
        self.nav.ycor()
    }

    pub fn heading(&self) -> f64 {
        self.nav.heading()
    }

    pub fn towards<P: Into<Vec2D>>(&self, point: P) -> f64 {
        self.nav.angle_to(point.into())
    }

    pub fn distance<P: Into<Vec2D>>(&self, point: P) -> f64 {
        self.nav.distance_to(point.into())
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    // ------------------------------------------------------------------
    // Units

    pub fn degrees(&mut self, full_circle: f64) -> Result<(), TurtleError> {
        self.nav.degrees(full_circle)
    }

    pub fn radians(&mut self) {
        self.nav.radians();
    }

    /// Switch heading conventions. Like a mode change on a real screen, this
    /// resets the turtle.
    pub fn mode(&mut self, mode: Mode) {
        self.nav.set_mode(mode);
        self.reset();
    }

    // ------------------------------------------------------------------
    // Motion

    pub fn forward(&mut self, distance: f64) {
        let end = self.nav.destination(distance);
        self.move_to(end);
    }

    pub fn back(&mut self, distance: f64) {
        self.forward(-distance);
    }

    pub fn left(&mut self, angle: f64) {
        self.turn_by(angle);
    }

    pub fn right(&mut self, angle: f64) {
        self.turn_by(-angle);
    }

    pub fn goto<P: Into<Vec2D>>(&mut self, point: P) {
        self.move_to(point.into());
    }

    pub fn setx(&mut self, x: f64) {
        self.move_to(Vec2D::new(x, self.nav.ycor()));
    }

    pub fn sety(&mut self, y: f64) {
        self.move_to(Vec2D::new(self.nav.xcor(), y));
    }

    /// Turn the short way round to an absolute heading.
    pub fn set_heading(&mut self, to_angle: f64) {
        let delta = self.nav.heading_delta(to_angle);
        self.turn_by(delta);
    }

    pub fn home(&mut self) {
        self.move_to(Vec2D::ZERO);
        self.set_heading(0.0);
    }

    /// Move to `target`, animated when the pen has a speed and the tracer
    /// is on. The move lands in the line, fill and polygon buffers that are
    /// active.
    pub fn move_to(&mut self, target: Vec2D) {
        let start = self.nav.position();
        let attrs = self.pen.attributes().clone();
        let record = UndoRecord::Go {
            from: start,
            to: target,
            modes: GoModes {
                drawing: attrs.down,
                color: attrs.color.clone(),
                width: attrs.width,
                filling: self.fill_path.is_some(),
            },
            line: self.line_snapshot(),
        };
        self.undo.push(record);

        if self.animating() {
            let speed = attrs.speed as f64;
            let diff = target - start;
            let hops = 1 + usize::from_f64(
                diff.magnitude() / (3.0 * 1.1f64.powf(speed) * speed),
            )
            .unwrap_or(0);
            let delta = diff * (1.0 / hops as f64);
            for n in 1..hops {
                let here = start + delta * n as f64;
                self.nav.goto(here);
                if attrs.down {
                    let drawing_item = self.drawing_item;
                    self.with_renderer(|r| {
                        r.draw_line(drawing_item, &[start, here], &attrs.color, attrs.width)
                    });
                }
                trace!("hop {}/{} at {}", n, hops, here);
                self.update();
            }
            if attrs.down {
                let drawing_item = self.drawing_item;
                self.with_renderer(|r| r.draw_line(drawing_item, &[], &attrs.color, attrs.width));
            }
        }

        if attrs.down {
            self.current_line.push(target);
        }
        if let Some(path) = self.fill_path.as_mut() {
            path.push(target);
        }
        self.nav.goto(target);
        if let Some(poly) = self.poly.as_mut() {
            poly.push(target);
        }
        if self.current_line.len() > MAX_LINE_POINTS {
            self.new_line(true);
        }
        self.update();
    }

    /// Rotate left by `angle` user units, animated like [`Turtle::move_to`].
    pub fn turn_by(&mut self, angle: f64) {
        self.rotate(angle, true);
    }

    fn rotate(&mut self, angle: f64, animate: bool) {
        let units = self.nav.units();
        self.undo.push(UndoRecord::Rotate {
            angle,
            degrees_per_unit: units.degrees_per_unit,
        });
        let degrees = angle * units.degrees_per_unit;
        let target = self.nav.orientation().rotate(degrees);
        if animate && self.animating() {
            let per_frame = 3.0 * self.pen.attributes().speed as f64;
            let steps = 1 + usize::from_f64(degrees.abs() / per_frame).unwrap_or(0);
            let delta = degrees / steps as f64;
            for _ in 0..steps {
                let next = self.nav.orientation().rotate(delta);
                self.nav.set_orientation(next);
                self.update();
            }
        }
        self.nav.set_orientation(target);
        self.update();
    }

    /// Draw an arc as an inscribed polygon. The whole arc undoes in one go.
    pub fn circle(
        &mut self,
        radius: f64,
        extent: Option<f64>,
        steps: Option<u32>,
    ) -> Result<(), TurtleError> {
        let plan = self.nav.circle_plan(radius, extent, steps)?;
        self.undo.begin_cumulate();
        for step in plan {
            match step {
                ArcStep::Turn(angle) => self.rotate(angle, false),
                ArcStep::Move(distance) => {
                    let end = self.nav.destination(distance);
                    self.move_to(end);
                }
            }
        }
        self.undo.end_cumulate();
        Ok(())
    }

    /// Jump without drawing. The current line ends here. An open fill is
    /// closed and restarted unless `fill_gap` is set, in which case it
    /// simply carries on from the new spot.
    pub fn teleport<P: Into<Vec2D>>(&mut self, point: P, fill_gap: bool) {
        let target = point.into();
        let refill = self.filling() && !fill_gap;
        self.undo.begin_cumulate();
        if refill {
            self.end_fill();
        }
        self.undo.push(UndoRecord::Teleport {
            from: self.nav.position(),
            line: self.line_snapshot(),
        });
        self.new_line(false);
        self.nav.goto(target);
        if self.pen.attributes().down {
            self.current_line = vec![target];
        }
        if refill {
            self.begin_fill();
        }
        self.undo.end_cumulate();
        self.update();
    }

    // ------------------------------------------------------------------
    // Lines and frames

    fn line_snapshot(&self) -> LineSnapshot {
        LineSnapshot {
            item: self.line_item,
            points: self.current_line.clone(),
            geometry: self.with_renderer(|r| r.read_item_geometry(self.line_item)),
            items: self.items.clone(),
        }
    }

    /// Finish the current polyline and start a fresh one.
    fn new_line(&mut self, use_pos: bool) {
        let attrs = self.pen.attributes().clone();
        if self.current_line.len() > 1 {
            let (line_item, line) = (self.line_item, &self.current_line);
            let item = self.with_renderer(|r| {
                r.draw_line(line_item, line, &attrs.color, attrs.width);
                r.create_line_item()
            });
            self.line_item = item;
            self.items.push(item);
        } else {
            let line_item = self.line_item;
            self.with_renderer(|r| r.draw_line(line_item, &[], &attrs.color, attrs.width));
        }
        self.current_line = if use_pos {
            vec![self.nav.position()]
        } else {
            vec![]
        };
    }

    /// Redraw the live line and the cursor, then give the host a frame.
    fn update(&mut self) {
        if self.current_line.len() > 1 {
            let attrs = self.pen.attributes();
            self.with_renderer(|r| {
                r.draw_line(self.line_item, &self.current_line, &attrs.color, attrs.width)
            });
        }
        self.draw_cursor();
        self.screen.borrow_mut().frame();
    }

    fn draw_cursor(&mut self) {
        let placed = if self.pen.attributes().visible {
            self.placed_shape()
        } else {
            vec![]
        };
        let kinds: Vec<ItemKind> = placed.iter().map(PlacedShape::kind).collect();
        let current: Vec<ItemKind> = self.cursor_items.iter().map(|(kind, _)| *kind).collect();
        let mut screen = self.screen.borrow_mut();
        let renderer = screen.renderer_mut();
        if kinds != current {
            for (_, item) in self.cursor_items.drain(..) {
                renderer.delete_item(item);
            }
            for kind in kinds {
                self.cursor_items.push((kind, renderer.create_item(kind)));
            }
        }
        for ((_, item), shape) in self.cursor_items.iter().zip(placed.iter()) {
            shape.draw(renderer, *item);
        }
    }

    fn placed_shape(&self) -> Vec<PlacedShape> {
        let attrs = self.pen.attributes();
        let position = self.nav.position();
        let heading = self.nav.orientation();
        match self.shape.as_ref() {
            Shape::Polygon(_) => {
                let width = match attrs.resize_mode {
                    ResizeMode::NoResize => 1.0,
                    ResizeMode::Auto => attrs.width,
                    ResizeMode::User => attrs.outline_width,
                };
                let points = self.get_shapepoly().unwrap_or_default();
                vec![PlacedShape::Polygon {
                    points: place_polygon(&points, position, heading),
                    fill: attrs.fill_color.clone(),
                    outline: attrs.color.clone(),
                    width,
                }]
            }
            Shape::Compound(parts) => {
                let m = self.pen.shape_transform();
                parts
                    .iter()
                    .map(|part| PlacedShape::Polygon {
                        points: place_polygon(&transform_polygon(&part.points, &m), position, heading),
                        fill: part.fill.clone(),
                        outline: part.outline.clone(),
                        width: attrs.outline_width,
                    })
                    .collect()
            }
            Shape::Image(image) => vec![PlacedShape::Image {
                position,
                image: image.clone(),
            }],
        }
    }

    // ------------------------------------------------------------------
    // Pen

    /// Apply a sparse pen update as one undoable step. A change to pen-down,
    /// color or width closes the current polyline first, drawn with the old
    /// attributes.
    pub fn apply_pen(&mut self, update: &PenUpdate) -> Result<(), TurtleError> {
        update.validate()?;
        self.undo.push(UndoRecord::Pen(self.pen.snapshot()));
        self.set_pen(update)
    }

    fn set_pen(&mut self, update: &PenUpdate) -> Result<(), TurtleError> {
        if self.pen.breaks_line(update) {
            self.new_line(true);
        }
        self.pen.apply(update)?;
        self.update();
        Ok(())
    }

    /// Snapshot of every pen attribute.
    pub fn pen(&self) -> PenAttributes {
        self.pen.snapshot()
    }

    pub fn pen_up(&mut self) {
        let _ = self.apply_pen(&PenUpdate::new().down(false));
    }

    pub fn pen_down(&mut self) {
        let _ = self.apply_pen(&PenUpdate::new().down(true));
    }

    pub fn is_down(&self) -> bool {
        self.pen.attributes().down
    }

    pub fn pensize(&self) -> f64 {
        self.pen.attributes().width
    }

    pub fn set_pensize(&mut self, width: f64) -> Result<(), TurtleError> {
        self.apply_pen(&PenUpdate::new().width(width))
    }

    pub fn pencolor(&self) -> CssColor {
        self.pen.attributes().color.clone()
    }

    /// Pen color as an RGB triple in the screen's color mode.
    pub fn pencolor_rgb(&self) -> (f64, f64, f64) {
        color_to_rgb(&self.pen.attributes().color, self.screen.borrow().colormode())
    }

    pub fn set_pencolor(&mut self, color: CssColor) {
        let _ = self.apply_pen(&PenUpdate::new().color(color));
    }

    pub fn set_pencolor_str(&mut self, color: &str) -> Result<(), TurtleError> {
        let color = parse_css_color(color)?;
        self.apply_pen(&PenUpdate::new().color(color))
    }

    pub fn set_pencolor_rgb(&mut self, r: f64, g: f64, b: f64) -> Result<(), TurtleError> {
        let color = color_from_rgb(r, g, b, self.screen.borrow().colormode())?;
        self.apply_pen(&PenUpdate::new().color(color))
    }

    pub fn fillcolor(&self) -> CssColor {
        self.pen.attributes().fill_color.clone()
    }

    pub fn fillcolor_rgb(&self) -> (f64, f64, f64) {
        color_to_rgb(
            &self.pen.attributes().fill_color,
            self.screen.borrow().colormode(),
        )
    }

    pub fn set_fillcolor(&mut self, color: CssColor) {
        let _ = self.apply_pen(&PenUpdate::new().fill_color(color));
    }

    pub fn set_fillcolor_str(&mut self, color: &str) -> Result<(), TurtleError> {
        let color = parse_css_color(color)?;
        self.apply_pen(&PenUpdate::new().fill_color(color))
    }

    pub fn set_fillcolor_rgb(&mut self, r: f64, g: f64, b: f64) -> Result<(), TurtleError> {
        let color = color_from_rgb(r, g, b, self.screen.borrow().colormode())?;
        self.apply_pen(&PenUpdate::new().fill_color(color))
    }

    /// Pen and fill color in one step.
    pub fn set_color(&mut self, pen: &str, fill: &str) -> Result<(), TurtleError> {
        let update = PenUpdate::new()
            .color(parse_css_color(pen)?)
            .fill_color(parse_css_color(fill)?);
        self.apply_pen(&update)
    }

    pub fn speed(&self) -> u8 {
        self.pen.attributes().speed
    }

    /// 1 is slowest, 10 fast, 0 means no animation at all. Anything outside
    /// `(0.5, 10.5)` is treated as 0.
    pub fn set_speed(&mut self, speed: f64) {
        let _ = self.apply_pen(&PenUpdate::new().speed(normalize_speed(speed)));
    }

    /// One of fastest, fast, normal, slow, slowest.
    pub fn set_speed_name(&mut self, name: &str) -> Result<(), TurtleError> {
        let speed = speed_from_name(name)?;
        self.apply_pen(&PenUpdate::new().speed(speed))
    }

    pub fn show_turtle(&mut self) {
        let _ = self.apply_pen(&PenUpdate::new().visible(true));
    }

    pub fn hide_turtle(&mut self) {
        let _ = self.apply_pen(&PenUpdate::new().visible(false));
    }

    pub fn is_visible(&self) -> bool {
        self.pen.attributes().visible
    }

    // ------------------------------------------------------------------
    // Shape

    pub fn shape(&self) -> &str {
        &self.shape_name
    }

    pub fn set_shape(&mut self, name: &str) -> Result<(), TurtleError> {
        let shape = self.screen.borrow().shapes().lookup(name)?;
        self.shape = shape;
        self.shape_name = name.to_string();
        self.update();
        Ok(())
    }

    pub fn resizemode(&self) -> ResizeMode {
        self.pen.attributes().resize_mode
    }

    pub fn set_resizemode(&mut self, mode: ResizeMode) {
        let _ = self.apply_pen(&PenUpdate::new().resize_mode(mode));
    }

    /// Stretch factors and outline width.
    pub fn shapesize(&self) -> (f64, f64, f64) {
        let attrs = self.pen.attributes();
        (attrs.stretch.0, attrs.stretch.1, attrs.outline_width)
    }

    pub fn set_shapesize(
        &mut self,
        stretch_wid: f64,
        stretch_len: f64,
        outline: Option<f64>,
    ) -> Result<(), TurtleError> {
        let mut update = PenUpdate::new()
            .resize_mode(ResizeMode::User)
            .stretch(stretch_wid, stretch_len);
        if let Some(outline) = outline {
            update = update.outline_width(outline);
        }
        self.apply_pen(&update)
    }

    pub fn shearfactor(&self) -> f64 {
        self.pen.attributes().shear
    }

    pub fn set_shearfactor(&mut self, shear: f64) {
        let _ = self.apply_pen(
            &PenUpdate::new()
                .resize_mode(ResizeMode::User)
                .shear(shear),
        );
    }

    /// Shape tilt relative to the heading, in user angle units.
    pub fn tiltangle(&self) -> f64 {
        let units = self.nav.units();
        let degrees = -self.pen.attributes().tilt.to_degrees() * units.angle_orientation;
        (degrees / units.degrees_per_unit).rem_euclid(units.full_circle)
    }

    pub fn set_tiltangle(&mut self, angle: f64) {
        let units = self.nav.units();
        let tilt = (-angle * units.degrees_per_unit * units.angle_orientation)
            .to_radians()
            .rem_euclid(std::f64::consts::TAU);
        let _ = self.apply_pen(
            &PenUpdate::new()
                .resize_mode(ResizeMode::User)
                .tilt(tilt),
        );
    }

    /// Tilt further by `angle` user units.
    pub fn tilt(&mut self, angle: f64) {
        self.set_tiltangle(angle + self.tiltangle());
    }

    pub fn shapetransform(&self) -> Matrix2<f64> {
        self.pen.shape_transform()
    }

    /// Set the shape matrix directly. It is split back into stretch, shear
    /// and tilt so the pen stays the single source of truth.
    pub fn set_shapetransform(
        &mut self,
        m11: f64,
        m12: f64,
        m21: f64,
        m22: f64,
    ) -> Result<(), TurtleError> {
        let t = ShapeTransform::from_matrix(&Matrix2::new(m11, m12, m21, m22))?;
        self.apply_pen(
            &PenUpdate::new()
                .resize_mode(ResizeMode::User)
                .stretch(t.stretch.0, t.stretch.1)
                .shear(t.shear)
                .tilt(t.tilt),
        )
    }

    /// The active polygon shape in shape space, bent according to the
    /// resize mode. `None` for image and compound shapes.
    pub fn get_shapepoly(&self) -> Option<Vec<Vec2D>> {
        let Shape::Polygon(points) = self.shape.as_ref() else {
            return None;
        };
        let attrs = self.pen.attributes();
        Some(match attrs.resize_mode {
            ResizeMode::NoResize => points.clone(),
            ResizeMode::Auto => {
                let l = (attrs.width / 5.0).max(1.0);
                transform_polygon(points, &Matrix2::new(l, 0.0, 0.0, l))
            }
            ResizeMode::User => transform_polygon(points, &self.pen.shape_transform()),
        })
    }

    // ------------------------------------------------------------------
    // Stamps

    /// Leave a copy of the current shape behind.
    pub fn stamp(&mut self) -> StampId {
        let placed = self.placed_shape();
        let items = self.with_renderer(|r| {
            placed
                .iter()
                .map(|shape| {
                    let item = r.create_item(shape.kind());
                    shape.draw(r, item);
                    item
                })
                .collect::<Vec<ItemId>>()
        });
        let id = StampId(self.next_stamp);
        self.next_stamp += 1;
        debug!("stamp {:?} at {} ({} items)", id, self.nav.position(), items.len());
        self.stamps.push(StampEntry { id, items });
        self.undo.push(UndoRecord::Stamp(id));
        self.update();
        id
    }

    /// Stamps still on screen, oldest first.
    pub fn stamps(&self) -> Vec<StampId> {
        self.stamps.iter().map(|entry| entry.id).collect()
    }

    fn remove_stamp(&mut self, id: StampId) {
        if let Some(index) = self.stamps.iter().position(|entry| entry.id == id) {
            let entry = self.stamps.remove(index);
            self.with_renderer(|r| {
                for item in entry.items {
                    r.delete_item(item);
                }
            });
        }
    }

    /// Delete a stamp. Its undo record turns into a no-op.
    pub fn clear_stamp(&mut self, id: StampId) {
        self.remove_stamp(id);
        self.undo
            .purge(|record| matches!(record, UndoRecord::Stamp(stamp) if *stamp == id));
        self.update();
    }

    /// `None` clears every stamp, `Some(n)` the first n, `Some(-n)` the
    /// last n.
    pub fn clear_stamps(&mut self, n: Option<isize>) {
        let ids = self.stamps();
        let selected: Vec<StampId> = match n {
            None => ids,
            Some(n) if n >= 0 => ids.into_iter().take(n as usize).collect(),
            Some(n) => {
                let skip = ids.len().saturating_sub(n.unsigned_abs());
                ids.into_iter().skip(skip).collect()
            }
        };
        for id in selected {
            self.clear_stamp(id);
        }
    }

    // ------------------------------------------------------------------
    // Fills, dots and polygons

    pub fn filling(&self) -> bool {
        self.fill_path.is_some()
    }

    /// Start collecting a fill path at the current position. Calling it
    /// again while filling restarts the path.
    pub fn begin_fill(&mut self) {
        let item = match self.fill_item {
            Some(item) => item,
            None => {
                let item = self.with_renderer(|r| r.create_polygon_item());
                self.other_items.push(item);
                self.fill_item = Some(item);
                item
            }
        };
        self.fill_path = Some(vec![self.nav.position()]);
        self.new_line(true);
        self.undo.push(UndoRecord::BeginFill(item));
        self.update();
    }

    /// Fill the traced path. Fewer than three distinct vertices draw
    /// nothing.
    pub fn end_fill(&mut self) {
        let (Some(mut path), Some(item)) = (self.fill_path.take(), self.fill_item.take()) else {
            return;
        };
        if path.len() > 1 && path.first() == path.last() {
            path.pop();
        }
        if path.len() >= 3 {
            let attrs = self.pen.attributes().clone();
            debug!("fill with {} vertices", path.len());
            self.with_renderer(|r| {
                r.draw_polygon(item, &path, Some(&attrs.fill_color), None, attrs.width)
            });
            self.undo.push(UndoRecord::DoFill(item));
        }
        self.update();
    }

    /// A filled circular dot at the current position. Defaults to the pen
    /// color and a size a bit larger than the pen.
    pub fn dot(&mut self, size: Option<f64>, color: Option<CssColor>) -> Result<(), TurtleError> {
        let attrs = self.pen.attributes().clone();
        let size = size.unwrap_or((attrs.width + 4.0).max(2.0 * attrs.width));
        if !(size > 0.0 && size.is_finite()) {
            return Err(TurtleError::InvalidArgument(format!(
                "dot size must be positive and finite, got {}",
                size
            )));
        }
        let color = color.unwrap_or(attrs.color);
        let center = self.nav.position();
        let radius = size / 2.0;
        let sides = usize::from_f64(radius)
            .unwrap_or(250)
            .min(250)
            .saturating_mul(4)
            .max(32);
        let points: Vec<Vec2D> = (0..sides)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / sides as f64;
                center + Vec2D::new(angle.cos(), angle.sin()) * radius
            })
            .collect();
        let item = self.with_renderer(|r| {
            let item = r.create_polygon_item();
            r.draw_polygon(item, &points, Some(&color), None, 0.0);
            item
        });
        self.other_items.push(item);
        self.undo.push(UndoRecord::Dot(item));
        self.update();
        Ok(())
    }

    /// Start recording visited vertices.
    pub fn begin_poly(&mut self) {
        self.poly = Some(vec![self.nav.position()]);
    }

    pub fn end_poly(&mut self) {
        if let Some(poly) = self.poly.take() {
            self.last_poly = Some(poly);
        }
    }

    /// The polygon being recorded, or the last one finished.
    pub fn get_poly(&self) -> Option<Vec<Vec2D>> {
        self.poly.clone().or_else(|| self.last_poly.clone())
    }

    /// [`Turtle::get_poly`] as a closed geo polygon.
    pub fn get_poly_geo(&self) -> Option<Polygon<f64>> {
        self.get_poly().map(|points| {
            Polygon::new(
                LineString::from(points.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>()),
                vec![],
            )
        })
    }

    // ------------------------------------------------------------------
    // Undo

    pub fn undobufferentries(&self) -> usize {
        self.undo.count()
    }

    /// Resize the undo log, dropping its history. Zero turns undo off.
    pub fn setundobuffer(&mut self, size: usize) {
        self.undo.reset(Some(size));
    }

    /// Revert the last recorded action. Does nothing when there is none.
    pub fn undo(&mut self) {
        let Some(record) = self.undo.pop() else {
            return;
        };
        debug!("undo {:?}", record);
        self.revert(record);
    }

    fn revert(&mut self, record: UndoRecord) {
        match record {
            UndoRecord::Sequence(records) => {
                for record in records.into_iter().rev() {
                    self.revert(record);
                }
            }
            UndoRecord::Go {
                from,
                to,
                modes,
                line,
            } => self.revert_go(from, to, modes, line),
            UndoRecord::Teleport { from, line } => {
                let attrs = self.pen.attributes().clone();
                self.restore_line(line, &attrs.color, attrs.width);
                self.nav.goto(from);
                self.update();
            }
            UndoRecord::Rotate {
                angle,
                degrees_per_unit,
            } => {
                let back = self.nav.orientation().rotate(-angle * degrees_per_unit);
                self.nav.set_orientation(back);
                self.update();
            }
            UndoRecord::Stamp(id) => {
                self.remove_stamp(id);
                self.update();
            }
            UndoRecord::Pen(attrs) => {
                // Validated when it was live; restoring it cannot fail.
                let _ = self.set_pen(&PenUpdate::from_attributes(&attrs));
            }
            UndoRecord::BeginFill(item) => {
                self.fill_item = None;
                self.fill_path = None;
                self.delete_other_item(item);
                self.update();
            }
            UndoRecord::DoFill(item) | UndoRecord::Dot(item) => {
                self.delete_other_item(item);
                self.update();
            }
            UndoRecord::Noop => {}
        }
    }

    fn delete_other_item(&mut self, item: ItemId) {
        if let Some(index) = self.other_items.iter().position(|i| *i == item) {
            self.other_items.remove(index);
            self.with_renderer(|r| r.delete_item(item));
        }
    }

    fn restore_line(&mut self, line: LineSnapshot, color: &CssColor, width: f64) {
        let LineSnapshot {
            item,
            points,
            geometry,
            items,
        } = line;
        let stale: Vec<ItemId> = self
            .items
            .iter()
            .copied()
            .filter(|i| !items.contains(i))
            .collect();
        self.with_renderer(|r| {
            r.draw_line(item, &geometry, color, width);
            for i in &stale {
                r.delete_item(*i);
            }
        });
        self.items = items;
        self.line_item = item;
        self.current_line = points;
    }

    fn revert_go(&mut self, from: Vec2D, to: Vec2D, modes: GoModes, line: LineSnapshot) {
        if (self.nav.position() - to).magnitude() > 0.5 {
            warn!(
                "undoing a move to {} but the turtle is at {}",
                to,
                self.nav.position()
            );
        }
        self.restore_line(line, &modes.color, modes.width);
        self.nav.goto(from);
        if let Some(poly) = self.poly.as_mut() {
            poly.pop();
            if poly.is_empty() {
                self.poly = None;
            }
        }
        if modes.filling {
            if let Some(path) = self.fill_path.as_mut() {
                path.pop();
            }
        }
        self.update();
    }

    // ------------------------------------------------------------------
    // Whole-turtle operations

    /// Delete everything this turtle drew. Pose and pen stay as they are;
    /// undo history is dropped.
    pub fn clear(&mut self) {
        self.fill_item = None;
        self.fill_path = None;
        self.poly = None;
        let doomed: Vec<ItemId> = self
            .items
            .drain(..)
            .chain(self.other_items.drain(..))
            .collect();
        let line_item = self.with_renderer(|r| {
            for item in doomed {
                r.delete_item(item);
            }
            r.create_line_item()
        });
        self.line_item = line_item;
        self.items = vec![line_item];
        self.current_line = if self.pen.attributes().down {
            vec![self.nav.position()]
        } else {
            vec![]
        };
        self.clear_stamps(None);
        self.undo.reset(None);
        self.update();
    }

    /// Clear, go home and put the pen back to its starting attributes.
    pub fn reset(&mut self) {
        self.nav.reset();
        self.pen = PenState::from_attributes(self.defaults.clone());
        self.clear();
    }
}

/// Cloning gives a turtle with the same pose, pen and shape, but its own
/// render items and an empty undo log. Nothing drawn is shared.
impl Clone for Turtle {
    fn clone(&self) -> Self {
        debug!("clone turtle at {}", self.nav.position());
        let mut twin = Turtle::build(
            &self.screen,
            self.nav.clone(),
            self.pen.snapshot(),
            self.shape_name.clone(),
            self.shape.clone(),
            UndoRingBuffer::new(self.undo.capacity()),
        );
        twin.defaults = self.defaults.clone();
        twin
    }
}

impl Drop for Turtle {
    fn drop(&mut self) {
        // Drawings outlive the turtle; only the cursor goes away.
        if let Ok(mut screen) = self.screen.try_borrow_mut() {
            let renderer = screen.renderer_mut();
            for (_, item) in self.cursor_items.drain(..) {
                renderer.delete_item(item);
            }
        }
    }
}
