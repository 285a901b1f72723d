//! Pose keeping for a turtle: where it is, which way it faces, and how the
//! caller's angle numbers map onto real degrees.
use crate::errors::TurtleError;
use crate::vec2d::Vec2D;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Heading conventions. `Standard` starts facing east and counts angles
/// counterclockwise; `Logo` starts facing north and counts clockwise.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Standard,
    Logo,
}

impl Mode {
    fn start_heading(&self) -> Vec2D {
        match self {
            Mode::Standard => Vec2D::new(1.0, 0.0),
            Mode::Logo => Vec2D::new(0.0, 1.0),
        }
    }

    fn orientation(&self) -> f64 {
        match self {
            Mode::Standard => 1.0,
            Mode::Logo => -1.0,
        }
    }
}

/// How many user units make a full turn, and what that means in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleUnits {
    pub full_circle: f64,
    pub degrees_per_unit: f64,
    pub angle_offset: f64,
    pub angle_orientation: f64,
}

impl AngleUnits {
    pub fn new(full_circle: f64, mode: Mode) -> AngleUnits {
        AngleUnits {
            full_circle,
            degrees_per_unit: 360.0 / full_circle,
            angle_offset: match mode {
                Mode::Standard => 0.0,
                Mode::Logo => full_circle / 4.0,
            },
            angle_orientation: mode.orientation(),
        }
    }

    /// Convert a direction vector into a user-facing heading.
    fn heading_of(&self, v: &Vec2D) -> f64 {
        let units = v.angle_degrees() / self.degrees_per_unit;
        (self.angle_offset + self.angle_orientation * units).rem_euclid(self.full_circle)
    }
}

/// One primitive of a polygon-approximated arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcStep {
    /// Rotate left by this many user angle units.
    Turn(f64),
    /// Move along the heading by this distance.
    Move(f64),
}

/// Default step count for an arc: fewer for small circles, capped for
/// large ones.
pub fn auto_steps(radius: f64, extent: f64, full_circle: f64) -> usize {
    let frac = extent.abs() / full_circle;
    1 + usize::from_f64((11.0 + radius.abs() / 6.0).min(59.0) * frac).unwrap_or(0)
}

/// # Navigator
///
/// Owns the pose. The heading is a direction vector, and turning rotates
/// that vector instead of adding to an angle, so a thousand small turns
/// don't slowly drift.
///
/// # Example
///
/// ```rust
/// use aoer_turtle_rs::navigator::Navigator;
/// use aoer_turtle_rs::vec2d::Vec2D;
///
/// let mut nav = Navigator::new();
/// nav.forward(100.0);
/// nav.left(90.0);
/// nav.forward(100.0);
/// assert!((nav.position() - Vec2D::new(100.0, 100.0)).magnitude() < 1e-9);
/// assert!((nav.heading() - 90.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Navigator {
    position: Vec2D,
    orient: Vec2D,
    mode: Mode,
    units: AngleUnits,
}

impl Default for Navigator {
    fn default() -> Self {
        Navigator::new()
    }
}

impl Navigator {
    pub fn new() -> Navigator {
        Navigator::with_mode(Mode::Standard)
    }

    pub fn with_mode(mode: Mode) -> Navigator {
        Navigator {
            position: Vec2D::ZERO,
            orient: mode.start_heading(),
            mode,
            units: AngleUnits::new(360.0, mode),
        }
    }

    /// Back to the origin, facing the mode's start direction. Units survive.
    pub fn reset(&mut self) {
        self.position = Vec2D::ZERO;
        self.orient = self.mode.start_heading();
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switching mode resets the pose, since "heading 0" points somewhere
    /// else afterwards.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.units = AngleUnits::new(self.units.full_circle, mode);
        self.reset();
    }

    pub fn units(&self) -> AngleUnits {
        self.units
    }

    /// Reconfigure how many units make a full circle. The stored heading is
    /// untouched; only later angle arguments are read differently.
    pub fn set_full_circle(&mut self, full_circle: f64) -> Result<(), TurtleError> {
        if !(full_circle > 0.0 && full_circle.is_finite()) {
            return Err(TurtleError::InvalidArgument(format!(
                "full circle must be a positive number, got {}",
                full_circle
            )));
        }
        self.units = AngleUnits::new(full_circle, self.mode);
        Ok(())
    }

    pub fn degrees(&mut self, full_circle: f64) -> Result<(), TurtleError> {
        self.set_full_circle(full_circle)
    }

    pub fn radians(&mut self) {
        self.units = AngleUnits::new(TAU, self.mode);
    }

    /// User angle units to real degrees.
    pub fn to_degrees(&self, angle: f64) -> f64 {
        angle * self.units.degrees_per_unit
    }

    pub fn position(&self) -> Vec2D {
        self.position
    }

    pub fn orientation(&self) -> Vec2D {
        self.orient
    }

    pub fn heading(&self) -> f64 {
        self.units.heading_of(&self.orient)
    }

    pub fn xcor(&self) -> f64 {
        self.position.x
    }

    pub fn ycor(&self) -> f64 {
        self.position.y
    }

    pub fn forward(&mut self, distance: f64) {
        self.position = self.destination(distance);
    }

    pub fn back(&mut self, distance: f64) {
        self.forward(-distance);
    }

    /// Where `forward(distance)` would land, without moving.
    pub fn destination(&self, distance: f64) -> Vec2D {
        self.position + self.orient * distance
    }

    pub fn left(&mut self, angle: f64) {
        self.rotate(angle);
    }

    pub fn right(&mut self, angle: f64) {
        self.rotate(-angle);
    }

    /// Counterclockwise turn by `angle` user units.
    pub fn rotate(&mut self, angle: f64) {
        self.orient = self.orient.rotate(self.to_degrees(angle));
    }

    pub fn goto(&mut self, point: Vec2D) {
        self.position = point;
    }

    pub(crate) fn set_orientation(&mut self, orient: Vec2D) {
        self.orient = orient;
    }

    /// The signed turn, in user units, that `set_heading(to_angle)` performs.
    /// Always lands in `[-full/2, full/2)`, so the turtle takes the short way.
    pub fn heading_delta(&self, to_angle: f64) -> f64 {
        let full = self.units.full_circle;
        let angle = (to_angle - self.heading()) * self.units.angle_orientation;
        (angle + full / 2.0).rem_euclid(full) - full / 2.0
    }

    /// Turn to an absolute heading. Returns the turn actually made.
    pub fn set_heading(&mut self, to_angle: f64) -> f64 {
        let delta = self.heading_delta(to_angle);
        self.rotate(delta);
        delta
    }

    pub fn distance_to(&self, point: Vec2D) -> f64 {
        (point - self.position).magnitude()
    }

    /// Heading the turtle would need to face `point`.
    pub fn angle_to(&self, point: Vec2D) -> f64 {
        self.units.heading_of(&(point - self.position))
    }

    /// Break an arc into turn/move primitives. The arc is a regular polygon
    /// inscribed in the circle, entered and left with a half-step turn so the
    /// heading is tangent at both ends. A negative radius mirrors the arc.
    pub fn circle_plan(
        &self,
        radius: f64,
        extent: Option<f64>,
        steps: Option<u32>,
    ) -> Result<Vec<ArcStep>, TurtleError> {
        let full = self.units.full_circle;
        let extent = extent.unwrap_or(full);
        let steps = match steps {
            Some(0) => {
                return Err(TurtleError::InvalidArgument(
                    "circle needs at least one step".to_string(),
                ))
            }
            Some(n) => n as usize,
            None => auto_steps(radius, extent, full),
        };
        let mut w = extent / steps as f64;
        let mut w2 = 0.5 * w;
        let mut l = 2.0 * radius * (w2 * self.units.degrees_per_unit).to_radians().sin();
        if radius < 0.0 {
            l = -l;
            w = -w;
            w2 = -w2;
        }
        let mut plan = Vec::with_capacity(2 * steps + 2);
        plan.push(ArcStep::Turn(w2));
        for _ in 0..steps {
            plan.push(ArcStep::Move(l));
            plan.push(ArcStep::Turn(w));
        }
        plan.push(ArcStep::Turn(-w2));
        Ok(plan)
    }

    /// Walk an arc without any drawing. Returns the visited vertices.
    pub fn circle(
        &mut self,
        radius: f64,
        extent: Option<f64>,
        steps: Option<u32>,
    ) -> Result<Vec<Vec2D>, TurtleError> {
        let mut visited = vec![];
        for step in self.circle_plan(radius, extent, steps)? {
            match step {
                ArcStep::Turn(angle) => self.rotate(angle),
                ArcStep::Move(distance) => {
                    self.forward(distance);
                    visited.push(self.position);
                }
            }
        }
        Ok(visited)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-8
    }

    #[test]
    fn test_square_walk() {
        let mut nav = Navigator::new();
        nav.forward(100.0);
        nav.left(90.0);
        nav.forward(100.0);
        assert!((nav.position() - Vec2D::new(100.0, 100.0)).magnitude() < 1e-9);
        assert!(close(nav.heading(), 90.0));
        nav.right(90.0);
        nav.back(100.0);
        assert!((nav.position() - Vec2D::new(0.0, 100.0)).magnitude() < 1e-9);
        assert!(close(nav.heading(), 0.0));
    }

    #[test]
    fn test_rotation_closure() {
        let mut nav = Navigator::new();
        let start = nav.orientation();
        for angle in [10.0, 35.0, 135.0, -20.0, 200.0, 0.5, 359.5] {
            nav.left(angle);
        }
        // total is 720
        assert!((nav.orientation() - start).magnitude() < 1e-9);
    }

    #[test]
    fn test_set_heading_is_shortest() {
        let mut nav = Navigator::new();
        for (from, to) in [(0.0, 270.0), (10.0, 350.0), (350.0, 10.0), (0.0, 180.0), (45.0, 44.0)] {
            nav.set_heading(from);
            let delta = nav.set_heading(to);
            assert!(delta.abs() <= 180.0);
            assert!(close(nav.heading(), to));
        }
        nav.set_heading(0.0);
        assert!(close(nav.set_heading(270.0), -90.0));
    }

    #[test]
    fn test_radians_and_custom_units() {
        let mut nav = Navigator::new();
        nav.radians();
        nav.left(std::f64::consts::FRAC_PI_2);
        assert!(close(nav.heading(), std::f64::consts::FRAC_PI_2));
        nav.degrees(400.0).unwrap();
        assert!(close(nav.heading(), 100.0));
        assert!(nav.degrees(0.0).is_err());
        assert!(nav.degrees(-360.0).is_err());
        assert!(nav.degrees(f64::NAN).is_err());
        // rejected units leave the old ones in place
        assert!(close(nav.units().full_circle, 400.0));
    }

    #[test]
    fn test_logo_mode() {
        let mut nav = Navigator::with_mode(Mode::Logo);
        assert!(close(nav.heading(), 0.0));
        nav.forward(10.0);
        assert!((nav.position() - Vec2D::new(0.0, 10.0)).magnitude() < 1e-9);
        nav.right(90.0);
        assert!(close(nav.heading(), 90.0));
        nav.set_heading(180.0);
        assert!((nav.orientation() - Vec2D::new(0.0, -1.0)).magnitude() < 1e-9);
    }

    #[test]
    fn test_towards_and_distance() {
        let nav = Navigator::new();
        assert!(close(nav.angle_to(Vec2D::new(0.0, 10.0)), 90.0));
        assert!(close(nav.angle_to(Vec2D::new(-10.0, -10.0)), 225.0));
        assert!(close(nav.distance_to(Vec2D::new(3.0, 4.0)), 5.0));
    }

    #[test]
    fn test_auto_steps() {
        assert_eq!(auto_steps(50.0, 360.0, 360.0), 20);
        assert_eq!(auto_steps(50.0, 180.0, 360.0), 10);
        assert_eq!(auto_steps(1000.0, 360.0, 360.0), 60);
        assert_eq!(auto_steps(-1000.0, -360.0, 360.0), 60);
    }

    #[test]
    fn test_full_circle_closes() {
        let mut nav = Navigator::new();
        let visited = nav.circle(50.0, None, None).unwrap();
        assert_eq!(visited.len(), 20);
        assert!(nav.position().magnitude() < 1e-9);
        assert!(close(nav.heading(), 0.0));
        // counterclockwise circle with positive radius; top lands at y=100
        let top = visited.iter().fold(f64::MIN, |acc, p| acc.max(p.y));
        assert!(close(top, 100.0));
    }

    #[test]
    fn test_arc_reversibility() {
        let mut nav = Navigator::new();
        nav.circle(50.0, Some(180.0), None).unwrap();
        assert!((nav.position() - Vec2D::new(0.0, 100.0)).magnitude() < 1e-9);
        assert!(close(nav.heading(), 180.0));
        nav.circle(50.0, Some(-180.0), None).unwrap();
        assert!(nav.position().magnitude() < 1e-9);
        assert!(close(nav.heading(), 0.0));
    }

    #[test]
    fn test_negative_radius_mirrors() {
        let mut nav = Navigator::new();
        nav.circle(-50.0, Some(180.0), None).unwrap();
        assert!((nav.position() - Vec2D::new(0.0, -100.0)).magnitude() < 1e-9);
        assert!(close(nav.heading(), 180.0));
    }

    #[test]
    fn test_zero_steps_rejected() {
        let mut nav = Navigator::new();
        assert!(matches!(
            nav.circle(10.0, None, Some(0)),
            Err(TurtleError::InvalidArgument(_))
        ));
        let plan = nav.circle_plan(10.0, Some(90.0), Some(3)).unwrap();
        assert_eq!(plan.len(), 8);
        assert_eq!(plan[0], ArcStep::Turn(15.0));
        assert_eq!(plan[7], ArcStep::Turn(-15.0));
    }
}
