//! A tiny immutable 2D vector, used for both positions and headings.
use geo_types::{coord, Coord, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// # Vec2D
///
/// Plain value type. Every operation hands back a new vector, so a heading
/// can be passed around and compared freely without anyone mutating it
/// behind the turtle's back.
///
/// # Example
///
/// ```rust
/// use aoer_turtle_rs::vec2d::Vec2D;
///
/// let east = Vec2D::new(1.0, 0.0);
/// let north = east.rotate(90.0);
/// assert!((north - Vec2D::new(0.0, 1.0)).magnitude() < 1e-12);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2D {
    pub x: f64,
    pub y: f64,
}

impl Vec2D {
    pub const ZERO: Vec2D = Vec2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Vec2D {
        Vec2D { x, y }
    }

    pub fn add(&self, other: &Vec2D) -> Vec2D {
        Vec2D::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(&self, other: &Vec2D) -> Vec2D {
        Vec2D::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(&self, k: f64) -> Vec2D {
        Vec2D::new(self.x * k, self.y * k)
    }

    pub fn dot(&self, other: &Vec2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Rotate counterclockwise by `degrees`. The rotated vector is a blend of
    /// this one and its perpendicular, which is the only place heading state
    /// ever meets trigonometry.
    pub fn rotate(&self, degrees: f64) -> Vec2D {
        let perp = Vec2D::new(-self.y, self.x);
        let (s, c) = degrees.to_radians().sin_cos();
        Vec2D::new(self.x * c + perp.x * s, self.y * c + perp.y * s)
    }

    /// Direction of this vector in degrees, in `[0, 360)`.
    /// Rounded to ten decimals so that `90.00000000000001` reads as `90`.
    pub fn angle_degrees(&self) -> f64 {
        let raw = self.y.atan2(self.x).to_degrees();
        let rounded = (raw * 1e10).round() / 1e10;
        rounded.rem_euclid(360.0)
    }
}

impl Add for Vec2D {
    type Output = Vec2D;
    fn add(self, other: Vec2D) -> Vec2D {
        Vec2D::add(&self, &other)
    }
}

impl Sub for Vec2D {
    type Output = Vec2D;
    fn sub(self, other: Vec2D) -> Vec2D {
        Vec2D::sub(&self, &other)
    }
}

impl Mul<f64> for Vec2D {
    type Output = Vec2D;
    fn mul(self, k: f64) -> Vec2D {
        self.scale(k)
    }
}

impl Neg for Vec2D {
    type Output = Vec2D;
    fn neg(self) -> Vec2D {
        Vec2D::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Vec2D {
    fn from((x, y): (f64, f64)) -> Self {
        Vec2D::new(x, y)
    }
}

impl From<Coord<f64>> for Vec2D {
    fn from(c: Coord<f64>) -> Self {
        Vec2D::new(c.x, c.y)
    }
}

impl From<Vec2D> for Coord<f64> {
    fn from(v: Vec2D) -> Self {
        coord! {x: v.x, y: v.y}
    }
}

impl From<Point<f64>> for Vec2D {
    fn from(p: Point<f64>) -> Self {
        Vec2D::new(p.x(), p.y())
    }
}

impl From<Vec2D> for Point<f64> {
    fn from(v: Vec2D) -> Self {
        Point::new(v.x, v.y)
    }
}

impl fmt::Display for Vec2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:.2},{:.2})", self.x, self.y)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Vec2D::new(3.0, 4.0);
        let b = Vec2D::new(1.0, -2.0);
        assert_eq!(a + b, Vec2D::new(4.0, 2.0));
        assert_eq!(a - b, Vec2D::new(2.0, 6.0));
        assert_eq!(a * 2.0, Vec2D::new(6.0, 8.0));
        assert_eq!(-a, Vec2D::new(-3.0, -4.0));
        assert_eq!(a.dot(&b), -5.0);
        assert_eq!(a.magnitude(), 5.0);
    }

    #[test]
    fn test_simple_rotate() {
        for (degrees, source, destination) in vec![
            (90.0, Vec2D::new(1., 0.), Vec2D::new(0., 1.)),
            (180.0, Vec2D::new(1., 0.), Vec2D::new(-1., 0.)),
            (90.0, Vec2D::new(0., 1.), Vec2D::new(-1., 0.)),
            (
                45.0,
                Vec2D::new(1., 0.),
                Vec2D::new(0.7071067811865476, 0.7071067811865476),
            ),
            (
                -45.0,
                Vec2D::new(1., 0.),
                Vec2D::new(0.7071067811865476, -0.7071067811865476),
            ),
        ] {
            let out = source.rotate(degrees);
            assert!((destination - out).magnitude() < 1e-8);
        }
    }

    #[test]
    fn test_rotation_closure() {
        let start = Vec2D::new(1.0, 0.0);
        let mut heading = start;
        for _ in 0..360 {
            heading = heading.rotate(7.0);
        }
        // 360 * 7 = 2520 = 7 full turns
        assert!((heading - start).magnitude() < 1e-9);
        assert!((heading.magnitude() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_angle_degrees() {
        assert_eq!(Vec2D::new(0.0, 1.0).angle_degrees(), 90.0);
        assert_eq!(Vec2D::new(0.0, -1.0).angle_degrees(), 270.0);
        assert_eq!(Vec2D::new(1.0, 0.0).rotate(90.0).angle_degrees(), 90.0);
    }

    #[test]
    fn test_geo_interop() {
        let p: Point<f64> = Vec2D::new(1.5, -2.0).into();
        assert_eq!(p, Point::new(1.5, -2.0));
        assert_eq!(Vec2D::from(coord! {x: 3.0, y: 4.0}), Vec2D::new(3.0, 4.0));
    }
}
