use nalgebra::{Matrix2, Vector2};

use crate::errors::TurtleError;
use crate::vec2d::Vec2D;

/// The one formula turning stretch, shear and tilt into a shape matrix.
/// Tilt is in radians.
pub fn compose_matrix(sx: f64, sy: f64, shear: f64, tilt: f64) -> Matrix2<f64> {
    let (sa, ca) = tilt.sin_cos();
    Matrix2::new(
        sx * ca,
        sy * (shear * ca + sa),
        -sx * sa,
        sy * (ca - shear * sa),
    )
}

/// Stretch/shear/tilt split of a shape matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeTransform {
    pub stretch: (f64, f64),
    pub shear: f64,
    pub tilt: f64,
}

impl Default for ShapeTransform {
    fn default() -> Self {
        ShapeTransform {
            stretch: (1.0, 1.0),
            shear: 0.0,
            tilt: 0.0,
        }
    }
}

impl ShapeTransform {
    pub fn matrix(&self) -> Matrix2<f64> {
        compose_matrix(self.stretch.0, self.stretch.1, self.shear, self.tilt)
    }

    /// Undo [`compose_matrix`]: rotate the tilt back out, and what's left is
    /// an upper-triangular stretch+shear.
    pub fn from_matrix(m: &Matrix2<f64>) -> Result<ShapeTransform, TurtleError> {
        let (t11, t12, t21, t22) = (m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]);
        if t11 * t22 - t12 * t21 == 0.0 {
            return Err(TurtleError::SingularMatrix);
        }
        let alfa = (-t21).atan2(t11).rem_euclid(std::f64::consts::TAU);
        let (sa, ca) = alfa.sin_cos();
        let a11 = ca * t11 - sa * t21;
        let a12 = ca * t12 - sa * t22;
        let a22 = sa * t12 + ca * t22;
        Ok(ShapeTransform {
            stretch: (a11, a22),
            shear: a12 / a22,
            tilt: alfa,
        })
    }
}

/// Split a matrix given entry by entry, row major.
pub fn decompose_matrix(
    m11: f64,
    m12: f64,
    m21: f64,
    m22: f64,
) -> Result<ShapeTransform, TurtleError> {
    ShapeTransform::from_matrix(&Matrix2::new(m11, m12, m21, m22))
}

/// Apply a 2x2 matrix to every point.
pub fn transform_polygon(points: &[Vec2D], m: &Matrix2<f64>) -> Vec<Vec2D> {
    points
        .iter()
        .map(|p| {
            let out = m * Vector2::new(p.x, p.y);
            Vec2D::new(out.x, out.y)
        })
        .collect()
}

/// Put shape-space points at `position`, with the shape's +y axis pointing
/// along `heading`.
pub fn place_polygon(points: &[Vec2D], position: Vec2D, heading: Vec2D) -> Vec<Vec2D> {
    let len = heading.magnitude();
    let (e0, e1) = if len > 0.0 {
        (heading.x / len, heading.y / len)
    } else {
        (1.0, 0.0)
    };
    points
        .iter()
        .map(|p| Vec2D::new(position.x + e1 * p.x + e0 * p.y, position.y - e0 * p.x + e1 * p.y))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        let m = compose_matrix(2.0, 3.0, 0.5, 0.3);
        let t = ShapeTransform::from_matrix(&m).unwrap();
        assert!((t.stretch.0 - 2.0).abs() < 1e-10);
        assert!((t.stretch.1 - 3.0).abs() < 1e-10);
        assert!((t.shear - 0.5).abs() < 1e-10);
        assert!((t.tilt - 0.3).abs() < 1e-10);
        assert!((t.matrix() - m).norm() < 1e-10);
    }

    #[test]
    fn test_singular() {
        assert_eq!(
            decompose_matrix(1.0, 2.0, 2.0, 4.0),
            Err(TurtleError::SingularMatrix)
        );
    }

    #[test]
    fn test_transform_polygon() {
        let square = vec![Vec2D::new(1.0, 1.0), Vec2D::new(-1.0, 1.0)];
        let out = transform_polygon(&square, &Matrix2::new(2.0, 0.0, 0.0, 3.0));
        assert_eq!(out, vec![Vec2D::new(2.0, 3.0), Vec2D::new(-2.0, 3.0)]);
        let sheared = transform_polygon(&square, &compose_matrix(1.0, 1.0, 1.0, 0.0));
        assert_eq!(sheared[0], Vec2D::new(2.0, 1.0));
    }

    #[test]
    fn test_place_polygon() {
        let tip = vec![Vec2D::new(0.0, 10.0)];
        let east = place_polygon(&tip, Vec2D::new(5.0, 5.0), Vec2D::new(1.0, 0.0));
        assert_eq!(east[0], Vec2D::new(15.0, 5.0));
        let north = place_polygon(&tip, Vec2D::ZERO, Vec2D::new(0.0, 2.0));
        assert_eq!(north[0], Vec2D::new(0.0, 10.0));
    }
}
