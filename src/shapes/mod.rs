//! Named cursor shapes, and the matrix math that bends them.
use std::collections::HashMap;
use std::sync::Arc;

use geo_types::{LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::errors::TurtleError;
use crate::pen::CssColor;
use crate::vec2d::Vec2D;

/// Stretch/shear/tilt composition and decomposition.
pub mod transform;

/// Opaque reference to an image the renderer knows how to draw.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub String);

impl ImageHandle {
    pub fn blank() -> ImageHandle {
        ImageHandle(String::new())
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

/// One polygon of a compound shape, with its own colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePart {
    pub points: Vec<Vec2D>,
    pub fill: CssColor,
    pub outline: CssColor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Polygon(Vec<Vec2D>),
    Compound(Vec<ShapePart>),
    Image(ImageHandle),
}

impl Shape {
    pub fn polygon<P: Into<Vec2D> + Copy>(points: &[P]) -> Shape {
        Shape::Polygon(points.iter().map(|p| (*p).into()).collect())
    }

    pub fn compound() -> Shape {
        Shape::Compound(vec![])
    }

    /// Add a part to a compound shape. Anything else can't take parts.
    pub fn add_component(
        &mut self,
        points: Vec<Vec2D>,
        fill: CssColor,
        outline: CssColor,
    ) -> Result<(), TurtleError> {
        match self {
            Shape::Compound(parts) => {
                parts.push(ShapePart {
                    points,
                    fill,
                    outline,
                });
                Ok(())
            }
            _ => Err(TurtleError::InvalidArgument(
                "only compound shapes take components".to_string(),
            )),
        }
    }

    /// Closed geo polygon for a simple polygon shape.
    pub fn to_polygon(&self) -> Option<Polygon<f64>> {
        match self {
            Shape::Polygon(points) => Some(Polygon::new(
                LineString::from(points.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>()),
                vec![],
            )),
            _ => None,
        }
    }
}

/// # ShapeRegistry
///
/// Shapes by name. Registering an existing name replaces it; entries are
/// shared immutably once in.
///
/// ```rust
/// use aoer_turtle_rs::shapes::{Shape, ShapeRegistry};
///
/// let mut shapes = ShapeRegistry::with_defaults();
/// shapes.register("tri", Shape::polygon(&[(0.0, 0.0), (5.0, 0.0), (0.0, 5.0)]));
/// assert!(shapes.lookup("tri").is_ok());
/// assert!(shapes.lookup("nope").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    shapes: HashMap<String, Arc<Shape>>,
}

impl ShapeRegistry {
    pub fn new() -> ShapeRegistry {
        ShapeRegistry::default()
    }

    /// A registry holding arrow, turtle, circle, square, triangle, classic
    /// and blank.
    pub fn with_defaults() -> ShapeRegistry {
        let mut registry = ShapeRegistry::new();
        registry.register("arrow", Shape::polygon(&[(-10.0, 0.0), (10.0, 0.0), (0.0, 10.0)]));
        registry.register(
            "turtle",
            Shape::polygon(&[
                (0.0, 16.0),
                (-2.0, 14.0),
                (-1.0, 10.0),
                (-4.0, 7.0),
                (-7.0, 9.0),
                (-9.0, 8.0),
                (-6.0, 5.0),
                (-7.0, 1.0),
                (-5.0, -3.0),
                (-8.0, -6.0),
                (-6.0, -8.0),
                (-4.0, -5.0),
                (0.0, -7.0),
                (4.0, -5.0),
                (6.0, -8.0),
                (8.0, -6.0),
                (5.0, -3.0),
                (7.0, 1.0),
                (6.0, 5.0),
                (9.0, 8.0),
                (7.0, 9.0),
                (4.0, 7.0),
                (1.0, 10.0),
                (2.0, 14.0),
            ]),
        );
        let circle: Vec<Vec2D> = (0..20)
            .map(|i| {
                let angle = (i as f64 * 18.0).to_radians();
                Vec2D::new(10.0 * angle.cos(), 10.0 * angle.sin())
            })
            .collect();
        registry.register("circle", Shape::Polygon(circle));
        registry.register(
            "square",
            Shape::polygon(&[(10.0, -10.0), (10.0, 10.0), (-10.0, 10.0), (-10.0, -10.0)]),
        );
        registry.register(
            "triangle",
            Shape::polygon(&[(10.0, -5.77), (0.0, 11.55), (-10.0, -5.77)]),
        );
        registry.register(
            "classic",
            Shape::polygon(&[(0.0, 0.0), (-5.0, -9.0), (0.0, -7.0), (5.0, -9.0)]),
        );
        registry.register("blank", Shape::Image(ImageHandle::blank()));
        registry
    }

    /// Insert or replace. Last writer wins.
    pub fn register(&mut self, name: &str, shape: Shape) {
        self.shapes.insert(name.to_string(), Arc::new(shape));
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<Shape>, TurtleError> {
        self.shapes
            .get(name)
            .cloned()
            .ok_or_else(|| TurtleError::UnknownShape(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shapes.contains_key(name)
    }

    /// Sorted, so listings are stable.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shapes.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_present() {
        let shapes = ShapeRegistry::with_defaults();
        assert_eq!(
            shapes.names(),
            vec!["arrow", "blank", "circle", "classic", "square", "triangle", "turtle"]
        );
        match shapes.lookup("circle").unwrap().as_ref() {
            Shape::Polygon(points) => {
                assert_eq!(points.len(), 20);
                assert!((points[5] - Vec2D::new(0.0, 10.0)).magnitude() < 1e-9);
            }
            other => panic!("circle should be a polygon, got {:?}", other),
        }
        match shapes.lookup("blank").unwrap().as_ref() {
            Shape::Image(image) => assert!(image.is_blank()),
            other => panic!("blank should be an image, got {:?}", other),
        }
        assert!(!ImageHandle("cat.gif".to_string()).is_blank());
    }

    #[test]
    fn test_last_writer_wins() {
        let mut shapes = ShapeRegistry::new();
        assert!(!shapes.contains("thing"));
        shapes.register("thing", Shape::polygon(&[(0.0, 0.0)]));
        assert!(shapes.contains("thing"));
        shapes.register("thing", Shape::Image(ImageHandle("thing.gif".to_string())));
        assert_eq!(
            *shapes.lookup("thing").unwrap(),
            Shape::Image(ImageHandle("thing.gif".to_string()))
        );
    }

    #[test]
    fn test_unknown_shape() {
        let shapes = ShapeRegistry::with_defaults();
        assert_eq!(
            shapes.lookup("dragon"),
            Err(TurtleError::UnknownShape("dragon".to_string()))
        );
    }

    #[test]
    fn test_compound() {
        let black = CssColor::from_rgba8(0, 0, 0, 255);
        let mut shape = Shape::compound();
        shape
            .add_component(vec![Vec2D::ZERO], black.clone(), black.clone())
            .unwrap();
        assert!(matches!(&shape, Shape::Compound(parts) if parts.len() == 1));
        assert!(Shape::polygon(&[(0.0, 0.0)])
            .add_component(vec![], black.clone(), black)
            .is_err());
    }

    #[test]
    fn test_to_polygon() {
        let poly = Shape::polygon(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)])
            .to_polygon()
            .unwrap();
        // geo closes the ring
        assert_eq!(poly.exterior().0.len(), 4);
    }
}
