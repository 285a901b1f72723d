//! Drawing attributes and the single transactional way to change them.
pub use csscolorparser::parse as parse_css_color;
pub use csscolorparser::Color as CssColor;
use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};

use crate::errors::TurtleError;
use crate::shapes::transform::compose_matrix;

/// How the cursor shape follows the pen.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Scale with the pen width.
    Auto,
    /// Use stretch, shear and tilt.
    User,
    /// Draw the shape exactly as registered.
    #[default]
    NoResize,
}

impl std::str::FromStr for ResizeMode {
    type Err = TurtleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ResizeMode::Auto),
            "user" => Ok(ResizeMode::User),
            "noresize" => Ok(ResizeMode::NoResize),
            other => Err(TurtleError::InvalidArgument(format!(
                "unknown resize mode {}",
                other
            ))),
        }
    }
}

/// Map a speed name to its number.
pub fn speed_from_name(name: &str) -> Result<u8, TurtleError> {
    match name {
        "fastest" => Ok(0),
        "fast" => Ok(10),
        "normal" => Ok(6),
        "slow" => Ok(3),
        "slowest" => Ok(1),
        other => Err(TurtleError::UnknownSpeed(other.to_string())),
    }
}

/// Anything outside `(0.5, 10.5)` means "no animation".
pub fn normalize_speed(speed: f64) -> u8 {
    if speed > 0.5 && speed < 10.5 {
        speed.round() as u8
    } else {
        0
    }
}

/// Build a color from an RGB triple scaled by `colormode` (1.0 or 255.0).
pub fn color_from_rgb(r: f64, g: f64, b: f64, colormode: f64) -> Result<CssColor, TurtleError> {
    let mut out = [0u8; 3];
    for (slot, component) in out.iter_mut().zip([r, g, b]) {
        if !(0.0..=colormode).contains(&component) {
            return Err(TurtleError::BadColor(format!(
                "({}, {}, {}) is outside colormode {}",
                r, g, b, colormode
            )));
        }
        *slot = (component * 255.0 / colormode).round() as u8;
    }
    Ok(CssColor::from_rgba8(out[0], out[1], out[2], 255))
}

/// The inverse of [`color_from_rgb`].
pub fn color_to_rgb(color: &CssColor, colormode: f64) -> (f64, f64, f64) {
    let [r, g, b, _a] = color.to_rgba8();
    let k = colormode / 255.0;
    (r as f64 * k, g as f64 * k, b as f64 * k)
}

/// Full snapshot of a pen. Used for undo and for cloning.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PenAttributes {
    pub down: bool,
    pub color: CssColor,
    pub fill_color: CssColor,
    pub width: f64,
    pub speed: u8,
    pub visible: bool,
    pub resize_mode: ResizeMode,
    pub stretch: (f64, f64),
    pub shear: f64,
    /// Radians, counterclockwise.
    pub tilt: f64,
    pub outline_width: f64,
}

impl Default for PenAttributes {
    fn default() -> Self {
        Self {
            down: true,
            color: CssColor::from_rgba8(0, 0, 0, 255),
            fill_color: CssColor::from_rgba8(0, 0, 0, 255),
            width: 1.0,
            speed: 3,
            visible: true,
            resize_mode: ResizeMode::NoResize,
            stretch: (1.0, 1.0),
            shear: 0.0,
            tilt: 0.0,
            outline_width: 1.0,
        }
    }
}

/// Sparse pen change. Only the fields that are `Some` get applied.
///
/// ```rust
/// use aoer_turtle_rs::pen::{PenState, PenUpdate};
///
/// let mut pen = PenState::new();
/// pen.apply(&PenUpdate::new().width(3.0).speed(0)).unwrap();
/// assert_eq!(pen.attributes().width, 3.0);
/// assert!(pen.apply(&PenUpdate::new().width(0.0)).is_err());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct PenUpdate {
    pub down: Option<bool>,
    pub color: Option<CssColor>,
    pub fill_color: Option<CssColor>,
    pub width: Option<f64>,
    pub speed: Option<u8>,
    pub visible: Option<bool>,
    pub resize_mode: Option<ResizeMode>,
    pub stretch: Option<(f64, f64)>,
    pub shear: Option<f64>,
    pub tilt: Option<f64>,
    pub outline_width: Option<f64>,
}

impl PenUpdate {
    pub fn new() -> PenUpdate {
        PenUpdate::default()
    }

    pub fn down(mut self, down: bool) -> Self {
        self.down = Some(down);
        self
    }

    pub fn color(mut self, color: CssColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn fill_color(mut self, color: CssColor) -> Self {
        self.fill_color = Some(color);
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn speed(mut self, speed: u8) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn resize_mode(mut self, mode: ResizeMode) -> Self {
        self.resize_mode = Some(mode);
        self
    }

    pub fn stretch(mut self, sx: f64, sy: f64) -> Self {
        self.stretch = Some((sx, sy));
        self
    }

    pub fn shear(mut self, shear: f64) -> Self {
        self.shear = Some(shear);
        self
    }

    pub fn tilt(mut self, tilt: f64) -> Self {
        self.tilt = Some(tilt);
        self
    }

    pub fn outline_width(mut self, width: f64) -> Self {
        self.outline_width = Some(width);
        self
    }

    /// Every field set, taken from a snapshot. Applying this restores it.
    pub fn from_attributes(attrs: &PenAttributes) -> PenUpdate {
        PenUpdate {
            down: Some(attrs.down),
            color: Some(attrs.color.clone()),
            fill_color: Some(attrs.fill_color.clone()),
            width: Some(attrs.width),
            speed: Some(attrs.speed),
            visible: Some(attrs.visible),
            resize_mode: Some(attrs.resize_mode),
            stretch: Some(attrs.stretch),
            shear: Some(attrs.shear),
            tilt: Some(attrs.tilt),
            outline_width: Some(attrs.outline_width),
        }
    }

    /// Fold `other` on top of this update; `other` wins where both are set.
    pub fn merge(mut self, other: &PenUpdate) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field.clone(); })*
            };
        }
        take!(
            down,
            color,
            fill_color,
            width,
            speed,
            visible,
            resize_mode,
            stretch,
            shear,
            tilt,
            outline_width
        );
        self
    }

    pub fn validate(&self) -> Result<(), TurtleError> {
        if let Some(width) = self.width {
            if !(width > 0.0) {
                return Err(TurtleError::InvalidArgument(format!(
                    "pen width must be positive, got {}",
                    width
                )));
            }
        }
        if let Some((sx, sy)) = self.stretch {
            if sx == 0.0 || sy == 0.0 || !sx.is_finite() || !sy.is_finite() {
                return Err(TurtleError::InvalidArgument(format!(
                    "stretch factors must be finite and non-zero, got ({}, {})",
                    sx, sy
                )));
            }
        }
        if let Some(speed) = self.speed {
            if speed > 10 {
                return Err(TurtleError::InvalidArgument(format!(
                    "speed must be in 0..=10, got {}",
                    speed
                )));
            }
        }
        Ok(())
    }

    fn touches_transform(&self) -> bool {
        self.stretch.is_some() || self.shear.is_some() || self.tilt.is_some()
    }
}

/// What an applied update changed.
#[derive(Debug, Clone, PartialEq)]
pub struct PenChange {
    /// The current polyline can't continue across this change.
    pub line_break: bool,
    /// The attributes as they were before.
    pub previous: PenAttributes,
}

/// # PenState
///
/// Holds the pen and the shape transform derived from it. Attributes only
/// change through [`PenState::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct PenState {
    attrs: PenAttributes,
    transform: Matrix2<f64>,
}

impl Default for PenState {
    fn default() -> Self {
        PenState::new()
    }
}

impl PenState {
    pub fn new() -> PenState {
        PenState::from_attributes(PenAttributes::default())
    }

    pub fn from_attributes(attrs: PenAttributes) -> PenState {
        let transform = compose_matrix(attrs.stretch.0, attrs.stretch.1, attrs.shear, attrs.tilt);
        PenState { attrs, transform }
    }

    pub fn attributes(&self) -> &PenAttributes {
        &self.attrs
    }

    /// Copy of every attribute.
    pub fn snapshot(&self) -> PenAttributes {
        self.attrs.clone()
    }

    pub fn shape_transform(&self) -> Matrix2<f64> {
        self.transform
    }

    /// Would applying `update` split the polyline being drawn?
    pub fn breaks_line(&self, update: &PenUpdate) -> bool {
        update.down.is_some_and(|down| down != self.attrs.down)
            || update
                .color
                .as_ref()
                .is_some_and(|color| *color != self.attrs.color)
            || update.width.is_some_and(|width| width != self.attrs.width)
    }

    /// Apply a sparse update all at once. Nothing changes if it fails.
    pub fn apply(&mut self, update: &PenUpdate) -> Result<PenChange, TurtleError> {
        update.validate()?;
        let line_break = self.breaks_line(update);
        let previous = self.attrs.clone();

        if let Some(down) = update.down {
            self.attrs.down = down;
        }
        if let Some(color) = &update.color {
            self.attrs.color = color.clone();
        }
        if let Some(color) = &update.fill_color {
            self.attrs.fill_color = color.clone();
        }
        if let Some(width) = update.width {
            self.attrs.width = width;
        }
        if let Some(speed) = update.speed {
            self.attrs.speed = speed;
        }
        if let Some(visible) = update.visible {
            self.attrs.visible = visible;
        }
        if let Some(mode) = update.resize_mode {
            self.attrs.resize_mode = mode;
        }
        if let Some(stretch) = update.stretch {
            self.attrs.stretch = stretch;
        }
        if let Some(shear) = update.shear {
            self.attrs.shear = shear;
        }
        if let Some(tilt) = update.tilt {
            self.attrs.tilt = tilt;
        }
        if let Some(width) = update.outline_width {
            self.attrs.outline_width = width;
        }
        if update.touches_transform() {
            let (sx, sy) = self.attrs.stretch;
            self.transform = compose_matrix(sx, sy, self.attrs.shear, self.attrs.tilt);
        }
        Ok(PenChange {
            line_break,
            previous,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let pen = PenState::new();
        assert!(pen.attributes().down);
        assert_eq!(pen.attributes().speed, 3);
        assert_eq!(pen.shape_transform(), Matrix2::identity());
    }

    #[test]
    fn test_line_break_detection() {
        let mut pen = PenState::new();
        let red = parse_css_color("red").unwrap();
        assert!(!pen.breaks_line(&PenUpdate::new().down(true).width(1.0)));
        assert!(!pen.breaks_line(&PenUpdate::new().speed(0).fill_color(red.clone())));
        assert!(pen.breaks_line(&PenUpdate::new().color(red.clone())));
        assert!(pen.breaks_line(&PenUpdate::new().down(false)));
        let change = pen.apply(&PenUpdate::new().width(4.0)).unwrap();
        assert!(change.line_break);
        assert_eq!(change.previous.width, 1.0);
        assert_eq!(pen.attributes().width, 4.0);
    }

    #[test]
    fn test_invalid_updates_leave_pen_alone() {
        let mut pen = PenState::new();
        let before = pen.snapshot();
        assert!(matches!(
            pen.apply(&PenUpdate::new().down(false).width(-1.0)),
            Err(TurtleError::InvalidArgument(_))
        ));
        assert!(pen.apply(&PenUpdate::new().speed(11)).is_err());
        assert!(pen.apply(&PenUpdate::new().stretch(0.0, 2.0)).is_err());
        assert!(pen
            .apply(&PenUpdate::new().stretch(1.0, f64::INFINITY))
            .is_err());
        assert_eq!(pen.snapshot(), before);
    }

    #[test]
    fn test_transform_recomputed() {
        let mut pen = PenState::new();
        pen.apply(&PenUpdate::new().stretch(2.0, 3.0)).unwrap();
        let m = pen.shape_transform();
        assert_eq!(m, Matrix2::new(2.0, 0.0, 0.0, 3.0));
        pen.apply(&PenUpdate::new().tilt(std::f64::consts::FRAC_PI_2))
            .unwrap();
        let m = pen.shape_transform();
        assert!((m[(0, 1)] - 3.0).abs() < 1e-12);
        assert!((m[(1, 0)] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_restore_from_snapshot() {
        let mut pen = PenState::new();
        let snapshot = pen.snapshot();
        pen.apply(&PenUpdate::new().shear(0.5).visible(false).speed(0))
            .unwrap();
        pen.apply(&PenUpdate::from_attributes(&snapshot)).unwrap();
        assert_eq!(pen, PenState::from_attributes(snapshot));
    }

    #[test]
    fn test_merge() {
        let merged = PenUpdate::new()
            .width(2.0)
            .speed(1)
            .merge(&PenUpdate::new().speed(5));
        assert_eq!(merged.width, Some(2.0));
        assert_eq!(merged.speed, Some(5));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let update: PenUpdate = ron::from_str("(width: Some(2.0), sparkle: true)").unwrap();
        assert_eq!(update.width, Some(2.0));
        assert_eq!(update.down, None);
    }

    #[test]
    fn test_colors_and_speeds() {
        let c = color_from_rgb(255.0, 0.0, 128.0, 255.0).unwrap();
        assert_eq!(c.to_rgba8(), [255, 0, 128, 255]);
        assert_eq!(color_to_rgb(&c, 255.0), (255.0, 0.0, 128.0));
        assert!(color_from_rgb(1.5, 0.0, 0.0, 1.0).is_err());
        assert_eq!(color_from_rgb(1.0, 0.0, 0.0, 1.0).unwrap().to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(speed_from_name("normal").unwrap(), 6);
        assert!(speed_from_name("ludicrous").is_err());
        assert_eq!(normalize_speed(10.4), 10);
        assert_eq!(normalize_speed(11.0), 0);
        assert_eq!(normalize_speed(0.4), 0);
    }
}
