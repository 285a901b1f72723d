use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::errors::TurtleError;
use crate::navigator::Mode;
use crate::pen::{parse_css_color, PenAttributes, ResizeMode};
use crate::screen::DEFAULT_DELAY_MS;
use crate::undo::DEFAULT_UNDO_CAPACITY;

/// Startup settings for a screen and its turtles. Missing fields fall back
/// to the defaults, so a config file only needs what it changes:
///
/// ```rust
/// use aoer_turtle_rs::config::TurtleConfig;
/// use aoer_turtle_rs::navigator::Mode;
///
/// let cfg = TurtleConfig::from_ron("(mode: logo, shape: \"turtle\")").unwrap();
/// assert_eq!(cfg.mode, Mode::Logo);
/// assert_eq!(cfg.undo_buffer_size, 1000);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TurtleConfig {
    pub mode: Mode,
    pub colormode: f64,
    /// Milliseconds per animation frame.
    pub delay: u64,
    pub undo_buffer_size: usize,
    pub shape: String,
    pub pencolor: String,
    pub fillcolor: String,
    pub resizemode: ResizeMode,
    pub visible: bool,
    pub speed: u8,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Standard,
            colormode: 1.0,
            delay: DEFAULT_DELAY_MS,
            undo_buffer_size: DEFAULT_UNDO_CAPACITY,
            shape: "classic".to_string(),
            pencolor: "black".to_string(),
            fillcolor: "black".to_string(),
            resizemode: ResizeMode::NoResize,
            visible: true,
            speed: 3,
        }
    }
}

impl TurtleConfig {
    pub fn from_ron(data: &str) -> Result<TurtleConfig, TurtleError> {
        Ok(ron::from_str(data)?)
    }

    pub fn from_file(path: &PathBuf) -> Result<TurtleConfig> {
        let mut reader = std::fs::File::open(path)?;
        let mut data = String::new();
        reader.read_to_string(&mut data)?;
        let config = TurtleConfig::from_ron(data.as_str())?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, TurtleError> {
        ron::to_string(self).map_err(|err| TurtleError::Config(err.to_string()))
    }

    /// The pen a fresh turtle starts with.
    pub fn pen_attributes(&self) -> Result<PenAttributes, TurtleError> {
        if self.speed > 10 {
            return Err(TurtleError::Config(format!(
                "speed must be in 0..=10, got {}",
                self.speed
            )));
        }
        Ok(PenAttributes {
            color: parse_css_color(&self.pencolor)?,
            fill_color: parse_css_color(&self.fillcolor)?,
            resize_mode: self.resizemode,
            visible: self.visible,
            speed: self.speed,
            ..PenAttributes::default()
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_from_empty() {
        assert_eq!(TurtleConfig::from_ron("()").unwrap(), TurtleConfig::default());
    }

    #[test]
    fn test_round_trip_text() {
        let cfg = TurtleConfig {
            delay: 0,
            pencolor: "red".to_string(),
            resizemode: ResizeMode::Auto,
            ..TurtleConfig::default()
        };
        let text = cfg.to_ron().unwrap();
        assert_eq!(TurtleConfig::from_ron(&text).unwrap(), cfg);
    }

    #[test]
    fn test_pen_attributes() {
        let cfg = TurtleConfig::from_ron("(pencolor: \"#ff0000\", speed: 0)").unwrap();
        let pen = cfg.pen_attributes().unwrap();
        assert_eq!(pen.color.to_rgba8(), [255, 0, 0, 255]);
        assert_eq!(pen.speed, 0);
        let bad = TurtleConfig {
            fillcolor: "zebra".to_string(),
            ..TurtleConfig::default()
        };
        assert!(matches!(bad.pen_attributes(), Err(TurtleError::BadColor(_))));
    }

    #[test]
    fn test_garbage_is_config_error() {
        assert!(matches!(
            TurtleConfig::from_ron("(mode: sideways)"),
            Err(TurtleError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(TurtleConfig::from_file(&PathBuf::from("/definitely/not/here.ron")).is_err());
    }
}
