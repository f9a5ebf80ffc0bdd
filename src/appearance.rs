use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{FrameshotError, FrameshotResult};

/// Right-angle rotation for frameless presentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum RotationDeg {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl RotationDeg {
    pub fn degrees(self) -> u32 {
        match self {
            RotationDeg::Deg0 => 0,
            RotationDeg::Deg90 => 90,
            RotationDeg::Deg180 => 180,
            RotationDeg::Deg270 => 270,
        }
    }

    pub fn radians(self) -> f64 {
        f64::from(self.degrees()).to_radians()
    }
}

impl TryFrom<u32> for RotationDeg {
    type Error = FrameshotError;

    fn try_from(deg: u32) -> Result<Self, Self::Error> {
        match deg {
            0 => Ok(RotationDeg::Deg0),
            90 => Ok(RotationDeg::Deg90),
            180 => Ok(RotationDeg::Deg180),
            270 => Ok(RotationDeg::Deg270),
            other => Err(FrameshotError::config(format!(
                "rotation must be 0, 90, 180 or 270 degrees, got {other}"
            ))),
        }
    }
}

impl From<RotationDeg> for u32 {
    fn from(r: RotationDeg) -> Self {
        r.degrees()
    }
}

/// Output aspect presets. `Default` keeps the content+padding envelope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputAspect {
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    SixteenByNine,
    #[serde(rename = "9:16")]
    NineBySixteen,
    #[serde(rename = "3:4")]
    ThreeByFour,
}

impl OutputAspect {
    /// Width over height, or `None` for `Default`.
    pub fn ratio(self) -> Option<f64> {
        match self {
            OutputAspect::Default => None,
            OutputAspect::Square => Some(1.0),
            OutputAspect::SixteenByNine => Some(16.0 / 9.0),
            OutputAspect::NineBySixteen => Some(9.0 / 16.0),
            OutputAspect::ThreeByFour => Some(3.0 / 4.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub enabled: bool,
    /// Blur radius in pixels; the vertical offset is half of this.
    pub strength_px: u32,
    pub color: Color,
    pub opacity_pct: u8,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            strength_px: 24,
            color: Color::BLACK,
            opacity_pct: 35,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    /// Master switch: off means a transparent background even when a
    /// background image is loaded.
    pub enabled: bool,
    pub color: Color,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Color::WHITE,
        }
    }
}

/// User-controlled appearance state, passed by value into each compose
/// pass. The pipeline itself keeps no appearance state between passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    pub frameless: bool,
    pub rotation: RotationDeg,
    /// Corner radius for the frameless clip, in pixels.
    pub corner_radius_px: u32,
    pub shadow: ShadowConfig,
    pub background: BackgroundConfig,
    pub aspect: OutputAspect,
    /// May be negative: the content then overflows and is center-cropped.
    pub padding_px: i32,
}

impl AppearanceConfig {
    pub fn validate(&self) -> FrameshotResult<()> {
        if self.shadow.opacity_pct > 100 {
            return Err(FrameshotError::config(format!(
                "shadow opacity must be 0-100%, got {}",
                self.shadow.opacity_pct
            )));
        }
        if self.shadow.strength_px > 512 {
            return Err(FrameshotError::config(format!(
                "shadow strength must be at most 512px, got {}",
                self.shadow.strength_px
            )));
        }
        Ok(())
    }
}
