//! Lighting assessment from a single still frame.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::thresholds::PositionThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingQuality {
    Poor,
    Medium,
    Good,
}

/// Gray-level statistics of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lighting {
    /// Mean gray level, 0..=255.
    pub brightness: f64,
    /// Population standard deviation of the gray levels.
    pub contrast: f64,
}

impl Lighting {
    pub fn measure(image: &DynamicImage) -> Self {
        let gray = image.to_luma8();
        let n = gray.width() as usize * gray.height() as usize;
        if n == 0 {
            return Self {
                brightness: 0.0,
                contrast: 0.0,
            };
        }
        let mean = gray.pixels().map(|p| f64::from(p.0[0])).sum::<f64>() / n as f64;
        let variance = gray
            .pixels()
            .map(|p| {
                let d = f64::from(p.0[0]) - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64;
        Self {
            brightness: mean,
            contrast: variance.sqrt(),
        }
    }

    pub fn quality(&self, t: &PositionThresholds) -> LightingQuality {
        if self.brightness < t.dark_brightness {
            LightingQuality::Poor
        } else if self.brightness < t.dim_brightness || self.contrast < t.low_contrast {
            LightingQuality::Medium
        } else {
            LightingQuality::Good
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn gray(f: impl Fn(u32, u32) -> u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(16, 16, |x, y| Luma([f(x, y)])))
    }

    #[test]
    fn dark_frame_is_poor() {
        let lighting = Lighting::measure(&gray(|_, _| 20));
        assert_eq!(lighting.brightness, 20.0);
        assert_eq!(lighting.contrast, 0.0);
        assert_eq!(lighting.quality(&PositionThresholds::default()), LightingQuality::Poor);
    }

    #[test]
    fn bright_flat_frame_is_medium() {
        let lighting = Lighting::measure(&gray(|_, _| 180));
        assert_eq!(lighting.quality(&PositionThresholds::default()), LightingQuality::Medium);
    }

    #[test]
    fn bright_contrasty_frame_is_good() {
        let lighting = Lighting::measure(&gray(|x, _| if x % 2 == 0 { 100 } else { 240 }));
        assert_eq!(lighting.brightness, 170.0);
        assert_eq!(lighting.contrast, 70.0);
        assert_eq!(lighting.quality(&PositionThresholds::default()), LightingQuality::Good);
    }
}
