use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Shape parameters of the cluster arrangement. Changing any of them
/// requires a full field regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub cluster_count: u32,
    pub cluster_spread: f32,
    pub fractal_power: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            cluster_count: 50,
            cluster_spread: 350.0,
            fractal_power: 2.5,
        }
    }
}

impl GenerationParams {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cluster_count < 1 {
            return Err(ConfigError::Validation(
                "cluster_count must be at least 1".to_string(),
            ));
        }
        if !self.cluster_spread.is_finite() || self.cluster_spread <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "cluster_spread must be finite and positive, got {}",
                self.cluster_spread
            )));
        }
        if !self.fractal_power.is_finite() || self.fractal_power < 1.0 {
            return Err(ConfigError::Validation(format!(
                "fractal_power must be finite and >= 1, got {}",
                self.fractal_power
            )));
        }
        Ok(())
    }
}

/// Per-frame visual parameters. Read every frame, never regenerate the field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderParams {
    /// 0.0 = uniform grid, 1.0 = fractal clusters.
    pub morph_factor: f32,
    pub speed: f32,
    pub base_size: f32,
    pub color_core: [u8; 3],
    pub color_rim: [u8; 3],
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            morph_factor: 1.0,
            speed: 30.0,
            base_size: 3.0,
            color_core: [200, 220, 255],
            color_rim: [50, 100, 255],
        }
    }
}

impl RenderParams {
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=1.0).contains(&self.morph_factor) {
            return Err(ConfigError::Validation(format!(
                "morph_factor must lie in [0, 1], got {}",
                self.morph_factor
            )));
        }
        if !self.speed.is_finite() {
            return Err(ConfigError::Validation("speed must be finite".to_string()));
        }
        if !self.base_size.is_finite() || self.base_size < 0.0 {
            return Err(ConfigError::Validation(format!(
                "base_size must be finite and non-negative, got {}",
                self.base_size
            )));
        }
        Ok(())
    }

    pub fn color_core_normalized(&self) -> [f32; 3] {
        normalize_rgb(self.color_core)
    }

    pub fn color_rim_normalized(&self) -> [f32; 3] {
        normalize_rgb(self.color_rim)
    }
}

fn normalize_rgb(rgb: [u8; 3]) -> [f32; 3] {
    [
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::{GenerationParams, RenderParams};

    #[test]
    fn defaults_are_valid() {
        assert!(GenerationParams::default().validate().is_ok());
        assert!(RenderParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_degenerate_generation_params() {
        let zero_clusters = GenerationParams {
            cluster_count: 0,
            ..GenerationParams::default()
        };
        assert!(zero_clusters.validate().is_err());

        let flat_spread = GenerationParams {
            cluster_spread: 0.0,
            ..GenerationParams::default()
        };
        assert!(flat_spread.validate().is_err());

        let nan_power = GenerationParams {
            fractal_power: f32::NAN,
            ..GenerationParams::default()
        };
        assert!(nan_power.validate().is_err());
    }

    #[test]
    fn colors_normalize_to_unit_range() {
        let params = RenderParams {
            color_core: [255, 0, 51],
            ..RenderParams::default()
        };
        let c = params.color_core_normalized();
        assert_eq!(c[0], 1.0);
        assert_eq!(c[1], 0.0);
        assert!((c[2] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn morph_outside_unit_range_is_rejected() {
        let params = RenderParams {
            morph_factor: 1.5,
            ..RenderParams::default()
        };
        assert!(params.validate().is_err());
    }
}
