//! Startup configuration, loaded from TOML with environment overrides.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::particles::{GenerationParams, RenderParams};
use crate::quality::QualityTier;

pub const DEFAULT_CONFIG_PATH: &str = "starfield.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldConfig {
    pub quality: QualityTier,
    /// Overrides the tier's star budget when set.
    pub particle_count: Option<u32>,
    /// Fixed RNG seed for reproducible fields.
    pub seed: Option<u64>,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
    pub window: WindowConfig,
    pub generation: GenerationParams,
    pub render: RenderParams,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            quality: QualityTier::default(),
            particle_count: None,
            seed: None,
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            generation: GenerationParams::default(),
            render: RenderParams::default(),
        }
    }
}

impl StarfieldConfig {
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads `path` if it exists, otherwise falls back to defaults. A file
    /// that exists but does not parse is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_toml_file(path)
    }

    /// Applies `STARFIELD_PARTICLES` and `STARFIELD_SEED` from the process
    /// environment. A value that does not parse is a validation error.
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    fn apply_overrides_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("STARFIELD_PARTICLES") {
            let count = val.parse().map_err(|_| {
                ConfigError::Validation(format!("STARFIELD_PARTICLES is not a count: {val}"))
            })?;
            self.particle_count = Some(count);
        }
        if let Some(val) = lookup("STARFIELD_SEED") {
            let seed = val.parse().map_err(|_| {
                ConfigError::Validation(format!("STARFIELD_SEED is not an integer: {val}"))
            })?;
            self.seed = Some(seed);
        }
        Ok(())
    }

    /// Number of stars for this process. Fixed once the field is created.
    pub fn star_count(&self) -> u32 {
        self.particle_count.unwrap_or_else(|| self.quality.budget().star_count)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.star_count() == 0 {
            return Err(ConfigError::Validation(
                "particle_count must be at least 1".to_string(),
            ));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Validation(
                "window size must be non-zero".to_string(),
            ));
        }
        self.generation.validate()?;
        self.render.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::StarfieldConfig;
    use crate::error::ConfigError;
    use crate::quality::QualityTier;

    fn env_of<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn default_config_is_valid() {
        let config = StarfieldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.star_count(), 40_000);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = StarfieldConfig::from_toml_str(
            r#"
            quality = "mobile_low"
            seed = 42

            [generation]
            cluster_count = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.quality, QualityTier::MobileLow);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.generation.cluster_count, 12);
        assert_eq!(config.generation.cluster_spread, 350.0);
        assert_eq!(config.render.base_size, 3.0);
        assert_eq!(config.star_count(), 15_000);
    }

    #[test]
    fn explicit_count_overrides_tier() {
        let config = StarfieldConfig::from_toml_str("particle_count = 8").unwrap();
        assert_eq!(config.star_count(), 8);
    }

    #[test]
    fn toml_roundtrip_preserves_config() {
        let config = StarfieldConfig {
            seed: Some(7),
            ..StarfieldConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(StarfieldConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(StarfieldConfig::from_toml_str("quality = [").is_err());
    }

    #[test]
    fn zero_particles_fail_validation() {
        let config = StarfieldConfig {
            particle_count: Some(0),
            ..StarfieldConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = StarfieldConfig::load_or_default("does/not/exist.toml").unwrap();
        assert_eq!(config, StarfieldConfig::default());
    }

    #[test]
    fn env_overrides_replace_count_and_seed() {
        let mut config = StarfieldConfig::default();
        config
            .apply_overrides_from(env_of(&[
                ("STARFIELD_PARTICLES", "1000"),
                ("STARFIELD_SEED", "77"),
            ]))
            .unwrap();
        assert_eq!(config.particle_count, Some(1000));
        assert_eq!(config.seed, Some(77));
        assert_eq!(config.star_count(), 1000);
    }

    #[test]
    fn absent_env_leaves_config_untouched() {
        let mut config = StarfieldConfig::default();
        config.apply_overrides_from(env_of(&[])).unwrap();
        assert_eq!(config, StarfieldConfig::default());
    }

    #[test]
    fn unparsable_env_override_is_rejected() {
        let mut config = StarfieldConfig::default();
        let err = config
            .apply_overrides_from(env_of(&[("STARFIELD_PARTICLES", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref msg) if msg.contains("lots")));
        assert_eq!(config.particle_count, None);

        let err = config
            .apply_overrides_from(env_of(&[("STARFIELD_SEED", "-3")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert_eq!(config.seed, None);
    }
}
