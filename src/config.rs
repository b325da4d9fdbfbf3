//! Serializable effect descriptions.
//!
//! An [`EffectConfig`] captures everything needed to rebuild a particle
//! effect outside of code: the system's default lifetime and color, and the
//! emitter's rate, position and seed. Configs round-trip through pretty JSON
//! and are validated before anything is built from them.
//!
//! # Presets
//!
//! | Preset | Lifetime | Rate | Color |
//! |--------|----------|------|-------|
//! | [`fire`](EffectConfig::fire) | 1.5s | 800/s | orange |
//! | [`sparks`](EffectConfig::sparks) | 0.6s | 1200/s | yellow |
//! | [`smoke`](EffectConfig::smoke) | 4.0s | 150/s | grey |
//! | [`motes`](EffectConfig::motes) | 5.0s | 300/s | white |
//!
//! # Example
//!
//! ```ignore
//! let config = EffectConfig::load("effects/campfire.json")?;
//! let system = Rc::new(RefCell::new(config.build_system::<()>(Texture::soft_dot(16))?));
//! let mut emitter = config.build_emitter::<()>()?;
//! emitter.set_particle_system(Some(system.clone()));
//! ```

use std::path::Path;
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::emitter::{DEFAULT_RATE, DEFAULT_SEED};
use crate::error::ConfigError;
use crate::{Attributes, Color, Emitter, Particle, ParticleSystem, Texture};

/// Particle system defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Default particle lifetime in seconds, also the fade reference.
    pub lifetime_secs: f32,
    /// Color of particles whose attributes carry none.
    pub color: Color,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: 2.0,
            color: Color::WHITE,
        }
    }
}

impl SystemConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lifetime().map(|_| ())
    }

    /// The lifetime as a `Duration`, if it is positive and representable.
    pub fn lifetime(&self) -> Result<Duration, ConfigError> {
        match Duration::try_from_secs_f32(self.lifetime_secs) {
            Ok(d) if !d.is_zero() => Ok(d),
            _ => Err(ConfigError::NonPositiveLifetime(self.lifetime_secs)),
        }
    }
}

/// Emitter settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Particles per second.
    pub rate: f32,
    /// Emission point in world space.
    pub position: Vec2,
    /// Seed for the emitter's random source.
    pub seed: u64,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            position: Vec2::ZERO,
            seed: DEFAULT_SEED,
        }
    }
}

impl EmitterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate > 0.0 && self.rate.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::NonPositiveRate(self.rate))
        }
    }
}

/// A named system and emitter pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    pub name: String,
    pub system: SystemConfig,
    pub emitter: EmitterConfig,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self::motes(Vec2::ZERO)
    }
}

impl EffectConfig {
    fn preset(name: &str, lifetime_secs: f32, color: Color, rate: f32, position: Vec2) -> Self {
        Self {
            name: name.to_string(),
            system: SystemConfig { lifetime_secs, color },
            emitter: EmitterConfig {
                rate,
                position,
                seed: DEFAULT_SEED,
            },
        }
    }

    /// Short-lived, dense orange embers.
    pub fn fire(position: Vec2) -> Self {
        Self::preset("fire", 1.5, Color::ORANGE, 800.0, position)
    }

    /// Very short, very dense yellow sparks.
    pub fn sparks(position: Vec2) -> Self {
        Self::preset("sparks", 0.6, Color::YELLOW, 1200.0, position)
    }

    /// Slow, sparse grey puffs.
    pub fn smoke(position: Vec2) -> Self {
        Self::preset("smoke", 4.0, Color::rgb(140, 140, 140), 150.0, position)
    }

    /// Long-lived white motes at the default rate.
    pub fn motes(position: Vec2) -> Self {
        Self::preset("motes", 5.0, Color::WHITE, DEFAULT_RATE, position)
    }

    /// Look up a preset by name.
    pub fn named(name: &str, position: Vec2) -> Option<Self> {
        match name {
            "fire" => Some(Self::fire(position)),
            "sparks" => Some(Self::sparks(position)),
            "smoke" => Some(Self::smoke(position)),
            "motes" => Some(Self::motes(position)),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.system.validate()?;
        self.emitter.validate()
    }

    /// Parse and validate a config from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded effect '{}' from {}", config.name, path.as_ref().display());
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::debug!("Saved effect '{}' to {}", self.name, path.as_ref().display());
        Ok(())
    }

    /// Build a particle system with default attributes.
    pub fn build_system<A: Attributes + Default>(&self, texture: Texture) -> Result<ParticleSystem<A>, ConfigError> {
        ParticleSystem::new(texture, self.system.lifetime()?, self.system.color, A::default())
    }

    /// Build an unbound emitter whose particles live for the system lifetime.
    pub fn build_emitter<A: Attributes + Default>(&self) -> Result<Emitter<A>, ConfigError> {
        self.system.validate()?;
        let mut emitter = Emitter::new(Particle::new(Vec2::ZERO, self.system.lifetime_secs, A::default()))?
            .with_seed(self.emitter.seed);
        emitter.set_emission_rate(self.emitter.rate)?;
        emitter.state_mut().position = self.emitter.position;
        Ok(emitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for name in ["fire", "sparks", "smoke", "motes"] {
            let config = EffectConfig::named(name, Vec2::ZERO).unwrap();
            assert_eq!(config.name, name);
            config.validate().unwrap();
        }
        assert!(EffectConfig::named("plasma", Vec2::ZERO).is_none());
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let config = EffectConfig::from_json(r#"{ "name": "tiny", "emitter": { "rate": 10.0 } }"#).unwrap();
        assert_eq!(config.name, "tiny");
        assert_eq!(config.system, SystemConfig::default());
        assert_eq!(config.emitter.rate, 10.0);
        assert_eq!(config.emitter.seed, DEFAULT_SEED);
    }

    #[test]
    fn test_validation() {
        let mut config = EffectConfig::fire(Vec2::ZERO);
        config.system.lifetime_secs = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::NonPositiveLifetime(_))));

        config.system.lifetime_secs = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::NonPositiveLifetime(_))));

        config.system.lifetime_secs = 1.0;
        config.emitter.rate = -3.0;
        assert!(matches!(config.validate(), Err(ConfigError::NonPositiveRate(_))));

        assert!(matches!(
            EffectConfig::from_json(r#"{ "system": { "lifetime_secs": -1.0 } }"#),
            Err(ConfigError::NonPositiveLifetime(_))
        ));
        assert!(matches!(EffectConfig::from_json("{ nope"), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smoke.json");

        let config = EffectConfig::smoke(Vec2::new(12.0, -4.0));
        config.save(&path).unwrap();
        assert_eq!(EffectConfig::load(&path).unwrap(), config);

        assert!(matches!(
            EffectConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_build() {
        let config = EffectConfig::sparks(Vec2::new(5.0, 6.0));

        let system: ParticleSystem = config.build_system(Texture::soft_dot(4)).unwrap();
        assert!((system.lifetime() - 0.6).abs() < 1e-6);
        assert_eq!(system.default_color(), Color::YELLOW);

        let emitter: Emitter = config.build_emitter().unwrap();
        assert_eq!(emitter.emission_rate(), 1200.0);
        assert_eq!(emitter.state().position, Vec2::new(5.0, 6.0));
        assert_eq!(emitter.default_particle().lifetime, 0.6);
    }
}
