//! # Fleet Configuration
//!
//! All tunables live in a TOML file loaded once at startup. Missing keys
//! fall back to [`FleetConfig::default`].
//!
//! ```toml
//! fleet_size = 1000
//! width = 800.0
//! height = 600.0
//! tick_interval_ms = 100
//! seed = 42
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{FleetError, FleetResult};
use crate::geometry::Bounds;

/// Largest fleet the simulation supports.
pub const MAX_FLEET_SIZE: usize = 1000;

/// Smallest accepted surface side, so formations keep a margin.
pub const MIN_SURFACE_SIDE: f32 = 100.0;

/// Simulation configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Number of robots, fixed for the session.
    pub fleet_size: usize,
    /// Visualization surface width.
    pub width: f32,
    /// Visualization surface height.
    pub height: f32,
    /// Tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Seed for every random decision.
    pub seed: u64,
    /// Battery lost per tick while `active`/`patrol`.
    pub battery_drain_per_tick: f32,
    /// Battery gained per tick while `charging`.
    pub battery_charge_per_tick: f32,
    /// Distance covered per tick toward a formation slot.
    pub move_speed: f32,
    /// Maximum random displacement per axis per tick in free movement.
    pub wander_step: f32,
    /// Battery level under which the AI sends robots to charge.
    pub low_battery_threshold: f32,
    /// Per-tick chance that a draining robot faults into `error`.
    pub fault_rate: f64,
    /// Preferred distance between formation targets.
    pub formation_spacing: f32,
    /// Maximum AI status adjustments applied per tick.
    pub ai_adjustment_budget: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            fleet_size: MAX_FLEET_SIZE,
            width: 800.0,
            height: 600.0,
            tick_interval_ms: 100,
            seed: 0x5EED_F1EE7,
            battery_drain_per_tick: 0.1,
            battery_charge_per_tick: 0.5,
            move_speed: 2.0,
            wander_step: 1.5,
            low_battery_threshold: 15.0,
            fault_rate: 0.000_05,
            formation_spacing: 24.0,
            ai_adjustment_budget: 50,
        }
    }
}

impl FleetConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`FleetError::InvalidConfig`] on syntax errors, unknown keys or
    /// out-of-range values.
    pub fn from_toml_str(source: &str) -> FleetResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| FleetError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`FleetError::InvalidConfig`] if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> FleetResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| FleetError::InvalidConfig(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), fleet_size = config.fleet_size, "fleet config loaded");
        Ok(config)
    }

    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// [`FleetError::InvalidConfig`] naming the first offending key.
    pub fn validate(&self) -> FleetResult<()> {
        let fail = |msg: String| Err(FleetError::InvalidConfig(msg));

        if self.fleet_size == 0 || self.fleet_size > MAX_FLEET_SIZE {
            return fail(format!("fleet_size must be in 1..={MAX_FLEET_SIZE}, got {}", self.fleet_size));
        }
        let surface_ok = |side: f32| side.is_finite() && side >= MIN_SURFACE_SIDE;
        if !(surface_ok(self.width) && surface_ok(self.height)) {
            return fail(format!(
                "surface must be at least {MIN_SURFACE_SIDE}x{MIN_SURFACE_SIDE}, got {}x{}",
                self.width, self.height
            ));
        }
        if self.tick_interval_ms == 0 {
            return fail("tick_interval_ms must be positive".to_string());
        }
        for (key, value) in [
            ("battery_drain_per_tick", self.battery_drain_per_tick),
            ("battery_charge_per_tick", self.battery_charge_per_tick),
            ("move_speed", self.move_speed),
            ("wander_step", self.wander_step),
            ("low_battery_threshold", self.low_battery_threshold),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return fail(format!("{key} must be a non-negative number, got {value}"));
            }
        }
        if !(self.formation_spacing.is_finite() && self.formation_spacing >= 1.0) {
            return fail(format!("formation_spacing must be >= 1, got {}", self.formation_spacing));
        }
        if !(0.0..=1.0).contains(&self.fault_rate) {
            return fail(format!("fault_rate must be in [0, 1], got {}", self.fault_rate));
        }
        Ok(())
    }

    /// Visualization bounds.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }

    /// Tick interval as a duration.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = FleetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fleet_size, MAX_FLEET_SIZE);
        assert_eq!(config.bounds(), Bounds::new(800.0, 600.0));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = FleetConfig::from_toml_str("fleet_size = 16\nseed = 7\n").unwrap();
        assert_eq!(config.fleet_size, 16);
        assert_eq!(config.seed, 7);
        assert_eq!(config.tick_interval_ms, FleetConfig::default().tick_interval_ms);
    }

    #[test]
    fn test_rejects_oversized_fleet() {
        let err = FleetConfig::from_toml_str("fleet_size = 1001").unwrap_err();
        assert!(matches!(err, FleetError::InvalidConfig(msg) if msg.contains("fleet_size")));
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_values() {
        assert!(FleetConfig::from_toml_str("fleet_sise = 10").is_err());
        assert!(FleetConfig::from_toml_str("fault_rate = 2.0").is_err());
        assert!(FleetConfig::from_toml_str("move_speed = -1.0").is_err());
        assert!(FleetConfig::from_toml_str("width = 10.0").is_err());
    }

    #[test]
    fn test_rejects_non_finite_surface() {
        for source in ["fleet_size = 4\nwidth = inf\n", "fleet_size = 4\nheight = inf\n", "width = nan\n"] {
            let err = FleetConfig::from_toml_str(source).unwrap_err();
            assert!(matches!(err, FleetError::InvalidConfig(msg) if msg.contains("surface")));
        }
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("robofleet_config_{}.toml", std::process::id()));
        std::fs::write(&path, "fleet_size = 32\ntick_interval_ms = 50\n").unwrap();

        let config = FleetConfig::load(&path).unwrap();
        assert_eq!(config.fleet_size, 32);
        assert_eq!(config.tick_interval(), Duration::from_millis(50));

        std::fs::remove_file(&path).ok();
        assert!(FleetConfig::load(&path).is_err());
    }
}
