//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Only the machine-dependent knobs live here: step distances, nominal
//! feedrates, the gamepad profile, and the logging sink. The engine's
//! timing constants (tap/hold threshold, poll interval, throttle windows)
//! are fixed by design and deliberately not configurable — worst-case
//! latency reasoning depends on them.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::gamepad::GamepadProfile;
use crate::motion::Axis;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub jog: JogConfig,
    pub gamepad: GamepadConfig,
    pub logging: LoggingConfig,
}

/// Jog distances and feedrates
#[derive(Debug, Deserialize, Clone)]
pub struct JogConfig {
    /// Distance of one discrete tap jog.
    #[serde(default = "default_step_distance")]
    pub step_distance: f64,

    /// Feedrate for tap jogs and continuous motion, distance/minute.
    #[serde(default = "default_feedrate")]
    pub feedrate: f64,

    /// Nominal joystick feedrate at full deflection, distance/minute.
    #[serde(default = "default_joystick_feedrate")]
    pub joystick_feedrate: f64,

    /// Machine axis the MPG wheel drives.
    #[serde(default = "default_mpg_axis")]
    pub mpg_axis: Axis,

    /// Distance of one MPG detent step.
    #[serde(default = "default_mpg_step_distance")]
    pub mpg_step_distance: f64,

    /// Feedrate for MPG steps, distance/minute.
    #[serde(default = "default_mpg_feedrate")]
    pub mpg_feedrate: f64,

    /// MPG rotation direction factor, 1.0 or -1.0.
    #[serde(default = "default_mpg_direction")]
    pub mpg_direction: f64,
}

/// Gamepad profile and stick mapping
#[derive(Debug, Deserialize, Clone)]
pub struct GamepadConfig {
    /// Deadzone in percent of full deflection (0 disables).
    #[serde(default = "default_zero_threshold")]
    pub zero_threshold: f64,

    /// Button that must be held while the joystick jogs, if any.
    #[serde(default)]
    pub lockout_button: Option<usize>,

    /// Machine axis driven by each analog axis index.
    #[serde(default = "default_stick_axes")]
    pub stick_axes: Vec<Axis>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Default value functions
fn default_step_distance() -> f64 { 1.0 }
fn default_feedrate() -> f64 { 1500.0 }
fn default_joystick_feedrate() -> f64 { 4000.0 }
fn default_mpg_axis() -> Axis { Axis::X }
fn default_mpg_step_distance() -> f64 { 0.01 }
fn default_mpg_feedrate() -> f64 { 500.0 }
fn default_mpg_direction() -> f64 { 1.0 }

fn default_zero_threshold() -> f64 { 15.0 }
fn default_stick_axes() -> Vec<Axis> { vec![Axis::X, Axis::Y] }

fn default_logging_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }

impl Default for JogConfig {
    fn default() -> Self {
        Self {
            step_distance: default_step_distance(),
            feedrate: default_feedrate(),
            joystick_feedrate: default_joystick_feedrate(),
            mpg_axis: default_mpg_axis(),
            mpg_step_distance: default_mpg_step_distance(),
            mpg_feedrate: default_mpg_feedrate(),
            mpg_direction: default_mpg_direction(),
        }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            zero_threshold: default_zero_threshold(),
            lockout_button: None,
            stick_axes: default_stick_axes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            log_dir: default_log_dir(),
        }
    }
}

impl GamepadConfig {
    /// Builds the runtime profile handed to the jog components.
    #[must_use]
    pub fn profile(&self) -> GamepadProfile {
        GamepadProfile {
            zero_threshold: self.zero_threshold,
            lockout_button: self.lockout_button,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pendant_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("step_distance", self.jog.step_distance),
            ("feedrate", self.jog.feedrate),
            ("joystick_feedrate", self.jog.joystick_feedrate),
            ("mpg_step_distance", self.jog.mpg_step_distance),
            ("mpg_feedrate", self.jog.mpg_feedrate),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(crate::error::PendantBridgeError::Config(
                    toml::de::Error::custom(format!("{} must be a positive number", name))
                ));
            }
        }

        if self.jog.mpg_direction != 1.0 && self.jog.mpg_direction != -1.0 {
            return Err(crate::error::PendantBridgeError::Config(
                toml::de::Error::custom("mpg_direction must be 1.0 or -1.0")
            ));
        }

        if !(0.0..=100.0).contains(&self.gamepad.zero_threshold) {
            return Err(crate::error::PendantBridgeError::Config(
                toml::de::Error::custom("zero_threshold must be between 0 and 100")
            ));
        }

        if self.gamepad.stick_axes.is_empty() {
            return Err(crate::error::PendantBridgeError::Config(
                toml::de::Error::custom("stick_axes must name at least one axis")
            ));
        }

        if self.logging.enabled && self.logging.log_dir.is_empty() {
            return Err(crate::error::PendantBridgeError::Config(
                toml::de::Error::custom("log_dir cannot be empty when logging is enabled")
            ));
        }

        Ok(())
    }
}
