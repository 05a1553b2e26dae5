//! Layout settings passed to the kernel on every Start
//!
//! # Main Types
//!
//! - [`LayoutSettings`] - Complete, validated kernel settings
//! - [`SettingsOverrides`] - Partial settings merged over the defaults by `configure`
//! - [`SupervisorOptions`] - Protocol pacing (report interval, stop timeout)
//!
//! # Validation
//!
//! Every numeric value must be finite. Strength-like values must be
//! non-negative and `slow_down` must be strictly positive. Validation never
//! clamps: the first offending field is reported in a
//! [`LayoutError::Configuration`].

use crate::error::{LayoutError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of kernel steps between progress reports
pub const DEFAULT_REPORT_INTERVAL: u32 = 100;

/// Default bound on how long `stop` waits for the worker
pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 1000;

/// Default capacity of the supervisor -> worker command channel
pub const DEFAULT_COMMAND_CHANNEL_CAPACITY: usize = 64;

/// ForceAtlas2-style kernel settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Use logarithmic attraction
    pub lin_log_mode: bool,

    /// Divide attraction by the source node's mass (dissuade hubs)
    pub outbound_attraction_distribution: bool,

    /// Take node sizes into account to prevent overlap
    pub adjust_sizes: bool,

    /// Exponent applied to edge weights
    pub edge_weight_influence: f64,

    /// Repulsion strength
    pub scaling_ratio: f64,

    /// Gravity grows linearly with distance instead of staying constant
    pub strong_gravity_mode: bool,

    /// Attraction toward the origin
    pub gravity: f64,

    /// Divides node displacement; larger is slower and more stable
    pub slow_down: f64,

    /// Approximate repulsion with a Barnes-Hut quadtree
    pub barnes_hut_optimize: bool,

    /// Barnes-Hut accuracy threshold
    pub barnes_hut_theta: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            lin_log_mode: false,
            outbound_attraction_distribution: false,
            adjust_sizes: false,
            edge_weight_influence: 1.0,
            scaling_ratio: 1.0,
            strong_gravity_mode: false,
            gravity: 1.0,
            slow_down: 1.0,
            barnes_hut_optimize: false,
            barnes_hut_theta: 0.5,
        }
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(LayoutError::invalid(field, format!("must be finite, got {}", value)));
    }
    if value < 0.0 {
        return Err(LayoutError::invalid(field, format!("must be >= 0, got {}", value)));
    }
    Ok(())
}

impl LayoutSettings {
    /// Check every field, in declaration order.
    pub fn validate(&self) -> Result<()> {
        check_non_negative("edge_weight_influence", self.edge_weight_influence)?;
        check_non_negative("scaling_ratio", self.scaling_ratio)?;
        check_non_negative("gravity", self.gravity)?;
        check_non_negative("slow_down", self.slow_down)?;
        if self.slow_down == 0.0 {
            return Err(LayoutError::invalid("slow_down", "must be > 0, got 0"));
        }
        check_non_negative("barnes_hut_theta", self.barnes_hut_theta)?;
        Ok(())
    }

    /// Merge `overrides` over the defaults and validate the result.
    pub fn from_overrides(overrides: &SettingsOverrides) -> Result<Self> {
        let settings = overrides.apply(Self::default());
        settings.validate()?;
        Ok(settings)
    }
}

/// Partial settings; `None` fields keep their default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsOverrides {
    pub lin_log_mode: Option<bool>,
    pub outbound_attraction_distribution: Option<bool>,
    pub adjust_sizes: Option<bool>,
    pub edge_weight_influence: Option<f64>,
    pub scaling_ratio: Option<f64>,
    pub strong_gravity_mode: Option<bool>,
    pub gravity: Option<f64>,
    pub slow_down: Option<f64>,
    pub barnes_hut_optimize: Option<bool>,
    pub barnes_hut_theta: Option<f64>,
}

impl SettingsOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay the supplied fields onto `base`
    pub fn apply(&self, mut base: LayoutSettings) -> LayoutSettings {
        if let Some(v) = self.lin_log_mode {
            base.lin_log_mode = v;
        }
        if let Some(v) = self.outbound_attraction_distribution {
            base.outbound_attraction_distribution = v;
        }
        if let Some(v) = self.adjust_sizes {
            base.adjust_sizes = v;
        }
        if let Some(v) = self.edge_weight_influence {
            base.edge_weight_influence = v;
        }
        if let Some(v) = self.scaling_ratio {
            base.scaling_ratio = v;
        }
        if let Some(v) = self.strong_gravity_mode {
            base.strong_gravity_mode = v;
        }
        if let Some(v) = self.gravity {
            base.gravity = v;
        }
        if let Some(v) = self.slow_down {
            base.slow_down = v;
        }
        if let Some(v) = self.barnes_hut_optimize {
            base.barnes_hut_optimize = v;
        }
        if let Some(v) = self.barnes_hut_theta {
            base.barnes_hut_theta = v;
        }
        base
    }

    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = Some(gravity);
        self
    }

    pub fn with_scaling_ratio(mut self, ratio: f64) -> Self {
        self.scaling_ratio = Some(ratio);
        self
    }

    pub fn with_slow_down(mut self, slow_down: f64) -> Self {
        self.slow_down = Some(slow_down);
        self
    }

    pub fn with_barnes_hut(mut self, enabled: bool) -> Self {
        self.barnes_hut_optimize = Some(enabled);
        self
    }
}

/// Supervisor pacing options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorOptions {
    /// Kernel steps between Progress messages in continuous mode
    pub report_interval: u32,

    /// How long `stop` waits for the worker's final Update, in milliseconds
    pub stop_timeout_ms: u64,

    /// Capacity of the supervisor -> worker command channel
    pub command_channel_capacity: usize,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            report_interval: DEFAULT_REPORT_INTERVAL,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
            command_channel_capacity: DEFAULT_COMMAND_CHANNEL_CAPACITY,
        }
    }
}

impl SupervisorOptions {
    pub fn validate(&self) -> Result<()> {
        if self.report_interval == 0 {
            return Err(LayoutError::invalid("report_interval", "must be >= 1"));
        }
        if self.stop_timeout_ms == 0 {
            return Err(LayoutError::invalid("stop_timeout_ms", "must be >= 1"));
        }
        if self.command_channel_capacity == 0 {
            return Err(LayoutError::invalid("command_channel_capacity", "must be >= 1"));
        }
        Ok(())
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn with_report_interval(mut self, interval: u32) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout_ms = timeout.as_millis() as u64;
        self
    }
}
