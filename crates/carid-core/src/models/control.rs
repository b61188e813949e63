//! Control limits and resolved control parameters

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::flags::{CarFlags, SafetyParam};
use super::variant::VariantKey;

/// Control loop period; steering commands are counted in these frames
pub const DT_CTRL: Duration = Duration::from_millis(10);

/// How the steering actuator is commanded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SteerControlType {
    Angle,
    Torque,
}

/// Platform control limits
///
/// `Default` is the documented platform baseline. Variants deviate from it
/// only through [`ControlOverrides`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlLimits {
    /// EPAS faults above this angle (deg)
    pub angle_max_deg: f64,
    /// Steering command is sent every `steer_step` control frames
    pub steer_step: u32,
    pub steer_control_type: SteerControlType,
    /// Driver torque above which steering is considered overridden
    pub steer_threshold: u32,
    /// Seconds of saturated steering before alerting
    pub steer_limit_timer: f64,
    pub steer_actuator_delay: f64,
    pub steer_at_standstill: bool,
    /// m/s^2
    pub accel_min: f64,
    pub accel_max: f64,
    /// m/s^3; ACC faults at 5.0
    pub jerk_min: f64,
    pub jerk_max: f64,
    pub v_ego_stopping: f64,
    pub v_ego_starting: f64,
    pub stopping_decel_rate: f64,
}

impl Default for ControlLimits {
    fn default() -> Self {
        Self {
            angle_max_deg: 360.0,
            steer_step: 2,
            steer_control_type: SteerControlType::Angle,
            steer_threshold: 1,
            steer_limit_timer: 0.4,
            steer_actuator_delay: 0.1,
            steer_at_standstill: true,
            accel_min: -3.48,
            accel_max: 2.0,
            jerk_min: -4.9,
            jerk_max: 4.9,
            v_ego_stopping: 0.1,
            v_ego_starting: 0.1,
            stopping_decel_rate: 0.3,
        }
    }
}

impl ControlLimits {
    /// Platform defaults with per-variant overrides applied
    pub fn from_overrides(overrides: &ControlOverrides) -> Self {
        let mut limits = Self::default();

        if let Some(v) = overrides.angle_max_deg {
            limits.angle_max_deg = v;
        }
        if let Some(v) = overrides.steer_step {
            limits.steer_step = v;
        }
        if let Some(v) = overrides.steer_control_type {
            limits.steer_control_type = v;
        }
        if let Some(v) = overrides.steer_limit_timer {
            limits.steer_limit_timer = v;
        }
        if let Some(v) = overrides.steer_actuator_delay {
            limits.steer_actuator_delay = v;
        }
        if let Some(v) = overrides.accel_min {
            limits.accel_min = v;
        }
        if let Some(v) = overrides.accel_max {
            limits.accel_max = v;
        }
        if let Some(v) = overrides.jerk_min {
            limits.jerk_min = v;
        }
        if let Some(v) = overrides.jerk_max {
            limits.jerk_max = v;
        }

        limits
    }

    /// Interval between two steering commands
    pub fn command_period(&self) -> Duration {
        DT_CTRL * self.steer_step
    }
}

/// Per-variant deviations from [`ControlLimits::default`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle_max_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steer_step: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steer_control_type: Option<SteerControlType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steer_limit_timer: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steer_actuator_delay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jerk_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jerk_max: Option<f64>,
}

/// Safety model enforced by the onboard safety firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyModel {
    Tesla,
    /// Pre-standardized Model S/X hardware
    TeslaLegacy,
}

impl SafetyModel {
    /// Numeric model id understood by the safety firmware
    pub fn id(&self) -> u8 {
        match self {
            SafetyModel::Tesla => 33,
            SafetyModel::TeslaLegacy => 99,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyConfig {
    pub model: SafetyModel,
    pub param: SafetyParam,
}

impl SafetyConfig {
    pub fn new(model: SafetyModel, param: SafetyParam) -> Self {
        Self { model, param }
    }
}

/// Final control parameters for a confirmed variant
///
/// Every field is populated; nothing is left for the consumer to default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlParameters {
    pub variant: VariantKey,
    pub limits: ControlLimits,
    /// Interval between steering commands (20 ms at the default step)
    pub command_period: Duration,
    pub flags: CarFlags,
    pub longitudinal_available: bool,
    pub longitudinal_enabled: bool,
    pub radar_unavailable: bool,
    /// One entry per safety-enforcing device, internal first
    pub safety_configs: Vec<SafetyConfig>,
}

impl ControlParameters {
    pub fn angle_ceiling(&self) -> f64 {
        self.limits.angle_max_deg
    }

    /// (min, max) acceleration in m/s^2
    pub fn accel_bounds(&self) -> (f64, f64) {
        (self.limits.accel_min, self.limits.accel_max)
    }

    /// (min, max) jerk in m/s^3
    pub fn jerk_bounds(&self) -> (f64, f64) {
        (self.limits.jerk_min, self.limits.jerk_max)
    }
}
