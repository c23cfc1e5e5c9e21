//! Room settings
//!
//! Deployment choices (boundary policy, path reconstruction, growth pacing,
//! death drops) plus the tuning numbers the simulation reads every tick.
//! Loaded from JSON; every field falls back to its default.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::consts::*;
use crate::error::Result;
use crate::sim::economy::ValueTable;

/// What happens when a head touches the arena boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// The snake dies
    #[default]
    Hard,
    /// The snake is turned back toward the arena centre
    Safe,
}

impl BoundaryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryMode::Hard => "hard",
            BoundaryMode::Safe => "safe",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hard" | "destroy" => Some(BoundaryMode::Hard),
            "safe" | "redirect" => Some(BoundaryMode::Safe),
            _ => None,
        }
    }
}

/// How segment positions are reconstructed from the head's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PathPolicy {
    /// Segment i sits at buffer index i * stride (constant spacing only)
    UniformStride,
    /// Segments are placed by walking the path's arc length
    #[default]
    ArcLength,
}

impl PathPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathPolicy::UniformStride => "uniform_stride",
            PathPolicy::ArcLength => "arc_length",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "uniform_stride" | "uniform" | "stride" => Some(PathPolicy::UniformStride),
            "arc_length" | "arc" => Some(PathPolicy::ArcLength),
            _ => None,
        }
    }
}

/// When eaten food turns into visible segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GrowthMode {
    /// One queued segment appears per completed cycle
    #[default]
    Staggered,
    /// Segments are appended as soon as food is eaten
    Immediate,
}

impl GrowthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthMode::Staggered => "staggered",
            GrowthMode::Immediate => "immediate",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "staggered" => Some(GrowthMode::Staggered),
            "immediate" => Some(GrowthMode::Immediate),
            _ => None,
        }
    }
}

/// Where a dead snake's tokens reappear as food
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Along the former body, then scattered once positions run out
    #[default]
    AlongBody,
    /// Uniformly across the arena
    Scatter,
}

impl DropPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropPolicy::AlongBody => "along_body",
            DropPolicy::Scatter => "scatter",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "along_body" | "body" => Some(DropPolicy::AlongBody),
            "scatter" => Some(DropPolicy::Scatter),
            _ => None,
        }
    }
}

/// Room settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Deployment policies ===
    pub boundary_mode: BoundaryMode,
    pub path_policy: PathPolicy,
    pub growth_mode: GrowthMode,
    pub drop_policy: DropPolicy,

    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,
    pub wall_width: f32,
    /// Broad-phase grid cell size
    pub grid_cell_size: f32,
    pub max_players: usize,

    // === Clock ===
    pub tick_rate_hz: u32,
    pub max_substeps: u32,

    // === Snake kinematics ===
    pub base_speed: f32,
    pub boost_speed: f32,
    /// Radians per second
    pub turn_rate: f32,
    pub head_radius: f32,
    pub body_radius: f32,
    pub base_spacing: f32,
    pub base_scale: f32,
    pub scale_per_segment: f32,
    pub max_scale: f32,
    pub uniform_stride: usize,

    // === Snake lifecycle ===
    pub initial_length: usize,
    pub min_length: usize,
    pub spawn_cooldown_ticks: u32,
    pub boost_shrink_interval_ms: u32,

    // === Economy ===
    pub food_radius: f32,
    pub food_values: ValueTable,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            boundary_mode: BoundaryMode::Hard,
            path_policy: PathPolicy::ArcLength,
            growth_mode: GrowthMode::Staggered,
            drop_policy: DropPolicy::AlongBody,

            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            wall_width: WALL_WIDTH,
            grid_cell_size: GRID_CELL_SIZE,
            max_players: MAX_CLIENTS_PER_ROOM,

            tick_rate_hz: TICK_RATE_HZ,
            max_substeps: MAX_SUBSTEPS,

            base_speed: BASE_SPEED,
            boost_speed: BOOST_SPEED,
            turn_rate: TURN_RATE,
            head_radius: HEAD_RADIUS,
            body_radius: BODY_RADIUS,
            base_spacing: BASE_SPACING,
            base_scale: BASE_SCALE,
            scale_per_segment: SCALE_PER_SEGMENT,
            max_scale: MAX_SCALE,
            uniform_stride: UNIFORM_STRIDE,

            initial_length: INITIAL_LENGTH,
            min_length: MIN_SNAKE_LENGTH,
            spawn_cooldown_ticks: SPAWN_COOLDOWN_TICKS,
            boost_shrink_interval_ms: BOOST_SHRINK_INTERVAL_MS,

            food_radius: FOOD_RADIUS,
            food_values: ValueTable::default(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fixed timestep in seconds
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate_hz as f32
    }

    /// Boost shrink interval converted to whole ticks (at least one)
    pub fn boost_shrink_ticks(&self) -> u32 {
        let ticks = (self.boost_shrink_interval_ms as u64 * self.tick_rate_hz as u64) / 1000;
        ticks.max(1) as u32
    }

    /// Clamp values that would break the simulation
    fn sanitized(mut self) -> Self {
        if self.tick_rate_hz == 0 {
            log::warn!("tick_rate_hz = 0 is invalid, using {}", TICK_RATE_HZ);
            self.tick_rate_hz = TICK_RATE_HZ;
        }
        self.max_substeps = self.max_substeps.max(1);
        self.uniform_stride = self.uniform_stride.max(1);
        self.min_length = self.min_length.max(2);
        self.initial_length = self.initial_length.max(self.min_length);
        self.max_scale = self.max_scale.max(self.base_scale);
        if self.grid_cell_size.is_nan() || self.grid_cell_size <= 1.0 {
            self.grid_cell_size = GRID_CELL_SIZE;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.boundary_mode, BoundaryMode::Hard);
        assert_eq!(settings.path_policy, PathPolicy::ArcLength);
        assert_eq!(settings.boost_shrink_ticks(), 18);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "boundary_mode": "safe", "arena_width": 800 }"#)
            .expect("valid json");
        assert_eq!(settings.boundary_mode, BoundaryMode::Safe);
        assert_eq!(settings.arena_width, 800.0);
        assert_eq!(settings.arena_height, ARENA_HEIGHT);
        assert_eq!(settings.food_values, ValueTable::default());
    }

    #[test]
    fn test_sanitize_bad_values() {
        let settings =
            Settings::from_json(r#"{ "tick_rate_hz": 0, "min_length": 0, "initial_length": 1 }"#)
                .expect("valid json");
        assert_eq!(settings.tick_rate_hz, TICK_RATE_HZ);
        assert_eq!(settings.min_length, 2);
        assert_eq!(settings.initial_length, 2);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = Settings::from_json("{ not json").unwrap_err();
        assert!(matches!(err, crate::SimError::Config(_)));
    }

    #[test]
    fn test_round_trip_json() {
        let settings = Settings::default();
        let json = settings.to_json().expect("serializes");
        let back = Settings::from_json(&json).expect("parses");
        assert_eq!(back.growth_mode, settings.growth_mode);
        assert_eq!(back.uniform_stride, settings.uniform_stride);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(BoundaryMode::from_str("Redirect"), Some(BoundaryMode::Safe));
        assert_eq!(PathPolicy::from_str("stride"), Some(PathPolicy::UniformStride));
        assert_eq!(GrowthMode::from_str("immediate"), Some(GrowthMode::Immediate));
        assert_eq!(DropPolicy::from_str("nope"), None);
        assert_eq!(DropPolicy::Scatter.as_str(), "scatter");
    }
}
