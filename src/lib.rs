//! Snake Stake - authoritative simulation core for a token-staked snake arena
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, trailing paths, collisions, economy)
//! - `settings`: Data-driven room configuration
//! - `input`: Decoding of inbound steer/boost messages
//! - `snapshot`: Versioned plain-data replication of room state
//! - `leaderboard`: Live ranking of snakes in a room
//! - `session`: Deferred reporting to the external account service

pub mod error;
pub mod input;
pub mod leaderboard;
pub mod session;
pub mod settings;
pub mod sim;
pub mod snapshot;

pub use error::{Result, SimError};
pub use leaderboard::Leaderboard;
pub use settings::{BoundaryMode, DropPolicy, GrowthMode, PathPolicy, Settings};

use glam::Vec2;
use std::f32::consts::{PI, TAU};

/// Game configuration constants
pub mod consts {
    /// Simulation rate
    pub const TICK_RATE_HZ: u32 = 60;
    /// Fixed simulation timestep (seconds)
    pub const SIM_DT: f32 = 1.0 / TICK_RATE_HZ as f32;
    /// Maximum substeps per clock callback before debt is dropped
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 3000.0;
    pub const ARENA_HEIGHT: f32 = 3000.0;
    /// Thickness of the boundary colliders outside each edge
    pub const WALL_WIDTH: f32 = 50.0;
    /// Broad-phase grid cell size
    pub const GRID_CELL_SIZE: f32 = 128.0;

    /// Radii at scale 1.0
    pub const HEAD_RADIUS: f32 = 10.0;
    pub const BODY_RADIUS: f32 = 9.0;
    pub const FOOD_RADIUS: f32 = 8.0;

    /// Head speed (units/second); 3.5 and 5 units per tick at 60 Hz
    pub const BASE_SPEED: f32 = 210.0;
    pub const BOOST_SPEED: f32 = 300.0;
    /// Maximum heading change (radians/second)
    pub const TURN_RATE: f32 = 6.0;

    /// Segment spacing at scale 1.0
    pub const BASE_SPACING: f32 = 17.0;
    /// Growth scale: starts at BASE_SCALE, grows per extra segment, capped
    pub const BASE_SCALE: f32 = 1.4;
    pub const SCALE_PER_SEGMENT: f32 = 0.01;
    pub const MAX_SCALE: f32 = 2.4;
    /// Buffer samples between segments in uniform-stride mode
    pub const UNIFORM_STRIDE: usize = 7;

    /// Snake length on spawn
    pub const INITIAL_LENGTH: usize = 3;
    /// Boost shrinking and `shrink()` stop here
    pub const MIN_SNAKE_LENGTH: usize = 2;

    /// Grace period after spawn (3 seconds)
    pub const SPAWN_COOLDOWN_TICKS: u32 = 3 * TICK_RATE_HZ;
    /// Boosting sheds one segment this often
    pub const BOOST_SHRINK_INTERVAL_MS: u32 = 300;

    pub const MAX_CLIENTS_PER_ROOM: usize = 50;

    /// One whole token in micro-tokens
    pub const MICROS_PER_TOKEN: u64 = 1_000_000;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= PI { wrapped - TAU } else { wrapped }
}

/// Signed delta from `from` to `to` along the shorter circular arc, in [-π, π)
#[inline]
pub fn shortest_arc(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Step `current` toward `target` by at most `max_step` radians via the shorter arc
pub fn rotate_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = shortest_arc(current, target);
    let max_step = max_step.abs();
    if delta.abs() <= max_step {
        normalize_angle(target)
    } else {
        normalize_angle(current + max_step * delta.signum())
    }
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Velocity vector for a heading (radians) at a given speed
#[inline]
pub fn velocity_from_angle(angle: f32, speed: f32) -> Vec2 {
    Vec2::from_angle(angle) * speed
}

/// Heading (radians) pointing from `from` toward `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
