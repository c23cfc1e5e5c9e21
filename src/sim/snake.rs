//! Snake entity
//!
//! Per-player kinematics, growth and the segment list. The head moves
//! continuously; segments are read back from the trailing-path buffer each
//! tick and their bodies in the world follow.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::economy::MicroTokens;
use super::path::{Placement, TrailPath};
use super::world::{Body, BodyHandle, BodyKind, CollisionFilter, World};
use crate::error::{Result, SimError};
use crate::settings::{GrowthMode, PathPolicy, Settings};
use crate::{angle_between, normalize_angle, rotate_toward, velocity_from_angle};

/// Snake identifier (one per joined player)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnakeId(pub u64);

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnakePhase {
    /// Spawn grace period; combat is ignored
    Spawning { ticks_left: u32 },
    Active,
    /// Boosting; one segment is shed every `shrink_interval` ticks
    Speeding { shrink_in: u32 },
    Destroyed,
}

/// Who is behind a snake
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnakeProfile {
    pub nickname: String,
    pub skin: String,
    /// Account reference from the session service
    pub account: String,
    pub stake: MicroTokens,
}

/// A trailing body part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub pos: Vec2,
    pub angle: f32,
    pub body: BodyHandle,
}

/// What happened during one `advance`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdvanceReport {
    /// Tail position shed while speeding
    pub ejected: Option<Vec2>,
    pub appended: u32,
    pub cycle_completed: bool,
    pub starved: bool,
}

/// A player's snake
#[derive(Debug, Clone)]
pub struct Snake {
    pub id: SnakeId,
    pub profile: SnakeProfile,
    pub pos: Vec2,
    pub angle: f32,
    pub speed: f32,
    /// Growth scale; drives spacing and radii
    pub scale: f32,
    pub score: u64,
    pub kills: u32,
    pub tokens: MicroTokens,
    pub rank: u32,
    /// Segments waiting to be appended
    pub pending_appends: u32,
    pub spawned_tick: u64,

    phase: SnakePhase,
    length: usize,
    head: BodyHandle,
    segments: Vec<Segment>,
    path: TrailPath,
    indices: Vec<usize>,
    /// Ticks since the current cycle began; also the anchor's path index
    cycle_ticks: usize,

    queued_heading: Option<f32>,
    target_heading: f32,
    queued_boost: Option<bool>,
    wants_boost: bool,

    path_policy: PathPolicy,
    growth_mode: GrowthMode,
}

impl Snake {
    /// Create a snake and register its bodies with the world
    pub fn spawn(
        id: SnakeId,
        profile: SnakeProfile,
        pos: Vec2,
        angle: f32,
        settings: &Settings,
        world: &mut World,
        tick: u64,
    ) -> Self {
        let angle = normalize_angle(angle);
        let scale = settings.base_scale;
        let length = settings.initial_length;
        let step = (settings.base_speed * settings.tick_dt()).max(0.1);
        let spacing = settings.base_spacing * scale;

        let samples = match settings.path_policy {
            PathPolicy::UniformStride => length * settings.uniform_stride,
            PathPolicy::ArcLength => ((length as f32 + 1.0) * spacing / step).ceil() as usize + 2,
        };
        let path = TrailPath::seeded_line(pos, angle, step, samples);

        let head = world.add_body(Body::circle(
            pos,
            settings.head_radius,
            BodyKind::Head { snake: id },
            CollisionFilter::head(id),
        ));
        world.scale_body(head, scale);

        let phase = if settings.spawn_cooldown_ticks > 0 {
            SnakePhase::Spawning {
                ticks_left: settings.spawn_cooldown_ticks,
            }
        } else {
            SnakePhase::Active
        };

        let mut snake = Self {
            id,
            profile,
            pos,
            angle,
            speed: settings.base_speed,
            scale,
            score: 0,
            kills: 0,
            tokens: MicroTokens::ZERO,
            rank: 0,
            pending_appends: 0,
            spawned_tick: tick,
            phase,
            length: 0,
            head,
            segments: Vec::with_capacity(length),
            path,
            indices: Vec::with_capacity(length),
            cycle_ticks: 0,
            queued_heading: None,
            target_heading: angle,
            queued_boost: None,
            wants_boost: false,
            path_policy: settings.path_policy,
            growth_mode: settings.growth_mode,
        };

        for _ in 0..length {
            snake.append_segment(pos, settings, world);
        }
        snake.place_segments(settings, world);
        snake
    }

    // === Input ===

    /// Queue a desired heading (radians); last value before the tick wins
    pub fn steer(&mut self, heading: f32) -> Result<()> {
        if !heading.is_finite() {
            return Err(SimError::InvalidInput(format!("heading {heading}")));
        }
        self.queued_heading = Some(normalize_angle(heading));
        Ok(())
    }

    /// Queue a heading that points at a world position
    pub fn steer_toward(&mut self, target: Vec2) -> Result<()> {
        if !target.is_finite() {
            return Err(SimError::InvalidInput(format!("target {target}")));
        }
        self.steer(angle_between(self.pos, target))
    }

    /// Queue a speed-boost toggle
    pub fn set_boost(&mut self, on: bool) {
        self.queued_boost = Some(on);
    }

    /// Face a point immediately, dropping any queued heading
    pub fn redirect_toward(&mut self, point: Vec2) {
        self.angle = angle_between(self.pos, point);
        self.target_heading = self.angle;
        self.queued_heading = None;
    }

    // === Growth ===

    /// Queue `n` segment appends
    pub fn grow(&mut self, n: u32) {
        self.pending_appends = self.pending_appends.saturating_add(n);
    }

    /// Remove the tail segment, returning where it was
    ///
    /// No-op at or below the minimum length.
    pub fn shrink(&mut self, settings: &Settings, world: &mut World) -> Option<Vec2> {
        if self.is_destroyed() || self.length <= settings.min_length {
            return None;
        }
        let tail = self.segments.pop()?;
        world.remove_body(tail.body);
        self.length -= 1;
        if let Some(removed_index) = self.indices.pop() {
            self.path.truncate_after(removed_index);
        }
        self.rescale(settings, world);
        Some(tail.pos)
    }

    pub fn credit(&mut self, value: MicroTokens) {
        self.tokens += value;
    }

    /// Take up to `value` tokens, returning what was actually taken
    pub fn debit(&mut self, value: MicroTokens) -> MicroTokens {
        let taken = value.min(self.tokens);
        self.tokens = self.tokens.saturating_sub(taken);
        taken
    }

    // === Lifecycle ===

    /// Remove every body from the world
    ///
    /// Returns the former segment positions, or `None` if already destroyed.
    pub fn destroy(&mut self, world: &mut World) -> Option<Vec<Vec2>> {
        if self.is_destroyed() {
            return None;
        }
        world.remove_body(self.head);
        for segment in &self.segments {
            world.remove_body(segment.body);
        }
        self.phase = SnakePhase::Destroyed;
        self.pending_appends = 0;
        Some(self.segments.iter().map(|s| s.pos).collect())
    }

    /// One tick of motion
    pub fn advance(&mut self, dt: f32, settings: &Settings, world: &mut World) -> AdvanceReport {
        let mut report = AdvanceReport::default();
        if self.is_destroyed() {
            return report;
        }

        if let Some(heading) = self.queued_heading.take() {
            self.target_heading = heading;
        }
        if let Some(boost) = self.queued_boost.take() {
            self.wants_boost = boost;
        }
        self.update_phase(settings);

        self.speed = if self.is_speeding() {
            settings.boost_speed
        } else {
            settings.base_speed
        };
        self.angle = rotate_toward(self.angle, self.target_heading, settings.turn_rate * dt);
        self.pos += velocity_from_angle(self.angle, self.speed) * dt;
        world.set_position(self.head, self.pos);

        self.path.record(self.pos, self.angle);
        self.cycle_ticks += 1;
        report.starved = self.place_segments(settings, world);

        if self.length >= 2 && self.indices[1] <= self.cycle_ticks {
            self.cycle_ticks = 0;
            report.cycle_completed = true;
        }

        let drain = match self.growth_mode {
            GrowthMode::Staggered if report.cycle_completed => self.pending_appends.min(1),
            GrowthMode::Staggered => 0,
            GrowthMode::Immediate => self.pending_appends,
        };
        for _ in 0..drain {
            let tail = self.segments.last().map_or(self.pos, |s| s.pos);
            self.append_segment(tail, settings, world);
            self.pending_appends -= 1;
            report.appended += 1;
        }
        if drain > 0 {
            self.rescale(settings, world);
        }

        if let SnakePhase::Speeding { shrink_in } = self.phase {
            if shrink_in <= 1 {
                report.ejected = self.shrink(settings, world);
                self.phase = SnakePhase::Speeding {
                    shrink_in: settings.boost_shrink_ticks(),
                };
            } else {
                self.phase = SnakePhase::Speeding {
                    shrink_in: shrink_in - 1,
                };
            }
            if self.length <= settings.min_length {
                self.phase = SnakePhase::Active;
                self.wants_boost = false;
            }
        }

        debug_assert_eq!(self.length, self.segments.len());
        report
    }

    fn update_phase(&mut self, settings: &Settings) {
        self.phase = match self.phase {
            // Protection covers the collision pass of the tick that counts
            // down to zero
            SnakePhase::Spawning { ticks_left } if ticks_left > 0 => SnakePhase::Spawning {
                ticks_left: ticks_left - 1,
            },
            SnakePhase::Spawning { .. } => SnakePhase::Active,
            SnakePhase::Active if self.wants_boost && self.length > settings.min_length => {
                SnakePhase::Speeding {
                    shrink_in: settings.boost_shrink_ticks(),
                }
            }
            SnakePhase::Speeding { .. } if !self.wants_boost => SnakePhase::Active,
            phase => phase,
        };
    }

    fn append_segment(&mut self, pos: Vec2, settings: &Settings, world: &mut World) {
        let body = world.add_body(Body::circle(
            pos,
            settings.body_radius,
            BodyKind::Segment { snake: self.id },
            CollisionFilter::body(self.id),
        ));
        world.scale_body(body, self.scale);
        let angle = self.segments.last().map_or(self.angle, |s| s.angle);
        self.segments.push(Segment { pos, angle, body });
        if let Some(&last) = self.indices.last() {
            self.indices.push(last);
        }
        self.length += 1;
    }

    /// Recompute segment positions from the path; returns whether it starved
    fn place_segments(&mut self, settings: &Settings, world: &mut World) -> bool {
        let placement = match self.path_policy {
            PathPolicy::UniformStride => Placement::UniformStride {
                stride: settings.uniform_stride,
            },
            PathPolicy::ArcLength => Placement::ArcLength {
                preferred: self.preferred_distance(settings),
            },
        };
        let outcome = self.path.place(placement, self.length, &mut self.indices);
        if outcome.starved {
            log::trace!("Snake {:?} path starved at length {}", self.id, self.length);
        }

        for (segment, &index) in self.segments.iter_mut().zip(self.indices.iter()) {
            let point = self.path.clamped(index);
            segment.pos = point.pos;
            segment.angle = point.angle;
            world.set_position(segment.body, point.pos);
        }
        outcome.starved
    }

    fn rescale(&mut self, settings: &Settings, world: &mut World) {
        let extra = self.length.saturating_sub(settings.initial_length) as f32;
        let scale = (settings.base_scale + extra * settings.scale_per_segment)
            .min(settings.max_scale)
            .max(settings.base_scale);
        if (scale - self.scale).abs() <= f32::EPSILON {
            return;
        }
        self.scale = scale;
        world.scale_body(self.head, scale);
        for segment in &self.segments {
            world.scale_body(segment.body, scale);
        }
    }

    // === Queries ===

    pub fn phase(&self) -> SnakePhase {
        self.phase
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_positions(&self) -> Vec<Vec2> {
        self.segments.iter().map(|s| s.pos).collect()
    }

    pub fn head_body(&self) -> BodyHandle {
        self.head
    }

    pub fn path(&self) -> &TrailPath {
        &self.path
    }

    /// Buffer indices of the segments as of the last placement
    pub fn segment_indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn target_heading(&self) -> f32 {
        self.target_heading
    }

    pub fn preferred_distance(&self, settings: &Settings) -> f32 {
        settings.base_spacing * self.scale
    }

    pub fn is_alive(&self) -> bool {
        !self.is_destroyed()
    }

    pub fn is_destroyed(&self) -> bool {
        self.phase == SnakePhase::Destroyed
    }

    pub fn in_cooldown(&self) -> bool {
        matches!(self.phase, SnakePhase::Spawning { .. })
    }

    pub fn is_speeding(&self) -> bool {
        matches!(self.phase, SnakePhase::Speeding { .. })
    }
}
