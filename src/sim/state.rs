//! Room state
//!
//! A room is the explicit simulation context: settings, world, snakes, food
//! ledger, seeded RNG and the outgoing event/report queues. Everything a tick
//! touches lives here, so several rooms can run side by side.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::economy::{
    FoodId, FoodItem, FoodKind, FoodLedger, FoodSpawn, MicroTokens, food_scale,
    generate_from_budget, place_along_body,
};
use super::snake::{Snake, SnakeId, SnakeProfile};
use super::world::{Arena, Body, BodyKind, CollisionFilter, World};
use crate::angle_between;
use crate::error::{Result, SimError};
use crate::leaderboard::Leaderboard;
use crate::session::{Report, ReportOutbox, SessionReport};
use crate::settings::{DropPolicy, Settings};

/// Why a snake left the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Ran into another snake's body
    Collision { killer: SnakeId },
    Boundary,
    /// Player disconnected
    Left,
    /// Room torn down while still alive
    RoomClosed,
}

/// Stats reported when a snake's session ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalStats {
    pub snake: SnakeId,
    pub nickname: String,
    pub score: u64,
    pub kills: u32,
    /// Tokens the player takes out of the room; zero on death
    pub tokens: MicroTokens,
    /// Tokens left behind in the arena as food
    pub dropped: MicroTokens,
    pub rank: u32,
    pub length: usize,
    pub survived_ticks: u64,
    pub cause: DeathCause,
}

/// Events for the network layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Joined { snake: SnakeId, nickname: String },
    FoodEaten { snake: SnakeId, food: FoodId, value: MicroTokens },
    Ejected { snake: SnakeId, food: FoodId, value: MicroTokens },
    Killed { victim: SnakeId, killer: SnakeId },
    /// One per snake, on destroy
    GameOver(FinalStats),
}

/// A player asking to join
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub nickname: String,
    pub skin: String,
    pub account: String,
    pub stake: MicroTokens,
}

/// One simulated arena
#[derive(Debug)]
pub struct Room {
    pub settings: Settings,
    pub arena: Arena,
    pub world: World,
    /// Alive snakes, iterated in id order
    pub snakes: BTreeMap<SnakeId, Snake>,
    pub food: FoodLedger,
    pub leaderboard: Leaderboard,
    pub outbox: ReportOutbox,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub(crate) rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
    pub(crate) pending_leaves: Vec<SnakeId>,
    /// Budget too small to become food
    reserve: MicroTokens,
    total_staked: MicroTokens,
    /// Cashed out by players who left or outlived the room
    paid_out: MicroTokens,
    next_snake_id: u64,
    next_food_id: u64,
    disposed: bool,
}

impl Room {
    /// Create a room and convert its starting budget into food
    pub fn new(settings: Settings, seed: u64, budget: MicroTokens) -> Self {
        let arena = Arena::new(settings.arena_width, settings.arena_height, settings.wall_width);
        let mut world = World::new(&arena, settings.grid_cell_size);
        for wall in arena.boundary_bodies() {
            world.add_body(wall);
        }

        let mut room = Self {
            settings,
            arena,
            world,
            snakes: BTreeMap::new(),
            food: FoodLedger::new(),
            leaderboard: Leaderboard::new(),
            outbox: ReportOutbox::default(),
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
            pending_leaves: Vec::new(),
            reserve: MicroTokens::ZERO,
            total_staked: MicroTokens::ZERO,
            paid_out: MicroTokens::ZERO,
            next_snake_id: 1,
            next_food_id: 1,
            disposed: false,
        };
        room.fund(budget);
        log::info!(
            "Room created: {}x{} arena, {} food worth {} tokens",
            room.arena.width,
            room.arena.height,
            room.food.len(),
            room.food.total()
        );
        room
    }

    // === Players ===

    /// Add a player at a random spot, facing the centre
    pub fn join(&mut self, request: JoinRequest) -> Result<SnakeId> {
        let pos = self.arena.random_point(&mut self.rng);
        let angle = angle_between(pos, self.arena.center());
        self.join_at(request, pos, angle)
    }

    /// Add a player at a given pose; their stake becomes food in the arena
    pub fn join_at(&mut self, request: JoinRequest, pos: Vec2, angle: f32) -> Result<SnakeId> {
        if self.disposed {
            return Err(SimError::InvalidInput("room is closed".into()));
        }
        if self.snakes.len() >= self.settings.max_players {
            return Err(SimError::RoomFull(self.settings.max_players));
        }

        if !pos.is_finite() || !angle.is_finite() {
            return Err(SimError::InvalidInput(format!("spawn pose {pos} {angle}")));
        }

        let id = SnakeId(self.next_snake_id);
        self.next_snake_id += 1;
        let profile = SnakeProfile {
            nickname: request.nickname,
            skin: request.skin,
            account: request.account,
            stake: request.stake,
        };
        let snake = Snake::spawn(
            id,
            profile,
            pos,
            angle,
            &self.settings,
            &mut self.world,
            self.time_ticks,
        );
        log::info!("Snake {:?} ({}) joined with stake {}", id, snake.profile.nickname, request.stake);
        self.events.push(GameEvent::Joined {
            snake: id,
            nickname: snake.profile.nickname.clone(),
        });
        self.snakes.insert(id, snake);

        self.fund(request.stake);
        Ok(id)
    }

    /// Queue a disconnect; the snake is destroyed at the start of the next tick
    pub fn leave(&mut self, id: SnakeId) -> Result<()> {
        if !self.snakes.contains_key(&id) {
            return Err(SimError::UnknownSnake(id));
        }
        if !self.pending_leaves.contains(&id) {
            self.pending_leaves.push(id);
        }
        Ok(())
    }

    pub fn steer(&mut self, id: SnakeId, heading: f32) -> Result<()> {
        self.snake_mut(id)?.steer(heading)
    }

    pub fn steer_toward(&mut self, id: SnakeId, target: Vec2) -> Result<()> {
        self.snake_mut(id)?.steer_toward(target)
    }

    pub fn set_boost(&mut self, id: SnakeId, on: bool) -> Result<()> {
        self.snake_mut(id)?.set_boost(on);
        Ok(())
    }

    pub fn snake(&self, id: SnakeId) -> Option<&Snake> {
        self.snakes.get(&id)
    }

    fn snake_mut(&mut self, id: SnakeId) -> Result<&mut Snake> {
        self.snakes.get_mut(&id).ok_or(SimError::UnknownSnake(id))
    }

    /// Remove a snake from play
    ///
    /// A player who leaves cashes out the tokens they hold; any other cause
    /// drops them into the arena as food. Returns `false` if the snake is
    /// already gone.
    pub fn destroy_snake(&mut self, id: SnakeId, cause: DeathCause) -> bool {
        let Some(mut snake) = self.snakes.remove(&id) else {
            log::trace!("Ignoring duplicate destroy of {:?}", id);
            return false;
        };
        let Some(positions) = snake.destroy(&mut self.world) else {
            return false;
        };
        self.pending_leaves.retain(|&pending| pending != id);

        let held = std::mem::take(&mut snake.tokens);
        let (cashed, dropped) = if cause == DeathCause::Left {
            self.paid_out += held;
            log::info!("Snake {:?} left with {} tokens", id, held);
            (held, MicroTokens::ZERO)
        } else {
            let count = self.drop_tokens(held, &positions);
            log::info!(
                "Snake {:?} destroyed ({:?}): length {}, {} tokens dropped as {} food",
                id,
                cause,
                snake.length(),
                held,
                count
            );
            (MicroTokens::ZERO, held)
        };

        let stats = self.final_stats(&snake, cause, cashed, dropped);
        if let DeathCause::Collision { killer } = cause {
            self.events.push(GameEvent::Killed { victim: id, killer });
        }
        self.events.push(GameEvent::GameOver(stats.clone()));
        self.outbox.push(Report::EndSession(SessionReport {
            account: snake.profile.account,
            stats,
        }));
        true
    }

    fn final_stats(
        &self,
        snake: &Snake,
        cause: DeathCause,
        tokens: MicroTokens,
        dropped: MicroTokens,
    ) -> FinalStats {
        FinalStats {
            snake: snake.id,
            nickname: snake.profile.nickname.clone(),
            score: snake.score,
            kills: snake.kills,
            tokens,
            dropped,
            rank: snake.rank,
            length: snake.length(),
            survived_ticks: self.time_ticks.saturating_sub(snake.spawned_tick),
            cause,
        }
    }

    // === Economy ===

    /// Convert a stake (plus any reserve) into food scattered over the arena
    fn fund(&mut self, amount: MicroTokens) {
        self.total_staked += amount;
        let budget = amount + std::mem::take(&mut self.reserve);
        let generation = generate_from_budget(budget, &self.settings.food_values, &mut self.rng);
        for spawn in generation.items {
            let pos = self.arena.random_point(&mut self.rng);
            self.spawn_food(spawn, pos);
        }
        self.reserve += generation.remainder;
    }

    /// Convert a dead snake's tokens into food; returns how many were placed
    fn drop_tokens(&mut self, tokens: MicroTokens, positions: &[Vec2]) -> usize {
        let generation = generate_from_budget(tokens, &self.settings.food_values, &mut self.rng);
        let count = generation.items.len();
        let spots = match self.settings.drop_policy {
            DropPolicy::AlongBody => place_along_body(count, positions, &self.arena, &mut self.rng),
            DropPolicy::Scatter => (0..count)
                .map(|_| self.arena.random_point(&mut self.rng))
                .collect(),
        };
        for (spawn, pos) in generation.items.into_iter().zip(spots) {
            self.spawn_food(spawn, pos);
        }
        self.reserve += generation.remainder;
        count
    }

    /// Turn a boost-ejected tail into one piece of the cheapest food
    ///
    /// Valued at the cheapest kind or whatever the snake has left, whichever
    /// is smaller, and paid for by the snake.
    pub fn eject_food(&mut self, id: SnakeId, pos: Vec2) -> Option<FoodId> {
        let (kind, cheapest) = self
            .settings
            .food_values
            .cheapest()
            .map(|entry| (entry.kind, entry.value))?;
        let snake = self.snakes.get_mut(&id)?;
        let value = snake.debit(cheapest);
        if value.is_zero() {
            return None;
        }
        let scale = food_scale(kind, &mut self.rng);
        let food = self.spawn_food(FoodSpawn { kind, value, scale }, self.arena.clamp_inside(pos));
        self.events.push(GameEvent::Ejected { snake: id, food, value });
        Some(food)
    }

    /// Register a food item with the world and the ledger
    pub fn spawn_food(&mut self, spawn: FoodSpawn, pos: Vec2) -> FoodId {
        let id = FoodId(self.next_food_id);
        self.next_food_id += 1;
        let body = self.world.add_body(Body::circle(
            pos,
            self.settings.food_radius,
            BodyKind::Food { food: id },
            CollisionFilter::food(),
        ));
        self.world.scale_body(body, spawn.scale);
        self.food.insert(FoodItem {
            id,
            pos,
            kind: spawn.kind,
            value: spawn.value,
            scale: spawn.scale,
            body,
        });
        id
    }

    /// Take a food item out of the world and the ledger
    pub fn remove_food(&mut self, id: FoodId) -> Option<FoodItem> {
        let item = self.food.remove(id)?;
        self.world.remove_body(item.body);
        Some(item)
    }

    /// Place one food of `kind` at `pos`, valued from the table
    pub fn spawn_food_of_kind(&mut self, kind: FoodKind, pos: Vec2) -> Option<FoodId> {
        let value = self.settings.food_values.value_of(kind)?;
        let scale = food_scale(kind, &mut self.rng);
        Some(self.spawn_food(FoodSpawn { kind, value, scale }, pos))
    }

    /// Tokens held outside the ledger because they were too small to convert
    pub fn reserve(&self) -> MicroTokens {
        self.reserve
    }

    /// Everything ever staked into the room, starting budget included
    pub fn total_staked(&self) -> MicroTokens {
        self.total_staked
    }

    /// Tokens players have taken out of the room
    pub fn paid_out(&self) -> MicroTokens {
        self.paid_out
    }

    /// Food + alive snakes + reserve
    ///
    /// Together with [`Room::paid_out`] this equals `total_staked` at tick
    /// boundaries.
    pub fn accounted_tokens(&self) -> MicroTokens {
        self.food.total() + self.snakes.values().map(|s| s.tokens).sum::<MicroTokens>() + self.reserve
    }

    // === Lifecycle ===

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Tear the room down
    ///
    /// Alive snakes cash out what they hold; the food ledger and reserve are
    /// queued for restoration. Returns the whole unconsumed budget. A second
    /// call returns zero.
    pub fn dispose(&mut self) -> MicroTokens {
        if self.disposed {
            return MicroTokens::ZERO;
        }
        self.disposed = true;

        let mut held = MicroTokens::ZERO;
        for (_, mut snake) in std::mem::take(&mut self.snakes) {
            snake.destroy(&mut self.world);
            let tokens = std::mem::take(&mut snake.tokens);
            held += tokens;
            let stats = self.final_stats(&snake, DeathCause::RoomClosed, tokens, MicroTokens::ZERO);
            self.events.push(GameEvent::GameOver(stats.clone()));
            self.outbox.push(Report::EndSession(SessionReport {
                account: snake.profile.account,
                stats,
            }));
        }
        self.paid_out += held;
        self.pending_leaves.clear();

        let unspent = self.food.total() + std::mem::take(&mut self.reserve);
        for item in self.food.drain() {
            self.world.remove_body(item.body);
        }
        self.outbox.push(Report::RestoreRoomTokens { amount: unspent });
        log::info!(
            "Room disposed: restoring {} tokens, {} held by players",
            unspent,
            held
        );
        unspent + held
    }
}
