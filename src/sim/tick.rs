//! Fixed timestep simulation tick
//!
//! One step of a room: queued leaves, snake movement, boundary checks, the
//! broad phase and collision resolution, then ranking.

use glam::Vec2;

use super::collision::{Contact, classify, resolve};
use super::snake::SnakeId;
use super::state::{DeathCause, Room};
use super::world::CollisionEvent;

/// Advance the room by one fixed timestep
pub fn tick(room: &mut Room, dt: f32) {
    if room.is_disposed() {
        return;
    }

    // Disconnects queued since the last tick
    for id in std::mem::take(&mut room.pending_leaves) {
        room.destroy_snake(id, DeathCause::Left);
    }

    // Movement, in id order
    let mut ejected: Vec<(SnakeId, Vec2)> = Vec::new();
    for (&id, snake) in room.snakes.iter_mut() {
        let report = snake.advance(dt, &room.settings, &mut room.world);
        if let Some(pos) = report.ejected {
            ejected.push((id, pos));
        }
    }
    for (id, pos) in ejected {
        room.eject_food(id, pos);
    }

    // Heads past the edge count as touching the wall even if they skipped
    // over the collider
    let outside: Vec<SnakeId> = room
        .snakes
        .values()
        .filter(|s| !room.arena.contains(s.pos))
        .map(|s| s.id)
        .collect();
    for snake in outside {
        resolve(room, Contact::Boundary { snake });
    }

    room.world.reindex();
    let events: Vec<CollisionEvent> = room.world.overlaps().collect();
    for event in events {
        if let Some(contact) = classify(&room.world, event) {
            resolve(room, contact);
        }
    }

    update_ranks(room);
    room.time_ticks += 1;
}

fn update_ranks(room: &mut Room) {
    room.leaderboard.rebuild(room.snakes.values());
    for entry in &room.leaderboard.entries {
        if let Some(snake) = room.snakes.get_mut(&entry.snake) {
            snake.rank = entry.rank;
        }
    }
}
