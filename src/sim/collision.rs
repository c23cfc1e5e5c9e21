//! Collision classification and response
//!
//! Overlap events from the world are turned into gameplay contacts (eat,
//! hit a wall, hit another snake) and applied to the room one at a time.
//! Classification happens at resolve time, so an event whose bodies were
//! removed by an earlier resolution in the same tick is discarded.

use super::economy::{FoodId, MicroTokens};
use super::snake::SnakeId;
use super::state::{DeathCause, GameEvent, Room};
use super::world::{BodyKind, CollisionEvent, World};
use crate::settings::BoundaryMode;

/// A gameplay-relevant contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    Food { snake: SnakeId, food: FoodId },
    Boundary { snake: SnakeId },
    /// `head`'s head touched a segment of `body`
    Body { head: SnakeId, body: SnakeId },
}

/// What resolving a contact did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Ignored,
    Ate { value: MicroTokens },
    Redirected,
    Destroyed { victim: SnakeId },
}

/// Classify an overlap; `None` for stale events and pairs with no gameplay effect
pub fn classify(world: &World, event: CollisionEvent) -> Option<Contact> {
    let a = world.get(event.a)?.kind;
    let b = world.get(event.b)?.kind;
    classify_kinds(a, b).or_else(|| classify_kinds(b, a))
}

fn classify_kinds(a: BodyKind, b: BodyKind) -> Option<Contact> {
    match (a, b) {
        (BodyKind::Head { snake }, BodyKind::Food { food }) => Some(Contact::Food { snake, food }),
        (BodyKind::Head { snake }, BodyKind::Boundary { .. }) => Some(Contact::Boundary { snake }),
        (BodyKind::Head { snake: head }, BodyKind::Segment { snake: body }) if head != body => {
            Some(Contact::Body { head, body })
        }
        // Head-on contact goes through the segment 0 each head carries
        _ => None,
    }
}

/// Apply one contact to the room
pub fn resolve(room: &mut Room, contact: Contact) -> Resolution {
    match contact {
        Contact::Food { snake, food } => eat(room, snake, food),
        Contact::Boundary { snake } => hit_boundary(room, snake),
        Contact::Body { head, body } => hit_body(room, head, body),
    }
}

fn eat(room: &mut Room, snake: SnakeId, food: FoodId) -> Resolution {
    if !room.snakes.contains_key(&snake) {
        return Resolution::Ignored;
    }
    let Some(item) = room.remove_food(food) else {
        return Resolution::Ignored;
    };
    if let Some(eater) = room.snakes.get_mut(&snake) {
        eater.credit(item.value);
        eater.grow(1);
        eater.score += 1;
    }
    room.events.push(GameEvent::FoodEaten {
        snake,
        food,
        value: item.value,
    });
    Resolution::Ate { value: item.value }
}

fn hit_boundary(room: &mut Room, snake: SnakeId) -> Resolution {
    match room.settings.boundary_mode {
        BoundaryMode::Hard => {
            if room.destroy_snake(snake, DeathCause::Boundary) {
                Resolution::Destroyed { victim: snake }
            } else {
                Resolution::Ignored
            }
        }
        BoundaryMode::Safe => {
            let center = room.arena.center();
            match room.snakes.get_mut(&snake) {
                Some(s) => {
                    s.redirect_toward(center);
                    log::debug!("Snake {:?} turned back from the boundary", snake);
                    Resolution::Redirected
                }
                None => Resolution::Ignored,
            }
        }
    }
}

fn hit_body(room: &mut Room, head: SnakeId, body: SnakeId) -> Resolution {
    if head == body {
        return Resolution::Ignored;
    }
    let (Some(attacker), Some(defender)) = (room.snakes.get(&head), room.snakes.get(&body)) else {
        return Resolution::Ignored;
    };
    if attacker.in_cooldown() || defender.in_cooldown() {
        return Resolution::Ignored;
    }

    if !room.destroy_snake(head, DeathCause::Collision { killer: body }) {
        return Resolution::Ignored;
    }
    if let Some(killer) = room.snakes.get_mut(&body) {
        killer.kills += 1;
    }
    Resolution::Destroyed { victim: head }
}
