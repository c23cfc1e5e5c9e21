//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, one per room
//! - Stable iteration order (by snake/food/body id)
//! - No I/O; reports to outside services are queued, never sent

pub mod clock;
pub mod collision;
pub mod economy;
pub mod path;
pub mod sdf;
pub mod snake;
pub mod state;
pub mod tick;
pub mod world;

pub use clock::FixedClock;
pub use collision::{Contact, Resolution, classify, resolve};
pub use economy::{FoodId, FoodItem, FoodKind, FoodLedger, MicroTokens, ValueTable};
pub use path::{PathPoint, TrailPath};
pub use snake::{Snake, SnakeId, SnakePhase};
pub use state::{DeathCause, FinalStats, GameEvent, JoinRequest, Room};
pub use tick::tick;
pub use world::{Arena, BodyHandle, CollisionEvent, World};
