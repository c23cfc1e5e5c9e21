//! Room snapshots
//!
//! Plain-data view of a room for replication to clients. Versioned so older
//! clients can reject a layout they do not understand.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::leaderboard::{LeaderboardEntry, SNAPSHOT_TOP};
use crate::sim::economy::{FoodId, FoodKind, MicroTokens};
use crate::sim::snake::SnakeId;
use crate::sim::state::Room;

/// Current snapshot layout
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnakeView {
    pub id: SnakeId,
    pub pos: Vec2,
    pub angle: f32,
    pub length: usize,
    pub segments: Vec<Vec2>,
    pub score: u64,
    pub kills: u32,
    pub tokens: MicroTokens,
    pub rank: u32,
    pub speeding: bool,
    pub cooldown: bool,
    pub nickname: String,
    pub skin: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodView {
    pub id: FoodId,
    pub pos: Vec2,
    pub kind: FoodKind,
    pub scale: f32,
    pub value: MicroTokens,
}

/// Everything a client needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub version: u32,
    pub tick: u64,
    pub snakes: Vec<SnakeView>,
    pub food: Vec<FoodView>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl RoomSnapshot {
    pub fn capture(room: &Room) -> Self {
        let snakes = room
            .snakes
            .values()
            .map(|s| SnakeView {
                id: s.id,
                pos: s.pos,
                angle: s.angle,
                length: s.length(),
                segments: s.segment_positions(),
                score: s.score,
                kills: s.kills,
                tokens: s.tokens,
                rank: s.rank,
                speeding: s.is_speeding(),
                cooldown: s.in_cooldown(),
                nickname: s.profile.nickname.clone(),
                skin: s.profile.skin.clone(),
            })
            .collect();
        let food = room
            .food
            .iter()
            .map(|f| FoodView {
                id: f.id,
                pos: f.pos,
                kind: f.kind,
                scale: f.scale,
                value: f.value,
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            tick: room.time_ticks,
            snakes,
            food,
            leaderboard: room.leaderboard.top(SNAPSHOT_TOP).to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse, rejecting unknown versions
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: RoomSnapshot = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SimError::InvalidInput(format!(
                "snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::consts::SIM_DT;
    use crate::sim::state::JoinRequest;
    use crate::sim::tick::tick;

    fn room() -> Room {
        let mut room = Room::new(Settings::default(), 3, MicroTokens::from_tokens(40));
        room.join(JoinRequest {
            nickname: "ana".into(),
            skin: "blue".into(),
            ..Default::default()
        })
        .expect("space");
        tick(&mut room, SIM_DT);
        room
    }

    #[test]
    fn test_capture_contents() {
        let room = room();
        let snapshot = RoomSnapshot::capture(&room);
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.snakes.len(), 1);

        let snake = &snapshot.snakes[0];
        assert_eq!(snake.nickname, "ana");
        assert_eq!(snake.skin, "blue");
        assert_eq!(snake.segments.len(), snake.length);
        assert!(snake.cooldown);
        assert_eq!(snake.rank, 1);

        let food_total: MicroTokens = snapshot.food.iter().map(|f| f.value).sum();
        assert_eq!(food_total, room.food.total());
        assert_eq!(snapshot.leaderboard.len(), 1);
    }

    #[test]
    fn test_json_round_trip_and_version_check() {
        let snapshot = RoomSnapshot::capture(&room());
        let json = snapshot.to_json().expect("serializable");
        assert_eq!(RoomSnapshot::from_json(&json).expect("same version"), snapshot);

        let mut future = snapshot;
        future.version = SNAPSHOT_VERSION + 1;
        let json = future.to_json().expect("serializable");
        assert!(matches!(RoomSnapshot::from_json(&json), Err(SimError::InvalidInput(_))));
        assert!(matches!(RoomSnapshot::from_json("{}"), Err(SimError::Config(_))));
    }
}
