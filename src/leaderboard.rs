//! Live leaderboard
//!
//! Ranks the snakes of a room by tokens held, then length, then id. Rebuilt
//! once per tick.

use serde::{Deserialize, Serialize};

use crate::sim::economy::MicroTokens;
use crate::sim::snake::{Snake, SnakeId};

/// Entries included in snapshots
pub const SNAPSHOT_TOP: usize = 10;

/// One ranked snake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-indexed
    pub rank: u32,
    pub snake: SnakeId,
    pub nickname: String,
    pub tokens: MicroTokens,
    pub length: usize,
    pub score: u64,
    pub kills: u32,
}

/// Ranking of every alive snake, best first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Re-rank from scratch
    pub fn rebuild<'a>(&mut self, snakes: impl IntoIterator<Item = &'a Snake>) {
        self.entries.clear();
        self.entries.extend(snakes.into_iter().filter(|s| s.is_alive()).map(|s| {
            LeaderboardEntry {
                rank: 0,
                snake: s.id,
                nickname: s.profile.nickname.clone(),
                tokens: s.tokens,
                length: s.length(),
                score: s.score,
                kills: s.kills,
            }
        }));
        self.entries.sort_by(|a, b| {
            b.tokens
                .cmp(&a.tokens)
                .then(b.length.cmp(&a.length))
                .then(a.snake.cmp(&b.snake))
        });
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.rank = i as u32 + 1;
        }
    }

    /// Rank of a snake (1-indexed)
    pub fn rank_of(&self, snake: SnakeId) -> Option<u32> {
        self.entries.iter().find(|e| e.snake == snake).map(|e| e.rank)
    }

    pub fn top(&self, n: usize) -> &[LeaderboardEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn leader(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::sim::snake::SnakeProfile;
    use crate::sim::world::{Arena, World};
    use glam::Vec2;

    fn snakes(rows: &[(u64, u64)], settings: &Settings, world: &mut World) -> Vec<Snake> {
        rows.iter()
            .map(|&(id, tokens)| {
                let mut snake = Snake::spawn(
                    SnakeId(id),
                    SnakeProfile {
                        nickname: format!("p{id}"),
                        ..Default::default()
                    },
                    Vec2::new(500.0, 500.0),
                    0.0,
                    settings,
                    world,
                    0,
                );
                snake.tokens = MicroTokens::from_tokens(tokens);
                snake
            })
            .collect()
    }

    fn world() -> World {
        World::new(&Arena::new(1000.0, 1000.0, 50.0), 100.0)
    }

    #[test]
    fn test_empty_leaderboard() {
        let board = Leaderboard::new();
        assert!(board.is_empty());
        assert!(board.leader().is_none());
        assert!(board.top(5).is_empty());
    }

    #[test]
    fn test_ranks_by_tokens_then_id() {
        let snakes = snakes(&[(1, 5), (2, 50), (3, 5), (4, 0)], &Settings::default(), &mut world());
        let mut board = Leaderboard::new();
        board.rebuild(&snakes);

        let order: Vec<u64> = board.entries.iter().map(|e| e.snake.0).collect();
        assert_eq!(order, vec![2, 1, 3, 4]);
        assert_eq!(board.rank_of(SnakeId(2)), Some(1));
        assert_eq!(board.rank_of(SnakeId(4)), Some(4));
        assert_eq!(board.rank_of(SnakeId(9)), None);
        assert_eq!(board.top(2).len(), 2);
        assert_eq!(board.leader().map(|e| e.nickname.as_str()), Some("p2"));
    }

    #[test]
    fn test_longer_snake_wins_tie() {
        let settings = Settings {
            growth_mode: crate::GrowthMode::Immediate,
            spawn_cooldown_ticks: 0,
            ..Default::default()
        };
        let mut world = world();
        let mut snakes = snakes(&[(1, 5), (2, 5)], &settings, &mut world);
        snakes[1].grow(1);
        snakes[1].advance(settings.tick_dt(), &settings, &mut world);

        let mut board = Leaderboard::new();
        board.rebuild(&snakes);
        assert_eq!(board.leader().map(|e| e.snake), Some(SnakeId(2)));
    }
}
