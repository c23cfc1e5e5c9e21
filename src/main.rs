//! Snake Stake headless driver
//!
//! Runs one room with a handful of food-seeking bots against the wall clock,
//! logging events and the leaderboard. Usage: `snake-stake [settings.json]`

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use snake_stake::input::{self, InputMessage};
use snake_stake::session::LoggingService;
use snake_stake::sim::{FixedClock, GameEvent, JoinRequest, MicroTokens, Room, SnakeId, tick};
use snake_stake::{Settings, angle_between};

const DEMO_SECONDS: u64 = 30;
const BOT_COUNT: usize = 8;
const ROOM_BUDGET_TOKENS: u64 = 2_000;
const BOT_STAKE_TOKENS: u64 = 25;
const SEED: u64 = 0x5eed;

fn main() {
    env_logger::init();
    log::info!("Snake Stake (headless) starting...");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> snake_stake::Result<()> {
    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let mut clock = FixedClock::from_settings(&settings);
    let mut room = Room::new(settings, SEED, MicroTokens::from_tokens(ROOM_BUDGET_TOKENS));
    let mut service = LoggingService::default();
    let mut rng = Pcg32::seed_from_u64(SEED ^ 0xb075);
    let mut spawned = 0;

    for _ in 0..BOT_COUNT {
        join_bot(&mut room, &mut spawned)?;
    }

    let start = Instant::now();
    let mut last = start;
    let mut last_report = start;

    while start.elapsed() < Duration::from_secs(DEMO_SECONDS) {
        let now = Instant::now();
        let elapsed = (now - last).as_secs_f32().min(0.25);
        last = now;

        steer_bots(&mut room, &mut rng);
        clock.advance(elapsed, |dt| tick(&mut room, dt));

        for event in room.drain_events() {
            match event {
                GameEvent::GameOver(stats) => {
                    log::info!(
                        "{} is out ({:?}) with score {}, {} kills",
                        stats.nickname,
                        stats.cause,
                        stats.score,
                        stats.kills
                    );
                    join_bot(&mut room, &mut spawned)?;
                }
                GameEvent::Killed { victim, killer } => {
                    log::debug!("{:?} killed {:?}", killer, victim);
                }
                _ => {}
            }
        }
        room.outbox.flush(&mut service);

        if now - last_report >= Duration::from_secs(5) {
            last_report = now;
            log_leaderboard(&room);
        }

        std::thread::sleep(Duration::from_millis(4));
    }

    log_leaderboard(&room);
    let unconsumed = room.dispose();
    let summary = room.outbox.flush(&mut service);
    log::info!(
        "Done after {} ticks: {} unconsumed tokens, {} reports delivered",
        clock.ticks(),
        unconsumed,
        summary.delivered
    );
    Ok(())
}

fn join_bot(room: &mut Room, spawned: &mut usize) -> snake_stake::Result<SnakeId> {
    *spawned += 1;
    room.join(JoinRequest {
        nickname: format!("bot-{}", spawned),
        skin: ["green", "blue", "orange"][*spawned % 3].to_string(),
        account: format!("demo-{}", spawned),
        stake: MicroTokens::from_tokens(BOT_STAKE_TOKENS),
    })
}

/// Head for the nearest food; boost now and then. Inputs go through the same
/// JSON decoding a network client's would.
fn steer_bots(room: &mut Room, rng: &mut Pcg32) {
    let orders: Vec<(SnakeId, String)> = room
        .snakes
        .values()
        .filter_map(|snake| {
            let target = room
                .food
                .iter()
                .min_by(|a, b| {
                    a.pos
                        .distance_squared(snake.pos)
                        .total_cmp(&b.pos.distance_squared(snake.pos))
                })
                .map(|f| f.pos)?;
            let heading = angle_between(snake.pos, target) + rng.random_range(-0.2..0.2);
            Some((snake.id, format!(r#"{{"type":"steer","heading":{}}}"#, heading)))
        })
        .collect();

    for (id, raw) in orders {
        let result = input::decode(&raw).and_then(|message| message.apply(room, id));
        if let Err(e) = result {
            log::debug!("Dropped input for {:?}: {}", id, e);
        }
        if rng.random_bool(0.01) {
            let on = rng.random_bool(0.3);
            if let Err(e) = (InputMessage::Speed { on }).apply(room, id) {
                log::debug!("Dropped boost for {:?}: {}", id, e);
            }
        }
    }
}

fn log_leaderboard(room: &Room) {
    for entry in room.leaderboard.top(5) {
        log::info!(
            "#{} {:<8} tokens={} length={} kills={}",
            entry.rank,
            entry.nickname,
            entry.tokens,
            entry.length,
            entry.kills
        );
    }
}
