//! Food/token economy
//!
//! Converts an integral token budget into food items and keeps the ledger of
//! food currently in the arena. All arithmetic is in whole micro-tokens.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use super::world::{Arena, BodyHandle};
use crate::consts::MICROS_PER_TOKEN;

/// Token amount in millionths of a token
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MicroTokens(pub u64);

impl MicroTokens {
    pub const ZERO: MicroTokens = MicroTokens(0);

    /// Whole tokens to micro-tokens
    pub const fn from_tokens(tokens: u64) -> Self {
        MicroTokens(tokens * MICROS_PER_TOKEN)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_sub(self, other: MicroTokens) -> MicroTokens {
        MicroTokens(self.0.saturating_sub(other.0))
    }

    pub fn checked_sub(self, other: MicroTokens) -> Option<MicroTokens> {
        self.0.checked_sub(other.0).map(MicroTokens)
    }
}

impl Add for MicroTokens {
    type Output = MicroTokens;

    fn add(self, rhs: MicroTokens) -> MicroTokens {
        MicroTokens(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for MicroTokens {
    fn add_assign(&mut self, rhs: MicroTokens) {
        *self = *self + rhs;
    }
}

impl Sum for MicroTokens {
    fn sum<I: Iterator<Item = MicroTokens>>(iter: I) -> Self {
        iter.fold(MicroTokens::ZERO, |acc, v| acc + v)
    }
}

impl fmt::Display for MicroTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / MICROS_PER_TOKEN;
        let frac = self.0 % MICROS_PER_TOKEN;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            write!(f, "{}.{:06}", whole, frac)
        }
    }
}

/// Food types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    Red,
    Blue,
    Green,
    Coin,
    Orange,
}

/// One row of the value table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueEntry {
    pub kind: FoodKind,
    pub value: MicroTokens,
    /// Relative sampling weight (0 = never sampled)
    pub weight: u32,
}

/// Food kinds with their token values and sampling weights
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTable {
    pub entries: Vec<ValueEntry>,
}

impl Default for ValueTable {
    fn default() -> Self {
        let entry = |kind, tokens, weight| ValueEntry {
            kind,
            value: MicroTokens::from_tokens(tokens),
            weight,
        };
        Self {
            entries: vec![
                entry(FoodKind::Red, 1, 40),
                entry(FoodKind::Green, 2, 30),
                entry(FoodKind::Orange, 10, 15),
                entry(FoodKind::Blue, 100, 10),
                entry(FoodKind::Coin, 1000, 5),
            ],
        }
    }
}

impl ValueTable {
    pub fn new(entries: Vec<ValueEntry>) -> Self {
        Self { entries }
    }

    /// Value of a kind, if the table lists it
    pub fn value_of(&self, kind: FoodKind) -> Option<MicroTokens> {
        self.entries.iter().find(|e| e.kind == kind).map(|e| e.value)
    }

    /// Cheapest non-zero entry (used for boost ejections)
    pub fn cheapest(&self) -> Option<&ValueEntry> {
        self.entries
            .iter()
            .filter(|e| !e.value.is_zero())
            .min_by_key(|e| e.value)
    }
}

/// Food item identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodId(pub u64);

/// A generated piece of food not yet placed in the arena
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodSpawn {
    pub kind: FoodKind,
    pub value: MicroTokens,
    pub scale: f32,
}

/// A food item living in the arena
#[derive(Debug, Clone)]
pub struct FoodItem {
    pub id: FoodId,
    pub pos: Vec2,
    pub kind: FoodKind,
    pub value: MicroTokens,
    pub scale: f32,
    pub body: BodyHandle,
}

/// Output of a budget conversion
#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub items: Vec<FoodSpawn>,
    /// Budget left over because no kind was cheap enough
    pub remainder: MicroTokens,
}

impl Generation {
    pub fn total(&self) -> MicroTokens {
        self.items.iter().map(|f| f.value).sum()
    }
}

/// Cosmetic scale: coins are always full size
pub fn food_scale<R: Rng + ?Sized>(kind: FoodKind, rng: &mut R) -> f32 {
    match kind {
        FoodKind::Coin => 1.0,
        _ => rng.random_range(0.8..1.0),
    }
}

/// Convert a token budget into food
///
/// Kinds are sampled by weight. A sampled kind worth more than what is left is
/// excluded for the rest of the call, so generation stops once the budget is
/// spent or no kind fits; the unspent part is returned as `remainder`.
pub fn generate_from_budget<R: Rng + ?Sized>(
    budget: MicroTokens,
    table: &ValueTable,
    rng: &mut R,
) -> Generation {
    let mut remaining = budget;
    let mut candidates: Vec<&ValueEntry> = table
        .entries
        .iter()
        .filter(|e| !e.value.is_zero() && e.weight > 0)
        .collect();
    let mut items = Vec::new();

    while !remaining.is_zero() && !candidates.is_empty() {
        let total_weight: u64 = candidates.iter().map(|e| e.weight as u64).sum();
        let mut roll = rng.random_range(0..total_weight);
        let mut picked = 0;
        for (i, entry) in candidates.iter().enumerate() {
            if roll < entry.weight as u64 {
                picked = i;
                break;
            }
            roll -= entry.weight as u64;
        }

        let entry = candidates[picked];
        match remaining.checked_sub(entry.value) {
            Some(left) => {
                remaining = left;
                items.push(FoodSpawn {
                    kind: entry.kind,
                    value: entry.value,
                    scale: food_scale(entry.kind, rng),
                });
            }
            None => {
                candidates.swap_remove(picked);
            }
        }
    }

    if !remaining.is_zero() {
        log::debug!(
            "Budget {} exhausted after {} items, {} left unconverted",
            budget,
            items.len(),
            remaining
        );
    }

    Generation { items, remainder: remaining }
}

/// Positions for dropped food: along `body` in order, jittered, then scattered
///
/// `body[0]` is the head's spot, where the snake died; drops start behind it.
pub fn place_along_body<R: Rng + ?Sized>(
    count: usize,
    body: &[Vec2],
    arena: &Arena,
    rng: &mut R,
) -> Vec<Vec2> {
    (0..count)
        .map(|k| match body.get(k + 1) {
            Some(&pos) => arena.clamp_inside(pos + jitter(rng)),
            None => arena.random_point(rng),
        })
        .collect()
}

/// Random offset of 3..10 units on each axis, either sign
fn jitter<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    let mut axis = || {
        let magnitude = rng.random_range(3.0..10.0);
        if rng.random_bool(0.5) { magnitude } else { -magnitude }
    };
    Vec2::new(axis(), axis())
}

/// Food currently in the arena, keyed by id, with a running value total
#[derive(Debug, Clone, Default)]
pub struct FoodLedger {
    items: BTreeMap<FoodId, FoodItem>,
    total: MicroTokens,
}

impl FoodLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: FoodItem) {
        self.total += item.value;
        if let Some(old) = self.items.insert(item.id, item) {
            self.total = self.total.saturating_sub(old.value);
        }
    }

    pub fn remove(&mut self, id: FoodId) -> Option<FoodItem> {
        let item = self.items.remove(&id)?;
        self.total = self.total.saturating_sub(item.value);
        Some(item)
    }

    pub fn get(&self, id: FoodId) -> Option<&FoodItem> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all food values
    pub fn total(&self) -> MicroTokens {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = &FoodItem> {
        self.items.values()
    }

    /// Remove everything, returning the items
    pub fn drain(&mut self) -> Vec<FoodItem> {
        self.total = MicroTokens::ZERO;
        std::mem::take(&mut self.items).into_values().collect()
    }
}
