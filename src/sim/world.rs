//! Spatial world
//!
//! Owns every body in a room (heads, segments, food, boundaries) in a
//! generational slot arena, and answers "what overlaps what" through a dense
//! uniform grid rebuilt once per tick.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::economy::FoodId;
use super::sdf::{Shape, shapes_overlap};
use super::snake::SnakeId;

/// Collision categories
pub mod category {
    pub const FOOD: u32 = 0b0001;
    pub const HEAD: u32 = 0b0010;
    pub const BOUNDARY: u32 = 0b0100;
    pub const BODY: u32 = 0b1000;
}

/// Category/mask/group filter
///
/// Two bodies sharing a non-zero group collide only if the group is positive;
/// otherwise each must list the other's category in its mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub category: u32,
    pub mask: u32,
    pub group: i64,
}

impl CollisionFilter {
    pub fn food() -> Self {
        Self {
            category: category::FOOD,
            mask: category::HEAD,
            group: 0,
        }
    }

    pub fn head(owner: SnakeId) -> Self {
        Self {
            category: category::HEAD,
            mask: category::FOOD | category::HEAD | category::BODY | category::BOUNDARY,
            group: Self::snake_group(owner),
        }
    }

    pub fn body(owner: SnakeId) -> Self {
        Self {
            category: category::BODY,
            mask: category::HEAD,
            group: Self::snake_group(owner),
        }
    }

    pub fn boundary() -> Self {
        Self {
            category: category::BOUNDARY,
            mask: category::HEAD,
            group: 0,
        }
    }

    /// Negative group shared by every body of one snake
    fn snake_group(owner: SnakeId) -> i64 {
        -1 - owner.0 as i64
    }

    pub fn can_collide(&self, other: &CollisionFilter) -> bool {
        if self.group != 0 && self.group == other.group {
            return self.group > 0;
        }
        (self.mask & other.category) != 0 && (other.mask & self.category) != 0
    }
}

/// Arena edge a boundary collider guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// What a body belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Head { snake: SnakeId },
    Segment { snake: SnakeId },
    Food { food: FoodId },
    Boundary { side: Side },
}

/// A simulated body
#[derive(Debug, Clone)]
pub struct Body {
    pub pos: Vec2,
    pub shape: Shape,
    /// Shape at scale 1.0; `scale_body` is relative to this
    pub base_shape: Shape,
    pub kind: BodyKind,
    pub filter: CollisionFilter,
}

impl Body {
    pub fn circle(pos: Vec2, radius: f32, kind: BodyKind, filter: CollisionFilter) -> Self {
        let shape = Shape::Circle { radius };
        Self {
            pos,
            shape,
            base_shape: shape,
            kind,
            filter,
        }
    }

    pub fn rect(pos: Vec2, half_extents: Vec2, kind: BodyKind, filter: CollisionFilter) -> Self {
        let shape = Shape::Rect { half_extents };
        Self {
            pos,
            shape,
            base_shape: shape,
            kind,
            filter,
        }
    }
}

/// Stable reference to a body; never resolves again once the body is removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyHandle {
    pub index: u32,
    pub generation: u32,
}

/// Two overlapping bodies, valid for the tick that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

/// The rectangular arena `[0, width] x [0, height]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub wall_width: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32, wall_width: f32) -> Self {
        Self {
            width,
            height,
            wall_width,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Inclusive containment test
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x <= self.width && pos.y >= 0.0 && pos.y <= self.height
    }

    pub fn clamp_inside(&self, pos: Vec2) -> Vec2 {
        pos.clamp(Vec2::ZERO, Vec2::new(self.width, self.height))
    }

    /// Uniform random point, kept a wall's width away from the edges
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let inset_x = self.wall_width.min(self.width * 0.25);
        let inset_y = self.wall_width.min(self.height * 0.25);
        Vec2::new(
            random_between(rng, inset_x, self.width - inset_x),
            random_between(rng, inset_y, self.height - inset_y),
        )
    }

    /// Colliders lining the outside of each edge
    pub fn boundary_bodies(&self) -> [Body; 4] {
        let (w, h, t) = (self.width, self.height, self.wall_width);
        let wall = |pos, half, side| {
            Body::rect(pos, half, BodyKind::Boundary { side }, CollisionFilter::boundary())
        };
        [
            wall(Vec2::new(-t / 2.0, h / 2.0), Vec2::new(t / 2.0, h / 2.0 + t), Side::Left),
            wall(Vec2::new(w + t / 2.0, h / 2.0), Vec2::new(t / 2.0, h / 2.0 + t), Side::Right),
            wall(Vec2::new(w / 2.0, -t / 2.0), Vec2::new(w / 2.0 + t, t / 2.0), Side::Top),
            wall(Vec2::new(w / 2.0, h + t / 2.0), Vec2::new(w / 2.0 + t, t / 2.0), Side::Bottom),
        ]
    }
}

fn random_between<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min { rng.random_range(min..max) } else { min }
}

#[derive(Debug, Clone, Copy, Default)]
struct CellRange {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    body: Option<Body>,
    /// Cells covered at the last reindex
    cells: CellRange,
}

/// Dense broad-phase grid covering the arena plus its walls
#[derive(Debug, Clone)]
struct Grid {
    cell_size: f32,
    origin: Vec2,
    cols: i32,
    rows: i32,
    cells: Vec<Vec<BodyHandle>>,
}

impl Grid {
    fn new(arena: &Arena, cell_size: f32) -> Self {
        let margin = arena.wall_width.max(0.0);
        let origin = Vec2::splat(-margin);
        let cols = (((arena.width + 2.0 * margin) / cell_size).ceil() as i32).max(1);
        let rows = (((arena.height + 2.0 * margin) / cell_size).ceil() as i32).max(1);
        Self {
            cell_size,
            origin,
            cols,
            rows,
            cells: vec![Vec::new(); (cols * rows) as usize],
        }
    }

    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        let rel = (pos - self.origin) / self.cell_size;
        (
            (rel.x.floor() as i32).clamp(0, self.cols - 1),
            (rel.y.floor() as i32).clamp(0, self.rows - 1),
        )
    }

    fn range_of(&self, pos: Vec2, half: Vec2) -> CellRange {
        let (x0, y0) = self.cell_of(pos - half);
        let (x1, y1) = self.cell_of(pos + half);
        CellRange { x0, y0, x1, y1 }
    }

    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.cols + x) as usize
    }

    fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }
}

/// All bodies of a room plus the broad phase
#[derive(Debug, Clone)]
pub struct World {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    grid: Grid,
}

impl World {
    pub fn new(arena: &Arena, cell_size: f32) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            grid: Grid::new(arena, cell_size),
        }
    }

    pub fn add_body(&mut self, body: Body) -> BodyHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            return BodyHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 1,
            body: Some(body),
            cells: CellRange::default(),
        });
        BodyHandle {
            index,
            generation: 1,
        }
    }

    /// Remove a body; stale handles return `None`
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<Body> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let body = slot.body.take()?;
        slot.generation = slot.generation.wrapping_add(1).max(1);
        self.free.push(handle.index);
        self.live -= 1;
        Some(body)
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_ref()
    }

    fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_mut()
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn set_position(&mut self, handle: BodyHandle, pos: Vec2) -> bool {
        match self.get_mut(handle) {
            Some(body) => {
                body.pos = pos;
                true
            }
            None => false,
        }
    }

    /// Scale a body's footprint relative to its base shape
    pub fn scale_body(&mut self, handle: BodyHandle, factor: f32) -> bool {
        match self.get_mut(handle) {
            Some(body) => {
                body.shape = body.base_shape.scaled(factor);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.body.as_ref().map(|body| {
                (
                    BodyHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    body,
                )
            })
        })
    }

    /// Rebuild the broad-phase grid from current positions
    pub fn reindex(&mut self) {
        self.grid.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(body) = slot.body.as_ref() else {
                continue;
            };
            let range = self.grid.range_of(body.pos, body.shape.half_extents());
            slot.cells = range;
            let handle = BodyHandle {
                index: index as u32,
                generation: slot.generation,
            };
            for y in range.y0..=range.y1 {
                for x in range.x0..=range.x1 {
                    let i = self.grid.index(x, y);
                    self.grid.cells[i].push(handle);
                }
            }
        }
    }

    /// Overlapping pairs as of the last `reindex`
    ///
    /// Lazy; each pair is reported once, from the first grid cell both bodies
    /// cover. Bodies removed since the reindex are skipped.
    pub fn overlaps(&self) -> impl Iterator<Item = CollisionEvent> + '_ {
        self.grid
            .cells
            .iter()
            .enumerate()
            .flat_map(move |(cell, list)| {
                (0..list.len())
                    .flat_map(move |i| (i + 1..list.len()).map(move |j| (list[i], list[j])))
                    .filter_map(move |(a, b)| self.test_pair(cell, a, b))
            })
    }

    fn test_pair(&self, cell: usize, a: BodyHandle, b: BodyHandle) -> Option<CollisionEvent> {
        let body_a = self.get(a)?;
        let body_b = self.get(b)?;
        if !body_a.filter.can_collide(&body_b.filter) {
            return None;
        }

        let ra = self.slots[a.index as usize].cells;
        let rb = self.slots[b.index as usize].cells;
        if self.grid.index(ra.x0.max(rb.x0), ra.y0.max(rb.y0)) != cell {
            return None;
        }

        shapes_overlap(body_a.pos, body_a.shape, body_b.pos, body_b.shape)
            .then_some(CollisionEvent { a, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Arena {
        Arena::new(1000.0, 1000.0, 50.0)
    }

    fn head(world: &mut World, id: u64, pos: Vec2) -> BodyHandle {
        let snake = SnakeId(id);
        world.add_body(Body::circle(pos, 10.0, BodyKind::Head { snake }, CollisionFilter::head(snake)))
    }

    fn segment(world: &mut World, id: u64, pos: Vec2) -> BodyHandle {
        let snake = SnakeId(id);
        world.add_body(Body::circle(pos, 9.0, BodyKind::Segment { snake }, CollisionFilter::body(snake)))
    }

    fn food(world: &mut World, id: u64, pos: Vec2) -> BodyHandle {
        world.add_body(Body::circle(
            pos,
            8.0,
            BodyKind::Food { food: FoodId(id) },
            CollisionFilter::food(),
        ))
    }

    #[test]
    fn test_filter_rules() {
        let a = SnakeId(1);
        let b = SnakeId(2);
        let food = CollisionFilter::food();
        let wall = CollisionFilter::boundary();

        assert!(food.can_collide(&CollisionFilter::head(a)));
        assert!(!food.can_collide(&food));
        assert!(!food.can_collide(&CollisionFilter::body(a)));
        assert!(!food.can_collide(&wall));

        assert!(CollisionFilter::head(a).can_collide(&CollisionFilter::head(b)));
        assert!(CollisionFilter::head(a).can_collide(&CollisionFilter::body(b)));
        assert!(!CollisionFilter::head(a).can_collide(&CollisionFilter::body(a)));
        assert!(!CollisionFilter::body(a).can_collide(&CollisionFilter::body(b)));

        assert!(wall.can_collide(&CollisionFilter::head(a)));
        assert!(!wall.can_collide(&CollisionFilter::body(a)));
        assert!(!wall.can_collide(&wall));
    }

    #[test]
    fn test_stale_handle_after_remove() {
        let mut world = World::new(&arena(), 100.0);
        let h = food(&mut world, 1, Vec2::new(10.0, 10.0));
        assert!(world.contains(h));
        assert!(world.remove_body(h).is_some());
        assert!(world.remove_body(h).is_none());

        // Slot is recycled with a new generation
        let h2 = food(&mut world, 2, Vec2::new(10.0, 10.0));
        assert_eq!(h2.index, h.index);
        assert_ne!(h2.generation, h.generation);
        assert!(world.get(h).is_none());
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn test_overlaps_reported_once_across_cells() {
        let mut world = World::new(&arena(), 100.0);
        // Straddle a cell boundary so both bodies cover several cells
        let a = head(&mut world, 1, Vec2::new(149.0, 149.0));
        let f = food(&mut world, 7, Vec2::new(152.0, 151.0));
        world.reindex();

        let events: Vec<_> = world.overlaps().collect();
        assert_eq!(events.len(), 1);
        let pair = [events[0].a, events[0].b];
        assert!(pair.contains(&a) && pair.contains(&f));
    }

    #[test]
    fn test_own_segments_never_overlap_head() {
        let mut world = World::new(&arena(), 100.0);
        head(&mut world, 1, Vec2::new(500.0, 500.0));
        segment(&mut world, 1, Vec2::new(500.0, 500.0));
        segment(&mut world, 1, Vec2::new(505.0, 500.0));
        world.reindex();
        assert_eq!(world.overlaps().count(), 0);
    }

    #[test]
    fn test_foreign_segment_overlaps_head() {
        let mut world = World::new(&arena(), 100.0);
        let h = head(&mut world, 1, Vec2::new(500.0, 500.0));
        let s = segment(&mut world, 2, Vec2::new(510.0, 500.0));
        // Far away pair that must not show up
        food(&mut world, 3, Vec2::new(900.0, 900.0));
        world.reindex();
        let events: Vec<_> = world.overlaps().collect();
        assert_eq!(events, vec![CollisionEvent { a: h, b: s }]);
    }

    #[test]
    fn test_boundary_overlaps_head_at_edge() {
        let arena = arena();
        let mut world = World::new(&arena, 100.0);
        for wall in arena.boundary_bodies() {
            world.add_body(wall);
        }
        let h = head(&mut world, 1, Vec2::new(5.0, 500.0));
        food(&mut world, 9, Vec2::new(4.0, 300.0));
        world.reindex();
        let events: Vec<_> = world.overlaps().collect();
        assert_eq!(events.len(), 1);
        let other = if events[0].a == h { events[0].b } else { events[0].a };
        assert!(matches!(
            world.get(other).map(|b| b.kind),
            Some(BodyKind::Boundary { side: Side::Left })
        ));
    }

    #[test]
    fn test_removed_after_reindex_is_skipped() {
        let mut world = World::new(&arena(), 100.0);
        head(&mut world, 1, Vec2::new(200.0, 200.0));
        let f = food(&mut world, 1, Vec2::new(205.0, 200.0));
        world.reindex();
        world.remove_body(f);
        assert_eq!(world.overlaps().count(), 0);
    }

    #[test]
    fn test_scale_body() {
        let mut world = World::new(&arena(), 100.0);
        let h = head(&mut world, 1, Vec2::new(200.0, 200.0));
        let f = food(&mut world, 1, Vec2::new(225.0, 200.0));
        world.reindex();
        assert_eq!(world.overlaps().count(), 0);

        world.scale_body(h, 2.0);
        world.reindex();
        assert_eq!(world.overlaps().count(), 1);
        assert!(world.set_position(f, Vec2::new(400.0, 200.0)));
        world.reindex();
        assert_eq!(world.overlaps().count(), 0);
    }

    #[test]
    fn test_arena_helpers() {
        let arena = arena();
        assert!(arena.contains(Vec2::new(0.0, 1000.0)));
        assert!(!arena.contains(Vec2::new(-0.1, 10.0)));
        assert_eq!(arena.clamp_inside(Vec2::new(-5.0, 2000.0)), Vec2::new(0.0, 1000.0));
        assert_eq!(arena.center(), Vec2::new(500.0, 500.0));
    }
}
