//! Trailing-path buffer
//!
//! History of head poses, newest first. Each tick the oldest sample is
//! recycled as the newest one, and segment positions are read back out of the
//! buffer either at a fixed index stride or by walking the path's arc length.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::distance;

/// One sample of the head's history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub pos: Vec2,
    pub angle: f32,
}

impl PathPoint {
    pub fn new(pos: Vec2, angle: f32) -> Self {
        Self { pos, angle }
    }

    /// Overwrite in place
    #[inline]
    pub fn set(&mut self, pos: Vec2, angle: f32) {
        self.pos = pos;
        self.angle = angle;
    }
}

/// How segment indices are chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Segment i at index i * stride
    UniformStride { stride: usize },
    /// Segments `preferred` apart along the path
    ArcLength { preferred: f32 },
}

/// Result of placing segments on the path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementOutcome {
    /// The buffer ran out before every segment got its full spacing
    pub starved: bool,
}

/// Head history buffer (index 0 = newest)
#[derive(Debug, Clone)]
pub struct TrailPath {
    points: VecDeque<PathPoint>,
}

impl TrailPath {
    /// `count` samples in a straight line trailing behind `head`, `step` apart
    pub fn seeded_line(head: Vec2, angle: f32, step: f32, count: usize) -> Self {
        let back = -Vec2::from_angle(angle) * step;
        let points = (0..count.max(1))
            .map(|k| PathPoint::new(head + back * k as f32, angle))
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PathPoint> {
        self.points.get(index)
    }

    /// Sample at `index`, clamped to the oldest one
    pub fn clamped(&self, index: usize) -> PathPoint {
        let last = self.points.len().saturating_sub(1);
        self.points[index.min(last)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathPoint> {
        self.points.iter()
    }

    /// Recycle the oldest sample as the newest
    pub fn record(&mut self, pos: Vec2, angle: f32) {
        match self.points.pop_back() {
            Some(mut point) => {
                point.set(pos, angle);
                self.points.push_front(point);
            }
            None => self.points.push_front(PathPoint::new(pos, angle)),
        }
    }

    /// Duplicate the oldest sample at the tail
    pub fn extend_tail(&mut self) {
        if let Some(&last) = self.points.back() {
            self.points.push_back(last);
        }
    }

    /// Drop the oldest sample, keeping at least two
    pub fn trim_tail(&mut self) {
        if self.points.len() > 2 {
            self.points.pop_back();
        }
    }

    /// Grow (duplicating the tail) or shrink to exactly `len` samples
    pub fn resize(&mut self, len: usize) {
        let len = len.max(1);
        if let Some(&last) = self.points.back() {
            self.points.resize(len, last);
        }
    }

    /// Drop every sample after `index`
    pub fn truncate_after(&mut self, index: usize) {
        self.points.truncate(index.saturating_add(1).max(2));
    }

    /// Path length between two indices (`from` <= `to`)
    pub fn arc_length(&self, from: usize, to: usize) -> f32 {
        let to = to.min(self.points.len().saturating_sub(1));
        (from..to)
            .map(|i| distance(self.points[i].pos, self.points[i + 1].pos))
            .sum()
    }

    /// Index roughly `preferred` further along the path than `from`
    ///
    /// Accumulates sample-to-sample distance until the sum first reaches
    /// `preferred`, then picks whichever of the last two indices lands closer
    /// to it (ties go to the larger index). Clamps at the oldest sample.
    pub fn next_index(&self, from: usize, preferred: f32) -> usize {
        let mut i = from;
        let mut len = 0.0;
        let mut diff = -preferred;
        let mut prev_diff = None;

        while i + 1 < self.points.len() && diff < 0.0 {
            len += distance(self.points[i].pos, self.points[i + 1].pos);
            prev_diff = Some(diff);
            diff = len - preferred;
            i += 1;
        }

        match prev_diff {
            Some(prev) if prev.abs() < diff.abs() => i - 1,
            _ => i,
        }
    }

    /// Choose buffer indices for `count` segments into `indices`
    ///
    /// In arc-length mode the buffer then grows by one duplicated sample when
    /// it was exhausted, or shrinks by one otherwise, so its size follows the
    /// snake's length. In uniform mode it is resized to `count * stride`.
    pub fn place(
        &mut self,
        placement: Placement,
        count: usize,
        indices: &mut Vec<usize>,
    ) -> PlacementOutcome {
        indices.clear();
        if self.points.is_empty() {
            return PlacementOutcome { starved: count > 0 };
        }

        match placement {
            Placement::UniformStride { stride } => {
                let stride = stride.max(1);
                self.resize((count * stride).max(2));
                let last = self.points.len() - 1;
                let mut starved = false;
                for i in 0..count {
                    let index = i * stride;
                    starved |= index > last;
                    indices.push(index.min(last));
                }
                PlacementOutcome { starved }
            }
            Placement::ArcLength { preferred } => {
                let mut index = 0;
                for _ in 0..count {
                    indices.push(index);
                    index = self.next_index(index, preferred);
                }
                // `index` is where one more segment would go
                let starved = index + 1 >= self.points.len();
                if starved {
                    self.extend_tail();
                } else {
                    self.trim_tail();
                }
                PlacementOutcome { starved }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn straight(step: f32, count: usize) -> TrailPath {
        TrailPath::seeded_line(Vec2::new(100.0, 100.0), 0.0, step, count)
    }

    #[test]
    fn test_record_recycles_oldest() {
        let mut path = straight(1.0, 4);
        path.record(Vec2::new(101.0, 100.0), 0.0);
        assert_eq!(path.len(), 4);
        assert_eq!(path.get(0).map(|p| p.pos), Some(Vec2::new(101.0, 100.0)));
        assert_eq!(path.get(1).map(|p| p.pos), Some(Vec2::new(100.0, 100.0)));
        assert_eq!(path.get(3).map(|p| p.pos), Some(Vec2::new(98.0, 100.0)));
    }

    #[test]
    fn test_next_index_picks_closer_candidate() {
        // Samples 4 apart, target 10: sums are 4, 8, 12 -> 12 overshoots by 2,
        // 8 undershoots by 2, tie goes to the larger index
        let path = straight(4.0, 10);
        assert_eq!(path.next_index(0, 10.0), 3);
        // Target 9: 8 is closer than 12
        assert_eq!(path.next_index(0, 9.0), 2);
        // Target 11: 12 is closer than 8
        assert_eq!(path.next_index(0, 11.0), 3);
    }

    #[test]
    fn test_next_index_clamps_when_exhausted() {
        let path = straight(1.0, 5);
        assert_eq!(path.next_index(0, 100.0), 4);
        assert_eq!(path.next_index(4, 1.0), 4);
    }

    #[test]
    fn test_arc_length_placement_spacing() {
        let mut path = straight(2.0, 100);
        let mut indices = Vec::new();
        let outcome = path.place(Placement::ArcLength { preferred: 10.0 }, 5, &mut indices);
        assert!(!outcome.starved);
        assert_eq!(indices, vec![0, 5, 10, 15, 20]);
        // Not starved, so the buffer shrinks by one
        assert_eq!(path.len(), 99);
    }

    #[test]
    fn test_starved_buffer_clamps_and_extends() {
        let mut path = straight(2.0, 8);
        let mut indices = Vec::new();
        let outcome = path.place(Placement::ArcLength { preferred: 10.0 }, 4, &mut indices);
        assert!(outcome.starved);
        assert_eq!(indices, vec![0, 5, 7, 7]);
        // Tail sample duplicated
        assert_eq!(path.len(), 9);
        assert_eq!(path.get(8), path.get(7));
    }

    #[test]
    fn test_uniform_stride_placement() {
        let mut path = straight(1.0, 3);
        let mut indices = Vec::new();
        let outcome = path.place(Placement::UniformStride { stride: 4 }, 3, &mut indices);
        assert!(!outcome.starved);
        assert_eq!(indices, vec![0, 4, 8]);
        assert_eq!(path.len(), 12);
        // Padding duplicates the oldest real sample
        assert_eq!(path.clamped(11).pos, Vec2::new(98.0, 100.0));
    }

    #[test]
    fn test_truncate_after_keeps_two() {
        let mut path = straight(1.0, 10);
        path.truncate_after(5);
        assert_eq!(path.len(), 6);
        path.truncate_after(0);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_arc_length_sum() {
        let path = straight(3.0, 10);
        assert!((path.arc_length(2, 6) - 12.0).abs() < 1e-4);
        assert!((path.arc_length(0, 100) - 27.0).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn arc_length_spacing_within_one_step(
            turns in proptest::collection::vec(-0.3f32..0.3, 200..400),
            step in 1.0f32..6.0,
            preferred in 8.0f32..40.0,
            count in 2usize..12,
        ) {
            // Random smooth walk at constant speed
            let mut pos = Vec2::new(500.0, 500.0);
            let mut angle = 0.0f32;
            let mut path = TrailPath::seeded_line(pos, angle, step, 600);
            for turn in &turns {
                angle += turn;
                pos += Vec2::from_angle(angle) * step;
                path.record(pos, angle);
            }

            let mut indices = Vec::new();
            let outcome = path.place(Placement::ArcLength { preferred }, count, &mut indices);
            prop_assume!(!outcome.starved);
            for pair in indices.windows(2) {
                let d = path.arc_length(pair[0], pair[1]);
                prop_assert!((d - preferred).abs() <= step + 1e-3);
            }
        }
    }
}
