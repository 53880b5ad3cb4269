mod quadtree;

use std::collections::HashMap;

use crate::layout::{Led, RowLayout, map_zigzag};
use quadtree::{Quadtree, Rect};

/// Cached resolutions kept before the cache is dropped and refilled.
const CACHE_CAPACITY: usize = 1024;

/// Identifies a query by the exact bits of its rounded inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum QueryKey {
    Nearest([u32; 3]),
    Region([u32; 4]),
    Radius([u32; 3]),
}

#[derive(Debug, Clone)]
enum Resolution {
    Nearest(Option<usize>),
    Many(Vec<usize>),
}

/// Estimated positions of every light on one row layout, with nearest-point
/// and region queries over them.
///
/// Query results are memoized by their exact inputs. Callers round
/// coordinates before querying so that nearby repeat queries share entries.
#[derive(Debug)]
pub struct SpatialIndex {
    layout: RowLayout,
    leds: Vec<Led>,
    tree: Quadtree,
    cache: HashMap<QueryKey, Resolution>,
}

impl SpatialIndex {
    /// Place every light of `layout` with the zigzag mapping and index it.
    pub fn build(layout: &RowLayout) -> Self {
        let leds = map_zigzag(layout);
        let tree = Quadtree::new(&leds);
        log::debug!(
            "built spatial index for {} lights over {} rows",
            leds.len(),
            layout.row_count()
        );
        Self {
            layout: layout.clone(),
            leds,
            tree,
            cache: HashMap::new(),
        }
    }

    /// Layout the positions were built from.
    #[inline]
    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// Every light in wiring order.
    #[inline]
    pub fn leds(&self) -> &[Led] {
        &self.leds
    }

    #[inline]
    pub fn led(&self, index: usize) -> Option<&Led> {
        self.leds.get(index)
    }

    /// Drop memoized query results. Positions are kept.
    pub fn reset_caches(&mut self) {
        log::debug!("clearing {} cached spatial queries", self.cache.len());
        self.cache.clear();
    }

    /// Closest light within `max_distance` of `(x, y)`.
    ///
    /// Equidistant candidates resolve to the lowest index.
    pub fn nearest(&mut self, x: f32, y: f32, max_distance: f32) -> Option<usize> {
        let key = QueryKey::Nearest([x.to_bits(), y.to_bits(), max_distance.to_bits()]);
        if let Some(Resolution::Nearest(found)) = self.cache.get(&key) {
            return *found;
        }

        let side = 2.0 * max_distance;
        let found = self
            .query_area(x, y, side, side)
            .into_iter()
            .map(|index| (index, self.leds[index].distance_to(x, y)))
            .filter(|&(_, distance)| distance <= max_distance)
            // Candidates arrive in ascending index order, so keeping the first
            // strictly smaller distance breaks ties toward the lowest index.
            .fold(None, |best: Option<(usize, f32)>, candidate| match best {
                Some((_, best_distance)) if best_distance <= candidate.1 => best,
                _ => Some(candidate),
            })
            .map(|(index, _)| index);

        self.remember(key, Resolution::Nearest(found));
        found
    }

    /// Every light inside the `width` x `height` box centred on `(x, y)`,
    /// ascending by index. Borders are inclusive.
    pub fn region(&mut self, x: f32, y: f32, width: f32, height: f32) -> Vec<usize> {
        let key = QueryKey::Region([x.to_bits(), y.to_bits(), width.to_bits(), height.to_bits()]);
        if let Some(Resolution::Many(found)) = self.cache.get(&key) {
            return found.clone();
        }

        let found = self.query_area(x, y, width, height);
        self.remember(key, Resolution::Many(found.clone()));
        found
    }

    /// Every light within distance `r` of `(x, y)`, ascending by index.
    pub fn radius(&mut self, x: f32, y: f32, r: f32) -> Vec<usize> {
        let key = QueryKey::Radius([x.to_bits(), y.to_bits(), r.to_bits()]);
        if let Some(Resolution::Many(found)) = self.cache.get(&key) {
            return found.clone();
        }

        let found: Vec<usize> = self
            .query_area(x, y, 2.0 * r, 2.0 * r)
            .into_iter()
            .filter(|&index| self.leds[index].distance_to(x, y) <= r)
            .collect();
        self.remember(key, Resolution::Many(found.clone()));
        found
    }

    fn query_area(&self, x: f32, y: f32, width: f32, height: f32) -> Vec<usize> {
        // Comparisons with NaN are false, so non-finite sizes land here too.
        if !(width > 0.0 && height > 0.0) {
            return Vec::new();
        }
        self.tree.query(&Rect::centered(x, y, width, height))
    }

    fn remember(&mut self, key: QueryKey, resolution: Resolution) {
        if self.cache.len() >= CACHE_CAPACITY {
            log::trace!("spatial query cache full, starting over");
            self.cache.clear();
        }
        self.cache.insert(key, resolution);
    }

    #[cfg(test)]
    fn cached_queries(&self) -> usize {
        self.cache.len()
    }
}

/// Round `value` to `decimals` decimal places.
///
/// Applied to coordinates right before a spatial query so that nearby
/// repeat queries hit the same cache entry.
#[inline]
pub fn round_to(value: f32, decimals: i32) -> f32 {
    let scale = 10f32.powi(decimals);
    (value * scale).round() / scale
}
