use std::collections::HashMap;
use std::hash::Hash;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::{IndexError, NeighborhoodIndex, validate_cell_size};

/// Integer bucket coordinate: `(floor(x / cell_size), floor(y / cell_size))`.
pub type CellKey = (i32, i32);

#[derive(Debug, Clone, Copy)]
struct Entry {
    position: (f32, f32),
    cell: CellKey,
}

/// Occupancy figures for a [`SpatialHashGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    pub cell_size: f32,
    /// Number of non-empty buckets.
    pub cell_count: usize,
    pub entity_count: usize,
    pub max_bucket_len: usize,
}

/// Uniform bucket hash over world coordinates.
///
/// The grid remembers the last position registered for every id, so removal
/// and moves never need the caller to repeat the old position and empty
/// buckets are dropped as soon as they drain. Query results come back in a
/// fixed order: cells row-major (y, then x), ids in bucket insertion order.
#[derive(Debug, Clone)]
pub struct SpatialHashGrid<K> {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<K>>,
    entries: HashMap<K, Entry>,
}

impl<K> SpatialHashGrid<K>
where
    K: Copy + Eq + Hash,
{
    /// Create an empty grid with the provided cell size.
    pub fn new(cell_size: f32) -> Result<Self, IndexError> {
        validate_cell_size(cell_size)?;
        Ok(Self {
            cell_size,
            cells: HashMap::new(),
            entries: HashMap::new(),
        })
    }

    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of non-empty buckets.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: K) -> bool {
        self.entries.contains_key(&id)
    }

    /// Last position registered for `id`.
    #[must_use]
    pub fn position(&self, id: K) -> Option<(f32, f32)> {
        self.entries.get(&id).map(|entry| entry.position)
    }

    #[must_use]
    pub fn cell_key(&self, x: f32, y: f32) -> CellKey {
        (
            (x / self.cell_size).floor() as i32,
            (y / self.cell_size).floor() as i32,
        )
    }

    /// Add `id` at `(x, y)`; an id that is already present is moved instead.
    pub fn insert(&mut self, id: K, x: f32, y: f32) -> Result<(), IndexError> {
        check_finite(x, y)?;
        if self.entries.contains_key(&id) {
            self.relocate(id, x, y);
            return Ok(());
        }
        let cell = self.cell_key(x, y);
        self.cells.entry(cell).or_default().push(id);
        self.entries.insert(
            id,
            Entry {
                position: (x, y),
                cell,
            },
        );
        Ok(())
    }

    /// Remove `id` from its bucket. Returns `false` if it was not indexed.
    pub fn remove(&mut self, id: K) -> bool {
        match self.entries.remove(&id) {
            Some(entry) => {
                self.detach(id, entry.cell);
                true
            }
            None => false,
        }
    }

    /// Update the position of `id`, switching buckets only when the cell changes.
    ///
    /// Returns `Ok(false)` if `id` is not indexed.
    pub fn move_to(&mut self, id: K, x: f32, y: f32) -> Result<bool, IndexError> {
        check_finite(x, y)?;
        if !self.entries.contains_key(&id) {
            return Ok(false);
        }
        self.relocate(id, x, y);
        Ok(true)
    }

    /// Ids within `radius` of `(x, y)` (inclusive) that also satisfy `predicate`.
    pub fn query_radius(
        &self,
        x: f32,
        y: f32,
        radius: f32,
        mut predicate: impl FnMut(K) -> bool,
    ) -> Vec<K> {
        let mut found = Vec::new();
        if radius.is_nan() || radius < 0.0 {
            return found;
        }
        self.neighbors_within((x, y), radius * radius, &mut |id, _| {
            if predicate(id) {
                found.push(id);
            }
        });
        found
    }

    /// Ids inside the rectangle `[x, x + w] × [y, y + h]` that also satisfy `predicate`.
    pub fn query_rect(
        &self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        mut predicate: impl FnMut(K) -> bool,
    ) -> Vec<K> {
        let mut found = Vec::new();
        if w.is_nan() || h.is_nan() || w < 0.0 || h < 0.0 {
            return found;
        }
        let (max_x, max_y) = (x + w, y + h);
        let min_cell = self.cell_key(x, y);
        let max_cell = self.cell_key(max_x, max_y);
        self.visit_cells(min_cell, max_cell, |bucket| {
            for &id in bucket {
                let (px, py) = self.entries[&id].position;
                if px >= x && px <= max_x && py >= y && py <= max_y && predicate(id) {
                    found.push(id);
                }
            }
        });
        found
    }

    /// Drop every bucket and tracked position.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.entries.clear();
    }

    #[must_use]
    pub fn stats(&self) -> GridStats {
        GridStats {
            cell_size: self.cell_size,
            cell_count: self.cells.len(),
            entity_count: self.entries.len(),
            max_bucket_len: self.cells.values().map(Vec::len).max().unwrap_or(0),
        }
    }

    fn relocate(&mut self, id: K, x: f32, y: f32) {
        let cell = self.cell_key(x, y);
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        let previous = entry.cell;
        entry.position = (x, y);
        entry.cell = cell;
        if previous != cell {
            self.detach(id, previous);
            self.cells.entry(cell).or_default().push(id);
        }
    }

    fn detach(&mut self, id: K, cell: CellKey) {
        if let Some(bucket) = self.cells.get_mut(&cell) {
            if let Some(slot) = bucket.iter().position(|&other| other == id) {
                bucket.remove(slot);
            }
            if bucket.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    /// Visit occupied buckets whose key lies in `[min, max]`, row-major.
    ///
    /// Wide ranges (e.g. an unbounded radius) walk the occupied buckets
    /// instead of every key in the range, keeping the same visiting order.
    fn visit_cells(&self, min: CellKey, max: CellKey, mut visit: impl FnMut(&[K])) {
        if min.0 > max.0 || min.1 > max.1 || self.cells.is_empty() {
            return;
        }
        let span_x = i64::from(max.0) - i64::from(min.0) + 1;
        let span_y = i64::from(max.1) - i64::from(min.1) + 1;
        if span_x.saturating_mul(span_y) <= self.cells.len() as i64 {
            for cy in min.1..=max.1 {
                for cx in min.0..=max.0 {
                    if let Some(bucket) = self.cells.get(&(cx, cy)) {
                        visit(bucket.as_slice());
                    }
                }
            }
        } else {
            let mut keys: Vec<CellKey> = self
                .cells
                .keys()
                .copied()
                .filter(|&(cx, cy)| cx >= min.0 && cx <= max.0 && cy >= min.1 && cy <= max.1)
                .collect();
            keys.sort_unstable_by_key(|&(cx, cy)| (cy, cx));
            for key in keys {
                visit(self.cells[&key].as_slice());
            }
        }
    }
}

impl<K> NeighborhoodIndex<K> for SpatialHashGrid<K>
where
    K: Copy + Eq + Hash,
{
    fn rebuild(&mut self, entries: &[(K, (f32, f32))]) -> Result<(), IndexError> {
        if let Some(&(_, (x, y))) = entries
            .iter()
            .find(|(_, (x, y))| !x.is_finite() || !y.is_finite())
        {
            return Err(IndexError::NonFinitePosition { x, y });
        }
        self.clear();
        for &(id, (x, y)) in entries {
            self.insert(id, x, y)?;
        }
        Ok(())
    }

    fn neighbors_within(
        &self,
        center: (f32, f32),
        radius_sq: f32,
        visitor: &mut dyn FnMut(K, OrderedFloat<f32>),
    ) {
        if radius_sq.is_nan() || radius_sq < 0.0 {
            return;
        }
        let radius = radius_sq.sqrt();
        let min_cell = self.cell_key(center.0 - radius, center.1 - radius);
        let max_cell = self.cell_key(center.0 + radius, center.1 + radius);
        self.visit_cells(min_cell, max_cell, |bucket| {
            for &id in bucket {
                let (px, py) = self.entries[&id].position;
                let dx = px - center.0;
                let dy = py - center.1;
                let dist_sq = dx * dx + dy * dy;
                if dist_sq <= radius_sq {
                    visitor(id, OrderedFloat(dist_sq));
                }
            }
        });
    }
}

fn check_finite(x: f32, y: f32) -> Result<(), IndexError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(IndexError::NonFinitePosition { x, y })
    }
}
