use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::grid::{GridStats, SpatialHashGrid};
use crate::{IndexConfig, IndexError, NeighborhoodIndex};

/// Accessors the index needs from a tracked entity.
///
/// Implementors are usually small handles (an id plus a cached position),
/// since the manager keeps the most recent value it was given.
pub trait SpatialEntity {
    type Id: Copy + Eq + Hash + fmt::Debug;
    type Kind: Copy + Eq + Hash + fmt::Debug;

    fn id(&self) -> Self::Id;
    fn position(&self) -> (f32, f32);
    fn kind(&self) -> Self::Kind;
}

/// Optional kind and predicate filters; both apply when both are set.
pub struct QueryFilter<'a, E: SpatialEntity> {
    pub kind: Option<E::Kind>,
    pub predicate: Option<&'a dyn Fn(&E) -> bool>,
}

impl<E: SpatialEntity> Default for QueryFilter<'_, E> {
    fn default() -> Self {
        Self {
            kind: None,
            predicate: None,
        }
    }
}

impl<'a, E: SpatialEntity> QueryFilter<'a, E> {
    /// Accept every entity.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn of_kind(kind: E::Kind) -> Self {
        Self {
            kind: Some(kind),
            predicate: None,
        }
    }

    #[must_use]
    pub fn matching(predicate: &'a dyn Fn(&E) -> bool) -> Self {
        Self {
            kind: None,
            predicate: Some(predicate),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: E::Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn accepts(&self, entity: &E) -> bool {
        self.kind.is_none_or(|kind| entity.kind() == kind)
            && self.predicate.is_none_or(|predicate| predicate(entity))
    }
}

/// Running totals of index operations since creation or the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationCounters {
    pub adds: u64,
    pub removes: u64,
    pub updates: u64,
    pub queries: u64,
}

/// Snapshot returned by [`SpatialIndexManager::stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats<K: Eq + Hash> {
    pub total: usize,
    pub by_kind: HashMap<K, usize>,
    pub operations: OperationCounters,
    pub grid: GridStats,
}

/// Holes left by removals before an [`Ordered`] list is worth compacting.
const COMPACT_MIN_HOLES: usize = 32;

/// Insertion-ordered list whose removals leave holes.
///
/// Compaction runs once holes outnumber live entries, so a removal costs
/// amortized constant time and survivors keep their relative order.
#[derive(Debug, Clone)]
struct Ordered<T> {
    items: Vec<Option<T>>,
    live: usize,
}

impl<T> Ordered<T> {
    const fn new() -> Self {
        Self {
            items: Vec::new(),
            live: 0,
        }
    }

    fn push(&mut self, item: T) -> usize {
        self.items.push(Some(item));
        self.live += 1;
        self.items.len() - 1
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index).and_then(Option::as_mut)
    }

    fn take(&mut self, index: usize) -> Option<T> {
        let item = self.items.get_mut(index)?.take()?;
        self.live -= 1;
        Some(item)
    }

    fn needs_compaction(&self) -> bool {
        let holes = self.items.len() - self.live;
        holes >= COMPACT_MIN_HOLES && holes > self.live
    }

    /// Drop the holes, reporting each survivor's new index to `moved`.
    fn compact(&mut self, mut moved: impl FnMut(&T, usize)) {
        self.items.retain(Option::is_some);
        for (index, item) in self.items.iter().flatten().enumerate() {
            moved(item, index);
        }
    }

    fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().flatten()
    }

    const fn len(&self) -> usize {
        self.live
    }

    const fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn clear(&mut self) {
        self.items.clear();
        self.live = 0;
    }
}

/// Where an entity sits in the ordered list and in its kind's list.
#[derive(Debug, Clone, Copy)]
struct Slot {
    entity: usize,
    kind: usize,
}

/// Typed, observable facade over [`SpatialHashGrid`].
///
/// Keeps entities in insertion order alongside per-kind id lists; the two
/// views always describe the same set. Add, update and remove run in
/// amortized constant time. Queries take `&self`, the query counter lives
/// in a `Cell`.
pub struct SpatialIndexManager<E: SpatialEntity> {
    grid: SpatialHashGrid<E::Id>,
    entities: Ordered<E>,
    slots: HashMap<E::Id, Slot>,
    by_kind: HashMap<E::Kind, Ordered<E::Id>>,
    adds: u64,
    removes: u64,
    updates: u64,
    queries: Cell<u64>,
}

impl<E: SpatialEntity> fmt::Debug for SpatialIndexManager<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndexManager")
            .field("cell_size", &self.grid.cell_size())
            .field("entity_count", &self.entities.len())
            .field("kind_count", &self.by_kind.len())
            .field("operations", &self.counters())
            .finish()
    }
}

impl<E: SpatialEntity> SpatialIndexManager<E> {
    pub fn new(config: IndexConfig) -> Result<Self, IndexError> {
        config.validate()?;
        Ok(Self {
            grid: SpatialHashGrid::new(config.cell_size)?,
            entities: Ordered::new(),
            slots: HashMap::new(),
            by_kind: HashMap::new(),
            adds: 0,
            removes: 0,
            updates: 0,
            queries: Cell::new(0),
        })
    }

    /// Start tracking `entity`. Returns `false` if its id is already tracked
    /// or its position is not finite.
    pub fn add_entity(&mut self, entity: E) -> bool {
        let id = entity.id();
        if self.slots.contains_key(&id) {
            return false;
        }
        let (x, y) = entity.position();
        if let Err(err) = self.grid.insert(id, x, y) {
            warn!(?id, %err, "refusing to index entity");
            return false;
        }
        let kind = self
            .by_kind
            .entry(entity.kind())
            .or_insert_with(Ordered::new)
            .push(id);
        let slot = Slot {
            entity: self.entities.push(entity),
            kind,
        };
        self.slots.insert(id, slot);
        self.adds += 1;
        true
    }

    /// Stop tracking the entity with `id`, returning the last value stored for it.
    ///
    /// A kind whose last member leaves disappears from the kind map.
    pub fn remove_entity(&mut self, id: E::Id) -> Option<E> {
        let slot = self.slots.remove(&id)?;
        let entity = self.entities.take(slot.entity)?;
        self.detach_kind(entity.kind(), slot.kind);
        if self.entities.needs_compaction() {
            let slots = &mut self.slots;
            self.entities.compact(|moved, index| {
                if let Some(slot) = slots.get_mut(&moved.id()) {
                    slot.entity = index;
                }
            });
        }
        self.grid.remove(id);
        self.removes += 1;
        Some(entity)
    }

    /// Replace the stored value for a tracked entity and re-bucket it.
    ///
    /// Returns `false` if the entity is not tracked or its new position is
    /// not finite; nothing changes in either case.
    pub fn update_entity(&mut self, entity: E) -> bool {
        let id = entity.id();
        let Some(&slot) = self.slots.get(&id) else {
            return false;
        };
        let Some(previous_kind) = self.entities.get(slot.entity).map(SpatialEntity::kind) else {
            return false;
        };
        let (x, y) = entity.position();
        match self.grid.move_to(id, x, y) {
            Ok(_) => {}
            Err(err) => {
                warn!(?id, %err, "refusing to move entity");
                return false;
            }
        }
        let kind = entity.kind();
        if previous_kind != kind {
            self.detach_kind(previous_kind, slot.kind);
            let index = self.by_kind.entry(kind).or_insert_with(Ordered::new).push(id);
            if let Some(slot) = self.slots.get_mut(&id) {
                slot.kind = index;
            }
        }
        if let Some(stored) = self.entities.get_mut(slot.entity) {
            *stored = entity;
        }
        self.updates += 1;
        true
    }

    /// Entities within `radius` of `(x, y)` accepted by `filter`, in grid order.
    pub fn nearby_entities(
        &self,
        x: f32,
        y: f32,
        radius: f32,
        filter: &QueryFilter<'_, E>,
    ) -> Vec<&E> {
        self.bump_queries();
        self.grid
            .query_radius(x, y, radius, |id| self.accepted(id, filter))
            .into_iter()
            .filter_map(|id| self.entity(id))
            .collect()
    }

    /// Entities inside `[x, x + w] × [y, y + h]` accepted by `filter`.
    pub fn entities_in_rect(
        &self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        filter: &QueryFilter<'_, E>,
    ) -> Vec<&E> {
        self.bump_queries();
        self.grid
            .query_rect(x, y, w, h, |id| self.accepted(id, filter))
            .into_iter()
            .filter_map(|id| self.entity(id))
            .collect()
    }

    /// Closest accepted entity within `max_radius`, if any.
    ///
    /// Ties keep the first candidate seen: grid order for a finite radius,
    /// insertion order for an unbounded one.
    pub fn find_nearest_entity(
        &self,
        x: f32,
        y: f32,
        max_radius: f32,
        filter: &QueryFilter<'_, E>,
    ) -> Option<&E> {
        self.bump_queries();
        if max_radius.is_nan() || max_radius < 0.0 || self.entities.is_empty() {
            return None;
        }
        let mut best: Option<(E::Id, OrderedFloat<f32>)> = None;
        let mut consider = |id: E::Id, dist_sq: OrderedFloat<f32>| {
            if best.is_none_or(|(_, best_sq)| dist_sq < best_sq) && self.accepted(id, filter) {
                best = Some((id, dist_sq));
            }
        };
        if max_radius.is_finite() {
            self.grid
                .neighbors_within((x, y), max_radius * max_radius, &mut consider);
        } else {
            for entity in self.entities.iter() {
                let (ex, ey) = entity.position();
                let (dx, dy) = (ex - x, ey - y);
                consider(entity.id(), OrderedFloat(dx * dx + dy * dy));
            }
        }
        best.and_then(|(id, _)| self.entity(id))
    }

    /// Clear the hash grid and re-insert every tracked entity.
    pub fn rebuild_grid(&mut self) -> Result<(), IndexError> {
        let entries: Vec<_> = self
            .entities
            .iter()
            .map(|entity| (entity.id(), entity.position()))
            .collect();
        self.grid.rebuild(&entries)?;
        info!(
            entities = self.entities.len(),
            cells = self.grid.cell_count(),
            cell_size = self.grid.cell_size(),
            "rebuilt spatial index",
        );
        Ok(())
    }

    /// Switch to a new cell size and re-bucket everything.
    pub fn set_cell_size(&mut self, cell_size: f32) -> Result<(), IndexError> {
        let mut grid = SpatialHashGrid::new(cell_size)?;
        let entries: Vec<_> = self
            .entities
            .iter()
            .map(|entity| (entity.id(), entity.position()))
            .collect();
        grid.rebuild(&entries)?;
        debug!(from = self.grid.cell_size(), to = cell_size, "changed index cell size");
        self.grid = grid;
        Ok(())
    }

    /// All tracked entities in insertion order.
    #[must_use]
    pub fn all_entities(&self) -> Vec<&E> {
        self.entities.iter().collect()
    }

    /// Tracked entities of `kind`, in the order they joined that kind.
    #[must_use]
    pub fn entities_by_kind(&self, kind: E::Kind) -> Vec<&E> {
        self.by_kind
            .get(&kind)
            .map(|ids| ids.iter().filter_map(|&id| self.entity(id)).collect())
            .unwrap_or_default()
    }

    /// Kinds with at least one tracked entity.
    pub fn kinds(&self) -> impl Iterator<Item = E::Kind> + '_ {
        self.by_kind.keys().copied()
    }

    #[must_use]
    pub fn entity(&self, id: E::Id) -> Option<&E> {
        self.slots
            .get(&id)
            .and_then(|slot| self.entities.get(slot.entity))
    }

    #[must_use]
    pub fn has_entity(&self, id: E::Id) -> bool {
        self.slots.contains_key(&id)
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn entity_count_by_kind(&self, kind: E::Kind) -> usize {
        self.by_kind.get(&kind).map_or(0, Ordered::len)
    }

    /// Drop every entity. Operation counters are kept.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.entities.clear();
        self.slots.clear();
        self.by_kind.clear();
    }

    #[must_use]
    pub fn counters(&self) -> OperationCounters {
        OperationCounters {
            adds: self.adds,
            removes: self.removes,
            updates: self.updates,
            queries: self.queries.get(),
        }
    }

    pub fn reset_stats(&mut self) {
        self.adds = 0;
        self.removes = 0;
        self.updates = 0;
        self.queries.set(0);
    }

    #[must_use]
    pub fn stats(&self) -> IndexStats<E::Kind> {
        IndexStats {
            total: self.entities.len(),
            by_kind: self
                .by_kind
                .iter()
                .map(|(&kind, ids)| (kind, ids.len()))
                .collect(),
            operations: self.counters(),
            grid: self.grid.stats(),
        }
    }

    #[must_use]
    pub fn grid(&self) -> &SpatialHashGrid<E::Id> {
        &self.grid
    }

    fn accepted(&self, id: E::Id, filter: &QueryFilter<'_, E>) -> bool {
        self.entity(id).is_some_and(|entity| filter.accepts(entity))
    }

    /// Drop the entry at `index` from the list of `kind`.
    fn detach_kind(&mut self, kind: E::Kind, index: usize) {
        let Some(ids) = self.by_kind.get_mut(&kind) else {
            return;
        };
        ids.take(index);
        if ids.is_empty() {
            self.by_kind.remove(&kind);
        } else if ids.needs_compaction() {
            let slots = &mut self.slots;
            ids.compact(|id, index| {
                if let Some(slot) = slots.get_mut(id) {
                    slot.kind = index;
                }
            });
        }
    }

    fn bump_queries(&self) {
        self.queries.set(self.queries.get() + 1);
    }
}
