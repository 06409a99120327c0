//! Spatial culling and hit testing
//!
//! Culling keeps per-frame work proportional to what is on screen. The
//! contract is a plain AABB-intersection filter; the R-tree (via `rstar`) is
//! an accelerator used above a configurable entity count and for hit tests.

use egui::{Pos2, Rect, Vec2};
use floorplan_types::{EntityKind, ExhibitionLayout};
use rstar::{RTree, RTreeObject, AABB};

use super::geometry::{self, Footprint};
use crate::config::CullingConfig;

// =============================================================================
// ENTITIES
// =============================================================================

/// Stable identity of a layout entity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}'", self.kind, self.id)
    }
}

/// Where an entity lives in the layout vectors.
/// Valid until the next index rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitySlot {
    Hall(usize),
    Stall { hall: usize, stall: usize },
    Fixture(usize),
    SitePath(usize),
    HallPath { hall: usize, path: usize },
}

/// Anything with a world-space bounding box
pub trait Bounded {
    fn aabb(&self) -> Rect;
}

/// Indexed entity
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    pub key: EntityKey,
    pub slot: EntitySlot,
    /// Draw order (layout order)
    pub order: usize,
    pub bounds: Rect,
    /// Exact shape for stall hit tests
    pub footprint: Footprint,
}

impl Bounded for SpatialEntry {
    fn aabb(&self) -> Rect {
        self.bounds
    }
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min.x, self.bounds.min.y],
            [self.bounds.max.x, self.bounds.max.y],
        )
    }
}

// =============================================================================
// CULLING
// =============================================================================

/// Entities whose AABB intersects `viewport_bounds` grown by `margin`.
/// Linear scan; output keeps input order.
pub fn visible_entities<'a, T: Bounded>(
    all: &'a [T],
    viewport_bounds: Rect,
    margin: f32,
) -> Vec<&'a T> {
    let query = viewport_bounds.expand(margin.max(0.0));
    all.iter().filter(|e| e.aabb().intersects(query)).collect()
}

/// Culling buffer in world units.
///
/// Proportional to the visible extent; shrinks while the user is dragging or
/// zooming, and again when zoomed far out.
pub fn adaptive_margin(
    visible_world: Rect,
    scale: f32,
    interacting: bool,
    config: &CullingConfig,
) -> f32 {
    let extent = visible_world.width().max(visible_world.height());
    if !extent.is_finite() {
        return 0.0;
    }
    let mut margin = extent * config.base_margin_ratio;
    if interacting {
        margin *= config.interacting_factor;
    }
    if scale < config.far_out_scale {
        margin *= config.far_out_factor;
    }
    margin.max(0.0)
}

// =============================================================================
// INDEX
// =============================================================================

/// R-tree over every valid layout entity
#[derive(Clone, Default)]
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
    count: usize,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("count", &self.count)
            .finish_non_exhaustive()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<SpatialEntry>) -> Self {
        let count = entries.len();
        Self {
            tree: RTree::bulk_load(entries),
            count,
        }
    }

    /// Rebuild after entities were added, removed or moved
    pub fn rebuild(&mut self, entries: Vec<SpatialEntry>) {
        self.count = entries.len();
        self.tree = RTree::bulk_load(entries);
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpatialEntry> {
        self.tree.iter()
    }

    pub fn find(&self, key: &EntityKey) -> Option<&SpatialEntry> {
        self.tree.iter().find(|e| &e.key == key)
    }

    /// Entries whose bounds intersect `rect`
    pub fn query_rect_intersecting(&self, rect: Rect) -> Vec<&SpatialEntry> {
        let envelope = AABB::from_corners([rect.min.x, rect.min.y], [rect.max.x, rect.max.y]);
        self.tree.locate_in_envelope_intersecting(&envelope).collect()
    }

    /// Culled entries in draw order.
    ///
    /// Scans linearly up to `config.rtree_threshold` entries, queries the
    /// tree above it; both yield the same set.
    pub fn visible(
        &self,
        viewport_bounds: Rect,
        margin: f32,
        config: &CullingConfig,
    ) -> Vec<&SpatialEntry> {
        let query = viewport_bounds.expand(margin.max(0.0));
        let mut hits: Vec<&SpatialEntry> = if self.count > config.rtree_threshold {
            self.query_rect_intersecting(query)
        } else {
            self.tree
                .iter()
                .filter(|e| e.bounds.intersects(query))
                .collect()
        };
        hits.sort_by_key(|e| e.order);
        hits
    }

    /// Topmost stall under `point` (world units), within `slop`
    pub fn hit_test_stall(&self, point: Pos2, slop: f32) -> Option<&SpatialEntry> {
        let probe = Rect::from_center_size(point, Vec2::splat(2.0 * slop.max(0.0)));
        self.query_rect_intersecting(probe)
            .into_iter()
            .filter(|e| e.key.kind == EntityKind::Stall)
            .filter(|e| e.footprint.iter().any(|r| r.expand(slop).contains(point)))
            .max_by_key(|e| e.order)
    }

    /// Stalls whose footprint intersects `rect` (rubber band)
    pub fn stalls_in_rect(&self, rect: Rect) -> Vec<&SpatialEntry> {
        let mut hits: Vec<&SpatialEntry> = self
            .query_rect_intersecting(rect)
            .into_iter()
            .filter(|e| e.key.kind == EntityKind::Stall)
            .filter(|e| geometry::footprint_intersects(&e.footprint, rect))
            .collect();
        hits.sort_by_key(|e| e.order);
        hits
    }
}

// =============================================================================
// BUILDING
// =============================================================================

/// Collect entries for every entity in the layout, in draw order:
/// halls, site paths, hall paths, stalls, fixtures.
///
/// `accept` decides per entity; rejected entities are neither drawn nor
/// hit-testable.
pub fn collect_entries(
    layout: &ExhibitionLayout,
    mut accept: impl FnMut(&EntityKey, EntitySlot) -> bool,
) -> Vec<SpatialEntry> {
    let mut entries = Vec::with_capacity(layout.stall_count() + layout.halls.len() + layout.fixtures.len());
    let mut push = |key: EntityKey, slot: EntitySlot, footprint: Footprint| {
        if accept(&key, slot) {
            let order = entries.len();
            entries.push(SpatialEntry {
                key,
                slot,
                order,
                bounds: geometry::bounds_of(&footprint),
                footprint,
            });
        }
    };

    for (h, hall) in layout.halls.iter().enumerate() {
        push(
            EntityKey::new(EntityKind::Hall, &hall.id),
            EntitySlot::Hall(h),
            Footprint::from_elem(geometry::hall_bounds(hall), 1),
        );
    }
    for (p, path) in layout.paths.iter().enumerate() {
        push(
            EntityKey::new(EntityKind::Path, &path.id),
            EntitySlot::SitePath(p),
            Footprint::from_elem(geometry::path_bounds(path), 1),
        );
    }
    for (h, hall) in layout.halls.iter().enumerate() {
        for (p, path) in hall.paths.iter().enumerate() {
            push(
                EntityKey::new(EntityKind::Path, &path.id),
                EntitySlot::HallPath { hall: h, path: p },
                Footprint::from_elem(geometry::path_bounds(path), 1),
            );
        }
    }
    for (h, hall) in layout.halls.iter().enumerate() {
        for (s, stall) in hall.stalls.iter().enumerate() {
            push(
                EntityKey::new(EntityKind::Stall, &stall.id),
                EntitySlot::Stall { hall: h, stall: s },
                geometry::stall_footprint(hall, stall),
            );
        }
    }
    for (f, fixture) in layout.fixtures.iter().enumerate() {
        push(
            EntityKey::new(EntityKind::Fixture, &fixture.id),
            EntitySlot::Fixture(f),
            Footprint::from_elem(geometry::fixture_bounds(fixture), 1),
        );
    }
    entries
}
