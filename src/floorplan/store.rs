//! Layout Store - the single mutable state container
//!
//! Owns geometry, viewport, selection and connection status. The interaction
//! controller schedules viewport/selection updates which are committed once
//! per redraw cycle (last value wins per field); sync events are applied
//! immediately and to completion. The renderer only reads.

use std::collections::{HashMap, HashSet};

use egui::{Pos2, Rect, Vec2};
use floorplan_types::{
    BookingRequest, ExhibitionLayout, Fixture, Hall, PathSegment, Stall, SyncEvent,
};
use rust_decimal::Decimal;

use super::geometry;
use super::selection::{SelectionState, StallLookup, Toggle};
use super::spatial::{self, EntityKey, EntitySlot, SpatialEntry, SpatialIndex};
use super::viewport::Viewport;
use crate::config::CullingConfig;
use crate::error::{GeometryError, SyncError, SyncResult};
use crate::sync::{patch, ConnectionStatus};

// =============================================================================
// EVENTS
// =============================================================================

/// Notifications for the host page, drained once per frame
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// Unauthenticated viewer tried to select; show the login prompt
    LoginRequired,
    /// Selected stalls were booked or removed by someone else
    SelectionEvicted {
        stall_ids: Vec<String>,
        stall_numbers: Vec<String>,
    },
    ConnectionChanged(ConnectionStatus),
    /// Entity excluded from rendering and hit testing
    MalformedGeometry {
        entity: EntityKey,
        error: GeometryError,
    },
    /// Offline long enough that a fresh snapshot is advisable
    SnapshotRecommended { offline_for_ms: u64 },
    BookingRequested(BookingRequest),
}

// =============================================================================
// LAYOUT MODEL
// =============================================================================

/// Resolved entity borrowed from the layout
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Hall(&'a Hall),
    Stall(&'a Hall, &'a Stall),
    Fixture(&'a Fixture),
    Path(&'a PathSegment),
}

/// Layout snapshot plus a stall id index
#[derive(Debug, Clone)]
pub struct LayoutModel {
    layout: ExhibitionLayout,
    stalls: HashMap<String, (usize, usize)>,
}

impl LayoutModel {
    pub fn new(layout: ExhibitionLayout) -> Self {
        let mut model = Self {
            layout,
            stalls: HashMap::new(),
        };
        model.reindex();
        model
    }

    fn reindex(&mut self) {
        self.stalls.clear();
        for (h, hall) in self.layout.halls.iter().enumerate() {
            for (s, stall) in hall.stalls.iter().enumerate() {
                if self.stalls.insert(stall.id.clone(), (h, s)).is_some() {
                    tracing::warn!(stall_id = %stall.id, "duplicate stall id, last one wins");
                }
            }
        }
    }

    pub fn layout(&self) -> &ExhibitionLayout {
        &self.layout
    }

    pub fn stall_with_hall(&self, id: &str) -> Option<(&Hall, &Stall)> {
        let (h, s) = *self.stalls.get(id)?;
        let hall = self.layout.halls.get(h)?;
        hall.stalls.get(s).map(|stall| (hall, stall))
    }

    pub fn resolve(&self, slot: EntitySlot) -> Option<EntityRef<'_>> {
        let l = &self.layout;
        match slot {
            EntitySlot::Hall(h) => l.halls.get(h).map(EntityRef::Hall),
            EntitySlot::Stall { hall, stall } => {
                let hall = l.halls.get(hall)?;
                hall.stalls.get(stall).map(|s| EntityRef::Stall(hall, s))
            }
            EntitySlot::Fixture(f) => l.fixtures.get(f).map(EntityRef::Fixture),
            EntitySlot::SitePath(p) => l.paths.get(p).map(EntityRef::Path),
            EntitySlot::HallPath { hall, path } => {
                l.halls.get(hall)?.paths.get(path).map(EntityRef::Path)
            }
        }
    }

    fn validate(&self, slot: EntitySlot) -> Result<(), GeometryError> {
        match self.resolve(slot) {
            Some(EntityRef::Hall(hall)) => geometry::validate_hall(hall),
            Some(EntityRef::Stall(hall, stall)) => geometry::validate_stall_in_hall(hall, stall),
            Some(EntityRef::Fixture(fixture)) => geometry::validate_fixture(fixture),
            Some(EntityRef::Path(path)) => geometry::validate_path(path),
            None => Ok(()),
        }
    }
}

impl StallLookup for LayoutModel {
    fn stall(&self, id: &str) -> Option<&Stall> {
        self.stall_with_hall(id).map(|(_, stall)| stall)
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug)]
pub struct LayoutStore {
    model: Option<LayoutModel>,
    index: SpatialIndex,
    excluded: HashSet<EntityKey>,
    geometry_revision: u64,

    viewport: Viewport,
    viewport_size: Vec2,
    selection: SelectionState,
    pending_viewport: Option<Viewport>,
    pending_selection: Option<SelectionState>,

    connection: ConnectionStatus,
    offline_since_ms: Option<u64>,
    last_offline_gap_ms: Option<u64>,
    staleness_threshold_ms: u64,

    events: Vec<ViewerEvent>,
}

impl Default for LayoutStore {
    fn default() -> Self {
        Self::new(crate::config::SyncConfig::default().staleness_threshold_ms)
    }
}

impl LayoutStore {
    pub fn new(staleness_threshold_ms: u64) -> Self {
        Self {
            model: None,
            index: SpatialIndex::new(),
            excluded: HashSet::new(),
            geometry_revision: 0,
            viewport: Viewport::default(),
            viewport_size: Vec2::ZERO,
            selection: SelectionState::new(),
            pending_viewport: None,
            pending_selection: None,
            connection: ConnectionStatus::Connecting,
            offline_since_ms: None,
            last_offline_gap_ms: None,
            staleness_threshold_ms,
            events: Vec::new(),
        }
    }

    // =========================================================================
    // LAYOUT
    // =========================================================================

    /// Replace the snapshot. Viewport and selection reset.
    pub fn load_layout(&mut self, layout: ExhibitionLayout) {
        tracing::info!(
            exhibition_id = %layout.exhibition_id,
            halls = layout.halls.len(),
            stalls = layout.stall_count(),
            fixtures = layout.fixtures.len(),
            "layout loaded"
        );
        self.model = Some(LayoutModel::new(layout));
        self.viewport = Viewport::default();
        self.selection = SelectionState::new();
        self.pending_viewport = None;
        self.pending_selection = None;
        self.excluded.clear();
        self.rebuild_index();
    }

    pub fn model(&self) -> Option<&LayoutModel> {
        self.model.as_ref()
    }

    pub fn layout(&self) -> Option<&ExhibitionLayout> {
        self.model.as_ref().map(LayoutModel::layout)
    }

    pub fn layout_bounds(&self) -> Option<Rect> {
        self.layout().map(geometry::layout_bounds)
    }

    pub fn stall(&self, id: &str) -> Option<&Stall> {
        self.model.as_ref()?.stall(id)
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn is_excluded(&self, key: &EntityKey) -> bool {
        self.excluded.contains(key)
    }

    /// Bumped whenever the spatial index is rebuilt
    pub fn geometry_revision(&self) -> u64 {
        self.geometry_revision
    }

    fn rebuild_index(&mut self) {
        let Some(model) = &self.model else {
            self.index.clear();
            return;
        };

        let previously_excluded = &self.excluded;
        let mut excluded = HashSet::new();
        let mut newly_excluded = Vec::new();
        let entries = spatial::collect_entries(model.layout(), |key, slot| match model.validate(slot) {
            Ok(()) => true,
            Err(error) => {
                if !previously_excluded.contains(key) {
                    newly_excluded.push((key.clone(), error));
                }
                excluded.insert(key.clone());
                false
            }
        });

        self.index.rebuild(entries);
        self.excluded = excluded;
        self.geometry_revision += 1;

        for (entity, error) in newly_excluded {
            tracing::warn!(entity = %entity, error = %error, "malformed geometry excluded");
            self.events
                .push(ViewerEvent::MalformedGeometry { entity, error });
        }
    }

    // =========================================================================
    // SYNC
    // =========================================================================

    /// Patch one entity by id, then evict any selection it invalidated.
    /// Both happen before the next render reads the store.
    pub fn apply_sync_event(&mut self, event: &SyncEvent) -> SyncResult<()> {
        let model = self.model.as_mut().ok_or(SyncError::NoLayout)?;
        let expected = model.layout.exhibition_id;
        if event.exhibition_id != expected {
            return Err(SyncError::WrongExhibition {
                expected,
                got: event.exhibition_id,
            });
        }

        let outcome = patch::apply_event(&mut model.layout, event)?;
        tracing::debug!(
            kind = %event.entity_kind,
            id = %event.entity_id,
            op = ?event.op,
            geometry_changed = outcome.geometry_changed,
            "sync event applied"
        );
        if outcome.geometry_changed {
            model.reindex();
            self.rebuild_index();
        }
        self.evict_stale_selection();
        Ok(())
    }

    fn evict_stale_selection(&mut self) {
        let Some(model) = &self.model else {
            return;
        };
        let mut evicted = self.selection.evict_unavailable(model);
        if let Some(pending) = &mut self.pending_selection {
            for id in pending.evict_unavailable(model) {
                if !evicted.contains(&id) {
                    evicted.push(id);
                }
            }
        }
        if evicted.is_empty() {
            return;
        }

        let stall_numbers = evicted
            .iter()
            .map(|id| {
                model
                    .stall(id)
                    .map_or_else(|| id.clone(), |s| s.stall_number.clone())
            })
            .collect();
        tracing::info!(stalls = ?evicted, "selected stalls no longer available");
        self.events.push(ViewerEvent::SelectionEvicted {
            stall_ids: evicted,
            stall_numbers,
        });
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    /// Length of the most recent offline gap, once back online
    pub fn last_offline_gap_ms(&self) -> Option<u64> {
        self.last_offline_gap_ms
    }

    pub fn set_connection(&mut self, status: ConnectionStatus, now_ms: u64) {
        if status == self.connection {
            return;
        }
        tracing::info!(from = self.connection.as_str(), to = status.as_str(), "sync connection");
        self.connection = status;

        match status {
            ConnectionStatus::Offline => {
                self.offline_since_ms.get_or_insert(now_ms);
            }
            ConnectionStatus::Online => {
                if let Some(since) = self.offline_since_ms.take() {
                    let gap = now_ms.saturating_sub(since);
                    self.last_offline_gap_ms = Some(gap);
                    if gap > self.staleness_threshold_ms {
                        tracing::warn!(offline_ms = gap, "local layout may be stale");
                        self.events
                            .push(ViewerEvent::SnapshotRecommended { offline_for_ms: gap });
                    }
                }
            }
            ConnectionStatus::Connecting => {}
        }
        self.events.push(ViewerEvent::ConnectionChanged(status));
    }

    // =========================================================================
    // VIEWPORT
    // =========================================================================

    /// Committed viewport (what the renderer sees)
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Pending viewport if any, else committed
    pub fn effective_viewport(&self) -> Viewport {
        self.pending_viewport.unwrap_or(self.viewport)
    }

    pub fn schedule_viewport(&mut self, viewport: Viewport) {
        self.pending_viewport = Some(viewport);
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport_size
    }

    pub fn set_viewport_size(&mut self, size: Vec2) {
        self.viewport_size = size;
    }

    /// Culled entries for the committed viewport, in draw order
    pub fn visible_entries(&self, interacting: bool, config: &CullingConfig) -> Vec<&SpatialEntry> {
        let world = self.viewport.visible_world_rect(self.viewport_size);
        let margin = spatial::adaptive_margin(
            world,
            self.viewport.scale,
            interacting || self.viewport.is_dragging,
            config,
        );
        self.index.visible(world, margin, config)
    }

    /// Stall id under a world point
    pub fn stall_at(&self, world: Pos2, slop: f32) -> Option<&str> {
        self.index
            .hit_test_stall(world, slop)
            .map(|entry| entry.key.id.as_str())
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Committed selection (what the renderer sees)
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn effective_selection(&self) -> &SelectionState {
        self.pending_selection.as_ref().unwrap_or(&self.selection)
    }

    pub fn toggle_stall(&mut self, id: &str) -> Toggle {
        let Some(model) = &self.model else {
            return Toggle::Rejected;
        };
        self.pending_selection
            .get_or_insert_with(|| self.selection.clone())
            .toggle(id, model)
    }

    pub fn add_stalls<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> usize {
        let Some(model) = &self.model else {
            return 0;
        };
        self.pending_selection
            .get_or_insert_with(|| self.selection.clone())
            .add_available(ids, model)
    }

    pub fn clear_selection(&mut self) {
        if self.effective_selection().is_empty() {
            return;
        }
        self.pending_selection
            .get_or_insert_with(|| self.selection.clone())
            .clear();
    }

    pub fn set_hovered(&mut self, id: Option<String>) {
        if self.effective_selection().hovered() == id.as_deref() {
            return;
        }
        self.pending_selection
            .get_or_insert_with(|| self.selection.clone())
            .set_hovered(id);
    }

    pub fn selection_total(&self) -> Decimal {
        match &self.model {
            Some(model) => self.selection.total(model),
            None => Decimal::ZERO,
        }
    }

    /// Committed selection packaged for checkout
    pub fn booking_request(&self) -> Option<BookingRequest> {
        let model = self.model.as_ref()?;
        if self.selection.is_empty() {
            return None;
        }
        Some(BookingRequest {
            exhibition_id: model.layout.exhibition_id,
            stall_ids: self.selection.ids().map(str::to_string).collect(),
            total: self.selection.total(model),
        })
    }

    // =========================================================================
    // FRAME
    // =========================================================================

    /// Apply pending viewport/selection together. Returns true if anything changed.
    pub fn commit_frame(&mut self) -> bool {
        let mut changed = false;
        if let Some(viewport) = self.pending_viewport.take() {
            changed |= viewport != self.viewport;
            self.viewport = viewport;
        }
        if let Some(selection) = self.pending_selection.take() {
            changed |= selection != self.selection;
            self.selection = selection;
        }
        changed
    }

    pub fn has_pending(&self) -> bool {
        self.pending_viewport.is_some() || self.pending_selection.is_some()
    }

    pub fn push_event(&mut self, event: ViewerEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    pub fn entity_count(&self) -> usize {
        self.index.len()
    }

    pub fn has_layout(&self) -> bool {
        self.model.is_some()
    }

    pub fn exhibition_id(&self) -> Option<uuid::Uuid> {
        self.layout().map(|l| l.exhibition_id)
    }
}
