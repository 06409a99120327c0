//! Interaction controller
//!
//! Turns pointer, wheel, touch and key input into scheduled viewport and
//! selection updates on the [`LayoutStore`]. Handlers never render; they
//! schedule and return. Pan and zoom each go through a last-value-wins
//! [`Coalescer`] drained by [`InteractionController::tick`] once per frame.
//!
//! ```text
//!            PointerDown            drag > threshold
//!   Idle ──────────────► Panning ─────────────────► Panning{dragged}
//!    ▲  │ shift+down        │ up (no drag) = click        │ up / leave
//!    │  └──────► RubberBand ┴────────────────────────────►┘
//!    │  wheel / two fingers
//!    └──────── Zooming (until the coalescer drains or a finger lifts)
//! ```

use egui::{Key, Modifiers, Pos2, Rect, TouchPhase};

use super::gesture::{PinchTracker, PinchUpdate};
use super::selection::Toggle;
use super::store::{LayoutStore, ViewerEvent};
use super::throttle::Coalescer;
use super::viewport::{ScaleLimits, Viewport};
use crate::config::{InteractionConfig, ViewerConfig, ViewportConfig};

/// Input in canvas-relative screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Pos2, modifiers: Modifiers },
    PointerMove { pos: Pos2 },
    PointerUp { pos: Pos2 },
    PointerLeave,
    Wheel { pos: Pos2, delta_y: f32 },
    Touch { id: u64, phase: TouchPhase, pos: Pos2 },
    Key { key: Key, modifiers: Modifiers },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Panning {
        anchor: Pos2,
        start: Viewport,
        dragged: bool,
    },
    Zooming,
    RubberBand {
        start: Pos2,
        current: Pos2,
    },
}

/// Zoom step waiting for the next flush
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomIntent {
    pub anchor: Pos2,
    pub factor: f32,
    /// Finger distance the factor was computed at (pinch only)
    pub pinch_distance: Option<f32>,
}

#[derive(Debug)]
pub struct InteractionController {
    state: InteractionState,
    pan: Coalescer<Viewport>,
    zoom: Coalescer<ZoomIntent>,
    pinch: PinchTracker,
    limits: ScaleLimits,
    viewport_config: ViewportConfig,
    config: InteractionConfig,
    /// False for unauthenticated viewers
    can_select: bool,
}

impl InteractionController {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            state: InteractionState::Idle,
            pan: Coalescer::new(config.throttle.pan_interval_ms),
            zoom: Coalescer::new(config.throttle.zoom_interval_ms),
            pinch: PinchTracker::new(),
            limits: ScaleLimits::from(&config.viewport),
            viewport_config: config.viewport.clone(),
            config: config.interaction.clone(),
            can_select: true,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn set_can_select(&mut self, can_select: bool) {
        self.can_select = can_select;
    }

    pub fn can_select(&self) -> bool {
        self.can_select
    }

    /// Dragging or zooming; culling widens its margin less while true
    pub fn is_interacting(&self) -> bool {
        matches!(
            self.state,
            InteractionState::Panning { dragged: true, .. } | InteractionState::Zooming
        ) || self.pinch.is_pinching()
    }

    /// Throttled work still waiting; the host should keep repainting
    pub fn has_pending(&self) -> bool {
        self.pan.has_pending() || self.zoom.has_pending()
    }

    /// Rubber band in canvas screen coordinates
    pub fn rubber_band(&self) -> Option<Rect> {
        match self.state {
            InteractionState::RubberBand { start, current } => {
                Some(Rect::from_two_pos(start, current))
            }
            _ => None,
        }
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    pub fn handle_input(&mut self, event: InputEvent, now_ms: u64, store: &mut LayoutStore) {
        match event {
            InputEvent::PointerDown { pos, modifiers } => self.pointer_down(pos, modifiers, store),
            InputEvent::PointerMove { pos } => self.pointer_move(pos, now_ms, store),
            InputEvent::PointerUp { pos } => self.pointer_up(pos, store),
            InputEvent::PointerLeave => self.pointer_leave(store),
            InputEvent::Wheel { pos, delta_y } => self.wheel(pos, delta_y, now_ms),
            InputEvent::Touch { id, phase, pos } => self.touch(id, phase, pos, now_ms, store),
            InputEvent::Key { key, modifiers } => self.key(key, modifiers, store),
        }
    }

    /// Release throttled pan/zoom whose interval has elapsed
    pub fn tick(&mut self, now_ms: u64, store: &mut LayoutStore) {
        if let Some(target) = self.pan.poll(now_ms) {
            store.schedule_viewport(target);
        }
        if let Some(intent) = self.zoom.poll(now_ms) {
            self.apply_zoom(intent, store);
        }
        if self.state == InteractionState::Zooming
            && !self.zoom.has_pending()
            && !self.pinch.is_pinching()
        {
            self.state = InteractionState::Idle;
        }
    }

    /// Schedule a fit of the whole layout into the current canvas
    pub fn fit_to_layout(&mut self, store: &mut LayoutStore) -> bool {
        let Some(bounds) = store.layout_bounds() else {
            return false;
        };
        let size = store.viewport_size();
        if size.x <= 0.0 || size.y <= 0.0 {
            return false;
        }
        self.pan.cancel();
        self.zoom.cancel();
        store.schedule_viewport(Viewport::fit_to_bounds(
            bounds,
            size,
            self.viewport_config.fit_padding,
            self.limits,
        ));
        true
    }

    fn pointer_down(&mut self, pos: Pos2, modifiers: Modifiers, store: &LayoutStore) {
        if self.pinch.touch_count() >= 2 {
            return;
        }
        self.state = if modifiers.shift {
            InteractionState::RubberBand {
                start: pos,
                current: pos,
            }
        } else {
            InteractionState::Panning {
                anchor: pos,
                start: store.effective_viewport(),
                dragged: false,
            }
        };
    }

    fn pointer_move(&mut self, pos: Pos2, now_ms: u64, store: &mut LayoutStore) {
        if self.state == InteractionState::Idle {
            let hovered = self.stall_under(pos, store);
            store.set_hovered(hovered);
            return;
        }
        match &mut self.state {
            InteractionState::Panning {
                anchor,
                start,
                dragged,
            } => {
                let delta = pos - *anchor;
                if !*dragged && delta.length() < self.config.drag_threshold_px {
                    return;
                }
                *dragged = true;
                self.pan.offer(start.panned(delta).with_dragging(true), now_ms);
            }
            InteractionState::RubberBand { current, .. } => *current = pos,
            InteractionState::Idle | InteractionState::Zooming => {}
        }
    }

    fn pointer_up(&mut self, pos: Pos2, store: &mut LayoutStore) {
        match std::mem::take(&mut self.state) {
            InteractionState::Panning {
                anchor,
                start,
                dragged: true,
            } => {
                self.pan.cancel();
                store.schedule_viewport(start.panned(pos - anchor).with_dragging(false));
            }
            InteractionState::Panning { dragged: false, .. } => self.click(pos, store),
            InteractionState::RubberBand { start, .. } => {
                if (pos - start).length() < self.config.drag_threshold_px {
                    self.click(pos, store);
                } else {
                    self.select_band(Rect::from_two_pos(start, pos), store);
                }
            }
            state @ InteractionState::Zooming => self.state = state,
            InteractionState::Idle => {}
        }
    }

    fn pointer_leave(&mut self, store: &mut LayoutStore) {
        self.abandon_drag(store);
        if !matches!(self.state, InteractionState::Zooming) {
            self.state = InteractionState::Idle;
        }
        store.set_hovered(None);
    }

    fn wheel(&mut self, pos: Pos2, delta_y: f32, now_ms: u64) {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let step = self.viewport_config.wheel_zoom_step;
        let factor = if delta_y > 0.0 { step } else { 1.0 / step };
        self.zoom.offer(
            ZoomIntent {
                anchor: pos,
                factor,
                pinch_distance: None,
            },
            now_ms,
        );
        if self.state == InteractionState::Idle {
            self.state = InteractionState::Zooming;
        }
    }

    fn touch(
        &mut self,
        id: u64,
        phase: TouchPhase,
        pos: Pos2,
        now_ms: u64,
        store: &mut LayoutStore,
    ) {
        match self.pinch.handle(id, phase, pos) {
            PinchUpdate::Started => {
                self.abandon_drag(store);
                self.zoom.cancel();
                self.state = InteractionState::Zooming;
            }
            PinchUpdate::Moved {
                center,
                distance,
                factor,
            } => {
                self.zoom.offer(
                    ZoomIntent {
                        anchor: center,
                        factor,
                        pinch_distance: Some(distance),
                    },
                    now_ms,
                );
                self.state = InteractionState::Zooming;
            }
            PinchUpdate::Lost => {
                tracing::debug!(touches = self.pinch.touch_count(), "pinch lost, pending zoom dropped");
                self.zoom.cancel();
                self.state = InteractionState::Idle;
            }
            PinchUpdate::None => {}
        }
    }

    fn key(&mut self, key: Key, modifiers: Modifiers, store: &mut LayoutStore) {
        let command = modifiers.command || modifiers.ctrl || modifiers.mac_cmd;
        match key {
            Key::Escape => {
                self.abandon_drag(store);
                store.clear_selection();
                if !matches!(self.state, InteractionState::Zooming) {
                    self.state = InteractionState::Idle;
                }
            }
            Key::Num0 if command => {
                self.fit_to_layout(store);
            }
            Key::Plus | Key::Equals if command => {
                self.zoom_about_centre(self.viewport_config.zoom_step, store);
            }
            Key::Minus if command => {
                self.zoom_about_centre(1.0 / self.viewport_config.zoom_step, store);
            }
            _ => {}
        }
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// End a drag early: drop the pending pan, keep the last flushed viewport
    fn abandon_drag(&mut self, store: &mut LayoutStore) {
        if let InteractionState::Panning { dragged: true, .. } = self.state {
            self.pan.cancel();
            store.schedule_viewport(store.effective_viewport().with_dragging(false));
        }
    }

    fn apply_zoom(&mut self, intent: ZoomIntent, store: &mut LayoutStore) {
        if matches!(self.state, InteractionState::Panning { .. }) {
            if let Some(target) = self.pan.flush() {
                store.schedule_viewport(target);
            }
        }
        let current = store.effective_viewport();
        let next = current.zoom_at(intent.anchor, intent.factor, self.limits);
        store.schedule_viewport(next);
        // later drag steps continue from the zoomed viewport
        if let InteractionState::Panning { start, .. } = &mut self.state {
            *start = next.panned(start.offset - current.offset);
        }
        if let Some(distance) = intent.pinch_distance {
            self.pinch.mark_applied(distance);
        }
    }

    fn zoom_about_centre(&mut self, factor: f32, store: &mut LayoutStore) {
        let centre = (store.viewport_size() / 2.0).to_pos2();
        self.zoom.cancel();
        self.apply_zoom(
            ZoomIntent {
                anchor: centre,
                factor,
                pinch_distance: None,
            },
            store,
        );
    }

    fn stall_under(&self, pos: Pos2, store: &LayoutStore) -> Option<String> {
        let viewport = store.effective_viewport();
        let world = viewport.screen_to_world(pos);
        let slop = self.config.hit_slop_px / viewport.scale;
        store.stall_at(world, slop).map(str::to_string)
    }

    fn click(&mut self, pos: Pos2, store: &mut LayoutStore) {
        let Some(id) = self.stall_under(pos, store) else {
            store.clear_selection();
            return;
        };
        let available = store.stall(&id).is_some_and(|s| s.status.is_available());
        if !available {
            tracing::debug!(stall_id = %id, "click on unavailable stall ignored");
            return;
        }
        if !self.can_select {
            store.push_event(ViewerEvent::LoginRequired);
            return;
        }
        if store.toggle_stall(&id) == Toggle::Rejected {
            tracing::debug!(stall_id = %id, "selection rejected");
        }
    }

    fn select_band(&mut self, screen: Rect, store: &mut LayoutStore) {
        let world = store.effective_viewport().screen_rect_to_world(screen);
        let ids: Vec<String> = store
            .index()
            .stalls_in_rect(world)
            .into_iter()
            .map(|entry| entry.key.id.clone())
            .collect();
        let any_available = ids
            .iter()
            .any(|id| store.stall(id).is_some_and(|s| s.status.is_available()));
        if !any_available {
            return;
        }
        if !self.can_select {
            store.push_event(ViewerEvent::LoginRequired);
            return;
        }
        let added = store.add_stalls(ids.iter().map(String::as_str));
        tracing::debug!(candidates = ids.len(), added, "rubber band selection");
    }
}
