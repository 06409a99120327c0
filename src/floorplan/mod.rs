//! Floor-plan canvas
//!
//! # Architecture
//!
//! ```text
//! ExhibitionLayout (from the layout API)
//!        │
//!        ▼
//! LayoutStore ◄── SyncHandle::drain_into (live patches)
//!   │  ▲
//!   │  └── InteractionController (pending viewport / selection)
//!   │
//!   ├──► SpatialIndex::visible (culling, adaptive margin)
//!   ├──► lod_for (LodTier)
//!   └──► render() ──► Scene ──► paint_scene(egui::Painter)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let mut view = FloorPlanView::new(ViewerConfig::from_env());
//! view.load_layout(layout);
//! view.attach_sync(SyncChannel::spawn(transport, exhibition_id, &config.sync));
//! view.ui(ui);
//! for event in view.drain_events() { /* toasts, login prompt, checkout */ }
//! ```

pub mod colors;
pub mod geometry;
pub mod gesture;
pub mod icons;
pub mod input;
pub mod lod;
pub mod paint;
pub mod render;
pub mod selection;
pub mod spatial;
pub mod store;
pub mod throttle;
pub mod viewport;

use egui::{Align2, FontId, PointerButton, Pos2, Rect, Response, Sense, Vec2};
use floorplan_types::{BookingRequest, ExhibitionLayout};

pub use icons::{IconCache, IconLookup, IconResolver, IconState};
pub use input::{InputEvent, InteractionController, InteractionState};
pub use lod::LodTier;
pub use render::{DrawCommand, Scene};
pub use selection::SelectionState;
pub use spatial::{EntityKey, SpatialIndex};
pub use store::{LayoutModel, LayoutStore, ViewerEvent};
pub use viewport::{ScaleLimits, Viewport};

use crate::config::ViewerConfig;
use crate::sync::{ConnectionStatus, SyncHandle};

const SYNC_POLL: std::time::Duration = std::time::Duration::from_millis(100);
const CHROME_TEXT: egui::Color32 = egui::Color32::from_rgb(97, 97, 97);

/// Floor-plan widget: store, controller, icon cache and an optional live feed
#[derive(Debug)]
pub struct FloorPlanView {
    config: ViewerConfig,
    store: LayoutStore,
    controller: InteractionController,
    icons: IconCache,
    sync: Option<SyncHandle>,
    needs_initial_fit: bool,
}

impl FloorPlanView {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            store: LayoutStore::new(config.sync.staleness_threshold_ms),
            controller: InteractionController::new(&config),
            icons: IconCache::new(),
            sync: None,
            needs_initial_fit: false,
            config,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Replace the snapshot; the next frame fits it to the canvas
    pub fn load_layout(&mut self, layout: ExhibitionLayout) {
        if let Some(sync) = &self.sync {
            if sync.exhibition_id() != layout.exhibition_id {
                tracing::warn!(
                    feed = %sync.exhibition_id(),
                    layout = %layout.exhibition_id,
                    "sync feed belongs to another exhibition, detaching"
                );
                self.sync = None;
            }
        }
        self.store.load_layout(layout);
        self.needs_initial_fit = true;
    }

    /// Start applying a live feed. A previously attached feed is dropped.
    pub fn attach_sync(&mut self, handle: SyncHandle) {
        tracing::info!(exhibition_id = %handle.exhibition_id(), "sync feed attached");
        self.sync = Some(handle);
    }

    pub fn detach_sync(&mut self) -> Option<SyncHandle> {
        self.sync.take()
    }

    /// Unauthenticated viewers can look but selecting asks for login
    pub fn set_authenticated(&mut self, authenticated: bool) {
        self.controller.set_can_select(authenticated);
    }

    pub fn handle_input(&mut self, event: InputEvent, now_ms: u64) {
        self.controller.handle_input(event, now_ms, &mut self.store);
    }

    pub fn fit_to_layout(&mut self) {
        self.controller.fit_to_layout(&mut self.store);
    }

    /// One redraw cycle: apply sync, release throttled input, commit, then
    /// cull, pick LOD and render against the committed state.
    pub fn frame(&mut self, now_ms: u64, viewport_size: Vec2) -> Scene {
        self.store.set_viewport_size(viewport_size);
        if let Some(sync) = &self.sync {
            sync.drain_into(&mut self.store, now_ms);
        }
        if self.needs_initial_fit && self.controller.fit_to_layout(&mut self.store) {
            self.needs_initial_fit = false;
        }
        self.controller.tick(now_ms, &mut self.store);
        self.store.commit_frame();

        let viewport = *self.store.viewport();
        let lod = lod::lod_for(viewport.scale, &self.config.lod);
        let Some(model) = self.store.model() else {
            return Scene::empty(lod);
        };
        let visible = self
            .store
            .visible_entries(self.controller.is_interacting(), &self.config.culling);
        let scene = render::render(&render::RenderInput {
            model,
            visible: &visible,
            lod,
            selection: self.store.selection(),
            viewport: &viewport,
            viewport_size,
            icons: &self.icons,
            rubber_band: self.controller.rubber_band(),
            options: &self.config.render,
        });
        for url in &scene.icon_requests {
            self.icons.request(url);
        }
        scene
    }

    /// Package the committed selection for checkout
    pub fn request_booking(&mut self) -> Option<BookingRequest> {
        let request = self.store.booking_request()?;
        tracing::info!(
            stalls = request.stall_ids.len(),
            total = %request.total,
            "booking requested"
        );
        self.store
            .push_event(ViewerEvent::BookingRequested(request.clone()));
        Some(request)
    }

    pub fn drain_events(&mut self) -> Vec<ViewerEvent> {
        self.store.drain_events()
    }

    pub fn store(&self) -> &LayoutStore {
        &self.store
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn icons_mut(&mut self) -> &mut IconCache {
        &mut self.icons
    }

    /// Main UI function
    pub fn ui(&mut self, ui: &mut egui::Ui) -> Response {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        let (now_ms, events, hover) =
            ui.input(|i| ((i.time * 1000.0) as u64, i.events.clone(), i.pointer.hover_pos()));

        let hovered = response.hovered();
        for event in &events {
            if let Some(input) = translate_event(event, rect, hover, hovered) {
                self.handle_input(input, now_ms);
            }
        }

        let scene = self.frame(now_ms, rect.size());
        painter.rect_filled(rect, 0.0, colors::CANVAS_BG);
        paint::paint_scene(&painter, rect.min.to_vec2(), &scene);
        self.paint_chrome(&painter, rect);

        if self.controller.has_pending() || self.store.has_pending() {
            ui.ctx().request_repaint();
        } else if self.sync.is_some() {
            // keep draining the feed while idle
            ui.ctx().request_repaint_after(SYNC_POLL);
        }
        response
    }

    fn paint_chrome(&self, painter: &egui::Painter, rect: Rect) {
        let zoom_text = format!("Zoom: {:.0}%", self.store.viewport().zoom_percent());
        painter.text(
            rect.left_bottom() + Vec2::new(10.0, -30.0),
            Align2::LEFT_BOTTOM,
            zoom_text,
            FontId::proportional(11.0),
            CHROME_TEXT,
        );

        let hints = "Drag: Pan | Scroll: Zoom | Click: Select | Shift+Drag: Band | Esc: Clear | Ctrl+0: Fit";
        painter.text(
            rect.left_bottom() + Vec2::new(10.0, -10.0),
            Align2::LEFT_BOTTOM,
            hints,
            FontId::proportional(10.0),
            CHROME_TEXT,
        );

        let selection = self.store.selection();
        if !selection.is_empty() {
            painter.text(
                rect.left_top() + Vec2::new(10.0, 20.0),
                Align2::LEFT_TOP,
                format!(
                    "{} stalls selected | Total: {}",
                    selection.len(),
                    self.store.selection_total()
                ),
                FontId::proportional(12.0),
                colors::SELECTED_BORDER,
            );
        }

        let status = match self.store.connection() {
            ConnectionStatus::Online => None,
            ConnectionStatus::Connecting => Some(("Connecting…", colors::CONNECTING)),
            ConnectionStatus::Offline => Some(("Offline - changes may be out of date", colors::OFFLINE)),
        };
        if let Some((text, color)) = status {
            if self.sync.is_some() {
                painter.text(
                    rect.right_top() + Vec2::new(-10.0, 20.0),
                    Align2::RIGHT_TOP,
                    text,
                    FontId::proportional(12.0),
                    color,
                );
            }
        }
    }
}

/// Map a raw egui event onto canvas input, relative to `rect.min`.
///
/// Presses, wheel and keys only count over the canvas; moves, releases and
/// touches always pass so a drag that leaves the canvas still ends.
pub fn translate_event(
    event: &egui::Event,
    rect: Rect,
    hover: Option<Pos2>,
    canvas_hovered: bool,
) -> Option<InputEvent> {
    let local = |pos: Pos2| (pos - rect.min).to_pos2();
    match event {
        egui::Event::PointerMoved(pos) => Some(InputEvent::PointerMove { pos: local(*pos) }),
        egui::Event::PointerButton {
            pos,
            button: PointerButton::Primary,
            pressed,
            modifiers,
        } => {
            if *pressed {
                rect.contains(*pos).then(|| InputEvent::PointerDown {
                    pos: local(*pos),
                    modifiers: *modifiers,
                })
            } else {
                Some(InputEvent::PointerUp { pos: local(*pos) })
            }
        }
        egui::Event::PointerGone => Some(InputEvent::PointerLeave),
        egui::Event::MouseWheel { delta, .. } => {
            let pos = hover.filter(|p| rect.contains(*p))?;
            Some(InputEvent::Wheel {
                pos: local(pos),
                delta_y: delta.y,
            })
        }
        egui::Event::Touch { id, phase, pos, .. } => Some(InputEvent::Touch {
            id: id.0,
            phase: *phase,
            pos: local(*pos),
        }),
        egui::Event::Key {
            key,
            pressed: true,
            modifiers,
            ..
        } if canvas_hovered => Some(InputEvent::Key {
            key: *key,
            modifiers: *modifiers,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Key, Modifiers, MouseWheelUnit};
    use floorplan_types::{Hall, Point, Size, Stall, StallShape, StallStatus};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn layout() -> ExhibitionLayout {
        let mut layout = ExhibitionLayout::new(Uuid::new_v4(), Size::new(200.0, 100.0));
        layout.halls.push(Hall {
            id: "h".into(),
            name: "Hall 1".into(),
            position: Point::new(0.0, 0.0),
            size: Size::new(200.0, 100.0),
            stalls: (0..20)
                .map(|i| Stall {
                    id: format!("s-{i}"),
                    stall_number: format!("A-{i}"),
                    shape: StallShape::Rectangle {
                        size: Size::new(4.0, 4.0),
                    },
                    position: Point::new(5.0 + 9.0 * i as f32, 10.0),
                    status: StallStatus::Available,
                    price: Decimal::from(1000),
                    occupant: None,
                })
                .collect(),
            paths: Vec::new(),
        });
        layout
    }

    #[test]
    fn first_frame_fits_layout() {
        let mut view = FloorPlanView::new(ViewerConfig::desktop());
        view.load_layout(layout());
        let scene = view.frame(0, Vec2::new(1080.0, 600.0));
        // (1080 - 80) / 200
        assert_eq!(view.store().viewport().scale, 5.0);
        assert_eq!(scene.stats.stalls, 20);
        assert_eq!(scene.stats.halls, 1);
    }

    #[test]
    fn frame_without_layout_is_empty() {
        let mut view = FloorPlanView::new(ViewerConfig::desktop());
        let scene = view.frame(0, Vec2::new(800.0, 600.0));
        assert!(scene.commands.is_empty());
    }

    #[test]
    fn booking_request_is_reported() {
        let mut view = FloorPlanView::new(ViewerConfig::desktop());
        view.load_layout(layout());
        view.frame(0, Vec2::new(1080.0, 600.0));
        view.drain_events();
        assert_eq!(view.request_booking(), None);

        // stall s-0 spans world x 5..9, y 10..14; scale 5, offset (40, 50)
        let pos = Pos2::new(40.0 + 7.0 * 5.0, 50.0 + 12.0 * 5.0);
        view.handle_input(
            InputEvent::PointerDown {
                pos,
                modifiers: Modifiers::NONE,
            },
            1,
        );
        view.handle_input(InputEvent::PointerUp { pos }, 2);
        view.frame(3, Vec2::new(1080.0, 600.0));

        let request = view.request_booking().unwrap();
        assert_eq!(request.stall_ids, vec!["s-0".to_string()]);
        assert_eq!(
            view.drain_events(),
            vec![ViewerEvent::BookingRequested(request)]
        );
    }

    #[test]
    fn translates_relative_to_canvas() {
        let rect = Rect::from_min_size(Pos2::new(100.0, 50.0), Vec2::new(400.0, 300.0));
        let press = egui::Event::PointerButton {
            pos: Pos2::new(110.0, 60.0),
            button: PointerButton::Primary,
            pressed: true,
            modifiers: Modifiers::SHIFT,
        };
        assert_eq!(
            translate_event(&press, rect, None, true),
            Some(InputEvent::PointerDown {
                pos: Pos2::new(10.0, 10.0),
                modifiers: Modifiers::SHIFT
            })
        );

        let outside = egui::Event::PointerButton {
            pos: Pos2::new(10.0, 10.0),
            button: PointerButton::Primary,
            pressed: true,
            modifiers: Modifiers::NONE,
        };
        assert_eq!(translate_event(&outside, rect, None, false), None);

        let wheel = egui::Event::MouseWheel {
            unit: MouseWheelUnit::Line,
            delta: Vec2::new(0.0, -1.0),
            modifiers: Modifiers::NONE,
        };
        assert_eq!(
            translate_event(&wheel, rect, Some(Pos2::new(300.0, 200.0)), true),
            Some(InputEvent::Wheel {
                pos: Pos2::new(200.0, 150.0),
                delta_y: -1.0
            })
        );
        assert_eq!(translate_event(&wheel, rect, Some(Pos2::new(0.0, 0.0)), false), None);

        let escape = egui::Event::Key {
            key: Key::Escape,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: Modifiers::NONE,
        };
        assert_eq!(translate_event(&escape, rect, None, false), None);
        assert!(translate_event(&escape, rect, None, true).is_some());
    }
}
