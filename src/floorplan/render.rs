//! Floor-plan renderer
//!
//! Pure function of (culled entities, LOD, selection, hover, viewport) to a
//! [`Scene`] of screen-space draw commands. Never mutates state; painting the
//! scene onto egui happens in `paint`.
//!
//! Draw order: halls (+grid), walkways, stalls batched by status, selection
//! overlay, fixtures, rubber band, tooltip.

use egui::{Align2, Color32, Pos2, Rect, Stroke, TextureId, Vec2};
use floorplan_types::{Fixture, Hall, PathSegment, Stall, StallStatus};
use smallvec::SmallVec;

use super::colors;
use super::geometry;
use super::icons::{IconLookup, IconState};
use super::lod::{LodFeatures, LodTier};
use super::selection::SelectionState;
use super::spatial::SpatialEntry;
use super::store::{EntityRef, LayoutModel};
use super::viewport::Viewport;
use crate::config::RenderConfig;

const SHADOW_OFFSET: Vec2 = Vec2::new(2.0, 2.0);
const MIN_GRID_SPACING_PX: f32 = 4.0;
const MAX_GRID_LINES: usize = 2_000;
const STALL_STROKE: f32 = 1.0;
const SELECTED_STROKE: f32 = 2.5;

// =============================================================================
// SCENE
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        rect: Rect,
        rounding: f32,
        fill: Color32,
        stroke: Stroke,
    },
    /// Convex polygon (rotated fixtures)
    Polygon {
        points: Vec<Pos2>,
        fill: Color32,
        stroke: Stroke,
    },
    Polyline {
        points: Vec<Pos2>,
        closed: bool,
        stroke: Stroke,
    },
    Text {
        pos: Pos2,
        anchor: Align2,
        text: String,
        size: f32,
        color: Color32,
    },
    /// Textured quad, corners clockwise from top-left
    Image {
        texture: TextureId,
        corners: [Pos2; 4],
    },
    Tooltip {
        anchor: Pos2,
        lines: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub halls: usize,
    pub stalls: usize,
    pub fixtures: usize,
    pub paths: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub commands: Vec<DrawCommand>,
    pub lod: LodTier,
    pub stats: SceneStats,
    /// Icons that were needed but not ready
    pub icon_requests: Vec<String>,
}

impl Scene {
    pub fn empty(lod: LodTier) -> Self {
        Self {
            commands: Vec::new(),
            lod,
            stats: SceneStats::default(),
            icon_requests: Vec::new(),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Everything one frame needs
pub struct RenderInput<'a> {
    pub model: &'a LayoutModel,
    pub visible: &'a [&'a SpatialEntry],
    pub lod: LodTier,
    pub selection: &'a SelectionState,
    pub viewport: &'a Viewport,
    pub viewport_size: Vec2,
    pub icons: &'a dyn IconLookup,
    /// Screen-space rubber band, if one is being dragged
    pub rubber_band: Option<Rect>,
    pub options: &'a RenderConfig,
}

// =============================================================================
// RENDER
// =============================================================================

pub fn render(input: &RenderInput<'_>) -> Scene {
    let mut scene = Scene::empty(input.lod);
    let features = input.lod.features();

    let mut halls: Vec<&Hall> = Vec::new();
    let mut paths: Vec<&PathSegment> = Vec::new();
    let mut stalls: Vec<(&Hall, &Stall)> = Vec::new();
    let mut fixtures: Vec<&Fixture> = Vec::new();
    for entry in input.visible {
        match input.model.resolve(entry.slot) {
            Some(EntityRef::Hall(hall)) => halls.push(hall),
            Some(EntityRef::Path(path)) => paths.push(path),
            Some(EntityRef::Stall(hall, stall)) => stalls.push((hall, stall)),
            Some(EntityRef::Fixture(fixture)) => fixtures.push(fixture),
            None => {}
        }
    }

    for hall in &halls {
        render_hall(&mut scene, input, &features, hall);
    }
    for path in &paths {
        render_path(&mut scene, input.viewport, path);
    }

    for status in StallStatus::ALL {
        for (hall, stall) in stalls.iter().filter(|(_, s)| s.status == status) {
            render_stall(&mut scene, input, &features, hall, stall);
        }
    }
    render_selection_overlay(&mut scene, input, &stalls);

    for fixture in &fixtures {
        render_fixture(&mut scene, input, &features, fixture);
    }

    if let Some(band) = input.rubber_band {
        scene.commands.push(DrawCommand::Rect {
            rect: band,
            rounding: 0.0,
            fill: colors::BAND_FILL,
            stroke: Stroke::new(1.0, colors::BAND_BORDER),
        });
    }

    if let Some((hall, stall)) = input
        .selection
        .hovered()
        .and_then(|id| input.model.stall_with_hall(id))
    {
        let bounds = geometry::bounds_of(&stall_screen_rects(input.viewport, hall, stall));
        scene.commands.push(DrawCommand::Tooltip {
            anchor: bounds.right_top() + Vec2::new(8.0, 0.0),
            lines: tooltip_lines(stall),
        });
    }

    scene
}

// =============================================================================
// HALLS
// =============================================================================

fn render_hall(scene: &mut Scene, input: &RenderInput<'_>, features: &LodFeatures, hall: &Hall) {
    let world = geometry::hall_bounds(hall);
    let rect = input.viewport.world_rect_to_screen(world);
    scene.commands.push(DrawCommand::Rect {
        rect,
        rounding: 0.0,
        fill: colors::HALL_FILL,
        stroke: Stroke::new(1.5, colors::HALL_BORDER),
    });
    scene.stats.halls += 1;

    if input.options.show_grid && input.lod >= LodTier::Medium {
        let visible = input.viewport.visible_world_rect(input.viewport_size);
        let clip = world.intersect(visible);
        if clip.is_positive() {
            if features.minor_grid {
                push_grid(scene, input.viewport, world, clip, input.options.grid_minor_m, colors::GRID_MINOR);
            }
            push_grid(scene, input.viewport, world, clip, input.options.grid_major_m, colors::GRID_MAJOR);
        }
    }

    if features.labels {
        scene.commands.push(DrawCommand::Text {
            pos: rect.left_top() + Vec2::new(6.0, 4.0),
            anchor: Align2::LEFT_TOP,
            text: hall.name.clone(),
            size: 14.0,
            color: colors::HALL_LABEL,
        });
    }
}

/// Grid lines every `spacing` metres from the hall origin, limited to `clip`
fn push_grid(scene: &mut Scene, viewport: &Viewport, hall: Rect, clip: Rect, spacing: f32, color: Color32) {
    if spacing <= 0.0 || viewport.scale_len(spacing) < MIN_GRID_SPACING_PX {
        return;
    }
    let first_x = ((clip.min.x - hall.min.x) / spacing).ceil() as i64;
    let last_x = ((clip.max.x - hall.min.x) / spacing).floor() as i64;
    let first_y = ((clip.min.y - hall.min.y) / spacing).ceil() as i64;
    let last_y = ((clip.max.y - hall.min.y) / spacing).floor() as i64;
    let count = (last_x - first_x + 1).max(0) + (last_y - first_y + 1).max(0);
    if count as usize > MAX_GRID_LINES {
        return;
    }

    let stroke = Stroke::new(1.0, color);
    for k in first_x..=last_x {
        let x = hall.min.x + k as f32 * spacing;
        scene.commands.push(DrawCommand::Polyline {
            points: vec![
                viewport.world_to_screen(Pos2::new(x, clip.min.y)),
                viewport.world_to_screen(Pos2::new(x, clip.max.y)),
            ],
            closed: false,
            stroke,
        });
    }
    for k in first_y..=last_y {
        let y = hall.min.y + k as f32 * spacing;
        scene.commands.push(DrawCommand::Polyline {
            points: vec![
                viewport.world_to_screen(Pos2::new(clip.min.x, y)),
                viewport.world_to_screen(Pos2::new(clip.max.x, y)),
            ],
            closed: false,
            stroke,
        });
    }
}

// =============================================================================
// PATHS
// =============================================================================

fn render_path(scene: &mut Scene, viewport: &Viewport, path: &PathSegment) {
    let points = path
        .points
        .iter()
        .map(|p| viewport.world_to_screen(geometry::to_pos(*p)))
        .collect();
    scene.commands.push(DrawCommand::Polyline {
        points,
        closed: false,
        stroke: Stroke::new(
            viewport.scale_len(path.width).max(1.0),
            colors::path_color(path.kind),
        ),
    });
    scene.stats.paths += 1;
}

// =============================================================================
// STALLS
// =============================================================================

fn stall_screen_rects(viewport: &Viewport, hall: &Hall, stall: &Stall) -> SmallVec<[Rect; 2]> {
    geometry::stall_footprint(hall, stall)
        .into_iter()
        .map(|r| viewport.world_rect_to_screen(r))
        .collect()
}

/// Outline of one or two vertically stacked rectangles
fn outline(rects: &[Rect]) -> Vec<Pos2> {
    match rects {
        [single] => vec![
            single.left_top(),
            single.right_top(),
            single.right_bottom(),
            single.left_bottom(),
        ],
        [a, b] => {
            let (top, bottom) = if a.min.y <= b.min.y { (a, b) } else { (b, a) };
            let seam = top.max.y;
            vec![
                top.left_top(),
                top.right_top(),
                Pos2::new(top.max.x, seam),
                Pos2::new(bottom.max.x, seam),
                bottom.right_bottom(),
                bottom.left_bottom(),
                Pos2::new(bottom.min.x, seam),
                Pos2::new(top.min.x, seam),
            ]
        }
        _ => Vec::new(),
    }
}

fn render_stall(
    scene: &mut Scene,
    input: &RenderInput<'_>,
    features: &LodFeatures,
    hall: &Hall,
    stall: &Stall,
) {
    let rects = stall_screen_rects(input.viewport, hall, stall);
    let selected = input.selection.contains(&stall.id);

    if features.shadows {
        for rect in &rects {
            scene.commands.push(DrawCommand::Rect {
                rect: rect.translate(SHADOW_OFFSET),
                rounding: 0.0,
                fill: colors::SHADOW,
                stroke: Stroke::NONE,
            });
        }
    }

    let fill = if selected {
        colors::SELECTED_FILL
    } else {
        colors::status_fill(stall.status)
    };
    for rect in &rects {
        scene.commands.push(DrawCommand::Rect {
            rect: *rect,
            rounding: 0.0,
            fill,
            stroke: Stroke::NONE,
        });
    }
    scene.commands.push(DrawCommand::Polyline {
        points: outline(&rects),
        closed: true,
        stroke: Stroke::new(STALL_STROKE, colors::status_border(stall.status)),
    });
    scene.stats.stalls += 1;

    let bounds = geometry::bounds_of(&rects);
    if features.labels && bounds.width().min(bounds.height()) >= input.options.label_min_px {
        scene.commands.push(DrawCommand::Text {
            pos: bounds.center(),
            anchor: Align2::CENTER_CENTER,
            text: stall.stall_number.clone(),
            size: (bounds.height() * 0.3).clamp(9.0, 16.0),
            color: colors::STALL_TEXT,
        });
    }
}

/// Selection and hover outlines, on top of every status batch
fn render_selection_overlay(scene: &mut Scene, input: &RenderInput<'_>, stalls: &[(&Hall, &Stall)]) {
    let hovered = input.selection.hovered();
    for (hall, stall) in stalls {
        let stroke = if input.selection.contains(&stall.id) {
            Stroke::new(SELECTED_STROKE, colors::SELECTED_BORDER)
        } else if hovered == Some(stall.id.as_str()) {
            Stroke::new(STALL_STROKE * 2.0, colors::HOVER_BORDER)
        } else {
            continue;
        };
        let rects = stall_screen_rects(input.viewport, hall, stall);
        scene.commands.push(DrawCommand::Polyline {
            points: outline(&rects),
            closed: true,
            stroke,
        });
    }
}

/// Tooltip text: number, shape, status, occupant (booked/reserved), price (available)
pub fn tooltip_lines(stall: &Stall) -> Vec<String> {
    let mut lines = vec![
        format!("Stall {}", stall.stall_number),
        format!(
            "{} · {}",
            stall.shape.display_name(),
            geometry::shape_dimensions_label(&stall.shape)
        ),
        format!("Status: {}", stall.status.display_name()),
    ];
    match stall.status {
        StallStatus::Booked | StallStatus::Reserved => {
            if let Some(occupant) = &stall.occupant {
                lines.push(format!("Exhibitor: {}", occupant.company_name));
            }
        }
        StallStatus::Available => lines.push(format!("Price: {}", stall.price)),
        StallStatus::Unavailable => {}
    }
    lines
}

// =============================================================================
// FIXTURES
// =============================================================================

fn render_fixture(scene: &mut Scene, input: &RenderInput<'_>, features: &LodFeatures, fixture: &Fixture) {
    let corners = geometry::fixture_corners(fixture).map(|p| input.viewport.world_to_screen(p));
    let bounds = Rect::from_points(&corners);
    scene.stats.fixtures += 1;

    let texture = match (&fixture.icon, features.fixture_icons) {
        (Some(url), true) => match input.icons.icon(url) {
            IconState::Ready(texture) => Some(texture),
            IconState::Pending => {
                scene.icon_requests.push(url.clone());
                None
            }
            IconState::Failed => None,
        },
        _ => None,
    };

    if let Some(texture) = texture {
        scene.commands.push(DrawCommand::Image { texture, corners });
        if features.labels && fixture.show_name {
            scene.commands.push(DrawCommand::Text {
                pos: bounds.center_bottom() + Vec2::new(0.0, 2.0),
                anchor: Align2::CENTER_TOP,
                text: fixture.name.clone(),
                size: 11.0,
                color: colors::FIXTURE_TEXT,
            });
        }
        return;
    }

    let fill = fixture
        .color
        .as_deref()
        .and_then(colors::parse_hex)
        .unwrap_or(colors::FIXTURE_DEFAULT);
    scene.commands.push(DrawCommand::Polygon {
        points: corners.to_vec(),
        fill,
        stroke: Stroke::new(1.0, colors::FIXTURE_BORDER),
    });

    if features.labels {
        scene.commands.push(DrawCommand::Text {
            pos: bounds.center(),
            anchor: Align2::CENTER_BOTTOM,
            text: fixture.name.clone(),
            size: 11.0,
            color: colors::FIXTURE_TEXT,
        });
        scene.commands.push(DrawCommand::Text {
            pos: bounds.center(),
            anchor: Align2::CENTER_TOP,
            text: format!("{} × {} m", fixture.size.width, fixture.size.height),
            size: 10.0,
            color: colors::FIXTURE_TEXT,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floorplan::icons::IconCache;
    use crate::floorplan::spatial::{collect_entries, SpatialIndex};
    use floorplan_types::{ExhibitionLayout, Occupant, PathKind, Point, Size, StallShape};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn model() -> LayoutModel {
        let mut layout = ExhibitionLayout::new(Uuid::nil(), Size::new(60.0, 40.0));
        let mut stalls = Vec::new();
        for (i, status) in [
            StallStatus::Unavailable,
            StallStatus::Booked,
            StallStatus::Available,
            StallStatus::Reserved,
        ]
        .into_iter()
        .enumerate()
        {
            stalls.push(Stall {
                id: format!("s-{i}"),
                stall_number: format!("A-{i}"),
                shape: StallShape::Rectangle {
                    size: Size::new(4.0, 4.0),
                },
                position: Point::new(i as f32 * 5.0, 2.0),
                status,
                price: Decimal::from(1000),
                occupant: Some(Occupant {
                    company_name: "Acme".into(),
                    contact_name: None,
                    website: None,
                }),
            });
        }
        layout.halls.push(Hall {
            id: "h-1".into(),
            name: "Hall 1".into(),
            position: Point::new(0.0, 0.0),
            size: Size::new(40.0, 20.0),
            stalls,
            paths: vec![PathSegment {
                id: "p-1".into(),
                kind: PathKind::Entrance,
                points: vec![Point::new(0.0, 10.0), Point::new(40.0, 10.0)],
                width: 2.0,
            }],
        });
        layout.fixtures.push(Fixture {
            id: "f-1".into(),
            kind: "stage".into(),
            name: "Stage".into(),
            position: Point::new(45.0, 5.0),
            size: Size::new(6.0, 4.0),
            rotation: 0.0,
            color: Some("#9e9e9e".into()),
            icon: Some("stage.png".into()),
            show_name: true,
        });
        LayoutModel::new(layout)
    }

    fn scene_at(scale: f32, selection: &SelectionState, icons: &IconCache) -> Scene {
        let model = model();
        let index = SpatialIndex::from_entries(collect_entries(model.layout(), |_, _| true));
        let mut visible: Vec<&SpatialEntry> = index.iter().collect();
        visible.sort_by_key(|e| e.order);
        let viewport = Viewport::new(scale, Vec2::ZERO);
        let options = RenderConfig::default();
        let lod = LodTier::for_scale(scale, &crate::config::LodConfig::default());
        render(&RenderInput {
            model: &model,
            visible: &visible,
            lod,
            selection,
            viewport: &viewport,
            viewport_size: Vec2::new(2000.0, 1000.0),
            icons,
            rubber_band: None,
            options: &options,
        })
    }

    fn stall_fill_order(scene: &Scene) -> Vec<Color32> {
        let fills: Vec<Color32> = StallStatus::ALL.iter().map(|s| colors::status_fill(*s)).collect();
        scene
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Rect { fill, .. } if fills.contains(fill) => Some(*fill),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn stalls_are_batched_by_status() {
        let scene = scene_at(20.0, &SelectionState::new(), &IconCache::new());
        let expected: Vec<Color32> = StallStatus::ALL.iter().map(|s| colors::status_fill(*s)).collect();
        assert_eq!(stall_fill_order(&scene), expected);
        assert_eq!(scene.stats.stalls, 4);
        assert_eq!(scene.stats.paths, 1);
    }

    #[test]
    fn minimal_tier_draws_no_text_but_keeps_selection() {
        let mut selection = SelectionState::new();
        selection.add_available(["s-2"], &model());
        let scene = scene_at(1.0, &selection, &IconCache::new());
        assert_eq!(scene.lod, LodTier::Minimal);
        assert_eq!(scene.texts().count(), 0);
        let selected_outlines = scene
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Polyline { stroke, .. } if stroke.color == colors::SELECTED_BORDER))
            .count();
        assert_eq!(selected_outlines, 1);
    }

    #[test]
    fn high_tier_labels_stalls() {
        let scene = scene_at(20.0, &SelectionState::new(), &IconCache::new());
        let texts: Vec<&str> = scene.texts().collect();
        assert!(texts.contains(&"A-0"));
        assert!(texts.contains(&"Hall 1"));
    }

    #[test]
    fn pending_icon_falls_back_to_placeholder() {
        let scene = scene_at(20.0, &SelectionState::new(), &IconCache::new());
        assert_eq!(scene.icon_requests, vec!["stage.png".to_string()]);
        assert!(scene.commands.iter().any(|c| matches!(c, DrawCommand::Polygon { .. })));
        assert!(scene.texts().any(|t| t == "6 × 4 m"));
    }

    #[test]
    fn ready_icon_draws_image_and_name_only() {
        let mut icons = IconCache::new();
        icons.mark_ready("stage.png", TextureId::User(1));
        let scene = scene_at(20.0, &SelectionState::new(), &icons);
        assert!(scene.commands.iter().any(|c| matches!(c, DrawCommand::Image { .. })));
        assert!(scene.texts().any(|t| t == "Stage"));
        assert!(!scene.texts().any(|t| t == "6 × 4 m"));
        assert!(scene.icon_requests.is_empty());
    }

    #[test]
    fn tooltip_shows_occupant_or_price() {
        let model = model();
        let booked = model.stall_with_hall("s-1").map(|(_, s)| tooltip_lines(s)).unwrap();
        assert!(booked.contains(&"Exhibitor: Acme".to_string()));
        assert!(!booked.iter().any(|l| l.starts_with("Price")));

        let available = model.stall_with_hall("s-2").map(|(_, s)| tooltip_lines(s)).unwrap();
        assert!(available.contains(&"Price: 1000".to_string()));
        assert!(!available.iter().any(|l| l.starts_with("Exhibitor")));
    }

    #[test]
    fn hovered_stall_gets_tooltip() {
        let mut selection = SelectionState::new();
        selection.set_hovered(Some("s-0".into()));
        let scene = scene_at(20.0, &selection, &IconCache::new());
        assert!(scene
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Tooltip { lines, .. } if lines[0] == "Stall A-0")));
    }

    #[test]
    fn l_outline_has_eight_corners() {
        let top = Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(6.0, 3.0));
        let leg = Rect::from_min_size(Pos2::new(0.0, 3.0), Vec2::new(3.0, 2.0));
        let points = outline(&[leg, top]);
        assert_eq!(points.len(), 8);
        assert_eq!(points[0], Pos2::new(0.0, 0.0));
        assert_eq!(points[4], Pos2::new(3.0, 5.0));
    }
}
