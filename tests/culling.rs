//! Culling against a realistic layout: never drops anything on screen,
//! never returns anything outside the buffered region.

mod common;

use egui::{Pos2, Rect, Vec2};
use expo_floorplan::config::CullingConfig;
use expo_floorplan::floorplan::spatial::adaptive_margin;
use expo_floorplan::floorplan::{LayoutStore, Viewport};
use proptest::prelude::*;

fn store() -> LayoutStore {
    let mut store = LayoutStore::new(30_000);
    store.load_layout(common::exhibition());
    store
}

fn keys(entries: &[&expo_floorplan::floorplan::spatial::SpatialEntry]) -> Vec<String> {
    entries.iter().map(|e| e.key.to_string()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn visible_set_bounds(
        scale in 0.5f32..30.0,
        ox in -4_000.0f32..400.0,
        oy in -1_000.0f32..400.0,
        interacting in any::<bool>(),
    ) {
        let mut store = store();
        let size = Vec2::new(800.0, 600.0);
        store.set_viewport_size(size);
        store.schedule_viewport(Viewport::new(scale, Vec2::new(ox, oy)));
        store.commit_frame();

        let config = CullingConfig::default();
        let visible = store.visible_entries(interacting, &config);
        let world = store.viewport().visible_world_rect(size);
        let margin = adaptive_margin(world, scale, interacting, &config);
        let buffered = world.expand(margin);

        // superset of what is on screen
        for entry in store.index().iter() {
            if entry.bounds.intersects(world) {
                prop_assert!(visible.iter().any(|v| v.key == entry.key), "missing {}", entry.key);
            }
        }
        // subset of the buffered region, in draw order
        for pair in visible.windows(2) {
            prop_assert!(pair[0].order < pair[1].order);
        }
        for entry in &visible {
            prop_assert!(entry.bounds.intersects(buffered), "{} outside buffer", entry.key);
        }
    }

    #[test]
    fn rtree_and_linear_scan_agree(
        min_x in -50.0f32..200.0,
        min_y in -20.0f32..50.0,
        w in 1.0f32..150.0,
        h in 1.0f32..60.0,
        margin in 0.0f32..30.0,
    ) {
        let store = store();
        let rect = Rect::from_min_size(Pos2::new(min_x, min_y), Vec2::new(w, h));
        let linear = CullingConfig { rtree_threshold: usize::MAX, ..CullingConfig::default() };
        let tree = CullingConfig { rtree_threshold: 0, ..CullingConfig::default() };
        prop_assert_eq!(
            keys(&store.index().visible(rect, margin, &linear)),
            keys(&store.index().visible(rect, margin, &tree))
        );
    }
}

#[test]
fn interacting_margin_is_smaller() {
    let config = CullingConfig::default();
    let world = Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 50.0));
    let idle = adaptive_margin(world, 8.0, false, &config);
    let dragging = adaptive_margin(world, 8.0, true, &config);
    assert!(dragging < idle);
    assert!(dragging > 0.0);
}

#[test]
fn zoomed_in_culls_most_stalls() {
    let mut store = store();
    store.set_viewport_size(Vec2::new(400.0, 300.0));
    // 20 px per metre over the first few stalls of hall A
    store.schedule_viewport(Viewport::new(20.0, Vec2::ZERO));
    store.commit_frame();
    let visible = store.visible_entries(false, &CullingConfig::default());
    let stalls = visible
        .iter()
        .filter(|e| e.key.kind == expo_floorplan::floorplan_types::EntityKind::Stall)
        .count();
    assert!(stalls > 0);
    assert!(stalls < common::STALLS_PER_HALL * common::HALLS / 2);
}
