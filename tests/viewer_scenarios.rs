//! End-to-end behaviour of the viewer: fit, selection, throttled zoom,
//! pinch, and live sync through the in-memory transport.

mod common;

use std::time::{Duration, Instant};

use egui::{Modifiers, Pos2, TouchPhase, Vec2};
use expo_floorplan::config::SyncConfig;
use expo_floorplan::floorplan::{FloorPlanView, InputEvent, ViewerEvent};
use expo_floorplan::floorplan_types::{EntityKind, ExhibitionLayout, StallStatus, SyncEvent};
use expo_floorplan::sync::{ChannelTransport, ConnectionStatus, FeedFrame, FeedSender, SyncChannel};
use expo_floorplan::ViewerConfig;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::json;

const SIZE: Vec2 = Vec2::new(1080.0, 600.0);

fn loaded() -> (FloorPlanView, ExhibitionLayout) {
    let layout = common::exhibition();
    let mut view = FloorPlanView::new(ViewerConfig::desktop());
    view.load_layout(layout.clone());
    view.frame(0, SIZE);
    (view, layout)
}

fn with_feed() -> (FloorPlanView, ExhibitionLayout, FeedSender) {
    let (mut view, layout) = loaded();
    let (transport, feed) = ChannelTransport::new();
    let config = SyncConfig {
        reconnect_interval_ms: 10,
        ..SyncConfig::default()
    };
    view.attach_sync(SyncChannel::spawn(transport, layout.exhibition_id, &config));
    (view, layout, feed)
}

fn click_stall(view: &mut FloorPlanView, layout: &ExhibitionLayout, id: &str, now_ms: u64) {
    let pos = view
        .store()
        .viewport()
        .world_to_screen(common::stall_centre(layout, id));
    view.handle_input(
        InputEvent::PointerDown {
            pos,
            modifiers: Modifiers::NONE,
        },
        now_ms,
    );
    view.handle_input(InputEvent::PointerUp { pos }, now_ms);
    view.frame(now_ms, SIZE);
}

/// Run frames until `done` holds; the feed lives on another thread
fn frames_until(view: &mut FloorPlanView, now_ms: u64, done: impl Fn(&FloorPlanView) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        view.frame(now_ms, SIZE);
        if done(view) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for sync");
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn booked(layout: &ExhibitionLayout, id: &str) -> FeedFrame {
    FeedFrame::Event(SyncEvent::upsert(
        layout.exhibition_id,
        EntityKind::Stall,
        id,
        json!({"status": "booked", "occupant": {"company_name": "Acme"}}),
    ))
}

#[test]
fn initial_frame_fits_whole_layout() {
    let (mut view, layout) = loaded();
    // 200 x 50 m into 1000 x 520 px after padding
    assert_eq!(view.store().viewport().scale, 5.0);
    let centre = view
        .store()
        .viewport()
        .world_to_screen(Pos2::new(layout.size.width / 2.0, layout.size.height / 2.0));
    assert_eq!(centre, (SIZE / 2.0).to_pos2());

    let scene = view.frame(1, SIZE);
    assert_eq!(scene.stats.halls, common::HALLS);
    assert_eq!(scene.stats.stalls, common::HALLS * common::STALLS_PER_HALL);
}

#[test]
fn remote_booking_evicts_selected_stall() {
    let (mut view, layout, feed) = with_feed();
    click_stall(&mut view, &layout, "a-12", 10);
    click_stall(&mut view, &layout, "a-13", 20);
    assert_eq!(view.store().selection_total(), Decimal::from(7500));

    feed.send(booked(&layout, "a-12")).unwrap();
    frames_until(&mut view, 30, |v| {
        v.store().stall("a-12").map(|s| s.status) == Some(StallStatus::Booked)
    });

    // patched and evicted in the same update
    assert!(!view.store().selection().contains("a-12"));
    assert!(view.store().selection().contains("a-13"));
    assert_eq!(view.store().selection_total(), Decimal::from(2500));

    let evicted: Vec<_> = view
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            ViewerEvent::SelectionEvicted { stall_numbers, .. } => Some(stall_numbers),
            _ => None,
        })
        .collect();
    assert_eq!(evicted, vec![vec!["A-12".to_string()]]);
}

#[test]
fn deleted_stall_leaves_selection_and_index() {
    let (mut view, layout, feed) = with_feed();
    click_stall(&mut view, &layout, "b-1", 10);
    assert_eq!(view.store().selection().len(), 1);

    feed.send(FeedFrame::Event(SyncEvent::delete(
        layout.exhibition_id,
        EntityKind::Stall,
        "b-1",
    )))
    .unwrap();
    frames_until(&mut view, 20, |v| v.store().stall("b-1").is_none());

    assert!(view.store().selection().is_empty());
    let world = common::stall_centre(&layout, "b-1");
    assert_eq!(view.store().stall_at(world, 0.0), None);
}

#[test]
fn feed_reconnects_and_keeps_applying() {
    let (mut view, layout, feed) = with_feed();
    frames_until(&mut view, 0, |v| v.store().connection() == ConnectionStatus::Online);

    feed.send(FeedFrame::Disconnect).unwrap();
    feed.send(booked(&layout, "c-50")).unwrap();
    frames_until(&mut view, 50, |v| {
        v.store().stall("c-50").map(|s| s.status) == Some(StallStatus::Booked)
    });
    assert_eq!(view.store().connection(), ConnectionStatus::Online);

    let statuses: Vec<_> = view
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            ViewerEvent::ConnectionChanged(status) => Some(status),
            _ => None,
        })
        .collect();
    assert!(statuses.ends_with(&[
        ConnectionStatus::Offline,
        ConnectionStatus::Connecting,
        ConnectionStatus::Online
    ]));
}

#[test]
fn malformed_feed_line_is_skipped() {
    let (mut view, layout, feed) = with_feed();
    feed.send(FeedFrame::Line("data: {not json".into())).unwrap();
    feed.send(booked(&layout, "a-1")).unwrap();
    frames_until(&mut view, 10, |v| {
        v.store().stall("a-1").map(|s| s.status) == Some(StallStatus::Booked)
    });
    assert_eq!(view.store().connection(), ConnectionStatus::Online);
}

#[test]
fn wheel_burst_applies_only_latest_factor() {
    let (mut view, _) = loaded();
    let before = view.store().viewport().scale;
    let pos = Pos2::new(540.0, 300.0);

    view.handle_input(InputEvent::Wheel { pos, delta_y: 1.0 }, 100);
    view.handle_input(InputEvent::Wheel { pos, delta_y: -1.0 }, 105);
    view.frame(105, SIZE);
    assert_eq!(view.store().viewport().scale, before);

    view.frame(116, SIZE);
    assert_eq!(view.store().viewport().scale, before * (1.0 / 1.1));
}

#[test]
fn losing_a_finger_mid_pinch_keeps_last_flushed_viewport() {
    let (mut view, _) = loaded();
    let touch = |id, phase, x| InputEvent::Touch {
        id,
        phase,
        pos: Pos2::new(x, 300.0),
    };
    view.handle_input(touch(1, TouchPhase::Start, 400.0), 100);
    view.handle_input(touch(2, TouchPhase::Start, 500.0), 100);
    view.handle_input(touch(2, TouchPhase::Move, 600.0), 101);
    view.frame(120, SIZE);
    let flushed = *view.store().viewport();
    assert_eq!(flushed.scale, 10.0);

    view.handle_input(touch(2, TouchPhase::Move, 800.0), 125);
    view.handle_input(touch(2, TouchPhase::End, 800.0), 126);
    view.frame(200, SIZE);
    assert_eq!(*view.store().viewport(), flushed);
}

#[test]
fn unauthenticated_selection_prompts_login() {
    let (mut view, layout) = loaded();
    view.set_authenticated(false);
    view.drain_events();
    click_stall(&mut view, &layout, "a-12", 10);
    assert!(view.store().selection().is_empty());
    assert_eq!(view.drain_events(), vec![ViewerEvent::LoginRequired]);
}
