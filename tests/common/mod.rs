//! Shared fixtures for integration tests

#![allow(dead_code)]

use expo_floorplan::floorplan_types::{
    ExhibitionLayout, Hall, Point, Size, Stall, StallShape, StallStatus,
};
use rust_decimal::Decimal;
use uuid::Uuid;

pub const HALLS: usize = 3;
pub const STALLS_PER_HALL: usize = 50;
pub const HALL_WIDTH: f32 = 60.0;
pub const HALL_HEIGHT: f32 = 40.0;
pub const HALL_GAP: f32 = 10.0;

/// Three halls side by side, 50 stalls each in a 10 x 5 grid.
///
/// Stall ids are `a-1` .. `c-50`, numbers `A-1` .. `C-50`. `A-12` costs 5000,
/// everything else 2500.
pub fn exhibition() -> ExhibitionLayout {
    let width = HALLS as f32 * (HALL_WIDTH + HALL_GAP) - HALL_GAP;
    let mut layout = ExhibitionLayout::new(Uuid::new_v4(), Size::new(width, HALL_HEIGHT + 10.0));
    for h in 0..HALLS {
        let letter = (b'A' + h as u8) as char;
        layout.halls.push(Hall {
            id: format!("hall-{}", letter.to_ascii_lowercase()),
            name: format!("Hall {letter}"),
            position: Point::new(h as f32 * (HALL_WIDTH + HALL_GAP), 5.0),
            size: Size::new(HALL_WIDTH, HALL_HEIGHT),
            stalls: (1..=STALLS_PER_HALL).map(|n| stall(letter, n)).collect(),
            paths: Vec::new(),
        });
    }
    layout
}

fn stall(letter: char, n: usize) -> Stall {
    let i = n - 1;
    let number = format!("{letter}-{n}");
    Stall {
        id: number.to_ascii_lowercase(),
        price: if number == "A-12" {
            Decimal::from(5000)
        } else {
            Decimal::from(2500)
        },
        stall_number: number,
        shape: StallShape::Rectangle {
            size: Size::new(4.0, 4.0),
        },
        position: Point::new(1.0 + (i % 10) as f32 * 5.5, 2.0 + (i / 10) as f32 * 7.0),
        status: StallStatus::Available,
        occupant: None,
    }
}

/// World-space centre of a stall from [`exhibition`]
pub fn stall_centre(layout: &ExhibitionLayout, id: &str) -> egui::Pos2 {
    for hall in &layout.halls {
        if let Some(stall) = hall.stalls.iter().find(|s| s.id == id) {
            return egui::Pos2::new(
                hall.position.x + stall.position.x + 2.0,
                hall.position.y + stall.position.y + 2.0,
            );
        }
    }
    panic!("no stall {id}");
}
