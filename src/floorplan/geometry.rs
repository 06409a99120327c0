//! World-space geometry for layout entities
//!
//! Footprints, bounding boxes, areas and validation. Shapes are matched
//! exhaustively; adding a variant must touch every calculator here.

use egui::{Pos2, Rect, Vec2};
use floorplan_types::{
    ExhibitionLayout, Fixture, Hall, LOrientation, PathSegment, Point, Size, Stall, StallShape,
};
use smallvec::{smallvec, SmallVec};

use crate::error::GeometryError;

/// One rectangle for plain stalls, two for L-shapes
pub type Footprint = SmallVec<[Rect; 2]>;

pub fn to_pos(p: Point) -> Pos2 {
    Pos2::new(p.x, p.y)
}

pub fn to_vec(s: Size) -> Vec2 {
    Vec2::new(s.width, s.height)
}

// =============================================================================
// STALLS
// =============================================================================

/// Footprint of a shape whose bounding box starts at `origin`
pub fn shape_footprint(shape: &StallShape, origin: Pos2) -> Footprint {
    match *shape {
        StallShape::Rectangle { size } => smallvec![Rect::from_min_size(origin, to_vec(size))],
        StallShape::LShape {
            primary,
            secondary,
            orientation,
        } => {
            let total_w = primary.width.max(secondary.width);
            let (primary_min, leg_min) = match orientation {
                LOrientation::BottomLeft => (Vec2::ZERO, Vec2::new(0.0, primary.height)),
                LOrientation::BottomRight => (
                    Vec2::new(total_w - primary.width, 0.0),
                    Vec2::new(total_w - secondary.width, primary.height),
                ),
                LOrientation::TopLeft => (Vec2::new(0.0, secondary.height), Vec2::ZERO),
                LOrientation::TopRight => (
                    Vec2::new(total_w - primary.width, secondary.height),
                    Vec2::new(total_w - secondary.width, 0.0),
                ),
            };
            smallvec![
                Rect::from_min_size(origin + primary_min, to_vec(primary)),
                Rect::from_min_size(origin + leg_min, to_vec(secondary)),
            ]
        }
    }
}

/// Absolute footprint of a stall inside its hall
pub fn stall_footprint(hall: &Hall, stall: &Stall) -> Footprint {
    let origin = to_pos(hall.position) + Vec2::new(stall.position.x, stall.position.y);
    shape_footprint(&stall.shape, origin)
}

pub fn shape_area(shape: &StallShape) -> f32 {
    match *shape {
        StallShape::Rectangle { size } => size.width * size.height,
        StallShape::LShape {
            primary, secondary, ..
        } => primary.width * primary.height + secondary.width * secondary.height,
    }
}

/// Outer dimensions, e.g. for the tooltip
pub fn shape_extent(shape: &StallShape) -> Vec2 {
    match *shape {
        StallShape::Rectangle { size } => to_vec(size),
        StallShape::LShape {
            primary, secondary, ..
        } => Vec2::new(
            primary.width.max(secondary.width),
            primary.height + secondary.height,
        ),
    }
}

pub fn shape_dimensions_label(shape: &StallShape) -> String {
    let extent = shape_extent(shape);
    format!(
        "{} × {} m ({} m²)",
        trim_float(extent.x),
        trim_float(extent.y),
        trim_float(shape_area(shape))
    )
}

fn trim_float(value: f32) -> String {
    if value.fract().abs() < 1e-3 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

pub fn footprint_contains(footprint: &[Rect], point: Pos2) -> bool {
    footprint.iter().any(|r| r.contains(point))
}

pub fn footprint_intersects(footprint: &[Rect], rect: Rect) -> bool {
    footprint.iter().any(|r| r.intersects(rect))
}

/// Union of the rectangles
pub fn bounds_of(rects: &[Rect]) -> Rect {
    rects
        .iter()
        .fold(Rect::NOTHING, |acc, r| acc.union(*r))
}

// =============================================================================
// HALLS / FIXTURES / PATHS
// =============================================================================

pub fn hall_bounds(hall: &Hall) -> Rect {
    Rect::from_min_size(to_pos(hall.position), to_vec(hall.size))
}

/// Axis-aligned box around the rotated fixture
pub fn fixture_bounds(fixture: &Fixture) -> Rect {
    let corners = fixture_corners(fixture);
    Rect::from_points(&corners)
}

/// Rotated corners, clockwise from the top-left
pub fn fixture_corners(fixture: &Fixture) -> [Pos2; 4] {
    let rect = Rect::from_min_size(to_pos(fixture.position), to_vec(fixture.size));
    let center = rect.center();
    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ];
    if fixture.rotation == 0.0 {
        return corners;
    }
    let (sin, cos) = fixture.rotation.to_radians().sin_cos();
    corners.map(|p| {
        let d = p - center;
        center + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
    })
}

pub fn path_bounds(path: &PathSegment) -> Rect {
    let points: Vec<Pos2> = path.points.iter().copied().map(to_pos).collect();
    Rect::from_points(&points).expand(path.width / 2.0)
}

/// Site rectangle used for fit-to-bounds
pub fn layout_bounds(layout: &ExhibitionLayout) -> Rect {
    Rect::from_min_size(Pos2::ZERO, to_vec(layout.size))
}

// =============================================================================
// VALIDATION
// =============================================================================

fn check_positive(field: &'static str, value: f32) -> Result<(), GeometryError> {
    if !value.is_finite() {
        return Err(GeometryError::NonFinite { field });
    }
    if value <= 0.0 {
        return Err(GeometryError::NonPositive { field, value });
    }
    Ok(())
}

fn check_finite(field: &'static str, value: f32) -> Result<(), GeometryError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::NonFinite { field })
    }
}

fn check_point(field: &'static str, p: Point) -> Result<(), GeometryError> {
    check_finite(field, p.x)?;
    check_finite(field, p.y)
}

fn check_size(width: &'static str, height: &'static str, s: Size) -> Result<(), GeometryError> {
    check_positive(width, s.width)?;
    check_positive(height, s.height)
}

pub fn validate_stall(stall: &Stall) -> Result<(), GeometryError> {
    check_point("position", stall.position)?;
    match stall.shape {
        StallShape::Rectangle { size } => check_size("width", "height", size),
        StallShape::LShape {
            primary, secondary, ..
        } => {
            check_size("primary.width", "primary.height", primary)?;
            check_size("secondary.width", "secondary.height", secondary)
        }
    }
}

/// Stall validity including the hall it is positioned against. A stall in a
/// malformed hall is malformed too.
pub fn validate_stall_in_hall(hall: &Hall, stall: &Stall) -> Result<(), GeometryError> {
    validate_hall(hall).map_err(|_| GeometryError::InvalidHall {
        hall_id: hall.id.clone(),
    })?;
    validate_stall(stall)
}

pub fn validate_hall(hall: &Hall) -> Result<(), GeometryError> {
    check_point("position", hall.position)?;
    check_size("width", "height", hall.size)
}

pub fn validate_fixture(fixture: &Fixture) -> Result<(), GeometryError> {
    check_point("position", fixture.position)?;
    check_size("width", "height", fixture.size)?;
    check_finite("rotation", fixture.rotation)
}

pub fn validate_path(path: &PathSegment) -> Result<(), GeometryError> {
    if path.points.len() < 2 {
        return Err(GeometryError::TooFewPoints {
            count: path.points.len(),
        });
    }
    for p in &path.points {
        check_point("points", *p)?;
    }
    check_positive("width", path.width)
}
