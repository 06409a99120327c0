//! Exhibition layout snapshot
//!
//! Fetched once per viewing session, then patched in place by sync events.
//! All lengths are metres in world space; stall positions are relative to the
//! owning hall, everything else is absolute.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// PRIMITIVES
// ============================================================================

/// World-space point in metres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Width/height pair in metres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

// ============================================================================
// ROOT
// ============================================================================

/// Full floor-plan snapshot for one exhibition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExhibitionLayout {
    pub exhibition_id: Uuid,
    /// Overall site dimensions
    pub size: Size,
    #[serde(default)]
    pub halls: Vec<Hall>,
    #[serde(default)]
    pub fixtures: Vec<Fixture>,
    /// Site-level paths (hall-internal paths live on the hall)
    #[serde(default)]
    pub paths: Vec<PathSegment>,
}

impl ExhibitionLayout {
    pub fn new(exhibition_id: Uuid, size: Size) -> Self {
        Self {
            exhibition_id,
            size,
            halls: Vec::new(),
            fixtures: Vec::new(),
            paths: Vec::new(),
        }
    }

    pub fn hall(&self, hall_id: &str) -> Option<&Hall> {
        self.halls.iter().find(|h| h.id == hall_id)
    }

    /// Total number of stalls across all halls
    pub fn stall_count(&self) -> usize {
        self.halls.iter().map(|h| h.stalls.len()).sum()
    }

    /// Iterate every stall together with its owning hall
    pub fn stalls(&self) -> impl Iterator<Item = (&Hall, &Stall)> {
        self.halls
            .iter()
            .flat_map(|hall| hall.stalls.iter().map(move |stall| (hall, stall)))
    }
}

// ============================================================================
// HALLS & STALLS
// ============================================================================

/// A hall exclusively owns its stalls and internal paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hall {
    pub id: String,
    pub name: String,
    pub position: Point,
    pub size: Size,
    #[serde(default)]
    pub stalls: Vec<Stall>,
    #[serde(default)]
    pub paths: Vec<PathSegment>,
}

/// Booking status - only ever changed by the sync feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StallStatus {
    Available,
    Booked,
    Reserved,
    Unavailable,
}

impl StallStatus {
    /// Draw/batch order
    pub const ALL: [StallStatus; 4] = [
        StallStatus::Available,
        StallStatus::Booked,
        StallStatus::Reserved,
        StallStatus::Unavailable,
    ];

    pub fn is_available(self) -> bool {
        self == StallStatus::Available
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StallStatus::Available => "available",
            StallStatus::Booked => "booked",
            StallStatus::Reserved => "reserved",
            StallStatus::Unavailable => "unavailable",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StallStatus::Available => "Available",
            StallStatus::Booked => "Booked",
            StallStatus::Reserved => "Reserved",
            StallStatus::Unavailable => "Unavailable",
        }
    }
}

/// Corner of the primary rectangle where an L-shape's secondary leg attaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LOrientation {
    #[default]
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
}

/// Stall footprint variants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StallShape {
    Rectangle {
        size: Size,
    },
    /// Two-rectangle composite: a primary block plus a leg on one corner
    LShape {
        primary: Size,
        secondary: Size,
        #[serde(default)]
        orientation: LOrientation,
    },
}

impl StallShape {
    pub fn display_name(&self) -> &'static str {
        match self {
            StallShape::Rectangle { .. } => "Rectangle",
            StallShape::LShape { .. } => "L-shape",
        }
    }
}

/// Exhibitor occupying a booked/reserved stall
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    pub company_name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stall {
    /// Unique across the whole layout
    pub id: String,
    /// Human-facing number, e.g. "A-12"
    pub stall_number: String,
    pub shape: StallShape,
    /// Relative to the owning hall's position
    pub position: Point,
    pub status: StallStatus,
    pub price: Decimal,
    #[serde(default)]
    pub occupant: Option<Occupant>,
}

// ============================================================================
// FIXTURES & PATHS
// ============================================================================

/// Hall-independent object: pillars, stages, toilets, info desks...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: String,
    /// Free-form kind, e.g. "pillar", "stage"
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub position: Point,
    pub size: Size,
    /// Degrees, clockwise, about the fixture centre
    #[serde(default)]
    pub rotation: f32,
    /// Hex colour, e.g. "#9e9e9e"
    #[serde(default)]
    pub color: Option<String>,
    /// Icon URL resolved through the authenticated image helper
    #[serde(default)]
    pub icon: Option<String>,
    /// Show the name label on icon-bearing fixtures
    #[serde(default = "default_show_name")]
    pub show_name: bool,
}

fn default_show_name() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    Path,
    Entrance,
    Exit,
    Emergency,
}

impl PathKind {
    pub fn display_name(self) -> &'static str {
        match self {
            PathKind::Path => "Path",
            PathKind::Entrance => "Entrance",
            PathKind::Exit => "Exit",
            PathKind::Emergency => "Emergency route",
        }
    }
}

/// Walkway polyline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PathKind,
    pub points: Vec<Point>,
    pub width: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stall_shape_uses_tagged_json() {
        let json = r#"{
            "type": "l_shape",
            "primary": {"width": 6.0, "height": 3.0},
            "secondary": {"width": 3.0, "height": 3.0},
            "orientation": "top_right"
        }"#;
        let shape: StallShape = serde_json::from_str(json).unwrap();
        assert_eq!(
            shape,
            StallShape::LShape {
                primary: Size::new(6.0, 3.0),
                secondary: Size::new(3.0, 3.0),
                orientation: LOrientation::TopRight,
            }
        );
    }

    #[test]
    fn stall_decodes_numeric_price_and_missing_occupant() {
        let json = r#"{
            "id": "s-1",
            "stall_number": "A-12",
            "shape": {"type": "rectangle", "size": {"width": 3.0, "height": 3.0}},
            "position": {"x": 1.0, "y": 2.0},
            "status": "available",
            "price": 5000
        }"#;
        let stall: Stall = serde_json::from_str(json).unwrap();
        assert_eq!(stall.price, Decimal::from(5000));
        assert!(stall.occupant.is_none());
        assert!(stall.status.is_available());
    }

    #[test]
    fn fixture_defaults_show_name() {
        let json = r#"{
            "id": "f-1", "type": "pillar", "name": "Pillar",
            "position": {"x": 0.0, "y": 0.0}, "size": {"width": 1.0, "height": 1.0}
        }"#;
        let fixture: Fixture = serde_json::from_str(json).unwrap();
        assert!(fixture.show_name);
        assert_eq!(fixture.rotation, 0.0);
        assert_eq!(fixture.kind, "pillar");
    }

    #[test]
    fn status_order_matches_batch_order() {
        let mut statuses = vec![
            StallStatus::Unavailable,
            StallStatus::Available,
            StallStatus::Reserved,
            StallStatus::Booked,
        ];
        statuses.sort();
        assert_eq!(statuses, StallStatus::ALL.to_vec());
    }
}
