//! Color palettes for the floor plan
//!
//! Stall fills by booking status, walkway strokes by path type, and the
//! chrome/selection accents.

use egui::Color32;
use floorplan_types::{PathKind, StallStatus};

// =============================================================================
// STALLS
// =============================================================================

pub fn status_fill(status: StallStatus) -> Color32 {
    match status {
        StallStatus::Available => Color32::from_rgb(200, 230, 201), // Light green
        StallStatus::Booked => Color32::from_rgb(255, 205, 210),    // Light red
        StallStatus::Reserved => Color32::from_rgb(255, 236, 179),  // Light amber
        StallStatus::Unavailable => Color32::from_rgb(224, 224, 224), // Gray
    }
}

pub fn status_border(status: StallStatus) -> Color32 {
    match status {
        StallStatus::Available => Color32::from_rgb(56, 142, 60),
        StallStatus::Booked => Color32::from_rgb(211, 47, 47),
        StallStatus::Reserved => Color32::from_rgb(255, 160, 0),
        StallStatus::Unavailable => Color32::from_rgb(158, 158, 158),
    }
}

pub const SELECTED_FILL: Color32 = Color32::from_rgb(144, 202, 249); // Light blue
pub const SELECTED_BORDER: Color32 = Color32::from_rgb(21, 101, 192);
pub const HOVER_BORDER: Color32 = Color32::from_rgb(66, 66, 66);
pub const SHADOW: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 40);
pub const STALL_TEXT: Color32 = Color32::from_rgb(33, 33, 33);

// =============================================================================
// HALLS / GRID
// =============================================================================

pub const HALL_FILL: Color32 = Color32::from_rgb(250, 250, 250);
pub const HALL_BORDER: Color32 = Color32::from_rgb(97, 97, 97);
pub const HALL_LABEL: Color32 = Color32::from_rgb(117, 117, 117);
pub const GRID_MAJOR: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 28);
pub const GRID_MINOR: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 12);
pub const CANVAS_BG: Color32 = Color32::from_rgb(238, 238, 238);

// =============================================================================
// FIXTURES / PATHS
// =============================================================================

pub const FIXTURE_DEFAULT: Color32 = Color32::from_rgb(176, 190, 197); // Blue gray
pub const FIXTURE_BORDER: Color32 = Color32::from_rgb(84, 110, 122);
pub const FIXTURE_TEXT: Color32 = Color32::from_rgb(38, 50, 56);

/// Semi-transparent stroke colour per path type
pub fn path_color(kind: PathKind) -> Color32 {
    let (r, g, b) = match kind {
        PathKind::Path => (189, 189, 189),
        PathKind::Entrance => (76, 175, 80),
        PathKind::Exit => (33, 150, 243),
        PathKind::Emergency => (244, 67, 54),
    };
    Color32::from_rgba_unmultiplied(r, g, b, 110)
}

// =============================================================================
// CHROME
// =============================================================================

pub const BAND_FILL: Color32 = Color32::from_rgba_premultiplied(20, 50, 96, 40);
pub const BAND_BORDER: Color32 = Color32::from_rgb(21, 101, 192);
pub const TOOLTIP_BG: Color32 = Color32::from_rgba_premultiplied(33, 33, 33, 230);
pub const TOOLTIP_TEXT: Color32 = Color32::WHITE;
pub const OFFLINE: Color32 = Color32::from_rgb(211, 47, 47);
pub const CONNECTING: Color32 = Color32::from_rgb(255, 160, 0);

/// `#rgb` / `#rrggbb` / `#rrggbbaa`
pub fn parse_hex(hex: &str) -> Option<Color32> {
    let digits = hex.trim().strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match digits.len() {
        3 => {
            let mut it = digits.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
            Some(Color32::from_rgb(it.next()??, it.next()??, it.next()??))
        }
        6 => Some(Color32::from_rgb(
            channel(digits.get(0..2)?)?,
            channel(digits.get(2..4)?)?,
            channel(digits.get(4..6)?)?,
        )),
        8 => Some(Color32::from_rgba_unmultiplied(
            channel(digits.get(0..2)?)?,
            channel(digits.get(2..4)?)?,
            channel(digits.get(4..6)?)?,
            channel(digits.get(6..8)?)?,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(parse_hex("#9e9e9e"), Some(Color32::from_rgb(158, 158, 158)));
        assert_eq!(parse_hex("#fff"), Some(Color32::WHITE));
        assert_eq!(parse_hex("9e9e9e"), None);
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#zzzzzz"), None);
    }

    #[test]
    fn path_colors_are_translucent() {
        assert!(path_color(PathKind::Emergency).a() < 255);
    }
}
