//! Two-finger touch decoding, independent of mouse input.

use std::collections::HashMap;

use egui::{Pos2, TouchPhase};

/// Result of feeding one touch event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PinchUpdate {
    /// Nothing pinch-related happened.
    None,
    /// Exactly two touches just became active.
    Started,
    /// Two touches moved; `factor` is relative to the reference distance.
    Moved {
        center: Pos2,
        distance: f32,
        factor: f32,
    },
    /// A pinch was in progress and the touch count changed.
    Lost,
}

/// Tracks active touches and the pinch reference distance.
///
/// The reference is reset whenever the touch count changes, and moves forward
/// only when the caller reports a pinch step as applied.
#[derive(Debug, Default)]
pub struct PinchTracker {
    /// Active touch points.
    touches: HashMap<u64, Pos2>,
    /// Distance the last applied zoom was computed against.
    reference_distance: Option<f32>,
}

impl PinchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    pub fn is_pinching(&self) -> bool {
        self.touches.len() == 2 && self.reference_distance.is_some()
    }

    pub fn handle(&mut self, id: u64, phase: TouchPhase, pos: Pos2) -> PinchUpdate {
        let was_pinching = self.is_pinching();
        match phase {
            TouchPhase::Start => {
                self.touches.insert(id, pos);
                self.on_count_changed(was_pinching)
            }
            TouchPhase::Move => {
                if !self.touches.contains_key(&id) {
                    // move for a touch we never saw start
                    self.touches.insert(id, pos);
                    return self.on_count_changed(was_pinching);
                }
                self.touches.insert(id, pos);
                match (self.pair(), self.reference_distance) {
                    (Some((a, b)), Some(reference)) if reference > 0.0 => {
                        let distance = a.distance(b);
                        PinchUpdate::Moved {
                            center: a.lerp(b, 0.5),
                            distance,
                            factor: distance / reference,
                        }
                    }
                    _ => PinchUpdate::None,
                }
            }
            TouchPhase::End | TouchPhase::Cancel => {
                if self.touches.remove(&id).is_none() {
                    return PinchUpdate::None;
                }
                self.on_count_changed(was_pinching)
            }
        }
    }

    /// Record that a zoom computed at `distance` was applied.
    pub fn mark_applied(&mut self, distance: f32) {
        if self.is_pinching() {
            self.reference_distance = Some(distance);
        }
    }

    pub fn reset(&mut self) {
        self.touches.clear();
        self.reference_distance = None;
    }

    fn pair(&self) -> Option<(Pos2, Pos2)> {
        if self.touches.len() != 2 {
            return None;
        }
        let mut it = self.touches.values().copied();
        Some((it.next()?, it.next()?))
    }

    fn on_count_changed(&mut self, was_pinching: bool) -> PinchUpdate {
        self.reference_distance = self.pair().map(|(a, b)| a.distance(b));
        match (was_pinching, self.reference_distance.is_some()) {
            (true, _) => PinchUpdate::Lost,
            (false, true) => PinchUpdate::Started,
            (false, false) => PinchUpdate::None,
        }
    }
}
