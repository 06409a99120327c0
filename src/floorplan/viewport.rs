//! Viewport - scale + offset camera over world space
//!
//! `screen = world * scale + offset`, with screen coordinates relative to the
//! canvas origin. Every operation returns a new value; callers commit it
//! through the store so a frame never sees a half-applied transform.

use egui::{Pos2, Rect, Vec2};

use crate::config::ViewportConfig;

/// Allowed zoom range in screen pixels per metre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLimits {
    pub min: f32,
    pub max: f32,
}

impl ScaleLimits {
    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.min, self.max)
    }
}

impl Default for ScaleLimits {
    fn default() -> Self {
        Self::from(&ViewportConfig::default())
    }
}

impl From<&ViewportConfig> for ScaleLimits {
    fn from(config: &ViewportConfig) -> Self {
        Self {
            min: config.min_scale,
            max: config.max_scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub offset: Vec2,
    /// Set while a pan drag is in progress
    pub is_dragging: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            is_dragging: false,
        }
    }
}

impl Viewport {
    pub fn new(scale: f32, offset: Vec2) -> Self {
        Self {
            scale,
            offset,
            is_dragging: false,
        }
    }

    // =========================================================================
    // TRANSFORMS
    // =========================================================================

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.scale + self.offset).to_pos2()
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.offset) / self.scale).to_pos2()
    }

    pub fn world_rect_to_screen(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.world_to_screen(rect.min), self.world_to_screen(rect.max))
    }

    pub fn screen_rect_to_world(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.screen_to_world(rect.min), self.screen_to_world(rect.max))
    }

    /// World-space region covered by a canvas of `size` pixels
    pub fn visible_world_rect(&self, size: Vec2) -> Rect {
        self.screen_rect_to_world(Rect::from_min_size(Pos2::ZERO, size))
    }

    /// World length -> pixels
    pub fn scale_len(&self, metres: f32) -> f32 {
        metres * self.scale
    }

    pub fn zoom_percent(&self) -> f32 {
        self.scale * 100.0
    }

    // =========================================================================
    // CONTROLS
    // =========================================================================

    /// Zoom by `factor`, keeping the world point under `screen_point` fixed.
    /// A non-finite or non-positive factor leaves the viewport unchanged.
    pub fn zoom_at(&self, screen_point: Pos2, factor: f32, limits: ScaleLimits) -> Viewport {
        if !factor.is_finite() || factor <= 0.0 {
            return *self;
        }
        let new_scale = limits.clamp(self.scale * factor);
        let anchor = self.screen_to_world(screen_point);
        Viewport {
            scale: new_scale,
            offset: screen_point.to_vec2() - anchor.to_vec2() * new_scale,
            is_dragging: self.is_dragging,
        }
    }

    /// Pan relative to where the drag started
    pub fn panned(&self, screen_delta: Vec2) -> Viewport {
        Viewport {
            offset: self.offset + screen_delta,
            ..*self
        }
    }

    pub fn with_dragging(self, is_dragging: bool) -> Viewport {
        Viewport {
            is_dragging,
            ..self
        }
    }

    /// Scale so `bounds` fits inside the padded canvas and centre it
    pub fn fit_to_bounds(
        bounds: Rect,
        viewport_size: Vec2,
        padding: f32,
        limits: ScaleLimits,
    ) -> Viewport {
        let available = (viewport_size - Vec2::splat(2.0 * padding)).max(Vec2::splat(1.0));
        let fit_x = if bounds.width() > 0.0 {
            available.x / bounds.width()
        } else {
            f32::INFINITY
        };
        let fit_y = if bounds.height() > 0.0 {
            available.y / bounds.height()
        } else {
            f32::INFINITY
        };
        let raw = fit_x.min(fit_y);
        let scale = limits.clamp(if raw.is_finite() { raw } else { 1.0 });

        let screen_center = viewport_size / 2.0;
        Viewport {
            scale,
            offset: screen_center - bounds.center().to_vec2() * scale,
            is_dragging: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn transforms_are_inverse() {
        let vp = Viewport::new(2.5, Vec2::new(-30.0, 12.0));
        let p = Pos2::new(17.0, -4.0);
        assert!(close(vp.screen_to_world(vp.world_to_screen(p)), p));
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let vp = Viewport::new(1.0, Vec2::new(10.0, 10.0));
        let anchor = Pos2::new(200.0, 150.0);
        let world_before = vp.screen_to_world(anchor);
        let zoomed = vp.zoom_at(anchor, 2.0, ScaleLimits::default());
        assert_eq!(zoomed.scale, 2.0);
        assert!(close(zoomed.world_to_screen(world_before), anchor));
    }

    #[test]
    fn zoom_clamps_to_limits() {
        let limits = ScaleLimits { min: 0.5, max: 4.0 };
        let vp = Viewport::new(3.0, Vec2::ZERO);
        assert_eq!(vp.zoom_at(Pos2::ZERO, 10.0, limits).scale, 4.0);
        assert_eq!(vp.zoom_at(Pos2::ZERO, 0.01, limits).scale, 0.5);
        assert_eq!(vp.zoom_at(Pos2::ZERO, f32::NAN, limits), vp);
        assert_eq!(vp.zoom_at(Pos2::ZERO, -1.0, limits), vp);
    }

    #[test]
    fn fit_centres_bounds() {
        let bounds = Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(100.0, 50.0));
        let size = Vec2::new(840.0, 640.0);
        let vp = Viewport::fit_to_bounds(bounds, size, 20.0, ScaleLimits::default());
        assert_eq!(vp.scale, 8.0);
        assert!(close(vp.world_to_screen(bounds.center()), (size / 2.0).to_pos2()));
    }

    #[test]
    fn fit_handles_degenerate_bounds() {
        let line = Rect::from_min_max(Pos2::new(0.0, 5.0), Pos2::new(10.0, 5.0));
        let vp = Viewport::fit_to_bounds(line, Vec2::new(100.0, 100.0), 0.0, ScaleLimits::default());
        assert_eq!(vp.scale, 10.0);

        let point = Rect::from_min_max(Pos2::new(3.0, 3.0), Pos2::new(3.0, 3.0));
        let vp = Viewport::fit_to_bounds(point, Vec2::new(100.0, 100.0), 0.0, ScaleLimits::default());
        assert_eq!(vp.scale, 1.0);
    }

    #[test]
    fn pan_moves_offset_only() {
        let vp = Viewport::new(2.0, Vec2::new(1.0, 1.0));
        let panned = vp.panned(Vec2::new(5.0, -3.0));
        assert_eq!(panned.offset, Vec2::new(6.0, -2.0));
        assert_eq!(panned.scale, 2.0);
    }
}
