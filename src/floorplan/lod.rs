//! Level of Detail (LOD) policy
//!
//! Picks a rendering tier from the current scale (pixels per metre).
//! Thresholds: Minimal < low < Low < medium < Medium < high < High
//!
//! Each tier only ever removes features relative to the one above it.
//! Selection indicators are functional and render at every tier.

use crate::config::LodConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LodTier {
    /// Shapes and status colours only, no text
    Minimal,
    /// Labels, no shadows
    Low,
    /// Labels, shadows, major grid
    Medium,
    /// Everything, including the minor grid
    High,
}

/// What a tier draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LodFeatures {
    pub labels: bool,
    pub shadows: bool,
    pub minor_grid: bool,
    pub fixture_icons: bool,
    pub selection_indicators: bool,
}

impl LodTier {
    pub fn for_scale(scale: f32, thresholds: &LodConfig) -> Self {
        match scale {
            s if s >= thresholds.high => LodTier::High,
            s if s >= thresholds.medium => LodTier::Medium,
            s if s >= thresholds.low => LodTier::Low,
            _ => LodTier::Minimal,
        }
    }

    pub fn features(self) -> LodFeatures {
        LodFeatures {
            labels: self >= LodTier::Low,
            shadows: self >= LodTier::Medium,
            minor_grid: self >= LodTier::High,
            fixture_icons: self >= LodTier::Low,
            selection_indicators: true,
        }
    }

    pub fn draws_labels(self) -> bool {
        self.features().labels
    }

    pub fn draws_shadows(self) -> bool {
        self.features().shadows
    }
}

/// Shorthand for [`LodTier::for_scale`]
pub fn lod_for(scale: f32, thresholds: &LodConfig) -> LodTier {
    LodTier::for_scale(scale, thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_follow_thresholds() {
        let cfg = LodConfig::default();
        assert_eq!(lod_for(40.0, &cfg), LodTier::High);
        assert_eq!(lod_for(12.0, &cfg), LodTier::High);
        assert_eq!(lod_for(8.0, &cfg), LodTier::Medium);
        assert_eq!(lod_for(3.0, &cfg), LodTier::Low);
        assert_eq!(lod_for(0.5, &cfg), LodTier::Minimal);
        assert_eq!(lod_for(f32::NAN, &cfg), LodTier::Minimal);
    }

    #[test]
    fn tiers_only_remove_features() {
        let tiers = [LodTier::High, LodTier::Medium, LodTier::Low, LodTier::Minimal];
        for pair in tiers.windows(2) {
            let (upper, lower) = (pair[0].features(), pair[1].features());
            assert!(upper.labels || !lower.labels);
            assert!(upper.shadows || !lower.shadows);
            assert!(upper.minor_grid || !lower.minor_grid);
            assert!(upper.fixture_icons || !lower.fixture_icons);
        }
    }

    #[test]
    fn selection_always_drawn_and_minimal_has_no_text() {
        assert!(LodTier::Minimal.features().selection_indicators);
        assert!(!LodTier::Minimal.draws_labels());
        assert!(LodTier::Medium.draws_shadows());
        assert!(!LodTier::Low.draws_shadows());
    }
}
