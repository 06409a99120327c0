//! Viewer configuration and capability profiles
//!
//! The host picks a profile at startup (desktop, touch, low-power) instead of
//! the viewer sniffing the device. Throttle and buffer constants are tuning,
//! not contract; any of them can be overridden.
//!
//! Environment overrides (after `.env` is loaded):
//! - `FLOORPLAN_PROFILE` = `desktop` | `touch` | `low_power`
//! - `FLOORPLAN_API_URL`
//! - `FLOORPLAN_PAN_INTERVAL_MS`, `FLOORPLAN_ZOOM_INTERVAL_MS`
//! - `FLOORPLAN_RECONNECT_MS`, `FLOORPLAN_STALENESS_MS`

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Screen pixels kept free around fitted content
    pub fit_padding: f32,
    /// Keyboard zoom factor per step
    pub zoom_step: f32,
    /// Wheel zoom factor per notch
    pub wheel_zoom_step: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 40.0,
            fit_padding: 40.0,
            zoom_step: 1.2,
            wheel_zoom_step: 1.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CullingConfig {
    /// Idle buffer as a fraction of the larger visible extent
    pub base_margin_ratio: f32,
    /// Multiplier applied while dragging or zooming
    pub interacting_factor: f32,
    /// Below this scale the layout counts as zoomed far out
    pub far_out_scale: f32,
    /// Multiplier applied when zoomed far out
    pub far_out_factor: f32,
    /// Entity count above which the R-tree is used instead of a linear scan
    pub rtree_threshold: usize,
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self {
            base_margin_ratio: 0.5,
            interacting_factor: 0.1,
            far_out_scale: 1.0,
            far_out_factor: 0.2,
            rtree_threshold: 512,
        }
    }
}

/// Scale thresholds in screen pixels per metre
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    pub high: f32,
    pub medium: f32,
    pub low: f32,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            high: 12.0,
            medium: 6.0,
            low: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub pan_interval_ms: u64,
    /// Roughly one animation frame
    pub zoom_interval_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            pan_interval_ms: 8,
            zoom_interval_ms: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pointer travel before a press becomes a drag
    pub drag_threshold_px: f32,
    /// Extra screen-space tolerance for stall hit tests
    pub hit_slop_px: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 5.0,
            hit_slop_px: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub show_grid: bool,
    pub grid_major_m: f32,
    pub grid_minor_m: f32,
    /// Stalls smaller than this on screen get no label
    pub label_min_px: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            show_grid: true,
            grid_major_m: 10.0,
            grid_minor_m: 2.0,
            label_min_px: 18.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub api_url: String,
    /// Fixed delay between reconnect attempts
    pub reconnect_interval_ms: u64,
    /// Offline gaps longer than this recommend a fresh snapshot
    pub staleness_threshold_ms: u64,
    pub channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            reconnect_interval_ms: 3_000,
            staleness_threshold_ms: 30_000,
            channel_capacity: 256,
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub viewport: ViewportConfig,
    pub culling: CullingConfig,
    pub lod: LodConfig,
    pub throttle: ThrottleConfig,
    pub interaction: InteractionConfig,
    pub render: RenderConfig,
    pub sync: SyncConfig,
}

impl ViewerConfig {
    /// Mouse + keyboard, full fidelity
    pub fn desktop() -> Self {
        Self::default()
    }

    /// Touch devices: bigger drag slop, tighter buffers
    pub fn touch() -> Self {
        let mut config = Self::default();
        config.interaction.drag_threshold_px = 10.0;
        config.interaction.hit_slop_px = 8.0;
        config.culling.base_margin_ratio = 0.3;
        config.throttle.pan_interval_ms = 12;
        config
    }

    /// Weak GPUs / battery saver: smaller buffers, coarser throttles, no grid
    pub fn low_power() -> Self {
        let mut config = Self::touch();
        config.culling.base_margin_ratio = 0.15;
        config.culling.interacting_factor = 0.05;
        config.throttle.pan_interval_ms = 16;
        config.throttle.zoom_interval_ms = 33;
        config.render.show_grid = false;
        config
    }

    pub fn from_profile(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::desktop()),
            "touch" => Ok(Self::touch()),
            "low_power" | "low-power" => Ok(Self::low_power()),
            _ => Err(ConfigError::InvalidValue {
                key: "FLOORPLAN_PROFILE",
                value: name.to_string(),
            }),
        }
    }

    /// Parse a host-supplied JSON config; missing sections take defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Profile + overrides from the environment (loads `.env` first)
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match lookup("FLOORPLAN_PROFILE") {
            Some(profile) => Self::from_profile(&profile).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "unknown profile, using desktop");
                Self::desktop()
            }),
            None => Self::desktop(),
        };

        if let Some(url) = lookup("FLOORPLAN_API_URL") {
            match url::Url::parse(&url) {
                Ok(_) => config.sync.api_url = url,
                Err(err) => tracing::warn!(url = %url, error = %err, "ignoring FLOORPLAN_API_URL"),
            }
        }
        override_u64(&lookup, "FLOORPLAN_PAN_INTERVAL_MS", &mut config.throttle.pan_interval_ms);
        override_u64(&lookup, "FLOORPLAN_ZOOM_INTERVAL_MS", &mut config.throttle.zoom_interval_ms);
        override_u64(&lookup, "FLOORPLAN_RECONNECT_MS", &mut config.sync.reconnect_interval_ms);
        override_u64(&lookup, "FLOORPLAN_STALENESS_MS", &mut config.sync.staleness_threshold_ms);

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.viewport;
        if !(v.min_scale > 0.0 && v.min_scale < v.max_scale && v.max_scale.is_finite()) {
            return Err(ConfigError::ScaleBounds {
                min: v.min_scale,
                max: v.max_scale,
            });
        }
        Ok(())
    }
}

fn override_u64(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, target: &mut u64) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<u64>() {
        Ok(value) => *target = value,
        Err(_) => {
            let err = ConfigError::InvalidValue { key, value: raw };
            tracing::warn!(error = %err, "ignoring override");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_desktop() {
        let config = ViewerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ViewerConfig::desktop());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn profile_and_overrides_apply() {
        let config = ViewerConfig::from_lookup(lookup_from(&[
            ("FLOORPLAN_PROFILE", "low_power"),
            ("FLOORPLAN_PAN_INTERVAL_MS", "20"),
            ("FLOORPLAN_API_URL", "https://expo.example.com"),
        ]));
        assert!(!config.render.show_grid);
        assert_eq!(config.throttle.pan_interval_ms, 20);
        assert_eq!(config.sync.api_url, "https://expo.example.com");
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let config = ViewerConfig::from_lookup(lookup_from(&[
            ("FLOORPLAN_PROFILE", "toaster"),
            ("FLOORPLAN_RECONNECT_MS", "soon"),
            ("FLOORPLAN_API_URL", "not a url"),
        ]));
        assert_eq!(config, ViewerConfig::desktop());
    }

    #[test]
    fn json_config_fills_missing_sections() {
        let config =
            ViewerConfig::from_json_str(r#"{"throttle": {"pan_interval_ms": 4}}"#).unwrap();
        assert_eq!(config.throttle.pan_interval_ms, 4);
        assert_eq!(config.throttle.zoom_interval_ms, 16);
        assert_eq!(config.lod, LodConfig::default());
    }

    #[test]
    fn json_config_rejects_inverted_scale_bounds() {
        let err = ViewerConfig::from_json_str(
            r#"{"viewport": {"min_scale": 10.0, "max_scale": 1.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ScaleBounds { .. }));
    }
}
