//! Canvas tunables.
//!
//! Every constant the interaction engine and renderers depend on lives
//! here so hosts can override them (the WASM bridge accepts a JSON object
//! with any subset of these fields).

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom change per unit of wheel `delta_y` (additive).
    pub wheel_sensitivity: f64,
    /// Smallest size a resize gesture may produce, in world units.
    pub min_node_size: Size,
    /// Size assumed for nodes that carry no explicit size.
    pub fallback_node_size: Size,
    /// Screen point whose world position receives nodes added without one.
    pub spawn_anchor: Point,
    /// Width of the invisible stroke used for connection hit testing.
    pub connection_hit_width: f64,
    pub connection_width: f64,
    pub connection_selected_width: f64,
    /// Lower bound of the bezier control-point offset.
    pub bezier_min_offset: f64,
    /// Fraction of the horizontal span used as control-point offset.
    pub bezier_factor: f64,
    pub handle_radius: f64,
    pub header_height: f64,
    pub resize_corner: f64,
    /// Background dot spacing at zoom 1.
    pub grid_spacing: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 5.0,
            wheel_sensitivity: 0.001,
            min_node_size: Size::new(280.0, 200.0),
            fallback_node_size: Size::new(320.0, 200.0),
            spawn_anchor: Point::new(400.0, 300.0),
            connection_hit_width: 20.0,
            connection_width: 3.0,
            connection_selected_width: 4.0,
            bezier_min_offset: 50.0,
            bezier_factor: 0.5,
            handle_radius: 6.0,
            header_height: 44.0,
            resize_corner: 24.0,
            grid_spacing: 24.0,
        }
    }
}

impl CanvasConfig {
    /// Clamp into `[min_zoom, max_zoom]`. Never panics; with inverted
    /// bounds `max_zoom` wins.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.max(self.min_zoom).min(self.max_zoom)
    }

    /// Reject tunables the engine cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        let zoom_ok = |z: f64| z.is_finite() && z > 0.0;
        if !zoom_ok(self.min_zoom) || !zoom_ok(self.max_zoom) {
            return Err(format!(
                "zoom bounds must be positive and finite (min_zoom = {}, max_zoom = {})",
                self.min_zoom, self.max_zoom
            ));
        }
        if self.min_zoom > self.max_zoom {
            return Err(format!(
                "min_zoom ({}) exceeds max_zoom ({})",
                self.min_zoom, self.max_zoom
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: CanvasConfig = serde_json::from_str(r#"{ "max_zoom": 3.0 }"#).unwrap();
        assert_eq!(config.max_zoom, 3.0);
        assert_eq!(config.min_zoom, 0.1);
        assert_eq!(config.min_node_size, Size::new(280.0, 200.0));
    }

    #[test]
    fn zoom_is_clamped() {
        let config = CanvasConfig::default();
        assert_eq!(config.clamp_zoom(0.01), 0.1);
        assert_eq!(config.clamp_zoom(9.0), 5.0);
        assert_eq!(config.clamp_zoom(1.5), 1.5);
    }

    #[test]
    fn inverted_zoom_bounds() {
        let config = CanvasConfig {
            min_zoom: 2.0,
            max_zoom: 1.0,
            ..CanvasConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.clamp_zoom(1.5), 1.0);
        assert!(CanvasConfig::default().validate().is_ok());
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = CanvasConfig {
                min_zoom: bad,
                ..CanvasConfig::default()
            };
            assert!(config.validate().is_err(), "{bad}");
        }
    }
}
