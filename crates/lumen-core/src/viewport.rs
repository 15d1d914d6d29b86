//! Screen ↔ world coordinate transform.
//!
//! `pan` is the screen-space position of the world origin and `zoom` the
//! number of screen pixels per world unit:
//!
//! ```text
//! screen = world * zoom + pan
//! world  = (screen - pan) / zoom
//! ```

use crate::config::CanvasConfig;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub pan: Vec2,
    pub zoom: f64,
    /// Visible surface size in screen pixels.
    pub size: Size,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            size: Size::new(800.0, 600.0),
        }
    }
}

impl Viewport {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.pan.x) / self.zoom,
            (screen.y - self.pan.y) / self.zoom,
        )
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.zoom + self.pan.x,
            world.y * self.zoom + self.pan.y,
        )
    }

    /// Convert a screen-space distance into world units.
    pub fn screen_delta_to_world(&self, delta: Vec2) -> Vec2 {
        delta / self.zoom
    }

    /// Change zoom while keeping the world point under `anchor` fixed.
    ///
    /// `proposed` is clamped to the configured range first. Returns `true`
    /// if the viewport changed.
    pub fn zoom_at(&mut self, anchor: Point, proposed: f64, config: &CanvasConfig) -> bool {
        let z0 = self.zoom;
        let z1 = config.clamp_zoom(proposed);
        if z1 == z0 {
            return false;
        }
        let factor = z1 / z0;
        self.pan = Vec2::new(
            anchor.x - (anchor.x - self.pan.x) * factor,
            anchor.y - (anchor.y - self.pan.y) * factor,
        );
        self.zoom = z1;
        log::trace!("zoom {z0:.3} -> {z1:.3} at ({:.1}, {:.1})", anchor.x, anchor.y);
        true
    }

    /// Apply a wheel step at `anchor`. Scrolling down (`delta_y > 0`) zooms out.
    pub fn wheel(&mut self, anchor: Point, delta_y: f64, config: &CanvasConfig) -> bool {
        let proposed = self.zoom - delta_y * config.wheel_sensitivity;
        self.zoom_at(anchor, proposed, config)
    }

    /// Pan relative to where the gesture started: purely additive.
    pub fn pan_from(&mut self, pan_at_start: Vec2, pointer_at_start: Point, pointer: Point) {
        self.pan = pan_at_start + (pointer - pointer_at_start);
    }

    /// World position for a node added without an explicit position.
    pub fn spawn_point(&self, config: &CanvasConfig) -> Point {
        self.screen_to_world(config.spawn_anchor)
    }

    pub fn center(&self) -> Point {
        Point::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    /// Zoom as a rounded percentage for the status readout.
    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// Screen-space spacing and offset of the background dot grid.
    pub fn grid(&self, config: &CanvasConfig) -> (f64, Vec2) {
        (config.grid_spacing * self.zoom, self.pan)
    }
}
