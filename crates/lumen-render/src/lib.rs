pub mod geometry;
pub mod hit;
pub mod paint;

pub use hit::{CanvasHit, hit_test};
pub use paint::{CanvasOverlay, paint_canvas};
