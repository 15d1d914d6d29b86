//! Interaction engine for the Lumen node canvas.
//!
//! Everything here is host-agnostic: the browser bridge and the tests both
//! drive [`CanvasController`] with the same [`InputEvent`]s.

pub mod canvas;
pub mod frame;
pub mod gesture;
pub mod input;
pub mod link;
pub mod selection;
pub mod shortcuts;
pub mod transform;

pub use canvas::CanvasController;
pub use input::{InputEvent, Modifiers, PointerButton};
pub use link::{LinkInteraction, LinkOutcome, RejectReason};
pub use selection::Selection;
pub use transform::{
    ImageTransformer, RenderPreset, TransformError, TransformFailure, TransformOptions, TransformRequest,
    TransformTicket,
};
