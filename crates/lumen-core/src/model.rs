//! Node, connection, and payload types for the image pipeline canvas.
//!
//! Positions and sizes are in world units (independent of pan and zoom).
//! A node's `payload` is an open key → value map; the only key the engine
//! itself reads is [`OUTPUT_IMAGE`], which holds the image the node has
//! produced (uploaded for inputs, generated for processors).

use crate::id::{ConnectionId, NodeId};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::collections::BTreeMap;
use std::fmt;

/// Payload key under which a node stores the image it produced.
pub const OUTPUT_IMAGE: &str = "output_image";

// ─── Node kinds & handles ────────────────────────────────────────────────

/// The role a node plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Image source (upload). Output side only.
    Input,
    /// Image transform step. Both sides.
    Processor,
    /// Final render viewer. Input side only.
    Output,
}

impl NodeKind {
    pub const ALL: [NodeKind; 3] = [NodeKind::Input, NodeKind::Processor, NodeKind::Output];

    pub fn default_title(self) -> &'static str {
        match self {
            NodeKind::Input => "Source Image",
            NodeKind::Processor => "Gemini 2.5 Flash",
            NodeKind::Output => "Output",
        }
    }

    /// Name shown in the quick-add menu.
    pub fn menu_label(self) -> &'static str {
        match self {
            NodeKind::Input => "Image Input",
            NodeKind::Processor => "Processor",
            NodeKind::Output => "Final Output",
        }
    }

    pub fn default_size(self) -> Size {
        match self {
            NodeKind::Input | NodeKind::Output => Size::new(320.0, 320.0),
            NodeKind::Processor => Size::new(400.0, 450.0),
        }
    }

    /// Handles this kind exposes, in drawing order.
    pub fn handles(self) -> SmallVec<[HandleKind; 2]> {
        match self {
            NodeKind::Input => smallvec![HandleKind::Source],
            NodeKind::Processor => smallvec![HandleKind::Target, HandleKind::Source],
            NodeKind::Output => smallvec![HandleKind::Target],
        }
    }

    pub fn has_handle(self, handle: HandleKind) -> bool {
        self.handles().contains(&handle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Input => "input",
            NodeKind::Processor => "processor",
            NodeKind::Output => "output",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "input" => Some(NodeKind::Input),
            "processor" => Some(NodeKind::Processor),
            "output" => Some(NodeKind::Output),
            _ => None,
        }
    }
}

/// A typed connection endpoint on a node.
///
/// `Source` sits on the output (right) side, `Target` on the input (left)
/// side. A connection always runs from a source handle to a target handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleKind {
    Source,
    Target,
}

impl HandleKind {
    pub fn opposite(self) -> Self {
        match self {
            HandleKind::Source => HandleKind::Target,
            HandleKind::Target => HandleKind::Source,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HandleKind::Source => "source",
            HandleKind::Target => "target",
        }
    }
}

// ─── Images & payload ────────────────────────────────────────────────────

/// An embeddable image reference, normally a `data:` URL.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Build a data URL from a mime type and an already base64-encoded body.
    pub fn from_base64(mime_type: &str, body: &str) -> Self {
        Self(format!("data:{mime_type};base64,{body}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Mime type of a base64 data URL, if this is one.
    pub fn mime_type(&self) -> Option<&str> {
        self.split_data_url().map(|(mime, _)| mime)
    }

    /// The base64 body with any `data:<mime>;base64,` header stripped.
    /// Non-data-URL references are returned unchanged.
    pub fn base64_body(&self) -> &str {
        self.split_data_url().map(|(_, body)| body).unwrap_or(&self.0)
    }

    fn split_data_url(&self) -> Option<(&str, &str)> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, body) = rest.split_once(',')?;
        let mime = header.strip_suffix(";base64")?;
        Some((mime, body))
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Data URLs run to megabytes; keep logs readable.
        match self.mime_type() {
            Some(mime) => write!(f, "ImageRef({mime}, {} bytes)", self.base64_body().len()),
            None => write!(f, "ImageRef({:?})", self.0),
        }
    }
}

/// A single value in a node's payload map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PayloadValue {
    Image(ImageRef),
    Text(String),
    Number(f64),
    Flag(bool),
}

pub type Payload = BTreeMap<String, PayloadValue>;

// ─── Node ────────────────────────────────────────────────────────────────

/// A node placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Top-left corner in world units.
    pub position: Point,
    /// `None` means "use the renderer's fallback size".
    pub size: Option<Size>,
    pub title: String,
    #[serde(default)]
    pub payload: Payload,
}

impl Node {
    /// A node with the per-kind default title and size.
    pub fn new(id: NodeId, kind: NodeKind, position: Point) -> Self {
        Self {
            id,
            kind,
            position,
            size: Some(kind.default_size()),
            title: kind.default_title().to_string(),
            payload: Payload::new(),
        }
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn effective_size(&self, fallback: Size) -> Size {
        self.size.unwrap_or(fallback)
    }

    /// World-space bounding box.
    pub fn bounds(&self, fallback: Size) -> Rect {
        Rect::from_origin_size(self.position, self.effective_size(fallback))
    }

    pub fn output_image(&self) -> Option<&ImageRef> {
        match self.payload.get(OUTPUT_IMAGE) {
            Some(PayloadValue::Image(image)) => Some(image),
            _ => None,
        }
    }
}

// ─── Connection ──────────────────────────────────────────────────────────

/// A directed link from a source node's output to a target node's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub from: NodeId,
    pub to: NodeId,
}

impl Connection {
    pub fn touches(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }
}
