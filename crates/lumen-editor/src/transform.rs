//! The asynchronous image-transform boundary.
//!
//! A processor node turns its upstream image into a new one by calling an
//! external collaborator. Only one request may be in flight at a time:
//! [`TransformSlot::begin`] validates the node, sets the busy flag, and
//! hands out a single-use [`TransformTicket`]; the host runs the
//! collaborator and passes the result back to
//! [`TransformSlot::complete`], which clears the flag whatever happened
//! and writes the node's output image only on success.
//!
//! The graph stays fully editable while a request is in flight.

use lumen_core::{GraphModel, ImageRef, NodeId, NodeKind};
use serde::Serialize;
use std::fmt;
use std::future::Future;

pub const DEFAULT_STRENGTH: f64 = 0.5;

// ─── Presets ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPreset {
    #[default]
    Default,
    ArchitectureVisualization,
    InteriorDesign,
    ExhibitionDesign,
    ProductStudio,
    LumionRealistic,
}

impl RenderPreset {
    pub const ALL: [RenderPreset; 6] = [
        RenderPreset::Default,
        RenderPreset::ArchitectureVisualization,
        RenderPreset::InteriorDesign,
        RenderPreset::ExhibitionDesign,
        RenderPreset::ProductStudio,
        RenderPreset::LumionRealistic,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RenderPreset::Default => "Default",
            RenderPreset::ArchitectureVisualization => "Architecture Visualization",
            RenderPreset::InteriorDesign => "Interior Design",
            RenderPreset::ExhibitionDesign => "Exhibition Design",
            RenderPreset::ProductStudio => "Product Studio",
            RenderPreset::LumionRealistic => "Lumion Realistic",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }

    /// The instruction sent to the collaborator: the prompt, plus a style
    /// suffix for any non-default preset.
    pub fn compose(self, prompt: &str) -> String {
        match self {
            RenderPreset::Default => prompt.to_string(),
            preset => format!("{prompt}. Style: {}", preset.label()),
        }
    }
}

// ─── Requests ────────────────────────────────────────────────────────────

/// What the user asked a processor node to do.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransformOptions {
    pub prompt: String,
    pub preset: RenderPreset,
    /// Painted mask, already composited by the host.
    pub mask: Option<ImageRef>,
    /// Creativity in [0, 1]; `None` means the default.
    pub strength: Option<f64>,
}

/// Everything the collaborator receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformRequest {
    pub node: NodeId,
    pub image: ImageRef,
    pub instruction: String,
    pub mask: Option<ImageRef>,
    pub strength: f64,
}

fn normalize_strength(strength: Option<f64>) -> f64 {
    match strength {
        Some(s) if s.is_finite() => s.clamp(0.0, 1.0),
        _ => DEFAULT_STRENGTH,
    }
}

/// A collaborator failure, surfaced to the user once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransformFailure {
    pub message: String,
}

impl TransformFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("a transform is already running")]
    Busy,
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} is not a processor")]
    NotAProcessor(NodeId),
    #[error("enter an instruction first")]
    EmptyInstruction,
    #[error("connect an image source first")]
    MissingConnection(NodeId),
    #[error("source node has no image")]
    MissingUpstreamImage(NodeId),
    #[error("transform failed: {0}")]
    Failed(String),
    #[error("ticket does not match the running transform")]
    StaleTicket,
}

/// The external image editor.
pub trait ImageTransformer {
    fn transform(&self, request: &TransformRequest) -> impl Future<Output = Result<ImageRef, TransformFailure>>;
}

/// Proof that a request was admitted. Consumed by [`TransformSlot::complete`].
#[derive(Debug)]
pub struct TransformTicket {
    id: u64,
    request: TransformRequest,
}

impl TransformTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn request(&self) -> &TransformRequest {
        &self.request
    }

    /// Run the collaborator for this ticket. No retry.
    pub async fn execute<T: ImageTransformer>(&self, transformer: &T) -> Result<ImageRef, TransformFailure> {
        transformer.transform(&self.request).await
    }
}

impl fmt::Display for TransformTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transform #{} on {}", self.id, self.request.node)
    }
}

// ─── Busy flag ───────────────────────────────────────────────────────────

/// Process-wide single outstanding transform.
#[derive(Debug, Clone, Default)]
pub struct TransformSlot {
    in_flight: Option<u64>,
    issued: u64,
}

impl TransformSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Validate and admit a request for `node`. Nothing is mutated on error.
    pub fn begin(
        &mut self,
        graph: &GraphModel,
        node: NodeId,
        options: TransformOptions,
    ) -> Result<TransformTicket, TransformError> {
        if self.is_busy() {
            return Err(TransformError::Busy);
        }
        let target = graph.node(node).ok_or(TransformError::UnknownNode(node))?;
        if target.kind != NodeKind::Processor {
            return Err(TransformError::NotAProcessor(node));
        }
        let prompt = options.prompt.trim();
        if prompt.is_empty() {
            return Err(TransformError::EmptyInstruction);
        }
        let upstream = graph.incoming(node).ok_or(TransformError::MissingConnection(node))?;
        let image = graph
            .node(upstream.from)
            .and_then(|n| n.output_image())
            .ok_or(TransformError::MissingUpstreamImage(upstream.from))?
            .clone();

        self.issued += 1;
        let id = self.issued;
        self.in_flight = Some(id);
        let ticket = TransformTicket {
            id,
            request: TransformRequest {
                node,
                image,
                instruction: options.preset.compose(prompt),
                mask: options.mask,
                strength: normalize_strength(options.strength),
            },
        };
        log::debug!("{ticket} started");
        Ok(ticket)
    }

    /// Finish `ticket`. Clears the busy flag and, on success, writes the
    /// output image. Returns whether the image was written (the node may
    /// have been deleted meanwhile).
    pub fn complete(
        &mut self,
        graph: &mut GraphModel,
        ticket: TransformTicket,
        result: Result<ImageRef, TransformFailure>,
    ) -> Result<bool, TransformError> {
        if self.in_flight != Some(ticket.id) {
            log::warn!("{ticket}: stale completion ignored");
            return Err(TransformError::StaleTicket);
        }
        self.in_flight = None;

        match result {
            Ok(image) => {
                let written = graph.set_image(ticket.request.node, image);
                if !written {
                    log::debug!("{ticket}: node gone, result dropped");
                }
                Ok(written)
            }
            Err(failure) => {
                log::warn!("{ticket} failed: {failure}");
                Err(TransformError::Failed(failure.message))
            }
        }
    }
}
