//! Integration tests: the asynchronous transform boundary.
//!
//! A fake collaborator stands in for the image service so the busy flag,
//! validation, and payload writes can be exercised end to end.

use lumen_core::{ImageRef, NodeId, Point};
use lumen_editor::{
    CanvasController, ImageTransformer, InputEvent, RenderPreset, TransformError, TransformFailure,
    TransformOptions, TransformRequest,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;

/// Records every request and answers with a canned result.
struct FakeTransformer {
    answer: Result<ImageRef, TransformFailure>,
    seen: RefCell<Vec<TransformRequest>>,
}

impl FakeTransformer {
    fn ok(body: &str) -> Self {
        Self {
            answer: Ok(ImageRef::from_base64("image/png", body)),
            seen: RefCell::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            answer: Err(TransformFailure::new(message)),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl ImageTransformer for FakeTransformer {
    async fn transform(&self, request: &TransformRequest) -> Result<ImageRef, TransformFailure> {
        self.seen.borrow_mut().push(request.clone());
        tokio::task::yield_now().await;
        self.answer.clone()
    }
}

fn processor() -> NodeId {
    NodeId::intern("2")
}

fn ready_canvas() -> CanvasController {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut c = CanvasController::default();
    c.attach_image(NodeId::intern("1"), ImageRef::from_base64("image/jpeg", "SOURCE"));
    c
}

fn prompt(text: &str) -> TransformOptions {
    TransformOptions {
        prompt: text.to_string(),
        ..TransformOptions::default()
    }
}

#[tokio::test]
async fn success_flows_to_output_node() {
    let mut c = ready_canvas();
    let fake = FakeTransformer::ok("EDITED");
    let ticket = c
        .begin_transform(
            processor(),
            TransformOptions {
                prompt: "warm evening light".to_string(),
                preset: RenderPreset::ArchitectureVisualization,
                mask: Some(ImageRef::from_base64("image/png", "MASK")),
                strength: None,
            },
        )
        .unwrap();
    assert!(c.is_busy());

    let result = ticket.execute(&fake).await;
    assert_eq!(c.complete_transform(ticket, result), Ok(true));
    assert!(!c.is_busy());

    let seen = fake.seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].image.base64_body(), "SOURCE");
    assert_eq!(seen[0].image.mime_type(), Some("image/jpeg"));
    assert_eq!(seen[0].instruction, "warm evening light. Style: Architecture Visualization");
    assert_eq!(seen[0].mask.as_ref().map(|m| m.base64_body()), Some("MASK"));
    assert_eq!(seen[0].strength, 0.5);

    let output = c.graph.upstream_image(NodeId::intern("3")).unwrap();
    assert_eq!(output.base64_body(), "EDITED");
}

#[tokio::test]
async fn failure_is_reported_once_and_changes_nothing() {
    let mut c = ready_canvas();
    let before = c.graph.node(processor()).unwrap().clone();
    let fake = FakeTransformer::failing("safety filter");
    let ticket = c.begin_transform(processor(), prompt("x")).unwrap();
    let result = ticket.execute(&fake).await;

    assert_eq!(
        c.complete_transform(ticket, result),
        Err(TransformError::Failed("safety filter".to_string()))
    );
    assert!(!c.is_busy());
    assert_eq!(c.graph.node(processor()).unwrap(), &before);
}

#[tokio::test]
async fn graph_stays_editable_while_busy() {
    let mut c = ready_canvas();
    let fake = FakeTransformer::ok("NEW");
    let ticket = c.begin_transform(processor(), prompt("x")).unwrap();

    assert_eq!(c.begin_transform(processor(), prompt("y")).unwrap_err(), TransformError::Busy);

    // Drag the processor by its header while the request is in flight.
    c.handle(&InputEvent::pointer_down(500.0, 160.0));
    c.handle(&InputEvent::pointer_move(520.0, 180.0));
    c.handle(&InputEvent::pointer_up(520.0, 180.0));
    assert_eq!(c.graph.node(processor()).unwrap().position, Point::new(470.0, 170.0));

    let result = ticket.execute(&fake).await;
    assert_eq!(c.complete_transform(ticket, result), Ok(true));
    assert!(c.begin_transform(processor(), prompt("again")).is_ok());
}

#[tokio::test]
async fn missing_upstream_blocks_before_any_call() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut c = CanvasController::default();
    assert_eq!(
        c.begin_transform(processor(), prompt("x")).unwrap_err(),
        TransformError::MissingUpstreamImage(NodeId::intern("1"))
    );
    let incoming = c.graph.incoming(processor()).unwrap().id;
    c.delete_connection(incoming);
    let err = c.begin_transform(processor(), prompt("x")).unwrap_err();
    assert_eq!(err, TransformError::MissingConnection(processor()));
    assert_eq!(err.to_string(), "connect an image source first");
    assert!(!c.is_busy());
}
