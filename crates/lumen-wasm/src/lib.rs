//! WASM bridge for Lumen: exposes the canvas controller to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The host forwards DOM
//! events, calls `tick()` from `requestAnimationFrame`, and draws with
//! `render()`. Anything structured crosses the boundary as a JSON string.

mod render2d;

use lumen_core::{CanvasConfig, ConnectionId, GraphModel, ImageRef, NodeId, NodeKind, Point, Size, Viewport};
use lumen_editor::link::LinkOutcome;
use lumen_editor::transform::TransformTicket;
use lumen_editor::{
    CanvasController, InputEvent, Modifiers, PointerButton, RenderPreset, Selection, TransformFailure,
    TransformOptions,
};
use lumen_render::geometry::{connection_paths, svg_path};
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// Screen-space radius of the delete badge on a selected connection.
const BADGE_RADIUS: f64 = 12.0;

#[wasm_bindgen]
pub struct NodeCanvas {
    controller: CanvasController,
    /// The transform currently in flight, awaiting JS.
    ticket: Option<TransformTicket>,
    dark_mode: bool,
}

#[wasm_bindgen]
impl NodeCanvas {
    /// Create a canvas seeded with the default three-node pipeline.
    ///
    /// `config_json` may override any subset of the tunables; an invalid
    /// string falls back to the defaults with a console warning.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, config_json: Option<String>) -> Self {
        console_error_panic_hook_setup();

        let config = match config_json.as_deref().map(parse_config) {
            Some(Ok(config)) => config,
            Some(Err(e)) => {
                console_warn(&format!("Lumen: ignoring config: {e}"));
                CanvasConfig::default()
            }
            None => CanvasConfig::default(),
        };
        let viewport = Viewport::new(Size::new(width, height));
        Self {
            controller: CanvasController::new(GraphModel::with_default_pipeline(), viewport, config),
            ticket: None,
            dark_mode: false,
        }
    }

    /// Render to a Canvas2D context.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let theme = if self.dark_mode {
            render2d::CanvasTheme::dark()
        } else {
            render2d::CanvasTheme::light()
        };
        let busy_node = self.ticket.as_ref().map(|t| t.request().node);
        render2d::render_canvas(ctx, &self.controller, busy_node, &theme);
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.controller.resize_surface(Size::new(width, height));
    }

    // ─── Pointer & keyboard ──────────────────────────────────────────────

    /// Returns true if a redraw is needed.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        self.controller.handle(&InputEvent::PointerDown {
            x,
            y,
            button: PointerButton::from_dom(button),
            modifiers: mods(shift, ctrl, alt, meta),
        })
    }

    /// Returns true if a redraw or an animation frame is needed.
    pub fn handle_pointer_move(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.controller.handle(&InputEvent::PointerMove {
            x,
            y,
            modifiers: mods(shift, ctrl, alt, meta),
        })
    }

    /// Returns JSON: `{"changed":bool,"link":"<outcome>"}`.
    pub fn handle_pointer_up(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        let had_link = self.controller.link_state().pending().is_some();
        let changed = self.controller.handle(&InputEvent::PointerUp {
            x,
            y,
            modifiers: mods(shift, ctrl, alt, meta),
        });
        let outcome = if had_link {
            self.controller.last_link_outcome()
        } else {
            None
        };
        serde_json::json!({
            "changed": changed,
            "link": outcome.map(outcome_name).unwrap_or("none"),
        })
        .to_string()
    }

    /// Pointer left the surface or the window lost focus.
    pub fn handle_pointer_leave(&mut self) -> bool {
        self.controller.handle(&InputEvent::PointerLeave)
    }

    pub fn handle_wheel(&mut self, x: f64, y: f64, delta_y: f64) -> bool {
        self.controller.handle(&InputEvent::Wheel { x, y, delta_y })
    }

    /// `in_text_field` must be true while an input or textarea has focus.
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        in_text_field: bool,
    ) -> bool {
        self.controller.handle(&InputEvent::Key {
            key: key.to_string(),
            modifiers: mods(shift, ctrl, alt, meta),
            in_text_field,
        })
    }

    /// Call from `requestAnimationFrame`. Returns true if the graph changed.
    pub fn tick(&mut self) -> bool {
        self.controller.tick()
    }

    /// Whether a coalesced gesture sample is waiting for `tick()`.
    pub fn needs_frame(&self) -> bool {
        self.controller.needs_frame()
    }

    /// Whether window-level pointer listeners should be attached.
    pub fn captures_pointer(&self) -> bool {
        self.controller.captures_pointer()
    }

    // ─── Graph commands ──────────────────────────────────────────────────

    /// Add a node near the viewport centre. Returns its id, or `""` for an
    /// unknown kind.
    pub fn add_node(&mut self, kind: &str) -> String {
        match NodeKind::parse(kind) {
            Some(kind) => self.controller.add_node(kind, None).to_string(),
            None => String::new(),
        }
    }

    /// Add a node at a world position.
    pub fn add_node_at(&mut self, kind: &str, x: f64, y: f64) -> String {
        match NodeKind::parse(kind) {
            Some(kind) => self.controller.add_node(kind, Some(Point::new(x, y))).to_string(),
            None => String::new(),
        }
    }

    pub fn delete_node(&mut self, node_id: &str) -> bool {
        self.controller.delete_node(NodeId::intern(node_id))
    }

    pub fn delete_connection(&mut self, connection_id: &str) -> bool {
        self.controller.delete_connection(ConnectionId::intern(connection_id))
    }

    pub fn select_node(&mut self, node_id: &str) -> bool {
        self.controller.select_node(NodeId::intern(node_id))
    }

    /// If the pointer is over the selected connection's delete badge,
    /// return that connection's id, otherwise `""`.
    pub fn hit_test_delete_badge(&self, x: f64, y: f64) -> String {
        let Some(id) = self.controller.selection().connection() else {
            return String::new();
        };
        let c = &self.controller;
        connection_paths(&c.graph, Some(id), &c.config)
            .into_iter()
            .find(|p| p.id == id)
            .filter(|p| c.viewport.world_to_screen(p.midpoint()).distance(Point::new(x, y)) <= BADGE_RADIUS)
            .map(|p| p.id.to_string())
            .unwrap_or_default()
    }

    pub fn set_title(&mut self, node_id: &str, title: &str) -> bool {
        self.controller.graph.set_title(NodeId::intern(node_id), title)
    }

    /// Store an uploaded file (already read as a data URL) on a node.
    pub fn set_image(&mut self, node_id: &str, data_url: &str) -> bool {
        self.controller.attach_image(NodeId::intern(node_id), ImageRef::new(data_url))
    }

    // ─── Quick-add menu ──────────────────────────────────────────────────

    /// JSON: `{"open":false}` or
    /// `{"open":true,"x":..,"y":..,"source":"<id>","handle":"source","choices":["processor",..]}`.
    pub fn quick_add_menu(&self) -> String {
        match self.controller.quick_add_menu() {
            Some(menu) => {
                let choices: Vec<&str> = menu.choices().iter().map(|k| k.as_str()).collect();
                serde_json::json!({
                    "open": true,
                    "x": menu.anchor.x,
                    "y": menu.anchor.y,
                    "source": menu.source_node.as_str(),
                    "handle": menu.source_handle.as_str(),
                    "choices": choices,
                })
                .to_string()
            }
            None => r#"{"open":false}"#.to_string(),
        }
    }

    /// Pick a kind from the open menu. Returns the new node id, or `""`.
    pub fn choose_quick_add(&mut self, kind: &str) -> String {
        let Some(kind) = NodeKind::parse(kind) else {
            return String::new();
        };
        match self.controller.choose_quick_add(kind) {
            LinkOutcome::NodeAdded { node, .. } => node.to_string(),
            _ => String::new(),
        }
    }

    /// Kind of the quick-add menu row at a screen point (`"processor"`, ...),
    /// or `""`. Check this before `handle_pointer_down`, which closes the menu.
    pub fn hit_test_quick_add(&self, x: f64, y: f64) -> String {
        self.controller
            .quick_add_menu()
            .and_then(|menu| render2d::quick_add_choice_at(menu, Point::new(x, y)))
            .map(|kind| kind.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn dismiss_quick_add(&mut self) -> bool {
        self.controller.dismiss_quick_add()
    }

    // ─── Transforms ──────────────────────────────────────────────────────

    pub fn is_busy(&self) -> bool {
        self.controller.is_busy()
    }

    /// Validate and start a transform on a processor node.
    ///
    /// Returns JSON: `{"ok":true,"request":{...}}` with the request the host
    /// must send to the image service, or `{"ok":false,"error":"..."}`.
    pub fn begin_transform(
        &mut self,
        node_id: &str,
        prompt: &str,
        preset: &str,
        strength: Option<f64>,
        mask: Option<String>,
    ) -> String {
        let options = TransformOptions {
            prompt: prompt.to_string(),
            preset: RenderPreset::from_label(preset).unwrap_or_default(),
            mask: mask.map(ImageRef::new),
            strength,
        };
        match self.controller.begin_transform(NodeId::intern(node_id), options) {
            Ok(ticket) => {
                let request = ticket_json(&ticket);
                self.ticket = Some(ticket);
                serde_json::json!({ "ok": true, "request": request }).to_string()
            }
            Err(e) => error_json(&e.to_string()),
        }
    }

    /// Deliver the image service's result for the in-flight transform.
    pub fn complete_transform(&mut self, data_url: &str) -> String {
        self.finish(Ok(ImageRef::new(data_url)))
    }

    /// Report that the image service failed.
    pub fn fail_transform(&mut self, message: &str) -> String {
        self.finish(Err(TransformFailure::new(message)))
    }

    // ─── Preview ─────────────────────────────────────────────────────────

    pub fn open_preview(&mut self, data_url: &str) {
        self.controller.open_preview(ImageRef::new(data_url));
    }

    pub fn close_preview(&mut self) -> bool {
        self.controller.close_preview()
    }

    /// The previewed image, or `""`.
    pub fn preview(&self) -> String {
        self.controller
            .preview()
            .map(|i| i.as_str().to_string())
            .unwrap_or_default()
    }

    // ─── Read side ───────────────────────────────────────────────────────

    pub fn zoom_percent(&self) -> u32 {
        self.controller.zoom_percent()
    }

    /// Full snapshot for the DOM layer: nodes, connections, viewport,
    /// selection, busy flag.
    pub fn get_state_json(&self) -> String {
        state_json(&self.controller).to_string()
    }

    /// Connection paths as SVG `d` strings in world units.
    pub fn get_connections_svg(&self) -> String {
        let c = &self.controller;
        let paths: Vec<serde_json::Value> = connection_paths(&c.graph, c.selection().connection(), &c.config)
            .iter()
            .map(|p| {
                let mid = p.midpoint();
                serde_json::json!({
                    "id": p.id.as_str(),
                    "d": svg_path(&p.curve),
                    "selected": p.selected,
                    "width": p.visible_width,
                    "hitWidth": p.hit_width,
                    "midX": mid.x,
                    "midY": mid.y,
                })
            })
            .collect();
        serde_json::Value::Array(paths).to_string()
    }
}

impl NodeCanvas {
    fn finish(&mut self, result: Result<ImageRef, TransformFailure>) -> String {
        let Some(ticket) = self.ticket.take() else {
            return error_json("no transform is running");
        };
        match self.controller.complete_transform(ticket, result) {
            Ok(written) => serde_json::json!({ "ok": true, "written": written }).to_string(),
            Err(e) => {
                console_warn(&format!("Lumen: {e}"));
                error_json(&e.to_string())
            }
        }
    }
}

fn mods(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta,
    }
}

fn outcome_name(outcome: LinkOutcome) -> &'static str {
    match outcome {
        LinkOutcome::Committed(_) => "committed",
        LinkOutcome::Rejected(_) => "rejected",
        LinkOutcome::MenuOpened => "menu",
        LinkOutcome::NodeAdded { .. } => "nodeAdded",
        LinkOutcome::Dismissed => "dismissed",
        LinkOutcome::Ignored => "none",
    }
}

fn parse_config(json: &str) -> Result<CanvasConfig, String> {
    let config: CanvasConfig = serde_json::from_str(json).map_err(|e| e.to_string())?;
    config.validate()?;
    Ok(config)
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "ok": false, "error": message }).to_string()
}

fn ticket_json(ticket: &TransformTicket) -> serde_json::Value {
    let req = ticket.request();
    serde_json::json!({
        "ticket": ticket.id(),
        "node": req.node.as_str(),
        "mimeType": req.image.mime_type().unwrap_or("image/png"),
        "image": req.image.base64_body(),
        "instruction": req.instruction,
        "mask": req.mask.as_ref().map(|m| m.base64_body()),
        "strength": req.strength,
    })
}

fn state_json(c: &CanvasController) -> serde_json::Value {
    let nodes: Vec<serde_json::Value> = c
        .graph
        .nodes()
        .map(|n| {
            let size = n.effective_size(c.config.fallback_node_size);
            serde_json::json!({
                "id": n.id.as_str(),
                "kind": n.kind.as_str(),
                "title": n.title,
                "x": n.position.x,
                "y": n.position.y,
                "width": size.width,
                "height": size.height,
                "image": n.output_image().map(|i| i.as_str()),
                "upstreamImage": c.graph.upstream_image(n.id).map(|i| i.as_str()),
            })
        })
        .collect();
    let connections: Vec<serde_json::Value> = c
        .graph
        .connections()
        .map(|conn| serde_json::json!({ "id": conn.id.as_str(), "from": conn.from.as_str(), "to": conn.to.as_str() }))
        .collect();
    let selection = match c.selection() {
        Selection::None => serde_json::Value::Null,
        Selection::Node(id) => serde_json::json!({ "node": id.as_str() }),
        Selection::Connection(id) => serde_json::json!({ "connection": id.as_str() }),
    };
    serde_json::json!({
        "nodes": nodes,
        "connections": connections,
        "viewport": { "panX": c.viewport.pan.x, "panY": c.viewport.pan.y, "zoom": c.viewport.zoom },
        "zoomPercent": c.zoom_percent(),
        "selection": selection,
        "busy": c.is_busy(),
    })
}

fn console_warn(message: &str) {
    log::warn!("{message}");
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&message.into());
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Lumen WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// Validate a config JSON string. Returns `{"ok":true}` or
/// `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_config(json: &str) -> String {
    match parse_config(json) {
        Ok(_) => r#"{"ok":true}"#.to_string(),
        Err(e) => error_json(&e),
    }
}

/// The default tunables as JSON, for hosts that want to tweak a few.
#[wasm_bindgen]
pub fn default_config_json() -> String {
    serde_json::to_string(&CanvasConfig::default()).unwrap_or_else(|_| "{}".to_string())
}

/// Render preset labels in menu order.
#[wasm_bindgen]
pub fn render_presets() -> String {
    let labels: Vec<&str> = RenderPreset::ALL.iter().map(|p| p.label()).collect();
    serde_json::to_string(&labels).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canvas() -> NodeCanvas {
        NodeCanvas::new(1200.0, 800.0, None)
    }

    #[test]
    fn state_snapshot_lists_pipeline() {
        let c = canvas();
        let state: serde_json::Value = serde_json::from_str(&c.get_state_json()).unwrap();
        assert_eq!(state["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(state["connections"].as_array().unwrap().len(), 2);
        assert_eq!(state["nodes"][2]["title"], "Final Render");
        assert_eq!(state["zoomPercent"], 100);
        assert_eq!(state["busy"], false);
    }

    #[test]
    fn bad_config_falls_back() {
        let c = NodeCanvas::new(800.0, 600.0, Some("{ not json".to_string()));
        assert_eq!(c.controller.config, CanvasConfig::default());
        let c = NodeCanvas::new(800.0, 600.0, Some(r#"{"max_zoom": 2.0}"#.to_string()));
        assert_eq!(c.controller.config.max_zoom, 2.0);
        assert!(validate_config("42").contains(r#""ok":false"#));
    }

    #[test]
    fn inverted_zoom_bounds_are_rejected() {
        let json = r#"{"min_zoom": 2.0, "max_zoom": 1.0}"#;
        assert!(validate_config(json).contains(r#""ok":false"#));
        let mut c = NodeCanvas::new(800.0, 600.0, Some(json.to_string()));
        assert_eq!(c.controller.config, CanvasConfig::default());
        c.handle_wheel(400.0, 300.0, -400.0);
        assert_eq!(c.zoom_percent(), 140);
    }

    #[test]
    fn transform_roundtrip_through_json() {
        let mut c = canvas();
        assert!(c.set_image("1", "data:image/png;base64,SRC"));
        let started: serde_json::Value =
            serde_json::from_str(&c.begin_transform("2", "add fog", "Interior Design", Some(2.0), None)).unwrap();
        assert_eq!(started["ok"], true);
        assert_eq!(started["request"]["image"], "SRC");
        assert_eq!(started["request"]["instruction"], "add fog. Style: Interior Design");
        assert_eq!(started["request"]["strength"], 1.0);
        assert!(c.is_busy());

        let blocked: serde_json::Value = serde_json::from_str(&c.begin_transform("2", "x", "", None, None)).unwrap();
        assert_eq!(blocked["ok"], false);

        let done: serde_json::Value = serde_json::from_str(&c.complete_transform("data:image/png;base64,OUT")).unwrap();
        assert_eq!(done["written"], true);
        assert!(!c.is_busy());

        let state: serde_json::Value = serde_json::from_str(&c.get_state_json()).unwrap();
        assert_eq!(state["nodes"][2]["upstreamImage"], "data:image/png;base64,OUT");
    }

    #[test]
    fn failed_transform_reports_error() {
        let mut c = canvas();
        c.set_image("1", "data:image/png;base64,SRC");
        c.begin_transform("2", "x", "Default", None, None);
        let failed: serde_json::Value = serde_json::from_str(&c.fail_transform("rate limited")).unwrap();
        assert_eq!(failed["ok"], false);
        assert_eq!(failed["error"], "transform failed: rate limited");
        assert!(!c.is_busy());
        assert!(c.fail_transform("again").contains("no transform is running"));
    }

    #[test]
    fn quick_add_via_bridge() {
        let mut c = canvas();
        // Output node "3": target handle at world (950, 325).
        c.handle_pointer_down(950.0, 325.0, 0, false, false, false, false);
        c.handle_pointer_move(900.0, 700.0, false, false, false, false);
        let up: serde_json::Value =
            serde_json::from_str(&c.handle_pointer_up(900.0, 700.0, false, false, false, false)).unwrap();
        assert_eq!(up["link"], "menu");

        let menu: serde_json::Value = serde_json::from_str(&c.quick_add_menu()).unwrap();
        assert_eq!(menu["open"], true);
        assert_eq!(menu["handle"], "target");
        assert_eq!(menu["choices"], serde_json::json!(["input", "processor"]));

        // Rows sit below the 32px header, 28px each.
        assert_eq!(c.hit_test_quick_add(950.0, 745.0), "input");
        assert_eq!(c.hit_test_quick_add(950.0, 775.0), "processor");
        assert_eq!(c.hit_test_quick_add(950.0, 710.0), "");
        assert_eq!(c.hit_test_quick_add(1100.0, 745.0), "");

        let id = c.choose_quick_add("input");
        assert!(!id.is_empty());
        let state: serde_json::Value = serde_json::from_str(&c.get_state_json()).unwrap();
        let feeding_output = state["connections"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|conn| conn["to"] == "3")
            .collect::<Vec<_>>();
        assert_eq!(feeding_output.len(), 1);
        assert_eq!(feeding_output[0]["from"], id.as_str());
    }

    #[test]
    fn unknown_kind_is_refused() {
        let mut c = canvas();
        assert_eq!(c.add_node("widget"), "");
        assert!(!c.add_node("output").is_empty());
    }
}
