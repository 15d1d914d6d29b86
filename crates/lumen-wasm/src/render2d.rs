//! Canvas2D software renderer.
//!
//! Draws the controller's state to an HTML `<canvas>` via
//! `CanvasRenderingContext2d`: dot grid, connections, the pending link,
//! node cards, then screen-space chrome (delete badge, quick-add menu,
//! zoom readout). World-space content is drawn under one transform.

use lumen_core::{Node, NodeId, NodeKind, Point, Rect};
use lumen_editor::CanvasController;
use lumen_editor::link::QuickAddMenu;
use lumen_render::geometry::{ConnectionPath, connection_paths, handle_position, header_rect, pending_curve};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const FONT: &str = "Inter, system-ui, sans-serif";
const ACCENT: &str = "#3B82F6";
const DANGER: &str = "#EF4444";

/// Theme-dependent colors for the canvas renderer.
pub struct CanvasTheme {
    pub bg: &'static str,
    pub grid: &'static str,
    pub card: &'static str,
    pub card_border: &'static str,
    pub header: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    pub connection: &'static str,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            bg: "#F8FAFC",
            grid: "#CBD5E1",
            card: "#FFFFFF",
            card_border: "#E2E8F0",
            header: "#F8FAFC",
            text: "#0F172A",
            muted: "#64748B",
            connection: "#94A3B8",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#0B1120",
            grid: "#1E293B",
            card: "#111827",
            card_border: "#334155",
            header: "#1F2937",
            text: "#F1F5F9",
            muted: "#94A3B8",
            connection: "#64748B",
        }
    }
}

/// Render the whole canvas. `busy_node` is the processor whose transform
/// is in flight, if any.
pub fn render_canvas(
    ctx: &CanvasRenderingContext2d,
    c: &CanvasController,
    busy_node: Option<NodeId>,
    theme: &CanvasTheme,
) {
    let vp = &c.viewport;
    let (width, height) = (vp.size.width, vp.size.height);

    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, width, height);
    draw_grid(ctx, c, theme);

    ctx.save();
    let _ = ctx.set_transform(vp.zoom, 0.0, 0.0, vp.zoom, vp.pan.x, vp.pan.y);

    let overlay = c.overlay();
    let paths = connection_paths(&c.graph, overlay.selected_connection, &c.config);
    for path in &paths {
        draw_connection(ctx, path, theme);
    }

    if let Some((node, handle, cursor)) = overlay.pending_link
        && let Some(curve) = pending_curve(&c.graph, node, handle, cursor, &c.config)
    {
        ctx.save();
        let _ = ctx.set_line_dash(&dash_pattern(&[5.0, 5.0]));
        ctx.set_stroke_style_str(ACCENT);
        ctx.set_line_width(c.config.connection_width);
        ctx.begin_path();
        ctx.move_to(curve.p0.x, curve.p0.y);
        ctx.bezier_curve_to(curve.p1.x, curve.p1.y, curve.p2.x, curve.p2.y, curve.p3.x, curve.p3.y);
        ctx.stroke();
        ctx.restore();
    }

    for node in c.graph.nodes() {
        if overlay.selected_node != Some(node.id) {
            draw_node(ctx, c, node, false, busy_node == Some(node.id), theme);
        }
    }
    if let Some(node) = overlay.selected_node.and_then(|id| c.graph.node(id)) {
        draw_node(ctx, c, node, true, busy_node == Some(node.id), theme);
    }
    ctx.restore();

    if let Some(path) = paths.iter().find(|p| p.selected) {
        draw_delete_badge(ctx, vp.world_to_screen(path.midpoint()));
    }
    if let Some(menu) = c.quick_add_menu() {
        draw_quick_add_menu(ctx, menu, theme);
    }
    draw_zoom_readout(ctx, c.zoom_percent(), height, theme);
}

fn draw_grid(ctx: &CanvasRenderingContext2d, c: &CanvasController, theme: &CanvasTheme) {
    let (spacing, offset) = c.viewport.grid(&c.config);
    if spacing < 4.0 {
        return;
    }
    ctx.set_fill_style_str(theme.grid);
    let mut x = offset.x.rem_euclid(spacing);
    while x < c.viewport.size.width {
        let mut y = offset.y.rem_euclid(spacing);
        while y < c.viewport.size.height {
            ctx.fill_rect(x, y, 1.0, 1.0);
            y += spacing;
        }
        x += spacing;
    }
}

fn draw_connection(ctx: &CanvasRenderingContext2d, path: &ConnectionPath, theme: &CanvasTheme) {
    let curve = path.curve;
    ctx.set_stroke_style_str(if path.selected { ACCENT } else { theme.connection });
    ctx.set_line_width(path.visible_width);
    ctx.begin_path();
    ctx.move_to(curve.p0.x, curve.p0.y);
    ctx.bezier_curve_to(curve.p1.x, curve.p1.y, curve.p2.x, curve.p2.y, curve.p3.x, curve.p3.y);
    ctx.stroke();
}

fn draw_node(
    ctx: &CanvasRenderingContext2d,
    c: &CanvasController,
    node: &Node,
    selected: bool,
    busy: bool,
    theme: &CanvasTheme,
) {
    let b = node.bounds(c.config.fallback_node_size);
    let (x, y, w, h) = (b.x0, b.y0, b.width(), b.height());

    ctx.save();
    ctx.set_shadow_color("rgba(15, 23, 42, 0.08)");
    ctx.set_shadow_blur(12.0);
    ctx.set_fill_style_str(theme.card);
    rounded_rect_path(ctx, x, y, w, h, 8.0);
    ctx.fill();
    ctx.restore();

    let header = header_rect(node, &c.config);
    ctx.save();
    rounded_rect_path(ctx, x, y, w, h, 8.0);
    ctx.clip();
    ctx.set_fill_style_str(theme.header);
    ctx.fill_rect(header.x0, header.y0, header.width(), header.height());
    ctx.restore();

    ctx.set_fill_style_str(kind_color(node.kind));
    ctx.begin_path();
    let _ = ctx.arc(x + 18.0, header.center().y, 5.0, 0.0, std::f64::consts::TAU);
    ctx.fill();

    ctx.set_font(&format!("600 13px {FONT}"));
    ctx.set_fill_style_str(theme.text);
    ctx.set_text_align("left");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(&node.title, x + 32.0, header.center().y);

    draw_body(ctx, c, node, Rect::new(x, header.y1, b.x1, b.y1), busy, theme);

    ctx.set_stroke_style_str(if selected { ACCENT } else { theme.card_border });
    ctx.set_line_width(if selected { 2.0 } else { 1.0 });
    rounded_rect_path(ctx, x, y, w, h, 8.0);
    ctx.stroke();

    for handle in node.kind.handles() {
        let p = handle_position(node, handle, &c.config);
        ctx.begin_path();
        let _ = ctx.arc(p.x, p.y, c.config.handle_radius, 0.0, std::f64::consts::TAU);
        ctx.set_fill_style_str(theme.card);
        ctx.fill();
        ctx.set_stroke_style_str(theme.connection);
        ctx.set_line_width(2.0);
        ctx.stroke();
    }

    // Resize grip.
    ctx.set_fill_style_str(theme.muted);
    ctx.begin_path();
    ctx.move_to(b.x1 - 4.0, b.y1 - 12.0);
    ctx.line_to(b.x1 - 4.0, b.y1 - 4.0);
    ctx.line_to(b.x1 - 12.0, b.y1 - 4.0);
    ctx.close_path();
    ctx.fill();
}

/// Placeholder text where the DOM layer overlays the node's image.
fn draw_body(
    ctx: &CanvasRenderingContext2d,
    c: &CanvasController,
    node: &Node,
    body: Rect,
    busy: bool,
    theme: &CanvasTheme,
) {
    let label = if busy {
        "Generating…"
    } else {
        let has_image = match node.kind {
            NodeKind::Input | NodeKind::Processor => node.output_image().is_some(),
            NodeKind::Output => c.graph.upstream_image(node.id).is_some(),
        };
        match (node.kind, has_image) {
            (_, true) => return,
            (NodeKind::Input, false) => "Drop an image",
            (NodeKind::Processor, false) => "No result yet",
            (NodeKind::Output, false) => "Waiting for input",
        }
    };
    let center = body.center();
    ctx.set_font(&format!("12px {FONT}"));
    ctx.set_fill_style_str(if busy { ACCENT } else { theme.muted });
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(label, center.x, center.y);
}

fn draw_delete_badge(ctx: &CanvasRenderingContext2d, at: Point) {
    ctx.begin_path();
    let _ = ctx.arc(at.x, at.y, 10.0, 0.0, std::f64::consts::TAU);
    ctx.set_fill_style_str(DANGER);
    ctx.fill();
    ctx.set_stroke_style_str("#FFFFFF");
    ctx.set_line_width(2.0);
    ctx.begin_path();
    ctx.move_to(at.x - 4.0, at.y - 4.0);
    ctx.line_to(at.x + 4.0, at.y + 4.0);
    ctx.move_to(at.x + 4.0, at.y - 4.0);
    ctx.line_to(at.x - 4.0, at.y + 4.0);
    ctx.stroke();
}

const MENU_WIDTH: f64 = 160.0;
const MENU_HEADER: f64 = 32.0;
const MENU_ROW: f64 = 28.0;

fn quick_add_bounds(menu: &QuickAddMenu) -> Rect {
    let h = MENU_HEADER + MENU_ROW * menu.choices().len() as f64;
    Rect::from_origin_size(menu.anchor, (MENU_WIDTH, h))
}

fn quick_add_row(menu: &QuickAddMenu, index: usize) -> Rect {
    let top = menu.anchor.y + MENU_HEADER + MENU_ROW * index as f64;
    Rect::new(menu.anchor.x, top, menu.anchor.x + MENU_WIDTH, top + MENU_ROW)
}

/// The menu row under a screen point, if any.
pub(crate) fn quick_add_choice_at(menu: &QuickAddMenu, at: Point) -> Option<NodeKind> {
    menu.choices()
        .into_iter()
        .enumerate()
        .find(|(i, _)| quick_add_row(menu, *i).contains(at))
        .map(|(_, kind)| kind)
}

fn draw_quick_add_menu(ctx: &CanvasRenderingContext2d, menu: &QuickAddMenu, theme: &CanvasTheme) {
    let bounds = quick_add_bounds(menu);
    let (x, y, w, h) = (bounds.x0, bounds.y0, bounds.width(), bounds.height());

    ctx.save();
    ctx.set_shadow_color("rgba(15, 23, 42, 0.15)");
    ctx.set_shadow_blur(16.0);
    ctx.set_fill_style_str(theme.card);
    rounded_rect_path(ctx, x, y, w, h, 8.0);
    ctx.fill();
    ctx.restore();
    ctx.set_stroke_style_str(theme.card_border);
    ctx.set_line_width(1.0);
    rounded_rect_path(ctx, x, y, w, h, 8.0);
    ctx.stroke();

    ctx.set_text_align("left");
    ctx.set_text_baseline("middle");
    ctx.set_font(&format!("600 11px {FONT}"));
    ctx.set_fill_style_str(theme.muted);
    let _ = ctx.fill_text("ADD NODE", x + 12.0, y + MENU_HEADER / 2.0);

    ctx.set_font(&format!("13px {FONT}"));
    for (i, kind) in menu.choices().into_iter().enumerate() {
        let cy = quick_add_row(menu, i).center().y;
        ctx.set_fill_style_str(kind_color(kind));
        ctx.begin_path();
        let _ = ctx.arc(x + 18.0, cy, 4.0, 0.0, std::f64::consts::TAU);
        ctx.fill();
        ctx.set_fill_style_str(theme.text);
        let _ = ctx.fill_text(kind.menu_label(), x + 30.0, cy);
    }
}

fn draw_zoom_readout(ctx: &CanvasRenderingContext2d, percent: u32, height: f64, theme: &CanvasTheme) {
    ctx.set_font(&format!("12px {FONT}"));
    ctx.set_fill_style_str(theme.muted);
    ctx.set_text_align("left");
    ctx.set_text_baseline("bottom");
    let _ = ctx.fill_text(&format!("{percent}%"), 12.0, height - 12.0);
}

fn kind_color(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Input => "#22C55E",
        NodeKind::Processor => ACCENT,
        NodeKind::Output => "#A855F7",
    }
}

fn dash_pattern(segments: &[f64]) -> JsValue {
    let array = js_sys::Array::new();
    for s in segments {
        array.push(&JsValue::from_f64(*s));
    }
    array.into()
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    let _ = ctx.arc_to(x + w, y, x + w, y + r, r);
    ctx.line_to(x + w, y + h - r);
    let _ = ctx.arc_to(x + w, y + h, x + w - r, y + h, r);
    ctx.line_to(x + r, y + h);
    let _ = ctx.arc_to(x, y + h, x, y + h - r, r);
    ctx.line_to(x, y + r);
    let _ = ctx.arc_to(x, y, x + r, y, r);
    ctx.close_path();
}
