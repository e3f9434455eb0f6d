//! Canvas rendering for the topology view.
//!
//! Draws in three passes for correct z-ordering: background (screen space),
//! then links with their interface names, then nodes and labels on top.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::CanvasState;
use super::theme::Theme;
use crate::topology::TopologyStore;
use crate::topology::model::{Link, Position};

/// Fraction of the link length at which interface names are drawn.
const LABEL_OFFSET: f64 = 0.22;

/// Draw one frame: links, the connect preview, then nodes on top.
pub fn render(state: &CanvasState, store: &TopologyStore, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	ctx.set_fill_style_str(&theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	for link in store.links() {
		draw_link(state, store, ctx, theme, link);
	}
	draw_connect_preview(state, store, ctx, theme);
	for node in store.nodes() {
		let at = state.position_of(node);
		let dimmed = state.hover.is_active() && !state.hover.is_highlighted(&node.id);
		let color = theme.kind_color(&node.kind);
		let alpha = if dimmed { 0.35 } else { 1.0 };

		ctx.set_global_alpha(alpha);
		let gradient = ctx.create_radial_gradient(
			at.x - theme.node_radius * 0.3,
			at.y - theme.node_radius * 0.3,
			0.0,
			at.x,
			at.y,
			theme.node_radius,
		);
		ctx.begin_path();
		let _ = ctx.arc(at.x, at.y, theme.node_radius, 0.0, 2.0 * PI);
		match gradient {
			Ok(gradient) => {
				let _ = gradient.add_color_stop(0.0, &color.lighten(0.4).to_css());
				let _ = gradient.add_color_stop(0.7, &color.to_css());
				let _ = gradient.add_color_stop(1.0, &color.darken(0.2).to_css());
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
			}
			Err(_) => ctx.set_fill_style_str(&color.to_css()),
		}
		ctx.fill();

		if state.hover.node.as_deref() == Some(node.id.as_str()) {
			ctx.begin_path();
			let _ = ctx.arc(at.x, at.y, theme.node_radius + 4.0, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&theme.hover_ring.to_css());
			ctx.set_line_width(1.5 / state.transform.k);
			ctx.stroke();
		}

		ctx.set_fill_style_str(&theme.node_label.to_css());
		ctx.set_font(theme.label_font);
		ctx.set_text_align("center");
		let _ = ctx.fill_text(&node.id, at.x, at.y + theme.node_radius + 14.0);
		ctx.set_global_alpha(1.0);
	}

	ctx.restore();
}

fn endpoint(state: &CanvasState, store: &TopologyStore, id: &str) -> Option<Position> {
	store.node(id).map(|node| state.position_of(node))
}

fn draw_link(
	state: &CanvasState,
	store: &TopologyStore,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	link: &Link,
) {
	let (Some(a), Some(b)) = (
		endpoint(state, store, &link.source),
		endpoint(state, store, &link.target),
	) else {
		return;
	};
	let dimmed = state.hover.is_active()
		&& !(state.hover.node.as_deref() == Some(link.source.as_str())
			|| state.hover.node.as_deref() == Some(link.target.as_str()));
	let color = if dimmed { theme.link_dimmed } else { theme.link };
	ctx.set_stroke_style_str(&color.to_css());
	ctx.set_line_width(1.5);
	ctx.set_font(theme.interface_font);
	ctx.set_text_align("center");
	ctx.set_fill_style_str(&theme.interface_label.to_css());

	// Self-loop: a small circle above the node carrying both interface names.
	if link.source == link.target {
		let r = theme.node_radius * 0.8;
		let (cx, cy) = (a.x, a.y - theme.node_radius - r);
		ctx.begin_path();
		let _ = ctx.arc(cx, cy, r, 0.0, 2.0 * PI);
		ctx.stroke();
		let label = format!("{} / {}", link.source_interface, link.target_interface);
		let _ = ctx.fill_text(&label, cx, cy - r - 4.0);
		return;
	}

	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	ctx.begin_path();
	ctx.move_to(a.x + ux * theme.node_radius, a.y + uy * theme.node_radius);
	ctx.line_to(b.x - ux * theme.node_radius, b.y - uy * theme.node_radius);
	ctx.stroke();

	let _ = ctx.fill_text(
		&link.source_interface,
		a.x + dx * LABEL_OFFSET,
		a.y + dy * LABEL_OFFSET - 4.0,
	);
	let _ = ctx.fill_text(
		&link.target_interface,
		b.x - dx * LABEL_OFFSET,
		b.y - dy * LABEL_OFFSET - 4.0,
	);
}

fn draw_connect_preview(
	state: &CanvasState,
	store: &TopologyStore,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
) {
	let Some(from) = state
		.connect
		.source
		.as_deref()
		.and_then(|id| endpoint(state, store, id))
	else {
		return;
	};
	let to = state.connect.cursor;
	ctx.set_stroke_style_str(&theme.preview.to_css());
	ctx.set_line_width(1.5);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(6.0),
		&JsValue::from_f64(4.0),
	));
	ctx.begin_path();
	ctx.move_to(from.x, from.y);
	ctx.line_to(to.x, to.y);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}
