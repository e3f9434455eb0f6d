//! Leptos component wrapping the topology canvas.
//!
//! The canvas sizes itself to its parent and redraws every animation frame
//! from the designer's store. Plain drag moves a node, shift-drag from one
//! node to another proposes a link, double-click on empty space opens the
//! node form at that point and double-click on a node opens it for editing.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::render;
use super::state::{CanvasState, PanState};
use super::theme::Theme;
use crate::controller::Designer;
use crate::topology::model::Position;

struct CanvasContext {
	state: CanvasState,
	theme: Theme,
}

enum Pick {
	Node(String),
	Empty(Position),
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn parent_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.unwrap_or((800.0, 600.0))
}

#[component]
pub fn TopologyCanvas(designer: RwSignal<Designer>) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<CanvasContext>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};
		let (w, h) = parent_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => {
					error!("clab-designer: 2d context has an unexpected type");
					return;
				}
			},
			_ => {
				error!("clab-designer: canvas has no 2d context");
				return;
			}
		};

		*context_init.borrow_mut() = Some(CanvasContext {
			state: CanvasState::new(w, h),
			theme: Theme::default(),
		});

		let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let (nw, nh) = parent_size(&canvas_resize);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut c) = *context_resize.borrow_mut() {
				c.state.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref c) = *context_anim.borrow() {
				designer.with_untracked(|d| render::render(&c.state, d.store(), &ctx, &c.theme));
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let mut guard = context_md.borrow_mut();
		let Some(c) = guard.as_mut() else {
			return;
		};
		designer.with_untracked(|d| {
			let store = d.store();
			let hit = c.state.node_at_position(store.nodes(), x, y, c.theme.hit_radius);
			match hit.and_then(|id| store.node(&id)) {
				Some(node) if ev.shift_key() => {
					c.state.connect.source = Some(node.id.clone());
					c.state.connect.cursor = c.state.screen_to_graph(x, y);
				}
				Some(node) => c.state.begin_drag(node, x, y),
				None => {
					c.state.pan = PanState {
						active: true,
						start_x: x,
						start_y: y,
						transform_start_x: c.state.transform.x,
						transform_start_y: c.state.transform.y,
					};
				}
			}
		});
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let mut guard = context_mm.borrow_mut();
		let Some(c) = guard.as_mut() else {
			return;
		};
		designer.with_untracked(|d| {
			let store = d.store();
			let hovered = c.state.node_at_position(store.nodes(), x, y, c.theme.hit_radius);
			c.state.hover.set(hovered, store.links());
		});

		if c.state.connect.source.is_some() {
			c.state.connect.cursor = c.state.screen_to_graph(x, y);
		} else if c.state.drag.node.is_some() {
			c.state.drag_to(x, y);
		} else if c.state.pan.active {
			c.state.transform.x = c.state.pan.transform_start_x + (x - c.state.pan.start_x);
			c.state.transform.y = c.state.pan.transform_start_y + (y - c.state.pan.start_y);
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |_: MouseEvent| {
		let (proposed, moved) = {
			let mut guard = context_mu.borrow_mut();
			let Some(c) = guard.as_mut() else {
				return;
			};
			c.state.pan.active = false;
			let proposed = c.state.connect.source.take().zip(c.state.hover.node.clone());
			(proposed, c.state.end_drag())
		};
		if let Some((source, target)) = proposed {
			designer.update(|d| {
				if let Err(e) = d.open_link_form(&source, &target) {
					warn!("clab-designer: cannot link {source} to {target}: {e}");
				}
			});
		}
		if let Some((id, position)) = moved {
			designer.update(|d| {
				d.move_node(&id, position);
			});
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let moved = {
			let mut guard = context_ml.borrow_mut();
			let Some(c) = guard.as_mut() else {
				return;
			};
			c.state.pan.active = false;
			c.state.connect.source = None;
			c.state.hover.set(None, &[]);
			c.state.end_drag()
		};
		if let Some((id, position)) = moved {
			designer.update(|d| {
				d.move_node(&id, position);
			});
		}
	};

	let context_dc = context.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let pick = {
			let guard = context_dc.borrow();
			let Some(c) = guard.as_ref() else {
				return;
			};
			designer
				.with_untracked(|d| c.state.node_at_position(d.store().nodes(), x, y, c.theme.hit_radius))
				.map_or_else(|| Pick::Empty(c.state.screen_to_graph(x, y)), Pick::Node)
		};
		match pick {
			Pick::Node(id) => designer.update(|d| {
				if let Err(e) = d.open_modify_node(&id) {
					warn!("clab-designer: cannot edit {id}: {e}");
				}
			}),
			Pick::Empty(position) => designer.update(|d| d.open_node_form(position)),
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			c.state.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="topology-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:dblclick=on_dblclick
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
