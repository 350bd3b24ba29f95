use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, TouchEvent, WheelEvent};

use super::error::{GraphError, Result};
use super::frame::FrameLoop;
use super::graph::LinkGraph as Graph;
use super::interaction::{TouchGesture, page_path, touch_gesture};
use super::lifecycle::{
	DEFAULT_INDEX_URL, EventListener, Navigator, Teardown, WidgetSlot, capabilities,
	fetch_content_index, request_navigation,
};
use super::render::CanvasPainter;
use super::state::GraphState;
use super::theme::{Palette, Theme};
use super::types::GraphConfig;
use super::visited::{VisitedSet, local_storage};

type SharedState = Rc<RefCell<Option<GraphState>>>;

/// Everything one build needs, captured synchronously before the first await.
struct BuildRequest {
	canvas: HtmlCanvasElement,
	state: SharedState,
	config: GraphConfig,
	focal: String,
	theme: Theme,
	index_url: String,
	fullscreen: bool,
	record_visit: bool,
	slot: Rc<WidgetSlot>,
	ticket: u64,
}

/// CSS size of the element hosting the canvas.
fn container_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|&(w, h)| w > 0.0 && h > 0.0)
		.unwrap_or((300.0, 250.0))
}

fn size_canvas(canvas: &HtmlCanvasElement, width: f64, height: f64, pixel_ratio: f64) {
	canvas.set_width((width * pixel_ratio) as u32);
	canvas.set_height((height * pixel_ratio) as u32);
	let style = web_sys::HtmlElement::style(canvas);
	let _ = style.set_property("width", &format!("{}px", width));
	let _ = style.set_property("height", &format!("{}px", height));
}

/// Load, lay out and start one widget. Returns its teardown.
///
/// Nothing shared with other builds is touched until the last await has
/// passed and the ticket is still current.
async fn build(req: BuildRequest) -> Result<Teardown> {
	let caps = capabilities().await?;
	req.slot.ensure_current(req.ticket)?;
	let index = fetch_content_index(&req.index_url).await?;
	req.slot.ensure_current(req.ticket)?;
	let window = web_sys::window().ok_or(GraphError::MissingElement("window"))?;

	let visited = match local_storage() {
		Some(store) if req.record_visit => {
			VisitedSet::record(&store, &req.focal).unwrap_or_else(|e| {
				warn!("link-graph: {}", e);
				VisitedSet::load(&store)
			})
		}
		Some(store) => VisitedSet::load(&store),
		None => VisitedSet::default(),
	};

	let ctx: CanvasRenderingContext2d = req
		.canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|c| c.dyn_into().ok())
		.ok_or(GraphError::MissingElement("2d canvas context"))?;

	let (w, h) = container_size(&req.canvas);
	size_canvas(&req.canvas, w, h, caps.pixel_ratio);

	let graph = Graph::build(&index, &req.focal, &req.config);
	debug!(
		"link-graph: {} nodes, {} edges around {}",
		graph.nodes.len(),
		graph.edges.len(),
		req.focal
	);
	let palette = Palette::from_document(req.theme);
	*req.state.borrow_mut() = Some(GraphState::new(
		graph,
		req.config,
		palette,
		req.focal,
		&visited,
		w,
		h,
	));

	let mut teardown = Teardown::default();
	let state_release = req.state.clone();
	teardown.defer(move || {
		state_release.borrow_mut().take();
	});

	let frames = FrameLoop::start(req.state.clone(), CanvasPainter::new(ctx, caps.pixel_ratio))?;
	teardown.defer(move || frames.stop());

	if req.fullscreen {
		let (state_resize, canvas_resize, ratio) = (req.state.clone(), req.canvas.clone(), caps.pixel_ratio);
		let listener = EventListener::new(&window, "resize", move |_| {
			let (nw, nh) = container_size(&canvas_resize);
			size_canvas(&canvas_resize, nw, nh, ratio);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		})?;
		teardown.own(listener);
	}

	Ok(teardown)
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, client_x: f64, client_y: f64) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((client_x - rect.left(), client_y - rect.top()))
}

fn mouse_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	pointer(canvas_ref, ev.client_x() as f64, ev.client_y() as f64)
}

/// Touch points relative to the canvas.
fn touch_points(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &TouchEvent) -> Vec<(f64, f64)> {
	let touches = ev.touches();
	(0..touches.length())
		.filter_map(|i| touches.get(i))
		.filter_map(|t| pointer(canvas_ref, t.client_x() as f64, t.client_y() as f64))
		.collect()
}

/// An interactive link graph around `focal`.
///
/// The widget is rebuilt whenever the focal slug or the theme changes and is
/// torn down when the component unmounts.
#[component]
pub fn LinkGraph(
	#[prop(into)] focal: Signal<String>,
	#[prop(default = GraphConfig::local())] config: GraphConfig,
	#[prop(into, default = DEFAULT_INDEX_URL.to_string())] index_url: String,
	/// Re-measure the container whenever the window resizes.
	#[prop(default = false)]
	fullscreen: bool,
	/// Add the focal page to the visited set on every build.
	#[prop(default = true)]
	record_visit: bool,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let slot = Rc::new(WidgetSlot::default());
	let theme = use_context::<RwSignal<Theme>>();
	let navigator = use_context::<Navigator>();

	let (state_init, slot_init, cfg_init) = (state.clone(), slot.clone(), config.clone());
	Effect::new(move |prev: Option<String>| {
		let focal = focal.get();
		let theme = theme.map(|t| t.get()).unwrap_or_default();
		let Some(canvas) = canvas_ref.get() else {
			return focal;
		};
		if let Some(prev) = prev.filter(|p| *p != focal) {
			debug!("link-graph: leaving {}, rebuilding for {}", prev, focal);
		}

		let ticket = slot_init.begin();
		let req = BuildRequest {
			canvas: canvas.into(),
			state: state_init.clone(),
			config: cfg_init.clone(),
			focal: focal.clone(),
			theme,
			index_url: index_url.clone(),
			fullscreen,
			record_visit,
			slot: slot_init.clone(),
			ticket,
		};
		let slot = slot_init.clone();
		wasm_bindgen_futures::spawn_local(async move {
			match build(req).await {
				Ok(teardown) => {
					if !slot.install(ticket, teardown) {
						debug!("link-graph: discarded stale build");
					}
				}
				Err(GraphError::Superseded(t)) => debug!("link-graph: build {} superseded", t),
				Err(e) => warn!("link-graph: graph not rendered: {}", e),
			}
		});
		focal
	});

	let slot_cleanup = StoredValue::new_local(slot);
	on_cleanup(move || {
		slot_cleanup.try_with_value(|slot| slot.cancel());
	});

	let navigate = move |url: Option<String>| {
		if let Some(url) = url {
			request_navigation(navigator, &page_path(&focal.get_untracked(), &url));
		}
	};

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(p) = mouse_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(p, js_sys::Date::now());
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = mouse_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(p, js_sys::Date::now());
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let url = state_mu
			.borrow_mut()
			.as_mut()
			.and_then(|s| s.pointer_up(js_sys::Date::now()));
		navigate(url);
	};

	let state_cl = state.clone();
	let on_click = move |ev: MouseEvent| {
		let Some(p) = mouse_position(canvas_ref, &ev) else {
			return;
		};
		let url = state_cl.borrow().as_ref().and_then(|s| s.click(p));
		navigate(url);
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave(js_sys::Date::now());
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		let Some(p) = mouse_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			if config.zoom {
				ev.prevent_default();
			}
			s.wheel(ev.delta_y(), p, js_sys::Date::now());
		}
	};

	let state_ts = state.clone();
	let on_touchstart = move |ev: TouchEvent| {
		let points = touch_points(canvas_ref, &ev);
		if let Some(ref mut s) = *state_ts.borrow_mut() {
			let now = js_sys::Date::now();
			match touch_gesture(&points) {
				TouchGesture::Press(p) => {
					// keeps the browser from replaying the tap as mouse events
					ev.prevent_default();
					s.pointer_down(p, now);
				}
				TouchGesture::Pinch { distance, anchor } => {
					ev.prevent_default();
					s.pointer_leave(now);
					s.pinch(distance, anchor, now);
				}
				TouchGesture::Lifted => {}
			}
		}
	};

	let state_tm = state.clone();
	let on_touchmove = move |ev: TouchEvent| {
		let points = touch_points(canvas_ref, &ev);
		if let Some(ref mut s) = *state_tm.borrow_mut() {
			ev.prevent_default();
			let now = js_sys::Date::now();
			match touch_gesture(&points) {
				TouchGesture::Press(p) => s.pointer_move(p, now),
				TouchGesture::Pinch { distance, anchor } => s.pinch(distance, anchor, now),
				TouchGesture::Lifted => {}
			}
		}
	};

	let state_te = state.clone();
	let on_touchend = move |ev: TouchEvent| {
		let url = state_te.borrow_mut().as_mut().and_then(|s| {
			ev.prevent_default();
			s.interaction.end_pinch();
			match touch_gesture(&touch_points(canvas_ref, &ev)) {
				TouchGesture::Lifted => s.pointer_up(js_sys::Date::now()),
				_ => None,
			}
		});
		navigate(url);
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="link-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:click=on_click
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			on:touchstart=on_touchstart
			on:touchmove=on_touchmove
			on:touchend=on_touchend
			style="display: block; cursor: pointer; touch-action: none;"
		/>
	}
}
