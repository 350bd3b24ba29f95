//! The scheduled render task: one simulation step and one paint per display frame.

use std::cell::{Cell, RefCell};
use std::ops::ControlFlow;
use std::rc::Rc;

use log::{debug, error};
use wasm_bindgen::prelude::*;

use super::error::{GraphError, Result, describe};
use super::render::Painter;
use super::state::GraphState;

/// Fixed simulation step per frame, in seconds.
pub const FRAME_DT: f32 = 0.016;

/// Shared stop flag checked before every frame.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
	pub fn cancel(&self) {
		self.0.set(true);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.get()
	}
}

/// Run one frame. A paint failure cancels `token`; the caller must not reschedule on `Break`.
pub fn run_frame(
	state: &mut GraphState,
	painter: &mut impl Painter,
	token: &CancelToken,
	now: f64,
) -> ControlFlow<()> {
	if token.is_cancelled() {
		return ControlFlow::Break(());
	}
	state.step(FRAME_DT);
	if let Err(e) = painter.paint(state, now) {
		error!("link-graph: render loop halted for {}: {}", state.focal, e);
		token.cancel();
		return ControlFlow::Break(());
	}
	ControlFlow::Continue(())
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// `requestAnimationFrame` loop over a widget's state.
pub struct FrameLoop {
	token: CancelToken,
	pending: Rc<Cell<Option<i32>>>,
	callback: FrameCallback,
}

impl FrameLoop {
	pub fn start<P: Painter + 'static>(
		state: Rc<RefCell<Option<GraphState>>>,
		mut painter: P,
	) -> Result<Self> {
		let window = web_sys::window().ok_or(GraphError::MissingElement("window"))?;
		let token = CancelToken::default();
		let pending: Rc<Cell<Option<i32>>> = Rc::default();
		let callback: FrameCallback = Rc::default();

		let (token_inner, pending_inner, callback_inner) =
			(token.clone(), pending.clone(), callback.clone());
		*callback.borrow_mut() = Some(Closure::new(move || {
			pending_inner.set(None);
			let flow = match state.borrow_mut().as_mut() {
				Some(s) => run_frame(s, &mut painter, &token_inner, js_sys::Date::now()),
				None => ControlFlow::Break(()),
			};
			if flow.is_break() {
				return;
			}
			if let Some(ref cb) = *callback_inner.borrow() {
				if let Some(window) = web_sys::window() {
					pending_inner.set(
						window
							.request_animation_frame(cb.as_ref().unchecked_ref())
							.ok(),
					);
				}
			}
		}));

		if let Some(ref cb) = *callback.borrow() {
			let handle = window
				.request_animation_frame(cb.as_ref().unchecked_ref())
				.map_err(|e| GraphError::Capability(describe(&e)))?;
			pending.set(Some(handle));
		}

		Ok(Self {
			token,
			pending,
			callback,
		})
	}

	/// Stop scheduling, cancel the queued frame and drop the callback.
	pub fn stop(&self) {
		self.token.cancel();
		if let Some(handle) = self.pending.take() {
			if let Some(window) = web_sys::window() {
				let _ = window.cancel_animation_frame(handle);
			}
		}
		self.callback.borrow_mut().take();
		debug!("link-graph: frame loop stopped");
	}
}
