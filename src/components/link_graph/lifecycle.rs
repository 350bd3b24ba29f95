//! Widget lifecycle: one-time capability loading, content fetches, listener
//! ownership, teardown and navigation requests.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use leptos::prelude::{GetValue, LocalStorage, StoredValue};
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, EventTarget, Response};

use super::error::{GraphError, Result, describe};
use super::types::ContentIndex;

pub const DEFAULT_INDEX_URL: &str = "/static/content-index.json";

/// Shared one-time async initialization: concurrent callers await the same
/// in-flight future, later callers get the cached output.
pub struct SingleFlight<T: Clone + 'static> {
	slot: RefCell<Option<Shared<LocalBoxFuture<'static, T>>>>,
}

impl<T: Clone + 'static> Default for SingleFlight<T> {
	fn default() -> Self {
		Self {
			slot: RefCell::new(None),
		}
	}
}

impl<T: Clone + 'static> SingleFlight<T> {
	pub fn get_or_init<F, Fut>(&self, init: F) -> Shared<LocalBoxFuture<'static, T>>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = T> + 'static,
	{
		self.slot
			.borrow_mut()
			.get_or_insert_with(|| init().boxed_local().shared())
			.clone()
	}

	#[cfg(test)]
	pub fn is_started(&self) -> bool {
		self.slot.borrow().is_some()
	}
}

/// Browser facilities every widget waits on before its first draw.
#[derive(Clone, Debug, PartialEq)]
pub struct Capabilities {
	pub pixel_ratio: f64,
}

thread_local! {
	static CAPABILITIES: SingleFlight<Result<Capabilities>> = SingleFlight::default();
}

/// Load the capability set once per page; every widget awaits the same load.
pub fn capabilities() -> Shared<LocalBoxFuture<'static, Result<Capabilities>>> {
	CAPABILITIES.with(|flight| flight.get_or_init(load_capabilities))
}

async fn load_capabilities() -> Result<Capabilities> {
	let window = web_sys::window().ok_or(GraphError::MissingElement("window"))?;
	let document = window
		.document()
		.ok_or(GraphError::MissingElement("document"))?;
	// label metrics are only stable once web fonts have loaded
	let ready = document
		.fonts()
		.ready()
		.map_err(|e| GraphError::Capability(describe(&e)))?;
	JsFuture::from(ready)
		.await
		.map_err(|e| GraphError::Capability(describe(&e)))?;
	let caps = Capabilities {
		pixel_ratio: window.device_pixel_ratio().max(1.0),
	};
	debug!("link-graph: capabilities loaded ({:?})", caps);
	Ok(caps)
}

/// Fetch and decode the content index.
pub async fn fetch_content_index(url: &str) -> Result<ContentIndex> {
	let window = web_sys::window().ok_or(GraphError::MissingElement("window"))?;
	let response: Response = JsFuture::from(window.fetch_with_str(url))
		.await
		.map_err(GraphError::fetch)?
		.dyn_into()
		.map_err(GraphError::fetch)?;
	if !response.ok() {
		return Err(GraphError::Fetch(format!(
			"{} returned {}",
			url,
			response.status()
		)));
	}
	let body = JsFuture::from(response.text().map_err(GraphError::fetch)?)
		.await
		.map_err(GraphError::fetch)?;
	let text = body
		.as_string()
		.ok_or_else(|| GraphError::Fetch("response body is not text".into()))?;
	ContentIndex::from_json(&text)
}

/// Cleanup callbacks run in reverse registration order, at most once.
#[derive(Default)]
pub struct Teardown {
	tasks: Vec<Box<dyn FnOnce()>>,
}

impl Teardown {
	pub fn defer(&mut self, task: impl FnOnce() + 'static) {
		self.tasks.push(Box::new(task));
	}

	/// Keep `listener` attached until teardown.
	pub fn own(&mut self, listener: EventListener) {
		self.defer(move || drop(listener));
	}

	pub fn run(&mut self) {
		while let Some(task) = self.tasks.pop() {
			task();
		}
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.tasks.len()
	}

	#[cfg(test)]
	pub fn is_empty(&self) -> bool {
		self.tasks.is_empty()
	}
}

impl Drop for Teardown {
	fn drop(&mut self) {
		self.run();
	}
}

/// Holds the single live widget of one container.
///
/// Every build takes a ticket from [`WidgetSlot::begin`], which synchronously
/// tears down the live instance. A build that finishes after a newer one began
/// is torn down instead of mounted.
#[derive(Default)]
pub struct WidgetSlot {
	generation: Cell<u64>,
	live: RefCell<Option<Teardown>>,
}

impl WidgetSlot {
	pub fn begin(&self) -> u64 {
		self.clear();
		self.generation.set(self.generation.get() + 1);
		self.generation.get()
	}

	pub fn is_current(&self, ticket: u64) -> bool {
		self.generation.get() == ticket
	}

	/// Fails once a newer build has begun; builds call this after every await.
	pub fn ensure_current(&self, ticket: u64) -> Result<()> {
		if self.is_current(ticket) {
			Ok(())
		} else {
			Err(GraphError::Superseded(ticket))
		}
	}

	/// Mount a finished build; returns false if it was stale and got torn down.
	pub fn install(&self, ticket: u64, mut teardown: Teardown) -> bool {
		if !self.is_current(ticket) {
			teardown.run();
			return false;
		}
		self.clear();
		*self.live.borrow_mut() = Some(teardown);
		true
	}

	/// Tear down the live instance and invalidate in-flight builds.
	pub fn cancel(&self) {
		self.generation.set(self.generation.get() + 1);
		self.clear();
	}

	#[cfg(test)]
	pub fn is_live(&self) -> bool {
		self.live.borrow().is_some()
	}

	fn clear(&self) {
		let prior = self.live.borrow_mut().take();
		if let Some(mut teardown) = prior {
			teardown.run();
		}
	}
}

/// A DOM event listener that is removed when dropped.
pub struct EventListener {
	target: EventTarget,
	event: &'static str,
	callback: Closure<dyn FnMut(Event)>,
}

impl EventListener {
	pub fn new(
		target: &EventTarget,
		event: &'static str,
		handler: impl FnMut(Event) + 'static,
	) -> Result<Self> {
		let callback = Closure::<dyn FnMut(Event)>::new(handler);
		target
			.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
			.map_err(|e| GraphError::Capability(describe(&e)))?;
		Ok(Self {
			target: target.clone(),
			event,
			callback,
		})
	}
}

impl Drop for EventListener {
	fn drop(&mut self) {
		let _ = self
			.target
			.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
	}
}

/// The host's registered navigation function.
#[derive(Clone, Copy)]
pub struct Navigator(StoredValue<Rc<dyn Fn(&str)>, LocalStorage>);

impl Navigator {
	pub fn new(navigate: impl Fn(&str) + 'static) -> Self {
		let navigate: Rc<dyn Fn(&str)> = Rc::new(navigate);
		Self(StoredValue::new_local(navigate))
	}
}

/// Navigate via the registered [`Navigator`], or fall back to a full page load.
pub fn request_navigation(navigator: Option<Navigator>, url: &str) {
	debug!("link-graph: navigating to {}", url);
	if let Some(navigate) = navigator.and_then(|n| n.0.try_get_value()) {
		navigate(url);
		return;
	}
	let Some(window) = web_sys::window() else {
		return;
	};
	if let Err(e) = window.location().set_href(url) {
		warn!("link-graph: navigation to {} failed: {}", url, describe(&e));
	}
}
