//! Widget-scoped failures. None of these escape to the host page.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors raised while building or running one graph widget.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GraphError {
	#[error("failed to fetch content index: {0}")]
	Fetch(String),

	#[error("failed to decode {what}: {reason}")]
	Decode { what: &'static str, reason: String },

	#[error("storage unavailable: {0}")]
	Storage(String),

	#[error("draw call failed: {0}")]
	Draw(String),

	#[error("missing element: {0}")]
	MissingElement(&'static str),

	#[error("capability load failed: {0}")]
	Capability(String),

	/// A newer build for the same container started while this one was loading.
	#[error("build {0} was superseded")]
	Superseded(u64),
}

impl GraphError {
	/// Wrap a JS exception raised by a canvas call.
	pub fn draw(err: JsValue) -> Self {
		Self::Draw(describe(&err))
	}

	/// Wrap a JS exception raised by `fetch` or the response body.
	pub fn fetch(err: JsValue) -> Self {
		Self::Fetch(describe(&err))
	}
}

/// Best-effort text for a thrown JS value.
pub fn describe(err: &JsValue) -> String {
	err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

pub type Result<T> = std::result::Result<T, GraphError>;
