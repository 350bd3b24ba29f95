//! Pointer interpretation: hover, drag-to-pin, click-to-navigate, pan and zoom.
//!
//! Everything here is pure; timestamps come in as milliseconds.

use super::types::simplify_slug;

pub const MIN_SCALE: f64 = 0.25;
pub const MAX_SCALE: f64 = 4.0;
/// A press shorter than this is a click, however far the pointer moved.
pub const CLICK_THRESHOLD_MS: f64 = 500.0;
pub const WHEEL_ZOOM_OUT: f64 = 0.9;
pub const WHEEL_ZOOM_IN: f64 = 1.1;

/// Screen = world × k + (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomTransform {
	pub k: f64,
	pub x: f64,
	pub y: f64,
}

impl Default for ZoomTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ZoomTransform {
	pub const IDENTITY: Self = Self {
		k: 1.0,
		x: 0.0,
		y: 0.0,
	};

	/// Scale by `factor` keeping `anchor` (screen space) fixed.
	pub fn zoomed_at(self, factor: f64, anchor: (f64, f64)) -> Self {
		let k = clamp_scale(self.k * factor);
		let ratio = k / self.k;
		Self {
			k,
			x: anchor.0 - (anchor.0 - self.x) * ratio,
			y: anchor.1 - (anchor.1 - self.y) * ratio,
		}
	}

	pub fn panned(self, dx: f64, dy: f64) -> Self {
		Self {
			x: self.x + dx,
			y: self.y + dy,
			..self
		}
	}

	/// Screen point to world point.
	pub fn invert(self, p: (f64, f64)) -> (f64, f64) {
		((p.0 - self.x) / self.k, (p.1 - self.y) / self.k)
	}
}

pub fn clamp_scale(k: f64) -> f64 {
	if k.is_nan() {
		return 1.0;
	}
	k.clamp(MIN_SCALE, MAX_SCALE)
}

/// Opacity of labels that are not hovered, fading in as the view zooms in.
pub fn label_zoom_opacity(k: f64, opacity_scale: f64) -> f64 {
	((k * opacity_scale - 1.0) / 3.75).max(0.0)
}

/// Link to `target` relative to the page at `current`.
pub fn relative_url(current: &str, target: &str) -> String {
	let depth = simplify_slug(current).matches('/').count();
	let prefix = if depth == 0 {
		".".to_string()
	} else {
		vec![".."; depth].join("/")
	};
	let target = simplify_slug(target);
	if target.is_empty() {
		format!("{}/", prefix)
	} else {
		format!("{}/{}", prefix, target)
	}
}

/// Resolve a relative link against the absolute path of the current page, as a
/// browser would for an anchor href.
pub fn resolve_relative(base_path: &str, rel: &str) -> String {
	if rel.starts_with('/') {
		return rel.to_string();
	}
	let mut segments: Vec<&str> = base_path.split('/').filter(|s| !s.is_empty()).collect();
	if !base_path.ends_with('/') {
		segments.pop();
	}
	for part in rel.split('/') {
		match part {
			"" | "." => {}
			".." => {
				segments.pop();
			}
			_ => segments.push(part),
		}
	}
	let trailing = rel.ends_with('/') && !segments.is_empty();
	format!("/{}{}", segments.join("/"), if trailing { "/" } else { "" })
}

/// Absolute path of a link produced by [`relative_url`] on the page at `focal`.
pub fn page_path(focal: &str, rel: &str) -> String {
	resolve_relative(&format!("/{}", focal), rel)
}

/// What the fingers currently on the canvas amount to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TouchGesture {
	Press((f64, f64)),
	Pinch { distance: f64, anchor: (f64, f64) },
	Lifted,
}

pub fn touch_gesture(points: &[(f64, f64)]) -> TouchGesture {
	match points {
		[] => TouchGesture::Lifted,
		[p] => TouchGesture::Press(*p),
		[a, b, ..] => TouchGesture::Pinch {
			distance: ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt(),
			anchor: ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0),
		},
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionMode {
	Idle,
	Hovering(usize),
	Dragging {
		node: usize,
		started_at: f64,
		/// Screen position of the press.
		pointer: (f64, f64),
		/// Layout position of the node at the press.
		origin: (f64, f64),
	},
	Panning {
		pointer: (f64, f64),
		start: ZoomTransform,
	},
}

/// What a released press amounts to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Release {
	Navigate(usize),
	Dropped(usize),
	Panned,
	Nothing,
}

#[derive(Clone, Debug)]
pub struct Interaction {
	pub mode: InteractionMode,
	pub transform: ZoomTransform,
	drag_enabled: bool,
	zoom_enabled: bool,
	pinch_distance: Option<f64>,
}

impl Interaction {
	pub fn new(drag_enabled: bool, zoom_enabled: bool) -> Self {
		Self {
			mode: InteractionMode::Idle,
			transform: ZoomTransform::IDENTITY,
			drag_enabled,
			zoom_enabled,
			pinch_distance: None,
		}
	}

	pub fn hovered(&self) -> Option<usize> {
		match self.mode {
			InteractionMode::Hovering(i) => Some(i),
			InteractionMode::Dragging { node, .. } => Some(node),
			_ => None,
		}
	}

	pub fn dragged(&self) -> Option<usize> {
		match self.mode {
			InteractionMode::Dragging { node, .. } => Some(node),
			_ => None,
		}
	}

	pub fn is_pressed(&self) -> bool {
		matches!(
			self.mode,
			InteractionMode::Dragging { .. } | InteractionMode::Panning { .. }
		)
	}

	/// Pointer moved over `node` (or empty space) with no button held.
	/// Returns true when the hovered node changed.
	pub fn hover(&mut self, node: Option<usize>) -> bool {
		if self.is_pressed() {
			return false;
		}
		let next = match node {
			Some(i) => InteractionMode::Hovering(i),
			None => InteractionMode::Idle,
		};
		let changed = next != self.mode;
		self.mode = next;
		changed
	}

	/// Press at `pointer`. `node` is the node under it with its layout position.
	/// Returns the node that became pinned, if any.
	pub fn press(
		&mut self,
		node: Option<(usize, (f64, f64))>,
		pointer: (f64, f64),
		now: f64,
	) -> Option<usize> {
		match node {
			Some((i, origin)) if self.drag_enabled => {
				self.mode = InteractionMode::Dragging {
					node: i,
					started_at: now,
					pointer,
					origin,
				};
				Some(i)
			}
			Some(_) => None,
			None if self.zoom_enabled => {
				self.mode = InteractionMode::Panning {
					pointer,
					start: self.transform,
				};
				None
			}
			None => None,
		}
	}

	/// Pointer moved while pressed. Returns the dragged node and its new layout position.
	pub fn drag_to(&mut self, pointer: (f64, f64)) -> Option<(usize, (f64, f64))> {
		match self.mode {
			InteractionMode::Dragging {
				node,
				pointer: start,
				origin,
				..
			} => {
				let k = self.transform.k;
				Some((
					node,
					(
						origin.0 + (pointer.0 - start.0) / k,
						origin.1 + (pointer.1 - start.1) / k,
					),
				))
			}
			InteractionMode::Panning { pointer: start, start: t } => {
				self.transform = t.panned(pointer.0 - start.0, pointer.1 - start.1);
				None
			}
			_ => None,
		}
	}

	/// Button released; a drag shorter than [`CLICK_THRESHOLD_MS`] is a click.
	pub fn release(&mut self, now: f64) -> Release {
		let outcome = match self.mode {
			InteractionMode::Dragging {
				node, started_at, ..
			} => {
				if now - started_at < CLICK_THRESHOLD_MS {
					Release::Navigate(node)
				} else {
					Release::Dropped(node)
				}
			}
			InteractionMode::Panning { .. } => Release::Panned,
			_ => Release::Nothing,
		};
		self.mode = match outcome {
			Release::Navigate(i) | Release::Dropped(i) => InteractionMode::Hovering(i),
			_ => InteractionMode::Idle,
		};
		outcome
	}

	/// Plain click, only meaningful when dragging is off.
	pub fn click(&self, node: Option<usize>) -> Option<usize> {
		if self.drag_enabled {
			return None;
		}
		node
	}

	/// Pointer left the canvas: drop any gesture.
	pub fn leave(&mut self) -> Option<usize> {
		let dragged = self.dragged();
		self.mode = InteractionMode::Idle;
		self.pinch_distance = None;
		dragged
	}

	/// Wheel step at `anchor`. Returns true when the transform changed.
	pub fn wheel(&mut self, delta_y: f64, anchor: (f64, f64)) -> bool {
		if !self.zoom_enabled {
			return false;
		}
		let factor = if delta_y > 0.0 {
			WHEEL_ZOOM_OUT
		} else {
			WHEEL_ZOOM_IN
		};
		self.apply_zoom(factor, anchor)
	}

	/// Two-finger pinch with the fingers `distance` apart around `anchor`.
	pub fn pinch(&mut self, distance: f64, anchor: (f64, f64)) -> bool {
		if !self.zoom_enabled {
			return false;
		}
		let previous = self.pinch_distance.replace(distance);
		match previous {
			Some(prev) if prev > 0.0 => self.apply_zoom(distance / prev, anchor),
			_ => false,
		}
	}

	pub fn end_pinch(&mut self) {
		self.pinch_distance = None;
	}

	fn apply_zoom(&mut self, factor: f64, anchor: (f64, f64)) -> bool {
		let next = self.transform.zoomed_at(factor, anchor);
		let changed = next != self.transform;
		self.transform = next;
		changed
	}
}
