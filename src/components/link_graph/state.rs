use super::graph::LinkGraph;
use super::interaction::{Interaction, Release, relative_url};
use super::layout::LayoutEngine;
use super::render::RenderState;
use super::theme::Palette;
use super::types::GraphConfig;
use super::visited::VisitedSet;

/// Extra world-space slack around a node's radius for pointer hits.
pub const HIT_SLOP: f64 = 3.0;

/// Everything one mounted widget mutates between frames.
pub struct GraphState {
	pub graph: LinkGraph,
	pub layout: LayoutEngine,
	pub scene: RenderState,
	pub interaction: Interaction,
	pub config: GraphConfig,
	pub palette: Palette,
	pub focal: String,
	pub width: f64,
	pub height: f64,
}

impl GraphState {
	pub fn new(
		graph: LinkGraph,
		config: GraphConfig,
		palette: Palette,
		focal: String,
		visited: &VisitedSet,
		width: f64,
		height: f64,
	) -> Self {
		let layout = LayoutEngine::new(&graph, &config, width, height);
		let scene = RenderState::new(&graph, |i| layout.radius(i), &palette, &focal, visited);
		let interaction = Interaction::new(config.drag, config.zoom);
		Self {
			graph,
			layout,
			scene,
			interaction,
			config,
			palette,
			focal,
			width,
			height,
		}
	}

	pub fn center(&self) -> (f64, f64) {
		(self.width / 2.0, self.height / 2.0)
	}

	/// Canvas pixel to layout space (origin at the container center).
	pub fn screen_to_layout(&self, p: (f64, f64)) -> (f64, f64) {
		let (wx, wy) = self.interaction.transform.invert(p);
		let (cx, cy) = self.center();
		(wx - cx, wy - cy)
	}

	/// Topmost node under the canvas pixel `p`.
	pub fn node_at_position(&self, p: (f64, f64)) -> Option<usize> {
		let (gx, gy) = self.screen_to_layout(p);
		self.layout
			.positions()
			.iter()
			.enumerate()
			.rev()
			.find(|(i, (x, y))| {
				let (dx, dy) = (x - gx, y - gy);
				(dx * dx + dy * dy).sqrt() <= self.layout.radius(*i) + HIT_SLOP
			})
			.map(|(i, _)| i)
	}

	/// Advance the simulation one frame.
	pub fn step(&mut self, dt: f32) {
		self.layout.tick(dt);
	}

	pub fn pointer_move(&mut self, p: (f64, f64), now: f64) {
		if self.interaction.is_pressed() {
			if let Some((i, (x, y))) = self.interaction.drag_to(p) {
				self.layout.pin(i, x, y);
			}
			return;
		}
		let hit = self.node_at_position(p);
		if self.interaction.hover(hit) {
			self.refresh_hover(now);
		}
	}

	pub fn pointer_down(&mut self, p: (f64, f64), now: f64) {
		let hit = self
			.node_at_position(p)
			.map(|i| (i, self.layout.position(i)));
		if let Some(i) = self.interaction.press(hit, p, now) {
			let (x, y) = self.layout.position(i);
			self.layout.begin_drag(i);
			self.layout.pin(i, x, y);
			self.refresh_hover(now);
		}
	}

	/// Returns the URL to navigate to when the press was a click on a node.
	pub fn pointer_up(&mut self, now: f64) -> Option<String> {
		match self.interaction.release(now) {
			Release::Navigate(i) => {
				self.layout.release(i);
				Some(self.url_for(i))
			}
			Release::Dropped(i) => {
				self.layout.release(i);
				None
			}
			Release::Panned | Release::Nothing => None,
		}
	}

	/// Plain click; navigates only when dragging is disabled.
	pub fn click(&self, p: (f64, f64)) -> Option<String> {
		self.interaction
			.click(self.node_at_position(p))
			.map(|i| self.url_for(i))
	}

	pub fn pointer_leave(&mut self, now: f64) {
		if let Some(i) = self.interaction.leave() {
			self.layout.release(i);
		}
		self.refresh_hover(now);
	}

	pub fn wheel(&mut self, delta_y: f64, p: (f64, f64), now: f64) {
		if self.interaction.wheel(delta_y, p) {
			self.refresh_zoom(now);
		}
	}

	pub fn pinch(&mut self, distance: f64, anchor: (f64, f64), now: f64) {
		if self.interaction.pinch(distance, anchor) {
			self.refresh_zoom(now);
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.layout.resize(width, height);
	}

	fn url_for(&self, i: usize) -> String {
		relative_url(&self.focal, &self.graph.nodes[i].id)
	}

	fn refresh_hover(&mut self, now: f64) {
		let hovered = self.interaction.hovered();
		if hovered == self.scene.hovered() && hovered.is_some() {
			return;
		}
		self.scene.apply_hover(
			&self.graph,
			hovered,
			self.config.focus_on_hover,
			&self.palette,
			now,
		);
	}

	fn refresh_zoom(&mut self, now: f64) {
		self.scene
			.apply_zoom(self.interaction.transform.k, self.config.opacity_scale, now);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::link_graph::interaction::MAX_SCALE;
	use crate::components::link_graph::theme::Theme;
	use crate::components::link_graph::types::{ContentIndex, ContentRecord};

	const W: f64 = 400.0;
	const H: f64 = 300.0;

	fn state(cfg: GraphConfig) -> GraphState {
		let rec = |slug: &str, links: &[&str]| ContentRecord {
			slug: slug.into(),
			links: links.iter().map(|s| s.to_string()).collect(),
			..Default::default()
		};
		let index = ContentIndex::from_records([
			rec("notes/a", &["notes/b"]),
			rec("notes/b", &["notes/a", "c"]),
			rec("c", &[]),
		]);
		let graph = LinkGraph::build(&index, "notes/a", &cfg);
		GraphState::new(
			graph,
			cfg,
			Palette::fallback(Theme::Light),
			"notes/a".into(),
			&VisitedSet::default(),
			W,
			H,
		)
	}

	/// Canvas pixel of node `i` under the current transform.
	fn screen_of(s: &GraphState, i: usize) -> (f64, f64) {
		let (x, y) = s.layout.position(i);
		let (cx, cy) = s.center();
		let t = s.interaction.transform;
		((x + cx) * t.k + t.x, (y + cy) * t.k + t.y)
	}

	#[test]
	fn hit_testing_finds_nodes() {
		let s = state(GraphConfig::global());
		let b = s.graph.index_of("notes/b").unwrap();
		assert_eq!(s.node_at_position(screen_of(&s, b)), Some(b));
		assert_eq!(s.node_at_position((-1000.0, -1000.0)), None);
	}

	#[test]
	fn quick_drag_navigates_relative_to_focal() {
		let mut s = state(GraphConfig::global());
		let c = s.graph.index_of("c").unwrap();
		let p = screen_of(&s, c);
		s.pointer_down(p, 0.0);
		assert!(s.layout.is_pinned(c));
		s.pointer_move((p.0 + 5.0, p.1), 100.0);
		assert_eq!(s.pointer_up(200.0), Some("../c".to_string()));
		assert!(!s.layout.is_pinned(c));
	}

	#[test]
	fn slow_drag_leaves_node_where_dropped() {
		let mut s = state(GraphConfig::global());
		let c = s.graph.index_of("c").unwrap();
		let p = screen_of(&s, c);
		let start = s.layout.position(c);
		s.pointer_down(p, 0.0);
		s.pointer_move((p.0 + 40.0, p.1 - 10.0), 300.0);
		assert_eq!(s.pointer_up(900.0), None);
		let end = s.layout.position(c);
		assert!((end.0 - (start.0 + 40.0)).abs() < 1e-3);
		assert!((end.1 - (start.1 - 10.0)).abs() < 1e-3);
	}

	#[test]
	fn click_navigates_when_drag_disabled() {
		let mut s = state(GraphConfig {
			drag: false,
			..GraphConfig::global()
		});
		let b = s.graph.index_of("notes/b").unwrap();
		let p = screen_of(&s, b);
		s.pointer_down(p, 0.0);
		assert!(!s.layout.is_pinned(b));
		assert_eq!(s.pointer_up(10.0), None);
		assert_eq!(s.click(p), Some("../notes/b".to_string()));
	}

	#[test]
	fn hover_updates_scene() {
		let mut s = state(GraphConfig::global());
		let b = s.graph.index_of("notes/b").unwrap();
		s.pointer_move(screen_of(&s, b), 0.0);
		assert_eq!(s.scene.hovered(), Some(b));
		s.pointer_leave(10.0);
		assert_eq!(s.scene.hovered(), None);
	}

	#[test]
	fn wheel_zoom_stays_clamped() {
		let mut s = state(GraphConfig::local());
		for _ in 0..200 {
			s.wheel(-100.0, (10.0, 10.0), 0.0);
		}
		assert_eq!(s.interaction.transform.k, MAX_SCALE);
		let b = s.graph.index_of("notes/b").unwrap();
		assert!((s.scene.nodes[b].label_alpha.value_at(1e6) - 0.8).abs() < 1e-12);
	}
}
