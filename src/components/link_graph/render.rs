use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::error::{GraphError, Result};
use super::graph::LinkGraph;
use super::interaction::label_zoom_opacity;
use super::state::GraphState;
use super::theme::Palette;
use super::tween::Tween;
use super::visited::VisitedSet;

pub const LINK_FADE_MS: f64 = 200.0;
pub const NODE_FADE_MS: f64 = 200.0;
pub const LABEL_FADE_MS: f64 = 100.0;
pub const DIMMED_ALPHA: f64 = 0.2;
pub const HOVER_LABEL_SCALE: f64 = 1.1;

#[derive(Clone, Debug)]
pub struct NodeVisual {
	pub color: String,
	pub is_tag: bool,
	pub radius: f64,
	pub alpha: Tween,
	pub label_alpha: Tween,
	pub label_scale: Tween,
	pub active: bool,
}

#[derive(Clone, Debug)]
pub struct EdgeVisual {
	pub color: String,
	pub alpha: Tween,
	pub active: bool,
}

/// Per-instance draw state; positions come from the layout each frame.
#[derive(Clone, Debug)]
pub struct RenderState {
	pub nodes: Vec<NodeVisual>,
	pub edges: Vec<EdgeVisual>,
	hovered: Option<usize>,
	/// Opacity of labels that are not hovered.
	label_base: f64,
}

impl RenderState {
	pub fn new(
		graph: &LinkGraph,
		radii: impl Fn(usize) -> f64,
		palette: &Palette,
		focal: &str,
		visited: &VisitedSet,
	) -> Self {
		let nodes = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, node)| NodeVisual {
				color: palette.node_color(node, focal, visited).to_string(),
				is_tag: node.is_tag(),
				radius: radii(i),
				alpha: Tween::fixed(1.0),
				label_alpha: Tween::fixed(0.0),
				label_scale: Tween::fixed(1.0),
				active: false,
			})
			.collect();
		let edges = graph
			.edges
			.iter()
			.map(|_| EdgeVisual {
				color: palette.light_gray.clone(),
				alpha: Tween::fixed(1.0),
				active: false,
			})
			.collect();
		Self {
			nodes,
			edges,
			hovered: None,
			label_base: 0.0,
		}
	}

	pub fn hovered(&self) -> Option<usize> {
		self.hovered
	}

	/// Highlight `hovered` and its neighbors, or clear the highlight.
	pub fn apply_hover(
		&mut self,
		graph: &LinkGraph,
		hovered: Option<usize>,
		focus_on_hover: bool,
		palette: &Palette,
		now: f64,
	) {
		self.hovered = hovered;
		let neighbors = hovered.map(|h| graph.neighbors(h)).unwrap_or_default();

		for (edge, visual) in graph.edges.iter().zip(self.edges.iter_mut()) {
			visual.active = hovered.is_some_and(|h| graph.touches(edge, h));
			visual.color = if visual.active {
				palette.neutral.clone()
			} else {
				palette.light_gray.clone()
			};
			let alpha = match hovered {
				Some(_) if !visual.active => DIMMED_ALPHA,
				_ => 1.0,
			};
			visual.alpha.retarget(alpha, now, LINK_FADE_MS);
		}

		for (i, visual) in self.nodes.iter_mut().enumerate() {
			visual.active = hovered == Some(i) || neighbors.contains(&i);
			let alpha = if hovered.is_some() && focus_on_hover && !visual.active {
				DIMMED_ALPHA
			} else {
				1.0
			};
			visual.alpha.retarget(alpha, now, NODE_FADE_MS);
		}

		self.refresh_labels(now);
	}

	/// Fade non-hovered labels in or out for zoom level `k`.
	pub fn apply_zoom(&mut self, k: f64, opacity_scale: f64, now: f64) {
		self.label_base = label_zoom_opacity(k, opacity_scale);
		for (i, visual) in self.nodes.iter_mut().enumerate() {
			if self.hovered != Some(i) && !visual.active {
				visual.label_alpha.set(self.label_base);
			}
		}
		self.refresh_labels(now);
	}

	fn refresh_labels(&mut self, now: f64) {
		for (i, visual) in self.nodes.iter_mut().enumerate() {
			let (alpha, scale) = if self.hovered == Some(i) {
				(1.0, HOVER_LABEL_SCALE)
			} else {
				(self.label_base, 1.0)
			};
			visual.label_alpha.retarget(alpha, now, LABEL_FADE_MS);
			visual.label_scale.retarget(scale, now, LABEL_FADE_MS);
		}
	}
}

/// Draws one frame of a widget.
pub trait Painter {
	fn paint(&mut self, state: &GraphState, now: f64) -> Result<()>;
}

pub struct CanvasPainter {
	ctx: CanvasRenderingContext2d,
	pixel_ratio: f64,
}

impl CanvasPainter {
	pub fn new(ctx: CanvasRenderingContext2d, pixel_ratio: f64) -> Self {
		Self { ctx, pixel_ratio }
	}
}

impl Painter for CanvasPainter {
	fn paint(&mut self, state: &GraphState, now: f64) -> Result<()> {
		let ctx = &self.ctx;
		let t = state.interaction.transform;
		let (cx, cy) = state.center();

		ctx.set_transform(self.pixel_ratio, 0.0, 0.0, self.pixel_ratio, 0.0, 0.0)
			.map_err(GraphError::draw)?;
		ctx.clear_rect(0.0, 0.0, state.width, state.height);
		ctx.save();
		ctx.translate(t.x, t.y).map_err(GraphError::draw)?;
		ctx.scale(t.k, t.k).map_err(GraphError::draw)?;

		let positions: Vec<(f64, f64)> = state
			.layout
			.positions()
			.into_iter()
			.map(|(x, y)| (x + cx, y + cy))
			.collect();

		let drawn = draw_links(ctx, state, &positions, now)
			.and_then(|_| draw_nodes(ctx, state, &positions, now))
			.and_then(|_| draw_labels(ctx, state, &positions, now));
		ctx.set_global_alpha(1.0);
		ctx.restore();
		drawn
	}
}

fn draw_links(
	ctx: &CanvasRenderingContext2d,
	state: &GraphState,
	positions: &[(f64, f64)],
	now: f64,
) -> Result<()> {
	ctx.set_line_width(1.0);
	for (edge, visual) in state.graph.edges.iter().zip(&state.scene.edges) {
		let ((x1, y1), (x2, y2)) = (positions[edge.source], positions[edge.target]);
		ctx.set_global_alpha(visual.alpha.value_at(now));
		ctx.set_stroke_style_str(&visual.color);
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2, y2);
		ctx.stroke();
	}
	Ok(())
}

fn draw_nodes(
	ctx: &CanvasRenderingContext2d,
	state: &GraphState,
	positions: &[(f64, f64)],
	now: f64,
) -> Result<()> {
	for (&(x, y), visual) in positions.iter().zip(&state.scene.nodes) {
		ctx.set_global_alpha(visual.alpha.value_at(now));
		ctx.begin_path();
		ctx.arc(x, y, visual.radius, 0.0, 2.0 * PI)
			.map_err(GraphError::draw)?;
		if visual.is_tag {
			ctx.set_fill_style_str(&state.palette.light);
			ctx.fill();
			ctx.set_stroke_style_str(&visual.color);
			ctx.set_line_width(2.0);
			ctx.stroke();
		} else {
			ctx.set_fill_style_str(&visual.color);
			ctx.fill();
		}
	}
	Ok(())
}

fn draw_labels(
	ctx: &CanvasRenderingContext2d,
	state: &GraphState,
	positions: &[(f64, f64)],
	now: f64,
) -> Result<()> {
	let base_px = state.config.font_size * 15.0 / state.config.scale.max(0.01);
	ctx.set_text_align("center");
	ctx.set_text_baseline("top");
	ctx.set_fill_style_str(&state.palette.dark);
	for ((&(x, y), visual), node) in positions
		.iter()
		.zip(&state.scene.nodes)
		.zip(&state.graph.nodes)
	{
		let alpha = visual.label_alpha.value_at(now);
		if alpha < 0.01 {
			continue;
		}
		ctx.set_global_alpha(alpha);
		ctx.set_font(&format!(
			"{}px sans-serif",
			base_px * visual.label_scale.value_at(now)
		));
		ctx.fill_text(&node.text, x, y + visual.radius + 2.0)
			.map_err(GraphError::draw)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::link_graph::theme::Theme;
	use crate::components::link_graph::types::{ContentIndex, ContentRecord, GraphConfig};

	fn graph() -> LinkGraph {
		let rec = |slug: &str, links: &[&str]| ContentRecord {
			slug: slug.into(),
			links: links.iter().map(|s| s.to_string()).collect(),
			..Default::default()
		};
		let index = ContentIndex::from_records([
			rec("a", &["b"]),
			rec("b", &["c"]),
			rec("c", &[]),
			rec("d", &[]),
		]);
		LinkGraph::build(&index, "a", &GraphConfig::global())
	}

	fn scene(g: &LinkGraph) -> RenderState {
		RenderState::new(
			g,
			|_| 2.0,
			&Palette::fallback(Theme::Light),
			"a",
			&VisitedSet::from_iter(["c".to_string()]),
		)
	}

	#[test]
	fn base_colors_follow_focal_and_visited() {
		let g = graph();
		let s = scene(&g);
		let p = Palette::fallback(Theme::Light);
		let color = |id: &str| s.nodes[g.index_of(id).unwrap()].color.clone();
		assert_eq!(color("a"), p.accent_a);
		assert_eq!(color("c"), p.accent_b);
		assert_eq!(color("d"), p.neutral);
	}

	#[test]
	fn labels_start_hidden() {
		let g = graph();
		let s = scene(&g);
		assert!(s.nodes.iter().all(|n| n.label_alpha.value_at(0.0) == 0.0));
	}

	#[test]
	fn hover_highlights_neighbors_and_dims_links() {
		let g = graph();
		let mut s = scene(&g);
		let p = Palette::fallback(Theme::Light);
		let b = g.index_of("b").unwrap();
		let d = g.index_of("d").unwrap();
		s.apply_hover(&g, Some(b), true, &p, 0.0);

		assert!(s.edges.iter().all(|e| e.active));
		assert!(s.nodes[b].active && !s.nodes[d].active);
		assert_eq!(s.nodes[d].alpha.value_at(NODE_FADE_MS), DIMMED_ALPHA);
		assert_eq!(s.nodes[b].label_alpha.value_at(LABEL_FADE_MS), 1.0);
		assert_eq!(s.nodes[b].label_scale.value_at(LABEL_FADE_MS), HOVER_LABEL_SCALE);

		let c = g.index_of("c").unwrap();
		s.apply_hover(&g, Some(c), true, &p, 1000.0);
		let ab = g
			.edges
			.iter()
			.position(|e| e.source == g.index_of("a").unwrap())
			.unwrap();
		assert!(!s.edges[ab].active);
		assert_eq!(s.edges[ab].color, p.light_gray);
		assert_eq!(s.edges[ab].alpha.value_at(1000.0 + LINK_FADE_MS), DIMMED_ALPHA);
		assert_eq!(s.nodes[b].label_alpha.value_at(1000.0 + LABEL_FADE_MS), 0.0);
	}

	#[test]
	fn nodes_stay_opaque_without_focus_on_hover() {
		let g = graph();
		let mut s = scene(&g);
		let d = g.index_of("d").unwrap();
		s.apply_hover(&g, Some(0), false, &Palette::fallback(Theme::Light), 0.0);
		assert_eq!(s.nodes[d].alpha.value_at(NODE_FADE_MS), 1.0);
	}

	#[test]
	fn leaving_restores_everything() {
		let g = graph();
		let mut s = scene(&g);
		let p = Palette::fallback(Theme::Light);
		s.apply_hover(&g, Some(0), true, &p, 0.0);
		s.apply_hover(&g, None, true, &p, 500.0);
		let settled = 500.0 + LINK_FADE_MS;
		assert!(s.edges.iter().all(|e| !e.active && e.alpha.value_at(settled) == 1.0));
		assert!(s.nodes.iter().all(|n| n.alpha.value_at(settled) == 1.0));
		assert!(s.nodes.iter().all(|n| n.label_alpha.value_at(settled) == 0.0));
	}

	#[test]
	fn zoom_reveals_unhovered_labels() {
		let g = graph();
		let mut s = scene(&g);
		s.apply_hover(&g, Some(0), false, &Palette::fallback(Theme::Light), 0.0);
		s.apply_zoom(4.0, 1.0, 0.0);
		let d = g.index_of("d").unwrap();
		assert!((s.nodes[d].label_alpha.value_at(1000.0) - 0.8).abs() < 1e-12);
		assert_eq!(s.nodes[0].label_alpha.value_at(1000.0), 1.0);
	}
}
