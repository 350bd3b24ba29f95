//! Force-directed layout around the container center.
//!
//! Repulsion and edge attraction come from `force_graph`; every tick then
//! applies link springs, centering, collision and the optional radial ring
//! directly to positions, scaled by the simulation heat.

use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::graph::LinkGraph;
use super::types::GraphConfig;

const BASE_CHARGE: f32 = 300.0;
const INITIAL_RING: f64 = 100.0;
const RADIAL_STRENGTH: f64 = 0.2;
const ALPHA_DECAY: f64 = 0.0228;
/// Heat never drops below this; the layout keeps running for the widget's lifetime.
pub const ALPHA_FLOOR: f64 = 0.1;

/// Collision radius of a node with `degree` incident edges.
pub fn node_radius(degree: usize) -> f64 {
	2.0 + (degree as f64).sqrt()
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutParams {
	pub center_force: f64,
	pub link_distance: f64,
	pub enable_radial: bool,
}

impl From<&GraphConfig> for LayoutParams {
	fn from(cfg: &GraphConfig) -> Self {
		Self {
			center_force: cfg.center_force,
			link_distance: cfg.link_distance,
			enable_radial: cfg.enable_radial,
		}
	}
}

pub struct LayoutEngine {
	graph: ForceGraph<usize, ()>,
	slots: Vec<DefaultNodeIdx>,
	edges: Vec<(usize, usize)>,
	degrees: Vec<usize>,
	radii: Vec<f64>,
	pinned: Vec<bool>,
	params: LayoutParams,
	ring_radius: f64,
	alpha: f64,
	alpha_target: f64,
}

impl LayoutEngine {
	pub fn new(link_graph: &LinkGraph, cfg: &GraphConfig, width: f64, height: f64) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: BASE_CHARGE * cfg.repel_force as f32,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});

		let n = link_graph.nodes.len();
		let slots: Vec<DefaultNodeIdx> = (0..n)
			.map(|i| {
				let angle = (i as f64) * 2.0 * PI / n as f64;
				graph.add_node(NodeData {
					x: (INITIAL_RING * angle.cos()) as f32,
					y: (INITIAL_RING * angle.sin()) as f32,
					mass: 10.0,
					is_anchor: false,
					user_data: i,
				})
			})
			.collect();

		let edges: Vec<(usize, usize)> = link_graph
			.edges
			.iter()
			.map(|e| (e.source, e.target))
			.collect();
		for &(s, t) in &edges {
			if s != t {
				graph.add_edge(slots[s], slots[t], EdgeData::default());
			}
		}

		let degrees: Vec<usize> = (0..n).map(|i| link_graph.degree(i)).collect();
		let radii = degrees.iter().map(|&d| node_radius(d)).collect();

		Self {
			graph,
			slots,
			edges,
			degrees,
			radii,
			pinned: vec![false; n],
			params: LayoutParams::from(cfg),
			ring_radius: ring_radius(width, height),
			alpha: 1.0,
			alpha_target: 0.0,
		}
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.slots.len()
	}

	#[cfg(test)]
	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	pub fn radius(&self, i: usize) -> f64 {
		self.radii[i]
	}

	#[cfg(test)]
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn is_pinned(&self, i: usize) -> bool {
		self.pinned[i]
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.ring_radius = ring_radius(width, height);
	}

	/// Positions relative to the container center, indexed like the graph's nodes.
	pub fn positions(&self) -> Vec<(f64, f64)> {
		let mut out = vec![(0.0, 0.0); self.slots.len()];
		self.graph.visit_nodes(|node| {
			out[node.data.user_data] = (node.x() as f64, node.y() as f64);
		});
		out
	}

	pub fn position(&self, i: usize) -> (f64, f64) {
		let mut found = (0.0, 0.0);
		self.graph.visit_nodes(|node| {
			if node.data.user_data == i {
				found = (node.x() as f64, node.y() as f64);
			}
		});
		found
	}

	/// Advance the simulation by `dt` seconds.
	pub fn tick(&mut self, dt: f32) {
		if self.slots.is_empty() {
			return;
		}
		self.graph.update(dt);
		self.alpha += (self.alpha_target - self.alpha) * ALPHA_DECAY;
		self.alpha = self.alpha.max(ALPHA_FLOOR);

		let mut pos = self.positions();
		apply_link_springs(
			&mut pos,
			&self.edges,
			&self.degrees,
			&self.pinned,
			self.params.link_distance,
			self.alpha,
		);
		apply_centering(&mut pos, &self.pinned, self.params.center_force);
		if self.params.enable_radial {
			apply_radial(&mut pos, &self.pinned, self.ring_radius, RADIAL_STRENGTH * self.alpha);
		}
		resolve_collisions(&mut pos, &self.radii, &self.pinned);

		self.graph.visit_nodes_mut(|node| {
			if node.data.is_anchor {
				return;
			}
			let (x, y) = pos[node.data.user_data];
			node.data.x = x as f32;
			node.data.y = y as f32;
		});
	}

	/// Suspend forces on `i` and heat the simulation while it is held.
	pub fn begin_drag(&mut self, i: usize) {
		self.alpha_target = 1.0;
		self.set_anchor(i, true);
	}

	/// Hold `i` at `(x, y)` in layout space.
	pub fn pin(&mut self, i: usize, x: f64, y: f64) {
		self.pinned[i] = true;
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data == i {
				node.data.x = x as f32;
				node.data.y = y as f32;
				node.data.is_anchor = true;
			}
		});
	}

	/// Return `i` to the simulation and let its neighbors resettle.
	pub fn release(&mut self, i: usize) {
		self.set_anchor(i, false);
		self.alpha_target = 0.0;
		self.alpha = self.alpha.max(0.3);
	}

	fn set_anchor(&mut self, i: usize, anchor: bool) {
		self.pinned[i] = anchor;
		let slot = self.slots[i];
		self.graph.visit_nodes_mut(|node| {
			if node.index() == slot {
				node.data.is_anchor = anchor;
			}
		});
	}
}

fn ring_radius(width: f64, height: f64) -> f64 {
	0.8 * width.min(height) / 2.0
}

/// Pull linked nodes toward `distance`, biased so low-degree ends move more.
pub fn apply_link_springs(
	pos: &mut [(f64, f64)],
	edges: &[(usize, usize)],
	degrees: &[usize],
	pinned: &[bool],
	distance: f64,
	alpha: f64,
) {
	for &(s, t) in edges {
		if s == t {
			continue;
		}
		let (dx, dy) = (pos[t].0 - pos[s].0, pos[t].1 - pos[s].1);
		let len = (dx * dx + dy * dy).sqrt();
		if len < 1e-6 {
			continue;
		}
		let (ds, dt) = (degrees[s].max(1) as f64, degrees[t].max(1) as f64);
		let strength = 1.0 / ds.min(dt);
		let k = (len - distance) / len * alpha * strength;
		let (mx, my) = (dx * k, dy * k);
		let bias = match (pinned[s], pinned[t]) {
			(true, true) => continue,
			(true, false) => 1.0,
			(false, true) => 0.0,
			(false, false) => ds / (ds + dt),
		};
		pos[t].0 -= mx * bias;
		pos[t].1 -= my * bias;
		pos[s].0 += mx * (1.0 - bias);
		pos[s].1 += my * (1.0 - bias);
	}
}

/// Shift free nodes so the layout's centroid moves toward the origin.
pub fn apply_centering(pos: &mut [(f64, f64)], pinned: &[bool], strength: f64) {
	if pos.is_empty() {
		return;
	}
	let n = pos.len() as f64;
	let (sx, sy) = pos
		.iter()
		.fold((0.0, 0.0), |(ax, ay), &(x, y)| (ax + x, ay + y));
	let (cx, cy) = (sx / n * strength, sy / n * strength);
	for (p, &fixed) in pos.iter_mut().zip(pinned) {
		if !fixed {
			p.0 -= cx;
			p.1 -= cy;
		}
	}
}

/// Nudge free nodes toward the ring of radius `radius` around the origin.
pub fn apply_radial(pos: &mut [(f64, f64)], pinned: &[bool], radius: f64, strength: f64) {
	for (p, &fixed) in pos.iter_mut().zip(pinned) {
		let len = (p.0 * p.0 + p.1 * p.1).sqrt();
		if fixed || len < 1e-6 {
			continue;
		}
		let k = (radius - len) / len * strength;
		p.0 += p.0 * k;
		p.1 += p.1 * k;
	}
}

/// Separate every overlapping pair; a pinned node never moves.
pub fn resolve_collisions(pos: &mut [(f64, f64)], radii: &[f64], pinned: &[bool]) {
	for i in 0..pos.len() {
		for j in (i + 1)..pos.len() {
			let (dx, dy) = (pos[j].0 - pos[i].0, pos[j].1 - pos[i].1);
			let len = (dx * dx + dy * dy).sqrt();
			let min = radii[i] + radii[j];
			if len >= min {
				continue;
			}
			// coincident nodes separate along a fixed axis
			let (ux, uy) = if len < 1e-6 { (1.0, 0.0) } else { (dx / len, dy / len) };
			let overlap = min - len;
			let (wi, wj) = match (pinned[i], pinned[j]) {
				(true, true) => continue,
				(true, false) => (0.0, 1.0),
				(false, true) => (1.0, 0.0),
				(false, false) => (0.5, 0.5),
			};
			pos[i].0 -= ux * overlap * wi;
			pos[i].1 -= uy * overlap * wi;
			pos[j].0 += ux * overlap * wj;
			pos[j].1 += uy * overlap * wj;
		}
	}
}
