//! Turns the flat content index into the node/edge set shown for one focal page.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use super::types::{ContentIndex, GraphConfig, TAG_PREFIX, is_tag_id, tag_id};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
	Page,
	Tag,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Page slug or `tags/<name>`.
	pub id: String,
	pub text: String,
	pub kind: NodeKind,
}

impl GraphNode {
	pub fn is_tag(&self) -> bool {
		self.kind == NodeKind::Tag
	}
}

/// Directed edge; endpoints are indices into [`LinkGraph::nodes`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GraphEdge {
	pub source: usize,
	pub target: usize,
}

/// The neighborhood of one focal page, ready for layout.
#[derive(Clone, Debug, Default)]
pub struct LinkGraph {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
	lookup: HashMap<String, usize>,
}

impl LinkGraph {
	/// Build the graph around `focal` (a normalized slug).
	pub fn build(index: &ContentIndex, focal: &str, cfg: &GraphConfig) -> Self {
		let links = collect_links(index, cfg);
		let neighborhood = neighborhood(index, &links, focal, cfg);

		let nodes: Vec<GraphNode> = neighborhood
			.iter()
			.map(|id| GraphNode {
				id: id.clone(),
				text: display_text(index, id),
				kind: if is_tag_id(id) {
					NodeKind::Tag
				} else {
					NodeKind::Page
				},
			})
			.collect();
		let lookup: HashMap<String, usize> = nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();

		let edges = links
			.iter()
			.filter_map(|(src, tgt)| {
				Some(GraphEdge {
					source: *lookup.get(src)?,
					target: *lookup.get(tgt)?,
				})
			})
			.collect();

		Self {
			nodes,
			edges,
			lookup,
		}
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.lookup.get(id).copied()
	}

	/// Number of edges touching node `i`.
	pub fn degree(&self, i: usize) -> usize {
		self.edges
			.iter()
			.filter(|e| e.source == i || e.target == i)
			.count()
	}

	/// Nodes sharing an edge with `i`, including `i` when it has any edge.
	pub fn neighbors(&self, i: usize) -> HashSet<usize> {
		let mut out = HashSet::new();
		for e in &self.edges {
			if e.source == i || e.target == i {
				out.insert(e.source);
				out.insert(e.target);
			}
		}
		out
	}

	pub fn touches(&self, edge: &GraphEdge, i: usize) -> bool {
		edge.source == i || edge.target == i
	}
}

/// Page links to existing pages, then page → tag edges when tags are shown.
fn collect_links(index: &ContentIndex, cfg: &GraphConfig) -> Vec<(String, String)> {
	let mut links = Vec::new();
	for record in index.records() {
		for target in &record.links {
			if index.contains(target) {
				links.push((record.slug.clone(), target.clone()));
			}
		}
		if cfg.show_tags {
			for tag in visible_tags(&record.tags, cfg) {
				links.push((record.slug.clone(), tag_id(tag)));
			}
		}
	}
	links
}

fn visible_tags<'a>(tags: &'a [String], cfg: &'a GraphConfig) -> impl Iterator<Item = &'a String> {
	tags.iter().filter(|t| !cfg.remove_tags.contains(*t))
}

/// Ids within `cfg.depth` undirected hops of `focal`, in discovery order.
fn neighborhood(
	index: &ContentIndex,
	links: &[(String, String)],
	focal: &str,
	cfg: &GraphConfig,
) -> Vec<String> {
	let mut seen = HashSet::new();
	let mut order = Vec::new();

	if cfg.is_unbounded() {
		for record in index.records() {
			if seen.insert(record.slug.clone()) {
				order.push(record.slug.clone());
			}
		}
		if cfg.show_tags {
			let tags: BTreeSet<&String> = index
				.records()
				.flat_map(|r| visible_tags(&r.tags, cfg))
				.collect();
			order.extend(tags.into_iter().map(|t| tag_id(t)));
		}
		if !order.iter().any(|id| id == focal) {
			order.push(focal.to_string());
		}
		return order;
	}

	// `None` marks the end of one hop level.
	let mut queue: VecDeque<Option<&str>> = VecDeque::from([Some(focal), None]);
	let mut depth = cfg.depth;
	while depth >= 0 {
		let Some(entry) = queue.pop_front() else {
			break;
		};
		let Some(cur) = entry else {
			depth -= 1;
			if queue.is_empty() {
				break;
			}
			queue.push_back(None);
			continue;
		};
		if !seen.insert(cur.to_string()) {
			continue;
		}
		order.push(cur.to_string());
		for (src, tgt) in links {
			if src == cur {
				queue.push_back(Some(tgt.as_str()));
			} else if tgt == cur {
				queue.push_back(Some(src.as_str()));
			}
		}
	}
	order
}

fn display_text(index: &ContentIndex, id: &str) -> String {
	if let Some(tag) = id.strip_prefix(TAG_PREFIX) {
		return format!("#{}", tag);
	}
	index
		.get(id)
		.and_then(|r| r.title.clone())
		.unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::link_graph::types::ContentRecord;

	fn record(slug: &str, links: &[&str], tags: &[&str]) -> ContentRecord {
		ContentRecord {
			slug: slug.into(),
			title: Some(slug.to_uppercase()),
			links: links.iter().map(|s| s.to_string()).collect(),
			tags: tags.iter().map(|s| s.to_string()).collect(),
		}
	}

	fn abc() -> ContentIndex {
		ContentIndex::from_records([
			record("a", &["b"], &[]),
			record("b", &["a", "c"], &[]),
			record("c", &[], &[]),
		])
	}

	fn no_tags(depth: i32) -> GraphConfig {
		GraphConfig {
			depth,
			show_tags: false,
			..GraphConfig::local()
		}
	}

	fn ids(g: &LinkGraph) -> BTreeSet<&str> {
		g.nodes.iter().map(|n| n.id.as_str()).collect()
	}

	fn edge_ids(g: &LinkGraph) -> BTreeSet<(&str, &str)> {
		g.edges
			.iter()
			.map(|e| (g.nodes[e.source].id.as_str(), g.nodes[e.target].id.as_str()))
			.collect()
	}

	/// Undirected BFS distances from `from` over every edge of the full graph.
	fn true_distances(index: &ContentIndex, from: &str) -> HashMap<String, i32> {
		let full = LinkGraph::build(index, from, &no_tags(-1));
		let mut dist = HashMap::from([(from.to_string(), 0)]);
		let mut queue = VecDeque::from([from.to_string()]);
		while let Some(cur) = queue.pop_front() {
			let d = dist[&cur];
			let i = full.index_of(&cur).unwrap();
			for n in full.neighbors(i) {
				let id = full.nodes[n].id.clone();
				if !dist.contains_key(&id) {
					dist.insert(id.clone(), d + 1);
					queue.push_back(id);
				}
			}
		}
		dist
	}

	#[test]
	fn depth_one_scenario() {
		let g = LinkGraph::build(&abc(), "a", &no_tags(1));
		assert_eq!(ids(&g), BTreeSet::from(["a", "b"]));
		assert!(edge_ids(&g).contains(&("a", "b")));
		assert!(edge_ids(&g).iter().all(|(s, t)| *s != "c" && *t != "c"));
	}

	#[test]
	fn unbounded_scenario() {
		let g = LinkGraph::build(&abc(), "a", &no_tags(-1));
		assert_eq!(ids(&g), BTreeSet::from(["a", "b", "c"]));
		assert_eq!(
			edge_ids(&g),
			BTreeSet::from([("a", "b"), ("b", "a"), ("b", "c")])
		);
	}

	#[test]
	fn depth_zero_is_focal_only() {
		let g = LinkGraph::build(&abc(), "b", &no_tags(0));
		assert_eq!(ids(&g), BTreeSet::from(["b"]));
		assert!(g.edges.is_empty());
	}

	#[test]
	fn missing_link_targets_are_dropped() {
		let index = ContentIndex::from_records([record("a", &["ghost", "b"], &[]), record("b", &[], &[])]);
		let g = LinkGraph::build(&index, "a", &no_tags(-1));
		assert_eq!(edge_ids(&g), BTreeSet::from([("a", "b")]));
	}

	#[test]
	fn traversal_is_undirected() {
		// c only has an incoming link from b
		let g = LinkGraph::build(&abc(), "c", &no_tags(1));
		assert_eq!(ids(&g), BTreeSet::from(["b", "c"]));
	}

	#[test]
	fn neighborhood_respects_true_distance() {
		let index = ContentIndex::from_records([
			record("a", &["b", "e"], &[]),
			record("b", &["c"], &[]),
			record("c", &["d"], &[]),
			record("d", &[], &[]),
			record("e", &["d"], &[]),
			record("f", &[], &[]),
		]);
		let dist = true_distances(&index, "a");
		for depth in 0..5 {
			let g = LinkGraph::build(&index, "a", &no_tags(depth));
			for id in g.nodes.iter().map(|n| n.id.as_str()) {
				assert!(dist[id] <= depth, "{} at distance {} > {}", id, dist[id], depth);
			}
			for (id, d) in &dist {
				if *d <= depth {
					assert!(g.index_of(id).is_some(), "{} missing at depth {}", id, depth);
				}
			}
			assert!(g.index_of("f").is_none());
		}
	}

	#[test]
	fn tags_become_nodes_and_are_traversed() {
		let index = ContentIndex::from_records([
			record("a", &[], &["rust", "draft"]),
			record("b", &[], &["rust"]),
		]);
		let cfg = GraphConfig {
			depth: 2,
			remove_tags: vec!["draft".into()],
			..GraphConfig::local()
		};
		let g = LinkGraph::build(&index, "a", &cfg);
		assert_eq!(ids(&g), BTreeSet::from(["a", "b", "tags/rust"]));
		let tag = g.index_of("tags/rust").unwrap();
		assert!(g.nodes[tag].is_tag());
		assert_eq!(g.nodes[tag].text, "#rust");
		assert_eq!(g.degree(tag), 2);
	}

	#[test]
	fn unbounded_includes_all_tags() {
		let index = ContentIndex::from_records([
			record("a", &[], &["x"]),
			record("b", &[], &["y"]),
		]);
		let g = LinkGraph::build(&index, "a", &GraphConfig::global());
		assert_eq!(ids(&g), BTreeSet::from(["a", "b", "tags/x", "tags/y"]));
		assert_eq!(g.edges.len(), 2);
	}

	#[test]
	fn unknown_focal_still_renders() {
		let g = LinkGraph::build(&abc(), "nowhere", &no_tags(2));
		assert_eq!(ids(&g), BTreeSet::from(["nowhere"]));
		assert_eq!(g.nodes[0].text, "nowhere");
	}

	#[test]
	fn unknown_focal_joins_unbounded_neighborhood() {
		let g = LinkGraph::build(&abc(), "nowhere", &no_tags(-1));
		assert_eq!(ids(&g), BTreeSet::from(["a", "b", "c", "nowhere"]));
		let focal = g.index_of("nowhere").unwrap();
		assert_eq!(g.degree(focal), 0);

		let known = LinkGraph::build(&abc(), "b", &no_tags(-1));
		assert_eq!(known.nodes.len(), 3);
	}

	#[test]
	fn degree_and_neighbors() {
		let g = LinkGraph::build(&abc(), "a", &no_tags(-1));
		let b = g.index_of("b").unwrap();
		let c = g.index_of("c").unwrap();
		assert_eq!(g.degree(b), 3);
		assert_eq!(g.degree(c), 1);
		let n = g.neighbors(c);
		assert!(n.contains(&b) && n.contains(&c));
		assert_eq!(n.len(), 2);
	}
}
