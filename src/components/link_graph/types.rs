//! Content index records, slug handling and widget configuration.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use super::error::{GraphError, Result};

/// Prefix of synthetic tag node ids.
pub const TAG_PREFIX: &str = "tags/";

/// Canonicalize a page path or link target into an index key.
///
/// Strips anchors, `.md`/`.html` extensions, surrounding slashes and a
/// trailing `/index`; lowercases and replaces spaces with `-`. The site root
/// (empty, `.` or `index`) becomes `index`.
pub fn normalize_slug(raw: &str) -> String {
	let no_anchor = raw.split('#').next().unwrap_or(raw).trim();
	let mut slug = no_anchor.trim_start_matches("./").trim_matches('/').to_string();

	for ext in [".md", ".html"] {
		if let Some(stripped) = slug.strip_suffix(ext) {
			slug = stripped.to_string();
			break;
		}
	}

	let mut slug = slug.to_lowercase().replace(' ', "-");
	if let Some(stripped) = slug.strip_suffix("/index") {
		slug = stripped.to_string();
	}

	if slug.is_empty() || slug == "." {
		"index".into()
	} else {
		slug
	}
}

/// The slug with a trailing `index` segment removed, as used in URLs.
pub fn simplify_slug(slug: &str) -> &str {
	if slug == "index" {
		return "";
	}
	slug.strip_suffix("/index").unwrap_or(slug)
}

/// Synthetic node id for a tag.
pub fn tag_id(tag: &str) -> String {
	format!("{}{}", TAG_PREFIX, tag)
}

pub fn is_tag_id(id: &str) -> bool {
	id.starts_with(TAG_PREFIX)
}

/// One page of the corpus as seen by the graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentRecord {
	pub slug: String,
	pub title: Option<String>,
	pub links: Vec<String>,
	pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexEntry {
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	links: Option<Vec<String>>,
	#[serde(default)]
	tags: Option<Vec<String>>,
}

/// Read-only content index keyed by normalized slug.
#[derive(Clone, Debug, Default)]
pub struct ContentIndex {
	records: BTreeMap<String, ContentRecord>,
}

impl ContentIndex {
	/// Decode `content-index.json`: an object of slug → `{title?, links?, tags?}`.
	pub fn from_json(json: &str) -> Result<Self> {
		let raw: BTreeMap<String, IndexEntry> =
			serde_json::from_str(json).map_err(|e| GraphError::Decode {
				what: "content index",
				reason: e.to_string(),
			})?;

		Ok(Self::from_records(raw.into_iter().map(|(key, entry)| {
			ContentRecord {
				slug: key,
				title: entry.title,
				links: entry.links.unwrap_or_default(),
				tags: entry.tags.unwrap_or_default(),
			}
		})))
	}

	/// Build an index from records, normalizing slugs and link targets.
	pub fn from_records(records: impl IntoIterator<Item = ContentRecord>) -> Self {
		let records = records
			.into_iter()
			.map(|record| {
				let slug = normalize_slug(&record.slug);
				let mut links: Vec<String> = record.links.iter().map(|l| normalize_slug(l)).collect();
				links.sort();
				links.dedup();
				let mut tags = record.tags;
				tags.sort();
				tags.dedup();
				(
					slug.clone(),
					ContentRecord {
						slug,
						title: record.title,
						links,
						tags,
					},
				)
			})
			.collect();
		Self { records }
	}

	pub fn get(&self, slug: &str) -> Option<&ContentRecord> {
		self.records.get(slug)
	}

	pub fn contains(&self, slug: &str) -> bool {
		self.records.contains_key(slug)
	}

	pub fn records(&self) -> impl Iterator<Item = &ContentRecord> {
		self.records.values()
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.records.len()
	}

	#[cfg(test)]
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

/// Options attached to one graph container.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphConfig {
	pub drag: bool,
	pub zoom: bool,
	/// Hop bound around the focal page; negative means the whole corpus.
	pub depth: i32,
	/// Base label scale; labels are drawn at `1 / scale`.
	pub scale: f64,
	pub repel_force: f64,
	pub center_force: f64,
	pub link_distance: f64,
	pub font_size: f64,
	pub opacity_scale: f64,
	pub remove_tags: Vec<String>,
	pub show_tags: bool,
	pub focus_on_hover: bool,
	pub enable_radial: bool,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self::local()
	}
}

impl GraphConfig {
	/// Inline per-page graph.
	pub fn local() -> Self {
		Self {
			drag: true,
			zoom: true,
			depth: 1,
			scale: 1.1,
			repel_force: 0.5,
			center_force: 0.3,
			link_distance: 30.0,
			font_size: 0.6,
			opacity_scale: 1.0,
			remove_tags: Vec::new(),
			show_tags: true,
			focus_on_hover: false,
			enable_radial: false,
		}
	}

	/// Whole-corpus overlay graph.
	pub fn global() -> Self {
		Self {
			depth: -1,
			scale: 0.9,
			center_force: 0.2,
			focus_on_hover: true,
			enable_radial: true,
			..Self::local()
		}
	}

	/// Parse a JSON options block; invalid input falls back to `fallback`.
	pub fn from_json_or(json: &str, fallback: Self) -> Self {
		match serde_json::from_str(json) {
			Ok(cfg) => cfg,
			Err(e) => {
				warn!("link-graph: invalid graph config, using defaults: {}", e);
				fallback
			}
		}
	}

	pub fn is_unbounded(&self) -> bool {
		self.depth < 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalize_slug_canonicalizes_format() {
		assert_eq!(normalize_slug("/Notes/Foo Bar.md"), "notes/foo-bar");
		assert_eq!(normalize_slug("./guide/index.html#setup"), "guide");
		assert_eq!(normalize_slug("guide/index"), "guide");
		assert_eq!(normalize_slug("."), "index");
		assert_eq!(normalize_slug(""), "index");
		assert_eq!(normalize_slug("index"), "index");
	}

	#[test]
	fn simplify_slug_drops_index() {
		assert_eq!(simplify_slug("index"), "");
		assert_eq!(simplify_slug("a/index"), "a");
		assert_eq!(simplify_slug("a/b"), "a/b");
	}

	#[test]
	fn index_from_json_defaults_missing_fields() {
		let json = r#"{
			"index": {"slug": "index", "filePath": "index.md", "title": "Home", "links": ["Notes/A"]},
			"notes/a": {"slug": "notes/a", "filePath": "notes/a.md", "tags": ["rust", "rust"]}
		}"#;
		let index = ContentIndex::from_json(json).unwrap();
		assert_eq!(index.len(), 2);
		assert_eq!(index.get("index").unwrap().links, vec!["notes/a".to_string()]);
		let a = index.get("notes/a").unwrap();
		assert_eq!(a.title, None);
		assert!(a.links.is_empty());
		assert_eq!(a.tags, vec!["rust".to_string()]);
	}

	#[test]
	fn index_from_json_rejects_garbage() {
		let err = ContentIndex::from_json("[1, 2").unwrap_err();
		assert!(matches!(err, GraphError::Decode { what: "content index", .. }));
	}

	#[test]
	fn config_json_fills_defaults() {
		let cfg = GraphConfig::from_json_or(
			r#"{"depth": -1, "removeTags": ["draft"], "enableRadial": true}"#,
			GraphConfig::local(),
		);
		assert_eq!(cfg.depth, -1);
		assert_eq!(cfg.remove_tags, vec!["draft".to_string()]);
		assert!(cfg.enable_radial);
		assert_eq!(cfg.link_distance, 30.0);
		assert!(cfg.is_unbounded());
	}

	#[test]
	fn config_json_invalid_uses_fallback() {
		let cfg = GraphConfig::from_json_or("not json", GraphConfig::global());
		assert_eq!(cfg, GraphConfig::global());
	}
}
