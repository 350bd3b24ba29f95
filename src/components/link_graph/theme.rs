//! Theme palette, read from CSS custom properties with per-theme fallbacks.

use log::debug;

use super::graph::GraphNode;
use super::visited::VisitedSet;

/// Site color scheme, mirrored on `<html data-theme=…>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
	#[default]
	Light,
	Dark,
}

impl Theme {
	pub fn as_str(self) -> &'static str {
		match self {
			Theme::Light => "light",
			Theme::Dark => "dark",
		}
	}

	pub fn toggled(self) -> Self {
		match self {
			Theme::Light => Theme::Dark,
			Theme::Dark => Theme::Light,
		}
	}
}

/// Colors the graph draws with.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
	/// Focal node (`--secondary`).
	pub accent_a: String,
	/// Visited and tag nodes (`--tertiary`).
	pub accent_b: String,
	/// Unvisited nodes and active links (`--gray`).
	pub neutral: String,
	/// Inactive links (`--lightgray`).
	pub light_gray: String,
	/// Tag node fill (`--light`).
	pub light: String,
	/// Labels (`--dark`).
	pub dark: String,
}

impl Palette {
	pub fn fallback(theme: Theme) -> Self {
		let c = |s: &str| s.to_string();
		match theme {
			Theme::Light => Self {
				accent_a: c("#284b63"),
				accent_b: c("#84a59d"),
				neutral: c("#b8b8b8"),
				light_gray: c("#e5e5e5"),
				light: c("#faf8f8"),
				dark: c("#2b2b2b"),
			},
			Theme::Dark => Self {
				accent_a: c("#7b97aa"),
				accent_b: c("#84a59d"),
				neutral: c("#646464"),
				light_gray: c("#393639"),
				light: c("#161618"),
				dark: c("#ebebec"),
			},
		}
	}

	/// Resolve each variable through `lookup`; unset or blank values keep the fallback.
	pub fn resolve(theme: Theme, lookup: impl Fn(&str) -> Option<String>) -> Self {
		let fallback = Self::fallback(theme);
		let pick = |var: &str, default: String| {
			lookup(var)
				.map(|v| v.trim().to_string())
				.filter(|v| !v.is_empty())
				.unwrap_or(default)
		};
		Self {
			accent_a: pick("--secondary", fallback.accent_a),
			accent_b: pick("--tertiary", fallback.accent_b),
			neutral: pick("--gray", fallback.neutral),
			light_gray: pick("--lightgray", fallback.light_gray),
			light: pick("--light", fallback.light),
			dark: pick("--dark", fallback.dark),
		}
	}

	/// Read the palette from the document element's computed style.
	pub fn from_document(theme: Theme) -> Self {
		let style = web_sys::window().and_then(|w| {
			let root = w.document()?.document_element()?;
			w.get_computed_style(&root).ok().flatten()
		});
		let Some(style) = style else {
			debug!("link-graph: no computed style, using {} fallback palette", theme.as_str());
			return Self::fallback(theme);
		};
		Self::resolve(theme, |var| style.get_property_value(var).ok())
	}

	/// Fill color for `node`, evaluated once per build.
	pub fn node_color(&self, node: &GraphNode, focal: &str, visited: &VisitedSet) -> &str {
		if node.id == focal {
			&self.accent_a
		} else if node.is_tag() || visited.contains(&node.id) {
			&self.accent_b
		} else {
			&self.neutral
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::link_graph::graph::NodeKind;

	fn node(id: &str, kind: NodeKind) -> GraphNode {
		GraphNode {
			id: id.into(),
			text: id.into(),
			kind,
		}
	}

	#[test]
	fn unset_variables_fall_back() {
		let p = Palette::resolve(Theme::Dark, |var| match var {
			"--secondary" => Some(" #ff0000 ".into()),
			"--gray" => Some("".into()),
			_ => None,
		});
		assert_eq!(p.accent_a, "#ff0000");
		assert_eq!(p.neutral, Palette::fallback(Theme::Dark).neutral);
		assert_eq!(p.dark, Palette::fallback(Theme::Dark).dark);
	}

	#[test]
	fn focal_node_wins_over_visited() {
		let p = Palette::fallback(Theme::Light);
		let visited = VisitedSet::from_iter(["a".to_string(), "b".to_string()]);
		assert_eq!(p.node_color(&node("a", NodeKind::Page), "a", &visited), p.accent_a);
		assert_eq!(p.node_color(&node("b", NodeKind::Page), "a", &visited), p.accent_b);
		assert_eq!(p.node_color(&node("c", NodeKind::Page), "a", &visited), p.neutral);
		assert_eq!(
			p.node_color(&node("tags/x", NodeKind::Tag), "a", &VisitedSet::default()),
			p.accent_b
		);
	}

	#[test]
	fn theme_toggles() {
		assert_eq!(Theme::Light.toggled(), Theme::Dark);
		assert_eq!(Theme::Dark.toggled().as_str(), "light");
	}
}
