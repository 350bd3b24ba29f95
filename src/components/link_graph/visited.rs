//! Pages the reader has opened, persisted as a JSON array in local storage.

use std::collections::BTreeSet;

use log::warn;

use super::error::{GraphError, Result, describe};

pub const VISITED_KEY: &str = "graph-visited";

/// Minimal string key-value store; `localStorage` in the browser.
pub trait KeyValueStore {
	fn get(&self, key: &str) -> Result<Option<String>>;
	fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl KeyValueStore for web_sys::Storage {
	fn get(&self, key: &str) -> Result<Option<String>> {
		self.get_item(key)
			.map_err(|e| GraphError::Storage(describe(&e)))
	}

	fn set(&self, key: &str, value: &str) -> Result<()> {
		self.set_item(key, value)
			.map_err(|e| GraphError::Storage(describe(&e)))
	}
}

/// The window's `localStorage`, if the host allows it.
pub fn local_storage() -> Option<web_sys::Storage> {
	web_sys::window()?.local_storage().ok().flatten()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisitedSet(BTreeSet<String>);

impl FromIterator<String> for VisitedSet {
	fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl VisitedSet {
	pub fn contains(&self, slug: &str) -> bool {
		self.0.contains(slug)
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[cfg(test)]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Read the persisted set; a missing or corrupt entry reads as empty.
	pub fn load(store: &impl KeyValueStore) -> Self {
		let raw = match store.get(VISITED_KEY) {
			Ok(Some(raw)) => raw,
			Ok(None) => return Self::default(),
			Err(e) => {
				warn!("link-graph: {}", e);
				return Self::default();
			}
		};
		match serde_json::from_str::<Vec<String>>(&raw) {
			Ok(slugs) => slugs.into_iter().collect(),
			Err(e) => {
				warn!("link-graph: ignoring corrupt visited set: {}", e);
				Self::default()
			}
		}
	}

	/// Merge `slug` into the persisted set and return the merged result.
	pub fn record(store: &impl KeyValueStore, slug: &str) -> Result<Self> {
		let mut visited = Self::load(store);
		if visited.0.insert(slug.to_string()) {
			let json = serde_json::to_string(&visited.0).map_err(|e| GraphError::Decode {
				what: "visited set",
				reason: e.to_string(),
			})?;
			store.set(VISITED_KEY, &json)?;
		}
		Ok(visited)
	}
}

#[cfg(test)]
mod tests {
	use std::cell::RefCell;
	use std::collections::HashMap;

	use super::*;

	#[derive(Default)]
	struct MemoryStore(RefCell<HashMap<String, String>>);

	impl KeyValueStore for MemoryStore {
		fn get(&self, key: &str) -> Result<Option<String>> {
			Ok(self.0.borrow().get(key).cloned())
		}

		fn set(&self, key: &str, value: &str) -> Result<()> {
			self.0.borrow_mut().insert(key.into(), value.into());
			Ok(())
		}
	}

	struct BrokenStore;

	impl KeyValueStore for BrokenStore {
		fn get(&self, _: &str) -> Result<Option<String>> {
			Err(GraphError::Storage("denied".into()))
		}

		fn set(&self, _: &str, _: &str) -> Result<()> {
			Err(GraphError::Storage("denied".into()))
		}
	}

	#[test]
	fn record_merges_with_persisted_set() {
		let store = MemoryStore::default();
		store.set(VISITED_KEY, r#"["a"]"#).unwrap();
		let visited = VisitedSet::record(&store, "b").unwrap();
		assert!(visited.contains("a") && visited.contains("b"));
		assert_eq!(store.0.borrow()[VISITED_KEY], r#"["a","b"]"#);
	}

	#[test]
	fn record_is_idempotent() {
		let store = MemoryStore::default();
		VisitedSet::record(&store, "a").unwrap();
		let visited = VisitedSet::record(&store, "a").unwrap();
		assert_eq!(visited.len(), 1);
	}

	#[test]
	fn corrupt_or_unavailable_storage_reads_empty() {
		let store = MemoryStore::default();
		store.set(VISITED_KEY, "{oops").unwrap();
		assert!(VisitedSet::load(&store).is_empty());
		assert!(VisitedSet::load(&BrokenStore).is_empty());
		assert!(VisitedSet::record(&BrokenStore, "a").is_err());
	}
}
