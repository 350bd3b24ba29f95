//! Interactive link graph of a content corpus.
//!
//! The pure core ([`graph`], [`layout`], [`interaction`], [`render`] state)
//! runs natively; the Leptos components mount it on a canvas.

pub mod component;
pub mod error;
pub mod frame;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod lifecycle;
pub mod overlay;
pub mod render;
pub mod state;
pub mod theme;
pub mod tween;
pub mod types;
pub mod visited;

pub use component::LinkGraph;
pub use lifecycle::Navigator;
pub use overlay::GraphOverlay;
pub use theme::Theme;
pub use types::{GraphConfig, normalize_slug};
