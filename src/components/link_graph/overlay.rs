use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{KeyboardEvent, MouseEvent};

use super::component::LinkGraph;
use super::lifecycle::EventListener;
use super::types::GraphConfig;

/// Keyboard shortcut (with Ctrl or Meta) that toggles the overlay.
pub const TOGGLE_KEY: &str = "g";

/// What a keydown means for the overlay, if anything.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OverlayKey {
	Toggle,
	Close,
}

pub fn overlay_key(key: &str, ctrl: bool, meta: bool) -> Option<OverlayKey> {
	match key {
		"Escape" => Some(OverlayKey::Close),
		k if (ctrl || meta) && k.eq_ignore_ascii_case(TOGGLE_KEY) => Some(OverlayKey::Toggle),
		_ => None,
	}
}

/// True when a click landed on the element carrying the handler itself, not on a child.
pub fn is_direct_hit<T: PartialEq>(target: Option<T>, current_target: Option<T>) -> bool {
	target.is_some() && target == current_target
}

/// Full-screen global graph, opened from a toggle button or the keyboard.
#[component]
pub fn GraphOverlay(
	#[prop(into)] focal: Signal<String>,
	#[prop(default = GraphConfig::global())] config: GraphConfig,
) -> impl IntoView {
	let open = RwSignal::new(false);

	let listener = StoredValue::new_local(web_sys::window().and_then(|window| {
		EventListener::new(&window, "keydown", move |ev| {
			let Some(ev) = ev.dyn_ref::<KeyboardEvent>() else {
				return;
			};
			match overlay_key(&ev.key(), ev.ctrl_key(), ev.meta_key()) {
				Some(OverlayKey::Toggle) => {
					ev.prevent_default();
					open.try_update(|o| *o = !*o);
				}
				Some(OverlayKey::Close) => {
					open.try_set(false);
				}
				None => {}
			}
		})
		.inspect_err(|e| warn!("link-graph: overlay shortcut unavailable: {}", e))
		.ok()
	}));
	on_cleanup(move || {
		listener.try_update_value(|l| {
			l.take();
		});
	});

	// navigating from inside the overlay closes it
	Effect::new(move |prev: Option<String>| {
		let current = focal.get();
		if prev.is_some_and(|p| p != current) && open.get_untracked() {
			debug!("link-graph: closing overlay after navigation");
			open.set(false);
		}
		current
	});

	let on_backdrop = move |ev: MouseEvent| {
		if is_direct_hit(ev.target(), ev.current_target()) {
			open.set(false);
		}
	};

	view! {
		<button
			class="graph-overlay-toggle"
			title="Global graph (Ctrl+G)"
			aria-label="Global graph"
			on:click=move |_| open.update(|o| *o = !*o)
		>
			<svg viewBox="0 0 24 24" width="20" height="20" fill="none" stroke="currentColor" stroke-width="2">
				<circle cx="6" cy="6" r="2" />
				<circle cx="18" cy="8" r="2" />
				<circle cx="10" cy="18" r="2" />
				<path d="M7.5 7.2 16.2 8 M6.6 7.9 9.4 16.1 M16.9 9.6 11.3 16.6" />
			</svg>
		</button>
		<Show when=move || open.get()>
			<div
				class="graph-overlay-backdrop"
				style="position: fixed; inset: 0; z-index: 100; display: flex; align-items: center; justify-content: center; background: rgba(0, 0, 0, 0.4);"
				on:click=on_backdrop
			>
				<div class="graph-overlay-container" style="width: 80vw; height: 80vh;">
					<LinkGraph focal=focal config=config.clone() fullscreen=true record_visit=false />
				</div>
			</div>
		</Show>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn shortcuts() {
		assert_eq!(overlay_key("g", true, false), Some(OverlayKey::Toggle));
		assert_eq!(overlay_key("G", false, true), Some(OverlayKey::Toggle));
		assert_eq!(overlay_key("g", false, false), None);
		assert_eq!(overlay_key("Escape", false, false), Some(OverlayKey::Close));
		assert_eq!(overlay_key("k", true, false), None);
	}

	#[test]
	fn only_clicks_on_the_backdrop_itself_close() {
		assert!(is_direct_hit(Some("backdrop"), Some("backdrop")));
		assert!(!is_direct_hit(Some("canvas"), Some("backdrop")));
		assert!(!is_direct_hit::<&str>(None, None));
	}
}
