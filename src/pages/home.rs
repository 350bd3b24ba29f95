use leptos::prelude::*;
use leptos_router::hooks::use_location;

use crate::components::link_graph::{GraphConfig, GraphOverlay, LinkGraph, Theme, normalize_slug};

/// Id of an optional `<script type="application/json">` block overriding the local graph options.
const CONFIG_ELEMENT_ID: &str = "graph-config";

fn local_config() -> GraphConfig {
	web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
		.and_then(|el| el.text_content())
		.map(|json| GraphConfig::from_json_or(&json, GraphConfig::local()))
		.unwrap_or_else(GraphConfig::local)
}

/// A content page: the local graph around the current slug, plus the global overlay.
#[component]
pub fn NotePage() -> impl IntoView {
	let location = use_location();
	let focal = Signal::derive(move || normalize_slug(&location.pathname.get()));
	let theme = use_context::<RwSignal<Theme>>();

	let toggle_theme = move |_| {
		if let Some(theme) = theme {
			theme.update(|t| *t = t.toggled());
		}
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			<header class="page-header">
				<h1>{move || focal.get()}</h1>
				<button class="theme-toggle" on:click=toggle_theme>
					{move || theme.map(|t| t.get().toggled().as_str()).unwrap_or("dark")}
				</button>
				<GraphOverlay focal=focal />
			</header>
			<aside class="graph">
				<h3>"Graph View"</h3>
				<div class="graph-outer" style="height: 250px;">
					<LinkGraph focal=focal config=local_config() />
				</div>
			</aside>
		</ErrorBoundary>
	}
}
