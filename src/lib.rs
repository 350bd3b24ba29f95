//! Leptos client-side app hosting the link graph: a page per content slug with
//! a local graph, plus the global graph overlay.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::hooks::{use_location, use_navigate};
use leptos_router::path;
use log::{Level, debug, info};

// Modules
mod components;
mod pages;

use crate::components::link_graph::{Navigator, Theme};
// Top-Level pages
use crate::pages::home::NotePage;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Registers the router as the graph's navigation target.
#[component]
fn Navigation(children: Children) -> impl IntoView {
	let navigate = use_navigate();
	let location = use_location();
	provide_context(Navigator::new(move |path| {
		debug!("router: {} -> {}", location.pathname.get_untracked(), path);
		navigate(path, Default::default());
	}));
	children()
}

/// An app router which renders a page per slug and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	let theme = RwSignal::new(Theme::default());
	provide_context(theme);

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme=move || theme.get().as_str() />

		// sets the document title
		<Title text="Link Graph" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Navigation>
				<Routes fallback=|| view! { <NotFound /> }>
					<Route path=path!("/") view=NotePage />
					<Route path=path!("/*slug") view=NotePage />
				</Routes>
			</Navigation>
		</Router>
	}
}
