use dioxus::prelude::*;
use dioxus_gallery::GalleryContext;
use std::rc::Rc;

mod components;
mod config;
mod database;
mod error;
mod filesystem;

use components::{CollectionListScreen, CollectionScreen, NavigationBar};
use config::{AppConfig, ResolvedCollection};

fn main() {
    init_logging();
    dioxus::launch(App);
}

#[cfg(target_os = "android")]
fn init_logging() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag("portfolio-gallery"),
    );
}

#[cfg(not(target_os = "android"))]
fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Screen navigation for the app
#[derive(Clone, PartialEq, Debug)]
pub enum Screen {
    Collections,
    /// A single collection, by name
    Collection(String),
}

/// Configuration and collections, resolved once at startup
#[derive(Clone)]
pub struct Portfolio {
    pub config: Rc<AppConfig>,
    pub collections: Rc<Vec<ResolvedCollection>>,
}

impl Portfolio {
    pub fn find(&self, name: &str) -> Option<&ResolvedCollection> {
        self.collections.iter().find(|c| c.config.name == name)
    }
}

#[component]
fn App() -> Element {
    let mut current_screen = use_signal(|| Screen::Collections);

    let (portfolio, gallery_context) = use_hook(|| {
        let data_dir = filesystem::get_app_data_dir();
        log::info!("Using data directory {}", data_dir.display());
        let config = config::load_config(&data_dir);
        let collections = config.resolve_all(&data_dir);
        let store = database::open_preference_store(&data_dir);
        (
            Portfolio {
                config: Rc::new(config),
                collections: Rc::new(collections),
            },
            GalleryContext::new(data_dir, Some(store)),
        )
    });
    use_context_provider(|| portfolio.clone());
    use_context_provider(|| gallery_context.clone());

    let names: Vec<(String, String)> = portfolio
        .collections
        .iter()
        .map(|c| (c.config.name.clone(), c.config.title.clone()))
        .collect();

    rsx! {
        div { style: "display: flex; flex-direction: column; height: 100vh; font-family: sans-serif;",

            // Main Content
            div { style: "flex: 1; overflow-y: auto;",
                match current_screen() {
                    Screen::Collections => rsx! {
                        CollectionListScreen { on_navigate: move |s| current_screen.set(s) }
                    },
                    Screen::Collection(name) => rsx! {
                        CollectionScreen { name, on_navigate: move |s| current_screen.set(s) }
                    },
                }
            }

            // Bottom Navigation Bar
            NavigationBar {
                current_screen: current_screen(),
                collections: names,
                on_navigate: move |screen| current_screen.set(screen),
            }
        }
    }
}
