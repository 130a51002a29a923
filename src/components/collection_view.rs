use crate::{Portfolio, Screen};
use dioxus::prelude::*;
use dioxus_gallery::GalleryView;

#[component]
pub fn CollectionScreen(name: String, on_navigate: EventHandler<Screen>) -> Element {
    let portfolio = use_context::<Portfolio>();
    let Some(collection) = portfolio.find(&name).cloned() else {
        log::warn!("Unknown collection {:?}", name);
        return rsx! {
            div { style: "padding: 40px; text-align: center; color: #999;",
                p { "Collection not found" }
                button {
                    style: "padding: 10px 16px; font-size: 16px; border: none; border-radius: 8px; background: #0066cc; color: white; cursor: pointer;",
                    onclick: move |_| on_navigate.call(Screen::Collections),
                    "← Back"
                }
            }
        };
    };

    rsx! {
        div { style: "padding: 16px; max-width: 1100px; margin: 0 auto; min-height: 100vh; background: #f5f5f5;",

            // Header
            div { style: "display: flex; align-items: center; gap: 12px; margin-bottom: 12px; padding-top: 8px;",
                button {
                    style: "padding: 8px 12px; font-size: 16px; border: 1px solid #ddd; border-radius: 8px; background: white; cursor: pointer;",
                    onclick: move |_| on_navigate.call(Screen::Collections),
                    "←"
                }
                h1 { style: "color: #0066cc; margin: 0; font-size: 24px; font-weight: 700;",
                    "{collection.config.title}"
                }
            }
            if !collection.config.description.is_empty() {
                p { style: "margin: 0 0 16px; color: #666;", "{collection.config.description}" }
            }

            GalleryView {
                collection: collection.images.clone(),
                title: collection.config.title.clone(),
                options: portfolio.config.gallery.clone(),
            }
        }
    }
}
