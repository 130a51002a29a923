use crate::config::ResolvedCollection;
use crate::{Portfolio, Screen};
use dioxus::prelude::*;
use dioxus_gallery::{display_url, GalleryContext};

#[component]
pub fn CollectionListScreen(on_navigate: EventHandler<Screen>) -> Element {
    let portfolio = use_context::<Portfolio>();

    rsx! {
        div { style: "padding: 16px; max-width: 900px; margin: 0 auto; min-height: 100vh; background: #f5f5f5;",

            // Header
            div { style: "margin-bottom: 16px; padding-top: 8px;",
                h1 { style: "color: #0066cc; margin: 0; font-size: 24px; font-weight: 700;",
                    "📷 Portfolio"
                }
            }

            if portfolio.collections.is_empty() {
                div { style: "text-align: center; padding: 40px; color: #999;",
                    "No collections configured"
                }
            } else {
                div { style: "display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 16px;",
                    for collection in portfolio.collections.iter().cloned() {
                        CollectionCard {
                            key: "{collection.config.name}",
                            on_click: {
                                let name = collection.config.name.clone();
                                move |_| on_navigate.call(Screen::Collection(name.clone()))
                            },
                            collection: collection.clone(),
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn CollectionCard(collection: ResolvedCollection, on_click: EventHandler<()>) -> Element {
    let context = use_context::<GalleryContext>();
    let cover = collection.images.get(0).cloned();
    let count = collection.images.len();

    // Cover image: first picture of the collection
    let preview = use_resource(move || {
        let fetcher = context.fetcher.clone();
        let cover = cover.clone();
        async move {
            let source = cover?;
            match display_url(fetcher.as_ref(), &source).await {
                Ok(url) => Some(url),
                Err(e) => {
                    log::warn!("No preview for {}: {}", source, e);
                    None
                }
            }
        }
    });

    rsx! {
        div {
            style: "background: white; border-radius: 12px; overflow: hidden; box-shadow: 0 2px 8px rgba(0,0,0,0.1); cursor: pointer;",
            onclick: move |_| on_click.call(()),

            div { style: "height: 160px; background: #e0e0e0; display: flex; align-items: center; justify-content: center;",
                match preview() {
                    Some(Some(url)) => rsx! {
                        img {
                            src: "{url}",
                            alt: "{collection.config.title}",
                            style: "width: 100%; height: 100%; object-fit: cover;",
                        }
                    },
                    Some(None) => rsx! {
                        div { style: "font-size: 48px;", "📷" }
                    },
                    None => rsx! {
                        div { style: "font-size: 32px;", "⏳" }
                    },
                }
            }

            div { style: "padding: 12px 16px;",
                h2 { style: "margin: 0 0 4px; font-size: 18px; color: #333;",
                    "{collection.config.title}"
                }
                if !collection.config.description.is_empty() {
                    p { style: "margin: 0 0 8px; font-size: 14px; color: #666;",
                        "{collection.config.description}"
                    }
                }
                div { style: "font-size: 13px; color: #999;",
                    if count == 1 { "1 photo" } else { "{count} photos" }
                }
            }
        }
    }
}
