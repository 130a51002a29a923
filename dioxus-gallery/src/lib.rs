//! # Dioxus Gallery
//!
//! Dioxus components for a photo collection: a featured image, a lazily
//! loaded thumbnail grid and a lightbox with keyboard navigation, zoom/pan,
//! slideshow and a metadata caption. The gallery logic itself lives in the
//! `photo-gallery` crate; this crate renders it and supplies the DOM-backed
//! host capabilities.
//!
//! ## Example
//! ```rust,ignore
//! use_context_provider(|| GalleryContext::new("./data/photos", None));
//!
//! rsx! {
//!     GalleryView {
//!         collection: ImageCollection::new("marathon", ["a.jpg", "b.jpg"]),
//!         title: "Marathon",
//!     }
//! }
//! ```

use dioxus::prelude::*;
use photo_gallery::{alt_text, GalleryOptions, ImageCollection, LoadState};
use std::cell::Cell;
use std::rc::Rc;

mod boundary;
mod display;
mod dom_host;
mod fallback;
mod hooks;
mod lightbox;

pub use boundary::GalleryErrorBoundary;
pub use display::{display_url, GalleryContext};
pub use dom_host::{DioxusSpawner, DomFocus, DomHost, FocusRegistry, FocusScope};
pub use fallback::{ImageErrorFallback, LoadingSpinner};
pub use hooks::{use_gallery, GalleryController};
pub use lightbox::{swipe_action, Lightbox, SWIPE_THRESHOLD};

/// A complete gallery for one collection
///
/// Provide a [`GalleryContext`] further up the tree to resolve local paths
/// and persist preferences; without one, sources are read as given and
/// preferences are kept for the session only.
#[component]
pub fn GalleryView(
    collection: ImageCollection,
    /// Human readable collection name, used in alt texts and labels
    #[props(into)]
    title: String,
    #[props(default)] options: GalleryOptions,
) -> Element {
    rsx! {
        GalleryErrorBoundary {
            GalleryBody { collection, title, options }
        }
    }
}

#[component]
fn GalleryBody(collection: ImageCollection, title: String, options: GalleryOptions) -> Element {
    let context = try_use_context::<GalleryContext>().unwrap_or_default();
    let controller = use_gallery(collection.clone(), options, context.store.clone());
    let is_open = controller.state.read().is_lightbox_open();
    let featured_key = format!("{}-featured", collection.name());

    rsx! {
        div {
            style: "display: flex; flex-direction: column; gap: 16px;",
            MetadataBanner { controller }
            if collection.is_empty() {
                div {
                    style: "padding: 24px; text-align: center; background: #f5f5f5; border-radius: 8px; color: #999;",
                    "No photos available"
                }
            } else {
                GalleryThumbnail {
                    key: "{featured_key}",
                    controller,
                    index: 0,
                    title: title.clone(),
                    featured: true,
                }
                ThumbnailGrid { controller, title: title.clone() }
            }
            if is_open {
                Lightbox { controller, title: title.clone() }
            }
        }
    }
}

/// Progress and failures of the metadata batch
#[component]
fn MetadataBanner(controller: GalleryController) -> Element {
    let loading = (controller.metadata_loading)();
    let error = (controller.metadata_error)();
    let failed = controller
        .metadata
        .read()
        .iter()
        .filter(|m| m.is_error())
        .count();

    if loading {
        return rsx! {
            div {
                role: "status",
                style: "padding: 8px 12px; background: #f0f6ff; border-radius: 8px; color: #335; font-size: 13px;",
                "⏳ Reading photo details..."
            }
        };
    }

    let message = match (error, failed) {
        (Some(error), _) => format!("Could not read photo details: {}", error),
        (None, 0) => return rsx! {},
        (None, 1) => "1 photo could not be read".to_string(),
        (None, n) => format!("{} photos could not be read", n),
    };

    rsx! {
        div {
            role: "alert",
            style: "display: flex; align-items: center; justify-content: space-between; gap: 12px; padding: 8px 12px; background: #fff8e6; border: 1px solid #f0d9a0; border-radius: 8px; color: #6b4e00; font-size: 13px;",
            span { "{message}" }
            button {
                style: "padding: 6px 14px; background: #0066cc; color: white; border: none; border-radius: 6px; font-size: 13px; cursor: pointer;",
                onclick: move |_| controller.retry_all_metadata(),
                "Retry all"
            }
        }
    }
}

#[component]
pub fn ThumbnailGrid(controller: GalleryController, title: String) -> Element {
    let (name, len) = {
        let state = controller.state.read();
        (state.collection().name().to_string(), state.collection().len())
    };

    rsx! {
        div {
            style: "display: grid; grid-template-columns: repeat(auto-fill, minmax(120px, 1fr)); gap: 12px;",
            for index in 0..len {
                GalleryThumbnail {
                    key: "{name}-{index}",
                    controller,
                    index,
                    title: title.clone(),
                }
            }
        }
    }
}

/// One image of the grid (or the featured image), loaded when scrolled near
#[component]
pub fn GalleryThumbnail(
    controller: GalleryController,
    index: usize,
    title: String,
    #[props(default)] featured: bool,
) -> Element {
    let mut element: Signal<Option<Rc<MountedData>>> = use_signal(|| None);
    let observed = use_hook(|| Rc::new(Cell::new(None)));

    // Register with the loader on mount and again whenever it is replaced
    {
        let observed = observed.clone();
        use_effect(move || {
            let _ = controller.loader.read();
            let Some(mounted) = element.read().clone() else {
                return;
            };
            if let Some(previous) = observed.take() {
                controller.forget_element(previous);
            }
            observed.set(Some(controller.observe_element(index, mounted)));
        });
    }
    use_drop(move || {
        if let Some(handle) = observed.take() {
            controller.forget_element(handle);
        }
    });

    let dom_id = if featured {
        format!("gallery-featured-{}", index)
    } else {
        format!("gallery-thumb-{}", index)
    };
    let focus = controller.focus_host();
    let focus_handle = use_hook({
        let focus = focus.clone();
        let dom_id = dom_id.clone();
        move || focus.register(dom_id, FocusScope::Page, 0)
    });
    use_drop({
        let focus = focus.clone();
        move || focus.unregister(focus_handle)
    });

    let loaded = use_memo(move || controller.image_state(index) == LoadState::Loaded);
    let image_url = use_resource(move || {
        let ready = loaded();
        async move {
            if !ready {
                return None;
            }
            controller.image_url(index).await
        }
    });

    let load_state = controller.image_state(index);
    let metadata = controller.metadata_for(index);
    let alt = alt_text(metadata.as_ref(), index, &title);
    let filename = controller
        .state
        .read()
        .collection()
        .get(index)
        .map(|source| source.filename())
        .unwrap_or_default();
    let frame_style = if featured {
        "position: relative; width: 100%; aspect-ratio: 16/9; border-radius: 12px; overflow: hidden; background: #f0f0f0; padding: 0; border: none; cursor: pointer;"
    } else {
        "position: relative; aspect-ratio: 1/1; border-radius: 8px; overflow: hidden; background: #f0f0f0; padding: 0; border: 2px solid #e0e0e0; cursor: pointer;"
    };
    let on_focus = focus.clone();

    rsx! {
        div {
            id: "{dom_id}",
            role: "button",
            tabindex: "0",
            aria_label: "Open {alt}",
            style: "{frame_style}",
            onmounted: move |evt: MountedEvent| element.set(Some(evt.data())),
            onfocus: move |_| on_focus.focused(focus_handle),
            onblur: move |_| focus.blurred(focus_handle),
            onclick: move |_| controller.open(index),
            onkeydown: move |evt: KeyboardEvent| {
                let key = evt.key().to_string();
                if key == "Enter" || key == " " {
                    evt.prevent_default();
                    controller.open(index);
                }
            },
            match (load_state, image_url()) {
                (LoadState::Error, _) => rsx! {
                    ImageErrorFallback {
                        filename: filename.clone(),
                        on_retry: move |_| controller.retry_image(index),
                    }
                },
                (_, Some(Some(url))) => rsx! {
                    img {
                        src: url,
                        alt: "{alt}",
                        loading: "lazy",
                        style: "width: 100%; height: 100%; object-fit: cover; display: block;",
                    }
                },
                _ => rsx! {
                    LoadingSpinner { label: "Loading {filename}" }
                },
            }
        }
    }
}
