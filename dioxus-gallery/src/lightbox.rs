//! Modal single-image viewer

use crate::dom_host::{FocusScope, LIGHTBOX_ID};
use crate::fallback::{ImageErrorFallback, LoadingSpinner};
use crate::hooks::GalleryController;
use dioxus::prelude::*;
use photo_gallery::{
    alt_text, format_capture_date, keyboard_shortcuts, GalleryAction, ImageMetadata, KeyInput,
    LoadState, PanPosition, PreferenceUpdate,
};

/// Minimum horizontal travel of a touch that counts as a swipe, in CSS pixels
pub const SWIPE_THRESHOLD: f64 = 50.0;

/// Navigation for a horizontal swipe of `dx` pixels
pub fn swipe_action(dx: f64) -> Option<GalleryAction> {
    if dx <= -SWIPE_THRESHOLD {
        Some(GalleryAction::Next)
    } else if dx >= SWIPE_THRESHOLD {
        Some(GalleryAction::Previous)
    } else {
        None
    }
}

pub fn image_transform(zoom: f64, pan: PanPosition) -> String {
    format!(
        "transform: translate({}px, {}px) scale({});",
        pan.x, pan.y, zoom
    )
}

/// Caption lines for the metadata overlay
pub fn caption_lines(metadata: &ImageMetadata) -> Vec<String> {
    let mut lines = vec![metadata.filename.clone()];
    if let Some(dimensions) = metadata.dimensions {
        lines.push(format!("{} × {}", dimensions.width, dimensions.height));
    }
    if let Some(date) = &metadata.capture_date {
        lines.push(format_capture_date(date));
    }
    if let Some(source) = &metadata.source {
        lines.push(format!("via {}", source));
    }
    if let Some(error) = &metadata.error {
        lines.push(error.clone());
    }
    lines
}

const CONTROL_STYLE: &str = "min-width: 40px; height: 40px; padding: 0 10px; background: rgba(255, 255, 255, 0.2); color: white; border-radius: 20px; font-size: 18px; cursor: pointer; border: none;";
const PANEL_BUTTON_STYLE: &str = "width: 100%; height: 32px; background: rgba(255, 255, 255, 0.15); color: white; border-radius: 6px; font-size: 13px; cursor: pointer; border: none; text-align: left; padding: 0 10px;";
const NAV_STYLE: &str = "position: absolute; top: 50%; transform: translateY(-50%); width: 50px; height: 50px; background: rgba(255, 255, 255, 0.3); color: white; border-radius: 50%; font-size: 24px; cursor: pointer; border: none; z-index: 2;";

/// The lightbox; mount it only while the lightbox is open
#[component]
pub fn Lightbox(controller: GalleryController, title: String) -> Element {
    let mut state = controller.state;
    let focus = controller.focus_host();
    use_hook({
        let focus = focus.clone();
        move || focus.set_container(Some(LIGHTBOX_ID.to_string()))
    });
    use_drop({
        let focus = focus.clone();
        move || focus.set_container(None)
    });

    let mut drag: Signal<Option<(f64, f64)>> = use_signal(|| None);
    let mut show_help = use_signal(|| false);
    let mut touch_start: Signal<Option<(f64, f64)>> = use_signal(|| None);

    let current = use_memo(move || {
        let state = state.read();
        (state.current_index(), state.current_image().cloned())
    });

    // The lightbox may open on an image the grid never scrolled to
    use_effect(move || {
        let (index, _) = current();
        let loader = controller.loader.peek().clone();
        if loader.image_state(index) == LoadState::Pending {
            loader.force_load_image(index);
        }
    });

    // Shown once loaded, so the URL normally comes straight from the cache
    let loaded = use_memo(move || controller.image_state(current().0) == LoadState::Loaded);
    let image_url = use_resource(move || {
        let (index, source) = current();
        let ready = loaded();
        async move {
            if !ready || source.is_none() {
                return None;
            }
            controller.image_url(index).await
        }
    });

    let (index, len, zoom, pan, is_slideshow, is_fullscreen, can_zoom_in, can_zoom_out, preferences) = {
        let s = state.read();
        (
            s.current_index(),
            s.collection().len(),
            s.zoom_level(),
            s.pan_position(),
            s.is_slideshow(),
            s.is_fullscreen(),
            s.can_zoom_in(),
            s.can_zoom_out(),
            s.preferences().clone(),
        )
    };
    let load_state = controller.image_state(index);
    let metadata = controller.metadata_for(index);
    let alt = alt_text(metadata.as_ref(), index, &title);
    let filename = current()
        .1
        .map(|source| source.filename())
        .unwrap_or_default();
    let announcement = controller.navigator.read().announcement().unwrap_or("");
    let zoomed = zoom > 1.0;
    let transform = image_transform(zoom, pan);
    let cursor = if zoomed {
        if drag().is_some() { "grabbing" } else { "grab" }
    } else {
        "default"
    };
    let zoom_percent = (zoom * 100.0).round();
    let preferred_percent = (preferences.default_zoom * 100.0).round();
    let slideshow_label = if is_slideshow { "Pause slideshow" } else { "Start slideshow" };
    let fullscreen_label = if is_fullscreen { "Exit fullscreen" } else { "Fullscreen" };
    let auto_slideshow_label = toggle_label("Auto slideshow", preferences.auto_slideshow);
    let shortcuts_label = toggle_label("Keyboard shortcuts", preferences.enable_keyboard_shortcuts);

    rsx! {
        div {
            id: LIGHTBOX_ID,
            role: "dialog",
            aria_modal: "true",
            aria_label: "{title} photo viewer",
            tabindex: "-1",
            style: "position: fixed; top: 0; left: 0; right: 0; bottom: 0; background: rgba(0, 0, 0, 0.95); z-index: 1000; display: flex; flex-direction: column; outline: none;",
            onclick: move |_| controller.dispatch(GalleryAction::Close),
            onkeydown: move |evt: KeyboardEvent| {
                let input = KeyInput::from_dom(&evt.key().to_string(), evt.modifiers().shift());
                if controller.handle_key(input) {
                    evt.prevent_default();
                }
            },

            // Header: counter and close
            div {
                style: "display: flex; justify-content: space-between; align-items: center; padding: 16px; background: rgba(0, 0, 0, 0.7);",
                onclick: move |evt: MouseEvent| evt.stop_propagation(),
                div {
                    style: "color: white; font-size: 16px;",
                    aria_live: "off",
                    "{index + 1} / {len}"
                }
                LightboxButton {
                    controller,
                    dom_id: "gallery-lightbox-close",
                    order: 9,
                    label: "Close",
                    onclick: move |_| controller.dispatch(GalleryAction::Close),
                    "×"
                }
            }

            // Main image area
            div {
                style: "flex: 1; display: flex; align-items: center; justify-content: center; padding: 20px; position: relative; overflow: hidden;",
                onclick: move |evt: MouseEvent| {
                    if zoomed {
                        evt.stop_propagation();
                    }
                },
                onmousedown: move |evt: MouseEvent| {
                    if zoomed {
                        let point = evt.client_coordinates();
                        drag.set(Some((point.x, point.y)));
                    }
                },
                onmousemove: move |evt: MouseEvent| {
                    if let Some((x, y)) = drag() {
                        let point = evt.client_coordinates();
                        state.write().update_pan_position(point.x - x, point.y - y);
                        drag.set(Some((point.x, point.y)));
                    }
                },
                onmouseup: move |_| drag.set(None),
                onmouseleave: move |_| drag.set(None),
                ontouchstart: move |evt: TouchEvent| {
                    if let Some(touch) = evt.touches().first() {
                        let point = touch.client_coordinates();
                        touch_start.set(Some((point.x, point.y)));
                    }
                },
                ontouchmove: move |evt: TouchEvent| {
                    if !zoomed {
                        return;
                    }
                    if let (Some((x, y)), Some(touch)) = (touch_start(), evt.touches().first()) {
                        let point = touch.client_coordinates();
                        state.write().update_pan_position(point.x - x, point.y - y);
                        touch_start.set(Some((point.x, point.y)));
                    }
                },
                ontouchend: move |evt: TouchEvent| {
                    let Some((x, _)) = touch_start() else {
                        return;
                    };
                    touch_start.set(None);
                    if zoomed {
                        return;
                    }
                    if let Some(touch) = evt.touches_changed().first() {
                        if let Some(action) = swipe_action(touch.client_coordinates().x - x) {
                            controller.dispatch(action);
                        }
                    }
                },

                div {
                    style: "{NAV_STYLE} left: 20px;",
                    onclick: move |evt: MouseEvent| evt.stop_propagation(),
                    LightboxButton {
                        controller,
                        dom_id: "gallery-lightbox-previous",
                        order: 1,
                        label: "Previous photo",
                        style: "width: 100%; height: 100%; background: transparent; color: white; border: none; font-size: 24px; cursor: pointer;",
                        onclick: move |_| controller.dispatch(GalleryAction::Previous),
                        "‹"
                    }
                }

                match (load_state, image_url()) {
                    (LoadState::Error, _) => rsx! {
                        div {
                            style: "width: 320px; height: 240px;",
                            onclick: move |evt: MouseEvent| evt.stop_propagation(),
                            ImageErrorFallback {
                                filename: filename.clone(),
                                dark: true,
                                on_retry: move |_| controller.retry_image(index),
                            }
                        }
                    },
                    (_, Some(Some(url))) => rsx! {
                        img {
                            src: url,
                            alt: "{alt}",
                            draggable: "false",
                            style: "max-width: 100%; max-height: 100%; object-fit: contain; transition: transform 0.2s ease; cursor: {cursor}; {transform}",
                            onclick: move |evt: MouseEvent| evt.stop_propagation(),
                        }
                    },
                    _ => rsx! {
                        LoadingSpinner { label: "Loading photo" }
                    },
                }

                div {
                    style: "{NAV_STYLE} right: 20px;",
                    onclick: move |evt: MouseEvent| evt.stop_propagation(),
                    LightboxButton {
                        controller,
                        dom_id: "gallery-lightbox-next",
                        order: 2,
                        label: "Next photo",
                        style: "width: 100%; height: 100%; background: transparent; color: white; border: none; font-size: 24px; cursor: pointer;",
                        onclick: move |_| controller.dispatch(GalleryAction::Next),
                        "›"
                    }
                }

                // Caption
                if preferences.show_metadata {
                    if let Some(metadata) = metadata.clone() {
                        div {
                            style: "position: absolute; left: 20px; bottom: 20px; max-width: 60%; padding: 10px 14px; background: rgba(0, 0, 0, 0.6); color: white; border-radius: 8px; font-size: 13px; line-height: 1.5;",
                            onclick: move |evt: MouseEvent| evt.stop_propagation(),
                            for line in caption_lines(&metadata) {
                                div { "{line}" }
                            }
                        }
                    }
                }
            }

            // Footer: zoom, slideshow, fullscreen, details
            div {
                style: "display: flex; justify-content: center; align-items: center; flex-wrap: wrap; gap: 12px; padding: 16px; background: rgba(0, 0, 0, 0.7);",
                onclick: move |evt: MouseEvent| evt.stop_propagation(),
                LightboxButton {
                    controller,
                    dom_id: "gallery-lightbox-zoom-out",
                    order: 3,
                    label: "Zoom out",
                    disabled: !can_zoom_out,
                    onclick: move |_| controller.dispatch(GalleryAction::ZoomOut),
                    "−"
                }
                div {
                    style: "color: white; font-size: 14px; min-width: 48px; text-align: center;",
                    "{zoom_percent}%"
                }
                LightboxButton {
                    controller,
                    dom_id: "gallery-lightbox-zoom-in",
                    order: 4,
                    label: "Zoom in",
                    disabled: !can_zoom_in,
                    onclick: move |_| controller.dispatch(GalleryAction::ZoomIn),
                    "+"
                }
                LightboxButton {
                    controller,
                    dom_id: "gallery-lightbox-zoom-preferred",
                    order: 5,
                    label: "Preferred zoom",
                    onclick: move |_| {
                        let level = state.peek().preferences().default_zoom;
                        state.write().set_zoom(level);
                    },
                    "⤢ {preferred_percent}%"
                }
                LightboxButton {
                    controller,
                    dom_id: "gallery-lightbox-zoom-reset",
                    order: 6,
                    label: "Reset zoom",
                    disabled: zoom == 1.0,
                    onclick: move |_| state.write().reset_zoom(),
                    "1:1"
                }
                LightboxButton {
                    controller,
                    dom_id: "gallery-lightbox-slideshow",
                    order: 7,
                    label: slideshow_label,
                    pressed: is_slideshow,
                    onclick: move |_| controller.dispatch(GalleryAction::ToggleSlideshow),
                    if is_slideshow { "⏸" } else { "▶" }
                }
                LightboxButton {
                    controller,
                    dom_id: "gallery-lightbox-fullscreen",
                    order: 8,
                    label: fullscreen_label,
                    pressed: is_fullscreen,
                    onclick: move |_| controller.dispatch(GalleryAction::ToggleFullscreen),
                    "⛶"
                }
                LightboxButton {
                    controller,
                    dom_id: "gallery-lightbox-details",
                    order: 10,
                    label: "Photo details",
                    pressed: preferences.show_metadata,
                    onclick: move |_| {
                        let on = state.peek().preferences().show_metadata;
                        state.write().update_preference(PreferenceUpdate::ShowMetadata(!on));
                    },
                    "ℹ"
                }
                LightboxButton {
                    controller,
                    dom_id: "gallery-lightbox-help",
                    order: 11,
                    label: "Shortcuts and settings",
                    pressed: show_help(),
                    onclick: move |_| show_help.set(!show_help()),
                    "?"
                }
            }

            if show_help() {
                div {
                    style: "position: absolute; right: 20px; bottom: 90px; width: 300px; max-height: 70vh; overflow-y: auto; padding: 16px; background: rgba(30, 30, 30, 0.95); color: white; border-radius: 12px; font-size: 13px; z-index: 3;",
                    onclick: move |evt: MouseEvent| evt.stop_propagation(),
                    for group in keyboard_shortcuts() {
                        div { key: "{group.title}", style: "margin-bottom: 12px;",
                            div { style: "font-weight: bold; margin-bottom: 6px;", "{group.title}" }
                            for shortcut in group.shortcuts.iter() {
                                div {
                                    key: "{shortcut.keys}",
                                    style: "display: flex; justify-content: space-between; gap: 12px; padding: 2px 0;",
                                    span { style: "font-family: monospace; background: rgba(255, 255, 255, 0.15); padding: 0 6px; border-radius: 4px;", "{shortcut.keys}" }
                                    span { "{shortcut.description}" }
                                }
                            }
                        }
                    }
                    div { style: "display: flex; flex-direction: column; gap: 8px; border-top: 1px solid rgba(255, 255, 255, 0.2); padding-top: 12px;",
                        LightboxButton {
                            controller,
                            dom_id: "gallery-lightbox-auto-slideshow",
                            order: 12,
                            label: auto_slideshow_label.clone(),
                            pressed: preferences.auto_slideshow,
                            style: PANEL_BUTTON_STYLE,
                            onclick: move |_| {
                                let on = state.peek().preferences().auto_slideshow;
                                state.write().update_preference(PreferenceUpdate::AutoSlideshow(!on));
                            },
                            "{auto_slideshow_label}"
                        }
                        LightboxButton {
                            controller,
                            dom_id: "gallery-lightbox-shortcuts",
                            order: 13,
                            label: shortcuts_label.clone(),
                            pressed: preferences.enable_keyboard_shortcuts,
                            style: PANEL_BUTTON_STYLE,
                            onclick: move |_| {
                                let on = state.peek().preferences().enable_keyboard_shortcuts;
                                state.write().update_preference(PreferenceUpdate::EnableKeyboardShortcuts(!on));
                            },
                            "{shortcuts_label}"
                        }
                        LightboxButton {
                            controller,
                            dom_id: "gallery-lightbox-reset-preferences",
                            order: 14,
                            label: "Reset preferences",
                            style: PANEL_BUTTON_STYLE,
                            onclick: move |_| state.write().reset_preferences(),
                            "Reset preferences"
                        }
                    }
                }
            }

            // Screen reader announcements
            div {
                role: "status",
                aria_live: "polite",
                aria_atomic: "true",
                style: "position: absolute; width: 1px; height: 1px; overflow: hidden; clip: rect(0 0 0 0); white-space: nowrap;",
                "{announcement}"
            }
        }
    }
}

/// Lightbox control that takes part in the focus trap
#[component]
fn LightboxButton(
    controller: GalleryController,
    #[props(into)] dom_id: String,
    /// Position in the Tab cycle
    order: u32,
    #[props(into)] label: String,
    #[props(default)] disabled: bool,
    #[props(default)] pressed: Option<bool>,
    #[props(into, default = CONTROL_STYLE.to_string())] style: String,
    onclick: EventHandler<MouseEvent>,
    children: Element,
) -> Element {
    let focus = controller.focus_host();
    let handle = use_hook({
        let focus = focus.clone();
        let dom_id = dom_id.clone();
        move || focus.register(dom_id, FocusScope::Lightbox, order)
    });
    focus.set_enabled(handle, !disabled);
    use_drop({
        let focus = focus.clone();
        move || focus.unregister(handle)
    });

    let on_focus = focus.clone();
    let opacity = if disabled { "0.4" } else { "1" };

    rsx! {
        button {
            id: "{dom_id}",
            aria_label: "{label}",
            aria_pressed: pressed.map(|p| p.to_string()),
            title: "{label}",
            disabled,
            style: "{style} opacity: {opacity};",
            onfocus: move |_| on_focus.focused(handle),
            onblur: move |_| focus.blurred(handle),
            onclick: move |evt: MouseEvent| {
                evt.stop_propagation();
                onclick.call(evt);
            },
            {children}
        }
    }
}

/// Text of a preference toggle in the help panel
fn toggle_label(name: &str, on: bool) -> String {
    format!("{}: {}", name, if on { "on" } else { "off" })
}
