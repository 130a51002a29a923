use dioxus::prelude::*;
use photo_gallery::metadata::LOAD_FAILED;

/// Shown in place of an image that failed to load
#[component]
pub fn ImageErrorFallback(
    /// Filename of the failed image
    filename: String,
    on_retry: EventHandler<()>,
    /// Dark variant for the lightbox
    #[props(default)]
    dark: bool,
) -> Element {
    let (background, color) = if dark {
        ("rgba(255, 255, 255, 0.08)", "#eee")
    } else {
        ("#f5f5f5", "#666")
    };

    rsx! {
        div {
            role: "alert",
            style: "width: 100%; height: 100%; min-height: 120px; display: flex; flex-direction: column; align-items: center; justify-content: center; gap: 8px; padding: 12px; box-sizing: border-box; background: {background}; color: {color}; border-radius: 8px; text-align: center;",
            div { style: "font-size: 28px;", "📷" }
            div { style: "font-size: 14px; font-weight: 600;", "{LOAD_FAILED}" }
            div {
                style: "font-size: 12px; opacity: 0.8; word-break: break-all;",
                "{filename}"
            }
            button {
                style: "padding: 6px 16px; background: #0066cc; color: white; border: none; border-radius: 6px; font-size: 13px; cursor: pointer;",
                onclick: move |evt: MouseEvent| {
                    evt.stop_propagation();
                    on_retry.call(());
                },
                "Retry"
            }
        }
    }
}

#[component]
pub fn LoadingSpinner(#[props(into, default = "Loading...".to_string())] label: String) -> Element {
    rsx! {
        div {
            role: "status",
            aria_label: "{label}",
            style: "width: 100%; height: 100%; min-height: 80px; display: flex; align-items: center; justify-content: center; color: #999; font-size: 24px;",
            "⏳"
        }
    }
}
