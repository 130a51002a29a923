use dioxus::prelude::*;

/// Catches render errors from the gallery below it
///
/// The fallback offers a Retry button that clears the captured errors and
/// renders the children again.
#[component]
pub fn GalleryErrorBoundary(children: Element) -> Element {
    rsx! {
        ErrorBoundary {
            handle_error: move |errors: ErrorContext| {
                log::error!("Gallery failed to render");
                rsx! {
                    div {
                        role: "alert",
                        style: "padding: 24px; text-align: center; background: #fff5f5; border: 1px solid #f5c2c2; border-radius: 8px; color: #8a1f1f;",
                        h3 { style: "margin: 0 0 8px 0; font-size: 18px;", "Gallery Error" }
                        p {
                            style: "margin: 0 0 16px 0; font-size: 14px;",
                            "Something went wrong while loading the gallery. Please try again."
                        }
                        button {
                            style: "padding: 8px 20px; background: #cc0000; color: white; border: none; border-radius: 8px; font-size: 14px; cursor: pointer;",
                            onclick: move |_| errors.clear_errors(),
                            "Retry"
                        }
                    }
                }
            },
            {children}
        }
    }
}
