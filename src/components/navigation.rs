use crate::Screen;
use dioxus::prelude::*;

const ACTIVE_STYLE: &str = "flex: 1; padding: 12px; margin: 0 5px; border: none; border-radius: 8px; cursor: pointer; font-size: 14px; text-align: center; background: #0066cc; color: #ffffff;";
const INACTIVE_STYLE: &str = "flex: 1; padding: 12px; margin: 0 5px; border: none; border-radius: 8px; cursor: pointer; font-size: 14px; text-align: center; background: #ffffff; color: #333;";

/// Bottom bar: the overview plus one button per collection
#[component]
pub fn NavigationBar(
    current_screen: Screen,
    /// `(name, title)` of every collection
    collections: Vec<(String, String)>,
    on_navigate: EventHandler<Screen>,
) -> Element {
    let nav_style = "display: flex; justify-content: space-around; padding: 10px; background: #f0f0f0; border-top: 1px solid #ddd; overflow-x: auto;";

    rsx! {
        div {
            style: "{nav_style}",

            button {
                style: if matches!(current_screen, Screen::Collections) { ACTIVE_STYLE } else { INACTIVE_STYLE },
                onclick: move |_| on_navigate.call(Screen::Collections),
                "🏠 Home"
            }

            for (name, title) in collections {
                button {
                    key: "{name}",
                    style: if current_screen == Screen::Collection(name.clone()) { ACTIVE_STYLE } else { INACTIVE_STYLE },
                    onclick: {
                        let name = name.clone();
                        move |_| on_navigate.call(Screen::Collection(name.clone()))
                    },
                    "{title}"
                }
            }
        }
    }
}
