//! Host capabilities backed by the webview DOM
//!
//! Everything here reaches the page through `document::eval`. State the core
//! needs synchronously (fullscreen, focus) is mirrored on the Rust side and
//! kept up to date by DOM events; fullscreen requests only report failures.

use dioxus::prelude::*;
use photo_gallery::{FocusHandle, FocusHost, FullscreenHost, GalleryHost, HostError, LocalTask, ScrollLock, Spawner};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// DOM id of the lightbox container
pub const LIGHTBOX_ID: &str = "gallery-lightbox";

/// Script that reports every fullscreen change back to Rust
pub const FULLSCREEN_LISTENER: &str = r#"
document.addEventListener("fullscreenchange", () => {
    dioxus.send(document.fullscreenElement !== null);
});
await new Promise(() => {});
"#;

/// Resolves to an empty string on success, otherwise to the reason it failed
const REQUEST_FULLSCREEN: &str = r#"
const lightbox = document.getElementById("gallery-lightbox");
if (!lightbox || !lightbox.requestFullscreen) {
    return "fullscreen is not available";
}
try {
    await lightbox.requestFullscreen();
    return "";
} catch (e) {
    return String(e);
}
"#;

const EXIT_FULLSCREEN: &str = r#"
if (!document.fullscreenElement) {
    return "";
}
try {
    await document.exitFullscreen();
    return "";
} catch (e) {
    return String(e);
}
"#;

fn run_script(script: String) {
    document::eval(&script);
}

/// Runs a fullscreen script and logs the reason if the page refused
fn run_fullscreen_script(script: &'static str, action: &'static str) {
    DioxusSpawner.spawn_local(Box::pin(async move {
        match document::eval(script).join::<String>().await {
            Ok(reason) if reason.is_empty() => log::debug!("Fullscreen {} done", action),
            Ok(reason) => log::warn!("Fullscreen {} failed: {}", action, reason),
            Err(e) => log::warn!("Fullscreen {} failed: {:?}", action, e),
        }
    }));
}

/// Scroll lock and fullscreen for the page the gallery lives in
#[derive(Debug, Default)]
pub struct DomHost {
    fullscreen: Cell<bool>,
}

impl DomHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capabilities handed to a `GalleryState`
    pub fn gallery_host(self: &Rc<Self>) -> GalleryHost {
        GalleryHost {
            scroll_lock: self.clone(),
            fullscreen: self.clone(),
        }
    }

    /// Called from the fullscreen listener
    pub fn set_fullscreen(&self, on: bool) {
        self.fullscreen.set(on);
    }
}

impl ScrollLock for DomHost {
    fn lock_scroll(&self) {
        run_script("document.body.style.overflow = 'hidden';".to_string());
    }

    fn unlock_scroll(&self) {
        run_script("document.body.style.overflow = '';".to_string());
    }
}

impl FullscreenHost for DomHost {
    fn is_fullscreen(&self) -> bool {
        self.fullscreen.get()
    }

    fn request_fullscreen(&self) -> Result<(), HostError> {
        run_fullscreen_script(REQUEST_FULLSCREEN, "request");
        Ok(())
    }

    fn exit_fullscreen(&self) -> Result<(), HostError> {
        run_fullscreen_script(EXIT_FULLSCREEN, "exit");
        Ok(())
    }

    /// The `fullscreenchange` listener reports the outcome
    fn reports_asynchronously(&self) -> bool {
        true
    }
}

/// Runs gallery tasks on the Dioxus scheduler
///
/// Tasks outlive the component that started them; the loader only holds
/// weak references, so work for a torn-down gallery finishes as a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct DioxusSpawner;

impl Spawner for DioxusSpawner {
    fn spawn_local(&self, task: LocalTask) {
        if dioxus::core::Runtime::try_current().is_none() {
            log::warn!("No Dioxus runtime, gallery task dropped");
        } else {
            dioxus::core::spawn_forever(task);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusScope {
    /// Controls inside the lightbox; Tab cycles through these
    Lightbox,
    /// Anything else that may need its focus restored (thumbnails)
    Page,
}

#[derive(Debug, Clone)]
struct FocusEntry {
    handle: FocusHandle,
    dom_id: String,
    scope: FocusScope,
    order: u32,
    enabled: bool,
}

/// Bookkeeping of focusable elements, their DOM ids and the focused one
#[derive(Debug, Default)]
pub struct FocusRegistry {
    entries: Vec<FocusEntry>,
    next_handle: u64,
    active: Option<FocusHandle>,
    container: Option<String>,
}

impl FocusRegistry {
    pub fn register(&mut self, dom_id: impl Into<String>, scope: FocusScope, order: u32) -> FocusHandle {
        self.next_handle += 1;
        let handle = FocusHandle(self.next_handle);
        self.entries.push(FocusEntry {
            handle,
            dom_id: dom_id.into(),
            scope,
            order,
            enabled: true,
        });
        handle
    }

    pub fn unregister(&mut self, handle: FocusHandle) {
        self.entries.retain(|e| e.handle != handle);
        if self.active == Some(handle) {
            self.active = None;
        }
    }

    pub fn set_enabled(&mut self, handle: FocusHandle, enabled: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.handle == handle) {
            entry.enabled = enabled;
        }
    }

    pub fn focused(&mut self, handle: FocusHandle) {
        self.active = Some(handle);
    }

    pub fn blurred(&mut self, handle: FocusHandle) {
        if self.active == Some(handle) {
            self.active = None;
        }
    }

    pub fn active(&self) -> Option<FocusHandle> {
        self.active
    }

    pub fn contains(&self, handle: FocusHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn dom_id(&self, handle: FocusHandle) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.handle == handle)
            .map(|e| e.dom_id.as_str())
    }

    pub fn set_container(&mut self, dom_id: Option<String>) {
        self.container = dom_id;
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    /// Enabled lightbox controls in tab order
    pub fn lightbox_elements(&self) -> Vec<FocusHandle> {
        self.elements_in(FocusScope::Lightbox)
    }

    /// Lightbox controls while any are registered, page elements otherwise
    pub fn focusable_elements(&self) -> Vec<FocusHandle> {
        let lightbox = self.lightbox_elements();
        if lightbox.is_empty() {
            self.elements_in(FocusScope::Page)
        } else {
            lightbox
        }
    }

    fn elements_in(&self, scope: FocusScope) -> Vec<FocusHandle> {
        let mut entries: Vec<&FocusEntry> = self
            .entries
            .iter()
            .filter(|e| e.scope == scope && e.enabled)
            .collect();
        entries.sort_by_key(|e| e.order);
        entries.into_iter().map(|e| e.handle).collect()
    }
}

/// `FocusHost` over a [`FocusRegistry`], moving DOM focus by element id
#[derive(Debug, Default)]
pub struct DomFocus {
    registry: RefCell<FocusRegistry>,
}

impl DomFocus {
    pub fn register(&self, dom_id: impl Into<String>, scope: FocusScope, order: u32) -> FocusHandle {
        self.registry.borrow_mut().register(dom_id, scope, order)
    }

    pub fn unregister(&self, handle: FocusHandle) {
        self.registry.borrow_mut().unregister(handle);
    }

    pub fn set_enabled(&self, handle: FocusHandle, enabled: bool) {
        self.registry.borrow_mut().set_enabled(handle, enabled);
    }

    pub fn focused(&self, handle: FocusHandle) {
        self.registry.borrow_mut().focused(handle);
    }

    pub fn blurred(&self, handle: FocusHandle) {
        self.registry.borrow_mut().blurred(handle);
    }

    pub fn set_container(&self, dom_id: Option<String>) {
        self.registry.borrow_mut().set_container(dom_id);
    }
}

impl FocusHost for DomFocus {
    fn focusable_elements(&self) -> Vec<FocusHandle> {
        self.registry.borrow().focusable_elements()
    }

    fn active_element(&self) -> Option<FocusHandle> {
        self.registry.borrow().active()
    }

    fn focus(&self, handle: FocusHandle) {
        let mut registry = self.registry.borrow_mut();
        let Some(id) = registry.dom_id(handle).map(str::to_string) else {
            return;
        };
        registry.focused(handle);
        run_script(format!("document.getElementById({:?})?.focus();", id));
    }

    fn contains(&self, handle: FocusHandle) -> bool {
        self.registry.borrow().contains(handle)
    }

    fn activate(&self, handle: FocusHandle) {
        if let Some(id) = self.registry.borrow().dom_id(handle) {
            run_script(format!("document.getElementById({:?})?.click();", id));
        }
    }

    fn focus_container(&self) -> bool {
        let Some(id) = self.registry.borrow().container().map(str::to_string) else {
            return false;
        };
        run_script(format!("document.getElementById({:?})?.focus();", id));
        true
    }
}
