//! Gallery state: current image, lightbox, zoom/pan, slideshow and preferences
//!
//! One `GalleryState` exists per active collection. It is plain synchronous
//! state; the view layer owns it (e.g. inside a signal) and calls the
//! operations below from event handlers. Dropping it releases every host
//! resource it acquired.

use crate::host::{FullscreenHost, NoopHost, ScrollLock, ScrollLockGuard};
use crate::models::{
    GalleryAction, GalleryOptions, ImageCollection, ImageSource, PanPosition, PreferenceUpdate,
    Preferences,
};
use crate::preferences::{load_preferences, save_preferences, PreferenceStore};
use std::rc::Rc;
use std::time::Duration;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 5.0;
pub const DEFAULT_ZOOM: f64 = 1.0;
/// Multiplier applied by one zoom-in step (and divisor for zoom-out)
pub const ZOOM_FACTOR: f64 = 1.5;

/// Zoom level, guaranteed to be within `[MIN_ZOOM, MAX_ZOOM]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLevel(f64);

impl ZoomLevel {
    /// Creates a zoom level, clamping to the valid range (NaN maps to native size)
    pub fn new(level: f64) -> Self {
        if level.is_nan() {
            return Self(DEFAULT_ZOOM);
        }
        Self(level.clamp(MIN_ZOOM, MAX_ZOOM))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_native(self) -> bool {
        self.0 == DEFAULT_ZOOM
    }

    pub fn is_min(self) -> bool {
        self.0 <= MIN_ZOOM
    }

    pub fn is_max(self) -> bool {
        self.0 >= MAX_ZOOM
    }

    pub fn zoom_in(self) -> Self {
        Self::new(self.0 * ZOOM_FACTOR)
    }

    pub fn zoom_out(self) -> Self {
        Self::new(self.0 / ZOOM_FACTOR)
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self(DEFAULT_ZOOM)
    }
}

/// Token held by a scheduled slideshow task
///
/// Any change that starts, stops or re-times the slideshow invalidates all
/// tickets handed out before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideshowTicket {
    generation: u64,
}

/// Host capabilities used by the gallery state
#[derive(Clone)]
pub struct GalleryHost {
    pub scroll_lock: Rc<dyn ScrollLock>,
    pub fullscreen: Rc<dyn FullscreenHost>,
}

impl Default for GalleryHost {
    fn default() -> Self {
        let host = Rc::new(NoopHost);
        Self {
            scroll_lock: host.clone(),
            fullscreen: host,
        }
    }
}

struct PreferencePersistence {
    store: Rc<dyn PreferenceStore>,
    key: String,
}

pub struct GalleryState {
    collection: ImageCollection,
    current_index: usize,
    is_lightbox_open: bool,
    is_slideshow: bool,
    zoom: ZoomLevel,
    pan: PanPosition,
    is_fullscreen: bool,
    preferences: Preferences,
    default_preferences: Preferences,
    persistence: Option<PreferencePersistence>,
    host: GalleryHost,
    scroll_guard: Option<ScrollLockGuard>,
    slideshow_generation: u64,
}

/// Keeps the preferred zoom inside the zoom range
fn clamp_preferences(mut preferences: Preferences) -> Preferences {
    preferences.default_zoom = ZoomLevel::new(preferences.default_zoom).value();
    preferences
}

impl GalleryState {
    /// Creates the state for `collection`, loading persisted preferences if enabled
    pub fn new(
        collection: ImageCollection,
        options: &GalleryOptions,
        store: Option<Rc<dyn PreferenceStore>>,
        host: GalleryHost,
    ) -> Self {
        let default_preferences = clamp_preferences(options.default_preferences());

        let persistence = if options.enable_persistence {
            store.map(|store| PreferencePersistence {
                store,
                key: options.storage_key_for(&collection),
            })
        } else {
            None
        };

        let preferences = match &persistence {
            Some(p) => clamp_preferences(load_preferences(p.store.as_ref(), &p.key, &default_preferences)),
            None => default_preferences.clone(),
        };

        log::debug!(
            "Gallery state for {:?} created with {} images",
            collection.name(),
            collection.len()
        );

        Self {
            collection,
            current_index: 0,
            is_lightbox_open: false,
            is_slideshow: false,
            zoom: ZoomLevel::default(),
            pan: PanPosition::ORIGIN,
            is_fullscreen: false,
            preferences,
            default_preferences,
            persistence,
            host,
            scroll_guard: None,
            slideshow_generation: 0,
        }
    }

    // --- accessors ---

    pub fn collection(&self) -> &ImageCollection {
        &self.collection
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_image(&self) -> Option<&ImageSource> {
        self.collection.get(self.current_index)
    }

    pub fn is_lightbox_open(&self) -> bool {
        self.is_lightbox_open
    }

    pub fn is_slideshow(&self) -> bool {
        self.is_slideshow
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom.value()
    }

    pub fn pan_position(&self) -> PanPosition {
        self.pan
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn has_images(&self) -> bool {
        !self.collection.is_empty()
    }

    pub fn is_first_image(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_last_image(&self) -> bool {
        self.has_images() && self.current_index == self.collection.len() - 1
    }

    pub fn can_zoom_in(&self) -> bool {
        !self.zoom.is_max()
    }

    pub fn can_zoom_out(&self) -> bool {
        !self.zoom.is_min()
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_guard.is_some()
    }

    // --- navigation ---

    /// Jumps to `index`; out-of-range indices are ignored
    pub fn go_to_image(&mut self, index: usize) {
        if index >= self.collection.len() {
            return;
        }
        self.current_index = index;
        self.reset_zoom();
    }

    pub fn go_to_previous(&mut self) {
        let len = self.collection.len();
        if len == 0 {
            return;
        }
        let index = if self.current_index > 0 {
            self.current_index - 1
        } else {
            len - 1
        };
        self.go_to_image(index);
    }

    pub fn go_to_next(&mut self) {
        let len = self.collection.len();
        if len == 0 {
            return;
        }
        let index = if self.current_index + 1 < len {
            self.current_index + 1
        } else {
            0
        };
        self.go_to_image(index);
    }

    pub fn go_to_first(&mut self) {
        self.go_to_image(0);
    }

    pub fn go_to_last(&mut self) {
        if let Some(last) = self.collection.len().checked_sub(1) {
            self.go_to_image(last);
        }
    }

    // --- lightbox ---

    /// Opens the lightbox at `index` (or the current image)
    pub fn open_lightbox(&mut self, index: Option<usize>) {
        if !self.has_images() {
            return;
        }
        self.go_to_image(index.unwrap_or(self.current_index));
        if !self.is_lightbox_open {
            self.is_lightbox_open = true;
            self.slideshow_generation += 1;
            if self.preferences.auto_slideshow {
                self.is_slideshow = true;
            }
        }
        if self.scroll_guard.is_none() {
            self.scroll_guard = Some(ScrollLockGuard::acquire(self.host.scroll_lock.clone()));
        }
        log::debug!("Lightbox opened at {}", self.current_index);
    }

    pub fn close_lightbox(&mut self) {
        self.is_lightbox_open = false;
        self.is_slideshow = false;
        self.slideshow_generation += 1;
        self.reset_zoom();
        self.scroll_guard = None;
    }

    // --- slideshow ---

    pub fn toggle_slideshow(&mut self) {
        self.is_slideshow = !self.is_slideshow;
        self.slideshow_generation += 1;
    }

    pub fn start_slideshow(&mut self) {
        if !self.is_slideshow {
            self.is_slideshow = true;
            self.slideshow_generation += 1;
        }
    }

    pub fn stop_slideshow(&mut self) {
        if self.is_slideshow {
            self.is_slideshow = false;
            self.slideshow_generation += 1;
        }
    }

    /// True while the periodic advance should run
    pub fn is_slideshow_active(&self) -> bool {
        self.is_slideshow && self.is_lightbox_open
    }

    pub fn slideshow_interval(&self) -> Duration {
        Duration::from_millis(self.preferences.slideshow_interval.max(1))
    }

    /// Ticket for a timer task, only handed out while the slideshow is active
    pub fn slideshow_ticket(&self) -> Option<SlideshowTicket> {
        self.is_slideshow_active().then_some(SlideshowTicket {
            generation: self.slideshow_generation,
        })
    }

    /// Advances to the next image if `ticket` is still current
    ///
    /// Both flags are checked again here, so a lightbox closed between the
    /// timer being scheduled and firing never advances.
    pub fn advance_slideshow(&mut self, ticket: SlideshowTicket) -> bool {
        if ticket.generation != self.slideshow_generation || !self.is_slideshow_active() {
            return false;
        }
        self.go_to_next();
        true
    }

    // --- zoom & pan ---

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom.zoom_in().value());
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom.zoom_out().value());
    }

    pub fn set_zoom(&mut self, level: f64) {
        self.zoom = ZoomLevel::new(level);
        if self.zoom.is_native() {
            self.pan = PanPosition::ORIGIN;
        }
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = ZoomLevel::default();
        self.pan = PanPosition::ORIGIN;
    }

    /// Moves the zoomed image; ignored at or below native size
    pub fn update_pan_position(&mut self, dx: f64, dy: f64) {
        if self.zoom.value() <= DEFAULT_ZOOM {
            return;
        }
        self.pan.x += dx;
        self.pan.y += dy;
    }

    pub fn reset_pan(&mut self) {
        self.pan = PanPosition::ORIGIN;
    }

    // --- fullscreen ---

    /// Requests or exits fullscreen; failures are logged and otherwise ignored
    ///
    /// With a host that reports asynchronously the flag only changes once the
    /// host confirms through [`GalleryState::sync_fullscreen`].
    pub fn toggle_fullscreen(&mut self) {
        let currently = self.host.fullscreen.is_fullscreen();
        let result = if currently {
            self.host.fullscreen.exit_fullscreen()
        } else {
            self.host.fullscreen.request_fullscreen()
        };

        match result {
            Ok(()) if self.host.fullscreen.reports_asynchronously() => {
                log::debug!("Fullscreen change requested, waiting for the host")
            }
            Ok(()) => self.is_fullscreen = !currently,
            Err(e) => log::warn!("Fullscreen not supported or failed: {}", e),
        }
    }

    /// Mirrors a fullscreen change made outside the gallery (e.g. the browser's Esc)
    pub fn sync_fullscreen(&mut self, is_fullscreen: bool) {
        self.is_fullscreen = is_fullscreen;
    }

    // --- preferences ---

    pub fn update_preference(&mut self, update: PreferenceUpdate) {
        self.preferences.apply(update);
        self.preferences.default_zoom = ZoomLevel::new(self.preferences.default_zoom).value();
        if matches!(update, PreferenceUpdate::SlideshowInterval(_)) {
            self.slideshow_generation += 1;
        }
        self.persist_preferences();
    }

    pub fn reset_preferences(&mut self) {
        self.preferences = self.default_preferences.clone();
        self.slideshow_generation += 1;
        self.persist_preferences();
    }

    fn persist_preferences(&self) {
        if let Some(p) = &self.persistence {
            save_preferences(p.store.as_ref(), &p.key, &self.preferences);
        }
    }

    // --- dispatch ---

    pub fn apply(&mut self, action: GalleryAction) {
        match action {
            GalleryAction::Previous => self.go_to_previous(),
            GalleryAction::Next => self.go_to_next(),
            GalleryAction::First => self.go_to_first(),
            GalleryAction::Last => self.go_to_last(),
            GalleryAction::Close => self.close_lightbox(),
            GalleryAction::ToggleSlideshow => self.toggle_slideshow(),
            GalleryAction::ZoomIn => self.zoom_in(),
            GalleryAction::ZoomOut => self.zoom_out(),
            GalleryAction::ToggleFullscreen => self.toggle_fullscreen(),
        }
    }
}

impl std::fmt::Debug for GalleryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryState")
            .field("collection", &self.collection.name())
            .field("current_index", &self.current_index)
            .field("is_lightbox_open", &self.is_lightbox_open)
            .field("is_slideshow", &self.is_slideshow)
            .field("zoom", &self.zoom)
            .field("pan", &self.pan)
            .finish_non_exhaustive()
    }
}
