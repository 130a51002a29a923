//! # Photo Gallery
//!
//! Headless core of a photo gallery with a lightbox viewer.
//!
//! This crate provides the UI-independent gallery logic:
//! - Lightbox state: navigation, zoom/pan, slideshow, fullscreen
//! - Lazy image loading with a bounded cache and neighbour preloading
//! - Keyboard navigation with focus trapping and screen-reader announcements
//! - Image metadata extraction (dimensions, capture date from filename)
//! - Per-collection preferences persisted in SQLite
//!
//! ## Host Separation
//!
//! Nothing here touches a DOM. Scroll locking, fullscreen, focus, visibility
//! detection and task spawning are capability traits implemented by the view
//! layer (see the `dioxus-gallery` crate) and handed in at construction.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use photo_gallery::{GalleryHost, GalleryOptions, GalleryState, ImageCollection};
//!
//! let collection = ImageCollection::new("marathon", ["a.jpg", "b.jpg"]);
//! let mut state = GalleryState::new(collection, &GalleryOptions::default(), None, GalleryHost::default());
//!
//! state.open_lightbox(Some(1));
//! state.zoom_in();
//! state.go_to_next();
//! assert_eq!(state.current_index(), 0);
//! ```

pub mod batch;
pub mod cache;
pub mod fetch;
pub mod host;
pub mod keyboard;
pub mod loader;
pub mod metadata;
pub mod models;
pub mod placeholder;
pub mod preferences;
pub mod schema;
pub mod slideshow;
pub mod spawn;
pub mod state;
pub mod visibility;

pub use batch::{extract_collection, retry_all, FetchingExtractor, MetadataExtractor, RetryPolicy};
pub use cache::{CacheStats, ImageCache, LoadedImage};
pub use fetch::{ImageFetcher, LoadError, SourceFetcher};
pub use host::{FullscreenHost, HostError, NoopHost, ScrollLock, ScrollLockGuard};
pub use keyboard::{
    keyboard_shortcuts, AnnouncementToken, FocusHandle, FocusHost, Key, KeyInput, KeyOutcome,
    KeyboardNavigator, ANNOUNCEMENT_TIMEOUT,
};
pub use loader::ImageLoader;
pub use metadata::{
    alt_text, extract_image_metadata, format_capture_date, infer_capture_date, Dimensions,
    ImageMetadata, MetadataError,
};
pub use models::{
    GalleryAction, GalleryOptions, ImageCollection, ImageSource, LoadState, PanPosition,
    PreferenceUpdate, Preferences,
};
pub use placeholder::{placeholder_data_url, placeholder_sources};
pub use preferences::{
    MemoryPreferenceStore, PreferenceStore, SqlitePreferenceStore, StoreError,
};
pub use schema::init_preference_schema;
pub use slideshow::{run_slideshow, SlideshowTarget};
pub use spawn::{LocalTask, Spawner, TokioLocalSpawner};
pub use state::{GalleryHost, GalleryState, SlideshowTicket, MAX_ZOOM, MIN_ZOOM};
pub use visibility::{ElementHandle, Rect, UnsupportedObserver, ViewportTracker, VisibilityObserver};
