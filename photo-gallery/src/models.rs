use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier of a single image: an http(s) URL, a `data:` URL or a local path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageSource(String);

impl ImageSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trailing path segment without the query string
    ///
    /// Embedded `data:` sources have no meaningful path, so they are reported
    /// by their media type instead of leaking the whole payload.
    pub fn filename(&self) -> String {
        if let Some(rest) = self.0.strip_prefix("data:") {
            let media_type = rest.split([';', ',']).next().unwrap_or_default();
            return format!("embedded-{}", media_type.replace('/', "-"));
        }
        let without_query = self.0.split(['?', '#']).next().unwrap_or_default();
        without_query
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(without_query)
            .to_string()
    }

    pub fn is_data_url(&self) -> bool {
        self.0.starts_with("data:")
    }

    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageSource {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ImageSource {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A named, ordered set of images shown together
///
/// The image list is immutable for the lifetime of the collection. Switching
/// to another album means building a new collection (and with it a new
/// gallery state and loader).
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCollection {
    name: String,
    sources: Arc<[ImageSource]>,
}

impl ImageCollection {
    pub fn new<I, S>(name: impl Into<String>, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ImageSource>,
    {
        Self {
            name: name.into(),
            sources: sources.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageSource> {
        self.sources.get(index)
    }

    pub fn sources(&self) -> &[ImageSource] {
        &self.sources
    }

    /// Key under which this collection's preferences are persisted
    pub fn storage_key(&self) -> String {
        format!("{}-gallery-preferences", self.name)
    }
}

/// Load state of one image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Pending,
    Loading,
    Loaded,
    Error,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Pending => "pending",
            LoadState::Loading => "loading",
            LoadState::Loaded => "loaded",
            LoadState::Error => "error",
        }
    }
}

/// Offset of a zoomed image inside the lightbox, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PanPosition {
    pub x: f64,
    pub y: f64,
}

impl PanPosition {
    pub const ORIGIN: PanPosition = PanPosition { x: 0.0, y: 0.0 };
}

/// Commands the keyboard layer (or any other input) can dispatch into the gallery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryAction {
    Previous,
    Next,
    First,
    Last,
    Close,
    ToggleSlideshow,
    ZoomIn,
    ZoomOut,
    ToggleFullscreen,
}

/// User preferences, persisted per collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Slideshow advance interval in milliseconds
    pub slideshow_interval: u64,
    /// Zoom level offered by the "preferred zoom" control
    pub default_zoom: f64,
    pub auto_slideshow: bool,
    pub show_metadata: bool,
    pub enable_keyboard_shortcuts: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            slideshow_interval: 3000,
            default_zoom: 1.0,
            auto_slideshow: false,
            show_metadata: true,
            enable_keyboard_shortcuts: true,
        }
    }
}

/// A single preference change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreferenceUpdate {
    SlideshowInterval(u64),
    DefaultZoom(f64),
    AutoSlideshow(bool),
    ShowMetadata(bool),
    EnableKeyboardShortcuts(bool),
}

impl Preferences {
    pub fn apply(&mut self, update: PreferenceUpdate) {
        match update {
            PreferenceUpdate::SlideshowInterval(ms) => self.slideshow_interval = ms.max(1),
            PreferenceUpdate::DefaultZoom(level) => self.default_zoom = level,
            PreferenceUpdate::AutoSlideshow(on) => self.auto_slideshow = on,
            PreferenceUpdate::ShowMetadata(on) => self.show_metadata = on,
            PreferenceUpdate::EnableKeyboardShortcuts(on) => self.enable_keyboard_shortcuts = on,
        }
    }
}

/// Configuration bundle supplied by the caller for one gallery instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryOptions {
    pub enable_persistence: bool,
    /// Overrides the collection's default storage key
    pub storage_key: Option<String>,
    /// CSS-length-like look-ahead around the viewport, e.g. `"200px"`
    pub root_margin: String,
    /// Fraction of an element that must be inside the margin box to count as visible
    pub threshold: f64,
    pub enable_preloading: bool,
    pub cache_size: usize,
    pub slideshow_interval_ms: u64,
    pub default_zoom: f64,
    pub show_metadata: bool,
    pub enable_keyboard_shortcuts: bool,
}

impl Default for GalleryOptions {
    fn default() -> Self {
        let preferences = Preferences::default();
        Self {
            enable_persistence: true,
            storage_key: None,
            root_margin: "200px".to_string(),
            threshold: 0.1,
            enable_preloading: true,
            cache_size: 50,
            slideshow_interval_ms: preferences.slideshow_interval,
            default_zoom: preferences.default_zoom,
            show_metadata: preferences.show_metadata,
            enable_keyboard_shortcuts: preferences.enable_keyboard_shortcuts,
        }
    }
}

impl GalleryOptions {
    /// Preferences used when nothing (or only part) is stored
    pub fn default_preferences(&self) -> Preferences {
        Preferences {
            slideshow_interval: self.slideshow_interval_ms.max(1),
            default_zoom: self.default_zoom,
            auto_slideshow: false,
            show_metadata: self.show_metadata,
            enable_keyboard_shortcuts: self.enable_keyboard_shortcuts,
        }
    }

    pub fn storage_key_for(&self, collection: &ImageCollection) -> String {
        self.storage_key
            .clone()
            .unwrap_or_else(|| collection.storage_key())
    }

    /// Root margin in pixels, falling back to 200px for values we cannot read
    pub fn root_margin_px(&self) -> f64 {
        parse_root_margin(&self.root_margin).unwrap_or_else(|| {
            log::warn!(
                "Unsupported root margin {:?}, using 200px",
                self.root_margin
            );
            200.0
        })
    }
}

/// Parses a single CSS length such as `"200px"`, `"0"` or `"150.5px"`
pub fn parse_root_margin(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    let px: f64 = number.parse().ok()?;
    px.is_finite().then_some(px)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_strips_path_and_query() {
        let src = ImageSource::new("/assets/marathon/IMG_0042.jpg?v=3");
        assert_eq!(src.filename(), "IMG_0042.jpg");

        let src = ImageSource::new("https://cdn.example.com/a/b/photo.webp#top");
        assert_eq!(src.filename(), "photo.webp");

        let src = ImageSource::new("plain.png");
        assert_eq!(src.filename(), "plain.png");
    }

    #[test]
    fn test_filename_of_data_url() {
        let src = ImageSource::new("data:image/svg+xml;base64,PHN2Zz4=");
        assert_eq!(src.filename(), "embedded-image-svg+xml");
        assert!(src.is_data_url());
    }

    #[test]
    fn test_collection_storage_key() {
        let collection = ImageCollection::new("srm", ["a.jpg", "b.jpg"]);
        assert_eq!(collection.storage_key(), "srm-gallery-preferences");
        assert_eq!(collection.len(), 2);

        let options = GalleryOptions {
            storage_key: Some("custom".to_string()),
            ..GalleryOptions::default()
        };
        assert_eq!(options.storage_key_for(&collection), "custom");
    }

    #[test]
    fn test_parse_root_margin() {
        assert_eq!(parse_root_margin("200px"), Some(200.0));
        assert_eq!(parse_root_margin(" 0 "), Some(0.0));
        assert_eq!(parse_root_margin("12.5px"), Some(12.5));
        assert_eq!(parse_root_margin("10%"), None);
        assert_eq!(parse_root_margin(""), None);
    }

    #[test]
    fn test_preferences_serialize_camel_case() {
        let json = serde_json::to_value(Preferences::default()).unwrap();
        assert_eq!(json["slideshowInterval"], 3000);
        assert_eq!(json["showMetadata"], true);
        assert_eq!(json["enableKeyboardShortcuts"], true);
    }
}
