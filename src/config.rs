//! `gallery.toml`: gallery options and the list of collections
//!
//! ```toml
//! [gallery]
//! cache_size = 50
//! slideshow_interval_ms = 4000
//!
//! [[collections]]
//! name = "marathon"
//! title = "Marathon"
//! directory = "photos/marathon"
//! placeholder_count = 5
//! ```

use crate::error::AppError;
use crate::filesystem;
use photo_gallery::{placeholder_sources, GalleryOptions, ImageCollection, ImageSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "gallery.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gallery: GalleryOptions,
    pub collections: Vec<CollectionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Directory scanned for images, relative to the data directory
    ///
    /// Defaults to `photos/<name>`.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Explicit image list; when set, no directory is scanned
    #[serde(default)]
    pub images: Vec<String>,
    /// Generated stand-ins shown while the collection has no images
    #[serde(default)]
    pub placeholder_count: usize,
}

/// A configured collection together with its images
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCollection {
    pub config: CollectionConfig,
    pub images: ImageCollection,
}

impl CollectionConfig {
    fn new(name: &str, title: &str, description: &str, directory: &str, placeholder_count: usize) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            directory: Some(PathBuf::from(directory)),
            images: Vec::new(),
            placeholder_count,
        }
    }

    pub fn directory(&self, data_dir: &Path) -> PathBuf {
        let relative = self
            .directory
            .clone()
            .unwrap_or_else(|| Path::new("photos").join(&self.name));
        data_dir.join(relative)
    }

    /// Builds the image collection, falling back to placeholders when empty
    pub fn resolve(&self, data_dir: &Path) -> ImageCollection {
        let mut sources: Vec<ImageSource> = if self.images.is_empty() {
            let dir = self.directory(data_dir);
            match filesystem::list_images(&dir) {
                // Sources stay relative to the data directory the fetcher reads from
                Ok(paths) => paths
                    .iter()
                    .map(|p| {
                        let relative = p.strip_prefix(data_dir).unwrap_or(p);
                        ImageSource::new(relative.to_string_lossy().into_owned())
                    })
                    .collect(),
                Err(e) => {
                    log::warn!("Cannot scan {}: {}", dir.display(), e);
                    Vec::new()
                }
            }
        } else {
            self.images.iter().map(|s| ImageSource::new(s.as_str())).collect()
        };

        if sources.is_empty() {
            log::info!(
                "Collection {:?} has no images, using {} placeholders",
                self.name,
                self.placeholder_count
            );
            sources = placeholder_sources(self.placeholder_count);
        }

        ImageCollection::new(self.name.clone(), sources)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gallery: GalleryOptions::default(),
            collections: vec![
                CollectionConfig::new(
                    "marathon",
                    "Marathon",
                    "Chennai Runners Marathon, 10 km from Napier Bridge to CPT Ground.",
                    "photos/marathon",
                    5,
                ),
                CollectionConfig::new(
                    "srm",
                    "SRM College",
                    "Continuous learning at SRM College.",
                    "photos/SRM College lecturer",
                    2,
                ),
                CollectionConfig::new(
                    "poultry",
                    "Poultry Visit",
                    "Field test of an AI-integrated farming rover at a poultry farm in Namakkal.",
                    "photos/Poultry Visit",
                    4,
                ),
            ],
        }
    }
}

impl AppConfig {
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let config: AppConfig = toml::from_str(text)?;
        if let Some(duplicate) = config
            .collections
            .iter()
            .enumerate()
            .find(|(i, c)| config.collections[..*i].iter().any(|o| o.name == c.name))
        {
            return Err(AppError::Config(format!(
                "collection {:?} is defined twice",
                duplicate.1.name
            )));
        }
        Ok(config)
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn resolve_all(&self, data_dir: &Path) -> Vec<ResolvedCollection> {
        self.collections
            .iter()
            .map(|config| ResolvedCollection {
                config: config.clone(),
                images: config.resolve(data_dir),
            })
            .collect()
    }
}

/// Reads `gallery.toml` from `data_dir`
///
/// A missing file yields the defaults; an invalid one is logged and the
/// defaults are used as well.
pub fn load_config(data_dir: &Path) -> AppConfig {
    let path = data_dir.join(CONFIG_FILE);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No {} found, using built-in collections", path.display());
            return AppConfig::default();
        }
        Err(e) => {
            log::warn!("Cannot read {}: {}", path.display(), AppError::from(e));
            return AppConfig::default();
        }
    };

    match AppConfig::parse(&text) {
        Ok(config) => {
            log::info!(
                "Loaded {} with {} collections",
                path.display(),
                config.collections.len()
            );
            config
        }
        Err(e) => {
            log::warn!("Invalid {}: {}", path.display(), e);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        let names: Vec<&str> = config.collections.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["marathon", "srm", "poultry"]);
        assert_eq!(config.gallery, GalleryOptions::default());
        assert_eq!(config.collection("srm").unwrap().placeholder_count, 2);
    }

    #[test]
    fn test_parse_partial_gallery_section() {
        let config = AppConfig::parse(
            r#"
            [gallery]
            cache_size = 10
            root_margin = "100px"

            [[collections]]
            name = "trip"
            title = "Road Trip"
            images = ["https://example.com/1.jpg", "https://example.com/2.jpg"]
            "#,
        )
        .unwrap();

        assert_eq!(config.gallery.cache_size, 10);
        assert_eq!(config.gallery.root_margin, "100px");
        assert_eq!(config.gallery.threshold, 0.1);
        assert!(config.gallery.enable_preloading);
        assert_eq!(config.collections.len(), 1);
        assert_eq!(config.collections[0].images.len(), 2);
        assert_eq!(config.collections[0].placeholder_count, 0);
    }

    #[test]
    fn test_parse_rejects_duplicate_names() {
        let result = AppConfig::parse(
            r#"
            [[collections]]
            name = "a"
            title = "A"

            [[collections]]
            name = "a"
            title = "Again"
            "#,
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(dir.path()), AppConfig::default());

        std::fs::write(dir.path().join(CONFIG_FILE), "[[collections]\nname =").unwrap();
        assert_eq!(load_config(dir.path()), AppConfig::default());
    }

    #[test]
    fn test_resolve_scans_directory() {
        let dir = tempfile::tempdir().unwrap();
        let photos = dir.path().join("photos").join("trip");
        std::fs::create_dir_all(&photos).unwrap();
        std::fs::write(photos.join("b.jpg"), b"x").unwrap();
        std::fs::write(photos.join("a.png"), b"x").unwrap();

        let config = CollectionConfig {
            name: "trip".to_string(),
            title: "Trip".to_string(),
            description: String::new(),
            directory: None,
            images: Vec::new(),
            placeholder_count: 3,
        };
        let collection = config.resolve(dir.path());

        assert_eq!(collection.name(), "trip");
        let files: Vec<String> = collection.sources().iter().map(|s| s.filename()).collect();
        assert_eq!(files, vec!["a.png", "b.jpg"]);
        assert_eq!(
            std::path::Path::new(collection.sources()[0].as_str()),
            Path::new("photos").join("trip").join("a.png")
        );
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = AppConfig::default().resolve_all(dir.path());
        let counts: Vec<(&str, usize)> = resolved
            .iter()
            .map(|r| (r.config.name.as_str(), r.images.len()))
            .collect();
        assert_eq!(counts, vec![("marathon", 5), ("srm", 2), ("poultry", 4)]);
    }

    #[test]
    fn test_resolve_uses_placeholders_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default();
        let collection = config.collection("poultry").unwrap().resolve(dir.path());

        assert_eq!(collection.len(), 4);
        assert!(collection.sources().iter().all(|s| s.is_data_url()));
    }
}
