//! Shared services for gallery components and turning sources into `img` URLs

use photo_gallery::fetch::embed_url;
use photo_gallery::{ImageFetcher, ImageSource, LoadError, PreferenceStore, SourceFetcher};
use std::path::PathBuf;
use std::rc::Rc;

/// Services shared by every gallery on the page, provided via context
#[derive(Clone)]
pub struct GalleryContext {
    pub fetcher: Rc<dyn ImageFetcher>,
    pub store: Option<Rc<dyn PreferenceStore>>,
}

impl GalleryContext {
    /// Relative image paths are resolved against `storage_path`
    pub fn new(storage_path: impl Into<PathBuf>, store: Option<Rc<dyn PreferenceStore>>) -> Self {
        Self {
            fetcher: Rc::new(SourceFetcher::with_root(storage_path)),
            store,
        }
    }
}

impl Default for GalleryContext {
    fn default() -> Self {
        Self {
            fetcher: Rc::new(SourceFetcher::new()),
            store: None,
        }
    }
}

/// URL an `img` element can show for `source`, outside of any gallery
///
/// Remote and `data:` URLs are used as they are. Local files are read
/// through the fetcher and embedded as a base64 `data:` URL. Gallery images
/// go through [`crate::GalleryController::image_url`] instead, which uses the
/// loader's cache.
pub async fn display_url(fetcher: &dyn ImageFetcher, source: &ImageSource) -> Result<String, LoadError> {
    if source.is_data_url() || source.is_remote() {
        return Ok(source.as_str().to_string());
    }

    let bytes = fetcher.fetch(source).await?;
    Ok(embed_url(source, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};

    #[tokio::test]
    async fn test_urls_pass_through() {
        let fetcher = SourceFetcher::new();
        let remote = ImageSource::new("https://example.com/a.jpg");
        assert_eq!(display_url(&fetcher, &remote).await.unwrap(), remote.as_str());

        let inline = ImageSource::new("data:image/png;base64,AAAA");
        assert_eq!(display_url(&fetcher, &inline).await.unwrap(), inline.as_str());
    }

    #[tokio::test]
    async fn test_local_file_is_embedded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"not really a png").unwrap();
        let fetcher = SourceFetcher::with_root(dir.path());

        let url = display_url(&fetcher, &ImageSource::new("a.png")).await.unwrap();
        assert_eq!(
            url,
            format!(
                "data:image/png;base64,{}",
                general_purpose::STANDARD.encode(b"not really a png")
            )
        );

        let missing = display_url(&fetcher, &ImageSource::new("missing.png")).await;
        assert!(matches!(missing, Err(LoadError::Io(_))));
    }
}
