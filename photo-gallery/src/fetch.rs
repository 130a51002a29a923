//! Fetching and validating image assets
//!
//! The loader and the metadata extractor never read bytes themselves; they go
//! through an [`ImageFetcher`]. [`SourceFetcher`] is the default one and
//! understands `data:` URLs, local paths and (with the `http` feature)
//! http(s) URLs.

use crate::cache::LoadedImage;
use crate::models::ImageSource;
use base64::Engine;
use resvg::usvg;
use std::future::Future;
use std::io::Cursor;
use std::path::PathBuf;
use std::pin::Pin;

/// Error type for loading a single image
#[derive(Debug)]
pub enum LoadError {
    Fetch(String),
    Decode(image::ImageError),
    Svg(String),
    InvalidDataUrl(String),
    Io(std::io::Error),
    Unsupported(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Fetch(msg) => write!(f, "Fetch failed: {}", msg),
            LoadError::Decode(e) => write!(f, "Decode error: {}", e),
            LoadError::Svg(msg) => write!(f, "SVG error: {}", msg),
            LoadError::InvalidDataUrl(msg) => write!(f, "Invalid data URL: {}", msg),
            LoadError::Io(e) => write!(f, "IO error: {}", e),
            LoadError::Unsupported(msg) => write!(f, "Unsupported source: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<image::ImageError> for LoadError {
    fn from(err: image::ImageError) -> Self {
        LoadError::Decode(err)
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err)
    }
}

impl From<base64::DecodeError> for LoadError {
    fn from(err: base64::DecodeError) -> Self {
        LoadError::InvalidDataUrl(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        LoadError::Fetch(err.to_string())
    }
}

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, LoadError>> + 'a>>;

/// Resolves an image source to its encoded bytes
pub trait ImageFetcher {
    fn fetch<'a>(&'a self, source: &'a ImageSource) -> FetchFuture<'a>;
}

/// Default fetcher for data URLs, local files and (optionally) http(s)
#[derive(Debug, Clone, Default)]
pub struct SourceFetcher {
    root: Option<PathBuf>,
    #[cfg(feature = "http")]
    client: Option<reqwest::Client>,
}

impl SourceFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative local paths against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    #[cfg(feature = "http")]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    fn local_path(&self, source: &ImageSource) -> PathBuf {
        let path = PathBuf::from(source.as_str().trim_start_matches("file://"));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }

    #[cfg(feature = "http")]
    async fn fetch_remote(&self, source: &ImageSource) -> Result<Vec<u8>, LoadError> {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()?,
        };
        let response = client.get(source.as_str()).send().await?;
        let bytes = response.error_for_status()?.bytes().await?;
        Ok(bytes.to_vec())
    }

    #[cfg(not(feature = "http"))]
    async fn fetch_remote(&self, source: &ImageSource) -> Result<Vec<u8>, LoadError> {
        Err(LoadError::Unsupported(format!(
            "{} (built without http support)",
            source
        )))
    }
}

impl ImageFetcher for SourceFetcher {
    fn fetch<'a>(&'a self, source: &'a ImageSource) -> FetchFuture<'a> {
        Box::pin(async move {
            if source.is_data_url() {
                decode_data_url(source.as_str())
            } else if source.is_remote() {
                self.fetch_remote(source).await
            } else {
                let path = self.local_path(source);
                log::debug!("Reading image {}", path.display());
                Ok(tokio::fs::read(&path).await?)
            }
        })
    }
}

/// Fetches `source`, validates it by reading its header and prepares its URL
pub async fn fetch_image(
    fetcher: &dyn ImageFetcher,
    source: &ImageSource,
) -> Result<LoadedImage, LoadError> {
    let bytes = fetcher.fetch(source).await?;
    let (width, height) = decode_dimensions(&bytes)?;
    Ok(LoadedImage {
        width,
        height,
        byte_len: bytes.len(),
        url: embed_url(source, &bytes),
    })
}

/// Mime type for an image file, by extension
pub fn mime_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "image/jpeg",
    }
}

/// URL an `img` element can show for `source` once its bytes are known
///
/// Remote and `data:` URLs are used as they are; local files become a
/// base64 `data:` URL.
pub fn embed_url(source: &ImageSource, bytes: &[u8]) -> String {
    if source.is_data_url() || source.is_remote() {
        return source.as_str().to_string();
    }
    format!(
        "data:{};base64,{}",
        mime_for(&source.filename()),
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Decodes the payload of a `data:` URL
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, LoadError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| LoadError::InvalidDataUrl("missing data: prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::InvalidDataUrl("missing ',' separator".to_string()))?;

    if header.ends_with(";base64") {
        Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> Result<Vec<u8>, LoadError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input
                .get(i + 1..i + 3)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| {
                    LoadError::InvalidDataUrl(format!("bad percent escape at {}", i))
                })?;
            out.push(hex);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Reads pixel dimensions from the image header without decoding pixels
///
/// Raster formats go through the `image` crate; anything it does not
/// recognise is parsed as SVG.
pub fn decode_dimensions(bytes: &[u8]) -> Result<(u32, u32), LoadError> {
    let reader = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    if reader.format().is_some() {
        return Ok(reader.into_dimensions()?);
    }
    svg_dimensions(bytes)
}

fn svg_dimensions(bytes: &[u8]) -> Result<(u32, u32), LoadError> {
    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
        .map_err(|e| LoadError::Svg(e.to_string()))?;
    let size = tree.size().to_int_size();
    if size.width() == 0 || size.height() == 0 {
        return Err(LoadError::Svg("SVG has empty dimensions".to_string()));
    }
    Ok((size.width(), size.height()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::new(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_base64_data_url() {
        let png = png_bytes(3, 2);
        let url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let bytes = decode_data_url(&url).unwrap();
        assert_eq!(bytes, png);
        assert_eq!(decode_dimensions(&bytes).unwrap(), (3, 2));
    }

    #[test]
    fn test_decode_percent_data_url() {
        let bytes = decode_data_url("data:text/plain,a%20b%2Cc").unwrap();
        assert_eq!(bytes, b"a b,c");
        assert!(decode_data_url("data:text/plain,%zz").is_err());
        assert!(decode_data_url("data:no-comma").is_err());
    }

    #[test]
    fn test_svg_dimensions() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300"><rect/></svg>"#;
        assert_eq!(decode_dimensions(svg).unwrap(), (400, 300));

        let svg = b"<?xml version='1.0'?><svg xmlns='http://www.w3.org/2000/svg' width='1200px' height='800'></svg>";
        assert_eq!(decode_dimensions(svg).unwrap(), (1200, 800));
    }

    #[test]
    fn test_svg_attributes_across_lines() {
        let svg = b"<svg xmlns=\"http://www.w3.org/2000/svg\"\n\twidth=\"400\"\n\theight=\"300\"></svg>";
        assert_eq!(decode_dimensions(svg).unwrap(), (400, 300));
    }

    #[test]
    fn test_svg_size_from_view_box() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 300"><rect width="10" height="10"/></svg>"#;
        assert_eq!(decode_dimensions(svg).unwrap(), (400, 300));
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("IMG_0042.JPG"), "image/jpeg");
        assert_eq!(mime_for("photo.webp"), "image/webp");
        assert_eq!(mime_for("card.svg"), "image/svg+xml");
        assert_eq!(mime_for("no-extension"), "image/jpeg");
    }

    #[test]
    fn test_embed_url() {
        let remote = ImageSource::new("https://example.com/a.jpg");
        assert_eq!(embed_url(&remote, b"ignored"), remote.as_str());

        let local = ImageSource::new("photos/a.png");
        assert_eq!(
            embed_url(&local, b"abc"),
            format!(
                "data:image/png;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(b"abc")
            )
        );
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        assert!(decode_dimensions(b"definitely not an image").is_err());
    }

    #[tokio::test]
    async fn test_fetch_local_file_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), png_bytes(5, 5)).unwrap();

        let fetcher = SourceFetcher::with_root(dir.path());
        let bytes = fetcher.fetch(&ImageSource::new("a.png")).await.unwrap();
        assert_eq!(decode_dimensions(&bytes).unwrap(), (5, 5));

        let missing = fetcher.fetch(&ImageSource::new("missing.png")).await;
        assert!(matches!(missing, Err(LoadError::Io(_))));
    }

    #[cfg(not(feature = "http"))]
    #[tokio::test]
    async fn test_remote_without_http_feature() {
        let fetcher = SourceFetcher::new();
        let result = fetcher
            .fetch(&ImageSource::new("https://example.com/a.jpg"))
            .await;
        assert!(matches!(result, Err(LoadError::Unsupported(_))));
    }
}
