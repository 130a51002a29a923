//! Per-image descriptive metadata
//!
//! Dimensions come from the image header. Capture dates are guessed from the
//! filename and are cosmetic only: a wrong guess just shows a wrong caption.

use crate::fetch::{decode_dimensions, ImageFetcher, LoadError};
use crate::models::ImageSource;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Error note stored in the record of an image that could not be loaded
pub const LOAD_FAILED: &str = "Failed to load image";

/// Error type for metadata extraction
#[derive(Debug)]
pub enum MetadataError {
    Load(LoadError),
    Other(String),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Load(e) => write!(f, "{}: {}", LOAD_FAILED, e),
            MetadataError::Other(msg) => write!(f, "Metadata error: {}", msg),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<LoadError> for MetadataError {
    fn from(err: LoadError) -> Self {
        MetadataError::Load(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub filename: String,
    pub src: ImageSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_date: Option<NaiveDateTime>,
    /// Originating app, e.g. "WhatsApp"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageMetadata {
    /// Record for an image that could not be read: filename, src and error only
    pub fn failed(src: &ImageSource, error: impl Into<String>) -> Self {
        Self {
            filename: src.filename(),
            src: src.clone(),
            dimensions: None,
            aspect_ratio: None,
            capture_date: None,
            source: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Builds the metadata record for `src`, failing if the image cannot be read
pub async fn try_extract_image_metadata(
    fetcher: &dyn ImageFetcher,
    src: &ImageSource,
) -> Result<ImageMetadata, MetadataError> {
    let bytes = fetcher.fetch(src).await?;
    let (width, height) = decode_dimensions(&bytes)?;
    let filename = src.filename();
    let capture = infer_capture_date(&filename);

    Ok(ImageMetadata {
        dimensions: Some(Dimensions { width, height }),
        aspect_ratio: (height > 0).then(|| width as f64 / height as f64),
        capture_date: capture.as_ref().map(|c| c.date),
        source: capture.and_then(|c| c.source).map(str::to_string),
        error: None,
        filename,
        src: src.clone(),
    })
}

/// Builds the metadata record for `src`; load failures yield an error record
pub async fn extract_image_metadata(fetcher: &dyn ImageFetcher, src: &ImageSource) -> ImageMetadata {
    match try_extract_image_metadata(fetcher, src).await {
        Ok(metadata) => metadata,
        Err(e) => {
            log::debug!("No metadata for {}: {}", src, e);
            ImageMetadata::failed(src, LOAD_FAILED)
        }
    }
}

/// Capture date guessed from a filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureInfo {
    pub date: NaiveDateTime,
    pub source: Option<&'static str>,
}

/// Guesses when a photo was taken from its filename
///
/// Patterns are tried in order and the first match wins:
/// `WhatsApp Image YYYY-MM-DD at HH.MM.SS`, then
/// `photo_YYYY-MM-DD_HH-MM-SS`, then any `YYYY-MM-DD` or `YYYY_MM_DD`
/// (taken as midnight).
pub fn infer_capture_date(filename: &str) -> Option<CaptureInfo> {
    whatsapp_date(filename)
        .map(|date| CaptureInfo {
            date,
            source: Some("WhatsApp"),
        })
        .or_else(|| photo_date(filename).map(|date| CaptureInfo { date, source: None }))
        .or_else(|| {
            generic_date(filename)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|date| CaptureInfo { date, source: None })
        })
}

fn whatsapp_date(filename: &str) -> Option<NaiveDateTime> {
    const PREFIX: &str = "WhatsApp Image ";
    filename.match_indices(PREFIX).find_map(|(at, _)| {
        let bytes = filename.as_bytes();
        let start = at + PREFIX.len();
        let date = date_at(bytes, start, b"-")?;
        if bytes.get(start + 10..start + 14)? != b" at " {
            return None;
        }
        let time = time_at(bytes, start + 14, b'.')?;
        Some(date.and_time(time))
    })
}

fn photo_date(filename: &str) -> Option<NaiveDateTime> {
    const PREFIX: &str = "photo_";
    filename.match_indices(PREFIX).find_map(|(at, _)| {
        let bytes = filename.as_bytes();
        let start = at + PREFIX.len();
        let date = date_at(bytes, start, b"-")?;
        if *bytes.get(start + 10)? != b'_' {
            return None;
        }
        let time = time_at(bytes, start + 11, b'-')?;
        Some(date.and_time(time))
    })
}

fn generic_date(filename: &str) -> Option<NaiveDate> {
    let bytes = filename.as_bytes();
    (0..bytes.len()).find_map(|i| date_at(bytes, i, b"-_"))
}

fn number(bytes: &[u8], start: usize, len: usize) -> Option<u32> {
    let digits = bytes.get(start..start + len)?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    digits
        .iter()
        .try_fold(0u32, |acc, d| Some(acc * 10 + u32::from(d - b'0')))
}

/// `YYYY?MM?DD` at `start`, where each `?` is one of `separators`
fn date_at(bytes: &[u8], start: usize, separators: &[u8]) -> Option<NaiveDate> {
    let year = number(bytes, start, 4)?;
    if !separators.contains(bytes.get(start + 4)?) {
        return None;
    }
    let month = number(bytes, start + 5, 2)?;
    if !separators.contains(bytes.get(start + 7)?) {
        return None;
    }
    let day = number(bytes, start + 8, 2)?;
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

/// `HH?MM?SS` at `start`
fn time_at(bytes: &[u8], start: usize, separator: u8) -> Option<NaiveTime> {
    let hour = number(bytes, start, 2)?;
    if *bytes.get(start + 2)? != separator {
        return None;
    }
    let minute = number(bytes, start + 3, 2)?;
    if *bytes.get(start + 5)? != separator {
        return None;
    }
    let second = number(bytes, start + 6, 2)?;
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// "May 1, 2024, 10:30 AM"
pub fn format_capture_date(date: &NaiveDateTime) -> String {
    date.format("%B %-d, %Y, %-I:%M %p").to_string()
}

/// Accessible description, e.g. "Marathon photo 3 taken on May 1, 2024, 10:30 AM from WhatsApp"
pub fn alt_text(metadata: Option<&ImageMetadata>, index: usize, collection_title: &str) -> String {
    let mut text = format!("{} photo {}", collection_title, index + 1);
    if let Some(metadata) = metadata {
        if let Some(date) = &metadata.capture_date {
            text.push_str(" taken on ");
            text.push_str(&format_capture_date(date));
        }
        if let Some(source) = &metadata.source {
            text.push_str(" from ");
            text.push_str(source);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::png_bytes;
    use crate::fetch::FetchFuture;

    struct StaticFetcher(Option<Vec<u8>>);

    impl ImageFetcher for StaticFetcher {
        fn fetch<'a>(&'a self, _source: &'a ImageSource) -> FetchFuture<'a> {
            Box::pin(async move {
                self.0
                    .clone()
                    .ok_or_else(|| LoadError::Fetch("connection refused".to_string()))
            })
        }
    }

    fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_whatsapp_filename() {
        let info = infer_capture_date("WhatsApp Image 2024-05-01 at 10.30.15.jpeg").unwrap();
        assert_eq!(info.date, datetime(2024, 5, 1, 10, 30, 15));
        assert_eq!(info.source, Some("WhatsApp"));
    }

    #[test]
    fn test_photo_filename() {
        let info = infer_capture_date("photo_2023-11-20_07-05-09.jpg").unwrap();
        assert_eq!(info.date, datetime(2023, 11, 20, 7, 5, 9));
        assert_eq!(info.source, None);
    }

    #[test]
    fn test_generic_date_is_midnight() {
        let info = infer_capture_date("IMG_2022_08_14_beach.png").unwrap();
        assert_eq!(info.date, datetime(2022, 8, 14, 0, 0, 0));

        let info = infer_capture_date("scan-2021-01-02.webp").unwrap();
        assert_eq!(info.date, datetime(2021, 1, 2, 0, 0, 0));
    }

    #[test]
    fn test_unparseable_filename() {
        assert_eq!(infer_capture_date("IMG_0042.jpg"), None);
        assert_eq!(infer_capture_date("2024-13-45.jpg"), None);
        assert_eq!(infer_capture_date(""), None);
    }

    #[test]
    fn test_broken_whatsapp_time_falls_back_to_date() {
        let info = infer_capture_date("WhatsApp Image 2024-05-01 at 99.99.99.jpeg").unwrap();
        assert_eq!(info.date, datetime(2024, 5, 1, 0, 0, 0));
        assert_eq!(info.source, None);
    }

    #[test]
    fn test_format_and_alt_text() {
        let date = datetime(2024, 5, 1, 10, 30, 0);
        assert_eq!(format_capture_date(&date), "May 1, 2024, 10:30 AM");

        let mut metadata = ImageMetadata::failed(&ImageSource::new("a.jpg"), "x");
        assert_eq!(alt_text(Some(&metadata), 2, "Marathon"), "Marathon photo 3");

        metadata.capture_date = Some(date);
        metadata.source = Some("WhatsApp".to_string());
        assert_eq!(
            alt_text(Some(&metadata), 2, "Marathon"),
            "Marathon photo 3 taken on May 1, 2024, 10:30 AM from WhatsApp"
        );
        assert_eq!(alt_text(None, 0, "SRM College"), "SRM College photo 1");
    }

    #[tokio::test]
    async fn test_extract_whatsapp_image() {
        let fetcher = StaticFetcher(Some(png_bytes(8, 4)));
        let src = ImageSource::new("/photos/WhatsApp Image 2024-05-01 at 10.30.15.jpeg?w=1");
        let metadata = extract_image_metadata(&fetcher, &src).await;

        assert_eq!(metadata.filename, "WhatsApp Image 2024-05-01 at 10.30.15.jpeg");
        assert_eq!(
            metadata.dimensions,
            Some(Dimensions {
                width: 8,
                height: 4
            })
        );
        assert_eq!(metadata.aspect_ratio, Some(2.0));
        assert_eq!(metadata.capture_date, Some(datetime(2024, 5, 1, 10, 30, 15)));
        assert_eq!(metadata.source.as_deref(), Some("WhatsApp"));
        assert!(!metadata.is_error());
    }

    #[tokio::test]
    async fn test_extract_failure_record() {
        let fetcher = StaticFetcher(None);
        let src = ImageSource::new("/photos/photo_2023-11-20_07-05-09.jpg");
        let metadata = extract_image_metadata(&fetcher, &src).await;

        assert_eq!(metadata.filename, "photo_2023-11-20_07-05-09.jpg");
        assert_eq!(metadata.error.as_deref(), Some(LOAD_FAILED));
        assert_eq!(metadata.capture_date, None);
        assert_eq!(metadata.dimensions, None);
    }
}
