//! Metadata extraction over a whole collection

use crate::fetch::ImageFetcher;
use crate::metadata::{try_extract_image_metadata, ImageMetadata, MetadataError};
use crate::models::{ImageCollection, ImageSource};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Fixed delay between attempts
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn single() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

pub type ExtractFuture<'a> = Pin<Box<dyn Future<Output = Result<ImageMetadata, MetadataError>> + 'a>>;

pub trait MetadataExtractor {
    fn extract<'a>(&'a self, src: &'a ImageSource) -> ExtractFuture<'a>;
}

/// Extracts metadata by fetching and reading each image
#[derive(Clone)]
pub struct FetchingExtractor {
    fetcher: Rc<dyn ImageFetcher>,
}

impl FetchingExtractor {
    pub fn new(fetcher: Rc<dyn ImageFetcher>) -> Self {
        Self { fetcher }
    }
}

impl MetadataExtractor for FetchingExtractor {
    fn extract<'a>(&'a self, src: &'a ImageSource) -> ExtractFuture<'a> {
        Box::pin(try_extract_image_metadata(self.fetcher.as_ref(), src))
    }
}

/// Runs `extractor` on `src` until it succeeds or the policy is exhausted
pub async fn extract_with_retry(
    extractor: &dyn MetadataExtractor,
    src: &ImageSource,
    policy: RetryPolicy,
) -> Result<ImageMetadata, MetadataError> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match extractor.extract(src).await {
            Ok(metadata) => return Ok(metadata),
            Err(e) if attempt < attempts => {
                log::debug!("Metadata attempt {} for {} failed: {}", attempt, src, e);
                attempt += 1;
                tokio::time::sleep(policy.backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Extracts metadata for every image in order
///
/// An image that still fails after the last attempt gets a fallback record
/// holding its filename and the error.
pub async fn extract_collection(
    extractor: &dyn MetadataExtractor,
    collection: &ImageCollection,
    policy: RetryPolicy,
) -> Vec<ImageMetadata> {
    let mut records = Vec::with_capacity(collection.len());
    for (index, src) in collection.sources().iter().enumerate() {
        let record = match extract_with_retry(extractor, src, policy).await {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!(
                    "Failed to load metadata for image {} after {} attempts: {}",
                    index,
                    policy.attempts,
                    e
                );
                ImageMetadata::failed(src, e.to_string())
            }
        };
        records.push(record);
    }

    log::info!(
        "Extracted metadata for {} images of {:?}",
        records.len(),
        collection.name()
    );
    records
}

/// Re-extracts the whole collection once per image, stopping at the first error
pub async fn retry_all(
    extractor: &dyn MetadataExtractor,
    collection: &ImageCollection,
) -> Result<Vec<ImageMetadata>, MetadataError> {
    let mut records = Vec::with_capacity(collection.len());
    for src in collection.sources() {
        records.push(extract_with_retry(extractor, src, RetryPolicy::single()).await?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use tokio::time::Instant;

    /// Fails each source a configured number of times before succeeding
    #[derive(Default)]
    struct FlakyExtractor {
        failures: RefCell<HashMap<String, u32>>,
        calls: RefCell<Vec<String>>,
    }

    impl FlakyExtractor {
        fn failing(src: &str, times: u32) -> Self {
            let extractor = Self::default();
            extractor.failures.borrow_mut().insert(src.to_string(), times);
            extractor
        }

        fn calls_for(&self, src: &str) -> usize {
            self.calls.borrow().iter().filter(|c| *c == src).count()
        }
    }

    impl MetadataExtractor for FlakyExtractor {
        fn extract<'a>(&'a self, src: &'a ImageSource) -> ExtractFuture<'a> {
            Box::pin(async move {
                self.calls.borrow_mut().push(src.to_string());
                let mut failures = self.failures.borrow_mut();
                let result = match failures.get_mut(src.as_str()) {
                    Some(left) if *left > 0 => {
                        *left -= 1;
                        Err(MetadataError::Other("timed out".to_string()))
                    }
                    _ => Ok(ImageMetadata {
                        error: None,
                        ..ImageMetadata::failed(src, "")
                    }),
                };
                result
            })
        }
    }

    fn collection() -> ImageCollection {
        ImageCollection::new("marathon", ["a.jpg", "b.jpg", "c.jpg"])
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_within_three_attempts() {
        let extractor = FlakyExtractor::failing("b.jpg", 2);
        let started = Instant::now();

        let records = extract_collection(&extractor, &collection(), RetryPolicy::default()).await;

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| !r.is_error()));
        assert_eq!(extractor.calls_for("b.jpg"), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_record_after_last_attempt() {
        let extractor = FlakyExtractor::failing("a.jpg", 10);

        let records = extract_collection(&extractor, &collection(), RetryPolicy::default()).await;

        assert_eq!(extractor.calls_for("a.jpg"), 3);
        assert_eq!(records[0].filename, "a.jpg");
        assert_eq!(records[0].error.as_deref(), Some("Metadata error: timed out"));
        assert!(!records[1].is_error());
        assert_eq!(records[2].src, ImageSource::new("c.jpg"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_all_surfaces_first_error() {
        let extractor = FlakyExtractor::failing("b.jpg", 1);
        let result = retry_all(&extractor, &collection()).await;
        assert!(matches!(result, Err(MetadataError::Other(_))));
        assert_eq!(extractor.calls_for("c.jpg"), 0);

        let records = retry_all(&extractor, &collection()).await.unwrap();
        assert_eq!(records.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetching_extractor_reads_dimensions() {
        use crate::fetch::SourceFetcher;
        use crate::placeholder::placeholder_data_url;

        let extractor = FetchingExtractor::new(Rc::new(SourceFetcher::new()));
        let collection = ImageCollection::new("empty", [placeholder_data_url(0, 300, 200)]);
        let records = extract_collection(&extractor, &collection, RetryPolicy::default()).await;

        let dimensions = records[0].dimensions.unwrap();
        assert_eq!((dimensions.width, dimensions.height), (300, 200));
        assert_eq!(records[0].aspect_ratio, Some(1.5));
    }
}
