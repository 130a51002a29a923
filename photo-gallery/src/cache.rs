//! Bounded cache of decoded images, keyed by source
//!
//! Entries are never promoted on lookup, so the least recently used entry is
//! always the oldest inserted one and eviction is first-in, first-out.

use crate::models::ImageSource;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Default number of cached images
pub const DEFAULT_CACHE_SIZE: usize = 50;

/// A validated image asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    /// Size of the encoded asset in bytes
    pub byte_len: usize,
    /// What an `img` element shows: the source URL or an embedded `data:` URL
    pub url: String,
}

/// Statistics about cache performance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

pub struct ImageCache {
    entries: LruCache<ImageSource, Arc<LoadedImage>>,
    hits: u64,
    misses: u64,
    insertions: u64,
    evictions: u64,
}

impl ImageCache {
    /// Creates a cache holding at most `capacity` images (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or_else(|| {
            log::warn!("Image cache size 0 is not usable, using 1");
            NonZeroUsize::MIN
        });
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
            insertions: 0,
            evictions: 0,
        }
    }

    /// Looks up `source` without changing eviction order
    pub fn get(&mut self, source: &ImageSource) -> Option<Arc<LoadedImage>> {
        match self.entries.peek(source) {
            Some(image) => {
                self.hits += 1;
                Some(image.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Like [`ImageCache::get`] but not counted in the statistics
    pub fn peek(&self, source: &ImageSource) -> Option<Arc<LoadedImage>> {
        self.entries.peek(source).cloned()
    }

    pub fn contains(&self, source: &ImageSource) -> bool {
        self.entries.contains(source)
    }

    /// Inserts an image, returning the source evicted to make room (if any)
    pub fn insert(&mut self, source: ImageSource, image: Arc<LoadedImage>) -> Option<ImageSource> {
        self.insertions += 1;
        match self.entries.push(source.clone(), image) {
            Some((evicted, _)) if evicted != source => {
                self.evictions += 1;
                log::debug!("Evicted {} from image cache", evicted);
                Some(evicted)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            len: self.entries.len(),
            capacity: self.capacity(),
            hits: self.hits,
            misses: self.misses,
            insertions: self.insertions,
            evictions: self.evictions,
        }
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> Arc<LoadedImage> {
        Arc::new(LoadedImage {
            width: 4,
            height: 3,
            byte_len: 12,
            url: "data:image/png;base64,AAAA".to_string(),
        })
    }

    fn src(i: usize) -> ImageSource {
        ImageSource::new(format!("/photos/{i}.jpg"))
    }

    #[test]
    fn test_cache_is_bounded_and_evicts_oldest() {
        let mut cache = ImageCache::new(3);
        for i in 0..3 {
            assert_eq!(cache.insert(src(i), image()), None);
        }
        assert_eq!(cache.len(), 3);

        let evicted = cache.insert(src(3), image());
        assert_eq!(evicted, Some(src(0)));
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&src(0)));
        assert!(cache.contains(&src(1)));
        assert!(cache.contains(&src(3)));
    }

    #[test]
    fn test_lookup_does_not_promote() {
        let mut cache = ImageCache::new(2);
        cache.insert(src(0), image());
        cache.insert(src(1), image());
        assert!(cache.get(&src(0)).is_some());

        // src(0) is still the oldest insertion
        assert_eq!(cache.insert(src(2), image()), Some(src(0)));
    }

    #[test]
    fn test_reinsert_is_not_an_eviction() {
        let mut cache = ImageCache::new(2);
        cache.insert(src(0), image());
        assert_eq!(cache.insert(src(0), image()), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_zero_capacity_becomes_one() {
        let mut cache = ImageCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(src(0), image());
        assert_eq!(cache.insert(src(1), image()), Some(src(0)));
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let mut cache = ImageCache::new(2);
        cache.insert(src(0), image());
        cache.get(&src(0));
        cache.get(&src(1));
        cache.insert(src(1), image());
        cache.insert(src(2), image());

        assert!(cache.peek(&src(2)).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.insertions, 3);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.len, 2);
    }
}
