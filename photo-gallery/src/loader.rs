//! Lazy image loading with a bounded cache and neighbour preloading
//!
//! One `ImageLoader` exists per active collection. Load states are tracked
//! per index; decoded assets live in an [`ImageCache`] keyed by source. All
//! background work holds only a `Weak` reference, so once the loader is
//! dropped any completion that arrives later is ignored.

use crate::cache::{CacheStats, ImageCache, LoadedImage};
use crate::fetch::{fetch_image, ImageFetcher, LoadError};
use crate::models::{GalleryOptions, ImageCollection, ImageSource, LoadState};
use crate::spawn::Spawner;
use crate::visibility::{ElementHandle, VisibilityObserver};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Duration;

/// Delay between a completed load and the preload of its neighbours
pub const PRELOAD_DELAY: Duration = Duration::from_millis(100);

type StateListener = Rc<dyn Fn(usize, LoadState)>;

struct LoaderInner {
    states: HashMap<usize, LoadState>,
    elements: HashMap<ElementHandle, usize>,
    cache: ImageCache,
    listener: Option<StateListener>,
}

pub struct ImageLoader {
    collection: ImageCollection,
    enable_preloading: bool,
    fetcher: Rc<dyn ImageFetcher>,
    observer: Rc<dyn VisibilityObserver>,
    spawner: Rc<dyn Spawner>,
    inner: RefCell<LoaderInner>,
    this: Weak<ImageLoader>,
}

impl ImageLoader {
    pub fn new(
        collection: ImageCollection,
        options: &GalleryOptions,
        fetcher: Rc<dyn ImageFetcher>,
        observer: Rc<dyn VisibilityObserver>,
        spawner: Rc<dyn Spawner>,
    ) -> Rc<Self> {
        log::debug!(
            "Image loader for {:?}: cache {}, preloading {}",
            collection.name(),
            options.cache_size,
            options.enable_preloading
        );
        Rc::new_cyclic(|this| Self {
            collection,
            enable_preloading: options.enable_preloading,
            fetcher,
            observer,
            spawner,
            inner: RefCell::new(LoaderInner {
                states: HashMap::new(),
                elements: HashMap::new(),
                cache: ImageCache::new(options.cache_size),
                listener: None,
            }),
            this: this.clone(),
        })
    }

    pub fn collection(&self) -> &ImageCollection {
        &self.collection
    }

    /// Called on every load state transition
    pub fn set_state_listener(&self, listener: impl Fn(usize, LoadState) + 'static) {
        self.inner.borrow_mut().listener = Some(Rc::new(listener));
    }

    pub fn image_state(&self, index: usize) -> LoadState {
        self.inner
            .borrow()
            .states
            .get(&index)
            .copied()
            .unwrap_or_default()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.borrow().cache.stats()
    }

    /// Associates a view element with `index` and starts watching it
    pub fn register_element(&self, handle: ElementHandle, index: usize) {
        if index >= self.collection.len() {
            log::warn!("Element {:?} registered for missing image {}", handle, index);
            return;
        }
        self.inner.borrow_mut().elements.insert(handle, index);

        if !self.observer.is_supported() {
            self.force_load_image(index);
        } else if self.image_state(index) == LoadState::Pending {
            self.observer.observe(handle);
        }
    }

    /// Stops watching `handle`; other elements showing the same image stay registered
    pub fn unregister_element(&self, handle: ElementHandle) {
        self.inner.borrow_mut().elements.remove(&handle);
        self.observer.unobserve(handle);
    }

    /// The host saw `handle` enter the (margin-extended) viewport
    pub fn notify_visible(&self, handle: ElementHandle) {
        let index = self.inner.borrow().elements.get(&handle).copied();
        if let Some(index) = index {
            self.observer.unobserve(handle);
            self.force_load_image(index);
        }
    }

    /// Pulls pending visibility changes from the observer, returns how many fired
    pub fn poll_visibility(&self) -> usize {
        let visible = self.observer.take_visible();
        for handle in &visible {
            self.notify_visible(*handle);
        }
        visible.len()
    }

    /// Starts loading `index` in the background regardless of visibility
    pub fn force_load_image(&self, index: usize) {
        let this = self.this.clone();
        self.spawner.spawn_local(Box::pin(async move {
            Self::run_load(this, index, false).await;
        }));
    }

    /// Loads `index` and resolves with the resulting state
    pub async fn load_image(&self, index: usize) -> LoadState {
        Self::run_load(self.this.clone(), index, false).await
    }

    /// The cached asset of `index`, if it is loaded and not evicted yet
    pub fn cached_image(&self, index: usize) -> Option<Arc<LoadedImage>> {
        let source = self.collection.get(index)?;
        self.inner.borrow().cache.peek(source)
    }

    /// URL to show for `index`, taken from the cache when possible
    ///
    /// On a miss the image is fetched and cached without touching its load state.
    pub async fn image_url(&self, index: usize) -> Result<String, LoadError> {
        if let Some(image) = self.cached_image(index) {
            return Ok(image.url.clone());
        }
        let source = self
            .collection
            .get(index)
            .cloned()
            .ok_or_else(|| LoadError::Fetch(format!("no image at index {}", index)))?;
        let image = fetch_image(self.fetcher.as_ref(), &source).await?;
        let url = image.url.clone();
        self.store(source, image);
        Ok(url)
    }

    /// Re-attempts a failed image; returns false unless it was in `Error`
    pub fn retry_image(&self, index: usize) -> bool {
        let Some(source) = self.collection.get(index).cloned() else {
            return false;
        };
        if self.image_state(index) != LoadState::Error {
            return false;
        }
        log::debug!("Retrying image {} ({})", index, source);
        self.set_state(index, LoadState::Loading);

        let this = self.this.clone();
        self.spawner.spawn_local(Box::pin(async move {
            Self::run_fetch(this, index, source, false).await;
        }));
        true
    }

    fn set_state(&self, index: usize, state: LoadState) {
        let listener = {
            let mut inner = self.inner.borrow_mut();
            inner.states.insert(index, state);
            inner.listener.clone()
        };
        if let Some(listener) = listener {
            listener(index, state);
        }
    }

    async fn run_load(this: Weak<Self>, index: usize, preload: bool) -> LoadState {
        let Some(loader) = this.upgrade() else {
            return LoadState::Pending;
        };
        let Some(source) = loader.collection.get(index).cloned() else {
            return LoadState::Pending;
        };

        // failed images only leave `Error` through `retry_image`
        let state = loader.image_state(index);
        if state != LoadState::Pending {
            return state;
        }

        let hit = loader.inner.borrow_mut().cache.get(&source).is_some();
        if hit {
            loader.set_state(index, LoadState::Loaded);
            return LoadState::Loaded;
        }

        loader.set_state(index, LoadState::Loading);
        drop(loader);
        Self::run_fetch(this, index, source, preload).await
    }

    async fn run_fetch(
        this: Weak<Self>,
        index: usize,
        source: ImageSource,
        preload: bool,
    ) -> LoadState {
        let Some(fetcher) = this.upgrade().map(|loader| loader.fetcher.clone()) else {
            return LoadState::Pending;
        };
        let result = fetch_image(fetcher.as_ref(), &source).await;

        let Some(loader) = this.upgrade() else {
            log::debug!("Loader dropped before {} finished loading", source);
            return LoadState::Pending;
        };

        match result {
            Ok(image) => {
                loader.store(source, image);
                loader.set_state(index, LoadState::Loaded);
                if !preload && loader.enable_preloading {
                    loader.schedule_preload(index);
                }
                LoadState::Loaded
            }
            Err(e) => {
                log::warn!("Failed to load image {} ({}): {}", index, source, e);
                loader.set_state(index, LoadState::Error);
                LoadState::Error
            }
        }
    }

    fn store(&self, source: ImageSource, image: LoadedImage) {
        self.inner.borrow_mut().cache.insert(source, Arc::new(image));
    }

    /// Loads the direct neighbours of `index` after [`PRELOAD_DELAY`]
    ///
    /// Preloaded images do not schedule further preloads.
    fn schedule_preload(&self, index: usize) {
        let this = self.this.clone();
        self.spawner.spawn_local(Box::pin(async move {
            tokio::time::sleep(PRELOAD_DELAY).await;

            let Some(loader) = this.upgrade() else {
                return;
            };
            let neighbours = [index.checked_sub(1), Some(index + 1)];
            for neighbour in neighbours.into_iter().flatten() {
                if neighbour < loader.collection.len()
                    && loader.image_state(neighbour) == LoadState::Pending
                {
                    let this = this.clone();
                    loader.spawner.spawn_local(Box::pin(async move {
                        Self::run_load(this, neighbour, true).await;
                    }));
                }
            }
        }));
    }
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("collection", &self.collection.name())
            .field("enable_preloading", &self.enable_preloading)
            .finish_non_exhaustive()
    }
}
