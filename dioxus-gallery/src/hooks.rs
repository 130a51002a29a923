//! The `use_gallery` hook: one gallery core per collection, exposed as signals

use crate::display::GalleryContext;
use crate::dom_host::{DioxusSpawner, DomFocus, DomHost, FULLSCREEN_LISTENER};
use dioxus::core::Task;
use dioxus::prelude::*;
use photo_gallery::{
    extract_collection, retry_all, ElementHandle, FetchingExtractor, GalleryAction, GalleryHost,
    GalleryOptions, GalleryState, ImageCollection, ImageFetcher, ImageLoader, ImageMetadata,
    KeyInput, KeyboardNavigator, LoadState, PreferenceStore, Rect, RetryPolicy, SlideshowTarget,
    SlideshowTicket, Spawner, ViewportTracker, VisibilityObserver, ANNOUNCEMENT_TIMEOUT,
};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

/// How often thumbnail positions are re-measured against the viewport
const VISIBILITY_POLL: Duration = Duration::from_millis(200);

/// Viewport assumed when the window size cannot be read
const FALLBACK_VIEWPORT: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 1280.0,
    height: 800.0,
};

const VIEWPORT_SCRIPT: &str = "return [window.innerWidth, window.innerHeight];";

/// Handle to a mounted gallery; cheap to copy into event handlers
#[derive(Clone, Copy, PartialEq)]
pub struct GalleryController {
    pub state: Signal<GalleryState>,
    pub loader: Signal<Rc<ImageLoader>>,
    /// Mirror of the loader's states so components re-render on transitions
    pub load_states: Signal<HashMap<usize, LoadState>>,
    pub metadata: Signal<Vec<ImageMetadata>>,
    pub metadata_loading: Signal<bool>,
    pub metadata_error: Signal<Option<String>>,
    pub navigator: Signal<KeyboardNavigator>,
    focus: Signal<Rc<DomFocus>>,
    fetcher: Signal<Rc<dyn ImageFetcher>>,
    mounted: Signal<HashMap<ElementHandle, Rc<MountedData>>>,
    next_element: Signal<u64>,
    metadata_generation: Signal<MetadataGeneration>,
}

impl GalleryController {
    pub fn image_state(&self, index: usize) -> LoadState {
        self.load_states
            .read()
            .get(&index)
            .copied()
            .unwrap_or_default()
    }

    pub fn metadata_for(&self, index: usize) -> Option<ImageMetadata> {
        self.metadata.read().get(index).cloned()
    }

    pub fn focus_host(&self) -> Rc<DomFocus> {
        self.focus.peek().clone()
    }

    pub fn fetcher(&self) -> Rc<dyn ImageFetcher> {
        self.fetcher.peek().clone()
    }

    pub fn dispatch(mut self, action: GalleryAction) {
        self.state.write().apply(action);
    }

    pub fn open(mut self, index: usize) {
        self.state.write().open_lightbox(Some(index));
    }

    pub fn retry_image(&self, index: usize) {
        if !self.loader.peek().retry_image(index) {
            log::debug!("Image {} is not in an error state, nothing to retry", index);
        }
    }

    /// Starts watching a mounted thumbnail for visibility
    pub fn observe_element(mut self, index: usize, element: Rc<MountedData>) -> ElementHandle {
        let handle = {
            let mut next = self.next_element.write();
            *next += 1;
            ElementHandle(*next)
        };
        self.mounted.write().insert(handle, element);
        self.loader.peek().register_element(handle, index);
        handle
    }

    pub fn forget_element(mut self, handle: ElementHandle) {
        self.mounted.write().remove(&handle);
        self.loader.peek().unregister_element(handle);
    }

    /// `img` URL for `index`, from the loader's cache when it holds the image
    pub async fn image_url(&self, index: usize) -> Option<String> {
        let loader = self.loader.peek().clone();
        match loader.image_url(index).await {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Cannot display image {}: {}", index, e);
                None
            }
        }
    }

    /// Routes a key press through the navigator; returns whether to prevent the default
    pub fn handle_key(mut self, input: KeyInput) -> bool {
        let outcome = self.navigator.write().handle_key(input);
        if let Some(action) = outcome.action {
            self.dispatch(action);
        }
        if let Some(token) = outcome.announcement {
            let mut navigator = self.navigator;
            spawn(async move {
                tokio::time::sleep(ANNOUNCEMENT_TIMEOUT).await;
                navigator.write().clear_announcement(token);
            });
        }
        outcome.prevent_default
    }

    /// Extracts metadata for the current collection, with retries per image
    pub fn refresh_metadata(mut self) {
        let generation = self.next_metadata_generation();
        let collection = self.state.peek().collection().clone();
        let extractor = FetchingExtractor::new(self.fetcher());
        self.metadata_loading.set(true);
        self.metadata_error.set(None);

        spawn(async move {
            let records = extract_collection(&extractor, &collection, RetryPolicy::default()).await;
            if !self.metadata_generation.peek().is_current(generation) {
                log::debug!("Dropping metadata of {:?}, gallery moved on", collection.name());
                return;
            }
            self.metadata.set(records);
            self.metadata_loading.set(false);
        });
    }

    /// Re-extracts everything once; the first failure is shown in the banner
    pub fn retry_all_metadata(mut self) {
        let generation = self.next_metadata_generation();
        let collection = self.state.peek().collection().clone();
        let extractor = FetchingExtractor::new(self.fetcher());
        self.metadata_loading.set(true);
        self.metadata_error.set(None);

        spawn(async move {
            let result = retry_all(&extractor, &collection).await;
            if !self.metadata_generation.peek().is_current(generation) {
                return;
            }
            match result {
                Ok(records) => self.metadata.set(records),
                Err(e) => {
                    log::warn!("Retrying metadata for {:?} failed: {}", collection.name(), e);
                    self.metadata_error.set(Some(e.to_string()));
                }
            }
            self.metadata_loading.set(false);
        });
    }

    fn next_metadata_generation(&mut self) -> u64 {
        self.metadata_generation.write().next()
    }
}

/// Slideshow driver view of the state signal
struct SignalSlideshow(Signal<GalleryState>);

impl SlideshowTarget for SignalSlideshow {
    fn slideshow_ticket(&self) -> Option<(SlideshowTicket, Duration)> {
        let state = self.0.peek();
        state
            .slideshow_ticket()
            .map(|ticket| (ticket, state.slideshow_interval()))
    }

    fn advance_slideshow(&self, ticket: SlideshowTicket) -> bool {
        let mut state = self.0;
        let advanced = state.write().advance_slideshow(ticket);
        advanced
    }
}

/// Counter that tells a finished metadata batch whether it is still wanted
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct MetadataGeneration(u64);

impl MetadataGeneration {
    fn next(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    fn is_current(&self, generation: u64) -> bool {
        self.0 == generation
    }
}

/// State and loader of one collection, replaced together on a switch
struct GalleryCore {
    state: GalleryState,
    loader: Rc<ImageLoader>,
}

/// Builds gallery cores from the parts that outlive a collection switch
#[derive(Clone)]
struct CoreFactory {
    options: GalleryOptions,
    store: Option<Rc<dyn PreferenceStore>>,
    host: GalleryHost,
    observer: Rc<dyn VisibilityObserver>,
    spawner: Rc<dyn Spawner>,
}

impl CoreFactory {
    fn state(&self, collection: ImageCollection) -> GalleryState {
        GalleryState::new(collection, &self.options, self.store.clone(), self.host.clone())
    }

    fn loader(&self, collection: ImageCollection, fetcher: Rc<dyn ImageFetcher>) -> Rc<ImageLoader> {
        ImageLoader::new(
            collection,
            &self.options,
            fetcher,
            self.observer.clone(),
            self.spawner.clone(),
        )
    }

    /// A fresh core if `collection` is not the one `current` shows
    fn rebuild(
        &self,
        current: &GalleryState,
        collection: &ImageCollection,
        fetcher: Rc<dyn ImageFetcher>,
    ) -> Option<GalleryCore> {
        if current.collection() == collection {
            return None;
        }
        Some(GalleryCore {
            state: self.state(collection.clone()),
            loader: self.loader(collection.clone(), fetcher),
        })
    }
}

fn mirror_load_states(loader: &ImageLoader, load_states: Signal<HashMap<usize, LoadState>>) {
    loader.set_state_listener(move |index, state| {
        let mut load_states = load_states;
        load_states.write().insert(index, state);
    });
}

/// Builds the gallery core for `collection` and keeps it in signals
///
/// When a different collection is passed on a later render, the state,
/// loader and metadata are rebuilt and the old ones dropped.
pub fn use_gallery(
    collection: ImageCollection,
    options: GalleryOptions,
    store: Option<Rc<dyn PreferenceStore>>,
) -> GalleryController {
    let context = try_use_context::<GalleryContext>().unwrap_or_default();
    let host = use_hook(|| Rc::new(DomHost::new()));
    let focus = use_signal(|| Rc::new(DomFocus::default()));
    let tracker = use_hook(|| {
        Rc::new(ViewportTracker::new(options.root_margin_px(), options.threshold))
    });
    let factory = use_hook(|| CoreFactory {
        options: options.clone(),
        store: store.clone(),
        host: host.gallery_host(),
        observer: tracker.clone(),
        spawner: Rc::new(DioxusSpawner),
    });
    let fetcher = use_signal(|| context.fetcher.clone());

    let load_states = use_signal(HashMap::new);
    let mut state = use_signal(|| factory.state(collection.clone()));
    let mut loader = use_signal(|| {
        let loader = factory.loader(collection.clone(), context.fetcher.clone());
        mirror_load_states(&loader, load_states);
        loader
    });
    let navigator = use_signal(|| {
        let focus: Rc<dyn photo_gallery::FocusHost> = focus.peek().clone();
        KeyboardNavigator::new(focus)
    });

    let controller = GalleryController {
        state,
        loader,
        load_states,
        metadata: use_signal(Vec::new),
        metadata_loading: use_signal(|| false),
        metadata_error: use_signal(|| None),
        navigator,
        focus,
        fetcher,
        mounted: use_signal(HashMap::new),
        next_element: use_signal(|| 0),
        metadata_generation: use_signal(MetadataGeneration::default),
    };

    // Rebuild on collection change, then (re)start the metadata batch
    use_effect(use_reactive((&collection,), move |(collection,)| {
        let mut controller = controller;
        let rebuilt = factory.rebuild(&state.peek(), &collection, fetcher.peek().clone());
        if let Some(core) = rebuilt {
            log::info!("Switching gallery to {:?}", collection.name());
            controller.load_states.write().clear();
            controller.metadata.write().clear();
            mirror_load_states(&core.loader, controller.load_states);
            state.set(core.state);
            loader.set(core.loader);
        }
        controller.refresh_metadata();
    }));

    // Keyboard navigation follows the lightbox
    use_effect(move || {
        let (open, shortcuts) = {
            let state = state.read();
            (state.is_lightbox_open(), state.preferences().enable_keyboard_shortcuts)
        };
        let mut signal = controller.navigator;
        let mut navigator = signal.write();
        navigator.set_shortcuts_enabled(shortcuts);
        navigator.set_active(open);
    });

    // One slideshow driver per ticket; a new ticket replaces the old driver
    let ticket = use_memo(move || state.read().slideshow_ticket());
    let mut driver: Signal<Option<Task>> = use_signal(|| None);
    use_effect(move || {
        let ticket = ticket();
        if let Some(old) = driver.write().take() {
            old.cancel();
        }
        if ticket.is_some() {
            let task = spawn(async move {
                run_slideshow_driver(state).await;
            });
            driver.set(Some(task));
        }
    });

    // Mirror fullscreen changes made by the browser (e.g. Esc)
    {
        let host = host.clone();
        use_future(move || {
            let host = host.clone();
            async move {
                let mut listener = document::eval(FULLSCREEN_LISTENER);
                while let Ok(on) = listener.recv::<bool>().await {
                    host.set_fullscreen(on);
                    state.write().sync_fullscreen(on);
                }
            }
        });
    }

    // Lazy loading: measure observed thumbnails and let the loader pick up visible ones
    use_future(move || {
        let tracker = tracker.clone();
        async move {
            loop {
                tokio::time::sleep(VISIBILITY_POLL).await;
                measure_viewport(&tracker).await;

                let observed: Vec<(ElementHandle, Rc<MountedData>)> = controller
                    .mounted
                    .peek()
                    .iter()
                    .filter(|(handle, _)| tracker.is_observed(**handle))
                    .map(|(handle, element)| (*handle, element.clone()))
                    .collect();
                for (handle, element) in observed {
                    match element.get_client_rect().await {
                        Ok(rect) => tracker.update_element(
                            handle,
                            Rect::new(rect.origin.x, rect.origin.y, rect.size.width, rect.size.height),
                        ),
                        Err(e) => log::debug!("Cannot measure {:?}: {:?}", handle, e),
                    }
                }

                let loader = controller.loader.peek().clone();
                loader.poll_visibility();
            }
        }
    });

    controller
}

async fn run_slideshow_driver(state: Signal<GalleryState>) {
    let target = SignalSlideshow(state);
    photo_gallery::run_slideshow(&target).await;
}

async fn measure_viewport(tracker: &ViewportTracker) {
    match document::eval(VIEWPORT_SCRIPT).join::<(f64, f64)>().await {
        Ok((width, height)) => tracker.set_viewport(Rect::new(0.0, 0.0, width, height)),
        Err(e) => {
            log::debug!("Cannot read viewport size: {:?}", e);
            tracker.set_viewport(FALLBACK_VIEWPORT);
        }
    }
}
