//! Capabilities the hosting environment provides to the gallery
//!
//! The gallery core never touches a DOM or a window directly. Whatever owns
//! the view hands in small capability objects at construction time and keeps
//! ownership of them; the core only borrows them through `Rc`.

use std::rc::Rc;

/// Error type for host capability calls
#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    Unsupported(String),
    Failed(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Unsupported(msg) => write!(f, "Not supported: {}", msg),
            HostError::Failed(msg) => write!(f, "Host call failed: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}

/// Suspends scrolling of the page behind the lightbox
pub trait ScrollLock {
    fn lock_scroll(&self);
    fn unlock_scroll(&self);
}

/// Full-window presentation of the lightbox container
pub trait FullscreenHost {
    fn is_fullscreen(&self) -> bool;
    fn request_fullscreen(&self) -> Result<(), HostError>;
    fn exit_fullscreen(&self) -> Result<(), HostError>;
    /// True when request/exit only start the change and the result arrives
    /// later through `GalleryState::sync_fullscreen`
    fn reports_asynchronously(&self) -> bool {
        false
    }
}

/// Holds the background scroll lock; releasing happens on drop
///
/// Dropping the guard is the only way to unlock, so every exit path of the
/// lightbox (explicit close, the gallery state being dropped on unmount or on
/// a collection switch) releases the lock exactly once.
pub struct ScrollLockGuard {
    host: Rc<dyn ScrollLock>,
}

impl ScrollLockGuard {
    pub fn acquire(host: Rc<dyn ScrollLock>) -> Self {
        host.lock_scroll();
        Self { host }
    }
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        self.host.unlock_scroll();
    }
}

impl std::fmt::Debug for ScrollLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrollLockGuard").finish_non_exhaustive()
    }
}

/// Host without scrolling or fullscreen support (tests, headless use)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHost;

impl ScrollLock for NoopHost {
    fn lock_scroll(&self) {}
    fn unlock_scroll(&self) {}
}

impl FullscreenHost for NoopHost {
    fn is_fullscreen(&self) -> bool {
        false
    }

    fn request_fullscreen(&self) -> Result<(), HostError> {
        Err(HostError::Unsupported("fullscreen".to_string()))
    }

    fn exit_fullscreen(&self) -> Result<(), HostError> {
        Err(HostError::Unsupported("fullscreen".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingLock {
        locks: Cell<u32>,
        unlocks: Cell<u32>,
    }

    impl ScrollLock for CountingLock {
        fn lock_scroll(&self) {
            self.locks.set(self.locks.get() + 1);
        }
        fn unlock_scroll(&self) {
            self.unlocks.set(self.unlocks.get() + 1);
        }
    }

    #[test]
    fn test_guard_unlocks_on_drop() {
        let host = Rc::new(CountingLock::default());
        let guard = ScrollLockGuard::acquire(host.clone());
        assert_eq!(host.locks.get(), 1);
        assert_eq!(host.unlocks.get(), 0);

        drop(guard);
        assert_eq!(host.unlocks.get(), 1);
    }

    #[test]
    fn test_noop_host_reports_unsupported_fullscreen() {
        let host = NoopHost;
        assert!(!host.is_fullscreen());
        assert!(matches!(
            host.request_fullscreen(),
            Err(HostError::Unsupported(_))
        ));
    }
}
