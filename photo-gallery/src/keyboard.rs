//! Keyboard navigation for the lightbox
//!
//! The navigator translates key presses into [`GalleryAction`]s while the
//! lightbox is open, keeps focus inside the lightbox and produces short
//! announcements for screen readers. It does not change gallery state
//! itself: the caller applies the returned action.

use crate::models::GalleryAction;
use std::rc::Rc;
use std::time::Duration;

/// How long an announcement stays in the live region
pub const ANNOUNCEMENT_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Escape,
    Space,
    Enter,
    Tab,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    /// Builds an input from a DOM `KeyboardEvent.key` value
    pub fn from_dom(key: &str, shift: bool) -> Self {
        let key = match key {
            "ArrowLeft" => Key::ArrowLeft,
            "ArrowRight" => Key::ArrowRight,
            "ArrowUp" => Key::ArrowUp,
            "ArrowDown" => Key::ArrowDown,
            "Home" => Key::Home,
            "End" => Key::End,
            "Escape" | "Esc" => Key::Escape,
            " " | "Space" | "Spacebar" => Key::Space,
            "Enter" => Key::Enter,
            "Tab" => Key::Tab,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => Key::Other,
                }
            }
        };
        Self { key, shift }
    }
}

/// Identifier of a focusable element, assigned by the view layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FocusHandle(pub u64);

/// Focus management provided by the host
pub trait FocusHost {
    /// Focusable elements in tab order: the lightbox's while it is shown, the page's otherwise
    fn focusable_elements(&self) -> Vec<FocusHandle>;
    fn active_element(&self) -> Option<FocusHandle>;
    fn focus(&self, handle: FocusHandle);
    /// True while `handle` is still part of the document
    fn contains(&self, handle: FocusHandle) -> bool;
    /// Clicks the element
    fn activate(&self, handle: FocusHandle);
    /// Focuses the lightbox container itself; false if it cannot take focus
    fn focus_container(&self) -> bool;
}

/// Token identifying the announcement that a delayed clear applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnouncementToken(u64);

/// Result of handling one key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyOutcome {
    pub action: Option<GalleryAction>,
    pub prevent_default: bool,
    /// Set when a new announcement was made; clear it after [`ANNOUNCEMENT_TIMEOUT`]
    pub announcement: Option<AnnouncementToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
    pub keys: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutGroup {
    pub title: &'static str,
    pub shortcuts: Vec<Shortcut>,
}

/// Help table of all keyboard shortcuts
pub fn keyboard_shortcuts() -> Vec<ShortcutGroup> {
    let group = |title, entries: &[(&'static str, &'static str)]| ShortcutGroup {
        title,
        shortcuts: entries
            .iter()
            .map(|&(keys, description)| Shortcut { keys, description })
            .collect(),
    };
    vec![
        group(
            "Navigation",
            &[
                ("Arrow Keys", "Navigate between images"),
                ("Home", "Go to first image"),
                ("End", "Go to last image"),
                ("Escape", "Close gallery"),
            ],
        ),
        group(
            "Controls",
            &[
                ("Space", "Toggle slideshow"),
                ("+/=", "Zoom in"),
                ("-", "Zoom out"),
                ("F", "Toggle fullscreen"),
            ],
        ),
        group(
            "Accessibility",
            &[
                ("Tab", "Navigate between controls"),
                ("Enter", "Activate focused control"),
            ],
        ),
    ]
}

fn action_for(key: Key) -> Option<(GalleryAction, &'static str)> {
    let mapped = match key {
        Key::ArrowLeft | Key::ArrowUp => (GalleryAction::Previous, "Previous image"),
        Key::ArrowRight | Key::ArrowDown => (GalleryAction::Next, "Next image"),
        Key::Home => (GalleryAction::First, "First image"),
        Key::End => (GalleryAction::Last, "Last image"),
        Key::Escape => (GalleryAction::Close, "Gallery closed"),
        Key::Space => (GalleryAction::ToggleSlideshow, "Slideshow toggled"),
        Key::Char('+') | Key::Char('=') => (GalleryAction::ZoomIn, "Zoomed in"),
        Key::Char('-') => (GalleryAction::ZoomOut, "Zoomed out"),
        Key::Char('f') | Key::Char('F') => (GalleryAction::ToggleFullscreen, "Fullscreen toggled"),
        _ => return None,
    };
    Some(mapped)
}

pub struct KeyboardNavigator {
    host: Rc<dyn FocusHost>,
    active: bool,
    shortcuts_enabled: bool,
    previous_focus: Option<FocusHandle>,
    announcement: Option<&'static str>,
    announcement_seq: u64,
}

impl KeyboardNavigator {
    pub fn new(host: Rc<dyn FocusHost>) -> Self {
        Self {
            host,
            active: false,
            shortcuts_enabled: true,
            previous_focus: None,
            announcement: None,
            announcement_seq: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Follows the lightbox: active while it is open
    pub fn set_active(&mut self, active: bool) {
        if active == self.active {
            return;
        }
        self.active = active;

        if active {
            self.previous_focus = self.host.active_element();
            if !self.host.focus_container() {
                if let Some(first) = self.host.focusable_elements().first() {
                    self.host.focus(*first);
                }
            }
        } else {
            let restored = match self.previous_focus.take() {
                Some(previous) if self.host.contains(previous) => {
                    self.host.focus(previous);
                    true
                }
                Some(previous) => {
                    log::debug!("Previously focused element {:?} is gone", previous);
                    false
                }
                None => false,
            };
            if !restored {
                if let Some(first) = self.host.focusable_elements().first() {
                    self.host.focus(*first);
                }
            }
        }
    }

    pub fn set_shortcuts_enabled(&mut self, enabled: bool) {
        self.shortcuts_enabled = enabled;
    }

    /// Current live-region text, if any
    pub fn announcement(&self) -> Option<&'static str> {
        self.announcement
    }

    pub fn announce(&mut self, message: &'static str) -> AnnouncementToken {
        self.announcement_seq += 1;
        self.announcement = Some(message);
        AnnouncementToken(self.announcement_seq)
    }

    /// Clears the live region if `token` is still the latest announcement
    pub fn clear_announcement(&mut self, token: AnnouncementToken) {
        if token.0 == self.announcement_seq {
            self.announcement = None;
        }
    }

    pub fn handle_key(&mut self, input: KeyInput) -> KeyOutcome {
        if !self.active {
            return KeyOutcome::default();
        }

        if input.key == Key::Tab {
            return self.trap_focus(input.shift);
        }

        if !self.shortcuts_enabled {
            return KeyOutcome::default();
        }

        if input.key == Key::Enter {
            if let Some(focused) = self.host.active_element() {
                self.host.activate(focused);
            }
            return KeyOutcome {
                prevent_default: true,
                ..KeyOutcome::default()
            };
        }

        match action_for(input.key) {
            Some((action, message)) => KeyOutcome {
                action: Some(action),
                prevent_default: true,
                announcement: Some(self.announce(message)),
            },
            None => KeyOutcome::default(),
        }
    }

    /// Wraps Tab/Shift+Tab at the ends of the focusable list
    fn trap_focus(&self, backwards: bool) -> KeyOutcome {
        let elements = self.host.focusable_elements();
        let (Some(first), Some(last)) = (elements.first().copied(), elements.last().copied())
        else {
            return KeyOutcome::default();
        };

        let current = self.host.active_element();
        let inside = current.is_some_and(|c| elements.contains(&c));
        let target = match (backwards, current) {
            _ if !inside => Some(if backwards { last } else { first }),
            (true, Some(c)) if c == first => Some(last),
            (false, Some(c)) if c == last => Some(first),
            _ => None,
        };

        match target {
            Some(target) => {
                self.host.focus(target);
                KeyOutcome {
                    prevent_default: true,
                    ..KeyOutcome::default()
                }
            }
            None => KeyOutcome::default(),
        }
    }
}

impl std::fmt::Debug for KeyboardNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyboardNavigator")
            .field("active", &self.active)
            .field("shortcuts_enabled", &self.shortcuts_enabled)
            .field("announcement", &self.announcement)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct FakeFocus {
        elements: RefCell<Vec<FocusHandle>>,
        active: Cell<Option<FocusHandle>>,
        detached: RefCell<Vec<FocusHandle>>,
        clicked: RefCell<Vec<FocusHandle>>,
        container_focusable: bool,
    }

    impl FakeFocus {
        fn new(ids: &[u64], container_focusable: bool) -> Rc<Self> {
            Rc::new(Self {
                elements: RefCell::new(ids.iter().map(|id| FocusHandle(*id)).collect()),
                active: Cell::new(None),
                detached: RefCell::new(Vec::new()),
                clicked: RefCell::new(Vec::new()),
                container_focusable,
            })
        }
    }

    impl FocusHost for FakeFocus {
        fn focusable_elements(&self) -> Vec<FocusHandle> {
            self.elements.borrow().clone()
        }
        fn active_element(&self) -> Option<FocusHandle> {
            self.active.get()
        }
        fn focus(&self, handle: FocusHandle) {
            self.active.set(Some(handle));
        }
        fn contains(&self, handle: FocusHandle) -> bool {
            !self.detached.borrow().contains(&handle)
        }
        fn activate(&self, handle: FocusHandle) {
            self.clicked.borrow_mut().push(handle);
        }
        fn focus_container(&self) -> bool {
            if self.container_focusable {
                self.active.set(Some(FocusHandle(0)));
            }
            self.container_focusable
        }
    }

    fn active_navigator(host: Rc<FakeFocus>) -> KeyboardNavigator {
        let mut nav = KeyboardNavigator::new(host);
        nav.set_active(true);
        nav
    }

    #[test]
    fn test_dom_key_names() {
        assert_eq!(KeyInput::from_dom(" ", false).key, Key::Space);
        assert_eq!(KeyInput::from_dom("ArrowUp", false).key, Key::ArrowUp);
        assert_eq!(KeyInput::from_dom("F", true).key, Key::Char('F'));
        assert_eq!(KeyInput::from_dom("Shift", true).key, Key::Other);
    }

    #[test]
    fn test_key_mapping() {
        let mut nav = active_navigator(FakeFocus::new(&[1, 2], true));
        let cases = [
            ("ArrowLeft", GalleryAction::Previous, "Previous image"),
            ("ArrowUp", GalleryAction::Previous, "Previous image"),
            ("ArrowRight", GalleryAction::Next, "Next image"),
            ("ArrowDown", GalleryAction::Next, "Next image"),
            ("Home", GalleryAction::First, "First image"),
            ("End", GalleryAction::Last, "Last image"),
            ("Escape", GalleryAction::Close, "Gallery closed"),
            (" ", GalleryAction::ToggleSlideshow, "Slideshow toggled"),
            ("+", GalleryAction::ZoomIn, "Zoomed in"),
            ("=", GalleryAction::ZoomIn, "Zoomed in"),
            ("-", GalleryAction::ZoomOut, "Zoomed out"),
            ("f", GalleryAction::ToggleFullscreen, "Fullscreen toggled"),
            ("F", GalleryAction::ToggleFullscreen, "Fullscreen toggled"),
        ];
        for (key, action, message) in cases {
            let outcome = nav.handle_key(KeyInput::from_dom(key, false));
            assert_eq!(outcome.action, Some(action), "{key}");
            assert!(outcome.prevent_default);
            assert_eq!(nav.announcement(), Some(message));
        }

        let outcome = nav.handle_key(KeyInput::from_dom("x", false));
        assert_eq!(outcome, KeyOutcome::default());
    }

    #[test]
    fn test_inactive_ignores_keys() {
        let mut nav = KeyboardNavigator::new(FakeFocus::new(&[1], true));
        let outcome = nav.handle_key(KeyInput::new(Key::Escape));
        assert_eq!(outcome, KeyOutcome::default());
        assert_eq!(nav.announcement(), None);
    }

    #[test]
    fn test_disabled_shortcuts_keep_focus_trap() {
        let host = FakeFocus::new(&[1, 2], false);
        let mut nav = active_navigator(host.clone());
        nav.set_shortcuts_enabled(false);

        assert_eq!(nav.handle_key(KeyInput::new(Key::ArrowRight)).action, None);

        host.focus(FocusHandle(2));
        let outcome = nav.handle_key(KeyInput::new(Key::Tab));
        assert!(outcome.prevent_default);
        assert_eq!(host.active_element(), Some(FocusHandle(1)));
    }

    #[test]
    fn test_focus_trap_wraps_both_ways() {
        let host = FakeFocus::new(&[1, 2, 3], true);
        let mut nav = active_navigator(host.clone());

        host.focus(FocusHandle(3));
        assert!(nav.handle_key(KeyInput::new(Key::Tab)).prevent_default);
        assert_eq!(host.active_element(), Some(FocusHandle(1)));

        let outcome = nav.handle_key(KeyInput {
            key: Key::Tab,
            shift: true,
        });
        assert!(outcome.prevent_default);
        assert_eq!(host.active_element(), Some(FocusHandle(3)));

        // inside the list the browser moves focus itself
        host.focus(FocusHandle(2));
        assert!(!nav.handle_key(KeyInput::new(Key::Tab)).prevent_default);
    }

    #[test]
    fn test_focus_outside_container_is_pulled_back() {
        let host = FakeFocus::new(&[4, 5], true);
        let mut nav = active_navigator(host.clone());
        host.focus(FocusHandle(99));
        assert!(nav.handle_key(KeyInput::new(Key::Tab)).prevent_default);
        assert_eq!(host.active_element(), Some(FocusHandle(4)));
    }

    #[test]
    fn test_focus_restored_on_deactivation() {
        let host = FakeFocus::new(&[1, 2], true);
        host.focus(FocusHandle(42));
        let mut nav = active_navigator(host.clone());
        assert_eq!(host.active_element(), Some(FocusHandle(0)));

        nav.set_active(false);
        assert_eq!(host.active_element(), Some(FocusHandle(42)));
    }

    #[test]
    fn test_focus_falls_back_to_first_element_when_previous_is_gone() {
        let host = FakeFocus::new(&[1, 2], false);
        host.focus(FocusHandle(42));
        let mut nav = active_navigator(host.clone());
        assert_eq!(host.active_element(), Some(FocusHandle(1)));

        // lightbox controls are gone, the page's thumbnails remain
        host.detached.borrow_mut().push(FocusHandle(42));
        *host.elements.borrow_mut() = vec![FocusHandle(7), FocusHandle(8)];
        host.focus(FocusHandle(2));
        nav.set_active(false);
        assert_eq!(host.active_element(), Some(FocusHandle(7)));
    }

    #[test]
    fn test_focus_falls_back_when_nothing_was_focused() {
        let host = FakeFocus::new(&[3, 4], true);
        let mut nav = active_navigator(host.clone());
        assert_eq!(host.active_element(), Some(FocusHandle(0)));

        nav.set_active(false);
        assert_eq!(host.active_element(), Some(FocusHandle(3)));
    }

    #[test]
    fn test_enter_activates_focused_element() {
        let host = FakeFocus::new(&[1, 2], false);
        let mut nav = active_navigator(host.clone());
        host.focus(FocusHandle(2));

        let outcome = nav.handle_key(KeyInput::new(Key::Enter));
        assert!(outcome.prevent_default);
        assert_eq!(outcome.action, None);
        assert_eq!(*host.clicked.borrow(), vec![FocusHandle(2)]);
    }

    #[test]
    fn test_stale_clear_keeps_newer_announcement() {
        let mut nav = active_navigator(FakeFocus::new(&[], true));
        let first = nav
            .handle_key(KeyInput::new(Key::ArrowRight))
            .announcement
            .unwrap();
        let second = nav
            .handle_key(KeyInput::new(Key::ArrowRight))
            .announcement
            .unwrap();

        nav.clear_announcement(first);
        assert_eq!(nav.announcement(), Some("Next image"));
        nav.clear_announcement(second);
        assert_eq!(nav.announcement(), None);
    }

    #[test]
    fn test_shortcut_groups() {
        let groups = keyboard_shortcuts();
        let titles: Vec<_> = groups.iter().map(|g| g.title).collect();
        assert_eq!(titles, ["Navigation", "Controls", "Accessibility"]);
        assert_eq!(groups[1].shortcuts[0].keys, "Space");
    }
}
