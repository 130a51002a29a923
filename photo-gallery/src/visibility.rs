//! Visibility detection for lazily loaded elements
//!
//! An element counts as visible once it intersects the viewport grown by the
//! root margin, by at least `threshold` of its own area.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Opaque identifier of a view element, assigned by the view layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(pub u64);

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Grows the rectangle by `margin` on every side
    pub fn expand(&self, margin: f64) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    /// Overlap as `(width, height)`, negative when the rectangles are apart
    fn overlap(&self, other: &Rect) -> (f64, f64) {
        let w = (self.x + self.width).min(other.x + other.width) - self.x.max(other.x);
        let h = (self.y + self.height).min(other.y + other.height) - self.y.max(other.y);
        (w, h)
    }

    /// True when `element` is visible inside this (root) rectangle
    pub fn reveals(&self, element: &Rect, threshold: f64) -> bool {
        let (w, h) = self.overlap(element);
        if w < 0.0 || h < 0.0 {
            return false;
        }
        let area = element.area();
        if threshold <= 0.0 || area == 0.0 {
            return true;
        }
        (w * h) / area >= threshold
    }
}

/// Source of "element became visible" notifications
pub trait VisibilityObserver {
    /// False when the host cannot detect visibility; the loader then loads eagerly
    fn is_supported(&self) -> bool;
    fn observe(&self, handle: ElementHandle);
    fn unobserve(&self, handle: ElementHandle);
    /// Observed elements that are currently visible
    fn take_visible(&self) -> Vec<ElementHandle>;
}

/// Observer for hosts without visibility detection
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedObserver;

impl VisibilityObserver for UnsupportedObserver {
    fn is_supported(&self) -> bool {
        false
    }
    fn observe(&self, _handle: ElementHandle) {}
    fn unobserve(&self, _handle: ElementHandle) {}
    fn take_visible(&self) -> Vec<ElementHandle> {
        Vec::new()
    }
}

/// Rect-based observer: the host reports the viewport and element rects
#[derive(Debug)]
pub struct ViewportTracker {
    root_margin: f64,
    threshold: f64,
    viewport: Cell<Option<Rect>>,
    rects: RefCell<HashMap<ElementHandle, Rect>>,
    observed: RefCell<Vec<ElementHandle>>,
}

impl ViewportTracker {
    pub fn new(root_margin: f64, threshold: f64) -> Self {
        Self {
            root_margin,
            threshold: threshold.clamp(0.0, 1.0),
            viewport: Cell::new(None),
            rects: RefCell::new(HashMap::new()),
            observed: RefCell::new(Vec::new()),
        }
    }

    pub fn set_viewport(&self, viewport: Rect) {
        self.viewport.set(Some(viewport));
    }

    pub fn update_element(&self, handle: ElementHandle, rect: Rect) {
        self.rects.borrow_mut().insert(handle, rect);
    }

    pub fn is_observed(&self, handle: ElementHandle) -> bool {
        self.observed.borrow().contains(&handle)
    }

    fn is_visible(&self, handle: ElementHandle) -> bool {
        let Some(viewport) = self.viewport.get() else {
            return false;
        };
        self.rects
            .borrow()
            .get(&handle)
            .is_some_and(|rect| viewport.expand(self.root_margin).reveals(rect, self.threshold))
    }
}

impl VisibilityObserver for ViewportTracker {
    fn is_supported(&self) -> bool {
        true
    }

    fn observe(&self, handle: ElementHandle) {
        let mut observed = self.observed.borrow_mut();
        if !observed.contains(&handle) {
            observed.push(handle);
        }
    }

    /// Also forgets the element's last known rect
    fn unobserve(&self, handle: ElementHandle) {
        self.observed.borrow_mut().retain(|h| *h != handle);
        self.rects.borrow_mut().remove(&handle);
    }

    fn take_visible(&self) -> Vec<ElementHandle> {
        let observed = self.observed.borrow().clone();
        observed
            .into_iter()
            .filter(|handle| self.is_visible(*handle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 800.0, 600.0)
    }

    #[test]
    fn test_root_margin_extends_viewport() {
        let below = Rect::new(0.0, 700.0, 200.0, 200.0);
        assert!(!viewport().reveals(&below, 0.1));
        assert!(viewport().expand(200.0).reveals(&below, 0.1));
    }

    #[test]
    fn test_threshold_requires_fraction_of_area() {
        // 10px of a 200px tall element is inside: 5%
        let edge = Rect::new(0.0, 590.0, 100.0, 200.0);
        assert!(!viewport().reveals(&edge, 0.1));
        assert!(viewport().reveals(&edge, 0.05));
        assert!(viewport().reveals(&edge, 0.0));
    }

    #[test]
    fn test_tracker_reports_only_observed_visible_elements() {
        let tracker = ViewportTracker::new(200.0, 0.1);
        tracker.set_viewport(viewport());

        let near = ElementHandle(1);
        let far = ElementHandle(2);
        let unobserved = ElementHandle(3);
        tracker.update_element(near, Rect::new(0.0, 650.0, 200.0, 200.0));
        tracker.update_element(far, Rect::new(0.0, 5000.0, 200.0, 200.0));
        tracker.update_element(unobserved, Rect::new(0.0, 0.0, 200.0, 200.0));
        tracker.observe(near);
        tracker.observe(far);

        assert_eq!(tracker.take_visible(), vec![near]);

        tracker.unobserve(near);
        assert!(tracker.take_visible().is_empty());
    }

    #[test]
    fn test_unobserve_drops_rect() {
        let tracker = ViewportTracker::new(200.0, 0.1);
        tracker.set_viewport(viewport());
        for i in 0..1000 {
            let handle = ElementHandle(i);
            tracker.observe(handle);
            tracker.update_element(handle, Rect::new(0.0, 5000.0, 10.0, 10.0));
            tracker.unobserve(handle);
        }
        assert!(tracker.observed.borrow().is_empty());
        assert!(tracker.rects.borrow().is_empty());
    }

    #[test]
    fn test_no_viewport_means_nothing_visible() {
        let tracker = ViewportTracker::new(200.0, 0.1);
        tracker.update_element(ElementHandle(1), Rect::new(0.0, 0.0, 10.0, 10.0));
        tracker.observe(ElementHandle(1));
        assert!(tracker.take_visible().is_empty());
    }
}
