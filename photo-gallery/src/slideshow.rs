//! Timer driver for the lightbox slideshow
//!
//! The driver is a plain async loop: it takes a ticket, sleeps for the
//! interval, and presents the ticket back. It ends as soon as a ticket is
//! rejected, so a host starts a fresh driver whenever
//! `GalleryState::slideshow_ticket` changes.

use crate::state::{GalleryState, SlideshowTicket};
use std::cell::RefCell;
use std::time::Duration;

/// Anything that can hand out and redeem slideshow tickets
pub trait SlideshowTarget {
    fn slideshow_ticket(&self) -> Option<(SlideshowTicket, Duration)>;
    fn advance_slideshow(&self, ticket: SlideshowTicket) -> bool;
}

impl SlideshowTarget for RefCell<GalleryState> {
    fn slideshow_ticket(&self) -> Option<(SlideshowTicket, Duration)> {
        let state = self.borrow();
        state
            .slideshow_ticket()
            .map(|ticket| (ticket, state.slideshow_interval()))
    }

    fn advance_slideshow(&self, ticket: SlideshowTicket) -> bool {
        self.borrow_mut().advance_slideshow(ticket)
    }
}

/// Advances `target` every interval until its ticket goes stale
///
/// Returns the number of advances made.
pub async fn run_slideshow<T: SlideshowTarget + ?Sized>(target: &T) -> usize {
    let Some((ticket, interval)) = target.slideshow_ticket() else {
        return 0;
    };
    log::debug!("Slideshow running every {:?}", interval);

    let mut advanced = 0;
    loop {
        tokio::time::sleep(interval).await;
        if !target.advance_slideshow(ticket) {
            break;
        }
        advanced += 1;
    }

    log::debug!("Slideshow stopped after {} advances", advanced);
    advanced
}
