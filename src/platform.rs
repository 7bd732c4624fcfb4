//! The page as seen by the lightbox.
//!
//! Everything that touches the browser goes through the traits in this module:
//! image probes, timers, image elements, and the modal markup. The lightbox
//! never blocks on any of them. It starts work through a trait call and picks
//! the result up later when the host reports it back (probe outcomes and timer
//! expiries are delivered to [`Page::dispatch`](crate::page::Page::dispatch)).
//!
//! Capabilities are resolved once, when the platform is built, and handed to
//! the components as plain values.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Stable identity of a page element.
///
/// The host owns the mapping from keys to real elements; the lightbox only
/// stores and compares keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey(pub u64);

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether the page can report element visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectionSupport {
    Supported,
    Unsupported,
}

/// Coarse device class, used to choose how the full-size image is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    /// Touch-first devices get the full image in a new window instead of fullscreen.
    Touch,
}

/// Platform capabilities, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub intersection: IntersectionSupport,
    pub device: DeviceClass,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            intersection: IntersectionSupport::Supported,
            device: DeviceClass::Desktop,
        }
    }
}

/// Which component started a probe. Outcomes are routed back by owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeOwner {
    Lazy,
    Gallery,
}

/// Handle for one in-flight image probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeTicket {
    pub owner: ProbeOwner,
    pub seq: u64,
}

impl fmt::Display for ProbeTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owner = match self.owner {
            ProbeOwner::Lazy => "lazy",
            ProbeOwner::Gallery => "gallery",
        };
        write!(f, "{owner}-{}", self.seq)
    }
}

/// Hands out probe tickets for one owner.
#[derive(Debug)]
pub(crate) struct TicketCounter {
    owner: ProbeOwner,
    next: u64,
}

impl TicketCounter {
    pub(crate) fn new(owner: ProbeOwner) -> Self {
        Self { owner, next: 0 }
    }

    pub(crate) fn issue(&mut self) -> ProbeTicket {
        self.next += 1;
        ProbeTicket {
            owner: self.owner,
            seq: self.next,
        }
    }
}

/// Natural size of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Why an image did not load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// The request failed (missing file, network error).
    #[error("network error: {0}")]
    Network(String),
    /// The bytes arrived but could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
    /// The image decoded to a zero-sized result.
    #[error("image has zero dimensions")]
    ZeroDimensions,
}

/// What the host reports when a probe settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Decoded(Dimensions),
    Failed(LoadFailure),
}

impl ProbeOutcome {
    /// Collapse into a result. A decode with a zero side counts as a failure.
    pub fn into_result(self) -> Result<Dimensions, LoadFailure> {
        match self {
            ProbeOutcome::Decoded(dims) if dims.width > 0 && dims.height > 0 => Ok(dims),
            ProbeOutcome::Decoded(_) => Err(LoadFailure::ZeroDimensions),
            ProbeOutcome::Failed(failure) => Err(failure),
        }
    }
}

/// Visual load state of an image element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Loaded,
    Error,
}

/// Timers the lightbox asks the host to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Look for the modal markup again.
    AnchorRetry,
    /// Start the background sweep for a session.
    SweepStart { session: u64 },
    /// Issue the next background batch for a session.
    SweepBatch { session: u64 },
}

/// Header text for an opened project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalHeader {
    pub project_id: String,
    pub title: String,
    pub type_label: String,
    pub image_count: usize,
}

/// One-line, user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    ModalUnavailable,
    ProjectsUnavailable,
    ProjectNotFound(String),
    NoImages(String),
    PopupBlocked,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::ModalUnavailable => {
                f.write_str("The gallery is not available right now. Please reload the page.")
            }
            Notice::ProjectsUnavailable => {
                f.write_str("Project information is still loading. Please try again.")
            }
            Notice::ProjectNotFound(id) => write!(f, "Project \"{id}\" could not be found."),
            Notice::NoImages(name) => write!(f, "{name} has no images to show yet."),
            Notice::PopupBlocked => {
                f.write_str("Please allow pop-ups for this site to view the full image.")
            }
        }
    }
}

/// Detached image loading.
pub trait ImageProbe {
    /// Start loading `src`. The outcome comes back later under `ticket`.
    fn begin_probe(&mut self, ticket: ProbeTicket, src: &str);
}

/// Deferred callbacks.
pub trait Scheduler {
    /// Deliver `timer` back after `delay`.
    fn schedule(&mut self, timer: Timer, delay: Duration);
}

/// Image elements managed by the lazy loader.
pub trait ImageElements {
    fn set_source(&mut self, key: ElementKey, src: &str);
    fn set_load_state(&mut self, key: ElementKey, state: LoadState);
    fn fade_in(&mut self, key: ElementKey);
    fn observe_intersection(&mut self, key: ElementKey);
    fn unobserve_intersection(&mut self, key: ElementKey);
    fn disconnect_observer(&mut self);
}

/// The shared modal overlay.
pub trait ModalSurface {
    /// Whether the modal markup (overlay, main image, thumbnail strip) exists.
    fn anchors_ready(&self) -> bool;
    fn show_modal(&mut self, header: &ModalHeader);
    fn hide_modal(&mut self);
    fn set_main_image(&mut self, src: &str, alt: &str);
    fn set_main_image_loading(&mut self, loading: bool);
    /// Replace the thumbnail strip; returns one element key per thumbnail.
    fn render_thumbnails(&mut self, sources: &[String]) -> Vec<ElementKey>;
    fn set_active_thumbnail(&mut self, index: usize);
    fn scroll_thumbnail_into_view(&mut self, index: usize);
    /// `current` is 1-based.
    fn set_counter(&mut self, current: usize, total: usize);
    fn set_nav_enabled(&mut self, enabled: bool);
    fn set_no_scroll(&mut self, on: bool);
    fn set_fullscreen(&mut self, on: bool);
    fn focused(&self) -> Option<ElementKey>;
    /// Focusable elements inside the modal, in tab order.
    fn modal_focusables(&self) -> Vec<ElementKey>;
    fn focus(&mut self, key: ElementKey);
    fn notify(&mut self, notice: &Notice);
    /// Open `src` in a new window. `false` means the window was blocked.
    fn open_window(&mut self, src: &str) -> bool;
}

/// Everything a [`Page`](crate::page::Page) needs from its host.
pub trait Platform: ImageProbe + Scheduler + ImageElements + ModalSurface {
    fn capabilities(&self) -> Capabilities;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_width_decode_is_failure() {
        let outcome = ProbeOutcome::Decoded(Dimensions {
            width: 0,
            height: 600,
        });
        assert_eq!(outcome.into_result(), Err(LoadFailure::ZeroDimensions));
    }

    #[test]
    fn decoded_with_size_is_success() {
        let dims = Dimensions {
            width: 1,
            height: 1,
        };
        assert_eq!(ProbeOutcome::Decoded(dims).into_result(), Ok(dims));
    }

    #[test]
    fn tickets_are_sequential_per_owner() {
        let mut counter = TicketCounter::new(ProbeOwner::Gallery);
        let a = counter.issue();
        let b = counter.issue();
        assert_eq!(a.owner, ProbeOwner::Gallery);
        assert_eq!(b.seq, a.seq + 1);
        assert_eq!(b.to_string(), "gallery-2");
    }

    #[test]
    fn load_failure_is_an_error_with_readable_text() {
        let failure: Box<dyn std::error::Error> = Box::new(LoadFailure::Network("404".into()));
        assert_eq!(failure.to_string(), "network error: 404");
        assert_eq!(
            LoadFailure::ZeroDimensions.to_string(),
            "image has zero dimensions"
        );
    }

    #[test]
    fn notice_text_names_the_project() {
        let text = Notice::ProjectNotFound("missing".into()).to_string();
        assert!(text.contains("\"missing\""));
    }
}
