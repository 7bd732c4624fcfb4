//! Page-level wiring.
//!
//! A [`Page`] is built once per page load. It owns the platform, the optional
//! [`LazyLoader`], and the [`GalleryModal`], and it is the only thing the host
//! talks to: every DOM event, probe outcome, and timer expiry goes through
//! [`Page::dispatch`].

use crate::config::LightboxConfig;
use crate::gallery::{GalleryModal, OpenError};
use crate::input::{KeyDisposition, KeyInput};
use crate::lazy::{IntersectionEntry, LazyLoader};
use crate::platform::{Platform, ProbeOutcome, ProbeOwner, ProbeTicket, Timer};
use crate::types::ProjectCatalog;
use tracing::debug;

/// Everything the host can report.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    /// An element carrying a project id was activated.
    ProjectActivated(String),
    ProbeSettled {
        ticket: ProbeTicket,
        outcome: ProbeOutcome,
    },
    TimerFired(Timer),
    Intersections(Vec<IntersectionEntry>),
    Key(KeyInput),
    TouchStart { x: f64 },
    TouchEnd { x: f64 },
    ThumbnailClicked(usize),
    MainImageClicked,
    NextClicked,
    PreviousClicked,
    CloseClicked,
    BackdropClicked,
}

pub struct Page<P: Platform> {
    platform: P,
    lazy: Option<LazyLoader>,
    gallery: GalleryModal,
}

impl<P: Platform> Page<P> {
    /// Build the page services and start looking for the modal markup.
    pub fn new(platform: P, config: LightboxConfig) -> Self {
        let capabilities = platform.capabilities();
        let lazy = LazyLoader::new(capabilities.intersection, config.lazy.clone());
        Self::assemble(platform, config, Some(lazy))
    }

    /// Same as [`Page::new`], but thumbnails load directly.
    pub fn without_lazy_loader(platform: P, config: LightboxConfig) -> Self {
        Self::assemble(platform, config, None)
    }

    fn assemble(mut platform: P, config: LightboxConfig, lazy: Option<LazyLoader>) -> Self {
        let mut gallery = GalleryModal::new(config, platform.capabilities());
        gallery.attach(&mut platform);
        Self {
            platform,
            lazy,
            gallery,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn into_platform(self) -> P {
        self.platform
    }

    pub fn gallery(&self) -> &GalleryModal {
        &self.gallery
    }

    pub fn lazy(&self) -> Option<&LazyLoader> {
        self.lazy.as_ref()
    }

    /// The lazy loader, for page images outside the gallery.
    pub fn lazy_parts(&mut self) -> Option<(&mut LazyLoader, &mut P)> {
        self.lazy.as_mut().map(|lazy| (lazy, &mut self.platform))
    }

    pub fn set_projects_data(&mut self, catalog: ProjectCatalog) {
        self.gallery.set_projects_data(catalog);
    }

    pub fn open_project(&mut self, id: &str) -> Result<(), OpenError> {
        self.gallery
            .open_project(&mut self.platform, self.lazy.as_mut(), id)
    }

    /// Route one host event.
    ///
    /// The result tells the host whether to suppress the browser's default
    /// action. Only key presses are ever left to the browser.
    pub fn dispatch(&mut self, event: PageEvent) -> KeyDisposition {
        let platform = &mut self.platform;
        match event {
            PageEvent::ProjectActivated(id) => {
                // Failures were already shown to the user and logged.
                let _ = self.gallery.open_project(platform, self.lazy.as_mut(), &id);
            }
            PageEvent::ProbeSettled { ticket, outcome } => match ticket.owner {
                ProbeOwner::Gallery => self.gallery.probe_settled(platform, ticket, outcome),
                ProbeOwner::Lazy => match self.lazy.as_mut() {
                    Some(lazy) => lazy.probe_settled(platform, ticket, outcome),
                    None => debug!(%ticket, "lazy probe settled without a lazy loader"),
                },
            },
            PageEvent::TimerFired(timer) => self.gallery.timer_fired(platform, timer),
            PageEvent::Intersections(entries) => {
                if let Some(lazy) = self.lazy.as_mut() {
                    lazy.on_intersection(platform, &entries);
                }
            }
            PageEvent::Key(input) => {
                return self
                    .gallery
                    .handle_key(platform, self.lazy.as_mut(), &input);
            }
            PageEvent::TouchStart { x } => self.gallery.touch_start(x),
            PageEvent::TouchEnd { x } => self.gallery.touch_end(platform, x),
            PageEvent::ThumbnailClicked(index) => self.gallery.activate_thumbnail(platform, index),
            PageEvent::MainImageClicked => self.gallery.activate_main_image(platform),
            PageEvent::NextClicked => self.gallery.next(platform),
            PageEvent::PreviousClicked => self.gallery.previous(platform),
            PageEvent::CloseClicked | PageEvent::BackdropClicked => {
                self.gallery.close(platform, self.lazy.as_mut())
            }
        }
        KeyDisposition::Handled
    }

    /// Tear everything down before the page goes away.
    pub fn destroy(&mut self) {
        self.gallery.close(&mut self.platform, self.lazy.as_mut());
        if let Some(lazy) = self.lazy.as_mut() {
            lazy.destroy(&mut self.platform);
        }
    }
}
