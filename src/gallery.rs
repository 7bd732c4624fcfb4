//! The project gallery modal.
//!
//! One [`GalleryModal`] owns the page's single overlay. Opening a project
//! orders its images (hero first), paints the main image and thumbnail strip,
//! and starts warming the [`Preloader`] cache in tiers:
//!
//! ```text
//! open        eager [0, eager_count)        before the first paint
//! rendered    [0, min(render_count, n))     right after the strip is built
//! +delay      background sweep              batch_size at a time, all-settled join
//! navigate    neighborhood around index     lead entries behind, rest ahead
//! ```
//!
//! Nothing here waits on an image. Main image swaps are requested with a
//! navigation token and applied when the probe settles, and only if no newer
//! navigation happened in between. Stale results just land in the cache.
//!
//! If the modal markup never shows up, the gallery disables itself after
//! `modal.anchor_retries` retries and every later call is a logged no-op.

use crate::config::LightboxConfig;
use crate::input::{Key, KeyDisposition, KeyInput, SwipeDirection, SwipeTracker, trap_tab};
use crate::lazy::{LazyLoader, LoadOptions};
use crate::placeholder;
use crate::platform::{
    Capabilities, DeviceClass, ElementKey, LoadFailure, LoadState, ModalHeader, Notice, Platform,
    ProbeOutcome, ProbeTicket, Timer,
};
use crate::preload::{
    Preloader, ProbePurpose, Requested, leading_window, neighborhood, plan_batches,
};
use crate::types::{Project, ProjectCatalog};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Size of the error stand-in painted into the main image slot.
const MAIN_ERROR_WIDTH: u32 = 1200;
const MAIN_ERROR_HEIGHT: u32 = 800;

/// Why a project could not be opened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    #[error("gallery modal is not available")]
    ModalUnavailable,
    #[error("project data has not been provided")]
    ProjectsUnavailable,
    #[error("unknown project: {0}")]
    ProjectNotFound(String),
    #[error("project {id} has no images")]
    NoImages { id: String, name: String },
}

impl OpenError {
    pub fn notice(&self) -> Notice {
        match self {
            OpenError::ModalUnavailable => Notice::ModalUnavailable,
            OpenError::ProjectsUnavailable => Notice::ProjectsUnavailable,
            OpenError::ProjectNotFound(id) => Notice::ProjectNotFound(id.clone()),
            OpenError::NoImages { name, .. } => Notice::NoImages(name.clone()),
        }
    }
}

/// Coarse lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryState {
    /// Waiting for the modal markup.
    Attaching,
    /// Markup never appeared; all operations are no-ops.
    Disabled,
    Closed,
    /// Opened, first image not painted yet.
    Loading,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attachment {
    Pending { retries: u32 },
    Ready,
    Disabled,
}

#[derive(Debug)]
struct Session {
    id: u64,
    project_id: String,
    title: String,
    images: Vec<String>,
    index: usize,
    /// Token of the swap waiting on a probe, if any.
    pending_swap: Option<u64>,
    /// Token of the swap issued by `open_project`.
    opening_token: u64,
    painted: bool,
    fullscreen: bool,
    last_focused: Option<ElementKey>,
    thumbnails: Vec<ElementKey>,
}

#[derive(Debug)]
struct Sweep {
    session: u64,
    batches: VecDeque<Vec<String>>,
    /// Probes of the current batch still running.
    outstanding: usize,
}

#[derive(Debug)]
pub struct GalleryModal {
    config: LightboxConfig,
    capabilities: Capabilities,
    attachment: Attachment,
    projects: Option<ProjectCatalog>,
    preloader: Preloader,
    session: Option<Session>,
    sweep: Option<Sweep>,
    swipe: SwipeTracker,
    next_session: u64,
    next_token: u64,
}

impl GalleryModal {
    pub fn new(config: LightboxConfig, capabilities: Capabilities) -> Self {
        let swipe = SwipeTracker::new(config.swipe.threshold_px);
        Self {
            config,
            capabilities,
            attachment: Attachment::Pending { retries: 0 },
            projects: None,
            preloader: Preloader::new(),
            session: None,
            sweep: None,
            swipe,
            next_session: 0,
            next_token: 0,
        }
    }

    /// Look for the modal markup, scheduling retries while it is missing.
    pub fn attach<P: Platform + ?Sized>(&mut self, platform: &mut P) {
        let Attachment::Pending { retries } = self.attachment else {
            return;
        };
        if platform.anchors_ready() {
            self.attachment = Attachment::Ready;
            info!(retries, "gallery modal attached");
            return;
        }
        if retries >= self.config.modal.anchor_retries {
            self.attachment = Attachment::Disabled;
            error!(retries, "gallery modal markup not found, gallery disabled");
            return;
        }
        self.attachment = Attachment::Pending {
            retries: retries + 1,
        };
        debug!(retry = retries + 1, "gallery modal markup missing, retrying");
        platform.schedule(Timer::AnchorRetry, self.config.modal.anchor_retry_delay());
    }

    /// Provide the project catalog. May arrive any time before the first open.
    pub fn set_projects_data(&mut self, catalog: ProjectCatalog) {
        if !self.usable("set_projects_data") {
            return;
        }
        info!(projects = catalog.len(), "project data received");
        self.projects = Some(catalog);
    }

    pub fn state(&self) -> GalleryState {
        match (self.attachment, &self.session) {
            (Attachment::Disabled, _) => GalleryState::Disabled,
            (Attachment::Pending { .. }, _) => GalleryState::Attaching,
            (Attachment::Ready, None) => GalleryState::Closed,
            (Attachment::Ready, Some(session)) if session.painted => GalleryState::Open,
            (Attachment::Ready, Some(_)) => GalleryState::Loading,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.index)
    }

    pub fn current_images(&self) -> Option<&[String]> {
        self.session.as_ref().map(|s| s.images.as_slice())
    }

    pub fn current_project_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.project_id.as_str())
    }

    pub fn is_fullscreen(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.fullscreen)
    }

    pub fn is_preloaded(&self, src: &str) -> bool {
        self.preloader.is_preloaded(src)
    }

    pub fn preloaded_count(&self) -> usize {
        self.preloader.preloaded_count()
    }

    /// Open `id` in the modal.
    ///
    /// Validation failures notify the user once, log, and leave every piece
    /// of state as it was.
    pub fn open_project<P: Platform + ?Sized>(
        &mut self,
        platform: &mut P,
        mut lazy: Option<&mut LazyLoader>,
        id: &str,
    ) -> Result<(), OpenError> {
        let project = match self.validate_open(platform, id) {
            Ok(project) => project,
            Err(err) => {
                error!(project = id, error = %err, "cannot open project");
                platform.notify(&err.notice());
                return Err(err);
            }
        };

        let last_focused = match self.session.take() {
            Some(previous) => {
                debug!(from = %previous.project_id, to = id, "replacing open project");
                if previous.fullscreen {
                    platform.set_fullscreen(false);
                }
                release_thumbnails(platform, lazy.as_deref_mut(), &previous.thumbnails);
                previous.last_focused
            }
            None => platform.focused(),
        };
        self.sweep = None;
        self.swipe.cancel();

        let images = project.ordered_images();
        let total = images.len();
        self.next_session += 1;
        let session_id = self.next_session;
        let header = ModalHeader {
            project_id: project.id.clone(),
            title: project.name.clone(),
            type_label: project.project_type.label().to_string(),
            image_count: total,
        };
        platform.show_modal(&header);
        platform.set_no_scroll(true);
        platform.set_nav_enabled(total > 1);
        platform.set_counter(1, total);

        for i in leading_window(total, self.config.preload.eager_count) {
            self.preloader
                .request(platform, &images[i], ProbePurpose::Warm);
        }

        let token = self.issue_token();
        self.session = Some(Session {
            id: session_id,
            project_id: project.id.clone(),
            title: project.name.clone(),
            images,
            index: 0,
            pending_swap: None,
            opening_token: token,
            painted: false,
            fullscreen: false,
            last_focused,
            thumbnails: Vec::new(),
        });
        self.request_swap(platform, 0, token);

        self.render_thumbnails(platform, lazy);

        if let Some(session) = self.session.as_ref() {
            for i in leading_window(total, self.config.preload.render_count) {
                self.preloader
                    .request(platform, &session.images[i], ProbePurpose::Warm);
            }
        }
        platform.schedule(
            Timer::SweepStart {
                session: session_id,
            },
            self.config.preload.sweep_start_delay(),
        );

        if let Some(first) = platform.modal_focusables().first().copied() {
            platform.focus(first);
        }
        info!(project = %project.id, images = total, session = session_id, "gallery opened");
        Ok(())
    }

    pub fn next<P: Platform + ?Sized>(&mut self, platform: &mut P) {
        if let Some(target) = self
            .session
            .as_ref()
            .map(|s| (s.index + 1) % s.images.len())
        {
            self.set_active_index(platform, target);
        }
    }

    pub fn previous<P: Platform + ?Sized>(&mut self, platform: &mut P) {
        if let Some(target) = self
            .session
            .as_ref()
            .map(|s| (s.index + s.images.len() - 1) % s.images.len())
        {
            self.set_active_index(platform, target);
        }
    }

    /// Move to `index`. The same index, or one out of range, is ignored.
    pub fn set_active_index<P: Platform + ?Sized>(&mut self, platform: &mut P, index: usize) {
        if !self.usable("set_active_index") {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            debug!(index, "navigation with no open project");
            return;
        };
        if index >= session.images.len() {
            warn!(index, len = session.images.len(), "navigation target out of range");
            return;
        }
        if index == session.index {
            debug!(index, "already on this image");
            return;
        }
        let token = self.issue_token();
        self.request_swap(platform, index, token);
    }

    /// A thumbnail was clicked or activated from the keyboard.
    pub fn activate_thumbnail<P: Platform + ?Sized>(&mut self, platform: &mut P, index: usize) {
        if !self.usable("activate_thumbnail") {
            return;
        }
        let Some(key) = self
            .session
            .as_ref()
            .filter(|s| index < s.images.len())
            .map(|s| s.thumbnails.get(index).copied())
        else {
            return;
        };
        self.set_active_index(platform, index);
        platform.set_active_thumbnail(index);
        platform.scroll_thumbnail_into_view(index);
        if let Some(key) = key {
            platform.focus(key);
        }
    }

    /// Main image clicked: fullscreen on desktop, a new window on touch devices.
    pub fn activate_main_image<P: Platform + ?Sized>(&mut self, platform: &mut P) {
        if !self.usable("activate_main_image") {
            return;
        }
        let Some(src) = self.session.as_ref().map(|s| s.images[s.index].clone()) else {
            return;
        };
        match self.capabilities.device {
            DeviceClass::Desktop => self.toggle_fullscreen(platform),
            DeviceClass::Touch => {
                if !platform.open_window(&src) {
                    warn!(src = %src, "full image window was blocked");
                    platform.notify(&Notice::PopupBlocked);
                }
            }
        }
    }

    pub fn toggle_fullscreen<P: Platform + ?Sized>(&mut self, platform: &mut P) {
        if !self.usable("toggle_fullscreen") {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            session.fullscreen = !session.fullscreen;
            debug!(fullscreen = session.fullscreen, "fullscreen toggled");
            platform.set_fullscreen(session.fullscreen);
        }
    }

    pub fn exit_fullscreen<P: Platform + ?Sized>(&mut self, platform: &mut P) {
        if let Some(session) = self.session.as_mut()
            && session.fullscreen
        {
            session.fullscreen = false;
            platform.set_fullscreen(false);
        }
    }

    /// Keyboard input while the modal is open.
    pub fn handle_key<P: Platform + ?Sized>(
        &mut self,
        platform: &mut P,
        lazy: Option<&mut LazyLoader>,
        input: &KeyInput,
    ) -> KeyDisposition {
        if self.session.is_none() || !self.usable("handle_key") {
            return KeyDisposition::Ignored;
        }
        match input.key {
            Key::Escape => {
                if self.is_fullscreen() {
                    self.exit_fullscreen(platform);
                } else {
                    self.close(platform, lazy);
                }
                KeyDisposition::Handled
            }
            Key::ArrowLeft => {
                self.previous(platform);
                KeyDisposition::Handled
            }
            Key::ArrowRight => {
                self.next(platform);
                KeyDisposition::Handled
            }
            Key::Tab => {
                let focusables = platform.modal_focusables();
                match trap_tab(&focusables, platform.focused(), input.shift) {
                    Some(target) => {
                        platform.focus(target);
                        KeyDisposition::Handled
                    }
                    None => KeyDisposition::Ignored,
                }
            }
            Key::Other(_) => KeyDisposition::Ignored,
        }
    }

    pub fn touch_start(&mut self, x: f64) {
        if self.session.is_some() {
            self.swipe.touch_start(x);
        }
    }

    pub fn touch_end<P: Platform + ?Sized>(&mut self, platform: &mut P, x: f64) {
        match self.swipe.touch_end(x) {
            Some(SwipeDirection::Next) => self.next(platform),
            Some(SwipeDirection::Previous) => self.previous(platform),
            None => {}
        }
    }

    /// Hide the modal and restore the page.
    ///
    /// Probes already running keep going and only feed the cache. No further
    /// sweep batches are issued for the closed session. Thumbnails still
    /// waiting for visibility are released from `lazy`.
    pub fn close<P: Platform + ?Sized>(
        &mut self,
        platform: &mut P,
        lazy: Option<&mut LazyLoader>,
    ) {
        let Some(session) = self.session.take() else {
            return;
        };
        release_thumbnails(platform, lazy, &session.thumbnails);
        self.sweep = None;
        self.swipe.cancel();
        platform.set_fullscreen(false);
        platform.hide_modal();
        platform.set_no_scroll(false);
        if let Some(key) = session.last_focused {
            platform.focus(key);
        }
        info!(project = %session.project_id, session = session.id, "gallery closed");
    }

    /// Continuation for a probe this gallery started.
    pub fn probe_settled<P: Platform + ?Sized>(
        &mut self,
        platform: &mut P,
        ticket: ProbeTicket,
        outcome: ProbeOutcome,
    ) {
        let Some(settled) = self.preloader.settle(ticket, outcome) else {
            debug!(%ticket, "ignoring unknown gallery probe");
            return;
        };
        if let Err(failure) = &settled.result
            && settled
                .purposes
                .iter()
                .any(|p| !matches!(p, ProbePurpose::Swap { .. }))
        {
            warn!(src = %settled.src, error = %failure, "background preload failed");
        }
        for purpose in settled.purposes {
            match purpose {
                ProbePurpose::Swap { token, index } => {
                    let result = settled.result.as_ref().map(|_| ()).map_err(Clone::clone);
                    self.apply_swap(platform, token, index, result);
                }
                ProbePurpose::Warm => {}
                ProbePurpose::Sweep { session } => self.sweep_member_settled(platform, session),
            }
        }
    }

    pub fn timer_fired<P: Platform + ?Sized>(&mut self, platform: &mut P, timer: Timer) {
        match timer {
            Timer::AnchorRetry => self.attach(platform),
            Timer::SweepStart { session } => self.start_sweep(platform, session),
            Timer::SweepBatch { session } => {
                if self
                    .sweep
                    .as_ref()
                    .is_some_and(|s| s.session == session && s.outstanding == 0)
                {
                    self.issue_next_batch(platform);
                }
            }
        }
    }

    fn usable(&self, operation: &str) -> bool {
        if self.attachment == Attachment::Disabled {
            debug!(operation, "gallery disabled, ignoring");
            return false;
        }
        true
    }

    fn validate_open<P: Platform + ?Sized>(
        &self,
        platform: &P,
        id: &str,
    ) -> Result<Project, OpenError> {
        if self.attachment != Attachment::Ready || !platform.anchors_ready() {
            return Err(OpenError::ModalUnavailable);
        }
        let catalog = self
            .projects
            .as_ref()
            .filter(|c| !c.is_empty())
            .ok_or(OpenError::ProjectsUnavailable)?;
        let project = catalog
            .get(id)
            .ok_or_else(|| OpenError::ProjectNotFound(id.to_string()))?;
        if project.images.is_empty() {
            return Err(OpenError::NoImages {
                id: project.id.clone(),
                name: project.name.clone(),
            });
        }
        Ok(project.clone())
    }

    fn issue_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Make `index` current and swap it in once its probe settles.
    fn request_swap<P: Platform + ?Sized>(&mut self, platform: &mut P, index: usize, token: u64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.index = index;
        session.pending_swap = Some(token);
        let src = session.images[index].clone();
        debug!(index, token, src = %src, "requesting main image");
        match self
            .preloader
            .request(platform, &src, ProbePurpose::Swap { token, index })
        {
            Requested::Cached => self.apply_swap(platform, token, index, Ok(())),
            Requested::Joined(_) | Requested::Started(_) => platform.set_main_image_loading(true),
        }
    }

    fn apply_swap<P: Platform + ?Sized>(
        &mut self,
        platform: &mut P,
        token: u64,
        index: usize,
        result: Result<(), LoadFailure>,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.pending_swap != Some(token) {
            debug!(token, index, "discarding stale image swap");
            return;
        }
        session.pending_swap = None;
        session.painted = true;

        let total = session.images.len();
        let src = &session.images[index];
        let alt = format!("{}, image {} of {}", session.title, index + 1, total);
        match result {
            Ok(()) => platform.set_main_image(src, &alt),
            Err(failure) => {
                warn!(src = %src, error = %failure, "main image failed to load");
                let stand_in = placeholder::error_placeholder(MAIN_ERROR_WIDTH, MAIN_ERROR_HEIGHT);
                platform.set_main_image(&stand_in, &alt);
            }
        }
        platform.set_main_image_loading(false);
        platform.set_active_thumbnail(index);
        platform.set_counter(index + 1, total);

        if token == session.opening_token {
            return;
        }
        let cfg = &self.config.preload;
        let window: Vec<String> = neighborhood(index, total, cfg.neighborhood, cfg.neighborhood_lead)
            .into_iter()
            .map(|i| session.images[i].clone())
            .collect();
        for src in &window {
            self.preloader.request(platform, src, ProbePurpose::Warm);
        }
    }

    fn render_thumbnails<P: Platform + ?Sized>(
        &mut self,
        platform: &mut P,
        lazy: Option<&mut LazyLoader>,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let keys = platform.render_thumbnails(&session.images);
        match lazy {
            Some(lazy) => {
                for (key, src) in keys.iter().zip(&session.images) {
                    lazy.observe(platform, *key, src.as_str(), LoadOptions::new());
                }
            }
            None => {
                debug!("no lazy loader, loading thumbnails directly");
                for (key, src) in keys.iter().zip(&session.images) {
                    platform.set_source(*key, src);
                    platform.set_load_state(*key, LoadState::Loaded);
                }
            }
        }
        session.thumbnails = keys;
    }

    fn start_sweep<P: Platform + ?Sized>(&mut self, platform: &mut P, session_id: u64) {
        let Some(session) = self.session.as_ref().filter(|s| s.id == session_id) else {
            debug!(session = session_id, "sweep timer for a closed session");
            return;
        };
        let batches = plan_batches(
            &session.images,
            &self.preloader,
            self.config.preload.batch_size,
        );
        debug!(session = session_id, batches = batches.len(), "starting background preload");
        self.sweep = Some(Sweep {
            session: session_id,
            batches,
            outstanding: 0,
        });
        self.issue_next_batch(platform);
    }

    fn issue_next_batch<P: Platform + ?Sized>(&mut self, platform: &mut P) {
        loop {
            let Some(sweep) = self.sweep.as_mut() else {
                return;
            };
            let Some(batch) = sweep.batches.pop_front() else {
                info!(outcome = "success", session = sweep.session, "background preload complete");
                self.sweep = None;
                return;
            };
            let purpose = ProbePurpose::Sweep {
                session: sweep.session,
            };
            let mut outstanding = 0;
            for src in &batch {
                if self.preloader.request(platform, src, purpose) != Requested::Cached {
                    outstanding += 1;
                }
            }
            sweep.outstanding = outstanding;
            if outstanding > 0 {
                debug!(session = sweep.session, size = batch.len(), "preload batch issued");
                return;
            }
        }
    }

    fn sweep_member_settled<P: Platform + ?Sized>(&mut self, platform: &mut P, session_id: u64) {
        let Some(sweep) = self.sweep.as_mut().filter(|s| s.session == session_id) else {
            return;
        };
        sweep.outstanding = sweep.outstanding.saturating_sub(1);
        if sweep.outstanding > 0 {
            return;
        }
        if sweep.batches.is_empty() {
            info!(outcome = "success", session = session_id, "background preload complete");
            self.sweep = None;
        } else {
            platform.schedule(
                Timer::SweepBatch {
                    session: session_id,
                },
                self.config.preload.batch_delay(),
            );
        }
    }
}

fn release_thumbnails<P: Platform + ?Sized>(
    platform: &mut P,
    lazy: Option<&mut LazyLoader>,
    keys: &[ElementKey],
) {
    if let Some(lazy) = lazy {
        for key in keys {
            lazy.forget(platform, *key);
        }
    }
}
