//! Deterministic in-memory platform.
//!
//! [`SimPlatform`] implements every platform trait without a browser. It
//! records each call as a [`RecordedOp`], keeps a minimal model of the page
//! (element sources, modal state, focus), queues probes until someone settles
//! them, and runs timers on a virtual clock.
//!
//! Probe outcomes come from a [`Resolver`]: a lookup table (tests) or the
//! local filesystem (the `replay` command, which decodes real files with the
//! `image` crate).
//!
//! [`run_until_idle`] plays the part of the browser event loop for a
//! [`Page`]: it settles queued probes, then fires the earliest timer, until
//! nothing is left.

use crate::page::{Page, PageEvent};
use crate::platform::{
    Capabilities, Dimensions, ElementKey, ImageElements, ImageProbe, LoadFailure, LoadState,
    ModalHeader, ModalSurface, Notice, Platform, ProbeOutcome, ProbeTicket, Scheduler, Timer,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::time::Duration;

pub const CLOSE_BUTTON: ElementKey = ElementKey(1);
pub const PREV_BUTTON: ElementKey = ElementKey(2);
pub const NEXT_BUTTON: ElementKey = ElementKey(3);
pub const MAIN_IMAGE: ElementKey = ElementKey(4);

const FIRST_THUMBNAIL_KEY: u64 = 1000;

/// Upper bound on events [`run_until_idle`] will deliver.
const MAX_STEPS: usize = 100_000;

/// One platform call, as observed by the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedOp {
    BeginProbe { ticket: ProbeTicket, src: String },
    Schedule { timer: Timer, delay: Duration },
    SetSource { key: ElementKey, src: String },
    SetLoadState { key: ElementKey, state: LoadState },
    FadeIn(ElementKey),
    Observe(ElementKey),
    Unobserve(ElementKey),
    DisconnectObserver,
    ShowModal(ModalHeader),
    HideModal,
    SetMainImage { src: String, alt: String },
    MainImageLoading(bool),
    RenderThumbnails(Vec<String>),
    ActiveThumbnail(usize),
    ScrollThumbnail(usize),
    Counter { current: usize, total: usize },
    NavEnabled(bool),
    NoScroll(bool),
    Fullscreen(bool),
    Focus(ElementKey),
    Notify(Notice),
    OpenWindow { src: String, allowed: bool },
}

/// Where probe outcomes come from.
#[derive(Debug, Clone)]
pub enum Resolver {
    /// Per-source outcomes, with a fallback for everything else.
    Table {
        outcomes: HashMap<String, ProbeOutcome>,
        fallback: ProbeOutcome,
    },
    /// Decode `root/<src>` from disk.
    Filesystem { root: PathBuf },
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver::Table {
            outcomes: HashMap::new(),
            fallback: ProbeOutcome::Decoded(Dimensions {
                width: 800,
                height: 600,
            }),
        }
    }
}

impl Resolver {
    pub fn resolve(&self, src: &str) -> ProbeOutcome {
        match self {
            Resolver::Table { outcomes, fallback } => {
                outcomes.get(src).cloned().unwrap_or_else(|| fallback.clone())
            }
            Resolver::Filesystem { root } => {
                let path = root.join(src.trim_start_matches('/'));
                match image::image_dimensions(&path) {
                    Ok((width, height)) => ProbeOutcome::Decoded(Dimensions { width, height }),
                    Err(image::ImageError::IoError(e)) => {
                        ProbeOutcome::Failed(LoadFailure::Network(e.to_string()))
                    }
                    Err(e) => ProbeOutcome::Failed(LoadFailure::Decode(e.to_string())),
                }
            }
        }
    }
}

/// Simulated image element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimElement {
    pub src: Option<String>,
    pub state: Option<LoadState>,
}

#[derive(Debug, Clone)]
struct ScheduledTimer {
    due: Duration,
    seq: u64,
    timer: Timer,
}

#[derive(Debug)]
pub struct SimPlatform {
    capabilities: Capabilities,
    resolver: Resolver,
    ops: Vec<RecordedOp>,
    probes: VecDeque<(ProbeTicket, String)>,
    timers: Vec<ScheduledTimer>,
    timer_seq: u64,
    now: Duration,
    anchors_ready: bool,
    popups_allowed: bool,
    elements: HashMap<ElementKey, SimElement>,
    observed: HashSet<ElementKey>,
    focused: Option<ElementKey>,
    modal: Option<ModalHeader>,
    main_image: Option<String>,
    thumbnails: Vec<ElementKey>,
    next_thumbnail_key: u64,
    active_thumbnail: Option<usize>,
    counter: Option<(usize, usize)>,
    nav_enabled: bool,
    no_scroll: bool,
    fullscreen: bool,
    notices: Vec<Notice>,
}

impl Default for SimPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SimPlatform {
    pub fn new() -> Self {
        Self {
            capabilities: Capabilities::default(),
            resolver: Resolver::default(),
            ops: Vec::new(),
            probes: VecDeque::new(),
            timers: Vec::new(),
            timer_seq: 0,
            now: Duration::ZERO,
            anchors_ready: true,
            popups_allowed: true,
            elements: HashMap::new(),
            observed: HashSet::new(),
            focused: None,
            modal: None,
            main_image: None,
            thumbnails: Vec::new(),
            next_thumbnail_key: FIRST_THUMBNAIL_KEY,
            active_thumbnail: None,
            counter: None,
            nav_enabled: true,
            no_scroll: false,
            fullscreen: false,
            notices: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Fix the outcome for one source. Switches a filesystem resolver to a table.
    pub fn set_outcome(&mut self, src: impl Into<String>, outcome: ProbeOutcome) {
        if let Resolver::Filesystem { .. } = self.resolver {
            self.resolver = Resolver::default();
        }
        if let Resolver::Table { outcomes, .. } = &mut self.resolver {
            outcomes.insert(src.into(), outcome);
        }
    }

    pub fn set_anchors_ready(&mut self, ready: bool) {
        self.anchors_ready = ready;
    }

    pub fn set_popups_allowed(&mut self, allowed: bool) {
        self.popups_allowed = allowed;
    }

    /// Move focus without recording an op (the user clicked somewhere).
    pub fn set_focused(&mut self, key: Option<ElementKey>) {
        self.focused = key;
    }

    pub fn resolve(&self, src: &str) -> ProbeOutcome {
        self.resolver.resolve(src)
    }

    pub fn ops(&self) -> &[RecordedOp] {
        &self.ops
    }

    /// Drain the op log.
    pub fn take_ops(&mut self) -> Vec<RecordedOp> {
        std::mem::take(&mut self.ops)
    }

    /// Drain queued probes in the order they were started.
    pub fn take_probes(&mut self) -> Vec<(ProbeTicket, String)> {
        self.probes.drain(..).collect()
    }

    pub fn pending_probes(&self) -> usize {
        self.probes.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Pop the earliest timer and advance the clock to it.
    pub fn next_timer(&mut self) -> Option<Timer> {
        let pos = self
            .timers
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(pos, _)| pos)?;
        let scheduled = self.timers.remove(pos);
        self.now = self.now.max(scheduled.due);
        Some(scheduled.timer)
    }

    pub fn element(&self, key: ElementKey) -> Option<&SimElement> {
        self.elements.get(&key)
    }

    pub fn is_observed(&self, key: ElementKey) -> bool {
        self.observed.contains(&key)
    }

    pub fn modal(&self) -> Option<&ModalHeader> {
        self.modal.as_ref()
    }

    pub fn main_image(&self) -> Option<&str> {
        self.main_image.as_deref()
    }

    pub fn thumbnails(&self) -> &[ElementKey] {
        &self.thumbnails
    }

    pub fn active_thumbnail(&self) -> Option<usize> {
        self.active_thumbnail
    }

    /// `(current, total)`, 1-based.
    pub fn counter(&self) -> Option<(usize, usize)> {
        self.counter
    }

    pub fn no_scroll(&self) -> bool {
        self.no_scroll
    }

    pub fn fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    fn element_mut(&mut self, key: ElementKey) -> &mut SimElement {
        self.elements.entry(key).or_default()
    }
}

impl ImageProbe for SimPlatform {
    fn begin_probe(&mut self, ticket: ProbeTicket, src: &str) {
        self.ops.push(RecordedOp::BeginProbe {
            ticket,
            src: src.to_string(),
        });
        self.probes.push_back((ticket, src.to_string()));
    }
}

impl Scheduler for SimPlatform {
    fn schedule(&mut self, timer: Timer, delay: Duration) {
        self.ops.push(RecordedOp::Schedule { timer, delay });
        self.timer_seq += 1;
        self.timers.push(ScheduledTimer {
            due: self.now + delay,
            seq: self.timer_seq,
            timer,
        });
    }
}

impl ImageElements for SimPlatform {
    fn set_source(&mut self, key: ElementKey, src: &str) {
        self.ops.push(RecordedOp::SetSource {
            key,
            src: src.to_string(),
        });
        self.element_mut(key).src = Some(src.to_string());
    }

    fn set_load_state(&mut self, key: ElementKey, state: LoadState) {
        self.ops.push(RecordedOp::SetLoadState { key, state });
        self.element_mut(key).state = Some(state);
    }

    fn fade_in(&mut self, key: ElementKey) {
        self.ops.push(RecordedOp::FadeIn(key));
    }

    fn observe_intersection(&mut self, key: ElementKey) {
        self.ops.push(RecordedOp::Observe(key));
        self.observed.insert(key);
    }

    fn unobserve_intersection(&mut self, key: ElementKey) {
        self.ops.push(RecordedOp::Unobserve(key));
        self.observed.remove(&key);
    }

    fn disconnect_observer(&mut self) {
        self.ops.push(RecordedOp::DisconnectObserver);
        self.observed.clear();
    }
}

impl ModalSurface for SimPlatform {
    fn anchors_ready(&self) -> bool {
        self.anchors_ready
    }

    fn show_modal(&mut self, header: &ModalHeader) {
        self.ops.push(RecordedOp::ShowModal(header.clone()));
        self.modal = Some(header.clone());
    }

    fn hide_modal(&mut self) {
        self.ops.push(RecordedOp::HideModal);
        self.modal = None;
    }

    fn set_main_image(&mut self, src: &str, alt: &str) {
        self.ops.push(RecordedOp::SetMainImage {
            src: src.to_string(),
            alt: alt.to_string(),
        });
        self.main_image = Some(src.to_string());
    }

    fn set_main_image_loading(&mut self, loading: bool) {
        self.ops.push(RecordedOp::MainImageLoading(loading));
    }

    fn render_thumbnails(&mut self, sources: &[String]) -> Vec<ElementKey> {
        self.ops.push(RecordedOp::RenderThumbnails(sources.to_vec()));
        self.thumbnails = sources
            .iter()
            .map(|_| {
                let key = ElementKey(self.next_thumbnail_key);
                self.next_thumbnail_key += 1;
                key
            })
            .collect();
        self.thumbnails.clone()
    }

    fn set_active_thumbnail(&mut self, index: usize) {
        self.ops.push(RecordedOp::ActiveThumbnail(index));
        self.active_thumbnail = Some(index);
    }

    fn scroll_thumbnail_into_view(&mut self, index: usize) {
        self.ops.push(RecordedOp::ScrollThumbnail(index));
    }

    fn set_counter(&mut self, current: usize, total: usize) {
        self.ops.push(RecordedOp::Counter { current, total });
        self.counter = Some((current, total));
    }

    fn set_nav_enabled(&mut self, enabled: bool) {
        self.ops.push(RecordedOp::NavEnabled(enabled));
        self.nav_enabled = enabled;
    }

    fn set_no_scroll(&mut self, on: bool) {
        self.ops.push(RecordedOp::NoScroll(on));
        self.no_scroll = on;
    }

    fn set_fullscreen(&mut self, on: bool) {
        self.ops.push(RecordedOp::Fullscreen(on));
        self.fullscreen = on;
    }

    fn focused(&self) -> Option<ElementKey> {
        self.focused
    }

    fn modal_focusables(&self) -> Vec<ElementKey> {
        if self.modal.is_none() {
            return Vec::new();
        }
        let mut keys = vec![CLOSE_BUTTON];
        if self.nav_enabled {
            keys.extend([PREV_BUTTON, NEXT_BUTTON]);
        }
        keys.push(MAIN_IMAGE);
        keys.extend(self.thumbnails.iter().copied());
        keys
    }

    fn focus(&mut self, key: ElementKey) {
        self.ops.push(RecordedOp::Focus(key));
        self.focused = Some(key);
    }

    fn notify(&mut self, notice: &Notice) {
        self.ops.push(RecordedOp::Notify(notice.clone()));
        self.notices.push(notice.clone());
    }

    fn open_window(&mut self, src: &str) -> bool {
        let allowed = self.popups_allowed;
        self.ops.push(RecordedOp::OpenWindow {
            src: src.to_string(),
            allowed,
        });
        allowed
    }
}

impl Platform for SimPlatform {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

/// Settle every queued probe, including probes started while settling.
/// Timers are left alone. Returns the number of probes settled.
pub fn settle_probes(page: &mut Page<SimPlatform>) -> usize {
    let mut settled = 0;
    while settled < MAX_STEPS {
        let probes = page.platform_mut().take_probes();
        if probes.is_empty() {
            break;
        }
        for (ticket, src) in probes {
            let outcome = page.platform().resolve(&src);
            page.dispatch(PageEvent::ProbeSettled { ticket, outcome });
            settled += 1;
        }
    }
    settled
}

/// Deliver probes and timers until nothing is pending.
/// Returns the number of events delivered.
pub fn run_until_idle(page: &mut Page<SimPlatform>) -> usize {
    let mut steps = 0;
    while steps < MAX_STEPS {
        let settled = settle_probes(page);
        steps += settled;
        if settled > 0 {
            continue;
        }
        match page.platform_mut().next_timer() {
            Some(timer) => {
                page.dispatch(PageEvent::TimerFired(timer));
                steps += 1;
            }
            None => break,
        }
    }
    steps
}
