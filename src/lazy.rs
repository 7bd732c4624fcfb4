//! Deferred image loading.
//!
//! [`LazyLoader`] holds image elements back until the page reports them close
//! to the viewport, then swaps in the real source. Sources it has seen resolve
//! are remembered for the lifetime of the page:
//!
//! | Source state | `observe()` does |
//! |---|---|
//! | loaded | assigns the source at once, no probe |
//! | failed | starts a fresh probe at once (failures are retried) |
//! | unknown | shows a placeholder and waits for intersection |
//!
//! Pending loads live in a map owned by the loader, keyed by [`ElementKey`];
//! nothing is stashed on the element itself.
//!
//! Pages without intersection support get every image loaded as soon as it is
//! registered (see [`LazyLoader::load_all_images`]).
//!
//! Load failures never surface as errors. They are logged, recorded, shown as
//! an error placeholder, and reported to the element's `on_error` callback.

use crate::config::LazyConfig;
use crate::placeholder;
use crate::platform::{
    ElementKey, ImageElements, ImageProbe, IntersectionSupport, LoadFailure, LoadState,
    ProbeOutcome, ProbeOwner, ProbeTicket, TicketCounter,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

pub type LoadCallback = Box<dyn FnMut(ElementKey, &str)>;
pub type ErrorCallback = Box<dyn FnMut(ElementKey, &str, &LoadFailure)>;
pub type PreloadCallback = Box<dyn FnOnce(PreloadReport)>;

/// Per-element load settings.
#[derive(Default)]
pub struct LoadOptions {
    /// Placeholder width when no custom placeholder is given.
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Custom placeholder source shown while waiting.
    pub placeholder: Option<String>,
    /// Custom source shown after a failure.
    pub error_placeholder: Option<String>,
    /// Fade in on load. Falls back to the loader default.
    pub transition: Option<bool>,
    on_load: Option<LoadCallback>,
    on_error: Option<ErrorCallback>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn placeholder(mut self, src: impl Into<String>) -> Self {
        self.placeholder = Some(src.into());
        self
    }

    pub fn error_placeholder(mut self, src: impl Into<String>) -> Self {
        self.error_placeholder = Some(src.into());
        self
    }

    pub fn transition(mut self, enabled: bool) -> Self {
        self.transition = Some(enabled);
        self
    }

    pub fn on_load(mut self, callback: impl FnMut(ElementKey, &str) + 'static) -> Self {
        self.on_load = Some(Box::new(callback));
        self
    }

    pub fn on_error(
        mut self,
        callback: impl FnMut(ElementKey, &str, &LoadFailure) + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("placeholder", &self.placeholder)
            .field("error_placeholder", &self.error_placeholder)
            .field("transition", &self.transition)
            .field("on_load", &self.on_load.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// One visibility change reported by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionEntry {
    pub key: ElementKey,
    pub is_intersecting: bool,
}

/// Outcome of a [`LazyLoader::preload_images`] batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreloadReport {
    pub loaded: Vec<String>,
    pub failed: Vec<(String, LoadFailure)>,
}

#[derive(Debug)]
struct PendingLoad {
    src: String,
    options: LoadOptions,
}

#[derive(Debug)]
enum InFlight {
    Element {
        key: ElementKey,
        src: String,
        options: LoadOptions,
    },
    Batch {
        batch: u64,
        src: String,
    },
}

struct PreloadBatch {
    remaining: usize,
    report: PreloadReport,
    on_complete: PreloadCallback,
}

pub struct LazyLoader {
    intersection: IntersectionSupport,
    defaults: LazyConfig,
    pending: HashMap<ElementKey, PendingLoad>,
    loaded: HashSet<String>,
    failed: HashSet<String>,
    in_flight: HashMap<ProbeTicket, InFlight>,
    batches: HashMap<u64, PreloadBatch>,
    tickets: TicketCounter,
    next_batch: u64,
}

impl fmt::Debug for LazyLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyLoader")
            .field("intersection", &self.intersection)
            .field("pending", &self.pending.len())
            .field("loaded", &self.loaded.len())
            .field("failed", &self.failed.len())
            .field("in_flight", &self.in_flight.len())
            .field("batches", &self.batches.len())
            .finish()
    }
}

impl LazyLoader {
    pub fn new(intersection: IntersectionSupport, defaults: LazyConfig) -> Self {
        Self {
            intersection,
            defaults,
            pending: HashMap::new(),
            loaded: HashSet::new(),
            failed: HashSet::new(),
            in_flight: HashMap::new(),
            batches: HashMap::new(),
            tickets: TicketCounter::new(ProbeOwner::Lazy),
            next_batch: 0,
        }
    }

    pub fn is_loaded(&self, src: &str) -> bool {
        self.loaded.contains(src)
    }

    pub fn is_failed(&self, src: &str) -> bool {
        self.failed.contains(src)
    }

    pub fn is_pending(&self, key: ElementKey) -> bool {
        self.pending.contains_key(&key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Register `key` to receive `src` once it nears the viewport.
    pub fn observe<P>(
        &mut self,
        platform: &mut P,
        key: ElementKey,
        src: impl Into<String>,
        mut options: LoadOptions,
    ) where
        P: ImageProbe + ImageElements + ?Sized,
    {
        let src = src.into();
        if self.loaded.contains(&src) {
            debug!(%key, src = %src, "source already loaded, assigning from cache");
            self.show_loaded(platform, key, &src, &mut options);
            return;
        }
        if self.failed.contains(&src) {
            debug!(%key, src = %src, "source failed before, retrying now");
            self.load_image(platform, key, src, options);
            return;
        }

        let filler = match &options.placeholder {
            Some(custom) => custom.clone(),
            None => placeholder::loading_placeholder(
                options.width.unwrap_or(self.defaults.placeholder_width),
                options.height.unwrap_or(self.defaults.placeholder_height),
            ),
        };
        platform.set_source(key, &filler);
        platform.set_load_state(key, LoadState::Loading);
        self.pending.insert(key, PendingLoad { src, options });

        match self.intersection {
            IntersectionSupport::Supported => platform.observe_intersection(key),
            IntersectionSupport::Unsupported => self.load_all_images(platform),
        }
    }

    /// Load every intersecting element and stop watching it.
    pub fn on_intersection<P>(&mut self, platform: &mut P, entries: &[IntersectionEntry])
    where
        P: ImageProbe + ImageElements + ?Sized,
    {
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            platform.unobserve_intersection(entry.key);
            if let Some(pending) = self.pending.remove(&entry.key) {
                self.load_image(platform, entry.key, pending.src, pending.options);
            }
        }
    }

    /// Fetch `src` for `key` through a detached probe.
    pub fn load_image<P>(
        &mut self,
        platform: &mut P,
        key: ElementKey,
        src: impl Into<String>,
        options: LoadOptions,
    ) where
        P: ImageProbe + ImageElements + ?Sized,
    {
        let src = src.into();
        let ticket = self.tickets.issue();
        platform.begin_probe(ticket, &src);
        self.in_flight
            .insert(ticket, InFlight::Element { key, src, options });
    }

    /// Load every registered element without waiting for visibility.
    pub fn load_all_images<P>(&mut self, platform: &mut P)
    where
        P: ImageProbe + ImageElements + ?Sized,
    {
        let mut drained: Vec<(ElementKey, PendingLoad)> = self.pending.drain().collect();
        drained.sort_by_key(|(key, _)| *key);
        for (key, pending) in drained {
            if self.intersection == IntersectionSupport::Supported {
                platform.unobserve_intersection(key);
            }
            self.load_image(platform, key, pending.src, pending.options);
        }
    }

    /// Warm the cache for `sources` without touching any element.
    ///
    /// `on_complete` runs once every attempt has settled, whatever the
    /// individual outcomes. Sources already loaded count as loaded without a
    /// probe.
    pub fn preload_images<P, I, S>(
        &mut self,
        platform: &mut P,
        sources: I,
        on_complete: impl FnOnce(PreloadReport) + 'static,
    ) where
        P: ImageProbe + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.next_batch += 1;
        let batch = self.next_batch;
        let mut report = PreloadReport::default();
        let mut remaining = 0;
        for src in sources {
            let src = src.into();
            if self.loaded.contains(&src) {
                report.loaded.push(src);
                continue;
            }
            let ticket = self.tickets.issue();
            platform.begin_probe(ticket, &src);
            self.in_flight.insert(ticket, InFlight::Batch { batch, src });
            remaining += 1;
        }

        if remaining == 0 {
            on_complete(report);
            return;
        }
        self.batches.insert(
            batch,
            PreloadBatch {
                remaining,
                report,
                on_complete: Box::new(on_complete),
            },
        );
    }

    /// Continue whatever was waiting on `ticket`.
    pub fn probe_settled<P>(&mut self, platform: &mut P, ticket: ProbeTicket, outcome: ProbeOutcome)
    where
        P: ImageElements + ?Sized,
    {
        let Some(in_flight) = self.in_flight.remove(&ticket) else {
            debug!(%ticket, "ignoring settled probe that is no longer tracked");
            return;
        };
        let result = outcome.into_result();
        match in_flight {
            InFlight::Element {
                key,
                src,
                mut options,
            } => match result {
                Ok(dims) => {
                    self.record_loaded(&src);
                    debug!(%key, src = %src, width = dims.width, height = dims.height, "image loaded");
                    self.show_loaded(platform, key, &src, &mut options);
                }
                Err(failure) => {
                    self.record_failed(&src);
                    warn!(%key, src = %src, error = %failure, "image failed to load");
                    self.show_failed(platform, key, &src, &failure, &mut options);
                }
            },
            InFlight::Batch { batch, src } => {
                match result {
                    Ok(_) => {
                        self.record_loaded(&src);
                        if let Some(entry) = self.batches.get_mut(&batch) {
                            entry.report.loaded.push(src);
                        }
                    }
                    Err(failure) => {
                        self.record_failed(&src);
                        warn!(src = %src, error = %failure, "preload failed");
                        if let Some(entry) = self.batches.get_mut(&batch) {
                            entry.report.failed.push((src, failure));
                        }
                    }
                }
                self.finish_batch_member(batch);
            }
        }
    }

    /// Drop the registration for an element whose markup is gone.
    ///
    /// A load already in flight for `key` still records its source as
    /// loaded or failed.
    pub fn forget<P>(&mut self, platform: &mut P, key: ElementKey)
    where
        P: ImageElements + ?Sized,
    {
        if self.pending.remove(&key).is_some()
            && self.intersection == IntersectionSupport::Supported
        {
            platform.unobserve_intersection(key);
        }
    }

    /// Stop observing and forget everything.
    ///
    /// Probes still running when this is called are ignored when they settle,
    /// and unfinished preload batches never report.
    pub fn destroy<P>(&mut self, platform: &mut P)
    where
        P: ImageElements + ?Sized,
    {
        platform.disconnect_observer();
        self.pending.clear();
        self.loaded.clear();
        self.failed.clear();
        self.in_flight.clear();
        self.batches.clear();
        info!("lazy loader destroyed");
    }

    fn finish_batch_member(&mut self, batch: u64) {
        let done = match self.batches.get_mut(&batch) {
            Some(entry) => {
                entry.remaining -= 1;
                entry.remaining == 0
            }
            None => false,
        };
        if done && let Some(entry) = self.batches.remove(&batch) {
            info!(
                outcome = "success",
                loaded = entry.report.loaded.len(),
                failed = entry.report.failed.len(),
                "preload batch settled"
            );
            (entry.on_complete)(entry.report);
        }
    }

    fn record_loaded(&mut self, src: &str) {
        self.failed.remove(src);
        self.loaded.insert(src.to_string());
    }

    /// Successes are permanent: a late failure never demotes a loaded source.
    fn record_failed(&mut self, src: &str) {
        if !self.loaded.contains(src) {
            self.failed.insert(src.to_string());
        }
    }

    fn show_loaded<P>(&self, platform: &mut P, key: ElementKey, src: &str, options: &mut LoadOptions)
    where
        P: ImageElements + ?Sized,
    {
        platform.set_source(key, src);
        platform.set_load_state(key, LoadState::Loaded);
        if options.transition.unwrap_or(self.defaults.transition) {
            platform.fade_in(key);
        }
        if let Some(callback) = options.on_load.as_mut() {
            callback(key, src);
        }
    }

    fn show_failed<P>(
        &self,
        platform: &mut P,
        key: ElementKey,
        src: &str,
        failure: &LoadFailure,
        options: &mut LoadOptions,
    ) where
        P: ImageElements + ?Sized,
    {
        platform.set_load_state(key, LoadState::Error);
        let stand_in = match &options.error_placeholder {
            Some(custom) => custom.clone(),
            None => placeholder::error_placeholder(
                options.width.unwrap_or(self.defaults.placeholder_width),
                options.height.unwrap_or(self.defaults.placeholder_height),
            ),
        };
        platform.set_source(key, &stand_in);
        if let Some(callback) = options.on_error.as_mut() {
            callback(key, src, failure);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Dimensions;
    use crate::sim::{RecordedOp, SimPlatform};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn loader() -> LazyLoader {
        LazyLoader::new(IntersectionSupport::Supported, LazyConfig::default())
    }

    fn ok() -> ProbeOutcome {
        ProbeOutcome::Decoded(Dimensions {
            width: 300,
            height: 200,
        })
    }

    fn broken() -> ProbeOutcome {
        ProbeOutcome::Failed(LoadFailure::Network("404".into()))
    }

    fn visible(key: ElementKey) -> IntersectionEntry {
        IntersectionEntry {
            key,
            is_intersecting: true,
        }
    }

    /// Settle every queued probe with `outcome`.
    fn settle_all(lazy: &mut LazyLoader, platform: &mut SimPlatform, outcome: ProbeOutcome) {
        for (ticket, _) in platform.take_probes() {
            lazy.probe_settled(platform, ticket, outcome.clone());
        }
    }

    #[test]
    fn observe_shows_placeholder_and_waits() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        let key = ElementKey(1);
        lazy.observe(&mut platform, key, "a.jpg", LoadOptions::new().size(40, 30));

        assert!(lazy.is_pending(key));
        assert!(platform.take_probes().is_empty());
        let element = platform.element(key).unwrap();
        assert!(element.src.as_deref().unwrap().starts_with("data:image/svg+xml"));
        assert_eq!(element.state, Some(LoadState::Loading));
        assert!(platform.is_observed(key));
    }

    #[test]
    fn custom_placeholder_is_used() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        lazy.observe(
            &mut platform,
            ElementKey(1),
            "a.jpg",
            LoadOptions::new().placeholder("blur.jpg"),
        );
        assert_eq!(
            platform.element(ElementKey(1)).unwrap().src.as_deref(),
            Some("blur.jpg")
        );
    }

    #[test]
    fn intersection_loads_once_and_unobserves() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        let key = ElementKey(1);
        lazy.observe(&mut platform, key, "a.jpg", LoadOptions::new());

        lazy.on_intersection(&mut platform, &[visible(key)]);
        lazy.on_intersection(&mut platform, &[visible(key)]);

        assert!(!platform.is_observed(key));
        assert_eq!(platform.take_probes().len(), 1);
        assert!(!lazy.is_pending(key));
    }

    #[test]
    fn forget_releases_pending_element() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        let (kept, gone) = (ElementKey(1), ElementKey(2));
        lazy.observe(&mut platform, kept, "a.jpg", LoadOptions::new());
        lazy.observe(&mut platform, gone, "b.jpg", LoadOptions::new());

        lazy.forget(&mut platform, gone);
        lazy.forget(&mut platform, ElementKey(99));

        assert_eq!(lazy.pending_count(), 1);
        assert!(!platform.is_observed(gone));
        assert!(platform.is_observed(kept));
        lazy.on_intersection(&mut platform, &[visible(gone)]);
        assert!(platform.take_probes().is_empty());
    }

    #[test]
    fn non_intersecting_entries_are_ignored() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        let key = ElementKey(1);
        lazy.observe(&mut platform, key, "a.jpg", LoadOptions::new());
        lazy.on_intersection(
            &mut platform,
            &[IntersectionEntry {
                key,
                is_intersecting: false,
            }],
        );
        assert!(lazy.is_pending(key));
        assert!(platform.take_probes().is_empty());
    }

    #[test]
    fn successful_load_assigns_source_and_calls_back() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        let key = ElementKey(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        lazy.observe(
            &mut platform,
            key,
            "a.jpg",
            LoadOptions::new().on_load(move |k, src| sink.borrow_mut().push((k, src.to_string()))),
        );
        lazy.on_intersection(&mut platform, &[visible(key)]);
        settle_all(&mut lazy, &mut platform, ok());

        assert!(lazy.is_loaded("a.jpg"));
        let element = platform.element(key).unwrap();
        assert_eq!(element.src.as_deref(), Some("a.jpg"));
        assert_eq!(element.state, Some(LoadState::Loaded));
        assert!(platform.ops().contains(&RecordedOp::FadeIn(key)));
        assert_eq!(*seen.borrow(), vec![(key, "a.jpg".to_string())]);
    }

    #[test]
    fn transition_can_be_disabled() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        let key = ElementKey(1);
        lazy.observe(&mut platform, key, "a.jpg", LoadOptions::new().transition(false));
        lazy.on_intersection(&mut platform, &[visible(key)]);
        settle_all(&mut lazy, &mut platform, ok());
        assert!(!platform.ops().contains(&RecordedOp::FadeIn(key)));
    }

    #[test]
    fn failed_load_shows_error_state_and_calls_back() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        let key = ElementKey(1);
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&errors);
        lazy.observe(
            &mut platform,
            key,
            "a.jpg",
            LoadOptions::new()
                .error_placeholder("broken.svg")
                .on_error(move |_, src, failure| sink.borrow_mut().push((src.to_string(), failure.clone()))),
        );
        lazy.on_intersection(&mut platform, &[visible(key)]);
        settle_all(&mut lazy, &mut platform, broken());

        assert!(lazy.is_failed("a.jpg"));
        assert!(!lazy.is_loaded("a.jpg"));
        let element = platform.element(key).unwrap();
        assert_eq!(element.state, Some(LoadState::Error));
        assert_eq!(element.src.as_deref(), Some("broken.svg"));
        assert_eq!(errors.borrow().len(), 1);
    }

    #[test]
    fn observe_after_success_skips_probe() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        lazy.observe(&mut platform, ElementKey(1), "a.jpg", LoadOptions::new());
        lazy.on_intersection(&mut platform, &[visible(ElementKey(1))]);
        settle_all(&mut lazy, &mut platform, ok());

        lazy.observe(&mut platform, ElementKey(2), "a.jpg", LoadOptions::new());
        assert!(platform.take_probes().is_empty());
        assert!(!lazy.is_pending(ElementKey(2)));
        let element = platform.element(ElementKey(2)).unwrap();
        assert_eq!(element.src.as_deref(), Some("a.jpg"));
        assert_eq!(element.state, Some(LoadState::Loaded));
    }

    #[test]
    fn observe_after_failure_probes_again() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        lazy.observe(&mut platform, ElementKey(1), "a.jpg", LoadOptions::new());
        lazy.on_intersection(&mut platform, &[visible(ElementKey(1))]);
        settle_all(&mut lazy, &mut platform, broken());

        lazy.observe(&mut platform, ElementKey(2), "a.jpg", LoadOptions::new());
        let probes = platform.take_probes();
        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].1, "a.jpg");
        assert!(!platform.is_observed(ElementKey(2)));

        lazy.probe_settled(&mut platform, probes[0].0, ok());
        assert!(lazy.is_loaded("a.jpg"));
        assert!(!lazy.is_failed("a.jpg"));
    }

    #[test]
    fn unsupported_intersection_loads_immediately() {
        let mut platform = SimPlatform::new();
        let mut lazy = LazyLoader::new(IntersectionSupport::Unsupported, LazyConfig::default());
        lazy.observe(&mut platform, ElementKey(1), "a.jpg", LoadOptions::new());
        assert_eq!(platform.take_probes().len(), 1);
        assert!(!platform.is_observed(ElementKey(1)));
        assert_eq!(lazy.pending_count(), 0);
    }

    #[test]
    fn load_all_images_drains_pending() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        for id in 1..=3 {
            lazy.observe(&mut platform, ElementKey(id), format!("{id}.jpg"), LoadOptions::new());
        }
        lazy.load_all_images(&mut platform);
        let sources: Vec<String> = platform.take_probes().into_iter().map(|(_, s)| s).collect();
        assert_eq!(sources, vec!["1.jpg", "2.jpg", "3.jpg"]);
        assert_eq!(lazy.pending_count(), 0);
    }

    #[test]
    fn preload_completes_despite_one_failure() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        let report = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&report);
        lazy.preload_images(&mut platform, ["a", "b", "c"], move |r| {
            *sink.borrow_mut() = Some(r);
        });

        for (ticket, src) in platform.take_probes() {
            let outcome = if src == "b" { broken() } else { ok() };
            lazy.probe_settled(&mut platform, ticket, outcome);
        }

        let report = report.borrow_mut().take().expect("completion must run");
        assert_eq!(report.loaded, vec!["a", "c"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "b");
        assert!(lazy.is_loaded("a"));
        assert!(lazy.is_loaded("c"));
        assert!(lazy.is_failed("b"));
    }

    #[test]
    fn preload_does_not_complete_early() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        let done = Rc::new(RefCell::new(false));
        let sink = Rc::clone(&done);
        lazy.preload_images(&mut platform, ["a", "b"], move |_| *sink.borrow_mut() = true);
        let probes = platform.take_probes();
        lazy.probe_settled(&mut platform, probes[0].0, ok());
        assert!(!*done.borrow());
        lazy.probe_settled(&mut platform, probes[1].0, ok());
        assert!(*done.borrow());
    }

    #[test]
    fn preload_of_nothing_completes_at_once() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        let done = Rc::new(RefCell::new(false));
        let sink = Rc::clone(&done);
        lazy.preload_images(&mut platform, Vec::<String>::new(), move |_| {
            *sink.borrow_mut() = true
        });
        assert!(*done.borrow());
    }

    #[test]
    fn late_failure_never_demotes_loaded_source() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        lazy.preload_images(&mut platform, ["a", "a"], |_| {});
        let probes = platform.take_probes();
        lazy.probe_settled(&mut platform, probes[0].0, ok());
        lazy.probe_settled(&mut platform, probes[1].0, broken());
        assert!(lazy.is_loaded("a"));
        assert!(!lazy.is_failed("a"));
    }

    #[test]
    fn destroy_clears_everything() {
        let mut platform = SimPlatform::new();
        let mut lazy = loader();
        lazy.observe(&mut platform, ElementKey(1), "a.jpg", LoadOptions::new());
        lazy.observe(&mut platform, ElementKey(2), "b.jpg", LoadOptions::new());
        lazy.on_intersection(&mut platform, &[visible(ElementKey(2))]);
        let probes = platform.take_probes();

        lazy.destroy(&mut platform);
        assert_eq!(lazy.pending_count(), 0);
        assert_eq!(lazy.in_flight_count(), 0);
        assert!(platform.ops().contains(&RecordedOp::DisconnectObserver));

        // A probe settling after teardown changes nothing.
        lazy.probe_settled(&mut platform, probes[0].0, ok());
        assert!(!lazy.is_loaded("b.jpg"));
    }
}
