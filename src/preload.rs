//! Gallery preload cache.
//!
//! Every image the gallery wants ahead of time goes through [`Preloader`]. It
//! remembers which sources have fully decoded (`preloaded`, which only ever
//! grows and outlives individual gallery sessions) and which are currently
//! being fetched, so the same source is never probed twice at once. Several
//! callers can wait on one probe; each records a [`ProbePurpose`] that comes
//! back when the probe settles.
//!
//! Failures are not cached. A source that failed is probed again the next
//! time anything asks for it.
//!
//! The free functions plan which indices each preload tier covers.

use crate::platform::{
    Dimensions, ImageProbe, LoadFailure, ProbeOutcome, ProbeOwner, ProbeTicket, TicketCounter,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::Range;

/// Why the gallery is waiting on a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePurpose {
    /// Main image swap for navigation `token` to `index`.
    Swap { token: u64, index: usize },
    /// Open-time and navigation-time warming.
    Warm,
    /// Background sweep batch of `session`.
    Sweep { session: u64 },
}

/// Result of [`Preloader::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requested {
    /// Already decoded; nothing was started.
    Cached,
    /// Attached to a probe that was already running.
    Joined(ProbeTicket),
    /// A new probe was started.
    Started(ProbeTicket),
}

/// A settled probe with everyone who was waiting on it.
#[derive(Debug)]
pub struct Settled {
    pub src: String,
    pub result: Result<Dimensions, LoadFailure>,
    pub purposes: Vec<ProbePurpose>,
}

#[derive(Debug)]
struct InFlight {
    src: String,
    purposes: Vec<ProbePurpose>,
}

#[derive(Debug)]
pub struct Preloader {
    preloaded: HashSet<String>,
    by_src: HashMap<String, ProbeTicket>,
    in_flight: HashMap<ProbeTicket, InFlight>,
    tickets: TicketCounter,
}

impl Default for Preloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Preloader {
    pub fn new() -> Self {
        Self {
            preloaded: HashSet::new(),
            by_src: HashMap::new(),
            in_flight: HashMap::new(),
            tickets: TicketCounter::new(ProbeOwner::Gallery),
        }
    }

    pub fn is_preloaded(&self, src: &str) -> bool {
        self.preloaded.contains(src)
    }

    pub fn is_in_flight(&self, src: &str) -> bool {
        self.by_src.contains_key(src)
    }

    pub fn preloaded_count(&self) -> usize {
        self.preloaded.len()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Ask for `src` to be decoded, starting a probe only if needed.
    pub fn request<P: ImageProbe + ?Sized>(
        &mut self,
        platform: &mut P,
        src: &str,
        purpose: ProbePurpose,
    ) -> Requested {
        if self.preloaded.contains(src) {
            return Requested::Cached;
        }
        if let Some(ticket) = self.by_src.get(src).copied() {
            if let Some(entry) = self.in_flight.get_mut(&ticket) {
                entry.purposes.push(purpose);
            }
            return Requested::Joined(ticket);
        }
        let ticket = self.tickets.issue();
        self.by_src.insert(src.to_string(), ticket);
        self.in_flight.insert(
            ticket,
            InFlight {
                src: src.to_string(),
                purposes: vec![purpose],
            },
        );
        platform.begin_probe(ticket, src);
        Requested::Started(ticket)
    }

    /// Record a probe outcome. Returns `None` for tickets this cache never issued.
    pub fn settle(&mut self, ticket: ProbeTicket, outcome: ProbeOutcome) -> Option<Settled> {
        let entry = self.in_flight.remove(&ticket)?;
        self.by_src.remove(&entry.src);
        let result = outcome.into_result();
        if result.is_ok() {
            self.preloaded.insert(entry.src.clone());
        }
        Some(Settled {
            src: entry.src,
            result,
            purposes: entry.purposes,
        })
    }
}

/// Indices `[0, min(count, len))`.
pub fn leading_window(len: usize, count: usize) -> Range<usize> {
    0..count.min(len)
}

/// Wrapping window of `size` indices starting `lead` before `index`.
///
/// Short lists wrap onto themselves; repeated indices are dropped, so the
/// result never holds more than `len` entries.
pub fn neighborhood(index: usize, len: usize, size: usize, lead: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let start = (index % len + len - lead % len) % len;
    let mut seen = HashSet::new();
    (0..size)
        .map(|offset| (start + offset) % len)
        .filter(|i| seen.insert(*i))
        .collect()
}

/// Split everything not yet decoded into batches.
///
/// Sources in flight are planned too. When their batch is issued they either
/// join the running probe or, if it failed in the meantime, start a new one.
pub fn plan_batches(
    images: &[String],
    preloader: &Preloader,
    batch_size: usize,
) -> VecDeque<Vec<String>> {
    let mut seen = HashSet::new();
    let wanted: Vec<String> = images
        .iter()
        .filter(|src| !preloader.is_preloaded(src) && seen.insert(src.as_str()))
        .cloned()
        .collect();
    wanted
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}
