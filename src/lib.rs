//! # Folio Lightbox
//!
//! The client-side behavior of an architecture portfolio: a full-screen
//! gallery modal that opens a project's images, and a lazy loader that holds
//! back images until they scroll into view.
//!
//! Both are written as headless state machines. They never touch a browser
//! directly; every side effect goes through the traits in [`platform`], and
//! every asynchronous result comes back in as a [`page::PageEvent`]. A wasm
//! host binds those traits to the DOM. The bundled [`sim::SimPlatform`]
//! binds them to an in-memory recorder, which is what the tests and the
//! `folio-lightbox replay` command run against.
//!
//! ```text
//! host events ──▶ Page::dispatch ──▶ GalleryModal / LazyLoader
//!                                          │
//!                     Platform traits ◀────┘  (probes, timers, DOM writes)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Project catalog (`projects.json`), hero ordering, catalog audit |
//! | [`config`] | `lightbox.toml` loading: stock defaults, overlay merge, validation |
//! | [`platform`] | Platform traits, capabilities, probe tickets, timers |
//! | [`placeholder`] | Inline SVG placeholders for loading and failed images |
//! | [`lazy`] | Visibility-driven image loading with loaded/failed bookkeeping |
//! | [`preload`] | Shared image cache with eager, warm, and low priority tiers |
//! | [`input`] | Key normalization, focus trapping, swipe detection |
//! | [`gallery`] | The modal itself: open, navigate, close, background sweep |
//! | [`page`] | Per-page wiring and event routing |
//! | [`markup`] | Modal and portfolio markup rendered with Maud |
//! | [`sim`] | Recording platform for tests and replays |
//! | [`script`] | Session script parsing and replay |
//! | [`assets`] | Offline checks of referenced image files |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Platform Traits Instead of Callbacks
//!
//! Components borrow the platform for the length of one call (`&mut P`)
//! rather than holding it. Asynchronous work is started with a
//! [`platform::ProbeTicket`] or a [`platform::Timer`] and finished when the
//! host hands that value back. Nothing is shared between components through
//! reference counting, and a test can step time and probe completion one
//! event at a time.
//!
//! ## Navigation Tokens
//!
//! Every main-image swap carries a token. When the probe for an older swap
//! settles after a newer navigation, its token no longer matches and the
//! result is dropped, so the modal always ends on the image the visitor
//! asked for last. Background sweeps carry a session id the same way, and a
//! closed or reopened modal stops scheduling the old sweep's batches.
//!
//! ## Maud for Markup
//!
//! The modal shell, thumbnail strip, and project cards are generated with
//! [Maud](https://maud.lambda.xyz/). Element ids live in [`markup`] as
//! constants so the markup and the code that looks for it cannot drift.
//!
//! ## Tracing for Diagnostics
//!
//! Lifecycle events are emitted through `tracing`. Opens and successful
//! loads log at `info` with `outcome = "success"`, fallbacks at `warn`, and
//! user-facing failures at `error`. Without a subscriber installed every
//! call is a no-op.

pub mod assets;
pub mod config;
pub mod gallery;
pub mod input;
pub mod lazy;
pub mod markup;
pub mod output;
pub mod page;
pub mod placeholder;
pub mod platform;
pub mod preload;
pub mod script;
pub mod sim;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
