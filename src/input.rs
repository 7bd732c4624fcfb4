//! Input interpretation for the open gallery.
//!
//! Pure decision logic, no platform calls:
//! - Swipe detection from touch start/end coordinates
//! - Key names as delivered by the page
//! - Focus-trap resolution for Tab / Shift+Tab

use crate::platform::ElementKey;

/// Direction a completed gesture asks the gallery to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Next,
    Previous,
}

/// Tracks one horizontal touch gesture at a time.
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    threshold: f64,
    start_x: Option<f64>,
}

impl SwipeTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            start_x: None,
        }
    }

    pub fn touch_start(&mut self, x: f64) {
        self.start_x = Some(x);
    }

    /// Finish the gesture.
    ///
    /// Travel must exceed the threshold strictly; anything shorter is a tap.
    /// Moving the finger left (start > end) means "next".
    pub fn touch_end(&mut self, x: f64) -> Option<SwipeDirection> {
        let start = self.start_x.take()?;
        let delta = start - x;
        if delta.abs() <= self.threshold {
            return None;
        }
        if delta > 0.0 {
            Some(SwipeDirection::Next)
        } else {
            Some(SwipeDirection::Previous)
        }
    }

    pub fn cancel(&mut self) {
        self.start_x = None;
    }
}

/// Keys the gallery reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowLeft,
    ArrowRight,
    Tab,
    Other(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            "ArrowLeft" | "Left" => Key::ArrowLeft,
            "ArrowRight" | "Right" => Key::ArrowRight,
            "Tab" => Key::Tab,
            other => Key::Other(other.to_string()),
        }
    }
}

/// A key press with the modifier the gallery cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }
}

/// Whether the host should suppress the browser's default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Handled,
    Ignored,
}

/// Decide where Tab should land inside the modal.
///
/// Returns `Some(target)` when the trap has to move focus itself (wrapping
/// past either end, or pulling focus back in from outside). `None` lets the
/// browser move focus normally.
pub fn trap_tab(
    focusables: &[ElementKey],
    current: Option<ElementKey>,
    backwards: bool,
) -> Option<ElementKey> {
    let first = *focusables.first()?;
    let last = *focusables.last()?;
    let position = current.and_then(|key| focusables.iter().position(|k| *k == key));
    match (position, backwards) {
        (None, false) => Some(first),
        (None, true) => Some(last),
        (Some(0), true) => Some(last),
        (Some(pos), false) if pos == focusables.len() - 1 => Some(first),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swipe_exactly_threshold_is_a_tap() {
        let mut swipe = SwipeTracker::new(50.0);
        swipe.touch_start(200.0);
        assert_eq!(swipe.touch_end(150.0), None);
        swipe.touch_start(200.0);
        assert_eq!(swipe.touch_end(250.0), None);
    }

    #[test]
    fn swipe_one_past_threshold_navigates() {
        let mut swipe = SwipeTracker::new(50.0);
        swipe.touch_start(200.0);
        assert_eq!(swipe.touch_end(149.0), Some(SwipeDirection::Next));
        swipe.touch_start(200.0);
        assert_eq!(swipe.touch_end(251.0), Some(SwipeDirection::Previous));
    }

    #[test]
    fn touch_end_without_start_is_ignored() {
        let mut swipe = SwipeTracker::new(50.0);
        assert_eq!(swipe.touch_end(0.0), None);
    }

    #[test]
    fn gesture_is_consumed_by_touch_end() {
        let mut swipe = SwipeTracker::new(50.0);
        swipe.touch_start(300.0);
        assert!(swipe.touch_end(100.0).is_some());
        assert_eq!(swipe.touch_end(0.0), None);
    }

    #[test]
    fn cancelled_gesture_does_nothing() {
        let mut swipe = SwipeTracker::new(50.0);
        swipe.touch_start(300.0);
        swipe.cancel();
        assert_eq!(swipe.touch_end(0.0), None);
    }

    #[test]
    fn dom_key_names() {
        assert_eq!(Key::from_dom("Escape"), Key::Escape);
        assert_eq!(Key::from_dom("Esc"), Key::Escape);
        assert_eq!(Key::from_dom("ArrowRight"), Key::ArrowRight);
        assert_eq!(Key::from_dom("a"), Key::Other("a".into()));
    }

    fn keys(ids: &[u64]) -> Vec<ElementKey> {
        ids.iter().map(|id| ElementKey(*id)).collect()
    }

    #[test]
    fn tab_on_last_wraps_to_first() {
        let f = keys(&[1, 2, 3]);
        assert_eq!(trap_tab(&f, Some(ElementKey(3)), false), Some(ElementKey(1)));
    }

    #[test]
    fn shift_tab_on_first_wraps_to_last() {
        let f = keys(&[1, 2, 3]);
        assert_eq!(trap_tab(&f, Some(ElementKey(1)), true), Some(ElementKey(3)));
    }

    #[test]
    fn tab_in_the_middle_is_left_to_the_browser() {
        let f = keys(&[1, 2, 3]);
        assert_eq!(trap_tab(&f, Some(ElementKey(2)), false), None);
        assert_eq!(trap_tab(&f, Some(ElementKey(2)), true), None);
        assert_eq!(trap_tab(&f, Some(ElementKey(1)), false), None);
    }

    #[test]
    fn focus_outside_modal_is_pulled_in() {
        let f = keys(&[1, 2, 3]);
        assert_eq!(trap_tab(&f, Some(ElementKey(99)), false), Some(ElementKey(1)));
        assert_eq!(trap_tab(&f, None, true), Some(ElementKey(3)));
    }

    #[test]
    fn single_focusable_wraps_onto_itself() {
        let f = keys(&[7]);
        assert_eq!(trap_tab(&f, Some(ElementKey(7)), false), Some(ElementKey(7)));
        assert_eq!(trap_tab(&f, Some(ElementKey(7)), true), Some(ElementKey(7)));
    }

    #[test]
    fn no_focusables_no_trap() {
        assert_eq!(trap_tab(&[], Some(ElementKey(1)), false), None);
    }
}
