// Feedwatch: Button Input Manager
//
// Debounced button handler with single-click, double-click, and long-press
// detection.  Designed to be polled at ~100 Hz from the UI task; the caller
// reads the pin and passes its level in, so the state machine itself has no
// hardware dependency.

use std::time::Instant;

use crate::config::*;
use crate::events::UiEvent;

pub struct ClickDetector {
    // Debounce state
    last_raw: bool,
    last_debounce: Instant,

    // Press tracking
    press_start: Option<Instant>,
    button_down: bool,

    // Double-click state machine
    waiting_for_second_click: bool,
    first_click_time: Instant,
}

impl ClickDetector {
    pub fn new(now: Instant) -> Self {
        Self {
            last_raw: true, // pull-up -> idle HIGH
            last_debounce: now,
            press_start: None,
            button_down: false,
            waiting_for_second_click: false,
            first_click_time: now,
        }
    }

    /// Feed one pin sample (`released` = pin reads HIGH).
    pub fn update(&mut self, released: bool, now: Instant) -> Option<UiEvent> {
        // ---- debounce filter ----
        if released != self.last_raw {
            self.last_debounce = now;
        }
        self.last_raw = released;

        let stable_ms = now.duration_since(self.last_debounce).as_millis() as u64;
        if stable_ms < DEBOUNCE_MS {
            return self.check_double_click_timeout(now);
        }

        let pressed = !released; // active LOW

        // ---- button pressed edge ----
        if pressed && !self.button_down {
            self.button_down = true;
            self.press_start = Some(now);
        }

        // ---- button released edge ----
        if !pressed && self.button_down {
            self.button_down = false;
            let hold_ms = self
                .press_start
                .take()
                .map(|t| now.duration_since(t).as_millis() as u64)
                .unwrap_or(0);

            if hold_ms >= LONG_PRESS_MS {
                self.waiting_for_second_click = false;
                return Some(UiEvent::ButtonLongPress);
            } else if self.waiting_for_second_click {
                self.waiting_for_second_click = false;
                return Some(UiEvent::ButtonDoubleClick);
            } else {
                // First short click: open the double-click window.
                self.waiting_for_second_click = true;
                self.first_click_time = now;
            }
        }

        self.check_double_click_timeout(now)
    }

    /// Once the double-click window expires, the pending click is a single.
    fn check_double_click_timeout(&mut self, now: Instant) -> Option<UiEvent> {
        if self.waiting_for_second_click {
            let elapsed = now.duration_since(self.first_click_time).as_millis() as u64;
            if elapsed > DOUBLE_CLICK_WINDOW_MS {
                self.waiting_for_second_click = false;
                return Some(UiEvent::ButtonSingleClick);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Drives the detector with a 10 ms sampled level timeline.
    struct Bench {
        detector: ClickDetector,
        now: Instant,
        events: Vec<UiEvent>,
    }

    impl Bench {
        fn new() -> Self {
            let now = Instant::now();
            Self {
                detector: ClickDetector::new(now),
                now,
                events: Vec::new(),
            }
        }

        fn hold(&mut self, released: bool, ms: u64) {
            for _ in 0..ms / 10 {
                self.now += Duration::from_millis(10);
                if let Some(event) = self.detector.update(released, self.now) {
                    self.events.push(event);
                }
            }
        }

        fn click(&mut self, press_ms: u64) {
            self.hold(false, press_ms);
            self.hold(true, 100);
        }
    }

    #[test]
    fn short_press_becomes_single_click_after_window() {
        let mut bench = Bench::new();
        bench.click(120);
        assert!(bench.events.is_empty());

        bench.hold(true, DOUBLE_CLICK_WINDOW_MS + 50);
        assert_eq!(bench.events, vec![UiEvent::ButtonSingleClick]);
    }

    #[test]
    fn two_quick_presses_are_double_click() {
        let mut bench = Bench::new();
        bench.click(120);
        bench.click(120);
        bench.hold(true, 1000);
        assert_eq!(bench.events, vec![UiEvent::ButtonDoubleClick]);
    }

    #[test]
    fn long_hold_is_long_press() {
        let mut bench = Bench::new();
        bench.click(LONG_PRESS_MS + 200);
        bench.hold(true, 1000);
        assert_eq!(bench.events, vec![UiEvent::ButtonLongPress]);
    }

    #[test]
    fn bounce_shorter_than_debounce_is_ignored() {
        let mut bench = Bench::new();
        bench.hold(false, 20);
        bench.hold(true, 1000);
        assert!(bench.events.is_empty());
    }
}
