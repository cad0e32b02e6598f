// Feedwatch: Haptic Motor Driver
//
// GPIO-driven vibration motor: click feedback and fall alerts.

use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use feedwatch::MotionLabel;

pub struct HapticDriver {
    pin: PinDriver<'static, AnyOutputPin, Output>,
    last_label: Option<MotionLabel>,
}

impl HapticDriver {
    pub fn new(pin: PinDriver<'static, AnyOutputPin, Output>) -> Self {
        Self { pin, last_label: None }
    }

    /// Short 50 ms pulse for a recognised button click.
    pub fn click(&mut self) {
        self.buzz(Duration::from_millis(50));
    }

    /// Buzz once when the feed switches into a fall label.
    pub fn alert_on_fall(&mut self, label: MotionLabel) {
        let is_fall = matches!(label, MotionLabel::DrasticFall | MotionLabel::Fell);
        if is_fall && self.last_label != Some(label) {
            log::info!("Fall alert: {}", label);
            self.buzz(Duration::from_millis(300));
        }
        self.last_label = Some(label);
    }

    /// Vibrate for a custom duration (blocks the calling thread).
    pub fn buzz(&mut self, duration: Duration) {
        let _ = self.pin.set_high();
        thread::sleep(duration);
        let _ = self.pin.set_low();
    }
}
