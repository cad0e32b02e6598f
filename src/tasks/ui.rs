// Feedwatch: UI Task
//
// Owns the OLED display, haptic motor, button, and the poller.  Polls the
// button at ~100 Hz and renders events coming back from the poller thread and
// the provisioning console.  This is the only task that touches the display.

use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use esp_idf_hal::gpio::{AnyInputPin, Input, PinDriver};

use feedwatch::config::*;
use feedwatch::display::TextPanel;
use feedwatch::input::ClickDetector;
use feedwatch::{ChannelConfig, Poller, StatusReport, UiEvent};

use crate::drivers::haptic::HapticDriver;
use crate::drivers::http::EspFeedSource;
use crate::drivers::oled::OledDisplay;

pub const MSG_IDLE: &str = "Press button to start";

struct Ui {
    display: OledDisplay,
    haptic: HapticDriver,
    panel: TextPanel,
    poller: Poller<EspFeedSource, Sender<UiEvent>>,
    config: ChannelConfig,
}

impl Ui {
    fn redraw(&mut self) {
        if let Err(e) = self.display.show_panel(&self.panel) {
            log::error!("Display error: {}", e);
        }
    }

    fn show(&mut self, text: &str) {
        self.panel.replace(text);
        self.redraw();
    }

    fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::Status(report) => {
                if let StatusReport::Sample { label, .. } = &report {
                    self.haptic.alert_on_fall(*label);
                }
                self.show(&report.to_string());
            }

            UiEvent::Notice(text) => self.show(&text),

            UiEvent::Note(text) => {
                self.panel.append("\n\n");
                self.panel.append(&text);
                self.redraw();
            }

            UiEvent::Provisioned(config) => {
                log::info!("Provisioned channel {}", config.channel_id);
                self.config = config;
                // A running loop keeps polling its original channel.
                if !self.poller.is_running() {
                    let summary = self.config.summary();
                    self.show(&summary);
                }
            }

            UiEvent::ButtonSingleClick => {
                self.haptic.click();
                match self.poller.toggle(&self.config) {
                    Ok(state) => log::info!("Poller now {:?}", state),
                    Err(e) => log::warn!("Poller not started: {}", e),
                }
            }

            UiEvent::ButtonDoubleClick => {
                self.haptic.click();
                let summary = self.config.summary();
                self.show(&summary);
            }

            UiEvent::ButtonLongPress => {
                // 3-second hold -> power off.
                self.haptic.buzz(Duration::from_millis(500));
                self.poller.stop();
                let _ = self.display.turn_off();
                log::info!("Long press detected, entering deep sleep");
                enter_deep_sleep();
            }
        }
    }
}

pub fn ui_task(
    display: OledDisplay,
    button: PinDriver<'static, AnyInputPin, Input>,
    haptic: HapticDriver,
    ui_rx: Receiver<UiEvent>,
    ui_tx: Sender<UiEvent>,
    config: ChannelConfig,
) {
    log::info!("UI task started");

    let mut ui = Ui {
        display,
        haptic,
        panel: TextPanel::new(),
        poller: Poller::new(EspFeedSource::new(), ui_tx),
        config,
    };

    let idle_text = if ui.config.channel_id.is_empty() {
        MSG_IDLE.to_string()
    } else {
        format!("{}\n\n{}", ui.config.summary(), MSG_IDLE)
    };
    ui.show(&idle_text);

    let mut input = ClickDetector::new(Instant::now());
    let poll_interval = Duration::from_millis(UI_POLL_INTERVAL_MS);

    loop {
        // 1. Poll the button (handles debounce + click detection internally).
        if let Some(event) = input.update(button.is_high(), Instant::now()) {
            ui.handle(event);
        }

        // 2. Drain all pending UI events (non-blocking).
        while let Ok(event) = ui_rx.try_recv() {
            ui.handle(event);
        }

        thread::sleep(poll_interval);
    }
}

/// Configure GPIO wakeup on button press and enter deep sleep.
/// This function does not return.
fn enter_deep_sleep() -> ! {
    log::info!("Entering deep sleep, wake on button press (GPIO{})", PIN_BUTTON);
    unsafe {
        esp_idf_sys::esp_deep_sleep_enable_gpio_wakeup(
            1u64 << PIN_BUTTON,
            esp_idf_sys::esp_deepsleep_gpio_wake_up_mode_t_ESP_GPIO_WAKEUP_GPIO_LOW,
        );
        esp_idf_sys::esp_deep_sleep_start();
    }
}
