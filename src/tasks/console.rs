// Feedwatch: Provisioning Console Task
//
// Reads provisioning payloads from the serial console, one per line, e.g. the
// text of a scanned QR code: {"channel":"1234567","key":"READ_API_KEY"}

use std::io::BufRead;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use feedwatch::{ChannelConfig, UiEvent};

pub fn console_task(ui_tx: Sender<UiEvent>) {
    log::info!("Console task started");

    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        line.clear();
        match stdin.lock().read_line(&mut line) {
            // The ESP-IDF console returns EOF while the UART is idle.
            Ok(0) => thread::sleep(Duration::from_millis(200)),
            Ok(_) => {
                let payload = line.trim();
                if payload.is_empty() {
                    continue;
                }

                let config = ChannelConfig::from_qr_payload(payload);
                log::info!("Payload scanned: channel {}", config.channel_id);

                if ui_tx.send(UiEvent::Provisioned(config)).is_err() {
                    log::warn!("UI channel closed, exiting console task");
                    return;
                }
            }
            Err(e) => {
                log::warn!("Console read error: {}", e);
                thread::sleep(Duration::from_millis(200));
            }
        }
    }
}
