// Feedwatch: Firmware Entry Point
//
// Boot sequence:
//   1. Connect to Wi-Fi (credentials baked in at build time).
//   2. Initialise the OLED and show the idle screen.
//   3. Spawn the UI task (button, display, poller) and the provisioning
//      console task.
//
// A single click on the button starts or stops polling the ThingSpeak
// channel; a double click shows the configured channel; a 3-second hold
// powers the device down.

#[cfg(target_os = "espidf")]
mod drivers;
#[cfg(target_os = "espidf")]
mod tasks;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use anyhow::anyhow;
    use esp_idf_hal::gpio::{InputPin, OutputPin, Pin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;

    use feedwatch::config::*;
    use feedwatch::ChannelConfig;

    use crate::drivers::haptic::HapticDriver;
    use crate::drivers::oled::OledDisplay;

    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Feedwatch firmware starting");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // Pins are picked by type here; config.rs numbers must name the same
    // GPIOs (the raw pull-up and deep-sleep wake calls use them).
    let pins = peripherals.pins;
    check_pin("button", i32::from(pins.gpio3.pin()), PIN_BUTTON)?;
    check_pin("haptic", i32::from(pins.gpio4.pin()), PIN_HAPTIC)?;
    check_pin("I2C SDA", i32::from(pins.gpio6.pin()), PIN_I2C_SDA)?;
    check_pin("I2C SCL", i32::from(pins.gpio7.pin()), PIN_I2C_SCL)?;

    // Button GPIO (pull-up, active LOW).
    let button = PinDriver::input(pins.gpio3.downgrade_input())?;
    // AnyInputPin has no set_pull(); enable the pull-up through the raw API.
    esp_idf_sys::esp!(unsafe {
        esp_idf_sys::gpio_set_pull_mode(PIN_BUTTON, esp_idf_sys::gpio_pull_mode_t_GPIO_PULLUP_ONLY)
    })?;

    let haptic_pin = PinDriver::output(pins.gpio4.downgrade_output())?;

    // ---- Wi-Fi ------------------------------------------------------------
    let ssid = WIFI_SSID.ok_or_else(|| anyhow!("FEEDWATCH_WIFI_SSID was not set at build time"))?;
    let _wifi = drivers::wifi::connect(peripherals.modem, sys_loop, nvs, ssid, WIFI_PASS.unwrap_or(""))?;

    // ---- Display ----------------------------------------------------------
    let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        pins.gpio6, // SDA
        pins.gpio7, // SCL
        &i2c_config,
    )?;

    let mut display = OledDisplay::new(i2c);
    if !display.is_connected() {
        log::error!("OLED not responding at 0x{:02X}", I2C_ADDR_OLED);
    }
    display.init()?;

    // ---- Channel ----------------------------------------------------------
    let config = ChannelConfig::from_build_env().unwrap_or_default();
    if config.channel_id.is_empty() {
        log::warn!("No channel configured; paste a provisioning payload on the console");
    }

    // ---- Tasks ------------------------------------------------------------
    let (ui_tx, ui_rx) = mpsc::channel();

    let console_tx = ui_tx.clone();
    thread::Builder::new()
        .name("console".into())
        .stack_size(STACK_CONSOLE)
        .spawn(move || {
            tasks::console::console_task(console_tx);
        })?;

    let haptic = HapticDriver::new(haptic_pin);
    thread::Builder::new()
        .name("ui".into())
        .stack_size(STACK_UI)
        .spawn(move || {
            tasks::ui::ui_task(display, button, haptic, ui_rx, ui_tx, config);
        })?;

    log::info!("Boot complete, entering normal operation");

    // Main thread has nothing left to do; keep it (and the Wi-Fi handle)
    // alive forever.
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

#[cfg(target_os = "espidf")]
fn check_pin(role: &str, wired: i32, configured: i32) -> anyhow::Result<()> {
    anyhow::ensure!(
        wired == configured,
        "{} is wired to GPIO{} but config.rs names GPIO{}",
        role,
        wired,
        configured
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("feedwatch is ESP32 firmware; build it for a riscv32imc-esp-espidf target")
}
