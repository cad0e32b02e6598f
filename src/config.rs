// Feedwatch: Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_BUTTON: i32 = 3;  // D1/A1: start/stop button (INPUT_PULLUP, active LOW)
pub const PIN_HAPTIC: i32 = 4;  // D2/A2: haptic motor control
pub const PIN_I2C_SDA: i32 = 6; // D4: I2C data line
pub const PIN_I2C_SCL: i32 = 7; // D5: I2C clock line

// main.rs checks each typed pin against these at boot.
const _: () = assert!(
    PIN_BUTTON != PIN_HAPTIC
        && PIN_BUTTON != PIN_I2C_SDA
        && PIN_BUTTON != PIN_I2C_SCL
        && PIN_HAPTIC != PIN_I2C_SDA
        && PIN_HAPTIC != PIN_I2C_SCL
        && PIN_I2C_SDA != PIN_I2C_SCL
);

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_OLED: u8 = 0x3C;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Display (SSD1306 OLED)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 64;
pub const DISPLAY_BUFFER_SIZE: usize = (SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize) / 8; // 1024

// FONT_6X9 cell: 21 columns x 7 rows on a 128x64 panel.
pub const TEXT_CHAR_WIDTH: u32 = 6;
pub const TEXT_LINE_HEIGHT: u32 = 9;
pub const TEXT_COLUMNS: usize = (SCREEN_WIDTH / TEXT_CHAR_WIDTH) as usize;
pub const TEXT_ROWS: usize = (SCREEN_HEIGHT / TEXT_LINE_HEIGHT) as usize;

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_POLLER: usize = 12288; // TLS handshake needs the headroom
pub const STACK_UI: usize = 8192;
pub const STACK_CONSOLE: usize = 4096;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const FETCH_INTERVAL_MS: u64 = 3000;    // measured from fetch completion
pub const HTTP_TIMEOUT_MS: u64 = 10_000;
pub const UI_POLL_INTERVAL_MS: u64 = 10;    // 100 Hz input poll / refresh
pub const DEBOUNCE_MS: u64 = 50;
pub const LONG_PRESS_MS: u64 = 3000;        // 3-second hold -> power off
pub const DOUBLE_CLICK_WINDOW_MS: u64 = 400;

// ---------------------------------------------------------------------------
// ThingSpeak Feed
// ---------------------------------------------------------------------------
pub const THINGSPEAK_BASE_URL: &str = "https://api.thingspeak.com";
pub const FEED_BODY_LIMIT: usize = 4096; // last.json is a few hundred bytes

// ---------------------------------------------------------------------------
// Motion Classification (magnitude thresholds, strict less-than)
// ---------------------------------------------------------------------------
pub const DRASTIC_FALL_BELOW: f64 = 0.2;
pub const FELL_BELOW: f64 = 0.5;
pub const NORMAL_BELOW: f64 = 1.22;

// ---------------------------------------------------------------------------
// Build-time Credentials
// ---------------------------------------------------------------------------
pub const WIFI_SSID: Option<&str> = option_env!("FEEDWATCH_WIFI_SSID");
pub const WIFI_PASS: Option<&str> = option_env!("FEEDWATCH_WIFI_PASS");
pub const CHANNEL_ID: Option<&str> = option_env!("FEEDWATCH_CHANNEL_ID");
pub const API_KEY: Option<&str> = option_env!("FEEDWATCH_API_KEY");
pub const QR_PAYLOAD: Option<&str> = option_env!("FEEDWATCH_QR_PAYLOAD"); // wins over CHANNEL_ID/API_KEY
