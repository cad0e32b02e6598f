pub mod haptic;
pub mod http;
pub mod oled;
pub mod wifi;
