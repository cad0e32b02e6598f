// Feedwatch: ThingSpeak Motion Monitor
//
// Host-testable core of the firmware: channel credentials, the feed client,
// the motion classifier, the poller loop, and the status panel.  Everything
// that touches ESP-IDF lives in the binary.

pub mod channel;
pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod feed;
pub mod input;
pub mod motion;
pub mod poller;

pub use channel::ChannelConfig;
pub use error::FeedError;
pub use events::{FeedSample, LoopState, MotionLabel, StatusReport, UiEvent};
pub use feed::{fetch_once, FeedSource};
pub use motion::classify;
pub use poller::{Poller, StatusSink};
