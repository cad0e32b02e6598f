// Feedwatch: System Events & Data Types

use std::fmt;

use crate::channel::ChannelConfig;

// ---------------------------------------------------------------------------
// Feed Sample (latest three axis readings from the remote channel)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FeedSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl FeedSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the three axes.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

// ---------------------------------------------------------------------------
// Motion Classification
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionLabel {
    DrasticFall,
    Fell,
    Normal,
    Static,
}

impl MotionLabel {
    /// Text shown under "Motion Activity:" on the panel.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DrasticFall => "Drastic Fall Down",
            Self::Fell        => "Fell Down",
            Self::Normal      => "Normal Movement",
            Self::Static      => "Static / No Movement",
        }
    }
}

impl fmt::Display for MotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// Poll Cycle Result
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub enum StatusReport {
    Sample { sample: FeedSample, label: MotionLabel },
    Error(String),
}

impl StatusReport {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn label(&self) -> Option<MotionLabel> {
        match self {
            Self::Sample { label, .. } => Some(*label),
            Self::Error(_) => None,
        }
    }
}

/// Axis reading as shown on the panel: plain decimals with at least one
/// fractional digit (`0.0`, `0.3`) between 1e-3 and 1e7, otherwise a
/// mantissa/exponent pair (`1.0E-7`, `1.5E20`).
pub fn axis_text(value: f64) -> String {
    let magnitude = value.abs();
    if !value.is_finite() || value == 0.0 || (1e-3..1e7).contains(&magnitude) {
        // `{:?}` keeps the trailing ".0" and stays positional in this range.
        return format!("{:?}", value);
    }
    let scientific = format!("{:e}", value);
    match scientific.split_once('e') {
        Some((mantissa, exponent)) if mantissa.contains('.') => {
            format!("{}E{}", mantissa, exponent)
        }
        Some((mantissa, exponent)) => format!("{}.0E{}", mantissa, exponent),
        None => scientific,
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sample { sample, label } => write!(
                f,
                "Latest Data:\nX-axis: {}\nY-axis: {}\nZ-axis: {}\n\nMotion Activity:\n{}",
                axis_text(sample.x),
                axis_text(sample.y),
                axis_text(sample.z),
                label
            ),
            Self::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

// ---------------------------------------------------------------------------
// Poller Loop State
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    Running,
}

// ---------------------------------------------------------------------------
// UI Events: sent to the UI task via channel
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Completed poll cycle; replaces the panel text.
    Status(StatusReport),
    /// Informational message; replaces the panel text.
    Notice(String),
    /// Note appended below the current panel text.
    Note(String),
    /// New channel credentials from the provisioning console.
    Provisioned(ChannelConfig),
    /// Single button click detected.
    ButtonSingleClick,
    /// Double button click detected.
    ButtonDoubleClick,
    /// Long button press (>= 3 s) detected.
    ButtonLongPress,
}
