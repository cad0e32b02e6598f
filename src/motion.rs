// Feedwatch: Motion Classifier
//
// Maps the magnitude of the latest three-axis reading onto a coarse activity
// label.  Thresholds are strict less-than and checked lowest first, so a
// magnitude sitting exactly on a threshold belongs to the next tier.

use crate::config::*;
use crate::events::{FeedSample, MotionLabel};

/// Classify a raw reading.
pub fn classify(x: f64, y: f64, z: f64) -> MotionLabel {
    classify_sample(&FeedSample::new(x, y, z))
}

pub fn classify_sample(sample: &FeedSample) -> MotionLabel {
    classify_magnitude(sample.magnitude())
}

pub fn classify_magnitude(magnitude: f64) -> MotionLabel {
    if magnitude < DRASTIC_FALL_BELOW {
        MotionLabel::DrasticFall
    } else if magnitude < FELL_BELOW {
        MotionLabel::Fell
    } else if magnitude < NORMAL_BELOW {
        MotionLabel::Normal
    } else {
        MotionLabel::Static
    }
}
