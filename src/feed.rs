// Feedwatch: ThingSpeak Feed Client
//
// One poll cycle: GET the channel's last entry, pull field1..field3 out of the
// JSON body, classify.  The HTTP transport is behind `FeedSource` so the
// firmware can plug in the ESP-IDF client and tests can script responses.

use serde::Deserialize;
use serde_json::Value;

use crate::channel::ChannelConfig;
use crate::error::FeedError;
use crate::events::{FeedSample, StatusReport};
use crate::motion;

/// Blocking HTTP GET returning the response body.
///
/// Implementations map transport failures and non-2xx statuses to
/// `FeedError::Network`.
pub trait FeedSource {
    fn get(&mut self, url: &str) -> Result<Vec<u8>, FeedError>;
}

impl<F> FeedSource for F
where
    F: FnMut(&str) -> Result<Vec<u8>, FeedError>,
{
    fn get(&mut self, url: &str) -> Result<Vec<u8>, FeedError> {
        self(url)
    }
}

/// `feeds/last.json` record.  ThingSpeak sends field values as strings, but
/// numbers are accepted as well.
#[derive(Debug, Default, Deserialize)]
pub struct LastEntry {
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub entry_id: Option<u64>,
    #[serde(default)]
    pub field1: Value,
    #[serde(default)]
    pub field2: Value,
    #[serde(default)]
    pub field3: Value,
}

impl LastEntry {
    pub fn sample(&self) -> FeedSample {
        FeedSample::new(
            field_value(&self.field1),
            field_value(&self.field2),
            field_value(&self.field3),
        )
    }
}

/// Absent, null, non-numeric and NaN values read as 0.0.  Readings too large
/// for an `f64` (`"1e400"`) saturate at `f64::MAX` instead.
fn field_value(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_nan() => 0.0,
        Some(v) => v.clamp(f64::MIN, f64::MAX),
        None => 0.0,
    }
}

/// Decode a response body.  Anything other than a JSON object is an error
/// (ThingSpeak answers `-1` for unknown or private channels).
pub fn parse_last_entry(body: &[u8]) -> Result<LastEntry, FeedError> {
    let value: Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(FeedError::Parse(format!("expected a JSON object, got `{}`", value)));
    }
    Ok(serde_json::from_value(value)?)
}

fn fetch_sample(source: &mut dyn FeedSource, config: &ChannelConfig) -> Result<FeedSample, FeedError> {
    let url = config.last_entry_url();
    log::debug!("GET {}", url);

    let body = source.get(&url)?;
    let entry = parse_last_entry(&body)?;
    log::debug!(
        "Entry {:?} created at {}",
        entry.entry_id,
        entry.created_at.as_deref().unwrap_or("?")
    );
    Ok(entry.sample())
}

/// Run one poll cycle.  Never fails: errors come back as
/// `StatusReport::Error` so the caller's schedule is unaffected.
pub fn fetch_once(source: &mut dyn FeedSource, config: &ChannelConfig) -> StatusReport {
    match fetch_sample(source, config) {
        Ok(sample) => {
            let label = motion::classify_sample(&sample);
            log::info!(
                "x={:.3} y={:.3} z={:.3} |a|={:.3} -> {:?}",
                sample.x,
                sample.y,
                sample.z,
                sample.magnitude(),
                label
            );
            StatusReport::Sample { sample, label }
        }
        Err(e) => {
            log::warn!("Fetch failed: {}", e);
            StatusReport::Error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MotionLabel;

    fn respond(body: &'static str) -> impl FnMut(&str) -> Result<Vec<u8>, FeedError> {
        move |_url: &str| Ok(body.as_bytes().to_vec())
    }

    fn config() -> ChannelConfig {
        ChannelConfig::new("1234", "")
    }

    #[test]
    fn zero_fields_are_drastic_fall() {
        let mut source = respond(r#"{"field1":0,"field2":0,"field3":0}"#);
        let report = fetch_once(&mut source, &config());
        assert_eq!(
            report,
            StatusReport::Sample {
                sample: FeedSample::new(0.0, 0.0, 0.0),
                label: MotionLabel::DrasticFall,
            }
        );
    }

    #[test]
    fn point_three_on_every_axis() {
        let mut source = respond(r#"{"field1":0.3,"field2":0.3,"field3":0.3}"#);
        let report = fetch_once(&mut source, &config());
        assert_eq!(report.label(), Some(MotionLabel::Normal));
    }

    #[test]
    fn string_fields_are_parsed() {
        let mut source = respond(
            r#"{"created_at":"2024-05-01T10:00:00Z","entry_id":812,"field1":"0.10","field2":" 0.20 ","field3":"0.05"}"#,
        );
        match fetch_once(&mut source, &config()) {
            StatusReport::Sample { sample, label } => {
                assert_eq!(sample, FeedSample::new(0.10, 0.20, 0.05));
                assert_eq!(label, MotionLabel::Fell);
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[test]
    fn missing_fields_default_to_zero() {
        let mut source = respond(r#"{"field1":"1.5","entry_id":null}"#);
        match fetch_once(&mut source, &config()) {
            StatusReport::Sample { sample, label } => {
                assert_eq!(sample, FeedSample::new(1.5, 0.0, 0.0));
                assert_eq!(label, MotionLabel::Static);
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[test]
    fn non_numeric_fields_default_to_zero() {
        let entry = parse_last_entry(br#"{"field1":"abc","field2":null,"field3":"NaN"}"#).unwrap();
        assert_eq!(entry.sample(), FeedSample::default());

        let entry = parse_last_entry(br#"{"field1":true,"field2":[1],"field3":{"v":1}}"#).unwrap();
        assert_eq!(entry.sample(), FeedSample::default());
    }

    #[test]
    fn overflowing_reading_is_static_not_a_fall() {
        let mut source = respond(r#"{"field1":"1e400","field2":"0","field3":"0"}"#);
        match fetch_once(&mut source, &config()) {
            StatusReport::Sample { sample, label } => {
                assert_eq!(sample.x, f64::MAX);
                assert_eq!(label, MotionLabel::Static);
            }
            other => panic!("unexpected report {:?}", other),
        }

        let entry = parse_last_entry(br#"{"field1":"-1e400","field2":"Infinity"}"#).unwrap();
        assert_eq!(entry.sample(), FeedSample::new(f64::MIN, f64::MAX, 0.0));
    }

    #[test]
    fn unknown_channel_body_is_parse_error() {
        assert!(matches!(parse_last_entry(b"-1"), Err(FeedError::Parse(_))));

        let mut source = respond("-1");
        let report = fetch_once(&mut source, &config());
        assert!(report.to_string().starts_with("Error: malformed feed response"));
    }

    #[test]
    fn malformed_json_is_reported() {
        let mut source = respond("{\"field1\":");
        assert!(fetch_once(&mut source, &config()).is_error());
    }

    #[test]
    fn network_error_is_reported_verbatim() {
        let mut source =
            |_url: &str| -> Result<Vec<u8>, FeedError> { Err(FeedError::Network("HTTP status 404".into())) };
        assert_eq!(
            fetch_once(&mut source, &config()),
            StatusReport::Error("HTTP status 404".into())
        );
    }

    #[test]
    fn requests_channel_last_entry() {
        let mut seen = Vec::new();
        let mut source = |url: &str| -> Result<Vec<u8>, FeedError> {
            seen.push(url.to_string());
            Ok(b"{}".to_vec())
        };
        let report = fetch_once(&mut source, &ChannelConfig::new("77", "K"));
        assert_eq!(report.label(), Some(MotionLabel::DrasticFall));
        assert_eq!(
            seen,
            vec!["https://api.thingspeak.com/channels/77/feeds/last.json?api_key=K".to_string()]
        );
    }
}
