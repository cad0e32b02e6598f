// Feedwatch: Channel Credentials
//
// The channel id / API key pair the poller queries, and the provisioning
// payload (`{"channel": "...", "key": "..."}`) that pre-fills it.

use serde_json::Value;

use crate::config::*;
use crate::error::FeedError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelConfig {
    pub channel_id: String,
    pub api_key: Option<String>,
}

/// Scalar members are accepted as text (`{"channel": 42}` works too).
fn member_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

impl ChannelConfig {
    /// Both values are trimmed; a blank key is treated as absent.
    pub fn new(channel_id: &str, api_key: &str) -> Self {
        let api_key = api_key.trim();
        Self {
            channel_id: channel_id.trim().to_string(),
            api_key: (!api_key.is_empty()).then(|| api_key.to_string()),
        }
    }

    /// Parse a scanned provisioning payload.
    ///
    /// A JSON object fills whichever of `channel` / `key` it carries (missing
    /// members become empty).  Anything else is taken verbatim as the channel
    /// id, which is what a code holding only the bare id decodes to.
    pub fn from_qr_payload(payload: &str) -> Self {
        match serde_json::from_str::<Value>(payload.trim()) {
            Ok(Value::Object(members)) => Self::new(
                &member_text(members.get("channel")),
                &member_text(members.get("key")),
            ),
            _ => {
                log::debug!("Provisioning payload is not a JSON object, using it as channel id");
                Self::new(payload, "")
            }
        }
    }

    /// Credentials baked in at build time, if any.
    pub fn from_build_env() -> Option<Self> {
        let config = match (QR_PAYLOAD, CHANNEL_ID) {
            (Some(payload), _) => Self::from_qr_payload(payload),
            (None, Some(channel)) => Self::new(channel, API_KEY.unwrap_or("")),
            (None, None) => return None,
        };
        Some(config)
    }

    pub fn validate(&self) -> Result<(), FeedError> {
        if self.channel_id.trim().is_empty() {
            return Err(FeedError::Validation("channel id is empty".into()));
        }
        Ok(())
    }

    /// `GET` target for the most recent entry of this channel.  Both values
    /// are percent-encoded, so a key holding `&` or an id holding `/` cannot
    /// reshape the request.
    pub fn last_entry_url(&self) -> String {
        let mut url = format!(
            "{}/channels/{}/feeds/last.json",
            THINGSPEAK_BASE_URL,
            urlencoding::encode(self.channel_id.trim())
        );
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            url.push_str("?api_key=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }

    /// Two-line summary for the panel.
    pub fn summary(&self) -> String {
        let channel = if self.channel_id.is_empty() { "(none)" } else { &self.channel_id };
        let key = if self.api_key.is_some() { "set" } else { "none" };
        format!("Channel: {}\nAPI key: {}", channel, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_without_key() {
        let config = ChannelConfig::new(" 12345 ", "");
        assert_eq!(config.api_key, None);
        assert_eq!(
            config.last_entry_url(),
            "https://api.thingspeak.com/channels/12345/feeds/last.json"
        );
    }

    #[test]
    fn url_with_key() {
        let config = ChannelConfig::new("12345", " ABCDEF ");
        assert_eq!(
            config.last_entry_url(),
            "https://api.thingspeak.com/channels/12345/feeds/last.json?api_key=ABCDEF"
        );
    }

    #[test]
    fn url_escapes_provisioned_values() {
        let config = ChannelConfig::new("12/../99", "K&results=8000#x");
        assert_eq!(
            config.last_entry_url(),
            "https://api.thingspeak.com/channels/12%2F..%2F99/feeds/last.json?api_key=K%26results%3D8000%23x"
        );

        let config = ChannelConfig::from_qr_payload(r#"{"channel":"1 2","key":"a+b?"}"#);
        assert_eq!(
            config.last_entry_url(),
            "https://api.thingspeak.com/channels/1%202/feeds/last.json?api_key=a%2Bb%3F"
        );
    }

    #[test]
    fn empty_channel_fails_validation() {
        let err = ChannelConfig::new("   ", "KEY").validate().unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
        assert!(ChannelConfig::new("1", "").validate().is_ok());
    }

    #[test]
    fn qr_payload_fills_both_fields() {
        let config = ChannelConfig::from_qr_payload(r#"{"channel":"998877","key":"READKEY"}"#);
        assert_eq!(config, ChannelConfig::new("998877", "READKEY"));
    }

    #[test]
    fn qr_payload_missing_members_are_empty() {
        let config = ChannelConfig::from_qr_payload(r#"{"channel":"42"}"#);
        assert_eq!(config.channel_id, "42");
        assert_eq!(config.api_key, None);

        let config = ChannelConfig::from_qr_payload(r#"{"channel":1234,"key":null}"#);
        assert_eq!(config, ChannelConfig::new("1234", ""));

        let config = ChannelConfig::from_qr_payload("{}");
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_json_payload_is_channel_id() {
        let config = ChannelConfig::from_qr_payload("  2468135 \n");
        assert_eq!(config.channel_id, "2468135");
        assert_eq!(config.api_key, None);

        let config = ChannelConfig::from_qr_payload(r#"["1","2"]"#);
        assert_eq!(config.channel_id, r#"["1","2"]"#);
    }

    #[test]
    fn summary_hides_key() {
        let config = ChannelConfig::new("7", "SECRET");
        assert_eq!(config.summary(), "Channel: 7\nAPI key: set");
        assert_eq!(ChannelConfig::default().summary(), "Channel: (none)\nAPI key: none");
    }
}
