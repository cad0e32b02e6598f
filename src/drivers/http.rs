// Feedwatch: HTTPS Feed Source
//
// `FeedSource` backed by the ESP-IDF HTTP client.  A fresh connection is
// opened for every request, so the source holds no handles and can move to
// the poller thread.

use std::fmt::Display;
use std::time::Duration;

use embedded_svc::http::client::Client;
use embedded_svc::utils::io;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

use feedwatch::config::*;
use feedwatch::{FeedError, FeedSource};

#[derive(Debug, Default)]
pub struct EspFeedSource;

impl EspFeedSource {
    pub fn new() -> Self {
        Self
    }
}

fn network(stage: &str, e: impl Display) -> FeedError {
    FeedError::Network(format!("{} failed: {}", stage, e))
}

impl FeedSource for EspFeedSource {
    fn get(&mut self, url: &str) -> Result<Vec<u8>, FeedError> {
        let config = Configuration {
            timeout: Some(Duration::from_millis(HTTP_TIMEOUT_MS)),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        };

        let connection = EspHttpConnection::new(&config).map_err(|e| network("connect", e))?;
        let mut client = Client::wrap(connection);

        let request = client.get(url).map_err(|e| network("request", e.0))?;
        let mut response = request.submit().map_err(|e| network("request", e.0))?;

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(FeedError::Network(format!(
                "server returned HTTP status {}",
                status
            )));
        }

        let mut body = vec![0u8; FEED_BODY_LIMIT];
        let read = io::try_read_full(&mut response, &mut body).map_err(|(e, _)| network("read", e.0))?;
        body.truncate(read);

        log::debug!("HTTP {} ({} bytes)", status, read);
        Ok(body)
    }
}
