use log::error;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};

#[derive(Serialize)]
struct BroadcastRequest<'a> {
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// Sends a text message to every follower of the LINE channel.
pub struct Notifier {
    client: Client,
    endpoint: Url,
    access_token: String,
}

impl Notifier {
    /// # Errors
    ///
    /// Returns [`Error::HttpRequest`] if the client cannot be built.
    pub fn new(config: &Config) -> Result<Notifier> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Notifier {
            client,
            endpoint: config.broadcast_url.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// Posts `text` as a single broadcast message. A non-2xx response is
    /// logged with its body and returned as [`Error::Notify`].
    ///
    /// # Errors
    ///
    /// [`Error::Notify`] for a rejected broadcast, [`Error::HttpRequest`] when
    /// the request fails or exceeds the timeout.
    pub async fn broadcast(&self, text: &str) -> Result<()> {
        let payload = BroadcastRequest {
            messages: [TextMessage { kind: "text", text }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!("LINE send error: {} {body}", status.as_u16());
        Err(Error::Notify {
            status: status.as_u16(),
            body,
        })
    }
}

/// The message sent when the item comes back in stock.
#[must_use]
pub fn restock_message(url: &Url) -> String {
    format!("Back in stock!\n{url}")
}
