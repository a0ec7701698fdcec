use reqwest::{Client, header};
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};

/// Downloads the watched product page.
pub struct Fetcher {
    client: Client,
    url: Url,
}

impl Fetcher {
    /// Builds a client carrying the configured user agent and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the user agent is not a valid header value
    /// and [`Error::HttpRequest`] if the client cannot be built.
    pub fn new(config: &Config) -> Result<Fetcher> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&config.user_agent)
                .map_err(|e| Error::Config(format!("invalid user agent: {e}")))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Fetcher {
            client,
            url: config.target_url.clone(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fetches the page body. Network failures, timeouts and non-2xx
    /// statuses are all returned as errors; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HttpRequest`] when the request fails, exceeds the
    /// timeout or the server answers with a non-2xx status.
    pub async fn fetch_html(&self) -> Result<String> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}
