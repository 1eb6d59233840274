//! Download of the monthly price-and-demand CSV.
//!
//! A [`Fetcher`] waits a short random delay, visits the AEMO landing page to
//! pick up session cookies, then downloads the data file. Every failure is
//! terminal; nothing is retried.

mod client;
mod headers;
mod resource;

pub use client::{HttpClient, SessionClient};
pub use headers::BrowserHeaders;
pub use resource::{BASE_URL, LANDING_URL, MANUAL_DOWNLOAD_URL, ResourceId};

use crate::error::PipelineError;
use rand::Rng;
use reqwest::StatusCode;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const LANDING_TIMEOUT: Duration = Duration::from_secs(10);
pub const DATA_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues a GET for `url` and returns the body of a 2xx response.
///
/// A 403 is reported as [`PipelineError::AccessDenied`], any other non-2xx as
/// [`PipelineError::HttpStatus`].
pub async fn fetch_bytes<C: HttpClient>(
    client: &C,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, PipelineError> {
    let resp = send(client, url, timeout).await?;

    let status = resp.status();
    if status == StatusCode::FORBIDDEN {
        return Err(PipelineError::AccessDenied {
            url: url.to_string(),
        });
    }
    if !status.is_success() {
        return Err(PipelineError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = resp.bytes().await.map_err(|source| PipelineError::Network {
        url: url.to_string(),
        source,
    })?;
    Ok(bytes.to_vec())
}

async fn send<C: HttpClient>(
    client: &C,
    url: &str,
    timeout: Duration,
) -> Result<reqwest::Response, PipelineError> {
    let parsed = url
        .parse::<reqwest::Url>()
        .map_err(|_| PipelineError::InvalidUrl {
            url: url.to_string(),
        })?;
    let mut req = reqwest::Request::new(reqwest::Method::GET, parsed);
    *req.timeout_mut() = Some(timeout);

    client
        .execute(req)
        .await
        .map_err(|source| PipelineError::Network {
            url: url.to_string(),
            source,
        })
}

/// Writes the downloaded bytes verbatim.
pub fn save_raw(bytes: &[u8], path: &Path) -> Result<(), PipelineError> {
    std::fs::write(path, bytes).map_err(|e| PipelineError::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Raw CSV written");
    Ok(())
}

pub struct Fetcher<C> {
    client: C,
    delay: RangeInclusive<Duration>,
}

impl Fetcher<BrowserHeaders<SessionClient>> {
    /// A cookie-keeping client that presents browser headers, with the default
    /// 1–3 second pre-request delay.
    pub fn browser() -> reqwest::Result<Self> {
        Ok(Self::new(BrowserHeaders::new(SessionClient::new()?, LANDING_URL)))
    }
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            delay: Duration::from_secs(1)..=Duration::from_secs(3),
        }
    }

    /// Sets the bounds, in seconds, of the random pause before the first
    /// request. Both bounds must be finite, non-negative and in order.
    pub fn with_delay(mut self, delay_secs: RangeInclusive<f64>) -> Result<Self, PipelineError> {
        let (min, max) = (*delay_secs.start(), *delay_secs.end());
        let invalid = || PipelineError::InvalidDelay { min, max };

        // also rejects NaN
        if !(min >= 0.0 && min <= max) {
            return Err(invalid());
        }
        let lo = Duration::try_from_secs_f64(min).map_err(|_| invalid())?;
        let hi = Duration::try_from_secs_f64(max).map_err(|_| invalid())?;

        self.delay = lo..=hi;
        Ok(self)
    }

    fn pick_delay(&self) -> Duration {
        let (lo, hi) = (*self.delay.start(), *self.delay.end());
        if hi > lo {
            rand::rng().random_range(lo..=hi)
        } else {
            lo
        }
    }

    /// Downloads the CSV for `resource` and returns its raw bytes.
    #[tracing::instrument(skip(self, resource), fields(resource = %resource))]
    pub async fn fetch(&self, resource: &ResourceId) -> Result<Vec<u8>, PipelineError> {
        let url = resource.url();
        info!(url = %url, "Fetching data");

        let delay = self.pick_delay();
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "Waiting before first request");
            tokio::time::sleep(delay).await;
        }

        info!("Establishing session");
        let landing = send(&self.client, LANDING_URL, LANDING_TIMEOUT).await?;
        debug!(status = landing.status().as_u16(), "Landing page visited");

        info!("Downloading data");
        let bytes = fetch_bytes(&self.client, &url, DATA_TIMEOUT).await?;
        info!(bytes = bytes.len(), "Download complete");
        Ok(bytes)
    }
}

/// The manual fallback when automated download is blocked.
pub fn manual_download_guide(resource: &ResourceId) -> Vec<String> {
    vec![
        format!("1. Open {} in a browser", MANUAL_DOWNLOAD_URL),
        "2. Find the 'Aggregated price and demand' section".to_string(),
        format!(
            "3. Download the {} CSV for {}-{:02} ({})",
            resource.region,
            resource.year,
            resource.month,
            resource.file_name()
        ),
        "4. Save it next to where the report should be written".to_string(),
        "5. Run `aemo_report from-csv <FILE>` to build the workbook from it".to_string(),
    ]
}
