//! Image fetching: plain HTTP(S) GET to a local file.
//!
//! One shared [`reqwest::Client`] per run carries the configured timeout;
//! fetches are sequential and blocking from the pipeline's point of view.
//! Every failure here is a recoverable [`ImageError`]: a dead CDN link must
//! never take the document down with it.

use crate::error::{ImageError, Yuque2MdError};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Build the HTTP client shared by all fetches of a run.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client, Yuque2MdError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Yuque2MdError::Internal(format!("Failed to build HTTP client: {e}")))
}

/// GET `url` and write the response body verbatim to `dest`.
///
/// A non-success status is reported as [`ImageError::Status`]; the caller
/// leaves the markdown line unmodified in that case.
pub async fn fetch(client: &reqwest::Client, url: &str, dest: &Path) -> Result<(), ImageError> {
    debug!("Downloading image {} to {}", url, dest.display());

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ImageError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ImageError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(|e| ImageError::Request {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|e| ImageError::Write {
            path: dest.to_path_buf(),
            source: e,
        })
}
