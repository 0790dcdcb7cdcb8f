use thiserror::Error;

use super::parser::{parse_channel, Channel};

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching and decoding one feed document.
///
/// The fetcher performs no retries; a failed fetch aborts the current
/// ingestion cycle and the scheduler moves on at the next tick.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, body read)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the client's configured deadline
    #[error("request timed out")]
    Timeout,
    /// Body was not a well-formed RSS document
    #[error("parse error: {0}")]
    Parse(#[from] quick_xml::DeError),
    /// Response body exceeded the 10MB size limit
    #[error("response too large")]
    ResponseTooLarge,
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Request(err)
        }
    }
}

/// Fetch one feed document and parse it.
///
/// One GET against `url` with the shared client (which carries the
/// identifying `User-Agent` and the request deadline), full body read, then
/// RSS decoding. No side effects beyond the network call.
pub async fn fetch_feed(client: &reqwest::Client, url: &str) -> Result<Channel, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(FetchError::from_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let body = read_limited(response, MAX_FEED_SIZE).await?;

    Ok(parse_channel(&body)?)
}

/// Read the full body, refusing anything over `limit` bytes so one
/// misbehaving feed cannot exhaust memory.
async fn read_limited(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: a declared Content-Length over the limit is rejected
    // before any body bytes are read.
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(FetchError::from_reqwest)? {
        if body.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}
