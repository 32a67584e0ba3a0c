//! Resource fetching for datasource backends
//!
//! Resolves a URL-like locator into a byte stream, either from the local
//! filesystem (the default, and the explicit `file:` scheme) or over
//! HTTP(S). Errors travel in-band on the byte stream; when the consumer has
//! already gone away by the time an error surfaces, the error is promoted to
//! the owning datasource's error channel instead of being dropped.

use crate::error::{Error, Result};
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::debug;

/// Buffer capacity of a fetched byte stream, in chunks
const FETCH_CAPACITY: usize = 16;

/// Read chunk size for filesystem fetches
const FILE_CHUNK_SIZE: usize = 16 * 1024;

/// Sink for errors nobody else is observing
pub(crate) type ErrorSink = mpsc::UnboundedSender<Error>;

/// A stream of fetched bytes
#[derive(Debug)]
pub struct ByteStream {
    rx: mpsc::Receiver<Result<Bytes>>,
}

impl ByteStream {
    /// Receive the next chunk; `None` signals a clean end
    pub async fn next(&mut self) -> Option<Result<Bytes>> {
        self.rx.recv().await
    }

    /// Drain the stream into a single buffer
    pub async fn collect(mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}

/// Resolve a locator into a byte stream
///
/// Unhandled errors (the consumer dropped the stream before the error
/// arrived) are re-emitted on `unobserved_errors`.
pub(crate) fn fetch(url: &str, unobserved_errors: ErrorSink) -> ByteStream {
    let (tx, rx) = mpsc::channel(FETCH_CAPACITY);
    let url = url.to_string();
    debug!(url = %url, "fetching resource");
    tokio::spawn(async move {
        let outcome = match scheme_of(&url) {
            None | Some("file") => fetch_file(&url, &tx).await,
            Some("http") | Some("https") => fetch_http(&url, &tx).await,
            Some(other) => Err(Error::UnknownProtocol(other.to_string())),
        };
        if let Err(error) = outcome {
            deliver_error(&tx, &unobserved_errors, error).await;
        }
    });
    ByteStream { rx }
}

/// The scheme of a locator, if it has one
fn scheme_of(url: &str) -> Option<&str> {
    let colon = url.find(':')?;
    let scheme = &url[..colon];
    let valid = !scheme.is_empty()
        && scheme.as_bytes()[0].is_ascii_lowercase()
        && scheme
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b"+-.".contains(&b));
    valid.then_some(scheme)
}

/// Strip a `file:` scheme from a locator, leaving a filesystem path
fn file_path(url: &str) -> &str {
    url.strip_prefix("file://")
        .or_else(|| url.strip_prefix("file:"))
        .unwrap_or(url)
}

async fn fetch_file(url: &str, tx: &mpsc::Sender<Result<Bytes>>) -> Result<()> {
    let mut file = tokio::fs::File::open(file_path(url)).await?;
    let mut buf = vec![0u8; FILE_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        if tx
            .send(Ok(Bytes::copy_from_slice(&buf[..n])))
            .await
            .is_err()
        {
            // consumer stopped draining; release the file and stop reading
            return Ok(());
        }
    }
}

async fn fetch_http(url: &str, tx: &mpsc::Sender<Result<Bytes>>) -> Result<()> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::io(e.to_string()))?;
    let status = response.status();
    if status.as_u16() >= 300 {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| Error::io(e.to_string()))?;
        if tx.send(Ok(chunk)).await.is_err() {
            return Ok(());
        }
    }
    Ok(())
}

/// Deliver an error to the stream consumer, or to the datasource-level
/// channel when the consumer is no longer observing
async fn deliver_error(tx: &mpsc::Sender<Result<Bytes>>, fallback: &ErrorSink, error: Error) {
    if tx.send(Err(error.clone())).await.is_err() {
        debug!(%error, "fetch error had no observer, promoting to datasource level");
        let _ = fallback.send(error);
    }
}
