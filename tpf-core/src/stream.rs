//! Bounded push-stream with out-of-band metadata
//!
//! The result of a query is a lazy sequence of items carrying one
//! out-of-band property (the match [`Metadata`]) and ending with exactly one
//! terminal signal: a clean end or an error. The sequence is expressed as a
//! bounded channel of tagged events, so backpressure is structural: a
//! producer suspends in [`Sink::push`] once the buffer is full and resumes
//! only as the consumer drains it. A consumer may stop draining at any time;
//! dropping the [`EventStream`] makes further pushes fail with
//! [`Error::StreamClosed`], so a producer never leaks work past the buffer
//! bound.
//!
//! Metadata may arrive before, between, or after items, but a well-behaved
//! producer sets it no later than the terminal signal.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Default buffer capacity for result streams
pub const DEFAULT_CAPACITY: usize = 64;

/// Out-of-band description of a result stream
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Total number of matches, ignoring limit and offset
    #[serde(rename = "totalCount")]
    pub total_count: u64,
    /// Whether `total_count` is exact rather than an estimate
    #[serde(rename = "hasExactCount")]
    pub exact: bool,
}

/// One event of a push-stream
#[derive(Debug)]
pub enum StreamEvent<T> {
    /// A produced item
    Item(T),
    /// The out-of-band metadata property
    Metadata(Metadata),
    /// Clean end of the sequence
    End,
    /// Error termination of the sequence
    Error(Error),
}

/// Create a bounded stream with the given buffer capacity
pub fn channel<T>(capacity: usize) -> (Sink<T>, EventStream<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        Sink { tx },
        EventStream {
            rx,
            metadata: None,
            done: false,
        },
    )
}

/// Producer half of a stream
///
/// Cloneable so that a supervising task can still signal an error after
/// handing the sink to a backend; the consumer ignores everything after the
/// first terminal event.
#[derive(Clone, Debug)]
pub struct Sink<T> {
    tx: mpsc::Sender<StreamEvent<T>>,
}

impl<T> Sink<T> {
    /// Push one item, waiting while the buffer is full
    pub async fn push(&self, item: T) -> Result<()> {
        self.tx
            .send(StreamEvent::Item(item))
            .await
            .map_err(|_| Error::StreamClosed)
    }

    /// Set the out-of-band metadata property
    pub async fn set_metadata(&self, metadata: Metadata) -> Result<()> {
        self.tx
            .send(StreamEvent::Metadata(metadata))
            .await
            .map_err(|_| Error::StreamClosed)
    }

    /// Signal a clean end of the sequence
    pub async fn close(self) -> Result<()> {
        self.tx
            .send(StreamEvent::End)
            .await
            .map_err(|_| Error::StreamClosed)
    }

    /// Terminate the sequence with an error
    pub async fn fail(self, error: Error) -> Result<()> {
        self.tx
            .send(StreamEvent::Error(error))
            .await
            .map_err(|_| Error::StreamClosed)
    }
}

/// Consumer half of a stream
#[derive(Debug)]
pub struct EventStream<T> {
    rx: mpsc::Receiver<StreamEvent<T>>,
    metadata: Option<Metadata>,
    done: bool,
}

impl<T> EventStream<T> {
    /// Receive the next item
    ///
    /// Returns `None` after a clean end and `Some(Err(_))` exactly once for
    /// an error termination; every call after a terminal event returns
    /// `None`. A producer that goes away without signaling is treated as a
    /// clean end.
    pub async fn next(&mut self) -> Option<Result<T>> {
        if self.done {
            return None;
        }
        while let Some(event) = self.rx.recv().await {
            match event {
                StreamEvent::Item(item) => return Some(Ok(item)),
                StreamEvent::Metadata(metadata) => {
                    // first write wins; the property is set once
                    self.metadata.get_or_insert(metadata);
                }
                StreamEvent::End => {
                    self.finish();
                    return None;
                }
                StreamEvent::Error(error) => {
                    self.finish();
                    return Some(Err(error));
                }
            }
        }
        self.finish();
        None
    }

    /// The metadata property, once observed
    ///
    /// Guaranteed to be populated no later than the terminal event, provided
    /// the producer set it.
    pub fn metadata(&self) -> Option<Metadata> {
        self.metadata
    }

    /// Drain the stream into a vector, together with the final metadata
    pub async fn collect(mut self) -> Result<(Vec<T>, Option<Metadata>)> {
        let mut items = Vec::new();
        while let Some(next) = self.next().await {
            items.push(next?);
        }
        Ok((items, self.metadata))
    }

    fn finish(&mut self) {
        self.done = true;
        self.rx.close();
    }
}
