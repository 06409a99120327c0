//! Sync transports
//!
//! - `HttpStreamTransport`: long-lived HTTP GET streaming newline-delimited
//!   JSON or SSE `data:` lines.
//! - `ChannelTransport`: in-memory feed for embedding hosts and tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use floorplan_types::{SyncEvent, SyncTopic};
use tokio::sync::mpsc;
use url::Url;
use uuid::Uuid;

use crate::error::{ApiError, SyncError, SyncResult};

/// Source of sync events for one exhibition
#[async_trait]
pub trait SyncTransport: Send {
    /// Open (or reopen) the subscription to both exhibition topics
    async fn connect(&mut self, exhibition_id: Uuid) -> SyncResult<()>;

    /// Next event in arrival order. `Ok(None)` means the feed ended.
    ///
    /// `Err(SyncError::Decode)` skips one bad line; any other error drops the
    /// connection.
    async fn next_event(&mut self) -> SyncResult<Option<SyncEvent>>;

    /// False once the feed has ended for good and reconnecting is pointless
    fn can_reopen(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str;
}

// =============================================================================
// HTTP STREAM
// =============================================================================

pub struct HttpStreamTransport {
    client: reqwest::Client,
    base_url: Url,
    response: Option<reqwest::Response>,
    buffer: Vec<u8>,
    lines: VecDeque<String>,
}

impl HttpStreamTransport {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self::with_client(reqwest::Client::new(), Url::parse(base_url)?))
    }

    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            response: None,
            buffer: Vec::new(),
            lines: VecDeque::new(),
        }
    }

    /// `{base}/api/exhibitions/{id}/feed?topics=exhibition:{id}:stalls,exhibition:{id}:layout`
    pub fn feed_url(&self, exhibition_id: Uuid) -> Result<Url, url::ParseError> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/api/exhibitions/{exhibition_id}/feed"))?;
        let topics: Vec<String> = SyncTopic::ALL
            .iter()
            .map(|t| t.channel_name(exhibition_id))
            .collect();
        url.query_pairs_mut().append_pair("topics", &topics.join(","));
        Ok(url)
    }

    fn split_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.lines
                .push_back(String::from_utf8_lossy(&line).trim_end().to_string());
        }
    }
}

/// Payload-bearing feed line, or `None` for blanks and SSE bookkeeping
pub fn feed_payload(line: &str) -> Option<&str> {
    let line = line.trim();
    let is_meta = line.is_empty()
        || line.starts_with(':')
        || line.starts_with("event:")
        || line.starts_with("id:")
        || line.starts_with("retry:");
    if is_meta {
        None
    } else {
        Some(line)
    }
}

#[async_trait]
impl SyncTransport for HttpStreamTransport {
    async fn connect(&mut self, exhibition_id: Uuid) -> SyncResult<()> {
        self.response = None;
        self.buffer.clear();
        self.lines.clear();

        let url = self
            .feed_url(exhibition_id)
            .map_err(|e| SyncError::Disconnected(e.to_string()))?;
        tracing::debug!(url = %url, "opening sync feed");

        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/event-stream, application/x-ndjson",
            )
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SyncError::Disconnected(e.to_string()))?;
        self.response = Some(response);
        Ok(())
    }

    async fn next_event(&mut self) -> SyncResult<Option<SyncEvent>> {
        loop {
            while let Some(line) = self.lines.pop_front() {
                if let Some(payload) = feed_payload(&line) {
                    return SyncEvent::from_feed_line(payload)
                        .map(Some)
                        .map_err(SyncError::from);
                }
            }

            let Some(response) = self.response.as_mut() else {
                return Err(SyncError::Disconnected("not connected".into()));
            };
            match response.chunk().await {
                Ok(Some(bytes)) => {
                    self.buffer.extend_from_slice(&bytes);
                    self.split_lines();
                }
                Ok(None) => {
                    self.response = None;
                    return Ok(None);
                }
                Err(err) => {
                    self.response = None;
                    return Err(SyncError::Disconnected(err.to_string()));
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "http-stream"
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// One item pushed into a [`ChannelTransport`]
#[derive(Debug, Clone)]
pub enum FeedFrame {
    Event(SyncEvent),
    /// Raw feed line, decoded like the HTTP transport would
    Line(String),
    /// Simulate a dropped connection
    Disconnect,
}

pub type FeedSender = mpsc::UnboundedSender<FeedFrame>;

pub struct ChannelTransport {
    rx: mpsc::UnboundedReceiver<FeedFrame>,
    /// Every sender dropped
    closed: bool,
}

impl ChannelTransport {
    pub fn new() -> (Self, FeedSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx, closed: false }, tx)
    }
}

#[async_trait]
impl SyncTransport for ChannelTransport {
    async fn connect(&mut self, exhibition_id: Uuid) -> SyncResult<()> {
        tracing::debug!(%exhibition_id, "in-memory feed connected");
        Ok(())
    }

    async fn next_event(&mut self) -> SyncResult<Option<SyncEvent>> {
        loop {
            match self.rx.recv().await {
                Some(FeedFrame::Event(event)) => return Ok(Some(event)),
                Some(FeedFrame::Line(line)) => {
                    if let Some(payload) = feed_payload(&line) {
                        return SyncEvent::from_feed_line(payload)
                            .map(Some)
                            .map_err(SyncError::from);
                    }
                }
                Some(FeedFrame::Disconnect) => {
                    return Err(SyncError::Disconnected("connection dropped".into()))
                }
                None => {
                    self.closed = true;
                    return Ok(None);
                }
            }
        }
    }

    fn can_reopen(&self) -> bool {
        !self.closed
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}
