//! Follow-mode log streaming
//!
//! A background reader task owns the connection to the API server and pushes
//! lines into a bounded channel. The consumer pulls lines from a
//! [`StreamSession`] until it reports the stream has ended. Connection drops,
//! pod termination, decode failures and server-side close all end the
//! session the same way; the reason is only logged.

use crate::k8s::client::K8sClient;
use crate::k8s::types::PodHandle;
use crate::{McwatchError, Result};
use async_trait::async_trait;
use futures::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use k8s_openapi::api::core::v1::Pod;
use kube::api::LogParams;
use kube::Api;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lines buffered between the reader task and the consumer
pub const LINE_BUFFER: usize = 1024;

/// Longest line kept in full; the rest of a longer line is dropped
pub const MAX_LINE_BYTES: usize = 64 * 1024;

pub type LogLine = Result<String>;

#[async_trait]
pub trait LogSource: Send + Sync {
    /// Start following the logs of the container behind `handle`.
    ///
    /// With `resume`, only lines written within that long before now are
    /// read; without it the log is read from the start.
    async fn open(&self, handle: &PodHandle, resume: Option<Duration>) -> Result<StreamSession>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Streaming,
    Closed(String),
}

/// One live log-follow connection. Not restartable: once closed, it stays closed.
pub struct StreamSession {
    handle: PodHandle,
    rx: mpsc::Receiver<LogLine>,
    reader: Option<JoinHandle<()>>,
    state: SessionState,
    lines_read: u64,
}

impl StreamSession {
    pub fn new(handle: PodHandle, rx: mpsc::Receiver<LogLine>) -> Self {
        Self {
            handle,
            rx,
            reader: None,
            state: SessionState::Connecting,
            lines_read: 0,
        }
    }

    /// Attach the task feeding this session so it is stopped with it
    pub fn with_reader(mut self, reader: JoinHandle<()>) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Wait for the next line. `None` means the stream has ended for good.
    pub async fn next_line(&mut self) -> Option<String> {
        if matches!(self.state, SessionState::Closed(_)) {
            return None;
        }

        match self.rx.recv().await {
            Some(Ok(line)) => {
                if self.state == SessionState::Connecting {
                    info!("Log stream established for {}", self.handle);
                    self.state = SessionState::Streaming;
                }
                self.lines_read += 1;
                Some(line)
            }
            Some(Err(e)) => {
                self.close(e.to_string());
                None
            }
            None => {
                self.close("stream closed by server".to_string());
                None
            }
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn handle(&self) -> &PodHandle {
        &self.handle
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    fn close(&mut self, reason: String) {
        warn!(
            "Log stream for {} ended after {} lines: {}",
            self.handle, self.lines_read, reason
        );
        self.state = SessionState::Closed(reason);
        self.rx.close();
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Reads container logs through the Kubernetes API
pub struct KubeLogSource {
    client: K8sClient,
}

impl KubeLogSource {
    pub fn new(client: K8sClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogSource for KubeLogSource {
    async fn open(&self, handle: &PodHandle, resume: Option<Duration>) -> Result<StreamSession> {
        let api = self.client.pods(&handle.namespace);
        let name = handle.name.clone();
        let params = LogParams {
            follow: true,
            container: Some(handle.container.clone()),
            since_seconds: resume.map(since_seconds),
            ..Default::default()
        };

        match params.since_seconds {
            Some(secs) => debug!("Resuming log stream for {} from {}s ago", handle, secs),
            None => debug!("Opening log stream for {}", handle),
        }

        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        let reader = tokio::spawn(async move {
            if let Err(e) = forward_lines(api, name, params, &tx).await {
                let _ = tx.send(Err(e)).await;
            }
        });

        Ok(StreamSession::new(handle.clone(), rx).with_reader(reader))
    }
}

async fn forward_lines(
    api: Api<Pod>,
    name: String,
    params: LogParams,
    tx: &mpsc::Sender<LogLine>,
) -> Result<()> {
    let stream = api.log_stream(&name, &params).await.map_err(|e| {
        McwatchError::StreamInterruption(format!("Failed to open log stream for {}: {}", name, e))
    })?;
    let mut reader = Box::pin(stream);
    let mut buf = Vec::new();

    loop {
        let n = read_line_capped(&mut reader, &mut buf, MAX_LINE_BYTES)
            .await
            .map_err(|e| McwatchError::StreamInterruption(e.to_string()))?;

        if n == 0 {
            return Ok(());
        }
        if n > buf.len() {
            debug!("Truncated a {} byte line from {}", n, name);
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');

        if tx.send(Ok(line.to_string())).await.is_err() {
            // Session dropped
            return Ok(());
        }
    }
}

/// Whole seconds to ask the API server for, rounded up so no line is skipped
pub fn since_seconds(resume: Duration) -> i64 {
    let secs = resume.as_secs() + u64::from(resume.subsec_nanos() > 0);
    i64::try_from(secs).unwrap_or(i64::MAX).max(1)
}

/// Read one line into `buf`, keeping at most `max` bytes of it.
///
/// Returns the number of bytes consumed from `reader`, including any dropped
/// tail; zero means end of stream.
pub async fn read_line_capped<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max: usize,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    buf.clear();
    let mut consumed = (&mut *reader).take(max as u64).read_until(b'\n', buf).await?;
    if consumed < max || buf.last() == Some(&b'\n') {
        return Ok(consumed);
    }

    let mut rest = Vec::new();
    loop {
        rest.clear();
        let n = (&mut *reader)
            .take(max as u64)
            .read_until(b'\n', &mut rest)
            .await?;
        consumed += n;
        if n < max || rest.last() == Some(&b'\n') {
            return Ok(consumed);
        }
    }
}
