//! Reconnection supervisor
//!
//! Drives the exporter's only control loop:
//!
//! ```text
//! Searching --found--> Streaming --stream ended, wait 5s--> Searching
//!     ^                                                        |
//!     +------------------- not found, wait 10s ----------------+
//! ```
//!
//! There is no terminal state. Every return to `Streaming` goes through a
//! fresh pod search, so restarts and rescheduling are handled the same way
//! as network errors.
//!
//! A reconnect to the same pod (same uid) resumes from the last line seen
//! instead of re-reading the whole log. A different pod is read from the start.

use crate::k8s::{LogSource, PodHandle, PodLocator, Target};
use crate::presence::PresenceTracker;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

pub const SEARCH_BACKOFF: Duration = Duration::from_secs(10);
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
    Searching,
    Streaming(PodHandle),
}

/// Last moment a stream on the pod with `uid` was known to be caught up
#[derive(Debug, Clone)]
struct Checkpoint {
    uid: String,
    seen_at: Instant,
}

pub struct Supervisor<L, S> {
    locator: L,
    source: S,
    target: Target,
    tracker: PresenceTracker,
    state: SupervisorState,
    search_backoff: Duration,
    reconnect_backoff: Duration,
    checkpoint: Option<Checkpoint>,
}

impl<L: PodLocator, S: LogSource> Supervisor<L, S> {
    pub fn new(locator: L, source: S, target: Target, tracker: PresenceTracker) -> Self {
        Self {
            locator,
            source,
            target,
            tracker,
            state: SupervisorState::Searching,
            search_backoff: SEARCH_BACKOFF,
            reconnect_backoff: RECONNECT_BACKOFF,
            checkpoint: None,
        }
    }

    pub fn with_backoff(mut self, search: Duration, reconnect: Duration) -> Self {
        self.search_backoff = search;
        self.reconnect_backoff = reconnect;
        self
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run forever. Only process shutdown stops this.
    pub async fn run(mut self) {
        info!(
            "Watching pods matching {} in namespace {} (container {})",
            self.target.label_selector, self.target.namespace, self.target.container
        );

        loop {
            self.step().await;
        }
    }

    /// Perform one transition of the state machine, including its backoff
    pub async fn step(&mut self) {
        // The handle is moved out here and never put back.
        match std::mem::replace(&mut self.state, SupervisorState::Searching) {
            SupervisorState::Searching => match self.locator.locate(&self.target).await {
                Some(handle) => {
                    info!("Target pod found: {}. Starting log stream...", handle);
                    self.state = SupervisorState::Streaming(handle);
                }
                None => {
                    if let Some(metrics) = self.tracker.metrics() {
                        metrics.search_failures.inc();
                    }
                    info!(
                        "Server pod not found. Retrying in {}s...",
                        self.search_backoff.as_secs()
                    );
                    tokio::time::sleep(self.search_backoff).await;
                }
            },
            SupervisorState::Streaming(handle) => {
                let lines = self.follow(handle).await;
                info!(
                    "Stream ended after {} lines. Reconnecting in {}s...",
                    lines,
                    self.reconnect_backoff.as_secs()
                );
                tokio::time::sleep(self.reconnect_backoff).await;
            }
        }
    }

    async fn follow(&mut self, handle: PodHandle) -> u64 {
        let resume = self.resume_point(&handle);

        let mut session = match self.source.open(&handle, resume).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Could not open log stream for {}: {}", handle, e);
                return 0;
            }
        };

        if let Some(metrics) = self.tracker.metrics() {
            metrics.stream_sessions.inc();
        }

        // A resumed stream keeps the old checkpoint until its first line
        let checkpoint = self.checkpoint.get_or_insert_with(|| Checkpoint {
            uid: handle.uid.clone(),
            seen_at: Instant::now(),
        });

        while let Some(line) = session.next_line().await {
            self.tracker.handle_line(&line);
            checkpoint.seen_at = Instant::now();
        }

        session.lines_read()
    }

    /// How far back to read when opening `handle`; `None` reads the whole log
    fn resume_point(&mut self, handle: &PodHandle) -> Option<Duration> {
        if self
            .checkpoint
            .as_ref()
            .is_some_and(|checkpoint| checkpoint.uid != handle.uid)
        {
            self.checkpoint = None;
        }

        self.checkpoint
            .as_ref()
            .map(|checkpoint| checkpoint.seen_at.elapsed())
    }
}
