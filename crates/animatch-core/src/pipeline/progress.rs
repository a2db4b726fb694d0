//! Analysis phases and progress reporting.
//!
//! Progress events are advisory text for display; they are not part of the
//! result contract.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tokio::sync::broadcast;

use crate::error::{AnimatchError, AnimatchResult};

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 64;

/// Phase of a single analysis run.
///
/// Runs move strictly forward through
/// `Idle -> Recognizing -> Resolving -> Ranking -> Synthesizing -> Done`;
/// `Failed` is reachable from any phase that is not terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisPhase {
    Idle,
    Recognizing,
    Resolving,
    Ranking,
    Synthesizing,
    Done,
    Failed,
}

impl AnalysisPhase {
    /// Human-readable label for progress displays.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Initializing Analysis",
            Self::Recognizing => "Recognizing Characters",
            Self::Resolving => "Gathering Details",
            Self::Ranking => "Finding Similar Characters",
            Self::Synthesizing => "Generating Suggestions",
            Self::Done => "Analysis Complete",
            Self::Failed => "Analysis Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Position among the four working phases, for progress bars.
    pub fn step_index(&self) -> Option<usize> {
        match self {
            Self::Recognizing => Some(0),
            Self::Resolving => Some(1),
            Self::Ranking => Some(2),
            Self::Synthesizing => Some(3),
            _ => None,
        }
    }

    /// The phase that follows on success, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Recognizing),
            Self::Recognizing => Some(Self::Resolving),
            Self::Resolving => Some(Self::Ranking),
            Self::Ranking => Some(Self::Synthesizing),
            Self::Synthesizing => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn can_transition_to(&self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Failed || self.next() == Some(to)
    }
}

/// A progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: AnalysisPhase,
    /// Free-text detail, e.g. `Finding similar characters for Vegeta...`.
    pub detail: String,
}

/// Receives progress notifications from a running analysis.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Fan-out of progress events to any number of subscribers.
///
/// Events are fire-and-forget; slow subscribers miss events rather than
/// blocking the analysis.
#[derive(Clone)]
pub struct ProgressBus {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> ProgressSubscriber {
        ProgressSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ProgressBus {
    fn on_progress(&self, event: &ProgressEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event.clone());
    }
}

/// Subscriber to a [`ProgressBus`].
pub struct ProgressSubscriber {
    receiver: broadcast::Receiver<ProgressEvent>,
}

impl ProgressSubscriber {
    /// Receive the next event, or `None` once the bus is dropped.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Progress subscriber lagged by {} events", n);
                    continue;
                }
            }
        }
    }

    /// Non-blocking receive.
    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Enforces phase ordering for one run and forwards events to an observer.
pub(crate) struct PhaseTracker<'a> {
    current: AnalysisPhase,
    observer: Option<&'a dyn ProgressObserver>,
}

impl<'a> PhaseTracker<'a> {
    pub(crate) fn new(observer: Option<&'a dyn ProgressObserver>) -> Self {
        Self {
            current: AnalysisPhase::Idle,
            observer,
        }
    }

    #[cfg(test)]
    pub(crate) fn current(&self) -> AnalysisPhase {
        self.current
    }

    /// Move to `to`, emitting `detail`.
    pub(crate) fn advance(&mut self, to: AnalysisPhase, detail: impl Into<String>) -> AnimatchResult<()> {
        if !self.current.can_transition_to(to) {
            return Err(AnimatchError::Internal(format!(
                "Invalid phase transition {} -> {}",
                self.current, to
            )));
        }
        tracing::info!(from = %self.current, to = %to, "Analysis phase");
        self.current = to;
        self.emit(detail.into());
        Ok(())
    }

    /// Emit extra detail within the current phase.
    pub(crate) fn report(&self, detail: impl Into<String>) {
        self.emit(detail.into());
    }

    /// Mark the run failed unless it already finished.
    pub(crate) fn fail(&mut self, error: &AnimatchError) {
        if self.current.is_terminal() {
            return;
        }
        tracing::error!(phase = %self.current, error = %error, "Analysis failed");
        self.current = AnalysisPhase::Failed;
        self.emit(error.to_string());
    }

    fn emit(&self, detail: String) {
        if let Some(observer) = self.observer {
            observer.on_progress(&ProgressEvent {
                phase: self.current,
                detail,
            });
        }
    }
}
