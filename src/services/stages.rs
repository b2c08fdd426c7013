//! Generation state machine
//!
//! A request moves strictly forward through the stages below. Any failure
//! jumps to `Failed` and records where it happened and what kind of error
//! caused it.

use crate::error::{ErrorKind, Result, StyleTextError};
use instant::{Duration, Instant};

/// Stages of one generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Upload accepted, nothing done yet
    Received,
    /// Upload decoded to a colour image
    Decoded,
    /// Style image brought to the model's input height
    Normalized,
    /// Model collaborator returned its three outputs
    Synthesized,
    /// Background keyed out into an alpha channel
    Matted,
    /// Result resized back to the upload's dimensions
    Restored,
    /// Audit artifacts written (or skipped)
    Persisted,
    /// Final PNG encoded
    Encoded,
    Done,
    Failed,
}

impl PipelineStage {
    /// Human-readable description of the work that leads into this stage
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            PipelineStage::Received => "Request received",
            PipelineStage::Decoded => "Decoding style image",
            PipelineStage::Normalized => "Normalising style image height",
            PipelineStage::Synthesized => "Synthesising styled text",
            PipelineStage::Matted => "Extracting alpha matte",
            PipelineStage::Restored => "Restoring original size",
            PipelineStage::Persisted => "Persisting artifacts",
            PipelineStage::Encoded => "Encoding PNG",
            PipelineStage::Done => "Generation completed",
            PipelineStage::Failed => "Generation failed",
        }
    }

    /// The only stage reachable from this one on success
    #[must_use]
    pub fn next(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Received => Some(PipelineStage::Decoded),
            PipelineStage::Decoded => Some(PipelineStage::Normalized),
            PipelineStage::Normalized => Some(PipelineStage::Synthesized),
            PipelineStage::Synthesized => Some(PipelineStage::Matted),
            PipelineStage::Matted => Some(PipelineStage::Restored),
            PipelineStage::Restored => Some(PipelineStage::Persisted),
            PipelineStage::Persisted => Some(PipelineStage::Encoded),
            PipelineStage::Encoded => Some(PipelineStage::Done),
            PipelineStage::Done | PipelineStage::Failed => None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Where and why a generation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageFailure {
    /// Last stage reached before the failure
    pub stage: PipelineStage,
    pub kind: ErrorKind,
}

/// Tracks the current stage of one generation and how long each took
#[derive(Debug)]
pub struct StageTracker {
    current: PipelineStage,
    started: Instant,
    stage_started: Instant,
    history: Vec<(PipelineStage, Duration)>,
    failure: Option<StageFailure>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    /// Start tracking in `Received`
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            current: PipelineStage::Received,
            started: now,
            stage_started: now,
            history: Vec::new(),
            failure: None,
        }
    }

    #[must_use]
    pub fn current(&self) -> PipelineStage {
        self.current
    }

    /// Move to `stage`, which must be the successor of the current stage
    ///
    /// Returns the time spent reaching `stage`.
    pub fn advance(&mut self, stage: PipelineStage) -> Result<Duration> {
        if self.current.next() != Some(stage) {
            return Err(StyleTextError::internal(format!(
                "illegal stage transition {} -> {}",
                self.current, stage
            )));
        }

        let elapsed = self.stage_started.elapsed();
        tracing::debug!(
            from = %self.current,
            to = %stage,
            elapsed_ms = elapsed.as_millis() as u64,
            "{}",
            stage.description()
        );

        self.history.push((stage, elapsed));
        self.current = stage;
        self.stage_started = Instant::now();
        Ok(elapsed)
    }

    /// Move to `Failed`, remembering the stage and error kind
    ///
    /// Has no effect once a terminal stage was reached.
    pub fn fail(&mut self, kind: ErrorKind) {
        if self.current.is_terminal() {
            return;
        }
        self.failure = Some(StageFailure {
            stage: self.current,
            kind,
        });
        self.history
            .push((PipelineStage::Failed, self.stage_started.elapsed()));
        self.current = PipelineStage::Failed;
    }

    #[must_use]
    pub fn failure(&self) -> Option<StageFailure> {
        self.failure
    }

    /// Stages reached so far, with the time spent reaching each
    #[must_use]
    pub fn history(&self) -> &[(PipelineStage, Duration)] {
        &self.history
    }

    /// Time spent reaching `stage`, zero if it was never reached
    #[must_use]
    pub fn duration_of(&self, stage: PipelineStage) -> Duration {
        self.history
            .iter()
            .find(|(s, _)| *s == stage)
            .map_or(Duration::ZERO, |(_, d)| *d)
    }

    #[must_use]
    pub fn total_elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
