//! Startup asset load sequencing
//!
//! The fish material library, the fish geometry and the squid geometry are
//! loaded strictly one after another. [`LoadSequence`] tracks which step is
//! in flight and ends in either completion or a terminal failure.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadStep {
    FishMaterial,
    FishGeometry,
    SquidGeometry,
}

impl LoadStep {
    pub const ORDER: [LoadStep; 3] = [
        LoadStep::FishMaterial,
        LoadStep::FishGeometry,
        LoadStep::SquidGeometry,
    ];

    pub fn next(self) -> Option<LoadStep> {
        match self {
            LoadStep::FishMaterial => Some(LoadStep::FishGeometry),
            LoadStep::FishGeometry => Some(LoadStep::SquidGeometry),
            LoadStep::SquidGeometry => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LoadStep::FishMaterial => "fish materials",
            LoadStep::FishGeometry => "fish geometry",
            LoadStep::SquidGeometry => "squid geometry",
        }
    }

    /// 1-based position in the sequence
    pub fn number(self) -> usize {
        match self {
            LoadStep::FishMaterial => 1,
            LoadStep::FishGeometry => 2,
            LoadStep::SquidGeometry => 3,
        }
    }
}

impl fmt::Display for LoadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Failed to load {step} from '{path}': {reason}")]
    Failed {
        step: LoadStep,
        path: String,
        reason: String,
    },
    #[error("Completed {completed} while waiting for {expected:?}")]
    OutOfOrder {
        expected: Option<LoadStep>,
        completed: LoadStep,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Progress {
    Running(LoadStep),
    Complete,
    Failed(LoadError),
}

/// Linear load sequence with an explicit terminal failure
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSequence {
    progress: Progress,
}

impl Default for LoadSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadSequence {
    pub fn new() -> Self {
        Self {
            progress: Progress::Running(LoadStep::FishMaterial),
        }
    }

    /// Step currently in flight
    pub fn current(&self) -> Option<LoadStep> {
        match self.progress {
            Progress::Running(step) => Some(step),
            _ => None,
        }
    }

    /// Mark `step` finished and return the step to start next.
    ///
    /// Completing anything other than the current step is an error and does
    /// not change the sequence.
    pub fn complete(&mut self, step: LoadStep) -> Result<Option<LoadStep>, LoadError> {
        if self.current() != Some(step) {
            return Err(LoadError::OutOfOrder {
                expected: self.current(),
                completed: step,
            });
        }

        let next = step.next();
        self.progress = match next {
            Some(next) => Progress::Running(next),
            None => Progress::Complete,
        };
        Ok(next)
    }

    /// Enter the terminal failed state; later failures are ignored
    pub fn fail(&mut self, error: LoadError) {
        if !self.is_failed() {
            self.progress = Progress::Failed(error);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress == Progress::Complete
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.progress, Progress::Failed(_))
    }

    pub fn error(&self) -> Option<&LoadError> {
        match &self.progress {
            Progress::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Steps finished so far
    pub fn completed_steps(&self) -> usize {
        match &self.progress {
            Progress::Running(step) => step.number() - 1,
            Progress::Complete => LoadStep::ORDER.len(),
            Progress::Failed(LoadError::Failed { step, .. }) => step.number() - 1,
            Progress::Failed(LoadError::OutOfOrder { .. }) => 0,
        }
    }
}
