//! Sequential batch execution results.

use std::time::Duration;

use super::response::Response;
use crate::error::Error;

/// How a batch reacts to a failed command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Keep going after a failure instead of skipping the rest.
    pub continue_on_error: bool,
}

impl BatchOptions {
    /// Abort on the first failure.
    pub fn abort_on_error() -> Self {
        Self {
            continue_on_error: false,
        }
    }

    /// Run every command regardless of failures.
    pub fn continue_on_error() -> Self {
        Self {
            continue_on_error: true,
        }
    }
}

/// What happened to one command of a batch.
#[derive(Debug)]
pub enum BatchOutcome {
    Succeeded(Response),
    Failed(Error),
    /// Not sent because an earlier command failed.
    Skipped,
}

/// One command of a batch and its outcome.
#[derive(Debug)]
pub struct BatchItem {
    /// Position in the submitted list.
    pub index: usize,
    pub command: String,
    pub outcome: BatchOutcome,
}

impl BatchItem {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Succeeded(_))
    }

    pub fn response(&self) -> Option<&Response> {
        match &self.outcome {
            BatchOutcome::Succeeded(r) => Some(r),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match &self.outcome {
            BatchOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Result of a batch, complete even when the batch stopped early.
#[derive(Debug)]
pub struct BatchResult {
    /// One entry per submitted command, in order.
    pub items: Vec<BatchItem>,

    /// Wall time for the whole batch.
    pub elapsed: Duration,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Succeeded(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Skipped))
    }

    /// True when every command succeeded.
    pub fn is_success(&self) -> bool {
        self.items.iter().all(BatchItem::is_success)
    }

    /// The first failure, if any.
    pub fn first_error(&self) -> Option<&Error> {
        self.items.iter().find_map(BatchItem::error)
    }

    fn count(&self, pred: impl Fn(&BatchOutcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }
}
