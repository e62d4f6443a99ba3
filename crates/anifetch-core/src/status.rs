//! Per-task lifecycle.
//!
//! ```text
//! Created -> Invoking -> Parsing -> Normalized  -> Resolved
//!                     |          -> ParseFailed -> Resolved
//!                     |          -> NonZeroExit -> Resolved   (scraper reported failure)
//!                     -> TimedOut                -> Resolved
//!                     -> SpawnFailed             -> Resolved
//!                     -> NonZeroExit             -> Resolved
//! ```

use serde::{Deserialize, Serialize};

use crate::{AcquisitionOutcome, CoreError, FailureReason, TaskId};

/// Phase of a single acquisition task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPhase {
    #[default]
    Created,
    Invoking,
    Parsing,
    Normalized,
    ParseFailed,
    TimedOut,
    SpawnFailed,
    NonZeroExit,
    /// Terminal. Tasks are never reused or retried.
    Resolved,
}

impl TaskPhase {
    /// Returns true once the task has been resolved.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }

    /// Returns true for phases that may move straight to `Resolved`.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Normalized
                | Self::ParseFailed
                | Self::TimedOut
                | Self::SpawnFailed
                | Self::NonZeroExit
        )
    }

    pub fn can_transition_to(&self, next: TaskPhase) -> bool {
        use TaskPhase::*;
        match (self, next) {
            (Created, Invoking) => true,
            (Invoking, Parsing | TimedOut | SpawnFailed | NonZeroExit) => true,
            (Parsing, Normalized | ParseFailed | NonZeroExit) => true,
            (from, Resolved) => from.is_settled(),
            _ => false,
        }
    }

    /// Phases an outcome passes through after `Invoking`.
    pub fn path_for(outcome: &AcquisitionOutcome) -> &'static [TaskPhase] {
        use TaskPhase::*;
        match outcome {
            AcquisitionOutcome::Success(_) => &[Parsing, Normalized],
            AcquisitionOutcome::Failure(failure) => match failure.reason {
                FailureReason::ParseError => &[Parsing, ParseFailed],
                FailureReason::NonZeroExit if failure.is_reported_by_scraper() => {
                    &[Parsing, NonZeroExit]
                }
                FailureReason::NonZeroExit => &[NonZeroExit],
                FailureReason::Timeout => &[TimedOut],
                FailureReason::SpawnError => &[SpawnFailed],
            },
        }
    }
}

/// Tracks the phase of one task and rejects out-of-order transitions.
#[derive(Debug, Clone)]
pub struct TaskLifecycle {
    task_id: TaskId,
    phase: TaskPhase,
    history: Vec<TaskPhase>,
}

impl TaskLifecycle {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            phase: TaskPhase::Created,
            history: vec![TaskPhase::Created],
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    /// Every phase visited so far, oldest first.
    pub fn history(&self) -> &[TaskPhase] {
        &self.history
    }

    pub fn advance(&mut self, next: TaskPhase) -> Result<(), CoreError> {
        if !self.phase.can_transition_to(next) {
            return Err(CoreError::InvalidStateTransition {
                from: format!("{:?}", self.phase),
                to: format!("{:?}", next),
            });
        }
        self.phase = next;
        self.history.push(next);
        Ok(())
    }

    /// Walk from `Invoking` to the settled phase matching `outcome`.
    pub fn settle(&mut self, outcome: &AcquisitionOutcome) -> Result<(), CoreError> {
        for phase in TaskPhase::path_for(outcome) {
            self.advance(*phase)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Failure, Success};
    use chrono::Utc;

    fn success() -> AcquisitionOutcome {
        AcquisitionOutcome::Success(Success {
            items: vec![],
            source_url: String::new(),
            timestamp: Utc::now(),
            title: None,
        })
    }

    #[test]
    fn test_success_path() {
        let mut lifecycle = TaskLifecycle::new(TaskId::new("t"));
        lifecycle.advance(TaskPhase::Invoking).unwrap();
        lifecycle.settle(&success()).unwrap();
        lifecycle.advance(TaskPhase::Resolved).unwrap();

        assert_eq!(
            lifecycle.history(),
            &[
                TaskPhase::Created,
                TaskPhase::Invoking,
                TaskPhase::Parsing,
                TaskPhase::Normalized,
                TaskPhase::Resolved
            ]
        );
        assert!(lifecycle.phase().is_terminal());
    }

    #[test]
    fn test_timeout_skips_parsing() {
        let outcome = AcquisitionOutcome::failure(FailureReason::Timeout, "killed");
        assert_eq!(TaskPhase::path_for(&outcome), &[TaskPhase::TimedOut]);
    }

    #[test]
    fn test_reported_failure_passes_through_parsing() {
        let outcome = AcquisitionOutcome::Failure(
            Failure::new(FailureReason::NonZeroExit, "no results").with_exit_code(0),
        );
        assert_eq!(
            TaskPhase::path_for(&outcome),
            &[TaskPhase::Parsing, TaskPhase::NonZeroExit]
        );
    }

    #[test]
    fn test_resolved_is_terminal() {
        let mut lifecycle = TaskLifecycle::new(TaskId::new("t"));
        lifecycle.advance(TaskPhase::Invoking).unwrap();
        lifecycle.advance(TaskPhase::SpawnFailed).unwrap();
        lifecycle.advance(TaskPhase::Resolved).unwrap();

        let err = lifecycle.advance(TaskPhase::Invoking).unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_cannot_resolve_before_invoking() {
        let mut lifecycle = TaskLifecycle::new(TaskId::new("t"));
        assert!(lifecycle.advance(TaskPhase::Resolved).is_err());
        assert_eq!(lifecycle.phase(), TaskPhase::Created);
    }
}
