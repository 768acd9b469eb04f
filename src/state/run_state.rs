/// Run state and progress counters
///
/// A run is one triggered attempt for a job. Runs are append-only history;
/// the most recently created run is the job's current run.
use crate::ForgeError;
use serde::Serialize;
use std::fmt;

/// Represents the current state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Created by a trigger, task not started yet
    Queued,

    /// The background task owns the run
    Processing,

    Completed,

    Failed,
}

impl RunState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the transition graph allows `self -> to`
    pub fn can_transition_to(&self, to: RunState) -> bool {
        matches!(
            (self, to),
            (Self::Queued, Self::Processing)
                | (Self::Queued, Self::Failed)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }

    /// Validates and performs a transition
    pub fn transition(self, to: RunState) -> Result<RunState, ForgeError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(ForgeError::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible run states
    pub fn all_states() -> Vec<Self> {
        vec![Self::Queued, Self::Processing, Self::Completed, Self::Failed]
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Progress counters persisted on a run
///
/// Invariants: `pages_crawled + pages_failed <= pages_discovered` and the
/// counters never decrease within a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    pub pages_discovered: u32,
    pub pages_crawled: u32,
    pub pages_failed: u32,
    pub faqs_generated: u32,
}

impl RunCounters {
    /// `round(pages_crawled / pages_discovered * 100)`, or 0 before anything is discovered
    pub fn progress(&self) -> u8 {
        if self.pages_discovered == 0 {
            return 0;
        }

        let ratio = f64::from(self.pages_crawled) / f64::from(self.pages_discovered);
        (ratio * 100.0).round().clamp(0.0, 100.0) as u8
    }
}
