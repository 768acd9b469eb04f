/// Job state definitions
///
/// A job is the reusable record for one seed URL. Only a new trigger may move
/// a job out of a terminal state; the transition graph below never does.
use crate::ForgeError;
use serde::Serialize;
use std::fmt;

/// Represents the current state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Created or reactivated by a trigger, not yet picked up by its task
    Pending,

    /// The crawl task is running
    Crawling,

    /// The crawl loop exhausted its frontier or hit the page cap
    Completed,

    /// An error escaped the crawl loop
    Failed,
}

impl JobState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the transition graph allows `self -> to`
    ///
    /// `pending -> failed` covers a task that dies before it can start crawling.
    pub fn can_transition_to(&self, to: JobState) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Crawling)
                | (Self::Pending, Self::Failed)
                | (Self::Crawling, Self::Completed)
                | (Self::Crawling, Self::Failed)
        )
    }

    /// Validates and performs a transition
    pub fn transition(self, to: JobState) -> Result<JobState, ForgeError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(ForgeError::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }

    /// Converts the job state to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Crawling => "crawling",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a job state from a database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "crawling" => Some(Self::Crawling),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible job states
    pub fn all_states() -> Vec<Self> {
        vec![Self::Pending, Self::Crawling, Self::Completed, Self::Failed]
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
