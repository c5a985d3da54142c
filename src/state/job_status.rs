/// Job status definitions for tracking scrape job progress
///
/// A job only ever moves forward: pending → running → done | error.
use std::fmt;

/// Represents the current status of a scrape job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Job has been accepted but not started
    Pending,

    /// Job is executing
    Running,

    /// Job finished with at least one record
    Done,

    /// Job finished without records; the error message says why
    Error,
}

impl JobStatus {
    /// Returns true if this is a terminal status (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Returns true if moving from `self` to `next` is a forward transition
    ///
    /// Allowed moves are pending → running and running → done | error.
    /// A pending job may also fail directly, before any work starts.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Error)
                | (Self::Running, Self::Done)
                | (Self::Running, Self::Error)
        )
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Returns all possible job statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![Self::Pending, Self::Running, Self::Done, Self::Error]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
