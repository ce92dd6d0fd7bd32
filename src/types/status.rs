use std::fmt;

/// Lifecycle state of the [`Engine`](crate::Engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum EngineStatus {
    /// Waiting for a record.
    Idle,
    /// An evaluation pass is in progress.
    Running,
}

impl EngineStatus {
    pub(crate) fn from_running(running: bool) -> Self {
        if running {
            Self::Running
        } else {
            Self::Idle
        }
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Running => write!(f, "RUNNING"),
        }
    }
}
