use crate::arms::ArmError;
use crate::config::ConfigError;
use crate::plan::PlanError;
use crate::protocol::ProtocolError;
use std::fmt;

/// Errors surfaced by arm orchestration and the session bridge
#[derive(Debug)]
pub enum BaoError {
    Arm(ArmError),
    Config(ConfigError),
    Plan(PlanError),
    Protocol(ProtocolError),
    /// The host planner failed for one candidate
    Planner(Box<dyn std::error::Error + Send + Sync>),
    /// The service picked an arm that was never sent to it
    SelectionOutOfRange { index: usize, candidates: usize },
}

impl BaoError {
    pub fn planner<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
        Self::Planner(Box::new(e))
    }

    /// Contract violations abort the query's optimization path; everything
    /// else falls back to the host's default plan.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Arm(_) | Self::Config(_) | Self::SelectionOutOfRange { .. } => true,
            Self::Protocol(e) => e.is_fatal(),
            Self::Plan(_) | Self::Planner(_) => false,
        }
    }
}

impl fmt::Display for BaoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arm(e) => write!(f, "Arm error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Plan(e) => write!(f, "Plan error: {e}"),
            Self::Protocol(e) => write!(f, "Protocol error: {e}"),
            Self::Planner(e) => write!(f, "Planner error: {e}"),
            Self::SelectionOutOfRange { index, candidates } => write!(
                f,
                "Decision service selected arm {index} but only {candidates} candidates were sent"
            ),
        }
    }
}

impl std::error::Error for BaoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Arm(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Plan(e) => Some(e),
            Self::Protocol(e) => Some(e),
            Self::Planner(e) => Some(e.as_ref()),
            Self::SelectionOutOfRange { .. } => None,
        }
    }
}

impl From<ArmError> for BaoError {
    fn from(e: ArmError) -> Self {
        Self::Arm(e)
    }
}

impl From<ConfigError> for BaoError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<PlanError> for BaoError {
    fn from(e: PlanError) -> Self {
        Self::Plan(e)
    }
}

impl From<ProtocolError> for BaoError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

/// Result type for orchestration and session operations
pub type BaoResult<T> = Result<T, BaoError>;
