use std::fmt;

/// Errors that can occur while modelling or serializing a candidate plan
#[derive(Debug)]
pub enum PlanError {
    /// Native node has more children than the binary plan model holds
    TooManyChildren { tag: u32, count: usize },
    /// JSON encoding failed
    Json(serde_json::Error),
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyChildren { tag, count } => write!(
                f,
                "Plan node with tag {tag} has {count} children, at most 2 are supported"
            ),
            Self::Json(e) => write!(f, "Plan JSON encoding failed: {e}"),
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            Self::TooManyChildren { .. } => None,
        }
    }
}

impl From<serde_json::Error> for PlanError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for plan operations
pub type PlanResult<T> = Result<T, PlanError>;
