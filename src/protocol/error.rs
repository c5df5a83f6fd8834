use std::fmt;
use std::io;

/// The request/response shapes spoken with the decision service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    Query,
    Predict,
    Reward,
    LoadModel,
}

impl Exchange {
    /// Value of the `type` field in the opening document.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Predict => "predict",
            Self::Reward => "reward",
            Self::LoadModel => "load model",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Errors raised while talking to the decision service
#[derive(Debug)]
pub enum ProtocolError {
    /// Could not open a connection
    Connect {
        exchange: Exchange,
        addr: String,
        source: io::Error,
    },
    /// Connection broke, or a response was shorter than its fixed width
    Io { exchange: Exchange, source: io::Error },
    /// Request document could not be encoded
    Encode(serde_json::Error),
    /// Service answered with an arm the table does not have
    ArmOutOfRange { index: u32, limit: usize },
}

impl ProtocolError {
    /// Contract violations abort the optimization attempt; everything else
    /// is a connectivity problem the caller falls back from.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::ArmOutOfRange { .. })
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect {
                exchange,
                addr,
                source,
            } => write!(
                f,
                "Unable to connect to decision service at {addr} for {exchange} exchange: {source}"
            ),
            Self::Io { exchange, source } => {
                write!(f, "I/O error during {exchange} exchange: {source}")
            }
            Self::Encode(e) => write!(f, "Failed to encode request document: {e}"),
            Self::ArmOutOfRange { index, limit } => write!(
                f,
                "Decision service returned arm index {index}, outside the arm table (size {limit})"
            ),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connect { source, .. } | Self::Io { source, .. } => Some(source),
            Self::Encode(e) => Some(e),
            Self::ArmOutOfRange { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encode(e)
    }
}

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;
