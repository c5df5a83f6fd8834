use crate::protocol::error::Exchange;
use serde::{Deserialize, Serialize};

/// Opening document of every exchange: `{"type": "<tag>"}`.
#[derive(Debug, Serialize)]
pub struct StartMessage {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl StartMessage {
    pub const fn new(exchange: Exchange) -> Self {
        Self {
            kind: exchange.tag(),
        }
    }
}

/// `{"final": true}`; the service stops reading bodies after this.
#[derive(Debug, Serialize)]
pub struct TerminalMessage {
    #[serde(rename = "final")]
    pub done: bool,
}

impl TerminalMessage {
    pub const fn new() -> Self {
        Self { done: true }
    }
}

/// Observed latency of an executed query, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardMessage {
    pub reward: f64,
    pub pid: u32,
}

impl RewardMessage {
    pub fn new(latency_ms: f64) -> Self {
        Self {
            reward: latency_ms,
            pid: std::process::id(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelPathMessage<'a> {
    pub path: &'a str,
}
