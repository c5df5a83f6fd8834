pub mod client;
pub mod error;
pub mod message;

pub use client::ProtocolClient;
pub use error::{Exchange, ProtocolError, ProtocolResult};
pub use message::RewardMessage;
