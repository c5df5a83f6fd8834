use crate::arms::{Arm, MAX_ARMS};
use crate::config::BaoSettings;
use crate::protocol::error::{Exchange, ProtocolError, ProtocolResult};
use crate::protocol::message::{ModelPathMessage, RewardMessage, StartMessage, TerminalMessage};
use byteorder::{NativeEndian, ReadBytesExt};
use serde::Serialize;
use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};

/// Client for the decision service. Every exchange opens its own
/// connection and closes it before returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolClient {
    host: String,
    port: u16,
}

impl ProtocolClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn from_settings(settings: &BaoSettings) -> Self {
        Self::new(settings.host.clone(), settings.port)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Send every candidate (in arm order) plus the census and return the
    /// arm the service picked.
    pub fn select_arm(&self, candidates: &[&str], census_json: &str) -> ProtocolResult<Arm> {
        let mut conn = self.open(Exchange::Query)?;
        for candidate in candidates {
            conn.send_body(candidate)?;
        }
        conn.send_body(census_json)?;
        conn.finish_request()?;

        let index = conn.read_u32();
        conn.close();
        let index = index?;

        log::debug!(
            "Decision service picked arm {index} out of {} candidates",
            candidates.len()
        );
        Arm::try_from(index).map_err(|_| ProtocolError::ArmOutOfRange {
            index,
            limit: MAX_ARMS,
        })
    }

    /// Ask for a latency estimate in milliseconds. NaN means the service
    /// has no model yet.
    pub fn predict(&self, plan_json: &str, census_json: &str) -> ProtocolResult<f64> {
        let mut conn = self.open(Exchange::Predict)?;
        conn.send_body(plan_json)?;
        conn.send_body(census_json)?;
        conn.finish_request()?;

        let prediction = conn.read_f64();
        conn.close();
        prediction
    }

    /// Report the observed latency for a plan. No response is read.
    pub fn report_reward(
        &self,
        plan_json: &str,
        census_json: &str,
        reward: &RewardMessage,
    ) -> ProtocolResult<()> {
        let mut conn = self.open(Exchange::Reward)?;
        conn.send_body(plan_json)?;
        conn.send_body(census_json)?;
        conn.send_document(reward)?;
        conn.finish_request()?;
        conn.close();
        Ok(())
    }

    /// Tell the service to load a saved model from `path`.
    pub fn load_model(&self, path: &str) -> ProtocolResult<()> {
        let mut conn = self.open(Exchange::LoadModel)?;
        conn.send_document(&ModelPathMessage { path })?;
        conn.finish_request()?;
        conn.close();
        Ok(())
    }

    fn open(&self, exchange: Exchange) -> ProtocolResult<Connection> {
        let stream = TcpStream::connect((self.host.as_str(), self.port)).map_err(|source| {
            ProtocolError::Connect {
                exchange,
                addr: self.address(),
                source,
            }
        })?;

        let mut conn = Connection { stream, exchange };
        conn.send_document(&StartMessage::new(exchange))?;
        Ok(conn)
    }
}

/// One exchange's socket.
struct Connection {
    stream: TcpStream,
    exchange: Exchange,
}

impl Connection {
    fn io_error(exchange: Exchange, source: io::Error) -> ProtocolError {
        ProtocolError::Io { exchange, source }
    }

    /// Write one newline-terminated JSON document.
    fn send_body(&mut self, body: &str) -> ProtocolResult<()> {
        let body = body.trim_end_matches('\n');
        let exchange = self.exchange;
        self.stream
            .write_all(body.as_bytes())
            .and_then(|()| self.stream.write_all(b"\n"))
            .map_err(|e| Self::io_error(exchange, e))
    }

    fn send_document<T: Serialize>(&mut self, document: &T) -> ProtocolResult<()> {
        let body = serde_json::to_string(document)?;
        self.send_body(&body)
    }

    /// Terminal document, then close our write half so the service sees EOF.
    fn finish_request(&mut self) -> ProtocolResult<()> {
        self.send_document(&TerminalMessage::new())?;
        self.stream
            .shutdown(Shutdown::Write)
            .map_err(|e| Self::io_error(self.exchange, e))
    }

    fn read_u32(&mut self) -> ProtocolResult<u32> {
        let exchange = self.exchange;
        self.stream
            .read_u32::<NativeEndian>()
            .map_err(|e| Self::io_error(exchange, e))
    }

    fn read_f64(&mut self) -> ProtocolResult<f64> {
        let exchange = self.exchange;
        self.stream
            .read_f64::<NativeEndian>()
            .map_err(|e| Self::io_error(exchange, e))
    }

    fn close(self) {
        // The service may already have hung up.
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            log::debug!("Closing {} connection: {e}", self.exchange);
        }
    }
}
