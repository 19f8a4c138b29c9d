//! Result reporting to the coordinator
//!
//! Reports are fire-and-forget: each message is serialized to a compact JSON
//! object, written over its own connection and the connection is closed. The
//! coordinator never acknowledges, and nothing here retries.

use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::debug;

/// Size of the send buffer a payload must fit in
pub const MAX_PAYLOAD_SIZE: usize = 1000;

/// Coordinator address used when none is configured
pub const DEFAULT_COORDINATOR_ADDR: &str = "127.0.0.1:3000";

/// Value of the `obj` field on every report
const REPORT_OBJECT: &str = "core";

/// A message from the worker to the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "act")]
pub enum ReportMessage {
    /// A nonce that met the target difficulty
    #[serde(rename = "eureka")]
    Solution {
        #[serde(rename = "template")]
        template_id: u32,
        nonce: u32,
    },

    /// The whole range has been scanned
    #[serde(rename = "done")]
    Done {
        nonce_from: u32,
        #[serde(rename = "count")]
        share_count: u32,
    },
}

#[derive(Serialize)]
struct OutgoingEnvelope<'a> {
    obj: &'static str,
    #[serde(flatten)]
    message: &'a ReportMessage,
}

#[derive(Deserialize)]
struct IncomingEnvelope {
    obj: String,
    #[serde(flatten)]
    message: ReportMessage,
}

impl ReportMessage {
    /// Wire action name
    pub fn act(&self) -> &'static str {
        match self {
            ReportMessage::Solution { .. } => "eureka",
            ReportMessage::Done { .. } => "done",
        }
    }

    /// Serialize to the wire format, refusing payloads that would not fit
    /// the send buffer.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        let payload = serde_json::to_vec(&OutgoingEnvelope {
            obj: REPORT_OBJECT,
            message: self,
        })?;

        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadTooLarge {
                size: payload.len(),
                limit: MAX_PAYLOAD_SIZE,
            });
        }

        Ok(payload)
    }

    /// Parse a payload as the coordinator would
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let envelope: IncomingEnvelope = serde_json::from_slice(payload)?;
        if envelope.obj != REPORT_OBJECT {
            return Err(Error::malformed_input(format!(
                "unexpected report object: {}",
                envelope.obj
            )));
        }
        Ok(envelope.message)
    }
}

impl fmt::Display for ReportMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportMessage::Solution { template_id, nonce } => {
                write!(f, "eureka(template={}, nonce={})", template_id, nonce)
            }
            ReportMessage::Done {
                nonce_from,
                share_count,
            } => write!(f, "done(nonce_from={}, count={})", nonce_from, share_count),
        }
    }
}

/// Delivery of report messages.
///
/// A failed send is returned to the caller and never retried.
#[async_trait]
pub trait ReportClient: Send + Sync {
    /// Transport name for logging
    fn transport(&self) -> &'static str;

    /// Deliver one message
    async fn send(&self, message: &ReportMessage) -> Result<()>;
}

/// Sends each report over a fresh TCP connection
#[derive(Debug, Clone)]
pub struct TcpReportClient {
    addr: SocketAddr,
}

impl TcpReportClient {
    /// Create a client for the given coordinator address
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Coordinator address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

#[async_trait]
impl ReportClient for TcpReportClient {
    fn transport(&self) -> &'static str {
        "tcp"
    }

    async fn send(&self, message: &ReportMessage) -> Result<()> {
        let payload = message.to_payload()?;

        let mut stream = TcpStream::connect(self.addr)
            .await
            .map_err(|e| Error::transport(format!("connect to {} failed: {}", self.addr, e)))?;

        stream
            .write_all(&payload)
            .await
            .map_err(|e| Error::transport(format!("write to {} failed: {}", self.addr, e)))?;

        stream
            .shutdown()
            .await
            .map_err(|e| Error::transport(format!("close of {} failed: {}", self.addr, e)))?;

        debug!(
            addr = %self.addr,
            act = message.act(),
            bytes = payload.len(),
            "Sent {}",
            message
        );
        Ok(())
    }
}

/// In-process transport over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelReportClient {
    tx: mpsc::UnboundedSender<ReportMessage>,
}

impl ChannelReportClient {
    /// Create a client and the receiver its messages arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReportMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ReportClient for ChannelReportClient {
    fn transport(&self) -> &'static str {
        "channel"
    }

    async fn send(&self, message: &ReportMessage) -> Result<()> {
        self.tx
            .send(*message)
            .map_err(|_| Error::transport("report channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_solution_wire_format() {
        let message = ReportMessage::Solution {
            template_id: 7,
            nonce: 102,
        };
        let payload = message.to_payload().unwrap();
        assert_eq!(
            String::from_utf8(payload).unwrap(),
            r#"{"obj":"core","act":"eureka","template":7,"nonce":102}"#
        );
    }

    #[test]
    fn test_done_wire_format() {
        let message = ReportMessage::Done {
            nonce_from: 100,
            share_count: 1,
        };
        let payload = message.to_payload().unwrap();
        assert_eq!(
            String::from_utf8(payload).unwrap(),
            r#"{"obj":"core","act":"done","nonce_from":100,"count":1}"#
        );
    }

    #[test]
    fn test_largest_payload_fits_buffer() {
        let message = ReportMessage::Solution {
            template_id: u32::MAX,
            nonce: u32::MAX,
        };
        assert!(message.to_payload().unwrap().len() <= MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn test_from_payload() {
        let message = ReportMessage::from_payload(
            br#"{"obj":"core","act":"done","nonce_from":5,"count":9}"#,
        )
        .unwrap();
        assert_eq!(
            message,
            ReportMessage::Done {
                nonce_from: 5,
                share_count: 9
            }
        );

        assert_matches!(
            ReportMessage::from_payload(br#"{"obj":"node","act":"done","nonce_from":5,"count":9}"#),
            Err(Error::MalformedInput { .. })
        );
        assert!(ReportMessage::from_payload(br#"{"obj":"core","act":"pow"}"#).is_err());
    }

    #[test]
    fn test_display() {
        let message = ReportMessage::Solution {
            template_id: 1,
            nonce: 2,
        };
        assert_eq!(message.to_string(), "eureka(template=1, nonce=2)");
        assert_eq!(message.act(), "eureka");
    }

    #[tokio::test]
    async fn test_tcp_client_one_connection_per_message() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = TcpReportClient::new(listener.local_addr().unwrap());

        let messages = [
            ReportMessage::Solution {
                template_id: 3,
                nonce: 11,
            },
            ReportMessage::Done {
                nonce_from: 10,
                share_count: 4,
            },
        ];

        let server = tokio::spawn(async move {
            let mut received = Vec::new();
            for _ in 0..2 {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                socket.read_to_end(&mut buf).await.unwrap();
                received.push(ReportMessage::from_payload(&buf).unwrap());
            }
            received
        });

        for message in &messages {
            client.send(message).await.unwrap();
        }

        let received = server.await.unwrap();
        assert_eq!(received, messages);
    }

    #[tokio::test]
    async fn test_tcp_client_connect_failure() {
        // Bind then drop to get a port nobody listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = TcpReportClient::new(addr);

        let result = client
            .send(&ReportMessage::Done {
                nonce_from: 0,
                share_count: 0,
            })
            .await;
        assert_matches!(result, Err(Error::Transport { .. }));
    }

    #[tokio::test]
    async fn test_channel_client() {
        let (client, mut rx) = ChannelReportClient::new();
        let message = ReportMessage::Done {
            nonce_from: 1,
            share_count: 2,
        };
        client.send(&message).await.unwrap();
        assert_eq!(rx.recv().await, Some(message));

        drop(rx);
        assert_matches!(client.send(&message).await, Err(Error::Transport { .. }));
    }
}
