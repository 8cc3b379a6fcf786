//! Raw frame telemetry over UDP
//!
//! The acquisition loop hands frames to a broadcast channel without blocking;
//! an async publisher task serialises them as JSON datagrams.

use anyhow::{Context, Result};
use eod_core::{EodError, EodResult, SampleFrame};
use eod_processing::TelemetrySink;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

/// One datagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPacket {
    pub stream_name: String,
    pub stream_id: Uuid,
    pub sample_number: u64,
    pub channel_data: Vec<i32>,
}

/// Telemetry sink feeding a broadcast channel
pub struct BroadcastTelemetry {
    sender: broadcast::Sender<TelemetryPacket>,
    stream_name: String,
    stream_id: Uuid,
}

impl BroadcastTelemetry {
    pub fn new(stream_name: &str, stream_id: Uuid, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            stream_name: stream_name.to_string(),
            stream_id,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryPacket> {
        self.sender.subscribe()
    }
}

impl TelemetrySink for BroadcastTelemetry {
    fn publish(&mut self, frame: &SampleFrame) -> EodResult<()> {
        let packet = TelemetryPacket {
            stream_name: self.stream_name.clone(),
            stream_id: self.stream_id,
            sample_number: frame.sample_number,
            channel_data: frame.channel_data.clone(),
        };
        self.sender
            .send(packet)
            .map(|_| ())
            .map_err(|_| EodError::output(&self.stream_name, "no telemetry subscriber"))
    }
}

/// Sends telemetry packets to a fixed UDP destination
pub struct UdpPublisher {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpPublisher {
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        let bind = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind)
            .await
            .with_context(|| format!("cannot bind telemetry socket for {}", target))?;
        Ok(Self { socket, target })
    }

    /// Forward packets until the channel closes; returns datagrams sent
    pub async fn run(self, mut packets: broadcast::Receiver<TelemetryPacket>) -> u64 {
        let mut sent = 0;
        loop {
            match packets.recv().await {
                Ok(packet) => {
                    let bytes = match serde_json::to_vec(&packet) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            warn!("telemetry encoding failed: {}", e);
                            continue;
                        }
                    };
                    match self.socket.send_to(&bytes, self.target).await {
                        Ok(_) => sent += 1,
                        Err(e) => warn!(target = %self.target, "telemetry send failed: {}", e),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "telemetry publisher fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!(sent, "telemetry publisher stopped");
        sent
    }
}
