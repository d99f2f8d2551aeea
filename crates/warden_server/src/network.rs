//! Peer links between an authority and its mirrors.
//!
//! A link is one end of a pair of unbounded tokio channels carrying
//! bincode-encoded [`NetMessage`]s, so both ends see exactly the bytes a
//! socket would carry.

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use warden_core::net::NetMessage;
use warden_core::simulation::Simulation;
use warden_core::world::World;

use crate::ServerError;

/// One end of a bidirectional message link.
#[derive(Debug)]
pub struct PeerLink {
    outgoing: UnboundedSender<Vec<u8>>,
    incoming: UnboundedReceiver<Vec<u8>>,
}

impl PeerLink {
    /// Create two connected ends.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = unbounded_channel();
        let (b_tx, b_rx) = unbounded_channel();
        (
            Self {
                outgoing: a_tx,
                incoming: b_rx,
            },
            Self {
                outgoing: b_tx,
                incoming: a_rx,
            },
        )
    }

    /// Encode and send one message.
    pub fn send(&self, message: &NetMessage) -> Result<(), ServerError> {
        let bytes = message.encode()?;
        self.outgoing
            .send(bytes)
            .map_err(|_| ServerError::LinkClosed)
    }

    /// Wait for the next message.
    ///
    /// Returns `Ok(None)` once the other end is dropped and drained.
    pub async fn recv(&mut self) -> Result<Option<NetMessage>, ServerError> {
        match self.incoming.recv().await {
            Some(bytes) => Ok(Some(NetMessage::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Send every message the simulation has queued for peers.
    ///
    /// Returns how many were sent.
    pub fn flush<W: World>(&self, sim: &mut Simulation<W>) -> Result<usize, ServerError> {
        let messages = sim.take_outgoing();
        for message in &messages {
            self.send(message)?;
        }
        Ok(messages.len())
    }

    /// Send a snapshot of every live unit.
    pub fn send_snapshots<W: World>(&self, sim: &Simulation<W>) -> Result<usize, ServerError> {
        let messages = sim.snapshot_messages()?;
        for message in &messages {
            self.send(message)?;
        }
        Ok(messages.len())
    }

    /// Queue every message already received into the simulation's inbox.
    ///
    /// Undecodable messages are logged and skipped. Returns how many were
    /// queued.
    pub fn pump<W: World>(&mut self, sim: &mut Simulation<W>) -> Result<usize, ServerError> {
        let mut queued = 0;
        loop {
            match self.incoming.try_recv() {
                Ok(bytes) => match NetMessage::decode(&bytes) {
                    Ok(message) => {
                        sim.enqueue(message);
                        queued += 1;
                    }
                    Err(err) => tracing::warn!(%err, "Dropped undecodable message"),
                },
                Err(TryRecvError::Empty) => return Ok(queued),
                Err(TryRecvError::Disconnected) if queued > 0 => return Ok(queued),
                Err(TryRecvError::Disconnected) => return Err(ServerError::LinkClosed),
            }
        }
    }
}
