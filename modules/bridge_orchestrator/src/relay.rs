//! Hand-off of witness envelopes from signers to the submitter
//!
//! Envelopes travel as encoded bytes so that any transport carrying opaque
//! blobs can stand in for the in-memory channel.

use async_trait::async_trait;
use cardano_bridge_codec::{CodecError, WitnessEnvelope};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay closed")]
    Closed,

    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[async_trait]
pub trait RelayChannel: Send + Sync {
    /// Send one signer's witness
    async fn publish(&self, envelope: &WitnessEnvelope) -> Result<(), RelayError>;

    /// Next envelope, waiting if none is queued. `Err(Closed)` once every
    /// publisher has gone and the queue is drained.
    async fn next(&self) -> Result<WitnessEnvelope, RelayError>;
}

/// Unbounded in-process relay over a tokio channel
pub struct InMemoryRelay {
    sink: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    source: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl InMemoryRelay {
    pub fn new() -> Self {
        let (sink, source) = mpsc::unbounded_channel();
        Self {
            sink: Mutex::new(Some(sink)),
            source: Mutex::new(source),
        }
    }

    /// Stop accepting envelopes; queued ones can still be read
    pub async fn close(&self) {
        self.sink.lock().await.take();
    }
}

impl Default for InMemoryRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayChannel for InMemoryRelay {
    async fn publish(&self, envelope: &WitnessEnvelope) -> Result<(), RelayError> {
        let sink = self.sink.lock().await;
        let sink = sink.as_ref().ok_or(RelayError::Closed)?;
        debug!(tx_hash = %envelope.transaction.hash(), vkey = %envelope.witness.vkey, "publishing witness");
        sink.send(envelope.to_bytes()).map_err(|_| RelayError::Closed)
    }

    async fn next(&self) -> Result<WitnessEnvelope, RelayError> {
        let bytes = self.source.lock().await.recv().await.ok_or(RelayError::Closed)?;
        Ok(WitnessEnvelope::from_bytes(&bytes)?)
    }
}
