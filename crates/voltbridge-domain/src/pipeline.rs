use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::envelope::{RawMessage, decode_envelope};
use crate::error::SourceError;
use crate::repository::{EnvelopeForwarder, MessageSource, ReadingRepository};

/// Message-processing pipeline: pulls inbound messages one at a time and runs
/// each through decode → stamp → persist → forward.
///
/// A failure in any per-message step is logged and the loop moves on to the
/// next message; only a lost local session or cancellation ends the run.
/// Persistence and forwarding are independent side effects: neither failure
/// prevents the other from being attempted.
pub struct GatewayPipeline {
    repository: Arc<dyn ReadingRepository>,
    forwarder: Arc<dyn EnvelopeForwarder>,
    device_id: String,
}

impl GatewayPipeline {
    pub fn new(
        repository: Arc<dyn ReadingRepository>,
        forwarder: Arc<dyn EnvelopeForwarder>,
        device_id: String,
    ) -> Self {
        Self {
            repository,
            forwarder,
            device_id,
        }
    }

    /// Consume the source until cancellation or connection loss.
    ///
    /// Cancellation is observed only between messages: a message that already
    /// entered processing finishes its persistence and forward steps first.
    pub async fn run(
        &self,
        source: &mut dyn MessageSource,
        shutdown: CancellationToken,
    ) -> Result<(), SourceError> {
        info!(device_id = %self.device_id, "gateway pipeline started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("shutdown requested, stopping pipeline");
                    return Ok(());
                }
                next = source.next_message() => {
                    self.process_message(next?).await;
                }
            }
        }
    }

    /// Run one message through the per-message steps with error isolation.
    pub async fn process_message(&self, raw: RawMessage) {
        let mut envelope = match decode_envelope(&raw.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    topic = %raw.topic,
                    error = %e,
                    payload = %String::from_utf8_lossy(&raw.payload),
                    "discarding undecodable message"
                );
                return;
            }
        };

        envelope.stamp(&self.device_id, chrono::Local::now().naive_local());

        if let Err(e) = self.repository.save(&envelope.data).await {
            error!(
                topic = %raw.topic,
                error = %e,
                reading = ?envelope.data,
                "failed to persist reading"
            );
        }

        if let Err(e) = self.forwarder.forward(&envelope).await {
            error!(
                topic = %raw.topic,
                error = %e,
                device_id = %envelope.device_id,
                "failed to forward envelope"
            );
        }

        debug!(topic = %raw.topic, "message processed");
    }
}
