use async_trait::async_trait;

use crate::envelope::{EnvelopeMessage, RawMessage};
use crate::error::{ForwardError, PersistError, SourceError};
use crate::reading::SensorReading;

/// Durable write path for decoded readings.
/// Infrastructure (voltbridge-postgres) implements this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingRepository: Send + Sync {
    /// Persist one reading as a single appended row.
    async fn save(&self, reading: &SensorReading) -> Result<(), PersistError>;
}

/// Cloud publish path for stamped envelopes.
/// Infrastructure (voltbridge-mqtt) implements this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnvelopeForwarder: Send + Sync {
    /// Publish the envelope with at-least-once delivery.
    async fn forward(&self, envelope: &EnvelopeMessage) -> Result<(), ForwardError>;
}

/// Lazy sequence of inbound messages from the local broker.
///
/// The sequence is infinite until the underlying session drops; once
/// [`SourceError::ConnectionLost`] is returned the source is exhausted for
/// good and the run ends.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSource: Send {
    /// Wait for the next message, in transport delivery order.
    async fn next_message(&mut self) -> Result<RawMessage, SourceError>;
}
