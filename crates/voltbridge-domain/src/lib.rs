pub mod envelope;
pub mod error;
pub mod pipeline;
pub mod reading;
pub mod repository;
pub mod retry;

pub use envelope::{EnvelopeMessage, RawMessage, STATUS_OK, decode_envelope};
pub use error::{
    DecodeError, ForwardError, InvalidDecimal, InvalidFanState, PersistError, SourceError,
};
pub use pipeline::GatewayPipeline;
pub use reading::{FanStatus, LocaleDecimal, SensorReading, TIME_FORMAT};
pub use repository::{EnvelopeForwarder, MessageSource, ReadingRepository};
pub use retry::RetryPolicy;
