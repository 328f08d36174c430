use thiserror::Error;

/// Errors raised while decoding an inbound payload into an envelope.
///
/// All of these are per-message failures: the offending message is logged and
/// discarded, the processing loop keeps running.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("`data` field is not a JSON object")]
    MalformedData,

    #[error("reading fields missing or mistyped: {0}")]
    MalformedReading(serde_json::Error),
}

/// Errors from the durable write path.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("malformed {field} value: {reason}")]
    MalformedField { field: &'static str, reason: String },

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] anyhow::Error),
}

/// Errors from the cloud publish path. Both are non-fatal to the pipeline.
#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("cloud broker unreachable: {0}")]
    BrokerUnreachable(#[source] anyhow::Error),

    #[error("publish rejected by cloud broker: {0}")]
    PublishRejected(String),
}

/// Errors from the local message sequence.
///
/// A lost session exhausts the sequence for good; the run ends and an
/// external supervisor is expected to restart the gateway.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("local broker connection lost: {0}")]
    ConnectionLost(#[source] anyhow::Error),
}

/// A decimal wire value that could not be interpreted as a number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid decimal value '{0}'")]
pub struct InvalidDecimal(pub String);

/// A fan state that is neither a boolean nor a recognized label.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized fan state '{0}'")]
pub struct InvalidFanState(pub String);
