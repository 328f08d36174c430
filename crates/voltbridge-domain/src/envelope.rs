use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::reading::{SensorReading, TIME_FORMAT};

/// Status tag stamped on every outbound envelope.
pub const STATUS_OK: &str = "OK";

/// Raw inbound message as delivered by the local broker.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Outbound envelope: gateway metadata plus the reading that gets persisted.
///
/// Top-level payload fields other than `status`, `deviceID` and `data` are
/// carried through untouched so the cloud side sees everything the node sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMessage {
    pub status: String,
    #[serde(rename = "deviceID")]
    pub device_id: String,
    pub data: SensorReading,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnvelopeMessage {
    /// Stamp the gateway metadata: status tag, device identifier and the
    /// gateway-assigned timestamp. Any inbound `time` value is overwritten.
    pub fn stamp(&mut self, device_id: &str, at: NaiveDateTime) {
        self.status = STATUS_OK.to_string();
        self.device_id = device_id.to_string();
        self.data.time = Some(at.format(TIME_FORMAT).to_string());
    }
}

/// Decode an inbound payload into an unstamped envelope.
///
/// The node wraps the reading in a `data` sub-object; frames without the
/// wrapper carry the reading fields at top level and are wrapped here.
/// Inbound `status`/`deviceID` are dropped since the gateway restamps both.
pub fn decode_envelope(payload: &[u8]) -> Result<EnvelopeMessage, DecodeError> {
    let value: Value = serde_json::from_slice(payload)?;
    let Value::Object(mut fields) = value else {
        return Err(DecodeError::NotAnObject);
    };

    fields.remove("status");
    fields.remove("deviceID");

    let reading_value = match fields.remove("data") {
        Some(value @ Value::Object(_)) => value,
        Some(_) => return Err(DecodeError::MalformedData),
        None => Value::Object(std::mem::take(&mut fields)),
    };
    let data: SensorReading =
        serde_json::from_value(reading_value).map_err(DecodeError::MalformedReading)?;

    Ok(EnvelopeMessage {
        status: String::new(),
        device_id: String::new(),
        data,
        extra: fields,
    })
}
