use serde::{Deserialize, Serialize};

use crate::error::{InvalidDecimal, InvalidFanState};

/// Wire format for the gateway-assigned timestamp.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decimal wire value that may arrive as a JSON number or as text using
/// either `.` or `,` as the decimal separator.
///
/// The as-received representation is kept so the forwarded envelope carries
/// exactly what the node sent; normalization happens at the persistence
/// boundary via [`LocaleDecimal::as_f64`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocaleDecimal {
    Number(f64),
    Text(String),
}

impl LocaleDecimal {
    /// Numeric value of the field, accepting a comma decimal separator.
    pub fn as_f64(&self) -> Result<f64, InvalidDecimal> {
        match self {
            LocaleDecimal::Number(n) => Ok(*n),
            LocaleDecimal::Text(s) => s
                .trim()
                .replace(',', ".")
                .parse::<f64>()
                .map_err(|_| InvalidDecimal(s.clone())),
        }
    }
}

impl From<f64> for LocaleDecimal {
    fn from(value: f64) -> Self {
        LocaleDecimal::Number(value)
    }
}

/// Fan state as published by the node firmware: a JSON bool or the labels
/// `"ON"`/`"OFF"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FanStatus {
    Flag(bool),
    Label(String),
}

impl FanStatus {
    pub fn as_bool(&self) -> Result<bool, InvalidFanState> {
        match self {
            FanStatus::Flag(flag) => Ok(*flag),
            FanStatus::Label(label) => match label.trim().to_ascii_uppercase().as_str() {
                "ON" => Ok(true),
                "OFF" => Ok(false),
                _ => Err(InvalidFanState(label.clone())),
            },
        }
    }
}

impl From<bool> for FanStatus {
    fn from(value: bool) -> Self {
        FanStatus::Flag(value)
    }
}

/// One decoded sensor observation, field names as they appear on the wire.
///
/// `time` is never trusted from the payload: the pipeline overwrites it with
/// the gateway clock before the reading is persisted or forwarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub v: f64,
    pub i: f64,
    pub pa: LocaleDecimal,
    pub temp: f64,
    pub fan: FanStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}
