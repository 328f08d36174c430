use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::{debug, instrument};
use voltbridge_domain::{PersistError, ReadingRepository, SensorReading, TIME_FORMAT};

use crate::client::PostgresClient;

const INSERT_READING: &str = r#"INSERT INTO sensor_readings (voltage, current, power, temperature, fan_status, "timestamp") VALUES ($1, $2, $3, $4, $5, $6)"#;

/// Column values for one reading row.
///
/// Conversion is where defensive parsing happens: the wire keeps power and
/// fan in their as-received representations, the store gets normalized
/// numeric, boolean and timestamp columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRow {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub temperature: f64,
    pub fan_status: bool,
    pub recorded_at: NaiveDateTime,
}

impl TryFrom<&SensorReading> for ReadingRow {
    type Error = PersistError;

    fn try_from(reading: &SensorReading) -> Result<Self, Self::Error> {
        let power = reading
            .pa
            .as_f64()
            .map_err(|e| PersistError::MalformedField {
                field: "power",
                reason: e.to_string(),
            })?;
        let fan_status = reading
            .fan
            .as_bool()
            .map_err(|e| PersistError::MalformedField {
                field: "fan_status",
                reason: e.to_string(),
            })?;
        let time = reading
            .time
            .as_deref()
            .ok_or_else(|| PersistError::MalformedField {
                field: "timestamp",
                reason: "reading was not stamped".to_string(),
            })?;
        let recorded_at = NaiveDateTime::parse_from_str(time, TIME_FORMAT).map_err(|e| {
            PersistError::MalformedField {
                field: "timestamp",
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            voltage: reading.v,
            current: reading.i,
            power,
            temperature: reading.temp,
            fan_status,
            recorded_at,
        })
    }
}

/// PostgreSQL implementation of the ReadingRepository trait.
#[derive(Clone)]
pub struct PostgresReadingRepository {
    client: PostgresClient,
}

impl PostgresReadingRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReadingRepository for PostgresReadingRepository {
    #[instrument(skip_all, fields(time = ?reading.time))]
    async fn save(&self, reading: &SensorReading) -> Result<(), PersistError> {
        let row = ReadingRow::try_from(reading)?;

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(PersistError::StoreUnavailable)?;

        conn.execute(
            INSERT_READING,
            &[
                &row.voltage,
                &row.current,
                &row.power,
                &row.temperature,
                &row.fan_status,
                &row.recorded_at,
            ],
        )
        .await
        .map_err(|e| PersistError::StoreUnavailable(anyhow!(e)))?;

        debug!(power = row.power, "reading persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voltbridge_domain::{FanStatus, LocaleDecimal};

    fn stamped_reading(pa: LocaleDecimal, fan: FanStatus) -> SensorReading {
        SensorReading {
            v: 220.0,
            i: 2.1,
            pa,
            temp: 24.6,
            fan,
            time: Some("2024-06-01 12:30:00".to_string()),
        }
    }

    #[test]
    fn comma_and_point_power_convert_to_the_same_column_value() {
        let comma = stamped_reading(
            LocaleDecimal::Text("462,0".to_string()),
            FanStatus::Flag(true),
        );
        let point = stamped_reading(
            LocaleDecimal::Text("462.0".to_string()),
            FanStatus::Flag(true),
        );

        let comma_row = ReadingRow::try_from(&comma).unwrap();
        let point_row = ReadingRow::try_from(&point).unwrap();
        assert_eq!(comma_row.power, 462.0);
        assert_eq!(comma_row, point_row);
    }

    #[test]
    fn fan_labels_convert_to_booleans() {
        let row = ReadingRow::try_from(&stamped_reading(
            LocaleDecimal::Number(0.0),
            FanStatus::Label("OFF".to_string()),
        ))
        .unwrap();
        assert!(!row.fan_status);
    }

    #[test]
    fn unparseable_power_is_a_malformed_field() {
        let result = ReadingRow::try_from(&stamped_reading(
            LocaleDecimal::Text("lots".to_string()),
            FanStatus::Flag(true),
        ));
        assert!(matches!(
            result,
            Err(PersistError::MalformedField { field: "power", .. })
        ));
    }

    #[test]
    fn unstamped_reading_is_a_malformed_field() {
        let mut reading = stamped_reading(LocaleDecimal::Number(1.0), FanStatus::Flag(true));
        reading.time = None;

        let result = ReadingRow::try_from(&reading);
        assert!(matches!(
            result,
            Err(PersistError::MalformedField {
                field: "timestamp",
                ..
            })
        ));
    }

    #[test]
    fn stamped_time_parses_into_the_timestamp_column() {
        let row = ReadingRow::try_from(&stamped_reading(
            LocaleDecimal::Number(1.0),
            FanStatus::Flag(true),
        ))
        .unwrap();
        assert_eq!(
            row.recorded_at.format(TIME_FORMAT).to_string(),
            "2024-06-01 12:30:00"
        );
    }
}
