use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use voltbridge_domain::{FanStatus, LocaleDecimal, PersistError, ReadingRepository, SensorReading};
use voltbridge_postgres::{PostgresClient, PostgresReadingRepository};

const CREATE_READINGS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS sensor_readings (
        id BIGSERIAL PRIMARY KEY,
        voltage DOUBLE PRECISION NOT NULL,
        current DOUBLE PRECISION NOT NULL,
        power DOUBLE PRECISION NOT NULL,
        temperature DOUBLE PRECISION NOT NULL,
        fan_status BOOLEAN NOT NULL,
        "timestamp" TIMESTAMP NOT NULL
    )
"#;

async fn start_postgres() -> (ContainerAsync<Postgres>, PostgresClient) {
    let container = Postgres::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();

    let client = PostgresClient::new(
        &host.to_string(),
        port,
        "postgres",
        "postgres",
        "postgres",
        5,
    )
    .unwrap();
    client.ping().await.unwrap();

    let conn = client.get_connection().await.unwrap();
    conn.execute(CREATE_READINGS_TABLE, &[]).await.unwrap();

    (container, client)
}

fn reading(pa: LocaleDecimal) -> SensorReading {
    SensorReading {
        v: 220.0,
        i: 2.1,
        pa,
        temp: 24.6,
        fan: FanStatus::Flag(true),
        time: Some("2024-06-01 12:30:00".to_string()),
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn reading_round_trip() {
    let (_container, client) = start_postgres().await;
    let repository = PostgresReadingRepository::new(client.clone());

    repository
        .save(&reading(LocaleDecimal::Text("462,0".to_string())))
        .await
        .unwrap();

    let conn = client.get_connection().await.unwrap();
    let row = conn
        .query_one(
            r#"SELECT voltage, current, power, temperature, fan_status, "timestamp"::text FROM sensor_readings"#,
            &[],
        )
        .await
        .unwrap();

    assert_eq!(row.get::<_, f64>(0), 220.0);
    assert_eq!(row.get::<_, f64>(1), 2.1);
    assert_eq!(row.get::<_, f64>(2), 462.0);
    assert_eq!(row.get::<_, f64>(3), 24.6);
    assert!(row.get::<_, bool>(4));
    assert_eq!(row.get::<_, String>(5), "2024-06-01 12:30:00");
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn comma_and_point_power_persist_identically() {
    let (_container, client) = start_postgres().await;
    let repository = PostgresReadingRepository::new(client.clone());

    repository
        .save(&reading(LocaleDecimal::Text("12,5".to_string())))
        .await
        .unwrap();
    repository
        .save(&reading(LocaleDecimal::Text("12.5".to_string())))
        .await
        .unwrap();

    let conn = client.get_connection().await.unwrap();
    let rows = conn
        .query("SELECT DISTINCT power FROM sensor_readings", &[])
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<_, f64>(0), 12.5);
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn malformed_power_writes_no_row() {
    let (_container, client) = start_postgres().await;
    let repository = PostgresReadingRepository::new(client.clone());

    let result = repository
        .save(&reading(LocaleDecimal::Text("garbage".to_string())))
        .await;
    assert!(matches!(
        result,
        Err(PersistError::MalformedField { field: "power", .. })
    ));

    let conn = client.get_connection().await.unwrap();
    let count = conn
        .query_one("SELECT COUNT(*) FROM sensor_readings", &[])
        .await
        .unwrap();
    assert_eq!(count.get::<_, i64>(0), 0);
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn closed_pool_reports_store_unavailable() {
    let (_container, client) = start_postgres().await;
    let repository = PostgresReadingRepository::new(client.clone());

    client.close();
    assert!(client.is_closed());

    let result = repository
        .save(&reading(LocaleDecimal::Number(1.0)))
        .await;
    assert!(matches!(result, Err(PersistError::StoreUnavailable(_))));

    // closing again is a no-op
    client.close();
}
