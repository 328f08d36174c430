mod config;
mod probe;
mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use config::ServiceConfig;
use tracing::{debug, error, info};
use voltbridge_domain::GatewayPipeline;
use voltbridge_mqtt::{LocalSubscriber, MqttForwarder};
use voltbridge_postgres::{PostgresClient, PostgresReadingRepository};
use voltbridge_runner::Runner;

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    telemetry::init_telemetry(&config.log_level);

    info!(device_id = %config.device_id, "starting voltbridge gateway");
    debug!("Configuration: {:?}", config);

    // Fail-fast precondition: without outbound connectivity nothing else is
    // opened, not even the local broker session or the pool.
    let probe_config = config.probe();
    let reachable = config
        .probe_policy()
        .run(|| {
            let target = probe_config.clone();
            async move { probe::reachable(&target).await }
        })
        .await;
    if !reachable {
        error!(
            host = %probe_config.host,
            port = probe_config.port,
            "network unreachable, aborting run"
        );
        std::process::exit(1);
    }

    info!("Initializing PostgreSQL...");
    let postgres = match PostgresClient::new(
        &config.postgres_host,
        config.postgres_port,
        &config.postgres_database,
        &config.postgres_username,
        &config.postgres_password,
        config.postgres_max_pool_size,
    ) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build postgres pool: {:#}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = postgres.ping().await {
        error!("Database unreachable at startup: {:#}", e);
        postgres.close();
        std::process::exit(1);
    }

    info!("Connecting to local broker...");
    let subscriber = match LocalSubscriber::connect(&config.local_broker()).await {
        Ok(subscriber) => subscriber,
        Err(e) => {
            error!("Failed to connect to local broker: {:#}", e);
            postgres.close();
            std::process::exit(1);
        }
    };

    let repository = Arc::new(PostgresReadingRepository::new(postgres.clone()));
    let forwarder = Arc::new(MqttForwarder::new(config.cloud_broker()));
    let pipeline = GatewayPipeline::new(repository, forwarder, config.device_id.clone());

    let pool_for_close = postgres.clone();
    let code = Runner::new()
        .with_process(move |token| async move {
            let mut subscriber = subscriber;
            let result = pipeline.run(&mut subscriber, token).await;
            subscriber.disconnect().await;
            result.map_err(anyhow::Error::from)
        })
        .with_closer(move || async move {
            pool_for_close.close();
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(10))
        .run()
        .await;

    std::process::exit(code);
}
