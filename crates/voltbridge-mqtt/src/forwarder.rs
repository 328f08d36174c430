use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectionError, Event, MqttOptions, Packet, QoS};
use tracing::{debug, info, instrument};
use voltbridge_domain::{EnvelopeForwarder, EnvelopeMessage, ForwardError};

/// Configuration for the cloud broker leg.
#[derive(Debug, Clone)]
pub struct CloudBrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub topic: String,
    pub keep_alive: Duration,
}

/// Publishes stamped envelopes to the cloud broker.
///
/// Every publish is a complete connect/publish/disconnect cycle; no
/// persistent cloud session is held, so a flaky cloud leg costs per-message
/// connection overhead instead of poisoning local ingestion.
pub struct MqttForwarder {
    config: CloudBrokerConfig,
}

impl MqttForwarder {
    pub fn new(config: CloudBrokerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EnvelopeForwarder for MqttForwarder {
    #[instrument(
        name = "forward_envelope",
        skip_all,
        fields(topic = %self.config.topic, device_id = %envelope.device_id)
    )]
    async fn forward(&self, envelope: &EnvelopeMessage) -> Result<(), ForwardError> {
        let payload = serde_json::to_vec(envelope).map_err(|e| {
            ForwardError::PublishRejected(format!("could not encode envelope: {e}"))
        })?;

        let mut options =
            MqttOptions::new(&self.config.client_id, &self.config.host, self.config.port);
        options.set_keep_alive(self.config.keep_alive);
        options.set_clean_session(true);
        if !self.config.username.is_empty() {
            options.set_credentials(
                self.config.username.clone(),
                self.config.password.clone(),
            );
        }

        let (client, mut eventloop) = AsyncClient::new(options, 10);
        client
            .publish(&self.config.topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| ForwardError::BrokerUnreachable(anyhow!(e)))?;

        // Success only once the broker acknowledges the publish.
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    debug!("connected to cloud broker");
                }
                Ok(Event::Incoming(Packet::PubAck(_))) => break,
                Ok(_) => {}
                Err(ConnectionError::ConnectionRefused(code)) => {
                    return Err(ForwardError::PublishRejected(format!(
                        "connection refused: {code:?}"
                    )));
                }
                Err(e) => return Err(ForwardError::BrokerUnreachable(anyhow!(e))),
            }
        }

        let _ = client.disconnect().await;
        info!("envelope forwarded to cloud broker");
        Ok(())
    }
}
