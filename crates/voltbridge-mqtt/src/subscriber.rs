use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tracing::{debug, info};
use voltbridge_domain::{MessageSource, RawMessage, SourceError};

use crate::broker_url::parse_broker_url;

/// Configuration for the long-lived local broker session.
#[derive(Debug, Clone)]
pub struct LocalBrokerConfig {
    pub broker_url: String,
    pub topic: String,
    pub client_id: String,
    pub keep_alive: Duration,
}

/// Long-lived subscription to the local sensor bus.
///
/// One session for the lifetime of the run; messages are pulled one at a
/// time in transport delivery order. A broker-level disconnect exhausts the
/// sequence — there is no reconnect here, the run ends instead.
pub struct LocalSubscriber {
    client: AsyncClient,
    eventloop: EventLoop,
    pending: VecDeque<RawMessage>,
}

impl LocalSubscriber {
    /// Connect to the local broker and subscribe at QoS 1.
    ///
    /// Drives the event loop until the broker confirms the subscription, so
    /// an unreachable broker fails here, at startup, rather than on the
    /// first message pull. Publishes racing the SUBACK are buffered.
    pub async fn connect(config: &LocalBrokerConfig) -> Result<Self> {
        let (host, port) = parse_broker_url(&config.broker_url)?;

        info!(
            broker_url = %config.broker_url,
            topic = %config.topic,
            "connecting to local broker"
        );

        let mut options = MqttOptions::new(&config.client_id, host, port);
        options.set_keep_alive(config.keep_alive);
        options.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(options, 100);
        client
            .subscribe(&config.topic, QoS::AtLeastOnce)
            .await
            .context("Failed to request subscription")?;

        let mut pending = VecDeque::new();
        loop {
            match eventloop
                .poll()
                .await
                .context("Failed to reach local broker")?
            {
                Event::Incoming(Packet::ConnAck(_)) => {
                    info!("connected to local broker");
                }
                Event::Incoming(Packet::SubAck(_)) => {
                    info!(topic = %config.topic, "subscribed to local topic");
                    break;
                }
                Event::Incoming(Packet::Publish(publish)) => {
                    pending.push_back(RawMessage {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                    });
                }
                _ => {}
            }
        }

        Ok(Self {
            client,
            eventloop,
            pending,
        })
    }

    /// Close the session. Safe to call while a pull is no longer in flight.
    pub async fn disconnect(&mut self) {
        debug!("disconnecting local broker session");
        let _ = self.client.disconnect().await;
    }
}

#[async_trait]
impl MessageSource for LocalSubscriber {
    async fn next_message(&mut self) -> Result<RawMessage, SourceError> {
        if let Some(message) = self.pending.pop_front() {
            return Ok(message);
        }

        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    debug!(
                        topic = %publish.topic,
                        payload_size = publish.payload.len(),
                        "received local message"
                    );
                    return Ok(RawMessage {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                    });
                }
                Ok(_) => {}
                Err(e) => return Err(SourceError::ConnectionLost(anyhow!(e))),
            }
        }
    }
}
