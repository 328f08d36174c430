mod broker_url;
mod forwarder;
mod subscriber;

pub use broker_url::parse_broker_url;
pub use forwarder::{CloudBrokerConfig, MqttForwarder};
pub use subscriber::{LocalBrokerConfig, LocalSubscriber};
