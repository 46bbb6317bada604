//! Remote client log relay
//!
//! The display client publishes its log lines on an MQTT topic while it
//! fetches the image. This listener forwards those lines into the local log
//! stream under the `client` target so one journal shows both sides of a
//! delivery. Connection problems degrade the feature, never the run.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, Publish, QoS};
use tokio::task::JoinHandle;

use crate::config::MqttConfig;

const CLIENT_ID: &str = "inkframe-logrelay";
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Extract the loggable payload of an incoming publish.
///
/// Retained messages are stale lines from a previous client session; the
/// broker replays them on every subscribe, so they are discarded.
fn relay_payload(publish: &Publish) -> Option<String> {
    if publish.retain {
        return None;
    }
    Some(String::from_utf8_lossy(&publish.payload).into_owned())
}

/// Handle to the background relay task
pub struct LogRelay {
    client: AsyncClient,
    handle: JoinHandle<()>,
}

impl LogRelay {
    /// Connect to the broker and start relaying in a background task.
    ///
    /// Errors never propagate out: a failed connect or subscribe is logged
    /// at warn and the relay simply stays silent for the rest of the run.
    #[must_use]
    pub fn start(config: &MqttConfig) -> Self {
        let mut options = MqttOptions::new(CLIENT_ID, config.host.clone(), config.port);
        options.set_keep_alive(KEEP_ALIVE);

        let (client, mut eventloop) = AsyncClient::new(options, 16);
        let topic = config.topic.clone();
        let subscriber = client.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = subscriber.subscribe(topic.clone(), QoS::AtMostOnce).await {
                tracing::warn!("Client log relay unavailable: {e}");
                return;
            }
            tracing::info!(%topic, "Relaying client logs");

            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        if let Some(line) = relay_payload(&publish) {
                            tracing::info!(target: "client", "{line}");
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Client log relay stopped: {e}");
                        return;
                    }
                }
            }
        });

        Self { client, handle }
    }

    /// Disconnect from the broker and wait for the relay task to end
    pub async fn stop(self) {
        let _ = self.client.disconnect().await;
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retained_messages_are_discarded() {
        let mut publish = Publish::new("display/log", QoS::AtMostOnce, "old line");
        publish.retain = true;
        assert_eq!(relay_payload(&publish), None);
    }

    #[test]
    fn test_live_messages_are_forwarded_verbatim() {
        let publish = Publish::new("display/log", QoS::AtMostOnce, "wifi connected, rssi -61");
        assert_eq!(
            relay_payload(&publish).as_deref(),
            Some("wifi connected, rssi -61")
        );
    }

    #[test]
    fn test_non_utf8_payload_is_lossy_not_fatal() {
        let publish = Publish::new("display/log", QoS::AtMostOnce, vec![0xff, 0x68, 0x69]);
        let line = relay_payload(&publish).unwrap();
        assert!(line.ends_with("hi"));
    }
}
