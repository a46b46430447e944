#![deny(warnings)]
//! MQTT v5.0 telemetry publisher
//!
//! A `rust-mqtt` client borrows its packet buffer and owns its transport, so
//! it cannot outlive the stack frame that created it. The session therefore
//! lives in [`mqtt_task`], which owns all buffers; [`MqttPublisher`] is the
//! handle the duty-cycle controller drives, one request at a time over a
//! pair of channels.
//!
//! # Memory
//!
//! - MQTT packet buffer: 1 KB, bump allocated per session
//! - TCP buffers: 2 x 1 KB
//!
//! Plain MQTT on port 1883, QoS 0, not retained.

#![allow(unsafe_code)] // Required for TopicName::new_unchecked

use core::fmt::Write as _;

use defmt::{debug, error, info, warn, Debug2Format};
use embassy_net::dns::DnsQueryType;
use embassy_net::{IpAddress, IpEndpoint, Ipv4Address, Stack};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::{String, Vec};
use plant_node_core::telemetry::{Topic, MAX_PAYLOAD_LEN};
use plant_node_hal::TelemetryPublisher;
use rust_mqtt::{
    buffer::BumpBuffer,
    client::{
        options::{ConnectOptions, DisconnectOptions, PublicationOptions, TopicReference},
        Client,
    },
    config::{KeepAlive, SessionExpiryInterval},
    types::{MqttString, QoS, TopicName},
    Bytes,
};

use crate::config::MqttConfig;
use crate::error::{MqttError, NetworkError};
use crate::socket::AsyncTcpSocket;

/// MQTT packet buffer size
const MQTT_BUFFER_SIZE: usize = 1024;

/// TCP buffer size, each direction
const TCP_BUFFER_SIZE: usize = 1024;

/// Maximum client id length: prefix plus four hex digits
pub const CLIENT_ID_MAX_LEN: usize = 16;

/// Client id buffer
pub type ClientId = String<CLIENT_ID_MAX_LEN>;

/// Request from the publisher handle to the session task
pub enum Command {
    /// Resolve the broker, connect TCP and send CONNECT
    Open,
    /// Publish one message on the open session
    Publish {
        /// Topic name, no wildcards
        topic: Topic,
        /// Message body
        payload: Vec<u8, MAX_PAYLOAD_LEN>,
    },
    /// Send DISCONNECT, then drop the session and its socket
    Close,
}

/// Request and reply queues between [`MqttPublisher`] and [`mqtt_task`]
pub struct MqttChannels {
    commands: Channel<CriticalSectionRawMutex, Command, 1>,
    replies: Channel<CriticalSectionRawMutex, Result<(), MqttError>, 1>,
}

impl MqttChannels {
    /// Create empty queues
    pub const fn new() -> Self {
        Self {
            commands: Channel::new(),
            replies: Channel::new(),
        }
    }
}

impl Default for MqttChannels {
    fn default() -> Self {
        Self::new()
    }
}

/// Build `<prefix><random hex>`, as the broker expects a unique id per node
pub fn client_id(prefix: &str, random: u32) -> Result<ClientId, MqttError> {
    let mut id = ClientId::new();
    write!(id, "{}{:x}", prefix, random & 0xffff).map_err(|_| MqttError::ProtocolError)?;
    Ok(id)
}

/// Handle driving the session in [`mqtt_task`]
pub struct MqttPublisher {
    channels: &'static MqttChannels,
}

impl MqttPublisher {
    /// Create a handle over the queues shared with [`mqtt_task`]
    pub fn new(channels: &'static MqttChannels) -> Self {
        Self { channels }
    }

    async fn request(&mut self, command: Command) -> Result<(), MqttError> {
        self.channels.commands.send(command).await;
        self.channels.replies.receive().await
    }
}

impl TelemetryPublisher for MqttPublisher {
    type Error = MqttError;

    async fn open(&mut self) -> Result<(), Self::Error> {
        self.request(Command::Open).await
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error> {
        let topic = Topic::try_from(topic).map_err(|_| MqttError::ProtocolError)?;
        let payload = Vec::from_slice(payload).map_err(|_| MqttError::ProtocolError)?;
        self.request(Command::Publish { topic, payload }).await
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.request(Command::Close).await
    }
}

/// Serve broker sessions for [`MqttPublisher`]
///
/// Every `Open` starts a new session, which lasts until the matching
/// `Close`. `Close` sends a normal DISCONNECT before the socket is dropped,
/// so the broker ends the session at once instead of waiting out the
/// keep-alive. Each request gets exactly one reply.
#[embassy_executor::task]
pub async fn mqtt_task(
    stack: Stack<'static>,
    config: MqttConfig,
    client_id: ClientId,
    channels: &'static MqttChannels,
) -> ! {
    loop {
        match channels.commands.receive().await {
            Command::Open => {}
            Command::Publish { .. } | Command::Close => {
                channels.replies.send(Err(MqttError::NotConnected)).await;
                continue;
            }
        }

        let endpoint = match resolve(stack, &config).await {
            Ok(endpoint) => endpoint,
            Err(e) => {
                channels.replies.send(Err(e.into())).await;
                continue;
            }
        };

        let mut rx_buffer = [0u8; TCP_BUFFER_SIZE];
        let mut tx_buffer = [0u8; TCP_BUFFER_SIZE];
        let mut socket = AsyncTcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        if let Err(e) = socket.connect(endpoint).await {
            warn!("mqtt: tcp connect to {} failed", Debug2Format(&endpoint));
            channels.replies.send(Err(e.into())).await;
            continue;
        }
        debug!("mqtt: tcp connected to {}", Debug2Format(&endpoint));

        let mut mqtt_buffer = [0u8; MQTT_BUFFER_SIZE];
        let mut buffer = BumpBuffer::new(&mut mqtt_buffer);
        let mut mqtt_client = Client::<'_, _, _, 1, 1, 1, 0>::new(&mut buffer);

        let connect_opts = ConnectOptions {
            session_expiry_interval: SessionExpiryInterval::EndOnDisconnect,
            clean_start: config.clean_start,
            keep_alive: if config.keep_alive_secs == 0 {
                KeepAlive::Infinite
            } else {
                KeepAlive::Seconds(config.keep_alive_secs)
            },
            will: None,
            user_name: None,
            password: None,
        };

        let mqtt_client_id = match MqttString::new(client_id.as_str().into()) {
            Ok(id) => id,
            Err(e) => {
                error!("mqtt: bad client id: {:?}", Debug2Format(&e));
                channels.replies.send(Err(MqttError::ProtocolError)).await;
                continue;
            }
        };

        if let Err(e) = mqtt_client
            .connect(socket, &connect_opts, Some(mqtt_client_id))
            .await
        {
            error!("mqtt: connect failed: {:?}", Debug2Format(&e));
            channels.replies.send(Err(MqttError::ConnectionFailed)).await;
            continue;
        }
        info!("mqtt: session open as {}", client_id.as_str());
        channels.replies.send(Ok(())).await;

        loop {
            match channels.commands.receive().await {
                Command::Open => {
                    channels.replies.send(Ok(())).await;
                }
                Command::Publish { topic, payload } => {
                    if !is_topic_name(topic.as_str()) {
                        channels.replies.send(Err(MqttError::ProtocolError)).await;
                        continue;
                    }
                    let topic_string = match MqttString::new(topic.as_str().into()) {
                        Ok(s) => s,
                        Err(e) => {
                            error!("mqtt: bad topic: {:?}", Debug2Format(&e));
                            channels.replies.send(Err(MqttError::ProtocolError)).await;
                            continue;
                        }
                    };
                    // SAFETY: `is_topic_name` rejected wildcards and NUL above
                    let topic_name = unsafe { TopicName::new_unchecked(topic_string) };

                    let pub_options = PublicationOptions {
                        retain: false,
                        message_expiry_interval: None,
                        topic: TopicReference::Name(topic_name),
                        qos: QoS::AtMostOnce,
                    };

                    let result = match mqtt_client
                        .publish(&pub_options, Bytes::from(payload.as_slice()))
                        .await
                    {
                        Ok(_) => Ok(()),
                        Err(e) => {
                            error!("mqtt: publish failed: {:?}", Debug2Format(&e));
                            Err(MqttError::PublishFailed)
                        }
                    };
                    channels.replies.send(result).await;
                }
                Command::Close => break,
            }
        }

        let disconnect_opts = DisconnectOptions {
            publish_will: false,
            session_expiry_interval: None,
        };
        let result = match mqtt_client.disconnect(&disconnect_opts).await {
            Ok(()) => {
                info!("mqtt: session closed");
                Ok(())
            }
            Err(e) => {
                warn!("mqtt: disconnect failed: {:?}", Debug2Format(&e));
                Err(MqttError::ConnectionFailed)
            }
        };
        drop(mqtt_client);
        channels.replies.send(result).await;
    }
}

/// Turn the configured broker host into an endpoint
///
/// A dotted-quad address skips the DNS query.
async fn resolve(stack: Stack<'static>, config: &MqttConfig) -> Result<IpEndpoint, NetworkError> {
    if !stack.is_config_up() {
        return Err(NetworkError::LinkDown);
    }

    let address = match config.broker_host.parse::<Ipv4Address>() {
        Ok(ip) => IpAddress::Ipv4(ip),
        Err(_) => stack
            .dns_query(config.broker_host, DnsQueryType::A)
            .await
            .map_err(|e| {
                error!("mqtt: DNS query failed: {:?}", Debug2Format(&e));
                NetworkError::DnsError
            })?
            .first()
            .copied()
            .ok_or_else(|| {
                error!("mqtt: DNS returned no results for {}", config.broker_host);
                NetworkError::DnsError
            })?,
    };

    Ok(IpEndpoint::new(address, config.broker_port))
}

/// Check that `topic` is a valid PUBLISH topic name
fn is_topic_name(topic: &str) -> bool {
    !topic.is_empty() && !topic.contains(['+', '#', '\0'])
}
