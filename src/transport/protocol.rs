//! The closed vocabulary of transport protocol tags (spec §4.4).

use serde::{Deserialize, Serialize};

/// A transport protocol tag, grouped into families per spec §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolTag {
    /// Plain HTTP.
    Http,
    /// TLS-secured HTTP.
    Https,
    /// Plain WebSocket.
    Ws,
    /// TLS-secured WebSocket.
    Wss,
    /// Plain MQTT.
    Mqtt,
    /// TLS-secured MQTT.
    Mqtts,
    /// MQTT over WebSocket.
    #[serde(rename = "mqtt+ws")]
    MqttWs,
    /// MQTT over TLS WebSocket.
    #[serde(rename = "mqtt+wss")]
    MqttWss,
    /// Generic peer-to-peer.
    P2p,
    /// libp2p specifically.
    Libp2p,
    /// IPFS.
    Ipfs,
}

impl ProtocolTag {
    /// Whether this tag implies a TLS-secured transport.
    #[must_use]
    pub fn is_secure(self) -> bool {
        matches!(self, Self::Https | Self::Wss | Self::Mqtts | Self::MqttWss)
    }

    /// Whether this tag is a WebSocket variant of another protocol.
    #[must_use]
    pub fn is_web_socket(self) -> bool {
        matches!(self, Self::Ws | Self::Wss | Self::MqttWs | Self::MqttWss)
    }

    /// For a WebSocket tag, the underlying base HTTP protocol it upgrades
    /// from. `None` for non-WebSocket tags.
    #[must_use]
    pub fn base_protocol_of_web_socket(self) -> Option<Self> {
        match self {
            Self::Ws => Some(Self::Http),
            Self::Wss => Some(Self::Https),
            _ => None,
        }
    }

    /// The protocol family this tag belongs to.
    #[must_use]
    pub fn family(self) -> ProtocolFamily {
        match self {
            Self::Http | Self::Https | Self::Ws | Self::Wss => ProtocolFamily::Http,
            Self::Mqtt | Self::Mqtts | Self::MqttWs | Self::MqttWss => ProtocolFamily::Mqtt,
            Self::P2p | Self::Libp2p | Self::Ipfs => ProtocolFamily::P2p,
        }
    }
}

/// The protocol family a [`ProtocolTag`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolFamily {
    /// `{http, https, ws, wss}`.
    Http,
    /// `{mqtt, mqtts, mqtt+ws, mqtt+wss}`.
    Mqtt,
    /// `{p2p, libp2p, ipfs}`.
    P2p,
}
