//! Socket.IO text-frame codec (Engine.IO v4 over WebSocket).
//!
//! Every WebSocket text frame is one Engine.IO packet: a single digit type
//! followed by its payload. Engine.IO `message` packets (type `4`) carry a
//! Socket.IO packet:
//!
//! ```text
//! <type>[<attachments>-][<namespace>,][<ack id>][<json>]
//! 42/warning,["warning",{"data":"{...}"}]
//! ```
//!
//! Binary packets (Socket.IO types 5 and 6) are rejected; the warning
//! channel never sends them.

use serde_json::Value;

use crate::ports::RealtimeError;

/// One Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// Handshake carrying session id and ping settings.
    Open(Value),
    Close,
    Ping(String),
    Pong(String),
    /// Socket.IO payload.
    Message(String),
    Upgrade,
    Noop,
}

/// One Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        ack_id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }
}

fn protocol(message: impl Into<String>) -> RealtimeError {
    RealtimeError::Protocol(message.into())
}

/// Decodes one WebSocket text frame.
pub fn decode_engine(frame: &str) -> Result<EnginePacket, RealtimeError> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or_else(|| protocol("empty frame"))?;
    let rest = chars.as_str();
    match kind {
        '0' => serde_json::from_str(rest)
            .map(EnginePacket::Open)
            .map_err(|e| protocol(format!("bad handshake: {}", e))),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(rest.to_string())),
        '3' => Ok(EnginePacket::Pong(rest.to_string())),
        '4' => Ok(EnginePacket::Message(rest.to_string())),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(protocol(format!("unknown engine packet type '{}'", other))),
    }
}

/// Decodes the Socket.IO packet inside an Engine.IO message.
pub fn decode_socket(payload: &str) -> Result<SocketPacket, RealtimeError> {
    let mut chars = payload.chars();
    let kind = chars.next().ok_or_else(|| protocol("empty socket packet"))?;
    let mut rest = chars.as_str();

    if matches!(kind, '5' | '6') {
        return Err(protocol("binary socket packets are not supported"));
    }

    let namespace = if rest.starts_with('/') {
        let end = rest.find(',').unwrap_or(rest.len());
        let ns = &rest[..end];
        rest = rest.get(end + 1..).unwrap_or("");
        ns.to_string()
    } else {
        "/".to_string()
    };

    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    let ack_id = if digits > 0 {
        let id = rest[..digits]
            .parse::<u64>()
            .map_err(|e| protocol(format!("bad ack id: {}", e)))?;
        rest = &rest[digits..];
        Some(id)
    } else {
        None
    };

    let data = if rest.is_empty() {
        None
    } else {
        Some(
            serde_json::from_str::<Value>(rest)
                .map_err(|e| protocol(format!("bad packet data: {}", e)))?,
        )
    };

    match kind {
        '0' => Ok(SocketPacket::Connect { namespace, data }),
        '1' => Ok(SocketPacket::Disconnect { namespace }),
        '2' => {
            let mut args = match data {
                Some(Value::Array(items)) => items,
                _ => return Err(protocol("event packet without argument array")),
            };
            if args.is_empty() {
                return Err(protocol("event packet without a name"));
            }
            let name = match args.remove(0) {
                Value::String(name) => name,
                other => return Err(protocol(format!("event name is not a string: {}", other))),
            };
            Ok(SocketPacket::Event {
                namespace,
                ack_id,
                name,
                args,
            })
        }
        '3' => {
            let ack_id = ack_id.ok_or_else(|| protocol("ack packet without id"))?;
            let args = match data {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            Ok(SocketPacket::Ack {
                namespace,
                ack_id,
                args,
            })
        }
        '4' => Ok(SocketPacket::ConnectError { namespace, data }),
        other => Err(protocol(format!("unknown socket packet type '{}'", other))),
    }
}

/// Frame asking to join `namespace`.
pub fn encode_connect(namespace: &str) -> String {
    if namespace == "/" {
        "40".to_string()
    } else {
        format!("40{},", namespace)
    }
}

/// Frame answering a server ping.
pub fn encode_pong(payload: &str) -> String {
    format!("3{}", payload)
}
