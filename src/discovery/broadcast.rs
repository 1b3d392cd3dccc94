use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::constants::{DISCOVERY_MESSAGE, DISCOVERY_PORT, DISCOVERY_TIMEOUT_SECS};
use crate::models::ServerRecord;

/// Reply datagram sent by a server that heard the probe.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ServerReply {
    address: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
}

/// Ask the local network whether a server is listening. One answer is
/// enough; silence for the timeout window means none, which is not an
/// error.
pub async fn probe() -> Result<Option<ServerRecord>> {
    probe_addr(
        &format!("255.255.255.255:{}", DISCOVERY_PORT),
        Duration::from_secs(DISCOVERY_TIMEOUT_SECS),
    )
    .await
}

async fn probe_addr(target: &str, wait: Duration) -> Result<Option<ServerRecord>> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .context("Failed to bind discovery socket")?;
    socket
        .set_broadcast(true)
        .context("Failed to enable broadcast")?;

    debug!("Sending discovery probe to {}", target);
    socket
        .send_to(DISCOVERY_MESSAGE.as_bytes(), target)
        .await
        .context("Failed to send discovery probe")?;

    let mut buf = [0u8; 1024];
    let received = match tokio::time::timeout(wait, socket.recv_from(&mut buf)).await {
        Ok(result) => result.context("Failed to receive discovery reply")?,
        Err(_) => {
            debug!("No discovery reply within {:?}", wait);
            return Ok(None);
        }
    };

    let (len, peer) = received;
    let reply: ServerReply = serde_json::from_slice(&buf[..len])
        .with_context(|| format!("Malformed discovery reply from {}", peer))?;

    match parse_reply(reply) {
        Ok(record) => {
            info!("Discovered server '{}' at {}", record.name, record.base_url());
            Ok(Some(record))
        }
        Err(e) => {
            warn!("Discarding discovery reply from {}: {}", peer, e);
            Ok(None)
        }
    }
}

fn parse_reply(reply: ServerReply) -> Result<ServerRecord> {
    let address = url::Url::parse(&reply.address)
        .with_context(|| format!("Invalid server address '{}'", reply.address))?;
    let host = address
        .host_str()
        .context("Server address has no host")?
        .to_string();

    Ok(ServerRecord {
        id: reply.id,
        name: if reply.name.is_empty() {
            host.clone()
        } else {
            reply.name
        },
        scheme: address.scheme().to_string(),
        host,
        port: address.port().unwrap_or(8096),
        access_token: None,
    })
}
