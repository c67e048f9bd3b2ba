//! Finding the modem among the machine's serial ports
//!
//! Each candidate is opened, sent `ATI`, and watched for an `IMEI:` line.
//! The first port that answers wins; every other port is closed again.

use crate::constants::{discovery, response};
use actor_protocol::{ActorError, ModemCommand, SerialPortInfo};
use actor_runtime::{actor_debug, actor_info, actor_warn};
use core_types::{Transport, TransportError};
use framing::{Framer, LineFramer};
use std::time::Duration;

/// Send `ATI` and wait up to `timeout` for the identity line.
///
/// Returns the identity line, or `None` if the port stayed silent or
/// answered without the marker.
pub async fn identify<T: Transport>(
    transport: &T,
    timeout: Duration,
) -> Result<Option<String>, TransportError> {
    transport.write(&ModemCommand::Identify.to_bytes()).await?;

    match tokio::time::timeout(timeout, wait_for_identity(transport)).await {
        Ok(result) => result,
        Err(_) => Ok(None),
    }
}

async fn wait_for_identity<T: Transport>(transport: &T) -> Result<Option<String>, TransportError> {
    let mut framer = LineFramer::new();
    loop {
        let (data, timestamp_us) = transport.read_chunk().await?;
        for frame in framer.push(&data, timestamp_us) {
            let line = frame.text();
            let line = line.trim();
            if line.contains(response::IDENTITY) {
                return Ok(Some(line.to_string()));
            }
            if response::is_ok(line) || response::is_error(line) {
                return Ok(None);
            }
        }
    }
}

/// Try every candidate port until one identifies as a modem.
///
/// `open` opens a port with the modem's serial settings. Ports that fail to
/// open, fail during identification, or do not identify are skipped.
pub async fn discover<T, F>(
    candidates: &[SerialPortInfo],
    mut open: F,
) -> Result<(SerialPortInfo, T), ActorError>
where
    T: Transport,
    F: FnMut(&SerialPortInfo) -> Result<T, TransportError>,
{
    let timeout = Duration::from_millis(discovery::IDENTIFY_TIMEOUT_MS);

    for port in candidates {
        actor_debug!("Discovery: trying {}", port.path);

        let transport = match open(port) {
            Ok(transport) => transport,
            Err(e) => {
                actor_warn!("Discovery: cannot open {}: {}", port.path, e);
                continue;
            }
        };

        match identify(&transport, timeout).await {
            Ok(Some(identity)) => {
                actor_info!("Discovery: modem on {} ({})", port.path, identity);
                return Ok((port.clone(), transport));
            }
            Ok(None) => {
                actor_debug!("Discovery: no modem on {}", port.path);
            }
            Err(e) => {
                actor_warn!("Discovery: {} failed: {}", port.path, e);
            }
        }

        if let Err(e) = transport.close().await {
            actor_warn!("Discovery: closing {} failed: {}", port.path, e);
        }
    }

    let tried: Vec<&str> = candidates.iter().map(|p| p.path.as_str()).collect();
    Err(ActorError::DeviceNotFound(format!(
        "No modem answered ATI on [{}]. Check the cable and set com_port in app.properties.",
        tried.join(", ")
    )))
}
