//! # Native Serial Transport
//!
//! [`Transport`] implementation over the `serialport` crate, plus port
//! enumeration for modem discovery.
//!
//! `serialport` is blocking, so every read and write runs on tokio's
//! blocking pool. Reads use a short port timeout; a timeout surfaces as an
//! empty chunk and the read loop simply polls again.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::todo
)]

use actor_protocol::SerialPortInfo;
use core_types::{FlowControl, ParityMode, SerialConfig, Transport, TransportError};
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Port read timeout. Bounds how long a read holds the blocking pool
/// and how quickly `close` is noticed.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

const READ_BUFFER_SIZE: usize = 1024;

type SharedPort = Arc<Mutex<Option<Box<dyn SerialPort>>>>;

pub struct NativeSerialTransport {
    port_name: String,
    reader: SharedPort,
    writer: SharedPort,
}

impl NativeSerialTransport {
    /// Open `port_name` with the given line settings.
    pub fn open(port_name: &str, config: &SerialConfig) -> Result<Self, TransportError> {
        let reader = serialport::new(port_name, config.baud_rate)
            .data_bits(data_bits(config.data_bits)?)
            .stop_bits(stop_bits(config.stop_bits)?)
            .parity(parity(config.parity))
            .flow_control(flow_control(config.flow_control))
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| {
                TransportError::ConnectionFailed(format!("Failed to open {}: {}", port_name, e))
            })?;

        // Separate handle so a write never waits behind a pending read
        let writer = reader.try_clone().map_err(|e| {
            TransportError::ConnectionFailed(format!("Failed to clone {}: {}", port_name, e))
        })?;

        Ok(Self {
            port_name: port_name.to_string(),
            reader: Arc::new(Mutex::new(Some(reader))),
            writer: Arc::new(Mutex::new(Some(writer))),
        })
    }
}

impl Transport for NativeSerialTransport {
    async fn read_chunk(&self) -> Result<(Vec<u8>, u64), TransportError> {
        let reader = Arc::clone(&self.reader);
        let port_name = self.port_name.clone();
        let data = tokio::task::spawn_blocking(move || {
            let mut guard = reader
                .lock()
                .map_err(|_| TransportError::Other("Reader lock poisoned".into()))?;
            let port = guard.as_mut().ok_or(TransportError::NotConnected)?;

            let mut buf = vec![0u8; READ_BUFFER_SIZE];
            match port.read(&mut buf) {
                Ok(n) => {
                    buf.truncate(n);
                    Ok(buf)
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => Ok(Vec::new()),
                Err(e) if e.kind() == ErrorKind::Interrupted => Ok(Vec::new()),
                Err(e) => Err(TransportError::Io(format!("Read from {} failed: {}", port_name, e))),
            }
        })
        .await
        .map_err(|e| TransportError::Other(format!("Read task failed: {}", e)))??;

        Ok((data, now_us()))
    }

    async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        let writer = Arc::clone(&self.writer);
        let data = data.to_vec();
        let port_name = self.port_name.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = writer
                .lock()
                .map_err(|_| TransportError::Other("Writer lock poisoned".into()))?;
            let port = guard.as_mut().ok_or(TransportError::NotConnected)?;
            port.write_all(&data)
                .and_then(|()| port.flush())
                .map_err(|e| TransportError::Io(format!("Write to {} failed: {}", port_name, e)))
        })
        .await
        .map_err(|e| TransportError::Other(format!("Write task failed: {}", e)))?
    }

    async fn close(&self) -> Result<(), TransportError> {
        let reader = Arc::clone(&self.reader);
        let writer = Arc::clone(&self.writer);
        // The read task may hold the reader lock for up to one port timeout
        tokio::task::spawn_blocking(move || {
            // Dropping both handles releases the device
            if let Ok(mut writer) = writer.lock() {
                writer.take();
            }
            if let Ok(mut reader) = reader.lock() {
                reader.take();
            }
        })
        .await
        .map_err(|e| TransportError::Other(format!("Close task failed: {}", e)))
    }
}

/// Every serial port the OS reports, with USB ids where known.
pub fn list_ports() -> Result<Vec<SerialPortInfo>, TransportError> {
    let ports = serialport::available_ports()
        .map_err(|e| TransportError::Other(format!("Port enumeration failed: {}", e)))?;

    Ok(ports
        .into_iter()
        .map(|port| match port.port_type {
            serialport::SerialPortType::UsbPort(usb) => {
                SerialPortInfo::new(port.port_name, Some(usb.vid), Some(usb.pid))
            }
            _ => SerialPortInfo::new(port.port_name, None, None),
        })
        .collect())
}

fn now_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

fn data_bits(bits: u8) -> Result<serialport::DataBits, TransportError> {
    match bits {
        5 => Ok(serialport::DataBits::Five),
        6 => Ok(serialport::DataBits::Six),
        7 => Ok(serialport::DataBits::Seven),
        8 => Ok(serialport::DataBits::Eight),
        other => Err(TransportError::Other(format!(
            "Unsupported data bits: {}",
            other
        ))),
    }
}

fn stop_bits(bits: u8) -> Result<serialport::StopBits, TransportError> {
    match bits {
        1 => Ok(serialport::StopBits::One),
        2 => Ok(serialport::StopBits::Two),
        other => Err(TransportError::Other(format!(
            "Unsupported stop bits: {}",
            other
        ))),
    }
}

fn parity(mode: ParityMode) -> serialport::Parity {
    match mode {
        ParityMode::None => serialport::Parity::None,
        ParityMode::Even => serialport::Parity::Even,
        ParityMode::Odd => serialport::Parity::Odd,
    }
}

fn flow_control(mode: FlowControl) -> serialport::FlowControl {
    match mode {
        FlowControl::None => serialport::FlowControl::None,
        FlowControl::Hardware => serialport::FlowControl::Hardware,
        FlowControl::Software => serialport::FlowControl::Software,
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_modem_default_maps_to_serialport() {
        let config = SerialConfig::modem_default();
        assert_eq!(
            data_bits(config.data_bits).unwrap(),
            serialport::DataBits::Eight
        );
        assert_eq!(
            stop_bits(config.stop_bits).unwrap(),
            serialport::StopBits::One
        );
        assert_eq!(parity(config.parity), serialport::Parity::None);
        assert_eq!(
            flow_control(config.flow_control),
            serialport::FlowControl::Hardware
        );
    }

    #[test]
    fn test_rejects_unsupported_framing() {
        assert!(data_bits(9).is_err());
        assert!(stop_bits(0).is_err());
    }

    #[test]
    fn test_open_missing_port_fails() {
        let result =
            NativeSerialTransport::open("/dev/no-such-modem-port", &SerialConfig::modem_default());
        match result {
            Err(TransportError::ConnectionFailed(msg)) => {
                assert!(msg.contains("/dev/no-such-modem-port"))
            }
            Err(other) => panic!("Expected ConnectionFailed, got {:?}", other),
            Ok(_) => panic!("Opening a missing port should fail"),
        }
    }

    #[test]
    fn test_timestamp_is_epoch_micros() {
        // Any date after 2020 is well above this
        assert!(now_us() > 1_577_836_800_000_000);
    }
}
